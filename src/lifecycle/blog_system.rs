use crate::config::{StoreConfig, WriteOptions};
use crate::framework::{
    CachedReader, IdFn, IdGenerator, Identifiable, MemoryCache, Resource, ResourceReader, Sequence,
    WriteError, WriteResult,
};
use crate::model::{Article, ArticleTag, IdentifiableArticleTag, Person, Tag};
use crate::services::{RelationshipResolver, ResourceCommands, ResourceWriteService};
use crate::store::{self, StoreClient};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// Everything a request handler needs for one resource type.
pub struct ResourceEndpoint<T: Resource> {
    /// The six write verbs.
    pub commands: ResourceCommands<T>,
    /// Read-through cached reads.
    pub reader: Arc<CachedReader<T>>,
    /// The cache shared by `reader` and the store client.
    pub cache: Arc<MemoryCache<T>>,
}

/// The runtime orchestrator of the example blog.
///
/// `BlogSystem` is responsible for:
/// - **Lifecycle Management**: starting one store actor per resource type and
///   stopping them again
/// - **Dependency Wiring**: registering every store with the relationship
///   resolver, so articles can check their authors and tags
/// - **Resource Coordination**: owning the id generators of each type, which
///   skip past ids clients chose themselves
///
/// Write services read the authoritative store directly; the public
/// [`ResourceEndpoint::reader`] goes through the cache.
///
/// # Example
///
/// ```ignore
/// let system = BlogSystem::new();
/// let cancel = CancellationToken::new();
///
/// let tag = system.tags.commands.create(None, TagCreate { name: "rust".into() }, &cancel).await?;
/// system.articles.commands.add_to_relationship(&1, "tags", [tag.reference()].into(), &cancel).await?;
///
/// system.shutdown().await?;
/// ```
pub struct BlogSystem {
    pub articles: ResourceEndpoint<Article>,
    pub tags: ResourceEndpoint<Tag>,
    pub people: ResourceEndpoint<Person>,
    pub article_tags: ResourceEndpoint<IdentifiableArticleTag>,

    /// Task handles of the store actors (used for graceful shutdown).
    handles: Vec<JoinHandle<()>>,
}

impl BlogSystem {
    /// Starts the system with default settings. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default(), WriteOptions::default())
    }

    pub fn with_config(config: &StoreConfig, options: WriteOptions) -> Self {
        let mut handles = Vec::new();

        // 1. Start one store per resource type
        let (article_store, article_cache) = start::<Article>(config, &mut handles);
        let (tag_store, tag_cache) = start::<Tag>(config, &mut handles);
        let (person_store, person_cache) = start::<Person>(config, &mut handles);
        let (link_store, link_cache) = start::<IdentifiableArticleTag>(config, &mut handles);

        // 2. Every store can answer existence checks for relationship targets
        let resolver = Arc::new(
            RelationshipResolver::new()
                .with::<Article>(Arc::new(article_store.clone()))
                .with::<Tag>(Arc::new(tag_store.clone()))
                .with::<Person>(Arc::new(person_store.clone()))
                .with::<IdentifiableArticleTag>(Arc::new(link_store.clone())),
        );

        // 3. Wire services on top of the stores
        let articles = endpoint(article_store, article_cache, &resolver, &options, Sequence::new());
        let tags = endpoint(tag_store, tag_cache, &resolver, &options, Sequence::new());
        let people = endpoint(person_store, person_cache, &resolver, &options, IdFn(Uuid::new_v4));
        let article_tags = endpoint(link_store, link_cache, &resolver, &options, Sequence::new());

        info!(stores = handles.len(), "Blog system started");

        Self {
            articles,
            tags,
            people,
            article_tags,
            handles,
        }
    }

    /// The join rows implied by the current tags of article `id`.
    pub async fn article_links(&self, id: i32) -> WriteResult<Vec<ArticleTag>> {
        let article = self
            .articles
            .reader
            .get(&id)
            .await?
            .ok_or_else(|| WriteError::not_found(Article::TYPE_NAME, id))?;
        ArticleTag::links_of(&article.resource)
    }

    /// Gracefully shuts down every store.
    ///
    /// Dropping the endpoints drops every store client, which closes the
    /// actors' channels; each actor then leaves its loop and its task ends.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if all stores shut down cleanly
    /// - `Err(String)` if any store task failed or panicked
    pub async fn shutdown(mut self) -> Result<(), String> {
        info!("Shutting down system...");

        let handles = std::mem::take(&mut self.handles);
        drop(self);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Store task failed: {:?}", e);
                return Err(format!("Store task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

fn start<T: Resource>(
    config: &StoreConfig,
    handles: &mut Vec<JoinHandle<()>>,
) -> (StoreClient<T>, Arc<MemoryCache<T>>) {
    let cache = Arc::new(MemoryCache::<T>::new());
    let (client, handle) = store::spawn::<T>(config);
    handles.push(handle);
    (client.with_cache(cache.clone()), cache)
}

fn endpoint<T: Resource>(
    store: StoreClient<T>,
    cache: Arc<MemoryCache<T>>,
    resolver: &Arc<RelationshipResolver>,
    options: &WriteOptions,
    ids: impl IdGenerator<T::Id> + 'static,
) -> ResourceEndpoint<T> {
    let authoritative: Arc<dyn ResourceReader<T>> = Arc::new(store.clone());
    let service = ResourceWriteService::<T>::with_id_generator(
        Arc::new(store),
        authoritative.clone(),
        resolver.clone(),
        ids,
    )
    .with_options(options.clone());

    ResourceEndpoint {
        commands: ResourceCommands::from_service(Arc::new(service)),
        reader: Arc::new(CachedReader::new(authoritative, cache.clone())),
        cache,
    }
}
