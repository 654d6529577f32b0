//! # Blog Demo
//!
//! Walks one article through the whole write pipeline:
//! 1. Setting up the [`BlogSystem`].
//! 2. Creating an author and two tags.
//! 3. Creating an article, then adding, replacing and removing its tags.
//! 4. Updating one attribute and deleting the article.

use jsonapi_write::framework::{Identifiable, RelationshipValue, ResourceReader};
use jsonapi_write::lifecycle::tracing::setup_tracing;
use jsonapi_write::lifecycle::BlogSystem;
use jsonapi_write::model::{ArticleCreate, ArticlePatch, PersonCreate, TagCreate};
use jsonapi_write::services::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    SetRelationshipService, UpdateService,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting blog demo");

    let system = BlogSystem::new();
    let cancel = CancellationToken::new();

    let author = system
        .people
        .commands
        .create(None, PersonCreate { name: "Ferris".to_string() }, &cancel)
        .await
        .map_err(|e| e.to_string())?;
    info!(author_id = %author.id, "Author created");

    let rust_tag = system
        .tags
        .commands
        .create(None, TagCreate { name: "rust".to_string() }, &cancel)
        .await
        .map_err(|e| e.to_string())?;
    let tokio_tag = system
        .tags
        .commands
        .create(None, TagCreate { name: "tokio".to_string() }, &cancel)
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("article_workflow");
    let result = async {
        let article = system
            .articles
            .commands
            .create(
                None,
                ArticleCreate {
                    title: "Actors and JSON:API".to_string(),
                    body: "Writing resources one message at a time.".to_string(),
                    author: Some(author.reference()),
                    ..Default::default()
                },
                &cancel,
            )
            .await?;
        let id = article.id;
        info!(article_id = id, "Article created");

        let commands = &system.articles.commands;
        commands
            .add_to_relationship(&id, "tags", [rust_tag.reference()].into_iter().collect(), &cancel)
            .await?;
        commands
            .set_relationship(&id, "tags", RelationshipValue::to_many([tokio_tag.reference()]), &cancel)
            .await?;
        let links = system.article_links(id).await?;
        info!(?links, "Tags replaced");

        commands
            .remove_from_relationship(&id, "tags", [tokio_tag.reference()].into_iter().collect(), &cancel)
            .await?;

        let updated = commands
            .update(
                &id,
                ArticlePatch {
                    title: Some("Actors, JSON:API and Tokio".to_string()),
                    ..Default::default()
                },
                &cancel,
            )
            .await?;
        info!(title = %updated.title, tags = updated.tags.len(), "Article updated");

        let cached = system.articles.reader.get(&id).await?;
        info!(version = ?cached.and_then(|s| s.version), "Read back through the cache");

        let deleted = commands.delete(&id, &cancel).await?;
        let deleted_again = commands.delete(&id, &cancel).await?;
        info!(deleted, deleted_again, "Article deleted");
        Ok::<_, jsonapi_write::framework::WriteError>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = result {
        error!(error = %e, "Article workflow failed");
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
