use jsonapi_write::config::{StoreConfig, WriteOptions};
use jsonapi_write::framework::{
    Identifiable, RelationshipValue, Resource, ResourceReader, ResourceRef, WriteError,
    WriteRepository,
};
use jsonapi_write::lifecycle::BlogSystem;
use jsonapi_write::model::{
    Article, ArticleCreate, ArticlePatch, ArticleTag, IdentifiableArticleTagCreate, Person,
    PersonCreate, Tag, TagCreate,
};
use jsonapi_write::services::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    SetRelationshipService, UpdateService,
};
use jsonapi_write::store;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn tag_refs(ids: &[i32]) -> BTreeSet<ResourceRef> {
    ids.iter().map(|id| ResourceRef::new("tags", id)).collect()
}

async fn create_tag(system: &BlogSystem, id: i32, name: &str) -> Tag {
    system
        .tags
        .commands
        .create(
            Some(id),
            TagCreate {
                name: name.to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .expect("Failed to create tag")
}

async fn create_article(system: &BlogSystem, id: i32, title: &str) -> Article {
    system
        .articles
        .commands
        .create(
            Some(id),
            ArticleCreate {
                title: title.to_string(),
                ..Default::default()
            },
            &CancellationToken::new(),
        )
        .await
        .expect("Failed to create article")
}

/// Add tag 5, then replace the tags with {7}: the article ends up with tag 7 only.
#[tokio::test]
async fn test_set_relationship_replaces_previous_members() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();

    create_tag(&system, 5, "five").await;
    create_tag(&system, 7, "seven").await;
    create_article(&system, 1, "Relationships").await;

    let articles = &system.articles.commands;
    articles
        .add_to_relationship(&1, "tags", tag_refs(&[5]), &cancel)
        .await
        .expect("Failed to add tag");
    articles
        .set_relationship(&1, "tags", RelationshipValue::ToMany(tag_refs(&[7])), &cancel)
        .await
        .expect("Failed to set tags");

    let article = system
        .articles
        .reader
        .get(&1)
        .await
        .expect("Failed to get article")
        .expect("Article not found");
    assert_eq!(article.resource.tags, tag_refs(&[7]));
    assert_eq!(
        system.article_links(1).await.unwrap(),
        vec![ArticleTag {
            article_id: 1,
            tag_id: 7
        }]
    );

    system.shutdown().await.expect("Shutdown failed");
}

/// "5", "05" and " 5" name the same tag, so they are one member and one link row.
#[tokio::test]
async fn test_spellings_of_one_tag_are_one_member() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    create_tag(&system, 5, "five").await;
    create_article(&system, 1, "Spelling").await;

    let articles = &system.articles.commands;
    for spelling in ["5", "05"] {
        articles
            .add_to_relationship(&1, "tags", [ResourceRef::new("tags", spelling)].into(), &cancel)
            .await
            .expect("Failed to add tag");
    }

    let article = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert_eq!(article.resource.tags, tag_refs(&[5]));
    assert_eq!(article.version, Some(2));
    assert_eq!(
        system.article_links(1).await.unwrap(),
        vec![ArticleTag {
            article_id: 1,
            tag_id: 5
        }]
    );

    articles
        .remove_from_relationship(&1, "tags", [ResourceRef::new("tags", " 5")].into(), &cancel)
        .await
        .expect("Failed to remove tag");
    let article = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert!(article.resource.tags.is_empty());
    assert!(system.article_links(1).await.unwrap().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_relationship_to_missing_tag_is_rejected() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    create_tag(&system, 5, "five").await;
    create_article(&system, 1, "Dangling").await;

    let err = system
        .articles
        .commands
        .add_to_relationship(&1, "tags", tag_refs(&[5, 6]), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::relationship_not_found("tags", "tags", 6));

    let article = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert!(article.resource.tags.is_empty());

    system.shutdown().await.unwrap();
}

/// Two writers holding the same snapshot: exactly one update lands.
#[tokio::test]
async fn test_concurrent_updates_with_same_version_conflict() {
    let (store, _handle) = store::spawn::<Article>(&StoreConfig::default());
    let cancel = CancellationToken::new();
    let article = Article::from_create_params(
        1,
        ArticleCreate {
            title: "Original".into(),
            ..Default::default()
        },
    )
    .unwrap();
    store.create(article, &cancel).await.unwrap();

    let snapshot = store.get(&1).await.unwrap().unwrap();
    let first = ArticlePatch {
        title: Some("First".into()),
        ..Default::default()
    };
    let second = ArticlePatch {
        title: Some("Second".into()),
        ..Default::default()
    };

    let (a, b) = tokio::join!(
        store.update(&first, &snapshot, &cancel),
        store.update(&second, &snapshot, &cancel)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let conflict = outcomes.iter().find_map(|r| r.clone().err()).unwrap();
    assert!(matches!(
        conflict,
        WriteError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert!(conflict.is_retryable());

    let stored = store.get(&1).await.unwrap().unwrap();
    assert_eq!(stored.version, Some(2));
}

#[tokio::test]
async fn test_unversioned_store_lets_last_writer_win() {
    let config = StoreConfig {
        optimistic_concurrency: false,
        ..Default::default()
    };
    let (store, _handle) = store::spawn::<Article>(&config);
    let cancel = CancellationToken::new();
    let article = Article::from_create_params(
        1,
        ArticleCreate {
            title: "Original".into(),
            ..Default::default()
        },
    )
    .unwrap();
    store.create(article, &cancel).await.unwrap();

    let snapshot = store.get(&1).await.unwrap().unwrap();
    assert_eq!(snapshot.version, None);

    for title in ["First", "Second"] {
        let patch = ArticlePatch {
            title: Some(title.into()),
            ..Default::default()
        };
        store.update(&patch, &snapshot, &cancel).await.unwrap();
    }

    let stored = store.get(&1).await.unwrap().unwrap();
    assert_eq!(stored.resource.title, "Second");
}

/// Populate the cache, update, and read again: the read must see the update.
#[tokio::test]
async fn test_read_after_update_is_fresh() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    create_article(&system, 1, "Before").await;

    let before = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert_eq!(before.resource.title, "Before");
    assert_eq!(system.articles.cache.len(), 1);

    let updated = system
        .articles
        .commands
        .update(
            &1,
            ArticlePatch {
                title: Some("After".into()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "After");
    assert!(system.articles.cache.is_empty());

    let after = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert_eq!(after.resource.title, "After");
    assert_eq!(after.version, Some(2));
    assert_eq!(after.resource.body, before.resource.body);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_uuid_keyed_author() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();

    let author: Person = system
        .people
        .commands
        .create(None, PersonCreate { name: "Ada".into() }, &cancel)
        .await
        .unwrap();
    assert!(!author.id.is_nil());

    let article = system
        .articles
        .commands
        .create(
            None,
            ArticleCreate {
                title: "Keyed by UUID".into(),
                author: Some(author.reference()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(article.author, Some(ResourceRef::to::<Person>(&author.id)));

    let stranger = ResourceRef::new("people", Uuid::new_v4());
    let err = system
        .articles
        .commands
        .set_relationship(&article.id, "author", RelationshipValue::to_one(stranger.clone()), &cancel)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WriteError::relationship_not_found("author", "people", &stranger.id)
    );

    let err = system
        .articles
        .commands
        .set_relationship(
            &article.id,
            "author",
            RelationshipValue::to_one(ResourceRef::new("people", "not-a-uuid")),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Validation(_)));

    // Clearing a to-one relationship
    system
        .articles
        .commands
        .set_relationship(&article.id, "author", RelationshipValue::ToOne(None), &cancel)
        .await
        .unwrap();
    let stored = system.articles.reader.get(&article.id).await.unwrap().unwrap();
    assert_eq!(stored.resource.author, None);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_link_record_requires_existing_endpoints() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    let tag = create_tag(&system, 5, "five").await;
    let article = create_article(&system, 1, "Linked").await;

    let link = system
        .article_tags
        .commands
        .create(
            None,
            IdentifiableArticleTagCreate {
                article: article.reference(),
                tag: tag.reference(),
                some_meta_data: Some("pinned".into()),
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(
        link.link().unwrap(),
        ArticleTag {
            article_id: 1,
            tag_id: 5
        }
    );

    // Same pair again
    let err = system
        .article_tags
        .commands
        .create(
            None,
            IdentifiableArticleTagCreate {
                article: article.reference(),
                tag: tag.reference(),
                some_meta_data: None,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::ConstraintViolation(_)));

    let err = system
        .article_tags
        .commands
        .create(
            None,
            IdentifiableArticleTagCreate {
                article: article.reference(),
                tag: ResourceRef::new("tags", 99),
                some_meta_data: None,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::relationship_not_found("tag", "tags", 99));

    let err = system
        .article_tags
        .commands
        .set_relationship(&link.id, "tag", RelationshipValue::ToOne(None), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Validation(_)));

    system.shutdown().await.unwrap();
}

/// Re-pointing or re-spelling a link record never yields two records for one pair.
#[tokio::test]
async fn test_link_record_pair_stays_unique() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    let five = create_tag(&system, 5, "five").await;
    let six = create_tag(&system, 6, "six").await;
    let article = create_article(&system, 3, "Pairs").await;

    let links = &system.article_tags.commands;
    let mut created = Vec::new();
    for tag in [&five, &six] {
        let link = links
            .create(
                None,
                IdentifiableArticleTagCreate {
                    article: article.reference(),
                    tag: tag.reference(),
                    some_meta_data: None,
                },
                &cancel,
            )
            .await
            .expect("Failed to create link");
        created.push(link);
    }

    let err = links
        .set_relationship(&created[1].id, "tag", RelationshipValue::to_one(five.reference()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::ConstraintViolation(_)));
    let second = system
        .article_tags
        .reader
        .get(&created[1].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.resource.link().unwrap(), ArticleTag { article_id: 3, tag_id: 6 });

    let err = links
        .create(
            None,
            IdentifiableArticleTagCreate {
                article: ResourceRef::new("articles", "03"),
                tag: ResourceRef::new("tags", "05"),
                some_meta_data: None,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::ConstraintViolation(_)));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_generated_id_follows_client_id() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    create_tag(&system, 1, "chosen").await;

    let generated = system
        .tags
        .commands
        .create(None, TagCreate { name: "generated".into() }, &cancel)
        .await
        .expect("Generated id collided with a client id");
    assert_eq!(generated.id, 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unique_tag_names_and_delete_outcomes() {
    let system = BlogSystem::new();
    let cancel = CancellationToken::new();
    create_tag(&system, 1, "rust").await;

    let err = system
        .tags
        .commands
        .create(Some(2), TagCreate { name: "rust".into() }, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::ConstraintViolation(_)));
    assert!(system.tags.reader.get(&2).await.unwrap().is_none());

    assert!(system.tags.commands.delete(&1, &cancel).await.unwrap());
    assert!(!system.tags.commands.delete(&1, &cancel).await.unwrap());
    assert!(!system.tags.commands.delete(&42, &cancel).await.unwrap());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_client_generated_ids_can_be_disabled() {
    let options = WriteOptions {
        allow_client_generated_ids: false,
        ..Default::default()
    };
    let system = BlogSystem::with_config(&StoreConfig::default(), options);
    let cancel = CancellationToken::new();

    let err = system
        .tags
        .commands
        .create(Some(3), TagCreate { name: "mine".into() }, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Validation(_)));

    let tag = system
        .tags
        .commands
        .create(None, TagCreate { name: "generated".into() }, &cancel)
        .await
        .unwrap();
    assert_eq!(tag.id, 1);
    assert_eq!(Tag::TYPE_NAME, tag.reference().resource_type);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_write_leaves_state_unchanged() {
    let system = BlogSystem::new();
    create_tag(&system, 5, "five").await;
    create_article(&system, 1, "Untouched").await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = system
        .articles
        .commands
        .add_to_relationship(&1, "tags", tag_refs(&[5]), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::Cancelled);

    let article = system.articles.reader.get(&1).await.unwrap().unwrap();
    assert!(article.resource.tags.is_empty());
    assert_eq!(article.version, Some(1));

    system.shutdown().await.unwrap();
}
