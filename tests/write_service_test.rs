//! Orchestration tests for `ResourceWriteService` against the scripted
//! repository, without starting any store.

use jsonapi_write::framework::mock::{MockReader, MockRepository, RecordedCall};
use jsonapi_write::framework::{
    RelationshipValue, Resource, ResourceRef, Snapshot, WriteError,
};
use jsonapi_write::model::{Article, ArticleCreate, ArticlePatch, Person, Tag, TagCreate};
use jsonapi_write::services::{
    AddRelationshipService, CreateService, DeleteRelationshipService, DeleteService,
    RelationshipResolver, ResourceCommands, ResourceWriteService, SetRelationshipService,
    UpdateService,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Harness {
    repository: Arc<MockRepository<Article>>,
    articles: Arc<MockReader<Article>>,
    tags: Arc<MockReader<Tag>>,
    commands: ResourceCommands<Article>,
}

fn harness() -> Harness {
    let repository = Arc::new(MockRepository::<Article>::new());
    let articles = Arc::new(MockReader::<Article>::new());
    let tags = Arc::new(MockReader::<Tag>::new());
    let people = Arc::new(MockReader::<Person>::new());
    let resolver = Arc::new(
        RelationshipResolver::new()
            .with::<Tag>(tags.clone())
            .with::<Person>(people),
    );
    let service = ResourceWriteService::<Article>::new(
        repository.clone(),
        articles.clone(),
        resolver,
        || 1,
    );
    Harness {
        repository,
        articles,
        tags,
        commands: ResourceCommands::from_service(Arc::new(service)),
    }
}

fn tag_refs(ids: &[i32]) -> BTreeSet<ResourceRef> {
    ids.iter().map(|id| ResourceRef::new("tags", id)).collect()
}

fn seed_tags(tags: &MockReader<Tag>, ids: &[i32]) {
    for id in ids {
        let tag = Tag::from_create_params(
            *id,
            TagCreate {
                name: format!("tag-{}", id),
            },
        )
        .unwrap();
        tags.insert(Snapshot::new(tag, Some(1)));
    }
}

fn stored_article(id: i32) -> Snapshot<Article> {
    let article = Article::from_create_params(
        id,
        ArticleCreate {
            title: "Stored".into(),
            body: "Body".into(),
            ..Default::default()
        },
    )
    .unwrap();
    Snapshot::new(article, Some(3))
}

#[tokio::test]
async fn test_invalid_input_makes_no_storage_calls() {
    let h = harness();
    let cancel = CancellationToken::new();

    let unknown = h
        .commands
        .add_to_relationship(&1, "comments", tag_refs(&[1]), &cancel)
        .await
        .unwrap_err();
    let wrong_type = h
        .commands
        .remove_from_relationship(&1, "tags", [ResourceRef::new("people", 1)].into(), &cancel)
        .await
        .unwrap_err();
    let wrong_cardinality = h
        .commands
        .set_relationship(&1, "author", RelationshipValue::ToMany(BTreeSet::new()), &cancel)
        .await
        .unwrap_err();
    let empty_title = h
        .commands
        .update(
            &1,
            ArticlePatch {
                title: Some("  ".into()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap_err();

    for err in [unknown, wrong_type, wrong_cardinality, empty_title] {
        assert!(matches!(err, WriteError::Validation(_)), "got {:?}", err);
    }
    assert!(h.repository.calls().is_empty());
    assert_eq!(h.articles.reads(), 0);
    assert_eq!(h.tags.reads(), 0);
}

#[tokio::test]
async fn test_missing_related_resource_is_reported() {
    let h = harness();
    seed_tags(&h.tags, &[1, 2]);
    let cancel = CancellationToken::new();

    let err = h
        .commands
        .create(
            None,
            ArticleCreate {
                title: "Tagged".into(),
                tags: tag_refs(&[1, 3]),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, WriteError::relationship_not_found("tags", "tags", 3));
    assert!(h.repository.calls().is_empty());
}

#[tokio::test]
async fn test_create_persists_initial_relationships() {
    let h = harness();
    seed_tags(&h.tags, &[1, 2]);
    h.repository.expect_create().return_ok(());
    let cancel = CancellationToken::new();

    let created = h
        .commands
        .create(
            None,
            ArticleCreate {
                title: "Tagged".into(),
                tags: tag_refs(&[1, 2]),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();

    h.repository.verify();
    let calls = h.repository.calls();
    assert!(matches!(&calls[..], [RecordedCall::Create(article)] if article == &created));
    assert_eq!(created.tags, tag_refs(&[1, 2]));
}

#[tokio::test]
async fn test_repository_errors_propagate_unchanged() {
    let h = harness();
    seed_tags(&h.tags, &[1]);
    let cancel = CancellationToken::new();

    let unavailable = WriteError::StorageUnavailable("connection reset".into());
    h.repository
        .expect_set_relationship(1)
        .return_err(unavailable.clone());
    let err = h
        .commands
        .set_relationship(&1, "tags", RelationshipValue::ToMany(tag_refs(&[1])), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, unavailable);

    h.repository
        .expect_add_relationship(2)
        .return_err(WriteError::not_found("articles", 2));
    let err = h
        .commands
        .add_to_relationship(&2, "tags", tag_refs(&[1]), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::not_found("articles", 2));

    h.repository.expect_delete(9).return_ok(false);
    assert!(!h.commands.delete(&9, &cancel).await.unwrap());

    h.repository.verify();
}

#[tokio::test]
async fn test_update_passes_fetched_snapshot_and_flushes() {
    let h = harness();
    let snapshot = stored_article(1);
    h.articles.insert(snapshot.clone());
    h.repository.expect_update(1).return_ok(());
    let cancel = CancellationToken::new();

    h.commands
        .update(
            &1,
            ArticlePatch {
                body: Some("Edited".into()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();

    h.repository.verify();
    let calls = h.repository.calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        RecordedCall::Update { request, database } => {
            assert_eq!(request.body.as_deref(), Some("Edited"));
            assert!(request.title.is_none());
            assert_eq!(database, &snapshot);
        }
        other => panic!("expected an update, got {:?}", other),
    }
    assert!(matches!(calls[1], RecordedCall::Flush(1)));
    // Fetch before the mutation, read back after it.
    assert_eq!(h.articles.reads(), 2);
}

#[tokio::test]
async fn test_update_conflict_is_returned_to_caller() {
    let h = harness();
    h.articles.insert(stored_article(1));
    let conflict = WriteError::ConcurrencyConflict {
        resource_type: "articles".into(),
        id: "1".into(),
        expected: 3,
        actual: 4,
    };
    h.repository.expect_update(1).return_err(conflict.clone());
    let cancel = CancellationToken::new();

    let err = h
        .commands
        .update(
            &1,
            ArticlePatch {
                title: Some("Mine".into()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, conflict);
    // No flush after a failed mutation.
    assert_eq!(h.repository.calls().len(), 1);
}

#[tokio::test]
async fn test_remove_from_relationship_checks_existence() {
    let h = harness();
    seed_tags(&h.tags, &[4]);
    h.repository.expect_delete_relationship(1).return_ok(());
    let cancel = CancellationToken::new();

    h.commands
        .remove_from_relationship(&1, "tags", tag_refs(&[4]), &cancel)
        .await
        .unwrap();

    let err = h
        .commands
        .remove_from_relationship(&1, "tags", tag_refs(&[8]), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::relationship_not_found("tags", "tags", 8));
    h.repository.verify();
}
