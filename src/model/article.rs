use crate::framework::{
    Identifiable, RelationshipDef, RelationshipValue, Resource, ResourceRef, WriteError,
    WriteResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A blog article.
///
/// Relationships:
/// - `author`: to-one, `people`
/// - `tags`: to-many, `tags` (persisted as [`ArticleTag`](super::ArticleTag) links)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub author: Option<ResourceRef>,
    pub tags: BTreeSet<ResourceRef>,
}

/// Payload for creating a new article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleCreate {
    pub title: String,
    pub body: String,
    pub author: Option<ResourceRef>,
    pub tags: BTreeSet<ResourceRef>,
}

/// Partial article sent by an update request.
///
/// `author: Some(None)` clears the author; `author: None` leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<Option<ResourceRef>>,
    pub tags: Option<BTreeSet<ResourceRef>>,
}

const RELATIONSHIPS: &[RelationshipDef] = &[
    RelationshipDef::to_one("author", "people"),
    RelationshipDef::to_many("tags", "tags"),
];

impl Identifiable for Article {
    type Id = i32;
    const TYPE_NAME: &'static str = "articles";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Resource for Article {
    type Create = ArticleCreate;
    type Patch = ArticlePatch;

    fn relationships() -> &'static [RelationshipDef] {
        RELATIONSHIPS
    }

    fn from_create_params(id: i32, params: ArticleCreate) -> WriteResult<Self> {
        Ok(Self {
            id,
            title: params.title,
            body: params.body,
            author: params.author,
            tags: params.tags,
        })
    }

    fn apply_patch(&mut self, patch: &ArticlePatch) -> WriteResult<()> {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        Ok(())
    }

    fn relationship(&self, name: &str) -> Option<RelationshipValue> {
        match name {
            "author" => Some(RelationshipValue::ToOne(self.author.clone())),
            "tags" => Some(RelationshipValue::ToMany(self.tags.clone())),
            _ => None,
        }
    }

    fn set_relationship(&mut self, name: &str, value: RelationshipValue) -> WriteResult<()> {
        match (name, value) {
            ("author", RelationshipValue::ToOne(author)) => self.author = author,
            ("tags", RelationshipValue::ToMany(tags)) => self.tags = tags,
            (name, value) => {
                return Err(WriteError::validation(format!(
                    "cannot assign a {} value to articles.{}",
                    value.cardinality(),
                    name
                )))
            }
        }
        Ok(())
    }

    fn validate(&self) -> WriteResult<()> {
        if self.title.trim().is_empty() {
            return Err(WriteError::validation("article title must not be empty"));
        }
        Ok(())
    }

    fn validate_patch(patch: &ArticlePatch) -> WriteResult<()> {
        match &patch.title {
            Some(title) if title.trim().is_empty() => {
                Err(WriteError::validation("article title must not be empty"))
            }
            _ => Ok(()),
        }
    }

    fn patch_relationships(patch: &ArticlePatch) -> Vec<(&'static str, RelationshipValue)> {
        let mut targeted = Vec::new();
        if let Some(author) = &patch.author {
            targeted.push(("author", RelationshipValue::ToOne(author.clone())));
        }
        if let Some(tags) = &patch.tags {
            targeted.push(("tags", RelationshipValue::ToMany(tags.clone())));
        }
        targeted
    }

    fn set_patch_relationship(
        patch: &mut ArticlePatch,
        name: &str,
        value: RelationshipValue,
    ) -> WriteResult<()> {
        match (name, value) {
            ("author", RelationshipValue::ToOne(author)) => patch.author = Some(author),
            ("tags", RelationshipValue::ToMany(tags)) => patch.tags = Some(tags),
            (name, value) => {
                return Err(WriteError::validation(format!(
                    "cannot assign a {} value to articles.{}",
                    value.cardinality(),
                    name
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article::from_create_params(
            1,
            ArticleCreate {
                title: "Ownership".into(),
                body: "Borrowing rules".into(),
                author: Some(ResourceRef::new("people", "p1")),
                tags: [ResourceRef::new("tags", 1)].into_iter().collect(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_patch_leaves_absent_fields_alone() {
        let mut article = article();
        let original = article.clone();
        article
            .apply_patch(&ArticlePatch {
                body: Some("Lifetimes".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(article.body, "Lifetimes");
        assert_eq!(article.title, original.title);
        assert_eq!(article.author, original.author);
        assert_eq!(article.tags, original.tags);
    }

    #[test]
    fn test_patch_can_clear_author() {
        let mut article = article();
        let patch = ArticlePatch {
            author: Some(None),
            ..Default::default()
        };
        article.apply_patch(&patch).unwrap();
        assert_eq!(article.author, None);
        assert_eq!(
            Article::patch_relationships(&patch),
            vec![("author", RelationshipValue::ToOne(None))]
        );
    }

    #[test]
    fn test_set_relationship_checks_cardinality() {
        let mut article = article();
        let err = article
            .set_relationship("tags", RelationshipValue::ToOne(None))
            .unwrap_err();
        assert!(matches!(err, WriteError::Validation(_)));
        assert!(article.set_relationship("unknown", RelationshipValue::ToOne(None)).is_err());
    }
}
