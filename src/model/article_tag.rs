//! Link records backing the many-to-many edge between articles and tags.
//!
//! [`ArticleTag`] is the plain join row: it only exists as a side effect of the
//! `tags` relationship of an [`Article`]. [`IdentifiableArticleTag`] is the same
//! edge exposed as its own resource type, with a surrogate id and metadata.

use crate::framework::{
    Identifiable, RelationshipDef, RelationshipValue, Resource, ResourceRef, WriteError,
    WriteResult,
};
use crate::model::{Article, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Join row identified by the ordered pair `(article_id, tag_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleTag {
    pub article_id: i32,
    pub tag_id: i32,
}

impl ArticleTag {
    /// The link rows implied by the current `tags` of `article`.
    pub fn links_of(article: &Article) -> WriteResult<Vec<ArticleTag>> {
        let links: BTreeSet<ArticleTag> = article
            .tags
            .iter()
            .map(|tag| {
                Ok(ArticleTag {
                    article_id: article.id,
                    tag_id: tag.parse_id::<i32>()?,
                })
            })
            .collect::<WriteResult<_>>()?;
        Ok(links.into_iter().collect())
    }
}

/// An article-tag edge addressable as a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiableArticleTag {
    pub id: i32,
    pub article: ResourceRef,
    pub tag: ResourceRef,
    pub some_meta_data: Option<String>,
}

/// Payload for creating a new link record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifiableArticleTagCreate {
    pub article: ResourceRef,
    pub tag: ResourceRef,
    pub some_meta_data: Option<String>,
}

/// Partial link record sent by an update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiableArticleTagPatch {
    pub article: Option<ResourceRef>,
    pub tag: Option<ResourceRef>,
    pub some_meta_data: Option<Option<String>>,
}

const RELATIONSHIPS: &[RelationshipDef] = &[
    RelationshipDef::to_one("article", Article::TYPE_NAME),
    RelationshipDef::to_one("tag", Tag::TYPE_NAME),
];

impl IdentifiableArticleTag {
    /// The plain join row this resource represents.
    pub fn link(&self) -> WriteResult<ArticleTag> {
        Ok(ArticleTag {
            article_id: self.article.parse_id()?,
            tag_id: self.tag.parse_id()?,
        })
    }
}

fn required(name: &str, value: RelationshipValue) -> WriteResult<ResourceRef> {
    match value {
        RelationshipValue::ToOne(Some(reference)) => Ok(reference),
        RelationshipValue::ToOne(None) => Err(WriteError::validation(format!(
            "article-tags.{} is required and cannot be cleared",
            name
        ))),
        RelationshipValue::ToMany(_) => Err(WriteError::validation(format!(
            "article-tags.{} is to-one",
            name
        ))),
    }
}

impl Identifiable for IdentifiableArticleTag {
    type Id = i32;
    const TYPE_NAME: &'static str = "article-tags";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Resource for IdentifiableArticleTag {
    type Create = IdentifiableArticleTagCreate;
    type Patch = IdentifiableArticleTagPatch;

    fn relationships() -> &'static [RelationshipDef] {
        RELATIONSHIPS
    }

    fn from_create_params(id: i32, params: IdentifiableArticleTagCreate) -> WriteResult<Self> {
        Ok(Self {
            id,
            article: params.article,
            tag: params.tag,
            some_meta_data: params.some_meta_data,
        })
    }

    fn apply_patch(&mut self, patch: &IdentifiableArticleTagPatch) -> WriteResult<()> {
        if let Some(article) = &patch.article {
            self.article = article.clone();
        }
        if let Some(tag) = &patch.tag {
            self.tag = tag.clone();
        }
        if let Some(meta) = &patch.some_meta_data {
            self.some_meta_data = meta.clone();
        }
        Ok(())
    }

    fn relationship(&self, name: &str) -> Option<RelationshipValue> {
        match name {
            "article" => Some(RelationshipValue::to_one(self.article.clone())),
            "tag" => Some(RelationshipValue::to_one(self.tag.clone())),
            _ => None,
        }
    }

    fn set_relationship(&mut self, name: &str, value: RelationshipValue) -> WriteResult<()> {
        match name {
            "article" => self.article = required(name, value)?,
            "tag" => self.tag = required(name, value)?,
            _ => {
                return Err(WriteError::validation(format!(
                    "article-tags has no relationship named '{}'",
                    name
                )))
            }
        }
        Ok(())
    }

    fn validate(&self) -> WriteResult<()> {
        self.link().map(|_| ())
    }

    fn patch_relationships(
        patch: &IdentifiableArticleTagPatch,
    ) -> Vec<(&'static str, RelationshipValue)> {
        let mut targeted = Vec::new();
        if let Some(article) = &patch.article {
            targeted.push(("article", RelationshipValue::to_one(article.clone())));
        }
        if let Some(tag) = &patch.tag {
            targeted.push(("tag", RelationshipValue::to_one(tag.clone())));
        }
        targeted
    }

    fn set_patch_relationship(
        patch: &mut IdentifiableArticleTagPatch,
        name: &str,
        value: RelationshipValue,
    ) -> WriteResult<()> {
        match name {
            "article" => patch.article = Some(required(name, value)?),
            "tag" => patch.tag = Some(required(name, value)?),
            _ => {
                return Err(WriteError::validation(format!(
                    "article-tags has no relationship named '{}'",
                    name
                )))
            }
        }
        Ok(())
    }

    /// The ordered pair is the natural identity of the edge, compared on the
    /// parsed ids.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let pair = match self.link() {
            Ok(link) => format!("{}:{}", link.article_id, link.tag_id),
            Err(_) => format!("{}:{}", self.article.id, self.tag.id),
        };
        vec![("article_tag", pair)]
    }
}
