use crate::framework::{
    Identifiable, RelationshipDef, RelationshipValue, Resource, WriteError, WriteResult,
};
use serde::{Deserialize, Serialize};

/// A label that can be attached to articles. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// Payload for creating a new tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

/// Partial tag sent by an update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
}

impl Identifiable for Tag {
    type Id = i32;
    const TYPE_NAME: &'static str = "tags";

    fn id(&self) -> &i32 {
        &self.id
    }
}

impl Resource for Tag {
    type Create = TagCreate;
    type Patch = TagPatch;

    fn relationships() -> &'static [RelationshipDef] {
        &[]
    }

    fn from_create_params(id: i32, params: TagCreate) -> WriteResult<Self> {
        Ok(Self {
            id,
            name: params.name,
        })
    }

    fn apply_patch(&mut self, patch: &TagPatch) -> WriteResult<()> {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        Ok(())
    }

    fn relationship(&self, _name: &str) -> Option<RelationshipValue> {
        None
    }

    fn set_relationship(&mut self, name: &str, _value: RelationshipValue) -> WriteResult<()> {
        Err(WriteError::validation(format!("tags has no relationship named '{}'", name)))
    }

    fn validate(&self) -> WriteResult<()> {
        if self.name.trim().is_empty() {
            return Err(WriteError::validation("tag name must not be empty"));
        }
        Ok(())
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}
