use crate::framework::{
    Identifiable, RelationshipDef, RelationshipValue, Resource, WriteError, WriteResult,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An article author, synced from an external identity system and therefore
/// keyed by UUID rather than by an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
}

/// Payload for creating a new person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCreate {
    pub name: String,
}

/// Partial person sent by an update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonPatch {
    pub name: Option<String>,
}

impl Identifiable for Person {
    type Id = Uuid;
    const TYPE_NAME: &'static str = "people";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Resource for Person {
    type Create = PersonCreate;
    type Patch = PersonPatch;

    fn relationships() -> &'static [RelationshipDef] {
        &[]
    }

    fn from_create_params(id: Uuid, params: PersonCreate) -> WriteResult<Self> {
        Ok(Self {
            id,
            name: params.name,
        })
    }

    fn apply_patch(&mut self, patch: &PersonPatch) -> WriteResult<()> {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        Ok(())
    }

    fn relationship(&self, _name: &str) -> Option<RelationshipValue> {
        None
    }

    fn set_relationship(&mut self, name: &str, _value: RelationshipValue) -> WriteResult<()> {
        Err(WriteError::validation(format!("people has no relationship named '{}'", name)))
    }
}
