//! # Store Actor
//!
//! `StoreActor<T>` is the server half of the in-memory storage adapter. It
//! owns the rows of one resource type and processes requests sequentially in
//! its own Tokio task, so each mutation is a single atomic transition: it is
//! applied to a copy of the row and committed in one step, or not at all.

use crate::config::StoreConfig;
use crate::framework::{RelationshipValue, Resource, Snapshot, Version, WriteError, WriteResult};
use crate::store::client::StoreClient;
use crate::store::message::{Response, StoreRequest};
use std::collections::HashMap;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Row<T> {
    resource: T,
    version: Version,
}

/// The actor that owns the stored rows of resource type `T`.
///
/// **Concurrency Model**:
/// Requests from any number of clients are queued on one channel and handled
/// one at a time. No `Mutex` is needed around `rows`, and no two mutations of
/// the same resource can interleave.
///
/// ## Operations
///
/// * **Create**: rejects duplicate ids and unique-key clashes, stores version 1.
/// * **Update**: checks the snapshot version, merges the patch, skips the write
///   when nothing changed, bumps the version otherwise.
/// * **Add / Set / Delete relationship**: edit a copy of the relationship value
///   and commit it only if the membership changed.
/// * **Delete**: reports whether a row was removed.
pub struct StoreActor<T: Resource> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    rows: HashMap<T::Id, Row<T>>,
    versioned: bool,
}

impl<T: Resource> StoreActor<T> {
    /// Creates a new `StoreActor` and its associated `StoreClient`.
    ///
    /// The actor does nothing until [`StoreActor::run`] is spawned.
    pub fn new(config: &StoreConfig) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(config.buffer_size);
        let actor = Self {
            receiver,
            rows: HashMap::new(),
            versioned: config.optimistic_concurrency,
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs the event loop until every client has been dropped.
    pub async fn run(mut self) {
        let resource_type = T::TYPE_NAME;
        info!(resource_type, versioned = self.versioned, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Get { id, respond_to } => {
                    let snapshot = self.snapshot(&id);
                    debug!(resource_type, %id, found = snapshot.is_some(), "Get");
                    let _ = respond_to.send(Ok(snapshot));
                }
                StoreRequest::Create {
                    resource,
                    cancel,
                    respond_to,
                } => {
                    debug!(resource_type, ?resource, "Create");
                    let id = resource.id().clone();
                    let result = live(&cancel).and_then(|_| self.create(resource));
                    self.finish("Created", &id, result, respond_to);
                }
                StoreRequest::Update {
                    patch,
                    database,
                    cancel,
                    respond_to,
                } => {
                    let id = database.resource.id().clone();
                    debug!(resource_type, %id, ?patch, version = ?database.version, "Update");
                    let result = live(&cancel).and_then(|_| self.update(&patch, &database));
                    self.finish("Updated", &id, result, respond_to);
                }
                StoreRequest::AddRelationship {
                    id,
                    relationship,
                    values,
                    cancel,
                    respond_to,
                } => {
                    debug!(resource_type, %id, %relationship, ?values, "AddRelationship");
                    let result = live(&cancel).and_then(|_| {
                        self.mutate_relationship(&id, &relationship, |value| {
                            value.add_members(&values)
                        })
                    });
                    self.finish("Relationship extended", &id, result, respond_to);
                }
                StoreRequest::SetRelationship {
                    id,
                    relationship,
                    value,
                    cancel,
                    respond_to,
                } => {
                    debug!(resource_type, %id, %relationship, ?value, "SetRelationship");
                    let result = live(&cancel).and_then(|_| {
                        self.mutate_relationship(&id, &relationship, |current| {
                            replace(current, value)
                        })
                    });
                    self.finish("Relationship replaced", &id, result, respond_to);
                }
                StoreRequest::DeleteRelationship {
                    id,
                    relationship,
                    values,
                    cancel,
                    respond_to,
                } => {
                    debug!(resource_type, %id, %relationship, ?values, "DeleteRelationship");
                    let result = live(&cancel).and_then(|_| {
                        self.mutate_relationship(&id, &relationship, |value| {
                            value.remove_members(&values)
                        })
                    });
                    self.finish("Relationship trimmed", &id, result, respond_to);
                }
                StoreRequest::Delete {
                    id,
                    cancel,
                    respond_to,
                } => {
                    debug!(resource_type, %id, "Delete");
                    let result = live(&cancel).map(|_| self.rows.remove(&id).is_some());
                    match &result {
                        Ok(true) => info!(resource_type, %id, size = self.rows.len(), "Deleted"),
                        Ok(false) => debug!(resource_type, %id, "Delete of missing resource"),
                        Err(e) => warn!(resource_type, %id, error = %e, "Delete failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(resource_type, size = self.rows.len(), "Shutdown");
    }

    fn snapshot(&self, id: &T::Id) -> Option<Snapshot<T>> {
        self.rows.get(id).map(|row| {
            Snapshot::new(
                row.resource.clone(),
                self.versioned.then_some(row.version),
            )
        })
    }

    /// Logs the outcome of a mutation and answers the caller. `Ok(false)`
    /// means the request was valid but changed nothing.
    fn finish(
        &self,
        op: &'static str,
        id: &dyn Display,
        result: WriteResult<bool>,
        respond_to: Response<()>,
    ) {
        let resource_type = T::TYPE_NAME;
        match &result {
            Ok(true) => info!(resource_type, %id, size = self.rows.len(), "{}", op),
            Ok(false) => debug!(resource_type, %id, "Unchanged"),
            Err(e) => warn!(resource_type, %id, error = %e, "Rejected"),
        }
        let _ = respond_to.send(result.map(|_| ()));
    }

    fn create(&mut self, resource: T) -> WriteResult<bool> {
        let id = resource.id().clone();
        if self.rows.contains_key(&id) {
            return Err(WriteError::constraint(format!(
                "{} {} already exists",
                T::TYPE_NAME,
                id
            )));
        }
        self.check_unique(&resource, None)?;
        self.rows.insert(
            id,
            Row {
                resource,
                version: 1,
            },
        );
        Ok(true)
    }

    fn update(&mut self, patch: &T::Patch, database: &Snapshot<T>) -> WriteResult<bool> {
        let id = database.resource.id();
        let row = self
            .rows
            .get(id)
            .ok_or_else(|| WriteError::not_found(T::TYPE_NAME, id))?;

        if self.versioned {
            if let Some(expected) = database.version {
                if expected != row.version {
                    return Err(WriteError::ConcurrencyConflict {
                        resource_type: T::TYPE_NAME.to_string(),
                        id: id.to_string(),
                        expected,
                        actual: row.version,
                    });
                }
            }
        }

        let mut next = row.resource.clone();
        next.apply_patch(patch)?;
        if next == row.resource {
            return Ok(false);
        }

        let changed: Vec<&str> = T::relationships()
            .iter()
            .filter(|def| next.relationship(def.name) != database.resource.relationship(def.name))
            .map(|def| def.name)
            .collect();
        debug!(resource_type = T::TYPE_NAME, %id, ?changed, "Relationships touched by update");

        self.check_unique(&next, Some(id))?;
        self.commit(next);
        Ok(true)
    }

    fn mutate_relationship(
        &mut self,
        id: &T::Id,
        relationship: &str,
        edit: impl FnOnce(&mut RelationshipValue) -> WriteResult<bool>,
    ) -> WriteResult<bool> {
        let row = self
            .rows
            .get(id)
            .ok_or_else(|| WriteError::not_found(T::TYPE_NAME, id))?;
        let mut value = row.resource.relationship(relationship).ok_or_else(|| {
            WriteError::validation(format!(
                "{} has no relationship named '{}'",
                T::TYPE_NAME,
                relationship
            ))
        })?;

        if !edit(&mut value)? {
            return Ok(false);
        }

        let mut next = row.resource.clone();
        next.set_relationship(relationship, value)?;
        self.check_unique(&next, Some(id))?;
        self.commit(next);
        Ok(true)
    }

    fn commit(&mut self, resource: T) {
        if let Some(row) = self.rows.get_mut(resource.id()) {
            row.resource = resource;
            row.version += 1;
        }
    }

    fn check_unique(&self, candidate: &T, skip: Option<&T::Id>) -> WriteResult<()> {
        for (key, value) in candidate.unique_keys() {
            let clash = self
                .rows
                .iter()
                .filter(|(id, _)| Some(*id) != skip)
                .find(|(_, row)| {
                    row.resource
                        .unique_keys()
                        .iter()
                        .any(|(k, v)| *k == key && *v == value)
                });
            if let Some((id, _)) = clash {
                return Err(WriteError::constraint(format!(
                    "{}.{} '{}' is already used by {}",
                    T::TYPE_NAME,
                    key,
                    value,
                    id
                )));
            }
        }
        Ok(())
    }
}

fn live(cancel: &CancellationToken) -> WriteResult<()> {
    if cancel.is_cancelled() {
        Err(WriteError::Cancelled)
    } else {
        Ok(())
    }
}

fn replace(current: &mut RelationshipValue, value: RelationshipValue) -> WriteResult<bool> {
    if current.cardinality() != value.cardinality() {
        return Err(WriteError::validation(format!(
            "cannot replace a {} relationship with a {} value",
            current.cardinality(),
            value.cardinality()
        )));
    }
    let changed = *current != value;
    *current = value;
    Ok(changed)
}
