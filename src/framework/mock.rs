//! # Test Doubles
//!
//! `MockRepository<T>` implements [`WriteRepository`] entirely in memory from
//! a queue of expectations, and `MockReader<T>` is a map-backed
//! [`ResourceReader`]. Together they let you test the write service's
//! orchestration without starting a storage actor.
//!
//! ## When to use Mocks vs the Real Store
//!
//! | Feature | MockRepository | StoreClient |
//! |---------|----------------|-------------|
//! | **State** | None (scripted responses) | Real versioned rows |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires specific state) |
//! | **Use Case** | Service logic around the repository | Repository semantics, full system |
//!
//! ## Example
//!
//! ```rust
//! use jsonapi_write::framework::mock::MockRepository;
//! use jsonapi_write::framework::{WriteError, WriteRepository};
//! use jsonapi_write::model::Tag;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockRepository::<Tag>::new();
//!     mock.expect_delete(3).return_ok(false);
//!     mock.expect_delete(4)
//!         .return_err(WriteError::StorageUnavailable("timeout".into()));
//!
//!     let cancel = CancellationToken::new();
//!     assert_eq!(mock.delete(&3, &cancel).await, Ok(false));
//!     assert!(mock.delete(&4, &cancel).await.is_err());
//!     mock.verify();
//! }
//! ```

use crate::framework::error::{WriteError, WriteResult};
use crate::framework::identity::ResourceRef;
use crate::framework::relationship::RelationshipValue;
use crate::framework::repository::{ResourceReader, Snapshot, WriteRepository};
use crate::framework::resource::Resource;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

// =============================================================================
// EXPECTATIONS
// =============================================================================

/// A scripted repository response.
enum Expectation<T: Resource> {
    Create {
        response: WriteResult<()>,
    },
    AddRelationship {
        id: T::Id,
        response: WriteResult<()>,
    },
    Update {
        id: T::Id,
        response: WriteResult<()>,
    },
    SetRelationship {
        id: T::Id,
        response: WriteResult<()>,
    },
    Delete {
        id: T::Id,
        response: WriteResult<bool>,
    },
    DeleteRelationship {
        id: T::Id,
        response: WriteResult<()>,
    },
}

/// A call the mock received, in arrival order.
#[derive(Debug, Clone)]
pub enum RecordedCall<T: Resource> {
    Create(T),
    AddRelationship {
        id: T::Id,
        relationship: String,
        values: BTreeSet<ResourceRef>,
    },
    Update {
        request: T::Patch,
        database: Snapshot<T>,
    },
    SetRelationship {
        id: T::Id,
        relationship: String,
        value: RelationshipValue,
    },
    Delete(T::Id),
    DeleteRelationship {
        id: T::Id,
        relationship: String,
        values: BTreeSet<ResourceRef>,
    },
    Flush(T::Id),
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// Fluent builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T: Resource, R> {
    expectations: Queue<T>,
    build: Box<dyn FnOnce(WriteResult<R>) -> Expectation<T> + Send>,
}

impl<T: Resource, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: WriteError) {
        self.push(Err(error));
    }

    fn push(self, response: WriteResult<R>) {
        let expectation = (self.build)(response);
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

// =============================================================================
// MOCK REPOSITORY
// =============================================================================

/// A [`WriteRepository`] driven by expectations.
///
/// Requests are matched against the expectations in FIFO order; an
/// unexpected request panics.
pub struct MockRepository<T: Resource> {
    expectations: Queue<T>,
    calls: Mutex<Vec<RecordedCall<T>>>,
}

impl<T: Resource> Default for MockRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> MockRepository<T> {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn builder<R>(
        &self,
        build: impl FnOnce(WriteResult<R>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            build: Box::new(build),
        }
    }

    pub fn expect_create(&self) -> ExpectationBuilder<T, ()> {
        self.builder(|response| Expectation::Create { response })
    }

    pub fn expect_add_relationship(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::AddRelationship { id, response })
    }

    pub fn expect_update(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    pub fn expect_set_relationship(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::SetRelationship { id, response })
    }

    pub fn expect_delete(&self, id: T::Id) -> ExpectationBuilder<T, bool> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    pub fn expect_delete_relationship(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::DeleteRelationship { id, response })
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall<T>> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn record(&self, call: RecordedCall<T>) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&self) -> Option<Expectation<T>> {
        self.expectations.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl<T: Resource> WriteRepository<T> for MockRepository<T> {
    async fn create(&self, resource: T, _cancel: &CancellationToken) -> WriteResult<()> {
        self.record(RecordedCall::Create(resource));
        match self.next() {
            Some(Expectation::Create { response }) => response,
            _ => panic!("Unexpected create or expectation mismatch"),
        }
    }

    async fn add_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: BTreeSet<ResourceRef>,
        _cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.record(RecordedCall::AddRelationship {
            id: id.clone(),
            relationship: relationship.to_string(),
            values: new_values,
        });
        match self.next() {
            Some(Expectation::AddRelationship { id: expected, response }) if &expected == id => {
                response
            }
            _ => panic!("Unexpected add_relationship or expectation mismatch"),
        }
    }

    async fn update(
        &self,
        request: &T::Patch,
        database: &Snapshot<T>,
        _cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.record(RecordedCall::Update {
            request: request.clone(),
            database: database.clone(),
        });
        match self.next() {
            Some(Expectation::Update { id, response }) if &id == database.resource.id() => {
                response
            }
            _ => panic!("Unexpected update or expectation mismatch"),
        }
    }

    async fn set_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        new_values: RelationshipValue,
        _cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.record(RecordedCall::SetRelationship {
            id: id.clone(),
            relationship: relationship.to_string(),
            value: new_values,
        });
        match self.next() {
            Some(Expectation::SetRelationship { id: expected, response }) if &expected == id => {
                response
            }
            _ => panic!("Unexpected set_relationship or expectation mismatch"),
        }
    }

    async fn delete(&self, id: &T::Id, _cancel: &CancellationToken) -> WriteResult<bool> {
        self.record(RecordedCall::Delete(id.clone()));
        match self.next() {
            Some(Expectation::Delete { id: expected, response }) if &expected == id => response,
            _ => panic!("Unexpected delete or expectation mismatch"),
        }
    }

    async fn delete_relationship(
        &self,
        id: &T::Id,
        relationship: &str,
        removal_values: BTreeSet<ResourceRef>,
        _cancel: &CancellationToken,
    ) -> WriteResult<()> {
        self.record(RecordedCall::DeleteRelationship {
            id: id.clone(),
            relationship: relationship.to_string(),
            values: removal_values,
        });
        match self.next() {
            Some(Expectation::DeleteRelationship { id: expected, response })
                if &expected == id =>
            {
                response
            }
            _ => panic!("Unexpected delete_relationship or expectation mismatch"),
        }
    }

    fn flush_from_cache(&self, resource: &T) {
        self.record(RecordedCall::Flush(resource.id().clone()));
    }
}

// =============================================================================
// MOCK READER
// =============================================================================

/// Map-backed [`ResourceReader`] that counts reads.
pub struct MockReader<T: Resource> {
    rows: Mutex<HashMap<T::Id, Snapshot<T>>>,
    failure: Mutex<Option<WriteError>>,
    reads: AtomicUsize,
}

impl<T: Resource> Default for MockReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> MockReader<T> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    /// Inserts or replaces a row.
    pub fn insert(&self, snapshot: Snapshot<T>) {
        let id = snapshot.resource.id().clone();
        self.rows.lock().unwrap().insert(id, snapshot);
    }

    pub fn remove(&self, id: &T::Id) {
        self.rows.lock().unwrap().remove(id);
    }

    /// Makes the next read fail with `error`.
    pub fn fail_next(&self, error: WriteError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Resource> ResourceReader<T> for MockReader<T> {
    async fn get(&self, id: &T::Id) -> WriteResult<Option<Snapshot<T>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }
}
