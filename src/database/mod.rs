mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoDB;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AssignmentRecord, NamePool, Person, Registrant};
use crate::utils::PoolExhaustion;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("transaction aborted: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Backend(String),
}

/// Chooses the candidate to assign from a snapshot of the pool, read inside
/// the assignment transaction. Called again on every retry of that transaction.
pub type CandidatePicker = Box<dyn Fn(&[Person]) -> Result<Person, PoolExhaustion> + Send + Sync>;

#[derive(Debug)]
pub enum AssignOutcome {
    Assigned(AssignmentRecord),
    /// Nothing was written.
    Exhausted(PoolExhaustion),
}

/// Persistence for the assignment ledger and the name pool.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Looks up the ledger entry for an already lowercased email.
    async fn find_assignment(&self, email: &str) -> Result<Option<AssignmentRecord>, StoreError>;

    /// Atomically reads the pool, lets `pick` choose a candidate, inserts the
    /// ledger entry and removes the candidate from the pool. Either all of it
    /// commits or none of it does. Transient conflicts are retried against a
    /// fresh read of the pool before an error is returned.
    async fn assign_from_pool(
        &self,
        registrant: Registrant,
        pick: CandidatePicker,
    ) -> Result<AssignOutcome, StoreError>;

    async fn name_pool(&self) -> Result<Option<NamePool>, StoreError>;

    /// Inserts the pool document if none exists yet. Returns whether it did.
    async fn seed_pool(&self, people: Vec<Person>) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
