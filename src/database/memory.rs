use async_trait::async_trait;
use std::sync::Mutex;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use super::{AssignOutcome, AssignmentStore, CandidatePicker, StoreError};
use crate::models::{AssignmentRecord, NamePool, Person, Registrant};

#[derive(Default)]
struct MemoryState {
    assignments: Vec<AssignmentRecord>,
    pool: Option<NamePool>,
}

/// In-process store. The whole state sits behind one mutex, so every
/// `assign_from_pool` call behaves like a serializable transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    #[cfg(test)]
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_pool(people: Vec<Person>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.pool = Some(NamePool::new(people));
        }
        store
    }

    /// Makes the next assignment abort right before commit.
    #[cfg(test)]
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn assignments(&self) -> Vec<AssignmentRecord> {
        self.state
            .lock()
            .map(|state| state.assignments.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Backend(format!("memory store poisoned: {}", e)))
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn find_assignment(&self, email: &str) -> Result<Option<AssignmentRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .assignments
            .iter()
            .find(|record| record.registrant.email == email)
            .cloned())
    }

    async fn assign_from_pool(
        &self,
        registrant: Registrant,
        pick: CandidatePicker,
    ) -> Result<AssignOutcome, StoreError> {
        let mut state = self.lock()?;

        let candidates = state
            .pool
            .as_ref()
            .map(|pool| pool.unassigned.as_slice())
            .unwrap_or(&[]);
        let person = match pick(candidates) {
            Ok(person) => person,
            Err(exhaustion) => return Ok(AssignOutcome::Exhausted(exhaustion)),
        };

        // Unique index on registrant.email
        if state
            .assignments
            .iter()
            .any(|record| record.registrant.email == registrant.email)
        {
            return Err(StoreError::Duplicate(registrant.email));
        }

        #[cfg(test)]
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Conflict("injected commit failure".to_string()));
        }

        let removed = state
            .pool
            .as_mut()
            .map(|pool| pool.remove(&person.name))
            .unwrap_or(false);
        if !removed {
            return Err(StoreError::Conflict(format!(
                "candidate {} is no longer in the pool",
                person.name
            )));
        }

        let record = AssignmentRecord::new(registrant, person);
        state.assignments.push(record.clone());
        Ok(AssignOutcome::Assigned(record))
    }

    async fn name_pool(&self) -> Result<Option<NamePool>, StoreError> {
        Ok(self.lock()?.pool.clone())
    }

    async fn seed_pool(&self, people: Vec<Person>) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        if state.pool.is_some() {
            return Ok(false);
        }
        state.pool = Some(NamePool::new(people));
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PoolExhaustion;

    fn person(name: &str) -> Person {
        Person {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            drive_link: format!("https://drive.example/{}", name.to_lowercase()),
            description: format!("{} likes socks", name),
        }
    }

    fn registrant(email: &str) -> Registrant {
        Registrant {
            name: "Registrant".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    fn first() -> CandidatePicker {
        Box::new(|candidates: &[Person]| candidates.first().cloned().ok_or(PoolExhaustion::Empty))
    }

    #[tokio::test]
    async fn test_assign_removes_candidate_and_records_ledger_entry() {
        let store = MemoryStore::with_pool(vec![person("Alice"), person("Bob")]);

        let outcome = store.assign_from_pool(registrant("r@x.com"), first()).await.unwrap();
        let AssignOutcome::Assigned(record) = outcome else {
            panic!("expected an assignment");
        };
        assert_eq!(record.assigned_person.name, "Alice");

        let pool = store.name_pool().await.unwrap().unwrap();
        assert!(!pool.contains("Alice"));
        assert_eq!(pool.version, 1);
        assert!(store.find_assignment("r@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_without_touching_pool() {
        let store = MemoryStore::with_pool(vec![person("Alice"), person("Bob")]);
        store.assign_from_pool(registrant("r@x.com"), first()).await.unwrap();

        let err = store.assign_from_pool(registrant("r@x.com"), first()).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.name_pool().await.unwrap().unwrap().unassigned.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_pool_reports_exhaustion() {
        let store = MemoryStore::new();
        let outcome = store.assign_from_pool(registrant("r@x.com"), first()).await.unwrap();
        assert!(matches!(outcome, AssignOutcome::Exhausted(PoolExhaustion::Empty)));
        assert!(store.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_picked_candidate_absent_from_pool_aborts() {
        let store = MemoryStore::with_pool(vec![person("Alice")]);
        let stale: CandidatePicker = Box::new(|_: &[Person]| Ok(person("Zed")));

        let err = store.assign_from_pool(registrant("r@x.com"), stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.assignments().is_empty());
        assert_eq!(store.name_pool().await.unwrap().unwrap().version, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stale_picks_racing_for_one_candidate_commit_once() {
        let store = std::sync::Arc::new(MemoryStore::with_pool(vec![person("Alice"), person("Bob")]));
        let snapshot = store.name_pool().await.unwrap().unwrap().unassigned;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let snapshot = snapshot.clone();
                tokio::spawn(async move {
                    // Decides from the pool as it looked before anyone committed
                    let stale: CandidatePicker =
                        Box::new(move |_: &[Person]| Ok(snapshot[0].clone()));
                    store
                        .assign_from_pool(registrant(&format!("r{}@x.com", i)), stale)
                        .await
                })
            })
            .collect();

        let mut assigned = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(AssignOutcome::Assigned(record)) => {
                    assert_eq!(record.assigned_person.name, "Alice");
                    assigned += 1;
                }
                Err(StoreError::Conflict(_)) => conflicts += 1,
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(assigned, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(store.assignments().len(), 1);
        let pool = store.name_pool().await.unwrap().unwrap();
        assert_eq!(pool.version, 1);
        assert!(pool.contains("Bob"));
        assert!(!pool.contains("Alice"));
    }

    #[tokio::test]
    async fn test_seed_pool_only_once() {
        let store = MemoryStore::new();
        assert!(store.seed_pool(vec![person("Alice")]).await.unwrap());
        assert!(!store.seed_pool(vec![person("Bob")]).await.unwrap());
        let pool = store.name_pool().await.unwrap().unwrap();
        assert!(pool.contains("Alice"));
        assert!(!pool.contains("Bob"));
    }
}
