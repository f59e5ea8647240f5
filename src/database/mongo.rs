use async_trait::async_trait;
use futures::FutureExt;
use mongodb::{
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{ClientOptions, IndexOptions, ReadConcern, WriteConcern},
    Client, ClientSession, Collection, Database, IndexModel,
};
use std::time::Duration;

use super::{AssignOutcome, AssignmentStore, CandidatePicker, StoreError};
use crate::models::{AssignmentRecord, NamePool, Person, Registrant, POOL_ID};

const ASSIGNMENTS: &str = "assignments";
const NAME_POOL: &str = "name_pool";

const DUPLICATE_KEY: i32 = 11000;
const WRITE_CONFLICT: i32 = 112;

/// Raised inside the transaction callback when the guarded `$pull` matched
/// nothing. Carries the candidate's name.
#[derive(Debug)]
struct PoolChanged(String);

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        if let Some(PoolChanged(name)) = err.get_custom::<PoolChanged>() {
            return StoreError::Conflict(format!("pool changed while assigning {}", name));
        }

        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY => {
                return StoreError::Duplicate(e.message.clone());
            }
            ErrorKind::Command(e) if e.code == DUPLICATE_KEY => {
                return StoreError::Duplicate(e.message.clone());
            }
            _ => {}
        }

        if err.contains_label(TRANSIENT_TRANSACTION_ERROR)
            || err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
        {
            return StoreError::Conflict(err.to_string());
        }

        match err.kind.as_ref() {
            ErrorKind::Command(e) if e.code == WRITE_CONFLICT => StoreError::Conflict(err.to_string()),
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// MongoDB-backed store. Transactions need a replica set or sharded cluster.
#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
    commit_timeout: Duration,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str, commit_timeout: Duration) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self {
            client,
            db,
            commit_timeout,
        };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the unique ledger index and backfills the pool version.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        let email_index = IndexModel::builder()
            .keys(doc! { "registrant.email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("registrant_email_unique".to_string())
                    .build(),
            )
            .build();

        // A missing unique index would let a racing insert through, so this one is fatal.
        self.assignments_collection().create_index(email_index).await?;
        log::info!("   ✅ Index ready: assignments(registrant.email) unique");

        let backfill = self
            .pool_collection()
            .update_one(
                doc! { "_id": POOL_ID, "version": { "$exists": false } },
                doc! { "$set": { "version": 0_i64 } },
            )
            .await?;
        if backfill.modified_count > 0 {
            log::info!("   ✅ Pool version initialised");
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    fn assignments_collection(&self) -> Collection<AssignmentRecord> {
        self.db.collection(ASSIGNMENTS)
    }

    fn pool_collection(&self) -> Collection<NamePool> {
        self.db.collection(NAME_POOL)
    }
}

/// State handed to every attempt of the assignment transaction. The driver may
/// run an attempt more than once, so nothing in here is consumed.
struct AssignAttempt<'a> {
    store: &'a MongoDB,
    registrant: Registrant,
    pick: CandidatePicker,
}

/// One attempt: read the pool, pick, insert the ledger entry, pull the
/// candidate. Transient errors are returned untouched so the driver retries.
async fn attempt_assignment(
    session: &mut ClientSession,
    attempt: &mut AssignAttempt<'_>,
) -> Result<AssignOutcome, MongoError> {
    let pool = attempt
        .store
        .pool_collection()
        .find_one(doc! { "_id": POOL_ID })
        .session(&mut *session)
        .await?;

    let (candidates, version) = match &pool {
        Some(pool) => (pool.unassigned.as_slice(), pool.version),
        None => (&[][..], 0),
    };
    let person = match (attempt.pick)(candidates) {
        Ok(person) => person,
        Err(exhaustion) => {
            // Nothing was written; abort so the driver skips the commit
            if let Err(e) = session.abort_transaction().await {
                log::warn!("⚠️  Failed to abort read-only assignment transaction: {}", e);
            }
            return Ok(AssignOutcome::Exhausted(exhaustion));
        }
    };

    let record = AssignmentRecord::new(attempt.registrant.clone(), person);
    attempt
        .store
        .assignments_collection()
        .insert_one(&record)
        .session(&mut *session)
        .await?;

    let removal = attempt
        .store
        .pool_collection()
        .update_one(
            doc! {
                "_id": POOL_ID,
                "version": version,
                "unassigned.name": &record.assigned_person.name,
            },
            doc! {
                "$pull": { "unassigned": { "name": &record.assigned_person.name } },
                "$inc": { "version": 1_i64 },
            },
        )
        .session(&mut *session)
        .await?;

    if removal.modified_count != 1 {
        return Err(MongoError::custom(PoolChanged(
            record.assigned_person.name.clone(),
        )));
    }

    Ok(AssignOutcome::Assigned(record))
}

#[async_trait]
impl AssignmentStore for MongoDB {
    async fn find_assignment(&self, email: &str) -> Result<Option<AssignmentRecord>, StoreError> {
        Ok(self
            .assignments_collection()
            .find_one(doc! { "registrant.email": email })
            .await?)
    }

    async fn assign_from_pool(
        &self,
        registrant: Registrant,
        pick: CandidatePicker,
    ) -> Result<AssignOutcome, StoreError> {
        let mut session = self.client.start_session().await?;
        let attempt = AssignAttempt {
            store: self,
            registrant,
            pick,
        };

        // Retries transient errors and unknown commit results, re-reading the pool each time
        let outcome = session
            .start_transaction()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::majority())
            .max_commit_time(self.commit_timeout)
            .and_run(attempt, |session, attempt| {
                attempt_assignment(session, attempt).boxed()
            })
            .await?;

        Ok(outcome)
    }

    async fn name_pool(&self) -> Result<Option<NamePool>, StoreError> {
        Ok(self.pool_collection().find_one(doc! { "_id": POOL_ID }).await?)
    }

    async fn seed_pool(&self, people: Vec<Person>) -> Result<bool, StoreError> {
        let existing = self
            .pool_collection()
            .count_documents(doc! { "_id": POOL_ID })
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        match self.pool_collection().insert_one(NamePool::new(people)).await {
            Ok(_) => Ok(true),
            // Another instance seeded it first
            Err(e) => match StoreError::from(e) {
                StoreError::Duplicate(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
