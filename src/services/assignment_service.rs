use rand::Rng;
use std::sync::Arc;

use crate::{
    api::metrics,
    database::{AssignOutcome, AssignmentStore, CandidatePicker, StoreError},
    models::{
        AssignmentView, CheckAssignmentRequest, CreateAssignmentRequest, Credentials,
        NewRegistration, Person, Registrant,
    },
    utils::{AppError, PoolExhaustion},
};

// Hashed once at startup and verified against when the email is unknown,
// so a miss costs the same as a wrong password.
const DUMMY_PASSWORD: &str = "not-a-registrant-password";

/// Picks a candidate uniformly at random, never the registrant themselves.
pub fn select_candidate<R: Rng>(
    candidates: &[Person],
    registrant_name: &str,
    rng: &mut R,
) -> Result<Person, PoolExhaustion> {
    if candidates.is_empty() {
        return Err(PoolExhaustion::Empty);
    }

    let eligible: Vec<&Person> = candidates
        .iter()
        .filter(|person| !person.has_name(registrant_name))
        .collect();

    if eligible.is_empty() {
        return Err(PoolExhaustion::OnlySelf);
    }

    let index = rng.random_range(0..eligible.len());
    Ok(eligible[index].clone())
}

/// Logs the store detail that the caller-facing error deliberately drops.
fn store_failure(err: StoreError) -> AppError {
    match &err {
        StoreError::Duplicate(_) => log::warn!("⚠️  Unique index rejected insert: {}", err),
        StoreError::Conflict(_) => log::warn!("⚠️  Assignment transaction aborted: {}", err),
        _ => log::error!("❌ Store error: {}", err),
    }
    err.into()
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            log::error!("❌ Password hashing task failed: {}", e);
            AppError::AssignmentFailed
        })?
        .map_err(|e| {
            log::error!("❌ Password hashing failed: {}", e);
            AppError::AssignmentFailed
        })
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            log::error!("❌ Password verification task failed: {}", e);
            AppError::AssignmentFailed
        })?
        .map_err(|e| {
            log::error!("❌ Stored password hash is unreadable: {}", e);
            AppError::AssignmentFailed
        })
}

pub struct AssignmentService {
    store: Arc<dyn AssignmentStore>,
    bcrypt_cost: u32,
    dummy_hash: String,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn AssignmentStore>, bcrypt_cost: u32) -> Result<Self, bcrypt::BcryptError> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, bcrypt_cost)?;
        Ok(Self {
            store,
            bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &dyn AssignmentStore {
        self.store.as_ref()
    }

    /// Registers a new participant and draws their recipient from the pool.
    pub async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<AssignmentView, AppError> {
        let registration = NewRegistration::parse(request)?;

        if self
            .store
            .find_assignment(&registration.email)
            .await
            .map_err(store_failure)?
            .is_some()
        {
            return Err(AppError::DuplicateRegistration);
        }

        let password_hash = hash_password(registration.password, self.bcrypt_cost).await?;
        let registrant = Registrant {
            name: registration.name.clone(),
            email: registration.email,
            password_hash,
        };

        let own_name = registration.name;
        let pick: CandidatePicker = Box::new(move |candidates: &[Person]| {
            select_candidate(candidates, &own_name, &mut rand::rng())
        });

        let outcome = self
            .store
            .assign_from_pool(registrant, pick)
            .await
            .map_err(store_failure)?;

        match outcome {
            AssignOutcome::Assigned(record) => {
                metrics::increment_assignments_created();
                log::info!(
                    "🎁 Assignment {} created for {}",
                    record.assignment_id,
                    record.registrant.email
                );
                Ok(AssignmentView::from(&record.assigned_person))
            }
            AssignOutcome::Exhausted(reason) => Err(AppError::PoolExhausted(reason)),
        }
    }

    /// Returns the stored assignment for a credential pair. Read-only.
    pub async fn check_assignment(
        &self,
        request: &CheckAssignmentRequest,
    ) -> Result<AssignmentView, AppError> {
        let credentials = Credentials::parse(request)?;
        metrics::increment_assignment_checks();

        let record = self
            .store
            .find_assignment(&credentials.email)
            .await
            .map_err(store_failure)?;
        let hash = record
            .as_ref()
            .map(|r| r.registrant.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());

        let fits_hash = credentials.password_fits_hash();
        let valid = verify_password(credentials.password, hash).await?;

        match record {
            Some(record) if valid && fits_hash => Ok(AssignmentView::from(&record.assigned_person)),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    pub async fn is_store_healthy(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("⚠️  Store health check failed: {}", e);
                false
            }
        }
    }
}
