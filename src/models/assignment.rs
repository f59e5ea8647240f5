use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Person;

/// The registrant half of an assignment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registrant {
    pub name: String,
    pub email: String, // lowercased, unique across the ledger
    pub password_hash: String,
}

/// Ledger entry. Written once inside the assignment transaction, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub assignment_id: String,
    pub registrant: Registrant,
    pub assigned_person: Person,
    pub created_at: BsonDateTime,
}

impl AssignmentRecord {
    pub fn new(registrant: Registrant, assigned_person: Person) -> Self {
        Self {
            id: None,
            assignment_id: Uuid::new_v4().to_string(),
            registrant,
            assigned_person,
            created_at: BsonDateTime::from_millis(chrono::Utc::now().timestamp_millis()),
        }
    }
}

// Request bodies. Fields are optional so missing values surface as validation
// errors instead of JSON parse failures.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CheckAssignmentRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Single-endpoint form used by the original web client: `action` selects
/// between `create` and `check`.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct SantaRequest {
    pub action: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl From<SantaRequest> for CreateAssignmentRequest {
    fn from(request: SantaRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            name: request.name,
        }
    }
}

impl From<SantaRequest> for CheckAssignmentRequest {
    fn from(request: SantaRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
        }
    }
}
