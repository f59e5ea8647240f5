use serde::{Deserialize, Serialize};

/// A candidate in the name pool, and the target of an assignment once drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub drive_link: String,
    #[serde(default)]
    pub description: String,
}

impl Person {
    /// Case-insensitive name comparison used for self-exclusion.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// What a registrant gets to see about the person they were assigned.
/// The candidate's own email stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub name: String,
    pub description: String,
    pub drive_link: String,
}

impl From<&Person> for AssignmentView {
    fn from(person: &Person) -> Self {
        Self {
            name: person.name.clone(),
            description: person.description.clone(),
            drive_link: person.drive_link.clone(),
        }
    }
}
