use serde::{Deserialize, Serialize};

use super::Person;

/// `_id` of the singleton pool document.
pub const POOL_ID: &str = "pool";

/// Remaining unassigned candidates. `version` is bumped on every removal and
/// guards the removal update against concurrent writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamePool {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub unassigned: Vec<Person>,
    #[serde(default)]
    pub version: i64,
}

impl NamePool {
    pub fn new(unassigned: Vec<Person>) -> Self {
        Self {
            id: POOL_ID.to_string(),
            unassigned,
            version: 0,
        }
    }

    /// Removes every candidate with exactly this name, mirroring `$pull`.
    /// Returns false (and leaves the version alone) when nothing matched.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.unassigned.len();
        self.unassigned.retain(|person| person.name != name);
        if self.unassigned.len() == before {
            return false;
        }
        self.version += 1;
        true
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.unassigned.iter().any(|person| person.name == name)
    }
}
