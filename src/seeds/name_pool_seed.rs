use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::database::AssignmentStore;
use crate::models::Person;

/// Layout of the organizer's names file: `{ "unassigned": [Person, ...] }`.
#[derive(Debug, Deserialize)]
struct NamesFile {
    unassigned: Vec<Person>,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read names file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid names file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a names file. Entries with a blank name are dropped; repeated names
/// keep only the first entry, since the pool removes candidates by name.
pub fn parse_names(content: &str) -> Result<Vec<Person>, SeedError> {
    let file: NamesFile = serde_json::from_str(content)?;

    let mut seen = HashSet::new();
    let mut people = Vec::with_capacity(file.unassigned.len());

    for mut person in file.unassigned {
        person.name = person.name.trim().to_string();
        if person.name.is_empty() {
            log::warn!("   ⚠️  Skipping pool entry without a name");
            continue;
        }
        if !seen.insert(person.name.clone()) {
            log::warn!("   ⚠️  Skipping duplicate pool entry: {}", person.name);
            continue;
        }
        people.push(person);
    }

    Ok(people)
}

async fn load_names(path: &Path) -> Result<Vec<Person>, SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    parse_names(&content)
}

/// Seeds the name pool from `path` unless a pool already exists.
pub async fn seed_name_pool(store: &dyn AssignmentStore, path: &Path) {
    let people = match load_names(path).await {
        Ok(people) => people,
        Err(e) => {
            log::error!("   ❌ {}", e);
            return;
        }
    };

    let count = people.len();
    match store.seed_pool(people).await {
        Ok(true) => log::info!("   ✅ Name pool seeded with {} candidates", count),
        Ok(false) => log::info!("📋 Name pool already exists, skipping seed"),
        Err(e) => log::error!("   ❌ Failed to seed name pool: {}", e),
    }
}
