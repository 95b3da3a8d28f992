//! Seed Store (C1): loads a JSON array of seed conversations once at startup
//! and serves random or indexed access to the in-memory corpus.

use std::path::Path;

use rand::seq::SliceRandom;

use crate::model::Seed;

use super::error::{SeedError, SeedResult};

#[derive(Debug, Clone)]
pub struct SeedStore {
    seeds: Vec<Seed>,
}

impl SeedStore {
    pub fn load(path: &Path) -> SeedResult<Self> {
        if !path.exists() {
            return Err(SeedError::NotFound {
                path: path.to_string_lossy().to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }

    fn from_json_str(text: &str, path: &Path) -> SeedResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| SeedError::MalformedSeed {
                index: 0,
                message: e.to_string(),
            })?;
        let array = value.as_array().ok_or_else(|| SeedError::NotAnArray {
            path: path.to_string_lossy().to_string(),
        })?;
        if array.is_empty() {
            return Err(SeedError::Empty {
                path: path.to_string_lossy().to_string(),
            });
        }
        let mut seeds = Vec::with_capacity(array.len());
        for (index, item) in array.iter().enumerate() {
            let seed: Seed =
                serde_json::from_value(item.clone()).map_err(|e| SeedError::MalformedSeed {
                    index,
                    message: e.to_string(),
                })?;
            seeds.push(seed);
        }
        Ok(Self { seeds })
    }

    pub fn count(&self) -> usize {
        self.seeds.len()
    }

    pub fn get(&self, index: usize) -> Option<&Seed> {
        self.seeds.get(index)
    }

    /// Sample one seed with replacement, matching the orchestrator's
    /// "produce N conversations from a corpus smaller or larger than N"
    /// requirement.
    pub fn random(&self) -> &Seed {
        self.seeds
            .choose(&mut rand::thread_rng())
            .expect("SeedStore is never empty after load()")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.seeds.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"[
            {
                "system": "You are a helpful airline agent.",
                "tools": "[{\"name\":\"book_reservation\",\"description\":\"book\",\"parameters\":{\"properties\":{},\"required\":[]}}]",
                "conversations": [
                    {"from": "human", "value": "I want to book a flight."},
                    {"from": "gpt", "value": "Sure, let me help."}
                ]
            }
        ]"#
    }

    #[test]
    fn loads_seeds_from_json_array() {
        let store = SeedStore::from_json_str(sample_json(), Path::new("seeds.json")).unwrap();
        assert_eq!(store.count(), 1);
        assert!(store.get(0).is_some());
        assert!(store.get(1).is_none());
    }

    #[test]
    fn rejects_non_array_json() {
        let err = SeedStore::from_json_str("{}", Path::new("seeds.json")).unwrap_err();
        assert!(matches!(err, SeedError::NotAnArray { .. }));
    }

    #[test]
    fn rejects_empty_array() {
        let err = SeedStore::from_json_str("[]", Path::new("seeds.json")).unwrap_err();
        assert!(matches!(err, SeedError::Empty { .. }));
    }

    #[test]
    fn random_returns_a_seed_when_corpus_nonempty() {
        let store = SeedStore::from_json_str(sample_json(), Path::new("seeds.json")).unwrap();
        let seed = store.random();
        assert!(seed.system.contains("airline"));
    }
}
