//! Plan store: the persisted handoff artifact between calculate and execute.
//!
//! At most one plan exists on disk at a time. Calculate clears any stale
//! plan before writing a fresh one; execute consumes the plan exactly once
//! and deletes it.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The computed per-group buy amounts, in dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub timestamp: DateTime<Utc>,
    pub buys: FxHashMap<String, f64>,
}

impl AllocationPlan {
    /// Wrap freshly computed buys with the current timestamp.
    pub fn new(buys: FxHashMap<String, f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            buys,
        }
    }

    /// Total dollars the plan spends.
    pub fn total(&self) -> f64 {
        self.buys.values().sum()
    }

    /// Serialize to the plan file, overwriting any existing plan.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::PlanWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| Error::PlanWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the persisted plan. A missing file means there is nothing to
    /// execute.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NoPlan(path.to_path_buf())
            } else {
                Error::PlanRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Delete the plan file. Absence counts as success.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::PlanWrite {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buys(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        let plan = AllocationPlan::new(buys(&[("large_cap", 60.0), ("bonds", 40.0)]));
        plan.save(&path).unwrap();

        let loaded = AllocationPlan::load(&path).unwrap();
        assert_eq!(loaded, plan);
        assert!((loaded.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn load_missing_plan_fails_with_no_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        match AllocationPlan::load(&path) {
            Err(Error::NoPlan(p)) => assert_eq!(p, path),
            other => panic!("expected NoPlan, got {other:?}"),
        }
    }

    #[test]
    fn save_overwrites_existing_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        AllocationPlan::new(buys(&[("bonds", 1.0)])).save(&path).unwrap();
        AllocationPlan::new(buys(&[("intl", 2.0)])).save(&path).unwrap();

        let loaded = AllocationPlan::load(&path).unwrap();
        assert_eq!(loaded.buys, buys(&[("intl", 2.0)]));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        AllocationPlan::clear(&path).unwrap();

        AllocationPlan::new(buys(&[("bonds", 1.0)])).save(&path).unwrap();
        AllocationPlan::clear(&path).unwrap();
        assert!(!path.exists());
        AllocationPlan::clear(&path).unwrap();
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("plan.json");
        AllocationPlan::new(buys(&[("bonds", 1.0)])).save(&path).unwrap();
        assert!(path.exists());
    }
}
