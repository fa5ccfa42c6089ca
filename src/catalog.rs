//! Read access to the exercise database: the bundled entries shipped with the
//! binary, unioned with the user's custom exercises.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{db::KvStore, models::Exercise};

pub const CUSTOM_EXERCISES_KEY: &str = "custom_exercises";

static BUNDLED_EXERCISES: &str = include_str!("../data/exercises.json");

/// Lookup seam used by validation and session loading.
pub trait ExerciseCatalog {
    fn exercises(&self) -> &[Exercise];

    /// First entry with the given id, in catalog order.
    fn find(&self, id: &str) -> Option<&Exercise> {
        self.exercises().iter().find(|e| e.id == id)
    }
}

impl ExerciseCatalog for [Exercise] {
    fn exercises(&self) -> &[Exercise] {
        self
    }
}

impl ExerciseCatalog for Vec<Exercise> {
    fn exercises(&self) -> &[Exercise] {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Bundled entries followed by custom ones.
    all: Vec<Exercise>,
    bundled_len: usize,
}

impl ExerciseCatalog for Catalog {
    fn exercises(&self) -> &[Exercise] {
        &self.all
    }
}

impl Catalog {
    pub fn new(bundled: Vec<Exercise>, custom: Vec<Exercise>) -> Self {
        let bundled_len = bundled.len();
        let mut all = bundled;
        all.extend(custom);
        Self { all, bundled_len }
    }

    /// Loads the bundled list (from `override_path` when given) and the
    /// persisted custom list. Unreadable data on either side yields an empty
    /// list for that side rather than an error.
    pub async fn load(kv: &KvStore, override_path: Option<&Path>) -> Self {
        let bundled = match override_path {
            Some(path) => load_bundled_file(path).await,
            None => parse_exercises(BUNDLED_EXERCISES).unwrap_or_else(|err| {
                warn!("bundled exercise database is corrupt: {err:#}");
                Vec::new()
            }),
        };

        let custom = match kv.get_json::<Vec<Exercise>>(CUSTOM_EXERCISES_KEY).await {
            Ok(list) => list.unwrap_or_default(),
            Err(err) => {
                warn!("ignoring custom exercises: {err:#}");
                Vec::new()
            }
        };

        debug!(bundled = bundled.len(), custom = custom.len(), "catalog loaded");
        Self::new(bundled, custom)
    }

    pub fn bundled(&self) -> &[Exercise] {
        &self.all[..self.bundled_len]
    }

    pub fn custom(&self) -> &[Exercise] {
        &self.all[self.bundled_len..]
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Appends a custom exercise. Refused when the id is already taken.
    pub fn add_custom(&mut self, exercise: Exercise) -> bool {
        if self.find(&exercise.id).is_some() {
            return false;
        }
        self.all.push(Exercise {
            is_custom: true,
            ..exercise
        });
        true
    }

    /// Removes a custom exercise. Bundled entries cannot be removed.
    pub fn remove_custom(&mut self, id: &str) -> Option<Exercise> {
        let pos = self.custom().iter().position(|e| e.id == id)?;
        Some(self.all.remove(self.bundled_len + pos))
    }

    pub async fn persist_custom(&self, kv: &KvStore) -> Result<()> {
        kv.set_json(CUSTOM_EXERCISES_KEY, self.custom()).await
    }

    /// Case-insensitive search over name, muscles, category and equipment.
    /// An empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<&Exercise> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.all.iter().collect();
        }

        self.all
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&q)
                    || e.primary_muscles.iter().any(|m| m.to_lowercase().contains(&q))
                    || e.secondary_muscles.iter().any(|m| m.to_lowercase().contains(&q))
                    || e.category.to_lowercase().contains(&q)
                    || e.equipment
                        .as_deref()
                        .is_some_and(|eq| eq.to_lowercase().contains(&q))
            })
            .collect()
    }

    pub fn by_muscle(&self, muscle: &str) -> Vec<&Exercise> {
        let muscle = muscle.to_lowercase();
        self.all
            .iter()
            .filter(|e| e.primary_muscles.iter().any(|m| m.to_lowercase() == muscle))
            .collect()
    }

    /// Exact, case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Exercise> {
        let name = name.to_lowercase();
        self.all.iter().find(|e| e.name.to_lowercase() == name)
    }
}

fn parse_exercises(json: &str) -> Result<Vec<Exercise>> {
    serde_json::from_str(json).context("Failed to parse exercise list")
}

async fn load_bundled_file(path: &Path) -> Vec<Exercise> {
    let loaded = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read file: `{}`", path.display()))
        .and_then(|json| parse_exercises(&json));

    match loaded {
        Ok(list) => list,
        Err(err) => {
            warn!("falling back to an empty catalog: {err:#}");
            Vec::new()
        }
    }
}
