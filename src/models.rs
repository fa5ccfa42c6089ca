use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils;

/// A catalog entry. Bundled entries come from the embedded exercise database,
/// custom ones are created by the user and persisted separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alt_names: Vec<String>,
    #[serde(default)]
    pub force: Option<String>,
    pub level: String,
    #[serde(default)]
    pub mechanic: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl Exercise {
    /// Builds a user-defined exercise with a fresh identifier.
    pub fn custom(name: impl Into<String>, primary_muscles: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            alt_names: Vec::new(),
            force: None,
            level: "beginner".into(),
            mechanic: None,
            equipment: None,
            primary_muscles,
            secondary_muscles: Vec::new(),
            instructions: Vec::new(),
            category: "strength".into(),
            is_custom: true,
        }
    }
}

/// A finished workout. Written once, read many times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWorkout {
    pub id: Uuid,
    pub title: String,
    pub notes: String,
    pub start_date: DateTime<Local>,
    pub end_date: DateTime<Local>,
    /// Seconds.
    pub duration: f64,
    pub exercises: Vec<CompletedExercise>,
}

impl CompletedWorkout {
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(CompletedExercise::total_volume).sum()
    }

    pub fn formatted_duration(&self) -> String {
        utils::format_seconds(self.duration as u64)
    }

    pub fn exercise(&self, exercise_id: &str) -> Option<&CompletedExercise> {
        self.exercises.iter().find(|e| e.exercise_id == exercise_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedExercise {
    pub id: Uuid,
    pub exercise_id: String,
    pub exercise_name: String,
    #[serde(default)]
    pub notes: String,
    pub sets: Vec<CompletedSet>,
}

impl CompletedExercise {
    pub fn total_volume(&self) -> f64 {
        self.sets.iter().map(CompletedSet::volume).sum()
    }

    /// Set with the highest weight × reps.
    pub fn best_set(&self) -> Option<&CompletedSet> {
        self.sets
            .iter()
            .max_by(|a, b| a.volume().total_cmp(&b.volume()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSet {
    pub id: Uuid,
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub rest_time: Option<f64>,
}

impl CompletedSet {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            weight,
            reps,
            rest_time: None,
        }
    }

    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

/// A reusable workout plan. References exercises by id only, so entries can
/// dangle when the catalog changes; see `validation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub created_date: DateTime<Local>,
    #[serde(default)]
    pub last_used_date: Option<DateTime<Local>>,
    pub exercises: Vec<TemplateExercise>,
    #[serde(default)]
    pub is_default: bool,
}

impl WorkoutTemplate {
    pub fn new(name: impl Into<String>, notes: impl Into<String>, exercises: Vec<TemplateExercise>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            notes: notes.into(),
            created_date: Local::now(),
            last_used_date: None,
            exercises,
            is_default: false,
        }
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Rough estimate: three minutes per set plus two per exercise.
    pub fn estimated_duration(&self) -> String {
        let minutes = self.total_sets() * 3 + self.exercise_count() * 2;
        if minutes >= 60 {
            format!("{}h {:02}m", minutes / 60, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Copy with fresh ids, no usage history and no default flag.
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        let exercises = self
            .exercises
            .iter()
            .map(|e| {
                TemplateExercise::new(
                    &e.exercise_id,
                    &e.exercise_name,
                    e.sets.iter().map(|s| TemplateSet::new(s.weight, s.reps)).collect(),
                )
            })
            .collect();
        Self::new(name, self.notes.clone(), exercises)
    }

    /// Appends an exercise unless it is already part of the plan. An empty
    /// `sets` is replaced by a single placeholder set.
    pub fn add_exercise(&mut self, exercise_id: &str, exercise_name: &str, mut sets: Vec<TemplateSet>) -> bool {
        if self.exercises.iter().any(|e| e.exercise_id == exercise_id) {
            return false;
        }
        if sets.is_empty() {
            sets.push(TemplateSet::new(0.0, 0));
        }
        self.exercises.push(TemplateExercise::new(exercise_id, exercise_name, sets));
        true
    }

    pub fn remove_exercise(&mut self, idx: usize) -> Option<TemplateExercise> {
        (idx < self.exercises.len()).then(|| self.exercises.remove(idx))
    }

    pub fn add_set(&mut self, exercise_idx: usize, set: TemplateSet) -> bool {
        let Some(ex) = self.exercises.get_mut(exercise_idx) else {
            return false;
        };
        ex.sets.push(set);
        true
    }

    /// Changes only the fields that are given.
    pub fn update_set(&mut self, exercise_idx: usize, set_idx: usize, weight: Option<f64>, reps: Option<u32>) -> bool {
        let Some(set) = self
            .exercises
            .get_mut(exercise_idx)
            .and_then(|e| e.sets.get_mut(set_idx))
        else {
            return false;
        };
        if let Some(w) = weight {
            set.weight = w;
        }
        if let Some(r) = reps {
            set.reps = r;
        }
        true
    }

    /// Every exercise keeps at least one set.
    pub fn remove_set(&mut self, exercise_idx: usize, set_idx: usize) -> bool {
        match self.exercises.get_mut(exercise_idx) {
            Some(ex) if ex.sets.len() > 1 && set_idx < ex.sets.len() => {
                ex.sets.remove(set_idx);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub id: Uuid,
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: Vec<TemplateSet>,
}

impl TemplateExercise {
    pub fn new(exercise_id: impl Into<String>, exercise_name: impl Into<String>, sets: Vec<TemplateSet>) -> Self {
        Self {
            id: Uuid::new_v4(),
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSet {
    pub id: Uuid,
    pub weight: f64,
    pub reps: u32,
}

impl TemplateSet {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            weight,
            reps,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OneRMFormula {
    Epley,
    Brzycki,
    Lombardi,
    OConner,
}
