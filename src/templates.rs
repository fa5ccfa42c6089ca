//! Saved workout templates, persisted as one collection in the preference
//! store.

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::ExerciseCatalog,
    db::KvStore,
    models::{CompletedWorkout, TemplateExercise, TemplateSet, WorkoutTemplate},
    validation,
};

pub const TEMPLATES_KEY: &str = "workout_templates";
/// Where an unreadable collection is kept before the defaults replace it.
pub const TEMPLATES_BACKUP_KEY: &str = "workout_templates_backup";
const NEW_TEMPLATE_NAME: &str = "New Template";

#[derive(Debug)]
pub struct TemplateStore {
    kv: KvStore,
    templates: Vec<WorkoutTemplate>,
}

impl TemplateStore {
    /// Loads the collection, seeding the starter templates when it is empty.
    /// A corrupt collection is copied to [`TEMPLATES_BACKUP_KEY`] and then
    /// treated as empty.
    pub async fn load(kv: KvStore) -> Result<Self> {
        let templates = match kv.get_json::<Vec<WorkoutTemplate>>(TEMPLATES_KEY).await {
            Ok(list) => list.unwrap_or_default(),
            Err(err) => {
                warn!("unreadable templates, copied to `{TEMPLATES_BACKUP_KEY}`: {err:#}");
                if let Some(raw) = kv.get_raw(TEMPLATES_KEY).await? {
                    kv.set_raw(TEMPLATES_BACKUP_KEY, &raw).await?;
                }
                Vec::new()
            }
        };

        let mut store = Self { kv, templates };
        if store.templates.is_empty() {
            info!("seeding default templates");
            store.templates.extend(default_templates());
            store.save().await?;
        }
        Ok(store)
    }

    async fn save(&self) -> Result<()> {
        self.kv.set_json(TEMPLATES_KEY, &self.templates).await
    }

    pub fn all(&self) -> &[WorkoutTemplate] {
        &self.templates
    }

    pub fn get(&self, id: Uuid) -> Option<&WorkoutTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub async fn add(&mut self, template: WorkoutTemplate) -> Result<()> {
        self.templates.push(template);
        self.save().await
    }

    /// Adds an empty template. A blank name falls back to "New Template".
    pub async fn create(&mut self, name: &str, notes: &str) -> Result<Uuid> {
        let name = match name.trim() {
            "" => NEW_TEMPLATE_NAME,
            n => n,
        };
        let template = WorkoutTemplate::new(name, notes.trim(), Vec::new());
        let id = template.id;
        self.add(template).await?;
        Ok(id)
    }

    /// Stores a copy of `id` named "<name> Copy" and returns the new id.
    pub async fn duplicate(&mut self, id: Uuid) -> Result<Option<Uuid>> {
        let Some(copy) = self.get(id).map(|t| t.duplicate(format!("{} Copy", t.name))) else {
            return Ok(None);
        };
        let new_id = copy.id;
        self.add(copy).await?;
        Ok(Some(new_id))
    }

    /// Runs `f` on a copy of the template and stores the copy when `f`
    /// reports a change. `None` when no template has that id.
    pub async fn edit<F>(&mut self, id: Uuid, f: F) -> Result<Option<bool>>
    where
        F: FnOnce(&mut WorkoutTemplate) -> bool,
    {
        let Some(mut template) = self.get(id).cloned() else {
            return Ok(None);
        };
        if !f(&mut template) {
            return Ok(Some(false));
        }
        self.update(template).await.map(Some)
    }

    /// Replaces the template with the same id. Returns false when none exists.
    pub async fn update(&mut self, template: WorkoutTemplate) -> Result<bool> {
        let Some(slot) = self.templates.iter_mut().find(|t| t.id == template.id) else {
            return Ok(false);
        };
        *slot = template;
        self.save().await?;
        Ok(true)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<Option<WorkoutTemplate>> {
        let Some(pos) = self.templates.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let removed = self.templates.remove(pos);
        self.save().await?;
        Ok(Some(removed))
    }

    /// No-op when the indices are equal or out of bounds.
    pub async fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        let len = self.templates.len();
        if from == to || from >= len || to >= len {
            return Ok(false);
        }
        let template = self.templates.remove(from);
        self.templates.insert(to, template);
        self.save().await?;
        Ok(true)
    }

    pub async fn touch_last_used(&mut self, id: Uuid) -> Result<bool> {
        let Some(t) = self.templates.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        t.last_used_date = Some(Local::now());
        self.save().await?;
        Ok(true)
    }

    /// Drops every default template and recreates the starter set.
    pub async fn reset_defaults(&mut self) -> Result<()> {
        self.templates.retain(|t| !t.is_default);
        self.templates.extend(default_templates());
        self.save().await
    }

    /// Regenerates the default templates when any of them references an
    /// exercise missing from `catalog`. Returns whether a reset happened.
    pub async fn repair_defaults<C: ExerciseCatalog + ?Sized>(&mut self, catalog: &C) -> Result<bool> {
        let broken = self
            .templates
            .iter()
            .filter(|t| t.is_default)
            .any(|t| validation::validate_template(t, catalog).has_errors());

        if !broken {
            return Ok(false);
        }
        warn!("default templates reference unknown exercises, regenerating");
        self.reset_defaults().await?;
        Ok(true)
    }

    /// Saves `workout` as a template. With `template_id` naming an existing
    /// template, that template is overwritten in place, keeping its id,
    /// creation date and default flag (and its notes when `notes` is empty).
    pub async fn save_from_workout(
        &mut self,
        workout: &CompletedWorkout,
        name: &str,
        template_id: Option<Uuid>,
        notes: &str,
    ) -> Result<Uuid> {
        let existing = template_id.and_then(|id| self.get(id)).cloned();

        match existing {
            Some(existing) => {
                let updated = WorkoutTemplate {
                    id: existing.id,
                    name: name.to_string(),
                    notes: if notes.is_empty() {
                        existing.notes
                    } else {
                        notes.to_string()
                    },
                    created_date: existing.created_date,
                    last_used_date: Some(Local::now()),
                    exercises: template_exercises(workout),
                    is_default: existing.is_default,
                };
                self.update(updated).await?;
                Ok(existing.id)
            }
            None => {
                let template = template_from_workout(workout, name, notes);
                let id = template.id;
                self.add(template).await?;
                Ok(id)
            }
        }
    }
}

fn template_exercises(workout: &CompletedWorkout) -> Vec<TemplateExercise> {
    workout
        .exercises
        .iter()
        .map(|ce| {
            TemplateExercise::new(
                &ce.exercise_id,
                &ce.exercise_name,
                ce.sets
                    .iter()
                    .map(|cs| TemplateSet::new(cs.weight, cs.reps))
                    .collect(),
            )
        })
        .collect()
}

pub fn template_from_workout(workout: &CompletedWorkout, name: &str, notes: &str) -> WorkoutTemplate {
    WorkoutTemplate::new(name, notes, template_exercises(workout))
}

fn sets(weight: f64, reps: u32, count: usize) -> Vec<TemplateSet> {
    (0..count).map(|_| TemplateSet::new(weight, reps)).collect()
}

/// Barbell-focused push / pull / legs starter templates.
pub fn default_templates() -> Vec<WorkoutTemplate> {
    let push = WorkoutTemplate {
        is_default: true,
        ..WorkoutTemplate::new(
            "Push Day",
            "Chest, shoulders, and triceps with barbell emphasis",
            vec![
                TemplateExercise::new(
                    "Barbell_Bench_Press_-_Medium_Grip",
                    "Barbell Bench Press",
                    sets(135.0, 5, 4),
                ),
                TemplateExercise::new(
                    "Barbell_Incline_Bench_Press_-_Medium_Grip",
                    "Incline Barbell Bench Press",
                    sets(115.0, 8, 3),
                ),
                TemplateExercise::new("Barbell_Shoulder_Press", "Barbell Shoulder Press", sets(95.0, 8, 3)),
                TemplateExercise::new(
                    "Close-Grip_Barbell_Bench_Press",
                    "Close-Grip Barbell Bench Press",
                    sets(95.0, 10, 3),
                ),
            ],
        )
    };

    let pull = WorkoutTemplate {
        is_default: true,
        ..WorkoutTemplate::new(
            "Pull Day",
            "Back and biceps with barbell emphasis",
            vec![
                TemplateExercise::new("Barbell_Deadlift", "Deadlift", sets(225.0, 5, 3)),
                TemplateExercise::new("Bent_Over_Barbell_Row", "Bent Over Barbell Row", sets(135.0, 8, 4)),
                TemplateExercise::new("Barbell_Shrug", "Barbell Shrug", sets(185.0, 12, 3)),
                TemplateExercise::new("Barbell_Curl", "Barbell Curl", sets(65.0, 10, 3)),
            ],
        )
    };

    let legs = WorkoutTemplate {
        is_default: true,
        ..WorkoutTemplate::new(
            "Leg Day",
            "Complete leg workout with barbell emphasis",
            vec![
                TemplateExercise::new("Barbell_Squat", "Barbell Squat", sets(185.0, 5, 4)),
                TemplateExercise::new(
                    "Stiff-Legged_Barbell_Deadlift",
                    "Stiff-Legged Barbell Deadlift",
                    sets(135.0, 8, 3),
                ),
                TemplateExercise::new("Front_Squat_Clean_Grip", "Front Squat (Clean Grip)", sets(115.0, 8, 3)),
                TemplateExercise::new("Barbell_Walking_Lunge", "Barbell Walking Lunge", sets(95.0, 10, 3)),
                TemplateExercise::new(
                    "Standing_Barbell_Calf_Raise",
                    "Standing Barbell Calf Raise",
                    sets(135.0, 15, 3),
                ),
            ],
        )
    };

    vec![push, pull, legs]
}
