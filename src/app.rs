//! The single owner of all workout state for one process.
//!
//! Commands never reach for shared globals: they receive an [`App`] and go
//! through it, so the session, catalog and stores always move together.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    catalog::{Catalog, ExerciseCatalog},
    config::Config,
    db::{self, KvStore},
    models::{CompletedWorkout, Exercise, WorkoutTemplate},
    session::{ActiveWorkout, SessionState},
    storage::WorkoutStore,
    templates::TemplateStore,
    validation::{self, ValidationReport},
};

pub const ACTIVE_SESSION_KEY: &str = "active_session";
const DB_FILE: &str = "curls.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddExercise {
    Added { prefilled: bool },
    AlreadyPresent,
    UnknownExercise,
    NoSession,
}

#[derive(Debug)]
pub struct App {
    pub kv: KvStore,
    pub catalog: Catalog,
    pub workouts: WorkoutStore,
    pub templates: TemplateStore,
    pub session: SessionState,
}

impl App {
    pub async fn open(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        Self::open_in(&data_dir, config.catalog_path().as_deref()).await
    }

    pub async fn open_in(data_dir: &Path, catalog_path: Option<&Path>) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;

        let kv = KvStore::new(db::open(&data_dir.join(DB_FILE)).await?);
        let catalog = Catalog::load(&kv, catalog_path).await;
        let workouts = WorkoutStore::open(data_dir)?;
        let mut templates = TemplateStore::load(kv.clone()).await?;
        templates.repair_defaults(&catalog).await?;
        let session = restore_session(&kv).await;

        Ok(Self {
            kv,
            catalog,
            workouts,
            templates,
            session,
        })
    }

    /// Writes the session snapshot, or clears it when idle.
    pub async fn persist_session(&self) -> Result<()> {
        match &self.session {
            SessionState::Idle => {
                self.kv.remove(ACTIVE_SESSION_KEY).await?;
            }
            active => self.kv.set_json(ACTIVE_SESSION_KEY, active).await?,
        }
        Ok(())
    }

    pub async fn start(&mut self) -> Result<bool> {
        if !self.session.start(Local::now()) {
            return Ok(false);
        }
        self.persist_session().await?;
        Ok(true)
    }

    /// Abandons the running workout. Returns false when there was none.
    pub async fn cancel(&mut self) -> Result<bool> {
        if !self.session.is_active() {
            return Ok(false);
        }
        self.session.end();
        self.persist_session().await?;
        Ok(true)
    }

    /// Runs `f` against the active workout and persists the result. `None`
    /// when no workout is running.
    pub async fn with_active<R>(&mut self, f: impl FnOnce(&mut ActiveWorkout) -> R) -> Result<Option<R>> {
        let Some(workout) = self.session.active_mut() else {
            return Ok(None);
        };
        let out = f(workout);
        self.persist_session().await?;
        Ok(Some(out))
    }

    /// Adds a catalog exercise to the running workout and seeds its sets from
    /// the last workout that contained it.
    pub async fn add_exercise(&mut self, exercise_id: &str) -> Result<AddExercise> {
        let Some(exercise) = self.catalog.find(exercise_id).cloned() else {
            return Ok(AddExercise::UnknownExercise);
        };
        let Some(workout) = self.session.active_mut() else {
            return Ok(AddExercise::NoSession);
        };
        let Some(ticket) = workout.add_exercise(&exercise) else {
            return Ok(AddExercise::AlreadyPresent);
        };

        let prefilled = match self.workouts.prefill_for(&ticket.exercise_id) {
            Some(history) => self.session.apply_prefill(&ticket, &history),
            None => false,
        };
        debug!(exercise = %exercise.id, prefilled, "exercise added");

        self.persist_session().await?;
        Ok(AddExercise::Added { prefilled })
    }

    /// Loads a saved template into the running workout, replacing its
    /// exercises. `None` when no workout is running or the template does not
    /// exist.
    pub async fn load_template(&mut self, template_id: Uuid, accept_renames: bool) -> Result<Option<ValidationReport>> {
        let Some(mut template) = self.templates.get(template_id).cloned() else {
            return Ok(None);
        };
        let Some(workout) = self.session.active_mut() else {
            return Ok(None);
        };

        let report = workout.load_from_template(&mut template, &self.catalog, accept_renames, Local::now());
        let ids: Vec<String> = workout.exercises.iter().map(|e| e.exercise_id.clone()).collect();
        for id in ids {
            if let Some(history) = self.workouts.prefill_for(&id) {
                workout.set_previous(&id, &history);
            }
        }
        if workout.title.is_empty() {
            workout.set_title(template.name.clone());
        }

        for issue in &report.issues {
            warn!(template = %template.name, "{}", issue);
        }

        self.templates.update(template).await?;
        self.persist_session().await?;
        Ok(Some(report))
    }

    /// Builds and stores the completed workout, then ends the session. When
    /// no set was completed nothing is stored and the workout keeps running.
    pub async fn finish(&mut self) -> Result<Option<CompletedWorkout>> {
        let now = Local::now();
        self.session.tick(now);
        let Some(workout) = self.session.create_completed_workout(now) else {
            return Ok(None);
        };

        self.workouts.save(workout.clone())?;
        info!(workout = %workout.id, sets = workout.total_sets(), "workout saved");

        self.session.end();
        self.persist_session().await?;
        Ok(Some(workout))
    }

    pub async fn save_as_template(
        &mut self,
        workout: &CompletedWorkout,
        name: &str,
        template_id: Option<Uuid>,
        notes: &str,
    ) -> Result<Uuid> {
        self.templates
            .save_from_workout(workout, name, template_id, notes)
            .await
    }

    /// Template the running workout was loaded from, while it still exists.
    pub fn source_template(&self) -> Option<&WorkoutTemplate> {
        let id = self.session.active()?.template_id?;
        self.templates.get(id)
    }

    pub fn validate_template(&self, template_id: Uuid) -> Option<ValidationReport> {
        let template = self.templates.get(template_id)?;
        Some(validation::validate_template(template, &self.catalog))
    }

    /// Points renamed exercises at their suggested replacement and drops
    /// missing ones. `None` when the template does not exist.
    pub async fn repair_template(&mut self, template_id: Uuid) -> Result<Option<bool>> {
        let Some(mut template) = self.templates.get(template_id).cloned() else {
            return Ok(None);
        };
        if !validation::repair_template(&mut template, &self.catalog) {
            return Ok(Some(false));
        }
        self.templates.update(template).await?;
        Ok(Some(true))
    }

    pub async fn add_custom_exercise(&mut self, exercise: Exercise) -> Result<bool> {
        if !self.catalog.add_custom(exercise) {
            return Ok(false);
        }
        self.catalog.persist_custom(&self.kv).await?;
        Ok(true)
    }

    pub async fn remove_custom_exercise(&mut self, id: &str) -> Result<Option<Exercise>> {
        let removed = self.catalog.remove_custom(id);
        if removed.is_some() {
            self.catalog.persist_custom(&self.kv).await?;
        }
        Ok(removed)
    }
}

async fn restore_session(kv: &KvStore) -> SessionState {
    match kv.get_json::<SessionState>(ACTIVE_SESSION_KEY).await {
        Ok(state) => state.unwrap_or_default(),
        Err(err) => {
            warn!("discarding unreadable session snapshot: {err:#}");
            SessionState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SetField, SetUpdate};
    use tempfile::TempDir;

    async fn create_test_app() -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let app = App::open_in(dir.path(), None).await.unwrap();
        (app, dir)
    }

    async fn log_squat(app: &mut App, weight: f64) -> CompletedWorkout {
        assert!(app.start().await.unwrap());
        app.add_exercise("Barbell_Squat").await.unwrap();
        app.with_active(|w| {
            let set = w.exercise("Barbell_Squat").unwrap().sets[0].id;
            w.update_set(
                "Barbell_Squat",
                set,
                SetUpdate {
                    weight: Some(weight),
                    reps: Some(5),
                    completed: Some(true),
                },
            );
        })
        .await
        .unwrap()
        .unwrap();
        app.finish().await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn full_workout_round_trip() {
        let (mut app, _dir) = create_test_app().await;

        let done = log_squat(&mut app, 100.0).await;
        assert!(!app.session.is_active());
        assert_eq!(app.workouts.count(), 1);
        assert_eq!(done.exercises[0].sets[0].weight, 100.0);

        // Second workout: the squat is prefilled from the first one.
        app.start().await.unwrap();
        let added = app.add_exercise("Barbell_Squat").await.unwrap();
        assert_eq!(added, AddExercise::Added { prefilled: true });

        let sets = &app.session.active().unwrap().exercise("Barbell_Squat").unwrap().sets;
        assert_eq!(sets[0].weight, 100.0);
        assert!(sets[0].prefilled);
    }

    #[tokio::test]
    async fn add_exercise_outcomes() {
        let (mut app, _dir) = create_test_app().await;
        assert_eq!(app.add_exercise("Barbell_Squat").await.unwrap(), AddExercise::NoSession);

        app.start().await.unwrap();
        assert_eq!(app.add_exercise("Nope").await.unwrap(), AddExercise::UnknownExercise);
        assert_eq!(
            app.add_exercise("Barbell_Squat").await.unwrap(),
            AddExercise::Added { prefilled: false }
        );
        assert_eq!(app.add_exercise("Barbell_Squat").await.unwrap(), AddExercise::AlreadyPresent);
    }

    #[tokio::test]
    async fn session_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut app = App::open_in(dir.path(), None).await.unwrap();
            app.start().await.unwrap();
            app.add_exercise("Pullups").await.unwrap();
        }

        let mut app = App::open_in(dir.path(), None).await.unwrap();
        let workout = app.session.active().unwrap();
        assert_eq!(workout.exercises[0].exercise_id, "Pullups");

        assert!(app.cancel().await.unwrap());
        let app = App::open_in(dir.path(), None).await.unwrap();
        assert!(!app.session.is_active());
    }

    #[tokio::test]
    async fn finish_without_completed_sets_keeps_running() {
        let (mut app, _dir) = create_test_app().await;
        app.start().await.unwrap();
        app.add_exercise("Plank").await.unwrap();

        assert!(app.finish().await.unwrap().is_none());
        assert!(app.session.is_active());
        assert_eq!(app.workouts.count(), 0);
    }

    #[tokio::test]
    async fn template_load_marks_template_used() {
        let (mut app, _dir) = create_test_app().await;
        let leg_day = app.templates.all()[2].clone();
        assert!(leg_day.last_used_date.is_none());

        assert!(app.load_template(leg_day.id, false).await.unwrap().is_none());

        app.start().await.unwrap();
        let report = app.load_template(leg_day.id, false).await.unwrap().unwrap();
        assert!(!report.has_errors());

        let workout = app.session.active().unwrap();
        assert_eq!(workout.exercises.len(), leg_day.exercises.len());
        assert_eq!(workout.template_id, Some(leg_day.id));
        assert_eq!(workout.title, "Leg Day");
        assert!(app.templates.get(leg_day.id).unwrap().last_used_date.is_some());
    }

    #[tokio::test]
    async fn propagation_through_app() {
        let (mut app, _dir) = create_test_app().await;
        app.start().await.unwrap();
        app.add_exercise("Barbell_Curl").await.unwrap();

        app.with_active(|w| {
            w.add_set("Barbell_Curl");
            w.add_set("Barbell_Curl");
            let first = w.exercise("Barbell_Curl").unwrap().sets[0].id;
            w.update_set_with_propagation("Barbell_Curl", first, SetField::Reps(10));
        })
        .await
        .unwrap();

        let reps: Vec<u32> = app.session.active().unwrap().exercises[0]
            .sets
            .iter()
            .map(|s| s.reps)
            .collect();
        assert_eq!(reps, [10, 10, 10]);
    }

    #[tokio::test]
    async fn renamed_template_exercise_can_be_repaired() {
        let (mut app, _dir) = create_test_app().await;
        let done = log_squat(&mut app, 120.0).await;

        let mut broken = done.clone();
        broken.exercises[0].exercise_id = "Old_Barbell_Squat".into();
        let id = app.save_as_template(&broken, "Squats", None, "").await.unwrap();

        let report = app.validate_template(id).unwrap();
        assert!(report.has_errors());
        assert_eq!(report.issues[0].suggestion().unwrap().id, "Barbell_Squat");

        assert_eq!(app.repair_template(id).await.unwrap(), Some(true));
        assert!(!app.validate_template(id).unwrap().has_errors());
        assert_eq!(app.repair_template(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn custom_exercises_join_the_catalog() {
        let (mut app, _dir) = create_test_app().await;
        let custom = Exercise::custom("Sled Push", vec!["quadriceps".into()]);
        let id = custom.id.clone();

        assert!(app.add_custom_exercise(custom.clone()).await.unwrap());
        assert!(!app.add_custom_exercise(custom).await.unwrap());
        assert!(app.catalog.find(&id).is_some());

        assert!(app.remove_custom_exercise(&id).await.unwrap().is_some());
        assert!(app.catalog.find(&id).is_none());
    }

    #[tokio::test]
    async fn finished_workout_updates_its_source_template() {
        let (mut app, _dir) = create_test_app().await;
        let leg_day = app.templates.all()[2].id;

        app.start().await.unwrap();
        assert!(app.source_template().is_none());
        app.load_template(leg_day, false).await.unwrap().unwrap();
        app.with_active(|w| {
            let set = w.exercise("Barbell_Squat").unwrap().sets[0].id;
            w.update_set(
                "Barbell_Squat",
                set,
                SetUpdate {
                    weight: Some(200.0),
                    reps: Some(5),
                    completed: Some(true),
                },
            );
        })
        .await
        .unwrap()
        .unwrap();

        let (id, name) = app.source_template().map(|t| (t.id, t.name.clone())).unwrap();
        assert_eq!(id, leg_day);
        let done = app.finish().await.unwrap().unwrap();

        let saved = app.save_as_template(&done, &name, Some(id), "").await.unwrap();
        assert_eq!(saved, leg_day);
        assert_eq!(app.templates.all().len(), 3);

        let t = app.templates.get(leg_day).unwrap();
        assert_eq!(t.name, "Leg Day");
        assert!(t.is_default);
        assert_eq!(t.exercise_count(), 1);
        assert_eq!(t.exercises[0].sets[0].weight, 200.0);
    }

    #[tokio::test]
    async fn moving_exercise_onto_itself_reports_no_change() {
        let (mut app, _dir) = create_test_app().await;
        assert_eq!(app.with_active(|w| w.move_exercise(0, 1)).await.unwrap(), None);

        app.start().await.unwrap();
        app.add_exercise("Barbell_Squat").await.unwrap();
        app.add_exercise("Barbell_Curl").await.unwrap();

        assert_eq!(app.with_active(|w| w.move_exercise(1, 1)).await.unwrap(), Some(false));
        assert_eq!(app.with_active(|w| w.move_exercise(1, 0)).await.unwrap(), Some(true));
        assert_eq!(app.session.active().unwrap().exercises[0].exercise_id, "Barbell_Curl");
    }
}
