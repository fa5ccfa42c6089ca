//! The in-progress workout.
//!
//! A [`SessionState`] is either `Idle` or `Active`. All mutations live on
//! [`ActiveWorkout`], which is only reachable through
//! [`SessionState::active_mut`], so nothing can edit a workout that is not
//! running.

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    catalog::ExerciseCatalog,
    models::{CompletedExercise, CompletedSet, CompletedWorkout, Exercise, WorkoutTemplate},
    validation::{self, ValidationReport},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Active(ActiveWorkout),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkout {
    /// Unique per started workout. Async results are tagged with it.
    pub id: Uuid,
    pub started_at: DateTime<Local>,
    pub elapsed_secs: u64,
    pub title: String,
    pub notes: String,
    pub exercises: Vec<SessionExercise>,
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: Vec<SessionSet>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetValues {
    pub weight: f64,
    pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSet {
    pub id: Uuid,
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
    /// What was lifted for this set last time. Display only.
    pub previous: Option<SetValues>,
    /// True while the values still come from a template or history default.
    pub prefilled: bool,
    pub prefilled_weight: Option<f64>,
    pub prefilled_reps: Option<u32>,
}

/// Field-level edit for [`ActiveWorkout::update_set`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetUpdate {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub completed: Option<bool>,
}

impl SetUpdate {
    pub fn weight(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// A single value edit that may be carried forward to later sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetField {
    Weight(f64),
    Reps(u32),
}

impl SetField {
    fn is_positive(self) -> bool {
        match self {
            Self::Weight(w) => w > 0.0,
            Self::Reps(r) => r > 0,
        }
    }

    fn write(self, set: &mut SessionSet) {
        match self {
            Self::Weight(w) => set.weight = clamp_weight(w),
            Self::Reps(r) => set.reps = r,
        }
        set.prefilled = false;
    }
}

/// Issued by [`ActiveWorkout::add_exercise`]; hands the history lookup result
/// back to the workout it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefillTicket {
    pub session_id: Uuid,
    pub exercise_id: String,
}

impl SessionSet {
    fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            weight: 0.0,
            reps: 0,
            completed: false,
            previous: None,
            prefilled: false,
            prefilled_weight: None,
            prefilled_reps: None,
        }
    }

    fn prefilled(weight: f64, reps: u32) -> Self {
        let weight = clamp_weight(weight);
        Self {
            weight,
            reps,
            prefilled: true,
            prefilled_weight: Some(weight),
            prefilled_reps: Some(reps),
            ..Self::empty()
        }
    }

    fn is_pristine(&self) -> bool {
        self.weight == 0.0 && self.reps == 0 && !self.completed && !self.prefilled
    }
}

impl SessionExercise {
    fn new(exercise_id: impl Into<String>, exercise_name: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            sets: vec![SessionSet::empty()],
            notes: String::new(),
        }
    }

    fn set_index(&self, set_id: Uuid) -> Option<usize> {
        self.sets.iter().position(|s| s.id == set_id)
    }

    fn is_untouched(&self) -> bool {
        self.sets.len() == 1 && self.sets[0].is_pristine()
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = &SessionSet> {
        self.sets.iter().filter(|s| s.completed)
    }
}

fn clamp_weight(weight: f64) -> f64 {
    // `max` also maps NaN to zero.
    weight.max(0.0)
}

/// `Morning Workout`, `Afternoon Workout` or `Evening Workout` depending on
/// the hour of `now`.
pub fn default_title(now: DateTime<Local>) -> &'static str {
    match now.hour() {
        5..=11 => "Morning Workout",
        12..=16 => "Afternoon Workout",
        _ => "Evening Workout",
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveWorkout> {
        match self {
            Self::Active(w) => Some(w),
            Self::Idle => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveWorkout> {
        match self {
            Self::Active(w) => Some(w),
            Self::Idle => None,
        }
    }

    /// Starts a fresh workout. Returns false, leaving the running workout
    /// untouched, when one is already active.
    pub fn start(&mut self, now: DateTime<Local>) -> bool {
        if self.is_active() {
            return false;
        }
        let workout = ActiveWorkout::new(now);
        debug!(session = %workout.id, "workout started");
        *self = Self::Active(workout);
        true
    }

    /// Drops the workout, whether it was finished or abandoned.
    pub fn end(&mut self) {
        if let Self::Active(w) = self {
            debug!(session = %w.id, "workout ended");
        }
        *self = Self::Idle;
    }

    pub fn tick(&mut self, now: DateTime<Local>) {
        if let Some(w) = self.active_mut() {
            w.tick(now);
        }
    }

    /// Seeds a freshly added exercise with the sets from its most recent
    /// completed workout.
    ///
    /// Discarded when the ticket belongs to another workout, the exercise has
    /// been removed, or its sets were edited before the lookup returned.
    pub fn apply_prefill(&mut self, ticket: &PrefillTicket, history: &[CompletedSet]) -> bool {
        let Some(workout) = self.active_mut() else {
            debug!(exercise = %ticket.exercise_id, "dropping prefill for ended workout");
            return false;
        };
        if workout.id != ticket.session_id {
            debug!(exercise = %ticket.exercise_id, "dropping prefill for stale workout");
            return false;
        }
        if history.is_empty() {
            return false;
        }
        let Some(exercise) = workout.exercise_mut(&ticket.exercise_id) else {
            return false;
        };
        if !exercise.is_untouched() {
            debug!(exercise = %ticket.exercise_id, "sets already edited, skipping prefill");
            return false;
        }

        exercise.sets = history
            .iter()
            .map(|cs| SessionSet {
                previous: Some(SetValues {
                    weight: cs.weight,
                    reps: cs.reps,
                }),
                ..SessionSet::prefilled(cs.weight, cs.reps)
            })
            .collect();
        true
    }

    /// `None` when no workout is running or nothing was completed.
    pub fn create_completed_workout(&self, now: DateTime<Local>) -> Option<CompletedWorkout> {
        self.active()?.create_completed_workout(now)
    }
}

impl ActiveWorkout {
    fn new(now: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            elapsed_secs: 0,
            title: String::new(),
            notes: String::new(),
            exercises: Vec::new(),
            template_id: None,
        }
    }

    pub fn tick(&mut self, now: DateTime<Local>) {
        self.elapsed_secs = (now - self.started_at).num_seconds().max(0) as u64;
    }

    pub fn elapsed(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.elapsed_secs as i64)
    }

    pub fn exercise(&self, exercise_id: &str) -> Option<&SessionExercise> {
        self.exercises.iter().find(|e| e.exercise_id == exercise_id)
    }

    fn exercise_mut(&mut self, exercise_id: &str) -> Option<&mut SessionExercise> {
        self.exercises.iter_mut().find(|e| e.exercise_id == exercise_id)
    }

    fn contains(&self, exercise_id: &str) -> bool {
        self.exercise(exercise_id).is_some()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn set_exercise_notes(&mut self, exercise_id: &str, notes: impl Into<String>) -> bool {
        match self.exercise_mut(exercise_id) {
            Some(e) => {
                e.notes = notes.into();
                true
            }
            None => false,
        }
    }

    /// Appends the exercise with one empty set. `None` when it is already part
    /// of the workout; otherwise a ticket for the history prefill.
    pub fn add_exercise(&mut self, exercise: &Exercise) -> Option<PrefillTicket> {
        if self.contains(&exercise.id) {
            return None;
        }
        self.exercises
            .push(SessionExercise::new(&exercise.id, &exercise.name));
        Some(PrefillTicket {
            session_id: self.id,
            exercise_id: exercise.id.clone(),
        })
    }

    /// Replaces the exercise list with the template's exercises that resolve
    /// in `catalog`. With `accept_renames`, exercises whose id vanished are
    /// loaded under their suggested replacement instead of being dropped.
    ///
    /// Every loaded set is prefilled with the template values. Stamps the
    /// template's last-used date; the caller persists it.
    pub fn load_from_template<C: ExerciseCatalog + ?Sized>(
        &mut self,
        template: &mut WorkoutTemplate,
        catalog: &C,
        accept_renames: bool,
        now: DateTime<Local>,
    ) -> ValidationReport {
        let report = validation::validate_template(template, catalog);
        let source = if accept_renames {
            report.repaired_exercises()
        } else {
            report.valid.as_slice()
        };

        let mut exercises: Vec<SessionExercise> = Vec::with_capacity(source.len());
        for te in source {
            if exercises.iter().any(|e| e.exercise_id == te.exercise_id) {
                continue;
            }
            let name = catalog
                .find(&te.exercise_id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| te.exercise_name.clone());

            let mut se = SessionExercise::new(&te.exercise_id, name);
            if !te.sets.is_empty() {
                se.sets = te
                    .sets
                    .iter()
                    .map(|ts| SessionSet::prefilled(ts.weight, ts.reps))
                    .collect();
            }
            exercises.push(se);
        }

        debug!(
            template = %template.id,
            loaded = exercises.len(),
            issues = report.issues.len(),
            "loaded template"
        );

        self.exercises = exercises;
        self.template_id = Some(template.id);
        template.last_used_date = Some(now);
        report
    }

    /// Fills the read-only `previous` values position by position.
    pub fn set_previous(&mut self, exercise_id: &str, history: &[CompletedSet]) -> bool {
        let Some(exercise) = self.exercise_mut(exercise_id) else {
            return false;
        };
        for (set, prev) in exercise.sets.iter_mut().zip(history) {
            set.previous = Some(SetValues {
                weight: prev.weight,
                reps: prev.reps,
            });
        }
        true
    }

    /// Appends a zero-valued, incomplete set and returns its id.
    pub fn add_set(&mut self, exercise_id: &str) -> Option<Uuid> {
        let exercise = self.exercise_mut(exercise_id)?;
        let set = SessionSet::empty();
        let id = set.id;
        exercise.sets.push(set);
        Some(id)
    }

    /// Any weight or reps argument clears the set's prefilled flag, even when
    /// the value is unchanged.
    pub fn update_set(&mut self, exercise_id: &str, set_id: Uuid, update: SetUpdate) -> bool {
        let Some(exercise) = self.exercise_mut(exercise_id) else {
            return false;
        };
        let Some(idx) = exercise.set_index(set_id) else {
            return false;
        };
        let set = &mut exercise.sets[idx];

        if let Some(w) = update.weight {
            set.weight = clamp_weight(w);
            set.prefilled = false;
        }
        if let Some(r) = update.reps {
            set.reps = r;
            set.prefilled = false;
        }
        if let Some(c) = update.completed {
            set.completed = c;
        }
        true
    }

    /// Updates one field, then copies a positive value into every later set
    /// when the exercise has several sets and the edited set is not yet
    /// completed. Earlier sets are never touched.
    pub fn update_set_with_propagation(&mut self, exercise_id: &str, set_id: Uuid, field: SetField) -> bool {
        let Some(exercise) = self.exercise_mut(exercise_id) else {
            return false;
        };
        let Some(idx) = exercise.set_index(set_id) else {
            return false;
        };

        field.write(&mut exercise.sets[idx]);

        let propagate =
            exercise.sets.len() > 1 && field.is_positive() && !exercise.sets[idx].completed;
        if propagate {
            for later in &mut exercise.sets[idx + 1..] {
                field.write(later);
            }
        }
        true
    }

    /// Refused when it would leave the exercise without sets.
    pub fn delete_set(&mut self, exercise_id: &str, set_id: Uuid) -> bool {
        let Some(exercise) = self.exercise_mut(exercise_id) else {
            return false;
        };
        let Some(idx) = exercise.set_index(set_id) else {
            return false;
        };
        if exercise.sets.len() <= 1 {
            return false;
        }
        exercise.sets.remove(idx);
        true
    }

    pub fn delete_exercise(&mut self, exercise_id: &str) -> bool {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.exercise_id != exercise_id);
        self.exercises.len() != before
    }

    /// No-op when the indices are equal or out of bounds.
    pub fn move_exercise(&mut self, from: usize, to: usize) -> bool {
        let len = self.exercises.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let exercise = self.exercises.remove(from);
        self.exercises.insert(to, exercise);
        true
    }

    pub fn completed_set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.completed_sets().count()).sum()
    }

    /// Builds the history record from completed sets only. Exercises without
    /// a completed set are dropped; `None` when nothing remains. The workout
    /// itself is left running.
    pub fn create_completed_workout(&self, now: DateTime<Local>) -> Option<CompletedWorkout> {
        let exercises: Vec<CompletedExercise> = self
            .exercises
            .iter()
            .filter_map(|se| {
                let sets: Vec<CompletedSet> = se
                    .completed_sets()
                    .map(|s| CompletedSet::new(s.weight, s.reps))
                    .collect();
                if sets.is_empty() {
                    return None;
                }
                Some(CompletedExercise {
                    id: Uuid::new_v4(),
                    exercise_id: se.exercise_id.clone(),
                    exercise_name: se.exercise_name.clone(),
                    notes: se.notes.clone(),
                    sets,
                })
            })
            .collect();

        if exercises.is_empty() {
            return None;
        }

        let title = if self.title.trim().is_empty() {
            default_title(now).to_string()
        } else {
            self.title.clone()
        };
        let duration = ((now - self.started_at).num_milliseconds().max(0) as f64) / 1000.0;

        Some(CompletedWorkout {
            id: Uuid::new_v4(),
            title,
            notes: self.notes.clone(),
            start_date: self.started_at,
            end_date: now,
            duration,
            exercises,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TemplateExercise, TemplateSet};
    use chrono::TimeZone;

    fn ex(id: &str, name: &str) -> Exercise {
        let mut e = Exercise::custom(name, vec!["chest".into()]);
        e.id = id.into();
        e.is_custom = false;
        e
    }

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    fn active() -> SessionState {
        let mut state = SessionState::new();
        assert!(state.start(at(9)));
        state
    }

    /// Active workout with one exercise of `n` sets; returns the set ids.
    fn with_sets(state: &mut SessionState, n: usize) -> Vec<Uuid> {
        let w = state.active_mut().unwrap();
        w.add_exercise(&ex("Bench", "Bench Press"));
        for _ in 1..n {
            w.add_set("Bench");
        }
        w.exercise("Bench").unwrap().sets.iter().map(|s| s.id).collect()
    }

    fn sets(state: &SessionState) -> &[SessionSet] {
        &state.active().unwrap().exercise("Bench").unwrap().sets
    }

    #[test]
    fn start_is_a_no_op_while_active() {
        let mut state = active();
        let id = state.active().unwrap().id;
        state.active_mut().unwrap().set_title("Heavy");

        assert!(!state.start(at(10)));
        assert_eq!(state.active().unwrap().id, id);
        assert_eq!(state.active().unwrap().title, "Heavy");
    }

    #[test]
    fn end_returns_to_idle() {
        let mut state = active();
        state.end();
        assert!(!state.is_active());
        assert!(state.active_mut().is_none());
        assert!(state.create_completed_workout(at(10)).is_none());
    }

    #[test]
    fn tick_tracks_elapsed_seconds() {
        let mut state = active();
        state.tick(at(9) + chrono::Duration::seconds(95));
        assert_eq!(state.active().unwrap().elapsed_secs, 95);
    }

    #[test]
    fn adding_an_exercise_twice_is_ignored() {
        let mut state = active();
        let w = state.active_mut().unwrap();
        assert!(w.add_exercise(&ex("Bench", "Bench Press")).is_some());
        assert!(w.add_exercise(&ex("Bench", "Bench Press")).is_none());
        assert_eq!(w.exercises.len(), 1);
        assert_eq!(w.exercises[0].sets.len(), 1);
    }

    #[test]
    fn set_count_never_drops_below_one() {
        let mut state = active();
        let ids = with_sets(&mut state, 3);
        let w = state.active_mut().unwrap();

        assert!(w.delete_set("Bench", ids[0]));
        assert!(w.delete_set("Bench", ids[1]));
        assert!(!w.delete_set("Bench", ids[2]));
        assert_eq!(w.exercise("Bench").unwrap().sets.len(), 1);

        let extra = w.add_set("Bench").unwrap();
        assert!(w.delete_set("Bench", extra));
        assert!(!w.delete_set("Bench", ids[2]));
        assert_eq!(w.exercise("Bench").unwrap().sets.len(), 1);
    }

    #[test]
    fn editing_weight_or_reps_clears_prefilled_even_with_same_value() {
        let mut state = active();
        with_sets(&mut state, 1);
        let history = [CompletedSet::new(100.0, 5), CompletedSet::new(100.0, 5)];
        let ticket = PrefillTicket {
            session_id: state.active().unwrap().id,
            exercise_id: "Bench".into(),
        };
        assert!(state.apply_prefill(&ticket, &history));
        let ids: Vec<Uuid> = sets(&state).iter().map(|s| s.id).collect();
        assert!(sets(&state).iter().all(|s| s.prefilled));

        let w = state.active_mut().unwrap();
        assert!(w.update_set("Bench", ids[0], SetUpdate::weight(100.0)));
        assert!(w.update_set("Bench", ids[1], SetUpdate::reps(5)));

        assert!(!sets(&state)[0].prefilled);
        assert!(!sets(&state)[1].prefilled);
        assert_eq!(sets(&state)[0].prefilled_weight, Some(100.0));
    }

    #[test]
    fn completing_a_set_keeps_prefilled() {
        let mut state = active();
        with_sets(&mut state, 1);
        let ticket = PrefillTicket {
            session_id: state.active().unwrap().id,
            exercise_id: "Bench".into(),
        };
        state.apply_prefill(&ticket, &[CompletedSet::new(80.0, 8)]);
        let id = sets(&state)[0].id;

        state
            .active_mut()
            .unwrap()
            .update_set("Bench", id, SetUpdate::completed(true));
        assert!(sets(&state)[0].prefilled);
        assert!(sets(&state)[0].completed);
    }

    #[test]
    fn propagation_copies_forward_only() {
        let mut state = active();
        let ids = with_sets(&mut state, 3);
        let w = state.active_mut().unwrap();

        assert!(w.update_set_with_propagation("Bench", ids[1], SetField::Weight(100.0)));
        let s = sets(&state);
        assert_eq!(s[0].weight, 0.0);
        assert_eq!(s[1].weight, 100.0);
        assert_eq!(s[2].weight, 100.0);
    }

    #[test]
    fn propagation_scenarios() {
        let catalog = vec![ex("Bench", "Bench Press")];
        let mut template = WorkoutTemplate::new(
            "Bench",
            "",
            vec![TemplateExercise::new("Bench", "Bench Press", vec![TemplateSet::new(90.0, 5); 3])],
        );
        let mut state = active();
        state
            .active_mut()
            .unwrap()
            .load_from_template(&mut template, &catalog, false, at(9));
        assert!(sets(&state).iter().all(|s| s.prefilled));
        let ids: Vec<Uuid> = sets(&state).iter().map(|s| s.id).collect();

        let w = state.active_mut().unwrap();
        w.update_set_with_propagation("Bench", ids[0], SetField::Weight(100.0));
        let s = sets(&state);
        assert_eq!((s[1].weight, s[2].weight), (100.0, 100.0));
        assert!(!s[1].prefilled && !s[2].prefilled);

        // Zero is written but not carried forward.
        let w = state.active_mut().unwrap();
        w.update_set_with_propagation("Bench", ids[1], SetField::Weight(0.0));
        let s = sets(&state);
        assert_eq!(s[1].weight, 0.0);
        assert_eq!(s[2].weight, 100.0);

        // A completed set does not propagate.
        let w = state.active_mut().unwrap();
        w.update_set("Bench", ids[0], SetUpdate::completed(true));
        w.update_set_with_propagation("Bench", ids[0], SetField::Reps(12));
        let s = sets(&state);
        assert_eq!(s[0].reps, 12);
        assert_eq!(s[1].reps, 5);
        assert_eq!(s[2].reps, 5);
    }

    #[test]
    fn single_set_exercise_does_not_propagate() {
        let mut state = active();
        let ids = with_sets(&mut state, 1);
        let w = state.active_mut().unwrap();
        assert!(w.update_set_with_propagation("Bench", ids[0], SetField::Reps(8)));
        assert_eq!(sets(&state)[0].reps, 8);
    }

    #[test]
    fn completed_workout_keeps_only_completed_sets() {
        let mut state = active();
        let w = state.active_mut().unwrap();
        w.add_exercise(&ex("Squat", "Barbell Squat"));
        w.add_set("Squat");
        w.add_exercise(&ex("Bench", "Bench Press"));
        w.add_set("Bench");
        w.add_set("Bench");

        let bench: Vec<Uuid> = w.exercise("Bench").unwrap().sets.iter().map(|s| s.id).collect();
        w.update_set(
            "Bench",
            bench[1],
            SetUpdate {
                weight: Some(100.0),
                reps: Some(5),
                completed: Some(true),
            },
        );
        w.set_exercise_notes("Bench", "paused reps");

        let done = state.create_completed_workout(at(10)).unwrap();
        assert_eq!(done.exercises.len(), 1);
        assert_eq!(done.exercises[0].exercise_id, "Bench");
        assert_eq!(done.exercises[0].notes, "paused reps");
        assert_eq!(done.exercises[0].sets.len(), 1);
        assert_eq!(done.exercises[0].sets[0].weight, 100.0);
        assert_eq!(done.duration, 3600.0);
        assert_eq!(done.title, "Morning Workout");

        // Finalizing does not end the workout.
        assert!(state.is_active());
    }

    #[test]
    fn nothing_completed_yields_no_workout() {
        let mut state = active();
        with_sets(&mut state, 3);
        assert!(state.create_completed_workout(at(10)).is_none());
    }

    #[test]
    fn default_titles_follow_the_clock() {
        assert_eq!(default_title(at(5)), "Morning Workout");
        assert_eq!(default_title(at(12)), "Afternoon Workout");
        assert_eq!(default_title(at(17)), "Evening Workout");
        assert_eq!(default_title(at(2)), "Evening Workout");
    }

    #[test]
    fn stale_prefill_is_discarded() {
        let mut state = active();
        let ticket = state
            .active_mut()
            .unwrap()
            .add_exercise(&ex("Bench", "Bench Press"))
            .unwrap();

        state.end();
        assert!(!state.apply_prefill(&ticket, &[CompletedSet::new(100.0, 5)]));

        state.start(at(11));
        state.active_mut().unwrap().add_exercise(&ex("Bench", "Bench Press"));
        assert!(!state.apply_prefill(&ticket, &[CompletedSet::new(100.0, 5)]));
        assert_eq!(sets(&state)[0].weight, 0.0);
    }

    #[test]
    fn prefill_skips_edited_exercise() {
        let mut state = active();
        let ticket = state
            .active_mut()
            .unwrap()
            .add_exercise(&ex("Bench", "Bench Press"))
            .unwrap();
        let id = sets(&state)[0].id;
        state
            .active_mut()
            .unwrap()
            .update_set("Bench", id, SetUpdate::weight(60.0));

        assert!(!state.apply_prefill(&ticket, &[CompletedSet::new(100.0, 5)]));
        assert_eq!(sets(&state)[0].weight, 60.0);
    }

    #[test]
    fn prefill_seeds_sets_from_history() {
        let mut state = active();
        let ticket = state
            .active_mut()
            .unwrap()
            .add_exercise(&ex("Bench", "Bench Press"))
            .unwrap();

        let history = [CompletedSet::new(100.0, 5), CompletedSet::new(105.0, 3)];
        assert!(state.apply_prefill(&ticket, &history));

        let s = sets(&state);
        assert_eq!(s.len(), 2);
        assert_eq!((s[1].weight, s[1].reps), (105.0, 3));
        assert_eq!(s[1].previous, Some(SetValues { weight: 105.0, reps: 3 }));
        assert!(s.iter().all(|s| s.prefilled && !s.completed));
    }

    #[test]
    fn move_exercise_bounds() {
        let mut state = active();
        let w = state.active_mut().unwrap();
        for id in ["A", "B", "C"] {
            w.add_exercise(&ex(id, id));
        }

        assert!(!w.move_exercise(1, 1));
        assert!(!w.move_exercise(0, 3));
        assert!(w.move_exercise(0, 2));
        let order: Vec<&str> = w.exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(order, ["B", "C", "A"]);

        assert!(w.delete_exercise("C"));
        assert!(!w.delete_exercise("C"));
        assert_eq!(w.exercises.len(), 2);
    }

    #[test]
    fn loading_a_template_prefills_and_stamps() {
        let catalog = vec![ex("Bench_Press", "Bench Press"), ex("Barbell_Squat", "Barbell Squat")];
        let mut template = WorkoutTemplate::new(
            "Mixed",
            "",
            vec![
                TemplateExercise::new(
                    "Barbell_Squat",
                    "Barbell Squat",
                    vec![TemplateSet::new(185.0, 5), TemplateSet::new(185.0, 5)],
                ),
                TemplateExercise::new("Old_Bench_Press", "Bench Press", vec![TemplateSet::new(135.0, 8)]),
                TemplateExercise::new("Turkish_Getup", "Turkish Get-Up", vec![TemplateSet::new(24.0, 3)]),
            ],
        );

        let mut state = active();
        let w = state.active_mut().unwrap();
        w.add_exercise(&ex("Plank", "Plank"));

        let report = w.load_from_template(&mut template, &catalog, false, at(9));
        assert_eq!(report.issues.len(), 2);
        assert_eq!(w.exercises.len(), 1);
        assert_eq!(w.exercises[0].exercise_id, "Barbell_Squat");
        assert!(w.exercises[0].sets.iter().all(|s| s.prefilled && s.weight == 185.0));
        assert_eq!(w.template_id, Some(template.id));
        assert_eq!(template.last_used_date, Some(at(9)));

        w.load_from_template(&mut template, &catalog, true, at(9));
        let ids: Vec<&str> = w.exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, ["Barbell_Squat", "Bench_Press"]);
        assert_eq!(w.exercises[1].sets[0].reps, 8);
    }

    #[test]
    fn set_previous_fills_positions() {
        let mut state = active();
        with_sets(&mut state, 3);
        let w = state.active_mut().unwrap();
        assert!(w.set_previous("Bench", &[CompletedSet::new(50.0, 10)]));
        let s = sets(&state);
        assert_eq!(s[0].previous, Some(SetValues { weight: 50.0, reps: 10 }));
        assert!(s[1].previous.is_none());
    }

    #[test]
    fn session_state_round_trips_through_json() {
        let mut state = active();
        with_sets(&mut state, 2);
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);

        let idle = serde_json::to_string(&SessionState::Idle).unwrap();
        assert_eq!(serde_json::from_str::<SessionState>(&idle).unwrap(), SessionState::Idle);
    }
}
