use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{CompletedExercise, CompletedSet, CompletedWorkout};

const WORKOUTS_DIR: &str = "workouts";

/// Completed workout history: one JSON file per workout, all of them kept in
/// memory sorted by end date, newest first.
#[derive(Debug)]
pub struct WorkoutStore {
    dir: PathBuf,
    workouts: Vec<CompletedWorkout>,
}

impl WorkoutStore {
    /// Opens `<data_dir>/workouts`, creating it when missing, and loads every
    /// readable record. Files that fail to parse are skipped.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join(WORKOUTS_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let mut store = Self {
            dir,
            workouts: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn reload(&mut self) -> Result<&[CompletedWorkout]> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read workout directory: {}", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"));

        let mut loaded = Vec::new();
        for path in entries {
            match read_workout(&path) {
                Ok(w) => loaded.push(w),
                Err(err) => warn!("skipping workout file: {err:#}"),
            }
        }

        sort_newest_first(&mut loaded);
        debug!(count = loaded.len(), "workout history loaded");
        self.workouts = loaded;
        Ok(&self.workouts)
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("workout_{}.json", id))
    }

    pub fn save(&mut self, workout: CompletedWorkout) -> Result<()> {
        let path = self.path_for(workout.id);
        let content = serde_json::to_string_pretty(&workout)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to save workout to {}", path.display()))?;

        self.workouts.retain(|w| w.id != workout.id);
        self.workouts.push(workout);
        sort_newest_first(&mut self.workouts);
        Ok(())
    }

    /// Removes the file and the in-memory entry. The index is only touched
    /// once the file is gone.
    pub fn delete(&mut self, id: Uuid) -> Result<CompletedWorkout> {
        let pos = self
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| anyhow!("No workout with id {}", id))?;

        let path = self.path_for(id);
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete workout file: {}", path.display()))?;

        Ok(self.workouts.remove(pos))
    }

    pub fn all(&self) -> &[CompletedWorkout] {
        &self.workouts
    }

    pub fn get(&self, id: Uuid) -> Option<&CompletedWorkout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn count(&self) -> usize {
        self.workouts.len()
    }

    /// Seconds.
    pub fn total_duration(&self) -> f64 {
        self.workouts.iter().map(|w| w.duration).sum()
    }

    /// Workouts that started at or after `start` and ended at or before `end`.
    pub fn in_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<&CompletedWorkout> {
        self.workouts
            .iter()
            .filter(|w| w.start_date >= start && w.end_date <= end)
            .collect()
    }

    /// Most recent workout containing the exercise.
    pub fn last_workout_for(&self, exercise_id: &str) -> Option<&CompletedWorkout> {
        self.workouts
            .iter()
            .find(|w| w.exercise(exercise_id).is_some())
    }

    pub fn last_exercise_data(&self, exercise_id: &str) -> Option<&CompletedExercise> {
        self.last_workout_for(exercise_id)?.exercise(exercise_id)
    }

    /// Sets to seed a newly added session exercise with.
    pub fn prefill_for(&self, exercise_id: &str) -> Option<Vec<CompletedSet>> {
        self.last_exercise_data(exercise_id).map(|e| e.sets.clone())
    }

    /// Case-insensitive match on title, notes or any exercise name.
    pub fn search(&self, text: &str) -> Vec<&CompletedWorkout> {
        let q = text.trim().to_lowercase();
        if q.is_empty() {
            return self.workouts.iter().collect();
        }

        self.workouts
            .iter()
            .filter(|w| {
                w.title.to_lowercase().contains(&q)
                    || w.notes.to_lowercase().contains(&q)
                    || w.exercises
                        .iter()
                        .any(|e| e.exercise_name.to_lowercase().contains(&q))
            })
            .collect()
    }
}

fn read_workout(path: &Path) -> Result<CompletedWorkout> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read workout file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse workout file: {}", path.display()))
}

fn sort_newest_first(workouts: &mut [CompletedWorkout]) {
    workouts.sort_by(|a, b| b.end_date.cmp(&a.end_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn workout(title: &str, day: u32, exercise_id: &str, weight: f64) -> CompletedWorkout {
        let start = Local.with_ymd_and_hms(2026, 5, day, 18, 0, 0).unwrap();
        CompletedWorkout {
            id: Uuid::new_v4(),
            title: title.into(),
            notes: String::new(),
            start_date: start,
            end_date: start + Duration::minutes(45),
            duration: 2700.0,
            exercises: vec![CompletedExercise {
                id: Uuid::new_v4(),
                exercise_id: exercise_id.into(),
                exercise_name: exercise_id.replace('_', " "),
                notes: String::new(),
                sets: vec![CompletedSet::new(weight, 5), CompletedSet::new(weight, 5)],
            }],
        }
    }

    fn create_test_store() -> (WorkoutStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = WorkoutStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn saved_workouts_are_sorted_newest_first() {
        let (mut store, _dir) = create_test_store();
        store.save(workout("Mon", 4, "Barbell_Squat", 100.0)).unwrap();
        store.save(workout("Wed", 6, "Barbell_Squat", 105.0)).unwrap();
        store.save(workout("Tue", 5, "Bench_Press", 80.0)).unwrap();

        let titles: Vec<&str> = store.all().iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["Wed", "Tue", "Mon"]);
        assert_eq!(store.total_duration(), 3.0 * 2700.0);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let saved = workout("Mon", 4, "Barbell_Squat", 100.0);
        {
            let mut store = WorkoutStore::open(dir.path()).unwrap();
            store.save(saved.clone()).unwrap();
        }

        let store = WorkoutStore::open(dir.path()).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(saved.id), Some(&saved));
    }

    #[test]
    fn corrupt_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(WORKOUTS_DIR)).unwrap();
        fs::write(dir.path().join(WORKOUTS_DIR).join("workout_bad.json"), "{").unwrap();

        let store = WorkoutStore::open(dir.path()).unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn delete_removes_file_and_entry() {
        let (mut store, dir) = create_test_store();
        let w = workout("Mon", 4, "Barbell_Squat", 100.0);
        let id = w.id;
        store.save(w).unwrap();

        store.delete(id).unwrap();
        assert!(store.get(id).is_none());
        assert!(!dir.path().join(WORKOUTS_DIR).join(format!("workout_{id}.json")).exists());
        assert!(store.delete(id).is_err());
    }

    #[test]
    fn prefill_comes_from_most_recent_workout() {
        let (mut store, _dir) = create_test_store();
        store.save(workout("Old", 4, "Barbell_Squat", 100.0)).unwrap();
        store.save(workout("New", 6, "Barbell_Squat", 110.0)).unwrap();
        store.save(workout("Bench", 7, "Bench_Press", 80.0)).unwrap();

        let sets = store.prefill_for("Barbell_Squat").unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].weight, 110.0);
        assert!(store.prefill_for("Deadlift").is_none());
    }

    #[test]
    fn search_and_range_filters() {
        let (mut store, _dir) = create_test_store();
        store.save(workout("Leg Day", 4, "Barbell_Squat", 100.0)).unwrap();
        store.save(workout("Push", 6, "Bench_Press", 80.0)).unwrap();

        assert_eq!(store.search("bench").len(), 1);
        assert_eq!(store.search("LEG").len(), 1);
        assert_eq!(store.search("").len(), 2);

        let from = Local.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap();
        let to = Local.with_ymd_and_hms(2026, 5, 31, 0, 0, 0).unwrap();
        let hits = store.in_range(from, to);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Push");
    }
}
