//! Reconciles a template's exercise references with the live catalog.
//!
//! Templates refer to exercises by id only. When an id no longer resolves,
//! the stored exercise name is fuzzy-matched against the catalog to suggest a
//! replacement; otherwise the exercise is reported missing.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    catalog::ExerciseCatalog,
    fuzzy,
    models::{Exercise, TemplateExercise, WorkoutTemplate},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    NotFound {
        exercise_id: String,
        exercise_name: String,
    },
    Renamed {
        exercise_id: String,
        exercise_name: String,
        suggestion: Exercise,
    },
}

impl ValidationIssue {
    /// Stable key, one per template exercise id.
    pub fn key(&self) -> String {
        match self {
            Self::NotFound { exercise_id, .. } => format!("not_found_{exercise_id}"),
            Self::Renamed { exercise_id, .. } => format!("renamed_{exercise_id}"),
        }
    }

    pub fn exercise_id(&self) -> &str {
        match self {
            Self::NotFound { exercise_id, .. } | Self::Renamed { exercise_id, .. } => exercise_id,
        }
    }

    pub fn suggestion(&self) -> Option<&Exercise> {
        match self {
            Self::Renamed { suggestion, .. } => Some(suggestion),
            Self::NotFound { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { exercise_name, .. } => {
                write!(f, "Exercise '{}' not found in database", exercise_name)
            }
            Self::Renamed {
                exercise_name,
                suggestion,
                ..
            } => write!(
                f,
                "Exercise '{}' may have been renamed to '{}'",
                exercise_name, suggestion.name
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Template exercises whose id resolved, in template order.
    pub valid: Vec<TemplateExercise>,
    pub issues: Vec<ValidationIssue>,
    /// Every template exercise with renames swapped for their suggestion and
    /// missing ones dropped, in template order.
    #[serde(skip)]
    repaired: Vec<TemplateExercise>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn repaired_exercises(&self) -> &[TemplateExercise] {
        &self.repaired
    }
}

pub fn validate_template<C: ExerciseCatalog + ?Sized>(template: &WorkoutTemplate, catalog: &C) -> ValidationReport {
    let mut report = ValidationReport::default();

    for te in &template.exercises {
        if catalog.find(&te.exercise_id).is_some() {
            report.valid.push(te.clone());
            report.repaired.push(te.clone());
            continue;
        }

        match fuzzy::best_match(&te.exercise_name, catalog.exercises()) {
            Some(suggestion) => {
                report.repaired.push(corrected_exercise(te, suggestion));
                report.issues.push(ValidationIssue::Renamed {
                    exercise_id: te.exercise_id.clone(),
                    exercise_name: te.exercise_name.clone(),
                    suggestion: suggestion.clone(),
                });
            }
            None => report.issues.push(ValidationIssue::NotFound {
                exercise_id: te.exercise_id.clone(),
                exercise_name: te.exercise_name.clone(),
            }),
        }
    }

    report
}

/// Same sets, new exercise reference.
pub fn corrected_exercise(original: &TemplateExercise, replacement: &Exercise) -> TemplateExercise {
    TemplateExercise {
        id: Uuid::new_v4(),
        exercise_id: replacement.id.clone(),
        exercise_name: replacement.name.clone(),
        sets: original.sets.clone(),
    }
}

/// Rewrites `template` so every renamed exercise points at its suggestion and
/// missing exercises are removed. Returns whether anything changed.
pub fn repair_template<C: ExerciseCatalog + ?Sized>(template: &mut WorkoutTemplate, catalog: &C) -> bool {
    let report = validate_template(template, catalog);
    if !report.has_errors() {
        return false;
    }
    template.exercises = report.repaired;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateSet;

    fn ex(id: &str, name: &str) -> Exercise {
        let mut e = Exercise::custom(name, vec!["chest".into()]);
        e.id = id.into();
        e.is_custom = false;
        e
    }

    fn catalog() -> Vec<Exercise> {
        vec![
            ex("Bench_Press", "Bench Press"),
            ex("Barbell_Squat", "Barbell Squat"),
            ex("Leg_Press", "Leg Press"),
        ]
    }

    fn template(entries: &[(&str, &str)]) -> WorkoutTemplate {
        WorkoutTemplate::new(
            "Test",
            "",
            entries
                .iter()
                .map(|(id, name)| TemplateExercise::new(*id, *name, vec![TemplateSet::new(100.0, 5)]))
                .collect(),
        )
    }

    #[test]
    fn exact_ids_are_valid() {
        let t = template(&[("Bench_Press", "Bench Press"), ("Barbell_Squat", "Barbell Squat")]);
        let report = validate_template(&t, &catalog());
        assert!(!report.has_errors());
        assert_eq!(report.valid.len(), 2);
    }

    #[test]
    fn missing_id_with_similar_name_is_renamed() {
        let t = template(&[("Old_Bench_Press", "Bench Press")]);
        let report = validate_template(&t, &catalog());

        assert!(report.has_errors());
        assert!(report.valid.is_empty());
        assert_eq!(report.issues.len(), 1);

        let issue = &report.issues[0];
        assert_eq!(issue.suggestion().unwrap().id, "Bench_Press");
        assert_eq!(issue.key(), "renamed_Old_Bench_Press");
        assert_eq!(
            issue.message(),
            "Exercise 'Bench Press' may have been renamed to 'Bench Press'"
        );
    }

    #[test]
    fn missing_id_without_overlap_is_not_found() {
        let t = template(&[("Turkish_Getup", "Turkish Get-Up")]);
        let report = validate_template(&t, &catalog());

        assert_eq!(
            report.issues,
            vec![ValidationIssue::NotFound {
                exercise_id: "Turkish_Getup".into(),
                exercise_name: "Turkish Get-Up".into(),
            }]
        );
        assert!(report.issues[0].suggestion().is_none());
        assert_eq!(report.issues[0].message(), "Exercise 'Turkish Get-Up' not found in database");
    }

    #[test]
    fn repair_swaps_renamed_and_drops_missing() {
        let mut t = template(&[
            ("Barbell_Squat", "Barbell Squat"),
            ("Old_Bench_Press", "Bench Press"),
            ("Turkish_Getup", "Turkish Get-Up"),
        ]);

        assert!(repair_template(&mut t, &catalog()));
        let ids: Vec<&str> = t.exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, ["Barbell_Squat", "Bench_Press"]);
        assert_eq!(t.exercises[1].sets[0].weight, 100.0);

        // Already consistent: nothing to do.
        assert!(!repair_template(&mut t, &catalog()));
    }
}
