use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;
use strsim::jaro_winkler;

/// Muscle names used by the exercise database.
pub static ALLOWED_MUSCLES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "abdominals",
        "abductors",
        "adductors",
        "biceps",
        "calves",
        "chest",
        "forearms",
        "glutes",
        "hamstrings",
        "lats",
        "lower back",
        "middle back",
        "neck",
        "quadriceps",
        "shoulders",
        "traps",
        "triceps",
    ])
});

/// Returns the canonical lowercase muscle name or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let m = m.as_ref().trim().to_lowercase();
    if ALLOWED_MUSCLES.contains(m.as_str()) {
        Some(m)
    } else {
        None
    }
}

/// Return the closest allowed muscle for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_muscle_suggestion(input: &str) -> Option<&'static str> {
    let inp = input.trim().to_lowercase();
    if inp.is_empty() {
        return None;
    }

    // Collect (muscle, score) pairs.
    let mut scores: Vec<(&'static str, f64)> = ALLOWED_MUSCLES
        .iter()
        .copied()
        .map(|m| (m, jaro_winkler(&inp, m)))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best_muscle, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best_muscle)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Human,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Prints `value` as pretty JSON in `--json` mode, otherwise runs `human`.
pub fn emit<T: Serialize + ?Sized>(fmt: OutputFmt, value: &T, human: impl FnOnce()) -> Result<()> {
    match fmt {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFmt::Human => human(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_muscle_is_case_insensitive() {
        assert_eq!(canonical_muscle("Lower Back").as_deref(), Some("lower back"));
        assert_eq!(canonical_muscle("CHEST").as_deref(), Some("chest"));
        assert!(canonical_muscle("wings").is_none());
    }

    #[test]
    fn suggests_close_misspelling() {
        assert_eq!(best_muscle_suggestion("hamstring"), Some("hamstrings"));
        assert_eq!(best_muscle_suggestion("quadricep"), Some("quadriceps"));
    }

    #[test]
    fn no_suggestion_for_noise() {
        assert_eq!(best_muscle_suggestion(""), None);
        assert_eq!(best_muscle_suggestion("zzzz"), None);
    }
}
