use crate::models::OneRMFormula;

pub fn calculate_1rm(weight: f64, reps: u32, formula: OneRMFormula) -> f64 {
    match formula {
        OneRMFormula::Epley => weight * (1.0 + reps as f64 / 30.0),
        OneRMFormula::Brzycki => weight / (1.0278 - 0.0278 * reps as f64),
        OneRMFormula::Lombardi => weight * (reps as f64).powf(0.10),
        OneRMFormula::OConner => weight * (1.0 + 0.025 * reps as f64),
    }
}

/// Clock-style rendering used by the live session timer.
pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Compact rendering for finished workouts: `1h 02m 03s`, `4m 05s`, `9s`.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Drops a trailing `.0` so whole weights print as `135` rather than `135.0`.
pub fn format_weight(weight: f64, unit: &str) -> String {
    if weight.fract() == 0.0 {
        format!("{}{}", weight as i64, unit)
    } else {
        format!("{:.1}{}", weight, unit)
    }
}
