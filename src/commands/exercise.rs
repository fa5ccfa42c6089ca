use crate::cli::ExerciseCmd;
use anyhow::Result;
use colored::Colorize;
use curls::{
    App, OutputFmt,
    catalog::ExerciseCatalog,
    fuzzy,
    models::{Exercise, OneRMFormula},
    types::{ALLOWED_MUSCLES, best_muscle_suggestion, canonical_muscle, emit},
    utils::{calculate_1rm, format_weight},
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExJson<'a> {
    id: &'a str,
    name: &'a str,
    primary_muscles: &'a [String],
    equipment: Option<&'a str>,
    is_custom: bool,
}

impl<'a> From<&'a Exercise> for ExJson<'a> {
    fn from(e: &'a Exercise) -> Self {
        Self {
            id: &e.id,
            name: &e.name,
            primary_muscles: &e.primary_muscles,
            equipment: e.equipment.as_deref(),
            is_custom: e.is_custom,
        }
    }
}

/// Printable width of a string that may contain ANSI color escapes.
fn plain_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip \x1b[... m
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            count += 1;
        }
    }
    count
}

/// Resolves user input to a catalog entry: exact id, then exact name, then a
/// search that must hit exactly one exercise. Prints why when it fails.
pub(crate) fn resolve_exercise<'a>(app: &'a App, query: &str) -> Option<&'a Exercise> {
    let query = query.trim();
    if let Some(ex) = app.catalog.find(query).or_else(|| app.catalog.find_by_name(query)) {
        return Some(ex);
    }

    let hits = app.catalog.search(query);
    match hits.as_slice() {
        [only] => Some(*only),
        [] => {
            println!("{} no exercise matching `{}`", "error:".red().bold(), query);
            let suggestions = fuzzy::suggest_replacements(query, app.catalog.exercises());
            if !suggestions.is_empty() {
                let names: Vec<String> = suggestions.iter().map(|e| format!("`{}`", e.name)).collect();
                println!("{} did you mean: {}?", "hint:".blue().bold(), names.join(", ").green());
            }
            None
        }
        many => {
            println!(
                "{} `{}` matches {} exercises, be more specific:",
                "error:".red().bold(),
                query,
                many.len()
            );
            for ex in many.iter().take(10) {
                println!("  • {} {}", ex.name.bold(), format!("({})", ex.id).dimmed());
            }
            if many.len() > 10 {
                println!("  {}", format!("… and {} more", many.len() - 10).dimmed());
            }
            None
        }
    }
}

fn print_list(exercises: &[&Exercise]) {
    if exercises.is_empty() {
        println!("{}", "  (no exercises found)".dimmed());
        return;
    }

    let idx_w = exercises.len().to_string().len();
    let mut left = Vec::with_capacity(exercises.len());
    let mut right = Vec::with_capacity(exercises.len());

    for (i, ex) in exercises.iter().enumerate() {
        let idx_col = format!("{:>width$}", i + 1, width = idx_w).yellow();
        let custom = if ex.is_custom {
            " custom".magenta().to_string()
        } else {
            String::new()
        };
        left.push(format!(
            " {} • {} ({}){}",
            idx_col,
            ex.name.bold(),
            ex.primary_muscles.join(", ").yellow(),
            custom
        ));
        right.push(ex.id.dimmed().to_string());
    }

    let printable_pad = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);
    for (l, r) in left.into_iter().zip(right) {
        let total_pad = printable_pad + l.len() - plain_len(&l);
        println!("{:<total_pad$} {} {}", l, "|".blue(), r);
    }
}

fn print_muscle_help(muscle: &str) {
    match best_muscle_suggestion(muscle) {
        Some(sug) => println!(
            "{} unknown muscle `{}`, did you mean `{}`?",
            "error:".red().bold(),
            muscle,
            sug.green()
        ),
        None => {
            println!("{} unknown muscle `{}`", "error:".red().bold(), muscle);
            let allowed: Vec<&str> = ALLOWED_MUSCLES.iter().copied().collect();
            println!("{} {}", "Allowed muscles:".cyan().bold(), allowed.join(", "));
        }
    }
}

pub async fn handle(cmd: ExerciseCmd, app: &mut App, fmt: OutputFmt, unit: &str) -> Result<()> {
    match cmd {
        ExerciseCmd::List { muscle } => {
            let rows = match muscle {
                Some(m) => {
                    let Some(m) = canonical_muscle(&m) else {
                        print_muscle_help(&m);
                        return Ok(());
                    };
                    app.catalog.by_muscle(&m)
                }
                None => app.catalog.exercises().iter().collect(),
            };

            let json: Vec<ExJson> = rows.iter().map(|e| ExJson::from(*e)).collect();
            emit(fmt, &json, || {
                println!("{}", "Exercises:".cyan().bold());
                print_list(&rows);
            })?;
        }

        ExerciseCmd::Search { query } => {
            let query = query.join(" ");
            let rows = app.catalog.search(&query);
            let json: Vec<ExJson> = rows.iter().map(|e| ExJson::from(*e)).collect();
            emit(fmt, &json, || {
                println!("{} `{}`", "Results for".cyan().bold(), query);
                print_list(&rows);
            })?;
        }

        ExerciseCmd::Show { exercise } => {
            let query = exercise.join(" ");
            let Some(ex) = resolve_exercise(app, &query) else {
                return Ok(());
            };
            let last = app.workouts.last_exercise_data(&ex.id);

            emit(fmt, ex, || {
                println!("{} {}", ex.name.bold().cyan(), format!("({})", ex.id).dimmed());
                if !ex.alt_names.is_empty() {
                    println!("  {} {}", "also:".dimmed(), ex.alt_names.join(", "));
                }
                println!("  {} {} / {}", "type:".dimmed(), ex.category, ex.level);
                if let Some(eq) = &ex.equipment {
                    println!("  {} {}", "equipment:".dimmed(), eq);
                }
                println!("  {} {}", "primary:".dimmed(), ex.primary_muscles.join(", ").yellow());
                if !ex.secondary_muscles.is_empty() {
                    println!("  {} {}", "secondary:".dimmed(), ex.secondary_muscles.join(", "));
                }

                if !ex.instructions.is_empty() {
                    println!("\n{}", "Instructions:".cyan().bold());
                    for (i, step) in ex.instructions.iter().enumerate() {
                        println!("  {}. {}", i + 1, step);
                    }
                }

                if let Some(last) = last {
                    println!("\n{}", "Last time:".cyan().bold());
                    for (i, set) in last.sets.iter().enumerate() {
                        println!("  {}. {} × {}", i + 1, format_weight(set.weight, unit), set.reps);
                    }
                    if let Some(best) = last.best_set() {
                        let one_rm = calculate_1rm(best.weight, best.reps, OneRMFormula::Epley);
                        println!("  {} {}", "est. 1RM:".dimmed(), format_weight(one_rm.round(), unit));
                    }
                }
            })?;
        }

        ExerciseCmd::Add {
            name,
            muscle,
            equipment,
            desc,
        } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                println!("{} exercise name must not be empty", "error:".red().bold());
                return Ok(());
            }
            if let Some(existing) = app.catalog.find_by_name(&name) {
                println!(
                    "{} Exercise \"{}\" already exists ({})",
                    "warning:".yellow().bold(),
                    existing.name,
                    existing.id
                );
                return Ok(());
            }

            let mut muscles = Vec::with_capacity(muscle.len());
            for m in &muscle {
                match canonical_muscle(m) {
                    Some(m) => muscles.push(m),
                    None => {
                        print_muscle_help(m);
                        return Ok(());
                    }
                }
            }

            let mut ex = Exercise::custom(&name, muscles);
            ex.equipment = equipment;
            ex.instructions = desc.into_iter().collect();
            let id = ex.id.clone();

            if app.add_custom_exercise(ex).await? {
                println!("{} Exercise \"{}\" added ({})", "info:".blue().bold(), name, id.dimmed());
            }
        }

        ExerciseCmd::Delete { exercise } => {
            let Some(ex) = resolve_exercise(app, &exercise) else {
                return Ok(());
            };
            if !ex.is_custom {
                println!(
                    "{} `{}` is part of the bundled database and cannot be deleted",
                    "error:".red().bold(),
                    ex.name
                );
                return Ok(());
            }
            let id = ex.id.clone();

            if let Some(removed) = app.remove_custom_exercise(&id).await? {
                println!("{} Exercise \"{}\" deleted", "info:".blue().bold(), removed.name);
                let users: Vec<&str> = app
                    .templates
                    .all()
                    .iter()
                    .filter(|t| t.exercises.iter().any(|e| e.exercise_id == id))
                    .map(|t| t.name.as_str())
                    .collect();
                if !users.is_empty() {
                    println!(
                        "{} still referenced by: {} (see `curls template validate`)",
                        "warning:".yellow().bold(),
                        users.join(", ")
                    );
                }
            }
        }

        ExerciseCmd::Suggest { name } => {
            let name = name.join(" ");
            let hits = fuzzy::suggest_replacements(&name, app.catalog.exercises());
            let json: Vec<ExJson> = hits.iter().map(|e| ExJson::from(*e)).collect();
            emit(fmt, &json, || {
                println!("{} `{}`", "Closest to".cyan().bold(), name);
                print_list(&hits);
            })?;
        }
    }

    Ok(())
}
