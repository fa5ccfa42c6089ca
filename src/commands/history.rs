use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use crate::{cli::HistoryCmd, commands::resolve_index};
use curls::{
    App, OutputFmt,
    models::CompletedWorkout,
    types::emit,
    utils::format_weight,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutJson<'a> {
    idx: usize,
    id: Uuid,
    title: &'a str,
    end_date: String,
    duration: f64,
    sets: usize,
    volume: f64,
}

fn print_row(idx: usize, w: &CompletedWorkout, unit: &str) {
    println!(
        " {} • {} {} {}",
        format!("{}", idx).yellow(),
        w.end_date.format("%a %d-%m-%Y %H:%M").to_string().green(),
        w.title.bold(),
        format!(
            "({}, {} sets, {})",
            w.formatted_duration(),
            w.total_sets(),
            format_weight(w.total_volume(), unit)
        )
        .dimmed()
    );
}

fn print_workout(w: &CompletedWorkout, unit: &str) {
    println!(
        "{} {} {}",
        w.title.bold().cyan(),
        w.start_date.format("%a %d-%m-%Y %H:%M"),
        format!("({})", w.formatted_duration()).dimmed()
    );
    if !w.notes.is_empty() {
        println!("  {}", w.notes.dimmed());
    }
    for (i, ex) in w.exercises.iter().enumerate() {
        println!("{} • {}", format!("{}", i + 1).yellow(), ex.exercise_name.bold());
        if !ex.notes.is_empty() {
            println!("    {}", ex.notes.dimmed());
        }
        let best = ex.best_set().map(|b| b.id);
        for (j, s) in ex.sets.iter().enumerate() {
            let line = format!("{} × {}", format_weight(s.weight, unit), s.reps);
            if Some(s.id) == best {
                println!("    {}. {} {}", j + 1, line.bold(), "best".red().bold());
            } else {
                println!("    {}. {}", j + 1, line);
            }
        }
    }
    println!(
        "\n{} {} sets, {} total",
        "Total:".cyan().bold(),
        w.total_sets(),
        format_weight(w.total_volume(), unit)
    );
}

pub fn handle(cmd: HistoryCmd, app: &mut App, fmt: OutputFmt, unit: &str) -> Result<()> {
    match cmd {
        HistoryCmd::List { search, limit } => {
            let all = app.workouts.all();
            // Indices always refer to the unfiltered list so `history show N` works.
            let mut rows: Vec<(usize, &CompletedWorkout)> = match search.as_deref() {
                Some(q) => {
                    let hits = app.workouts.search(q);
                    all.iter()
                        .enumerate()
                        .filter(|(_, w)| hits.iter().any(|h| h.id == w.id))
                        .map(|(i, w)| (i + 1, w))
                        .collect()
                }
                None => all.iter().enumerate().map(|(i, w)| (i + 1, w)).collect(),
            };
            if let Some(n) = limit {
                rows.truncate(n);
            }

            let json: Vec<WorkoutJson> = rows
                .iter()
                .map(|(idx, w)| WorkoutJson {
                    idx: *idx,
                    id: w.id,
                    title: &w.title,
                    end_date: w.end_date.to_rfc3339(),
                    duration: w.duration,
                    sets: w.total_sets(),
                    volume: w.total_volume(),
                })
                .collect();

            emit(fmt, &json, || {
                println!("{}", "Workouts:".cyan().bold());
                if rows.is_empty() {
                    println!("{}", "  (no workouts found)".dimmed());
                }
                for (idx, w) in &rows {
                    print_row(*idx, w, unit);
                }
            })?;
        }

        HistoryCmd::Show { workout } => {
            let all = app.workouts.all();
            let Some(pos) = resolve_index("workout", workout, all.len()) else {
                return Ok(());
            };
            let w = &all[pos];
            emit(fmt, w, || print_workout(w, unit))?;
        }

        HistoryCmd::Delete { workout } => {
            let Some(pos) = resolve_index("workout", workout, app.workouts.count()) else {
                return Ok(());
            };
            let id = app.workouts.all()[pos].id;
            let removed = app.workouts.delete(id)?;
            println!(
                "{} deleted `{}` from {}",
                "ok:".green().bold(),
                removed.title,
                removed.end_date.format("%d-%m-%Y")
            );
        }
    }

    Ok(())
}
