use std::io::{self, Write};

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use tokio::time::{self, Duration};
use uuid::Uuid;

use crate::{
    cli::SessionCmd,
    commands::{exercise::resolve_exercise, no_session, resolve_index},
};
use curls::{
    App, OutputFmt,
    app::AddExercise,
    models::CompletedWorkout,
    session::{ActiveWorkout, SessionExercise, SetField, SetUpdate, default_title},
    types::emit,
    utils::{format_duration, format_weight},
    validation::{ValidationIssue, ValidationReport},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimerJson {
    elapsed_secs: u64,
    elapsed: String,
}

/// Exercise id at a 1-based position in the running workout.
fn exercise_at(app: &App, idx: usize) -> Option<String> {
    let Some(workout) = app.session.active() else {
        no_session();
        return None;
    };
    let pos = resolve_index("exercise", idx, workout.exercises.len())?;
    Some(workout.exercises[pos].exercise_id.clone())
}

/// Exercise id and set id for 1-based exercise and set positions.
fn set_at(app: &App, exercise: usize, set: usize) -> Option<(String, Uuid)> {
    let exercise_id = exercise_at(app, exercise)?;
    let sets = &app.session.active()?.exercise(&exercise_id)?.sets;
    let pos = resolve_index("set", set, sets.len())?;
    Some((exercise_id, sets[pos].id))
}

fn display_title(workout: &ActiveWorkout) -> String {
    if workout.title.trim().is_empty() {
        default_title(workout.started_at).to_string()
    } else {
        workout.title.clone()
    }
}

fn print_sets(exercise: &SessionExercise, unit: &str) {
    for (j, set) in exercise.sets.iter().enumerate() {
        let values = format!("{} × {}", format_weight(set.weight, unit), set.reps);
        let values = if set.completed {
            values.green().bold()
        } else if set.prefilled {
            values.dimmed()
        } else {
            values.normal()
        };
        let mark = if set.completed { "✓".green() } else { "·".dimmed() };
        let previous = set
            .previous
            .map(|p| format!("  last: {} × {}", format_weight(p.weight, unit), p.reps))
            .unwrap_or_default();

        println!("    {} {}. {}{}", mark, j + 1, values, previous.dimmed());
    }
}

fn print_workout(workout: &ActiveWorkout, unit: &str) {
    println!(
        "{} {} (started {}, elapsed {})",
        "Workout:".cyan().bold(),
        display_title(workout).bold(),
        workout.started_at.format("%H:%M"),
        format_duration(workout.elapsed())
    );
    if !workout.notes.is_empty() {
        println!("  {}", workout.notes.dimmed());
    }

    if workout.exercises.is_empty() {
        println!("{}", "  (no exercises yet, add one with `curls session add-ex`)".dimmed());
        return;
    }

    println!("\n{}", "Exercises:".cyan().bold());
    for (i, ex) in workout.exercises.iter().enumerate() {
        let done = ex.completed_sets().count();
        println!(
            "{} • {} {}",
            format!("{}", i + 1).yellow(),
            ex.exercise_name.bold(),
            format!("{}/{}", done, ex.sets.len()).dimmed()
        );
        if !ex.notes.is_empty() {
            println!("    {}", ex.notes.dimmed());
        }
        print_sets(ex, unit);
    }
}

fn print_issues(report: &ValidationReport, accept_renames: bool) {
    for issue in &report.issues {
        match issue {
            ValidationIssue::Renamed { .. } if accept_renames => {
                println!("{} {}, loaded it instead", "info:".blue().bold(), issue)
            }
            ValidationIssue::Renamed { suggestion, .. } => println!(
                "{} {}, skipped (pass --accept-renames to load `{}`)",
                "warning:".yellow().bold(),
                issue,
                suggestion.name
            ),
            ValidationIssue::NotFound { .. } => {
                println!("{} {}, skipped", "warning:".yellow().bold(), issue)
            }
        }
    }
}

fn print_summary(workout: &CompletedWorkout, unit: &str) {
    println!(
        "{} saved `{}` ({}, {} sets, {} total)",
        "ok:".green().bold(),
        workout.title.bold(),
        workout.formatted_duration(),
        workout.total_sets(),
        format_weight(workout.total_volume(), unit)
    );
    for ex in &workout.exercises {
        let sets: Vec<String> = ex
            .sets
            .iter()
            .map(|s| format!("{}×{}", format_weight(s.weight, unit), s.reps))
            .collect();
        println!("  • {} {}", ex.exercise_name.bold(), sets.join(", ").dimmed());
    }
}

pub async fn handle(cmd: SessionCmd, app: &mut App, fmt: OutputFmt, unit: &str) -> Result<()> {
    match cmd {
        SessionCmd::Start {
            template,
            accept_renames,
        } => {
            if app.session.is_active() {
                println!(
                    "{} there is already an active workout, finish or cancel it first",
                    "error:".red().bold()
                );
                return Ok(());
            }

            // Resolve before starting so a bad index leaves nothing behind.
            let template_id = match template {
                Some(idx) => {
                    let Some(pos) = resolve_index("template", idx, app.templates.all().len()) else {
                        return Ok(());
                    };
                    Some(app.templates.all()[pos].id)
                }
                None => None,
            };

            app.start().await?;
            if let Some(id) = template_id {
                if let Some(report) = app.load_template(id, accept_renames).await? {
                    print_issues(&report, accept_renames);
                }
            }

            if let Some(workout) = app.session.active() {
                emit(fmt, workout, || {
                    println!("{} workout started", "ok:".green().bold());
                    if !workout.exercises.is_empty() {
                        print_workout(workout, unit);
                    }
                })?;
            }
        }

        SessionCmd::Cancel => {
            if app.cancel().await? {
                println!("{} workout cancelled", "ok:".green().bold());
            } else {
                no_session();
            }
        }

        SessionCmd::Show => {
            app.session.tick(Local::now());
            match app.session.active() {
                Some(workout) => emit(fmt, workout, || print_workout(workout, unit))?,
                None => no_session(),
            }
        }

        SessionCmd::Finish {
            save_template,
            update_template,
        } => {
            if !app.session.is_active() {
                no_session();
                return Ok(());
            }
            let source = app.source_template().map(|t| (t.id, t.name.clone()));
            if update_template && source.is_none() {
                println!(
                    "{} this workout was not started from a saved template",
                    "error:".red().bold()
                );
                return Ok(());
            }
            let Some(workout) = app.finish().await? else {
                println!(
                    "{} complete at least one set before finishing (or `curls session cancel`)",
                    "error:".red().bold()
                );
                return Ok(());
            };

            match (source.filter(|_| update_template), save_template) {
                (Some((id, current)), rename) => {
                    let name = rename.unwrap_or(current);
                    app.save_as_template(&workout, &name, Some(id), "").await?;
                    println!("{} updated template `{}`", "info:".blue().bold(), name.green());
                }
                (None, Some(name)) => {
                    app.save_as_template(&workout, &name, None, "").await?;
                    println!("{} saved as template `{}`", "info:".blue().bold(), name.green());
                }
                (None, None) => {}
            }
            emit(fmt, &workout, || print_summary(&workout, unit))?;
        }

        SessionCmd::AddEx { exercise } => {
            if !app.session.is_active() {
                no_session();
                return Ok(());
            }
            let query = exercise.join(" ");
            let Some(ex) = resolve_exercise(app, &query) else {
                return Ok(());
            };
            let (id, name) = (ex.id.clone(), ex.name.clone());

            match app.add_exercise(&id).await? {
                AddExercise::Added { prefilled } => {
                    let note = if prefilled { " (sets from your last workout)" } else { "" };
                    println!("{} added {}{}", "ok:".green().bold(), name.bold(), note.dimmed());
                }
                AddExercise::AlreadyPresent => {
                    println!("{} {} is already in this workout", "warning:".yellow().bold(), name)
                }
                AddExercise::UnknownExercise => {
                    println!("{} no exercise with id `{}`", "error:".red().bold(), id)
                }
                AddExercise::NoSession => no_session(),
            }
        }

        SessionCmd::AddSet { exercise } => {
            let Some(ex_id) = exercise_at(app, exercise) else {
                return Ok(());
            };
            app.with_active(|w| w.add_set(&ex_id)).await?;
            if let Some(ex) = app.session.active().and_then(|w| w.exercise(&ex_id)) {
                println!("{} {} now has {} sets", "ok:".green().bold(), ex.exercise_name.bold(), ex.sets.len());
            }
        }

        SessionCmd::Edit {
            exercise,
            set,
            weight,
            reps,
            no_propagate,
        } => {
            if weight.is_none() && reps.is_none() {
                println!("{} nothing to change, pass --weight and/or --reps", "error:".red().bold());
                return Ok(());
            }
            let Some((ex_id, set_id)) = set_at(app, exercise, set) else {
                return Ok(());
            };

            app.with_active(|w| {
                if no_propagate {
                    w.update_set(
                        &ex_id,
                        set_id,
                        SetUpdate {
                            weight,
                            reps,
                            completed: None,
                        },
                    );
                    return;
                }
                if let Some(wt) = weight {
                    w.update_set_with_propagation(&ex_id, set_id, SetField::Weight(wt));
                }
                if let Some(r) = reps {
                    w.update_set_with_propagation(&ex_id, set_id, SetField::Reps(r));
                }
            })
            .await?;

            if let Some(ex) = app.session.active().and_then(|w| w.exercise(&ex_id)) {
                println!("{}", ex.exercise_name.bold());
                print_sets(ex, unit);
            }
        }

        SessionCmd::Done { exercise, set, undo } => {
            let Some(ex_id) = exercise_at(app, exercise) else {
                return Ok(());
            };

            let target = match set {
                Some(idx) => set_at(app, exercise, idx).map(|(_, id)| (idx, id)),
                None => {
                    let open = app
                        .session
                        .active()
                        .and_then(|w| w.exercise(&ex_id))
                        .and_then(|e| e.sets.iter().enumerate().find(|(_, s)| !s.completed));
                    match open {
                        Some((pos, s)) => Some((pos + 1, s.id)),
                        None => {
                            println!(
                                "{} every set is already completed, add one with `curls session add-set {}`",
                                "error:".red().bold(),
                                exercise
                            );
                            None
                        }
                    }
                }
            };
            let Some((set_no, set_id)) = target else {
                return Ok(());
            };

            app.with_active(|w| w.update_set(&ex_id, set_id, SetUpdate::completed(!undo)))
                .await?;

            let Some(ex) = app.session.active().and_then(|w| w.exercise(&ex_id)) else {
                return Ok(());
            };
            let s = &ex.sets[set_no - 1];
            let state = if undo { "reopened" } else { "completed" };
            println!(
                "{} set {} of {} {} ({} × {})",
                "ok:".green().bold(),
                set_no,
                ex.exercise_name.bold(),
                state,
                format_weight(s.weight, unit),
                s.reps
            );
        }

        SessionCmd::DelSet { exercise, set } => {
            let Some((ex_id, set_id)) = set_at(app, exercise, set) else {
                return Ok(());
            };
            if app.with_active(|w| w.delete_set(&ex_id, set_id)).await? == Some(true) {
                println!("{} set {} deleted", "ok:".green().bold(), set);
            } else {
                println!("{} an exercise must keep at least one set", "error:".red().bold());
            }
        }

        SessionCmd::DelEx { exercise } => {
            let Some(ex_id) = exercise_at(app, exercise) else {
                return Ok(());
            };
            app.with_active(|w| w.delete_exercise(&ex_id)).await?;
            println!("{} exercise {} removed", "ok:".green().bold(), exercise);
        }

        SessionCmd::Move { from, to } => {
            let Some(workout) = app.session.active() else {
                no_session();
                return Ok(());
            };
            let len = workout.exercises.len();
            let (Some(from_pos), Some(to_pos)) = (
                resolve_index("exercise", from, len),
                resolve_index("exercise", to, len),
            ) else {
                return Ok(());
            };
            if app.with_active(|w| w.move_exercise(from_pos, to_pos)).await? == Some(true) {
                println!("{} moved exercise {} to position {}", "ok:".green().bold(), from, to);
            } else {
                println!("{} exercise {} is already at position {}", "warning:".yellow().bold(), from, to);
            }
        }

        SessionCmd::Note { note, exercise } => match exercise {
            Some(idx) => {
                let Some(ex_id) = exercise_at(app, idx) else {
                    return Ok(());
                };
                app.with_active(|w| w.set_exercise_notes(&ex_id, note)).await?;
                println!("{} note saved for exercise {}", "ok:".green().bold(), idx);
            }
            None => match app.with_active(|w| w.set_notes(note)).await? {
                Some(()) => println!("{} workout note saved", "ok:".green().bold()),
                None => no_session(),
            },
        },

        SessionCmd::Title { title } => {
            match app.with_active(|w| w.set_title(title.trim())).await? {
                Some(()) => println!("{} workout renamed to `{}`", "ok:".green().bold(), title.trim()),
                None => no_session(),
            }
        }

        SessionCmd::Timer { follow } => {
            if !app.session.is_active() {
                no_session();
                return Ok(());
            }
            app.session.tick(Local::now());

            if !follow || fmt == OutputFmt::Json {
                let Some(workout) = app.session.active() else {
                    return Ok(());
                };
                let elapsed = format_duration(workout.elapsed());
                let json = TimerJson {
                    elapsed_secs: workout.elapsed_secs,
                    elapsed: elapsed.clone(),
                };
                emit(fmt, &json, || println!("{} {}", "elapsed:".cyan().bold(), elapsed))?;
                return Ok(());
            }

            let mut interval = time::interval(Duration::from_secs(1));
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        app.session.tick(Local::now());
                        if let Some(workout) = app.session.active() {
                            print!("\r{} {}", "elapsed:".cyan().bold(), format_duration(workout.elapsed()));
                            io::stdout().flush()?;
                        }
                    }
                    _ = &mut ctrl_c => break,
                }
            }
            println!();
            app.persist_session().await?;
        }
    }

    Ok(())
}
