use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    cli::{TemplateCmd, TemplateEditCmd},
    commands::{exercise::resolve_exercise, resolve_index},
};
use curls::{
    App, OutputFmt,
    models::{TemplateSet, WorkoutTemplate},
    types::emit,
    utils::format_weight,
    validation::ValidationReport,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateJson<'a> {
    idx: usize,
    id: Uuid,
    name: &'a str,
    exercises: usize,
    sets: usize,
    estimated_duration: String,
    is_default: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationJson<'a> {
    idx: usize,
    name: &'a str,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

fn pretty_print(rows: &[TemplateJson], templates: &[WorkoutTemplate]) {
    if rows.is_empty() {
        println!("{}", "  (no templates found)".dimmed());
        return;
    }

    println!("{}", "Templates:".cyan().bold());
    for (row, t) in rows.iter().zip(templates) {
        let default = if row.is_default { " default".magenta().to_string() } else { String::new() };
        let last_used = t
            .last_used_date
            .map(|d| format!(", last used {}", d.format("%d-%m-%Y")))
            .unwrap_or_default();
        println!(
            " {} • {}{} {}",
            format!("{}", row.idx).yellow(),
            row.name.bold(),
            default,
            format!(
                "({} exercises, {} sets, ~{}{})",
                row.exercises, row.sets, row.estimated_duration, last_used
            )
            .dimmed()
        );
    }
}

fn print_template(t: &WorkoutTemplate, unit: &str) {
    println!("{} {}", t.name.bold().cyan(), format!("(~{})", t.estimated_duration()).dimmed());
    if !t.notes.is_empty() {
        println!("  {}", t.notes.dimmed());
    }
    for (i, ex) in t.exercises.iter().enumerate() {
        let sets: Vec<String> = ex
            .sets
            .iter()
            .map(|s| format!("{}×{}", format_weight(s.weight, unit), s.reps))
            .collect();
        println!(
            "{} • {} {}",
            format!("{}", i + 1).yellow(),
            ex.exercise_name.bold(),
            sets.join(", ").dimmed()
        );
    }
}

fn print_report(idx: usize, name: &str, report: &ValidationReport) {
    if !report.has_errors() {
        println!("{} {} `{}` is valid", "ok:".green().bold(), idx, name);
        return;
    }
    println!("{} {} `{}`:", "warning:".yellow().bold(), idx, name);
    for issue in &report.issues {
        println!("    {}", issue);
    }
}

/// Exercise count of a template and, when `exercise` is given, its set count.
fn shape(app: &App, id: Uuid, exercise: Option<usize>) -> (usize, usize) {
    let Some(t) = app.templates.get(id) else {
        return (0, 0);
    };
    let sets = exercise.and_then(|i| t.exercises.get(i)).map_or(0, |e| e.sets.len());
    (t.exercises.len(), sets)
}

async fn edit(app: &mut App, id: Uuid, action: TemplateEditCmd, unit: &str) -> Result<()> {
    match action {
        TemplateEditCmd::Rename { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                println!("{} template name must not be empty", "error:".red().bold());
                return Ok(());
            }
            app.templates
                .edit(id, |t| {
                    t.name = name.clone();
                    true
                })
                .await?;
            println!("{} template renamed to `{}`", "ok:".green().bold(), name);
        }

        TemplateEditCmd::Notes { notes } => {
            app.templates
                .edit(id, |t| {
                    t.notes = notes.trim().to_string();
                    true
                })
                .await?;
            println!("{} notes updated", "ok:".green().bold());
        }

        TemplateEditCmd::AddEx {
            exercise,
            sets,
            weight,
            reps,
        } => {
            let query = exercise.join(" ");
            let Some(ex) = resolve_exercise(app, &query) else {
                return Ok(());
            };
            let (ex_id, ex_name) = (ex.id.clone(), ex.name.clone());
            let planned = (0..sets.max(1)).map(|_| TemplateSet::new(weight, reps)).collect();

            if app.templates.edit(id, |t| t.add_exercise(&ex_id, &ex_name, planned)).await? == Some(true) {
                println!(
                    "{} added {} ({} sets of {})",
                    "ok:".green().bold(),
                    ex_name.bold(),
                    sets.max(1),
                    format!("{} × {}", format_weight(weight, unit), reps).dimmed()
                );
            } else {
                println!("{} {} is already in this template", "warning:".yellow().bold(), ex_name);
            }
        }

        TemplateEditCmd::DelEx { exercise } => {
            let (len, _) = shape(app, id, None);
            let Some(pos) = resolve_index("exercise", exercise, len) else {
                return Ok(());
            };
            let mut removed = None;
            app.templates
                .edit(id, |t| {
                    removed = t.remove_exercise(pos);
                    removed.is_some()
                })
                .await?;
            if let Some(ex) = removed {
                println!("{} removed {}", "ok:".green().bold(), ex.exercise_name.bold());
            }
        }

        TemplateEditCmd::AddSet { exercise, weight, reps } => {
            let (len, _) = shape(app, id, None);
            let Some(pos) = resolve_index("exercise", exercise, len) else {
                return Ok(());
            };
            let last = app
                .templates
                .get(id)
                .and_then(|t| t.exercises[pos].sets.last())
                .map_or((0.0, 0), |s| (s.weight, s.reps));
            let set = TemplateSet::new(weight.unwrap_or(last.0), reps.unwrap_or(last.1));
            let shown = format!("{} × {}", format_weight(set.weight, unit), set.reps);

            if app.templates.edit(id, |t| t.add_set(pos, set)).await? == Some(true) {
                println!("{} set added ({})", "ok:".green().bold(), shown.dimmed());
            }
        }

        TemplateEditCmd::SetSet {
            exercise,
            set,
            weight,
            reps,
        } => {
            if weight.is_none() && reps.is_none() {
                println!("{} nothing to change, pass --weight and/or --reps", "error:".red().bold());
                return Ok(());
            }
            let (len, _) = shape(app, id, None);
            let Some(ex_pos) = resolve_index("exercise", exercise, len) else {
                return Ok(());
            };
            let (_, set_len) = shape(app, id, Some(ex_pos));
            let Some(set_pos) = resolve_index("set", set, set_len) else {
                return Ok(());
            };

            if app
                .templates
                .edit(id, |t| t.update_set(ex_pos, set_pos, weight, reps))
                .await?
                == Some(true)
            {
                println!("{} set {} updated", "ok:".green().bold(), set);
            }
        }

        TemplateEditCmd::DelSet { exercise, set } => {
            let (len, _) = shape(app, id, None);
            let Some(ex_pos) = resolve_index("exercise", exercise, len) else {
                return Ok(());
            };
            let (_, set_len) = shape(app, id, Some(ex_pos));
            let Some(set_pos) = resolve_index("set", set, set_len) else {
                return Ok(());
            };

            if app.templates.edit(id, |t| t.remove_set(ex_pos, set_pos)).await? == Some(true) {
                println!("{} set {} deleted", "ok:".green().bold(), set);
            } else {
                println!("{} an exercise must keep at least one set", "error:".red().bold());
            }
        }
    }

    Ok(())
}

pub async fn handle(cmd: TemplateCmd, app: &mut App, fmt: OutputFmt, unit: &str) -> Result<()> {
    match cmd {
        TemplateCmd::List => {
            let templates = app.templates.all();
            let rows: Vec<TemplateJson> = templates
                .iter()
                .enumerate()
                .map(|(i, t)| TemplateJson {
                    idx: i + 1,
                    id: t.id,
                    name: &t.name,
                    exercises: t.exercise_count(),
                    sets: t.total_sets(),
                    estimated_duration: t.estimated_duration(),
                    is_default: t.is_default,
                })
                .collect();
            emit(fmt, &rows, || pretty_print(&rows, templates))?;
        }

        TemplateCmd::Show { template } => {
            let templates = app.templates.all();
            let Some(pos) = resolve_index("template", template, templates.len()) else {
                return Ok(());
            };
            let t = &templates[pos];
            emit(fmt, t, || print_template(t, unit))?;
        }

        TemplateCmd::Delete { template } => {
            let Some(pos) = resolve_index("template", template, app.templates.all().len()) else {
                return Ok(());
            };
            let id = app.templates.all()[pos].id;
            if let Some(removed) = app.templates.delete(id).await? {
                println!("{} template `{}` deleted", "ok:".green().bold(), removed.name);
            }
        }

        TemplateCmd::Create { name, notes } => {
            let id = app.templates.create(&name, &notes).await?;
            let idx = app.templates.all().len();
            let name = app.templates.get(id).map(|t| t.name.as_str()).unwrap_or_default();
            println!("{} template `{}` created as {}", "ok:".green().bold(), name, idx);
            println!(
                "{} add exercises with `curls template edit {} add-ex <EXERCISE>`",
                "hint:".blue().bold(),
                idx
            );
        }

        TemplateCmd::Duplicate { template } => {
            let Some(pos) = resolve_index("template", template, app.templates.all().len()) else {
                return Ok(());
            };
            let id = app.templates.all()[pos].id;
            if let Some(copy) = app.templates.duplicate(id).await? {
                let name = app.templates.get(copy).map(|t| t.name.as_str()).unwrap_or_default();
                println!(
                    "{} template `{}` created as {}",
                    "ok:".green().bold(),
                    name,
                    app.templates.all().len()
                );
            }
        }

        TemplateCmd::Edit { template, action } => {
            let Some(pos) = resolve_index("template", template, app.templates.all().len()) else {
                return Ok(());
            };
            let id = app.templates.all()[pos].id;
            edit(app, id, action, unit).await?;
        }

        TemplateCmd::Move { from, to } => {
            let len = app.templates.all().len();
            let (Some(from_pos), Some(to_pos)) = (
                resolve_index("template", from, len),
                resolve_index("template", to, len),
            ) else {
                return Ok(());
            };
            if app.templates.reorder(from_pos, to_pos).await? {
                println!("{} moved template {} to position {}", "ok:".green().bold(), from, to);
            }
        }

        TemplateCmd::Validate { template, fix } => {
            let len = app.templates.all().len();
            let positions: Vec<usize> = match template {
                Some(idx) => match resolve_index("template", idx, len) {
                    Some(pos) => vec![pos],
                    None => return Ok(()),
                },
                None => (0..len).collect(),
            };
            let ids: Vec<Uuid> = positions.iter().map(|&p| app.templates.all()[p].id).collect();

            if fix {
                for (&pos, &id) in positions.iter().zip(&ids) {
                    if app.repair_template(id).await? == Some(true) {
                        let name = app.templates.get(id).map(|t| t.name.as_str()).unwrap_or_default();
                        println!("{} repaired {} `{}`", "ok:".green().bold(), pos + 1, name);
                    }
                }
            }

            let reports: Vec<(usize, &WorkoutTemplate, ValidationReport)> = positions
                .iter()
                .zip(&ids)
                .filter_map(|(&pos, &id)| {
                    let t = app.templates.get(id)?;
                    Some((pos + 1, t, app.validate_template(id)?))
                })
                .collect();
            let json: Vec<ValidationJson> = reports
                .iter()
                .map(|(idx, t, report)| ValidationJson {
                    idx: *idx,
                    name: &t.name,
                    report,
                })
                .collect();

            emit(fmt, &json, || {
                for (idx, t, report) in &reports {
                    print_report(*idx, &t.name, report);
                }
                if !fix && reports.iter().any(|(_, _, r)| r.has_errors()) {
                    println!(
                        "{} run with --fix to apply the suggestions and drop missing exercises",
                        "hint:".blue().bold()
                    );
                }
            })?;
        }

        TemplateCmd::Reset => {
            app.templates.reset_defaults().await?;
            println!("{} default templates recreated", "ok:".green().bold());
        }
    }

    Ok(())
}
