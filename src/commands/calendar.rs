use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use curls::{App, OutputFmt, models::CompletedWorkout, types::emit};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayJson<'a> {
    day: u32,
    workouts: Vec<&'a str>,
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

fn print_month(first: NaiveDate, last: NaiveDate, by_day: &HashMap<u32, Vec<&CompletedWorkout>>) {
    println!("\n{}", first.format("%B %Y").to_string().bold().cyan());
    println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

    let first_weekday = first.weekday().num_days_from_sunday() as usize;
    print!("{}", "   ".repeat(first_weekday));

    for day in 1..=last.day() {
        if by_day.contains_key(&day) {
            print!("{:>2} ", day.to_string().green().bold());
        } else {
            print!("{:2} ", day);
        }
        if (first_weekday + day as usize) % 7 == 0 {
            println!();
        }
    }
    println!("\n");

    if by_day.is_empty() {
        return;
    }
    println!("{}", "Workouts:".bold().cyan());
    for day in by_day.keys().sorted() {
        for w in &by_day[day] {
            println!(
                "  {} - {} ({}) | {}",
                w.start_date.format("%a %b %d %H:%M").to_string().green(),
                w.end_date.format("%H:%M"),
                w.formatted_duration(),
                w.title.bold()
            );
            if !w.notes.is_empty() {
                println!("    {}", w.notes.dimmed());
            }
        }
    }
}

pub fn handle(app: &App, fmt: OutputFmt, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    let Some((first, last)) = month_bounds(year, month) else {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    };

    let (Some(from), Some(to)) = (
        first.and_hms_opt(0, 0, 0).and_then(|d| Local.from_local_datetime(&d).earliest()),
        last.and_hms_opt(23, 59, 59).and_then(|d| Local.from_local_datetime(&d).latest()),
    ) else {
        return Ok(());
    };

    // Oldest first within each day.
    let by_day: HashMap<u32, Vec<&CompletedWorkout>> = app
        .workouts
        .in_range(from, to)
        .into_iter()
        .rev()
        .into_group_map_by(|w| w.start_date.day());

    let json: Vec<DayJson> = by_day
        .iter()
        .sorted_by_key(|(day, _)| **day)
        .map(|(day, ws)| DayJson {
            day: *day,
            workouts: ws.iter().map(|w| w.title.as_str()).collect(),
        })
        .collect();

    emit(fmt, &json, || print_month(first, last, &by_day))
}
