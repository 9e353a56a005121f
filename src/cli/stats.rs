use std::{collections::HashMap, fmt::Display, path::PathBuf};

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use serde::Serialize;
use tracing::warn;

use crate::{
    daemon::storage::{
        entities::{StoredRecord, MOVEMENT_CODE},
        record_storage::SqliteRecordStore,
    },
    utils::{
        dir::{resolve_store_path, DEFAULT_STORE_FILE},
        percentage::{count_percentage, Percentage},
        time::parse_record_time,
    },
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(long, default_value = DEFAULT_STORE_FILE, help = "SQLite file written by the daemon")]
    storepath: PathBuf,
    #[arg(
        long,
        short,
        help = "Day to summarize. Examples are \"yesterday\", \"friday\", \"15/03/2025\". Defaults to today"
    )]
    day: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(short = 'p', long = "percentage", help = "Hide applications with a smaller share of key records", default_value_t = Percentage::new_opt(0.).unwrap())]
    min_percentage: Percentage,
    #[arg(long, help = "Print the summary as JSON")]
    json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSummary {
    pub app_name: String,
    pub key_records: u64,
    pub share: Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub key_records: u64,
    pub pointer_distance: f64,
    pub apps: Vec<AppSummary>,
}

/// Summarizes stored rows of one day. Rows the daemon couldn't have written are skipped.
pub fn summarize(rows: &[StoredRecord], day: NaiveDate) -> DaySummary {
    let mut per_app = HashMap::<&str, u64>::new();
    let mut pointer_distance = 0.;

    for row in rows {
        let moment = match parse_record_time(&row.time) {
            Ok(moment) => moment,
            Err(e) => {
                warn!("Skipping row with time {:?}: {e}", row.time);
                continue;
            }
        };
        if moment.date() != day {
            continue;
        }

        if row.code == MOVEMENT_CODE {
            match row.value.parse::<f64>() {
                Ok(distance) => pointer_distance += distance,
                Err(e) => warn!("Skipping movement row with value {:?}: {e}", row.value),
            }
        } else {
            *per_app.entry(row.app_name.as_str()).or_default() += 1;
        }
    }

    let key_records: u64 = per_app.values().sum();
    let mut apps = per_app
        .into_iter()
        .map(|(app_name, count)| AppSummary {
            app_name: app_name.to_string(),
            key_records: count,
            share: count_percentage(count, key_records),
        })
        .collect::<Vec<_>>();
    apps.sort_by(|a, b| {
        b.key_records
            .cmp(&a.key_records)
            .then_with(|| a.app_name.cmp(&b.app_name))
    });

    DaySummary {
        day,
        key_records,
        pointer_distance,
        apps,
    }
}

fn parse_day(day: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match day.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local).date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate day {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

fn print_summary(summary: &DaySummary, min_percentage: Percentage) {
    let header = Style::new().bold();
    println!(
        "{}",
        header.paint(format!("Activity for {}", summary.day.format("%d/%m/%Y")))
    );
    println!(
        "{}\t{}",
        Colour::Cyan.paint("Pointer distance"),
        summary.pointer_distance.round()
    );
    println!(
        "{}\t{}",
        Colour::Cyan.paint("Key records"),
        summary.key_records
    );
    println!();
    for app in summary.apps.iter().filter(|app| app.share >= min_percentage) {
        println!(
            "{}\t{}\t{}",
            app.share,
            app.key_records,
            Colour::Green.paint(&app.app_name)
        );
    }
}

/// Command to process `stats` command. Stats command reports per application activity of a
/// single day from the store.
pub fn process_stats_command(
    StatsCommand {
        storepath,
        day,
        date_style,
        min_percentage,
        json,
    }: StatsCommand,
) -> Result<()> {
    let day = parse_day(day, date_style)?;
    let store = SqliteRecordStore::open_read_only(&resolve_store_path(&storepath)?)?;
    let summary = summarize(&store.read_all()?, day);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, min_percentage);
    }
    Ok(())
}
