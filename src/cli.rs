// src/cli.rs
use chrono::{Duration, NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "A CLI tool to track the Insanity and StrongLifts 5x5 programs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Parse date strings like "today", "yesterday", or explicit dates.
pub fn parse_date_shorthand(s: &str) -> Result<NaiveDate, String> {
    match s.to_lowercase().as_str() {
        "today" => Ok(Utc::now().date_naive()),
        "yesterday" => Ok((Utc::now() - Duration::days(1)).date_naive()),
        _ => {
            // Try parsing YYYY-MM-DD first
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date)
            }
            // Try parsing DD.MM.YYYY next
            else if let Ok(date) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
                Ok(date)
            }
            // Try parsing YYYY/MM/DD
            else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
                Ok(date)
            } else {
                Err(format!(
                    "Invalid date format: '{}'. Use 'today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY, or YYYY/MM/DD.",
                    s
                ))
            }
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutTypeCli {
    A,
    B,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityTypeCli {
    Walk,
    Hike,
    Ruck,
    Peloton,
    Zone2,
    Sauna,
    IceBath,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneCli {
    Zone2,
    Zone3,
    Zone4,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Lbs,
    Kg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetTargetCli {
    Insanity,
    Stronglifts,
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start (or restart) the 60-day HIIT program
    StartHiit {
        /// Program start date (defaults to today)
        #[arg(value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
    },
    /// Show the 63-day HIIT calendar
    Calendar,
    /// Toggle completion of a HIIT calendar day
    ToggleDay {
        /// Program day number (1-63)
        day: u32,
    },
    /// Show HIIT completion progress
    HiitProgress,
    /// Record a fit test (8 rep counts, one per exercise)
    RecordFitTest {
        /// Program day of the checkpoint (defaults to the next one due)
        #[arg(short, long)]
        day: Option<u32>,
        /// Rep counts in exercise order, e.g. -r 50,40,60,30,10,12,20,30
        #[arg(short, long, value_delimiter = ',', required = true)]
        reps: Vec<u32>,
    },
    /// Show fit test results side by side
    FitTestProgress,
    /// Show the next strength workout and its weights
    NextLift,
    /// Run a strength session interactively
    StartLift {
        /// Override the A/B rotation
        #[arg(value_enum)]
        workout: Option<WorkoutTypeCli>,
        /// Session date (defaults to today)
        #[arg(long, value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
    },
    /// List recorded strength sessions
    ListLifts {
        /// Show only the last N sessions
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Show one strength session in full
    ViewLift {
        #[arg(value_parser = parse_date_shorthand)]
        date: NaiveDate,
    },
    /// Log a cardio or recovery activity
    LogActivity {
        /// Kind of activity
        #[arg(value_enum)]
        type_: ActivityTypeCli,
        /// Activity date (defaults to today)
        #[arg(long, value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<i64>,
        /// Distance in miles (walk/hike/ruck)
        #[arg(long)]
        distance: Option<f64>,
        /// Heart rate zone
        #[arg(short, long, value_enum)]
        zone: Option<ZoneCli>,
        /// Additional notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List logged activities
    ListActivities {
        /// Only show activities on this date
        #[arg(long, value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
    },
    /// Delete a logged activity
    DeleteActivity {
        /// ID of the activity to delete
        id: i64,
    },
    /// Show everything on one calendar date
    Day {
        /// Date to inspect (defaults to today)
        #[arg(value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
    },
    /// Set the display unit for strength weights
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Export all data as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import data from a JSON export, replacing current data
    Import {
        file: PathBuf,
    },
    /// Erase tracked data
    Reset {
        #[arg(value_enum)]
        target: ResetTargetCli,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Set the table header color
    SetHeaderColor {
        color: String,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
