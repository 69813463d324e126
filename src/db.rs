//src/db.rs
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;

// The two structured programs. Stored as lowercase strings, which double as
// the primary key of the program_state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Program {
    Insanity,
    Stronglifts,
}

// A/B split of the strength program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutType {
    A,
    B,
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl TryFrom<&str> for WorkoutType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            _ => Err(format!("Invalid workout type: {value}")),
        }
    }
}

// Ad-hoc activity kinds, replacing the original's config-screen string list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityType {
    Walk,
    Hike,
    Ruck,
    Peloton,
    Zone2,
    Sauna,
    IceBath,
}

impl ActivityType {
    pub const fn category(self) -> ActivityCategory {
        match self {
            Self::Walk | Self::Hike | Self::Ruck | Self::Peloton | Self::Zone2 => {
                ActivityCategory::Cardio
            }
            Self::Sauna | Self::IceBath => ActivityCategory::Recovery,
        }
    }

    /// Whether this kind tracks a distance.
    pub const fn has_distance(self) -> bool {
        matches!(self, Self::Walk | Self::Hike | Self::Ruck)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Walk => "Walk",
            Self::Hike => "Hike",
            Self::Ruck => "Ruck",
            Self::Peloton => "Peloton",
            Self::Zone2 => "Zone 2",
            Self::Sauna => "Sauna",
            Self::IceBath => "Ice Bath",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityCategory {
    Cardio,
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HeartRateZone {
    Zone2,
    Zone3,
    Zone4,
}

/// One calendar day of the HIIT program, created lazily on first toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWorkout {
    pub day: u32,
    pub workout_name: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitTestEntry {
    pub name: String,
    pub reps: u32,
}

/// A scored fitness checkpoint (tests 1-5 at fixed program days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitTestResult {
    pub test_number: u32,
    pub day: u32,
    pub exercises: Vec<FitTestEntry>,
    pub completed_at: DateTime<Utc>,
}

impl FitTestResult {
    pub fn total_reps(&self) -> u32 {
        self.exercises.iter().map(|e| e.reps).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub target_reps: u32,
    pub completed_reps: Option<u32>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub name: String,
    pub weight: f64,
    pub sets: Vec<SetLog>,
    /// Set when every set hit the target; the next session's starting
    /// weight applies the earned increment.
    #[serde(default)]
    pub should_increase: bool,
}

/// One strength-training session, persisted once at completion.
/// `id` is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthWorkout {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub exercises: Vec<ExerciseLog>,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A logged cardio or recovery event outside the structured programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub category: ActivityCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_zone: Option<HeartRateZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Fields of an activity before the store assigns an id, the category is
/// derived from the kind, and the completion timestamp is defaulted.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub date: NaiveDate,
    pub activity_type: Option<ActivityType>,
    pub duration: Option<i64>,
    pub distance: Option<f64>,
    pub heart_rate_zone: Option<HeartRateZone>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Start-date anchor for a program; absence means "not started".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramState {
    pub program: Program,
    pub start_date: NaiveDate,
    pub current_day: u32,
}

/// Full portable snapshot of every collection. The camelCase keys are the
/// backup/restore contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub insanity_workouts: Vec<DayWorkout>,
    pub fit_tests: Vec<FitTestResult>,
    pub stronglifts_workouts: Vec<StrengthWorkout>,
    pub activities: Vec<Activity>,
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub export_date: DateTime<Utc>,
}

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
    #[error("Activity not found: ID {0}")]
    ActivityNotFound(i64),
    #[error("Failed to encode stored record payload: {0}")]
    Payload(#[from] serde_json::Error),
}

const DB_FILE_NAME: &str = "fittrack.sqlite";

/// Gets the path to the SQLite database file within the app's data directory.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join("fittrack"); // Same dir name as config
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    let conn = Connection::open(path).map_err(DbError::Connection)?;
    Ok(conn)
}

/// Initializes the tables if they don't exist. One table per collection;
/// nested exercise payloads are stored as JSON text columns.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS insanity_workouts (
            day INTEGER PRIMARY KEY,
            workout_name TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT -- RFC3339, NULL until completed
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fit_tests (
            test_number INTEGER PRIMARY KEY,
            day INTEGER NOT NULL,
            exercises TEXT NOT NULL, -- JSON [{name, reps}], order preserved
            completed_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS stronglifts_workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL, -- YYYY-MM-DD
            workout_type TEXT NOT NULL CHECK(workout_type IN ('A', 'B')),
            exercises TEXT NOT NULL, -- JSON, includes per-set state and shouldIncrease
            completed INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            completed_at TEXT
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            category TEXT NOT NULL CHECK(category IN ('cardio', 'recovery')),
            duration_minutes INTEGER,
            distance REAL,
            heart_rate_zone TEXT,
            notes TEXT,
            completed_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL -- JSON-encoded value
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    // Indexes for common lookups
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_stronglifts_date ON stronglifts_workouts(date)",
        [],
    )
    .map_err(DbError::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_date ON activities(date)",
        [],
    )
    .map_err(DbError::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_type ON activities(activity_type)",
        [],
    )
    .map_err(DbError::Connection)?;

    Ok(())
}

// --- Row mapping helpers ---

fn parse_timestamp(column: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_date(column: usize, value: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn column_conversion_err<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

// ============ HIIT Calendar Days ============

fn map_row_to_day_workout(row: &Row) -> Result<DayWorkout, rusqlite::Error> {
    let completed_at: Option<String> = row.get(3)?;
    Ok(DayWorkout {
        day: row.get(0)?,
        workout_name: row.get(1)?,
        completed: row.get(2)?,
        completed_at: completed_at
            .map(|ts| parse_timestamp(3, &ts))
            .transpose()?,
    })
}

pub fn get_day_workout(conn: &Connection, day: u32) -> Result<Option<DayWorkout>, DbError> {
    conn.prepare(
        "SELECT day, workout_name, completed, completed_at FROM insanity_workouts WHERE day = ?1",
    )
    .map_err(DbError::QueryFailed)?
    .query_row(params![day], map_row_to_day_workout)
    .optional()
    .map_err(DbError::QueryFailed)
}

pub fn list_day_workouts(conn: &Connection) -> Result<Vec<DayWorkout>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT day, workout_name, completed, completed_at
             FROM insanity_workouts ORDER BY day ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map([], map_row_to_day_workout)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Upserts a day record (the store is keyed by day; toggling rewrites it).
pub fn put_day_workout(conn: &Connection, workout: &DayWorkout) -> Result<(), DbError> {
    conn.execute(
        "INSERT OR REPLACE INTO insanity_workouts (day, workout_name, completed, completed_at)
         VALUES (:day, :name, :completed, :completed_at)",
        named_params! {
            ":day": workout.day,
            ":name": workout.workout_name,
            ":completed": workout.completed,
            ":completed_at": workout.completed_at.map(|ts| ts.to_rfc3339()),
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

pub fn completed_day_count(conn: &Connection) -> Result<u32, DbError> {
    conn.query_row(
        "SELECT COUNT(*) FROM insanity_workouts WHERE completed = 1",
        [],
        |row| row.get(0),
    )
    .map_err(DbError::QueryFailed)
}

// ============ Fit Tests ============

fn map_row_to_fit_test(row: &Row) -> Result<FitTestResult, rusqlite::Error> {
    let exercises_json: String = row.get(2)?;
    let completed_at: String = row.get(3)?;
    Ok(FitTestResult {
        test_number: row.get(0)?,
        day: row.get(1)?,
        exercises: serde_json::from_str(&exercises_json)
            .map_err(|e| column_conversion_err(2, e))?,
        completed_at: parse_timestamp(3, &completed_at)?,
    })
}

pub fn list_fit_tests(conn: &Connection) -> Result<Vec<FitTestResult>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT test_number, day, exercises, completed_at
             FROM fit_tests ORDER BY test_number ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map([], map_row_to_fit_test)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Upserts a checkpoint result (re-recording a test overwrites it).
pub fn put_fit_test(conn: &Connection, test: &FitTestResult) -> Result<(), DbError> {
    let exercises_json = serde_json::to_string(&test.exercises)?;
    conn.execute(
        "INSERT OR REPLACE INTO fit_tests (test_number, day, exercises, completed_at)
         VALUES (:test_number, :day, :exercises, :completed_at)",
        named_params! {
            ":test_number": test.test_number,
            ":day": test.day,
            ":exercises": exercises_json,
            ":completed_at": test.completed_at.to_rfc3339(),
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

// ============ Strength Workouts ============

const STRENGTH_COLUMNS: &str =
    "id, date, workout_type, exercises, completed, started_at, completed_at";

fn map_row_to_strength_workout(row: &Row) -> Result<StrengthWorkout, rusqlite::Error> {
    let date: String = row.get(1)?;
    let type_str: String = row.get(2)?;
    let exercises_json: String = row.get(3)?;
    let started_at: String = row.get(5)?;
    let completed_at: Option<String> = row.get(6)?;
    Ok(StrengthWorkout {
        id: row.get(0)?,
        date: parse_date(1, &date)?,
        workout_type: WorkoutType::try_from(type_str.as_str()).map_err(|e| {
            column_conversion_err(2, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?,
        exercises: serde_json::from_str(&exercises_json)
            .map_err(|e| column_conversion_err(3, e))?,
        completed: row.get(4)?,
        started_at: parse_timestamp(5, &started_at)?,
        completed_at: completed_at
            .map(|ts| parse_timestamp(6, &ts))
            .transpose()?,
    })
}

/// Inserts a strength workout; the record's `id` is ignored and the
/// store-assigned id returned.
pub fn insert_strength_workout(
    conn: &Connection,
    workout: &StrengthWorkout,
) -> Result<i64, DbError> {
    let exercises_json = serde_json::to_string(&workout.exercises)?;
    conn.execute(
        "INSERT INTO stronglifts_workouts (date, workout_type, exercises, completed, started_at, completed_at)
         VALUES (:date, :type, :exercises, :completed, :started_at, :completed_at)",
        named_params! {
            ":date": workout.date.format("%Y-%m-%d").to_string(),
            ":type": workout.workout_type.to_string(),
            ":exercises": exercises_json,
            ":completed": workout.completed,
            ":started_at": workout.started_at.to_rfc3339(),
            ":completed_at": workout.completed_at.map(|ts| ts.to_rfc3339()),
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

pub fn list_strength_workouts(conn: &Connection) -> Result<Vec<StrengthWorkout>, DbError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STRENGTH_COLUMNS} FROM stronglifts_workouts ORDER BY date ASC, id ASC"
        ))
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map([], map_row_to_strength_workout)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

pub fn strength_workout_on(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Option<StrengthWorkout>, DbError> {
    conn.prepare(&format!(
        "SELECT {STRENGTH_COLUMNS} FROM stronglifts_workouts WHERE date = ?1 ORDER BY id DESC LIMIT 1"
    ))
    .map_err(DbError::QueryFailed)?
    .query_row(
        params![date.format("%Y-%m-%d").to_string()],
        map_row_to_strength_workout,
    )
    .optional()
    .map_err(DbError::QueryFailed)
}

// ============ Activities ============

const ACTIVITY_COLUMNS: &str =
    "id, date, activity_type, category, duration_minutes, distance, heart_rate_zone, notes, completed_at";

fn map_row_to_activity(row: &Row) -> Result<Activity, rusqlite::Error> {
    let date: String = row.get(1)?;
    let type_str: String = row.get(2)?;
    let category_str: String = row.get(3)?;
    let zone_str: Option<String> = row.get(6)?;
    let completed_at: String = row.get(8)?;
    Ok(Activity {
        id: row.get(0)?,
        date: parse_date(1, &date)?,
        activity_type: ActivityType::from_str(&type_str)
            .map_err(|e| column_conversion_err(2, e))?,
        category: ActivityCategory::from_str(&category_str)
            .map_err(|e| column_conversion_err(3, e))?,
        duration: row.get(4)?,
        distance: row.get(5)?,
        heart_rate_zone: zone_str
            .map(|z| HeartRateZone::from_str(&z).map_err(|e| column_conversion_err(6, e)))
            .transpose()?,
        notes: row.get(7)?,
        completed_at: parse_timestamp(8, &completed_at)?,
    })
}

/// Inserts an activity; the record's `id` is ignored and the store-assigned
/// id returned.
pub fn insert_activity(conn: &Connection, activity: &Activity) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO activities (date, activity_type, category, duration_minutes, distance, heart_rate_zone, notes, completed_at)
         VALUES (:date, :type, :category, :duration, :distance, :zone, :notes, :completed_at)",
        named_params! {
            ":date": activity.date.format("%Y-%m-%d").to_string(),
            ":type": activity.activity_type.to_string(),
            ":category": activity.category.to_string(),
            ":duration": activity.duration,
            ":distance": activity.distance,
            ":zone": activity.heart_rate_zone.map(|z| z.to_string()),
            ":notes": activity.notes.as_deref(),
            ":completed_at": activity.completed_at.to_rfc3339(),
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

pub fn update_activity(conn: &Connection, activity: &Activity) -> Result<u64, DbError> {
    let rows_affected = conn
        .execute(
            "UPDATE activities SET date = :date, activity_type = :type, category = :category,
             duration_minutes = :duration, distance = :distance, heart_rate_zone = :zone,
             notes = :notes, completed_at = :completed_at
             WHERE id = :id",
            named_params! {
                ":id": activity.id,
                ":date": activity.date.format("%Y-%m-%d").to_string(),
                ":type": activity.activity_type.to_string(),
                ":category": activity.category.to_string(),
                ":duration": activity.duration,
                ":distance": activity.distance,
                ":zone": activity.heart_rate_zone.map(|z| z.to_string()),
                ":notes": activity.notes.as_deref(),
                ":completed_at": activity.completed_at.to_rfc3339(),
            },
        )
        .map_err(DbError::UpdateFailed)?;
    if rows_affected == 0 {
        Err(DbError::ActivityNotFound(activity.id))
    } else {
        Ok(rows_affected as u64)
    }
}

pub fn get_activity(conn: &Connection, id: i64) -> Result<Option<Activity>, DbError> {
    conn.prepare(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"
    ))
    .map_err(DbError::QueryFailed)?
    .query_row(params![id], map_row_to_activity)
    .optional()
    .map_err(DbError::QueryFailed)
}

pub fn list_activities(conn: &Connection) -> Result<Vec<Activity>, DbError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY date ASC, id ASC"
        ))
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map([], map_row_to_activity)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

pub fn activities_on(conn: &Connection, date: NaiveDate) -> Result<Vec<Activity>, DbError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE date = ?1 ORDER BY completed_at ASC"
        ))
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(
            params![date.format("%Y-%m-%d").to_string()],
            map_row_to_activity,
        )
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

pub fn delete_activity(conn: &Connection, id: i64) -> Result<u64, DbError> {
    let rows_affected = conn
        .execute("DELETE FROM activities WHERE id = ?1", params![id])
        .map_err(DbError::DeleteFailed)?;
    if rows_affected == 0 {
        Err(DbError::ActivityNotFound(id))
    } else {
        Ok(rows_affected as u64)
    }
}

// ============ Program State ============
//
// The start anchor lives in the settings store (as the original data format
// does) so it travels inside export snapshots without a key of its own.

fn start_date_key(program: Program) -> String {
    format!("{program}StartDate")
}

fn current_day_key(program: Program) -> String {
    format!("{program}CurrentDay")
}

pub fn get_program_state(
    conn: &Connection,
    program: Program,
) -> Result<Option<ProgramState>, DbError> {
    let Some(start) = get_setting(conn, &start_date_key(program))? else {
        return Ok(None);
    };
    let start_date: NaiveDate = serde_json::from_value(start)?;
    let current_day = match get_setting(conn, &current_day_key(program))? {
        Some(v) => serde_json::from_value(v)?,
        None => 1,
    };
    Ok(Some(ProgramState {
        program,
        start_date,
        current_day,
    }))
}

pub fn put_program_state(conn: &Connection, state: &ProgramState) -> Result<(), DbError> {
    put_setting(
        conn,
        &start_date_key(state.program),
        &serde_json::to_value(state.start_date)?,
    )?;
    put_setting(
        conn,
        &current_day_key(state.program),
        &serde_json::to_value(state.current_day)?,
    )?;
    Ok(())
}

// ============ Settings ============

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<serde_json::Value>, DbError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(DbError::QueryFailed)?;
    raw.map(|v| serde_json::from_str(&v))
        .transpose()
        .map_err(Into::into)
}

pub fn put_setting(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<(), DbError> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, serde_json::to_string(value)?],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

pub fn all_settings(
    conn: &Connection,
) -> Result<serde_json::Map<String, serde_json::Value>, DbError> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM settings ORDER BY key ASC")
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map([], |row| {
            let key: String = row.get(0)?;
            let raw: String = row.get(1)?;
            Ok((key, raw))
        })
        .map_err(DbError::QueryFailed)?;

    let mut map = serde_json::Map::new();
    for entry in iter {
        let (key, raw) = entry.map_err(DbError::QueryFailed)?;
        map.insert(key, serde_json::from_str(&raw)?);
    }
    Ok(map)
}

// ============ Data Management ============

/// Builds the portable snapshot of every collection.
pub fn export_snapshot(conn: &Connection, now: DateTime<Utc>) -> Result<ExportSnapshot, DbError> {
    Ok(ExportSnapshot {
        insanity_workouts: list_day_workouts(conn)?,
        fit_tests: list_fit_tests(conn)?,
        stronglifts_workouts: list_strength_workouts(conn)?,
        activities: list_activities(conn)?,
        settings: all_settings(conn)?,
        export_date: now,
    })
}

/// Restores a snapshot wholesale, replacing current contents. Record ids are
/// preserved so a restored database matches the exported one.
pub fn import_snapshot(conn: &mut Connection, snapshot: &ExportSnapshot) -> Result<(), DbError> {
    let tx = conn.transaction().map_err(DbError::Connection)?;

    for table in [
        "insanity_workouts",
        "fit_tests",
        "stronglifts_workouts",
        "activities",
        "settings",
    ] {
        tx.execute(&format!("DELETE FROM {table}"), [])
            .map_err(DbError::DeleteFailed)?;
    }

    for workout in &snapshot.insanity_workouts {
        tx.execute(
            "INSERT INTO insanity_workouts (day, workout_name, completed, completed_at)
             VALUES (:day, :name, :completed, :completed_at)",
            named_params! {
                ":day": workout.day,
                ":name": workout.workout_name,
                ":completed": workout.completed,
                ":completed_at": workout.completed_at.map(|ts| ts.to_rfc3339()),
            },
        )
        .map_err(DbError::InsertFailed)?;
    }

    for test in &snapshot.fit_tests {
        let exercises_json = serde_json::to_string(&test.exercises)?;
        tx.execute(
            "INSERT INTO fit_tests (test_number, day, exercises, completed_at)
             VALUES (:test_number, :day, :exercises, :completed_at)",
            named_params! {
                ":test_number": test.test_number,
                ":day": test.day,
                ":exercises": exercises_json,
                ":completed_at": test.completed_at.to_rfc3339(),
            },
        )
        .map_err(DbError::InsertFailed)?;
    }

    for workout in &snapshot.stronglifts_workouts {
        let exercises_json = serde_json::to_string(&workout.exercises)?;
        tx.execute(
            "INSERT INTO stronglifts_workouts (id, date, workout_type, exercises, completed, started_at, completed_at)
             VALUES (:id, :date, :type, :exercises, :completed, :started_at, :completed_at)",
            named_params! {
                ":id": workout.id,
                ":date": workout.date.format("%Y-%m-%d").to_string(),
                ":type": workout.workout_type.to_string(),
                ":exercises": exercises_json,
                ":completed": workout.completed,
                ":started_at": workout.started_at.to_rfc3339(),
                ":completed_at": workout.completed_at.map(|ts| ts.to_rfc3339()),
            },
        )
        .map_err(DbError::InsertFailed)?;
    }

    for activity in &snapshot.activities {
        tx.execute(
            "INSERT INTO activities (id, date, activity_type, category, duration_minutes, distance, heart_rate_zone, notes, completed_at)
             VALUES (:id, :date, :type, :category, :duration, :distance, :zone, :notes, :completed_at)",
            named_params! {
                ":id": activity.id,
                ":date": activity.date.format("%Y-%m-%d").to_string(),
                ":type": activity.activity_type.to_string(),
                ":category": activity.category.to_string(),
                ":duration": activity.duration,
                ":distance": activity.distance,
                ":zone": activity.heart_rate_zone.map(|z| z.to_string()),
                ":notes": activity.notes.as_deref(),
                ":completed_at": activity.completed_at.to_rfc3339(),
            },
        )
        .map_err(DbError::InsertFailed)?;
    }

    for (key, value) in &snapshot.settings {
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            params![key, serde_json::to_string(value)?],
        )
        .map_err(DbError::InsertFailed)?;
    }

    tx.commit().map_err(DbError::Connection)?;
    Ok(())
}

/// Empties every collection, settings included.
pub fn clear_all_data(conn: &mut Connection) -> Result<(), DbError> {
    let tx = conn.transaction().map_err(DbError::Connection)?;
    for table in [
        "insanity_workouts",
        "fit_tests",
        "stronglifts_workouts",
        "activities",
        "settings",
    ] {
        tx.execute(&format!("DELETE FROM {table}"), [])
            .map_err(DbError::DeleteFailed)?;
    }
    tx.commit().map_err(DbError::Connection)?;
    Ok(())
}

/// Clears the HIIT program: day records, fit tests, and its start anchor.
pub fn clear_insanity_data(conn: &mut Connection) -> Result<(), DbError> {
    let tx = conn.transaction().map_err(DbError::Connection)?;
    tx.execute("DELETE FROM insanity_workouts", [])
        .map_err(DbError::DeleteFailed)?;
    tx.execute("DELETE FROM fit_tests", [])
        .map_err(DbError::DeleteFailed)?;
    tx.execute(
        "DELETE FROM settings WHERE key IN (?1, ?2)",
        params![
            start_date_key(Program::Insanity),
            current_day_key(Program::Insanity)
        ],
    )
    .map_err(DbError::DeleteFailed)?;
    tx.commit().map_err(DbError::Connection)?;
    Ok(())
}

/// Clears the strength program: sessions and its start anchor.
pub fn clear_stronglifts_data(conn: &mut Connection) -> Result<(), DbError> {
    let tx = conn.transaction().map_err(DbError::Connection)?;
    tx.execute("DELETE FROM stronglifts_workouts", [])
        .map_err(DbError::DeleteFailed)?;
    tx.execute(
        "DELETE FROM settings WHERE key IN (?1, ?2)",
        params![
            start_date_key(Program::Stronglifts),
            current_day_key(Program::Stronglifts)
        ],
    )
    .map_err(DbError::DeleteFailed)?;
    tx.commit().map_err(DbError::Connection)?;
    Ok(())
}
