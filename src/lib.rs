use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

// --- Declare modules ---
mod config;
pub mod db;
pub mod progress;
pub mod schedule;
pub mod session;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util,
    load_config as load_config_util,
    parse_color,
    save_config as save_config_util,
    Config,
    ConfigError,
    StandardColor,
    ThemeConfig,
};

pub use db::{
    get_db_path as get_db_path_util,
    Activity,
    ActivityCategory,
    ActivityType,
    DayWorkout,
    DbError,
    ExerciseLog,
    ExportSnapshot,
    FitTestEntry,
    FitTestResult,
    HeartRateZone,
    NewActivity,
    Program,
    ProgramState,
    SetLog,
    StrengthWorkout,
    WorkoutType,
};

pub use progress::{DayStatus, Progress};
pub use session::{SessionError, SessionState, SetCycle, SetState, WorkoutSession};

/// Display unit for strength weights. Stored as a database setting rather
/// than config so it rides along in exports. Weights are always recorded in
/// pounds; kilograms are a display conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Lbs,
    Kg,
}

pub const LBS_TO_KG: f64 = 0.453_592;

const WEIGHT_UNIT_KEY: &str = "weightUnit";

/// One rendered day of the HIIT calendar: the plan, the stored record (if
/// any), and its temporal status.
#[derive(Debug, Clone)]
pub struct CalendarDay {
    pub day: u32,
    pub name: &'static str,
    pub short_name: &'static str,
    pub rest: bool,
    pub fit_test: bool,
    pub date: Option<NaiveDate>,
    pub completed: bool,
    pub status: DayStatus,
}

/// Everything that happened (or was planned) on one calendar date.
#[derive(Debug, Clone)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub hiit: Option<CalendarDay>,
    pub strength: Option<StrengthWorkout>,
    pub activities: Vec<Activity>,
}

pub struct AppService {
    pub config: Config,
    pub conn: Connection,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        db::init_db(&conn).context("Failed to initialize database schema")?;

        Ok(Self {
            config,
            conn,
            db_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// Sets the table header color, validating the name against the known set.
    pub fn set_header_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let parsed = config::parse_color(color)?;
        self.config.theme.header_color = format!("{parsed:?}");
        self.save_config()
    }

    // ============ HIIT Program ============

    /// Starts (or restarts) the HIIT program on the given date. Restarting
    /// only moves the anchor; recorded days are kept.
    pub fn start_insanity(&self, start_date: NaiveDate) -> Result<ProgramState> {
        let state = ProgramState {
            program: Program::Insanity,
            start_date,
            current_day: 1,
        };
        db::put_program_state(&self.conn, &state).context("Failed to save program start")?;
        Ok(state)
    }

    pub fn insanity_state(&self) -> Result<Option<ProgramState>> {
        db::get_program_state(&self.conn, Program::Insanity)
            .context("Failed to read program state")
    }

    /// Program day a calendar date falls on, when the program has started
    /// and the date is within its nine weeks.
    pub fn insanity_day_on(&self, date: NaiveDate) -> Result<Option<u32>> {
        let Some(state) = self.insanity_state()? else {
            return Ok(None);
        };
        let offset = (date - state.start_date).num_days();
        if !(0..i64::from(schedule::TOTAL_DAYS)).contains(&offset) {
            return Ok(None);
        }
        Ok(Some(offset as u32 + 1))
    }

    fn calendar_day(
        &self,
        planned: &'static schedule::ScheduledDay,
        record: Option<&DayWorkout>,
        start_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> CalendarDay {
        let completed = record.is_some_and(|r| r.completed);
        CalendarDay {
            day: planned.day,
            name: planned.name,
            short_name: planned.short_name(),
            rest: planned.rest,
            fit_test: planned.fit_test,
            date: start_date.and_then(|s| progress::program_day_date(s, planned.day)),
            completed,
            status: progress::day_status(
                planned.day,
                start_date,
                today,
                completed,
                planned.rest,
                planned.fit_test,
            ),
        }
    }

    /// The full 63-day calendar joined with stored completion records.
    pub fn hiit_calendar(&self, today: NaiveDate) -> Result<Vec<CalendarDay>> {
        let start_date = self.insanity_state()?.map(|s| s.start_date);
        let records: HashMap<u32, DayWorkout> = db::list_day_workouts(&self.conn)
            .context("Failed to load day records")?
            .into_iter()
            .map(|w| (w.day, w))
            .collect();
        Ok(schedule::SCHEDULE
            .iter()
            .map(|planned| self.calendar_day(planned, records.get(&planned.day), start_date, today))
            .collect())
    }

    /// Flips a day's completion. Rest days have nothing to complete.
    pub fn toggle_day(&self, day: u32, now: DateTime<Utc>) -> Result<DayWorkout> {
        let Some(planned) = schedule::scheduled_day(day) else {
            bail!(
                "Day {day} is outside the program (1-{})",
                schedule::TOTAL_DAYS
            );
        };
        if planned.rest {
            bail!("Day {day} is a rest day");
        }
        let existing =
            db::get_day_workout(&self.conn, day).context("Failed to read day record")?;
        let workout = match existing {
            Some(mut record) => {
                record.completed = !record.completed;
                record.completed_at = record.completed.then_some(now);
                record
            }
            None => DayWorkout {
                day,
                workout_name: planned.name.to_string(),
                completed: true,
                completed_at: Some(now),
            },
        };
        db::put_day_workout(&self.conn, &workout).context("Failed to save day record")?;

        if workout.completed {
            if let Some(mut state) = self.insanity_state()? {
                if day > state.current_day {
                    state.current_day = day;
                    db::put_program_state(&self.conn, &state)
                        .context("Failed to advance program day")?;
                }
            }
        }
        Ok(workout)
    }

    pub fn insanity_progress(&self) -> Result<Progress> {
        let completed =
            db::completed_day_count(&self.conn).context("Failed to count completed days")?;
        Ok(progress::program_progress(completed))
    }

    // ============ Fit Tests ============

    /// Records a checkpoint at one of the fixed fit test days, overwriting
    /// any earlier result for that checkpoint and marking the day complete.
    pub fn record_fit_test(
        &self,
        day: u32,
        reps: &[u32],
        now: DateTime<Utc>,
    ) -> Result<FitTestResult> {
        let Some(planned) = schedule::scheduled_day(day) else {
            bail!(
                "Day {day} is outside the program (1-{})",
                schedule::TOTAL_DAYS
            );
        };
        let Some(test_number) = planned.fit_test_number() else {
            bail!(
                "Day {day} is not a fit test day (those are {:?})",
                schedule::FIT_TEST_DAYS
            );
        };
        if reps.len() != schedule::FIT_TEST_EXERCISES.len() {
            bail!(
                "Expected {} rep counts, got {}",
                schedule::FIT_TEST_EXERCISES.len(),
                reps.len()
            );
        }

        let result = FitTestResult {
            test_number,
            day,
            exercises: schedule::FIT_TEST_EXERCISES
                .iter()
                .zip(reps)
                .map(|(name, &r)| FitTestEntry {
                    name: (*name).to_string(),
                    reps: r,
                })
                .collect(),
            completed_at: now,
        };
        db::put_fit_test(&self.conn, &result).context("Failed to save fit test")?;

        db::put_day_workout(
            &self.conn,
            &DayWorkout {
                day,
                workout_name: planned.name.to_string(),
                completed: true,
                completed_at: Some(now),
            },
        )
        .context("Failed to mark fit test day complete")?;
        Ok(result)
    }

    pub fn list_fit_tests(&self) -> Result<Vec<FitTestResult>> {
        db::list_fit_tests(&self.conn).context("Failed to load fit tests")
    }

    /// Program day of the next unrecorded checkpoint; None once all five
    /// are recorded.
    pub fn next_fit_test_day(&self) -> Result<Option<u32>> {
        let recorded: Vec<u32> = self
            .list_fit_tests()?
            .iter()
            .map(|t| t.test_number)
            .collect();
        Ok(progress::next_fit_test_day(&recorded))
    }

    // ============ Strength Program ============

    pub fn list_strength_workouts(&self) -> Result<Vec<StrengthWorkout>> {
        db::list_strength_workouts(&self.conn).context("Failed to load strength workouts")
    }

    pub fn strength_workout_on(&self, date: NaiveDate) -> Result<Option<StrengthWorkout>> {
        db::strength_workout_on(&self.conn, date).context("Failed to load strength workout")
    }

    /// Which A/B workout is up next, alternating on completed session count.
    pub fn next_workout_type(&self) -> Result<WorkoutType> {
        let history = self.list_strength_workouts()?;
        let completed = history.iter().filter(|w| w.completed).count();
        Ok(progress::next_workout_type(completed))
    }

    /// Last lifted weight per exercise, for display.
    pub fn current_weights(&self) -> Result<HashMap<String, f64>> {
        Ok(progress::current_weights(&self.list_strength_workouts()?))
    }

    /// Weights to load next session, with earned progression applied.
    pub fn starting_weights(&self) -> Result<HashMap<String, f64>> {
        Ok(progress::starting_weights(&self.list_strength_workouts()?))
    }

    /// Opens a live session for the next workout in the rotation at the
    /// resolved starting weights.
    pub fn begin_session(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<WorkoutSession> {
        let workout_type = self.next_workout_type()?;
        let weights = self.starting_weights()?;
        Ok(WorkoutSession::start(workout_type, &weights, date, now))
    }

    /// Persists a finished session's record.
    pub fn save_session(&self, record: &StrengthWorkout) -> Result<i64> {
        db::insert_strength_workout(&self.conn, record)
            .context("Failed to save strength workout")
    }

    pub fn week_streak(&self, today: NaiveDate) -> Result<u32> {
        Ok(progress::week_streak(
            &self.list_strength_workouts()?,
            today,
        ))
    }

    // ============ Activities ============

    /// Logs an activity. The category follows from the kind, and the
    /// completion timestamp defaults to now.
    pub fn log_activity(&self, new: NewActivity, now: DateTime<Utc>) -> Result<Activity> {
        let Some(activity_type) = new.activity_type else {
            bail!("Activity type is required");
        };
        let mut activity = Activity {
            id: 0,
            date: new.date,
            activity_type,
            category: activity_type.category(),
            duration: new.duration,
            distance: new.distance,
            heart_rate_zone: new.heart_rate_zone,
            notes: new.notes,
            completed_at: new.completed_at.unwrap_or(now),
        };
        activity.id =
            db::insert_activity(&self.conn, &activity).context("Failed to save activity")?;
        Ok(activity)
    }

    pub fn update_activity(&self, activity: &Activity) -> Result<()> {
        db::update_activity(&self.conn, activity).context("Failed to update activity")?;
        Ok(())
    }

    pub fn delete_activity(&self, id: i64) -> Result<()> {
        db::delete_activity(&self.conn, id)
            .with_context(|| format!("Failed to delete activity {id}"))?;
        Ok(())
    }

    pub fn get_activity(&self, id: i64) -> Result<Option<Activity>> {
        db::get_activity(&self.conn, id).context("Failed to load activity")
    }

    pub fn list_activities(&self) -> Result<Vec<Activity>> {
        db::list_activities(&self.conn).context("Failed to load activities")
    }

    pub fn activities_on(&self, date: NaiveDate) -> Result<Vec<Activity>> {
        db::activities_on(&self.conn, date).context("Failed to load activities")
    }

    // ============ Day Overview ============

    /// Everything recorded or planned for one calendar date.
    pub fn day_summary(&self, date: NaiveDate, today: NaiveDate) -> Result<DaySummary> {
        let hiit = match self.insanity_day_on(date)? {
            Some(day) => {
                let planned = schedule::scheduled_day(day)
                    .context("Program day out of schedule bounds")?;
                let record =
                    db::get_day_workout(&self.conn, day).context("Failed to read day record")?;
                let start_date = self.insanity_state()?.map(|s| s.start_date);
                Some(self.calendar_day(planned, record.as_ref(), start_date, today))
            }
            None => None,
        };
        Ok(DaySummary {
            date,
            hiit,
            strength: self.strength_workout_on(date)?,
            activities: self.activities_on(date)?,
        })
    }

    // ============ Settings ============

    pub fn weight_unit(&self) -> Result<WeightUnit> {
        let value = db::get_setting(&self.conn, WEIGHT_UNIT_KEY)
            .context("Failed to read weight unit setting")?;
        match value {
            Some(v) => serde_json::from_value(v).context("Stored weight unit is invalid"),
            None => Ok(WeightUnit::default()),
        }
    }

    pub fn set_weight_unit(&self, unit: WeightUnit) -> Result<()> {
        let value = serde_json::to_value(unit).context("Failed to encode weight unit")?;
        db::put_setting(&self.conn, WEIGHT_UNIT_KEY, &value)
            .context("Failed to save weight unit setting")
    }

    // ============ Data Management ============

    /// Serializes every collection to the portable JSON snapshot.
    pub fn export_data(&self, now: DateTime<Utc>) -> Result<String> {
        let snapshot = db::export_snapshot(&self.conn, now).context("Failed to export data")?;
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize export")
    }

    /// Restores a snapshot produced by `export_data`, replacing current data.
    pub fn import_data(&mut self, json: &str) -> Result<ExportSnapshot> {
        let snapshot: ExportSnapshot =
            serde_json::from_str(json).context("Import file is not a valid export")?;
        db::import_snapshot(&mut self.conn, &snapshot).context("Failed to import data")?;
        Ok(snapshot)
    }

    pub fn clear_all_data(&mut self) -> Result<()> {
        db::clear_all_data(&mut self.conn).context("Failed to clear data")
    }

    pub fn clear_insanity_data(&mut self) -> Result<()> {
        db::clear_insanity_data(&mut self.conn).context("Failed to clear HIIT data")
    }

    pub fn clear_stronglifts_data(&mut self) -> Result<()> {
        db::clear_stronglifts_data(&mut self.conn).context("Failed to clear strength data")
    }
}
