//src/progress.rs
//! Pure progress calculators. Everything here takes plain data and a caller
//! supplied "today" so results are reproducible.

use chrono::{Days, NaiveDate};
use std::collections::HashMap;

use crate::db::{StrengthWorkout, WorkoutType};
use crate::schedule::{self, FIT_TEST_DAYS, TOTAL_DAYS, WEIGHT_STEP};

/// Completion counter over the whole HIIT calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (self.completed * 100) / self.total
        }
    }
}

pub fn program_progress(completed: u32) -> Progress {
    Progress {
        completed,
        total: TOTAL_DAYS,
    }
}

/// Calendar date a program day falls on. Day 1 is the start date itself.
pub fn program_day_date(start: NaiveDate, day: u32) -> Option<NaiveDate> {
    if day == 0 || day > TOTAL_DAYS {
        return None;
    }
    start.checked_add_days(Days::new(u64::from(day) - 1))
}

/// Temporal status of one calendar day relative to today. Without a start
/// date no day has a position in time and every flag is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayStatus {
    pub is_past: bool,
    pub is_today: bool,
    pub is_missed: bool,
    pub is_fit_test_due: bool,
}

pub fn day_status(
    day: u32,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
    completed: bool,
    rest_day: bool,
    fit_test: bool,
) -> DayStatus {
    let Some(start) = start_date else {
        return DayStatus::default();
    };
    let Some(date) = program_day_date(start, day) else {
        return DayStatus::default();
    };
    let is_past = date < today;
    let is_today = date == today;
    DayStatus {
        is_past,
        is_today,
        is_missed: is_past && !completed && !rest_day,
        is_fit_test_due: fit_test && !completed && date <= today,
    }
}

/// Program day of the next unrecorded checkpoint, given the recorded test
/// numbers (1-5). None once all five are in.
pub fn next_fit_test_day(recorded_tests: &[u32]) -> Option<u32> {
    FIT_TEST_DAYS
        .iter()
        .enumerate()
        .find(|(idx, _)| !recorded_tests.contains(&(*idx as u32 + 1)))
        .map(|(_, &day)| day)
}

/// Strict A/B alternation: the session after an even number of completed
/// workouts is an A.
pub fn next_workout_type(completed_count: usize) -> WorkoutType {
    if completed_count % 2 == 0 {
        WorkoutType::A
    } else {
        WorkoutType::B
    }
}

/// Consecutive training weeks, computed from completed session dates.
///
/// Walking back from the most recent session, dates chain while consecutive
/// gaps stay within seven days; a longer gap (or a most recent session more
/// than seven days old) ends the chain. The chained session count maps to
/// weeks at three sessions per week, rounded up.
pub fn week_streak(history: &[StrengthWorkout], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = history
        .iter()
        .filter(|w| w.completed)
        .map(|w| w.date)
        .collect();
    if dates.is_empty() {
        return 0;
    }
    dates.sort_unstable_by(|a, b| b.cmp(a));

    if (today - dates[0]).num_days() > 7 {
        return 0;
    }

    let mut count: u32 = 1;
    for pair in dates.windows(2) {
        if (pair[0] - pair[1]).num_days() <= 7 {
            count += 1;
        } else {
            break;
        }
    }
    count.div_ceil(3)
}

fn latest_entries(history: &[StrengthWorkout]) -> HashMap<String, (f64, bool)> {
    let mut ordered: Vec<&StrengthWorkout> = history.iter().filter(|w| w.completed).collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let mut latest: HashMap<String, (f64, bool)> = HashMap::new();
    for workout in ordered {
        for exercise in &workout.exercises {
            latest
                .entry(exercise.name.clone())
                .or_insert((exercise.weight, exercise.should_increase));
        }
    }
    latest
}

/// Last weight actually lifted per exercise. Exercises with no history fall
/// back to the empty-bar defaults.
pub fn current_weights(history: &[StrengthWorkout]) -> HashMap<String, f64> {
    let latest = latest_entries(history);
    schedule::DEFAULT_WEIGHTS
        .iter()
        .map(|&(name, default)| {
            let weight = latest.get(name).map_or(default, |&(w, _)| w);
            (name.to_string(), weight)
        })
        .collect()
}

/// Weight to load for the NEXT session per exercise. The progression
/// increment earned by a fully successful session is applied here, not when
/// the session is saved, so an unapplied increment survives export/import.
pub fn starting_weights(history: &[StrengthWorkout]) -> HashMap<String, f64> {
    let latest = latest_entries(history);
    schedule::DEFAULT_WEIGHTS
        .iter()
        .map(|&(name, default)| {
            let weight = latest.get(name).map_or(default, |&(w, increase)| {
                if increase {
                    w + WEIGHT_STEP
                } else {
                    w
                }
            });
            (name.to_string(), weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ExerciseLog, SetLog};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(id: i64, on: NaiveDate, exercises: Vec<ExerciseLog>) -> StrengthWorkout {
        StrengthWorkout {
            id,
            date: on,
            workout_type: WorkoutType::A,
            exercises,
            completed: true,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
        }
    }

    fn lift(name: &str, weight: f64, should_increase: bool) -> ExerciseLog {
        ExerciseLog {
            name: name.to_string(),
            weight,
            sets: vec![SetLog {
                target_reps: 5,
                completed_reps: Some(5),
                completed: true,
            }],
            should_increase,
        }
    }

    #[test]
    fn progress_totals_sixty_three_days() {
        let p = program_progress(21);
        assert_eq!(p.total, 63);
        assert_eq!(p.percent(), 33);
    }

    #[test]
    fn day_dates_start_at_day_one() {
        let start = date(2024, 1, 1);
        assert_eq!(program_day_date(start, 1), Some(start));
        assert_eq!(program_day_date(start, 15), Some(date(2024, 1, 15)));
        assert_eq!(program_day_date(start, 64), None);
    }

    #[test]
    fn status_without_start_date_is_inert() {
        let status = day_status(5, None, date(2024, 6, 1), false, false, false);
        assert_eq!(status, DayStatus::default());
    }

    #[test]
    fn past_incomplete_workout_day_is_missed() {
        let status = day_status(
            15,
            Some(date(2024, 1, 1)),
            date(2024, 1, 20),
            false,
            false,
            true,
        );
        assert!(status.is_past);
        assert!(status.is_missed);
        assert!(status.is_fit_test_due);
    }

    #[test]
    fn rest_days_and_completed_days_are_never_missed() {
        let start = Some(date(2024, 1, 1));
        let today = date(2024, 2, 1);
        assert!(!day_status(7, start, today, false, true, false).is_missed);
        assert!(!day_status(5, start, today, true, false, false).is_missed);
    }

    #[test]
    fn fit_test_due_today_but_not_future() {
        let start = Some(date(2024, 1, 1));
        assert!(day_status(1, start, date(2024, 1, 1), false, false, true).is_fit_test_due);
        assert!(!day_status(15, start, date(2024, 1, 10), false, false, true).is_fit_test_due);
    }

    #[test]
    fn next_fit_test_walks_the_checkpoints() {
        assert_eq!(next_fit_test_day(&[]), Some(1));
        assert_eq!(next_fit_test_day(&[1, 2]), Some(36));
        assert_eq!(next_fit_test_day(&[1, 2, 3, 4, 5]), None);
        // Out-of-order recording still fills the earliest gap.
        assert_eq!(next_fit_test_day(&[2]), Some(1));
    }

    #[test]
    fn workout_types_alternate_by_parity() {
        assert_eq!(next_workout_type(0), WorkoutType::A);
        assert_eq!(next_workout_type(1), WorkoutType::B);
        assert_eq!(next_workout_type(2), WorkoutType::A);
    }

    #[test]
    fn streak_is_zero_without_recent_sessions() {
        assert_eq!(week_streak(&[], date(2024, 3, 1)), 0);
        let history = vec![session(1, date(2024, 2, 1), vec![lift("Squat", 100.0, false)])];
        assert_eq!(week_streak(&history, date(2024, 2, 20)), 0);
    }

    #[test]
    fn streak_chains_sessions_within_a_week() {
        let history = vec![
            session(1, date(2024, 1, 1), vec![]),
            session(2, date(2024, 1, 3), vec![]),
            session(3, date(2024, 1, 5), vec![]),
            session(4, date(2024, 1, 8), vec![]),
            session(5, date(2024, 1, 10), vec![]),
            session(6, date(2024, 1, 12), vec![]),
        ];
        assert_eq!(week_streak(&history, date(2024, 1, 14)), 2);
    }

    #[test]
    fn streak_breaks_on_long_gap() {
        let history = vec![
            session(1, date(2024, 1, 1), vec![]),
            session(2, date(2024, 1, 20), vec![]),
            session(3, date(2024, 1, 22), vec![]),
        ];
        // Only the two recent sessions chain; ceil(2/3) = 1.
        assert_eq!(week_streak(&history, date(2024, 1, 25)), 1);
    }

    #[test]
    fn current_weights_report_last_lifted() {
        let history = vec![
            session(1, date(2024, 1, 1), vec![lift("Squat", 100.0, true)]),
            session(2, date(2024, 1, 3), vec![lift("Squat", 105.0, false)]),
        ];
        let weights = current_weights(&history);
        assert_eq!(weights["Squat"], 105.0);
        // Untrained lifts fall back to defaults.
        assert_eq!(weights["Deadlift"], 95.0);
    }

    #[test]
    fn starting_weights_apply_earned_increment() {
        let history = vec![session(
            1,
            date(2024, 1, 1),
            vec![lift("Squat", 100.0, true), lift("Bench Press", 80.0, false)],
        )];
        let weights = starting_weights(&history);
        assert_eq!(weights["Squat"], 105.0);
        assert_eq!(weights["Bench Press"], 80.0);
    }
}
