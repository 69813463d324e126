//src/session.rs
//! In-memory state machine for a live strength session. Nothing is persisted
//! until `finish` produces a record; cancelling discards everything.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::db::{ExerciseLog, SetLog, StrengthWorkout, WorkoutType};
use crate::schedule::{self, TARGET_REPS, WEIGHT_STEP};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is not in progress")]
    NotInProgress,
    #[error("No exercise at index {0}")]
    InvalidExercise(usize),
    #[error("No set at index {0}")]
    InvalidSet(usize),
    #[error("Reps must be between 0 and {max}, got {got}")]
    InvalidReps { got: u32, max: u32 },
    #[error("'{exercise}' set {set} has not been attempted")]
    IncompleteSet { exercise: String, set: usize },
}

/// Explicit per-set state. A set starts untouched, and a failed set keeps
/// the rep count that was actually achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetState {
    Untouched,
    Completed,
    Failed(u32),
}

impl SetState {
    pub const fn attempted(self) -> bool {
        !matches!(self, Self::Untouched)
    }
}

/// What a tap on a set did, so the caller can prompt for reps when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCycle {
    /// Untouched set marked complete at target.
    Marked,
    /// Completed set tapped again; caller should collect an actual rep count.
    NeedsReps,
    /// Failed set cleared back to untouched.
    Reset,
}

#[derive(Debug, Clone)]
pub struct SessionExercise {
    pub name: String,
    pub weight: f64,
    pub target_reps: u32,
    pub sets: Vec<SetState>,
}

impl SessionExercise {
    fn new(name: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            target_reps: TARGET_REPS,
            sets: vec![SetState::Untouched; schedule::set_count(name)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Completed,
    Cancelled,
}

/// A live session over one A/B workout's three exercises.
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    pub workout_type: WorkoutType,
    pub date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub exercises: Vec<SessionExercise>,
    pub state: SessionState,
}

impl WorkoutSession {
    /// Starts a session, loading each exercise at its resolved starting
    /// weight (falling back to program defaults for unknown lifts).
    pub fn start(
        workout_type: WorkoutType,
        starting_weights: &HashMap<String, f64>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let exercises = schedule::strength_exercises(workout_type)
            .iter()
            .map(|name| {
                let weight = starting_weights
                    .get(*name)
                    .copied()
                    .unwrap_or_else(|| schedule::default_weight(name));
                SessionExercise::new(name, weight)
            })
            .collect();
        Self {
            workout_type,
            date,
            started_at: now,
            exercises,
            state: SessionState::InProgress,
        }
    }

    fn check_in_progress(&self) -> Result<(), SessionError> {
        if self.state == SessionState::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress)
        }
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut SetState, SessionError> {
        let ex = self
            .exercises
            .get_mut(exercise)
            .ok_or(SessionError::InvalidExercise(exercise))?;
        ex.sets.get_mut(set).ok_or(SessionError::InvalidSet(set))
    }

    /// Taps a set through its three states: untouched -> completed at target,
    /// completed -> rep picker, failed -> untouched.
    pub fn cycle_set(&mut self, exercise: usize, set: usize) -> Result<SetCycle, SessionError> {
        self.check_in_progress()?;
        let slot = self.set_mut(exercise, set)?;
        match *slot {
            SetState::Untouched => {
                *slot = SetState::Completed;
                Ok(SetCycle::Marked)
            }
            SetState::Completed => Ok(SetCycle::NeedsReps),
            SetState::Failed(_) => {
                *slot = SetState::Untouched;
                Ok(SetCycle::Reset)
            }
        }
    }

    /// Records an exact rep count for a set. Hitting the target completes
    /// the set; anything less records a failure at that count.
    pub fn record_reps(
        &mut self,
        exercise: usize,
        set: usize,
        reps: u32,
    ) -> Result<(), SessionError> {
        self.check_in_progress()?;
        if reps > TARGET_REPS {
            return Err(SessionError::InvalidReps {
                got: reps,
                max: TARGET_REPS,
            });
        }
        let slot = self.set_mut(exercise, set)?;
        *slot = if reps >= TARGET_REPS {
            SetState::Completed
        } else {
            SetState::Failed(reps)
        };
        Ok(())
    }

    /// Adjusts an exercise's working weight in 5 lb steps, floored at zero.
    pub fn adjust_weight(&mut self, exercise: usize, increase: bool) -> Result<f64, SessionError> {
        self.check_in_progress()?;
        let ex = self
            .exercises
            .get_mut(exercise)
            .ok_or(SessionError::InvalidExercise(exercise))?;
        if increase {
            ex.weight += WEIGHT_STEP;
        } else {
            ex.weight = (ex.weight - WEIGHT_STEP).max(0.0);
        }
        Ok(ex.weight)
    }

    pub fn all_attempted(&self) -> bool {
        self.exercises
            .iter()
            .all(|ex| ex.sets.iter().all(|s| s.attempted()))
    }

    /// Finishes the session, producing the record to persist. Every set must
    /// have been attempted. Each exercise's progression flag is computed here
    /// but the weight increment itself is deferred to the next session's
    /// starting-weight resolution.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<StrengthWorkout, SessionError> {
        self.check_in_progress()?;
        for ex in &self.exercises {
            for (idx, set) in ex.sets.iter().enumerate() {
                if !set.attempted() {
                    return Err(SessionError::IncompleteSet {
                        exercise: ex.name.clone(),
                        set: idx + 1,
                    });
                }
            }
        }

        let exercises = self
            .exercises
            .iter()
            .map(|ex| {
                let sets: Vec<SetLog> = ex
                    .sets
                    .iter()
                    .map(|s| match *s {
                        SetState::Completed => SetLog {
                            target_reps: ex.target_reps,
                            completed_reps: Some(ex.target_reps),
                            completed: true,
                        },
                        SetState::Failed(reps) => SetLog {
                            target_reps: ex.target_reps,
                            completed_reps: Some(reps),
                            completed: false,
                        },
                        // Unreachable after the attempted check above.
                        SetState::Untouched => SetLog {
                            target_reps: ex.target_reps,
                            completed_reps: None,
                            completed: false,
                        },
                    })
                    .collect();
                let should_increase = ex.sets.iter().all(|s| matches!(s, SetState::Completed));
                ExerciseLog {
                    name: ex.name.clone(),
                    weight: ex.weight,
                    sets,
                    should_increase,
                }
            })
            .collect();

        self.state = SessionState::Completed;
        Ok(StrengthWorkout {
            id: 0,
            date: self.date,
            workout_type: self.workout_type,
            exercises,
            completed: true,
            started_at: self.started_at,
            completed_at: Some(now),
        })
    }

    /// Abandons the session; nothing is recorded.
    pub fn cancel(&mut self) {
        self.state = SessionState::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(workout_type: WorkoutType) -> WorkoutSession {
        WorkoutSession::start(
            workout_type,
            &HashMap::new(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Utc::now(),
        )
    }

    fn complete_all(session: &mut WorkoutSession) {
        for ex in 0..session.exercises.len() {
            for set in 0..session.exercises[ex].sets.len() {
                session.record_reps(ex, set, TARGET_REPS).unwrap();
            }
        }
    }

    #[test]
    fn starts_with_template_exercises_and_defaults() {
        let session = started(WorkoutType::B);
        let names: Vec<&str> = session.exercises.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Squat", "Overhead Press", "Deadlift"]);
        assert_eq!(session.exercises[2].weight, 95.0);
        assert_eq!(session.exercises[2].sets.len(), 1);
        assert_eq!(session.exercises[0].sets.len(), 5);
    }

    #[test]
    fn tapping_cycles_through_set_states() {
        let mut session = started(WorkoutType::A);
        assert_eq!(session.cycle_set(0, 0).unwrap(), SetCycle::Marked);
        assert_eq!(session.exercises[0].sets[0], SetState::Completed);
        assert_eq!(session.cycle_set(0, 0).unwrap(), SetCycle::NeedsReps);
        session.record_reps(0, 0, 3).unwrap();
        assert_eq!(session.exercises[0].sets[0], SetState::Failed(3));
        assert_eq!(session.cycle_set(0, 0).unwrap(), SetCycle::Reset);
        assert_eq!(session.exercises[0].sets[0], SetState::Untouched);
    }

    #[test]
    fn target_reps_through_the_picker_complete_the_set() {
        let mut session = started(WorkoutType::A);
        session.record_reps(0, 0, 5).unwrap();
        assert_eq!(session.exercises[0].sets[0], SetState::Completed);
        assert_eq!(
            session.record_reps(0, 0, 6),
            Err(SessionError::InvalidReps { got: 6, max: 5 })
        );
    }

    #[test]
    fn weight_adjustment_floors_at_zero() {
        let mut session = started(WorkoutType::A);
        assert_eq!(session.adjust_weight(0, true).unwrap(), 50.0);
        for _ in 0..20 {
            session.adjust_weight(0, false).unwrap();
        }
        assert_eq!(session.exercises[0].weight, 0.0);
    }

    #[test]
    fn finish_rejects_untouched_sets() {
        let mut session = started(WorkoutType::A);
        session.record_reps(0, 0, 5).unwrap();
        let err = session.finish(Utc::now()).unwrap_err();
        assert!(matches!(err, SessionError::IncompleteSet { .. }));
        assert_eq!(session.state, SessionState::InProgress);
    }

    #[test]
    fn failed_zero_rep_set_still_counts_as_attempted() {
        let mut session = started(WorkoutType::A);
        complete_all(&mut session);
        session.record_reps(0, 0, 0).unwrap();
        assert!(session.all_attempted());
        let record = session.finish(Utc::now()).unwrap();
        assert_eq!(record.exercises[0].sets[0].completed_reps, Some(0));
        assert!(!record.exercises[0].sets[0].completed);
    }

    #[test]
    fn full_success_earns_progression_flag() {
        let mut session = started(WorkoutType::A);
        complete_all(&mut session);
        let record = session.finish(Utc::now()).unwrap();
        assert!(record.exercises.iter().all(|e| e.should_increase));
        assert_eq!(session.state, SessionState::Completed);
        // Weight on the record is what was lifted, not the next target.
        assert_eq!(record.exercises[0].weight, 45.0);
    }

    #[test]
    fn one_failed_set_blocks_progression_for_that_lift_only() {
        let mut session = started(WorkoutType::A);
        complete_all(&mut session);
        session.record_reps(1, 2, 4).unwrap();
        let record = session.finish(Utc::now()).unwrap();
        assert!(record.exercises[0].should_increase);
        assert!(!record.exercises[1].should_increase);
        assert!(record.exercises[2].should_increase);
    }

    #[test]
    fn finished_or_cancelled_sessions_reject_mutation() {
        let mut session = started(WorkoutType::A);
        complete_all(&mut session);
        session.finish(Utc::now()).unwrap();
        assert_eq!(session.cycle_set(0, 0), Err(SessionError::NotInProgress));

        let mut cancelled = started(WorkoutType::A);
        cancelled.cancel();
        assert_eq!(cancelled.state, SessionState::Cancelled);
        assert_eq!(
            cancelled.record_reps(0, 0, 5),
            Err(SessionError::NotInProgress)
        );
    }
}
