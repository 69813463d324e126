use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fittrack_lib::{
    schedule, AppService, Config, NewActivity, SessionError, WeightUnit, WorkoutType,
};

// Helper function to create a test service with in-memory database
fn create_test_service() -> Result<AppService> {
    let conn = rusqlite::Connection::open_in_memory()?;
    fittrack_lib::db::init_db(&conn)?;

    Ok(AppService {
        config: Config::default(),
        conn,
        db_path: ":memory:".into(),
        config_path: "test_config.toml".into(),
    })
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

// Completes every set of every exercise at target reps.
fn complete_session(session: &mut fittrack_lib::WorkoutSession) {
    for ex in 0..session.exercises.len() {
        for set in 0..session.exercises[ex].sets.len() {
            session.record_reps(ex, set, schedule::TARGET_REPS).unwrap();
        }
    }
}

#[test]
fn test_start_program_and_calendar() -> Result<()> {
    let service = create_test_service()?;

    // Before starting, no day has a temporal status.
    let calendar = service.hiit_calendar(date(2024, 1, 20))?;
    assert_eq!(calendar.len(), 63);
    assert!(calendar.iter().all(|d| !d.status.is_past && !d.status.is_missed));
    assert!(calendar.iter().all(|d| d.date.is_none()));

    service.start_insanity(date(2024, 1, 1))?;
    let calendar = service.hiit_calendar(date(2024, 1, 20))?;
    assert_eq!(calendar[0].date, Some(date(2024, 1, 1)));
    assert_eq!(calendar[62].date, Some(date(2024, 3, 3)));
    assert!(calendar[4].status.is_past);
    assert!(calendar[19].status.is_today);
    Ok(())
}

#[test]
fn test_toggle_day_round_trip() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;

    let record = service.toggle_day(2, ts(2024, 1, 2))?;
    assert!(record.completed);
    assert_eq!(record.workout_name, "Plyometric Cardio Circuit");
    assert_eq!(service.insanity_progress()?.completed, 1);

    let record = service.toggle_day(2, ts(2024, 1, 3))?;
    assert!(!record.completed);
    assert!(record.completed_at.is_none());
    assert_eq!(service.insanity_progress()?.completed, 0);
    Ok(())
}

#[test]
fn test_toggle_rejects_rest_and_out_of_range_days() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;

    assert!(service.toggle_day(7, ts(2024, 1, 7)).is_err());
    assert!(service.toggle_day(0, ts(2024, 1, 7)).is_err());
    assert!(service.toggle_day(64, ts(2024, 1, 7)).is_err());
    Ok(())
}

#[test]
fn test_missed_fit_test_day_is_flagged() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;

    // Day 15 is the second fit test; on Jan 20 it is five days overdue.
    let calendar = service.hiit_calendar(date(2024, 1, 20))?;
    let day15 = &calendar[14];
    assert!(day15.fit_test);
    assert!(day15.status.is_missed);
    assert!(day15.status.is_fit_test_due);

    // Rest day 7 is past but never missed.
    assert!(!calendar[6].status.is_missed);
    Ok(())
}

#[test]
fn test_record_fit_test_marks_day_complete() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;

    let reps = [50, 40, 60, 30, 10, 12, 20, 30];
    let result = service.record_fit_test(1, &reps, ts(2024, 1, 1))?;
    assert_eq!(result.test_number, 1);
    assert_eq!(result.total_reps(), 252);
    assert_eq!(result.exercises[0].name, "Switch Kicks");

    // Recording the test also completes the calendar day.
    assert_eq!(service.insanity_progress()?.completed, 1);
    assert_eq!(service.next_fit_test_day()?, Some(15));
    Ok(())
}

#[test]
fn test_fit_test_validation() -> Result<()> {
    let service = create_test_service()?;
    let reps = [50, 40, 60, 30, 10, 12, 20, 30];

    // Day 2 is not a checkpoint.
    assert!(service.record_fit_test(2, &reps, ts(2024, 1, 2)).is_err());
    // Eight rep counts are required.
    assert!(service.record_fit_test(1, &reps[..5], ts(2024, 1, 1)).is_err());
    Ok(())
}

#[test]
fn test_next_fit_test_exhausts_after_five() -> Result<()> {
    let service = create_test_service()?;
    let reps = [10, 10, 10, 10, 10, 10, 10, 10];
    for day in schedule::FIT_TEST_DAYS {
        assert_eq!(service.next_fit_test_day()?, Some(day));
        service.record_fit_test(day, &reps, ts(2024, 1, 1))?;
    }
    assert_eq!(service.next_fit_test_day()?, None);
    Ok(())
}

#[test]
fn test_workout_types_alternate() -> Result<()> {
    let service = create_test_service()?;
    assert_eq!(service.next_workout_type()?, WorkoutType::A);

    let mut session = service.begin_session(date(2024, 1, 1), ts(2024, 1, 1))?;
    complete_session(&mut session);
    service.save_session(&session.finish(ts(2024, 1, 1))?)?;
    assert_eq!(service.next_workout_type()?, WorkoutType::B);

    let mut session = service.begin_session(date(2024, 1, 3), ts(2024, 1, 3))?;
    assert_eq!(session.workout_type, WorkoutType::B);
    complete_session(&mut session);
    service.save_session(&session.finish(ts(2024, 1, 3))?)?;
    assert_eq!(service.next_workout_type()?, WorkoutType::A);
    Ok(())
}

#[test]
fn test_progression_applies_on_next_session() -> Result<()> {
    let service = create_test_service()?;

    // First A session at the empty-bar defaults, fully successful.
    let mut session = service.begin_session(date(2024, 1, 1), ts(2024, 1, 1))?;
    assert_eq!(session.exercises[0].weight, 45.0); // Squat default
    complete_session(&mut session);
    let record = session.finish(ts(2024, 1, 1))?;
    // The record keeps the lifted weight; the increment is deferred.
    assert_eq!(record.exercises[0].weight, 45.0);
    assert!(record.exercises[0].should_increase);
    service.save_session(&record)?;

    // The next session that includes Squat loads it five pounds heavier.
    let weights = service.starting_weights()?;
    assert_eq!(weights["Squat"], 50.0);
    // Current weights still report what was actually lifted.
    assert_eq!(service.current_weights()?["Squat"], 45.0);
    Ok(())
}

#[test]
fn test_failed_set_blocks_progression() -> Result<()> {
    let service = create_test_service()?;

    let mut session = service.begin_session(date(2024, 1, 1), ts(2024, 1, 1))?;
    complete_session(&mut session);
    session.record_reps(0, 2, 3)?; // Squat set 3 fails at 3 reps
    let record = session.finish(ts(2024, 1, 1))?;
    assert!(!record.exercises[0].should_increase);
    assert!(record.exercises[1].should_increase);
    service.save_session(&record)?;

    let weights = service.starting_weights()?;
    assert_eq!(weights["Squat"], 45.0); // repeat
    assert_eq!(weights["Bench Press"], 50.0); // progressed
    Ok(())
}

#[test]
fn test_finish_requires_every_set_attempted() -> Result<()> {
    let service = create_test_service()?;
    let mut session = service.begin_session(date(2024, 1, 1), ts(2024, 1, 1))?;
    session.record_reps(0, 0, 5)?;
    let err = session.finish(ts(2024, 1, 1)).unwrap_err();
    assert!(matches!(err, SessionError::IncompleteSet { .. }));

    // A zero-rep failure satisfies the precondition.
    complete_session(&mut session);
    session.record_reps(2, 0, 0)?;
    assert!(session.finish(ts(2024, 1, 1)).is_ok());
    Ok(())
}

#[test]
fn test_week_streak_from_history() -> Result<()> {
    let service = create_test_service()?;
    assert_eq!(service.week_streak(date(2024, 1, 1))?, 0);

    for (i, day) in [1, 3, 5, 8, 10, 12].iter().enumerate() {
        let mut session = service.begin_session(date(2024, 1, *day), ts(2024, 1, *day))?;
        complete_session(&mut session);
        // Alternate failures so weights stay put; streak only needs dates.
        if i % 2 == 0 {
            session.record_reps(0, 0, 2)?;
        }
        service.save_session(&session.finish(ts(2024, 1, *day))?)?;
    }
    assert_eq!(service.week_streak(date(2024, 1, 14))?, 2);
    // A long silence resets the streak to zero.
    assert_eq!(service.week_streak(date(2024, 2, 1))?, 0);
    Ok(())
}

#[test]
fn test_log_list_and_delete_activities() -> Result<()> {
    let service = create_test_service()?;

    let walk = service.log_activity(
        NewActivity {
            date: date(2024, 2, 1),
            activity_type: Some(fittrack_lib::ActivityType::Walk),
            duration: Some(45),
            distance: Some(2.5),
            ..Default::default()
        },
        ts(2024, 2, 1),
    )?;
    assert_eq!(walk.category, fittrack_lib::ActivityCategory::Cardio);
    assert_eq!(walk.completed_at, ts(2024, 2, 1));

    let sauna = service.log_activity(
        NewActivity {
            date: date(2024, 2, 2),
            activity_type: Some(fittrack_lib::ActivityType::Sauna),
            duration: Some(20),
            ..Default::default()
        },
        ts(2024, 2, 2),
    )?;
    assert_eq!(sauna.category, fittrack_lib::ActivityCategory::Recovery);

    assert_eq!(service.list_activities()?.len(), 2);
    assert_eq!(service.activities_on(date(2024, 2, 1))?.len(), 1);

    service.delete_activity(walk.id)?;
    assert_eq!(service.list_activities()?.len(), 1);
    assert!(service.delete_activity(walk.id).is_err());
    Ok(())
}

#[test]
fn test_activity_fields_default_empty() -> Result<()> {
    let service = create_test_service()?;

    // A defaulted draft carries no kind, so logging it is rejected.
    let empty = NewActivity::default();
    assert!(empty.activity_type.is_none());
    assert!(service.log_activity(empty, ts(2024, 2, 1)).is_err());

    // Setting only the kind is enough; everything optional stays unset
    // and the completion timestamp falls back to the write time.
    let logged = service.log_activity(
        NewActivity {
            date: date(2024, 2, 1),
            activity_type: Some(fittrack_lib::ActivityType::Sauna),
            ..Default::default()
        },
        ts(2024, 2, 1),
    )?;
    assert_eq!(logged.duration, None);
    assert_eq!(logged.distance, None);
    assert_eq!(logged.heart_rate_zone, None);
    assert_eq!(logged.notes, None);
    assert_eq!(logged.completed_at, ts(2024, 2, 1));
    Ok(())
}

#[test]
fn test_edit_activity() -> Result<()> {
    let service = create_test_service()?;
    let logged = service.log_activity(
        NewActivity {
            date: date(2024, 2, 1),
            activity_type: Some(fittrack_lib::ActivityType::Zone2),
            duration: Some(30),
            heart_rate_zone: Some(fittrack_lib::HeartRateZone::Zone2),
            ..Default::default()
        },
        ts(2024, 2, 1),
    )?;

    let mut edited = logged.clone();
    edited.duration = Some(45);
    edited.notes = Some("felt strong".to_string());
    service.update_activity(&edited)?;

    let fetched = service.get_activity(logged.id)?.unwrap();
    assert_eq!(fetched.duration, Some(45));
    assert_eq!(fetched.notes.as_deref(), Some("felt strong"));
    assert_eq!(fetched.heart_rate_zone, Some(fittrack_lib::HeartRateZone::Zone2));

    // Updating a deleted activity reports not-found.
    service.delete_activity(logged.id)?;
    assert!(service.update_activity(&edited).is_err());
    Ok(())
}

#[test]
fn test_weight_unit_setting_defaults_and_persists() -> Result<()> {
    let service = create_test_service()?;
    assert_eq!(service.weight_unit()?, WeightUnit::Lbs);
    service.set_weight_unit(WeightUnit::Kg)?;
    assert_eq!(service.weight_unit()?, WeightUnit::Kg);
    Ok(())
}

#[test]
fn test_day_summary_collects_everything() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;
    service.toggle_day(3, ts(2024, 1, 3))?;

    let mut session = service.begin_session(date(2024, 1, 3), ts(2024, 1, 3))?;
    complete_session(&mut session);
    service.save_session(&session.finish(ts(2024, 1, 3))?)?;

    service.log_activity(
        NewActivity {
            date: date(2024, 1, 3),
            activity_type: Some(fittrack_lib::ActivityType::IceBath),
            duration: Some(5),
            ..Default::default()
        },
        ts(2024, 1, 3),
    )?;

    let summary = service.day_summary(date(2024, 1, 3), date(2024, 1, 3))?;
    let hiit = summary.hiit.unwrap();
    assert_eq!(hiit.day, 3);
    assert!(hiit.completed);
    assert!(summary.strength.is_some());
    assert_eq!(summary.activities.len(), 1);

    // Dates outside the nine weeks have no HIIT day.
    let outside = service.day_summary(date(2023, 12, 31), date(2024, 1, 3))?;
    assert!(outside.hiit.is_none());
    Ok(())
}

#[test]
fn test_export_import_round_trip() -> Result<()> {
    let mut service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;
    service.toggle_day(2, ts(2024, 1, 2))?;
    service.record_fit_test(1, &[50, 40, 60, 30, 10, 12, 20, 30], ts(2024, 1, 1))?;

    let mut session = service.begin_session(date(2024, 1, 2), ts(2024, 1, 2))?;
    complete_session(&mut session);
    service.save_session(&session.finish(ts(2024, 1, 2))?)?;

    service.log_activity(
        NewActivity {
            date: date(2024, 1, 2),
            activity_type: Some(fittrack_lib::ActivityType::Ruck),
            distance: Some(3.0),
            ..Default::default()
        },
        ts(2024, 1, 2),
    )?;
    service.set_weight_unit(WeightUnit::Kg)?;

    let json = service.export_data(ts(2024, 1, 5))?;
    // The snapshot uses the stable camelCase keys.
    assert!(json.contains("\"insanityWorkouts\""));
    assert!(json.contains("\"fitTests\""));
    assert!(json.contains("\"strongliftsWorkouts\""));
    assert!(json.contains("\"exportDate\""));

    // Wipe everything, then restore.
    service.clear_all_data()?;
    assert_eq!(service.insanity_progress()?.completed, 0);
    assert!(service.list_strength_workouts()?.is_empty());
    assert!(service.list_activities()?.is_empty());
    assert!(service.list_fit_tests()?.is_empty());
    assert_eq!(service.weight_unit()?, WeightUnit::Lbs);

    service.import_data(&json)?;
    assert_eq!(service.insanity_progress()?.completed, 2); // day 1 (fit test) + day 2
    // The start anchor rides along inside the settings collection.
    assert_eq!(
        service.insanity_state()?.map(|s| s.start_date),
        Some(date(2024, 1, 1))
    );
    assert_eq!(service.list_fit_tests()?.len(), 1);
    assert_eq!(service.list_strength_workouts()?.len(), 1);
    assert_eq!(service.list_activities()?.len(), 1);
    assert_eq!(service.weight_unit()?, WeightUnit::Kg);

    // The earned squat increment survives the round trip.
    assert_eq!(service.starting_weights()?["Squat"], 50.0);
    Ok(())
}

#[test]
fn test_partial_resets_leave_other_programs_alone() -> Result<()> {
    let mut service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;
    service.toggle_day(2, ts(2024, 1, 2))?;

    let mut session = service.begin_session(date(2024, 1, 2), ts(2024, 1, 2))?;
    complete_session(&mut session);
    service.save_session(&session.finish(ts(2024, 1, 2))?)?;

    service.clear_insanity_data()?;
    assert_eq!(service.insanity_progress()?.completed, 0);
    assert!(service.insanity_state()?.is_none());
    assert_eq!(service.list_strength_workouts()?.len(), 1);

    service.clear_stronglifts_data()?;
    assert!(service.list_strength_workouts()?.is_empty());
    Ok(())
}

#[test]
fn test_restart_keeps_recorded_days() -> Result<()> {
    let service = create_test_service()?;
    service.start_insanity(date(2024, 1, 1))?;
    service.toggle_day(2, ts(2024, 1, 2))?;

    // Restarting moves the anchor but keeps history.
    service.start_insanity(date(2024, 3, 1))?;
    assert_eq!(service.insanity_progress()?.completed, 1);
    let state = service.insanity_state()?.unwrap();
    assert_eq!(state.start_date, date(2024, 3, 1));
    Ok(())
}
