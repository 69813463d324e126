//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{stdin, stdout, Write}; // For prompts

use fittrack_lib::{
    schedule, Activity, AppService, CalendarDay, FitTestResult, SetCycle, SetState,
    StrengthWorkout, WeightUnit, WorkoutSession, WorkoutType, LBS_TO_KG,
};

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args(); // Parse arguments once

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command(); // Get the command structure
        let bin_name = cmd.get_name().to_string(); // Get the binary name

        eprintln!("Generating completion script for {}...", shell); // Print to stderr
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout()); // Print script to stdout
        return Ok(()); // Exit after generating script
    }

    // Initialize the application service (loads config, connects to DB)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let today = Utc::now().date_naive();

    // --- Execute Commands using AppService ---
    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            // This case is handled above, but keep it exhaustive
            unreachable!("Completion generation should have exited already");
        }

        // --- HIIT Program Commands ---
        cli::Commands::StartHiit { date } => {
            let start = date.unwrap_or(today);
            let state = service.start_insanity(start)?;
            println!(
                "Program started on {}. Day 1 is a fit test; final day falls on {}.",
                state.start_date.format("%Y-%m-%d"),
                state
                    .start_date
                    .checked_add_days(chrono::Days::new(u64::from(schedule::TOTAL_DAYS) - 1))
                    .map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string())
            );
        }
        cli::Commands::Calendar => {
            let days = service.hiit_calendar(today)?;
            print_calendar_table(&days, header_color(&service));
            if service.insanity_state()?.is_none() {
                println!("Program not started yet. Use 'start-hiit' to anchor day 1.");
            }
        }
        cli::Commands::ToggleDay { day } => {
            let record = service.toggle_day(day, Utc::now())?;
            if record.completed {
                println!("Day {} ({}) marked complete.", record.day, record.workout_name);
            } else {
                println!("Day {} ({}) unmarked.", record.day, record.workout_name);
            }
        }
        cli::Commands::HiitProgress => {
            let progress = service.insanity_progress()?;
            println!(
                "Completed {}/{} days ({}%).",
                progress.completed,
                progress.total,
                progress.percent()
            );
            match service.next_fit_test_day()? {
                Some(day) => println!("Next fit test: day {day}."),
                None => println!("All five fit tests recorded."),
            }
        }

        // --- Fit Test Commands ---
        cli::Commands::RecordFitTest { day, reps } => {
            let day = match day {
                Some(d) => d,
                None => service
                    .next_fit_test_day()?
                    .context("All five fit tests are already recorded; pass --day to redo one")?,
            };
            let result = service.record_fit_test(day, &reps, Utc::now())?;
            println!(
                "Fit test {} recorded on day {} (total reps: {}).",
                result.test_number,
                result.day,
                result.total_reps()
            );
        }
        cli::Commands::FitTestProgress => {
            let tests = service.list_fit_tests()?;
            if tests.is_empty() {
                println!("No fit tests recorded yet.");
            } else {
                print_fit_test_table(&tests, header_color(&service));
            }
        }

        // --- Strength Program Commands ---
        cli::Commands::NextLift => {
            let workout_type = service.next_workout_type()?;
            let weights = service.starting_weights()?;
            let unit = service.weight_unit()?;
            println!("Next up: Workout {workout_type}");
            let mut table = themed_table(header_color(&service), vec!["Exercise", "Sets", "Weight"]);
            for name in schedule::strength_exercises(workout_type) {
                let weight = weights.get(name).copied().unwrap_or(0.0);
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(format!("{}x{}", schedule::set_count(name), schedule::TARGET_REPS)),
                    Cell::new(format_weight(weight, unit)),
                ]);
            }
            println!("{table}");
            let streak = service.week_streak(today)?;
            if streak > 0 {
                println!("Current streak: {streak} week(s).");
            }
        }
        cli::Commands::StartLift { workout, date } => {
            let date = date.unwrap_or(today);
            let session = match workout {
                Some(w) => {
                    let workout_type = cli_type_to_workout_type(w);
                    WorkoutSession::start(
                        workout_type,
                        &service.starting_weights()?,
                        date,
                        Utc::now(),
                    )
                }
                None => service.begin_session(date, Utc::now())?,
            };
            run_lift_session(&service, session)?;
        }
        cli::Commands::ListLifts { limit } => {
            let mut workouts = service.list_strength_workouts()?;
            workouts.reverse(); // newest first
            workouts.truncate(limit as usize);
            if workouts.is_empty() {
                println!("No strength sessions recorded yet.");
            } else {
                let unit = service.weight_unit()?;
                print_lift_list_table(&workouts, unit, header_color(&service));
            }
        }
        cli::Commands::ViewLift { date } => match service.strength_workout_on(date)? {
            Some(workout) => {
                let unit = service.weight_unit()?;
                print_lift_detail_table(&workout, unit, header_color(&service));
            }
            None => println!("No strength session on {}.", date.format("%Y-%m-%d")),
        },

        // --- Activity Commands ---
        cli::Commands::LogActivity {
            type_,
            date,
            duration,
            distance,
            zone,
            notes,
        } => {
            let activity_type = cli_type_to_activity_type(type_);
            if distance.is_some() && !activity_type.has_distance() {
                bail!("'{}' does not take a distance", activity_type.label());
            }
            let new = fittrack_lib::NewActivity {
                date: date.unwrap_or(today),
                activity_type: Some(activity_type),
                duration,
                distance,
                heart_rate_zone: zone.map(cli_zone_to_zone),
                notes,
                completed_at: None,
            };
            let activity = service.log_activity(new, Utc::now())?;
            println!(
                "Logged {} on {} (ID: {}).",
                activity.activity_type.label(),
                activity.date.format("%Y-%m-%d"),
                activity.id
            );
        }
        cli::Commands::ListActivities { date } => {
            let activities = match date {
                Some(d) => service.activities_on(d)?,
                None => service.list_activities()?,
            };
            if activities.is_empty() {
                println!("No activities logged.");
            } else {
                print_activity_table(&activities, header_color(&service));
            }
        }
        cli::Commands::DeleteActivity { id } => {
            service.delete_activity(id)?;
            println!("Deleted activity ID: {id}");
        }

        // --- Day Overview ---
        cli::Commands::Day { date } => {
            let date = date.unwrap_or(today);
            let summary = service.day_summary(date, today)?;
            println!("{}", date.format("%A, %Y-%m-%d"));
            match &summary.hiit {
                Some(day) => println!("  HIIT day {}: {} [{}]", day.day, day.name, day_marker(day)),
                None => println!("  No HIIT day scheduled."),
            }
            match &summary.strength {
                Some(w) => println!(
                    "  Strength: Workout {} ({} exercises)",
                    w.workout_type,
                    w.exercises.len()
                ),
                None => println!("  No strength session."),
            }
            if summary.activities.is_empty() {
                println!("  No activities.");
            } else {
                for activity in &summary.activities {
                    println!("  Activity: {}", describe_activity(activity));
                }
            }
        }

        // --- Settings / Data Management ---
        cli::Commands::SetUnits { units } => {
            let unit = match units {
                cli::UnitsCli::Lbs => WeightUnit::Lbs,
                cli::UnitsCli::Kg => WeightUnit::Kg,
            };
            service.set_weight_unit(unit)?;
            println!("Weight display unit set to {unit}.");
        }
        cli::Commands::Export { output } => {
            let json = service.export_data(Utc::now())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &json)
                        .with_context(|| format!("Failed to write export to {path:?}"))?;
                    println!("Exported data to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        cli::Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read import file {file:?}"))?;
            let snapshot = service.import_data(&json)?;
            println!(
                "Imported {} HIIT days, {} fit tests, {} strength sessions, {} activities.",
                snapshot.insanity_workouts.len(),
                snapshot.fit_tests.len(),
                snapshot.stronglifts_workouts.len(),
                snapshot.activities.len()
            );
        }
        cli::Commands::Reset { target, yes } => {
            let description = match target {
                cli::ResetTargetCli::Insanity => "all HIIT days and fit tests",
                cli::ResetTargetCli::Stronglifts => "all strength sessions",
                cli::ResetTargetCli::All => "ALL tracked data and settings",
            };
            if !yes && !confirm(&format!("This will erase {description}. Continue?"))? {
                println!("Reset cancelled.");
                return Ok(());
            }
            match target {
                cli::ResetTargetCli::Insanity => service.clear_insanity_data()?,
                cli::ResetTargetCli::Stronglifts => service.clear_stronglifts_data()?,
                cli::ResetTargetCli::All => service.clear_all_data()?,
            }
            println!("Erased {description}.");
        }
        cli::Commands::SetHeaderColor { color } => {
            service.set_header_color(&color)?;
            println!("Table header color set to '{color}'.");
        }
        cli::Commands::DbPath => {
            println!("{}", service.db_path.display());
        }
        cli::Commands::ConfigPath => {
            println!("{}", service.get_config_path().display());
        }
    }

    Ok(())
}

fn cli_type_to_workout_type(t: cli::WorkoutTypeCli) -> WorkoutType {
    match t {
        cli::WorkoutTypeCli::A => WorkoutType::A,
        cli::WorkoutTypeCli::B => WorkoutType::B,
    }
}

fn cli_type_to_activity_type(t: cli::ActivityTypeCli) -> fittrack_lib::ActivityType {
    use fittrack_lib::ActivityType;
    match t {
        cli::ActivityTypeCli::Walk => ActivityType::Walk,
        cli::ActivityTypeCli::Hike => ActivityType::Hike,
        cli::ActivityTypeCli::Ruck => ActivityType::Ruck,
        cli::ActivityTypeCli::Peloton => ActivityType::Peloton,
        cli::ActivityTypeCli::Zone2 => ActivityType::Zone2,
        cli::ActivityTypeCli::Sauna => ActivityType::Sauna,
        cli::ActivityTypeCli::IceBath => ActivityType::IceBath,
    }
}

fn cli_zone_to_zone(z: cli::ZoneCli) -> fittrack_lib::HeartRateZone {
    use fittrack_lib::HeartRateZone;
    match z {
        cli::ZoneCli::Zone2 => HeartRateZone::Zone2,
        cli::ZoneCli::Zone3 => HeartRateZone::Zone3,
        cli::ZoneCli::Zone4 => HeartRateZone::Zone4,
    }
}

fn header_color(service: &AppService) -> Color {
    fittrack_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green)
}

fn format_weight(lbs: f64, unit: WeightUnit) -> String {
    match unit {
        WeightUnit::Lbs => {
            if lbs.fract() == 0.0 {
                format!("{lbs:.0} lbs")
            } else {
                format!("{lbs:.1} lbs")
            }
        }
        WeightUnit::Kg => format!("{:.1} kg", lbs * LBS_TO_KG),
    }
}

/// Ask a yes/no question on stdin. Only an explicit "y"/"yes" proceeds.
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn themed_table(header_color: Color, headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).fg(header_color).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn day_marker(day: &CalendarDay) -> &'static str {
    if day.completed {
        "done"
    } else if day.status.is_fit_test_due {
        "fit test due"
    } else if day.status.is_missed {
        "missed"
    } else if day.status.is_today {
        "today"
    } else if day.rest {
        "rest"
    } else {
        "upcoming"
    }
}

// --- Table Printing Functions (Remain in CLI) ---

/// Prints the nine-week calendar, one row per week.
fn print_calendar_table(days: &[CalendarDay], header_color: Color) {
    let mut table = themed_table(
        header_color,
        vec!["Week", "Day 1", "Day 2", "Day 3", "Day 4", "Day 5", "Day 6", "Day 7"],
    );
    for (week_idx, week) in days.chunks(7).enumerate() {
        let mut row = vec![Cell::new(format!("W{}", week_idx + 1))];
        for day in week {
            let mark = if day.completed {
                " ✓"
            } else if day.status.is_missed {
                " ✗"
            } else if day.status.is_today {
                " ←"
            } else {
                ""
            };
            let mut cell = Cell::new(format!("D{} {}{}", day.day, day.short_name, mark));
            if day.completed {
                cell = cell.fg(Color::Green);
            } else if day.status.is_fit_test_due {
                cell = cell.fg(Color::Yellow);
            } else if day.status.is_missed {
                cell = cell.fg(Color::Red);
            } else if day.rest {
                cell = cell.fg(Color::DarkGrey);
            }
            row.push(cell);
        }
        table.add_row(row);
    }
    println!("{table}");
}

/// Prints fit test results side by side, one row per exercise.
fn print_fit_test_table(tests: &[FitTestResult], header_color: Color) {
    let mut headers = vec!["Exercise".to_string()];
    for test in tests {
        headers.push(format!("Test {} (day {})", test.test_number, test.day));
    }
    let mut table = themed_table(header_color, headers.iter().map(String::as_str).collect());

    for name in schedule::FIT_TEST_EXERCISES {
        let mut row = vec![Cell::new(name)];
        for test in tests {
            let reps = test
                .exercises
                .iter()
                .find(|e| e.name == name)
                .map_or_else(|| "-".to_string(), |e| e.reps.to_string());
            row.push(Cell::new(reps));
        }
        table.add_row(row);
    }

    let mut totals = vec![Cell::new("Total").add_attribute(Attribute::Bold)];
    for test in tests {
        totals.push(Cell::new(test.total_reps().to_string()).add_attribute(Attribute::Bold));
    }
    table.add_row(totals);
    println!("{table}");
}

fn print_lift_list_table(workouts: &[StrengthWorkout], unit: WeightUnit, header_color: Color) {
    let mut table = themed_table(header_color, vec!["Date", "Workout", "Exercises", "Result"]);
    for workout in workouts {
        let exercises = workout
            .exercises
            .iter()
            .map(|e| format!("{} {}", e.name, format_weight(e.weight, unit)))
            .collect::<Vec<_>>()
            .join(", ");
        let all_hit = workout.exercises.iter().all(|e| e.should_increase);
        table.add_row(vec![
            Cell::new(workout.date.format("%Y-%m-%d").to_string()),
            Cell::new(workout.workout_type.to_string()),
            Cell::new(exercises),
            Cell::new(if all_hit { "5x5 ✓" } else { "partial" }),
        ]);
    }
    println!("{table}");
}

fn print_lift_detail_table(workout: &StrengthWorkout, unit: WeightUnit, header_color: Color) {
    println!(
        "Workout {} on {} (started {})",
        workout.workout_type,
        workout.date.format("%Y-%m-%d"),
        workout
            .started_at
            .with_timezone(&Local)
            .format("%H:%M")
    );
    let mut table = themed_table(header_color, vec!["Exercise", "Weight", "Sets", "Next time"]);
    for exercise in &workout.exercises {
        let sets = exercise
            .sets
            .iter()
            .map(|s| match s.completed_reps {
                Some(reps) if s.completed => format!("{reps}"),
                Some(reps) => format!("{reps}!"),
                None => "-".to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");
        let next = if exercise.should_increase {
            format_weight(exercise.weight + schedule::WEIGHT_STEP, unit)
        } else {
            format!("{} (repeat)", format_weight(exercise.weight, unit))
        };
        table.add_row(vec![
            Cell::new(&exercise.name),
            Cell::new(format_weight(exercise.weight, unit)),
            Cell::new(sets),
            Cell::new(next),
        ]);
    }
    println!("{table}");
}

fn describe_activity(activity: &Activity) -> String {
    let mut parts = vec![activity.activity_type.label().to_string()];
    if let Some(duration) = activity.duration {
        parts.push(format!("{duration} min"));
    }
    if let Some(distance) = activity.distance {
        parts.push(format!("{distance:.1} mi"));
    }
    if let Some(zone) = activity.heart_rate_zone {
        parts.push(zone.to_string());
    }
    if let Some(notes) = &activity.notes {
        parts.push(notes.clone());
    }
    parts.join(", ")
}

fn print_activity_table(activities: &[Activity], header_color: Color) {
    let mut table = themed_table(
        header_color,
        vec!["ID", "Date", "Type", "Category", "Duration", "Distance", "Zone", "Notes"],
    );
    for activity in activities {
        table.add_row(vec![
            Cell::new(activity.id.to_string()),
            Cell::new(activity.date.format("%Y-%m-%d").to_string()),
            Cell::new(activity.activity_type.label()),
            Cell::new(activity.category.to_string()),
            Cell::new(
                activity
                    .duration
                    .map_or_else(|| "-".to_string(), |d| format!("{d} min")),
            ),
            Cell::new(
                activity
                    .distance
                    .map_or_else(|| "-".to_string(), |d| format!("{d:.1} mi")),
            ),
            Cell::new(
                activity
                    .heart_rate_zone
                    .map_or_else(|| "-".to_string(), |z| z.to_string()),
            ),
            Cell::new(activity.notes.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}

// --- Interactive Lift Session ---

fn print_session(session: &WorkoutSession, unit: WeightUnit, header_color: Color) {
    let mut table = themed_table(header_color, vec!["#", "Exercise", "Weight", "Sets"]);
    for (idx, exercise) in session.exercises.iter().enumerate() {
        let sets = exercise
            .sets
            .iter()
            .map(|s| match s {
                SetState::Untouched => "·".to_string(),
                SetState::Completed => "✓".to_string(),
                SetState::Failed(reps) => format!("{reps}!"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            Cell::new((idx + 1).to_string()),
            Cell::new(&exercise.name),
            Cell::new(format_weight(exercise.weight, unit)),
            Cell::new(sets),
        ]);
    }
    println!("{table}");
}

fn prompt_reps(exercise: &str, set: usize) -> Result<Option<u32>> {
    print!("Reps completed for {exercise} set {set} (0-{}): ", schedule::TARGET_REPS);
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    match input.trim().parse::<u32>() {
        Ok(reps) if reps <= schedule::TARGET_REPS => Ok(Some(reps)),
        _ => {
            println!("Enter a number between 0 and {}.", schedule::TARGET_REPS);
            Ok(None)
        }
    }
}

/// Runs the session loop. Sets are tapped through untouched -> complete ->
/// rep picker -> untouched; nothing is saved until 'finish'.
fn run_lift_session(service: &AppService, mut session: WorkoutSession) -> Result<()> {
    let unit = service.weight_unit()?;
    let color = header_color(service);
    println!(
        "Workout {} on {}. Commands: t <ex> <set> | r <ex> <set> <reps> | w <ex> up|down | show | finish | cancel",
        session.workout_type,
        session.date.format("%Y-%m-%d")
    );
    print_session(&session, unit, color);

    loop {
        print!("> ");
        stdout().flush()?;
        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            println!("Input closed; session cancelled. Nothing was recorded.");
            session.cancel();
            return Ok(());
        }
        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["show"] => print_session(&session, unit, color),
            ["t", ex, set] => match (ex.parse::<usize>(), set.parse::<usize>()) {
                (Ok(ex), Ok(set)) if ex >= 1 && set >= 1 => {
                    match session.cycle_set(ex - 1, set - 1) {
                        Ok(SetCycle::Marked) => print_session(&session, unit, color),
                        Ok(SetCycle::Reset) => print_session(&session, unit, color),
                        Ok(SetCycle::NeedsReps) => {
                            let name = session.exercises[ex - 1].name.clone();
                            if let Some(reps) = prompt_reps(&name, set)? {
                                session.record_reps(ex - 1, set - 1, reps)?;
                                print_session(&session, unit, color);
                            }
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                _ => println!("Usage: t <exercise#> <set#>"),
            },
            ["r", ex, set, reps] => {
                match (
                    ex.parse::<usize>(),
                    set.parse::<usize>(),
                    reps.parse::<u32>(),
                ) {
                    (Ok(ex), Ok(set), Ok(reps)) if ex >= 1 && set >= 1 => {
                        match session.record_reps(ex - 1, set - 1, reps) {
                            Ok(()) => print_session(&session, unit, color),
                            Err(e) => println!("{e}"),
                        }
                    }
                    _ => println!("Usage: r <exercise#> <set#> <reps>"),
                }
            }
            ["w", ex, direction] if *direction == "up" || *direction == "down" => match ex
                .parse::<usize>()
            {
                Ok(ex) if ex >= 1 => match session.adjust_weight(ex - 1, *direction == "up") {
                    Ok(weight) => println!(
                        "{} now at {}.",
                        session.exercises[ex - 1].name,
                        format_weight(weight, unit)
                    ),
                    Err(e) => println!("{e}"),
                },
                _ => println!("Usage: w <exercise#> up|down"),
            },
            ["finish"] => {
                if !session.all_attempted() {
                    println!("Some sets are still untouched. Tap them or record reps first.");
                    continue;
                }
                let record = session.finish(Utc::now())?;
                let id = service.save_session(&record)?;
                println!("Session saved (ID: {id}).");
                for exercise in &record.exercises {
                    if exercise.should_increase {
                        println!(
                            "  {}: all sets at target, next session loads {}.",
                            exercise.name,
                            format_weight(exercise.weight + schedule::WEIGHT_STEP, unit)
                        );
                    } else {
                        println!(
                            "  {}: repeat {} next session.",
                            exercise.name,
                            format_weight(exercise.weight, unit)
                        );
                    }
                }
                return Ok(());
            }
            ["cancel"] => {
                session.cancel();
                println!("Session cancelled. Nothing was recorded.");
                return Ok(());
            }
            _ => println!(
                "Unknown command. Use: t <ex> <set> | r <ex> <set> <reps> | w <ex> up|down | show | finish | cancel"
            ),
        }
    }
}
