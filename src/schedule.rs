//src/schedule.rs
//! Static program data: the 63-day HIIT calendar, the fit test roster, and
//! the A/B strength templates with their starting weights.

use crate::db::WorkoutType;

/// Days of the program, inclusive. Marketed as "60 days", scheduled over
/// nine 7-day weeks.
pub const TOTAL_DAYS: u32 = 63;

/// Program days that are fitness checkpoints (tests 1 through 5).
pub const FIT_TEST_DAYS: [u32; 5] = [1, 15, 36, 50, 63];

/// The eight scored fit test exercises, in recording order.
pub const FIT_TEST_EXERCISES: [&str; 8] = [
    "Switch Kicks",
    "Power Jacks",
    "Power Knees",
    "Power Jumps",
    "Globe Jumps",
    "Suicide Jumps",
    "Push-Up Jacks",
    "Low Plank Oblique",
];

/// One planned day of the HIIT calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledDay {
    pub day: u32,
    pub name: &'static str,
    pub rest: bool,
    pub fit_test: bool,
}

impl ScheduledDay {
    const fn workout(day: u32, name: &'static str) -> Self {
        Self {
            day,
            name,
            rest: false,
            fit_test: false,
        }
    }

    const fn rest(day: u32) -> Self {
        Self {
            day,
            name: "Rest",
            rest: true,
            fit_test: false,
        }
    }

    const fn fit_test(day: u32) -> Self {
        Self {
            day,
            name: "Fit Test",
            rest: false,
            fit_test: true,
        }
    }

    /// Which checkpoint (1-5) this day hosts, if any.
    pub fn fit_test_number(&self) -> Option<u32> {
        FIT_TEST_DAYS
            .iter()
            .position(|&d| d == self.day)
            .map(|idx| idx as u32 + 1)
    }

    /// Compact name for calendar cells.
    pub fn short_name(&self) -> &'static str {
        match self.name {
            "Fit Test" => "Fit Test",
            "Plyometric Cardio Circuit" => "Plyo Cardio",
            "Cardio Power & Resistance" => "Cardio Power",
            "Cardio Recovery" => "Recovery",
            "Pure Cardio" => "Pure Cardio",
            "Pure Cardio & Cardio Abs" => "Pure + Abs",
            "Core Cardio & Balance" => "Core Balance",
            "Max Interval Circuit" => "Max Circuit",
            "Max Interval Plyo" => "Max Plyo",
            "Max Cardio Conditioning" => "Max Cardio",
            "Max Cardio Conditioning & Cardio Abs" => "Max + Abs",
            "Max Recovery" => "Max Recovery",
            "Rest" => "Rest",
            other => other,
        }
    }
}

/// The full nine-week calendar. Month one runs days 1-28, the recovery week
/// days 29-35, month two days 36-63. Day 63 is the final fit test.
pub static SCHEDULE: [ScheduledDay; TOTAL_DAYS as usize] = [
    // Week 1
    ScheduledDay::fit_test(1),
    ScheduledDay::workout(2, "Plyometric Cardio Circuit"),
    ScheduledDay::workout(3, "Cardio Power & Resistance"),
    ScheduledDay::workout(4, "Cardio Recovery"),
    ScheduledDay::workout(5, "Pure Cardio"),
    ScheduledDay::workout(6, "Plyometric Cardio Circuit"),
    ScheduledDay::rest(7),
    // Week 2
    ScheduledDay::workout(8, "Cardio Power & Resistance"),
    ScheduledDay::workout(9, "Pure Cardio"),
    ScheduledDay::workout(10, "Plyometric Cardio Circuit"),
    ScheduledDay::workout(11, "Cardio Recovery"),
    ScheduledDay::workout(12, "Cardio Power & Resistance"),
    ScheduledDay::workout(13, "Pure Cardio & Cardio Abs"),
    ScheduledDay::rest(14),
    // Week 3
    ScheduledDay::fit_test(15),
    ScheduledDay::workout(16, "Pure Cardio & Cardio Abs"),
    ScheduledDay::workout(17, "Cardio Power & Resistance"),
    ScheduledDay::workout(18, "Cardio Recovery"),
    ScheduledDay::workout(19, "Cardio Power & Resistance"),
    ScheduledDay::workout(20, "Pure Cardio & Cardio Abs"),
    ScheduledDay::rest(21),
    // Week 4
    ScheduledDay::workout(22, "Plyometric Cardio Circuit"),
    ScheduledDay::workout(23, "Cardio Power & Resistance"),
    ScheduledDay::workout(24, "Pure Cardio & Cardio Abs"),
    ScheduledDay::workout(25, "Cardio Recovery"),
    ScheduledDay::workout(26, "Plyometric Cardio Circuit"),
    ScheduledDay::workout(27, "Pure Cardio & Cardio Abs"),
    ScheduledDay::rest(28),
    // Week 5 (recovery week)
    ScheduledDay::workout(29, "Core Cardio & Balance"),
    ScheduledDay::workout(30, "Core Cardio & Balance"),
    ScheduledDay::workout(31, "Core Cardio & Balance"),
    ScheduledDay::workout(32, "Core Cardio & Balance"),
    ScheduledDay::workout(33, "Core Cardio & Balance"),
    ScheduledDay::workout(34, "Core Cardio & Balance"),
    ScheduledDay::rest(35),
    // Week 6
    ScheduledDay::fit_test(36),
    ScheduledDay::workout(37, "Max Interval Circuit"),
    ScheduledDay::workout(38, "Max Interval Plyo"),
    ScheduledDay::workout(39, "Max Cardio Conditioning"),
    ScheduledDay::workout(40, "Max Recovery"),
    ScheduledDay::workout(41, "Max Interval Circuit"),
    ScheduledDay::rest(42),
    // Week 7
    ScheduledDay::workout(43, "Max Interval Circuit"),
    ScheduledDay::workout(44, "Max Interval Plyo"),
    ScheduledDay::workout(45, "Max Cardio Conditioning & Cardio Abs"),
    ScheduledDay::workout(46, "Max Recovery"),
    ScheduledDay::workout(47, "Max Interval Plyo"),
    ScheduledDay::workout(48, "Max Interval Circuit"),
    ScheduledDay::rest(49),
    // Week 8
    ScheduledDay::fit_test(50),
    ScheduledDay::workout(51, "Max Interval Plyo"),
    ScheduledDay::workout(52, "Max Cardio Conditioning & Cardio Abs"),
    ScheduledDay::workout(53, "Max Recovery"),
    ScheduledDay::workout(54, "Max Interval Circuit"),
    ScheduledDay::workout(55, "Max Cardio Conditioning & Cardio Abs"),
    ScheduledDay::rest(56),
    // Week 9
    ScheduledDay::workout(57, "Max Interval Circuit"),
    ScheduledDay::workout(58, "Max Interval Plyo"),
    ScheduledDay::workout(59, "Max Cardio Conditioning & Cardio Abs"),
    ScheduledDay::workout(60, "Max Interval Circuit"),
    ScheduledDay::workout(61, "Max Cardio Conditioning & Cardio Abs"),
    ScheduledDay::workout(62, "Max Interval Plyo"),
    ScheduledDay::fit_test(63),
];

/// Looks up a program day (1-based). None outside 1..=63.
pub fn scheduled_day(day: u32) -> Option<&'static ScheduledDay> {
    if day == 0 || day > TOTAL_DAYS {
        return None;
    }
    Some(&SCHEDULE[(day - 1) as usize])
}

/// The strength exercises of one A/B workout.
pub fn strength_exercises(workout_type: WorkoutType) -> [&'static str; 3] {
    match workout_type {
        WorkoutType::A => ["Squat", "Bench Press", "Barbell Row"],
        WorkoutType::B => ["Squat", "Overhead Press", "Deadlift"],
    }
}

/// Empty-bar defaults in pounds for a lifter with no recorded history.
pub const DEFAULT_WEIGHTS: [(&str, f64); 5] = [
    ("Squat", 45.0),
    ("Bench Press", 45.0),
    ("Barbell Row", 65.0),
    ("Overhead Press", 45.0),
    ("Deadlift", 95.0),
];

/// Standard rep target per set.
pub const TARGET_REPS: u32 = 5;

/// Sets per exercise; deadlift works up to a single heavy set.
pub fn set_count(exercise: &str) -> usize {
    if exercise == "Deadlift" {
        1
    } else {
        5
    }
}

/// Linear progression increment in pounds.
pub const WEIGHT_STEP: f64 = 5.0;

pub fn default_weight(exercise: &str) -> f64 {
    DEFAULT_WEIGHTS
        .iter()
        .find(|(name, _)| *name == exercise)
        .map_or(45.0, |(_, w)| *w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_covers_every_day_in_order() {
        assert_eq!(SCHEDULE.len(), TOTAL_DAYS as usize);
        for (idx, day) in SCHEDULE.iter().enumerate() {
            assert_eq!(day.day, idx as u32 + 1);
        }
    }

    #[test]
    fn rest_days_every_seventh_except_final_week() {
        let rest_days: Vec<u32> = SCHEDULE.iter().filter(|d| d.rest).map(|d| d.day).collect();
        assert_eq!(rest_days, vec![7, 14, 21, 28, 35, 42, 49, 56]);
    }

    #[test]
    fn fit_tests_at_fixed_checkpoints() {
        let test_days: Vec<u32> = SCHEDULE
            .iter()
            .filter(|d| d.fit_test)
            .map(|d| d.day)
            .collect();
        assert_eq!(test_days, FIT_TEST_DAYS.to_vec());
        assert_eq!(scheduled_day(15).and_then(|d| d.fit_test_number()), Some(2));
        assert_eq!(scheduled_day(63).and_then(|d| d.fit_test_number()), Some(5));
    }

    #[test]
    fn day_lookup_bounds() {
        assert!(scheduled_day(0).is_none());
        assert!(scheduled_day(64).is_none());
        assert_eq!(scheduled_day(1).map(|d| d.name), Some("Fit Test"));
        assert_eq!(scheduled_day(62).map(|d| d.name), Some("Max Interval Plyo"));
    }

    #[test]
    fn deadlift_is_single_set() {
        assert_eq!(set_count("Deadlift"), 1);
        assert_eq!(set_count("Squat"), 5);
        assert_eq!(default_weight("Deadlift"), 95.0);
        assert_eq!(default_weight("Barbell Row"), 65.0);
    }
}
