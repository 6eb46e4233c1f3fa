use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{CanonicalRecord, ExerciseTotal, MonthlySummary};

const TIER_THREE_MINUTES: u32 = 1200;
const TIER_TWO_MINUTES: u32 = 600;
const TIER_ONE_MINUTES: u32 = 60;

/// Compute the calendar-view summary for one member's records in the given
/// month (1-indexed). Pure and infallible: records outside the month are
/// ignored, and nothing here mutates the input.
pub fn summarize(
    records: &BTreeMap<NaiveDate, CanonicalRecord>,
    year: i32,
    month: u32,
) -> MonthlySummary {
    let mut rated_day_count = 0usize;
    let mut rating_sum = 0u32;
    let mut exercise_totals: Vec<ExerciseTotal> = Vec::new();

    for (date, record) in records {
        if date.year() != year || date.month() != month {
            continue;
        }

        if record.rating > 0 {
            rated_day_count += 1;
            rating_sum += u32::from(record.rating);
        }

        for entry in &record.exercise_entries {
            if entry.duration_minutes == 0 {
                continue;
            }
            match exercise_totals.iter_mut().find(|t| t.name == entry.name) {
                Some(total) => total.total_minutes += entry.duration_minutes,
                None => exercise_totals.push(ExerciseTotal {
                    name: entry.name.clone(),
                    total_minutes: entry.duration_minutes,
                }),
            }
        }
    }

    let average_rating = if rated_day_count > 0 {
        Some(round_to_tenth(f64::from(rating_sum) / rated_day_count as f64))
    } else {
        None
    };

    let total_exercise_minutes: u32 = exercise_totals.iter().map(|t| t.total_minutes).sum();

    MonthlySummary {
        rated_day_count,
        average_rating,
        exercise_totals,
        total_exercise_minutes,
        encouragement_message: encouragement_message(total_exercise_minutes).to_string(),
    }
}

/// Round half-up to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Encouragement tiers, highest threshold first, closed at the lower bound.
pub fn encouragement_message(total_minutes: u32) -> &'static str {
    match total_minutes {
        TIER_THREE_MINUTES.. => "More muscle than fat by now. What a champion!",
        TIER_TWO_MINUTES..=1199 => "Congratulations, your fitness age just dropped ten years",
        TIER_ONE_MINUTES..=599 => "Well begun is half done. Keep it up!",
        _ => "",
    }
}
