use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{Datelike, NaiveDate};

use crate::models::{CanonicalRecord, FamilyMember, MonthlySummary};
use crate::summary;

pub fn format_exercise_time(hours: u32, minutes: u32) -> String {
    match (hours, minutes) {
        (0, _) => format!("{minutes}m"),
        (_, 0) => format!("{hours}h"),
        _ => format!("{hours}h {minutes}m"),
    }
}

pub fn build_report(
    member: &FamilyMember,
    year: i32,
    month: u32,
    records: &BTreeMap<NaiveDate, CanonicalRecord>,
) -> String {
    let monthly = summary::summarize(records, year, month);

    let mut output = String::new();
    let _ = writeln!(output, "# Monthly Health Log");
    let _ = writeln!(output, "{} ({}), {year}-{month:02}", member.name, member.relation);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if monthly.rated_day_count == 0 {
        let _ = writeln!(output, "No rated days this month yet.");
    } else {
        if !monthly.encouragement_message.is_empty() {
            let _ = writeln!(output, "{}", monthly.encouragement_message);
            let _ = writeln!(output);
        }
        let average = monthly.average_rating.unwrap_or(0.0);
        let _ = writeln!(
            output,
            "Recorded a rating on {} days, averaging {average:.1} stars.",
            monthly.rated_day_count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Exercise Time");

    if monthly.exercise_totals.is_empty() {
        let _ = writeln!(output, "No exercise recorded this month.");
    } else {
        for total in &monthly.exercise_totals {
            let _ = writeln!(
                output,
                "- {}: {} ({} minutes)",
                total.name,
                format_exercise_time(total.hours(), total.minutes()),
                total.total_minutes
            );
        }
        let _ = writeln!(
            output,
            "- total: {} minutes",
            monthly.total_exercise_minutes
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Notes");

    let noted: Vec<(&NaiveDate, &CanonicalRecord)> = records
        .iter()
        .filter(|(date, record)| {
            date.year() == year && date.month() == month && !record.note.is_empty()
        })
        .collect();

    if noted.is_empty() {
        let _ = writeln!(output, "No notes this month.");
    } else {
        for (date, record) in noted {
            let _ = writeln!(output, "- day {}: {}", date.day(), record.note);
        }
    }

    output
}

pub fn print_summary(member: &FamilyMember, year: i32, month: u32, monthly: &MonthlySummary) {
    println!("{}, {year}-{month:02}", member.name);

    if monthly.rated_day_count == 0 {
        println!("No records with a rating this month.");
    } else {
        let average = monthly.average_rating.unwrap_or(0.0);
        println!(
            "Rated on {} days, average {average:.1} stars.",
            monthly.rated_day_count
        );
    }

    if !monthly.encouragement_message.is_empty() {
        println!("{}", monthly.encouragement_message);
    }

    for total in &monthly.exercise_totals {
        println!(
            "- {}: {}",
            total.name,
            format_exercise_time(total.hours(), total.minutes())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseEntry;

    fn member() -> FamilyMember {
        FamilyMember {
            id: 1,
            name: "Mom".to_string(),
            relation: "Mom".to_string(),
            avatar: None,
            age: Some(58),
            conditions: Vec::new(),
        }
    }

    fn record(day: u32, rating: u8, note: &str, walk_minutes: u32) -> CanonicalRecord {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let mut record = CanonicalRecord::empty(1, date);
        record.rating = rating;
        record.note = note.to_string();
        if walk_minutes > 0 {
            record.exercise_entries = vec![ExerciseEntry {
                name: "walk".to_string(),
                duration_minutes: walk_minutes,
            }];
        }
        record
    }

    #[test]
    fn report_covers_summary_exercise_and_notes() {
        let mut records = BTreeMap::new();
        for day in [1, 3] {
            let r = record(day, 4, "felt good", 40);
            records.insert(r.date, r);
        }
        let report = build_report(&member(), 2024, 5, &records);
        assert!(report.contains("Mom (Mom), 2024-05"));
        assert!(report.contains("Recorded a rating on 2 days, averaging 4.0 stars."));
        assert!(report.contains("- walk: 1h 20m (80 minutes)"));
        assert!(report.contains("- total: 80 minutes"));
        assert!(report.contains("- day 1: felt good"));
        assert!(report.contains(summary::encouragement_message(80)));
    }

    #[test]
    fn empty_month_uses_empty_state_lines() {
        let report = build_report(&member(), 2024, 5, &BTreeMap::new());
        assert!(report.contains("No rated days this month yet."));
        assert!(report.contains("No exercise recorded this month."));
        assert!(report.contains("No notes this month."));
    }

    #[test]
    fn notes_from_other_months_are_excluded() {
        let mut records = BTreeMap::new();
        let april_date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut april = CanonicalRecord::empty(1, april_date);
        april.rating = 3;
        april.note = "april note".to_string();
        records.insert(april.date, april);

        let report = build_report(&member(), 2024, 5, &records);
        assert!(!report.contains("april note"));
    }

    #[test]
    fn exercise_time_formatting() {
        assert_eq!(format_exercise_time(0, 45), "45m");
        assert_eq!(format_exercise_time(2, 0), "2h");
        assert_eq!(format_exercise_time(1, 10), "1h 10m");
        assert_eq!(format_exercise_time(0, 0), "0m");
    }
}
