use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::{CanonicalRecord, ExerciseEntry};

/// The three generations of stored exercise data, in resolution priority
/// order. Exactly one shape is selected per record; shapes are never merged.
enum ExerciseShape<'a> {
    /// Current shape: `exercises` array of `{type, duration}` objects.
    EntryList(&'a [Value]),
    /// Mid-generation shape: singular `exercise` object.
    Single(&'a Value),
    /// Earliest shape: `exercises` array of bare type names, no duration.
    NameList(&'a [Value]),
    Absent,
}

fn resolve_exercise_shape(raw: &Value) -> ExerciseShape<'_> {
    if let Some(list) = raw.get("exercises").and_then(Value::as_array) {
        if list.iter().any(|e| e.get("type").and_then(Value::as_str).is_some()) {
            return ExerciseShape::EntryList(list);
        }
    }
    if let Some(single) = raw.get("exercise") {
        if single.get("type").and_then(Value::as_str).is_some() {
            return ExerciseShape::Single(single);
        }
    }
    if let Some(list) = raw.get("exercises").and_then(Value::as_array) {
        if list.iter().any(|e| e.as_str().is_some_and(|s| !s.trim().is_empty())) {
            return ExerciseShape::NameList(list);
        }
    }
    ExerciseShape::Absent
}

/// Duration parsing with the lenient semantics the stored data was written
/// under: numbers truncate, strings parse their leading integer, anything
/// else (and anything negative) is 0. Never fails.
pub fn parse_duration_minutes(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.max(0).min(u32::MAX as i64) as u32
            } else {
                n.as_f64().map_or(0, |f| if f.is_finite() { f.max(0.0) as u32 } else { 0 })
            }
        }
        Some(Value::String(s)) => leading_int(s).clamp(0, u32::MAX as i64) as u32,
        _ => 0,
    }
}

fn leading_int(text: &str) -> i64 {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let run: String = digits.chars().take_while(char::is_ascii_digit).collect();
    if run.is_empty() {
        return 0;
    }
    let value = run.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -value
    } else {
        value
    }
}

fn entry_from_object(value: &Value) -> Option<ExerciseEntry> {
    let name = value.get("type")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(ExerciseEntry {
        name: name.to_string(),
        duration_minutes: parse_duration_minutes(value.get("duration")),
    })
}

fn string_field(raw: &Value, field: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn rating_field(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(n)) => {
            let rating = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0);
            rating.clamp(0, 5) as u8
        }
        _ => 0,
    }
}

/// Normalize one stored record, whatever its generation, into the canonical
/// shape. Absent or malformed input yields the empty record; this function
/// never fails.
pub fn normalize(raw: Option<&Value>, member_id: i64, date: NaiveDate) -> CanonicalRecord {
    let Some(raw) = raw else {
        return CanonicalRecord::empty(member_id, date);
    };
    if !raw.is_object() {
        return CanonicalRecord::empty(member_id, date);
    }

    let exercise_entries = match resolve_exercise_shape(raw) {
        ExerciseShape::EntryList(list) => list.iter().filter_map(entry_from_object).collect(),
        ExerciseShape::Single(value) => entry_from_object(value).into_iter().collect(),
        ExerciseShape::NameList(list) => list
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| ExerciseEntry {
                name: name.to_string(),
                duration_minutes: 0,
            })
            .collect(),
        ExerciseShape::Absent => Vec::new(),
    };

    CanonicalRecord {
        member_id,
        date,
        note: string_field(raw, "note"),
        exercise_entries,
        emotion: string_field(raw, "emotion"),
        rating: rating_field(raw.get("rating")),
        medicine_taken: raw
            .get("medicineTaken")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        medicine_note: string_field(raw, "medicineNote"),
        notes: string_field(raw, "notes"),
    }
}

/// Stored layout for a canonical record. The first positive-duration entry is
/// duplicated into the singular `exercise` field so readers of the
/// mid-generation shape keep working.
pub fn to_stored_json(record: &CanonicalRecord) -> Value {
    let entry_json = |entry: &ExerciseEntry| {
        json!({ "type": entry.name, "duration": entry.duration_minutes })
    };
    let main_exercise = record
        .exercise_entries
        .iter()
        .find(|entry| entry.duration_minutes > 0)
        .map(entry_json)
        .unwrap_or(Value::Null);
    let exercises: Vec<Value> = record.exercise_entries.iter().map(entry_json).collect();

    json!({
        "note": record.note,
        "exercise": main_exercise,
        "exercises": exercises,
        "emotion": record.emotion,
        "rating": record.rating,
        "medicineTaken": record.medicine_taken,
        "medicineNote": record.medicine_note,
        "notes": record.notes,
        "date": record.date.to_string(),
        "memberId": record.member_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn current_shape_maps_every_entry() {
        let raw = json!({
            "exercises": [
                {"type": "walk", "duration": "30"},
                {"type": "yoga", "duration": 45},
            ],
        });
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![
                ExerciseEntry { name: "walk".into(), duration_minutes: 30 },
                ExerciseEntry { name: "yoga".into(), duration_minutes: 45 },
            ]
        );
    }

    #[test]
    fn singular_legacy_shape_yields_one_entry() {
        let raw = json!({"exercise": {"type": "walk", "duration": 20}});
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![ExerciseEntry { name: "walk".into(), duration_minutes: 20 }]
        );
    }

    #[test]
    fn bare_string_legacy_shape_yields_zero_duration_entries() {
        let raw = json!({"exercises": ["stretch", "yoga"]});
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![
                ExerciseEntry { name: "stretch".into(), duration_minutes: 0 },
                ExerciseEntry { name: "yoga".into(), duration_minutes: 0 },
            ]
        );
    }

    #[test]
    fn entry_array_takes_priority_over_singular() {
        let raw = json!({
            "exercise": {"type": "old", "duration": 99},
            "exercises": [{"type": "new", "duration": 10}],
        });
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(record.exercise_entries.len(), 1);
        assert_eq!(record.exercise_entries[0].name, "new");
        assert_eq!(record.exercise_entries[0].duration_minutes, 10);
    }

    #[test]
    fn singular_takes_priority_over_bare_strings() {
        let raw = json!({
            "exercise": {"type": "walk", "duration": 15},
            "exercises": ["stretch"],
        });
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![ExerciseEntry { name: "walk".into(), duration_minutes: 15 }]
        );
    }

    #[test]
    fn mixed_array_keeps_only_typed_objects() {
        let raw = json!({"exercises": ["stretch", {"type": "walk", "duration": 5}]});
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![ExerciseEntry { name: "walk".into(), duration_minutes: 5 }]
        );
    }

    #[test]
    fn entries_without_a_type_are_dropped() {
        let raw = json!({
            "exercises": [
                {"type": "", "duration": 30},
                {"type": "   ", "duration": 30},
                {"duration": 30},
                {"type": "walk"},
            ],
        });
        let record = normalize(Some(&raw), 1, day());
        assert_eq!(
            record.exercise_entries,
            vec![ExerciseEntry { name: "walk".into(), duration_minutes: 0 }]
        );
    }

    #[test]
    fn duration_parsing_is_lenient_and_never_negative() {
        assert_eq!(parse_duration_minutes(Some(&json!("30"))), 30);
        assert_eq!(parse_duration_minutes(Some(&json!("30min"))), 30);
        assert_eq!(parse_duration_minutes(Some(&json!(" 42 "))), 42);
        assert_eq!(parse_duration_minutes(Some(&json!("abc"))), 0);
        assert_eq!(parse_duration_minutes(Some(&json!(""))), 0);
        assert_eq!(parse_duration_minutes(Some(&json!("-5"))), 0);
        assert_eq!(parse_duration_minutes(Some(&json!(-5))), 0);
        assert_eq!(parse_duration_minutes(Some(&json!(30.9))), 30);
        assert_eq!(parse_duration_minutes(Some(&json!(true))), 0);
        assert_eq!(parse_duration_minutes(Some(&Value::Null)), 0);
        assert_eq!(parse_duration_minutes(None), 0);
    }

    #[test]
    fn absent_or_malformed_raw_becomes_the_empty_record() {
        let empty = CanonicalRecord::empty(3, day());
        assert_eq!(normalize(None, 3, day()), empty);
        assert_eq!(normalize(Some(&json!("not a record")), 3, day()), empty);
        assert_eq!(normalize(Some(&json!(42)), 3, day()), empty);
        assert!(!empty.is_meaningful());
    }

    #[test]
    fn rating_is_clamped_to_the_star_scale() {
        assert_eq!(rating_field(Some(&json!(4))), 4);
        assert_eq!(rating_field(Some(&json!(7))), 5);
        assert_eq!(rating_field(Some(&json!(-1))), 0);
        assert_eq!(rating_field(Some(&json!(4.9))), 4);
        assert_eq!(rating_field(Some(&json!("4"))), 0);
        assert_eq!(rating_field(None), 0);
    }

    #[test]
    fn scalar_fields_coerce_with_defaults() {
        let raw = json!({
            "note": "slept well",
            "emotion": "good",
            "rating": 4,
            "medicineTaken": true,
            "medicineNote": "after lunch",
            "notes": "long walk in the park",
        });
        let record = normalize(Some(&raw), 9, day());
        assert_eq!(record.note, "slept well");
        assert_eq!(record.emotion, "good");
        assert_eq!(record.rating, 4);
        assert!(record.medicine_taken);
        assert_eq!(record.medicine_note, "after lunch");
        assert_eq!(record.notes, "long walk in the park");
        assert!(record.is_meaningful());
    }

    #[test]
    fn emotion_or_medication_alone_is_not_meaningful() {
        let raw = json!({"emotion": "good", "medicineTaken": true});
        let record = normalize(Some(&raw), 1, day());
        assert!(!record.is_meaningful());
    }

    #[test]
    fn normalization_is_idempotent_over_reserialization() {
        let raw = json!({
            "note": "check-up",
            "exercises": [
                {"type": "walk", "duration": "30"},
                {"type": "stretch", "duration": 0},
            ],
            "rating": 3,
            "notes": "n",
        });
        let first = normalize(Some(&raw), 5, day());
        let second = normalize(Some(&to_stored_json(&first)), 5, day());
        assert_eq!(first, second);
    }

    #[test]
    fn stored_layout_duplicates_first_timed_entry_into_legacy_field() {
        let mut record = CanonicalRecord::empty(2, day());
        record.exercise_entries = vec![
            ExerciseEntry { name: "stretch".into(), duration_minutes: 0 },
            ExerciseEntry { name: "walk".into(), duration_minutes: 25 },
        ];
        let stored = to_stored_json(&record);
        assert_eq!(stored["exercise"]["type"], "walk");
        assert_eq!(stored["exercises"].as_array().unwrap().len(), 2);
    }
}
