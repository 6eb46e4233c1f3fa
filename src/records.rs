use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use log::warn;
use serde_json::Value;

use crate::models::{CanonicalRecord, ExerciseEntry};
use crate::record::{normalize, to_stored_json};
use crate::store::Store;

pub fn record_key(member_id: i64, date: NaiveDate) -> String {
    format!("{member_id}_{date}")
}

/// All of one member's records, keyed by date. Keys with an unparsable date
/// suffix or an unparsable value are skipped rather than failing the load;
/// a bad day must not take the calendar down.
pub fn load_member_records(
    store: &dyn Store,
    member_id: i64,
) -> BTreeMap<NaiveDate, CanonicalRecord> {
    let prefix = format!("{member_id}_");
    let mut records = BTreeMap::new();

    for key in store.keys() {
        let Some(suffix) = key.strip_prefix(&prefix) else {
            continue;
        };
        let Ok(date) = suffix.parse::<NaiveDate>() else {
            continue;
        };
        let Some(text) = store.get(&key) else {
            continue;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(raw) => {
                records.insert(date, normalize(Some(&raw), member_id, date));
            }
            Err(err) => {
                warn!("skipping unreadable record at key {key}: {err}");
            }
        }
    }

    records
}

pub fn load_record(store: &dyn Store, member_id: i64, date: NaiveDate) -> Option<CanonicalRecord> {
    let key = record_key(member_id, date);
    let text = store.get(&key)?;
    match serde_json::from_str::<Value>(&text) {
        Ok(raw) => Some(normalize(Some(&raw), member_id, date)),
        Err(err) => {
            warn!("skipping unreadable record at key {key}: {err}");
            None
        }
    }
}

pub fn save_record(store: &mut dyn Store, record: &CanonicalRecord) -> anyhow::Result<()> {
    let key = record_key(record.member_id, record.date);
    store.set(&key, &to_stored_json(record).to_string())
}

pub fn delete_record(store: &mut dyn Store, member_id: i64, date: NaiveDate) -> anyhow::Result<()> {
    store.remove(&record_key(member_id, date))
}

#[derive(serde::Deserialize)]
struct CsvRow {
    member_id: i64,
    date: NaiveDate,
    note: Option<String>,
    rating: Option<u8>,
    emotion: Option<String>,
    exercise_type: Option<String>,
    duration_minutes: Option<u32>,
    medicine_taken: Option<bool>,
    medicine_note: Option<String>,
    notes: Option<String>,
}

/// Import records from a CSV file. Rows sharing a (member, date) pair merge
/// into one record: scalar fields take the last non-empty value, exercises
/// accumulate one entry per row. Returns the number of rows applied.
pub fn import_csv(store: &mut dyn Store, csv_path: &Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut applied = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result.context("malformed CSV row")?;
        let mut record = load_record(store, row.member_id, row.date)
            .unwrap_or_else(|| CanonicalRecord::empty(row.member_id, row.date));

        if let Some(note) = row.note.filter(|n| !n.is_empty()) {
            record.note = note;
        }
        if let Some(rating) = row.rating {
            record.rating = rating.min(5);
        }
        if let Some(emotion) = row.emotion.filter(|e| !e.is_empty()) {
            record.emotion = emotion;
        }
        if let Some(name) = row.exercise_type.filter(|t| !t.trim().is_empty()) {
            record.exercise_entries.push(ExerciseEntry {
                name: name.trim().to_string(),
                duration_minutes: row.duration_minutes.unwrap_or(0),
            });
        }
        if let Some(taken) = row.medicine_taken {
            record.medicine_taken = taken;
        }
        if let Some(medicine_note) = row.medicine_note.filter(|n| !n.is_empty()) {
            record.medicine_note = medicine_note;
        }
        if let Some(notes) = row.notes.filter(|n| !n.is_empty()) {
            record.notes = notes;
        }

        save_record(store, &record)?;
        applied += 1;
    }

    Ok(applied)
}
