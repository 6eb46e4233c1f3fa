use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exercise performed on a given day. Entries normalized from the
/// earliest legacy record shape carry a zero duration (the shape recorded
/// no time), which counts for calendar display but not for totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseEntry {
    pub name: String,
    pub duration_minutes: u32,
}

/// Canonical in-memory form of one day's record for one member, after
/// legacy-shape normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub member_id: i64,
    pub date: NaiveDate,
    pub note: String,
    pub exercise_entries: Vec<ExerciseEntry>,
    pub emotion: String,
    pub rating: u8,
    pub medicine_taken: bool,
    pub medicine_note: String,
    pub notes: String,
}

impl CanonicalRecord {
    pub fn empty(member_id: i64, date: NaiveDate) -> Self {
        CanonicalRecord {
            member_id,
            date,
            note: String::new(),
            exercise_entries: Vec::new(),
            emotion: String::new(),
            rating: 0,
            medicine_taken: false,
            medicine_note: String::new(),
            notes: String::new(),
        }
    }

    /// A record counts as present (calendar indicator, editable-as-existing)
    /// iff it carries at least one of: a note, an exercise entry, a rating,
    /// or free-text notes. Emotion or medication alone does not qualify.
    pub fn is_meaningful(&self) -> bool {
        !self.note.is_empty()
            || !self.exercise_entries.is_empty()
            || self.rating > 0
            || !self.notes.is_empty()
    }
}

/// Total time for one exercise type within a month, in order of first
/// appearance across the month's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseTotal {
    pub name: String,
    pub total_minutes: u32,
}

impl ExerciseTotal {
    pub fn hours(&self) -> u32 {
        self.total_minutes / 60
    }

    pub fn minutes(&self) -> u32 {
        self.total_minutes % 60
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub rated_day_count: usize,
    /// Mean of positive ratings, rounded half-up to one decimal. None when
    /// no record in the month carries a rating.
    pub average_rating: Option<f64>,
    pub exercise_totals: Vec<ExerciseTotal>,
    pub total_exercise_minutes: u32,
    /// Empty when no encouragement tier was reached.
    pub encouragement_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: i64,
    pub name: String,
    pub relation: String,
    pub avatar: Option<String>,
    pub age: Option<u32>,
    pub conditions: Vec<Condition>,
}
