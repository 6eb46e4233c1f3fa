use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};

mod exercises;
mod members;
mod models;
mod record;
mod records;
mod report;
mod store;
mod summary;

use exercises::ExerciseCatalog;
use members::MemberDirectory;
use models::{CanonicalRecord, Condition, ExerciseEntry, FamilyMember};
use store::JsonFileStore;

#[derive(Parser)]
#[command(name = "girogy")]
#[command(about = "Family health log tracker over a local key-value store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the default family and exercise catalog
    Init,
    /// Save or update one day's record for a member
    Record {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        note: Option<String>,
        /// Exercise entry as NAME:MINUTES (repeatable, replaces stored entries)
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        #[arg(long)]
        emotion: Option<String>,
        /// Star rating, 0 to 5 (0 clears it)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        rating: Option<u8>,
        #[arg(long)]
        medicine_taken: Option<bool>,
        #[arg(long)]
        medicine_note: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one day's record
    Show {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Delete one day's record
    Delete {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Print the monthly summary for a member
    Summary {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Write a markdown monthly report
    Report {
        #[arg(long)]
        member: i64,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Import records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Manage the family directory
    Members {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Manage the exercise catalog
    Exercises {
        #[command(subcommand)]
        action: ExerciseAction,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        /// Defaults to the name when omitted
        #[arg(long)]
        relation: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Chronic condition (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,
    },
    /// Update a member; omitted fields stay as they are
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        relation: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Chronic condition (repeatable, replaces the stored list when given)
        #[arg(long = "condition")]
        conditions: Vec<String>,
    },
    Remove {
        #[arg(long)]
        id: i64,
    },
    /// Move a member to a new position in the list
    Move {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        position: usize,
    },
}

#[derive(Subcommand)]
enum ExerciseAction {
    List,
    Add {
        #[arg(long)]
        name: String,
    },
    Rename {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    Remove {
        #[arg(long)]
        name: String,
    },
}

fn parse_exercise_arg(text: &str) -> anyhow::Result<ExerciseEntry> {
    let (name, minutes) = match text.rsplit_once(':') {
        Some((name, minutes)) => {
            let minutes = minutes
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid minutes in exercise '{text}'"))?;
            (name, minutes)
        }
        None => (text, 0),
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("exercise name missing in '{text}'");
    }
    Ok(ExerciseEntry {
        name: name.to_string(),
        duration_minutes: minutes,
    })
}

fn require_member(store: &mut JsonFileStore, id: i64) -> anyhow::Result<FamilyMember> {
    MemberDirectory::new(store)
        .find(id)
        .with_context(|| format!("no family member with id {id}"))
}

fn target_month(year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let today = Utc::now().date_naive();
    (
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}

fn print_record(member: &FamilyMember, record: &CanonicalRecord) {
    println!("{} on {}", member.name, record.date);
    if !record.note.is_empty() {
        println!("note: {}", record.note);
    }
    for entry in &record.exercise_entries {
        println!("exercise: {} {}m", entry.name, entry.duration_minutes);
    }
    if !record.emotion.is_empty() {
        println!("emotion: {}", record.emotion);
    }
    if record.rating > 0 {
        println!("rating: {}/5", record.rating);
    }
    if record.medicine_taken {
        if record.medicine_note.is_empty() {
            println!("medicine: taken");
        } else {
            println!("medicine: taken ({})", record.medicine_note);
        }
    }
    if !record.notes.is_empty() {
        println!("notes: {}", record.notes);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store_path =
        std::env::var("GIROGY_STORE").unwrap_or_else(|_| "girogy.json".to_string());
    let mut store = JsonFileStore::open(Path::new(&store_path))?;

    match cli.command {
        Commands::Init => {
            let member_count = MemberDirectory::new(&mut store).list().len();
            let exercise_count = ExerciseCatalog::new(&mut store).list().len();
            println!(
                "Store ready at {store_path}: {member_count} members, {exercise_count} exercises."
            );
        }
        Commands::Record {
            member,
            date,
            note,
            exercises,
            emotion,
            rating,
            medicine_taken,
            medicine_note,
            notes,
        } => {
            require_member(&mut store, member)?;
            let mut record = records::load_record(&store, member, date)
                .unwrap_or_else(|| CanonicalRecord::empty(member, date));

            if let Some(note) = note {
                record.note = note;
            }
            if !exercises.is_empty() {
                record.exercise_entries = exercises
                    .iter()
                    .map(|text| parse_exercise_arg(text))
                    .collect::<anyhow::Result<Vec<_>>>()?;
            }
            if let Some(emotion) = emotion {
                record.emotion = emotion;
            }
            if let Some(rating) = rating {
                record.rating = rating;
            }
            if let Some(taken) = medicine_taken {
                record.medicine_taken = taken;
            }
            if let Some(medicine_note) = medicine_note {
                record.medicine_note = medicine_note;
            }
            if let Some(notes) = notes {
                record.notes = notes;
            }

            records::save_record(&mut store, &record)?;
            println!("Saved record for member {member} on {date}.");
        }
        Commands::Show { member, date } => {
            let member = require_member(&mut store, member)?;
            match records::load_record(&store, member.id, date) {
                Some(record) if record.is_meaningful() => print_record(&member, &record),
                _ => println!("No record for {} on {date}.", member.name),
            }
        }
        Commands::Delete { member, date } => {
            records::delete_record(&mut store, member, date)?;
            println!("Deleted record for member {member} on {date}.");
        }
        Commands::Summary { member, year, month } => {
            let member = require_member(&mut store, member)?;
            let (year, month) = target_month(year, month);
            let member_records = records::load_member_records(&store, member.id);
            let monthly = summary::summarize(&member_records, year, month);
            report::print_summary(&member, year, month, &monthly);
        }
        Commands::Report { member, year, month, out } => {
            let member = require_member(&mut store, member)?;
            let (year, month) = target_month(year, month);
            let member_records = records::load_member_records(&store, member.id);
            let markdown = report::build_report(&member, year, month, &member_records);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let applied = records::import_csv(&mut store, &csv)?;
            println!("Applied {applied} rows from {}.", csv.display());
        }
        Commands::Members { action } => {
            let mut directory = MemberDirectory::new(&mut store);
            match action {
                MemberAction::List => {
                    for member in directory.list() {
                        let age = member
                            .age
                            .map(|age| format!(", age {age}"))
                            .unwrap_or_default();
                        let conditions = if member.conditions.is_empty() {
                            String::new()
                        } else {
                            let names: Vec<&str> =
                                member.conditions.iter().map(|c| c.name.as_str()).collect();
                            format!(" [{}]", names.join(", "))
                        };
                        println!(
                            "{} {} ({}){age}{conditions}",
                            member.id, member.name, member.relation
                        );
                    }
                }
                MemberAction::Add { name, relation, age, conditions } => {
                    let relation = relation.unwrap_or_else(|| name.clone());
                    let conditions = conditions
                        .into_iter()
                        .map(|name| Condition { name })
                        .collect();
                    let member = directory.add(&name, &relation, age, conditions)?;
                    println!("Added {} with id {}.", member.name, member.id);
                }
                MemberAction::Update { id, name, relation, age, conditions } => {
                    let conditions = if conditions.is_empty() {
                        None
                    } else {
                        Some(conditions.into_iter().map(|name| Condition { name }).collect())
                    };
                    let updated = directory.update(
                        id,
                        name.as_deref(),
                        relation.as_deref(),
                        age,
                        conditions,
                    )?;
                    if updated {
                        println!("Updated member {id}.");
                    } else {
                        println!("No member with id {id}.");
                    }
                }
                MemberAction::Remove { id } => {
                    if directory.remove(id)? {
                        println!("Removed member {id}.");
                    } else {
                        println!("No member with id {id}.");
                    }
                }
                MemberAction::Move { id, position } => {
                    if directory.reorder(id, position)? {
                        println!("Moved member {id} to position {position}.");
                    } else {
                        println!("No member with id {id}.");
                    }
                }
            }
        }
        Commands::Exercises { action } => {
            let mut catalog = ExerciseCatalog::new(&mut store);
            match action {
                ExerciseAction::List => {
                    for name in catalog.list() {
                        println!("{name}");
                    }
                }
                ExerciseAction::Add { name } => {
                    if catalog.add(&name)? {
                        println!("Added {name}.");
                    } else {
                        println!("{name} is blank or already in the catalog.");
                    }
                }
                ExerciseAction::Rename { from, to } => {
                    if catalog.rename(&from, &to)? {
                        println!("Renamed {from} to {to}.");
                    } else {
                        println!("Cannot rename {from} to {to}.");
                    }
                }
                ExerciseAction::Remove { name } => {
                    catalog.remove(&name)?;
                    println!("Removed {name}.");
                }
            }
        }
    }

    Ok(())
}
