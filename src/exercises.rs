use log::warn;

use crate::store::Store;

pub const EXERCISES_KEY: &str = "girogy_exercises";

const DEFAULT_EXERCISES: [&str; 6] = [
    "Walking",
    "Stretching",
    "Strength",
    "Cardio",
    "Yoga",
    "Rehab",
];

/// Exercise-type catalog over an injected store. Records reference catalog
/// entries by name only; nothing validates that a stored record's type still
/// exists here.
pub struct ExerciseCatalog<'a> {
    store: &'a mut dyn Store,
}

impl<'a> ExerciseCatalog<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        ExerciseCatalog { store }
    }

    /// The catalog, seeding the defaults on first read. An unreadable stored
    /// list degrades to the defaults without overwriting it.
    pub fn list(&mut self) -> Vec<String> {
        match self.store.get(EXERCISES_KEY) {
            Some(text) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(names) => names,
                Err(err) => {
                    warn!("stored exercise list is unreadable, using defaults: {err}");
                    defaults()
                }
            },
            None => {
                let names = defaults();
                if let Err(err) = self.save(&names) {
                    warn!("failed to seed default exercises: {err}");
                }
                names
            }
        }
    }

    /// Add a catalog entry. Returns false for blank or duplicate names.
    pub fn add(&mut self, name: &str) -> anyhow::Result<bool> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        let mut names = self.list();
        if names.iter().any(|existing| existing == trimmed) {
            return Ok(false);
        }
        names.push(trimmed.to_string());
        self.save(&names)?;
        Ok(true)
    }

    /// Rename a catalog entry. Returns false for blank names or when the new
    /// name already belongs to a different entry.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> anyhow::Result<bool> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        let mut names = self.list();
        if names.iter().any(|existing| existing == trimmed) && trimmed != old_name {
            return Ok(false);
        }
        for name in names.iter_mut() {
            if name == old_name {
                *name = trimmed.to_string();
            }
        }
        self.save(&names)?;
        Ok(true)
    }

    pub fn remove(&mut self, name: &str) -> anyhow::Result<()> {
        let mut names = self.list();
        names.retain(|existing| existing != name);
        self.save(&names)
    }

    fn save(&mut self, names: &[String]) -> anyhow::Result<()> {
        self.store.set(EXERCISES_KEY, &serde_json::to_string(names)?)
    }
}

fn defaults() -> Vec<String> {
    DEFAULT_EXERCISES.iter().map(|name| (*name).to_string()).collect()
}
