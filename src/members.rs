use chrono::Utc;
use log::warn;
use serde::Deserialize;

use crate::models::{Condition, FamilyMember};
use crate::store::Store;

pub const MEMBERS_KEY: &str = "familyMembers";

/// Stored member descriptor, lenient about the fields older app versions
/// omitted or named differently (`diseases` predates `conditions`).
#[derive(Deserialize)]
struct StoredMember {
    id: Option<i64>,
    name: Option<String>,
    relation: Option<String>,
    avatar: Option<String>,
    age: Option<u32>,
    conditions: Option<Vec<LenientCondition>>,
    diseases: Option<Vec<LenientCondition>>,
}

#[derive(Deserialize)]
struct LenientCondition {
    #[serde(default)]
    name: String,
}

fn fix_up(stored: StoredMember, index: usize) -> FamilyMember {
    let name = stored.name.unwrap_or_default();
    let relation = stored.relation.unwrap_or_else(|| name.clone());
    let conditions = stored
        .conditions
        .or(stored.diseases)
        .unwrap_or_default()
        .into_iter()
        .map(|c| Condition { name: c.name })
        .collect();
    FamilyMember {
        id: stored.id.unwrap_or(index as i64 + 1),
        name,
        relation,
        avatar: stored.avatar,
        age: stored.age,
        conditions,
    }
}

fn default_members() -> Vec<FamilyMember> {
    ["Me", "Dad", "Mom"]
        .iter()
        .enumerate()
        .map(|(index, name)| FamilyMember {
            id: index as i64 + 1,
            name: (*name).to_string(),
            relation: (*name).to_string(),
            avatar: None,
            age: None,
            conditions: Vec::new(),
        })
        .collect()
}

/// Family-member directory over an injected store.
pub struct MemberDirectory<'a> {
    store: &'a mut dyn Store,
}

impl<'a> MemberDirectory<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        MemberDirectory { store }
    }

    /// The directory, seeding the default family on first use. An unreadable
    /// stored list degrades to the defaults without overwriting it.
    pub fn list(&mut self) -> Vec<FamilyMember> {
        match self.store.get(MEMBERS_KEY) {
            Some(text) => match serde_json::from_str::<Vec<StoredMember>>(&text) {
                Ok(stored) => stored
                    .into_iter()
                    .enumerate()
                    .map(|(index, member)| fix_up(member, index))
                    .collect(),
                Err(err) => {
                    warn!("stored member list is unreadable, using defaults: {err}");
                    default_members()
                }
            },
            None => {
                let members = default_members();
                if let Err(err) = self.save(&members) {
                    warn!("failed to seed default members: {err}");
                }
                members
            }
        }
    }

    pub fn find(&mut self, id: i64) -> Option<FamilyMember> {
        self.list().into_iter().find(|member| member.id == id)
    }

    pub fn add(
        &mut self,
        name: &str,
        relation: &str,
        age: Option<u32>,
        conditions: Vec<Condition>,
    ) -> anyhow::Result<FamilyMember> {
        let mut members = self.list();
        let mut id = Utc::now().timestamp_millis();
        while members.iter().any(|member| member.id == id) {
            id += 1;
        }
        let member = FamilyMember {
            id,
            name: name.trim().to_string(),
            relation: relation.trim().to_string(),
            avatar: None,
            age,
            conditions,
        };
        members.push(member.clone());
        self.save(&members)?;
        Ok(member)
    }

    /// Update the given fields of a member, leaving the rest (avatar
    /// included) untouched. Returns false when the id is unknown.
    pub fn update(
        &mut self,
        id: i64,
        name: Option<&str>,
        relation: Option<&str>,
        age: Option<u32>,
        conditions: Option<Vec<Condition>>,
    ) -> anyhow::Result<bool> {
        let mut members = self.list();
        let Some(member) = members.iter_mut().find(|member| member.id == id) else {
            return Ok(false);
        };
        if let Some(name) = name {
            member.name = name.trim().to_string();
        }
        if let Some(relation) = relation {
            member.relation = relation.trim().to_string();
        }
        if let Some(age) = age {
            member.age = Some(age);
        }
        if let Some(conditions) = conditions {
            member.conditions = conditions;
        }
        self.save(&members)?;
        Ok(true)
    }

    pub fn remove(&mut self, id: i64) -> anyhow::Result<bool> {
        let mut members = self.list();
        let before = members.len();
        members.retain(|member| member.id != id);
        if members.len() == before {
            return Ok(false);
        }
        self.save(&members)?;
        Ok(true)
    }

    /// Move a member to the given zero-based position, clamped to the list.
    pub fn reorder(&mut self, id: i64, position: usize) -> anyhow::Result<bool> {
        let mut members = self.list();
        let Some(from) = members.iter().position(|member| member.id == id) else {
            return Ok(false);
        };
        let member = members.remove(from);
        let to = position.min(members.len());
        members.insert(to, member);
        self.save(&members)?;
        Ok(true)
    }

    fn save(&mut self, members: &[FamilyMember]) -> anyhow::Result<()> {
        self.store.set(MEMBERS_KEY, &serde_json::to_string(members)?)
    }
}
