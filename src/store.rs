//! In-memory record store.
//!
//! Holds the live experiments in insertion order. The store is owned by the
//! registry service and only ever touched while its lock is held.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{LAST_UPDATED, SENSITIVE_FIELDS};
use crate::token::AuthToken;

/// One registered worker: its schema fields plus the server-managed token and stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub auth_hash: AuthToken,
    pub last_updated: i64,
}

impl Experiment {
    pub fn new(fields: Map<String, Value>, auth_hash: AuthToken, last_updated: i64) -> Self {
        Self {
            fields,
            auth_hash,
            last_updated,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Seconds elapsed since the last create/update, as of `now`. Saturates
    /// for stamps far outside the clock's range.
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_updated)
    }

    /// Read view: every field plus `last_updated`, sensitive fields removed.
    pub fn redacted(&self) -> Map<String, Value> {
        let mut view: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(name, _)| !SENSITIVE_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        view.insert(LAST_UPDATED.to_string(), Value::from(self.last_updated));
        view
    }
}

/// On-disk layout of the experiment file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExperimentFile {
    pub experiments: Vec<Experiment>,
}

#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    experiments: Vec<Experiment>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_experiments(experiments: Vec<Experiment>) -> Self {
        Self { experiments }
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.iter()
    }

    pub fn as_slice(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn get(&self, index: usize) -> Option<&Experiment> {
        self.experiments.get(index)
    }

    /// First experiment, in store order, whose `name` field equals `value`.
    pub fn find_by_field(&self, name: &str, value: &Value) -> Option<(usize, &Experiment)> {
        self.experiments
            .iter()
            .enumerate()
            .find(|(_, exp)| exp.field(name) == Some(value))
    }

    pub fn push(&mut self, experiment: Experiment) {
        self.experiments.push(experiment);
    }

    /// Swap in `experiment` at `index`, returning the previous record.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn replace(&mut self, index: usize, experiment: Experiment) -> Experiment {
        std::mem::replace(&mut self.experiments[index], experiment)
    }

    /// # Panics
    /// If `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Experiment {
        self.experiments.remove(index)
    }

    /// Remove every experiment for which `expired` holds, keeping survivors in
    /// order. Returns the removed records.
    pub fn remove_where(
        &mut self,
        mut expired: impl FnMut(&Experiment) -> bool,
    ) -> Vec<Experiment> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.experiments)
            .into_iter()
            .partition(|exp| expired(exp));
        self.experiments = kept;
        removed
    }
}
