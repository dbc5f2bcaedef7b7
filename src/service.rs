//! Registration service: create, list, update and sweep.
//!
//! Every operation takes the registry lock for its whole duration, sweeps
//! first, and persists before releasing the lock. Check-then-mutate sequences
//! ("no such id yet, append" / "token matches, replace") are therefore atomic,
//! and persistence writes happen in the same order as the mutations.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::{RegistryError, Result};
use crate::schema::{Schema, AUTH_HASH};
use crate::storage::ExperimentStorage;
use crate::store::{Experiment, RecordStore};
use crate::sweep::ExpirySweeper;
use crate::token::AuthToken;
use crate::validate::{UnknownFields, ValidationMode, Validator};

/// Default auto-expiry: two hours.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct RegistryOptions {
    pub schema: Schema,
    pub max_age: Duration,
    pub unknown_fields: UnknownFields,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            schema: Schema::experiments(),
            max_age: DEFAULT_MAX_AGE,
            unknown_fields: UnknownFields::default(),
        }
    }
}

/// Outcome of a successful create or update. The token is only ever handed
/// out here; reads never return it.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: String,
    pub auth_hash: AuthToken,
}

pub struct ExperimentRegistry {
    store: Mutex<RecordStore>,
    storage: Arc<dyn ExperimentStorage>,
    clock: Arc<dyn Clock>,
    validator: Validator,
    sweeper: ExpirySweeper,
}

impl ExperimentRegistry {
    /// Load the persisted experiment set and build the registry around it.
    pub fn open(
        storage: Arc<dyn ExperimentStorage>,
        clock: Arc<dyn Clock>,
        options: RegistryOptions,
    ) -> Result<Self> {
        let experiments = storage.load()?;
        Ok(Self {
            store: Mutex::new(RecordStore::from_experiments(experiments)),
            storage,
            clock,
            validator: Validator::new(options.schema, options.unknown_fields),
            sweeper: ExpirySweeper::new(options.max_age),
        })
    }

    pub fn schema(&self) -> &Schema {
        self.validator.schema()
    }

    /// Register a new experiment and issue its first token.
    pub async fn create(&self, input: &Map<String, Value>) -> Result<Registration> {
        let mut store = self.store.lock().await;
        let now = self.clock.unix_seconds();
        self.sweep_locked(&mut store, now)?;

        let fields = self.validator.validate(input, ValidationMode::Create)?;

        for spec in self.schema().unique_fields() {
            let Some(value) = fields.get(spec.name).filter(|v| !v.is_null()) else {
                continue;
            };
            if store.find_by_field(spec.name, value).is_some() {
                return Err(conflict(spec.name, value));
            }
        }

        let experiment = Experiment::new(fields, AuthToken::generate(), now);
        let registration = registration_of(&experiment);
        store.push(experiment);

        if let Err(e) = self.persist(&store) {
            let last = store.len() - 1;
            store.remove(last);
            return Err(e);
        }

        debug!("Registered experiment {}", registration.id);
        Ok(registration)
    }

    /// Every live experiment in store order, with sensitive fields removed.
    pub async fn list(&self) -> Result<Vec<Map<String, Value>>> {
        let mut store = self.store.lock().await;
        let now = self.clock.unix_seconds();
        self.sweep_locked(&mut store, now)?;
        Ok(store.iter().map(Experiment::redacted).collect())
    }

    /// Apply a partial update to the experiment named by `id`, authorized by
    /// its current `auth_hash`. Rotates the token on success.
    pub async fn update(&self, input: &Map<String, Value>) -> Result<Registration> {
        let mut store = self.store.lock().await;
        let now = self.clock.unix_seconds();
        self.sweep_locked(&mut store, now)?;

        let supplied = input
            .get(AUTH_HASH)
            .ok_or(RegistryError::MissingCredential)?;
        let id = input
            .get("id")
            .ok_or_else(|| RegistryError::Validation(vec!["id is required".to_string()]))?;
        let (index, current) = store
            .find_by_field("id", id)
            .ok_or_else(|| RegistryError::NotFound(display_value(id)))?;

        if !supplied
            .as_str()
            .is_some_and(|token| current.auth_hash.matches(token))
        {
            return Err(RegistryError::InvalidCredential);
        }

        let changes = self.validator.validate(input, ValidationMode::Update)?;

        for spec in self.schema().unique_fields() {
            let Some(value) = changes.get(spec.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = store
                .iter()
                .enumerate()
                .any(|(i, other)| i != index && other.field(spec.name) == Some(value));
            if taken {
                return Err(conflict(spec.name, value));
            }
        }

        let mut updated = current.clone();
        updated.fields.extend(changes);
        updated.auth_hash = AuthToken::generate();
        updated.last_updated = now;
        let registration = registration_of(&updated);

        let previous = store.replace(index, updated);
        if let Err(e) = self.persist(&store) {
            store.replace(index, previous);
            return Err(e);
        }

        debug!("Updated experiment {}", registration.id);
        Ok(registration)
    }

    /// Run the expiry sweep on its own. Returns the number of records removed.
    pub async fn sweep(&self) -> Result<usize> {
        let mut store = self.store.lock().await;
        let now = self.clock.unix_seconds();
        self.sweep_locked(&mut store, now)
    }

    fn sweep_locked(&self, store: &mut RecordStore, now: i64) -> Result<usize> {
        let removed = self.sweeper.sweep(store, now);
        if !removed.is_empty() {
            self.persist(store)?;
        }
        Ok(removed.len())
    }

    fn persist(&self, store: &RecordStore) -> Result<()> {
        self.storage.save(store.as_slice()).map_err(|e| {
            error!("Failed to persist experiments: {e}");
            RegistryError::Storage(e)
        })
    }
}

fn registration_of(experiment: &Experiment) -> Registration {
    Registration {
        id: experiment.id().unwrap_or_default().to_string(),
        auth_hash: experiment.auth_hash,
    }
}

fn conflict(field: &str, value: &Value) -> RegistryError {
    RegistryError::Conflict {
        field: field.to_string(),
        value: display_value(value),
    }
}

/// Strings are shown bare, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
