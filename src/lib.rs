//! Experiment registry.
//!
//! Worker processes register themselves (identity plus a reachable websocket
//! endpoint), refresh the registration periodically with the capability token
//! they were issued, and clients list the live workers. Records that go
//! without an update for longer than the configured threshold are swept on the
//! next access.
//!
//! ## Layout
//!
//! | module | role |
//! |--------|------|
//! | [`schema`] | field descriptors (kind, required, unique) |
//! | [`validate`] | schema validation with accumulated defects |
//! | [`store`] | in-memory record set and uniqueness lookups |
//! | [`storage`] | persistence of the record set |
//! | [`sweep`] | expiry sweeping |
//! | [`token`] | capability tokens |
//! | [`service`] | create / list / update orchestration |
//! | [`server`] | axum HTTP surface |
//! | [`config`] | `config.yaml` |

pub mod clock;
pub mod config;
pub mod error;
pub mod schema;
pub mod server;
pub mod service;
pub mod storage;
pub mod store;
pub mod sweep;
pub mod token;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::{Operation, RegistryError, StorageError};
pub use service::{ExperimentRegistry, Registration, RegistryOptions};
pub use storage::{ExperimentStorage, JsonFileStorage, MemoryStorage};
pub use store::{Experiment, RecordStore};
pub use token::AuthToken;
