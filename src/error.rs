//! Error types for the experiment registry.
//!
//! Every failure is request-scoped: it is reported to the caller as a
//! `{success: false, error: <message>}` payload and never crashes the server.

use std::path::PathBuf;

use thiserror::Error;

/// The registry operation a failure happened in.
///
/// The same defect maps to different HTTP statuses depending on the operation
/// (type defects are 400 on create but 401 on update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Update,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// One or more field defects, reported together.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("experiment with {field} {value} already exists!")]
    Conflict { field: String, value: String },

    #[error("You must supply the auth_hash to update the experiment!")]
    MissingCredential,

    #[error("You are using an invalid hash for this experiment!")]
    InvalidCredential,

    #[error("You are referencing an experiment with a non-existent id: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl RegistryError {
    pub fn http_status(&self, op: Operation) -> u16 {
        match self {
            Self::Validation(_) => match op {
                Operation::Update => 401,
                Operation::Create | Operation::List => 400,
            },
            Self::Conflict { .. } => 400,
            Self::MissingCredential => 400,
            Self::InvalidCredential => 403,
            Self::NotFound(_) => 400,
            Self::Storage(_) => 500,
        }
    }

    /// Defect list, if this is a validation failure.
    pub fn defects(&self) -> Option<&[String]> {
        match self {
            Self::Validation(defects) => Some(defects),
            _ => None,
        }
    }
}

/// Failures reading or rewriting the persisted experiment set.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed experiment file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace experiment file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    // ── http_status: variant coverage ──────────────────

    #[test]
    fn validation_status_depends_on_operation() {
        let err = RegistryError::Validation(vec!["id is required".into()]);
        assert_eq!(err.http_status(Operation::Create), 400);
        assert_eq!(err.http_status(Operation::Update), 401);
    }

    #[test]
    fn credential_statuses() {
        assert_eq!(
            RegistryError::MissingCredential.http_status(Operation::Update),
            400
        );
        assert_eq!(
            RegistryError::InvalidCredential.http_status(Operation::Update),
            403
        );
    }

    #[test]
    fn not_found_and_conflict_are_bad_request() {
        assert_eq!(
            RegistryError::NotFound("exp9".into()).http_status(Operation::Update),
            400
        );
        let conflict = RegistryError::Conflict {
            field: "id".into(),
            value: "exp1".into(),
        };
        assert_eq!(conflict.http_status(Operation::Create), 400);
    }

    #[test]
    fn storage_is_internal_error() {
        let err = RegistryError::from(StorageError::Unavailable("disk gone".into()));
        assert_eq!(err.http_status(Operation::List), 500);
    }

    // ── Display ──────────────────

    #[test]
    fn validation_message_joins_defects() {
        let err = RegistryError::Validation(vec![
            "id is required".into(),
            "websocket_ip is required".into(),
        ]);
        assert_eq!(err.to_string(), "id is required, websocket_ip is required");
    }

    #[test]
    fn conflict_message_names_field_and_value() {
        let err = RegistryError::Conflict {
            field: "id".into(),
            value: "exp1".into(),
        };
        assert_eq!(err.to_string(), "experiment with id exp1 already exists!");
    }
}
