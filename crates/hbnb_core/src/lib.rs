//! Core logic for the HBNB object shell.
//! This crate owns the model, the JSON registry and the command shell; the
//! binary crate only wires them to the terminal.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod shell;
pub mod storage;

pub use config::{ConfigError, ShellConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::instance::{Instance, ModelError, CLASS_KEY, TIMESTAMP_FORMAT};
pub use model::kind::ModelKind;
pub use model::literal::LiteralError;
pub use model::value::{AttrType, AttrValue, FieldDiagnostic};
pub use service::instance_service::{
    CreateOutcome, InstanceService, ServiceError, ServiceResult, UpdateOutcome,
};
pub use shell::error::CommandError;
pub use shell::{Shell, ShellControl, DEFAULT_PROMPT};
pub use storage::{FileStorage, ObjectStore, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
