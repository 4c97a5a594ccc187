//! Instance use-case service.
//!
//! # Responsibility
//! - Provide create/show/destroy/list/count/update entry points for the shell.
//! - Apply declared-type coercion and persist after every mutation.
//!
//! # Invariants
//! - A mutation that applies nothing does not touch `updated_at` and does
//!   not rewrite the file.
//! - A mutation whose rewrite fails is rolled back in memory, so the
//!   registry never holds state the file does not.
//! - Service APIs never bypass `ObjectStore` persistence.

use crate::model::instance::{storage_key, Instance};
use crate::model::kind::ModelKind;
use crate::model::value::{AttrValue, FieldDiagnostic};
use crate::storage::{ObjectStore, StorageError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error for instance use cases.
#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    Storage(StorageError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "instance not found: {key}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Result of `create`: new id plus any rejected parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub id: String,
    pub rejected: Vec<FieldDiagnostic>,
}

/// Result of `update`: applied attribute names plus rejected ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub applied: Vec<String>,
    pub rejected: Vec<FieldDiagnostic>,
}

/// Use-case service over an injected registry.
pub struct InstanceService<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> InstanceService<S> {
    /// Wraps an already loaded registry.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying registry.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates and persists a fresh instance.
    ///
    /// # Contract
    /// - Every param is applied through declared-type coercion; failures are
    ///   returned in `rejected` and do not stop the remaining params.
    /// - The instance is registered and the file is rewritten even when
    ///   some params were rejected.
    /// - On a failed rewrite the instance is unregistered again.
    pub fn create(
        &mut self,
        kind: ModelKind,
        params: Vec<(String, AttrValue)>,
    ) -> ServiceResult<CreateOutcome> {
        let mut instance = Instance::new(kind);
        let mut rejected = Vec::new();
        for (name, value) in params {
            if let Err(diagnostic) = instance.assign(&name, value) {
                rejected.push(diagnostic);
            }
        }

        let id = instance.id().to_string();
        let key = instance.key();
        instance.touch();
        self.store.new(instance);
        if let Err(err) = self.store.save() {
            self.store.delete(&key);
            return Err(rolled_back("instance_create", err));
        }

        info!(
            "event=instance_create module=service status=ok kind={} rejected={}",
            kind,
            rejected.len()
        );
        Ok(CreateOutcome { id, rejected })
    }

    /// Returns one instance by kind and id.
    pub fn show(&self, kind: ModelKind, id: &str) -> Option<&Instance> {
        self.store.get(&storage_key(kind, id))
    }

    /// Deletes one instance and persists.
    ///
    /// Returns `false` (without writing) when nothing matched.
    pub fn destroy(&mut self, kind: ModelKind, id: &str) -> ServiceResult<bool> {
        let key = storage_key(kind, id);
        let Some(removed) = self.store.get(&key).cloned() else {
            debug!("event=instance_destroy module=service status=miss kind={kind}");
            return Ok(false);
        };
        self.store.delete(&key);
        if let Err(err) = self.store.save() {
            self.store.new(removed);
            return Err(rolled_back("instance_destroy", err));
        }
        info!("event=instance_destroy module=service status=ok kind={kind}");
        Ok(true)
    }

    /// Lists instances in key order, optionally filtered by kind.
    pub fn list(&self, kind: Option<ModelKind>) -> Vec<&Instance> {
        self.store
            .all()
            .values()
            .filter(|instance| kind.map_or(true, |kind| instance.kind() == kind))
            .collect()
    }

    /// Counts live instances of `kind`.
    pub fn count(&self, kind: ModelKind) -> usize {
        self.store
            .all()
            .values()
            .filter(|instance| instance.kind() == kind)
            .count()
    }

    /// Applies attribute changes to one instance and persists.
    ///
    /// # Errors
    /// - `NotFound` when no instance has that kind and id.
    /// - `Storage` when the rewrite fails.
    pub fn update(
        &mut self,
        kind: ModelKind,
        id: &str,
        changes: Vec<(String, AttrValue)>,
    ) -> ServiceResult<UpdateOutcome> {
        let key = storage_key(kind, id);
        let instance = self
            .store
            .get_mut(&key)
            .ok_or_else(|| ServiceError::NotFound(key.clone()))?;
        let snapshot = instance.clone();

        let mut applied = Vec::new();
        let mut rejected = Vec::new();
        for (name, value) in changes {
            match instance.assign(&name, value) {
                Ok(()) => applied.push(name),
                Err(diagnostic) => rejected.push(diagnostic),
            }
        }

        if !applied.is_empty() {
            instance.touch();
            if let Err(err) = self.store.save() {
                self.store.new(snapshot);
                return Err(rolled_back("instance_update", err));
            }
        }

        info!(
            "event=instance_update module=service status=ok kind={} applied={} rejected={}",
            kind,
            applied.len(),
            rejected.len()
        );
        Ok(UpdateOutcome { applied, rejected })
    }
}

fn rolled_back(event: &str, err: StorageError) -> ServiceError {
    warn!("event={event} module=service status=rolled_back error={err}");
    ServiceError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::{InstanceService, ServiceError};
    use crate::model::kind::ModelKind;
    use crate::model::value::AttrValue;
    use crate::storage::FileStorage;

    fn service() -> (tempfile::TempDir, InstanceService<FileStorage>) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let storage =
            FileStorage::open(dir.path().join("file.json")).expect("empty registry should open");
        (dir, InstanceService::new(storage))
    }

    /// Service whose registry directory is gone, so every rewrite fails.
    fn service_with_vanished_dir() -> (tempfile::TempDir, InstanceService<FileStorage>) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).expect("nested dir should be created");
        let storage =
            FileStorage::open(nested.join("file.json")).expect("empty registry should open");
        let service = InstanceService::new(storage);
        std::fs::remove_dir_all(&nested).expect("nested dir should be removed");
        (dir, service)
    }

    #[test]
    fn update_without_applied_fields_keeps_updated_at() {
        let (_dir, mut service) = service();
        let created = service
            .create(ModelKind::Place, Vec::new())
            .expect("create should persist");
        let before = service
            .show(ModelKind::Place, &created.id)
            .expect("created place should exist")
            .updated_at();

        let outcome = service
            .update(
                ModelKind::Place,
                &created.id,
                vec![("max_guest".to_string(), AttrValue::from("many"))],
            )
            .expect("update with rejected field should still succeed");
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.rejected.len(), 1);

        let after = service
            .show(ModelKind::Place, &created.id)
            .expect("place should still exist")
            .updated_at();
        assert_eq!(before, after);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, mut service) = service();
        let err = service
            .update(ModelKind::User, "nope", Vec::new())
            .expect_err("unknown id should be rejected");
        assert!(matches!(err, ServiceError::NotFound(key) if key == "User.nope"));
    }

    #[test]
    fn destroy_reports_miss_without_error() {
        let (_dir, mut service) = service();
        assert!(!service
            .destroy(ModelKind::City, "missing")
            .expect("miss is not an error"));
    }

    #[test]
    fn failed_create_leaves_registry_unchanged() {
        let (_dir, mut service) = service_with_vanished_dir();
        let err = service
            .create(
                ModelKind::User,
                vec![("email".to_string(), AttrValue::from("a@b.com"))],
            )
            .expect_err("rewrite into a removed dir should fail");

        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(service.count(ModelKind::User), 0);
    }

    #[test]
    fn failed_update_and_destroy_restore_previous_instance() {
        let (dir, mut service) = service();
        let created = service
            .create(
                ModelKind::City,
                vec![("name".to_string(), AttrValue::from("Paris"))],
            )
            .expect("create should persist");
        let before = service
            .show(ModelKind::City, &created.id)
            .expect("created city should exist")
            .clone();
        drop(dir);

        let err = service
            .update(
                ModelKind::City,
                &created.id,
                vec![("name".to_string(), AttrValue::from("Lyon"))],
            )
            .expect_err("rewrite into a removed dir should fail");
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(service.show(ModelKind::City, &created.id), Some(&before));

        service
            .destroy(ModelKind::City, &created.id)
            .expect_err("rewrite into a removed dir should fail");
        assert_eq!(service.show(ModelKind::City, &created.id), Some(&before));
    }
}
