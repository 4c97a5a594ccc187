//! Instance domain model.
//!
//! # Responsibility
//! - Define the single record shape shared by every model kind.
//! - Provide the `to_dict` / `from_fields` round trip used by persistence.
//!
//! # Invariants
//! - `id` is assigned once and never reassigned through `assign`.
//! - Timestamps carry microsecond precision so they survive the fixed
//!   `YYYY-MM-DDTHH:MM:SS.ffffff` text format unchanged.
//! - `from_fields(kind, &instance.to_dict()) == instance`.

use super::kind::ModelKind;
use super::value::{write_quoted, AttrValue, FieldDiagnostic};
use chrono::{Local, NaiveDateTime, SubsecRound};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Text format for `created_at` / `updated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Reserved key carrying the type tag in serialized form.
pub const CLASS_KEY: &str = "__class__";

const ID_KEY: &str = "id";
const CREATED_AT_KEY: &str = "created_at";
const UPDATED_AT_KEY: &str = "updated_at";
const RESERVED_KEYS: &[&str] = &[ID_KEY, CREATED_AT_KEY, UPDATED_AT_KEY, CLASS_KEY];

/// Reconstruction error for persisted instance fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    MissingField(&'static str),
    InvalidField { field: &'static str, message: String },
    ClassMismatch { expected: ModelKind, found: String },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField { field, message } => {
                write!(f, "invalid value for `{field}`: {message}")
            }
            Self::ClassMismatch { expected, found } => {
                write!(f, "type tag `{found}` does not match `{expected}`")
            }
        }
    }
}

impl Error for ModelError {}

/// One live object of a registered kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    kind: ModelKind,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: BTreeMap<String, AttrValue>,
}

impl Instance {
    /// Creates a fresh instance with a generated id.
    ///
    /// # Invariants
    /// - `created_at == updated_at`.
    /// - No attributes are set; declared defaults apply on read.
    pub fn new(kind: ModelKind) -> Self {
        let now = now();
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes: BTreeMap::new(),
        }
    }

    /// Rebuilds an instance from its serialized mapping.
    ///
    /// Every key except `__class__` is applied. `id`, `created_at` and
    /// `updated_at` are required.
    ///
    /// # Errors
    /// - `MissingField` when a required key is absent.
    /// - `InvalidField` when `id` is not a non-empty string or a timestamp
    ///   does not match `TIMESTAMP_FORMAT`.
    /// - `ClassMismatch` when a present `__class__` names another kind.
    pub fn from_fields(
        kind: ModelKind,
        fields: &BTreeMap<String, AttrValue>,
    ) -> Result<Self, ModelError> {
        if let Some(tag) = fields.get(CLASS_KEY) {
            if tag.as_str() != Some(kind.name()) {
                return Err(ModelError::ClassMismatch {
                    expected: kind,
                    found: tag.to_plain_string(),
                });
            }
        }

        let id = match fields.get(ID_KEY) {
            Some(AttrValue::Str(id)) if !id.trim().is_empty() => id.clone(),
            Some(other) => {
                return Err(ModelError::InvalidField {
                    field: ID_KEY,
                    message: format!("expected non-empty string, got {other}"),
                });
            }
            None => return Err(ModelError::MissingField(ID_KEY)),
        };
        let created_at = required_timestamp(fields, CREATED_AT_KEY)?;
        let updated_at = required_timestamp(fields, UPDATED_AT_KEY)?;

        let attributes = fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            kind,
            id,
            created_at,
            updated_at,
            attributes,
        })
    }

    /// Kind this instance was created as.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// UUID v4 text, immutable after construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Construction time, microsecond precision.
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Time of the last applied mutation; equals `created_at` until then.
    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Registry key `"<Kind>.<id>"`.
    pub fn key(&self) -> String {
        storage_key(self.kind, &self.id)
    }

    /// Explicitly set attributes, excluding `id` and timestamps.
    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    /// Returns the stored value, falling back to the declared default.
    pub fn get(&self, name: &str) -> Option<AttrValue> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.clone());
        }
        self.kind.declared_type(name).map(|ty| ty.default_value())
    }

    /// Sets one attribute, coercing to the declared type when the kind
    /// declares `name`.
    ///
    /// Does not refresh `updated_at`; callers `touch` once per command.
    ///
    /// # Errors
    /// - Rejects `id`, `created_at`, `updated_at` and `__class__`.
    /// - Rejects values with no conversion to the declared type.
    pub fn assign(&mut self, name: &str, value: AttrValue) -> Result<(), FieldDiagnostic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FieldDiagnostic::new(name, "attribute name is empty"));
        }
        if RESERVED_KEYS.contains(&name) {
            return Err(FieldDiagnostic::new(name, "attribute is read-only"));
        }

        let value = match self.kind.declared_type(name) {
            Some(ty) => ty
                .coerce(value)
                .map_err(|reason| FieldDiagnostic::new(name, reason))?,
            None => value,
        };
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    /// Serializes to the persisted mapping form.
    pub fn to_dict(&self) -> BTreeMap<String, AttrValue> {
        let mut dict = self.attributes.clone();
        dict.insert(ID_KEY.to_string(), AttrValue::Str(self.id.clone()));
        dict.insert(
            CREATED_AT_KEY.to_string(),
            AttrValue::Str(format_timestamp(self.created_at)),
        );
        dict.insert(
            UPDATED_AT_KEY.to_string(),
            AttrValue::Str(format_timestamp(self.updated_at)),
        );
        dict.insert(CLASS_KEY.to_string(), AttrValue::Str(self.kind.name().to_string()));
        dict
    }
}

/// `[<Kind>] (<id>) {<attribute mapping>}`
impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ({}) {{", self.kind, self.id)?;
        write!(f, "'{ID_KEY}': ")?;
        write_quoted(f, &self.id)?;
        write!(
            f,
            ", '{CREATED_AT_KEY}': '{}', '{UPDATED_AT_KEY}': '{}'",
            format_timestamp(self.created_at),
            format_timestamp(self.updated_at)
        )?;
        for (name, value) in &self.attributes {
            write!(f, ", ")?;
            write_quoted(f, name)?;
            write!(f, ": {value}")?;
        }
        write!(f, "}}")
    }
}

/// Builds the registry key for `kind` and `id`.
pub fn storage_key(kind: ModelKind, id: &str) -> String {
    format!("{}.{}", kind.name(), id)
}

/// Renders a timestamp in the persisted `TIMESTAMP_FORMAT`.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp written by `format_timestamp`.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

fn required_timestamp(
    fields: &BTreeMap<String, AttrValue>,
    field: &'static str,
) -> Result<NaiveDateTime, ModelError> {
    let raw = fields.get(field).ok_or(ModelError::MissingField(field))?;
    let text = raw.as_str().ok_or_else(|| ModelError::InvalidField {
        field,
        message: format!("expected timestamp string, got {raw}"),
    })?;
    parse_timestamp(text).map_err(|err| ModelError::InvalidField {
        field,
        message: format!("`{text}`: {err}"),
    })
}
