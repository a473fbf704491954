// src/transform.rs
//! Per-row field normalization.
//!
//! A [`Transformer`] is an ordered list of [`FieldSpec`]s. Applying it to a raw
//! row does three things, in this order:
//!
//! 1. **Rename**: each spec's source field (`old_name`, or `name` when there is
//!    no old name) is moved to `name`.
//! 2. **Prune**: every raw field no spec asked for is dropped.
//! 3. **Update**: each spec's updater, if any, rewrites the value.
//!
//! The output row lists its fields in spec order. A source field missing from
//! the raw row means the upstream schema changed, so it is an error rather than
//! a silently short row.

use std::fmt;

use thiserror::Error;

use crate::record::{Record, Value};

pub type Updater = Box<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("field `{field}` (needed for `{target}`) is missing from the fetched row")]
    MissingField { field: String, target: String },
}

pub struct FieldSpec {
    pub name: String,
    pub old_name: Option<String>,
    updater: Option<Updater>,
}

impl FieldSpec {
    /// Keep `name` as-is.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), old_name: None, updater: None }
    }

    /// Take the value from `old_name` in the raw row.
    pub fn from_field(mut self, old_name: impl Into<String>) -> Self {
        self.old_name = Some(old_name.into());
        self
    }

    pub fn with(mut self, updater: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.updater = Some(Box::new(updater));
        self
    }

    fn source(&self) -> &str {
        self.old_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("old_name", &self.old_name)
            .field("updater", &self.updater.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Transformer {
    specs: Vec<FieldSpec>,
}

impl Transformer {
    pub fn new() -> Self { Self::default() }

    pub fn from_specs(specs: Vec<FieldSpec>) -> Self { Self { specs } }

    pub fn push(mut self, spec: FieldSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Keep a field under its raw name.
    pub fn field(self, name: &str) -> Self { self.push(FieldSpec::new(name)) }

    /// Rename `old_name` to `name`.
    pub fn rename(self, name: &str, old_name: &str) -> Self {
        self.push(FieldSpec::new(name).from_field(old_name))
    }

    /// Rename (when `old_name` is given) and rewrite the value.
    pub fn update(
        self,
        name: &str,
        old_name: Option<&str>,
        updater: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        let spec = FieldSpec::new(name).with(updater);
        match old_name {
            Some(old) => self.push(spec.from_field(old)),
            None => self.push(spec),
        }
    }

    /// Output field names, in output order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn apply(&self, raw: &Record) -> Result<Record, TransformError> {
        // Rename + prune: the output only ever holds spec targets.
        let mut out = Record::with_capacity(self.specs.len());
        for spec in &self.specs {
            let value = raw.get(spec.source()).cloned().ok_or_else(|| {
                TransformError::MissingField { field: s!(spec.source()), target: spec.name.clone() }
            })?;
            out.insert(spec.name.as_str(), value);
        }

        // Update
        for spec in &self.specs {
            if let Some(update) = &spec.updater {
                if let Some(slot) = out.get_mut(&spec.name) {
                    let old = std::mem::replace(slot, Value::Null);
                    *slot = update(old);
                }
            }
        }

        Ok(out)
    }

    /// Transform a whole batch, stopping at the first bad row.
    pub fn apply_all(&self, rows: &[Record]) -> Result<Vec<Record>, TransformError> {
        rows.iter().map(|r| self.apply(r)).collect()
    }
}

/// Stock value updaters used by the bundled datasets.
pub mod updaters {
    use crate::record::Value;

    /// Lower-case text values; other kinds pass through.
    pub fn lowercase(v: Value) -> Value {
        match v {
            Value::Text(s) => Value::Text(s.to_lowercase()),
            other => other,
        }
    }

    /// Keep the trimmed text before the first `sep`.
    pub fn split_first(sep: &'static str) -> impl Fn(Value) -> Value + Send + Sync + 'static {
        move |v| match v {
            Value::Text(s) => {
                let head = s.split(sep).next().unwrap_or_default();
                Value::Text(head.trim().to_owned())
            }
            other => other,
        }
    }
}
