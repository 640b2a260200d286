//! Record change planner
//!
//! Computes the (name, type, value) a record should end up with after a
//! one-shot change. Planning is pure: the public IP, when needed, is
//! looked up by the caller and handed in.

use crate::config::{ChangeRecordConfig, RecordType};
use crate::error::{Error, Result};
use crate::traits::Record;
use std::fmt;

/// What to do with the record's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueChange {
    /// Keep the value the record currently has
    Keep,
    /// Set a literal value
    Literal(String),
    /// Set the caller's public IP, discovered at planning time
    PublicIp,
}

/// A validated change plan for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredChange {
    /// New record name, if renaming
    pub name: Option<String>,
    /// New record type, if retyping
    pub record_type: Option<RecordType>,
    pub value: ValueChange,
}

impl DesiredChange {
    /// A plan that changes nothing
    pub fn unchanged() -> Self {
        Self {
            name: None,
            record_type: None,
            value: ValueChange::Keep,
        }
    }

    /// Whether planning needs the current public IP
    pub fn needs_public_ip(&self) -> bool {
        self.value == ValueChange::PublicIp
    }
}

impl Default for DesiredChange {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl TryFrom<&ChangeRecordConfig> for DesiredChange {
    type Error = Error;

    /// `new_*` fields are only read when their `change_*` flag is set, and
    /// are taken as given (empty included); the provider has the final say.
    fn try_from(config: &ChangeRecordConfig) -> Result<Self> {
        let name = config.change_name.then(|| config.new_name.clone());

        let record_type = if config.change_type {
            Some(config.new_type.parse::<RecordType>()?)
        } else {
            None
        };

        let value = match (config.change_value, config.change_value_to_wanip) {
            (false, _) => ValueChange::Keep,
            (true, true) => ValueChange::PublicIp,
            (true, false) => ValueChange::Literal(config.new_value.clone()),
        };

        Ok(Self {
            name,
            record_type,
            value,
        })
    }
}

/// The record as it will be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRecord {
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
}

/// Compute the target record from the current one and a change plan
///
/// # Parameters
///
/// - `current`: The record as the provider reports it
/// - `current_type`: The type the record was looked up with
/// - `change`: The change plan
/// - `public_ip`: The discovered public IP; required when
///   `change.needs_public_ip()`
pub fn plan(
    current: &Record,
    current_type: RecordType,
    change: &DesiredChange,
    public_ip: Option<&str>,
) -> Result<PlannedRecord> {
    let name = change
        .name
        .clone()
        .unwrap_or_else(|| current.name.clone());

    let record_type = change.record_type.unwrap_or(current_type);

    let value = match &change.value {
        ValueChange::Keep => current.value.clone(),
        ValueChange::Literal(value) => value.clone(),
        ValueChange::PublicIp => public_ip
            .ok_or_else(|| Error::Other("public IP required to plan this change".to_string()))?
            .to_string(),
    };

    Ok(PlannedRecord {
        name,
        record_type,
        value,
    })
}

impl fmt::Display for PlannedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_type, self.value)
    }
}
