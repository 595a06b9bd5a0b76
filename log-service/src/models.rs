//! HTTP request/response models for the log service's REST API.

use chrono::{DateTime, Utc};
use reef_core::threshold::FlagKind;
use reef_core::{FieldErrorSet, ParameterFlag, ParameterKey, ParameterValues};
use serde::{Deserialize, Serialize};

use crate::store::StoredReading;

// ------------------------------------------------------------------ //
//  Inbound (client → service)                                         //
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query string for `GET /readings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListReadingsQuery {
    #[serde(default)]
    pub order: SortOrder,
}

// ------------------------------------------------------------------ //
//  Outbound (service → client)                                        //
// ------------------------------------------------------------------ //

/// One entry of the parameter catalogue.
#[derive(Debug, Serialize)]
pub struct ParameterInfo {
    pub key: ParameterKey,
    pub label: &'static str,
    pub unit: &'static str,
}

impl From<ParameterKey> for ParameterInfo {
    fn from(key: ParameterKey) -> Self {
        Self {
            key,
            label: key.label(),
            unit: key.unit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagView {
    pub parameter: ParameterKey,
    pub kind: FlagKind,
    pub value: f64,
    pub message: String,
}

impl From<&ParameterFlag> for FlagView {
    fn from(pf: &ParameterFlag) -> Self {
        Self {
            parameter: pf.key,
            kind: pf.flag.kind(),
            value: pf.flag.value(),
            message: pf.to_string(),
        }
    }
}

/// A stored reading together with its threshold flags.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    pub date: String,
    pub values: ParameterValues,
    pub updated_at: DateTime<Utc>,
    pub flags: Vec<FlagView>,
}

impl ReadingView {
    pub fn new(reading: StoredReading, flags: &[ParameterFlag]) -> Self {
        Self {
            date: reading.date,
            values: reading.values,
            updated_at: reading.updated_at,
            flags: flags.iter().map(FlagView::from).collect(),
        }
    }
}

/// Response for `POST /readings/validate`.
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: FieldErrorSet,
}

/// Response for `GET /dashboard/warnings`.
#[derive(Debug, Serialize)]
pub struct WarningsResponse {
    pub date: Option<String>,
    pub flags: Vec<FlagView>,
}
