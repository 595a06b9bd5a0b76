//! Reading entry form: per-field validation and the keystroke sanitizer.
//!
//! Validation is total. Every call recomputes every field error from the
//! current text and never fails; callers decide whether to persist by
//! checking [`FormValidation::is_valid`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::date::{parse_canonical_date, CalendarDate};
use crate::params::{ParameterKey, ParameterValues};

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// A form field: the reading date or one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Date,
    Parameter(ParameterKey),
}

impl FieldKey {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Date => "date",
            FieldKey::Parameter(key) => key.as_str(),
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("use canonical date format (YYYY-MM-DD)")]
    InvalidDate,
    #[error("date cannot be in the future")]
    FutureDate,
    #[error("enter a valid number ≥ 0")]
    InvalidNumber,
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub type FieldErrorSet = BTreeMap<FieldKey, FieldError>;

/// Raw text as entered: one date and zero or more parameter fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingInput {
    pub date: String,
    #[serde(default)]
    pub values: BTreeMap<ParameterKey, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormValidation {
    pub errors: FieldErrorSet,
    pub is_valid: bool,
}

/// A reading that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterReading {
    pub date: CalendarDate,
    pub values: ParameterValues,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("reading rejected: {} field error(s)", .errors.len())]
pub struct FormRejected {
    pub errors: FieldErrorSet,
}

// ------------------------------------------------------------------ //
//  Field rules                                                        //
// ------------------------------------------------------------------ //

pub fn validate_date_field(text: &str, today: CalendarDate) -> Option<FieldError> {
    match parse_canonical_date(text) {
        Err(_) => Some(FieldError::InvalidDate),
        Ok(date) if date > today => Some(FieldError::FutureDate),
        Ok(_) => None,
    }
}

/// Parse numeric field text. `Ok(None)` means the field is blank.
pub fn parse_number_field(text: &str) -> Result<Option<f64>, FieldError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return Err(FieldError::InvalidNumber),
        }
    }
    if digits == 0 || dots > 1 {
        return Err(FieldError::InvalidNumber);
    }

    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(FieldError::InvalidNumber),
    }
}

pub fn validate_number_field(text: &str) -> Option<FieldError> {
    parse_number_field(text).err()
}

/// Keystroke filter for numeric fields: keeps ASCII digits and the first
/// `.`, silently dropping everything else.
pub fn sanitize_numeric_input(raw: &str) -> String {
    let mut seen_dot = false;
    raw.chars()
        .filter(|c| match *c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Recompute every field error for `input`.
pub fn validate_form(input: &ReadingInput, today: CalendarDate) -> FormValidation {
    let mut errors = FieldErrorSet::new();

    if let Some(err) = validate_date_field(&input.date, today) {
        errors.insert(FieldKey::Date, err);
    }
    for (key, text) in &input.values {
        if let Some(err) = validate_number_field(text) {
            errors.insert(FieldKey::Parameter(*key), err);
        }
    }

    let is_valid = errors.is_empty();
    FormValidation { errors, is_valid }
}

impl ReadingInput {
    /// Validate and convert in one step. Blank parameters are dropped; a
    /// reading with only a date is accepted.
    pub fn into_reading(self, today: CalendarDate) -> Result<ParameterReading, FormRejected> {
        let validation = validate_form(&self, today);
        if !validation.is_valid {
            return Err(FormRejected { errors: validation.errors });
        }

        let date = parse_canonical_date(&self.date).map_err(|_| FormRejected {
            errors: FieldErrorSet::from([(FieldKey::Date, FieldError::InvalidDate)]),
        })?;

        let mut values = ParameterValues::new();
        for (key, text) in &self.values {
            if let Ok(Some(v)) = parse_number_field(text) {
                values.insert(*key, v);
            }
        }
        Ok(ParameterReading { date, values })
    }
}

// ------------------------------------------------------------------ //
//  Form state                                                         //
// ------------------------------------------------------------------ //

/// Live entry form. Each edit sanitizes numeric input and revalidates the
/// whole form from scratch.
#[derive(Debug, Clone)]
pub struct ReadingForm {
    input: ReadingInput,
    today: CalendarDate,
    validation: FormValidation,
}

impl ReadingForm {
    /// Empty form with every parameter field blank and the date set to `today`.
    pub fn new(today: CalendarDate) -> Self {
        let input = ReadingInput {
            date: today.to_string(),
            values: ParameterKey::ALL.into_iter().map(|k| (k, String::new())).collect(),
        };
        let validation = validate_form(&input, today);
        Self { input, today, validation }
    }

    pub fn set_date(&mut self, text: &str) {
        self.input.date = text.to_string();
        self.revalidate();
    }

    pub fn set_value(&mut self, key: ParameterKey, raw: &str) {
        self.input.values.insert(key, sanitize_numeric_input(raw));
        self.revalidate();
    }

    pub fn set_today(&mut self, today: CalendarDate) {
        self.today = today;
        self.revalidate();
    }

    pub fn date(&self) -> &str {
        &self.input.date
    }

    pub fn value(&self, key: ParameterKey) -> &str {
        self.input.values.get(&key).map(String::as_str).unwrap_or("")
    }

    pub fn errors(&self) -> &FieldErrorSet {
        &self.validation.errors
    }

    pub fn error(&self, field: FieldKey) -> Option<FieldError> {
        self.validation.errors.get(&field).copied()
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    pub fn submit(&self) -> Result<ParameterReading, FormRejected> {
        self.input.clone().into_reading(self.today)
    }

    fn revalidate(&mut self) {
        self.validation = validate_form(&self.input, self.today);
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
