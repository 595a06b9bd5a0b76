//! Reef water-log core: canonical dates, threshold flags and reading-form
//! validation.
//!
//! Everything here is pure and synchronous. The caller supplies "today" and
//! any stored readings; nothing reads the clock, touches storage or logs.

pub mod date;
pub mod form;
pub mod params;
pub mod threshold;

pub use date::{
    compare_by_date, parse_canonical_date, sort_by_date, CalendarDate, DateError, Dated,
};
pub use form::{
    validate_form, FieldError, FieldErrorSet, FieldKey, FormRejected, FormValidation,
    ParameterReading, ReadingForm, ReadingInput,
};
pub use params::{ParameterKey, ParameterValues, UnknownParameter};
pub use threshold::{evaluate, evaluate_reading, Flag, ParameterFlag, Threshold, ThresholdSet};
