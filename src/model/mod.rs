//! In-memory representation of catalog records.
//!
//! Ingestion produces [`Record`]s; everything downstream reads them through
//! [`Record::field`], which treats undeclared fields as [`FieldValue::Absent`]
//! so that "missing" is always an explicit, scoreable state.

mod record;

pub use record::{FieldValue, Record};
