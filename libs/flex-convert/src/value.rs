use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::ConvertError;

/// Dynamic view of a record-shaped value.
///
/// Strategy by type:
/// - Scalars: one variant per supported Rust scalar, copied eagerly
/// - `Nullable<T>`: validity flag plus the boxed inner value
/// - `Option<T>`: `Null` for `None`, the target's own value for `Some`
/// - `Vec<T>`: `List`, elements converted individually
/// - Records: `Record`, fields in declaration order
///
/// A value carries no type information of its own. The matching
/// `TypeDesc` travels next to it through the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Time(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),

    Nullable { valid: bool, value: Box<Value> },

    /// Recursive — elements converted individually.
    List(Vec<Value>),
    Record(RecordValue),

    /// Nil pointer (`None`).
    Null,
}

impl Value {
    /// Short variant name, used in reconstruction errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "String",
            Value::Time(_) => "DateTime<Utc>",
            Value::Date(_) => "NaiveDate",
            Value::Uuid(_) => "Uuid",
            Value::Nullable { .. } => "Nullable",
            Value::List(_) => "List",
            Value::Record(_) => "Record",
            Value::Null => "Null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Unwrap a record value, or fail naming the record that expected it.
    pub fn into_record(self, expected: &str) -> Result<RecordValue, ConvertError> {
        match self {
            Value::Record(record) => Ok(record),
            other => Err(ConvertError::unexpected(expected, &other)),
        }
    }

    pub fn into_list(self, expected: &str) -> Result<Vec<Value>, ConvertError> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(ConvertError::unexpected(expected, &other)),
        }
    }
}

/// Named field values of one record, in declaration order.
///
/// Names only, no types. Types live in the record's `RecordDesc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordValue {
    fields: Vec<(&'static str, Value)>,
}

impl RecordValue {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Remove a field and return its value. Used by derived reconstruction,
    /// which consumes every field exactly once.
    pub fn take(&mut self, record: &str, name: &str) -> Result<Value, ConvertError> {
        let index = self
            .fields
            .iter()
            .position(|(field, _)| *field == name)
            .ok_or_else(|| ConvertError::MissingField {
                record: record.to_string(),
                field: name.to_string(),
            })?;
        Ok(self.fields.swap_remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    /// Split into name/value pairs, keeping declaration order.
    pub fn into_fields(self) -> Vec<(&'static str, Value)> {
        self.fields
    }
}

impl FromIterator<(&'static str, Value)> for RecordValue {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
