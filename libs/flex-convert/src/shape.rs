use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::value::{RecordValue, Value};

/// Supported scalar kinds. Each maps to exactly one `Value` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Time,
    Date,
    Uuid,
}

impl ScalarKind {
    /// Rust type name, as shown in mismatch errors.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
            ScalarKind::Time => "DateTime<Utc>",
            ScalarKind::Date => "NaiveDate",
            ScalarKind::Uuid => "Uuid",
        }
    }

    /// The kind's `Default` value.
    pub fn zero(self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::I8 => Value::I8(0),
            ScalarKind::I16 => Value::I16(0),
            ScalarKind::I32 => Value::I32(0),
            ScalarKind::I64 => Value::I64(0),
            ScalarKind::U8 => Value::U8(0),
            ScalarKind::U16 => Value::U16(0),
            ScalarKind::U32 => Value::U32(0),
            ScalarKind::U64 => Value::U64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Char => Value::Char(char::default()),
            ScalarKind::String => Value::String(String::new()),
            ScalarKind::Time => Value::Time(DateTime::<Utc>::default()),
            ScalarKind::Date => Value::Date(NaiveDate::default()),
            ScalarKind::Uuid => Value::Uuid(Uuid::nil()),
        }
    }
}

/// Reflective description of a convertible type.
///
/// Built by `Reflect::type_desc()`. Record fields hold a constructor
/// instead of a nested descriptor so self-referential records stay finite.
#[derive(Debug, Clone)]
pub enum TypeDesc {
    Scalar(ScalarKind),
    /// `Nullable<T>` — validity flag plus value.
    Nullable(Box<TypeDesc>),
    /// `Option<T>` / `Option<Box<T>>`. `Box<T>` alone is transparent.
    Pointer(Box<TypeDesc>),
    /// `Vec<T>`.
    Slice(Box<TypeDesc>),
    Record(RecordDesc),
}

impl TypeDesc {
    /// The value a destination of this type takes when nothing is assigned.
    pub fn zero(&self) -> Value {
        match self {
            TypeDesc::Scalar(kind) => kind.zero(),
            TypeDesc::Nullable(inner) => Value::Nullable {
                valid: false,
                value: Box::new(inner.zero()),
            },
            TypeDesc::Pointer(_) => Value::Null,
            TypeDesc::Slice(_) => Value::List(Vec::new()),
            TypeDesc::Record(record) => Value::Record(
                record
                    .fields
                    .iter()
                    .map(|field| (field.name, field.desc().zero()))
                    .collect::<RecordValue>(),
            ),
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeDesc::Pointer(_))
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeDesc::Scalar(a), TypeDesc::Scalar(b)) => a == b,
            (TypeDesc::Nullable(a), TypeDesc::Nullable(b))
            | (TypeDesc::Pointer(a), TypeDesc::Pointer(b))
            | (TypeDesc::Slice(a), TypeDesc::Slice(b)) => a == b,
            (TypeDesc::Record(a), TypeDesc::Record(b)) => a.path == b.path,
            _ => false,
        }
    }
}

impl Eq for TypeDesc {}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Scalar(kind) => f.write_str(kind.name()),
            TypeDesc::Nullable(inner) => write!(f, "Nullable<{inner}>"),
            TypeDesc::Pointer(inner) => write!(f, "Option<{inner}>"),
            TypeDesc::Slice(inner) => write!(f, "Vec<{inner}>"),
            TypeDesc::Record(record) => f.write_str(record.name),
        }
    }
}

/// Record shape: type identity plus fields in declaration order.
#[derive(Debug, Clone)]
pub struct RecordDesc {
    /// Struct identifier, for messages.
    pub name: &'static str,
    /// Fully qualified type path. Identity of the record type.
    pub path: &'static str,
    pub fields: Vec<FieldDesc>,
}

impl RecordDesc {
    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// A single named field of a record.
#[derive(Debug, Clone, Copy)]
pub struct FieldDesc {
    pub name: &'static str,
    /// Deferred so that recursive record types can describe themselves.
    pub ty: fn() -> TypeDesc,
}

impl FieldDesc {
    pub fn desc(&self) -> TypeDesc {
        (self.ty)()
    }
}
