use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConvertError;
use crate::reflect::Reflect;
use crate::shape::TypeDesc;
use crate::value::Value;

/// Optional scalar as storage layers usually model it: a value plus a
/// validity flag.
///
/// When `valid` is false the stored `value` is meaningless and is never
/// read by the converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    pub value: T,
    pub valid: bool,
}

pub type NullBool = Nullable<bool>;
pub type NullByte = Nullable<u8>;
pub type NullInt16 = Nullable<i16>;
pub type NullInt32 = Nullable<i32>;
pub type NullInt64 = Nullable<i64>;
pub type NullFloat64 = Nullable<f64>;
pub type NullString = Nullable<String>;
pub type NullTime = Nullable<DateTime<Utc>>;

impl<T> Nullable<T> {
    /// A valid wrapper holding `value`.
    pub fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn as_option(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }

    pub fn into_option(self) -> Option<T> {
        self.valid.then_some(self.value)
    }
}

impl<T: Default> Nullable<T> {
    /// An invalid wrapper with a zero value.
    pub fn null() -> Self {
        Self {
            value: T::default(),
            valid: false,
        }
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::new(value),
            None => Self::null(),
        }
    }
}

impl<T> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.into_option()
    }
}

impl<T: Reflect> Reflect for Nullable<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Nullable(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::Nullable {
            valid: self.valid,
            value: Box::new(self.value.to_value()),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Nullable { valid, value } => Ok(Self {
                value: T::from_value(*value)?,
                valid,
            }),
            other => Err(ConvertError::unexpected(Self::type_desc().to_string(), &other)),
        }
    }
}

// Transport form is a plain optional value; the validity flag is implied.
impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
