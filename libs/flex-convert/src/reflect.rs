use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::ConvertError;
use crate::shape::{ScalarKind, TypeDesc};
use crate::value::Value;

/// Reflective access to a convertible type.
///
/// Records implement this with `#[derive(Record)]`; scalars, `Option`,
/// `Box`, `Vec` and `Nullable` are covered here.
///
/// `from_value` must accept anything the engine produces for
/// `type_desc()`, which is exactly what `to_value` produces for the same
/// type.
pub trait Reflect: Sized {
    fn type_desc() -> TypeDesc;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_desc() -> TypeDesc {
                    TypeDesc::Scalar(ScalarKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$kind(self.clone())
                }

                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::$kind(v) => Ok(v),
                        other => Err(ConvertError::unexpected(ScalarKind::$kind.name(), &other)),
                    }
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    DateTime<Utc> => Time,
    NaiveDate => Date,
    Uuid => Uuid,
}

/// Nil-able pointer: `None` is `Value::Null`, `Some` is the target's value.
///
/// Nested options collapse: `Some(None)` of an `Option<Option<T>>` rebuilds
/// as `None`.
impl<T: Reflect> Reflect for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// Heap indirection only: never nil, so it matches like `T`.
impl<T: Reflect> Reflect for Box<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn to_value(&self) -> Value {
        T::to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Slice(Box::new(T::type_desc()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        value
            .into_list("Vec")?
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_value(item).map_err(|e| e.with_context(format!("[{index}]")))
            })
            .collect()
    }
}
