//! Name-matching structural conversion between entity and DTO records.
//!
//! Records describe themselves with `#[derive(Record)]`; a
//! [`ReflectConverter`] bound to an (Entity, DTO) pair then copies fields by
//! name, coercing nullable wrappers, `Option` pointers, nested records and
//! `Vec`s along the way.

pub mod converter;
pub mod engine;
pub mod error;
pub mod nullable;
pub mod overrides;
pub mod reflect;
pub mod shape;
pub mod value;

pub use flex_convert_derive::Record;

pub use converter::{Converter, ReflectConverter, convert_iter, convert_many};
pub use error::ConvertError;
pub use nullable::{
    NullBool, NullByte, NullFloat64, NullInt16, NullInt32, NullInt64, NullString, NullTime,
    Nullable,
};
pub use overrides::{FieldOverrides, Overrides};
pub use reflect::Reflect;
pub use shape::{FieldDesc, RecordDesc, ScalarKind, TypeDesc};
pub use value::{RecordValue, Value};
