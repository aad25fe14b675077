use crate::shape::TypeDesc;
use crate::value::Value;

/// Conversion failure. Any error aborts the whole call; no partially
/// populated destination is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// Same-named fields whose types are neither identical nor coercible.
    /// A shape mismatch between the two record definitions, not bad data.
    #[error("cannot assign src.{field}({src_type}) to dst.{field}({dst_type})")]
    FieldTypeMismatch {
        field: String,
        src_type: String,
        dst_type: String,
    },

    /// A dynamic value did not fit the type rebuilding from it.
    #[error("expected {expected} value, found {found}")]
    UnexpectedValue { expected: String, found: String },

    #[error("missing field '{field}' in {record} value")]
    MissingField { record: String, field: String },
}

impl ConvertError {
    pub fn mismatch(field: &str, src: &TypeDesc, dst: &TypeDesc) -> Self {
        Self::FieldTypeMismatch {
            field: field.to_string(),
            src_type: src.to_string(),
            dst_type: dst.to_string(),
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: &Value) -> Self {
        Self::UnexpectedValue {
            expected: expected.into(),
            found: found.kind_name().to_string(),
        }
    }

    /// Add context to the error.
    ///
    /// Mismatch messages keep their fixed shape; reconstruction errors get
    /// the context prepended to the record name.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            ConvertError::UnexpectedValue { expected, found } => ConvertError::UnexpectedValue {
                expected: format!("{ctx}: {expected}"),
                found,
            },
            ConvertError::MissingField { record, field } => ConvertError::MissingField {
                record: format!("{ctx}: {record}"),
                field,
            },
            other => other,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, ConvertError::FieldTypeMismatch { .. })
    }
}
