//! Field-copy engine shared by both conversion directions.
//!
//! Walks the destination shape, pulls the same-named field out of the
//! source value and coerces it:
//!
//! - identical types: moved as-is (the source value is already an owned copy)
//! - `Option<T>` source: `None` → destination zero, `Some` → recurse on target
//! - `Option<T>` destination: recurse on target, `Some` is implicit
//! - `Nullable<T>` ↔ `T`: unwrap to zero when invalid, wrap as valid
//! - `Nullable<T>` → `Option<T>`: invalid → `None`
//! - record ↔ record: fresh field walk
//! - `Vec` ↔ `Vec`: element-wise
//!
//! Anything else is a `FieldTypeMismatch` and aborts the whole call.

use std::collections::HashSet;

use crate::error::ConvertError;
use crate::overrides::FieldOverrides;
use crate::reflect::Reflect;
use crate::shape::{RecordDesc, TypeDesc};
use crate::value::{RecordValue, Value};

/// Label used for mismatches detected on the root value itself.
pub const ROOT_FIELD: &str = "<root>";

/// The field being resolved, with its declared types on both sides.
/// Mismatches report these rather than the dereferenced inner types.
struct FieldCtx<'a> {
    name: &'a str,
    src: &'a TypeDesc,
    dst: &'a TypeDesc,
}

impl FieldCtx<'_> {
    fn mismatch(&self) -> ConvertError {
        ConvertError::mismatch(self.name, self.src, self.dst)
    }
}

/// Convert a root value of type `S` into the dynamic value of `dst_ty`.
///
/// A `None` root short-circuits to the destination zero (`None` when the
/// destination root is a pointer). Overrides apply to the fields of the
/// root record only, since each override receives the whole root value.
pub fn convert_root<S: Reflect>(
    src: &S,
    src_ty: &TypeDesc,
    dst_ty: &TypeDesc,
    overrides: Option<&FieldOverrides<S>>,
) -> Result<Value, ConvertError> {
    let value = src.to_value();
    if value.is_null() && src_ty.is_pointer() {
        return Ok(dst_ty.zero());
    }

    let overrides = overrides.filter(|table| !table.is_empty());
    if let (Some(table), TypeDesc::Record(s), TypeDesc::Record(d)) =
        (overrides, deref(src_ty), deref(dst_ty))
    {
        for name in table.names().filter(|name| d.field(name).is_none()) {
            tracing::debug!(dst = d.name, field = name, "override names no destination field");
        }
        let lookup: Lookup<'_> = &|name: &str| {
            table
                .get(name)
                .map(|field| (field.type_desc(), field.produce(src)))
        };
        return convert_record(value, s, d, Some(lookup));
    }

    if let Some(table) = overrides {
        tracing::debug!(
            src = %src_ty,
            dst = %dst_ty,
            count = table.len(),
            "overrides ignored, root is not a record pair"
        );
    }

    let ctx = FieldCtx {
        name: ROOT_FIELD,
        src: src_ty,
        dst: dst_ty,
    };
    coerce(value, src_ty, dst_ty, &ctx)
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<(TypeDesc, Value)>;

fn convert_record(
    value: Value,
    src: &RecordDesc,
    dst: &RecordDesc,
    overrides: Option<Lookup<'_>>,
) -> Result<Value, ConvertError> {
    let mut src_fields = value.into_record(src.name)?;
    let mut out = RecordValue::with_capacity(dst.fields.len());

    for field in &dst.fields {
        let dst_ty = field.desc();

        if let Some((override_ty, produced)) = overrides.and_then(|lookup| lookup(field.name)) {
            tracing::trace!(record = dst.name, field = field.name, "using field override");
            let ctx = FieldCtx {
                name: field.name,
                src: &override_ty,
                dst: &dst_ty,
            };
            out.push(field.name, coerce(produced, &override_ty, &dst_ty, &ctx)?);
            continue;
        }

        let Some(src_field) = src.field(field.name) else {
            tracing::trace!(
                src = src.name,
                dst = dst.name,
                field = field.name,
                "no source field, leaving zero value"
            );
            out.push(field.name, dst_ty.zero());
            continue;
        };

        let src_ty = src_field.desc();
        let src_value = src_fields.take(src.name, field.name)?;
        let ctx = FieldCtx {
            name: field.name,
            src: &src_ty,
            dst: &dst_ty,
        };
        let converted = coerce(src_value, &src_ty, &dst_ty, &ctx)
            .map_err(|e| e.with_context(format!("{}.{}", dst.name, field.name)))?;
        out.push(field.name, converted);
    }

    Ok(Value::Record(out))
}

fn coerce(
    value: Value,
    src: &TypeDesc,
    dst: &TypeDesc,
    ctx: &FieldCtx<'_>,
) -> Result<Value, ConvertError> {
    match (src, dst) {
        _ if src == dst => Ok(value),
        (TypeDesc::Pointer(inner), _) => {
            if value.is_null() {
                Ok(dst.zero())
            } else {
                coerce(value, inner, dst, ctx)
            }
        }
        (TypeDesc::Nullable(wrapped), TypeDesc::Pointer(inner)) if wrapped == inner => match value {
            Value::Nullable { valid: false, .. } => Ok(Value::Null),
            present => coerce(present, src, inner, ctx),
        },
        (_, TypeDesc::Pointer(inner)) => coerce(value, src, inner, ctx),
        (TypeDesc::Nullable(inner), _) if **inner == *dst => match value {
            Value::Nullable { valid: true, value } => Ok(*value),
            Value::Nullable { valid: false, .. } => Ok(dst.zero()),
            other => Err(ConvertError::unexpected(src.to_string(), &other)),
        },
        (_, TypeDesc::Nullable(inner)) if **inner == *src => Ok(Value::Nullable {
            valid: true,
            value: Box::new(value),
        }),
        (TypeDesc::Record(s), TypeDesc::Record(d)) => convert_record(value, s, d, None),
        (TypeDesc::Slice(s), TypeDesc::Slice(d)) => {
            // Element shapes are checked up front so empty lists fail too.
            check(s, d, ctx, &mut HashSet::new())?;
            value
                .into_list(&src.to_string())?
                .into_iter()
                .map(|item| coerce(item, s, d, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        _ => Err(ctx.mismatch()),
    }
}

/// Static form of `coerce`: fails when no value of `src` could convert
/// to `dst`, whatever the data.
///
/// `visited` holds record pairs already being checked, which cuts the
/// recursion of self-referential records.
fn check(
    src: &TypeDesc,
    dst: &TypeDesc,
    ctx: &FieldCtx<'_>,
    visited: &mut HashSet<(&'static str, &'static str)>,
) -> Result<(), ConvertError> {
    match (src, dst) {
        _ if src == dst => Ok(()),
        (TypeDesc::Pointer(inner), _) => check(inner, dst, ctx, visited),
        (TypeDesc::Nullable(wrapped), TypeDesc::Pointer(inner)) if wrapped == inner => Ok(()),
        (_, TypeDesc::Pointer(inner)) => check(src, inner, ctx, visited),
        (TypeDesc::Nullable(inner), _) if **inner == *dst => Ok(()),
        (_, TypeDesc::Nullable(inner)) if **inner == *src => Ok(()),
        (TypeDesc::Slice(s), TypeDesc::Slice(d)) => check(s, d, ctx, visited),
        (TypeDesc::Record(s), TypeDesc::Record(d)) => {
            if !visited.insert((s.path, d.path)) {
                return Ok(());
            }
            for field in &d.fields {
                let Some(src_field) = s.field(field.name) else {
                    continue;
                };
                let (src_ty, dst_ty) = (src_field.desc(), field.desc());
                let field_ctx = FieldCtx {
                    name: field.name,
                    src: &src_ty,
                    dst: &dst_ty,
                };
                check(&src_ty, &dst_ty, &field_ctx, visited)?;
            }
            Ok(())
        }
        _ => Err(ctx.mismatch()),
    }
}

/// Strip pointer layers down to the pointee type.
fn deref(ty: &TypeDesc) -> &TypeDesc {
    match ty {
        TypeDesc::Pointer(inner) => deref(inner),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nullable::{NullBool, NullInt64, Nullable};

    fn convert<S: Reflect, D: Reflect>(src: &S) -> Result<D, ConvertError> {
        let value = convert_root(src, &S::type_desc(), &D::type_desc(), None)?;
        D::from_value(value)
    }

    #[test]
    fn invalid_wrapper_yields_zero_regardless_of_payload() {
        let stale = Nullable { value: 42i64, valid: false };
        assert_eq!(convert::<NullInt64, i64>(&stale).unwrap(), 0);
        assert_eq!(convert::<NullInt64, i64>(&NullInt64::new(42)).unwrap(), 42);
    }

    #[test]
    fn scalar_wraps_as_valid() {
        assert_eq!(convert::<bool, NullBool>(&false).unwrap(), NullBool::new(false));
    }

    #[test]
    fn nil_pointer_root_stays_nil() {
        assert_eq!(convert::<Option<i64>, Option<NullInt64>>(&None).unwrap(), None);
        assert_eq!(
            convert::<Option<i64>, NullInt64>(&None).unwrap(),
            NullInt64::null()
        );
    }

    #[test]
    fn option_and_wrapper_map_validity() {
        assert_eq!(
            convert::<NullInt64, Option<i64>>(&Nullable { value: 5, valid: false }).unwrap(),
            None
        );
        assert_eq!(convert::<NullInt64, Option<i64>>(&NullInt64::new(5)).unwrap(), Some(5));
        assert_eq!(convert::<Option<i64>, NullInt64>(&Some(5)).unwrap(), NullInt64::new(5));
    }

    #[test]
    fn pointer_to_wrapper_round_trips_through_scalar() {
        let dto: Option<Box<NullBool>> = convert(&true).unwrap();
        assert_eq!(dto, Some(Box::new(NullBool::new(true))));
        assert!(convert::<Option<Box<NullBool>>, bool>(&dto).unwrap());
        assert!(!convert::<Option<Box<NullBool>>, bool>(&None).unwrap());
    }

    #[test]
    fn slices_convert_element_wise() {
        let src = vec![Some(NullInt64::new(1)), None, Some(NullInt64::null())];
        let out: Vec<Option<i64>> = convert(&src).unwrap();
        assert_eq!(out, vec![Some(1), None, None]);
    }

    #[test]
    fn empty_slices_are_checked_by_shape() {
        let err = convert::<Vec<i32>, Vec<String>>(&Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot assign src.<root>(Vec<i32>) to dst.<root>(Vec<String>)"
        );

        let out: Vec<NullInt64> = convert(&Vec::<Option<i64>>::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn scalar_root_ignores_overrides() {
        let mut table = FieldOverrides::<i64>::new();
        table.insert("value", |n: &i64| n + 1);

        let value = convert_root(&4i64, &i64::type_desc(), &i64::type_desc(), Some(&table));
        assert_eq!(value.unwrap(), Value::I64(4));
    }

    #[test]
    fn mismatch_reports_declared_types() {
        let err = convert::<Vec<i32>, Vec<i64>>(&vec![1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot assign src.<root>(Vec<i32>) to dst.<root>(Vec<i64>)"
        );
    }
}
