use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::engine;
use crate::error::ConvertError;
use crate::overrides::{FieldOverrides, Overrides};
use crate::reflect::Reflect;
use crate::shape::TypeDesc;

/// Entity ↔ DTO conversion, as consumed by a repository layer.
///
/// `ID` is the identifier type of the entity; converters do not inspect
/// it, it only ties a converter to the store it serves.
pub trait Converter<E, D, ID> {
    fn to_entity(&self, dto: &D) -> Result<E, ConvertError>;

    fn to_dto(&self, entity: &E) -> Result<D, ConvertError>;
}

/// Root descriptors of the bound pair, built once on first use.
#[derive(Debug)]
struct Shapes {
    entity: TypeDesc,
    dto: TypeDesc,
}

/// Name-matching converter bound to one (Entity, DTO) pair.
///
/// Build one per pair and reuse it: the converter is immutable after
/// construction and can be shared across threads.
///
/// ```ignore
/// let users = ReflectConverter::<User, UserDto, i64>::new(None);
/// let dto = users.to_dto(&user)?;
/// let back = users.to_entity(&dto)?;
///
/// // Root pointer-ness is mirrored.
/// let maybe = ReflectConverter::<Option<User>, Option<UserDto>, i64>::default();
/// assert_eq!(maybe.to_entity(&None)?, None);
/// ```
pub struct ReflectConverter<E, D, ID> {
    overrides: Overrides<E, D>,
    shapes: OnceLock<Shapes>,
    _id: PhantomData<fn() -> ID>,
}

impl<E, D, ID> ReflectConverter<E, D, ID> {
    /// `None` means plain name matching for every field.
    pub fn new(overrides: Option<Overrides<E, D>>) -> Self {
        Self {
            overrides: overrides.unwrap_or_default(),
            shapes: OnceLock::new(),
            _id: PhantomData,
        }
    }
}

impl<E: Reflect, D: Reflect, ID> ReflectConverter<E, D, ID> {
    fn shapes(&self) -> &Shapes {
        self.shapes.get_or_init(|| Shapes {
            entity: E::type_desc(),
            dto: D::type_desc(),
        })
    }

    pub fn to_entity(&self, dto: &D) -> Result<E, ConvertError> {
        let shapes = self.shapes();
        convert(dto, &shapes.dto, &shapes.entity, &self.overrides.to_entity)
    }

    pub fn to_dto(&self, entity: &E) -> Result<D, ConvertError> {
        let shapes = self.shapes();
        convert(entity, &shapes.entity, &shapes.dto, &self.overrides.to_dto)
    }
}

fn convert<S: Reflect, T: Reflect>(
    src: &S,
    src_ty: &TypeDesc,
    dst_ty: &TypeDesc,
    overrides: &FieldOverrides<S>,
) -> Result<T, ConvertError> {
    let value = engine::convert_root(src, src_ty, dst_ty, Some(overrides)).inspect_err(|e| {
        tracing::debug!(src = %src_ty, dst = %dst_ty, error = %e, "conversion aborted");
    })?;
    T::from_value(value)
}

impl<E: Reflect, D: Reflect, ID> Converter<E, D, ID> for ReflectConverter<E, D, ID> {
    fn to_entity(&self, dto: &D) -> Result<E, ConvertError> {
        ReflectConverter::to_entity(self, dto)
    }

    fn to_dto(&self, entity: &E) -> Result<D, ConvertError> {
        ReflectConverter::to_dto(self, entity)
    }
}

impl<E, D, ID> Default for ReflectConverter<E, D, ID> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<E, D, ID> fmt::Debug for ReflectConverter<E, D, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectConverter")
            .field("entity", &std::any::type_name::<E>())
            .field("dto", &std::any::type_name::<D>())
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Apply a single-value conversion to every item, in order.
///
/// Stops at the first error. An empty input yields `Vec::new()`, which
/// never allocates. Works with any conversion function, not only
/// `ReflectConverter`:
///
/// ```ignore
/// let users = convert_many(&dtos, |dto| converter.to_entity(dto))?;
/// ```
pub fn convert_many<I, S, T, Err, F>(items: I, convert: F) -> Result<Vec<T>, Err>
where
    I: IntoIterator<Item = S>,
    F: FnMut(S) -> Result<T, Err>,
{
    items.into_iter().map(convert).collect()
}

/// Lazy form of [`convert_many`]: converts each item when it is pulled.
pub fn convert_iter<I, S, T, Err, F>(items: I, convert: F) -> impl Iterator<Item = Result<T, Err>>
where
    I: IntoIterator<Item = S>,
    F: FnMut(S) -> Result<T, Err>,
{
    items.into_iter().map(convert)
}
