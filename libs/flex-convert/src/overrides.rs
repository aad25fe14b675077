use std::collections::HashMap;
use std::fmt;

use crate::reflect::Reflect;
use crate::shape::TypeDesc;
use crate::value::Value;

type OverrideFn<S> = Box<dyn Fn(&S) -> Value + Send + Sync>;

/// Custom producer for one destination field.
///
/// Receives the whole source root value. The result is coerced to the
/// destination field type with the regular rules, starting from the
/// producer's own type.
pub struct FieldOverride<S> {
    ty: fn() -> TypeDesc,
    produce: OverrideFn<S>,
}

impl<S> FieldOverride<S> {
    pub fn type_desc(&self) -> TypeDesc {
        (self.ty)()
    }

    pub fn produce(&self, src: &S) -> Value {
        (self.produce)(src)
    }
}

/// Override table for one conversion direction, keyed by destination
/// field name.
pub struct FieldOverrides<S> {
    fields: HashMap<String, FieldOverride<S>>,
}

impl<S> FieldOverrides<S> {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Register `produce` for the destination field `name`. A later
    /// registration for the same name replaces the earlier one.
    pub fn insert<T, F>(&mut self, name: impl Into<String>, produce: F)
    where
        T: Reflect,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.fields.insert(
            name.into(),
            FieldOverride {
                ty: T::type_desc,
                produce: Box::new(move |src| produce(src).to_value()),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&FieldOverride<S>> {
        self.fields.get(name)
    }

    /// Registered destination field names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S> Default for FieldOverrides<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for FieldOverrides<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/// Per-field overrides for both directions of an (Entity, DTO) pair.
///
/// ```ignore
/// let overrides = Overrides::<User, UserDto>::new()
///     .entity_field("display_name", |dto: &UserDto| dto.name.to_uppercase())
///     .dto_field("name", |user: &User| user.display_name.to_lowercase());
/// ```
pub struct Overrides<E, D> {
    pub(crate) to_entity: FieldOverrides<D>,
    pub(crate) to_dto: FieldOverrides<E>,
}

impl<E, D> Overrides<E, D> {
    pub fn new() -> Self {
        Self {
            to_entity: FieldOverrides::new(),
            to_dto: FieldOverrides::new(),
        }
    }

    /// Override an entity field when converting DTO → entity.
    pub fn entity_field<T, F>(mut self, name: impl Into<String>, produce: F) -> Self
    where
        T: Reflect,
        F: Fn(&D) -> T + Send + Sync + 'static,
    {
        self.to_entity.insert(name, produce);
        self
    }

    /// Override a DTO field when converting entity → DTO.
    pub fn dto_field<T, F>(mut self, name: impl Into<String>, produce: F) -> Self
    where
        T: Reflect,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.to_dto.insert(name, produce);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_entity.is_empty() && self.to_dto.is_empty()
    }
}

impl<E, D> Default for Overrides<E, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, D> fmt::Debug for Overrides<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("to_entity", &self.to_entity)
            .field("to_dto", &self.to_dto)
            .finish()
    }
}
