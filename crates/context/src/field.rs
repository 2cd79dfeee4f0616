//! Typed fields
//!
//! A [`FieldType<T>`] is a nominal fact type. Its identity is a
//! process-unique [`FieldKey`] handed out at definition time, never the
//! name: two field types called `"Diff"` are still different fields.
//! `field_type.of(value)` produces a type-erased [`Field`] the context can
//! store, compare and print without knowing `T`.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_FIELD_KEY: AtomicU64 = AtomicU64::new(1);

/// Aggregation key of a field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(u64);

impl FieldKey {
    fn next() -> Self {
        FieldKey(NEXT_FIELD_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Values that can be stored in a field
///
/// Implemented for every `Debug + PartialEq + Send + Sync + 'static` type.
pub trait FieldData: Any + fmt::Debug + Send + Sync {
    /// Structural equality against another erased value
    fn eq_dyn(&self, other: &dyn FieldData) -> bool;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;
}

impl<T> FieldData for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn eq_dyn(&self, other: &dyn FieldData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A nominal fact type carrying values of type `T`
///
/// # Example
///
/// ```
/// use annota_context::FieldType;
///
/// let color: FieldType<String> = FieldType::define("Color");
/// let field = color.of("red".to_string());
/// assert_eq!(field.name(), "Color");
/// assert_eq!(field.downcast::<String>().map(String::as_str), Some("red"));
/// ```
pub struct FieldType<T> {
    key: FieldKey,
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FieldType<T>
where
    T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
{
    /// Define a new field type with a fresh key
    pub fn define(name: impl Into<Arc<str>>) -> Self {
        FieldType {
            key: FieldKey::next(),
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// Wrap a value into a storable field
    pub fn of(&self, value: T) -> Field {
        Field {
            key: self.key,
            name: Arc::clone(&self.name),
            value: Arc::new(value),
        }
    }

    /// Extract this type's value from a field, if the field is of this type
    pub fn extract(&self, field: &Field) -> Option<T> {
        if field.key != self.key {
            return None;
        }
        field.downcast::<T>().cloned()
    }
}

impl<T> FieldType<T> {
    /// The aggregation key
    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for FieldType<T> {
    fn clone(&self) -> Self {
        FieldType {
            key: self.key,
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FieldType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish()
    }
}

/// A type-erased field value tagged with its field type
#[derive(Clone)]
pub struct Field {
    key: FieldKey,
    name: Arc<str>,
    value: Arc<dyn FieldData>,
}

impl Field {
    /// Key of the field type that produced this value
    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// Name of the field type that produced this value
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the value as `T`
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        (*self.value).as_any().downcast_ref::<T>()
    }

    /// Debug rendering of the value
    pub fn value_debug(&self) -> String {
        format!("{:?}", &*self.value)
    }

    /// Whether this value was produced by `field_type`
    pub fn is<T>(&self, field_type: &FieldType<T>) -> bool {
        self.key == field_type.key
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && (*self.value).eq_dyn(&*other.value)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, &*self.value)
    }
}
