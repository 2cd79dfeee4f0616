//! Annotations: a ref plus the fields visible for it

use crate::field::{Field, FieldKey, FieldType};
use crate::reference::Ref;
use annota_core::error::Result;
use annota_core::json::JsonValue;
use smallvec::SmallVec;
use std::fmt;

/// One field value with its global contribution sequence number
#[derive(Clone)]
pub(crate) struct Contribution {
    pub(crate) seq: u64,
    pub(crate) field: Field,
}

/// A [`Ref`] together with the fields currently merged onto it
///
/// Returned by context reads, and used as input for
/// [`Context::replace`](crate::Context::replace) and as the output of
/// producers such as the diff engine.
///
/// When several producers contribute the same field type, every value is
/// kept in contribution order; [`Annotation::get`] returns the last one.
#[derive(Clone)]
pub struct Annotation {
    reference: Ref,
    contributions: SmallVec<[Contribution; 2]>,
}

impl Annotation {
    /// An annotation with no fields
    pub fn new(reference: Ref) -> Self {
        Annotation {
            reference,
            contributions: SmallVec::new(),
        }
    }

    pub(crate) fn from_contributions(
        reference: Ref,
        mut contributions: SmallVec<[Contribution; 2]>,
    ) -> Self {
        contributions.sort_by_key(|c| c.seq);
        Annotation {
            reference,
            contributions,
        }
    }

    /// Add a field (builder pattern)
    pub fn with(mut self, field: Field) -> Self {
        let seq = self.contributions.len() as u64;
        self.contributions.push(Contribution { seq, field });
        self
    }

    /// The annotated ref
    pub fn reference(&self) -> &Ref {
        &self.reference
    }

    /// Consume the annotation, keeping the ref
    pub fn into_reference(self) -> Ref {
        self.reference
    }

    /// Last-written value of `field_type`
    pub fn get<T>(&self, field_type: &FieldType<T>) -> Option<T>
    where
        T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
    {
        self.contributions
            .iter()
            .rev()
            .find_map(|c| field_type.extract(&c.field))
    }

    /// Every live value of `field_type`, in contribution order
    pub fn get_all<T>(&self, field_type: &FieldType<T>) -> Vec<T>
    where
        T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
    {
        self.contributions
            .iter()
            .filter_map(|c| field_type.extract(&c.field))
            .collect()
    }

    /// Whether any value of `field_type` is present
    pub fn has<T>(&self, field_type: &FieldType<T>) -> bool {
        self.has_key(field_type.key())
    }

    pub(crate) fn has_key(&self, key: FieldKey) -> bool {
        self.contributions.iter().any(|c| c.field.key() == key)
    }

    /// All field values, in contribution order
    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.contributions.iter().map(|c| &c.field)
    }

    /// Whether no field is present
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Current value of the annotated location
    pub fn value(&self) -> Result<JsonValue> {
        self.reference.value()
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("ref", &self.reference)
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish()
    }
}
