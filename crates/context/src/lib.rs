//! The annotation context for annota
//!
//! Producers attach typed facts to stable references into documents:
//! - [`Ref`]: path, keyed-element and text-span references
//! - [`FieldType`] / [`Field`]: nominal typed facts
//! - [`Annotation`]: a ref with its merged fields
//! - [`Context`] / [`Transaction`]: the reconciling, reference-counted store
//!   with sub-contexts and change notification

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod context;
pub mod field;
pub mod reference;

pub use annotation::Annotation;
pub use context::{
    ChangeSet, Context, DumpRow, RefChange, Subscriber, SubscriptionId, Transaction, TxnId,
    WeakContext,
};
pub use field::{Field, FieldData, FieldKey, FieldType};
pub use reference::{Ref, RefKind};
