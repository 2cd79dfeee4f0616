//! Link facts: a location pointing at another ref

use annota_context::{Annotation, Context, FieldType, Ref};
use once_cell::sync::Lazy;

/// Target of a link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkValue {
    /// Where the link points
    pub target: Ref,
}

/// Marks a ref as a link to another ref
pub static LINK: Lazy<FieldType<LinkValue>> = Lazy::new(|| FieldType::define("Link"));

/// Link annotations on `reference` or inside it
pub fn links_from(context: &Context, reference: &Ref) -> Vec<Annotation> {
    context
        .get_all_with(&LINK)
        .into_iter()
        .filter(|annotation| annotation.reference().is_part_of(reference))
        .collect()
}

/// Targets of the links on `reference` or inside it, in contribution order
pub fn link_targets(context: &Context, reference: &Ref) -> Vec<Ref> {
    links_from(context, reference)
        .iter()
        .filter_map(|annotation| annotation.get(&LINK))
        .map(|link| link.target)
        .collect()
}
