//! Structural diff between two JSON snapshots
//!
//! Produces the ordered [`DocPatch`] list a document engine reports for a
//! pair of revisions, plus the text edits needed to carry cursors across
//! them.
//!
//! ## Rules
//!
//! - Objects are compared key by key. Removed keys become `Delete`, new
//!   keys become `Put`, changed values are compared recursively.
//! - Arrays keep their common prefix and suffix. The differing middle is
//!   paired position by position (recursing into each pair), then the
//!   surplus is reported as one `Delete` or one `Insert`.
//! - Strings keep their common char prefix and suffix; the middle becomes
//!   one `Delete` of the removed chars followed by one `Splice` of the
//!   inserted text, both at the first differing offset.
//! - Anything else that differs is a `Put` of the new value.

use annota_core::json::{JsonPath, JsonValue};
use annota_core::patch::DocPatch;
use serde_json::Value;

/// One text replacement recorded between two revisions
///
/// `deleted` chars at `pos` in the old text were replaced by `inserted`
/// chars. Offsets count chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Path of the text value
    pub path: JsonPath,
    /// First changed char offset
    pub pos: usize,
    /// Number of chars removed
    pub deleted: usize,
    /// Number of chars inserted
    pub inserted: usize,
}

/// Where a char offset of the new text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// The char existed in the old text at this offset
    Old(usize),
    /// The char was inserted by this edit
    Inserted,
}

impl TextEdit {
    /// Map a char offset of the old text into the new text
    ///
    /// A char removed by the edit collapses to the edit position.
    pub fn map_forward(&self, offset: usize) -> usize {
        if offset < self.pos {
            offset
        } else if offset >= self.pos + self.deleted {
            offset - self.deleted + self.inserted
        } else {
            self.pos
        }
    }

    /// Map a char offset of the new text back into the old text
    ///
    /// A char inserted by the edit collapses to the edit position.
    pub fn map_backward(&self, offset: usize) -> usize {
        match self.origin(offset) {
            Origin::Old(old) => old,
            Origin::Inserted => self.pos,
        }
    }

    pub(crate) fn origin(&self, offset: usize) -> Origin {
        if offset < self.pos {
            Origin::Old(offset)
        } else if offset >= self.pos + self.inserted {
            Origin::Old(offset - self.inserted + self.deleted)
        } else {
            Origin::Inserted
        }
    }
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralDiff {
    /// Ordered patches turning the old snapshot into the new one
    pub patches: Vec<DocPatch>,
    /// Text edits, at most one per text path
    pub text_edits: Vec<TextEdit>,
}

impl StructuralDiff {
    /// Compare two snapshots
    pub fn between(before: &JsonValue, after: &JsonValue) -> Self {
        let mut diff = StructuralDiff::default();
        diff.compare(JsonPath::root(), before.as_inner(), after.as_inner());
        diff
    }

    /// True when the snapshots are equal
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    fn compare(&mut self, path: JsonPath, before: &Value, after: &Value) {
        if before == after {
            return;
        }
        match (before, after) {
            (Value::Object(old), Value::Object(new)) => {
                for key in old.keys() {
                    if !new.contains_key(key) {
                        self.patches.push(DocPatch::Delete {
                            path: path.clone().key(key.as_str()),
                            length: 1,
                        });
                    }
                }
                for (key, value) in new {
                    let child = path.clone().key(key.as_str());
                    match old.get(key) {
                        Some(previous) => self.compare(child, previous, value),
                        None => self.patches.push(DocPatch::Put {
                            path: child,
                            value: JsonValue::from_value(value.clone()),
                        }),
                    }
                }
            }
            (Value::Array(old), Value::Array(new)) => self.compare_arrays(path, old, new),
            (Value::String(old), Value::String(new)) => self.compare_text(path, old, new),
            _ => self.patches.push(DocPatch::Put {
                path,
                value: JsonValue::from_value(after.clone()),
            }),
        }
    }

    fn compare_arrays(&mut self, path: JsonPath, old: &[Value], new: &[Value]) {
        let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let old_mid = &old[prefix..old.len() - suffix];
        let new_mid = &new[prefix..new.len() - suffix];
        let paired = old_mid.len().min(new_mid.len());

        for i in 0..paired {
            self.compare(path.clone().index(prefix + i), &old_mid[i], &new_mid[i]);
        }

        let at = prefix + paired;
        if old_mid.len() > paired {
            self.patches.push(DocPatch::Delete {
                path: path.index(at),
                length: old_mid.len() - paired,
            });
        } else if new_mid.len() > paired {
            self.patches.push(DocPatch::Insert {
                path: path.index(at),
                values: new_mid[paired..]
                    .iter()
                    .cloned()
                    .map(JsonValue::from_value)
                    .collect(),
            });
        }
    }

    fn compare_text(&mut self, path: JsonPath, old: &str, new: &str) {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(&new_chars)
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
        let suffix = old_chars
            .iter()
            .rev()
            .zip(new_chars.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let deleted = old_chars.len() - prefix - suffix;
        let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
        let inserted_len = new_chars.len() - prefix - suffix;

        if deleted > 0 {
            self.patches.push(DocPatch::Delete {
                path: path.clone().index(prefix),
                length: deleted,
            });
        }
        if inserted_len > 0 {
            self.patches.push(DocPatch::Splice {
                path: path.clone().index(prefix),
                value: inserted,
            });
        }
        self.text_edits.push(TextEdit {
            path,
            pos: prefix,
            deleted,
            inserted: inserted_len,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(before: Value, after: Value) -> StructuralDiff {
        StructuralDiff::between(&before.into(), &after.into())
    }

    fn path(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_equal_values_produce_nothing() {
        let d = diff(json!({"a": [1, "x"]}), json!({"a": [1, "x"]}));
        assert!(d.is_empty());
        assert!(d.text_edits.is_empty());
    }

    #[test]
    fn test_added_key_is_put() {
        let d = diff(json!({"a": 1}), json!({"a": 1, "b": 2}));
        assert_eq!(
            d.patches,
            vec![DocPatch::Put {
                path: path("b"),
                value: JsonValue::from(2)
            }]
        );
    }

    #[test]
    fn test_removed_key_is_delete() {
        let d = diff(json!({"a": 1, "b": 2}), json!({"a": 1}));
        assert_eq!(
            d.patches,
            vec![DocPatch::Delete {
                path: path("b"),
                length: 1
            }]
        );
    }

    #[test]
    fn test_nested_scalar_change_is_put_at_leaf() {
        let d = diff(json!({"x": {"y": 1}}), json!({"x": {"y": 2}}));
        assert_eq!(
            d.patches,
            vec![DocPatch::Put {
                path: path("x.y"),
                value: JsonValue::from(2)
            }]
        );
    }

    #[test]
    fn test_type_change_is_put() {
        let d = diff(json!({"x": {"y": 1}}), json!({"x": [1]}));
        assert_eq!(d.patches.len(), 1);
        assert_eq!(d.patches[0].path(), &path("x"));
    }

    #[test]
    fn test_text_insert_is_splice() {
        let d = diff(json!({"t": "hello"}), json!({"t": "heXYllo"}));
        assert_eq!(
            d.patches,
            vec![DocPatch::Splice {
                path: path("t[2]"),
                value: "XY".to_string()
            }]
        );
        assert_eq!(
            d.text_edits,
            vec![TextEdit {
                path: path("t"),
                pos: 2,
                deleted: 0,
                inserted: 2
            }]
        );
    }

    #[test]
    fn test_text_replace_is_delete_then_splice() {
        let d = diff(json!({"t": "hello world"}), json!({"t": "hello there"}));
        assert_eq!(
            d.patches,
            vec![
                DocPatch::Delete {
                    path: path("t[6]"),
                    length: 5
                },
                DocPatch::Splice {
                    path: path("t[6]"),
                    value: "there".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_text_diff_counts_chars() {
        let d = diff(json!("héllo"), json!("héo"));
        assert_eq!(
            d.patches,
            vec![DocPatch::Delete {
                path: JsonPath::root().index(2),
                length: 2
            }]
        );
    }

    #[test]
    fn test_array_append_is_insert() {
        let d = diff(json!({"l": [1, 2]}), json!({"l": [1, 2, 3, 4]}));
        assert_eq!(
            d.patches,
            vec![DocPatch::Insert {
                path: path("l[2]"),
                values: vec![JsonValue::from(3), JsonValue::from(4)]
            }]
        );
    }

    #[test]
    fn test_array_removal_is_delete_with_length() {
        let d = diff(json!([1, 2, 3, 4]), json!([1, 4]));
        assert_eq!(
            d.patches,
            vec![DocPatch::Delete {
                path: JsonPath::root().index(1),
                length: 2
            }]
        );
    }

    #[test]
    fn test_array_element_recursion() {
        let d = diff(
            json!({"todos": [{"done": false}, {"done": false}]}),
            json!({"todos": [{"done": false}, {"done": true}]}),
        );
        assert_eq!(
            d.patches,
            vec![DocPatch::Put {
                path: path("todos[1].done"),
                value: JsonValue::from(true)
            }]
        );
    }

    #[test]
    fn test_edit_mapping() {
        let edit = TextEdit {
            path: JsonPath::root(),
            pos: 3,
            deleted: 2,
            inserted: 4,
        };
        assert_eq!(edit.map_forward(1), 1);
        assert_eq!(edit.map_forward(4), 3);
        assert_eq!(edit.map_forward(5), 7);
        assert_eq!(edit.map_backward(7), 5);
        assert_eq!(edit.map_backward(4), 3);
        assert_eq!(edit.origin(4), Origin::Inserted);
        assert_eq!(edit.origin(2), Origin::Old(2));
    }
}
