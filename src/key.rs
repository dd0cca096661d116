use std::fmt;
use std::fmt::Write as _;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{Node, MAX_DEPTH};
use crate::utils::short_digest;

/// Whether the order of entries inside a mapping takes part in equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyOrder {
    /// `{a: 1, b: 2}` and `{b: 2, a: 1}` are different documents.
    #[default]
    Significant,
    /// Mappings are compared as unordered sets of entries.
    Ignored,
}

/// Equality fingerprint of a document.
///
/// A length-prefixed walk of the tree: node kind, resolved tag and, for
/// scalars, the source text. Quoting style is not part of it, so `'x'` and
/// `x` match while `'1'` (a string) and `1` (an int) do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        short_digest(self.0.as_bytes())
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn canonical_key(document: &Document, order: KeyOrder) -> Result<CanonicalKey> {
    let mut out = String::new();
    linearize(document, order, 0, &mut out)?;
    Ok(CanonicalKey(out))
}

fn field(out: &mut String, text: &str) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{}:{}", text.len(), text);
}

fn linearize(node: &Node, order: KeyOrder, depth: usize, out: &mut String) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::Serialization(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }

    let tag = node.resolved_tag();
    match node {
        Node::Scalar(scalar) => {
            out.push('=');
            field(out, tag.as_str());
            field(out, &scalar.text);
        }
        Node::Sequence { items, .. } => {
            out.push('[');
            field(out, tag.as_str());
            field(out, &items.len().to_string());
            for item in items {
                linearize(item, order, depth + 1, out)?;
            }
            out.push(']');
        }
        Node::Mapping { entries, .. } => {
            out.push('{');
            field(out, tag.as_str());
            field(out, &entries.len().to_string());

            let mut linear = entries
                .iter()
                .map(|(k, v)| {
                    let mut entry = String::new();
                    linearize(k, order, depth + 1, &mut entry)?;
                    linearize(v, order, depth + 1, &mut entry)?;
                    Ok(entry)
                })
                .collect::<Result<Vec<_>>>()?;
            if order == KeyOrder::Ignored {
                linear.sort_unstable();
            }
            for entry in linear {
                out.push_str(&entry);
            }
            out.push('}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::decode;
    use crate::node::Scalar;

    fn doc(text: &str) -> Document {
        decode(text.as_bytes()).unwrap().remove(0)
    }

    fn key(text: &str, order: KeyOrder) -> CanonicalKey {
        canonical_key(&doc(text), order).unwrap()
    }

    #[test]
    fn keying_twice_gives_the_same_key() {
        let d = doc("name: x\nitems: [1, {k: v}]\n");
        assert_eq!(
            canonical_key(&d, KeyOrder::Significant).unwrap(),
            canonical_key(&d, KeyOrder::Significant).unwrap()
        );
    }

    #[test]
    fn formatting_differences_do_not_change_the_key() {
        let a = key("a: 1\nb: [x, y]\n", KeyOrder::Significant);
        let b = key("# c\na:    1\nb:\n  - x\n  - \"y\"\n", KeyOrder::Significant);
        assert_eq!(a, b);
    }

    #[test]
    fn number_spelling_is_part_of_the_key() {
        assert_ne!(
            key("version: 1.10\n", KeyOrder::Significant),
            key("version: 1.1\n", KeyOrder::Significant)
        );
        assert_ne!(
            key("h: 0x10\n", KeyOrder::Significant),
            key("h: 16\n", KeyOrder::Significant)
        );
    }

    #[test]
    fn scalar_kind_is_part_of_the_key() {
        let int = key("a: 1\n", KeyOrder::Significant);
        let string = key("a: '1'\n", KeyOrder::Significant);
        assert_ne!(int, string);
        assert_eq!(string, key("a: !!str 1\n", KeyOrder::Significant));
        assert_ne!(key("a: null\n", KeyOrder::Significant), key("a: 'null'\n", KeyOrder::Significant));
    }

    #[test]
    fn nesting_is_part_of_the_key() {
        let flat = key("a: [1, 2]\n", KeyOrder::Significant);
        let nested = key("a: [[1, 2]]\n", KeyOrder::Significant);
        assert_ne!(flat, nested);
        assert_ne!(key("[a, b]\n", KeyOrder::Significant), key("[ab]\n", KeyOrder::Significant));
    }

    #[test]
    fn mapping_order_is_significant_by_default() {
        assert_ne!(
            key("a: 1\nb: 2\n", KeyOrder::default()),
            key("b: 2\na: 1\n", KeyOrder::default())
        );
    }

    #[test]
    fn ignored_order_sorts_nested_mappings() {
        let a = key("outer:\n  x: 1\n  y: [ {p: 1, q: 2} ]\nz: 0\n", KeyOrder::Ignored);
        let b = key("z: 0\nouter:\n  y: [ {q: 2, p: 1} ]\n  x: 1\n", KeyOrder::Ignored);
        assert_eq!(a, b);
    }

    #[test]
    fn ignored_order_still_compares_values() {
        assert_ne!(
            key("a: 1\nb: 2\n", KeyOrder::Ignored),
            key("b: 2\na: 2\n", KeyOrder::Ignored)
        );
    }

    #[test]
    fn ignored_order_reaches_inside_tags() {
        let a = key("!point {x: 1, y: 2}\n", KeyOrder::Ignored);
        let b = key("!point {y: 2, x: 1}\n", KeyOrder::Ignored);
        assert_eq!(a, b);
        assert_ne!(a, key("!other {x: 1, y: 2}\n", KeyOrder::Ignored));
    }

    #[test]
    fn repeated_keys_are_kept_apart() {
        assert_ne!(
            key("a: 1\na: 2\n", KeyOrder::Significant),
            key("a: 2\n", KeyOrder::Significant)
        );
    }

    #[test]
    fn too_deep_documents_fail_to_key() {
        let mut node = Node::Scalar(Scalar::plain("x"));
        for _ in 0..=MAX_DEPTH {
            node = Node::Sequence {
                tag: None,
                items: vec![node],
            };
        }
        let err = canonical_key(&node, KeyOrder::Significant).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)), "got {err:?}");
    }

    #[test]
    fn fingerprint_follows_key_text() {
        let a = key("a: 1\n", KeyOrder::Significant);
        assert_eq!(a.fingerprint(), key("a:   1\n", KeyOrder::Significant).fingerprint());
        assert_ne!(a.fingerprint(), key("a: 2\n", KeyOrder::Significant).fingerprint());
        assert_eq!(a.to_string(), a.as_str());
    }
}
