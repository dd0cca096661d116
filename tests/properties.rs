//! Property tests for document keys and the set difference.

use kyd::{
    canonical_key, decode, encode, Differ, Document, KeyOrder, Node, Scalar, ScalarStyle, Tag,
};
use proptest::prelude::*;

fn plain_scalar() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::null()),
        "[a-z][a-z0-9]{0,4}".prop_map(|s| Node::Scalar(Scalar::plain(s))),
        r"-?[0-9]{1,3}(\.[0-9]{0,2})?".prop_map(|s| Node::Scalar(Scalar::plain(s))),
    ]
}

// Mixed quoting and tags, for checks that go through the emitter.
fn any_scalar() -> impl Strategy<Value = Node> {
    let style = prop_oneof![
        Just(ScalarStyle::Plain),
        Just(ScalarStyle::SingleQuoted),
        Just(ScalarStyle::DoubleQuoted),
    ];
    let tag = prop_oneof![
        Just(None),
        Just(Some(Tag::new("!t"))),
        Just(Some(Tag::core("int"))),
    ];
    let text = prop_oneof![
        "[a-z0-9.]{0,6}",
        "[a-z '\"#:\n\t\\\\-]{0,8}",
    ];
    prop_oneof![
        plain_scalar(),
        (text, style, tag).prop_map(|(text, style, tag)| {
            // Plain text with leading, trailing or embedded breaks does not
            // survive a reparse unchanged; only quoted styles carry it.
            let awkward = text.trim() != text
                || text.contains(['\n', '\t', '#', ':', '\'', '"', '\\', '-']);
            let style = match style {
                ScalarStyle::Plain if awkward => ScalarStyle::DoubleQuoted,
                other => other,
            };
            Node::Scalar(Scalar { tag, text, style })
        }),
    ]
}

fn tree(leaf: BoxedStrategy<Node>) -> impl Strategy<Value = Document> {
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| Node::Sequence { tag: None, items }),
            prop::collection::vec(("k_[a-c]{1,2}", inner), 0..4).prop_map(|entries| {
                Node::Mapping {
                    tag: None,
                    entries: entries
                        .into_iter()
                        .map(|(k, v)| (Node::Scalar(Scalar::plain(k)), v))
                        .collect(),
                }
            }),
        ]
    })
}

fn document() -> impl Strategy<Value = Document> {
    tree(plain_scalar().boxed())
}

fn styled_document() -> impl Strategy<Value = Document> {
    tree(any_scalar().boxed())
}

fn documents() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(document(), 0..6)
}

fn order() -> impl Strategy<Value = KeyOrder> {
    prop_oneof![Just(KeyOrder::Significant), Just(KeyOrder::Ignored)]
}

fn reversed(node: &Node) -> Node {
    match node {
        Node::Scalar(_) => node.clone(),
        Node::Sequence { tag, items } => Node::Sequence {
            tag: tag.clone(),
            items: items.iter().map(reversed).collect(),
        },
        Node::Mapping { tag, entries } => Node::Mapping {
            tag: tag.clone(),
            entries: entries
                .iter()
                .rev()
                .map(|(k, v)| (reversed(k), reversed(v)))
                .collect(),
        },
    }
}

fn indices_in<'b>(picked: &[&'b Document], all: &'b [Document]) -> Vec<usize> {
    picked
        .iter()
        .map(|p| {
            all.iter()
                .position(|d| std::ptr::eq(d, *p))
                .expect("result borrows from the second input")
        })
        .collect()
}

proptest! {
    #[test]
    fn keying_is_idempotent(d in styled_document(), order in order()) {
        prop_assert_eq!(canonical_key(&d, order).unwrap(), canonical_key(&d, order).unwrap());
    }

    #[test]
    fn significant_keys_match_tree_equality(d1 in document(), d2 in document()) {
        let k1 = canonical_key(&d1, KeyOrder::Significant).unwrap();
        let k2 = canonical_key(&d2, KeyOrder::Significant).unwrap();
        prop_assert_eq!(k1 == k2, d1 == d2);
    }

    #[test]
    fn ignored_order_keys_survive_reordering(d in document()) {
        prop_assert_eq!(
            canonical_key(&d, KeyOrder::Ignored).unwrap(),
            canonical_key(&reversed(&d), KeyOrder::Ignored).unwrap()
        );
    }

    #[test]
    fn encoded_documents_reparse_to_the_same_key(d in styled_document(), order in order()) {
        let text = encode([&d]).unwrap();
        let back = decode(&text).unwrap();
        prop_assert_eq!(back.len(), 1, "{}", String::from_utf8_lossy(&text));
        prop_assert_eq!(
            canonical_key(&back[0], order).unwrap(),
            canonical_key(&d, order).unwrap(),
            "{}",
            String::from_utf8_lossy(&text)
        );
    }

    #[test]
    fn diff_with_itself_is_empty(a in documents(), order in order()) {
        prop_assert!(Differ::new(order).diff(&a, &a).unwrap().documents.is_empty());
    }

    #[test]
    fn empty_first_keeps_all_of_second(b in documents(), order in order()) {
        let out = Differ::new(order).diff(&[], &b).unwrap();
        prop_assert_eq!(indices_in(&out.documents, &b), (0..b.len()).collect::<Vec<_>>());
    }

    #[test]
    fn empty_second_gives_nothing(a in documents(), order in order()) {
        prop_assert!(Differ::new(order).diff(&a, &[]).unwrap().documents.is_empty());
    }

    #[test]
    fn result_is_ordered_subsequence_of_second(
        a in documents(),
        b in documents(),
        order in order(),
    ) {
        let out = Differ::new(order).diff(&a, &b).unwrap();
        let idx = indices_in(&out.documents, &b);
        prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));

        let first_keys: Vec<_> = a.iter().map(|d| canonical_key(d, order).unwrap()).collect();
        for (i, d) in b.iter().enumerate() {
            let novel = !first_keys.contains(&canonical_key(d, order).unwrap());
            prop_assert_eq!(novel, idx.contains(&i));
        }
    }
}
