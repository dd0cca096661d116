use std::collections::HashMap;

use tracing::debug;
use yaml_rust2::parser::{Event, Parser, Tag as ParsedTag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::emitter::Emitter;
use crate::error::{Error, Result};
use crate::node::{Node, Scalar, ScalarStyle, Tag, MAX_DEPTH};

/// One parsed YAML document.
pub type Document = Node;

// Upper bound on nodes in one document once aliases are expanded.
const MAX_NODES: usize = 1 << 20;

enum Open {
    Sequence {
        anchor: usize,
        tag: Option<Tag>,
        items: Vec<Node>,
    },
    Mapping {
        anchor: usize,
        tag: Option<Tag>,
        entries: Vec<(Node, Node)>,
        key: Option<Node>,
    },
}

/// Assembles nodes from parser events without recursion.
#[derive(Default)]
struct Builder {
    open: Vec<Open>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
    nodes: usize,
}

impl Builder {
    fn start_document(&mut self) {
        self.open.clear();
        self.anchors.clear();
        self.root = None;
        self.nodes = 0;
    }

    fn finish_document(&mut self) -> Node {
        self.root.take().unwrap_or_else(Node::null)
    }

    fn open(&mut self, collection: Open, mark: Marker) -> Result<()> {
        if self.open.len() >= MAX_DEPTH {
            return Err(parse_error(
                mark,
                format!("nesting deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.open.push(collection);
        Ok(())
    }

    fn close(&mut self, mark: Marker) -> Result<()> {
        let (node, anchor) = match self.open.pop() {
            Some(Open::Sequence { anchor, tag, items }) => (Node::Sequence { tag, items }, anchor),
            Some(Open::Mapping {
                anchor,
                tag,
                entries,
                ..
            }) => (Node::Mapping { tag, entries }, anchor),
            None => return Err(parse_error(mark, "collection end without a start")),
        };
        self.add(node, anchor, 1, mark)
    }

    fn alias(&mut self, anchor: usize, mark: Marker) -> Result<()> {
        let node = self
            .anchors
            .get(&anchor)
            .cloned()
            .ok_or_else(|| parse_error(mark, "alias to an unknown anchor"))?;
        if self.open.len() + depth(&node) > MAX_DEPTH {
            return Err(parse_error(
                mark,
                format!("nesting deeper than {MAX_DEPTH} levels"),
            ));
        }
        let weight = node.count();
        self.add(node, 0, weight, mark)
    }

    fn add(&mut self, node: Node, anchor: usize, weight: usize, mark: Marker) -> Result<()> {
        self.nodes += weight;
        if self.nodes > MAX_NODES {
            return Err(parse_error(
                mark,
                format!("more than {MAX_NODES} nodes after expanding aliases"),
            ));
        }
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.open.last_mut() {
            None => self.root = Some(node),
            Some(Open::Sequence { items, .. }) => items.push(node),
            Some(Open::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => entries.push((k, node)),
                None => *key = Some(node),
            },
        }
        Ok(())
    }
}

fn depth(node: &Node) -> usize {
    match node {
        Node::Scalar(_) => 0,
        Node::Sequence { items, .. } => 1 + items.iter().map(depth).max().unwrap_or(0),
        Node::Mapping { entries, .. } => {
            1 + entries
                .iter()
                .map(|(k, v)| depth(k).max(depth(v)))
                .max()
                .unwrap_or(0)
        }
    }
}

fn parse_error(mark: Marker, reason: impl Into<String>) -> Error {
    Error::Parse {
        line: mark.line(),
        column: mark.col(),
        reason: reason.into(),
    }
}

fn tag(parsed: Option<ParsedTag>) -> Option<Tag> {
    parsed.map(|t| Tag::new(t.handle + &t.suffix))
}

fn style(parsed: TScalarStyle) -> ScalarStyle {
    match parsed {
        TScalarStyle::Plain => ScalarStyle::Plain,
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| {
        let valid = &bytes[..err.valid_up_to()];
        let line_start = valid.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        Error::Parse {
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            column: valid.len() - line_start + 1,
            reason: "input is not valid UTF-8".to_string(),
        }
    })
}

/// Parses every document of a YAML stream, in order.
///
/// Scalars keep their source text, tag and quoting. Aliases are replaced by
/// a copy of the node their anchor names.
pub fn decode(bytes: &[u8]) -> Result<Vec<Document>> {
    let text = utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut parser = Parser::new_from_str(text);
    let mut builder = Builder::default();
    let mut documents = Vec::new();
    loop {
        let (event, mark) = parser.next_token()?;
        match event {
            Event::StreamEnd => break,
            Event::Nothing | Event::StreamStart => {}
            Event::DocumentStart => builder.start_document(),
            Event::DocumentEnd => documents.push(builder.finish_document()),
            Event::Alias(anchor) => builder.alias(anchor, mark)?,
            Event::Scalar(text, scalar_style, anchor, scalar_tag) => {
                let scalar = Scalar {
                    tag: tag(scalar_tag),
                    text,
                    style: style(scalar_style),
                };
                builder.add(Node::Scalar(scalar), anchor, 1, mark)?;
            }
            Event::SequenceStart(anchor, seq_tag) => builder.open(
                Open::Sequence {
                    anchor,
                    tag: tag(seq_tag),
                    items: Vec::new(),
                },
                mark,
            )?,
            Event::MappingStart(anchor, map_tag) => builder.open(
                Open::Mapping {
                    anchor,
                    tag: tag(map_tag),
                    entries: Vec::new(),
                    key: None,
                },
                mark,
            )?,
            Event::SequenceEnd | Event::MappingEnd => builder.close(mark)?,
        }
    }
    debug!(documents = documents.len(), bytes = bytes.len(), "decoded stream");
    Ok(documents)
}

/// Renders `documents` as one YAML stream, each document opened by `---`.
///
/// Nothing is written anywhere until the whole stream is built, so callers
/// can hand the buffer to their output only once encoding has succeeded.
pub fn encode<'a, I>(documents: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut emitter = Emitter::new();
    for document in documents {
        emitter.document(document)?;
    }
    Ok(emitter.finish().into_bytes())
}
