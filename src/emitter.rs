//! Block-style YAML writer for [`Node`] trees.
//!
//! Plain scalars are written back with their source text. A scalar that
//! cannot stay plain where it lands is quoted, and gets an explicit tag when
//! quoting would otherwise change what it resolves to.

use crate::error::{Error, Result};
use crate::node::{Node, Scalar, ScalarStyle, Tag, MAX_DEPTH};

// Longest implicit key YAML accepts.
const MAX_IMPLICIT_KEY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Key,
    Flow,
}

#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one document, introduced by `---`.
    pub fn document(&mut self, node: &Node) -> Result<()> {
        self.out.push_str("---");
        self.value(node, 0, 0)
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    // Writes whatever follows `key:`, `-` or `---`, through the end of line.
    fn value(&mut self, node: &Node, indent: usize, depth: usize) -> Result<()> {
        check_depth(depth)?;
        match node {
            Node::Sequence { tag, items } if !items.is_empty() => {
                self.tag_line(tag.as_ref());
                self.sequence(items, indent, false, depth + 1)
            }
            Node::Mapping { tag, entries } if !entries.is_empty() => {
                self.tag_line(tag.as_ref());
                self.mapping(entries, indent, false, depth + 1)
            }
            _ => {
                let text = inline(node, Context::Block, depth)?;
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.out.push('\n');
                Ok(())
            }
        }
    }

    fn tag_line(&mut self, tag: Option<&Tag>) {
        if let Some(tag) = tag {
            self.out.push(' ');
            self.out.push_str(&tag.to_string());
        }
        self.out.push('\n');
    }

    fn item(&mut self, node: &Node, indent: usize, depth: usize) -> Result<()> {
        match node {
            Node::Sequence { tag: None, items } if !items.is_empty() => {
                self.out.push(' ');
                self.sequence(items, indent + 2, true, depth + 1)
            }
            Node::Mapping { tag: None, entries } if !entries.is_empty() => {
                self.out.push(' ');
                self.mapping(entries, indent + 2, true, depth + 1)
            }
            _ => self.value(node, indent + 2, depth),
        }
    }

    fn sequence(
        &mut self,
        items: &[Node],
        indent: usize,
        inline_first: bool,
        depth: usize,
    ) -> Result<()> {
        check_depth(depth)?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            self.out.push('-');
            self.item(item, indent, depth)?;
        }
        Ok(())
    }

    fn mapping(
        &mut self,
        entries: &[(Node, Node)],
        indent: usize,
        inline_first: bool,
        depth: usize,
    ) -> Result<()> {
        check_depth(depth)?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            let text = inline(key, Context::Key, depth + 1)?;
            if matches!(key, Node::Scalar(_)) && text.len() <= MAX_IMPLICIT_KEY {
                self.out.push_str(&text);
            } else {
                self.out.push_str("? ");
                self.out.push_str(&text);
                self.out.push('\n');
                self.pad(indent);
            }
            self.out.push(':');
            self.value(value, indent + 2, depth + 1)?;
        }
        Ok(())
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::Serialization(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

// Single-line rendering: scalars anywhere, collections in flow style.
fn inline(node: &Node, context: Context, depth: usize) -> Result<String> {
    check_depth(depth)?;
    let prefix = |tag: &Option<Tag>| tag.as_ref().map(|t| format!("{t} ")).unwrap_or_default();
    let text = match node {
        Node::Scalar(scalar) => scalar_text(scalar, context),
        Node::Sequence { tag, items } => {
            let items = items
                .iter()
                .map(|item| inline(item, Context::Flow, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            format!("{}[{}]", prefix(tag), items.join(", "))
        }
        Node::Mapping { tag, entries } => {
            let entries = entries
                .iter()
                .map(|(k, v)| {
                    Ok(format!(
                        "{}: {}",
                        inline(k, Context::Flow, depth + 1)?,
                        inline(v, Context::Flow, depth + 1)?
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            format!("{}{{{}}}", prefix(tag), entries.join(", "))
        }
    };
    Ok(text)
}

fn scalar_text(scalar: &Scalar, context: Context) -> String {
    let text = &scalar.text;
    let keeps_plain = scalar.style == ScalarStyle::Plain
        && plain_fits(text, context)
        && !(text.is_empty() && scalar.tag.is_some());

    let body = if keeps_plain {
        text.clone()
    } else if scalar.style == ScalarStyle::SingleQuoted && !text.chars().any(char::is_control) {
        format!("'{}'", text.replace('\'', "''"))
    } else {
        double_quoted(text)
    };

    let tag = match &scalar.tag {
        Some(tag) => Some(tag.clone()),
        // Quoting a plain scalar would turn it into a string.
        None if !keeps_plain && scalar.style == ScalarStyle::Plain => {
            Some(scalar.resolved_tag().into_owned()).filter(|t| *t != Tag::core("str"))
        }
        None => None,
    };

    match tag {
        Some(tag) => format!("{tag} {body}"),
        None => body,
    }
}

fn plain_fits(text: &str, context: Context) -> bool {
    if text.is_empty() {
        return context == Context::Block;
    }
    if text.starts_with(' ') || text.ends_with(' ') || text.ends_with(':') {
        return false;
    }
    if text.chars().any(|c| c.is_control() || c == '\u{feff}') {
        return false;
    }
    if text.contains(": ") || text.contains(" #") {
        return false;
    }
    if context != Context::Block && text.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    if text.starts_with("---") || text.starts_with("...") {
        return false;
    }

    let mut chars = text.chars();
    let first = chars.next().unwrap_or(' ');
    let second = chars.next();
    match first {
        '[' | ']' | '{' | '}' | ',' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => false,
        '-' | '?' | ':' => matches!(second, Some(c) if c != ' '),
        _ => true,
    }
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() || c == '\u{feff}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
