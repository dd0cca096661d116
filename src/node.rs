use std::borrow::Cow;
use std::fmt;

pub const CORE_PREFIX: &str = "tag:yaml.org,2002:";

/// Deepest collection nesting accepted when parsing, keying or emitting.
pub const MAX_DEPTH: usize = 256;

/// A fully resolved tag, e.g. `tag:yaml.org,2002:int` or `!point`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(full: impl Into<String>) -> Self {
        Tag(full.into())
    }

    pub fn core(name: &str) -> Self {
        Tag(format!("{CORE_PREFIX}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The non-specific tag `!` written on a node.
    pub fn is_non_specific(&self) -> bool {
        self.0 == "!"
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.strip_prefix(CORE_PREFIX) {
            Some(name) => write!(f, "!!{name}"),
            None if self.0.starts_with('!') => f.write_str(&self.0),
            None => write!(f, "!<{}>", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A scalar exactly as written: its text, its explicit tag if any, and the
/// quoting it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub tag: Option<Tag>,
    pub text: String,
    pub style: ScalarStyle,
}

impl Scalar {
    pub fn plain(text: impl Into<String>) -> Self {
        Scalar {
            tag: None,
            text: text.into(),
            style: ScalarStyle::Plain,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Scalar {
            tag: None,
            text: text.into(),
            style: ScalarStyle::DoubleQuoted,
        }
    }

    /// The tag this scalar stands for: the explicit one, or the core-schema
    /// tag of a plain scalar, or `!!str` for quoted and block scalars.
    pub fn resolved_tag(&self) -> Cow<'_, Tag> {
        match &self.tag {
            Some(tag) if !tag.is_non_specific() => Cow::Borrowed(tag),
            Some(_) => Cow::Owned(Tag::core("str")),
            None if self.style == ScalarStyle::Plain => {
                Cow::Owned(Tag::core(resolve_plain(&self.text)))
            }
            None => Cow::Owned(Tag::core("str")),
        }
    }
}

/// One YAML node. Mappings are ordered lists of entries; repeated keys are
/// kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(Scalar),
    Sequence {
        tag: Option<Tag>,
        items: Vec<Node>,
    },
    Mapping {
        tag: Option<Tag>,
        entries: Vec<(Node, Node)>,
    },
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::plain(""))
    }

    pub fn resolved_tag(&self) -> Cow<'_, Tag> {
        match self {
            Node::Scalar(scalar) => scalar.resolved_tag(),
            Node::Sequence { tag: Some(tag), .. } | Node::Mapping { tag: Some(tag), .. }
                if !tag.is_non_specific() =>
            {
                Cow::Borrowed(tag)
            }
            Node::Sequence { .. } => Cow::Owned(Tag::core("seq")),
            Node::Mapping { .. } => Cow::Owned(Tag::core("map")),
        }
    }

    /// Looks up the value of the first entry whose key is a scalar with
    /// this text.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping { entries, .. } => entries.iter().find_map(|(k, v)| match k {
                Node::Scalar(s) if s.text == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Node::Scalar(_) => 1,
            Node::Sequence { items, .. } => 1 + items.iter().map(Node::count).sum::<usize>(),
            Node::Mapping { entries, .. } => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.count() + v.count())
                    .sum::<usize>()
            }
        }
    }
}

// YAML 1.2 core schema.
pub fn resolve_plain(text: &str) -> &'static str {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => "null",
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => "bool",
        ".nan" | ".NaN" | ".NAN" => "float",
        _ if is_int(text) => "int",
        _ if is_float(text) => "float",
        _ => "str",
    }
}

fn all_digits(s: &str, radix: u32) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_digit(radix))
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['-', '+']).unwrap_or(s)
}

fn is_int(text: &str) -> bool {
    if let Some(octal) = text.strip_prefix("0o") {
        return all_digits(octal, 8);
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return all_digits(hex, 16);
    }
    all_digits(strip_sign(text), 10)
}

fn is_float(text: &str) -> bool {
    let unsigned = strip_sign(text);
    if matches!(unsigned, ".inf" | ".Inf" | ".INF") {
        return true;
    }

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    if let Some(exponent) = exponent {
        if !all_digits(strip_sign(exponent), 10) {
            return false;
        }
    }

    match mantissa.split_once('.') {
        Some(("", fraction)) => all_digits(fraction, 10),
        Some((whole, fraction)) => {
            all_digits(whole, 10) && (fraction.is_empty() || all_digits(fraction, 10))
        }
        None => all_digits(mantissa, 10),
    }
}
