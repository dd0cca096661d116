//
// lib.rs
// kyd
//
// Library entry: YAML stream decoding into source-preserving node trees,
// canonical document keys and the set difference between two streams. The
// binary is a thin harness on top.
//
pub mod cli;
pub mod diff;
pub mod document;
pub mod emitter;
pub mod error;
pub mod key;
pub mod logging;
pub mod node;
pub mod utils;

pub use cli::{build_options, run, Args, Options, Phase};
pub use diff::{diff, Counters, Diff, Differ};
pub use document::{decode, encode, Document};
pub use error::{Error, Result};
pub use key::{canonical_key, CanonicalKey, KeyOrder};
pub use node::{Node, Scalar, ScalarStyle, Tag};
