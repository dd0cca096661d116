use std::collections::HashSet;

use tracing::{debug, info, trace};

use crate::document::Document;
use crate::error::Result;
use crate::key::{canonical_key, CanonicalKey, KeyOrder};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Counters {
    pub first_docs: usize,
    pub first_keys: usize,
    pub second_docs: usize,
    pub emitted: usize,
    pub suppressed: usize,
}

/// Documents of the second input missing from the first, borrowed in the
/// second input's order.
#[derive(Debug)]
pub struct Diff<'b> {
    pub documents: Vec<&'b Document>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Differ {
    order: KeyOrder,
}

impl Differ {
    pub fn new(order: KeyOrder) -> Self {
        Self { order }
    }

    pub fn diff<'b>(&self, first: &[Document], second: &'b [Document]) -> Result<Diff<'b>> {
        let mut counters = Counters {
            first_docs: first.len(),
            second_docs: second.len(),
            ..Counters::default()
        };

        // The key set is complete before the first lookup and read-only after.
        let seen = self.key_set(first)?;
        counters.first_keys = seen.len();

        let mut documents = Vec::new();
        for (index, document) in second.iter().enumerate() {
            let key = canonical_key(document, self.order)?;
            if seen.contains(&key) {
                trace!(index, key = %key.fingerprint(), "already in first input");
                counters.suppressed += 1;
            } else {
                trace!(index, key = %key.fingerprint(), "new document");
                documents.push(document);
            }
        }
        counters.emitted = documents.len();

        info!(
            first = counters.first_docs,
            second = counters.second_docs,
            emitted = counters.emitted,
            "diff complete"
        );
        Ok(Diff {
            documents,
            counters,
        })
    }

    fn key_set(&self, documents: &[Document]) -> Result<HashSet<CanonicalKey>> {
        let mut seen = HashSet::with_capacity(documents.len());
        for document in documents {
            seen.insert(canonical_key(document, self.order)?);
        }
        debug!(
            documents = documents.len(),
            distinct = seen.len(),
            order = ?self.order,
            "built key set"
        );
        Ok(seen)
    }
}

/// `Differ::default().diff(first, second)` without the counters.
pub fn diff<'b>(first: &[Document], second: &'b [Document]) -> Result<Vec<&'b Document>> {
    Ok(Differ::default().diff(first, second)?.documents)
}
