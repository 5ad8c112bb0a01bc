use indexmap::{IndexMap, IndexSet};

use crate::utils::text::MASTER_MANIFEST_MARKER;

/// Request scoped index of discovered urls keyed by the originating source
/// page. String set semantics: duplicates collapse, first seen order is
/// kept. One registry lives for exactly one extraction call.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: IndexMap<String, IndexSet<String>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: &str, link: impl Into<String>) {
        self.links
            .entry(source.to_owned())
            .or_default()
            .insert(link.into());
    }

    pub fn links_for<'a>(&'a self, source: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.links
            .get(source)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    /// Deterministic selection among duplicates: the url carrying the master
    /// manifest marker wins regardless of discovery order, otherwise the
    /// first discovered url.
    pub fn master_link(&self, source: &str) -> Option<&str> {
        let set = self.links.get(source)?;
        set.iter()
            .find(|link| link.contains(MASTER_MANIFEST_MARKER))
            .or_else(|| set.first())
            .map(|s| s.as_str())
    }
}
