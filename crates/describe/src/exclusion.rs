use std::collections::HashSet;

/// Source URLs that must not be uploaded during the current run.
///
/// Created empty per run and never persisted, so a restriction seen in an
/// earlier run is only honoured again if the archive still reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    sources: HashSet<String>,
}
impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the source was not already excluded.
    pub fn insert(&mut self, source: impl Into<String>) -> bool {
        self.sources.insert(source.into())
    }

    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = ExclusionSet::new();
        assert!(set.is_empty());
        assert!(set.insert("https://foto/a"));
        assert!(!set.insert("https://foto/a".to_string()));
        assert!(set.contains("https://foto/a"));
        assert!(!set.contains("https://foto/b"));
        assert_eq!(set.len(), 1);
    }
}
