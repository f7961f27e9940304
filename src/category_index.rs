use std::collections::HashMap;

/// Post counts per category, used for the sidebar and the per-category
/// pages of the static build.
#[derive(Default)]
pub struct CategoryIndex {
    counts: HashMap<String, u32>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        CategoryIndex::default()
    }

    pub fn add_post(&mut self, categories: &[String]) {
        for category in categories {
            *self.counts.entry(category.clone()).or_insert(0) += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, category: &str) -> u32 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Categories ordered by post count descending, name as tie breaker.
    pub fn by_frequency(&self) -> Vec<String> {
        let mut entries: Vec<(&String, &u32)> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries.into_iter().map(|(name, _)| name.clone()).collect()
    }
}
