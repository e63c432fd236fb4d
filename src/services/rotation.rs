use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ordered, de-duplicated list of values with a shared cursor.
///
/// Used for both API credentials and model identifiers. The cursor is advanced without
/// locking; concurrent callers may race on it, which only affects how evenly load is spread.
#[derive(Debug)]
pub struct RotationPool {
    items: Vec<String>,
    index: AtomicUsize,
}

impl RotationPool {
    pub fn new(items: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| !item.is_empty() && seen.insert(item.clone()))
            .collect();

        Self {
            items,
            index: AtomicUsize::new(0),
        }
    }

    /// Builds a credential pool from comma-joined sources. Sources are read in order
    /// (bulk list first, then the single fallback), entries are trimmed, empties dropped
    /// and duplicates removed keeping the first occurrence.
    pub fn from_sources<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let items = sources
            .into_iter()
            .flatten()
            .flat_map(|source| source.split(','))
            .map(|item| item.trim().to_string())
            .collect();

        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.index.load(Ordering::Relaxed) % self.items.len())
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.index().map(|i| self.items[i].as_str())
    }

    /// Moves the cursor forward, wrapping at the end. No-op on an empty pool.
    pub fn advance(&self) -> Option<&str> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        let previous = self
            .index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);

        Some(self.items[(previous + 1) % len].as_str())
    }

    pub fn masked(&self) -> Vec<String> {
        self.items.iter().map(|item| mask(item)).collect()
    }
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
