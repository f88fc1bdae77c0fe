//! Style pool for deduplication

use super::Style;
use ahash::AHashMap;

/// Handle to a style interned in a [`StylePool`]
///
/// Handles are only meaningful for the pool that issued them; copying styled
/// content to another sheet re-interns the resolved style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StyleId(pub(crate) u32);

impl StyleId {
    /// The default style (always index 0)
    pub const DEFAULT: StyleId = StyleId(0);

    /// Raw index
    pub fn index(self) -> u32 {
        self.0
    }

    /// Whether this is the default style
    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

/// Style pool for deduplicating styles
///
/// Many cells share the same style. The pool stores each unique style once and
/// cells reference it by [`StyleId`].
#[derive(Debug, Clone)]
pub struct StylePool {
    /// All unique styles (index 0 is default)
    styles: Vec<Style>,
    /// Fast lookup for deduplication
    index_map: AHashMap<Style, StyleId>,
}

impl StylePool {
    /// Create a new style pool with default style at index 0
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::with_capacity(16),
            index_map: AHashMap::with_capacity(16),
        };
        let default = Style::default();
        pool.index_map.insert(default.clone(), StyleId::DEFAULT);
        pool.styles.push(default);
        pool
    }

    /// Get or create a style, returning its handle
    pub fn get_or_insert(&mut self, style: Style) -> StyleId {
        if let Some(&id) = self.index_map.get(&style) {
            return id;
        }
        let id = StyleId(self.styles.len() as u32);
        self.index_map.insert(style.clone(), id);
        self.styles.push(style);
        id
    }

    /// Get a style by handle
    pub fn get(&self, id: StyleId) -> Option<&Style> {
        self.styles.get(id.0 as usize)
    }

    /// Resolve a handle, falling back to the default style
    pub fn resolve(&self, id: StyleId) -> &Style {
        self.get(id).unwrap_or(&self.styles[0])
    }

    /// Get the number of styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the pool only has the default style
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_default_style() {
        let pool = StylePool::new();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(StyleId::DEFAULT), Some(&Style::default()));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_deduplication() {
        let mut pool = StylePool::new();

        let id1 = pool.get_or_insert(Style::new().bold(true));
        let id2 = pool.get_or_insert(Style::new().bold(true));
        let id3 = pool.get_or_insert(Style::new().italic(true));

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get_or_insert(Style::default()), StyleId::DEFAULT);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let mut pool = StylePool::new();
        let style = Style::new().fill_color(Color::RED);
        let id = pool.get_or_insert(style.clone());
        assert_eq!(pool.resolve(id), &style);
        assert_eq!(pool.resolve(StyleId(99)), &Style::default());
    }
}
