//! Paragraph definition.

use serde::Serialize;

/// A paragraph of body text.
///
/// `text` is already control-character-normalized: the decoders emit `\n`
/// for line/paragraph breaks, `\t` for tabs, and strip the in-band control
/// alphabet. `level` is the record nesting depth the paragraph was found
/// at (0 for top-level body text, >0 inside nested containers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// Normalized paragraph text
    pub text: String,
    /// Nesting depth
    pub level: u16,
    /// Style reference, kept for future use (currently always 0)
    pub style_id: u32,
}

impl Paragraph {
    /// Creates a paragraph at the given nesting level.
    pub fn new(text: impl Into<String>, level: u16) -> Self {
        Self {
            text: text.into(),
            level,
            style_id: 0,
        }
    }

    /// Returns true if the paragraph carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(Paragraph::new("", 0).is_blank());
        assert!(Paragraph::new(" \t\n", 0).is_blank());
        assert!(!Paragraph::new("안녕", 0).is_blank());
    }
}
