//! Reference plain-text document engine.
//!
//! Positions count Unicode scalar values (chars). A document is a single
//! run of text stored in a [`ropey::Rope`]; the only step kind is a
//! replacement of a char range with new text, which covers insertion and
//! deletion as special cases.

use crate::error::{TransformError, TransformResult};
use crate::map::{Assoc, Mappable, StepMap};
use crate::step::Step;
use ropey::Rope;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A plain-text document.
#[derive(Clone, Default)]
pub struct TextDoc {
    rope: Rope,
}

impl TextDoc {
    /// Creates a document holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the text in `[from, to)`, or `None` if out of range.
    pub fn slice(&self, from: usize, to: usize) -> Option<String> {
        if from > to {
            return None;
        }
        self.rope.get_slice(from..to).map(|s| s.to_string())
    }
}

impl From<&str> for TextDoc {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl PartialEq for TextDoc {
    fn eq(&self, other: &Self) -> bool {
        self.rope == other.rope
    }
}

impl Eq for TextDoc {}

impl fmt::Display for TextDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TextDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextDoc({:?})", self.to_string())
    }
}

impl Serialize for TextDoc {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TextDoc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::new(&text))
    }
}

/// Replaces the chars in `[from, to)` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStep {
    from: usize,
    to: usize,
    #[serde(default)]
    text: String,
}

impl TextStep {
    /// Creates a replacement step.
    pub fn replace(from: usize, to: usize, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            text: text.into(),
        }
    }

    /// Creates an insertion at `pos`.
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Self::replace(pos, pos, text)
    }

    /// Creates a deletion of `[from, to)`.
    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, String::new())
    }

    /// Start of the replaced range.
    pub fn from(&self) -> usize {
        self.from
    }

    /// End of the replaced range.
    pub fn to(&self) -> usize {
        self.to
    }

    /// The inserted text.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl Step for TextStep {
    type Doc = TextDoc;

    fn apply(&self, doc: &TextDoc) -> TransformResult<TextDoc> {
        if self.from > self.to {
            return Err(TransformError::rejected(format!(
                "inverted range {}..{}",
                self.from, self.to
            )));
        }
        let size = doc.len();
        if self.to > size {
            return Err(TransformError::PositionOutOfRange { pos: self.to, size });
        }

        let mut rope = doc.rope.clone();
        rope.remove(self.from..self.to);
        rope.insert(self.from, &self.text);
        Ok(TextDoc { rope })
    }

    fn get_map(&self) -> StepMap {
        StepMap::replace(self.from, self.to.saturating_sub(self.from), self.text_len())
    }

    fn invert(&self, doc: &TextDoc) -> Self {
        let removed = doc.slice(self.from, self.to).unwrap_or_default();
        Self::replace(self.from, self.from + self.text_len(), removed)
    }

    fn map<M: Mappable + ?Sized>(&self, mapping: &M) -> Option<Self> {
        let from = mapping.map_result(self.from, Assoc::After);
        let to = mapping.map_result(self.to, Assoc::Before);
        if from.deleted_across() && to.deleted_across() {
            return None;
        }
        Some(Self::replace(
            from.pos,
            from.pos.max(to.pos),
            self.text.clone(),
        ))
    }
}
