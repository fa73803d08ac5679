//! Transform accumulator: a document plus the steps applied to it.

use crate::error::TransformResult;
use crate::mapping::Mapping;
use crate::step::Step;

/// Accumulates steps applied to a starting document.
///
/// Keeps the document before every step so inverses can be computed
/// afterwards, and the mapping of all applied steps in order.
#[derive(Debug, Clone)]
pub struct Transform<S: Step> {
    doc: S::Doc,
    docs: Vec<S::Doc>,
    steps: Vec<S>,
    mapping: Mapping,
}

impl<S: Step> Transform<S> {
    /// Creates a transform seeded at `doc`.
    pub fn new(doc: S::Doc) -> Self {
        Self {
            doc,
            docs: Vec::new(),
            steps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// Returns the current document.
    pub fn doc(&self) -> &S::Doc {
        &self.doc
    }

    /// Consumes the transform, returning the current document.
    pub fn into_doc(self) -> S::Doc {
        self.doc
    }

    /// Returns the document the transform started from.
    pub fn before(&self) -> &S::Doc {
        self.docs.first().unwrap_or(&self.doc)
    }

    /// Returns the applied steps.
    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    /// Returns the document before each applied step.
    pub fn docs(&self) -> &[S::Doc] {
        &self.docs
    }

    /// Returns the mapping of all applied steps.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Returns the mapping for mirror bookkeeping.
    pub fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }

    /// Returns true if any step was applied.
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Applies a step, failing if the document engine rejects it.
    pub fn step(&mut self, step: S) -> TransformResult<&mut Self> {
        self.maybe_step(step)?;
        Ok(self)
    }

    /// Tries to apply a step. On rejection the transform is unchanged.
    pub fn maybe_step(&mut self, step: S) -> TransformResult<()> {
        let (next, map) = step.apply_with_map(&self.doc)?;
        let before = std::mem::replace(&mut self.doc, next);
        self.docs.push(before);
        self.steps.push(step);
        self.mapping.append_map(map, None);
        Ok(())
    }

    /// Returns the inverse of the most recently applied step.
    pub fn invert_last(&self) -> Option<S> {
        let step = self.steps.last()?;
        let before = self.docs.last()?;
        Some(step.invert(before))
    }
}
