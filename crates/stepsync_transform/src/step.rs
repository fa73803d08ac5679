//! The edit-operation contract supplied by a document engine.

use crate::error::TransformResult;
use crate::map::{Mappable, StepMap};
use std::fmt;

/// An atomic, invertible document mutation.
///
/// The synchronization core never looks inside a step. It only needs to
/// apply it, invert it against the document it applied to, read its
/// position map, and move it through a mapping.
///
/// Applying a step must never corrupt the input document: a step that
/// cannot apply returns an error and leaves `doc` untouched.
pub trait Step: Clone + fmt::Debug + PartialEq {
    /// The document type this step mutates.
    type Doc: Clone + fmt::Debug + PartialEq;

    /// Applies the step, returning the new document.
    fn apply(&self, doc: &Self::Doc) -> TransformResult<Self::Doc>;

    /// Returns the position map of this step.
    fn get_map(&self) -> StepMap;

    /// Returns the step that undoes this one, given the document it applied to.
    fn invert(&self, doc: &Self::Doc) -> Self;

    /// Maps the step through `mapping`, or returns `None` if it no longer
    /// has a meaningful target.
    fn map<M: Mappable + ?Sized>(&self, mapping: &M) -> Option<Self>;

    /// Applies the step and returns the new document together with its map.
    fn apply_with_map(&self, doc: &Self::Doc) -> TransformResult<(Self::Doc, StepMap)> {
        let next = self.apply(doc)?;
        Ok((next, self.get_map()))
    }
}
