//! Step neutralization: re-express a cumulative sequence against its
//! common ancestor document.

use crate::error::{TransformError, TransformResult};
use crate::mapping::Mapping;
use crate::step::Step;
use tracing::warn;

/// Maps every step of a cumulative sequence back through its predecessors
/// so that all of them are expressed relative to the document that
/// preceded the whole sequence.
///
/// Output order matches input order. A step that fails to map means the
/// sequence was not produced by a single causally ordered actor, and the
/// whole batch fails with [`TransformError::InconsistentSequence`].
pub fn neutralize_steps<S: Step>(steps: &[S]) -> TransformResult<Vec<S>> {
    let forward = Mapping::from_maps(steps.iter().map(Step::get_map).collect());
    let back = forward.invert();

    let mut neutral = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        // The inverse of every step before `index`, latest first.
        let slice = back.slice(steps.len() - index);
        match step.map(&slice) {
            Some(mapped) => neutral.push(mapped),
            None => {
                warn!(index, "step could not be neutralized");
                return Err(TransformError::inconsistent(index));
            }
        }
    }

    Ok(neutral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextStep;

    #[test]
    fn typing_neutralizes_to_common_start() {
        // Typing "a", "bc", "d" at the cursor.
        let steps = vec![
            TextStep::insert(0, "a"),
            TextStep::insert(1, "bc"),
            TextStep::insert(3, "d"),
        ];

        let neutral = neutralize_steps(&steps).unwrap();
        assert_eq!(neutral.len(), 3);
        for step in &neutral {
            assert_eq!(step.from(), 0);
        }
        assert_eq!(neutral[1].text(), "bc");
    }

    #[test]
    fn independent_steps_are_shifted_back() {
        let steps = vec![TextStep::insert(0, "xx"), TextStep::delete(5, 6)];
        let neutral = neutralize_steps(&steps).unwrap();
        assert_eq!(neutral[0], TextStep::insert(0, "xx"));
        assert_eq!(neutral[1], TextStep::delete(3, 4));
    }

    #[test]
    fn empty_sequence() {
        let neutral = neutralize_steps::<TextStep>(&[]).unwrap();
        assert!(neutral.is_empty());
    }

    #[test]
    fn step_inside_replaced_content_is_inconsistent() {
        // The second step edits strictly inside content the first inserted.
        let steps = vec![TextStep::insert(0, "abcd"), TextStep::delete(1, 3)];
        let err = neutralize_steps(&steps).unwrap_err();
        assert_eq!(err, TransformError::inconsistent(1));
    }
}
