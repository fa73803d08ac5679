//! Rebasing unconfirmed local steps over newly accepted history.

use stepsync_transform::{Step, Transform, TransformError, TransformResult};
use tracing::{debug, warn};

/// A local step kept together with its inverse so it can be undone
/// precisely however many times it is rebased.
#[derive(Debug, Clone, PartialEq)]
pub struct Rebaseable<S> {
    /// The step as it currently applies.
    pub step: S,
    /// The inverse of `step`, valid against the document after `step`.
    pub inverted: S,
    /// Creation sequence number of the local edit.
    pub origin: u64,
}

impl<S> Rebaseable<S> {
    /// Creates a rebaseable step.
    pub fn new(step: S, inverted: S, origin: u64) -> Self {
        Self {
            step,
            inverted,
            origin,
        }
    }
}

/// Builds rebaseable steps from every step of `transform`.
///
/// Origins are numbered consecutively from `first_origin`.
pub fn unconfirmed_from<S: Step>(transform: &Transform<S>, first_origin: u64) -> Vec<Rebaseable<S>> {
    transform
        .steps()
        .iter()
        .zip(transform.docs())
        .zip(first_origin..)
        .map(|((step, before), origin)| Rebaseable::new(step.clone(), step.invert(before), origin))
        .collect()
}

/// Rebases `steps` over `over`.
///
/// `transform` must be seeded at the document with `steps` applied. The
/// local steps are undone, `over` is applied, and every local step is
/// mapped forward and reapplied. Steps that no longer apply are dropped.
/// On return `transform` holds the full delta from the old document to
/// the rebased one.
pub fn rebase_steps<S: Step>(
    steps: &[Rebaseable<S>],
    over: &[S],
    transform: &mut Transform<S>,
) -> TransformResult<Vec<Rebaseable<S>>> {
    rebase_tail(steps, 0, over, transform)
}

/// Like [`rebase_steps`], but only the steps after the first `skip` are
/// reapplied.
///
/// Used when `over` already contains an accepted version of the first
/// `skip` steps.
pub fn rebase_tail<S: Step>(
    steps: &[Rebaseable<S>],
    skip: usize,
    over: &[S],
    transform: &mut Transform<S>,
) -> TransformResult<Vec<Rebaseable<S>>> {
    let base = transform.mapping().len();
    let count = steps.len();

    for (index, rebaseable) in steps.iter().enumerate().rev() {
        if let Err(err) = transform.maybe_step(rebaseable.inverted.clone()) {
            warn!(index, error = %err, "unconfirmed step could not be undone");
            return Err(TransformError::inconsistent(index));
        }
    }
    for (index, step) in over.iter().enumerate() {
        if let Err(err) = transform.maybe_step(step.clone()) {
            warn!(index, error = %err, "accepted step does not apply to the shared base");
            return Err(TransformError::inconsistent(index));
        }
    }

    let mut rebased = Vec::with_capacity(count.saturating_sub(skip));
    for (index, rebaseable) in steps.iter().enumerate().skip(skip) {
        // Map index of this step's undo.
        let undo = base + count - 1 - index;
        let Some(mapped) = rebaseable.step.map(&transform.mapping().slice(undo + 1)) else {
            debug!(origin = rebaseable.origin, "dropped step whose target was removed");
            continue;
        };

        match transform.maybe_step(mapped.clone()) {
            Ok(()) => {
                let applied = transform.mapping().len() - 1;
                transform.mapping_mut().set_mirror(undo, applied);
                let inverted = transform
                    .invert_last()
                    .ok_or_else(|| TransformError::inconsistent(index))?;
                rebased.push(Rebaseable::new(mapped, inverted, rebaseable.origin));
            }
            Err(err) if err.is_rejection() => {
                debug!(origin = rebaseable.origin, error = %err, "dropped rejected step");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(rebased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stepsync_transform::{TextDoc, TextStep};

    fn local(doc: &str, steps: Vec<TextStep>) -> (Transform<TextStep>, Vec<Rebaseable<TextStep>>) {
        let mut tr = Transform::new(TextDoc::from(doc));
        for step in steps {
            tr.step(step).unwrap();
        }
        let unconfirmed = unconfirmed_from(&tr, 0);
        (tr, unconfirmed)
    }

    #[test]
    fn unconfirmed_from_numbers_origins() {
        let (_, unconfirmed) = local("ab", vec![TextStep::insert(2, "c"), TextStep::delete(0, 1)]);
        assert_eq!(unconfirmed.len(), 2);
        assert_eq!(unconfirmed[0].inverted, TextStep::delete(2, 3));
        assert_eq!(unconfirmed[1].inverted, TextStep::insert(0, "a"));
        assert_eq!(unconfirmed[1].origin, 1);
    }

    #[test]
    fn empty_rebase() {
        let mut tr = Transform::new(TextDoc::from("ab"));
        let rebased = rebase_steps(&[], &[TextStep::insert(0, "x")], &mut tr).unwrap();
        assert!(rebased.is_empty());
        assert_eq!(tr.doc().to_string(), "xab");
    }

    #[test]
    fn local_step_is_shifted_by_remote_insert() {
        let (tr, unconfirmed) = local("ab", vec![TextStep::insert(2, "L")]);
        let mut tr = Transform::new(tr.into_doc());

        let rebased = rebase_steps(&unconfirmed, &[TextStep::insert(0, "R")], &mut tr).unwrap();

        assert_eq!(tr.doc().to_string(), "RabL");
        assert_eq!(rebased.len(), 1);
        assert_eq!(rebased[0].step, TextStep::insert(3, "L"));
        assert_eq!(rebased[0].inverted, TextStep::delete(3, 4));
        assert_eq!(rebased[0].origin, 0);
    }

    #[test]
    fn conflicting_step_is_dropped() {
        let (tr, unconfirmed) = local("abcde", vec![TextStep::delete(2, 3)]);
        let mut tr = Transform::new(tr.into_doc());

        let rebased = rebase_steps(&unconfirmed, &[TextStep::delete(1, 4)], &mut tr).unwrap();

        assert!(rebased.is_empty());
        assert_eq!(tr.doc().to_string(), "ae");
    }

    #[test]
    fn mirror_pairs_restore_positions_inside_own_insertions() {
        // The second local step edits inside text the first one inserted.
        let (tr, unconfirmed) = local("", vec![TextStep::insert(0, "ab"), TextStep::insert(1, "X")]);
        let mut tr = Transform::new(tr.into_doc());

        let rebased = rebase_steps(&unconfirmed, &[TextStep::insert(0, "Z")], &mut tr).unwrap();

        assert_eq!(tr.doc().to_string(), "ZaXb");
        assert_eq!(rebased.len(), 2);
        assert_eq!(rebased[0].step, TextStep::insert(1, "ab"));
        assert_eq!(rebased[1].step, TextStep::insert(2, "X"));
    }

    #[test]
    fn tail_rebase_skips_accepted_prefix() {
        let (tr, unconfirmed) = local("", vec![TextStep::insert(0, "a"), TextStep::insert(1, "b")]);
        let mut tr = Transform::new(tr.into_doc());

        let rebased = rebase_tail(&unconfirmed, 1, &[TextStep::insert(0, "a")], &mut tr).unwrap();

        assert_eq!(tr.doc().to_string(), "ab");
        assert_eq!(rebased.len(), 1);
        assert_eq!(rebased[0].step, TextStep::insert(1, "b"));
        assert_eq!(rebased[0].origin, 1);
    }

    #[test]
    fn broken_inverse_is_inconsistent() {
        let unconfirmed = vec![Rebaseable::new(
            TextStep::insert(0, "x"),
            TextStep::delete(5, 6),
            0,
        )];
        let mut tr = Transform::new(TextDoc::from("x"));

        let err = rebase_steps(&unconfirmed, &[], &mut tr).unwrap_err();
        assert_eq!(err, TransformError::inconsistent(0));
    }

    /// Resolves `(at, len, text)` seeds into steps that apply in sequence.
    fn resolve(doc: &TextDoc, seeds: &[(usize, usize, String)]) -> (Vec<TextStep>, TextDoc) {
        let mut doc = doc.clone();
        let mut steps = Vec::new();
        for (at, len, text) in seeds {
            let from = at % (doc.len() + 1);
            let to = (from + len).min(doc.len());
            let step = TextStep::replace(from, to, text.as_str());
            doc = step.apply(&doc).unwrap();
            steps.push(step);
        }
        (steps, doc)
    }

    fn seeds() -> impl Strategy<Value = Vec<(usize, usize, String)>> {
        prop::collection::vec((any::<usize>(), 0..4usize, "[a-z]{0,3}"), 0..6)
    }

    proptest! {
        #[test]
        fn rebased_doc_is_over_then_survivors(
            text in "[a-z]{0,12}",
            local_seeds in seeds(),
            over_seeds in seeds(),
        ) {
            let base = TextDoc::from(text.as_str());
            let (local_steps, _) = resolve(&base, &local_seeds);
            let (over, shared) = resolve(&base, &over_seeds);

            let mut local_tr = Transform::new(base.clone());
            for step in local_steps {
                local_tr.step(step).unwrap();
            }
            let unconfirmed = unconfirmed_from(&local_tr, 0);

            let mut tr = Transform::new(local_tr.into_doc());
            let rebased = rebase_steps(&unconfirmed, &over, &mut tr).unwrap();

            let mut expected = shared.clone();
            for r in &rebased {
                expected = r.step.apply(&expected).unwrap();
            }
            prop_assert_eq!(tr.doc(), &expected);

            // The fresh inverses lead back to the shared document.
            let mut undone = expected;
            for r in rebased.iter().rev() {
                undone = r.inverted.apply(&undone).unwrap();
            }
            prop_assert_eq!(undone, shared);
        }
    }
}
