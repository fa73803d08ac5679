//! Authority merge: forwarding a stale proposal through accepted history.

use crate::error::{ServerError, ServerResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stepsync_protocol::{codec, Commit};
use stepsync_transform::{Mapping, Step, Transform};
use tracing::debug;

/// The result of merging one proposal.
#[derive(Debug, Clone)]
pub struct Merged<S: Step> {
    /// The authoritative document after the surviving steps.
    pub doc: S::Doc,
    /// The commit to log, at the next version.
    pub commit: Commit<S>,
    /// Proposal steps that could not be applied.
    pub dropped: usize,
}

/// Merges `proposal` into the authoritative document.
///
/// `intervening` must hold exactly the logged commits after the
/// proposal's base version, in order, and `doc` the document at
/// `version`. Each proposal step is mapped back to the proposal's base,
/// forward through the intervening history and through the proposal
/// steps already merged, then applied. Steps that no longer apply are
/// dropped; the emitted commit keeps the proposal's ref even when it
/// carries no steps.
pub fn authority_merge<S: Step>(
    version: u64,
    intervening: &[Commit<S>],
    proposal: &Commit<S>,
    doc: &S::Doc,
) -> ServerResult<Merged<S>> {
    if proposal.version > version {
        return Err(ServerError::FutureBase {
            base: proposal.version,
            current: version,
        });
    }
    let behind = version - proposal.version;
    if intervening.len() as u64 != behind {
        return Err(ServerError::InvalidRequest(format!(
            "expected {} intervening commits, got {}",
            behind,
            intervening.len()
        )));
    }

    let count = proposal.steps.len();
    let mut mapping = Mapping::from_maps(proposal.steps.iter().map(Step::get_map).collect()).invert();
    for commit in intervening {
        for step in &commit.steps {
            mapping.append_map(step.get_map(), None);
        }
    }

    let mut transform = Transform::<S>::new(doc.clone());
    let mut dropped = 0;
    for (index, step) in proposal.steps.iter().enumerate() {
        // Map index of this step's inverse.
        let undo = count - 1 - index;
        let Some(mapped) = step.map(&mapping.slice(undo + 1)) else {
            dropped += 1;
            continue;
        };

        match transform.maybe_step(mapped.clone()) {
            Ok(()) => mapping.append_map(mapped.get_map(), Some(undo)),
            Err(err) if err.is_rejection() => dropped += 1,
            Err(err) => return Err(err.into()),
        }
    }

    if dropped > 0 {
        debug!(
            reference = %proposal.reference,
            base = proposal.version,
            version = version + 1,
            dropped,
            "proposal partially applied"
        );
    }

    let steps = transform.steps().to_vec();
    Ok(Merged {
        doc: transform.into_doc(),
        commit: Commit::new(version + 1, proposal.reference.clone(), steps),
        dropped,
    })
}

/// [`authority_merge`] over JSON values.
///
/// Takes the document, the intervening commits (a JSON array) and the
/// proposal in their wire shape and returns the new document and the
/// new commit in the same shape.
pub fn merge_json<S>(
    version: u64,
    doc: Value,
    intervening: Value,
    proposal: Value,
) -> ServerResult<(Value, Value)>
where
    S: Step + Serialize + DeserializeOwned,
    S::Doc: Serialize + DeserializeOwned,
{
    let doc: S::Doc = codec::from_json(doc)?;
    let intervening: Vec<Commit<S>> = codec::from_json(intervening)?;
    let proposal: Commit<S> = codec::from_json(proposal)?;

    let merged = authority_merge(version, &intervening, &proposal, &doc)?;
    Ok((codec::to_json(&merged.doc)?, codec::to_json(&merged.commit)?))
}
