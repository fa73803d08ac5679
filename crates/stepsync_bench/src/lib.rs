//! Benchmark utilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stepsync_protocol::Commit;
use stepsync_transform::{Step, TextDoc, TextStep};

/// Generate a document of `len` random lowercase characters.
pub fn random_doc(len: usize, seed: u64) -> TextDoc {
    let mut rng = StdRng::seed_from_u64(seed);
    let text: String = (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    TextDoc::from(text.as_str())
}

/// Generate `count` random edits applying in sequence to `doc`.
///
/// Returns the steps and the document they produce.
pub fn random_edits(doc: &TextDoc, count: usize, seed: u64) -> (Vec<TextStep>, TextDoc) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut doc = doc.clone();
    let mut steps = Vec::with_capacity(count);

    for _ in 0..count {
        let len = doc.len();
        let from = rng.gen_range(0..=len);
        let step = if len > from && rng.gen_bool(0.3) {
            TextStep::delete(from, (from + rng.gen_range(1..4)).min(len))
        } else {
            TextStep::insert(from, "xy")
        };
        doc = match step.apply(&doc) {
            Ok(next) => next,
            Err(_) => continue,
        };
        steps.push(step);
    }

    (steps, doc)
}

/// Generate `count` single-step commits, consecutively versioned from 1.
pub fn random_history(doc: &TextDoc, count: usize, seed: u64) -> (Vec<Commit<TextStep>>, TextDoc) {
    let (steps, doc) = random_edits(doc, count, seed);
    let commits = steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| Commit::new(i as u64 + 1, format!("h{i}"), vec![step]))
        .collect();
    (commits, doc)
}
