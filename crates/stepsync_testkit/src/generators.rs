//! Property-based test generators using proptest.
//!
//! Session actions carry position seeds rather than positions, since the
//! document they land in is only known when the action runs.

use crate::network::Network;
use proptest::prelude::*;
use stepsync_transform::TextStep;

/// Strategy for short insertion texts.
pub fn insert_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,4}").expect("Invalid regex")
}

/// Strategy for a text document's contents.
pub fn doc_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z ]{0,16}").expect("Invalid regex")
}

/// Strategy for a step that applies to a document of `len` characters.
pub fn text_step_strategy(len: usize) -> impl Strategy<Value = TextStep> {
    (0..=len)
        .prop_flat_map(move |from| (Just(from), from..=len))
        .prop_flat_map(|(from, to)| {
            prop_oneof![Just(String::new()), insert_text_strategy()]
                .prop_map(move |text| TextStep::replace(from, to, text))
        })
}

/// One thing a replica can do during a simulated session.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Insert text locally
    Insert {
        /// Replica index
        replica: usize,
        /// Position seed
        at: usize,
        /// Inserted text
        text: String,
    },
    /// Delete a range locally
    Delete {
        /// Replica index
        replica: usize,
        /// Start seed
        at: usize,
        /// Maximum deleted length
        len: usize,
    },
    /// Hand the pending commit to the authority
    Send {
        /// Replica index
        replica: usize,
    },
    /// Receive everything the authority has logged
    Sync {
        /// Replica index
        replica: usize,
    },
    /// Send, then sync every replica
    Broadcast {
        /// Replica index
        replica: usize,
    },
}

/// Strategy for a single session action among `replicas` replicas.
pub fn session_action_strategy(replicas: usize) -> impl Strategy<Value = SessionAction> {
    let replica = 0..replicas.max(1);
    prop_oneof![
        3 => (replica.clone(), any::<usize>(), insert_text_strategy())
            .prop_map(|(replica, at, text)| SessionAction::Insert { replica, at, text }),
        2 => (replica.clone(), any::<usize>(), 1..4usize)
            .prop_map(|(replica, at, len)| SessionAction::Delete { replica, at, len }),
        1 => replica.clone().prop_map(|replica| SessionAction::Send { replica }),
        1 => replica.clone().prop_map(|replica| SessionAction::Sync { replica }),
        1 => replica.prop_map(|replica| SessionAction::Broadcast { replica }),
    ]
}

/// Strategy for a whole session.
pub fn session_strategy(
    replicas: usize,
    max_actions: usize,
) -> impl Strategy<Value = Vec<SessionAction>> {
    prop::collection::vec(session_action_strategy(replicas), 0..max_actions)
}

impl SessionAction {
    /// Performs the action on `network`, resolving seeds against the
    /// replica's current document. Deletes on an empty document do nothing.
    pub fn apply(&self, network: &mut Network) {
        match self {
            SessionAction::Insert { replica, at, text } => {
                let pos = at % (network.doc_len(*replica) + 1);
                network.edit(*replica, vec![TextStep::insert(pos, text.as_str())]);
            }
            SessionAction::Delete { replica, at, len } => {
                let doc_len = network.doc_len(*replica);
                if doc_len == 0 {
                    return;
                }
                let from = at % doc_len;
                let to = (from + len).min(doc_len);
                network.edit(*replica, vec![TextStep::delete(from, to)]);
            }
            SessionAction::Send { replica } => network.send(*replica),
            SessionAction::Sync { replica } => network.sync(*replica),
            SessionAction::Broadcast { replica } => network.broadcast(*replica),
        }
    }
}

/// Runs every action of a session in order.
pub fn run_session(network: &mut Network, actions: &[SessionAction]) {
    for action in actions {
        action.apply(network);
    }
}
