use std::collections::VecDeque;

use crate::automaton::Automaton;
use crate::state_id::{fail_id, usize_to_state_id, StateID};
use crate::PayloadId;

/// A single automaton state: its sorted goto transitions, its failure
/// link, and the payload identifiers it emits.
///
/// Each output entry carries the length of the keyword that produced it
/// rather than relying on this state's own depth: a failure-inherited
/// output can come from a strictly shorter keyword than the path leading
/// to this state, and using this state's depth for it would report the
/// wrong start position (see `food`/`ood` in the keyword index tests).
#[derive(Clone)]
struct State<S> {
    goto: Vec<(u8, S)>,
    fail: S,
    output: Vec<(PayloadId, usize)>,
}

impl<S: StateID> State<S> {
    fn goto(&self, byte: u8) -> S {
        match self.goto.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.goto[i].1,
            Err(_) => fail_id(),
        }
    }

    fn set_goto(&mut self, byte: u8, next: S) {
        match self.goto.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.goto[i].1 = next,
            Err(i) => self.goto.insert(i, (byte, next)),
        }
    }
}

/// The arena-backed Aho-Corasick state machine: a trie of goto edges,
/// built incrementally by [`Nfa::enter`], augmented with failure links and
/// inherited outputs by [`Nfa::freeze`].
///
/// State `0` is a reserved sentinel ("no transition") that is never
/// actually entered; state `1` is the root / start state. This mirrors the
/// teacher crate's arena layout.
#[derive(Clone)]
pub(crate) struct Nfa<S: StateID = usize> {
    start_id: S,
    states: Vec<State<S>>,
}

impl<S: StateID> Nfa<S> {
    pub(crate) fn new() -> Self {
        let start_id = usize_to_state_id(1).expect("state id space too small for the root state");
        let mut states = Vec::with_capacity(2);
        // Reserved fail sentinel, index 0. Never reached by a transition.
        states.push(State { goto: vec![], fail: start_id, output: vec![] });
        // Root.
        states.push(State { goto: vec![], fail: start_id, output: vec![] });
        Nfa { start_id, states }
    }

    pub(crate) fn state_count(&self) -> usize {
        self.states.len()
    }

    fn state(&self, id: S) -> &State<S> {
        &self.states[id.to_usize()]
    }

    fn state_mut(&mut self, id: S) -> &mut State<S> {
        &mut self.states[id.to_usize()]
    }

    fn add_state(&mut self) -> Option<S> {
        let id = usize_to_state_id(self.states.len())?;
        self.states.push(State { goto: vec![], fail: self.start_id, output: vec![] });
        Some(id)
    }

    /// Walk `keyword` from the root, extending the trie as necessary, and
    /// attach `payload_id` to the output list of the resulting node.
    ///
    /// Returns `None` only if the chosen `StateID` representation runs out
    /// of room (e.g. `u8` with more than 255 states); that is a capacity
    /// misconfiguration by the caller, not a data error.
    pub(crate) fn enter(&mut self, keyword: &[u8], payload_id: PayloadId) -> Option<()> {
        let mut cur = self.start_id;
        let mut depth = 0;
        for &b in keyword {
            depth += 1;
            let next = self.state(cur).goto(b);
            let next = if next != fail_id() {
                next
            } else {
                let next = self.add_state()?;
                self.state_mut(cur).set_goto(b, next);
                next
            };
            cur = next;
        }
        self.state_mut(cur).output.push((payload_id, depth));
        Some(())
    }

    /// Build failure links by breadth-first traversal from the root, and
    /// augment every node's output list with the outputs reachable via its
    /// failure link. See the module-level algorithm description in
    /// `SPEC_FULL.md` §4.1 for the derivation.
    pub(crate) fn freeze(&mut self) {
        let mut queue: VecDeque<S> = VecDeque::new();

        let root_children: Vec<S> = self.state(self.start_id).goto.iter().map(|&(_, id)| id).collect();
        for &child in &root_children {
            self.state_mut(child).fail = self.start_id;
            queue.push_back(child);
        }

        while let Some(id) = queue.pop_front() {
            let children: Vec<(u8, S)> = self.state(id).goto.clone();
            for (b, next) in children {
                queue.push_back(next);

                let mut f = self.state(id).fail;
                while f != self.start_id && self.state(f).goto(b) == fail_id() {
                    f = self.state(f).fail;
                }
                let candidate = self.state(f).goto(b);
                let new_fail = if candidate != fail_id() && candidate != next {
                    candidate
                } else {
                    self.start_id
                };
                self.state_mut(next).fail = new_fail;

                let inherited = self.state(new_fail).output.clone();
                self.state_mut(next).output.extend(inherited);
            }
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "froze keyword index: {} states, {} of them reachable from root",
            self.states.len(),
            root_children.len()
        );
    }
}

impl<S: StateID> Automaton for Nfa<S> {
    type ID = S;

    fn start_state(&self) -> S {
        self.start_id
    }

    fn goto(&self, id: S, byte: u8) -> S {
        self.state(id).goto(byte)
    }

    fn fail(&self, id: S) -> S {
        self.state(id).fail
    }

    fn outputs(&self, id: S) -> &[(PayloadId, usize)] {
        &self.state(id).output
    }
}
