use crate::automaton::Automaton;
use crate::error::IndexError;
use crate::finalizer::Finalizer;
use crate::nfa::Nfa;
use crate::state_id::{fail_id, StateID};
use crate::PayloadId;

/// A single occurrence reported by [`Index::query`]: a half-open byte range
/// `[start, end)` into the queried text, together with the payload that was
/// registered under the keyword that occurred there.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a, P> {
    start: usize,
    end: usize,
    payload: &'a P,
}

impl<'a, P> Match<'a, P> {
    /// The start of the match, inclusive.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end of the match, exclusive.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The payload associated with the keyword that matched.
    #[inline]
    pub fn payload(&self) -> &'a P {
        self.payload
    }
}

/// A multi-pattern exact byte-string matcher built on the Aho-Corasick
/// algorithm.
///
/// An `Index` starts `Open`: keywords may be [`enter`](Index::enter)ed,
/// each tagged with an opaque payload of type `P`. The first call to
/// [`fix`](Index::fix) (or the first [`query`](Index::query), through the
/// [`Registry`](crate::Registry) layer) builds the failure links and
/// freezes the index; after that, only queries are permitted.
///
/// `S` is the integer representation used for state identifiers (`u8`,
/// `u16`, `u32`, `u64` or `usize`, defaulting to `usize`); pick a narrower
/// one to shrink memory use when you know the automaton will stay small.
pub struct Index<P, S: StateID = usize> {
    nfa: Nfa<S>,
    payloads: Vec<P>,
    frozen: bool,
}

impl<P, S: StateID> Default for Index<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S: StateID> Index<P, S> {
    /// An empty, open index containing only the root state.
    pub fn new() -> Self {
        Index { nfa: Nfa::new(), payloads: Vec::new(), frozen: false }
    }

    /// Whether [`fix`](Index::fix) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Enter `keyword`, tagging its occurrences with `payload`.
    ///
    /// Entering the same keyword twice keeps both payloads: each occurrence
    /// of the keyword will emit every payload ever attached to it, in
    /// insertion order.
    pub fn enter(&mut self, keyword: &[u8], payload: P) -> Result<(), IndexError> {
        if self.frozen {
            return Err(IndexError::AlreadyFrozen);
        }
        if keyword.is_empty() {
            return Err(IndexError::InvalidKeyword);
        }

        let payload_id = PayloadId(self.payloads.len());
        self.payloads.push(payload);
        self.nfa
            .enter(keyword, payload_id)
            .expect("state id representation exhausted; choose a wider StateID");
        Ok(())
    }

    /// Build failure links and freeze the index. Idempotent calls after the
    /// first fail with [`IndexError::AlreadyFrozen`].
    pub fn fix(&mut self) -> Result<(), IndexError> {
        if self.frozen {
            return Err(IndexError::AlreadyFrozen);
        }
        self.nfa.freeze();
        self.frozen = true;
        Ok(())
    }

    /// Find every occurrence of every entered keyword in `text`, in
    /// ascending end-position order.
    pub fn query<'a>(&'a self, text: &'a [u8]) -> Result<QueryIter<'a, P, S>, IndexError> {
        if !self.frozen {
            return Err(IndexError::NotFrozen);
        }
        let start = self.nfa.start_state();
        Ok(QueryIter {
            index: self,
            text,
            pos: 0,
            cur: start,
            emit_node: start,
            emit_idx: 0,
            emit_end: 0,
        })
    }

    /// Consume the index and return ownership of every payload it
    /// retained, in insertion order. Equivalent to letting the `Index`
    /// simply drop: every payload is owned by value and gets dropped (or,
    /// here, handed back) exactly once.
    pub fn destroy(self) -> Vec<P> {
        self.payloads
    }

    /// Consume the index, running `finalizer` once per retained payload
    /// (insertion order) instead of returning them. See the [`finalizer`]
    /// module for when you'd want this over plain [`destroy`](Index::destroy).
    pub fn destroy_with<F: Finalizer<P>>(self, finalizer: F) {
        for payload in self.payloads {
            finalizer.finalize(payload);
        }
    }
}

/// A streaming iterator over the occurrences [`Index::query`] finds.
pub struct QueryIter<'a, P, S: StateID = usize> {
    index: &'a Index<P, S>,
    text: &'a [u8],
    pos: usize,
    cur: S,
    emit_node: S,
    emit_idx: usize,
    emit_end: usize,
}

impl<'a, P, S: StateID> Iterator for QueryIter<'a, P, S> {
    type Item = Match<'a, P>;

    fn next(&mut self) -> Option<Match<'a, P>> {
        loop {
            let outputs = self.index.nfa.outputs(self.emit_node);
            if self.emit_idx < outputs.len() {
                let (payload_id, len) = outputs[self.emit_idx];
                self.emit_idx += 1;
                let end = self.emit_end;
                let start = end - len;
                return Some(Match { start, end, payload: &self.index.payloads[payload_id.0] });
            }

            if self.pos >= self.text.len() {
                return None;
            }
            let byte = self.text[self.pos];
            self.pos += 1;

            let start_id = self.index.nfa.start_state();
            let mut c = self.cur;
            while c != start_id && self.index.nfa.goto(c, byte) == fail_id() {
                c = self.index.nfa.fail(c);
            }
            let next = self.index.nfa.goto(c, byte);
            self.cur = if next != fail_id() { next } else { start_id };

            self.emit_node = self.cur;
            self.emit_idx = 0;
            self.emit_end = self.pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx() -> Index<&'static str> {
        Index::new()
    }

    #[test]
    fn overlapping_keywords_from_spec_scenario_one() {
        let mut index = idx();
        index.enter(b"he", "he").unwrap();
        index.enter(b"she", "she").unwrap();
        index.enter(b"his", "his").unwrap();
        index.enter(b"hers", "hers").unwrap();
        index.fix().unwrap();

        let got: Vec<_> = index
            .query(b"this here is history")
            .unwrap()
            .map(|m| ((m.start(), m.end()), *m.payload()))
            .collect();

        assert_eq!(
            got,
            vec![((1, 4), "his"), ((5, 7), "he"), ((13, 16), "his")]
        );
    }

    #[test]
    fn common_suffix_keyword_still_reported_via_failure_link() {
        let mut index = idx();
        index.enter(b"food", "Owt").unwrap();
        index.enter(b"ood", "Owt").unwrap();
        index.fix().unwrap();

        let got: Vec<_> = index.query(b"a real food situation").unwrap().collect();
        // "food" (7..11, terminal) and "ood" (8..11, inherited via the
        // failure link from "food"'s node) both end at the same position;
        // the terminal payload is emitted before the inherited one.
        assert_eq!(got.len(), 2);
        assert_eq!((got[0].start(), got[0].end()), (7, 11));
        assert_eq!((got[1].start(), got[1].end()), (8, 11));
    }

    #[test]
    fn no_match_emits_nothing() {
        let mut index = idx();
        index.enter(b"food", "Owt").unwrap();
        index.enter(b"ood", "Owt").unwrap();
        index.fix().unwrap();

        let got: Vec<_> = index.query(b"blah").unwrap().collect();
        assert!(got.is_empty());
    }

    #[test]
    fn duplicate_keyword_entry_preserves_both_payloads() {
        let mut index = idx();
        index.enter(b"mint", "first").unwrap();
        index.enter(b"mint", "second").unwrap();
        index.fix().unwrap();

        let got: Vec<_> = index.query(b"mint").unwrap().map(|m| *m.payload()).collect();
        assert_eq!(got, vec!["first", "second"]);
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let mut index: Index<&str> = idx();
        assert_eq!(index.enter(b"", "x"), Err(IndexError::InvalidKeyword));
    }

    #[test]
    fn empty_query_succeeds_with_no_matches() {
        let mut index = idx();
        index.enter(b"mint", "x").unwrap();
        index.fix().unwrap();
        assert_eq!(index.query(b"").unwrap().count(), 0);
    }

    #[test]
    fn cannot_enter_after_fix() {
        let mut index = idx();
        index.enter(b"mint", "x").unwrap();
        index.fix().unwrap();
        assert_eq!(index.enter(b"pepper", "y"), Err(IndexError::AlreadyFrozen));
    }

    #[test]
    fn cannot_fix_twice() {
        let mut index: Index<&str> = idx();
        index.fix().unwrap();
        assert_eq!(index.fix(), Err(IndexError::AlreadyFrozen));
    }

    #[test]
    fn cannot_query_before_fix() {
        let index: Index<&str> = idx();
        assert!(matches!(index.query(b"foo"), Err(IndexError::NotFrozen)));
    }

    #[test]
    fn single_byte_keyword_matches() {
        let mut index = idx();
        index.enter(b"x", "ex").unwrap();
        index.fix().unwrap();
        let got: Vec<_> = index.query(b"axbxc").unwrap().map(|m| (m.start(), m.end())).collect();
        assert_eq!(got, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn overlapping_occurrences_are_all_reported() {
        let mut index = idx();
        index.enter(b"aa", "aa").unwrap();
        index.fix().unwrap();
        let got: Vec<_> = index.query(b"aaaa").unwrap().map(|m| (m.start(), m.end())).collect();
        assert_eq!(got, vec![(0, 2), (1, 3), (2, 4)]);
    }

    #[test]
    fn self_entered_keyword_round_trips_to_exactly_one_match() {
        let mut index = idx();
        index.enter(b"keyword", "payload").unwrap();
        index.fix().unwrap();
        let got: Vec<_> = index.query(b"keyword").unwrap().collect();
        assert_eq!(got.len(), 1);
        assert_eq!((got[0].start(), got[0].end()), (0, 7));
        assert_eq!(*got[0].payload(), "payload");
    }

    #[test]
    fn destroy_returns_every_retained_payload() {
        let mut index = idx();
        index.enter(b"a", "one").unwrap();
        index.enter(b"b", "two").unwrap();
        index.fix().unwrap();
        let mut payloads = index.destroy();
        payloads.sort_unstable();
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn destroy_with_release_runs_once_per_payload() {
        use crate::finalizer::{Finalizer, Release, Releasable};
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Handle {
            released: Rc<RefCell<Vec<u32>>>,
            id: u32,
        }
        impl Releasable for Handle {
            fn release(self) {
                self.released.borrow_mut().push(self.id);
            }
        }

        let released = Rc::new(RefCell::new(Vec::new()));
        let mut index = idx_handles();
        index
            .enter(b"a", Handle { released: released.clone(), id: 1 })
            .unwrap();
        index
            .enter(b"b", Handle { released: released.clone(), id: 2 })
            .unwrap();
        index.fix().unwrap();

        index.destroy_with(Release);
        let mut seen = released.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);

        fn idx_handles() -> Index<Handle> {
            Index::new()
        }
    }

    #[test]
    fn narrow_state_id_representation_still_works() {
        let mut index: Index<&str, u16> = Index::new();
        index.enter(b"foo", "foo").unwrap();
        index.enter(b"bar", "bar").unwrap();
        index.fix().unwrap();
        let got: Vec<_> = index.query(b"a foo and a bar").unwrap().map(|m| *m.payload()).collect();
        assert_eq!(got, vec!["foo", "bar"]);
    }
}
