use crate::state_id::StateID;
use crate::PayloadId;

/// The state-machine primitives shared by the keyword index's search loop.
///
/// This mirrors the teacher crate's `Automaton` trait: a thin seam between
/// "the thing that owns states" ([`crate::nfa::Nfa`]) and "the thing that
/// walks them" ([`crate::index::QueryIter`]), so the walking code never has
/// to know how states are represented.
pub(crate) trait Automaton {
    type ID: StateID;

    /// The root state. Its failure link points to itself.
    fn start_state(&self) -> Self::ID;

    /// Follow the goto transition for `byte` from `id`, or return the
    /// sentinel `fail_id()` if none exists.
    fn goto(&self, id: Self::ID, byte: u8) -> Self::ID;

    /// The failure link of `id` (meaningless, and unused, before `freeze`).
    fn fail(&self, id: Self::ID) -> Self::ID;

    /// The payload identifiers attached to `id`, each paired with the
    /// length of the keyword that produced it (terminal outputs pre-freeze;
    /// terminal plus failure-inherited outputs post-freeze). The length is
    /// tracked per output, not read from `id`'s own depth, because an
    /// inherited output can come from a shorter keyword than `id`'s path.
    fn outputs(&self, id: Self::ID) -> &[(PayloadId, usize)];
}
