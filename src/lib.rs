//! A multi-pattern keyword index built on the Aho-Corasick algorithm,
//! paired with a conservative regex hint extractor and a thread-safe
//! registry that composes the two: enter a pile of regular expressions,
//! then ask which ones could possibly match a given piece of text without
//! running any of them.
//!
//! - [`Index`] is the low-level automaton: enter byte-string keywords
//!   tagged with opaque payloads, freeze it, then query it for every
//!   occurrence of every keyword in one linear pass.
//! - [`hints`] and [`shortlist`] pull literal substrings out of a regex
//!   source string that are guaranteed to occur in anything it matches.
//! - [`Registry`] binds whole regexes to payloads via their shortlisted
//!   hint, returning a superset of the expressions that could match; with
//!   the `confirm` feature, [`ConfirmedRegistry`] narrows that superset to
//!   an exact answer by re-running the real `regex` crate.

mod automaton;
mod error;
mod finalizer;
mod hint;
mod index;
mod nfa;
mod registry;
mod state_id;

#[cfg(feature = "confirm")]
mod confirmed;

pub use error::{IndexError, RegistryError};
pub use finalizer::{Finalizer, Keep, Release, Releasable};
pub use hint::{hints, shortlist};
pub use index::{Index, Match, QueryIter};
pub use registry::{Registry, RegistryBuilder, RegistryOptions};
pub use state_id::StateID;

#[cfg(feature = "confirm")]
pub use confirmed::{ConfirmedRegistry, ConfirmedRegistryBuilder};

/// An opaque identifier into an [`Index`]'s payload store.
///
/// Automaton nodes hold these instead of payload values directly, so the
/// same payload can be referenced from multiple nodes (a terminal node and
/// every node that inherits its output via a failure link) without
/// requiring `P: Clone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PayloadId(pub(crate) usize);
