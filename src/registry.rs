//! The Clue-Indexed Registry: a thread-safe layer that binds whole regular
//! expressions to payloads via one literal "clue" extracted from each
//! expression, falling back to an always-returned bucket for expressions
//! with no usable clue.
//!
//! Grounded on `esmre.py`'s `Index` class: `enter`/`query` with the same
//! freeze-on-first-query contract, the same hintless bucket, and the same
//! ASCII-only case folding. The one-way Open→Frozen transition follows the
//! teacher crate's own freeze step, widened from `&mut self` to safe
//! concurrent `&self` access: a `std::sync::RwLock` serializes `enter`
//! calls and the freeze race exactly as the teacher's builder serializes
//! construction, and the frozen automaton is then handed to a
//! `std::sync::OnceLock` so that `query` can hand back `&P` borrowed
//! straight from `&self` — `query` never holds a lock guard across the
//! reference it returns, which a plain `RwLockReadGuard` cannot do in safe
//! code once the guard itself has to be dropped before the function
//! returns.

use std::sync::{OnceLock, RwLock};

use crate::error::RegistryError;
use crate::hint::shortlist;
use crate::index::Index;

/// Tuning knobs for a [`Registry`], set once at construction time via
/// [`RegistryBuilder`].
#[derive(Debug, Clone, Copy)]
pub struct RegistryOptions {
    pub(crate) min_hint_len: usize,
    pub(crate) fold_case: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions { min_hint_len: 1, fold_case: true }
    }
}

/// Builds a [`Registry`] with non-default [`RegistryOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryBuilder {
    options: RegistryOptions,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Hints shorter than `len` are treated as if the expression had none,
    /// falling back to the hintless bucket. Guards against a flood of
    /// one- or two-byte hints that would filter almost nothing while
    /// bloating the automaton. Default: `1` (any non-empty hint is used).
    pub fn min_hint_len(mut self, len: usize) -> Self {
        self.options.min_hint_len = len;
        self
    }

    /// Whether hints and query text are ASCII-folded to lowercase before
    /// comparison. Default: `true`, matching the original behavior.
    pub fn fold_case(mut self, fold: bool) -> Self {
        self.options.fold_case = fold;
        self
    }

    pub fn build<P>(self) -> Registry<P> {
        Registry::with_options(self.options)
    }
}

struct OpenState<P> {
    index: Index<P>,
    hintless: Vec<P>,
}

struct FrozenState<P> {
    index: Index<P>,
    hintless: Vec<P>,
}

/// A thread-safe map from regular expressions to payloads, queried by
/// plain text rather than by re-running every stored regex.
///
/// Starts `Open`: [`enter`](Registry::enter) may be called freely. The
/// first [`query`](Registry::query) freezes the registry; every `enter`
/// after that fails with [`RegistryError::AlreadyFrozen`].
pub struct Registry<P> {
    options: RegistryOptions,
    open: RwLock<Option<OpenState<P>>>,
    frozen: OnceLock<FrozenState<P>>,
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Registry<P> {
    /// An open, empty registry with default options.
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub(crate) fn with_options(options: RegistryOptions) -> Self {
        Registry {
            options,
            open: RwLock::new(Some(OpenState { index: Index::new(), hintless: Vec::new() })),
            frozen: OnceLock::new(),
        }
    }

    /// Register `payload` under `regex`. A literal clue is extracted from
    /// `regex` via [`hints`]/[`shortlist`]; if none is found (or the best
    /// one is shorter than the configured minimum), `payload` always
    /// matches via the hintless bucket instead.
    pub fn enter(&self, regex: &str, payload: P) -> Result<(), RegistryError> {
        if self.frozen.get().is_some() {
            return Err(RegistryError::AlreadyFrozen);
        }
        let mut guard = self.open.write().expect("registry lock poisoned");
        let open = guard.as_mut().ok_or(RegistryError::AlreadyFrozen)?;

        let clue = shortlist(regex)
            .filter(|h| h.len() >= self.options.min_hint_len)
            .map(|h| if self.options.fold_case { fold_ascii(&h) } else { h });
        match clue {
            Some(clue) => {
                open.index
                    .enter(clue.as_bytes(), payload)
                    .expect("registry's own min-length filter already excludes empty clues");
            }
            None => open.hintless.push(payload),
        }
        Ok(())
    }

    /// Every payload whose clue occurs in `text`, plus every hintless
    /// payload (which always matches). The hintless bucket comes first,
    /// in insertion order; clue-matched payloads follow in ascending
    /// end-position order, with same-end-position payloads in the
    /// automaton's insertion/BFS order.
    ///
    /// The first call to `query` freezes the registry: `enter` cannot be
    /// called on it again afterwards.
    pub fn query(&self, text: &str) -> Vec<&P> {
        if self.frozen.get().is_none() {
            self.freeze();
        }
        let frozen = self.frozen.get().expect("just froze it above");
        self.run_query(&frozen.index, &frozen.hintless, text)
    }

    /// Move the open state's contents into the frozen `OnceLock`, building
    /// failure links along the way. A no-op if another thread already won
    /// the race (checked again under the write lock).
    fn freeze(&self) {
        let mut guard = self.open.write().expect("registry lock poisoned");
        if self.frozen.get().is_some() {
            return;
        }
        let open = guard.take().expect("open state only ever taken once, here");
        let mut index = open.index;
        index.fix().expect("freshly built index is never already frozen");
        #[cfg(feature = "logging")]
        log::debug!("froze registry on first query");
        // Ignore the Err case: it would mean another thread set this
        // between our check and now, which the write lock above rules out.
        let _ = self.frozen.set(FrozenState { index, hintless: open.hintless });
    }

    fn run_query<'a>(&self, index: &'a Index<P>, hintless: &'a [P], text: &str) -> Vec<&'a P> {
        let folded;
        let haystack: &str = if self.options.fold_case {
            folded = fold_ascii(text);
            &folded
        } else {
            text
        };

        let mut out: Vec<&P> = hintless.iter().collect();
        out.extend(
            index
                .query(haystack.as_bytes())
                .expect("index is frozen by the time any query runs")
                .map(|m| m.payload()),
        );
        out
    }
}

fn fold_ascii(s: &str) -> String {
    s.chars().map(|c| c.to_ascii_lowercase()).collect()
}
