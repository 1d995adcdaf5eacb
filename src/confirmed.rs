//! An exact-match refinement over [`Registry`]: each payload is paired
//! with its original compiled regex, and `query` re-tests that regex
//! against the text before returning a payload, turning the base
//! registry's superset result into an exact one.
//!
//! Grounded on `esmre_tests.py`'s `NewIndexTests` (which pairs the
//! C-backed prefilter with a second, real-regex confirmation pass to
//! demonstrate the prefilter is a superset) and on
//! `ua-parser-uap-rust`'s `Regexes::matching`, which runs the same
//! "cheap candidate filter, then confirm with a real `regex::Regex`"
//! two-step for user-agent parsing.

use regex::Regex;

use crate::error::RegistryError;
use crate::registry::{Registry, RegistryOptions};

struct Entry<P> {
    regex: Regex,
    payload: P,
}

/// Like [`Registry`], but `query` returns only payloads whose original
/// regex actually matches `text`, rather than every payload whose clue
/// merely occurs in it.
pub struct ConfirmedRegistry<P> {
    inner: Registry<Entry<P>>,
}

impl<P> Default for ConfirmedRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ConfirmedRegistry<P> {
    pub fn new() -> Self {
        ConfirmedRegistry { inner: Registry::new() }
    }

    fn with_options(options: RegistryOptions) -> Self {
        ConfirmedRegistry { inner: Registry::with_options(options) }
    }

    /// Compile `regex` (surfacing [`RegistryError::Regex`] on a syntax
    /// error) and register `payload` under it, the same way
    /// [`Registry::enter`] would, but keeping the compiled pattern around
    /// for confirmation at query time.
    pub fn enter(&self, regex: &str, payload: P) -> Result<(), RegistryError> {
        let compiled = Regex::new(regex)?;
        self.inner.enter(regex, Entry { regex: compiled, payload })
    }

    /// Every payload whose original regex matches `text` exactly. A
    /// superset is first gathered the same way [`Registry::query`] would,
    /// then narrowed by re-running each candidate's compiled regex.
    pub fn query(&self, text: &str) -> Vec<&P> {
        self.inner
            .query(text)
            .into_iter()
            .filter(|entry| entry.regex.is_match(text))
            .map(|entry| &entry.payload)
            .collect()
    }
}

/// Builds a [`ConfirmedRegistry`] with non-default [`RegistryOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmedRegistryBuilder {
    options: RegistryOptions,
}

impl ConfirmedRegistryBuilder {
    pub fn new() -> Self {
        ConfirmedRegistryBuilder::default()
    }

    pub fn min_hint_len(mut self, len: usize) -> Self {
        self.options.min_hint_len = len;
        self
    }

    pub fn fold_case(mut self, fold: bool) -> Self {
        self.options.fold_case = fold;
        self
    }

    pub fn build<P>(self) -> ConfirmedRegistry<P> {
        ConfirmedRegistry::with_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_is_rejected_by_confirmation_even_though_the_hint_matches() {
        let registry = ConfirmedRegistry::new();
        // The hint extractor drops lookahead content, so its clue is
        // empty and this expression lands in the hintless bucket,
        // always reaching confirmation; the real regex then rejects
        // text where the lookahead fails.
        registry.enter(r"foo(?=bar)", "foobar-only").unwrap();

        assert_eq!(registry.query("foobar"), vec![&"foobar-only"]);
        assert_eq!(registry.query("foobaz"), Vec::<&&str>::new());
    }

    #[test]
    fn clue_match_without_full_match_is_filtered_out() {
        let registry = ConfirmedRegistry::new();
        registry.enter(r"hello\d+", "digits after hello").unwrap();

        // "hello" is the clue and occurs here, but the regex requires a
        // trailing digit run that is absent.
        assert_eq!(registry.query("hello world"), Vec::<&&str>::new());
        assert_eq!(registry.query("hello42"), vec![&"digits after hello"]);
    }

    #[test]
    fn invalid_regex_is_rejected_at_enter_time() {
        let registry: ConfirmedRegistry<&str> = ConfirmedRegistry::new();
        assert!(matches!(registry.enter("(unclosed", "x"), Err(RegistryError::Regex(_))));
    }
}
