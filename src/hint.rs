//! A conservative regex "hint" extractor.
//!
//! [`hints`] scans a regex source string with a context-stack lexer and
//! returns every literal byte run it can prove must appear, verbatim, in
//! any text the regex matches.
//!
//! The lexer is a direct re-expression of the state-object hierarchy in
//! the upstream `esmre.py` (`CollectingState`, `InGroupState`,
//! `IgnoredGroupState`, ...), as an explicit stack of [`Context`] values
//! instead of a chain of Python objects. Two behaviors worth calling out,
//! both adopted per `SPEC_FULL.md` §4.2:
//!
//! - A group without top-level alternation *does* contribute its inner
//!   hints to its parent (`(ab)` contributes `"ab"`).
//! - Encountering `|` at the top level discards every hint collected so
//!   far, for good: a top-level alternation defeats hinting entirely.
//! - Every extension group `(?...)` is treated as non-contributing
//!   (`Ignored Group`) except `(?P<name>...)`, which behaves like a plain
//!   group once the name is closed by `>`. This covers non-capturing
//!   groups, lookaround, flags, comments, backreferences and conditionals
//!   alike: none of them contribute.

/// A completed run of literal bytes, or a nested list of fragments
/// contributed by a child group. Mirrors `esmre.py`'s `hints` list, whose
/// entries can themselves be lists.
#[derive(Debug, Clone)]
enum Fragment {
    Literal(String),
    Nested(Vec<Fragment>),
}

/// How far we've gotten in classifying the construct opened by a `(`,
/// before enough lookahead bytes have arrived to know whether it is a
/// plain group, an ignored extension group, or a named group.
#[derive(Clone, Copy)]
enum GroupProbe {
    JustOpened,
    SeenQuestion,
    SeenQuestionP,
}

/// One level of the context stack. `Root`, `Group` and `NamedGroup`
/// collect hints; `IgnoredGroup`, `Class`, `Braces` and `Backslash` just
/// consume bytes. `AwaitingGroupKind` is transient: it is replaced by one
/// of the others as soon as enough bytes have been seen to classify the
/// group that was just opened.
enum Context {
    Root(Collecting),
    Group(Collecting),
    IgnoredGroup(Collecting),
    NamedGroup { collecting: Collecting, name_open: bool },
    AwaitingGroupKind(GroupProbe),
    Class,
    Braces,
    Backslash,
}

/// The hint-collecting state shared by `Root`, `Group` and `NamedGroup`:
/// a list of finalized fragments plus the in-progress current hint, and
/// whether a top-level `|` was seen directly inside this context (which,
/// for a group, suppresses its contribution to the parent entirely).
struct Collecting {
    fragments: Vec<Fragment>,
    current: Vec<u8>,
    had_alternation: bool,
}

impl Collecting {
    fn new() -> Self {
        Collecting { fragments: Vec::new(), current: Vec::new(), had_alternation: false }
    }

    /// Bank the current run as a finished literal, dropping whatever
    /// immediately precedes the quantifier that isn't guaranteed to occur:
    /// either the last literal byte, or, if the run is empty because the
    /// quantifier instead follows a just-closed group (`(ab)?`), that
    /// group's whole contribution. A quantified group is no more
    /// guaranteed to appear than a quantified byte is.
    fn bank_without_last_byte(&mut self) {
        if self.current.is_empty() {
            if let Some(Fragment::Nested(_)) = self.fragments.last() {
                self.fragments.pop();
            }
            return;
        }
        self.current.pop();
        self.bank();
    }

    fn bank(&mut self) {
        let current = std::mem::take(&mut self.current);
        if !current.is_empty() {
            self.fragments.push(Fragment::Literal(bytes_to_hint(current)));
        }
    }

    fn append(&mut self, byte: u8) {
        self.current.push(byte);
    }

    fn forget_all(&mut self) {
        self.fragments.clear();
        self.current.clear();
    }

    fn finish(mut self) -> Vec<Fragment> {
        if !self.current.is_empty() {
            self.fragments.push(Fragment::Literal(bytes_to_hint(self.current)));
        }
        self.fragments
    }
}

/// Every split point the lexer banks on (`?`, `*`, `{`, `+`, `.`, `^`, `$`,
/// `(`, `[`, `\`, `|`, `)`) is a single ASCII byte, and UTF-8 continuation
/// bytes are always `>= 0x80`, so a run never gets split mid-character.
fn bytes_to_hint(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("regex source is valid UTF-8 and runs only split on ASCII bytes")
}

/// Signals that a top-level `|` was seen: the whole analysis must stop
/// and yield no hints, mirroring `esmre.py`'s `StopIteration` escape.
struct Abort;

/// Derive the set of literal byte substrings guaranteed to appear in any
/// text this regex matches. Never fails; unrecognized or ambiguous syntax
/// just yields fewer (possibly zero) hints.
pub fn hints(regex: &str) -> Vec<String> {
    let mut stack: Vec<Context> = vec![Context::Root(Collecting::new())];

    for byte in regex.bytes() {
        if step(&mut stack, byte).is_err() {
            return Vec::new();
        }
    }

    // Fold any still-open groups/classes back into the root, as if each
    // had been closed by its natural closing byte. A malformed
    // (unterminated) regex is handled conservatively rather than panicking.
    while stack.len() > 1 {
        close_top(&mut stack);
    }

    let root = match stack.pop().expect("root context always present") {
        Context::Root(collecting) => collecting,
        _ => unreachable!("only the root context survives to the bottom of the stack"),
    };

    let mut out = Vec::new();
    flatten(root.finish(), &mut out);
    out
}

/// Pick the single longest hint, to use as a necessary-condition prefilter
/// for the regex it was extracted from. Ties keep the first (leftmost)
/// hint of the winning length.
pub fn shortlist(regex: &str) -> Option<String> {
    hints(regex).into_iter().fold(None, |best: Option<String>, candidate| match &best {
        Some(b) if b.len() >= candidate.len() => best,
        _ => Some(candidate),
    })
}

fn flatten(fragments: Vec<Fragment>, out: &mut Vec<String>) {
    for fragment in fragments {
        match fragment {
            Fragment::Literal(s) => out.push(s),
            Fragment::Nested(inner) => flatten(inner, out),
        }
    }
}

/// Fold the top context into its parent as if it had just been closed,
/// without requiring the closing byte to actually be present.
fn close_top(stack: &mut Vec<Context>) {
    let top = stack.pop().expect("caller checked stack.len() > 1");
    match top {
        Context::Root(_) => unreachable!("root is never closed"),
        Context::AwaitingGroupKind(_) | Context::Class | Context::Braces | Context::Backslash => {}
        Context::Group(collecting) => merge_group_into_parent(stack, collecting),
        Context::IgnoredGroup(_) => {}
        Context::NamedGroup { collecting, .. } => merge_group_into_parent(stack, collecting),
    }
}

fn merge_group_into_parent(stack: &mut [Context], collecting: Collecting) {
    if collecting.had_alternation {
        return;
    }
    let fragments = collecting.finish();
    if let Some(parent) = collecting_of(stack.last_mut()) {
        parent.fragments.push(Fragment::Nested(fragments));
    }
}

fn collecting_of(ctx: Option<&mut Context>) -> Option<&mut Collecting> {
    match ctx {
        Some(Context::Root(c)) => Some(c),
        Some(Context::Group(c)) => Some(c),
        Some(Context::NamedGroup { collecting, .. }) => Some(collecting),
        _ => None,
    }
}

/// Advance the lexer by one byte. `Err(Abort)` means a top-level `|` was
/// seen: the caller must discard everything and return no hints.
fn step(stack: &mut Vec<Context>, byte: u8) -> Result<(), Abort> {
    match stack.last_mut().expect("root context always present") {
        Context::Class => {
            match byte {
                b']' => {
                    stack.pop();
                }
                b'\\' => stack.push(Context::Backslash),
                _ => {}
            }
            return Ok(());
        }
        Context::Braces => {
            if byte == b'}' {
                stack.pop();
            }
            return Ok(());
        }
        Context::Backslash => {
            stack.pop();
            return Ok(());
        }
        Context::IgnoredGroup(_) => {
            match byte {
                b'(' => stack.push(Context::AwaitingGroupKind(GroupProbe::JustOpened)),
                b'[' => stack.push(Context::Class),
                b'\\' => stack.push(Context::Backslash),
                b')' => {
                    stack.pop();
                }
                _ => {}
            }
            return Ok(());
        }
        Context::NamedGroup { name_open, .. } if !*name_open => {
            if byte == b'>' {
                *name_open = true;
            }
            return Ok(());
        }
        Context::AwaitingGroupKind(probe) => {
            let probe = *probe;
            return step_group_probe(stack, probe, byte);
        }
        _ => {}
    }

    // Only Root, Group, and an opened NamedGroup reach here: the three
    // contexts that actually collect literal hints.
    match byte {
        b'?' | b'*' => {
            collecting_mut(stack.last_mut().unwrap()).bank_without_last_byte();
        }
        b'{' => {
            collecting_mut(stack.last_mut().unwrap()).bank_without_last_byte();
            stack.push(Context::Braces);
        }
        b'+' | b'.' | b'^' | b'$' => {
            collecting_mut(stack.last_mut().unwrap()).bank();
        }
        b'(' => {
            collecting_mut(stack.last_mut().unwrap()).bank();
            stack.push(Context::AwaitingGroupKind(GroupProbe::JustOpened));
        }
        b'[' => {
            collecting_mut(stack.last_mut().unwrap()).bank();
            stack.push(Context::Class);
        }
        b'\\' => {
            collecting_mut(stack.last_mut().unwrap()).bank();
            stack.push(Context::Backslash);
        }
        b'|' => return handle_pipe(stack),
        b')' => close_group(stack),
        other => collecting_mut(stack.last_mut().unwrap()).append(other),
    }

    Ok(())
}

/// Advance a group whose kind (plain / ignored / named) isn't known yet.
/// `byte` is the lookahead byte that arrived right after the `(` (or after
/// previous lookahead bytes already consumed towards classifying it).
fn step_group_probe(stack: &mut Vec<Context>, probe: GroupProbe, byte: u8) -> Result<(), Abort> {
    match probe {
        GroupProbe::JustOpened => {
            if byte == b'?' {
                *stack.last_mut().unwrap() = Context::AwaitingGroupKind(GroupProbe::SeenQuestion);
                Ok(())
            } else {
                // Not an extension: a plain capturing group. Re-dispatch
                // this byte as the group's first content byte.
                *stack.last_mut().unwrap() = Context::Group(Collecting::new());
                step(stack, byte)
            }
        }
        GroupProbe::SeenQuestion => {
            if byte == b'P' {
                *stack.last_mut().unwrap() = Context::AwaitingGroupKind(GroupProbe::SeenQuestionP);
                Ok(())
            } else if byte == b'(' {
                // A conditional `(?(id)yes|no)`: the `(` opening `(id)`
                // must still be tracked so its matching `)` doesn't get
                // mistaken for the one closing the whole conditional.
                *stack.last_mut().unwrap() = Context::IgnoredGroup(Collecting::new());
                step(stack, byte)
            } else {
                *stack.last_mut().unwrap() = Context::IgnoredGroup(Collecting::new());
                Ok(())
            }
        }
        GroupProbe::SeenQuestionP => {
            if byte == b'<' {
                *stack.last_mut().unwrap() =
                    Context::NamedGroup { collecting: Collecting::new(), name_open: false };
            } else {
                *stack.last_mut().unwrap() = Context::IgnoredGroup(Collecting::new());
            }
            Ok(())
        }
    }
}

fn collecting_mut(ctx: &mut Context) -> &mut Collecting {
    match ctx {
        Context::Root(c) | Context::Group(c) => c,
        Context::NamedGroup { collecting, .. } => collecting,
        _ => unreachable!("only collecting contexts reach collecting_mut"),
    }
}

fn handle_pipe(stack: &mut Vec<Context>) -> Result<(), Abort> {
    match stack.last_mut().expect("root context always present") {
        Context::Root(_) => Err(Abort),
        top => {
            let collecting = collecting_mut(top);
            collecting.forget_all();
            collecting.had_alternation = true;
            Ok(())
        }
    }
}

fn close_group(stack: &mut Vec<Context>) {
    if stack.len() <= 1 {
        // A stray `)` with nothing open: ignore, conservatively.
        return;
    }
    close_top(stack);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_literal_is_its_own_hint() {
        assert_eq!(hints("hello"), vec!["hello".to_string()]);
    }

    #[test]
    fn optional_character_splits_the_run() {
        // "colou?r" must match "color" and "colour": only "colo" and "r"
        // are guaranteed.
        assert_eq!(hints("colou?r"), vec!["colo".to_string(), "r".to_string()]);
    }

    #[test]
    fn optional_repeated_character_same_as_optional() {
        assert_eq!(hints("ab*c"), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn group_without_alternation_contributes_to_parent() {
        assert_eq!(hints("x(ab)y"), vec!["x".to_string(), "ab".to_string(), "y".to_string()]);
    }

    #[test]
    fn group_with_alternation_contributes_nothing() {
        assert_eq!(hints("x(ab|cd)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn optional_group_contributes_nothing() {
        assert_eq!(hints("(ab)?c"), vec!["c".to_string()]);
        assert_eq!(
            hints("Shiver me timbers!( Arrr!)?"),
            vec!["Shiver me timbers!".to_string()]
        );
    }

    #[test]
    fn non_ascii_literal_is_preserved_byte_for_byte() {
        assert_eq!(hints("café"), vec!["café".to_string()]);
    }

    #[test]
    fn nested_groups_without_alternation_all_contribute() {
        assert_eq!(hints("a(b(c)d)e"), vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string(), "e".to_string()]);
    }

    #[test]
    fn nested_group_with_alternation_is_skipped_but_siblings_survive() {
        assert_eq!(hints("a(b(c|d)e)f"), vec!["a".to_string(), "b".to_string(), "e".to_string(), "f".to_string()]);
    }

    #[test]
    fn character_class_is_not_a_hint() {
        assert_eq!(hints("a[bc]d"), vec!["a".to_string(), "d".to_string()]);
    }

    #[test]
    fn backslash_escape_does_not_close_class_or_group() {
        assert_eq!(hints("a[\\]]b"), vec!["a".to_string(), "b".to_string()]);
        // The escaped `)` does not close the group early; as with any
        // escape, the escaped byte itself is dropped as a hint boundary
        // rather than trusted as a guaranteed-literal byte.
        assert_eq!(hints("(a\\)b)c"), vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn escaped_byte_outside_class_is_dropped_as_a_hint_boundary() {
        assert_eq!(hints("a\\bc"), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn repetition_braces_drop_the_preceding_byte() {
        assert_eq!(hints("ab{2,3}c"), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn top_level_alternation_empties_the_whole_result() {
        assert_eq!(hints("abc|def"), Vec::<String>::new());
    }

    #[test]
    fn anchors_split_the_run_but_are_not_hints_themselves() {
        assert_eq!(hints("^abc$"), vec!["abc".to_string()]);
    }

    #[test]
    fn non_capturing_group_contributes_nothing() {
        assert_eq!(hints("x(?:ab)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn named_group_contributes() {
        assert_eq!(hints("x(?P<tag>ab)y"), vec!["x".to_string(), "ab".to_string(), "y".to_string()]);
    }

    #[test]
    fn named_backreference_contributes_nothing() {
        assert_eq!(hints("x(?P=tag)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn comment_group_contributes_nothing() {
        assert_eq!(hints("x(?#a comment)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn lookaround_groups_all_contribute_nothing() {
        assert_eq!(hints("x(?=ab)y"), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(hints("x(?!ab)y"), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(hints("x(?<=ab)y"), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(hints("x(?<!ab)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn inline_flags_contribute_nothing() {
        assert_eq!(hints("x(?i)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn conditional_group_contributes_nothing() {
        assert_eq!(hints("x(?(1)ab|cd)y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn shortlist_picks_the_longest_hint() {
        assert_eq!(shortlist("x(ab|cd)longest"), Some("longest".to_string()));
        assert_eq!(shortlist("abc|def"), None);
    }

    #[test]
    fn shortlist_keeps_leftmost_on_tie() {
        assert_eq!(shortlist("(aaa)bbb"), Some("aaa".to_string()));
    }

    #[test]
    fn unterminated_group_is_handled_without_panicking() {
        assert_eq!(hints("a(bc"), vec!["a".to_string(), "bc".to_string()]);
    }
}
