use std::collections::BTreeSet;

use crate::charset::CharSet;
use crate::parser::SetId;
use crate::Span;

pub type LoopId = usize;
pub type StrId = usize;
pub type EdgeId = usize;

/// What an NFA edge consumes.
///
/// The vocabulary is deliberately richer than a textbook NFA: loops keep
/// their begin/end markers and `set+`/`set*` repetitions of word-like sets
/// collapse into a single `Str` edge, so that path interpretation can
/// reason about whole constructs instead of single characters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EdgeKind {
    /// A single literal character.
    Character(char),
    /// One character drawn from a character set.
    Set(SetId),
    /// A whole "string atom": an unbounded repetition of a word-like set.
    Str(StrId),
    /// Entry into a `{m,n}` loop.
    BeginLoop(LoopId),
    /// Exit from a `{m,n}` loop.
    EndLoop(LoopId),
    /// The `^` anchor.
    Caret,
    /// The `$` anchor.
    Dollar,
    /// A backreference to a capture group.
    Backreference(crate::parser::BackrefId),
    /// Consumes nothing.
    Epsilon,
}

/// An NFA edge: its kind plus where it came from in the regex. Epsilon
/// edges synthesized by the construction carry no location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub span: Option<Span>,
}

impl Edge {
    pub fn new(kind: EdgeKind, span: Span) -> Edge {
        Edge { kind, span: Some(span) }
    }

    pub fn epsilon() -> Edge {
        Edge { kind: EdgeKind::Epsilon, span: None }
    }
}

/// A repeat quantifier `{m,n}`. `upper` of `None` means no upper bound.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegexLoop {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl RegexLoop {
    /// True for `?`-shaped loops, i.e. `{0,1}`.
    pub fn is_opt_repeat(&self) -> bool {
        self.lower == 0 && self.upper == Some(1)
    }

    /// The iterations the loop owes beyond the single body traversal the
    /// path already made: `lower - 1` more copies of the body substring.
    pub fn extra_iterations(&self, scratch: &LoopScratch) -> String {
        let mut out = String::new();
        for _ in 1..self.lower {
            out.push_str(&scratch.curr_substring);
        }
        out
    }

    /// Strings probing the loop's iteration bounds: one below the lower
    /// bound always, and depending on the shape of the bounds, one more
    /// iteration, the upper bound, and one past the upper bound.
    pub fn gen_evil_strings(
        &self,
        scratch: &LoopScratch,
        path_string: &str,
    ) -> Vec<String> {
        let LoopScratch { ref prefix, ref substring, .. } = *scratch;
        let suffix = &path_string[prefix.len() + substring.len()..];
        let one_less = format!("{}{}", prefix, suffix);
        let one_more =
            format!("{}{}{}{}", prefix, substring, substring, suffix);

        match self.upper {
            Some(upper) if self.lower == upper => vec![one_less, one_more],
            Some(upper) => {
                // The path holds max(lower, 1) iterations; top it up to the
                // upper bound, then push one past it.
                let base = self.lower.max(1);
                let mut elements = substring.clone();
                for _ in base..upper {
                    elements.push_str(substring);
                }
                let upper_bound =
                    format!("{}{}{}", prefix, elements, suffix);
                let past_bound = format!(
                    "{}{}{}{}",
                    prefix, elements, substring, suffix
                );
                vec![one_less, upper_bound, past_bound]
            }
            None => {
                if self.lower <= 1 {
                    vec![one_less, one_more]
                } else {
                    vec![one_less]
                }
            }
        }
    }
}

impl std::fmt::Display for RegexLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", quantifier_str(self.lower, self.upper))
    }
}

/// A string atom: a character set under `*` or `+` that the generator
/// treats as one word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegexString {
    pub set: SetId,
    pub lower: u32,
    pub upper: Option<u32>,
}

impl RegexString {
    pub fn is_wild_candidate(&self, set: &CharSet) -> bool {
        set.is_wildcard() || set.is_complement()
    }

    pub fn is_valid_character(&self, set: &CharSet, c: char) -> bool {
        set.is_wildcard() || set.is_valid_character(c)
    }

    /// Contribute to a minimum iteration string: `set*` can vanish,
    /// `set+` keeps its substring.
    pub fn gen_min_iter_string(&self, scratch: &StrScratch, out: &mut String) {
        if self.lower != 0 {
            out.push_str(&scratch.substring);
        }
    }

    /// Perturbations of the string atom: single suspicious characters, the
    /// substring with an insertion in the middle, case changes, and (for
    /// permissive sets) every punctuation mark seen in the regex.
    pub fn gen_evil_strings(
        &self,
        set: &CharSet,
        scratch: &StrScratch,
        path_string: &str,
        punct_marks: &BTreeSet<char>,
    ) -> Vec<String> {
        let StrScratch { ref prefix, ref substring } = *scratch;
        let suffix = &path_string[prefix.len() + substring.len()..];

        let mut evil_substrings = vec![
            String::new(),
            "_".to_string(),
            "6".to_string(),
            " ".to_string(),
        ];

        // Just the first character of the substring.
        evil_substrings.push(substring.chars().take(1).collect());

        // The substring with a digit, a space and an underscore pushed
        // into the middle.
        let half = substring.len() / 2;
        let (before, after) = substring.split_at(half);
        evil_substrings.push(format!("{}4{}", before, after));
        evil_substrings.push(format!("{} {}", before, after));
        evil_substrings.push(format!("{}_{}", before, after));

        // All upper, all lower, and first-lower-second-upper mixed case.
        evil_substrings.push(substring.to_uppercase());
        evil_substrings.push(substring.to_lowercase());
        let mixed: String = substring
            .chars()
            .enumerate()
            .map(|(i, c)| match i {
                0 => c.to_ascii_lowercase(),
                1 => c.to_ascii_uppercase(),
                _ => c,
            })
            .collect();
        evil_substrings.push(mixed);

        if set.allows_punctuation() {
            for &mark in punct_marks.iter() {
                evil_substrings.push(mark.to_string());
            }
        }

        evil_substrings
            .into_iter()
            .map(|sub| format!("{}{}{}", prefix, sub, suffix))
            .collect()
    }
}

impl std::fmt::Display for RegexString {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", quantifier_str(self.lower, self.upper))
    }
}

/// The conventional spelling of a `{m,n}` quantifier.
fn quantifier_str(lower: u32, upper: Option<u32>) -> String {
    match (lower, upper) {
        (0, None) => "*".to_string(),
        (1, None) => "+".to_string(),
        (0, Some(1)) => "?".to_string(),
        (lower, None) => format!("{{{},}}", lower),
        (lower, Some(upper)) if lower == upper => format!("{{{}}}", lower),
        (lower, Some(upper)) => format!("{{{},{}}}", lower, upper),
    }
}

/// Scratch state for one character set during path interpretation: the
/// path text accumulated before the set was first reached.
#[derive(Clone, Debug, Default)]
pub struct SetScratch {
    pub prefix: String,
}

/// Scratch state for one loop.
///
/// The `curr_*` fields track the walk that is happening right now (paths
/// are re-walked when building example strings); the bare fields are
/// sticky copies from the first walk that reached the loop, which is what
/// evil string generation keys off.
#[derive(Clone, Debug, Default)]
pub struct LoopScratch {
    pub prefix: String,
    pub substring: String,
    pub curr_prefix: String,
    pub curr_substring: String,
}

/// Scratch state for one string atom.
#[derive(Clone, Debug, Default)]
pub struct StrScratch {
    pub prefix: String,
    pub substring: String,
}

/// Scratch state for one backreference.
#[derive(Clone, Debug, Default)]
pub struct BackrefScratch {
    pub prefix: String,
    pub substring: String,
    pub curr_prefix: String,
    pub curr_substring: String,
}

/// Generate boundary strings for a backreference: the captured text with a
/// character appended, removed, and modified in the middle. The engine
/// ships these disabled by default; see `Config::backref_evil`.
pub fn gen_backref_evil_strings(
    scratch: &BackrefScratch,
    path_string: &str,
) -> Vec<String> {
    let BackrefScratch { ref prefix, ref substring, .. } = *scratch;
    if substring.is_empty() {
        return vec![];
    }
    let suffix = &path_string[prefix.len() + substring.len()..];

    let mut added = substring.clone();
    added.push(substring.chars().last().unwrap());

    let mut removed = substring.clone();
    removed.pop();

    let chars: Vec<char> = substring.chars().collect();
    let mid = chars.len() / 2;
    let mut modified: String = chars[..mid].iter().collect();
    modified.push(
        char::from_u32(chars[mid] as u32 + 1).unwrap_or(chars[mid]),
    );
    modified.extend(&chars[mid + 1..]);

    vec![added, removed, modified]
        .into_iter()
        .map(|sub| format!("{}{}{}", prefix, sub, suffix))
        .collect()
}

/// Per-invocation interpretation state, keyed by record index.
///
/// The parse tree and the NFA stay immutable once built; everything the
/// edges learn while paths are walked (prefixes, captured substrings,
/// sticky processed flags) lives here instead.
#[derive(Clone, Debug)]
pub struct Interp {
    /// Sticky per-edge flag: an edge contributes evil strings only for the
    /// first path that reaches it.
    pub processed: Vec<bool>,
    pub sets: Vec<SetScratch>,
    pub loops: Vec<LoopScratch>,
    pub strs: Vec<StrScratch>,
    pub backrefs: Vec<BackrefScratch>,
    /// Sticky per-set flag for the charset lint pass.
    pub set_checked: Vec<bool>,
}

impl Interp {
    pub fn new(
        num_edges: usize,
        num_sets: usize,
        num_loops: usize,
        num_strs: usize,
        num_backrefs: usize,
    ) -> Interp {
        Interp {
            processed: vec![false; num_edges],
            sets: vec![SetScratch::default(); num_sets],
            loops: vec![LoopScratch::default(); num_loops],
            strs: vec![StrScratch::default(); num_strs],
            backrefs: vec![BackrefScratch::default(); num_backrefs],
            set_checked: vec![false; num_sets],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::{CharSetItem, ClassKind};

    fn loop_scratch(prefix: &str, substring: &str) -> LoopScratch {
        LoopScratch {
            prefix: prefix.to_string(),
            substring: substring.to_string(),
            curr_prefix: prefix.to_string(),
            curr_substring: substring.to_string(),
        }
    }

    #[test]
    fn exact_loop_probes_both_sides() {
        // a{3}: path string "aaa".
        let looped = RegexLoop { lower: 3, upper: Some(3) };
        let scratch = LoopScratch {
            prefix: String::new(),
            substring: "a".to_string(),
            curr_prefix: String::new(),
            curr_substring: "a".to_string(),
        };
        // The path holds one body copy plus two extra from the lower
        // bound, so prefix="" substring="a" suffix="aa".
        let got = looped.gen_evil_strings(&scratch, "aaa");
        assert_eq!(vec!["aa".to_string(), "aaaa".to_string()], got);
    }

    #[test]
    fn bounded_loop_probes_upper_bound() {
        // a{3,5}: path string "aaa".
        let looped = RegexLoop { lower: 3, upper: Some(5) };
        let got = loop_evil(looped, "aaa");
        assert_eq!(
            vec!["aa".to_string(), "aaaaa".to_string(), "aaaaaa".to_string()],
            got
        );
    }

    #[test]
    fn unbounded_loop_with_small_lower_bound() {
        // a+: one less (empty) and one more (two copies).
        let looped = RegexLoop { lower: 1, upper: None };
        let got = loop_evil(looped, "a");
        assert_eq!(vec!["".to_string(), "aa".to_string()], got);
    }

    #[test]
    fn unbounded_loop_with_large_lower_bound() {
        // a{4,}: only one less.
        let looped = RegexLoop { lower: 4, upper: None };
        let got = loop_evil(looped, "aaaa");
        assert_eq!(vec!["aaa".to_string()], got);
    }

    fn loop_evil(looped: RegexLoop, path_string: &str) -> Vec<String> {
        // Path strings hold one body traversal plus lower-1 extras; the
        // scratch substring is the single body copy.
        let scratch = loop_scratch("", "a");
        looped.gen_evil_strings(&scratch, path_string)
    }

    #[test]
    fn loop_bounds_respect_surrounding_text() {
        // x(a){2,3}y with path string "xaay".
        let looped = RegexLoop { lower: 2, upper: Some(3) };
        let scratch = loop_scratch("x", "a");
        let got = looped.gen_evil_strings(&scratch, "xaay");
        assert_eq!(
            vec!["xay".to_string(), "xaaay".to_string(), "xaaaay".to_string()],
            got
        );
    }

    #[test]
    fn string_atom_perturbations() {
        let set = {
            let mut set = CharSet::new();
            set.add_item(CharSetItem::Class(ClassKind::Word));
            set
        };
        let atom = RegexString { set: 0, lower: 1, upper: None };
        let scratch = StrScratch {
            prefix: String::new(),
            substring: "evil".to_string(),
        };
        let marks = BTreeSet::new();
        let got = atom.gen_evil_strings(&set, &scratch, "evil", &marks);
        assert_eq!(
            vec![
                "".to_string(),
                "_".to_string(),
                "6".to_string(),
                " ".to_string(),
                "e".to_string(),
                "ev4il".to_string(),
                "ev il".to_string(),
                "ev_il".to_string(),
                "EVIL".to_string(),
                "evil".to_string(),
                "eVil".to_string(),
            ],
            got
        );
    }

    #[test]
    fn string_atom_includes_punct_marks_when_permissive() {
        let set = {
            let mut set = CharSet::new();
            set.add_item(CharSetItem::Class(ClassKind::Any));
            set
        };
        let atom = RegexString { set: 0, lower: 0, upper: None };
        let scratch = StrScratch {
            prefix: "p-".to_string(),
            substring: "ab".to_string(),
        };
        let marks: BTreeSet<char> = ['-', ';'].into_iter().collect();
        let got = atom.gen_evil_strings(&set, &scratch, "p-abq", &marks);
        assert!(got.contains(&"p--q".to_string()));
        assert!(got.contains(&"p-;q".to_string()));
        // Every string keeps the framing prefix and suffix.
        assert!(got.iter().all(|s| s.starts_with("p-") && s.ends_with('q')));
    }

    #[test]
    fn min_iter_drops_star_but_keeps_plus() {
        let star = RegexString { set: 0, lower: 0, upper: None };
        let plus = RegexString { set: 0, lower: 1, upper: None };
        let scratch = StrScratch {
            prefix: String::new(),
            substring: "evil".to_string(),
        };
        let mut out = String::new();
        star.gen_min_iter_string(&scratch, &mut out);
        assert_eq!("", out);
        plus.gen_min_iter_string(&scratch, &mut out);
        assert_eq!("evil", out);
    }

    #[test]
    fn backref_evil_strings() {
        let scratch = BackrefScratch {
            prefix: "x".to_string(),
            substring: "abcd".to_string(),
            curr_prefix: String::new(),
            curr_substring: String::new(),
        };
        let got = gen_backref_evil_strings(&scratch, "xabcdy");
        assert_eq!(
            vec![
                "xabcddy".to_string(),
                "xabcy".to_string(),
                "xabddy".to_string(),
            ],
            got
        );
    }
}
