/*!
An engine that analyzes a regular expression and produces two things: a
small suite of test strings probing the regex's structural boundaries, and
a lint report of likely author mistakes with suggested rewrites.

The pipeline runs in one direction: the scanner turns the pattern into
located tokens, the parser builds a tree, Thompson construction turns the
tree into an NFA over a rich edge vocabulary, a bounded DFS enumerates a
basis set of paths covering every edge, and each path is symbolically
executed into a concrete string. The checker reasons over the paths to
emit located diagnostics; the generator expands each path's interesting
edges into "evil" strings that sit just inside and just outside the
boundaries the regex draws.

The engine never matches strings itself. When callers want to verify the
suite against a real matcher, they bring their own regex engine.
*/

use std::fmt;

#[macro_use]
mod macros;

mod alert;
mod charset;
mod check;
mod edge;
mod error;
mod gen;
mod nfa;
mod parser;
mod path;
mod scanner;
mod stats;

pub use crate::error::{EngineError, ErrorKind};

use crate::alert::Alerts;
use crate::check::Checker;
use crate::error::Result;
use crate::gen::TestGenerator;
use crate::nfa::Nfa;
use crate::parser::ParseTree;
use crate::scanner::Scanner;
use crate::stats::Stats;

/// An inclusive byte range into the regex source. Every token, parse node
/// and NFA edge carries one; diagnostics use them for highlighting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.start, self.end)
    }
}

/// The configuration for one engine invocation.
///
/// This is deliberately a plain record: one engine call owns one of
/// these, and nothing is shared between invocations, so concurrent
/// analyses just use separate configs.
#[derive(Clone, Debug)]
pub struct Config {
    /// The pattern under analysis.
    pub regex: String,
    /// The alphabetic seed used whenever a "string atom" (an unbounded
    /// repetition of a word-like set) needs concrete letters. Must be at
    /// least two letters long.
    pub base_substring: String,
    /// Emit only diagnostics and suppress test generation. Warnings are
    /// dropped in this mode; violations surface.
    pub check_mode: bool,
    /// Format highlights with `<mark>` and line breaks with `<br>`
    /// instead of ANSI escapes and newlines.
    pub web_mode: bool,
    /// Log the intermediate representations of each stage.
    pub debug_mode: bool,
    /// Append pipeline statistics to the output.
    pub stat_mode: bool,
    /// Generate boundary strings for backreferences (add a character,
    /// remove one, modify the middle of the captured text). Off by
    /// default: the stock output leaves backreference probing to future
    /// work.
    pub backref_evil: bool,
    /// Use ANSI colors for highlight spans in terminal output.
    pub color: bool,
}

impl Config {
    /// A configuration with the given pattern and every default: base
    /// substring `"evil"`, test generation mode, plain output.
    pub fn new(regex: impl Into<String>) -> Config {
        Config {
            regex: regex.into(),
            base_substring: "evil".to_string(),
            check_mode: false,
            web_mode: false,
            debug_mode: false,
            stat_mode: false,
            backref_evil: false,
            color: false,
        }
    }
}

/// Run the engine over one regex.
///
/// The output is an ordered list of lines. In check mode it is the
/// diagnostic list, or a single `"No violations detected."` entry. In
/// test generation mode it is the warnings, the literal `BEGIN` sentinel,
/// and then the test strings. A fatal error produces a one-element list
/// whose entry starts with `ERROR (<kind>)`.
///
/// For one input and configuration the output is bit-identical across
/// runs.
pub fn run_engine(config: &Config) -> Vec<String> {
    match try_run(config) {
        Ok(lines) => lines,
        Err(err) => vec![err.to_string()],
    }
}

fn try_run(config: &Config) -> Result<Vec<String>> {
    validate_base_substring(config)?;

    let mut stats = Stats::new();
    let mut alerts = Alerts::new(config);

    if config.debug_mode {
        log::debug!("regex: {}", config.regex);
    }

    let scanner = Scanner::scan(&config.regex, config, &mut alerts)?;
    if config.debug_mode {
        log::debug!("{}", scanner.dump(&config.regex));
    }
    if config.stat_mode {
        scanner.add_stats(&mut stats);
    }
    // The checker wants the raw tokens later for anchor rewrites.
    let tokens = scanner.tokens().to_vec();

    let tree = ParseTree::parse(scanner)?;
    if config.debug_mode {
        log::debug!("{}", tree.dump());
    }
    if config.stat_mode {
        tree.add_stats(&mut stats);
    }

    let nfa = Nfa::build(&tree)?;
    if config.debug_mode {
        log::debug!("{}", nfa.dump());
    }
    if config.stat_mode {
        nfa.add_stats(&mut stats);
    }

    let mut paths = nfa.find_basis_paths();
    let mut interp = nfa.new_interp();
    for path in paths.iter_mut() {
        path.process(&nfa, &mut interp, config)?;
    }

    let mut test_strings = vec![];
    if config.check_mode {
        let checker = Checker::new(&paths, &tokens);
        checker.check(&nfa, &mut interp, config, &mut alerts)?;
    } else {
        let mut generator = TestGenerator::new(&paths, &nfa);
        test_strings = generator.gen_test_strings(&mut interp, config)?;
        if config.stat_mode {
            generator.add_stats(&mut stats);
        }
    }

    let mut out = alerts.into_lines();
    if config.check_mode {
        if out.is_empty() {
            out.push("No violations detected.".to_string());
        }
    } else {
        out.push("BEGIN".to_string());
        out.extend(test_strings);
    }
    if config.stat_mode {
        out.extend(stats.render_lines());
    }
    Ok(out)
}

fn validate_base_substring(config: &Config) -> Result<()> {
    if config.base_substring.len() < 2 {
        return Err(EngineError::new(
            ErrorKind::BadArguments,
            "Base substring must have at least two letters",
        ));
    }
    if !regex!(r"^[a-zA-Z]+$").is_match(&config.base_substring) {
        return Err(EngineError::new(
            ErrorKind::BadArguments,
            "Base substring can only contain letters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen(regex: &str) -> Vec<String> {
        run_engine(&Config::new(regex))
    }

    fn check(regex: &str) -> Vec<String> {
        let mut config = Config::new(regex);
        config.check_mode = true;
        run_engine(&config)
    }

    /// The strings after the BEGIN sentinel.
    fn strings(lines: &[String]) -> Vec<String> {
        let begin = lines.iter().position(|s| s == "BEGIN").unwrap();
        lines[begin + 1..].to_vec()
    }

    #[test]
    fn lowercase_word_suite() {
        let lines = gen("^[a-z]+$");
        assert_eq!(
            vec![
                "BEGIN".to_string(),
                "evil".to_string(),
                "".to_string(),
                "_".to_string(),
                "6".to_string(),
                " ".to_string(),
                "e".to_string(),
                "ev4il".to_string(),
                "ev il".to_string(),
                "ev_il".to_string(),
                "EVIL".to_string(),
                "eVil".to_string(),
            ],
            lines
        );
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("^[a-z]+$")
        );
    }

    #[test]
    fn lowercase_word_suite_matches_oracle() {
        let re = regex_lite::Regex::new("^[a-z]+$").unwrap();
        for s in strings(&gen("^[a-z]+$")) {
            let expected =
                !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase());
            assert_eq!(expected, re.is_match(&s), "string {:?}", s);
        }
    }

    #[test]
    fn repeat_bounds_suite() {
        let lines = gen("^a{3,5}$");
        assert_eq!(
            vec![
                "BEGIN".to_string(),
                "aaa".to_string(),
                "aa".to_string(),
                "aaaaa".to_string(),
                "aaaaaa".to_string(),
            ],
            lines
        );
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("^a{3,5}$")
        );
    }

    #[test]
    fn repeat_bounds_suite_matches_oracle() {
        let re = regex_lite::Regex::new("^a{3,5}$").unwrap();
        let got = strings(&gen("^a{3,5}$"));
        // Strings at the bounds are accepted, strings past them are not.
        assert!(re.is_match("aaa") && got.contains(&"aaa".to_string()));
        assert!(re.is_match("aaaaa") && got.contains(&"aaaaa".to_string()));
        assert!(!re.is_match("aa") && got.contains(&"aa".to_string()));
        assert!(
            !re.is_match("aaaaaa") && got.contains(&"aaaaaa".to_string())
        );
    }

    #[test]
    fn charset_separator_violation() {
        let lines = check("[a|b]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (charset sep)"));
        assert!(lines[0].contains("Suggested fix: (a|b)"));
        assert!(lines[0].contains("Example accepted string: |"));
    }

    #[test]
    fn bad_range_violation() {
        let lines = check("[A-z]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (bad range)"));
        assert!(lines[0].contains("Suggested fix: [A-Za-z]"));
    }

    #[test]
    fn optional_group_suite() {
        let lines = gen("(foo)?bar");
        let got = strings(&lines);
        assert!(got.contains(&"foobar".to_string()));
        assert!(got.contains(&"bar".to_string()));
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("(foo)?bar")
        );
    }

    #[test]
    fn wildcard_next_to_punctuation() {
        let lines = check(".-");
        assert!(lines
            .iter()
            .any(|l| l.starts_with("VIOLATION (wild punctuation)")));
        // A wildcard next to plain letters is fine.
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check(".foo")
        );
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("foo.")
        );
    }

    #[test]
    fn warnings_precede_the_sentinel() {
        let lines = gen("(?i)ab");
        assert!(lines[0].starts_with("WARNING (ignored)"));
        assert_eq!("BEGIN", lines[1]);
        assert_eq!("ab", lines[2]);
        // Check mode suppresses warnings.
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("(?i)ab")
        );
    }

    #[test]
    fn engine_is_deterministic() {
        for regex in
            ["^[a-z]+$", "(foo)?bar", "[a|b]", r"(\w+)@(\w+)", "a{2,4}|b*"]
        {
            assert_eq!(gen(regex), gen(regex), "regex {}", regex);
            assert_eq!(check(regex), check(regex), "regex {}", regex);
        }
    }

    #[test]
    fn backreference_suite_default_and_flagged() {
        let lines = gen(r"(ab)\1");
        assert_eq!(
            vec!["BEGIN".to_string(), "abab".to_string()],
            lines
        );

        let mut config = Config::new(r"(ab)\1");
        config.backref_evil = true;
        let lines = run_engine(&config);
        let got = strings(&lines);
        assert!(got.contains(&"abab".to_string()));
        assert!(got.contains(&"aba".to_string()));
        assert!(got.contains(&"ababb".to_string()));
    }

    #[test]
    fn error_surface() {
        let mut config = Config::new("ab");
        config.base_substring = "x".to_string();
        assert_eq!(
            vec![
                "ERROR (bad arguments): Base substring must have at least \
                 two letters"
                    .to_string()
            ],
            run_engine(&config)
        );

        let mut config = Config::new("ab");
        config.base_substring = "ev1l".to_string();
        assert_eq!(
            vec![
                "ERROR (bad arguments): Base substring can only contain \
                 letters"
                    .to_string()
            ],
            run_engine(&config)
        );

        assert_eq!(
            vec![
                "ERROR (pointless repeat): pointless repeat quantifier {0}"
                    .to_string()
            ],
            gen("a{0}")
        );
        assert_eq!(
            vec![
                "ERROR (pointless alternation): Alternation with two empty \
                 alternatives"
                    .to_string()
            ],
            gen("a||")
        );
        assert_eq!(
            vec![
                "ERROR (unsupported): contains unsupported character \\n"
                    .to_string()
            ],
            gen(r"a\nb")
        );
        // Control escapes are tolerated when only checking.
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check(r"a\nb")
        );
    }

    #[test]
    fn bad_range_aborts_test_generation() {
        // Check mode reports the range; generation refuses to sample it.
        assert_eq!(
            vec!["ERROR (bad range): Invalid range: A-z".to_string()],
            gen("[A-z]")
        );
    }

    #[test]
    fn empty_alternation_branch_suite() {
        let lines = gen("a|");
        let got = strings(&lines);
        assert!(got.contains(&"a".to_string()));
        assert!(got.contains(&"".to_string()));
        assert!(got.contains(&"aa".to_string()));

        let re = regex_lite::Regex::new("^(?:a|)$").unwrap();
        assert!(re.is_match("a"));
        assert!(re.is_match(""));
        assert!(!re.is_match("aa"));
    }

    #[test]
    fn optional_group_suite_matches_oracle() {
        let re = regex_lite::Regex::new("^(?:(foo)?bar)$").unwrap();
        let got = strings(&gen("(foo)?bar"));
        assert!(re.is_match("foobar") && got.contains(&"foobar".to_string()));
        assert!(re.is_match("bar") && got.contains(&"bar".to_string()));
        assert!(
            !re.is_match("foofoobar")
                && got.contains(&"foofoobar".to_string())
        );
    }

    #[test]
    fn named_group_suite() {
        let lines = gen("(?P<tag><)x(?P=tag)");
        let got = strings(&lines);
        // The captured "<" is substituted for the backreference.
        assert!(got.contains(&"<x<".to_string()));
    }

    #[test]
    fn every_path_is_anchored_in_fully_anchored_regex() {
        // ^(foo|bar)$ has two basis paths and both carry both anchors, so
        // no anchor usage violation fires.
        assert_eq!(
            vec!["No violations detected.".to_string()],
            check("^(foo|bar)$")
        );
        let got = strings(&gen("^(foo|bar)$"));
        assert!(got.contains(&"foo".to_string()));
        assert!(got.contains(&"bar".to_string()));
    }

    #[test]
    fn web_mode_markup_in_alerts() {
        let mut config = Config::new("[a|b]");
        config.check_mode = true;
        config.web_mode = true;
        let lines = run_engine(&config);
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("<mark>[a|b]</mark>"));
        assert!(lines[0].contains("<br>"));
        assert!(!lines[0].contains('\n'));
    }

    #[test]
    fn stats_appended_when_requested() {
        let mut config = Config::new("ab");
        config.stat_mode = true;
        let lines = run_engine(&config);
        assert!(lines.iter().any(|l| l.starts_with("Tokens")));
        assert!(lines.iter().any(|l| l.starts_with("NFA states")));
        assert!(lines.iter().any(|l| l.starts_with("Paths")));
    }

    #[test]
    fn alternation_anchor_mismatch_reported() {
        let lines = check("^a|b");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (anchor usage)"));
        assert!(lines[0].contains("Suggested fix: ^(a|b)$"));
    }

    #[test]
    fn email_like_regex_probes_both_words() {
        let lines = gen(r"(\w+)@(\w+)");
        let got = strings(&lines);
        assert!(got.contains(&"evil@evil".to_string()));
        // Each word atom collapses to nothing in one probe.
        assert!(got.contains(&"@evil".to_string()));
        assert!(got.contains(&"evil@".to_string()));
        // And is perturbed in place in others.
        assert!(got.contains(&"ev4il@evil".to_string()));
        assert!(got.contains(&"evil@EVIL".to_string()));
    }
}
