use crate::alert::{Alert, Alerts};
use crate::edge::Interp;
use crate::error::Result;
use crate::nfa::Nfa;
use crate::path::Path;
use crate::scanner::{Token, TokenKind};
use crate::Config;

/// The lint pass over the processed basis paths.
///
/// Each rule is a sweep over paths and their edges; located findings land
/// in the alert sink, which handles ordering and deduplication. The token
/// stream is kept around for building whole-regex rewrites.
pub struct Checker<'a> {
    paths: &'a [Path],
    tokens: &'a [Token],
}

impl<'a> Checker<'a> {
    pub fn new(paths: &'a [Path], tokens: &'a [Token]) -> Checker<'a> {
        Checker { paths, tokens }
    }

    /// Run every rule.
    pub fn check(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        self.check_anchor_usage(nfa, config, alerts);
        self.check_anchor_in_middle(nfa, alerts);
        for path in self.paths {
            path.check_charsets(nfa, interp, config, alerts)?;
        }
        for path in self.paths {
            path.check_optional_braces(nfa, interp, config, alerts)?;
        }
        for path in self.paths {
            path.check_wild_punctuation(nfa, interp, config, alerts)?;
        }
        for path in self.paths {
            path.check_repeat_punctuation(nfa, interp, config, alerts)?;
        }
        for path in self.paths {
            path.check_digit_too_optional(nfa, interp, config, alerts)?;
        }
        Ok(())
    }

    /// If some paths are anchored and others are not, the author probably
    /// meant to anchor the whole regex. The first path serves as the
    /// reference; the first disagreeing path triggers the report.
    fn check_anchor_usage(
        &self,
        nfa: &Nfa,
        config: &Config,
        alerts: &mut Alerts,
    ) {
        let eol = if config.web_mode { "<br>" } else { "\n" };

        let mut all_start_with_caret = false;
        let mut all_end_with_dollar = false;
        let mut warned_caret = false;
        let mut warned_dollar = false;
        let mut first_string = String::new();
        let mut is_first = true;

        for path in self.paths {
            let starts = path.has_leading_caret(nfa);
            let ends = path.has_trailing_dollar(nfa);

            if is_first {
                all_start_with_caret = starts;
                all_end_with_dollar = ends;
                first_string = path.test_string().to_string();
                is_first = false;
            }

            if !warned_caret && starts != all_start_with_caret {
                let (with, without) = if all_start_with_caret {
                    (first_string.clone(), path.test_string().to_string())
                } else {
                    (path.test_string().to_string(), first_string.clone())
                };
                let message = format!(
                    "Some but not all strings start with a ^ anchor{}\
                     ...String with ^ anchor: {}{}\
                     ...String with no ^ anchor: {}",
                    eol, with, eol, without
                );
                alerts.add(
                    Alert::violation("anchor usage", message)
                        .suggest(self.fix_anchors(config)),
                );
                warned_caret = true;
            }
            if !warned_dollar && ends != all_end_with_dollar {
                let (with, without) = if all_end_with_dollar {
                    (first_string.clone(), path.test_string().to_string())
                } else {
                    (path.test_string().to_string(), first_string.clone())
                };
                let message = format!(
                    "Some but not all strings end with a $ anchor{}\
                     ...String with $ anchor: {}{}\
                     ...String with no $ anchor: {}",
                    eol, with, eol, without
                );
                alerts.add(
                    Alert::violation("anchor usage", message)
                        .suggest(self.fix_anchors(config)),
                );
                warned_dollar = true;
            }
        }
    }

    fn check_anchor_in_middle(&self, nfa: &Nfa, alerts: &mut Alerts) {
        for path in self.paths {
            if path.check_anchor_in_middle(nfa, alerts) {
                return;
            }
        }
    }

    /// The suggested rewrite for anchor problems: strip every anchor
    /// token and wrap the remainder in `^(...)$`.
    fn fix_anchors(&self, config: &Config) -> String {
        let mut new_regex = String::from("^(");
        for token in self.tokens {
            if matches!(token.kind, TokenKind::Caret | TokenKind::Dollar) {
                continue;
            }
            new_regex
                .push_str(&config.regex[token.span.start..=token.span.end]);
        }
        new_regex.push_str(")$");
        new_regex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseTree;
    use crate::scanner::Scanner;

    fn check(regex: &str) -> Vec<String> {
        let mut config = Config::new(regex);
        config.check_mode = true;
        let mut alerts = Alerts::new(&config);
        let scanner = Scanner::scan(regex, &config, &mut alerts).unwrap();
        let tokens = scanner.tokens().to_vec();
        let tree = ParseTree::parse(scanner).unwrap();
        let nfa = Nfa::build(&tree).unwrap();
        let mut paths = nfa.find_basis_paths();
        let mut interp = nfa.new_interp();
        for path in paths.iter_mut() {
            path.process(&nfa, &mut interp, &config).unwrap();
        }
        Checker::new(&paths, &tokens)
            .check(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        alerts.into_lines()
    }

    #[test]
    fn anchored_on_one_branch_only() {
        let lines = check("^a|b");
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("Some but not all strings start with a ^"));
        assert!(lines[0].contains("Suggested fix: ^(a|b)$"));
    }

    #[test]
    fn dollar_on_one_branch_only() {
        let lines = check("a|b$");
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("Some but not all strings end with a $"));
        assert!(lines[0].contains("Suggested fix: ^(a|b)$"));
    }

    #[test]
    fn consistent_anchors_are_quiet() {
        assert!(check("^a$|^b$").is_empty());
        assert!(check("a|b").is_empty());
    }

    #[test]
    fn charset_sep_reported_once() {
        let lines = check("[a|b]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (charset sep)"));
        assert!(lines[0].contains("Suggested fix: (a|b)"));
        assert!(lines[0].contains("Example accepted string: |"));
    }

    #[test]
    fn bad_range_reported() {
        let lines = check("[A-z]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (bad range)"));
        assert!(lines[0].contains("Suggested fix: [A-Za-z]"));
    }

    #[test]
    fn duplicate_punc_charsets_reported() {
        let lines = check(r"[(){}]x[(){}]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (duplicate punc charset)"));
        // The example picks different members from the two sets, proving
        // the mismatch.
        assert!(lines[0].contains("Example accepted string: {x("));
    }

    #[test]
    fn plus_minus_charsets_are_exempt() {
        assert!(check(r"[+-]x[+-]").is_empty());
    }

    #[test]
    fn clean_regex_is_quiet() {
        assert!(check("^(foo|bar)[a-z]{2,3}$").is_empty());
    }

    #[test]
    fn charset_checked_once_across_paths() {
        // Both alternation paths traverse the same suspect set; the
        // finding surfaces once.
        let lines = check("(x|y)[a|b]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (charset sep)"));
    }

    #[test]
    fn duplicate_characters_listed() {
        let lines = check("[abcab]");
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("VIOLATION (duplicate char)"));
        assert!(
            lines[0].contains("Duplicate characters in character set: a b")
        );
    }

    #[test]
    fn unbalanced_brace_example_proves_mismatch() {
        // Both brace findings share the same location, so deduplication
        // keeps only the first.
        let lines = check("[({]x");
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("Found ( in charset but not )"));
        assert!(lines[0].contains("Example accepted string: (x"));
    }
}
