use crate::alert::{Alert, Alerts};
use crate::edge::{gen_backref_evil_strings, EdgeId, EdgeKind, Interp};
use crate::error::Result;
use crate::nfa::Nfa;
use crate::{Config, Span};

/// One basis path through the NFA: the visited states and the edges
/// between them.
///
/// Processing a path is a little symbolic execution: each edge in order
/// reads the text accumulated so far, deposits whatever scratch state its
/// record needs (loop prefixes, captured group text), and contributes a
/// concrete fragment. The result is the path's baseline test string, plus
/// a list of "evil" edge positions that are later re-expanded into
/// boundary-probing strings.
#[derive(Clone, Debug)]
pub struct Path {
    states: Vec<usize>,
    edges: Vec<EdgeId>,
    test_string: String,
    evil_edges: Vec<usize>,
}

impl Path {
    pub fn new(initial: usize) -> Path {
        Path {
            states: vec![initial],
            edges: vec![],
            test_string: String::new(),
            evil_edges: vec![],
        }
    }

    pub fn states(&self) -> &[usize] {
        &self.states
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn test_string(&self) -> &str {
        &self.test_string
    }

    /// Extend the path with an edge and its destination state.
    pub fn append(&mut self, edge: EdgeId, state: usize) {
        self.edges.push(edge);
        self.states.push(state);
    }

    /// Drop the last edge and state (used while backtracking).
    pub fn remove_last(&mut self) {
        self.edges.pop();
        self.states.pop();
    }

    /// Mark this path's states in the traversal's visited set.
    pub fn mark_visited(&self, visited: &mut [bool]) {
        for &state in self.states.iter() {
            visited[state] = true;
        }
    }

    /// Walk the path once, materializing its baseline test string and
    /// recording which edges deserve evil strings.
    pub fn process(
        &mut self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
    ) -> Result<()> {
        let mut test_string = String::new();
        let mut evil_edges = vec![];
        for i in 0..self.edges.len() {
            let edge = self.edges[i];
            let evil =
                self.process_edge(nfa, interp, config, edge, &test_string)?;
            if evil {
                evil_edges.push(i);
            }
            test_string.push_str(&nfa.edge_substring(
                interp,
                edge,
                config.check_mode,
            )?);
        }
        self.test_string = test_string;
        self.evil_edges = evil_edges;
        Ok(())
    }

    /// Update an edge's scratch state for the walk in progress. Returns
    /// true the first time an evil edge is seen across all walks.
    fn process_edge(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        edge: EdgeId,
        current: &str,
    ) -> Result<bool> {
        // The current-walk fields update on every traversal, so that
        // example strings rebuilt later stay internally consistent.
        match nfa.edge(edge).kind {
            EdgeKind::BeginLoop(id) => {
                interp.loops[id].curr_prefix = current.to_string();
            }
            EdgeKind::EndLoop(id) => {
                let at = interp.loops[id].curr_prefix.len();
                interp.loops[id].curr_substring = current[at..].to_string();
            }
            EdgeKind::Backreference(id) => {
                let captured = self.gen_backref_string(
                    nfa,
                    interp,
                    nfa.backref(id).group_span,
                    config,
                )?;
                interp.backrefs[id].curr_prefix = current.to_string();
                interp.backrefs[id].curr_substring = captured;
            }
            _ => {}
        }

        // The sticky fields only record the first walk that got here.
        if interp.processed[edge] {
            return Ok(false);
        }
        interp.processed[edge] = true;

        match nfa.edge(edge).kind {
            EdgeKind::Set(id) => {
                interp.sets[id].prefix = current.to_string();
                Ok(true)
            }
            EdgeKind::Str(id) => {
                interp.strs[id].prefix = current.to_string();
                interp.strs[id].substring = config.base_substring.clone();
                Ok(true)
            }
            EdgeKind::BeginLoop(id) => {
                interp.loops[id].prefix = current.to_string();
                Ok(false)
            }
            EdgeKind::EndLoop(id) => {
                interp.loops[id].substring =
                    interp.loops[id].curr_substring.clone();
                Ok(true)
            }
            EdgeKind::Backreference(id) => {
                interp.backrefs[id].prefix =
                    interp.backrefs[id].curr_prefix.clone();
                interp.backrefs[id].substring =
                    interp.backrefs[id].curr_substring.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The text captured by the group at `group_span`: the contributions
    /// of every path edge located strictly inside the group.
    fn gen_backref_string(
        &self,
        nfa: &Nfa,
        interp: &Interp,
        group_span: Span,
        config: &Config,
    ) -> Result<String> {
        let mut captured = String::new();
        for &edge in self.edges.iter() {
            if let Some(span) = nfa.edge(edge).span {
                if span.start > group_span.start && span.start < group_span.end
                {
                    captured.push_str(&nfa.edge_substring(
                        interp,
                        edge,
                        config.check_mode,
                    )?);
                }
            }
        }
        Ok(captured)
    }

    // Checker queries.

    /// True if the path begins with a `^` anchor (looking through markers
    /// that consume nothing).
    pub fn has_leading_caret(&self, nfa: &Nfa) -> bool {
        for &edge in self.edges.iter() {
            match nfa.edge(edge).kind {
                EdgeKind::Caret => return true,
                EdgeKind::BeginLoop(_)
                | EdgeKind::EndLoop(_)
                | EdgeKind::Backreference(_)
                | EdgeKind::Epsilon => {}
                _ => return false,
            }
        }
        false
    }

    /// True if the path ends with a `$` anchor.
    pub fn has_trailing_dollar(&self, nfa: &Nfa) -> bool {
        for i in (1..self.edges.len()).rev() {
            match nfa.edge(self.edges[i]).kind {
                EdgeKind::Dollar => return true,
                EdgeKind::BeginLoop(_)
                | EdgeKind::EndLoop(_)
                | EdgeKind::Backreference(_)
                | EdgeKind::Epsilon => {}
                _ => return false,
            }
        }
        false
    }

    /// Report a `^` after consuming edges, or a `$` before them.
    /// Returns true if an anchor-in-middle violation was emitted.
    pub fn check_anchor_in_middle(
        &self,
        nfa: &Nfa,
        alerts: &mut Alerts,
    ) -> bool {
        let mut seen_non_caret: Option<Span> = None;
        let mut seen_dollar: Option<Span> = None;

        for &edge in self.edges.iter() {
            let span = nfa.edge(edge).span;
            match nfa.edge(edge).kind {
                EdgeKind::Caret => {
                    if let Some(non_caret_span) = seen_non_caret {
                        let message = format!(
                            "Generated string has ^ anchor in middle: {}",
                            self.test_string
                        );
                        let mut alert =
                            Alert::violation("anchor middle", message);
                        alert.loc1 = Some(non_caret_span);
                        alert.loc2 = span;
                        alerts.add(alert);
                        return true;
                    }
                }
                EdgeKind::Dollar => {
                    seen_dollar = span;
                }
                EdgeKind::BeginLoop(_)
                | EdgeKind::EndLoop(_)
                | EdgeKind::Backreference(_)
                | EdgeKind::Epsilon => {}
                _ => {
                    seen_non_caret = span;
                    if let Some(dollar_span) = seen_dollar {
                        let message = format!(
                            "Generated string has $ anchor in middle: {}",
                            self.test_string
                        );
                        let mut alert =
                            Alert::violation("anchor middle", message);
                        alert.loc1 = Some(dollar_span);
                        alert.loc2 = span;
                        alerts.add(alert);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Lint every character set on the path, and flag pairs of sets whose
    /// punctuation membership is identical (a recipe for accepting
    /// mismatched pairs).
    pub fn check_charsets(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        let mut seen: Vec<(String, Span)> = vec![];

        for &edge in self.edges.iter() {
            let set_id = match nfa.edge(edge).kind {
                EdgeKind::Set(id) => id,
                EdgeKind::Str(id) => nfa.str_record(id).set,
                _ => continue,
            };
            let span = match nfa.edge(edge).span {
                Some(span) => span,
                None => continue,
            };

            if !interp.set_checked[set_id] {
                interp.set_checked[set_id] = true;
                let findings = nfa.set(set_id).lint(&config.regex, span);
                for finding in findings {
                    self.report_set_finding(
                        nfa, interp, config, alerts, span, finding,
                    )?;
                }
            }

            // Duplicate punctuation-only sets along this path.
            let set = nfa.set(set_id);
            if set.only_has_punc_and_spaces() {
                let charset_str = set.charset_as_string();
                // +- and -+ show up legitimately in numeric regexes.
                let ignored = charset_str == "+-" || charset_str == "-+";
                if charset_str.len() > 1 && !ignored {
                    let dup = seen
                        .iter()
                        .find(|(s, _)| *s == charset_str)
                        .map(|&(_, span)| span);
                    match dup {
                        Some(first_span) => {
                            let c1 = set.get_valid_character(
                                None,
                                config.check_mode,
                            )?;
                            let c2 = set.get_valid_character(
                                Some(c1),
                                config.check_mode,
                            )?;
                            let example = self.gen_example_two_chars(
                                nfa, interp, config, first_span, c1, span, c2,
                            )?;
                            alerts.add(
                                Alert::violation(
                                    "duplicate punc charset",
                                    "Duplicate character set of punctuation \
                                     marks can lead to mismatched \
                                     punctuation usage",
                                )
                                .locs(first_span, span)
                                .example(example),
                            );
                        }
                        None => seen.push((charset_str, span)),
                    }
                }
            }
        }
        Ok(())
    }

    fn report_set_finding(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
        span: Span,
        finding: crate::charset::SetFinding,
    ) -> Result<()> {
        use crate::charset::SetFinding;

        match finding {
            SetFinding::Separator { sep, suggest } => {
                let message = if sep == '|' {
                    "Likely use of | in character set for alternation"
                } else {
                    "Likely use of , in character set to separate cases"
                };
                let example =
                    self.gen_example_char(nfa, interp, config, span, sep)?;
                alerts.add(
                    Alert::violation("charset sep", message)
                        .suggest(suggest)
                        .loc(span)
                        .example(example),
                );
            }
            SetFinding::BadRange { start, end, suggest } => {
                alerts.add(
                    Alert::violation(
                        "bad range",
                        format!(
                            "The fragment {}-{} is interpreted as a range",
                            start, end
                        ),
                    )
                    .suggest(suggest)
                    .loc(span),
                );
            }
            SetFinding::Duplicates { chars } => {
                let mut message =
                    String::from("Duplicate characters in character set:");
                for c in chars {
                    message.push(' ');
                    message.push(c);
                }
                alerts.add(
                    Alert::violation("duplicate char", message).loc(span),
                );
            }
            SetFinding::Brace { found, missing } => {
                let pair = match found {
                    '(' | ')' => "()",
                    '{' | '}' => "{}",
                    _ => "[]",
                };
                let message = format!(
                    "Found {} in charset but not {}, could lead to \
                     unbalanced {}",
                    found, missing, pair
                );
                let example = self.gen_example_char_except(
                    nfa, interp, config, span, found, missing,
                )?;
                alerts.add(
                    Alert::violation("charset brace", message)
                        .loc(span)
                        .example(example),
                );
            }
        }
        Ok(())
    }

    /// Flag optional brace characters: `(x)?` where x is a lone bracket
    /// accepts strings with one half of a pair and not the other.
    pub fn check_optional_braces(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        let mut prev_opt_repeat = false;
        let mut prev_opt_char = false;
        let mut prev_char = ' ';
        let mut prev_span = Span::new(0, 0);

        // Optional occurrences per brace character, with their spans.
        let mut found: [(char, Option<Span>); 6] = [
            ('(', None),
            (')', None),
            ('{', None),
            ('}', None),
            ('[', None),
            (']', None),
        ];

        for &edge in self.edges.iter() {
            let span = nfa.edge(edge).span.unwrap_or(Span::new(0, 0));
            if nfa.is_opt_repeat_begin(edge) {
                prev_opt_repeat = true;
                prev_opt_char = false;
            } else if prev_opt_repeat
                && matches!(nfa.edge(edge).kind, EdgeKind::Character(_))
            {
                if let EdgeKind::Character(c) = nfa.edge(edge).kind {
                    prev_char = c;
                }
                prev_opt_char = true;
                prev_opt_repeat = false;
                prev_span = span;
            } else if prev_opt_char && nfa.is_opt_repeat_end(edge) {
                let full = Span::new(prev_span.start, span.end);
                prev_opt_char = false;
                prev_opt_repeat = false;
                for slot in found.iter_mut() {
                    if slot.0 == prev_char {
                        slot.1 = Some(full);
                    }
                }
            } else {
                prev_opt_char = false;
                prev_opt_repeat = false;
            }
        }

        // Report pairs together and singletons alone.
        for pair in [(0, 1), (2, 3), (4, 5)] {
            let (open, open_span) = found[pair.0];
            let (close, close_span) = found[pair.1];
            match (open_span, close_span) {
                (Some(open_span), Some(close_span)) => {
                    let message = format!(
                        "Optional {} and {} found - accepts strings that \
                         have one but not the other",
                        open, close
                    );
                    let example = self.gen_example_char_omit(
                        nfa, interp, config, open_span, open, close_span,
                    )?;
                    alerts.add(
                        Alert::violation("optional brace", message)
                            .locs(open_span, close_span)
                            .example(example),
                    );
                }
                (Some(span), None) => {
                    self.report_optional_brace(
                        nfa, interp, config, alerts, open, span,
                    )?;
                }
                (None, Some(span)) => {
                    self.report_optional_brace(
                        nfa, interp, config, alerts, close, span,
                    )?;
                }
                (None, None) => {}
            }
        }
        Ok(())
    }

    fn report_optional_brace(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
        brace: char,
        span: Span,
    ) -> Result<()> {
        let message = format!(
            "Optional {} found - accepts strings that have one but not \
             the other",
            brace
        );
        let example =
            self.gen_example_char(nfa, interp, config, span, brace)?;
        alerts.add(
            Alert::violation("optional brace", message)
                .loc(span)
                .example(example),
        );
        Ok(())
    }

    /// Flag wildcard-like edges sitting right next to a literal
    /// punctuation character they can also match.
    pub fn check_wild_punctuation(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        for (i, &edge) in self.edges.iter().enumerate() {
            if !nfa.is_wild_candidate(edge) {
                continue;
            }

            // The nearest consuming neighbors on either side.
            let prev = self.edges[..i].iter().rev().copied().find(|&e| {
                !matches!(
                    nfa.edge(e).kind,
                    EdgeKind::Epsilon
                        | EdgeKind::BeginLoop(_)
                        | EdgeKind::EndLoop(_)
                )
            });
            let next = self.edges[i + 1..].iter().copied().find(|&e| {
                !matches!(
                    nfa.edge(e).kind,
                    EdgeKind::Epsilon
                        | EdgeKind::BeginLoop(_)
                        | EdgeKind::EndLoop(_)
                )
            });

            for neighbor in [prev, next].into_iter().flatten() {
                let c = match nfa.edge(neighbor).kind {
                    EdgeKind::Character(c) => c,
                    _ => continue,
                };
                if !c.is_ascii_punctuation()
                    || !nfa.edge_matches_char(edge, c)
                {
                    continue;
                }
                let span = match nfa.edge(edge).span {
                    Some(span) => span,
                    None => continue,
                };
                let neighbor_span = match nfa.edge(neighbor).span {
                    Some(span) => span,
                    None => continue,
                };
                let fix = nfa.fix_wild_punctuation(&config.regex, edge, c)?;
                let example =
                    self.gen_example_char(nfa, interp, config, span, c)?;
                alerts.add(
                    Alert::violation(
                        "wild punctuation",
                        format!(
                            "Wildcard may wish to exclude adjacent \
                             punctuation mark {}",
                            c
                        ),
                    )
                    .suggest(fix)
                    .locs(span, neighbor_span)
                    .example(example),
                );
            }
        }
        Ok(())
    }

    /// Flag repeats that repeat a punctuation mark.
    pub fn check_repeat_punctuation(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        let mut prev_repeat = false;
        let mut prev_candidate = false;
        let mut prev_char = ' ';
        let mut prev_span = Span::new(0, 0);

        for &edge in self.edges.iter() {
            let curr_span = nfa.edge(edge).span.unwrap_or(Span::new(0, 0));
            if nfa.is_str_repeat_punc_candidate(edge) {
                let c = nfa.repeat_punc_char(edge, config.check_mode)?;
                let (lower, upper) = nfa.repeat_limits(edge).unwrap();
                if upper != Some(lower) {
                    let repeat_str = repeat_string(c, lower, upper);
                    let example = self.gen_example_replace(
                        nfa,
                        interp,
                        config,
                        curr_span,
                        &repeat_str,
                    )?;
                    alerts.add(
                        Alert::violation(
                            "repeat punctuation",
                            format!(
                                "Punctuation mark may be repeated two or \
                                 more times: {}",
                                c
                            ),
                        )
                        .loc(curr_span)
                        .example(example),
                    );
                }
            } else if nfa.is_repeat_begin(edge) {
                prev_repeat = true;
                prev_candidate = false;
            } else if prev_repeat && nfa.is_repeat_punc_candidate(edge) {
                prev_char = nfa.repeat_punc_char(edge, config.check_mode)?;
                prev_repeat = false;
                prev_candidate = true;
                prev_span = curr_span;
            } else if prev_candidate && nfa.is_repeat_end(edge) {
                let full = Span::new(prev_span.start, curr_span.end);
                prev_repeat = false;
                prev_candidate = false;

                let (lower, upper) = nfa.repeat_limits(edge).unwrap();
                if upper != Some(lower) {
                    let repeat_str = repeat_string(prev_char, lower, upper);
                    let example = self.gen_example_replace(
                        nfa, interp, config, full, &repeat_str,
                    )?;
                    alerts.add(
                        Alert::violation(
                            "repeat punctuation",
                            format!(
                                "Punctuation mark may be repeated two or \
                                 more times: {}",
                                prev_char
                            ),
                        )
                        .locs(prev_span, curr_span)
                        .example(example),
                    );
                }
            } else {
                prev_repeat = false;
                prev_candidate = false;
            }
        }
        Ok(())
    }

    /// Flag optional digit sets whose removal leaves a string with no
    /// digits at all.
    pub fn check_digit_too_optional(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<()> {
        let mut prev_repeat = false;
        let mut prev_candidate = false;
        let mut prev_span = Span::new(0, 0);

        for &edge in self.edges.iter() {
            let curr_span = nfa.edge(edge).span.unwrap_or(Span::new(0, 0));
            if nfa.is_zero_repeat_begin(edge) {
                prev_repeat = true;
                prev_candidate = false;
            } else if prev_repeat && nfa.is_digit_too_optional_candidate(edge)
            {
                prev_repeat = false;
                prev_candidate = true;
                prev_span = curr_span;
            } else if prev_candidate && nfa.is_zero_repeat_end(edge) {
                prev_repeat = false;
                prev_candidate = false;

                let example = self.gen_min_iter_string(nfa, interp, config)?;
                if !example.chars().any(|c| c.is_ascii_digit()) {
                    let full = Span::new(prev_span.start, curr_span.end);
                    alerts.add(
                        Alert::violation(
                            "digit too optional",
                            "Digit range allows for zero digits causing a \
                             string with no digits to be accepted",
                        )
                        .loc(full)
                        .example(example),
                    );
                }
            } else {
                prev_repeat = false;
                prev_candidate = false;
            }
        }
        Ok(())
    }

    // Example string generation. Each of these re-walks the path the same
    // way `process` did, substituting at the named locations.

    /// The path string with the edge at `loc` forced to contribute `c`.
    pub fn gen_example_char(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        loc: Span,
        c: char,
    ) -> Result<String> {
        let mut example = String::new();
        for &edge in self.edges.iter() {
            self.process_edge(nfa, interp, config, edge, &example)?;
            if edge_starts_at(nfa, edge, loc) {
                example.push(c);
            } else {
                example.push_str(&nfa.edge_substring(
                    interp,
                    edge,
                    config.check_mode,
                )?);
            }
        }
        Ok(example)
    }

    /// Like `gen_example_char`, but any other set edge that would
    /// contribute `except` picks a different member instead. Used to build
    /// strings proving unbalanced bracket acceptance.
    pub fn gen_example_char_except(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        loc: Span,
        c: char,
        except: char,
    ) -> Result<String> {
        let mut example = String::new();
        for &edge in self.edges.iter() {
            self.process_edge(nfa, interp, config, edge, &example)?;
            if edge_starts_at(nfa, edge, loc) {
                example.push(c);
                continue;
            }
            let substring =
                nfa.edge_substring(interp, edge, config.check_mode)?;
            let mut pushed = false;
            if substring.len() == 1 && substring.starts_with(except) {
                if let (Some((_, set)), EdgeKind::Set(_)) =
                    (nfa.edge_charset(edge), &nfa.edge(edge).kind)
                {
                    example.push(set.get_valid_character(
                        Some(except),
                        config.check_mode,
                    )?);
                    pushed = true;
                }
            }
            if !pushed {
                example.push_str(&substring);
            }
        }
        Ok(example)
    }

    /// The path string with `c` forced at `loc` and the edge at `omit`
    /// skipped entirely.
    pub fn gen_example_char_omit(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        loc: Span,
        c: char,
        omit: Span,
    ) -> Result<String> {
        let mut example = String::new();
        for &edge in self.edges.iter() {
            self.process_edge(nfa, interp, config, edge, &example)?;
            if edge_starts_at(nfa, edge, loc) {
                example.push(c);
            } else if edge_starts_at(nfa, edge, omit) {
                continue;
            } else {
                example.push_str(&nfa.edge_substring(
                    interp,
                    edge,
                    config.check_mode,
                )?);
            }
        }
        Ok(example)
    }

    /// The path string with characters forced at two locations.
    pub fn gen_example_two_chars(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        loc1: Span,
        c1: char,
        loc2: Span,
        c2: char,
    ) -> Result<String> {
        let mut example = String::new();
        for &edge in self.edges.iter() {
            self.process_edge(nfa, interp, config, edge, &example)?;
            if edge_starts_at(nfa, edge, loc1) {
                example.push(c1);
            } else if edge_starts_at(nfa, edge, loc2) {
                example.push(c2);
            } else {
                example.push_str(&nfa.edge_substring(
                    interp,
                    edge,
                    config.check_mode,
                )?);
            }
        }
        Ok(example)
    }

    /// The path string with everything located inside `loc` replaced by
    /// the given text.
    pub fn gen_example_replace(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
        loc: Span,
        replace: &str,
    ) -> Result<String> {
        let mut example = String::new();
        let mut in_replace = false;
        for &edge in self.edges.iter() {
            self.process_edge(nfa, interp, config, edge, &example)?;
            let span = nfa.edge(edge).span;
            if span.map_or(false, |s| s.start == loc.start) {
                example.push_str(replace);
                in_replace = span.map_or(false, |s| s.end != loc.end);
            } else if span.map_or(false, |s| s.end == loc.end) {
                in_replace = false;
            } else if !in_replace {
                example.push_str(&nfa.edge_substring(
                    interp,
                    edge,
                    config.check_mode,
                )?);
            }
        }
        Ok(example)
    }

    /// The path string with every loop at its minimum iteration count;
    /// zero-minimum loops disappear entirely.
    pub fn gen_min_iter_string(
        &self,
        nfa: &Nfa,
        interp: &mut Interp,
        config: &Config,
    ) -> Result<String> {
        let mut out = String::new();
        for &edge in self.edges.iter() {
            match nfa.edge(edge).kind {
                EdgeKind::Str(id) => {
                    nfa.str_record(id)
                        .gen_min_iter_string(&interp.strs[id], &mut out);
                }
                EdgeKind::BeginLoop(id) => {
                    interp.loops[id].curr_prefix = out.clone();
                }
                EdgeKind::EndLoop(id) => {
                    let lower = nfa.loop_record(id).lower;
                    let at = interp.loops[id].curr_prefix.len();
                    if lower == 0 {
                        out.truncate(at);
                    } else {
                        let body = out[at..].to_string();
                        for _ in 1..lower {
                            out.push_str(&body);
                        }
                    }
                }
                _ => {
                    out.push_str(&nfa.edge_substring(
                        interp,
                        edge,
                        config.check_mode,
                    )?);
                }
            }
        }
        Ok(out)
    }

    /// Expand every recorded evil edge into its boundary strings.
    pub fn gen_evil_strings(
        &self,
        nfa: &Nfa,
        interp: &Interp,
        config: &Config,
    ) -> Result<Vec<String>> {
        let mut evil_strings = vec![];
        for &index in self.evil_edges.iter() {
            let edge = self.edges[index];
            match nfa.edge(edge).kind {
                EdgeKind::Set(id) => {
                    evil_strings.extend(nfa.set(id).gen_evil_strings(
                        &self.test_string,
                        &interp.sets[id].prefix,
                        nfa.punct_marks(),
                    )?);
                }
                EdgeKind::Str(id) => {
                    let record = nfa.str_record(id);
                    evil_strings.extend(record.gen_evil_strings(
                        nfa.set(record.set),
                        &interp.strs[id],
                        &self.test_string,
                        nfa.punct_marks(),
                    ));
                }
                EdgeKind::EndLoop(id) => {
                    evil_strings.extend(
                        nfa.loop_record(id).gen_evil_strings(
                            &interp.loops[id],
                            &self.test_string,
                        ),
                    );
                }
                EdgeKind::Backreference(id) => {
                    if config.backref_evil {
                        evil_strings.extend(gen_backref_evil_strings(
                            &interp.backrefs[id],
                            &self.test_string,
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(evil_strings)
    }
}

/// The example text for a repeated punctuation mark: at least three
/// copies, stretched to the lower bound when that is higher, or capped at
/// two when the upper bound is exactly two.
fn repeat_string(c: char, lower: u32, upper: Option<u32>) -> String {
    let mut limit = 3;
    if lower > 3 {
        limit = lower;
    } else if upper == Some(2) {
        limit = 2;
    }
    std::iter::repeat(c).take(limit as usize).collect()
}

fn edge_starts_at(nfa: &Nfa, edge: EdgeId, loc: Span) -> bool {
    nfa.edge(edge).span.map_or(false, |s| s.start == loc.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alerts;
    use crate::parser::ParseTree;
    use crate::scanner::Scanner;

    fn pipeline(regex: &str) -> (Config, Nfa, Vec<Path>, Interp) {
        let config = Config::new(regex);
        let mut alerts = Alerts::new(&config);
        let scanner = Scanner::scan(regex, &config, &mut alerts).unwrap();
        let tree = ParseTree::parse(scanner).unwrap();
        let nfa = Nfa::build(&tree).unwrap();
        let mut paths = nfa.find_basis_paths();
        let mut interp = nfa.new_interp();
        for path in paths.iter_mut() {
            path.process(&nfa, &mut interp, &config).unwrap();
        }
        (config, nfa, paths, interp)
    }

    fn strings(paths: &[Path]) -> Vec<String> {
        paths.iter().map(|p| p.test_string().to_string()).collect()
    }

    #[test]
    fn baseline_string_for_literals() {
        let (_, _, paths, _) = pipeline("abc");
        assert_eq!(vec!["abc".to_string()], strings(&paths));
    }

    #[test]
    fn baseline_string_repeats_to_lower_bound() {
        let (_, _, paths, _) = pipeline("a{3,5}");
        assert_eq!(vec!["aaa".to_string()], strings(&paths));
    }

    #[test]
    fn baseline_string_uses_base_substring_for_string_atoms() {
        let (_, _, paths, _) = pipeline("x[a-z]+y");
        assert_eq!(vec!["xevily".to_string()], strings(&paths));
    }

    #[test]
    fn baseline_string_takes_first_alternative_per_path() {
        let (_, _, paths, _) = pipeline("ab|cd");
        assert_eq!(
            vec!["ab".to_string(), "cd".to_string()],
            strings(&paths)
        );
    }

    #[test]
    fn backreference_repeats_captured_text() {
        let (_, _, paths, _) = pipeline(r"(ab)-\1");
        assert_eq!(vec!["ab-ab".to_string()], strings(&paths));
    }

    #[test]
    fn named_backreference_repeats_captured_text() {
        let (_, _, paths, _) = pipeline("(?P<w>xy)z(?P=w)");
        assert_eq!(vec!["xyzxy".to_string()], strings(&paths));
    }

    #[test]
    fn min_iter_string_drops_optional_loops() {
        let (config, nfa, paths, mut interp) = pipeline("a(bc)?d");
        let got = paths[0]
            .gen_min_iter_string(&nfa, &mut interp, &config)
            .unwrap();
        assert_eq!("ad", got);
    }

    #[test]
    fn min_iter_string_keeps_required_loops() {
        let (config, nfa, paths, mut interp) = pipeline("a{2,4}b");
        let got = paths[0]
            .gen_min_iter_string(&nfa, &mut interp, &config)
            .unwrap();
        assert_eq!("aab", got);
    }

    #[test]
    fn min_iter_string_drops_star_atoms() {
        let (config, nfa, paths, mut interp) = pipeline("x[a-z]*y");
        let got = paths[0]
            .gen_min_iter_string(&nfa, &mut interp, &config)
            .unwrap();
        assert_eq!("xy", got);
    }

    #[test]
    fn anchors_recognized() {
        let (_, nfa, paths, _) = pipeline("^ab$");
        assert!(paths[0].has_leading_caret(&nfa));
        assert!(paths[0].has_trailing_dollar(&nfa));

        let (_, nfa, paths, _) = pipeline("ab");
        assert!(!paths[0].has_leading_caret(&nfa));
        assert!(!paths[0].has_trailing_dollar(&nfa));
    }

    #[test]
    fn anchors_seen_through_loops() {
        // The loop markers consume nothing, so ^ is still leading.
        let (_, nfa, paths, _) = pipeline("^(ab)+$");
        assert!(paths[0].has_leading_caret(&nfa));
        assert!(paths[0].has_trailing_dollar(&nfa));
    }

    #[test]
    fn anchor_in_middle_detected() {
        let (config, nfa, paths, _) = pipeline("ab^cd");
        let mut alerts = Alerts::new(&config);
        assert!(paths[0].check_anchor_in_middle(&nfa, &mut alerts));
        let lines = alerts.into_lines();
        assert!(lines[0].contains("^ anchor in middle"));

        let (config, nfa, paths, _) = pipeline("ab$cd");
        let mut alerts = Alerts::new(&config);
        assert!(paths[0].check_anchor_in_middle(&nfa, &mut alerts));
    }

    #[test]
    fn evil_strings_for_loop_bounds() {
        let (config, nfa, paths, interp) = pipeline("a{3,5}");
        let got = paths[0].gen_evil_strings(&nfa, &interp, &config).unwrap();
        assert_eq!(
            vec![
                "aa".to_string(),
                "aaaaa".to_string(),
                "aaaaaa".to_string()
            ],
            got
        );
    }

    #[test]
    fn evil_strings_only_from_first_processing_path() {
        // Both alternation branches share no edges; each path expands its
        // own charset edge only.
        let (config, nfa, paths, interp) = pipeline("[ab]|[cd]");
        let first = paths[0].gen_evil_strings(&nfa, &interp, &config).unwrap();
        let second =
            paths[1].gen_evil_strings(&nfa, &interp, &config).unwrap();
        // Each sample holds the explicit members plus one extra lowercase
        // letter outside the set.
        assert_eq!(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            first
        );
        assert_eq!(
            vec!["a".to_string(), "c".to_string(), "d".to_string()],
            second
        );
    }

    #[test]
    fn example_string_with_forced_char() {
        let (config, nfa, paths, mut interp) = pipeline("x[ab]y");
        let span = Span::new(1, 4);
        let got = paths[0]
            .gen_example_char(&nfa, &mut interp, &config, span, '|')
            .unwrap();
        assert_eq!("x|y", got);
    }

    #[test]
    fn example_string_with_replacement() {
        let (config, nfa, paths, mut interp) = pipeline("x;{1,3}y");
        // Replace the loop span (the ';' through the quantifier) wholesale.
        let span = Span::new(1, 6);
        let got = paths[0]
            .gen_example_replace(&nfa, &mut interp, &config, span, ";;;")
            .unwrap();
        assert_eq!("x;;;y", got);
    }

    #[test]
    fn wild_punctuation_flagged() {
        let (config, nfa, paths, mut interp) = pipeline(".;");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_wild_punctuation(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        let lines = alerts.into_lines();
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("punctuation mark ;"));
        assert!(lines[0].contains("Suggested fix: [^;]"));
    }

    #[test]
    fn wild_punctuation_quiet_next_to_letters() {
        let (config, nfa, paths, mut interp) = pipeline(".foo");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_wild_punctuation(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn optional_brace_pair_flagged() {
        let (config, nfa, paths, mut interp) = pipeline(r"\(?x\)?");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_optional_braces(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        let lines = alerts.into_lines();
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("Optional ( and ) found"));
        // The example has the opener but not the closer.
        assert!(lines[0].contains("Example accepted string: (x"));
    }

    #[test]
    fn repeat_punctuation_flagged() {
        let (config, nfa, paths, mut interp) = pipeline("a;+b");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_repeat_punctuation(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        let lines = alerts.into_lines();
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("repeated two or more times: ;"));
        assert!(lines[0].contains("Example accepted string: a;;;b"));
    }

    #[test]
    fn exact_repeat_punctuation_not_flagged() {
        let (config, nfa, paths, mut interp) = pipeline("a;{3}b");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_repeat_punctuation(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn digit_too_optional_flagged() {
        let (config, nfa, paths, mut interp) = pipeline(r"ab\d?");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_digit_too_optional(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        let lines = alerts.into_lines();
        assert_eq!(1, lines.len());
        assert!(lines[0].contains("zero digits"));
        assert!(lines[0].contains("Example accepted string: ab"));
    }

    #[test]
    fn digit_too_optional_quiet_with_other_digits() {
        let (config, nfa, paths, mut interp) = pipeline(r"7\d?");
        let mut alerts = Alerts::new(&config);
        paths[0]
            .check_digit_too_optional(&nfa, &mut interp, &config, &mut alerts)
            .unwrap();
        assert!(alerts.is_empty());
    }
}
