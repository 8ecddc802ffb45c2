use std::collections::BTreeSet;
use std::fmt::Write;

use crate::charset::CharSet;
use crate::edge::{
    Edge, EdgeId, EdgeKind, Interp, LoopId, RegexLoop, RegexString, StrId,
};
use crate::error::{self, Result};
use crate::parser::{Backref, BackrefId, NodeId, NodeKind, ParseTree, SetId};
use crate::path::Path;
use crate::stats::Stats;
use crate::Span;

/// A Thompson-constructed NFA over the extended edge vocabulary.
///
/// States are `0..size` and transitions live in a dense `size x size`
/// table of optional edge indices into the edge arena. The construction
/// guarantees that every state lies on some path from `initial` to
/// `final`, which is what makes basis path enumeration meaningful.
///
/// The NFA also takes ownership of the records the edges reference: the
/// character sets and backreferences from the parse, plus the loop and
/// string records minted during construction.
#[derive(Clone, Debug)]
pub struct Nfa {
    size: usize,
    initial: usize,
    final_state: usize,
    table: Vec<Vec<Option<EdgeId>>>,
    edges: Vec<Edge>,
    loops: Vec<RegexLoop>,
    strs: Vec<RegexString>,
    sets: Vec<CharSet>,
    backrefs: Vec<Backref>,
    punct_marks: BTreeSet<char>,
}

/// A partially built NFA fragment. Fragments are combined bottom-up, with
/// states renumbered as they are merged; the edge arena is shared across
/// all fragments so indices stay stable.
#[derive(Clone, Debug)]
struct Frag {
    size: usize,
    initial: usize,
    final_state: usize,
    table: Vec<Vec<Option<EdgeId>>>,
}

impl Frag {
    fn new(size: usize, initial: usize, final_state: usize) -> Frag {
        Frag {
            size,
            initial,
            final_state,
            table: vec![vec![None; size]; size],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, edge: EdgeId) {
        self.table[from][to] = Some(edge);
    }

    /// Renumber all states upwards by `shift`, leaving `0..shift` empty.
    fn shift_states(&mut self, shift: usize) {
        if shift < 1 {
            return;
        }
        let new_size = self.size + shift;
        let mut table = vec![vec![None; new_size]; new_size];
        for from in 0..self.size {
            for to in 0..self.size {
                table[from + shift][to + shift] = self.table[from][to];
            }
        }
        self.size = new_size;
        self.initial += shift;
        self.final_state += shift;
        self.table = table;
    }

    /// Copy another (already shifted) fragment's edges into this one.
    fn fill_states(&mut self, other: &Frag) {
        for from in 0..other.size {
            for to in 0..other.size {
                self.table[from][to] = other.table[from][to];
            }
        }
    }

    /// Grow the fragment by one state with no edges.
    fn append_empty_state(&mut self) {
        self.size += 1;
        for row in self.table.iter_mut() {
            row.push(None);
        }
        self.table.push(vec![None; self.size]);
    }
}

/// Builds the NFA from a parse tree.
struct Builder<'t> {
    tree: &'t ParseTree,
    edges: Vec<Edge>,
    loops: Vec<RegexLoop>,
    strs: Vec<RegexString>,
    /// The one shared epsilon edge.
    epsilon: EdgeId,
}

impl<'t> Builder<'t> {
    fn new(tree: &'t ParseTree) -> Builder<'t> {
        Builder {
            tree,
            edges: vec![Edge::epsilon()],
            loops: vec![],
            strs: vec![],
            epsilon: 0,
        }
    }

    fn push_edge(&mut self, kind: EdgeKind, span: Span) -> EdgeId {
        self.edges.push(Edge::new(kind, span));
        self.edges.len() - 1
    }

    fn build(&mut self, id: NodeId) -> Result<Frag> {
        let node = self.tree.node(id);
        match node.kind {
            NodeKind::Alternation { left, right } => {
                self.build_alternation(left, right)
            }
            NodeKind::Concat { left, right } => self.build_concat(left, right),
            NodeKind::Repeat { child, lower, upper } => {
                self.build_repeat(child, lower, upper, node.span)
            }
            NodeKind::Group { child, .. } => self.build(child),
            NodeKind::Character(c) => {
                Ok(self.leaf(EdgeKind::Character(c), node.span))
            }
            NodeKind::Set(set) => Ok(self.leaf(EdgeKind::Set(set), node.span)),
            NodeKind::Caret => Ok(self.leaf(EdgeKind::Caret, node.span)),
            NodeKind::Dollar => Ok(self.leaf(EdgeKind::Dollar, node.span)),
            NodeKind::Backreference(backref) => {
                Ok(self.leaf(EdgeKind::Backreference(backref), node.span))
            }
            NodeKind::Ignored => {
                let mut frag = Frag::new(2, 0, 1);
                frag.add_edge(0, 1, self.epsilon);
                Ok(frag)
            }
        }
    }

    /// A two state fragment with a single labeled edge.
    fn leaf(&mut self, kind: EdgeKind, span: Span) -> Frag {
        let mut frag = Frag::new(2, 0, 1);
        let edge = self.push_edge(kind, span);
        frag.add_edge(0, 1, edge);
        frag
    }

    /// `a|b`: a fresh initial state splits into both operands, whose final
    /// states join into a fresh final state.
    fn build_alternation(
        &mut self,
        left: NodeId,
        right: NodeId,
    ) -> Result<Frag> {
        let mut frag1 = self.build(left)?;
        let mut frag2 = self.build(right)?;

        frag1.shift_states(1);
        frag2.shift_states(frag1.size);

        let frag2_initial = frag2.initial;
        let frag2_final = frag2.final_state;
        let mut new = frag2;
        new.fill_states(&frag1);

        new.add_edge(0, frag1.initial, self.epsilon);
        new.add_edge(0, frag2_initial, self.epsilon);
        new.initial = 0;

        new.append_empty_state();
        new.final_state = new.size - 1;
        new.add_edge(frag1.final_state, new.final_state, self.epsilon);
        new.add_edge(frag2_final, new.final_state, self.epsilon);
        Ok(new)
    }

    /// `ab`: b's states follow a's; a's final state connects to b's
    /// initial state by epsilon.
    fn build_concat(&mut self, left: NodeId, right: NodeId) -> Result<Frag> {
        let frag1 = self.build(left)?;
        let mut frag2 = self.build(right)?;

        frag2.shift_states(frag1.size);

        let frag2_initial = frag2.initial;
        let mut new = frag2;
        new.fill_states(&frag1);
        new.add_edge(frag1.final_state, frag2_initial, self.epsilon);
        new.initial = frag1.initial;
        Ok(new)
    }

    /// `x{m,n}`: the body is wrapped with a shared begin/end loop pair.
    /// The `set+`/`set*` case of a word-like set instead collapses into a
    /// single string edge and adds no states at all.
    fn build_repeat(
        &mut self,
        child: NodeId,
        lower: u32,
        upper: Option<u32>,
        span: Span,
    ) -> Result<Frag> {
        if let Some(set) = self.string_candidate(child, lower, upper) {
            self.strs.push(RegexString { set, lower, upper });
            let str_id = self.strs.len() - 1;
            let mut frag = Frag::new(2, 0, 1);
            // The string edge covers the set through the quantifier.
            let span = Span::new(self.tree.node(child).span.start, span.end);
            let edge = self.push_edge(EdgeKind::Str(str_id), span);
            frag.add_edge(0, 1, edge);
            return Ok(frag);
        }

        let mut frag = self.build(child)?;
        frag.shift_states(1);
        frag.append_empty_state();

        self.loops.push(RegexLoop { lower, upper });
        let loop_id = self.loops.len() - 1;

        let begin = self.push_edge(EdgeKind::BeginLoop(loop_id), span);
        frag.add_edge(0, frag.initial, begin);
        let end = self.push_edge(EdgeKind::EndLoop(loop_id), span);
        frag.add_edge(frag.final_state, frag.size - 1, end);

        frag.initial = 0;
        frag.final_state = frag.size - 1;
        Ok(frag)
    }

    /// A repeat collapses into a string edge when it is `*` or `+` over a
    /// character set whose repetition reads as a word.
    fn string_candidate(
        &self,
        child: NodeId,
        lower: u32,
        upper: Option<u32>,
    ) -> Option<SetId> {
        if upper.is_some() || lower > 1 {
            return None;
        }
        match self.tree.node(child).kind {
            NodeKind::Set(set)
                if self.tree.sets()[set].is_string_candidate() =>
            {
                Some(set)
            }
            _ => None,
        }
    }
}

impl Nfa {
    /// Build the NFA for the given parse tree.
    pub fn build(tree: &ParseTree) -> Result<Nfa> {
        let mut builder = Builder::new(tree);
        let frag = builder.build(tree.root())?;
        Ok(Nfa {
            size: frag.size,
            initial: frag.initial,
            final_state: frag.final_state,
            table: frag.table,
            edges: builder.edges,
            loops: builder.loops,
            strs: builder.strs,
            sets: tree.sets().to_vec(),
            backrefs: tree.backrefs().to_vec(),
            punct_marks: tree.punct_marks().clone(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn final_state(&self) -> usize {
        self.final_state
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn loop_record(&self, id: LoopId) -> &RegexLoop {
        &self.loops[id]
    }

    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn str_record(&self, id: StrId) -> &RegexString {
        &self.strs[id]
    }

    pub fn num_strs(&self) -> usize {
        self.strs.len()
    }

    pub fn set(&self, id: SetId) -> &CharSet {
        &self.sets[id]
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn backref(&self, id: BackrefId) -> &Backref {
        &self.backrefs[id]
    }

    pub fn num_backrefs(&self) -> usize {
        self.backrefs.len()
    }

    pub fn punct_marks(&self) -> &BTreeSet<char> {
        &self.punct_marks
    }

    /// Fresh interpretation scratch sized for this NFA.
    pub fn new_interp(&self) -> Interp {
        Interp::new(
            self.edges.len(),
            self.sets.len(),
            self.loops.len(),
            self.strs.len(),
            self.backrefs.len(),
        )
    }

    /// Enumerate the basis paths from `initial` to `final`.
    ///
    /// The traversal is a DFS with per-state first-visit semantics: on
    /// reaching a state that some completed path has already visited, only
    /// the first outgoing edge is explored further. The resulting set
    /// covers every edge at least once while staying small.
    pub fn find_basis_paths(&self) -> Vec<Path> {
        let mut path = Path::new(self.initial);
        let mut paths = vec![];
        let mut visited = vec![false; self.size];
        self.traverse(self.initial, &mut path, &mut paths, &mut visited);
        paths
    }

    fn traverse(
        &self,
        curr_state: usize,
        path: &mut Path,
        paths: &mut Vec<Path>,
        visited: &mut [bool],
    ) {
        let been_here = visited[curr_state];

        if curr_state == self.final_state {
            path.mark_visited(visited);
            paths.push(path.clone());
            return;
        }

        for next_state in 0..self.size {
            let edge = match self.table[curr_state][next_state] {
                Some(edge) => edge,
                None => continue,
            };
            path.append(edge, next_state);
            self.traverse(next_state, path, paths, visited);
            path.remove_last();
            if been_here {
                break;
            }
        }
    }

    // The per-edge operations shared by path interpretation, the checker
    // and the generator. Edges are dumb index carriers; these methods
    // resolve them against the record arenas.

    /// The concrete text an edge contributes to the running test string.
    pub fn edge_substring(
        &self,
        interp: &Interp,
        edge: EdgeId,
        check_mode: bool,
    ) -> Result<String> {
        match self.edges[edge].kind {
            EdgeKind::Character(c) => Ok(c.to_string()),
            EdgeKind::Set(set) => {
                let c = self.sets[set].get_valid_character(None, check_mode)?;
                Ok(c.to_string())
            }
            EdgeKind::Str(str_id) => Ok(interp.strs[str_id].substring.clone()),
            EdgeKind::EndLoop(loop_id) => Ok(self.loops[loop_id]
                .extra_iterations(&interp.loops[loop_id])),
            EdgeKind::Backreference(backref) => {
                Ok(interp.backrefs[backref].substring.clone())
            }
            _ => Ok(String::new()),
        }
    }

    /// The character set behind a set or string edge.
    pub fn edge_charset(&self, edge: EdgeId) -> Option<(SetId, &CharSet)> {
        match self.edges[edge].kind {
            EdgeKind::Set(set) => Some((set, &self.sets[set])),
            EdgeKind::Str(str_id) => {
                let set = self.strs[str_id].set;
                Some((set, &self.sets[set]))
            }
            _ => None,
        }
    }

    pub fn is_opt_repeat_begin(&self, edge: EdgeId) -> bool {
        matches!(
            self.edges[edge].kind,
            EdgeKind::BeginLoop(id) if self.loops[id].is_opt_repeat()
        )
    }

    pub fn is_opt_repeat_end(&self, edge: EdgeId) -> bool {
        matches!(
            self.edges[edge].kind,
            EdgeKind::EndLoop(id) if self.loops[id].is_opt_repeat()
        )
    }

    /// True for edges that behave like a wildcard: `.`, complemented sets
    /// and string atoms over either.
    pub fn is_wild_candidate(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::Set(set) => {
                self.sets[set].is_wildcard() || self.sets[set].is_complement()
            }
            EdgeKind::Str(str_id) => {
                let record = &self.strs[str_id];
                record.is_wild_candidate(&self.sets[record.set])
            }
            _ => false,
        }
    }

    /// True if the edge can consume the given character.
    pub fn edge_matches_char(&self, edge: EdgeId, c: char) -> bool {
        match self.edges[edge].kind {
            EdgeKind::Character(ec) => ec == c,
            EdgeKind::Set(set) => {
                self.sets[set].is_wildcard()
                    || self.sets[set].is_valid_character(c)
            }
            EdgeKind::Str(str_id) => {
                let record = &self.strs[str_id];
                record.is_valid_character(&self.sets[record.set], c)
            }
            _ => false,
        }
    }

    /// True for a loop entry that can run two or more times.
    pub fn is_repeat_begin(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::BeginLoop(id) => {
                self.loops[id].upper.map_or(true, |u| u >= 2)
            }
            _ => false,
        }
    }

    /// True for a loop exit that can run two or more times.
    pub fn is_repeat_end(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::EndLoop(id) => {
                self.loops[id].upper.map_or(true, |u| u >= 2)
            }
            _ => false,
        }
    }

    /// True for an edge that, repeated, repeats a punctuation mark.
    pub fn is_repeat_punc_candidate(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::Character(c) => c.is_ascii_punctuation(),
            EdgeKind::Set(set) => self.sets[set].is_repeat_punc_candidate(),
            _ => false,
        }
    }

    /// True for a string atom whose set degenerates to punctuation.
    pub fn is_str_repeat_punc_candidate(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::Str(str_id) => {
                self.sets[self.strs[str_id].set].is_repeat_punc_candidate()
            }
            _ => false,
        }
    }

    /// The punctuation character a repeat of this edge would repeat.
    pub fn repeat_punc_char(
        &self,
        edge: EdgeId,
        check_mode: bool,
    ) -> Result<char> {
        match self.edges[edge].kind {
            EdgeKind::Character(c) => Ok(c),
            EdgeKind::Str(str_id) => self.sets[self.strs[str_id].set]
                .get_repeat_punc_char(check_mode),
            EdgeKind::Set(set) => {
                self.sets[set].get_repeat_punc_char(check_mode)
            }
            _ => Err(error::internal(
                "Repeat punctuation query on a non-repeating edge",
            )),
        }
    }

    /// The repeat bounds behind a string or loop edge.
    pub fn repeat_limits(&self, edge: EdgeId) -> Option<(u32, Option<u32>)> {
        match self.edges[edge].kind {
            EdgeKind::Str(str_id) => {
                let record = &self.strs[str_id];
                Some((record.lower, record.upper))
            }
            EdgeKind::BeginLoop(id) | EdgeKind::EndLoop(id) => {
                Some((self.loops[id].lower, self.loops[id].upper))
            }
            _ => None,
        }
    }

    pub fn is_zero_repeat_begin(&self, edge: EdgeId) -> bool {
        matches!(
            self.edges[edge].kind,
            EdgeKind::BeginLoop(id) if self.loops[id].lower == 0
        )
    }

    pub fn is_zero_repeat_end(&self, edge: EdgeId) -> bool {
        matches!(
            self.edges[edge].kind,
            EdgeKind::EndLoop(id) if self.loops[id].lower == 0
        )
    }

    pub fn is_digit_too_optional_candidate(&self, edge: EdgeId) -> bool {
        match self.edges[edge].kind {
            EdgeKind::Set(set) => {
                self.sets[set].is_digit_too_optional_candidate()
            }
            _ => false,
        }
    }

    /// Rewrite a wildcard-like edge so that it excludes the adjacent
    /// punctuation character `c`: `.` becomes `[^c]`, a complemented set
    /// gains `c` as a member.
    pub fn fix_wild_punctuation(
        &self,
        regex: &str,
        edge: EdgeId,
        c: char,
    ) -> Result<String> {
        let span = self.edges[edge].span.ok_or_else(|| {
            error::internal("Wildcard fix requested for an epsilon edge")
        })?;
        let end = (span.end + 1).min(regex.len());
        let source = &regex[span.start..end];

        let char_str = match c {
            '\\' | '[' | ']' | '^' | '-' => format!("\\{}", c),
            c => c.to_string(),
        };

        if source.starts_with('.') {
            return Ok(format!("[^{}]", char_str));
        }
        let close = source.rfind(']').ok_or_else(|| {
            error::internal("Wildcard fix requested for a bracketless set")
        })?;
        let mut fixed = source[..close + 1].to_string();
        fixed.insert_str(close, &char_str);
        Ok(fixed)
    }

    /// Render the NFA for debug logging.
    pub fn dump(&self) -> String {
        let mut out = String::from("NFA:\n");
        write!(
            out,
            "  states: {}, initial: {}, final: {}\n",
            self.size, self.initial, self.final_state
        )
        .unwrap();
        for from in 0..self.size {
            for to in 0..self.size {
                if let Some(edge) = self.table[from][to] {
                    write!(
                        out,
                        "  {} -> {} on {}\n",
                        from,
                        to,
                        self.describe_edge(edge)
                    )
                    .unwrap();
                }
            }
        }
        out
    }

    fn describe_edge(&self, edge: EdgeId) -> String {
        let e = &self.edges[edge];
        let label = match e.kind {
            EdgeKind::Character(c) => format!("CHARACTER {:?}", c),
            EdgeKind::Set(set) => format!("CHAR_SET [{}]", self.sets[set]),
            EdgeKind::Str(str_id) => {
                let record = &self.strs[str_id];
                format!("STRING [{}]{}", self.sets[record.set], record)
            }
            EdgeKind::BeginLoop(id) => {
                format!("BEGIN_LOOP {}", self.loops[id])
            }
            EdgeKind::EndLoop(id) => format!("END_LOOP {}", self.loops[id]),
            EdgeKind::Caret => "CARET".to_string(),
            EdgeKind::Dollar => "DOLLAR".to_string(),
            EdgeKind::Backreference(backref) => {
                let record = &self.backrefs[backref];
                format!(
                    "BACKREFERENCE group {} {:?}",
                    record.num, record.name
                )
            }
            EdgeKind::Epsilon => "EPSILON".to_string(),
        };
        match e.span {
            Some(span) => format!("{} @ {}", label, span),
            None => label,
        }
    }

    /// Record NFA statistics.
    pub fn add_stats(&self, stats: &mut Stats) {
        let mut counts = [0u64; 9];
        let mut edge_count = 0u64;
        for from in 0..self.size {
            for to in 0..self.size {
                if let Some(edge) = self.table[from][to] {
                    edge_count += 1;
                    let slot = match self.edges[edge].kind {
                        EdgeKind::Character(_) => 0,
                        EdgeKind::Set(_) => 1,
                        EdgeKind::Str(_) => 2,
                        EdgeKind::BeginLoop(_) => 3,
                        EdgeKind::EndLoop(_) => 4,
                        EdgeKind::Caret => 5,
                        EdgeKind::Dollar => 6,
                        EdgeKind::Backreference(_) => 7,
                        EdgeKind::Epsilon => 8,
                    };
                    counts[slot] += 1;
                }
            }
        }
        stats.add("NFA", "NFA states", self.size as u64);
        stats.add("NFA", "NFA edges", edge_count);
        stats.add("NFA", "NFA character edges", counts[0]);
        stats.add("NFA", "NFA char set edges", counts[1]);
        stats.add("NFA", "NFA string edges", counts[2]);
        stats.add("NFA", "NFA begin loop edges", counts[3]);
        stats.add("NFA", "NFA end loop edges", counts[4]);
        stats.add("NFA", "NFA caret edges", counts[5]);
        stats.add("NFA", "NFA dollar edges", counts[6]);
        stats.add("NFA", "NFA backreference edges", counts[7]);
        stats.add("NFA", "NFA epsilon edges", counts[8]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alerts;
    use crate::scanner::Scanner;
    use crate::Config;

    fn nfa(regex: &str) -> Nfa {
        let config = Config::new(regex);
        let mut alerts = Alerts::new(&config);
        let scanner = Scanner::scan(regex, &config, &mut alerts).unwrap();
        let tree = ParseTree::parse(scanner).unwrap();
        Nfa::build(&tree).unwrap()
    }

    fn edge_kinds_on(nfa: &Nfa, path: &Path) -> Vec<EdgeKind> {
        path.edges().iter().map(|&e| nfa.edge(e).kind.clone()).collect()
    }

    #[test]
    fn character_nfa() {
        let nfa = nfa("ab");
        let paths = nfa.find_basis_paths();
        assert_eq!(1, paths.len());
        let kinds: Vec<EdgeKind> = edge_kinds_on(&nfa, &paths[0])
            .into_iter()
            .filter(|k| *k != EdgeKind::Epsilon)
            .collect();
        assert_eq!(
            vec![EdgeKind::Character('a'), EdgeKind::Character('b')],
            kinds
        );
    }

    #[test]
    fn alternation_produces_one_path_per_branch() {
        let nfa = nfa("a|b|c");
        let paths = nfa.find_basis_paths();
        assert_eq!(3, paths.len());
    }

    #[test]
    fn paths_start_at_initial_and_end_at_final() {
        let nfa = nfa("(a|b)(c|d)e*");
        for path in nfa.find_basis_paths() {
            assert_eq!(nfa.initial(), path.states()[0]);
            assert_eq!(
                nfa.final_state(),
                *path.states().last().unwrap()
            );
            assert_eq!(path.states().len(), path.edges().len() + 1);
        }
    }

    #[test]
    fn basis_paths_cover_every_edge() {
        for regex in
            ["a|b", "(a|b)*c", "x(y|z){2,3}w", "a(b|(c|d)e)f|g", "^[a-c]+$"]
        {
            let nfa = nfa(regex);
            let paths = nfa.find_basis_paths();
            let mut covered = vec![false; nfa.num_edges()];
            for path in &paths {
                for &edge in path.edges() {
                    covered[edge] = true;
                }
            }
            // Edge 0 is the shared epsilon; it only has to be covered when
            // some transition actually uses it.
            for edge in 1..nfa.num_edges() {
                assert!(covered[edge], "edge {} uncovered in {}", edge, regex);
            }
        }
    }

    #[test]
    fn every_state_is_on_some_path() {
        for regex in ["a|b", "(ab)+c", "a{2,4}(x|y)"] {
            let nfa = nfa(regex);
            let paths = nfa.find_basis_paths();
            let mut seen = vec![false; nfa.size()];
            for path in &paths {
                for &state in path.states() {
                    seen[state] = true;
                }
            }
            for state in 0..nfa.size() {
                assert!(seen[state], "state {} not on any path in {}", state, regex);
            }
        }
    }

    #[test]
    fn repeat_wraps_body_in_loop_edges() {
        let nfa = nfa("a{2,3}");
        let paths = nfa.find_basis_paths();
        assert_eq!(1, paths.len());
        let kinds = edge_kinds_on(&nfa, &paths[0]);
        assert_eq!(
            vec![
                EdgeKind::BeginLoop(0),
                EdgeKind::Character('a'),
                EdgeKind::EndLoop(0),
            ],
            kinds
        );
        assert_eq!(
            &RegexLoop { lower: 2, upper: Some(3) },
            nfa.loop_record(0)
        );
    }

    #[test]
    fn word_set_plus_collapses_to_string_edge() {
        let nfa = nfa(r"\w+");
        assert_eq!(1, nfa.num_strs());
        assert_eq!(0, nfa.num_loops());
        let paths = nfa.find_basis_paths();
        assert_eq!(vec![EdgeKind::Str(0)], edge_kinds_on(&nfa, &paths[0]));
        // The string edge's span covers set and quantifier.
        let edge = paths[0].edges()[0];
        assert_eq!(Some(crate::Span::new(0, 2)), nfa.edge(edge).span);
    }

    #[test]
    fn digit_set_plus_stays_a_loop() {
        // \d+ is not a string candidate, so it keeps loop edges.
        let nfa = nfa(r"\d+");
        assert_eq!(0, nfa.num_strs());
        assert_eq!(1, nfa.num_loops());
    }

    #[test]
    fn bounded_word_set_stays_a_loop() {
        // \w{2,5} has an upper bound, so no string collapse.
        let nfa = nfa(r"\w{2,5}");
        assert_eq!(0, nfa.num_strs());
        assert_eq!(1, nfa.num_loops());
    }

    #[test]
    fn groups_add_no_states() {
        let plain = nfa("abc");
        let grouped = nfa("(abc)");
        assert_eq!(plain.size(), grouped.size());
    }

    #[test]
    fn wild_candidates() {
        let n = nfa(".a[^b]c\\w");
        let mut wild = 0;
        for path in n.find_basis_paths() {
            for &edge in path.edges() {
                if n.is_wild_candidate(edge) {
                    wild += 1;
                }
            }
        }
        // The dot and the complemented set.
        assert_eq!(2, wild);
    }

    #[test]
    fn fix_wild_punctuation_rewrites() {
        let n = nfa(".-");
        let paths = n.find_basis_paths();
        let dot_edge = paths[0].edges()[0];
        assert_eq!(
            "[^\\-]",
            n.fix_wild_punctuation(".-", dot_edge, '-').unwrap()
        );

        let n = nfa("[^;]+!");
        let paths = n.find_basis_paths();
        let set_edge = paths[0].edges()[0];
        assert_eq!(
            "[^;!]",
            n.fix_wild_punctuation("[^;]+!", set_edge, '!').unwrap()
        );
    }
}
