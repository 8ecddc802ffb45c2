use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use crate::charset::{CharSet, CharSetItem, ClassKind};
use crate::error::{self, EngineError, ErrorKind, Result};
use crate::scanner::{Scanner, TokenKind};
use crate::stats::Stats;
use crate::Span;

pub type NodeId = usize;
pub type SetId = usize;
pub type BackrefId = usize;

/// A node in the parse tree. Binary operators reference their children by
/// index into the tree's node arena.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Alternation { left: NodeId, right: NodeId },
    Concat { left: NodeId, right: NodeId },
    Repeat { child: NodeId, lower: u32, upper: Option<u32> },
    Group { child: NodeId, name: Option<String>, num: Option<u32> },
    Character(char),
    Set(SetId),
    Caret,
    Dollar,
    Backreference(BackrefId),
    /// Something that matches the empty string: `\b`, `\B`, or an ignored
    /// group extension with an empty body.
    Ignored,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub span: Span,
}

/// A backreference `\N` or `(?P=name)`, resolved at parse time to the
/// location of the group it refers to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Backref {
    pub num: u32,
    pub name: Option<String>,
    /// Where the referenced group sits in the regex. Path interpretation
    /// collects the captured text by walking the edges inside this span.
    pub group_span: Span,
}

/// The output of the parser: a node arena plus the records that later
/// stages reference by index.
///
/// The tree owns every `CharSet` and `Backref` in the regex; nothing here
/// is mutated after parsing.
#[derive(Clone, Debug)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: NodeId,
    sets: Vec<CharSet>,
    backrefs: Vec<Backref>,
    punct_marks: BTreeSet<char>,
}

impl ParseTree {
    /// Parse the scanned tokens into a tree.
    pub fn parse(scanner: Scanner) -> Result<ParseTree> {
        let mut parser = Parser {
            scanner,
            nodes: vec![],
            sets: vec![],
            backrefs: vec![],
            punct_marks: BTreeSet::new(),
            group_count: 0,
            group_spans: HashMap::new(),
            named_group_spans: HashMap::new(),
        };
        let root = parser.expr()?;
        if let Some(kind) = parser.scanner.kind() {
            return Err(error::parse(format!(
                "Unexpected token {:?} at position {}",
                kind,
                parser.scanner.span().start
            )));
        }
        Ok(ParseTree {
            nodes: parser.nodes,
            root,
            sets: parser.sets,
            backrefs: parser.backrefs,
            punct_marks: parser.punct_marks,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id]
    }

    pub fn sets(&self) -> &[CharSet] {
        &self.sets
    }

    pub fn backrefs(&self) -> &[Backref] {
        &self.backrefs
    }

    /// The literal punctuation characters appearing anywhere in the regex.
    /// These seed the evil strings for permissive sets and string atoms.
    pub fn punct_marks(&self) -> &BTreeSet<char> {
        &self.punct_marks
    }

    /// Render the tree for debug logging.
    pub fn dump(&self) -> String {
        let mut out = String::from("Parse tree:\n");
        self.dump_node(self.root, 1, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        let indent = "  ".repeat(depth);
        let span = node.span;
        match node.kind {
            NodeKind::Alternation { left, right } => {
                write!(out, "{}alternation {}\n", indent, span).unwrap();
                self.dump_node(left, depth + 1, out);
                self.dump_node(right, depth + 1, out);
            }
            NodeKind::Concat { left, right } => {
                write!(out, "{}concat {}\n", indent, span).unwrap();
                self.dump_node(left, depth + 1, out);
                self.dump_node(right, depth + 1, out);
            }
            NodeKind::Repeat { child, lower, upper } => {
                write!(
                    out,
                    "{}repeat{{{},{}}} {}\n",
                    indent,
                    lower,
                    upper.map_or("-".to_string(), |u| u.to_string()),
                    span
                )
                .unwrap();
                self.dump_node(child, depth + 1, out);
            }
            NodeKind::Group { child, ref name, num } => {
                write!(
                    out,
                    "{}group num={:?} name={:?} {}\n",
                    indent, num, name, span
                )
                .unwrap();
                self.dump_node(child, depth + 1, out);
            }
            NodeKind::Character(c) => {
                write!(out, "{}character {:?} {}\n", indent, c, span).unwrap();
            }
            NodeKind::Set(id) => {
                write!(out, "{}charset [{}] {}\n", indent, self.sets[id], span)
                    .unwrap();
            }
            NodeKind::Caret => {
                write!(out, "{}caret {}\n", indent, span).unwrap();
            }
            NodeKind::Dollar => {
                write!(out, "{}dollar {}\n", indent, span).unwrap();
            }
            NodeKind::Backreference(id) => {
                let backref = &self.backrefs[id];
                write!(
                    out,
                    "{}backreference num={} name={:?} {}\n",
                    indent, backref.num, backref.name, span
                )
                .unwrap();
            }
            NodeKind::Ignored => {
                write!(out, "{}ignored {}\n", indent, span).unwrap();
            }
        }
    }

    /// Record parse tree statistics.
    pub fn add_stats(&self, stats: &mut Stats) {
        let mut alternation = 0u64;
        let mut concat = 0u64;
        let mut repeat = 0u64;
        let mut unnamed_group = 0u64;
        let mut named_group = 0u64;
        let mut backreference = 0u64;
        let mut character = 0u64;
        let mut caret = 0u64;
        let mut dollar = 0u64;
        let mut normal_set = 0u64;
        let mut complement_set = 0u64;
        let mut ignored = 0u64;
        for node in self.nodes.iter() {
            match node.kind {
                NodeKind::Alternation { .. } => alternation += 1,
                NodeKind::Concat { .. } => concat += 1,
                NodeKind::Repeat { .. } => repeat += 1,
                NodeKind::Group { ref name, .. } => {
                    if name.is_some() {
                        named_group += 1;
                    } else {
                        unnamed_group += 1;
                    }
                }
                NodeKind::Backreference(_) => backreference += 1,
                NodeKind::Character(_) => character += 1,
                NodeKind::Caret => caret += 1,
                NodeKind::Dollar => dollar += 1,
                NodeKind::Set(id) => {
                    if self.sets[id].is_complement() {
                        complement_set += 1;
                    } else {
                        normal_set += 1;
                    }
                }
                NodeKind::Ignored => ignored += 1,
            }
        }
        stats.add("TREE", "Alternation nodes", alternation);
        stats.add("TREE", "Concat nodes", concat);
        stats.add("TREE", "Repeat nodes", repeat);
        stats.add("TREE", "Unnamed group nodes", unnamed_group);
        stats.add("TREE", "Named group nodes", named_group);
        stats.add("TREE", "Backreference nodes", backreference);
        stats.add("TREE", "Character nodes", character);
        stats.add("TREE", "Caret nodes", caret);
        stats.add("TREE", "Dollar nodes", dollar);
        stats.add("TREE", "Normal char set nodes", normal_set);
        stats.add("TREE", "Complement char set nodes", complement_set);
        stats.add("TREE", "Ignored nodes", ignored);
    }
}

/// The recursive descent parser. Grammar:
///
/// ```text
/// expr      ::= concat ('|' expr)? | '|' expr | concat '|' | '|'
/// concat    ::= rep concat?
/// rep       ::= atom ('*' | '+' | '?' | '{m,n}')?
/// atom      ::= group | character | char_class | char_set
/// group     ::= '(' ext? expr? ')'
/// char_set  ::= '[' '^'? char_list ']'
/// char_list ::= list_item+
/// list_item ::= CHARACTER | CHAR_CLASS | CHARACTER '-' CHARACTER
/// ```
///
/// An empty alternation branch turns the other branch into `{0,1}`, so
/// `a|` accepts `a` and the empty string. Both branches empty is an error.
struct Parser {
    scanner: Scanner,
    nodes: Vec<ParseNode>,
    sets: Vec<CharSet>,
    backrefs: Vec<Backref>,
    punct_marks: BTreeSet<char>,
    group_count: u32,
    group_spans: HashMap<u32, Span>,
    named_group_spans: HashMap<String, Span>,
}

impl Parser {
    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(ParseNode { kind, span });
        self.nodes.len() - 1
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    /// True at a position where an alternation branch can be empty: the
    /// end of the input or a closing paren.
    fn at_branch_end(&self) -> bool {
        matches!(self.scanner.kind(), None | Some(TokenKind::RParen))
    }

    fn expr(&mut self) -> Result<NodeId> {
        let left = if self.at_branch_end()
            || matches!(self.scanner.kind(), Some(TokenKind::Alternation))
        {
            None
        } else {
            Some(self.concat()?)
        };

        if !matches!(self.scanner.kind(), Some(TokenKind::Alternation)) {
            return left.ok_or_else(|| {
                error::parse(format!(
                    "Expected expression at position {}",
                    self.scanner.span().start
                ))
            });
        }
        let bar_span = self.scanner.span();
        self.scanner.advance();

        let right = if self.at_branch_end() { None } else { Some(self.expr()?) };

        match (left, right) {
            (Some(left), Some(right)) => {
                let span = Span::new(
                    self.span_of(left).start,
                    self.span_of(right).end,
                );
                Ok(self.push(NodeKind::Alternation { left, right }, span))
            }
            // One empty branch makes the other optional.
            (Some(child), None) | (None, Some(child)) => Ok(self.push(
                NodeKind::Repeat { child, lower: 0, upper: Some(1) },
                bar_span,
            )),
            (None, None) => Err(EngineError::new(
                ErrorKind::PointlessAlternation,
                "Alternation with two empty alternatives",
            )),
        }
    }

    fn concat(&mut self) -> Result<NodeId> {
        let left = self.rep()?;
        if !self.scanner.is_concat() {
            return Ok(left);
        }
        let right = self.concat()?;
        let span =
            Span::new(self.span_of(left).start, self.span_of(right).end);
        Ok(self.push(NodeKind::Concat { left, right }, span))
    }

    fn rep(&mut self) -> Result<NodeId> {
        let child = self.atom()?;
        let quant_span = self.scanner.span();
        let bounds = match self.scanner.kind() {
            Some(TokenKind::Star) => Some((0, None)),
            Some(TokenKind::Plus) => Some((1, None)),
            Some(TokenKind::Question) => Some((0, Some(1))),
            Some(&TokenKind::Repeat { lower, upper }) => Some((lower, upper)),
            _ => None,
        };
        match bounds {
            None => Ok(child),
            Some((lower, upper)) => {
                self.scanner.advance();
                Ok(self.push(
                    NodeKind::Repeat { child, lower, upper },
                    quant_span,
                ))
            }
        }
    }

    fn atom(&mut self) -> Result<NodeId> {
        let span = self.scanner.span();
        match self.scanner.kind() {
            Some(TokenKind::LParen) => self.group(),
            Some(TokenKind::LBracket) => self.char_set(),
            Some(&TokenKind::Character(c)) => {
                self.scanner.advance();
                if c.is_ascii_punctuation() {
                    self.punct_marks.insert(c);
                }
                Ok(self.push(NodeKind::Character(c), span))
            }
            Some(&TokenKind::CharClass(c)) => {
                self.scanner.advance();
                let kind = ClassKind::from_letter(c).ok_or_else(|| {
                    error::internal(format!(
                        "Invalid character class in character set: {}",
                        c
                    ))
                })?;
                let mut set = CharSet::new();
                set.add_item(CharSetItem::Class(kind));
                self.sets.push(set);
                Ok(self.push(NodeKind::Set(self.sets.len() - 1), span))
            }
            Some(TokenKind::Caret) => {
                self.scanner.advance();
                Ok(self.push(NodeKind::Caret, span))
            }
            Some(TokenKind::Dollar) => {
                self.scanner.advance();
                Ok(self.push(NodeKind::Dollar, span))
            }
            Some(TokenKind::WordBoundary) => {
                self.scanner.advance();
                Ok(self.push(NodeKind::Ignored, span))
            }
            Some(TokenKind::Backreference { .. }) => {
                let (num, name) = match self.scanner.kind() {
                    Some(&TokenKind::Backreference { num, ref name }) => {
                        (num, name.clone())
                    }
                    _ => unreachable!(),
                };
                self.scanner.advance();
                self.backreference(num, name, span)
            }
            other => Err(error::parse(format!(
                "Unexpected token {:?} at position {}",
                other,
                span.start
            ))),
        }
    }

    fn backreference(
        &mut self,
        num: u32,
        name: String,
        span: Span,
    ) -> Result<NodeId> {
        let (name, group_span) = if name.is_empty() {
            let group_span =
                self.group_spans.get(&num).copied().ok_or_else(|| {
                    error::parse(format!(
                        "Backreference to unknown group {}",
                        num
                    ))
                })?;
            (None, group_span)
        } else {
            let group_span = self
                .named_group_spans
                .get(&name)
                .copied()
                .ok_or_else(|| {
                    error::parse(format!(
                        "Backreference to unknown group {}",
                        name
                    ))
                })?;
            (Some(name), group_span)
        };
        self.backrefs.push(Backref { num, name, group_span });
        Ok(self.push(
            NodeKind::Backreference(self.backrefs.len() - 1),
            span,
        ))
    }

    fn group(&mut self) -> Result<NodeId> {
        let open_span = self.scanner.span();
        self.scanner.advance();

        match self.scanner.kind() {
            Some(TokenKind::NoGroupExt) => {
                self.scanner.advance();
                let child = self.expr()?;
                let close_span = self.expect_rparen()?;
                let span = Span::new(open_span.start, close_span.end);
                Ok(self.push(
                    NodeKind::Group { child, name: None, num: None },
                    span,
                ))
            }
            Some(TokenKind::NamedGroupExt { .. }) => {
                let name = match self.scanner.kind() {
                    Some(TokenKind::NamedGroupExt { name }) => name.clone(),
                    _ => unreachable!(),
                };
                self.scanner.advance();
                self.group_count += 1;
                let num = self.group_count;
                let child = self.expr()?;
                let close_span = self.expect_rparen()?;
                let span = Span::new(open_span.start, close_span.end);
                self.group_spans.insert(num, span);
                self.named_group_spans.insert(name.clone(), span);
                Ok(self.push(
                    NodeKind::Group { child, name: Some(name), num: Some(num) },
                    span,
                ))
            }
            Some(TokenKind::IgnoredExt) => {
                self.scanner.advance();
                if matches!(self.scanner.kind(), Some(TokenKind::RParen)) {
                    let close_span = self.scanner.span();
                    self.scanner.advance();
                    let span = Span::new(open_span.start, close_span.end);
                    return Ok(self.push(NodeKind::Ignored, span));
                }
                let child = self.expr()?;
                let close_span = self.expect_rparen()?;
                let span = Span::new(open_span.start, close_span.end);
                Ok(self.push(
                    NodeKind::Group { child, name: None, num: None },
                    span,
                ))
            }
            Some(TokenKind::Backreference { .. }) => {
                // (?P=name), scanned as '(' BACKREFERENCE ')'.
                let backref_span = self.scanner.span();
                let (num, name) = match self.scanner.kind() {
                    Some(&TokenKind::Backreference { num, ref name }) => {
                        (num, name.clone())
                    }
                    _ => unreachable!(),
                };
                self.scanner.advance();
                self.expect_rparen()?;
                self.backreference(num, name, backref_span)
            }
            _ => {
                self.group_count += 1;
                let num = self.group_count;
                let child = self.expr()?;
                let close_span = self.expect_rparen()?;
                let span = Span::new(open_span.start, close_span.end);
                self.group_spans.insert(num, span);
                Ok(self.push(
                    NodeKind::Group { child, name: None, num: Some(num) },
                    span,
                ))
            }
        }
    }

    fn expect_rparen(&mut self) -> Result<Span> {
        match self.scanner.kind() {
            Some(TokenKind::RParen) => {
                let span = self.scanner.span();
                self.scanner.advance();
                Ok(span)
            }
            _ => Err(error::parse(format!(
                "Expected ) at position {}",
                self.scanner.span().start
            ))),
        }
    }

    fn char_set(&mut self) -> Result<NodeId> {
        let open_span = self.scanner.span();
        self.scanner.advance();

        let mut set = CharSet::new();
        if matches!(self.scanner.kind(), Some(TokenKind::Caret)) {
            set.set_complement(true);
            self.scanner.advance();
        }

        loop {
            match self.scanner.kind() {
                Some(TokenKind::RBracket) => break,
                None => {
                    return Err(error::parse(
                        "Expected ] to close character set",
                    ));
                }
                _ => {
                    let item = self.list_item()?;
                    set.add_item(item);
                }
            }
        }
        let close_span = self.scanner.span();
        self.scanner.advance();
        let span = Span::new(open_span.start, close_span.end);

        if set.items().is_empty() {
            return Err(error::parse(format!(
                "Empty character set at position {}",
                span.start
            )));
        }

        // A one character set is just that character.
        if set.is_single_char() {
            if let CharSetItem::Character(c) = set.items()[0] {
                return Ok(self.push(NodeKind::Character(c), span));
            }
        }
        self.sets.push(set);
        Ok(self.push(NodeKind::Set(self.sets.len() - 1), span))
    }

    fn list_item(&mut self) -> Result<CharSetItem> {
        if self.scanner.is_char_range() {
            let start = match self.scanner.kind() {
                Some(&TokenKind::Character(c)) => c,
                _ => unreachable!(),
            };
            self.scanner.advance();
            self.scanner.advance();
            let end = match self.scanner.kind() {
                Some(&TokenKind::Character(c)) => c,
                _ => unreachable!(),
            };
            self.scanner.advance();
            if start > end {
                return Err(error::parse(format!(
                    "Invalid character range: {} is greater than {}",
                    start, end
                )));
            }
            return Ok(CharSetItem::Range(start, end));
        }

        let span = self.scanner.span();
        let item = match self.scanner.kind() {
            Some(&TokenKind::Character(c)) => {
                if c.is_ascii_punctuation() {
                    self.punct_marks.insert(c);
                }
                CharSetItem::Character(c)
            }
            Some(&TokenKind::CharClass(c)) => {
                let kind = ClassKind::from_letter(c).ok_or_else(|| {
                    error::internal(format!(
                        "Invalid character class in character set: {}",
                        c
                    ))
                })?;
                CharSetItem::Class(kind)
            }
            // Anchors and stray hyphens are literal inside a set.
            Some(TokenKind::Caret) => CharSetItem::Character('^'),
            Some(TokenKind::Dollar) => CharSetItem::Character('$'),
            Some(TokenKind::Hyphen) => CharSetItem::Character('-'),
            other => {
                return Err(error::parse(format!(
                    "Unexpected token {:?} in character set at position {}",
                    other,
                    span.start
                )));
            }
        };
        self.scanner.advance();
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alerts;
    use crate::Config;

    fn parse(regex: &str) -> Result<ParseTree> {
        let config = Config::new(regex);
        let mut alerts = Alerts::new(&config);
        let scanner = Scanner::scan(regex, &config, &mut alerts)?;
        ParseTree::parse(scanner)
    }

    fn kind(tree: &ParseTree, id: NodeId) -> &NodeKind {
        &tree.node(id).kind
    }

    #[test]
    fn single_character() {
        let tree = parse("a").unwrap();
        assert_eq!(NodeKind::Character('a'), *kind(&tree, tree.root()));
    }

    #[test]
    fn concat_and_alternation() {
        let tree = parse("ab|c").unwrap();
        let (left, right) = match *kind(&tree, tree.root()) {
            NodeKind::Alternation { left, right } => (left, right),
            ref other => panic!("expected alternation, got {:?}", other),
        };
        assert!(matches!(*kind(&tree, left), NodeKind::Concat { .. }));
        assert_eq!(NodeKind::Character('c'), *kind(&tree, right));
    }

    #[test]
    fn repeats_desugar() {
        let tree = parse("a*").unwrap();
        match *kind(&tree, tree.root()) {
            NodeKind::Repeat { lower: 0, upper: None, .. } => {}
            ref other => panic!("expected repeat, got {:?}", other),
        }
        let tree = parse("a{2,7}").unwrap();
        match *kind(&tree, tree.root()) {
            NodeKind::Repeat { lower: 2, upper: Some(7), .. } => {}
            ref other => panic!("expected repeat, got {:?}", other),
        }
    }

    #[test]
    fn repeat_bounds_invariant() {
        for regex in ["a*", "a+", "a?", "a{3}", "a{2,}", "a{,4}", "(x|y){1,9}"] {
            let tree = parse(regex).unwrap();
            for id in 0..=tree.root() {
                if let NodeKind::Repeat { lower, upper, .. } =
                    *kind(&tree, id)
                {
                    if let Some(upper) = upper {
                        assert!(upper >= lower, "regex {}", regex);
                        assert!(
                            !(lower == 0 && upper == 0),
                            "regex {}",
                            regex
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn empty_alternation_branch_is_optional() {
        let tree = parse("a|").unwrap();
        match *kind(&tree, tree.root()) {
            NodeKind::Repeat { child, lower: 0, upper: Some(1) } => {
                assert_eq!(NodeKind::Character('a'), *kind(&tree, child));
            }
            ref other => panic!("expected optional, got {:?}", other),
        }
        let tree = parse("|a").unwrap();
        assert!(matches!(
            *kind(&tree, tree.root()),
            NodeKind::Repeat { lower: 0, upper: Some(1), .. }
        ));
    }

    #[test]
    fn double_empty_alternation_is_an_error() {
        assert_eq!(
            ErrorKind::PointlessAlternation,
            parse("a||").unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::PointlessAlternation,
            parse("|").unwrap_err().kind()
        );
    }

    #[test]
    fn groups_are_numbered_on_entry() {
        let tree = parse("(a(b))(c)").unwrap();
        let mut nums = vec![];
        for id in 0..=tree.root() {
            if let NodeKind::Group { num: Some(num), .. } = *kind(&tree, id) {
                nums.push(num);
            }
        }
        nums.sort();
        assert_eq!(vec![1, 2, 3], nums);
    }

    #[test]
    fn extension_groups_are_not_numbered() {
        let tree = parse("(?:a)(b)").unwrap();
        for id in 0..=tree.root() {
            if let NodeKind::Group { num, ref name, .. } = *kind(&tree, id) {
                match num {
                    // The (b) group.
                    Some(1) => {}
                    None => assert!(name.is_none()),
                    other => panic!("unexpected group number {:?}", other),
                }
            }
        }
    }

    #[test]
    fn named_group_backreference() {
        let tree = parse("(?P<word>ab)-(?P=word)").unwrap();
        assert_eq!(1, tree.backrefs().len());
        let backref = &tree.backrefs()[0];
        assert_eq!(Some("word".to_string()), backref.name);
        assert_eq!(Span::new(0, 11), backref.group_span);
    }

    #[test]
    fn numbered_backreference() {
        let tree = parse(r"(ab)\1").unwrap();
        assert_eq!(1, tree.backrefs().len());
        assert_eq!(1, tree.backrefs()[0].num);
        assert_eq!(Span::new(0, 3), tree.backrefs()[0].group_span);
    }

    #[test]
    fn backreference_to_unknown_group_fails() {
        assert_eq!(ErrorKind::ParseError, parse(r"(a)\2").unwrap_err().kind());
        assert_eq!(
            ErrorKind::ParseError,
            parse("(?P<x>a)(?P=y)").unwrap_err().kind()
        );
    }

    #[test]
    fn single_character_set_folds() {
        let tree = parse("[x]").unwrap();
        assert_eq!(NodeKind::Character('x'), *kind(&tree, tree.root()));
        assert_eq!(Span::new(0, 2), tree.node(tree.root()).span);
        // Complemented sets never fold.
        let tree = parse("[^x]").unwrap();
        assert!(matches!(*kind(&tree, tree.root()), NodeKind::Set(_)));
    }

    #[test]
    fn char_set_items() {
        let tree = parse(r"[a-f9\d,]").unwrap();
        let set = &tree.sets()[0];
        assert_eq!(
            &[
                CharSetItem::Range('a', 'f'),
                CharSetItem::Character('9'),
                CharSetItem::Class(ClassKind::Digit),
                CharSetItem::Character(','),
            ],
            set.items()
        );
    }

    #[test]
    fn anchors_are_literal_inside_sets() {
        let tree = parse("[a$]").unwrap();
        let set = &tree.sets()[0];
        assert_eq!(
            &[CharSetItem::Character('a'), CharSetItem::Character('$')],
            set.items()
        );
    }

    #[test]
    fn inverted_range_fails() {
        assert_eq!(ErrorKind::ParseError, parse("[z-a]").unwrap_err().kind());
    }

    #[test]
    fn unclosed_set_fails() {
        assert_eq!(ErrorKind::ParseError, parse("[abc").unwrap_err().kind());
    }

    #[test]
    fn unclosed_group_fails() {
        assert_eq!(ErrorKind::ParseError, parse("(ab").unwrap_err().kind());
    }

    #[test]
    fn punct_marks_collected() {
        let tree = parse(r"a\.b[,;]-").unwrap();
        let expected: BTreeSet<char> =
            [',', '-', '.', ';'].into_iter().collect();
        assert_eq!(&expected, tree.punct_marks());
    }

    #[test]
    fn word_boundary_is_ignored_node() {
        let mut config = Config::new(r"a\b");
        config.check_mode = true;
        let mut alerts = Alerts::new(&config);
        let scanner = Scanner::scan(r"a\b", &config, &mut alerts).unwrap();
        let tree = ParseTree::parse(scanner).unwrap();
        match *kind(&tree, tree.root()) {
            NodeKind::Concat { right, .. } => {
                assert_eq!(NodeKind::Ignored, *kind(&tree, right));
            }
            ref other => panic!("expected concat, got {:?}", other),
        }
    }
}
