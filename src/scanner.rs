use std::fmt::Write;

use crate::alert::{Alert, Alerts};
use crate::error::{self, EngineError, ErrorKind, Result};
use crate::stats::Stats;
use crate::{Config, Span};

/// The kind of a scanned token.
///
/// Most of the regex metacharacters degrade to plain `Character` tokens
/// depending on context; the scanner resolves all of that so the parser
/// never has to look at the source text again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// `|`
    Alternation,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `?`
    Question,
    /// `{n}`, `{n,}`, `{,m}`, or `{n,m}`; `upper` of `None` means no limit
    Repeat { lower: u32, upper: Option<u32> },
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[` opening a character set
    LBracket,
    /// `]` closing a character set
    RBracket,
    /// `^` or `\A`
    Caret,
    /// `$` or `\Z`
    Dollar,
    /// `-` acting as a range separator inside a character set
    Hyphen,
    /// any character with no special meaning in its context
    Character(char),
    /// `\w`, `\d`, `\s`, `\W`, `\D`, `\S`, or the wildcard `.` (encoded
    /// by its letter, with `.` encoded as itself)
    CharClass(char),
    /// `\b` or `\B` outside a character set
    WordBoundary,
    /// `(?:`
    NoGroupExt,
    /// `(?P<name>`
    NamedGroupExt { name: String },
    /// an extension that is accepted but ignored, e.g. `(?i)` or `(?=`
    IgnoredExt,
    /// `\N` or `(?P=name)`; `num` is zero for named backreferences
    Backreference { num: u32, name: String },
}

/// A token plus its location in the regex source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Scans a regex into a token stream and then doles the tokens out to the
/// parser one at a time.
///
/// The scanner resolves every context-sensitive case up front: brackets,
/// hyphens and metacharacters inside `[...]`, escapes, group extensions and
/// repeat quantifiers. Lazy quantifier modifiers (`*?`, `+?`, `??`,
/// `{m,n}?`) are consumed and deliberately ignored; greediness has no
/// bearing on which strings a regex accepts, which is all this engine
/// reasons about.
#[derive(Clone, Debug)]
pub struct Scanner {
    tokens: Vec<Token>,
    pos: usize,
}

/// Scanner state shared by the sub-parsers for escapes, extensions and
/// repeats.
struct Chars {
    /// Each source character with its byte offset.
    chars: Vec<(usize, char)>,
}

impl Chars {
    fn new(src: &str) -> Chars {
        Chars { chars: src.char_indices().collect() }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn at(&self, idx: usize) -> char {
        self.chars[idx].1
    }

    /// The byte offset where the character at `idx` starts.
    fn start(&self, idx: usize) -> usize {
        self.chars[idx].0
    }

    /// The byte offset of the last byte of the character at `idx`.
    fn end(&self, idx: usize) -> usize {
        let (pos, ch) = self.chars[idx];
        pos + ch.len_utf8() - 1
    }

    /// Advance past the current character and return the next one, failing
    /// if the input ends.
    fn next(&self, idx: &mut usize) -> Result<char> {
        *idx += 1;
        if *idx >= self.len() {
            return Err(error::parse("Input string ended prematurely"));
        }
        Ok(self.at(*idx))
    }
}

impl Scanner {
    /// Scan the given regex into tokens.
    ///
    /// Ignored elements (`\b`, `\B`, `(?i)`, lookarounds and the like)
    /// produce warnings on the given sink. Unsupported escapes are fatal in
    /// test generation mode but tolerated in check mode.
    pub fn scan(
        regex: &str,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<Scanner> {
        let chars = Chars::new(regex);
        let mut tokens = vec![];
        let mut idx = 0;
        // True while scanning the inside of a character set.
        let mut in_set = false;

        while idx < chars.len() {
            let start = chars.start(idx);
            let c = chars.at(idx);
            let kind = match c {
                '\\' => {
                    Scanner::scan_escape(
                        &chars, &mut idx, in_set, config, alerts,
                    )?
                }
                '[' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        in_set = true;
                        TokenKind::LBracket
                    }
                }
                ']' => {
                    if in_set && last_is(&tokens, &TokenKind::LBracket) {
                        // A ']' immediately after '[' is a literal.
                        TokenKind::Character(c)
                    } else if in_set {
                        in_set = false;
                        TokenKind::RBracket
                    } else {
                        TokenKind::Character(c)
                    }
                }
                '-' => {
                    if in_set && last_is(&tokens, &TokenKind::LBracket) {
                        TokenKind::Character(c)
                    } else if in_set
                        && idx + 1 < chars.len()
                        && chars.at(idx + 1) == ']'
                    {
                        // A '-' at the end of a set is a literal.
                        TokenKind::Character(c)
                    } else if in_set {
                        TokenKind::Hyphen
                    } else {
                        TokenKind::Character(c)
                    }
                }
                '|' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        TokenKind::Alternation
                    }
                }
                '*' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        skip_lazy_modifier(&chars, &mut idx);
                        TokenKind::Star
                    }
                }
                '+' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        skip_lazy_modifier(&chars, &mut idx);
                        TokenKind::Plus
                    }
                }
                '?' => {
                    if last_is(&tokens, &TokenKind::LParen) {
                        Scanner::scan_extension(&chars, &mut idx, alerts)?
                    } else if in_set {
                        TokenKind::Character(c)
                    } else {
                        skip_lazy_modifier(&chars, &mut idx);
                        TokenKind::Question
                    }
                }
                '(' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        TokenKind::LParen
                    }
                }
                ')' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        TokenKind::RParen
                    }
                }
                '.' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        TokenKind::CharClass(c)
                    }
                }
                '{' => {
                    if in_set {
                        TokenKind::Character(c)
                    } else {
                        let kind = Scanner::scan_repeat(&chars, &mut idx)?;
                        if !matches!(kind, TokenKind::Character(_)) {
                            skip_lazy_modifier(&chars, &mut idx);
                        }
                        kind
                    }
                }
                // Anchors always scan as anchor tokens. When they occur
                // inside a set, the parser treats them as literals.
                '^' => TokenKind::Caret,
                '$' => TokenKind::Dollar,
                _ => TokenKind::Character(c),
            };
            let span = Span::new(start, chars.end(idx));
            tokens.push(Token { kind, span });
            idx += 1;
        }

        let scanner = Scanner { tokens, pos: 0 };
        scanner.check_tiling(regex)?;
        Ok(scanner)
    }

    /// Scan everything that follows a backslash.
    fn scan_escape(
        chars: &Chars,
        idx: &mut usize,
        in_set: bool,
        config: &Config,
        alerts: &mut Alerts,
    ) -> Result<TokenKind> {
        let start = chars.start(*idx);
        let c = chars.next(idx)?;
        let kind = match c {
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => TokenKind::CharClass(c),
            // \A and \Z only differ from ^ and $ in multi-line mode, which
            // is not supported.
            'A' => TokenKind::Caret,
            'Z' => TokenKind::Dollar,
            // \b is a backspace inside a set and a word boundary outside.
            'b' if in_set => TokenKind::Character('\u{8}'),
            'b' | 'B' => {
                let span = Span::new(start, chars.end(*idx));
                alerts.add(
                    Alert::warning(
                        "ignored",
                        format!("Regex contains ignored element \\{}", c),
                    )
                    .loc(span),
                );
                TokenKind::WordBoundary
            }
            'a' | 'f' | 'n' | 'r' | 't' | 'v' => {
                if !config.check_mode {
                    return Err(error::unsupported(format!(
                        "contains unsupported character \\{}",
                        c
                    )));
                }
                TokenKind::Character(match c {
                    'a' => '\u{7}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    _ => '\u{b}',
                })
            }
            'p' => {
                return Err(error::unsupported(
                    "contains unsupported character \\p",
                ));
            }
            '0'..='9' => Scanner::scan_octal(chars, idx, c, config)?,
            'x' => Scanner::scan_hex(chars, idx, 2, config)?,
            'u' => Scanner::scan_hex(chars, idx, 4, config)?,
            'U' => Scanner::scan_hex(chars, idx, 8, config)?,
            // Everything else is itself: \(, \$, \\, \', and so on.
            _ => TokenKind::Character(c),
        };
        Ok(kind)
    }

    /// Disambiguate `\N`: a three digit octal character code, a two digit
    /// or one digit backreference, or the (unsupported) NUL escape `\0`.
    fn scan_octal(
        chars: &Chars,
        idx: &mut usize,
        first: char,
        config: &Config,
    ) -> Result<TokenKind> {
        let second = if *idx + 1 < chars.len() {
            let c = chars.at(*idx + 1);
            if c.is_ascii_digit() {
                Some(c)
            } else {
                None
            }
        } else {
            None
        };

        // A lone digit is either NUL or a single digit backreference.
        let second = match second {
            None => {
                if first == '0' {
                    if !config.check_mode {
                        return Err(error::unsupported(
                            "contains unsupported character \\0",
                        ));
                    }
                    return Ok(TokenKind::Character('\u{0}'));
                }
                return Ok(TokenKind::Backreference {
                    num: first.to_digit(10).unwrap(),
                    name: String::new(),
                });
            }
            Some(c) => c,
        };

        let third = if *idx + 2 < chars.len() {
            let c = chars.at(*idx + 2);
            if c.is_ascii_digit() {
                Some(c)
            } else {
                None
            }
        } else {
            None
        };

        // Three digits make an octal character code, two make a
        // backreference to a multi-digit group number.
        if let Some(third) = third {
            let value = first.to_digit(10).unwrap() * 64
                + second.to_digit(10).unwrap() * 8
                + third.to_digit(10).unwrap();
            *idx += 2;
            if value > 126 || (value < 32 && !config.check_mode) {
                return Err(error::unsupported(format!(
                    "contains unsupported octal value {}",
                    value
                )));
            }
            Ok(TokenKind::Character(char::from_u32(value).unwrap()))
        } else {
            let num = first.to_digit(10).unwrap() * 10
                + second.to_digit(10).unwrap();
            *idx += 1;
            Ok(TokenKind::Backreference { num, name: String::new() })
        }
    }

    /// Scan `\xHH`, `\uHHHH` or `\UHHHHHHHH`.
    fn scan_hex(
        chars: &Chars,
        idx: &mut usize,
        num_digits: u32,
        config: &Config,
    ) -> Result<TokenKind> {
        let mut value: u32 = 0;
        for _ in 0..num_digits {
            let digit = chars.next(idx)?;
            let digit_val = match digit.to_digit(16) {
                Some(v) => v,
                None => {
                    return Err(error::parse(format!(
                        "Invalid hex digit {}",
                        digit
                    )));
                }
            };
            value = value.saturating_mul(16).saturating_add(digit_val);
        }
        if value > 126 || (value < 32 && !config.check_mode) {
            return Err(error::unsupported(format!(
                "contains unsupported hex value {}",
                value
            )));
        }
        Ok(TokenKind::Character(char::from_u32(value).unwrap()))
    }

    /// Scan a `(?...` group extension. The opening paren has already been
    /// emitted as its own token; `idx` sits on the `?`.
    fn scan_extension(
        chars: &Chars,
        idx: &mut usize,
        alerts: &mut Alerts,
    ) -> Result<TokenKind> {
        let start = chars.start(*idx);
        let ext = chars.next(idx)?;
        match ext {
            ':' => Ok(TokenKind::NoGroupExt),
            'P' => {
                let c = chars.next(idx)?;
                if c == '=' {
                    // (?P=name): a named backreference. Collect up to the
                    // closing paren, then back off so the paren scans as a
                    // normal RParen token.
                    let mut name = String::new();
                    let mut c = c;
                    while c != ')' {
                        c = chars.next(idx)?;
                        if c != ')' {
                            name.push(c);
                        }
                    }
                    *idx -= 1;
                    Ok(TokenKind::Backreference { num: 0, name })
                } else if c != '<' {
                    Err(error::parse(
                        "Improperly specified named group - expected < \
                         after (?P",
                    ))
                } else {
                    let mut name = String::new();
                    let mut c = c;
                    while c != '>' {
                        c = chars.next(idx)?;
                        if c != '>' {
                            name.push(c);
                        }
                    }
                    Ok(TokenKind::NamedGroupExt { name })
                }
            }
            '#' | '=' | '!' | 'a' | 'i' | 'L' | 'm' | 's' | 'u' | 'x' => {
                let span = Span::new(start, chars.end(*idx));
                alerts.add(
                    Alert::warning(
                        "ignored",
                        format!("Regex contains ignored extension ?{}", ext),
                    )
                    .loc(span),
                );
                Ok(TokenKind::IgnoredExt)
            }
            '<' => {
                let c = chars.next(idx)?;
                let span = Span::new(start, chars.end(*idx));
                alerts.add(
                    Alert::warning(
                        "ignored",
                        format!("Regex contains ignored extension ?<{}", c),
                    )
                    .loc(span),
                );
                Ok(TokenKind::IgnoredExt)
            }
            _ => {
                Err(error::internal(format!("Unexpected extension ?{}", ext)))
            }
        }
    }

    /// Scan a `{...}` repeat quantifier.
    ///
    /// The accepted forms are `{n}`, `{n,}`, `{,m}` and `{n,m}` with bare
    /// integer bounds. Anything else (including interior spaces) is a
    /// literal `{`, matching what the mainstream engines execute. The only
    /// hard errors are `lower > upper` and the pointless `{0}`/`{0,0}`.
    fn scan_repeat(chars: &Chars, idx: &mut usize) -> Result<TokenKind> {
        let save = *idx;
        let literal = TokenKind::Character('{');

        let mut count = String::new();
        let mut c = chars.next(idx)?;
        while c.is_ascii_digit() {
            count.push(c);
            c = chars.next(idx)?;
        }

        let lower: Option<u32> = match c {
            ',' => {
                if count.is_empty() {
                    None
                } else {
                    Some(parse_bound(&count)?)
                }
            }
            '}' => {
                // {n}: an exact repeat count.
                if count.is_empty() {
                    *idx = save;
                    return Ok(literal);
                }
                let n = parse_bound(&count)?;
                if n == 0 {
                    return Err(EngineError::new(
                        ErrorKind::PointlessRepeat,
                        "pointless repeat quantifier {0}",
                    ));
                }
                return Ok(TokenKind::Repeat { lower: n, upper: Some(n) });
            }
            _ => {
                *idx = save;
                return Ok(literal);
            }
        };

        count.clear();
        let mut c = chars.next(idx)?;
        while c.is_ascii_digit() {
            count.push(c);
            c = chars.next(idx)?;
        }
        if c != '}' {
            *idx = save;
            return Ok(literal);
        }
        let upper: Option<u32> = if count.is_empty() {
            None
        } else {
            Some(parse_bound(&count)?)
        };

        match (lower, upper) {
            // {,}: no bounds at all, treat as a literal.
            (None, None) => {
                *idx = save;
                Ok(literal)
            }
            (lower, None) => {
                Ok(TokenKind::Repeat { lower: lower.unwrap_or(0), upper: None })
            }
            (lower, Some(upper)) => {
                let lower = lower.unwrap_or(0);
                if lower > upper {
                    return Err(error::parse(format!(
                        "Invalid repeat quantifier: lower bound {} is \
                         greater than upper bound {}",
                        lower, upper
                    )));
                }
                if upper == 0 {
                    return Err(EngineError::new(
                        ErrorKind::PointlessRepeat,
                        "pointless repeat quantifier {0,0}",
                    ));
                }
                Ok(TokenKind::Repeat { lower, upper: Some(upper) })
            }
        }
    }

    /// Every token's span must start exactly one past the previous token's
    /// end, with the first token starting at offset zero. A violation here
    /// is a scanner bug.
    fn check_tiling(&self, regex: &str) -> Result<()> {
        let mut at = 0;
        for token in self.tokens.iter() {
            if token.span.start != at || token.span.end < token.span.start {
                log::debug!("token stream:\n{}", self.dump(regex));
                return Err(error::internal(
                    "Token location not set properly",
                ));
            }
            at = token.span.end + 1;
        }
        Ok(())
    }

    /// The full token list. The checker hangs on to this for building
    /// anchor rewrites after the scanner itself is gone.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The kind of the current token, or `None` at the end of input.
    pub fn kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    /// The span of the current token. At the end of input this is the
    /// empty span just past the last token.
    pub fn span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.span.end + 1)
                    .unwrap_or(0);
                Span::new(end, end)
            }
        }
    }

    /// Move to the next token.
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// True when the previous and current token are joined by implicit
    /// concatenation.
    pub fn is_concat(&self) -> bool {
        if self.pos == 0 || self.pos >= self.tokens.len() {
            return false;
        }
        let valid_prev = matches!(
            self.tokens[self.pos - 1].kind,
            TokenKind::Star
                | TokenKind::Plus
                | TokenKind::Question
                | TokenKind::Repeat { .. }
                | TokenKind::RParen
                | TokenKind::Character(_)
                | TokenKind::Caret
                | TokenKind::Dollar
                | TokenKind::WordBoundary
                | TokenKind::CharClass(_)
                | TokenKind::RBracket
                | TokenKind::Backreference { .. }
        );
        let invalid_next = matches!(
            self.tokens[self.pos].kind,
            TokenKind::Alternation
                | TokenKind::Star
                | TokenKind::Plus
                | TokenKind::Question
                | TokenKind::Repeat { .. }
                | TokenKind::RParen
                | TokenKind::RBracket
        );
        valid_prev && !invalid_next
    }

    /// True when the next three tokens form a `CHARACTER - CHARACTER`
    /// range inside a character set.
    pub fn is_char_range(&self) -> bool {
        if self.pos + 2 >= self.tokens.len() {
            return false;
        }
        matches!(self.tokens[self.pos].kind, TokenKind::Character(_))
            && matches!(self.tokens[self.pos + 1].kind, TokenKind::Hyphen)
            && matches!(self.tokens[self.pos + 2].kind, TokenKind::Character(_))
    }

    /// Render the token stream for debug logging.
    pub fn dump(&self, regex: &str) -> String {
        let mut out = format!("Scanner for {:?}:\n", regex);
        for token in self.tokens.iter() {
            write!(
                out,
                "  {}-{}: {:?}\n",
                token.span.start, token.span.end, token.kind
            )
            .unwrap();
        }
        out
    }

    /// Record scanner statistics.
    pub fn add_stats(&self, stats: &mut Stats) {
        stats.add("SCANNER", "Tokens", self.tokens.len() as u64);
    }
}

/// Parse a repeat bound that has already been vetted to be all digits.
fn parse_bound(digits: &str) -> Result<u32> {
    digits.parse().map_err(|_| {
        error::parse(format!("Repeat bound {} is out of range", digits))
    })
}

/// If the character after `idx` is a `?`, consume it. Greedy and lazy
/// variants of a quantifier accept the same set of strings.
fn skip_lazy_modifier(chars: &Chars, idx: &mut usize) {
    if *idx + 1 < chars.len() && chars.at(*idx + 1) == '?' {
        *idx += 1;
    }
}

fn last_is(tokens: &[Token], kind: &TokenKind) -> bool {
    tokens.last().map_or(false, |t| t.kind == *kind)
}
