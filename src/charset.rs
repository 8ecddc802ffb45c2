use std::collections::BTreeSet;
use std::fmt;

use crate::error::{self, EngineError, ErrorKind, Result};
use crate::Span;

/// The character classes that can occur as members of a character set.
///
/// `Space` and `NotSpace` model only the plain space character; the other
/// whitespace characters are rejected by the scanner in test generation
/// mode, so they never make it into generated strings anyway.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassKind {
    /// `\w`: letters, digits and `_`
    Word,
    /// `\d`: digits
    Digit,
    /// `\s`: the space character
    Space,
    /// `\W`
    NotWord,
    /// `\D`
    NotDigit,
    /// `\S`
    NotSpace,
    /// `.`: any character
    Any,
}

impl ClassKind {
    /// Build a class from the letter the scanner encoded it with.
    pub fn from_letter(letter: char) -> Option<ClassKind> {
        match letter {
            'w' => Some(ClassKind::Word),
            'd' => Some(ClassKind::Digit),
            's' => Some(ClassKind::Space),
            'W' => Some(ClassKind::NotWord),
            'D' => Some(ClassKind::NotDigit),
            'S' => Some(ClassKind::NotSpace),
            '.' => Some(ClassKind::Any),
            _ => None,
        }
    }

    /// The letter used to display this class (`.` displays as itself).
    pub fn letter(&self) -> char {
        match *self {
            ClassKind::Word => 'w',
            ClassKind::Digit => 'd',
            ClassKind::Space => 's',
            ClassKind::NotWord => 'W',
            ClassKind::NotDigit => 'D',
            ClassKind::NotSpace => 'S',
            ClassKind::Any => '.',
        }
    }
}

/// One member of a character set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CharSetItem {
    /// A literal character.
    Character(char),
    /// A character class such as `\w`.
    Class(ClassKind),
    /// A range `lo-hi`. Invariant: `lo <= hi` is not required here; the
    /// checker reports nonsensical ranges rather than rejecting them.
    Range(char, char),
}

/// A character set: the bracketed form `[...]`, a bare character class
/// like `\w`, or the wildcard `.`.
///
/// Sets are built by the parser and never change afterwards. Everything
/// the later stages need (membership, representative characters, lintable
/// shapes) is derived on demand.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CharSet {
    items: Vec<CharSetItem>,
    complement: bool,
}

/// A lintable shape found in one character set. The path checker turns
/// these into located alerts with example strings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SetFinding {
    /// A `|` or `,` that looks like it was meant to separate cases.
    Separator { sep: char, suggest: String },
    /// A range that does not stay within one of a-z, A-Z or 0-9.
    BadRange { start: char, end: char, suggest: String },
    /// Characters that appear more than once.
    Duplicates { chars: Vec<char> },
    /// One of a bracket pair is in the set and its partner is not.
    Brace { found: char, missing: char },
}

/// The fixed order in which punctuation is tried when picking a
/// representative character in check mode.
const PUNCT_PREFERENCE: [char; 32] = [
    '!', '"', '#', '$', '%', '&', '\'', '*', '+', '/', ':', ';', '<', '=',
    '>', '?', '@', '\\', '^', '_', '`', '~', '-', '.', '{', '[', '(', '}',
    ']', ')', ',', '|',
];

impl CharSet {
    /// Create an empty, non-complemented set.
    pub fn new() -> CharSet {
        CharSet::default()
    }

    /// Append an item.
    pub fn add_item(&mut self, item: CharSetItem) {
        self.items.push(item);
    }

    /// Mark the set as complemented (`[^...]`).
    pub fn set_complement(&mut self, complement: bool) {
        self.complement = complement;
    }

    pub fn is_complement(&self) -> bool {
        self.complement
    }

    pub fn items(&self) -> &[CharSetItem] {
        &self.items
    }

    /// True if the set is exactly one literal character. The parser folds
    /// such sets into plain character nodes.
    pub fn is_single_char(&self) -> bool {
        !self.complement
            && self.items.len() == 1
            && matches!(self.items[0], CharSetItem::Character(_))
    }

    /// True if the set is the wildcard `.`.
    pub fn is_wildcard(&self) -> bool {
        self.items.len() == 1
            && matches!(self.items[0], CharSetItem::Class(ClassKind::Any))
    }

    /// True if repeating this set produces word-like text, so that `set+`
    /// or `set*` should be treated as one string atom rather than a loop
    /// of single characters.
    ///
    /// That holds when the set is complemented, contains `\w`, `\D`, `\S`
    /// or `.`, or contains the range `a-z` or `A-Z` - as long as it has no
    /// other class and no unrelated range (digits are tolerated).
    pub fn is_string_candidate(&self) -> bool {
        if self.complement {
            return true;
        }
        let mut candidate = false;
        for item in self.items.iter() {
            match *item {
                CharSetItem::Character(_) => {}
                CharSetItem::Class(kind) => match kind {
                    ClassKind::Word
                    | ClassKind::NotDigit
                    | ClassKind::NotSpace
                    | ClassKind::Any => candidate = true,
                    _ => {}
                },
                CharSetItem::Range('a', 'z') => candidate = true,
                CharSetItem::Range('A', 'Z') => candidate = true,
                CharSetItem::Range('0', '9') => {}
                CharSetItem::Range(..) => return false,
            }
        }
        candidate
    }

    /// True if the set can match at least one punctuation character via a
    /// literal member or a permissive class.
    pub fn allows_punctuation(&self) -> bool {
        if self.complement {
            return true;
        }
        for item in self.items.iter() {
            match *item {
                CharSetItem::Character(c) if c.is_ascii_punctuation() => {
                    return true;
                }
                CharSetItem::Class(
                    ClassKind::NotDigit | ClassKind::NotSpace | ClassKind::Any,
                ) => return true,
                _ => {}
            }
        }
        false
    }

    /// True if every member is punctuation (and at least one punctuation
    /// character is present).
    pub fn only_has_punc(&self) -> bool {
        self.only_has_punc_impl(false)
    }

    /// Like `only_has_punc`, but spaces are tolerated as members.
    pub fn only_has_punc_and_spaces(&self) -> bool {
        self.only_has_punc_impl(true)
    }

    fn only_has_punc_impl(&self, allow_spaces: bool) -> bool {
        if self.complement {
            return false;
        }
        let ok = |c: char| {
            if allow_spaces {
                is_space(c) || c.is_ascii_punctuation()
            } else {
                c.is_ascii_punctuation()
            }
        };
        let mut found_punc = false;
        for item in self.items.iter() {
            match *item {
                CharSetItem::Character(c) => {
                    if !ok(c) {
                        return false;
                    }
                    if c.is_ascii_punctuation() {
                        found_punc = true;
                    }
                }
                CharSetItem::Range(start, end) => {
                    let mut c = start;
                    while c <= end {
                        if !ok(c) {
                            return false;
                        }
                        if c.is_ascii_punctuation() {
                            found_punc = true;
                        }
                        c = match bump(c) {
                            Some(c) => c,
                            None => break,
                        };
                    }
                }
                CharSetItem::Class(kind) => match kind {
                    ClassKind::Space => {
                        if !allow_spaces {
                            return false;
                        }
                    }
                    _ => return false,
                },
            }
        }
        found_punc
    }

    /// Membership test.
    pub fn is_valid_character(&self, character: char) -> bool {
        for item in self.items.iter() {
            let matched = match *item {
                CharSetItem::Character(c) => character == c,
                CharSetItem::Range(start, end) => {
                    character >= start && character <= end
                }
                CharSetItem::Class(kind) => match kind {
                    ClassKind::Word => is_word_char(character),
                    ClassKind::Digit => character.is_ascii_digit(),
                    ClassKind::Space => character == ' ',
                    ClassKind::NotWord => !is_word_char(character),
                    ClassKind::NotDigit => !character.is_ascii_digit(),
                    ClassKind::NotSpace => character != ' ',
                    ClassKind::Any => true,
                },
            };
            if matched {
                return !self.complement;
            }
        }
        self.complement
    }

    /// True if the character appears as an explicit member of a
    /// non-complemented set.
    pub fn has_character_item(&self, character: char) -> bool {
        if self.complement {
            return false;
        }
        self.items
            .iter()
            .any(|item| matches!(*item, CharSetItem::Character(c) if c == character))
    }

    /// The set rendered as a sorted string, one character per item (ranges
    /// contribute their start, classes their letter). Used to detect
    /// duplicated punctuation sets.
    pub fn charset_as_string(&self) -> String {
        let mut chars: Vec<char> = self
            .items
            .iter()
            .map(|item| match *item {
                CharSetItem::Character(c) => c,
                CharSetItem::Class(kind) => kind.letter(),
                CharSetItem::Range(start, _) => start,
            })
            .collect();
        chars.sort();
        chars.into_iter().collect()
    }

    /// Pick one member of the set, avoiding `except` when possible.
    ///
    /// In check mode the scan order is letters, digits, then punctuation in
    /// a fixed preference order, which keeps the example strings in
    /// diagnostics looking tame. In test generation mode a non-complemented
    /// set prefers its first explicit member so that baseline strings echo
    /// the regex.
    pub fn get_valid_character(
        &self,
        except: Option<char>,
        check_mode: bool,
    ) -> Result<char> {
        let not_excepted = |c: char| except != Some(c);

        if check_mode {
            for c in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
                if not_excepted(c) && self.is_valid_character(c) {
                    return Ok(c);
                }
            }
            for &c in PUNCT_PREFERENCE.iter() {
                if not_excepted(c) && self.is_valid_character(c) {
                    return Ok(c);
                }
            }
            if not_excepted(' ') && self.is_valid_character(' ') {
                return Ok(' ');
            }
        }

        if !self.complement {
            for item in self.items.iter() {
                if let CharSetItem::Character(c) = *item {
                    if not_excepted(c) {
                        return Ok(c);
                    }
                }
            }
            for item in self.items.iter() {
                match *item {
                    CharSetItem::Character(_) => {}
                    CharSetItem::Class(kind) => {
                        let (first, second) = match kind {
                            ClassKind::Word => ('a', 'b'),
                            ClassKind::Digit => ('0', '1'),
                            ClassKind::Space => (' ', '\t'),
                            ClassKind::NotWord => (';', '&'),
                            ClassKind::NotDigit => ('a', 'b'),
                            ClassKind::NotSpace => ('a', 'b'),
                            ClassKind::Any => ('a', 'b'),
                        };
                        return Ok(if not_excepted(first) {
                            first
                        } else {
                            second
                        });
                    }
                    CharSetItem::Range(start, _) => {
                        return Ok(if not_excepted(start) {
                            start
                        } else {
                            bump(start).unwrap_or(start)
                        });
                    }
                }
            }
            if let Some(c) = except {
                if self.is_valid_character(c) {
                    return Ok(c);
                }
            }
            return Err(error::internal(
                "Could not find good char in regular char set",
            ));
        }

        // Complemented set: scan for the first printable member.
        for c in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
            if not_excepted(c) && self.is_valid_character(c) {
                return Ok(c);
            }
        }
        if not_excepted(' ') && self.is_valid_character(' ') {
            return Ok(' ');
        }
        let punct_ranges =
            [(33u8, 47u8), (58, 64), (91, 96), (123, 126)];
        for &(lo, hi) in punct_ranges.iter() {
            for b in lo..=hi {
                let c = b as char;
                if not_excepted(c) && self.is_valid_character(c) {
                    return Ok(c);
                }
            }
        }
        Err(error::internal("Could not find valid character in char set"))
    }

    /// Build the sample of characters used to probe this set's boundaries.
    ///
    /// The sample contains every explicit member, the first character of
    /// each range that is not already covered, one extra letter or digit
    /// per flagged category, and (for permissive classes and complements)
    /// the punctuation marks that appear elsewhere in the regex.
    pub fn create_test_chars(
        &self,
        punct_marks: &BTreeSet<char>,
    ) -> Result<BTreeSet<char>> {
        let mut test_chars = BTreeSet::new();
        let mut lowercase_flag = false;
        let mut uppercase_flag = false;
        let mut digit_flag = false;
        let mut punct_flag = false;

        let mut lowercase = [false; 26];
        let mut uppercase = [false; 26];
        let mut digits = [false; 10];

        // Individual characters first.
        for item in self.items.iter() {
            if let CharSetItem::Character(c) = *item {
                test_chars.insert(c);
                if c.is_ascii_lowercase() {
                    lowercase_flag = true;
                    lowercase[c as usize - 'a' as usize] = true;
                } else if c.is_ascii_uppercase() {
                    uppercase_flag = true;
                    uppercase[c as usize - 'A' as usize] = true;
                } else if c.is_ascii_digit() {
                    digit_flag = true;
                    digits[c as usize - '0' as usize] = true;
                }
            }
        }

        // Ranges second: pick the first member not already present so that
        // the sample always exercises the range itself.
        for item in self.items.iter() {
            if let CharSetItem::Range(start, end) = *item {
                if start >= 'a' && end <= 'z' {
                    lowercase_flag = true;
                    let mut found = false;
                    for c in start..=end {
                        let slot = c as usize - 'a' as usize;
                        if !found && !lowercase[slot] {
                            test_chars.insert(c);
                            found = true;
                        }
                        lowercase[slot] = true;
                    }
                } else if start >= 'A' && end <= 'Z' {
                    uppercase_flag = true;
                    let mut found = false;
                    for c in start..=end {
                        let slot = c as usize - 'A' as usize;
                        if !found && !uppercase[slot] {
                            test_chars.insert(c);
                            found = true;
                        }
                        uppercase[slot] = true;
                    }
                } else if start >= '0' && end <= '9' {
                    digit_flag = true;
                    let mut found = false;
                    for c in start..=end {
                        let slot = c as usize - '0' as usize;
                        if !found && !digits[slot] {
                            test_chars.insert(c);
                            found = true;
                        }
                        digits[slot] = true;
                    }
                } else {
                    return Err(EngineError::new(
                        ErrorKind::BadRange,
                        format!("Invalid range: {}-{}", start, end),
                    ));
                }
            }
        }

        // Classes third.
        for item in self.items.iter() {
            if let CharSetItem::Class(kind) = *item {
                match kind {
                    ClassKind::Word => {
                        uppercase_flag = true;
                        lowercase_flag = true;
                        digit_flag = true;
                        test_chars.insert('_');
                    }
                    ClassKind::Digit => {
                        digit_flag = true;
                    }
                    ClassKind::Space => {
                        test_chars.insert(' ');
                    }
                    ClassKind::NotWord
                    | ClassKind::NotDigit
                    | ClassKind::NotSpace => {
                        uppercase_flag = true;
                        lowercase_flag = true;
                        digit_flag = true;
                        punct_flag = true;
                        test_chars.insert('_');
                        test_chars.insert(' ');
                    }
                    ClassKind::Any => {
                        uppercase_flag = true;
                        lowercase_flag = true;
                        digit_flag = true;
                        punct_flag = true;
                        test_chars.insert(' ');
                    }
                }
            }
        }

        if self.complement {
            uppercase_flag = true;
            lowercase_flag = true;
            digit_flag = true;
            punct_flag = true;
            test_chars.insert(' ');
        }

        // One extra character per flagged category, chosen to be the first
        // character not already covered.
        if lowercase_flag {
            for c in 'a'..='z' {
                if !lowercase[c as usize - 'a' as usize] {
                    test_chars.insert(c);
                    break;
                }
            }
        }
        if uppercase_flag {
            for c in 'A'..='Z' {
                if !uppercase[c as usize - 'A' as usize] {
                    test_chars.insert(c);
                    break;
                }
            }
        }
        if digit_flag {
            for c in '0'..='9' {
                if !digits[c as usize - '0' as usize] {
                    test_chars.insert(c);
                    break;
                }
            }
        }
        if punct_flag {
            for &mark in punct_marks.iter() {
                test_chars.insert(mark);
            }
            if punct_marks.is_empty() {
                test_chars.insert('_');
            }
        }

        Ok(test_chars)
    }

    /// Build the evil strings for this set: for every character in the
    /// test sample, the path string with this set's contribution replaced
    /// by that character.
    pub fn gen_evil_strings(
        &self,
        test_string: &str,
        prefix: &str,
        punct_marks: &BTreeSet<char>,
    ) -> Result<Vec<String>> {
        let test_chars = self.create_test_chars(punct_marks)?;
        // The set contributed exactly one character after the prefix.
        let suffix = &test_string[prefix.len() + 1..];
        let mut evil_strings = vec![];
        for c in test_chars {
            let mut s = String::with_capacity(test_string.len());
            s.push_str(prefix);
            s.push(c);
            s.push_str(suffix);
            evil_strings.push(s);
        }
        Ok(evil_strings)
    }

    // Checker support.

    /// True if repeating this set can repeat a punctuation mark.
    pub fn is_repeat_punc_candidate(&self) -> bool {
        self.only_has_punc()
            || (!self.complement
                && (self.has_character_item('.')
                    || self.has_character_item(',')))
    }

    /// The punctuation character a repeat of this set would repeat.
    pub fn get_repeat_punc_char(&self, check_mode: bool) -> Result<char> {
        if self.only_has_punc() {
            return self.get_valid_character(None, check_mode);
        }
        if self.has_character_item('.') {
            return Ok('.');
        }
        if self.has_character_item(',') {
            return Ok(',');
        }
        Ok('X')
    }

    /// True for the digit-shaped sets whose optionality the
    /// digit-too-optional rule cares about.
    pub fn is_digit_too_optional_candidate(&self) -> bool {
        if self.complement || self.items.len() != 1 {
            return false;
        }
        matches!(
            self.items[0],
            CharSetItem::Class(ClassKind::Digit)
                | CharSetItem::Range('0', '9')
                | CharSetItem::Range('1', '9')
        )
    }

    /// Run the lint rules over this set. `span` is the set's location and
    /// `regex` the full pattern source, used to build rewrite suggestions.
    pub fn lint(&self, regex: &str, span: Span) -> Vec<SetFinding> {
        let mut findings = vec![];

        // Single literal characters have nothing to lint.
        if self.items.len() == 1
            && matches!(self.items[0], CharSetItem::Character(_))
        {
            return findings;
        }

        let mut bar_violation = false;
        let mut comma_violation = false;

        // A three member set with a separator in the middle is the classic
        // "[a|b] meant (a|b)" mistake.
        if self.items.len() == 3 && !self.complement {
            if let CharSetItem::Character(sep) = self.items[1] {
                if sep == '|' {
                    let suggest = if self.has_range(regex, span) {
                        self.fix_separator_charset(regex, span, '|')
                    } else {
                        replace_charset_with_parens(regex, span)
                    };
                    findings.push(SetFinding::Separator { sep: '|', suggest });
                    bar_violation = true;
                }
                if sep == ',' {
                    let suggest = self.fix_separator_charset(regex, span, ',');
                    findings.push(SetFinding::Separator { sep: ',', suggest });
                    comma_violation = true;
                }
            }
        }

        let mut ind_chars = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        let mut bar_found = false;
        let mut not_bar_punc_found = false;
        let mut comma_found = false;
        let mut not_comma_punc_found = false;

        for (i, item) in self.items.iter().enumerate() {
            match *item {
                CharSetItem::Character(c) => {
                    if !ind_chars.insert(c) {
                        duplicates.insert(c);
                    }
                    if c.is_ascii_punctuation() {
                        let interior = i != 0 && i + 1 != self.items.len();
                        if c == '|' {
                            if interior {
                                bar_found = true;
                            }
                        } else {
                            not_bar_punc_found = true;
                        }
                        if c == ',' {
                            if interior {
                                comma_found = true;
                            }
                        } else {
                            not_comma_punc_found = true;
                        }
                    }
                }
                CharSetItem::Range(start, end) => {
                    let mut good_range = self.is_good_range(start, end);
                    // |-| and ,-, come from sets like [,-,] where the
                    // hyphen itself is the point; skip those.
                    if start == '|' && end == '|' {
                        good_range = true;
                    }
                    if start == ',' && end == ',' {
                        good_range = true;
                    }
                    if !good_range {
                        findings.push(SetFinding::BadRange {
                            start,
                            end,
                            suggest: self.fix_bad_range(regex, span),
                        });
                    } else {
                        let mut c = start;
                        while c <= end {
                            if !ind_chars.insert(c) {
                                duplicates.insert(c);
                            }
                            c = match bump(c) {
                                Some(c) => c,
                                None => break,
                            };
                        }
                    }
                }
                CharSetItem::Class(_) => {}
            }
        }

        // Work out whether the duplicates are really separators in
        // disguise.
        let mut dup_bar = duplicates.contains(&'|');
        let mut dup_comma = duplicates.contains(&',');
        let mut dup_other =
            duplicates.iter().any(|&c| c != '|' && c != ',');
        if dup_bar && dup_comma {
            dup_bar = false;
            dup_comma = false;
            dup_other = true;
        }

        if dup_bar || (bar_found && !not_bar_punc_found && !self.complement) {
            if !bar_violation {
                let suggest = if self.has_range(regex, span) {
                    self.fix_separator_charset(regex, span, '|')
                } else {
                    replace_charset_with_parens(regex, span)
                };
                findings.push(SetFinding::Separator { sep: '|', suggest });
            }
        } else if dup_comma
            || (comma_found && !not_comma_punc_found && !self.complement)
        {
            if !comma_violation {
                let suggest = self.fix_separator_charset(regex, span, ',');
                findings.push(SetFinding::Separator { sep: ',', suggest });
            }
        } else if dup_other || dup_bar || dup_comma {
            findings.push(SetFinding::Duplicates {
                chars: duplicates.into_iter().collect(),
            });
        }

        // Unbalanced bracket membership.
        let pairs =
            [('(', ')'), ('{', '}'), ('[', ']'), (')', '('), ('}', '{'), (']', '[')];
        for &(found, missing) in pairs.iter() {
            if self.is_valid_character(found)
                && !self.is_valid_character(missing)
            {
                findings.push(SetFinding::Brace { found, missing });
            }
        }

        findings
    }

    /// True if a range occurs within a one-of-a-z, A-Z or 0-9 span (with
    /// some slack for complemented control ranges).
    fn is_good_range(&self, start: char, end: char) -> bool {
        if start >= 'a' && start < 'z' && end > 'a' && end <= 'z' {
            return true;
        }
        if start >= 'A' && start < 'Z' && end > 'A' && end <= 'Z' {
            return true;
        }
        if start >= '0' && start < '9' && end > '0' && end <= '9' {
            return true;
        }
        if self.complement && end <= '\u{1f}' {
            return true;
        }
        false
    }

    fn has_upper_range(&self) -> bool {
        self.items.iter().any(|item| match *item {
            CharSetItem::Class(
                ClassKind::Word
                | ClassKind::NotDigit
                | ClassKind::NotSpace
                | ClassKind::Any,
            ) => true,
            CharSetItem::Range('A', 'Z') => true,
            _ => false,
        })
    }

    fn has_lower_range(&self) -> bool {
        self.items.iter().any(|item| match *item {
            CharSetItem::Class(
                ClassKind::Word
                | ClassKind::NotDigit
                | ClassKind::NotSpace
                | ClassKind::Any,
            ) => true,
            CharSetItem::Range('a', 'z') => true,
            _ => false,
        })
    }

    fn has_digit_range(&self) -> bool {
        self.items.iter().any(|item| match *item {
            CharSetItem::Class(
                ClassKind::Word
                | ClassKind::Digit
                | ClassKind::NotSpace
                | ClassKind::Any,
            ) => true,
            CharSetItem::Range('0', '9') => true,
            CharSetItem::Range('1', '9') => true,
            _ => false,
        })
    }

    /// True if the set contains a range item or the set text contains a
    /// fragment like `0|9` that was probably meant as a range.
    fn has_range(&self, regex: &str, span: Span) -> bool {
        if self
            .items
            .iter()
            .any(|item| matches!(item, CharSetItem::Range(..)))
        {
            return true;
        }
        let charset = &regex[span.start..=span.end.min(regex.len() - 1)];
        ["0|9", "0,9", "A|Z", "A,Z", "a|z", "a,z"]
            .iter()
            .any(|frag| charset.contains(frag))
    }

    /// Rewrite a set with a bad range into one whose ranges all make
    /// sense, e.g. `[A-z]` becomes `[A-Za-z]`. Prefers the half of the
    /// split that pairs with a range already in the set.
    fn fix_bad_range(&self, regex: &str, span: Span) -> String {
        let chars = span_chars(regex, span);
        let mut fixed = String::from("[");

        let has_upper = self.has_upper_range();
        let has_lower = self.has_lower_range();
        let has_digit = self.has_digit_range();

        // Copy the (possible) complement marker and the first member
        // verbatim; neither can start a range.
        let mut begin = 1;
        fixed.push(chars[begin]);
        if chars[begin] == '^' {
            begin += 1;
            fixed.push(chars[begin]);
        }
        begin += 1;

        let mut punc_range_found = false;
        let last = chars.len() - 1;
        let mut i = begin;
        while i < last {
            let unescaped_hyphen = chars[i] == '-'
                && i != last - 1
                && (chars[i - 1] != '\\'
                    || (i >= 2 && chars[i - 2] == '\\'));
            if unescaped_hyphen {
                let start = chars[i - 1];
                let end = chars[i + 1];
                if self.is_good_range(start, end) {
                    fixed.push('-');
                } else if start.is_ascii_punctuation()
                    || end.is_ascii_punctuation()
                {
                    // Drop the hyphen; a literal one is reattached at the
                    // end of the set.
                    punc_range_found = true;
                } else if start == 'A' && end == 'z' {
                    if has_upper {
                        fixed.pop();
                        fixed.push('a');
                        fixed.push('-');
                    } else if has_lower {
                        fixed.push('-');
                        fixed.push('Z');
                        i += 1;
                    } else {
                        fixed.push_str("-Za-");
                    }
                } else if start == 'A' && end == '9' {
                    if has_upper {
                        fixed.pop();
                        fixed.push('0');
                        fixed.push('-');
                    } else if has_digit {
                        fixed.push('-');
                        fixed.push('Z');
                        i += 1;
                    } else {
                        fixed.push_str("-Z0-");
                    }
                } else if start == 'a' && end == 'Z' {
                    if has_lower {
                        fixed.pop();
                        fixed.push('A');
                        fixed.push('-');
                    } else if has_upper {
                        fixed.push('-');
                        fixed.push('z');
                        i += 1;
                    } else {
                        fixed.push_str("-zA-");
                    }
                } else if start == 'a' && end == '9' {
                    if has_lower {
                        fixed.pop();
                        fixed.push('0');
                        fixed.push('-');
                    } else if has_digit {
                        fixed.push('-');
                        fixed.push('z');
                        i += 1;
                    } else {
                        fixed.push_str("-z0-");
                    }
                } else if (start == '0' || start == '1') && end == 'Z' {
                    if has_digit {
                        fixed.pop();
                        fixed.push('A');
                        fixed.push('-');
                    } else if has_upper {
                        fixed.push('-');
                        fixed.push('9');
                        i += 1;
                    } else {
                        fixed.push_str("-9A-");
                    }
                } else if (start == '0' || start == '1') && end == 'z' {
                    if has_digit {
                        fixed.pop();
                        fixed.push('a');
                        fixed.push('-');
                    } else if has_lower {
                        fixed.push('-');
                        fixed.push('9');
                        i += 1;
                    } else {
                        fixed.push_str("-9a-");
                    }
                }
            } else {
                fixed.push(chars[i]);
            }
            i += 1;
        }
        if punc_range_found && chars[last - 1] != '-' {
            fixed.push('-');
        }
        fixed.push(']');
        fixed
    }

    /// Rewrite a set that uses `|` or `,` as a separator: range-looking
    /// fragments like `0|9` become real ranges, every other occurrence of
    /// the separator is dropped, and any leftover accidental ranges are
    /// cleaned up.
    fn fix_separator_charset(
        &self,
        regex: &str,
        span: Span,
        elim: char,
    ) -> String {
        let mut charset: String =
            span_chars(regex, span).into_iter().collect();
        for (from, to) in [
            ("0|9", "0-9"),
            ("0,9", "0-9"),
            ("A|Z", "A-Z"),
            ("A,Z", "A-Z"),
            ("a|z", "a-z"),
            ("a,z", "a-z"),
        ] {
            if let Some(at) = charset.find(from) {
                charset.replace_range(at..at + from.len(), to);
            }
        }
        let chars: Vec<char> =
            charset.chars().filter(|&c| c != elim).collect();

        let mut fixed = String::from("[");
        let mut begin = 1;
        fixed.push(chars[begin]);
        if chars[begin] == '^' {
            begin += 1;
            fixed.push(chars[begin]);
        }
        begin += 1;

        let mut punc_range_found = false;
        let last = chars.len() - 1;
        for i in begin..last.saturating_sub(1) {
            let unescaped_hyphen = chars[i] == '-'
                && (chars[i - 1] != '\\'
                    || (i >= 2 && chars[i - 2] == '\\'));
            if unescaped_hyphen {
                let start = chars[i - 1];
                let end = chars[i + 1];
                if self.is_good_range(start, end) {
                    fixed.push('-');
                } else if start.is_ascii_punctuation()
                    || end.is_ascii_punctuation()
                {
                    punc_range_found = true;
                }
            } else {
                fixed.push(chars[i]);
            }
        }
        if last >= 1 {
            fixed.push(chars[last - 1]);
        }
        if punc_range_found && chars[last - 1] != '-' {
            fixed.push('-');
        }
        fixed.push(']');
        fixed
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.complement {
            write!(f, "^")?;
        }
        for item in self.items.iter() {
            match *item {
                CharSetItem::Character(c) => write!(f, "{}", c)?,
                CharSetItem::Class(ClassKind::Any) => write!(f, ".")?,
                CharSetItem::Class(kind) => {
                    write!(f, "\\{}", kind.letter())?
                }
                CharSetItem::Range(start, end) => {
                    write!(f, "{}-{}", start, end)?
                }
            }
        }
        Ok(())
    }
}

/// Replace the set's brackets with parens, turning `[a|b]` into `(a|b)`.
fn replace_charset_with_parens(regex: &str, span: Span) -> String {
    let mut chars = span_chars(regex, span);
    let last = chars.len() - 1;
    chars[0] = '(';
    chars[last] = ')';
    chars.into_iter().collect()
}

/// The characters of `regex[span]`.
fn span_chars(regex: &str, span: Span) -> Vec<char> {
    let end = (span.end + 1).min(regex.len());
    regex[span.start..end].chars().collect()
}

/// `\w` membership.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The whitespace characters the C locale's isspace accepts.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{b}' | '\u{c}' | '\r')
}

/// The next character code, for iterating inclusive char ranges.
fn bump(c: char) -> Option<char> {
    char::from_u32(c as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[CharSetItem]) -> CharSet {
        let mut set = CharSet::new();
        for &item in items {
            set.add_item(item);
        }
        set
    }

    fn chars(s: &str) -> Vec<CharSetItem> {
        s.chars().map(CharSetItem::Character).collect()
    }

    #[test]
    fn membership() {
        let s = set(&[
            CharSetItem::Character('x'),
            CharSetItem::Range('0', '4'),
            CharSetItem::Class(ClassKind::Space),
        ]);
        assert!(s.is_valid_character('x'));
        assert!(s.is_valid_character('3'));
        assert!(s.is_valid_character(' '));
        assert!(!s.is_valid_character('9'));
        assert!(!s.is_valid_character('y'));

        let mut c = set(&[CharSetItem::Range('a', 'z')]);
        c.set_complement(true);
        assert!(!c.is_valid_character('m'));
        assert!(c.is_valid_character('M'));
        assert!(c.is_valid_character('!'));
    }

    #[test]
    fn string_candidates() {
        let mut complemented = set(&chars(","));
        complemented.set_complement(true);
        assert!(complemented.is_string_candidate());

        assert!(set(&[CharSetItem::Class(ClassKind::Word)])
            .is_string_candidate());
        assert!(set(&[CharSetItem::Class(ClassKind::Any)])
            .is_string_candidate());
        assert!(set(&[CharSetItem::Range('a', 'z')]).is_string_candidate());
        assert!(set(&[
            CharSetItem::Range('A', 'Z'),
            CharSetItem::Range('0', '9')
        ])
        .is_string_candidate());

        // \d alone is not word-like, and an unrelated range disqualifies.
        assert!(!set(&[CharSetItem::Class(ClassKind::Digit)])
            .is_string_candidate());
        assert!(!set(&[
            CharSetItem::Range('a', 'z'),
            CharSetItem::Range('b', 'f')
        ])
        .is_string_candidate());
        assert!(!set(&chars("abc")).is_string_candidate());
    }

    #[test]
    fn representative_character_prefers_explicit_members() {
        let s = set(&[
            CharSetItem::Range('a', 'z'),
            CharSetItem::Character('q'),
        ]);
        assert_eq!('q', s.get_valid_character(None, false).unwrap());
        assert_eq!('a', s.get_valid_character(Some('q'), false).unwrap());
        // Check mode scans alphabetically instead.
        assert_eq!('a', s.get_valid_character(None, true).unwrap());
    }

    #[test]
    fn representative_character_for_complement() {
        let mut s = set(&[CharSetItem::Range('a', 'z')]);
        s.set_complement(true);
        assert_eq!('A', s.get_valid_character(None, false).unwrap());
        assert_eq!('B', s.get_valid_character(Some('A'), false).unwrap());
    }

    #[test]
    fn test_chars_add_one_extra_per_category() {
        let s = set(&[
            CharSetItem::Character('c'),
            CharSetItem::Range('a', 'f'),
        ]);
        let got = s.create_test_chars(&BTreeSet::new()).unwrap();
        // 'c' is explicit, 'a' is the first range member not yet seen, and
        // 'g' is the extra lowercase outside the range.
        let expected: BTreeSet<char> = ['c', 'a', 'g'].into_iter().collect();
        assert_eq!(expected, got);
    }

    #[test]
    fn test_chars_for_classes() {
        let s = set(&[CharSetItem::Class(ClassKind::Word)]);
        let marks: BTreeSet<char> = ['@'].into_iter().collect();
        let got = s.create_test_chars(&marks).unwrap();
        let expected: BTreeSet<char> =
            ['_', 'a', 'A', '0'].into_iter().collect();
        // \w is not permissive enough to pull in punctuation marks.
        assert_eq!(expected, got);

        let s = set(&[CharSetItem::Class(ClassKind::Any)]);
        let got = s.create_test_chars(&marks).unwrap();
        let expected: BTreeSet<char> =
            [' ', 'a', 'A', '0', '@'].into_iter().collect();
        assert_eq!(expected, got);
    }

    #[test]
    fn string_candidate_sample_exceeds_explicit_members() {
        // Every string candidate's sample must include a character that is
        // not an explicit member, so the class itself gets exercised.
        let candidates = [
            set(&[CharSetItem::Range('a', 'z')]),
            set(&[CharSetItem::Class(ClassKind::Word)]),
            set(&[
                CharSetItem::Character('x'),
                CharSetItem::Class(ClassKind::Any),
            ]),
        ];
        for s in candidates {
            assert!(s.is_string_candidate());
            let sample = s.create_test_chars(&BTreeSet::new()).unwrap();
            assert!(sample.iter().any(|&c| !s.has_character_item(c)));
        }
    }

    #[test]
    fn bad_range_detection() {
        let s = set(&[CharSetItem::Range('A', 'z')]);
        let findings = s.lint("[A-z]", Span::new(0, 4));
        assert_eq!(1, findings.len());
        match &findings[0] {
            SetFinding::BadRange { start: 'A', end: 'z', suggest } => {
                assert_eq!("[A-Za-z]", suggest);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn bad_range_prefers_existing_class() {
        // [A-za-z]: the a-z half is already there, so suggest keeping just
        // the uppercase half of the bad range.
        let s = set(&[
            CharSetItem::Range('A', 'z'),
            CharSetItem::Range('a', 'z'),
        ]);
        let findings = s.lint("[A-za-z]", Span::new(0, 7));
        match &findings[0] {
            SetFinding::BadRange { suggest, .. } => {
                assert_eq!("[A-Za-z]", suggest);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn separator_bar() {
        let s = set(&chars("a|b"));
        let findings = s.lint("[a|b]", Span::new(0, 4));
        assert_eq!(1, findings.len());
        match &findings[0] {
            SetFinding::Separator { sep: '|', suggest } => {
                assert_eq!("(a|b)", suggest);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn separator_bar_with_range_fragment() {
        let s = set(&chars("0|9"));
        let findings = s.lint("[0|9]", Span::new(0, 4));
        match &findings[0] {
            SetFinding::Separator { sep: '|', suggest } => {
                assert_eq!("[0-9]", suggest);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn separator_comma() {
        let s = set(&chars("a,b"));
        let findings = s.lint("[a,b]", Span::new(0, 4));
        match &findings[0] {
            SetFinding::Separator { sep: ',', suggest } => {
                assert_eq!("[ab]", suggest);
            }
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn duplicates() {
        let s = set(&chars("abca"));
        let findings = s.lint("[abca]", Span::new(0, 5));
        assert_eq!(
            vec![SetFinding::Duplicates { chars: vec!['a'] }],
            findings
        );
    }

    #[test]
    fn range_overlap_counts_as_duplicate() {
        let s = set(&[
            CharSetItem::Character('c'),
            CharSetItem::Range('a', 'f'),
        ]);
        let findings = s.lint("[ca-f]", Span::new(0, 5));
        assert_eq!(
            vec![SetFinding::Duplicates { chars: vec!['c'] }],
            findings
        );
    }

    #[test]
    fn unbalanced_braces() {
        let s = set(&chars("({"));
        let findings = s.lint("[({]", Span::new(0, 3));
        assert_eq!(
            vec![
                SetFinding::Brace { found: '(', missing: ')' },
                SetFinding::Brace { found: '{', missing: '}' },
            ],
            findings
        );
    }

    #[test]
    fn balanced_braces_are_quiet() {
        let s = set(&chars("(){}[]"));
        assert!(s.lint("[(){}\\[\\]]", Span::new(0, 9)).is_empty());
    }

    #[test]
    fn punctuation_only_sets() {
        assert!(set(&chars("+-*/")).only_has_punc());
        assert!(!set(&chars("+a")).only_has_punc());
        assert!(set(&chars(", ")).only_has_punc_and_spaces());
        assert!(!set(&chars(", ")).only_has_punc());
        assert_eq!(",", set(&chars(", ")).charset_as_string().trim());
    }

    #[test]
    fn digit_too_optional_candidates() {
        assert!(set(&[CharSetItem::Class(ClassKind::Digit)])
            .is_digit_too_optional_candidate());
        assert!(set(&[CharSetItem::Range('0', '9')])
            .is_digit_too_optional_candidate());
        assert!(set(&[CharSetItem::Range('1', '9')])
            .is_digit_too_optional_candidate());
        assert!(!set(&[CharSetItem::Range('2', '9')])
            .is_digit_too_optional_candidate());
        assert!(!set(&chars("7")).is_digit_too_optional_candidate());
    }

    #[test]
    fn evil_strings_replace_the_sampled_character() {
        let s = set(&chars("ab"));
        let got = s
            .gen_evil_strings("xay", "x", &BTreeSet::new())
            .unwrap();
        assert_eq!(vec!["xay".to_string(), "xby".to_string()], got);
    }
}
