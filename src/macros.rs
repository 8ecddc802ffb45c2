/// A lazily compiled regex literal backed by a static.
///
/// Only for patterns that are known valid at write time; compilation
/// failure panics. The engine itself never matches anything with these -
/// they cover input validation and the test suites, where `regex-lite`
/// doubles as the acceptance oracle for generated strings.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        use regex_lite::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($re).unwrap())
    }};
}
