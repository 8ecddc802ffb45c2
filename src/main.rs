use std::io::Write;

use {
    anyhow::Context,
    lexopt::{Arg, ValueExt},
};

use regrets::{run_engine, Config};

const ABOUT: &str = "\
A lint tool and structural test string generator for regular expressions.

regrets analyzes a single regex and prints a report of likely mistakes
(suspect character sets, bad ranges, stray anchors, unbalanced optional
braces) followed by a suite of test strings that probe the regex's
structural boundaries: loop bounds, character class edges, optional
pieces and adjacent punctuation.

USAGE:
    regrets -r <regex> [options]
    regrets -f <file> [options]
";

fn main() -> anyhow::Result<()> {
    if let Err(err) = run(&mut lexopt::Parser::from_env()) {
        if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1") {
            writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
        } else {
            writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut args = Args::default();
    while let Some(arg) = p.next()? {
        match arg {
            Arg::Short('h') => anyhow::bail!("{}", usage_short()),
            Arg::Long("help") => anyhow::bail!("{}", usage_long()),
            Arg::Short('r') | Arg::Long("regex") => {
                args.regex = Some(p.value().context("-r/--regex")?.string()?);
            }
            Arg::Short('f') | Arg::Long("file") => {
                args.file = Some(p.value().context("-f/--file")?.string()?);
            }
            Arg::Short('b') | Arg::Long("base") => {
                args.base = Some(p.value().context("-b/--base")?.string()?);
            }
            Arg::Short('c') | Arg::Long("check") => args.check = true,
            Arg::Short('w') | Arg::Long("web") => args.web = true,
            Arg::Short('d') | Arg::Long("debug") => args.debug = true,
            Arg::Short('s') | Arg::Long("stats") => args.stats = true,
            Arg::Long("color") => {
                args.color =
                    p.value().context("--color")?.string()?.parse()?;
            }
            arg => return Err(arg.unexpected().into()),
        }
    }

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.debug { "debug" } else { "warn" }),
    )
    .init();

    let regex = match (args.regex, args.file) {
        (Some(regex), None) => regex,
        (None, Some(path)) => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path))?;
            match contents.lines().next() {
                Some(line) => line.to_string(),
                None => anyhow::bail!("{} contains no regex", path),
            }
        }
        (Some(_), Some(_)) => {
            anyhow::bail!("only one of -r/--regex and -f/--file may be given")
        }
        (None, None) => anyhow::bail!("{}", usage_short()),
    };

    let mut config = Config::new(regex);
    if let Some(base) = args.base {
        config.base_substring = base;
    }
    config.check_mode = args.check;
    config.web_mode = args.web;
    config.debug_mode = args.debug;
    config.stat_mode = args.stats;
    config.color = !args.web && args.color.should_color();

    let lines = run_engine(&config);
    let engine_failed = lines.len() == 1 && lines[0].starts_with("ERROR (");

    let mut stdout = std::io::stdout();
    for line in lines.iter() {
        writeln!(stdout, "{}", line)?;
    }
    stdout.flush()?;

    if engine_failed {
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Args {
    regex: Option<String>,
    file: Option<String>,
    base: Option<String>,
    check: bool,
    web: bool,
    debug: bool,
    stats: bool,
    color: Color,
}

fn all_usages() -> Vec<Usage> {
    vec![
        Usage::new(
            "-r, --regex <regex>",
            "The regex to analyze.",
            r#"
The regex to analyze, given directly on the command line. Exactly one of
-r/--regex and -f/--file must be given.
"#,
        ),
        Usage::new(
            "-f, --file <path>",
            "Read the regex from the first line of a file.",
            r#"
Read the regex to analyze from the first line of the given file. This is
useful when the pattern's escaping fights the shell's. Exactly one of
-r/--regex and -f/--file must be given.
"#,
        ),
        Usage::new(
            "-b, --base <str>",
            "The base substring for generated words (default: evil).",
            r#"
The seed used whenever an unbounded repetition of a word-like character
set needs concrete letters, e.g. the string generated for '\w+'. Must be
at least two letters, and letters only.
"#,
        ),
        Usage::new(
            "-c, --check",
            "Only report violations, generate no test strings.",
            r#"
Check-only mode. The regex is analyzed and violations are reported, but
no test strings are generated and warnings are suppressed. When nothing
is found, a single "No violations detected." line is printed.
"#,
        ),
        Usage::new(
            "-w, --web",
            "Format output for embedding in a web page.",
            r#"
Mark highlight spans with <mark> tags and line breaks with <br> instead
of ANSI escapes and newlines. Intended for front ends that render the
report as HTML.
"#,
        ),
        Usage::new(
            "-d, --debug",
            "Log each pipeline stage's intermediate form.",
            r#"
Log the scanned token list, the parse tree, the NFA and the generated
string layers as they are produced. Equivalent to running with
RUST_LOG=debug.
"#,
        ),
        Usage::new(
            "-s, --stats",
            "Append pipeline statistics to the output.",
            r#"
Append a table of counters to the output: token, parse node, NFA state
and edge counts by kind, and the number of paths and strings generated.
"#,
        ),
        Usage::new(
            "--color <mode>",
            "One of: auto, always, never.",
            r#"
Whether to use color in terminal output (default: auto). When enabled,
the span of the regex each finding points at is highlighted. The choices
are: auto, always, never. Web mode ignores this flag.
"#,
        ),
    ]
}

fn usage_short() -> String {
    format!("{}\nOPTIONS:\n{}", ABOUT.trim(), Usage::short(&all_usages()))
}

fn usage_long() -> String {
    format!("{}\nOPTIONS:\n{}", ABOUT.trim(), Usage::long(&all_usages()))
}

/// This defines a flag for controlling the use of color in the output.
#[derive(Clone, Copy, Debug)]
enum Color {
    /// Color is only enabled when the output is a tty.
    Auto,
    /// Color is always enabled.
    Always,
    /// Color is disabled.
    Never,
}

impl Color {
    /// Return true if colors should be used. When the color choice is
    /// 'auto', this only returns true if stdout is a tty.
    fn should_color(&self) -> bool {
        match *self {
            Color::Auto => atty::is(atty::Stream::Stdout),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

impl Default for Color {
    fn default() -> Color {
        Color::Auto
    }
}

impl std::str::FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Color> {
        let color = match s {
            "auto" => Color::Auto,
            "always" => Color::Always,
            "never" => Color::Never,
            unknown => {
                anyhow::bail!(
                    "unrecognized color config '{}', must be \
                     one of auto, always or never.",
                    unknown,
                )
            }
        };
        Ok(color)
    }
}

/// A type for expressing the documentation of a flag.
///
/// The `Usage::short` and `Usage::long` functions take a slice of usages
/// and format them into a human readable display. It does simple word
/// wrapping and column alignment for you.
#[derive(Clone, Debug)]
struct Usage {
    /// The format of the flag, for example, '-b, --base <str>'.
    format: &'static str,
    /// A very short description of the flag. Should fit on one line along
    /// with the format.
    short: &'static str,
    /// A longer form description of the flag. May be multiple paragraphs
    /// long (but doesn't have to be).
    long: &'static str,
}

impl Usage {
    /// Create a new usage from the given components.
    const fn new(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { format, short, long }
    }

    /// Format a two column table from the given usages, where the first
    /// column is the format and the second column is the short
    /// description.
    fn short(usages: &[Usage]) -> String {
        use std::fmt::Write;

        const MIN_SPACE: usize = 2;

        let mut result = String::new();
        let max_len = match usages.iter().map(|u| u.format.len()).max() {
            None => return result,
            Some(len) => len,
        };
        for usage in usages.iter() {
            let padlen = MIN_SPACE + (max_len - usage.format.len());
            let padding = " ".repeat(padlen);
            writeln!(result, "    {}{}{}", usage.format, padding, usage.short)
                .unwrap();
        }
        result
    }

    /// Print the format of each usage and its long description below the
    /// format. This also does appropriate indentation with the assumption
    /// that it is in an OPTIONS section of a bigger usage message.
    fn long(usages: &[Usage]) -> String {
        use std::fmt::Write;

        let wrap_opts = textwrap::Options::new(79)
            .initial_indent("        ")
            .subsequent_indent("        ");
        let mut result = String::new();
        for (i, usage) in usages.iter().enumerate() {
            if i > 0 {
                writeln!(result).unwrap();
            }
            writeln!(result, "    {}", usage.format).unwrap();
            for (i, paragraph) in usage.long.trim().split("\n\n").enumerate() {
                if i > 0 {
                    result.push('\n');
                }
                let flattened = paragraph.replace("\n", " ");
                for line in textwrap::wrap(&flattened, &wrap_opts) {
                    result.push_str(&line);
                    result.push('\n');
                }
            }
        }
        result
    }
}
