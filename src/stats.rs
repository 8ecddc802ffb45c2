use std::fmt::Write;

/// A flat list of named counters gathered across the pipeline, grouped by
/// a tag per stage.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    list: Vec<Stat>,
}

#[derive(Clone, Debug)]
struct Stat {
    tag: &'static str,
    name: &'static str,
    value: u64,
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }

    /// Append one counter.
    pub fn add(&mut self, tag: &'static str, name: &'static str, value: u64) {
        self.list.push(Stat { tag, name, value });
    }

    /// Render the counters as an aligned table with a divider between
    /// stages.
    pub fn render_lines(&self) -> Vec<String> {
        const WIDTH: usize = 30;

        let mut lines = vec![];
        let mut prev_tag = "";
        for stat in self.list.iter() {
            if stat.tag != prev_tag && !prev_tag.is_empty() {
                lines.push("-".repeat(WIDTH + 8));
            }
            let mut line = String::new();
            write!(line, "{:<width$}| {}", stat.name, stat.value, width = WIDTH)
                .unwrap();
            lines.push(line);
            prev_tag = stat.tag;
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_grouped_table() {
        let mut stats = Stats::new();
        stats.add("SCANNER", "Tokens", 7);
        stats.add("NFA", "NFA states", 5);
        stats.add("NFA", "NFA edges", 6);
        let lines = stats.render_lines();
        assert_eq!(4, lines.len());
        assert!(lines[0].starts_with("Tokens"));
        assert!(lines[0].ends_with("| 7"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("NFA states"));
        assert!(lines[3].starts_with("NFA edges"));
    }

    #[test]
    fn empty_stats_render_nothing() {
        assert!(Stats::new().render_lines().is_empty());
    }
}
