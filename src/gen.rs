use std::collections::HashSet;

use crate::edge::Interp;
use crate::error::Result;
use crate::nfa::Nfa;
use crate::path::Path;
use crate::stats::Stats;
use crate::Config;

/// Turns processed basis paths into the final test string suite.
///
/// Three layers of strings come out, in order: the baseline string of
/// every path, a minimum-iteration variant of every path, and the evil
/// strings expanded from each path's evil edges. The combined list is
/// deduplicated preserving first appearance.
pub struct TestGenerator<'a> {
    paths: &'a [Path],
    nfa: &'a Nfa,
    num_gen_strings: usize,
}

impl<'a> TestGenerator<'a> {
    pub fn new(paths: &'a [Path], nfa: &'a Nfa) -> TestGenerator<'a> {
        TestGenerator { paths, nfa, num_gen_strings: 0 }
    }

    /// Generate the full test suite.
    pub fn gen_test_strings(
        &mut self,
        interp: &mut Interp,
        config: &Config,
    ) -> Result<Vec<String>> {
        let mut test_strings = vec![];

        for path in self.paths {
            test_strings.push(path.test_string().to_string());
        }
        if config.debug_mode {
            log::debug!("initial test strings: {:?}", test_strings);
        }

        let min_iter_start = test_strings.len();
        for path in self.paths {
            test_strings
                .push(path.gen_min_iter_string(self.nfa, interp, config)?);
        }
        if config.debug_mode {
            log::debug!(
                "minimum iteration test strings: {:?}",
                &test_strings[min_iter_start..]
            );
        }

        for path in self.paths {
            test_strings.extend(path.gen_evil_strings(
                self.nfa,
                interp,
                config,
            )?);
        }

        let mut seen = HashSet::new();
        let mut unique = vec![];
        for s in test_strings {
            if seen.insert(s.clone()) {
                unique.push(s);
            }
        }
        self.num_gen_strings = unique.len();
        Ok(unique)
    }

    /// Record generation statistics.
    pub fn add_stats(&self, stats: &mut Stats) {
        stats.add("PATHS", "Paths", self.paths.len() as u64);
        stats.add("PATHS", "Strings", self.num_gen_strings as u64);
    }
}
