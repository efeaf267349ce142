use std::time::Duration;

use rsum_core::{EntryOutcome, FileJob, RunObserver, RunStatistics};

use super::ProgressTracker;

const RULE_WIDTH: usize = 80;
const PATH_WIDTH: usize = 58;

/// Prints verification reports to stdout.
///
/// In compute and update mode stdout carries manifest lines, so only the
/// progress bar is driven and nothing is printed.
pub struct ConsoleObserver {
    report:  bool,
    tracker: Option<ProgressTracker>,
}

impl ConsoleObserver {
    pub fn new(report: bool, tracker: Option<ProgressTracker>) -> Self { Self { report, tracker } }

    fn println(&self, line: &str) {
        match &self.tracker {
            Some(tracker) => tracker.println(line),
            None => println!("{line}"),
        }
    }
}

/// `--( Verifying name )-----`, padded to the rule width.
pub fn verifying_banner(name: &str) -> String {
    let head = format!("--( Verifying {name} )");
    let pad = RULE_WIDTH.saturating_sub(head.chars().count()).max(2);
    format!("{head}{}", "-".repeat(pad))
}

pub fn entry_line(path: &str, outcome: &EntryOutcome) -> String {
    format!("{path:<width$} {outcome}", width = PATH_WIDTH)
}

impl RunObserver for ConsoleObserver {
    fn manifest_started(&mut self, manifest: &str) {
        if self.report {
            self.println(&format!("\n{}", verifying_banner(manifest)));
        }
    }

    fn file_started(&mut self, job: &FileJob) {
        if let Some(tracker) = &self.tracker {
            tracker.start(job.utf8_display_path());
        }
    }

    fn file_finished(&mut self, job: &FileJob, outcome: &EntryOutcome) {
        if let Some(tracker) = &self.tracker {
            tracker.finish();
        }
        if self.report {
            self.println(&entry_line(job.utf8_display_path(), outcome));
        }
    }

    fn interrupted(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.finish();
        }
        if self.report {
            self.println("Interrupted by user...");
        }
    }

    fn summary(&mut self, stats: &RunStatistics, _elapsed: Duration) {
        if self.report {
            self.println(&"-".repeat(RULE_WIDTH));
            self.println(&stats.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_width() {
        let banner = verifying_banner("a.sfv");
        assert_eq!(banner.chars().count(), RULE_WIDTH);
        assert!(banner.starts_with("--( Verifying a.sfv )---"));

        let long = "x".repeat(100);
        assert!(verifying_banner(&long).ends_with(")--"));
    }

    #[test]
    fn test_entry_line() {
        let line = entry_line("a.bin", &EntryOutcome::Ok);
        assert!(line.starts_with("a.bin "));
        assert!(line.ends_with(" OK"));
        assert_eq!(line.len(), PATH_WIDTH + 3);
    }
}
