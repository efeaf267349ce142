use std::fmt;
use std::time::Duration;

/// Counters for the current run.
///
/// [`reset`](Self::reset) clears the counters at the start of every run;
/// `error_flag` stays raised for the rest of the process once set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub processed:   u32,
    pub ok:          u32,
    pub miss:        u32,
    pub total_bytes: u64,
    pub error_flag:  bool,
}

impl RunStatistics {
    pub fn reset(&mut self) {
        *self = Self {
            error_flag: self.error_flag,
            ..Self::default()
        };
    }

    pub fn all_ok(&self) -> bool { self.processed == self.ok }

    /// Bytes per second over `elapsed`, if any time passed.
    pub fn throughput(&self, elapsed: Duration) -> Option<f64> {
        let secs = elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.total_bytes as f64 / secs)
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_ok() {
            if self.processed == 0 {
                write!(f, "No files processed")
            } else {
                write!(f, "Everything OK")
            }
        } else {
            write!(
                f,
                "Errors Occurred: Errors:{:<3} Miss:{:<3} Success:{:<3} Total:{:<3}",
                self.processed - self.ok - self.miss,
                self.miss,
                self.ok,
                self.processed
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_error_flag() {
        let mut stats = RunStatistics {
            processed:   3,
            ok:          1,
            miss:        1,
            total_bytes: 99,
            error_flag:  true,
        };
        stats.reset();
        assert_eq!(
            stats,
            RunStatistics {
                error_flag: true,
                ..RunStatistics::default()
            }
        );
    }

    #[test]
    fn test_summary_line() {
        let mut stats = RunStatistics::default();
        assert_eq!(stats.to_string(), "No files processed");
        stats.processed = 2;
        stats.ok = 2;
        assert_eq!(stats.to_string(), "Everything OK");
        stats.processed = 4;
        stats.miss = 1;
        assert_eq!(
            stats.to_string(),
            "Errors Occurred: Errors:1   Miss:1   Success:2   Total:4  "
        );
    }
}
