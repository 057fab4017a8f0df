use std::fmt;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;

/// How one file ended up, when it didn't abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Uploaded,
}

/// Running totals of an upload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub skipped: usize,
    pub uploaded: usize,
}

impl Tally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Skipped => Self {
                skipped: self.skipped + 1,
                ..self
            },
            Outcome::Uploaded => Self {
                uploaded: self.uploaded + 1,
                ..self
            },
        }
    }

    pub fn done(&self) -> usize {
        self.skipped + self.uploaded
    }
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done())
    }

    fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped+uploaded: {}+{}={} ({:.2}%+{:.2}%={:.2}%), remaining: {} ({:.2}%), total: {}",
            self.skipped,
            self.uploaded,
            self.done(),
            self.percent(self.skipped),
            self.percent(self.uploaded),
            self.percent(self.done()),
            self.remaining(),
            self.percent(self.remaining()),
            self.total
        )
    }
}

/// Mirrors the tally on a progress bar and logs it after every file.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total: usize, visible: bool) -> Self {
        if !visible {
            return Self::hidden();
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn start_file(&self, file_name: &str, name: &str) {
        self.bar.set_message(format!(":{name}:"));
        self.bar.suspend(|| info!("{file_name} as `{name}`"));
    }

    pub fn note(&self, message: &str) {
        self.bar.suspend(|| info!("{message}"));
    }

    pub fn record(&self, tally: &Tally) {
        self.bar.set_position(tally.done() as u64);
        self.bar.suspend(|| info!("{tally}"));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_value() {
        let tally = Tally::new(4)
            .record(Outcome::Skipped)
            .record(Outcome::Uploaded)
            .record(Outcome::Uploaded);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.uploaded, 2);
        assert_eq!(tally.done(), 3);
        assert_eq!(tally.remaining(), 1);
    }

    #[test]
    fn formats_percentages() {
        let tally = Tally::new(4).record(Outcome::Skipped).record(Outcome::Uploaded);
        assert_eq!(
            tally.to_string(),
            "skipped+uploaded: 1+1=2 (25.00%+25.00%=50.00%), remaining: 2 (50.00%), total: 4"
        );
    }

    #[test]
    fn empty_run_has_no_nan() {
        assert!(!Tally::new(0).to_string().contains("NaN"));
    }
}
