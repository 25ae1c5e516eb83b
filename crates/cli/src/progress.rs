//! Terminal progress bar

use cnfsweep_core::application::ItemStatus;
use cnfsweep_core::port::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} formulas {msg}";

/// Progress observer backed by an indicatif bar on stderr
///
/// Hidden when disabled or when stderr is not a terminal.
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    pub fn new(enabled: bool) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn short_name(id: &str) -> &str {
    Path::new(id)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(id)
}

impl ProgressObserver for IndicatifProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn item_finished(&self, id: &str, status: &ItemStatus) {
        let label = match status {
            ItemStatus::Completed(record) => match record.sat {
                Some(true) => "sat",
                Some(false) => "unsat",
                None => "unknown",
            },
            ItemStatus::TimedOut => "timeout",
            ItemStatus::Failed(_) => "failed",
            ItemStatus::Interrupted { .. } | ItemStatus::Cancelled => "cancelled",
        };
        self.bar.set_message(format!("{} {}", short_name(id), label));
        self.bar.inc(1);
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnfsweep_core::domain::ResultRecord;

    #[test]
    fn test_counts_every_item_when_hidden() {
        let progress = IndicatifProgress::new(false);
        progress.started(3);
        progress.item_finished("a.cnf", &ItemStatus::TimedOut);
        progress.item_finished(
            "b.cnf",
            &ItemStatus::Completed(ResultRecord::new(1.0, Some(true), 1, 1)),
        );
        progress.item_finished("c.cnf", &ItemStatus::Cancelled);

        assert_eq!(progress.position(), 3);
        progress.finished();
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("formulas/nested/7.cnf"), "7.cnf");
        assert_eq!(short_name("7.cnf"), "7.cnf");
    }
}
