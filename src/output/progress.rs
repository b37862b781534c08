use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::metrics::CollectionStats;

use super::styling::{done, pending};

/// Spinner shown on stderr while one repository or project is drained.
///
/// Hidden automatically when stderr is not a terminal.
pub struct TargetProgress {
    pb: ProgressBar,
}

impl TargetProgress {
    pub fn start(position: usize, total: usize, target: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(pending(format!("[{position}/{total}] Fetching {target}")).to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    pub fn finish(self, stats: &CollectionStats) {
        self.pb.finish_with_message(
            done(format!(
                "{}: {} rows from {} pages ✓",
                stats.target, stats.rows, stats.pages
            ))
            .to_string(),
        );
    }

    pub fn abandon(self) {
        self.pb.abandon();
    }
}
