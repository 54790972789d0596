//! Fetch counter drawn on stderr while dependencies resolve
//!
//! The bar counts finished registry lookups, successful or not, and shows the
//! last package that came back. A hidden `Progress` does nothing; `--quiet`,
//! `--json` and the tests run with one.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const FETCH_TEMPLATE: &str = "{prefix:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg:.dim}";

/// Handle on the fetch counter; clones share the same bar
#[derive(Clone, Default)]
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Counter over `total` lookups. Hidden when `visible` is false or
    /// there is nothing to fetch.
    pub fn fetches(total: u64, visible: bool) -> Self {
        if !visible || total == 0 {
            return Self::hidden();
        }

        let bar = ProgressBar::new(total);
        match ProgressStyle::with_template(FETCH_TEMPLATE) {
            Ok(style) => bar.set_style(style.progress_chars("=> ")),
            Err(e) => debug!(error = %e, "keeping default progress style"),
        }
        bar.set_prefix("Checking registry");
        Self { bar: Some(bar) }
    }

    pub fn hidden() -> Self {
        Self::default()
    }

    /// Record one finished lookup
    pub fn tick(&self, package: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(package.to_string());
            bar.inc(1);
        }
    }

    /// Remove the bar from the terminal
    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    #[cfg(test)]
    fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(ProgressBar::position)
    }
}
