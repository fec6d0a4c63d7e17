//! Terminal progress bar for distribution downloads.

use indicatif::{ProgressBar, ProgressStyle};
use prince_core::DownloadProgress;

/// Download bar that starts as a spinner and switches to a byte bar once
/// the total size is known.
pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    fn bytes_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    pub fn update(&self, progress: &DownloadProgress) {
        if let Some(total) = progress.total_bytes {
            if self.bar.length() != Some(total) {
                self.bar.set_length(total);
                self.bar.set_style(Self::bytes_style());
            }
        }
        self.bar.set_position(progress.bytes_downloaded);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Leaves the bar on screen where it stopped; no-op once finished.
    pub fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}
