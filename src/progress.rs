use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Progress display for corpus runs
pub struct ProgressTracker {
    multi: MultiProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Create a progress bar counting videos
    pub fn create_progress_bar(&self, total: u64, message: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(total));
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        pb
    }

    /// Create an indeterminate spinner for unknown-duration operations
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress wrapper that is a no-op when disabled
pub struct ProgressOperation {
    pub tracker: ProgressTracker,
    pub enabled: bool,
}

impl ProgressOperation {
    pub fn new(enabled: bool) -> Self {
        Self {
            tracker: ProgressTracker::new(),
            enabled,
        }
    }

    /// A bar over `total` items, or `None` when disabled
    pub fn bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        self.enabled
            .then(|| self.tracker.create_progress_bar(total, message))
    }

    /// Await `operation` behind a spinner if enabled
    pub async fn with_spinner<F, T>(&self, message: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        if self.enabled {
            let pb = self.tracker.create_spinner(message);
            let result = operation.await;
            pb.finish_with_message(format!("✓ {}", message));
            result
        } else {
            operation.await
        }
    }
}
