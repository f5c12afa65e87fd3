//! Terminal progress for tile downloads

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use ozimap::ProgressCallback;

/// Creates a progress bar counting fetched tiles
pub fn create_progress_bar(total_tiles: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_tiles);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} tiles ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-"),
    );
    pb
}

/// Owns the bar and hands out the callback that drives it
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    pub fn new(message: &str) -> Self {
        eprintln!("{message}");

        Self {
            pb: create_progress_bar(0),
        }
    }

    /// Callback for [`ozimap::BuildOptions::progress`]
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |done, total| {
            if pb.length() != Some(total) {
                pb.set_length(total);
            }
            pb.set_position(done);
        })
    }

    pub fn finish(&self) {
        self.pb.finish();
    }

    /// Remove the bar after a failed build
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}
