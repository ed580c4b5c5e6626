//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as a batch converts each file.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a log, or a terminal progress bar without the
//! library knowing anything about how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, input: &Path, output: &Path) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{}/{}] {} → {}", index, total, input.display(), output.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::MarkdownConverter::convert_batch`] as it works through
/// its inputs.
///
/// Files are converted one after another, so events arrive in order on the
/// converting task. All methods have default no-op implementations so callers
/// only override what they care about. `index` is 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first file is read.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a file is read.
    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called after a file's PDF is written.
    fn on_file_complete(&self, index: usize, total: usize, input: &Path, output: &Path) {
        let _ = (index, total, input, output);
    }

    /// Called when a file fails; the batch continues with the next file.
    fn on_file_error(&self, index: usize, total: usize, input: &Path, error: &str) {
        let _ = (index, total, input, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        completed_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _input: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _input: &Path, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _input: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, Path::new("a.md"));
        cb.on_file_complete(1, 2, Path::new("a.md"), Path::new("a.pdf"));
        cb.on_file_error(2, 2, Path::new("b.md"), "missing");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_file_start(1, 3, Path::new("a.md"));
        tracker.on_file_complete(1, 3, Path::new("a.md"), Path::new("a.pdf"));
        tracker.on_file_start(2, 3, Path::new("b.md"));
        tracker.on_file_complete(2, 3, Path::new("b.md"), Path::new("b.pdf"));
        tracker.on_file_start(3, 3, Path::new("c.txt"));
        tracker.on_file_error(3, 3, Path::new("c.txt"), "not markdown");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
        cb.on_file_start(1, 1, Path::new("x.md"));
    }
}
