//! Progress reporting for long-running stages.
//!
//! Clustering and layout optimization can take a while on large meshes. Both
//! have `*_with_progress` variants that report through a [`Progress`]
//! callback.
//!
//! # Example
//!
//! ```
//! use mesh_layout::algo::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 2, "Clustering vertices");
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Units of work done so far
/// - `total`: Total units of work
/// - `message`: Description of the current stage
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Create a no-op progress reporter.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_forwards_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |c, t, m: &str| {
            sink.lock().unwrap().push((c, t, m.to_string()))
        });

        progress.report(3, 10, "Optimizing layout");
        Progress::none().report(1, 1, "ignored");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(3, 10, "Optimizing layout".to_string())]
        );
        assert_eq!(format!("{:?}", progress), "Progress { .. }");
    }
}
