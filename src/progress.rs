//! Per-request cancellation and progress reporting.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Receives fractional completion values in `[0, 1]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Cancellation signal and progress sink for one network-issuing call.
///
/// All catalog operations accept `&RequestOptions`; pass
/// `&Default::default()` when neither is needed.
///
/// # Example
///
/// ```
/// use beatsaver::RequestOptions;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let options = RequestOptions::new()
///     .with_cancellation(token.clone())
///     .with_progress(|fraction| println!("{:.0}%", fraction * 100.0));
/// assert!(!options.is_cancelled());
/// token.cancel();
/// assert!(options.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct RequestOptions {
    cancel: Option<CancellationToken>,
    progress: Option<ProgressSink>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("cancellable", &self.cancel.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the call when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report transfer progress to `sink`.
    #[must_use]
    pub fn with_progress<F>(mut self, sink: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(sink));
        self
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Resolves once the token is cancelled; never resolves without one.
    pub async fn cancelled(&self) {
        match &self.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// Same cancellation, no progress sink.
    ///
    /// Used for follow-up requests whose progress would otherwise restart
    /// the caller's reported fraction.
    pub(crate) fn cancellation_only(&self) -> Self {
        Self {
            cancel: self.cancel.clone(),
            progress: None,
        }
    }

    pub(crate) fn reporter(&self) -> ProgressReporter {
        ProgressReporter::new(self.progress.clone())
    }
}

/// Enforces the progress contract for a single call.
///
/// Values are clamped to `[0, 1]`, never decrease, and `1.0` is only
/// emitted by [`finish`](Self::finish) after the transfer succeeded.
pub(crate) struct ProgressReporter {
    sink: Option<ProgressSink>,
    last: Option<f64>,
}

impl ProgressReporter {
    pub(crate) fn new(sink: Option<ProgressSink>) -> Self {
        Self { sink, last: None }
    }

    pub(crate) fn start(&mut self) {
        self.emit(0.0);
    }

    pub(crate) fn report(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        // completion belongs to finish()
        if fraction >= 1.0 {
            return;
        }
        self.emit(fraction);
    }

    pub(crate) fn report_bytes(&mut self, received: u64, total: Option<u64>) {
        if let Some(total) = total.filter(|t| *t > 0) {
            self.report(received as f64 / total as f64);
        }
    }

    pub(crate) fn finish(&mut self) {
        self.emit(1.0);
    }

    fn emit(&mut self, value: f64) {
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        if let Some(sink) = &self.sink {
            sink(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (ProgressReporter, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |v| sink_seen.lock().unwrap().push(v));
        (ProgressReporter::new(Some(sink)), seen)
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let (mut reporter, seen) = recording();
        reporter.start();
        reporter.report(0.5);
        reporter.report(0.25);
        reporter.report(0.5);
        reporter.report(0.75);
        reporter.finish();
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_reporter_holds_completion_for_finish() {
        let (mut reporter, seen) = recording();
        reporter.report(3.0);
        reporter.report(f64::NAN);
        reporter.report_bytes(10, Some(10));
        reporter.report_bytes(5, None);
        assert!(seen.lock().unwrap().is_empty());

        reporter.finish();
        reporter.finish();
        assert_eq!(*seen.lock().unwrap(), vec![1.0]);
    }

    #[test]
    fn test_reporter_without_sink() {
        let mut reporter = ProgressReporter::new(None);
        reporter.start();
        reporter.report(0.4);
        reporter.finish();
        assert_eq!(reporter.last, Some(1.0));
    }

    #[test]
    fn test_cancellation_only_drops_sink() {
        let token = CancellationToken::new();
        let options = RequestOptions::new()
            .with_cancellation(token.clone())
            .with_progress(|_| {});
        let follow_up = options.cancellation_only();
        assert!(follow_up.progress.is_none());
        token.cancel();
        assert!(follow_up.is_cancelled());
    }

    #[test]
    fn test_cancelled_resolves_once_tripped() {
        let token = CancellationToken::new();
        let options = RequestOptions::new().with_cancellation(token.clone());
        token.cancel();
        tokio_test::block_on(options.cancelled());
        assert!(options.is_cancelled());
    }

    #[test]
    fn test_cancelled_without_token_stays_pending() {
        let options = RequestOptions::new();
        let mut pending = tokio_test::task::spawn(async move { options.cancelled().await });
        tokio_test::assert_pending!(pending.poll());
    }
}
