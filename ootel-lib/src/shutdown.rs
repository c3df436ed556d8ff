//! Composed teardown for every subsystem brought up by [`crate::Client::init`].
//!
//! Each subsystem registers one [`Shutdown`] entry. [`ShutdownFunc::shutdown`]
//! runs all of them, even after a failure, and reports every failure at once.

use std::fmt;
use std::time::Duration;

use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{debug, warn};

use crate::error::BoxError;

/// A subsystem that can flush and release its resources.
///
/// `timeout` bounds how long the subsystem may spend flushing buffered data;
/// `None` leaves the choice to the subsystem.
pub trait Shutdown: Send + Sync {
    fn shutdown(&self, timeout: Option<Duration>) -> Result<(), BoxError>;
}

impl Shutdown for SdkTracerProvider {
    fn shutdown(&self, timeout: Option<Duration>) -> Result<(), BoxError> {
        let result = match timeout {
            Some(timeout) => self.shutdown_with_timeout(timeout),
            None => SdkTracerProvider::shutdown(self),
        };
        result.map_err(|e| Box::new(e) as BoxError)
    }
}

impl Shutdown for SdkMeterProvider {
    fn shutdown(&self, timeout: Option<Duration>) -> Result<(), BoxError> {
        let result = match timeout {
            Some(timeout) => self.shutdown_with_timeout(timeout),
            None => SdkMeterProvider::shutdown(self),
        };
        result.map_err(|e| Box::new(e) as BoxError)
    }
}

/// Ordered set of teardown callables. Consumed by [`ShutdownFunc::shutdown`],
/// so it can run at most once.
#[derive(Default)]
pub struct ShutdownFunc {
    entries: Vec<(&'static str, Box<dyn Shutdown>)>,
}

impl ShutdownFunc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, subsystem: &'static str, entry: Box<dyn Shutdown>) {
        self.entries.push((subsystem, entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the registered subsystems, in teardown order.
    pub fn subsystems(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn shutdown(self, timeout: Option<Duration>) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();

        for (subsystem, entry) in self.entries {
            match entry.shutdown(timeout) {
                Ok(()) => debug!(subsystem, "subsystem shut down"),
                Err(source) => {
                    warn!(subsystem, error = %source, "subsystem shutdown failed");
                    failures.push(ShutdownFailure { subsystem, source });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}

impl fmt::Debug for ShutdownFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownFunc")
            .field("subsystems", &self.subsystems().collect::<Vec<_>>())
            .finish()
    }
}

/// One subsystem's teardown failure
#[derive(Debug)]
pub struct ShutdownFailure {
    pub subsystem: &'static str,
    pub source: BoxError,
}

/// Every teardown failure from a single [`ShutdownFunc::shutdown`] call
#[derive(Debug)]
pub struct ShutdownError {
    failures: Vec<ShutdownFailure>,
}

impl ShutdownError {
    pub fn failures(&self) -> &[ShutdownFailure] {
        &self.failures
    }
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{} shutdown failed: {}", failure.subsystem, failure.source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|failure| failure.source.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTeardown {
        calls: Arc<AtomicUsize>,
        fail_with: Option<&'static str>,
    }

    impl Shutdown for CountingTeardown {
        fn shutdown(&self, _timeout: Option<Duration>) -> Result<(), BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(msg) => Err(msg.into()),
                None => Ok(()),
            }
        }
    }

    fn counting(calls: &Arc<AtomicUsize>, fail_with: Option<&'static str>) -> Box<dyn Shutdown> {
        Box::new(CountingTeardown { calls: calls.clone(), fail_with })
    }

    #[test]
    fn empty_shutdown_succeeds() {
        let func = ShutdownFunc::new();
        assert!(func.is_empty());
        assert!(func.shutdown(None).is_ok());
    }

    #[test]
    fn keeps_going_after_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut func = ShutdownFunc::new();
        func.register("trace", counting(&calls, Some("exporter unreachable")));
        func.register("metric", counting(&calls, None));
        func.register("extra", counting(&calls, Some("already shut down")));

        let err = match func.shutdown(Some(Duration::from_millis(10))) {
            Ok(()) => panic!("expected shutdown to fail"),
            Err(err) => err,
        };

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.failures().len(), 2);
        assert_eq!(
            err.to_string(),
            "trace shutdown failed: exporter unreachable\nextra shutdown failed: already shut down"
        );
    }

    #[test]
    fn preserves_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut func = ShutdownFunc::new();
        func.register("trace", counting(&calls, None));
        func.register("metric", counting(&calls, None));
        assert_eq!(func.subsystems().collect::<Vec<_>>(), vec!["trace", "metric"]);
        assert_eq!(func.len(), 2);
    }
}
