use crate::BoxError;
use std::fmt;
use std::time::Duration;

/// Watchdog limit used when none is given, matching the file helper.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Invoked exactly once when the parser reaches the end of its run.
pub type CompletionHook = Box<dyn FnOnce() -> Result<(), BoxError> + Send + 'static>;

/// Configuration of a single parse run.
pub struct ParseOptions {
    /// Longest allowed silence between two produced items
    pub timeout: Duration,
    pub(crate) on_complete: CompletionHook,
}

impl ParseOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            on_complete: noop(),
        }
    }

    /// Register the hook run when the log reports a successful completion.
    ///
    /// A failing hook becomes the terminal failure of the run.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.on_complete = Box::new(hook);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn noop() -> CompletionHook {
    Box::new(|| Ok::<(), BoxError>(()))
}
