//! Evaluation configuration

use std::fmt;
use std::sync::Arc;

/// Callback consulted between top-level axis evaluations; returning true
/// aborts the query with [`EvalError::Canceled`](crate::EvalError::Canceled).
pub type CancelCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Tunables for one query execution
#[derive(Clone)]
pub struct EvalConfig {
    /// Maximum context-chain depth before a recursion error
    pub max_depth: usize,
    /// Maximum elements a single set iteration may produce (0 = unbounded)
    pub iteration_limit: usize,
    /// Whether native set evaluators may short-circuit interpretation
    pub native_enabled: bool,
    cancel_check: Option<CancelCheck>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            iteration_limit: 0,
            native_enabled: true,
            cancel_check: None,
        }
    }
}

impl EvalConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recursion depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the iteration bound (0 = unbounded)
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Enable or disable native set evaluation
    pub fn with_native_enabled(mut self, enabled: bool) -> Self {
        self.native_enabled = enabled;
        self
    }

    /// Install a cancellation callback
    pub fn with_cancel_check(mut self, check: CancelCheck) -> Self {
        self.cancel_check = Some(check);
        self
    }

    /// Whether cancellation has been requested
    pub fn cancel_requested(&self) -> bool {
        self.cancel_check.as_ref().is_some_and(|check| check())
    }
}

impl fmt::Debug for EvalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalConfig")
            .field("max_depth", &self.max_depth)
            .field("iteration_limit", &self.iteration_limit)
            .field("native_enabled", &self.native_enabled)
            .field("cancel_check", &self.cancel_check.is_some())
            .finish()
    }
}
