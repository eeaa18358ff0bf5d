//! Policy error types.

use thiserror::Error;

/// Errors from the route overlay helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The route group in meta cannot support the requested transition.
    #[error("invalid route: {reason}")]
    InvalidRoute {
        /// Why the route is unusable.
        reason: &'static str,
    },
}
