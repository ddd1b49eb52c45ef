use thiserror::Error;

/// Errors surfaced by character construction, configuration, and reload.
///
/// Steady-state stepping never fails: degenerate queries (zero-length sweeps,
/// zero-extent shapes) are treated as trivial successes inside the collision
/// layer, and the slide/recovery iteration caps accept a best-effort position
/// on exhaustion instead of erroring.
#[derive(Debug, Error)]
pub enum CharacterError {
    /// The character shape is not a single convex primitive.
    ///
    /// Raised at construction or shape replacement, never during a step.
    #[error("kinematic characters cannot use a non-convex collision shape: {reason}")]
    UnsupportedShape { reason: String },

    /// A configuration value is outside its documented range.
    ///
    /// Rejected at the setter rather than silently clamped, so caller bugs
    /// surface at the call site.
    #[error("invalid configuration: {name} = {value}")]
    InvalidConfiguration { name: &'static str, value: f32 },

    /// A persisted record failed validation during reconstruction.
    #[error("persisted character record rejected: {reason}")]
    PersistenceMismatch { reason: String },
}

impl CharacterError {
    /// Convenience for the common finite-value guard on setters.
    pub(crate) fn invalid(name: &'static str, value: f32) -> Self {
        Self::InvalidConfiguration { name, value }
    }
}
