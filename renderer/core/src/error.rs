//! Error Types
//!
//! Library errors for the streaming renderer. Rendering degradation is
//! always preferred over failing a stream: malformed fragments degrade to
//! literal text inside the sink and never reach the caller, so the errors
//! here cover only converter implementations and session control misuse.

use thiserror::Error;

/// Errors a markdown converter may report for a fragment
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// The converter could not make sense of the input.
    ///
    /// The render sink catches this and falls back to rendering the
    /// fragment as literal text; the session keeps streaming.
    #[error("malformed markdown fragment: {reason}")]
    MalformedFragment {
        /// Converter-specific description of what failed
        reason: String,
    },
}

/// Errors from session control operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The render target is missing or was destroyed.
    ///
    /// Fatal for the session being started; no partial state is created.
    #[error("render target is missing or detached")]
    TargetMissing,

    /// A snapshot arrived that is shorter than content already accepted.
    ///
    /// Backward edits are out of scope; the caller must reset the session
    /// instead of shrinking the text.
    #[error("snapshot shrank below accepted content ({seen} bytes accepted, snapshot has {snapshot})")]
    SnapshotRegression {
        /// Bytes of snapshot text already accepted
        seen: usize,
        /// Length of the offending snapshot
        snapshot: usize,
    },

    /// A snapshot arrived that is not an extension of accepted content.
    ///
    /// The session only ever renders forward; a diverging rewrite of
    /// already-accepted text is rejected the same way a shrink is.
    #[error("snapshot no longer extends accepted content (diverges within the first {seen} bytes)")]
    SnapshotDiverged {
        /// Bytes of snapshot text already accepted
        seen: usize,
    },

    /// A feed or completion was requested with no active stream
    #[error("no active stream on this session")]
    NotStreaming,

    /// The pacing task failed (panicked or was aborted externally)
    #[error("pacer task failed: {0}")]
    PacerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::MalformedFragment {
            reason: "unterminated fence".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed markdown fragment: unterminated fence"
        );

        let err = SessionError::SnapshotRegression {
            seen: 10,
            snapshot: 4,
        };
        assert_eq!(
            err.to_string(),
            "snapshot shrank below accepted content (10 bytes accepted, snapshot has 4)"
        );

        assert_eq!(
            SessionError::TargetMissing.to_string(),
            "render target is missing or detached"
        );
    }
}
