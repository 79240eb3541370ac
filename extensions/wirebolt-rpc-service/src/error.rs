use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` must be greater than zero")]
    NotPositive { field: &'static str },

    #[error(
        "heartbeat timeout ({timeout_ms} ms) must be below the heartbeat interval ({interval_ms} ms)"
    )]
    HeartbeatTimeoutNotBelowInterval { timeout_ms: u64, interval_ms: u64 },

    #[error(
        "reader idle time ({reader_idle_ms} ms) must exceed the heartbeat interval ({interval_ms} ms)"
    )]
    ReaderIdleNotAboveInterval {
        reader_idle_ms: u64,
        interval_ms: u64,
    },

    #[error("max frame size {max_frame_size} does not fit a signed 32-bit length")]
    MaxFrameSizeTooLarge { max_frame_size: usize },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to build runtime: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of a failed call, used to decide whether retrying
/// can help.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Unreachable address, refused or timed-out connect, socket reset,
    /// connection closed while the call was pending.
    Connection,

    /// The call's deadline fired before a response arrived.
    Timeout,

    /// A frame or value could not be encoded or decoded.
    Codec,

    /// The server answered with a business failure (not found, target error).
    Service,

    /// The server's worker pool rejected the call.
    Overloaded,

    /// The request was malformed before it ever left the client.
    InvalidRequest,
}

impl FailureKind {
    /// Failures that may succeed on a later attempt without any change.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::Connection | FailureKind::Timeout | FailureKind::Overloaded
        )
    }
}
