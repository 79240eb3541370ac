use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one connection. `Closing` is terminal.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum ConnectionState {
    Active = 0,
    Closing = 1,
}

/// Atomically shared [`ConnectionState`].
///
/// The only transition is `Active -> Closing`, taken through a
/// compare-exchange so exactly one caller wins and runs the teardown.
#[derive(Debug)]
pub struct ConnectionStateCell {
    state: AtomicU8,
}

impl ConnectionStateCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Active.into()),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::try_from(self.state.load(Ordering::Acquire))
            .unwrap_or(ConnectionState::Closing)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.get() == ConnectionState::Active
    }

    /// Moves to `Closing`. Returns `true` only for the call that performed
    /// the transition.
    pub fn begin_closing(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Active.into(),
                ConnectionState::Closing.into(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for ConnectionStateCell {
    fn default() -> Self {
        Self::new()
    }
}
