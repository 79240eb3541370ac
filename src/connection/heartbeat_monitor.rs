use crate::connection::IdleTracker;
use crate::constants::MAX_MISSED_HEARTBEATS;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const MIN_POLL_PERIOD: Duration = Duration::from_millis(10);

/// Idle-detection knobs shared by both sides of a connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeartbeatSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub timeout: Duration,
    pub reader_idle_time: Duration,
    pub writer_idle_time: Duration,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            reader_idle_time: Duration::from_secs(90),
            writer_idle_time: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeartbeatRole {
    /// Keeps the connection warm by sending heartbeats when write-idle.
    Client,

    /// Closes connections that have gone quiet for too long.
    Server,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdleAction {
    None,
    SendHeartbeat,
    Close,
}

/// The idle-detection state machine of one connection.
///
/// This type only decides; the transport that owns the socket acts on the
/// returned [`IdleAction`].
#[derive(Debug)]
pub struct HeartbeatMonitor {
    role: HeartbeatRole,
    settings: HeartbeatSettings,
    missed_heartbeats: AtomicU32,
}

impl HeartbeatMonitor {
    pub fn new(role: HeartbeatRole, settings: HeartbeatSettings) -> Self {
        Self {
            role,
            settings,
            missed_heartbeats: AtomicU32::new(0),
        }
    }

    pub fn role(&self) -> HeartbeatRole {
        self.role
    }

    pub fn settings(&self) -> &HeartbeatSettings {
        &self.settings
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Write-idle span after which a client sends a heartbeat.
    pub fn heartbeat_due_after(&self) -> Duration {
        self.settings
            .interval
            .min(self.settings.writer_idle_time)
    }

    /// How often the owner should call [`evaluate`](Self::evaluate).
    pub fn poll_period(&self) -> Duration {
        let window = match self.role {
            HeartbeatRole::Client => self.heartbeat_due_after(),
            HeartbeatRole::Server => self.settings.reader_idle_time,
        };
        (window / 4).max(MIN_POLL_PERIOD)
    }

    pub fn evaluate(&self, tracker: &IdleTracker) -> IdleAction {
        if !self.settings.enabled {
            return IdleAction::None;
        }

        match self.role {
            HeartbeatRole::Client if tracker.write_idle() >= self.heartbeat_due_after() => {
                IdleAction::SendHeartbeat
            }
            HeartbeatRole::Server if tracker.read_idle() >= self.settings.reader_idle_time => {
                IdleAction::Close
            }
            _ => IdleAction::None,
        }
    }

    pub fn record_heartbeat_ack(&self) {
        self.missed_heartbeats.store(0, Ordering::Release);
    }

    /// Counts an unanswered heartbeat. Returns `Close` once
    /// `MAX_MISSED_HEARTBEATS` consecutive heartbeats went unanswered.
    pub fn record_heartbeat_miss(&self) -> IdleAction {
        let missed = self.missed_heartbeats.fetch_add(1, Ordering::AcqRel) + 1;
        if missed >= MAX_MISSED_HEARTBEATS {
            IdleAction::Close
        } else {
            IdleAction::None
        }
    }

    pub fn missed_heartbeats(&self) -> u32 {
        self.missed_heartbeats.load(Ordering::Acquire)
    }
}
