mod connection_state;
mod heartbeat_monitor;
mod idle_tracker;

pub use connection_state::{ConnectionState, ConnectionStateCell};
pub use heartbeat_monitor::{HeartbeatMonitor, HeartbeatRole, HeartbeatSettings, IdleAction};
pub use idle_tracker::IdleTracker;
