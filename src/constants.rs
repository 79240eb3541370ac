// Frame related constants

/// Magic number opening every frame. A mismatch means the stream is corrupt.
pub const FRAME_MAGIC: u32 = 0x5742_4F4C;

/// Byte offset of the 4-byte magic number.
pub const FRAME_MAGIC_OFFSET: usize = 0;

/// Byte offset of the 1-byte serializer tag.
pub const FRAME_SERIALIZER_OFFSET: usize = 4;

/// Byte offset of the 4-byte signed payload length.
pub const FRAME_LENGTH_OFFSET: usize = 5;

/// Size of the fixed frame header: magic + serializer tag + payload length.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Frames announcing a payload larger than this are treated as a corrupt stream.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

// Heartbeat related constants

/// Reserved service name carried by heartbeat requests.
pub const HEARTBEAT_SERVICE_NAME: &str = "HeartbeatService";

/// Reserved method name carried by heartbeat requests.
pub const HEARTBEAT_METHOD_NAME: &str = "ping";

/// Result value carried by heartbeat responses.
pub const HEARTBEAT_PONG: &str = "pong";

/// Number of consecutive unanswered heartbeats after which a client gives up
/// on a connection.
pub const MAX_MISSED_HEARTBEATS: u32 = 3;

// Service related constants

/// Version assumed when a request or service does not name one.
pub const DEFAULT_SERVICE_VERSION: &str = "1.0";
