use crate::serializer::SerializationError;

#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    /// The serialized payload does not fit in a single frame.
    #[error("frame payload of {length} bytes exceeds the {max} byte limit")]
    FrameTooLarge { length: usize, max: usize },

    #[error("refusing to encode an empty frame payload")]
    EmptyPayload,

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("frame write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Every variant except `Io` means the byte stream can no longer be trusted;
/// the owning connection is closed rather than resynchronized.
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("bad frame magic {found:#010x}")]
    BadMagic { found: u32 },

    #[error("invalid frame length {length} (allowed 1..={max})")]
    InvalidLength { length: i32, max: usize },

    #[error("unknown serializer tag {0}")]
    UnknownSerializer(u8),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("frame read failed: {0}")]
    Io(#[from] std::io::Error),
}
