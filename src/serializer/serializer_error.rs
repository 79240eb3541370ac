use crate::serializer::SerializerKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerializationError {
    #[error("{serializer:?} serializer failed to encode value: {message}")]
    Encode {
        serializer: SerializerKind,
        message: String,
    },

    #[error("{serializer:?} serializer failed to decode value: {message}")]
    Decode {
        serializer: SerializerKind,
        message: String,
    },
}
