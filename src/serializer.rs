mod serializer_error;
mod serializer_kind;

pub use serializer_error::SerializationError;
pub use serializer_kind::SerializerKind;
