use crate::serializer::SerializerKind;

/// A decoded (or to-be-encoded) frame: the message plus the serializer tag it
/// travels with.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcFrame<M> {
    pub serializer: SerializerKind,
    pub message: M,
}

impl<M> RpcFrame<M> {
    pub fn new(serializer: SerializerKind, message: M) -> Self {
        Self {
            serializer,
            message,
        }
    }

    pub fn into_message(self) -> M {
        self.message
    }
}
