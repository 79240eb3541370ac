use crate::{
    constants::DEFAULT_MAX_FRAME_SIZE,
    frame::{FrameCodec, FrameDecodeError, FrameEncodeError, RpcFrame},
    rpc::{RpcRequest, RpcResponse},
};
use bytes::BytesMut;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder};

/// `tokio_util` adapter around [`FrameCodec`].
///
/// The codec is directional: it decodes messages of type `M` and encodes any
/// serializable message. A server decodes requests and writes responses, a
/// client does the opposite.
pub struct RpcFrameCodec<M> {
    max_frame_size: usize,
    _decodes: PhantomData<fn() -> M>,
}

/// Codec used by servers: decodes `RpcRequest`s.
pub type ServerFrameCodec = RpcFrameCodec<RpcRequest>;

/// Codec used by clients: decodes `RpcResponse`s.
pub type ClientFrameCodec = RpcFrameCodec<RpcResponse>;

impl<M> RpcFrameCodec<M> {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            _decodes: PhantomData,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl<M> Clone for RpcFrameCodec<M> {
    fn clone(&self) -> Self {
        Self::new(self.max_frame_size)
    }
}

impl<M> std::fmt::Debug for RpcFrameCodec<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcFrameCodec")
            .field("max_frame_size", &self.max_frame_size)
            .finish()
    }
}

impl<M> Default for RpcFrameCodec<M> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl<M: DeserializeOwned> Decoder for RpcFrameCodec<M> {
    type Item = RpcFrame<M>;
    type Error = FrameDecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        FrameCodec::decode(src, self.max_frame_size)
    }
}

impl<M, T: Serialize> Encoder<RpcFrame<T>> for RpcFrameCodec<M> {
    type Error = FrameEncodeError;

    fn encode(&mut self, item: RpcFrame<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        FrameCodec::encode_into(item.serializer, &item.message, self.max_frame_size, dst)
    }
}
