use crate::{
    constants::{
        FRAME_HEADER_SIZE, FRAME_LENGTH_OFFSET, FRAME_MAGIC, FRAME_MAGIC_OFFSET,
        FRAME_SERIALIZER_OFFSET,
    },
    frame::{FrameDecodeError, FrameEncodeError, RpcFrame},
    serializer::SerializerKind,
};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};

/// The fixed 9-byte header in front of every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub serializer: SerializerKind,
    pub payload_len: usize,
}

impl FrameHeader {
    pub fn frame_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload_len
    }
}

/// Stateless encoder/decoder for the Wirebolt wire frame.
///
/// ```text
/// offset 0, length 4: magic number (u32, big-endian)
/// offset 4, length 1: serializer tag
/// offset 5, length 4: payload length N (i32, big-endian, 0 < N <= max)
/// offset 9, length N: serialized payload
/// ```
///
/// Decoding never consumes bytes from the buffer until a complete frame is
/// available, so a caller can keep appending bytes and retry from the same
/// position.
pub struct FrameCodec;

impl FrameCodec {
    /// Encodes `message` into a freshly allocated frame.
    pub fn encode<M: Serialize>(
        serializer: SerializerKind,
        message: &M,
        max_frame_size: usize,
    ) -> Result<Vec<u8>, FrameEncodeError> {
        let mut buf = BytesMut::new();
        Self::encode_into(serializer, message, max_frame_size, &mut buf)?;
        Ok(buf.to_vec())
    }

    /// Encodes `message` and appends the frame to `dst`.
    ///
    /// Nothing is written to `dst` if serialization fails or the payload is
    /// too large, so a failed encode leaves the outgoing stream intact.
    pub fn encode_into<M: Serialize>(
        serializer: SerializerKind,
        message: &M,
        max_frame_size: usize,
        dst: &mut BytesMut,
    ) -> Result<(), FrameEncodeError> {
        let payload = serializer.serialize(message)?;

        if payload.is_empty() {
            return Err(FrameEncodeError::EmptyPayload);
        }

        if payload.len() > max_frame_size || payload.len() > i32::MAX as usize {
            return Err(FrameEncodeError::FrameTooLarge {
                length: payload.len(),
                max: max_frame_size,
            });
        }

        dst.reserve(FRAME_HEADER_SIZE + payload.len());
        dst.put_u32(FRAME_MAGIC);
        dst.put_u8(serializer.type_tag());
        dst.put_i32(payload.len() as i32);
        dst.put_slice(&payload);

        Ok(())
    }

    /// Validates the header at the front of `buf` without consuming anything.
    ///
    /// Returns `Ok(None)` while fewer than `FRAME_HEADER_SIZE` bytes are
    /// buffered.
    pub fn peek_header(
        buf: &[u8],
        max_frame_size: usize,
    ) -> Result<Option<FrameHeader>, FrameDecodeError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let magic = read_u32(buf, FRAME_MAGIC_OFFSET);
        if magic != FRAME_MAGIC {
            return Err(FrameDecodeError::BadMagic { found: magic });
        }

        let length = read_u32(buf, FRAME_LENGTH_OFFSET) as i32;
        if length <= 0 || length as usize > max_frame_size {
            return Err(FrameDecodeError::InvalidLength {
                length,
                max: max_frame_size,
            });
        }

        let tag = buf[FRAME_SERIALIZER_OFFSET];
        let serializer =
            SerializerKind::from_type_tag(tag).ok_or(FrameDecodeError::UnknownSerializer(tag))?;

        Ok(Some(FrameHeader {
            serializer,
            payload_len: length as usize,
        }))
    }

    /// Decodes one frame from the front of `buf`.
    ///
    /// - `Ok(None)`: more data is needed; `buf` is untouched.
    /// - `Ok(Some(frame))`: exactly one frame was consumed from `buf`.
    /// - `Err(_)`: the stream is corrupt and must be abandoned.
    pub fn decode<M: DeserializeOwned>(
        buf: &mut BytesMut,
        max_frame_size: usize,
    ) -> Result<Option<RpcFrame<M>>, FrameDecodeError> {
        let header = match Self::peek_header(buf, max_frame_size)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if buf.len() < header.frame_len() {
            // Make room for the rest of the frame so the next read can complete it
            buf.reserve(header.frame_len() - buf.len());
            tracing::trace!(
                buffered = buf.len(),
                needed = header.frame_len(),
                "Partial frame, waiting for more bytes"
            );
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(header.payload_len);
        let message = header.serializer.deserialize::<M>(&payload)?;
        tracing::trace!(
            serializer = ?header.serializer,
            payload_len = header.payload_len,
            "Decoded frame"
        );

        Ok(Some(RpcFrame::new(header.serializer, message)))
    }
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
