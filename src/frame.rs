mod frame_codec;
mod frame_error;
mod rpc_frame;
mod rpc_frame_codec;

pub use frame_codec::{FrameCodec, FrameHeader};
pub use frame_error::{FrameDecodeError, FrameEncodeError};
pub use rpc_frame::RpcFrame;
pub use rpc_frame_codec::{ClientFrameCodec, RpcFrameCodec, ServerFrameCodec};
