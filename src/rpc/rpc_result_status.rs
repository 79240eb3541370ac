use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

#[repr(u8)]
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
pub enum RpcResultStatus {
    Success = 0,
    ServiceNotFound = 1,
    MethodNotFound = 2,
    Error = 3,
    Timeout = 4,
    SerializationError = 5,
    Overloaded = 6,
}

impl RpcResultStatus {
    #[inline]
    pub fn value(self) -> u8 {
        self.into()
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == RpcResultStatus::Success
    }
}
