use crate::serializer::SerializationError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// The payload serializers a frame can be tagged with.
///
/// The tag travels in byte 4 of every frame header, so the receiving side
/// always decodes with the serializer the sender picked, and a responder
/// answers with the same one. Parameter and result values inside a message
/// are serialized individually with the same serializer as the envelope.
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    /// Compact native binary encoding (`bitcode`, serde mode).
    #[default]
    Bitcode = 1,

    /// Human-readable JSON encoding (`serde_json`).
    Json = 2,
}

impl SerializerKind {
    #[inline]
    pub fn type_tag(self) -> u8 {
        self.into()
    }

    #[inline]
    pub fn from_type_tag(tag: u8) -> Option<Self> {
        Self::try_from(tag).ok()
    }

    pub fn serialize<T: Serialize>(self, value: &T) -> Result<Vec<u8>, SerializationError> {
        let encoded = match self {
            SerializerKind::Bitcode => bitcode::serialize(value).map_err(|e| e.to_string()),
            SerializerKind::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
        };

        encoded.map_err(|message| SerializationError::Encode {
            serializer: self,
            message,
        })
    }

    pub fn deserialize<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, SerializationError> {
        let decoded = match self {
            SerializerKind::Bitcode => bitcode::deserialize(bytes).map_err(|e| e.to_string()),
            SerializerKind::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        };

        decoded.map_err(|message| SerializationError::Decode {
            serializer: self,
            message,
        })
    }
}
