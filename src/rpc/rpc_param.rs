use crate::serializer::{SerializationError, SerializerKind};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::hash::Hash;

/// Descriptor of a parameter that accepts a value of any type.
pub const ANY_PARAM_TYPE: &str = "any";

/// Descriptor of the unit type, also used for an absent optional value.
pub const UNIT_PARAM_TYPE: &str = "unit";

/// Associates a stable, language-neutral type descriptor with a Rust type.
///
/// Descriptors form the parameter-type half of a method signature, so the
/// server can pick the right overload of a method before decoding anything.
pub trait RpcParamType {
    fn param_type() -> String;
}

/// Decodes a parameter value supplied by a caller.
///
/// `supplied_type` is the descriptor the caller declared for the value. It
/// equals `Self::param_type()` on an exact signature match and differs only
/// when the server resolved the method through a compatible-type fallback
/// (see [`is_param_type_assignable`]).
pub trait FromRpcParam: RpcParamType + Sized {
    fn from_rpc_param(
        serializer: SerializerKind,
        supplied_type: &str,
        bytes: &[u8],
    ) -> Result<Self, SerializationError>;
}

/// Implements [`RpcParamType`] and [`FromRpcParam`] for types that are
/// decoded directly with the frame's serializer.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// wirebolt::impl_rpc_param!(Point => "point");
/// ```
#[macro_export]
macro_rules! impl_rpc_param {
    ($($ty:ty => $name:expr),* $(,)?) => {
        $(
            impl $crate::rpc::RpcParamType for $ty {
                fn param_type() -> String {
                    String::from($name)
                }
            }

            impl $crate::rpc::FromRpcParam for $ty {
                fn from_rpc_param(
                    serializer: $crate::serializer::SerializerKind,
                    _supplied_type: &str,
                    bytes: &[u8],
                ) -> Result<Self, $crate::serializer::SerializationError> {
                    serializer.deserialize(bytes)
                }
            }
        )*
    };
}

impl_rpc_param!(
    String => "string",
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    f32 => "f32",
    f64 => "f64",
    () => UNIT_PARAM_TYPE,
);

impl RpcParamType for str {
    fn param_type() -> String {
        String::param_type()
    }
}

impl<T: RpcParamType + ?Sized> RpcParamType for &T {
    fn param_type() -> String {
        T::param_type()
    }
}

impl<T: RpcParamType> RpcParamType for [T] {
    fn param_type() -> String {
        Vec::<T>::param_type()
    }
}

impl<T: RpcParamType> RpcParamType for Vec<T> {
    fn param_type() -> String {
        format!("list<{}>", T::param_type())
    }
}

impl<T: RpcParamType + DeserializeOwned> FromRpcParam for Vec<T> {
    fn from_rpc_param(
        serializer: SerializerKind,
        _supplied_type: &str,
        bytes: &[u8],
    ) -> Result<Self, SerializationError> {
        serializer.deserialize(bytes)
    }
}

impl<K: RpcParamType, V: RpcParamType> RpcParamType for HashMap<K, V> {
    fn param_type() -> String {
        format!("map<{},{}>", K::param_type(), V::param_type())
    }
}

impl<K, V> FromRpcParam for HashMap<K, V>
where
    K: RpcParamType + DeserializeOwned + Eq + Hash,
    V: RpcParamType + DeserializeOwned,
{
    fn from_rpc_param(
        serializer: SerializerKind,
        _supplied_type: &str,
        bytes: &[u8],
    ) -> Result<Self, SerializationError> {
        serializer.deserialize(bytes)
    }
}

impl<T: RpcParamType> RpcParamType for Option<T> {
    fn param_type() -> String {
        format!("option<{}>", T::param_type())
    }
}

impl<T: FromRpcParam + DeserializeOwned> FromRpcParam for Option<T> {
    fn from_rpc_param(
        serializer: SerializerKind,
        supplied_type: &str,
        bytes: &[u8],
    ) -> Result<Self, SerializationError> {
        if supplied_type == Self::param_type() {
            serializer.deserialize(bytes)
        } else if supplied_type == UNIT_PARAM_TYPE {
            Ok(None)
        } else {
            T::from_rpc_param(serializer, supplied_type, bytes).map(Some)
        }
    }
}

/// A parameter left undecoded until the handler knows what to do with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcAnyParam {
    serializer: SerializerKind,
    supplied_type: String,
    bytes: Vec<u8>,
}

impl RpcAnyParam {
    pub fn supplied_type(&self) -> &str {
        &self.supplied_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SerializationError> {
        self.serializer.deserialize(&self.bytes)
    }
}

impl RpcParamType for RpcAnyParam {
    fn param_type() -> String {
        String::from(ANY_PARAM_TYPE)
    }
}

impl FromRpcParam for RpcAnyParam {
    fn from_rpc_param(
        serializer: SerializerKind,
        supplied_type: &str,
        bytes: &[u8],
    ) -> Result<Self, SerializationError> {
        Ok(RpcAnyParam {
            serializer,
            supplied_type: supplied_type.to_string(),
            bytes: bytes.to_vec(),
        })
    }
}

/// Whether a parameter declared as `declared` can receive a value the caller
/// described as `supplied`.
///
/// Assignable means: the descriptors are equal, the declared type is `any`,
/// or the declared type is `option<T>` and the supplied value is `unit` or
/// assignable to `T`.
pub fn is_param_type_assignable(declared: &str, supplied: &str) -> bool {
    if declared == supplied || declared == ANY_PARAM_TYPE {
        return true;
    }

    match declared
        .strip_prefix("option<")
        .and_then(|inner| inner.strip_suffix('>'))
    {
        Some(inner) => supplied == UNIT_PARAM_TYPE || is_param_type_assignable(inner, supplied),
        None => false,
    }
}
