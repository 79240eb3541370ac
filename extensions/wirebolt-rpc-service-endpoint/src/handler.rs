use crate::error::RpcInvokeError;
use crate::{RpcArguments, RpcCallContext};
use serde::Serialize;
use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;
use wirebolt::rpc::{FromRpcParam, RpcParamType};

pub type RpcBoxFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, RpcInvokeError>> + Send>>;

/// What a handler hands back: a finished value or a future the dispatcher
/// must await before it can respond.
pub enum RpcReturn {
    Ready(Vec<u8>),
    Pending(RpcBoxFuture),
}

impl std::fmt::Debug for RpcReturn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcReturn::Ready(bytes) => f.debug_tuple("Ready").field(&bytes.len()).finish(),
            RpcReturn::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// The type-erased callable stored per registered method.
pub type RpcHandler =
    Arc<dyn Fn(RpcCallContext, RpcArguments) -> Result<RpcReturn, RpcInvokeError> + Send + Sync>;

/// A synchronous typed handler: `Fn(A1, .., An) -> Result<R, E>`.
pub trait RpcSyncHandler<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<String>;

    fn into_rpc_handler(self) -> RpcHandler;
}

/// An asynchronous typed handler: `Fn(A1, .., An) -> impl Future<Output = Result<R, E>>`.
pub trait RpcAsyncHandler<Args>: Send + Sync + 'static {
    fn parameter_types() -> Vec<String>;

    fn into_rpc_handler(self) -> RpcHandler;
}

macro_rules! impl_rpc_handlers {
    ($($arg:ident),*) => {
        impl<F, R, E, $($arg,)*> RpcSyncHandler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Result<R, E> + Send + Sync + 'static,
            R: Serialize + Send + 'static,
            E: Display + Send + 'static,
            $($arg: FromRpcParam + Send + 'static,)*
        {
            fn parameter_types() -> Vec<String> {
                vec![$(<$arg as RpcParamType>::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_rpc_handler(self) -> RpcHandler {
                Arc::new(move |_ctx: RpcCallContext, args: RpcArguments| {
                    let mut index = 0usize;
                    $(
                        let $arg: $arg = args.decode(index)?;
                        index += 1;
                    )*

                    let output = (self)($($arg),*)
                        .map_err(|err| RpcInvokeError::target(err.to_string()))?;

                    Ok(RpcReturn::Ready(args.serializer().serialize(&output)?))
                })
            }
        }

        impl<F, Fut, R, E, $($arg,)*> RpcAsyncHandler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<R, E>> + Send + 'static,
            R: Serialize + Send + 'static,
            E: Display + Send + 'static,
            $($arg: FromRpcParam + Send + 'static,)*
        {
            fn parameter_types() -> Vec<String> {
                vec![$(<$arg as RpcParamType>::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_rpc_handler(self) -> RpcHandler {
                Arc::new(move |_ctx: RpcCallContext, args: RpcArguments| {
                    let mut index = 0usize;
                    $(
                        let $arg: $arg = args.decode(index)?;
                        index += 1;
                    )*

                    let serializer = args.serializer();
                    let pending = (self)($($arg),*);

                    Ok(RpcReturn::Pending(Box::pin(async move {
                        let output = pending
                            .await
                            .map_err(|err| RpcInvokeError::target(err.to_string()))?;
                        Ok(serializer.serialize(&output)?)
                    })))
                })
            }
        }
    };
}

impl_rpc_handlers!();
impl_rpc_handlers!(A1);
impl_rpc_handlers!(A1, A2);
impl_rpc_handlers!(A1, A2, A3);
impl_rpc_handlers!(A1, A2, A3, A4);
