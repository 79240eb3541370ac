use crate::error::{RpcInvokeError, RpcServiceEndpointError};
use crate::{RpcArguments, RpcAsyncHandler, RpcCallContext, RpcHandler, RpcReturn, RpcSyncHandler};
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use wirebolt::constants::DEFAULT_SERVICE_VERSION;
use wirebolt_rpc_service::{RpcMethodDefinition, RpcMethodSignature, method_signature_id};

#[derive(Clone)]
pub struct RegisteredMethod {
    signature: RpcMethodSignature,
    handler: RpcHandler,
}

impl RegisteredMethod {
    pub fn signature(&self) -> &RpcMethodSignature {
        &self.signature
    }

    pub fn handler(&self) -> &RpcHandler {
        &self.handler
    }
}

impl std::fmt::Debug for RegisteredMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredMethod")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Collects the methods of one `(service, version)` before registration.
///
/// ```rust,ignore
/// let echo = ServiceDefinition::new("Echo")
///     .method("echo", |msg: String| Ok::<_, String>(format!("Echo: {msg}")))
///     .build()?;
/// registry.register(echo)?;
/// ```
pub struct ServiceDefinition {
    service_name: String,
    service_version: String,
    methods: Vec<RegisteredMethod>,
}

impl ServiceDefinition {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            methods: Vec::new(),
        }
    }

    pub fn version(mut self, service_version: impl Into<String>) -> Self {
        self.service_version = service_version.into();
        self
    }

    /// Registers a synchronous handler. It runs on the business pool.
    pub fn method<Args, H>(self, method_name: impl Into<String>, handler: H) -> Self
    where
        H: RpcSyncHandler<Args>,
    {
        let signature = RpcMethodSignature::new(method_name, H::parameter_types());
        self.push(signature, handler.into_rpc_handler())
    }

    /// Registers a handler whose result is a future. The dispatcher awaits it
    /// under the server's async-await timeout before responding.
    pub fn method_async<Args, H>(self, method_name: impl Into<String>, handler: H) -> Self
    where
        H: RpcAsyncHandler<Args>,
    {
        let signature = RpcMethodSignature::new(method_name, H::parameter_types());
        self.push(signature, handler.into_rpc_handler())
    }

    /// Registers an untyped handler with an explicit parameter-type list.
    pub fn raw_method<F>(
        self,
        method_name: impl Into<String>,
        parameter_types: Vec<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(RpcCallContext, RpcArguments) -> Result<RpcReturn, RpcInvokeError>
            + Send
            + Sync
            + 'static,
    {
        let signature = RpcMethodSignature::new(method_name, parameter_types);
        self.push(signature, Arc::new(handler))
    }

    /// Implements a shared [`RpcMethodDefinition`] with a synchronous handler.
    pub fn implement<M, F, E>(self, handler: F) -> Self
    where
        M: RpcMethodDefinition,
        F: Fn(M::Input) -> Result<M::Output, E> + Send + Sync + 'static,
        E: Display + Send + 'static,
    {
        self.method::<(M::Input,), F>(M::METHOD_NAME, handler)
    }

    /// Implements a shared [`RpcMethodDefinition`] with an async handler.
    pub fn implement_async<M, F, Fut, E>(self, handler: F) -> Self
    where
        M: RpcMethodDefinition,
        F: Fn(M::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Output, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.method_async::<(M::Input,), F>(M::METHOD_NAME, handler)
    }

    fn push(mut self, signature: RpcMethodSignature, handler: RpcHandler) -> Self {
        self.methods.push(RegisteredMethod { signature, handler });
        self
    }

    pub fn build(self) -> Result<LocalServiceInvoker, RpcServiceEndpointError> {
        let service_key = format!("{}:{}", self.service_name, self.service_version);

        let mut seen = HashSet::with_capacity(self.methods.len());
        for method in &self.methods {
            if !seen.insert(method.signature.id()) {
                return Err(RpcServiceEndpointError::DuplicateMethod {
                    service_key,
                    signature: method.signature.to_string(),
                });
            }
        }

        Ok(LocalServiceInvoker {
            service_name: self.service_name,
            service_version: self.service_version,
            service_key,
            methods: self.methods,
            method_cache: DashMap::new(),
        })
    }
}

/// The bound callables of one registered `(service, version)`.
///
/// Method resolution tries the signature cache, then an exact parameter-type
/// match, then the first compatible signature in registration order. Hits
/// from the last two are cached under the caller-supplied signature.
#[derive(Debug)]
pub struct LocalServiceInvoker {
    service_name: String,
    service_version: String,
    service_key: String,
    methods: Vec<RegisteredMethod>,
    method_cache: DashMap<u64, usize>,
}

impl LocalServiceInvoker {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// `service:version`.
    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    pub fn signatures(&self) -> impl Iterator<Item = &RpcMethodSignature> {
        self.methods.iter().map(|method| &method.signature)
    }

    pub fn cached_signature_count(&self) -> usize {
        self.method_cache.len()
    }

    pub fn resolve(&self, method_name: &str, parameter_types: &[String]) -> Option<&RegisteredMethod> {
        let cache_key = method_signature_id(method_name, parameter_types);

        if let Some(index) = self.method_cache.get(&cache_key).map(|entry| *entry) {
            let method = &self.methods[index];
            // Guards against a hash collision between two supplied signatures.
            if method.signature.accepts(method_name, parameter_types) {
                return Some(method);
            }
        }

        let index = self
            .methods
            .iter()
            .position(|method| method.signature.matches_exactly(method_name, parameter_types))
            .or_else(|| {
                self.methods
                    .iter()
                    .position(|method| method.signature.accepts(method_name, parameter_types))
            })?;

        tracing::trace!(
            "Resolved {}.{}({}) to {}",
            self.service_key,
            method_name,
            parameter_types.join(", "),
            self.methods[index].signature
        );
        self.method_cache.insert(cache_key, index);
        Some(&self.methods[index])
    }

    pub fn invoke(
        &self,
        context: RpcCallContext,
        arguments: RpcArguments,
    ) -> Result<RpcReturn, RpcInvokeError> {
        let method = self
            .resolve(&context.method_name, arguments.parameter_types())
            .ok_or_else(|| RpcInvokeError::MethodNotFound {
                descriptor: format!(
                    "{}.{}({})",
                    self.service_key,
                    context.method_name,
                    arguments.parameter_types().join(", ")
                ),
            })?;

        (method.handler)(context, arguments)
    }
}
