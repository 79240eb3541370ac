use crate::LocalServiceInvoker;
use crate::error::RpcServiceEndpointError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Read side of the service registry, as consumed by the dispatcher.
pub trait ServiceRegistry: Send + Sync {
    fn lookup(&self, service_name: &str, service_version: &str) -> Option<Arc<LocalServiceInvoker>>;
}

type ServiceId = (String, String);

fn service_id(service_name: &str, service_version: &str) -> ServiceId {
    (service_name.to_owned(), service_version.to_owned())
}

/// In-process registry keyed by the `(service, version)` pair.
///
/// The joined `service:version` form is only used for display, since a name
/// or version may itself contain a colon.
#[derive(Debug, Default)]
pub struct LocalServiceRegistry {
    services: DashMap<ServiceId, Arc<LocalServiceInvoker>>,
}

impl LocalServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, invoker: LocalServiceInvoker) -> Result<(), RpcServiceEndpointError> {
        let id = service_id(invoker.service_name(), invoker.service_version());
        match self.services.entry(id) {
            Entry::Occupied(entry) => Err(RpcServiceEndpointError::DuplicateService {
                service_key: entry.get().service_key().to_string(),
            }),
            Entry::Vacant(entry) => {
                tracing::debug!("Registered service {}", invoker.service_key());
                entry.insert(Arc::new(invoker));
                Ok(())
            }
        }
    }

    pub fn unregister(&self, service_name: &str, service_version: &str) -> bool {
        self.services
            .remove(&service_id(service_name, service_version))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service_keys(&self) -> Vec<String> {
        self.services
            .iter()
            .map(|entry| entry.value().service_key().to_string())
            .collect()
    }
}

impl ServiceRegistry for LocalServiceRegistry {
    fn lookup(&self, service_name: &str, service_version: &str) -> Option<Arc<LocalServiceInvoker>> {
        self.services
            .get(&service_id(service_name, service_version))
            .map(|entry| Arc::clone(entry.value()))
    }
}
