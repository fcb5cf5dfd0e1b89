//! Service registry.
//!
//! # Responsibilities
//! - Group configured instances by service name
//! - Answer `resolve` lookups against an immutable snapshot
//! - Allow the snapshot to be replaced on config reload

use std::collections::HashMap;
use std::sync::Arc;
use arc_swap::ArcSwap;
use url::Url;

use crate::config::ServiceInstanceConfig;
use crate::discovery::{parse_address, ServiceResolver};

/// A single registered instance of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub service: String,
    pub base_url: Url,
}

/// Immutable map of service name -> instances.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    services: HashMap<String, Vec<ServiceInstance>>,
}

impl StaticRegistry {
    /// Build a registry from configuration entries.
    /// Entries with unparsable addresses are skipped with a warning.
    pub fn from_config(configs: &[ServiceInstanceConfig]) -> Self {
        let mut services: HashMap<String, Vec<ServiceInstance>> = HashMap::new();

        for config in configs {
            match parse_address(&config.address) {
                Some(base_url) => {
                    services
                        .entry(config.name.clone())
                        .or_default()
                        .push(ServiceInstance {
                            service: config.name.clone(),
                            base_url,
                        });
                }
                None => {
                    tracing::warn!(service = %config.name, address = %config.address, "Invalid service address");
                }
            }
        }

        Self { services }
    }

    /// Register an instance programmatically.
    pub fn with_instance(mut self, service: &str, base_url: Url) -> Self {
        self.services
            .entry(service.to_string())
            .or_default()
            .push(ServiceInstance {
                service: service.to_string(),
                base_url,
            });
        self
    }

    /// All instances registered under a name.
    pub fn instances(&self, service_name: &str) -> &[ServiceInstance] {
        self.services
            .get(service_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct service names.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl ServiceResolver for StaticRegistry {
    fn resolve(&self, service_name: &str) -> Option<Url> {
        // Instance selection is not load balanced; the first registration wins.
        let instance = self.instances(service_name).first();
        if instance.is_none() {
            tracing::debug!(service = %service_name, "No instances registered");
        }
        instance.map(|i| i.base_url.clone())
    }
}

/// A registry snapshot that can be swapped without blocking readers.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: ArcSwap<StaticRegistry>,
}

impl SharedRegistry {
    pub fn new(registry: StaticRegistry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Replace the current snapshot.
    pub fn replace(&self, registry: StaticRegistry) {
        tracing::info!(services = registry.service_count(), "Service registry updated");
        self.current.store(Arc::new(registry));
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<StaticRegistry> {
        self.current.load_full()
    }
}

impl ServiceResolver for SharedRegistry {
    fn resolve(&self, service_name: &str) -> Option<Url> {
        self.current.load().resolve(service_name)
    }
}
