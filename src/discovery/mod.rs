//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! [[services]] config entries
//!     → registry.rs (group instances by service name)
//!     → SharedRegistry (atomically swappable snapshot)
//!     → ServiceResolver::resolve(name) → base URL or None
//! ```
//!
//! # Design Decisions
//! - Resolution is a read-only lookup against an immutable snapshot
//! - A name with no instances resolves to None; callers decide severity
//! - Config reload replaces the whole snapshot, never mutates it in place

pub mod registry;

pub use registry::{ServiceInstance, SharedRegistry, StaticRegistry};

use url::Url;

/// Capability to turn a logical service name into a network address.
pub trait ServiceResolver: Send + Sync {
    /// Resolve a service name to the base URL of one of its instances.
    fn resolve(&self, service_name: &str) -> Option<Url>;
}

/// Parse a registry address into a base URL.
///
/// Accepts `host:port` (assumed plain HTTP) or a full `http`/`https` URL.
pub fn parse_address(address: &str) -> Option<Url> {
    let address = address.trim();
    if address.contains("://") {
        let url = Url::parse(address).ok()?;
        return match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Some(url),
            _ => None,
        };
    }

    let url = Url::parse(&format!("http://{}", address)).ok()?;
    // a bare name without a port is almost always a typo in the registry
    match (url.host_str(), url.path()) {
        (Some(_), "/") if address.contains(':') => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let url = parse_address("127.0.0.1:8081").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8081/");
    }

    #[test]
    fn test_parse_full_url() {
        let url = parse_address("https://members.internal").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("members.internal"));
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(parse_address("ftp://files.internal").is_none());
        assert!(parse_address("members.internal").is_none());
        assert!(parse_address("").is_none());
        assert!(parse_address("host:port").is_none());
    }
}
