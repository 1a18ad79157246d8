//! Runtime configuration for the proxy listener.

use std::path::PathBuf;

use crate::cache::CacheBacking;

/// Configuration for one running proxy instance.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the interface-facing listener binds to.
    pub interface_addr: String,
    /// Address of the remote peer dialed for each accepted connection.
    pub peer_addr: String,
    /// Where accepted connections should get their cache from.
    pub cache_backing: CacheBacking,
}

impl ProxyConfig {
    /// Builds a config from CLI-level settings, defaulting to an ephemeral
    /// cache when no directory was given.
    #[must_use]
    pub fn new(
        interface_addr: String,
        peer_addr: String,
        cache_dir: Option<PathBuf>,
        cache_size_megabytes: u64,
    ) -> Self {
        let cache_backing = match cache_dir {
            Some(root) => CacheBacking::Coss { root, size_megabytes: cache_size_megabytes },
            None => CacheBacking::Ephemeral,
        };
        Self { interface_addr, peer_addr, cache_backing }
    }
}
