//! Cache configuration

use serde::{Deserialize, Serialize};

/// Default entry lifetime: 30 days
pub const DEFAULT_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "rendercache";

/// Cache behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Key namespace, prepended to every store key. Lets several caches
    /// share one backing store.
    pub namespace: String,
    /// Entry lifetime applied when `store` is called without an explicit TTL
    pub default_ttl_seconds: u64,
    /// Propagate store failures during lookups instead of treating them as
    /// misses. The fail-open default keeps the rendering pipeline available
    /// when the store is down; deployments that prefer correctness over
    /// availability flip this on.
    pub fail_closed: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            fail_closed: false,
        }
    }
}
