use std::collections::HashMap;
use std::ffi::OsString;

use anyhow::Result;
use async_trait::async_trait;
use intent_router::CapabilityProbe;
use parking_lot::Mutex;
use tracing::trace;

const CACHE_CAPACITY: usize = 256;

/// Answers "is this token an executable on PATH?" using `which`.
///
/// Lookups run on the blocking pool. Answers are cached per PATH value; the
/// cache is dropped when PATH changes or when it reaches capacity.
pub struct PathProbe {
    enabled: bool,
    cache: Mutex<LookupCache>,
}

impl PathProbe {
    pub fn new() -> Self {
        Self { enabled: true, cache: Mutex::new(LookupCache::new(CACHE_CAPACITY)) }
    }

    pub fn disabled() -> Self {
        Self { enabled: false, cache: Mutex::new(LookupCache::new(CACHE_CAPACITY)) }
    }

    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::new()
        } else {
            Self::disabled()
        }
    }
}

impl Default for PathProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProbe for PathProbe {
    async fn resolves(&self, token: &str) -> Result<bool> {
        // Explicit paths are the rule table's business.
        if token.is_empty() || token.contains(['/', '\\']) {
            return Ok(false);
        }
        let path = std::env::var_os("PATH");
        if let Some(hit) = self.cache.lock().get(path.as_ref(), token) {
            return Ok(hit);
        }

        let name = token.to_string();
        let found = tokio::task::spawn_blocking(move || which::which(name).is_ok()).await?;
        trace!(token, found, "PATH lookup");
        self.cache.lock().insert(path, token, found);
        Ok(found)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Lookup answers valid for one PATH value.
struct LookupCache {
    capacity: usize,
    path: Option<OsString>,
    entries: HashMap<String, bool>,
}

impl LookupCache {
    fn new(capacity: usize) -> Self {
        Self { capacity, path: None, entries: HashMap::new() }
    }

    fn get(&mut self, path: Option<&OsString>, token: &str) -> Option<bool> {
        if self.path.as_ref() != path {
            self.entries.clear();
            self.path = path.cloned();
            return None;
        }
        self.entries.get(token).copied()
    }

    fn insert(&mut self, path: Option<OsString>, token: &str, found: bool) {
        if self.path != path {
            self.entries.clear();
            self.path = path;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(token) {
            trace!(capacity = self.capacity, "PATH lookup cache full; clearing");
            self.entries.clear();
        }
        self.entries.insert(token.to_string(), found);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(value: &str) -> Option<OsString> {
        Some(OsString::from(value))
    }

    #[test]
    fn cache_stays_within_capacity() {
        let mut cache = LookupCache::new(4);
        for i in 0..50 {
            cache.insert(path("/usr/bin"), &format!("tool-{}", i), false);
            assert!(cache.len() <= 4);
        }
        assert_eq!(cache.get(path("/usr/bin").as_ref(), "tool-49"), Some(false));
    }

    #[test]
    fn cache_is_dropped_when_path_changes() {
        let mut cache = LookupCache::new(4);
        cache.insert(path("/usr/bin"), "fresh-tool", false);
        assert_eq!(cache.get(path("/usr/bin").as_ref(), "fresh-tool"), Some(false));

        // The tool was installed into a new directory and PATH was extended.
        assert_eq!(cache.get(path("/usr/bin:/opt/tools").as_ref(), "fresh-tool"), None);
        assert_eq!(cache.len(), 0);

        cache.insert(path("/usr/bin:/opt/tools"), "fresh-tool", true);
        assert_eq!(cache.get(path("/usr/bin:/opt/tools").as_ref(), "fresh-tool"), Some(true));
        assert_eq!(cache.get(None, "fresh-tool"), None);
    }

    #[tokio::test]
    async fn repeated_lookups_do_not_grow_the_cache() {
        let probe = PathProbe::new();
        for _ in 0..3 {
            probe.resolves("definitely-not-a-real-binary-7f3a").await.unwrap();
        }
        assert_eq!(probe.cache.lock().len(), 1);
    }
}
