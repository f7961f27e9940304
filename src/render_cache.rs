use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

/// Cache for rendered content, keyed by page or preview link. All mutation
/// goes through &mut self, so callers that share one across threads wrap it
/// in a Mutex.
pub struct RenderCache<T> {
    cache: Option<CacheMap<T>>,
}

type CacheMap<T> = HashMap<String, CacheValue<T>>;

pub enum Expire {
    Never,
    After(Duration),
}

struct CacheValue<T> {
    expire_date: DateTime<Utc>,
    value: Arc<T>,
}

impl<T> RenderCache<T> {
    pub fn new() -> Self {
        RenderCache {
            cache: Some(HashMap::new()),
        }
    }

    /// A cache that stores nothing. Lets callers keep one code path while
    /// rendering fresh on every request.
    pub fn disabled() -> Self {
        RenderCache { cache: None }
    }

    pub fn add(&mut self, key: &str, content: T, expire_after: Expire) -> Arc<T> {
        if let Some(ref mut cache) = self.cache {
            let expire_date = match expire_after {
                Expire::Never => DateTime::<Utc>::MAX_UTC,
                Expire::After(duration) => Utc::now() + duration,
            };

            let value = Arc::new(content);
            cache.insert(
                key.to_string(),
                CacheValue {
                    expire_date,
                    value: value.clone(),
                },
            );
            value
        } else {
            Arc::new(content)
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        if let Some(ref cache) = self.cache {
            if let Some(cache_value) = cache.get(key) {
                let now = Utc::now();
                if now > cache_value.expire_date {
                    return None;
                }
                return Some(cache_value.value.clone());
            }
        }
        None
    }

    /// Returns the cached value or renders it with `init` and stores the
    /// result. Render errors are never cached.
    pub fn get_or<F>(&mut self, key: &str, expire_after: Expire, init: F) -> io::Result<Arc<T>>
    where
        F: FnOnce() -> io::Result<T>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = init()?;
        Ok(self.add(key, value, expire_after))
    }
}
