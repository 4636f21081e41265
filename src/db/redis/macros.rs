/// Read-through caching for fallible async lookups.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write with `$ttl` seconds to live, and returns it.
/// A failed cache read is logged and treated as a miss; errors from the block
/// propagate with `?`.
///
/// The expansion evaluates to a `Result`, so it is meant to be the tail
/// expression of a function returning `AppResult<T>`:
///
/// ```rust,ignore
/// async fn lookup(&self, title: &str) -> AppResult<MovieInfo> {
///     let key = CacheKey::MovieLookup(title.to_string());
///     cached!(self.cache, key, LOOKUP_CACHE_TTL, self.fetch(title))
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(cached)
            }
            read => {
                if let Err(e) = read {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
