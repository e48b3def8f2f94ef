//! Seeds the cache from a snapshot file at startup.
//!
//! The loader is fail-open: a missing, unreadable or malformed snapshot is
//! logged and the server starts with an empty cache. Only the first database
//! section is surfaced; any further sections are parsed but discarded.

use std::collections::HashMap;

use jiff::Timestamp;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheEntry};
use crate::config::Config;
use crate::rdb::parser::{parse_rdb, RdbEntry};

/// Builds the startup cache, reading the snapshot named by the config when
/// one is configured.
pub async fn load_cache(config: &Config) -> Cache {
    let Some(path) = config.rdb_path() else {
        return Cache::new();
    };

    info!(path = %path.display(), "reading RDB snapshot");

    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(error) => {
            warn!(
                %error,
                path = %path.display(),
                "unable to read RDB snapshot, starting with an empty cache"
            );
            return Cache::new();
        }
    };

    let rdb = match parse_rdb(&contents) {
        Ok(rdb) => rdb,
        Err(error) => {
            warn!(
                %error,
                path = %path.display(),
                "malformed RDB snapshot, starting with an empty cache"
            );
            return Cache::new();
        }
    };

    let mut sections = rdb.database_sections;
    if sections.len() > 1 {
        warn!(
            count = sections.len(),
            "snapshot holds multiple database sections, only the first is loaded"
        );
    }
    let Some(section) = sections.drain(..).next() else {
        warn!("snapshot holds no database sections, starting with an empty cache");
        return Cache::new();
    };

    let now = Timestamp::now();
    let mut entries = HashMap::with_capacity(section.entries.len());

    for (key, RdbEntry { value, expires_at }) in section.entries {
        let expiry = match expires_at {
            Some(deadline) => match monotonic_deadline(deadline, now) {
                Some(instant) => Some(instant),
                None => {
                    debug!(
                        key = %String::from_utf8_lossy(&key),
                        "dropping key that expired before startup"
                    );
                    continue;
                }
            },
            None => None,
        };
        entries.insert(key, CacheEntry { value, expiry });
    }

    info!(keys = entries.len(), "cache seeded from snapshot");
    Cache::from_entries(entries)
}

/// Converts an absolute Unix deadline into the monotonic clock by offsetting
/// from now, so later wall-clock jumps cannot affect expiry. Returns `None`
/// for deadlines that have already passed.
fn monotonic_deadline(deadline: Timestamp, now: Timestamp) -> Option<Instant> {
    let remaining = deadline.duration_since(now);
    if remaining.is_negative() || remaining.is_zero() {
        return None;
    }
    Some(Instant::now() + remaining.unsigned_abs())
}
