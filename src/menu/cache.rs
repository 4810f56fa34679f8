use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::consolidated::ConsolidatedMenu;
use super::source::MenuSource;
use crate::error::SourceError;

/// One fetched copy of the menu.
#[derive(Debug)]
pub struct Snapshot {
    pub menu: ConsolidatedMenu,
    pub fetched_at: Instant,
}

/// TTL cache in front of a [`MenuSource`].
///
/// Readers always get a whole snapshot. At most one refresh runs at a time;
/// while it does, and whenever it fails, readers keep getting the last good
/// snapshot. Only a cache that has never loaded reports the source error.
pub struct MenuCache {
    source: Box<dyn MenuSource>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    refresh: Mutex<()>,
}

impl MenuCache {
    pub fn new(source: Box<dyn MenuSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &dyn MenuSource {
        self.source.as_ref()
    }

    pub fn get(&self) -> Result<Arc<Snapshot>, SourceError> {
        let Some(current) = self.current() else {
            return self.load_cold();
        };
        if self.is_fresh(&current) {
            return Ok(current);
        }

        let Some(_guard) = self.refresh.try_lock() else {
            debug!("menu refresh in flight, serving last snapshot");
            return Ok(current);
        };
        // Someone may have refreshed between our read and the lock.
        if let Some(latest) = self.current().filter(|s| self.is_fresh(s)) {
            return Ok(latest);
        }

        match self.fetch_and_store() {
            Ok(fresh) => Ok(fresh),
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    age_secs = current.fetched_at.elapsed().as_secs(),
                    "menu refresh failed, serving stale snapshot"
                );
                Ok(current)
            }
        }
    }

    fn load_cold(&self) -> Result<Arc<Snapshot>, SourceError> {
        let _guard = self.refresh.lock();
        if let Some(loaded) = self.current() {
            return Ok(loaded);
        }
        self.fetch_and_store()
    }

    fn fetch_and_store(&self) -> Result<Arc<Snapshot>, SourceError> {
        let menu = self.source.fetch()?;
        let snapshot = Arc::new(Snapshot {
            menu,
            fetched_at: Instant::now(),
        });
        *self.snapshot.write() = Some(Arc::clone(&snapshot));
        info!(
            source = %self.source.describe(),
            halls = snapshot.menu.dining_halls.len(),
            "menu snapshot refreshed"
        );
        Ok(snapshot)
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        snapshot.fetched_at.elapsed() < self.ttl
    }
}
