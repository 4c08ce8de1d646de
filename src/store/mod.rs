//! Live alert reconciliation store
//!
//! In-memory table holding the single canonical current alert per location.
//! Mutated only by the ingestion dispatcher; read by any number of snapshot
//! consumers. Entries are never deleted.

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{AlertPoint, AlertPreference};

/// Identity key for a live alert entry.
///
/// Compares the raw IEEE-754 bit patterns of the delivered coordinates, so
/// `10.0` and `10.0000001` are distinct entries, as are `0.0` and `-0.0`.
/// No geographic tolerance or quantization is applied; two feeds reporting
/// the same physical location at different precision produce two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey {
    lat_bits: u64,
    lon_bits: u64,
}

impl LocationKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_bits: lat.to_bits(),
            lon_bits: lon.to_bits(),
        }
    }

    pub fn of(point: &AlertPoint) -> Self {
        Self::new(point.lat, point.lon)
    }

    pub fn lat(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }

    pub fn lon(&self) -> f64 {
        f64::from_bits(self.lon_bits)
    }
}

/// Last-write-wins table of live alerts, one entry per location key.
///
/// Backed by a sharded concurrent map: each upsert is atomic with respect to
/// any concurrent snapshot, so readers never observe a half-applied update.
pub struct LiveStore {
    points: DashMap<LocationKey, AlertPoint>,
    /// Change generation, bumped after every applied upsert
    generation: watch::Sender<u64>,
}

impl LiveStore {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            points: DashMap::new(),
            generation,
        }
    }

    /// Apply one alert event: replace the entry for its location wholesale,
    /// or insert a new one. Returns the replaced entry, if any.
    pub fn upsert(&self, point: AlertPoint) -> Option<AlertPoint> {
        let key = LocationKey::of(&point);
        let replaced = self.points.insert(key, point);
        self.generation.send_modify(|g| *g += 1);
        replaced
    }

    /// Current alert for one location key
    pub fn get(&self, key: &LocationKey) -> Option<AlertPoint> {
        self.points.get(key).map(|entry| entry.value().clone())
    }

    /// Point-in-time view of every live alert. Iteration order is not
    /// meaningful; only key uniqueness is guaranteed.
    pub fn snapshot(&self) -> Vec<AlertPoint> {
        self.points.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot restricted to alerts passing the user's filtering rules
    pub fn snapshot_filtered(&self, prefs: &AlertPreference) -> Vec<AlertPoint> {
        self.points
            .iter()
            .filter(|entry| prefs.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Subscribe to the change generation. The value increases after every
    /// upsert, letting consumers wake on change instead of polling.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Get stats about the store
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_points: self.points.len(),
            generation: *self.generation.borrow(),
        }
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the live store
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_points: usize,
    pub generation: u64,
}
