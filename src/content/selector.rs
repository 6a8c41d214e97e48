use super::catalog::Catalog;
use super::models::ContentItem;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Format used for `ContentItem::captured_at`.
pub const CAPTURED_AT_FORMAT: &str = "%H:%M:%S";

/// Source of the wall-clock label stamped on each selected item.
pub trait Clock: Send + Sync {
    fn now_label(&self) -> String;
}

/// Local time of day, `HH:MM:SS`.
pub struct LocalClock;

impl Clock for LocalClock {
    fn now_label(&self) -> String {
        chrono::Local::now().format(CAPTURED_AT_FORMAT).to_string()
    }
}

/// Always returns the same label.
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now_label(&self) -> String {
        self.0.clone()
    }
}

/// Picks one catalog entry uniformly at random per call.
pub struct ContentSelector {
    catalog: Catalog,
    rng: Mutex<Box<dyn RngCore + Send>>,
    clock: Box<dyn Clock>,
}

impl ContentSelector {
    /// Selector over `catalog` using an OS-seeded generator and local time.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rng: Mutex::new(Box::new(StdRng::from_os_rng())),
            clock: Box::new(LocalClock),
        }
    }

    /// Replace the randomness source, e.g. with a seeded `StdRng`.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Index in `[0, catalog.len())`.
    pub fn pick_index(&self) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..self.catalog.len())
    }

    pub fn select(&self) -> ContentItem {
        let index = self.pick_index();
        // Catalog is never empty and pick_index stays in range.
        let entry = &self.catalog.entries()[index];
        ContentItem {
            title: entry.title.clone(),
            description: entry.description.clone(),
            captured_at: self.clock.now_label(),
        }
    }
}
