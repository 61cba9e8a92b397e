use anyhow::Result;
use log::{error, info};

/// Tracks batches of resource loads and reports them through the log.
///
/// A batch starts with the first item queued while nothing is pending and
/// completes when every queued item has either loaded or failed. Failures
/// never abort the batch.
#[derive(Debug, Default)]
pub struct LoadingManager {
    loaded: usize,
    failed: usize,
    total: usize,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.loaded + self.failed, self.total)
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_idle(&self) -> bool {
        self.loaded + self.failed == self.total
    }

    pub fn load<T>(&mut self, name: &str, load: impl FnOnce() -> Result<T>) -> Option<T> {
        self.item_start(name);
        match load() {
            Ok(value) => {
                self.item_end(name);
                Some(value)
            }
            Err(err) => {
                self.item_error(name, &err);
                None
            }
        }
    }

    pub fn item_start(&mut self, name: &str) {
        if self.is_idle() {
            self.loaded = 0;
            self.failed = 0;
            self.total = 0;
        }
        self.total += 1;
        let (finished, total) = self.progress();
        if self.total == 1 {
            info!("started loading {name} ({finished}/{total})");
        }
    }

    pub fn item_end(&mut self, name: &str) {
        self.loaded += 1;
        let (finished, total) = self.progress();
        info!("loaded {name} ({finished}/{total})");
        self.finish_if_done();
    }

    pub fn item_error(&mut self, name: &str, err: &anyhow::Error) {
        self.failed += 1;
        error!("failed to load {name}: {err:?}");
        self.finish_if_done();
    }

    fn finish_if_done(&self) {
        if self.is_idle() {
            info!(
                "loading complete: {} loaded, {} failed",
                self.loaded, self.failed
            );
        }
    }
}
