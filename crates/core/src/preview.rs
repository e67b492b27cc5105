use crate::source::SourceFile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn uri(&self) -> String {
        format!("preview:{}", self.id)
    }
}

#[derive(Debug, Default)]
pub struct PreviewStats {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl PreviewStats {
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.allocated().saturating_sub(self.released())
    }
}

#[derive(Debug)]
struct PreviewResource {
    name: String,
    bytes: Arc<[u8]>,
}

#[derive(Debug, Default)]
pub struct PreviewManager {
    next_id: u64,
    live: HashMap<u64, PreviewResource>,
    stats: Arc<PreviewStats>,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, file: &SourceFile) -> Option<PreviewHandle> {
        if !file.is_image() {
            return None;
        }

        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(
            id,
            PreviewResource {
                name: file.name.clone(),
                bytes: Arc::clone(&file.bytes),
            },
        );
        self.stats.allocated.fetch_add(1, Ordering::SeqCst);
        log::debug!("preview allocated: {} ({})", id, file.name);
        Some(PreviewHandle { id })
    }

    pub fn release(&mut self, handle: &PreviewHandle) {
        if let Some(resource) = self.live.remove(&handle.id) {
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            log::debug!("preview released: {} ({})", handle.id, resource.name);
        }
    }

    pub fn release_all(&mut self) {
        let count = self.live.len();
        if count == 0 {
            return;
        }
        self.live.clear();
        self.stats.released.fetch_add(count, Ordering::SeqCst);
        log::debug!("preview teardown released {} handle(s)", count);
    }

    pub fn bytes(&self, handle: &PreviewHandle) -> Option<&[u8]> {
        self.live.get(&handle.id).map(|resource| &*resource.bytes)
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live.contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self) -> Arc<PreviewStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for PreviewManager {
    fn drop(&mut self) {
        self.release_all();
    }
}
