use anyhow::{Context, Result};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task);
}

struct PendingTask {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct VirtualState {
    now: Duration,
    next_seq: u64,
    queue: Vec<PendingTask>,
}

/// Manual clock. Tasks only run inside [`VirtualScheduler::advance`].
#[derive(Default)]
pub struct VirtualScheduler {
    state: Mutex<VirtualState>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    // Due tasks run in (due, submission) order.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut ran = 0usize;

        loop {
            let next = {
                let mut state = self.lock();
                let position = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, pending)| pending.due <= target)
                    .min_by_key(|(_, pending)| (pending.due, pending.seq))
                    .map(|(position, _)| position);
                match position {
                    Some(position) => {
                        let pending = state.queue.swap_remove(position);
                        state.now = pending.due;
                        Some(pending.task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }

        ran
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.lock();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(PendingTask { due, seq, task });
    }
}

pub struct TokioScheduler {
    handle: Handle,
    spawned: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            spawned: Mutex::new(Vec::new()),
        }
    }

    pub fn from_current() -> Result<Self> {
        let handle = Handle::try_current().context("tokioランタイムの外では実行できません")?;
        Ok(Self::new(handle))
    }

    pub fn pending(&self) -> usize {
        self.lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub async fn wait_idle(&self) {
        let spawned = std::mem::take(&mut *self.lock());
        for handle in spawned {
            if let Err(err) = handle.await {
                log::warn!("scheduled task ended abnormally: {err}");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.spawned.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        // Tasks may do file I/O, so they run on the blocking pool.
        let handle = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = tokio::task::spawn_blocking(task).await {
                log::warn!("scheduled task ended abnormally: {err}");
            }
        });
        let mut spawned = self.lock();
        spawned.retain(|handle| !handle.is_finished());
        spawned.push(handle);
    }
}
