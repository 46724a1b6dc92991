//! Keyed trailing-edge debouncer.
//!
//! Scheduling a job under a key cancels whatever is still waiting under that
//! key; the job runs once the key has been quiet for the whole window.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::trace;

struct Pending {
    generation: u64,
    handle: AbortHandle,
}

pub struct Debouncer<K> {
    window: Duration,
    pending: Arc<Mutex<HashMap<K, Pending>>>,
    next_generation: Mutex<u64>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Mutex::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `job` after the quiet window, replacing any job still waiting
    /// under `key`. Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: K, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = {
            let mut next = self.next_generation.lock();
            *next += 1;
            *next
        };

        let window = self.window;
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();

        // Hold the map lock across spawn so the task cannot fire and look
        // itself up before it has been registered.
        let mut map = self.pending.lock();
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            // Deregister before running so a later schedule no longer aborts us
            {
                let mut map = pending.lock();
                match map.get(&task_key) {
                    Some(entry) if entry.generation == generation => {
                        map.remove(&task_key);
                    }
                    _ => return,
                }
            }

            trace!(key = ?task_key, "debounce window elapsed");
            job.await;
        });

        if let Some(previous) = map.insert(
            key.clone(),
            Pending {
                generation,
                handle: task.abort_handle(),
            },
        ) {
            trace!(key = ?key, "superseding pending debounced job");
            previous.handle.abort();
        }
    }

    /// Drop the job waiting under `key`, if any. Returns whether one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending.lock().remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }
}
