//! Per-key deduplication of concurrent work.
//!
//! The first caller for a key starts the work; every caller arriving while it
//! runs awaits the same shared future and receives a clone of its outcome.
//! The registry only keeps weak handles, so an entry disappears as soon as the
//! work finishes (either way) or every waiter has gone away.

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Flight<T, E> = BoxFuture<'static, Result<T, E>>;

struct Entry<T, E> {
    id: u64,
    handle: WeakShared<Flight<T, E>>,
}

type Registry<T, E> = Arc<Mutex<HashMap<String, Entry<T, E>>>>;

fn lock<T, E>(registry: &Registry<T, E>) -> MutexGuard<'_, HashMap<String, Entry<T, E>>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes its registry entry when the flight's future is dropped.
///
/// The future is dropped when it completes or when the last waiter is
/// dropped, which covers success, failure, and cancellation alike.
struct FlightGuard<T, E> {
    registry: Registry<T, E>,
    key: String,
    id: u64,
}

impl<T, E> Drop for FlightGuard<T, E> {
    fn drop(&mut self) {
        let mut flights = lock(&self.registry);
        // A newer flight may already own the key.
        if flights.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            flights.remove(&self.key);
        }
    }
}

/// Registry of in-flight work keyed by string.
pub struct SingleFlight<T, E> {
    flights: Registry<T, E>,
    next_id: AtomicU64,
}

impl<T, E> Default for SingleFlight<T, E> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key`, or join the flight already running for it.
    ///
    /// `work` is only invoked when no live flight exists for `key`.
    pub async fn run<W, Fut>(&self, key: &str, work: W) -> Result<T, E>
    where
        W: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let flight = {
            let mut flights = lock(&self.flights);
            match flights.get(key).and_then(|entry| entry.handle.upgrade()) {
                Some(existing) => existing,
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let guard = FlightGuard {
                        registry: Arc::clone(&self.flights),
                        key: key.to_string(),
                        id,
                    };
                    let fut = work();
                    let shared: Shared<Flight<T, E>> = async move {
                        let _guard = guard;
                        fut.await
                    }
                    .boxed()
                    .shared();

                    if let Some(handle) = shared.downgrade() {
                        flights.insert(key.to_string(), Entry { id, handle });
                    }
                    shared
                }
            }
        };

        flight.await
    }

    /// Number of keys with live flights.
    pub fn in_flight(&self) -> usize {
        lock(&self.flights).len()
    }
}
