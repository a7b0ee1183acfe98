use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use tokio::sync::watch;

type Settled<T> = Option<Result<T>>;

/// Collapses concurrent requests for the same key into one execution.
///
/// The first caller for a key (the leader) runs the factory; everyone who
/// arrives while it is pending waits on the leader's result and receives a
/// clone of it, success or failure. The registration is removed when the
/// leader settles or is dropped, so the next call after that starts fresh.
pub struct SingleFlight<K, T> {
    flights: Mutex<HashMap<K, watch::Receiver<Settled<T>>>>,
}

enum Role<T> {
    Leader(watch::Sender<Settled<T>>),
    Follower(watch::Receiver<Settled<T>>),
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Display,
    T: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    pub async fn run<F, Fut>(&self, key: K, factory: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let role = {
            let mut flights = self.lock();
            match flights.get(&key) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    flights.insert(key.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => {
                log::debug!("Waiting for in-flight request '{key}'");
                let settled = rx.wait_for(Option::is_some).await.map(|value| value.clone());
                match settled {
                    Ok(Some(result)) => result,
                    _ => Err(EngineError::Abandoned(key.to_string())),
                }
            }
            Role::Leader(tx) => {
                let _registration = Registration {
                    flights: &self.flights,
                    key: key.clone(),
                };
                let result = factory().await;
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, watch::Receiver<Settled<T>>>> {
        self.flights
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Removes the leader's registration on every exit path, including the
/// leader future being dropped mid-flight.
struct Registration<'a, K: Eq + Hash, T> {
    flights: &'a Mutex<HashMap<K, watch::Receiver<Settled<T>>>>,
    key: K,
}

impl<K: Eq + Hash, T> Drop for Registration<'_, K, T> {
    fn drop(&mut self) {
        self.flights
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let flights: SingleFlight<&'static str, u32> = SingleFlight::new();
        let runs = AtomicUsize::new(0);
        let counter = &runs;
        let factory = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(42)
        };

        let (a, b, c) = tokio::join!(
            flights.run("mashup", factory),
            flights.run("mashup", factory),
            flights.run("mashup", factory),
        );

        assert_eq!((a, b, c), (Ok(42), Ok(42), Ok(42)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn failures_are_shared_and_cleared() {
        let flights: SingleFlight<&'static str, u32> = SingleFlight::new();
        let failing = || async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(EngineError::Transport("offline".to_string()))
        };

        let (a, b) = tokio::join!(flights.run("k", failing), flights.run("k", failing));
        assert_eq!(a, Err(EngineError::Transport("offline".to_string())));
        assert_eq!(a, b);
        assert!(!flights.is_in_flight(&"k"));

        let next = flights.run("k", || async { Ok(7) }).await;
        assert_eq!(next, Ok(7));
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let flights: SingleFlight<String, usize> = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let make = |value: usize| {
            let runs = runs.clone();
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(value)
            }
        };

        let (easy, hard) = tokio::join!(
            flights.run("Easy".to_string(), make(1)),
            flights.run("Hard".to_string(), make(2)),
        );
        assert_eq!((easy, hard), (Ok(1), Ok(2)));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropped_leader_releases_waiters() {
        let flights: Arc<SingleFlight<&'static str, u32>> = Arc::new(SingleFlight::new());

        let leader = {
            let flights = flights.clone();
            tokio::spawn(async move {
                flights
                    .run("slow", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        while !flights.is_in_flight(&"slow") {
            tokio::task::yield_now().await;
        }

        let follower = {
            let flights = flights.clone();
            tokio::spawn(async move { flights.run("slow", || async { Ok(2) }).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        leader.abort();

        let result = follower.await.expect("follower task");
        assert_eq!(result, Err(EngineError::Abandoned("slow".to_string())));
        assert!(!flights.is_in_flight(&"slow"));
    }
}
