//! # Observable Values
//!
//! A "current value + subscribe" primitive shared by the auth state stream and
//! the view-model's UI state.
//!
//! ## Overview
//!
//! An [`Observable`] holds one value and a registry of observers. Every
//! observer receives the current value once, synchronously, at subscription
//! time and then every subsequent value until its [`Subscription`] is
//! cancelled. Any number of observers may coexist; cancelling one leaves the
//! others untouched, and cancelling twice is a no-op.
//!
//! The owner keeps the writable [`Observable`]; consumers get a
//! [`ReadOnlyObservable`] that can read and subscribe but never publish.
//!
//! ```text
//!              set()               ┌──────────────┐   callback   ┌──────────┐
//!  owner  ─────────────────────────> Observable   ├─────────────>│ observer │
//!                                  │  (value +    │              └──────────┘
//!                                  │   registry)  │   watch()    ┌──────────┐
//!                                  │              ├─────────────>│ async    │
//!                                  └──────────────┘              │ consumer │
//!                                                                └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::observable::Observable;
//! use std::sync::{Arc, Mutex};
//!
//! let counter = Observable::new(0u32);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let subscription = counter.subscribe(move |value| sink.lock().unwrap().push(*value));
//!
//! counter.set(1);
//! subscription.cancel();
//! counter.set(2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
//! ```
//!
//! ## Ordering
//!
//! Every observer sees values in publication order, even when several threads
//! publish at once. Publications are queued under the registry lock and
//! delivered by one thread at a time: the first publisher to find the queue
//! idle drains it, and publishers arriving meanwhile return after enqueuing.
//! A callback that publishes to its own observable is therefore delivered
//! after the current value, never nested inside it.
//!
//! Callbacks run outside the registry lock, so an observer may subscribe,
//! cancel, read or publish from inside its callback. The synchronous
//! first-value delivery of [`Observable::subscribe`] holds whenever no other
//! thread is draining; otherwise that thread delivers it in order.

use futures::stream::{self, Stream};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

type Callback<T> = dyn Fn(&T) + Send + Sync;

struct Observer<T> {
    active: Arc<AtomicBool>,
    callback: Box<Callback<T>>,
}

/// A value waiting to be handed to the observers registered when it was
/// published.
struct Delivery<T> {
    value: T,
    observers: Vec<Arc<Observer<T>>>,
}

struct Registry<T> {
    next_id: u64,
    observers: BTreeMap<u64, Arc<Observer<T>>>,
    pending: VecDeque<Delivery<T>>,
    draining: bool,
}

impl<T> Registry<T> {
    /// Queue a delivery. Returns true if the caller must drain the queue.
    fn enqueue(&mut self, delivery: Delivery<T>) -> bool {
        self.pending.push_back(delivery);
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }
}

struct Shared<T> {
    registry: Mutex<Registry<T>>,
    value: watch::Sender<T>,
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Registry<T>> {
        // A panicking observer never runs under this lock, so the data is
        // still consistent if poisoning ever happens.
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn get(&self) -> T {
        self.value.borrow().clone()
    }

    fn subscribe(self: &Arc<Self>, callback: Box<Callback<T>>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let observer = Arc::new(Observer {
            active: Arc::clone(&active),
            callback,
        });

        let (id, must_drain) = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.insert(id, Arc::clone(&observer));
            let must_drain = registry.enqueue(Delivery {
                value: self.get(),
                observers: vec![observer],
            });
            (id, must_drain)
        };

        if must_drain {
            self.drain();
        }

        let owner: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        Subscription {
            id,
            active,
            owner,
            detached: false,
        }
    }

    fn publish(&self, value: T) {
        let must_drain = {
            let mut registry = self.lock();
            self.value.send_replace(value.clone());
            let observers = registry.observers.values().cloned().collect();
            registry.enqueue(Delivery { value, observers })
        };

        if must_drain {
            self.drain();
        }
    }

    /// Deliver queued values until the queue is empty. Only one thread drains
    /// at a time.
    fn drain(&self) {
        let guard = DrainGuard { shared: self };

        loop {
            let delivery = {
                let mut registry = self.lock();
                match registry.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        registry.draining = false;
                        break;
                    }
                }
            };

            for observer in delivery.observers {
                if observer.active.load(Ordering::Acquire) {
                    (observer.callback)(&delivery.value);
                }
            }
        }

        // The drain role was already released under the lock above
        std::mem::forget(guard);
    }

    fn subscriber_count(&self) -> usize {
        self.lock().observers.len()
    }
}

/// Hands the drain role back if an observer panics mid-delivery, so later
/// publications are still delivered.
struct DrainGuard<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        let mut registry = self.shared.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.draining = false;
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T> Detach for Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn detach(&self, id: u64) {
        self.lock().observers.remove(&id);
    }
}

/// Writable observable value.
///
/// Cloning yields another handle to the same value; use
/// [`read_only`](Observable::read_only) to hand out a handle that cannot
/// publish.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry {
                    next_id: 0,
                    observers: BTreeMap::new(),
                    pending: VecDeque::new(),
                    draining: false,
                }),
                value,
            }),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.shared.get()
    }

    /// Replace the value and notify every active observer.
    pub fn set(&self, value: T) {
        self.shared.publish(value);
    }

    /// Derive the next value from the current one and publish it.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.shared.get());
        self.shared.publish(next);
    }

    /// Register an observer. It is called with the current value before this
    /// method returns.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.subscribe(Box::new(on_change))
    }

    /// Receiver for async consumers; starts at the current value.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.shared.value.subscribe()
    }

    /// Stream of snapshots, beginning with the current value.
    ///
    /// Intermediate values may be skipped if the consumer is slower than the
    /// publisher; the latest value is always delivered.
    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        snapshot_stream(self.watch())
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }

    pub fn read_only(&self) -> ReadOnlyObservable<T> {
        ReadOnlyObservable {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Observable<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.shared.value.borrow())
            .finish()
    }
}

/// Subscribe-only view of an [`Observable`].
pub struct ReadOnlyObservable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ReadOnlyObservable<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.shared.get()
    }

    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.subscribe(Box::new(on_change))
    }

    pub fn watch(&self) -> watch::Receiver<T> {
        self.shared.value.subscribe()
    }

    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        snapshot_stream(self.watch())
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }
}

impl<T> Clone for ReadOnlyObservable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ReadOnlyObservable<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyObservable")
            .field("value", &*self.shared.value.borrow())
            .finish()
    }
}

fn snapshot_stream<T>(receiver: watch::Receiver<T>) -> impl Stream<Item = T> + Send + 'static
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let value = receiver.borrow_and_update().clone();
        Some((value, (receiver, false)))
    })
}

/// Handle to an active observer registration.
///
/// Dropping the handle cancels the subscription. Call
/// [`detach`](Subscription::detach) to keep the observer for the lifetime of
/// the observable instead.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    owner: Weak<dyn Detach>,
    detached: bool,
}

impl Subscription {
    /// Stop receiving values. Safe to call any number of times.
    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(owner) = self.owner.upgrade() {
                owner.detach(self.id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Leave the observer registered until the observable itself is dropped.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: &T| sink.lock().unwrap().push(value.clone()))
    }

    #[test]
    fn test_subscribe_delivers_current_value_first() {
        let observable = Observable::new("initial".to_string());
        observable.set("current".to_string());

        let (seen, callback) = recorder();
        let _sub = observable.subscribe(callback);

        assert_eq!(*seen.lock().unwrap(), vec!["current".to_string()]);
    }

    #[test]
    fn test_subscriber_receives_every_change_in_order() {
        let observable = Observable::new(0);
        let (seen, callback) = recorder();
        let _sub = observable.subscribe(callback);

        for i in 1..=3 {
            observable.set(i);
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(observable.get(), 3);
    }

    #[test]
    fn test_cancel_stops_delivery_and_is_idempotent() {
        let observable = Observable::new(0);
        let (seen, callback) = recorder();
        let sub = observable.subscribe(callback);

        observable.set(1);
        sub.cancel();
        sub.cancel();
        observable.set(2);

        assert!(!sub.is_active());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
        assert_eq!(observable.subscriber_count(), 0);
    }

    #[test]
    fn test_cancelling_one_subscriber_leaves_others() {
        let observable = Observable::new(0);
        let (first_seen, first) = recorder();
        let (second_seen, second) = recorder();
        let first_sub = observable.subscribe(first);
        let _second_sub = observable.subscribe(second);
        assert_eq!(observable.subscriber_count(), 2);

        first_sub.cancel();
        observable.set(7);

        assert_eq!(*first_seen.lock().unwrap(), vec![0]);
        assert_eq!(*second_seen.lock().unwrap(), vec![0, 7]);
        assert_eq!(observable.subscriber_count(), 1);
    }

    #[test]
    fn test_drop_cancels_but_detach_keeps() {
        let observable = Observable::new(0);
        let (dropped_seen, dropped) = recorder();
        let (detached_seen, detached) = recorder();

        drop(observable.subscribe(dropped));
        observable.subscribe(detached).detach();
        observable.set(1);

        assert_eq!(*dropped_seen.lock().unwrap(), vec![0]);
        assert_eq!(*detached_seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_cancel_after_observable_dropped() {
        let observable = Observable::new(0);
        let sub = observable.subscribe(|_| {});
        drop(observable);

        sub.cancel();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_callback_may_reenter_observable() {
        let observable = Observable::new(0);
        let reader = observable.read_only();
        let (seen, callback) = recorder();
        let _sub = observable.subscribe(move |value| {
            // Reading and subscribing from inside a callback must not deadlock.
            assert_eq!(reader.get(), *value);
            reader.subscribe(|_| {}).cancel();
            callback(value);
        });

        observable.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 5]);
    }

    #[test]
    fn test_concurrent_publishers_deliver_in_order() {
        use std::sync::Barrier;
        use std::thread;

        let observable = Observable::new(0);
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let (entered_cb, release_cb) = (Arc::clone(&entered), Arc::clone(&release));
        let _slow = observable.subscribe(move |value: &i32| {
            if *value == 1 {
                entered_cb.wait();
                release_cb.wait();
            }
        });
        let (seen, callback) = recorder();
        let _sub = observable.subscribe(callback);

        let first = observable.clone();
        let publisher = thread::spawn(move || first.set(1));
        entered.wait();

        // Queued behind the delivery of 1, so this returns without blocking
        observable.set(2);
        assert_eq!(observable.get(), 2);

        release.wait();
        publisher.join().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_publish_from_callback_is_delivered_after_current() {
        let observable = Observable::new(0);
        let publisher = observable.clone();
        let _bump = observable.subscribe(move |value: &i32| {
            if *value == 1 {
                publisher.set(2);
            }
        });
        let (seen, callback) = recorder();
        let _sub = observable.subscribe(callback);

        observable.set(1);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(observable.get(), 2);
    }

    #[test]
    fn test_panicking_observer_does_not_stall_delivery() {
        let observable = Observable::new(0);
        let _faulty = observable.subscribe(|value: &i32| {
            if *value == 1 {
                panic!("observer failed");
            }
        });
        let (seen, callback) = recorder();
        let _sub = observable.subscribe(callback);

        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observable.set(1)));
        assert!(outcome.is_err());

        observable.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_update_derives_from_current() {
        let observable = Observable::new(10);
        observable.update(|v| v + 5);
        assert_eq!(observable.get(), 15);
    }

    #[test]
    fn test_read_only_view_tracks_owner() {
        let observable = Observable::new(1);
        let reader = observable.read_only();
        let (seen, callback) = recorder();
        let _sub = reader.subscribe(callback);

        observable.set(2);

        assert_eq!(reader.get(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(reader.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_watch_receiver_sees_latest_value() {
        let observable = Observable::new(0);
        let mut receiver = observable.watch();
        assert_eq!(*receiver.borrow(), 0);

        observable.set(3);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), 3);
    }

    #[tokio::test]
    async fn test_stream_starts_with_current_value() {
        let observable = Observable::new(1);
        let mut stream = Box::pin(observable.stream());

        assert_eq!(stream.next().await, Some(1));
        observable.set(2);
        assert_eq!(stream.next().await, Some(2));

        drop(observable);
        assert_eq!(stream.next().await, None);
    }
}
