//! Observable value container.
//!
//! `Writable<T>` holds one value and a list of subscribers. Every write
//! notifies each subscriber registered at the time of the write exactly
//! once, in registration order, before the write returns.
//!
//! Notifications go through a queue in write order and only one thread
//! delivers at a time, so the last value a subscriber sees is the store's
//! current value. A writer on another thread waits for the delivering
//! thread to finish. A write made from inside a callback is queued and
//! delivered once that callback returns, before the outer write returns.
//! No lock is held while callbacks run.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::thread::{self, ThreadId};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    callback: Callback<T>,
    active: Arc<AtomicBool>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            active: Arc::clone(&self.active),
        }
    }
}

struct Subscribers<T> {
    next_id: u64,
    entries: BTreeMap<u64, Subscriber<T>>,
}

/// One pending notification: a value and who gets it.
struct Job<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
}

struct Delivery<T> {
    pending: VecDeque<Job<T>>,
    /// Thread currently draining `pending`.
    drainer: Option<ThreadId>,
}

struct Inner<T> {
    value: Mutex<T>,
    subscribers: Mutex<Subscribers<T>>,
    delivery: Mutex<Delivery<T>>,
    idle: Condvar,
}

/// Lets a `Subscription` outlive the store's concrete type.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: Send> Detach for Inner<T> {
    fn detach(&self, id: u64) {
        let removed = lock(&self.subscribers).entries.remove(&id).is_some();
        if removed {
            tracing::trace!(subscriber = id, "subscriber removed");
        }
    }
}

/// Observable container. Clones share the same value and subscribers.
pub struct Writable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + 'static> Default for Writable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + 'static> Writable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(initial),
                subscribers: Mutex::new(Subscribers {
                    next_id: 0,
                    entries: BTreeMap::new(),
                }),
                delivery: Mutex::new(Delivery {
                    pending: VecDeque::new(),
                    drainer: None,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        lock(&self.inner.value).clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, next: T) {
        {
            let mut current = lock(&self.inner.value);
            *current = next;
            self.enqueue(&current);
        }
        self.deliver();
    }

    /// Derive the next value from the current one.
    ///
    /// `f` runs exactly once, with the value lock held; it must not touch
    /// this store.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        {
            let mut current = lock(&self.inner.value);
            let next = f(&current);
            *current = next;
            self.enqueue(&current);
        }
        self.deliver();
    }

    /// Register `callback`; it is called right away with the current value
    /// and then after every write.
    ///
    /// The first call always carries an older value than any notification
    /// that follows it, even when another thread writes concurrently.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let subscriber = Subscriber {
            callback: Arc::new(callback),
            active: Arc::clone(&active),
        };

        let (id, inline) = {
            let current = lock(&self.inner.value);
            let mut subscribers = lock(&self.inner.subscribers);
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.entries.insert(id, subscriber.clone());
            drop(subscribers);

            // Inside a callback this thread already owns delivery, so
            // nothing else can reach the new subscriber before the call.
            let mut delivery = lock(&self.inner.delivery);
            if delivery.drainer == Some(thread::current().id()) {
                (id, Some(current.clone()))
            } else {
                delivery.pending.push_back(Job {
                    value: current.clone(),
                    subscribers: vec![subscriber.clone()],
                });
                (id, None)
            }
        };
        tracing::trace!(subscriber = id, "subscriber added");

        match inline {
            Some(value) => (subscriber.callback)(&value),
            None => self.deliver(),
        }

        let inner: Arc<dyn Detach> = self.inner.clone();
        Subscription {
            id,
            active,
            store: Arc::downgrade(&inner),
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).entries.len()
    }

    /// Queue a notification of `value`. Called with the value lock held so
    /// the queue follows write order.
    fn enqueue(&self, value: &T) {
        let subscribers = lock(&self.inner.subscribers)
            .entries
            .values()
            .cloned()
            .collect();
        lock(&self.inner.delivery).pending.push_back(Job {
            value: value.clone(),
            subscribers,
        });
    }

    /// Drain the queue unless this thread is already draining it further up
    /// the stack. Waits while another thread drains.
    fn deliver(&self) {
        let me = thread::current().id();
        let mut delivery = lock(&self.inner.delivery);
        loop {
            match delivery.drainer {
                Some(owner) if owner == me => return,
                Some(_) => {
                    delivery = self
                        .inner
                        .idle
                        .wait(delivery)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
                None => break,
            }
        }
        delivery.drainer = Some(me);
        drop(delivery);

        let _release = DrainRelease { inner: &self.inner };
        loop {
            let job = lock(&self.inner.delivery).pending.pop_front();
            match job {
                Some(job) => notify(&job.value, &job.subscribers),
                None => break,
            }
        }
    }
}

/// Hands delivery back when draining ends, including by a panicking callback.
struct DrainRelease<'a, T> {
    inner: &'a Inner<T>,
}

impl<T> Drop for DrainRelease<'_, T> {
    fn drop(&mut self) {
        lock(&self.inner.delivery).drainer = None;
        self.inner.idle.notify_all();
    }
}

fn notify<T>(value: &T, subscribers: &[Subscriber<T>]) {
    for subscriber in subscribers {
        // Removed by an earlier callback.
        if !subscriber.active.load(Ordering::SeqCst) {
            continue;
        }
        (subscriber.callback)(value);
    }
}

/// Poisoning only means a callback panicked elsewhere; the value is still whole.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deregistration handle returned by [`Writable::subscribe`].
///
/// Unsubscribing is idempotent and does nothing once the store is gone.
#[must_use = "dropping a Subscription keeps the callback registered"]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    store: Weak<dyn Detach>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.detach(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
