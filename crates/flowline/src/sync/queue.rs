//! A bounded, multi-producer multi-consumer queue.
//!
//! Grounded on the admission pattern in
//! `examples/original_source/src/lasr/executor.h`: a `VecDeque` behind a
//! mutex, paired with two [`crate::io::Flag`]s (`has_room`, `has_items`) so
//! producers and consumers can wait via [`crate::io::select`] alongside
//! anything else a caller is waiting on, instead of a condvar that can only
//! be waited on alone.

use crate::error::{Error, Result};
use crate::io::{select1, select2, Awaitable, Flag};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct Shared<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    has_room: Flag,
    has_items: Flag,
}

/// A bounded queue safe to share between threads via cloning (it is a thin
/// handle around `Arc`-shared state).
#[derive(Clone)]
pub struct Queue<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Queue<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let has_room = Flag::new()?;
        has_room.set()?;
        Ok(Queue {
            shared: Arc::new(Shared {
                capacity,
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                has_room,
                has_items: Flag::new()?,
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Enqueues `value` without blocking if there is room; fails with
    /// try-again if the queue is full.
    pub fn maybe_put(&self, value: T) -> Result<()> {
        match self.put_if_room_locked(value)? {
            None => Ok(()),
            Some(_) => Err(Error::try_again("queue is full")),
        }
    }

    /// Dequeues a value without blocking if one is available; fails with
    /// try-again if the queue is empty.
    pub fn maybe_get(&self) -> Result<T> {
        match self.get_if_available_locked()? {
            Some(value) => Ok(value),
            None => Err(Error::try_again("queue is empty")),
        }
    }

    /// Like `maybe_put`, but hands `value` back instead of dropping it when
    /// the queue is full, so a retry loop (e.g. `async_put`) doesn't lose it
    /// on a spurious wake.
    fn put_if_room_locked(&self, value: T) -> Result<Option<T>> {
        let mut items = self.shared.items.lock();
        if items.len() >= self.shared.capacity {
            return Ok(Some(value));
        }
        self.push_locked(&mut items, value)?;
        Ok(None)
    }

    /// Like `maybe_get`, but as `Option<T>` rather than failing, for use in
    /// `async_get`'s retry loop.
    fn get_if_available_locked(&self) -> Result<Option<T>> {
        let mut items = self.shared.items.lock();
        let value = items.pop_front();
        if value.is_some() {
            self.update_flags_locked(&items)?;
        }
        Ok(value)
    }

    /// An awaitable that fires once there is room, consuming `value` by
    /// enqueuing it.
    pub fn async_put(&self, value: T) -> Awaitable<()> {
        let this = self.clone();
        Awaitable::new(this.shared.has_room.wait_set_readiness(), move || {
            let mut v = Some(value);
            loop {
                if let Some(leftover) = this.put_if_room_locked(v.take().unwrap())? {
                    v = Some(leftover);
                    continue;
                }
                return Ok(());
            }
        })
    }

    /// An awaitable that fires once an item is available.
    pub fn async_get(&self) -> Awaitable<T> {
        let this = self.clone();
        Awaitable::new(this.shared.has_items.wait_set_readiness(), move || loop {
            if let Some(v) = this.get_if_available_locked()? {
                return Ok(v);
            }
        })
    }

    /// Blocks until there is room, then enqueues `value`.
    pub fn put(&self, value: T) -> Result<()> {
        select1(self.async_put(value))
    }

    /// Blocks until an item is available, then dequeues it.
    pub fn get(&self) -> Result<T> {
        select1(self.async_get())
    }

    /// Waits on room-to-put and an item-to-get together in a single
    /// `select`, the shape [`crate::sync::ThreadPool`] needs to admit work
    /// while also making progress on results.
    pub fn select_put_get(&self, value: T, other: &Queue<T>) -> Result<(bool, Option<T>)> {
        let (put_result, get_result) = select2(self.async_put(value), other.async_get())?;
        Ok((put_result.is_some(), get_result))
    }

    fn push_locked(&self, items: &mut VecDeque<T>, value: T) -> Result<()> {
        items.push_back(value);
        self.update_flags_locked(items)
    }

    fn update_flags_locked(&self, items: &VecDeque<T>) -> Result<()> {
        if items.len() < self.shared.capacity {
            self.shared.has_room.set()?;
        } else {
            self.shared.has_room.reset()?;
        }
        if !items.is_empty() {
            self.shared.has_items.set()?;
        } else {
            self.shared.has_items.reset()?;
        }
        Ok(())
    }
}
