use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;

use crate::common::types::{Request, DEFAULT_CHANNEL_CAPACITY};
use crate::channel::error::{ChannelError, Result};
use crate::channel::semaphore::Semaphore;

/// Fixed slot arena with producer (`in_pos`) and consumer (`out_pos`) cursors
#[derive(Debug)]
struct SlotRing {
    slots: Vec<Option<Request>>,
    in_pos: usize,
    out_pos: usize,
    occupied: usize,
}

impl SlotRing {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            in_pos: 0,
            out_pos: 0,
            occupied: 0,
        }
    }

    fn put(&mut self, request: Request) -> Result<()> {
        let slot = &mut self.slots[self.in_pos];
        if slot.is_some() {
            return Err(ChannelError::InvalidState(format!(
                "slot {} overwritten before it was read", self.in_pos
            )));
        }
        *slot = Some(request);
        self.in_pos = (self.in_pos + 1) % self.slots.len();
        self.occupied += 1;
        Ok(())
    }

    fn take(&mut self) -> Result<Request> {
        let request = self.slots[self.out_pos].take().ok_or_else(|| {
            ChannelError::InvalidState(format!("slot {} read before it was written", self.out_pos))
        })?;
        self.out_pos = (self.out_pos + 1) % self.slots.len();
        self.occupied -= 1;
        Ok(request)
    }
}

/// Bounded multi-producer, single-consumer request queue.
///
/// Capacity is enforced by two counting permits (`empty` starts at the
/// capacity, `full` at zero). The ring itself sits behind a mutex that is
/// held only while one slot and one cursor are updated.
///
/// ```text
/// send:  empty.acquire -> lock ring -> put, advance in  -> unlock -> full.release
/// recv:  full.acquire  -> lock ring -> take, advance out -> unlock -> empty.release
/// ```
#[derive(Debug)]
pub struct SharedChannel {
    ring: Mutex<SlotRing>,
    empty: Semaphore,
    full: Semaphore,
    capacity: usize,
    sent: AtomicU64,
    received: AtomicU64,
}

impl SharedChannel {
    /// Create a channel with `capacity` slots; zero slots cannot carry anything
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ChannelError::Unavailable(
                "capacity must be at least one slot".to_string(),
            ));
        }

        Ok(Self::build(capacity))
    }

    /// Channel with the reference sizing of 16 slots
    pub fn with_default_capacity() -> Self {
        Self::build(DEFAULT_CHANNEL_CAPACITY)
    }

    fn build(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(SlotRing::new(capacity)),
            empty: Semaphore::new("empty", capacity),
            full: Semaphore::new("full", 0),
            capacity,
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }

    /// Enqueue a request, blocking while every slot is occupied
    pub fn send(&self, request: Request) -> Result<()> {
        self.empty.acquire()?;
        self.ring.lock().put(request)?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.full.release();
        Ok(())
    }

    /// Dequeue the oldest request, blocking while the channel is empty
    pub fn recv(&self) -> Result<Request> {
        self.full.acquire()?;
        let request = self.ring.lock().take()?;
        self.received.fetch_add(1, Ordering::Relaxed);
        self.empty.release();
        Ok(request)
    }

    /// Dequeue a request only if one is already waiting
    pub fn try_recv(&self) -> Result<Option<Request>> {
        if !self.full.try_acquire()? {
            return Ok(None);
        }
        let request = self.ring.lock().take()?;
        self.received.fetch_add(1, Ordering::Relaxed);
        self.empty.release();
        Ok(Some(request))
    }

    /// Wake every blocked sender and receiver with [`ChannelError::Closed`]
    pub fn close(&self) {
        self.empty.close();
        self.full.close();
    }

    pub fn is_closed(&self) -> bool {
        self.full.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied slots
    pub fn len(&self) -> usize {
        self.ring.lock().occupied
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}
