use log::debug;
use parking_lot::{Condvar, Mutex};

use crate::channel::error::{ChannelError, Result};

#[derive(Debug)]
struct PermitState {
    permits: usize,
    closed: bool,
}

/// Counting permit pool.
///
/// `acquire` blocks until a permit is available and never times out. Closing
/// the semaphore wakes every waiter with [`ChannelError::Closed`]; this is the
/// only way to abandon a wait.
#[derive(Debug)]
pub struct Semaphore {
    name: &'static str,
    state: Mutex<PermitState>,
    available: Condvar,
    /// Upper bound on outstanding permits, `None` for a plain counting semaphore
    max_permits: Option<usize>,
}

impl Semaphore {
    pub fn new(name: &'static str, permits: usize) -> Self {
        Self {
            name,
            state: Mutex::new(PermitState { permits, closed: false }),
            available: Condvar::new(),
            max_permits: None,
        }
    }

    /// A permit that is either available or not; extra releases are absorbed
    pub fn binary(name: &'static str, available: bool) -> Self {
        Self {
            max_permits: Some(1),
            ..Self::new(name, usize::from(available))
        }
    }

    /// Take one permit, blocking while none is available
    pub fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock();
        while state.permits == 0 && !state.closed {
            self.available.wait(&mut state);
        }
        if state.closed {
            return Err(ChannelError::Closed);
        }
        state.permits -= 1;
        Ok(())
    }

    /// Take one permit if one is available right now
    pub fn try_acquire(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ChannelError::Closed);
        }
        if state.permits == 0 {
            return Ok(false);
        }
        state.permits -= 1;
        Ok(true)
    }

    /// Return one permit and wake a waiter
    pub fn release(&self) {
        let mut state = self.state.lock();
        match self.max_permits {
            Some(max) if state.permits >= max => return,
            _ => state.permits += 1,
        }
        drop(state);
        self.available.notify_one();
    }

    /// Fail all current and future waits
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            debug!("Semaphore {} closed with {} permits left", self.name, state.permits);
        }
        drop(state);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn available_permits(&self) -> usize {
        self.state.lock().permits
    }
}
