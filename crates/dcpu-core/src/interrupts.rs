//! Bounded interrupt queue and the admission policy shared by `INT` and
//! host-raised interrupts.

use std::collections::VecDeque;

use crate::FaultCode;

/// Queue capacity of the reference hardware.
pub const INTERRUPT_QUEUE_CAPACITY: usize = 256;

/// Decision taken for a freshly raised interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// `IA` is zero: the message is discarded.
    Drop,
    /// The message joins the queue.
    Enqueue,
}

/// Error returned when the queue has no room left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptEnqueueError {
    /// Queue is full; the machine catches fire.
    QueueFull,
}

impl InterruptEnqueueError {
    /// Maps enqueue failure to the canonical fault code.
    #[must_use]
    pub const fn fault_code(self) -> FaultCode {
        match self {
            Self::QueueFull => FaultCode::InterruptQueueOverflow,
        }
    }
}

/// Pending interrupts plus the queueing switch toggled by `IAQ`/`RFI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptController {
    queueing: bool,
    queue: VecDeque<u16>,
    capacity: usize,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::with_capacity(INTERRUPT_QUEUE_CAPACITY)
    }
}

impl InterruptController {
    /// Creates an empty controller holding at most `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queueing: false,
            queue: VecDeque::with_capacity(capacity.min(INTERRUPT_QUEUE_CAPACITY)),
            capacity,
        }
    }

    /// Admission policy for a raised interrupt given the current `IA`.
    ///
    /// Messages raised while `IA` is zero are dropped, whether or not
    /// queueing is on. Everything else is queued; delivery is deferred while
    /// queueing is on.
    #[must_use]
    pub const fn admission(ia: u16) -> Admission {
        if ia == 0 {
            Admission::Drop
        } else {
            Admission::Enqueue
        }
    }

    /// Appends `message` to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`InterruptEnqueueError::QueueFull`] when the queue is at
    /// capacity; the message is not stored.
    pub fn enqueue(&mut self, message: u16) -> Result<(), InterruptEnqueueError> {
        if self.queue.len() >= self.capacity {
            return Err(InterruptEnqueueError::QueueFull);
        }
        self.queue.push_back(message);
        Ok(())
    }

    /// Pops the next deliverable message, or `None` while queueing is on.
    pub fn next_deliverable(&mut self) -> Option<u16> {
        if self.queueing {
            return None;
        }
        self.queue.pop_front()
    }

    /// Returns `true` while delivery is deferred.
    #[must_use]
    pub const fn queueing(&self) -> bool {
        self.queueing
    }

    /// Enables or disables deferred delivery.
    pub const fn set_queueing(&mut self, queueing: bool) {
        self.queueing = queueing;
    }

    /// Number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when no messages are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending messages in delivery order.
    pub fn pending(&self) -> impl Iterator<Item = u16> + '_ {
        self.queue.iter().copied()
    }

    /// Drops all pending messages and clears queueing.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queueing = false;
    }
}
