//! Order scheduler.
//!
//! Owns the [`OrderQueue`] and drains it into an [`OrderExecutor`] (the
//! pump bank) from a periodic 250 ms tick.
//!
//! ```text
//! ┌──────────────┐  enqueue (lock → add → release)  ┌─────────────────┐
//! │ Command path │ ────────────────────────────────▶│   OrderQueue    │
//! └──────────────┘                                  └────────┬────────┘
//!                                                            │ tick: unlocked,
//!                                                            │ non-empty, idle
//!                                                            ▼
//!                                                   ┌─────────────────┐
//!                                                   │  OrderExecutor  │
//!                                                   │  (pump bank)    │
//!                                                   └─────────────────┘
//! ```
//!
//! The lock is a reentrancy flag, never a blocking mutex: a tick that
//! finds it held does nothing and the next tick tries again.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::app::ports::OrderExecutor;
use crate::error::OrderError;
use crate::orders::{Order, OrderQueue};

/// Result of a tick that started an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Dispensing position the order was assigned to.
    pub position: usize,
    /// Pumps switched on by the order.
    pub active_pumps: usize,
}

pub struct OrderScheduler {
    queue: OrderQueue,
    locked: AtomicBool,
    /// Position of the most recently dispatched order.
    active_position: Option<usize>,
}

impl OrderScheduler {
    /// Scheduler with one queue slot per dispensing position.
    pub fn new(position_count: usize) -> Self {
        let queue = OrderQueue::new(position_count);
        info!("OrderScheduler: {} position(s)", queue.capacity());
        Self {
            queue,
            locked: AtomicBool::new(false),
            active_position: None,
        }
    }

    // ── Lock ──────────────────────────────────────────────────

    /// Take the queue lock.  Returns `false` if it was already held.
    pub fn lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    // ── Queue access ──────────────────────────────────────────

    /// Append `order` under the lock.  Returns the new queue depth.
    pub fn enqueue(&mut self, order: Order) -> Result<usize, OrderError> {
        if !self.lock() {
            return Err(OrderError::Locked);
        }
        let result = self.queue.add_order(order);
        self.release();
        result
    }

    pub fn queue(&self) -> &OrderQueue {
        &self.queue
    }

    pub fn position_count(&self) -> usize {
        self.queue.capacity()
    }

    /// `None` until the first order has been dispatched.
    pub fn active_position(&self) -> Option<usize> {
        self.active_position
    }

    // ── Periodic tick ─────────────────────────────────────────

    /// Start the next order if the queue is unlocked, non-empty and the
    /// executor is idle.  Never blocks.
    ///
    /// The order leaves the queue, and the position advances, only once
    /// the executor has accepted it.
    pub fn tick(&mut self, executor: &mut impl OrderExecutor) -> Option<Dispatch> {
        if self.queue.is_empty() || !executor.is_idle() {
            return None;
        }
        if !self.lock() {
            debug!("OrderScheduler: queue locked, skipping tick");
            return None;
        }
        let started = match self.queue.peek() {
            Some(order) => executor.run_order(order),
            None => {
                self.release();
                return None;
            }
        };
        let active_pumps = match started {
            Ok(n) => {
                let _ = self.queue.delete_next_order();
                self.release();
                n
            }
            Err(e) => {
                self.release();
                warn!("OrderScheduler: order kept queued, {}", e);
                return None;
            }
        };

        let position = self.active_position.map_or(0, |p| (p + 1) % self.position_count());
        self.active_position = Some(position);
        info!(
            "OrderScheduler: dispatched to position {} ({} pumps)",
            position, active_pumps
        );
        Some(Dispatch { position, active_pumps })
    }
}
