//! Orders and the fixed-capacity order queue.
//!
//! An [`Order`] is a dense vector of per-pump run durations.  The
//! [`OrderQueue`] is a circular buffer with one slot per dispensing
//! position:
//!
//! ```text
//!   add:    tail = (tail + 1) % cap ; slots[tail] = order ; count += 1
//!   remove: order = slots[head] ; head = (head + 1) % cap ; count -= 1
//! ```
//!
//! `tail` starts one slot behind `head`, so the advance-then-write on add
//! and the read-then-advance on remove meet at the same slot.

use log::debug;

use crate::error::OrderError;

/// Largest pump bank the firmware can drive.
pub const MAX_PUMPS: usize = 32;
/// Largest number of dispensing positions.
pub const MAX_POSITIONS: usize = 8;

// ═══════════════════════════════════════════════════════════════
//  Order
// ═══════════════════════════════════════════════════════════════

/// Run duration (seconds) for every pump, indexed by pump id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    durations: heapless::Vec<u16, MAX_PUMPS>,
}

impl Order {
    /// All-zero order for a bank of `pump_count` pumps (capped at [`MAX_PUMPS`]).
    pub fn new(pump_count: usize) -> Self {
        let mut durations = heapless::Vec::new();
        durations.resize(pump_count.min(MAX_PUMPS), 0).ok();
        Self { durations }
    }

    /// Build from explicit durations; extra entries beyond [`MAX_PUMPS`] are dropped.
    pub fn from_durations(durations: &[u16]) -> Self {
        let mut order = Self::new(durations.len());
        for (slot, &secs) in order.durations.iter_mut().zip(durations) {
            *slot = secs;
        }
        order
    }

    /// Set the duration for `pump`; returns `false` if out of range.
    pub fn set(&mut self, pump: usize, secs: u16) -> bool {
        match self.durations.get_mut(pump) {
            Some(slot) => {
                *slot = secs;
                true
            }
            None => false,
        }
    }

    pub fn duration(&self, pump: usize) -> u16 {
        self.durations.get(pump).copied().unwrap_or(0)
    }

    pub fn durations(&self) -> &[u16] {
        &self.durations
    }

    pub fn pump_count(&self) -> usize {
        self.durations.len()
    }

    /// Pumps this order switches on.
    pub fn active_pumps(&self) -> usize {
        self.durations.iter().filter(|&&d| d > 0).count()
    }

    pub fn is_noop(&self) -> bool {
        self.active_pumps() == 0
    }
}

// ═══════════════════════════════════════════════════════════════
//  Order queue
// ═══════════════════════════════════════════════════════════════

/// Strict FIFO of pending orders.
pub struct OrderQueue {
    slots: heapless::Vec<Order, MAX_POSITIONS>,
    head: usize,
    tail: usize,
    count: usize,
}

impl OrderQueue {
    /// Queue with `capacity` slots, clamped to `1..=MAX_POSITIONS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_POSITIONS);
        let mut slots = heapless::Vec::new();
        slots.resize(capacity, Order::default()).ok();
        Self {
            slots,
            head: 0,
            tail: capacity - 1,
            count: 0,
        }
    }

    /// Append an order; returns the new depth.  A full queue is left untouched.
    pub fn add_order(&mut self, order: Order) -> Result<usize, OrderError> {
        if self.is_full() {
            return Err(OrderError::QueueFull);
        }
        self.tail = (self.tail + 1) % self.capacity();
        self.slots[self.tail] = order;
        self.count += 1;
        Ok(self.count)
    }

    /// Take the oldest order.
    pub fn remove_order(&mut self) -> Result<Order, OrderError> {
        if self.is_empty() {
            return Err(OrderError::QueueEmpty);
        }
        let order = core::mem::take(&mut self.slots[self.head]);
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Ok(order)
    }

    /// Discard the oldest order without returning it.
    pub fn delete_next_order(&mut self) -> Result<(), OrderError> {
        self.remove_order().map(drop)
    }

    pub fn peek(&self) -> Option<&Order> {
        if self.is_empty() { None } else { self.slots.get(self.head) }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Dump pending orders at debug level, oldest first.
    pub fn log_contents(&self) {
        debug!(
            "OrderQueue: {}/{} head={} tail={}",
            self.count,
            self.capacity(),
            self.head,
            self.tail
        );
        for n in 0..self.count {
            let slot = (self.head + n) % self.capacity();
            debug!("  [{}] slot={} durations={:?}", n, slot, self.slots[slot].durations());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(tag: u16) -> Order {
        Order::from_durations(&[tag, 0, tag])
    }

    #[test]
    fn new_order_is_all_zero() {
        let o = Order::new(24);
        assert_eq!(o.pump_count(), 24);
        assert!(o.is_noop());
        assert_eq!(o.duration(23), 0);
        assert_eq!(o.duration(24), 0);
    }

    #[test]
    fn order_capped_at_max_pumps() {
        assert_eq!(Order::new(MAX_PUMPS + 10).pump_count(), MAX_PUMPS);
    }

    #[test]
    fn set_out_of_range_is_rejected() {
        let mut o = Order::new(4);
        assert!(o.set(3, 10));
        assert!(!o.set(4, 10));
        assert_eq!(o.durations(), &[0, 0, 0, 10]);
        assert_eq!(o.active_pumps(), 1);
    }

    #[test]
    fn single_slot_queue() {
        let mut q = OrderQueue::new(1);
        assert_eq!(q.add_order(order(1)), Ok(1));
        assert!(q.is_full());
        assert_eq!(q.add_order(order(2)), Err(OrderError::QueueFull));
        assert_eq!(q.remove_order(), Ok(order(1)));
        assert_eq!(q.remove_order(), Err(OrderError::QueueEmpty));
    }

    #[test]
    fn fifo_across_wraparound() {
        let mut q = OrderQueue::new(3);
        for round in 0..4u16 {
            for i in 0..3 {
                q.add_order(order(round * 10 + i)).unwrap();
            }
            for i in 0..3 {
                assert_eq!(q.remove_order().unwrap(), order(round * 10 + i));
            }
        }
        assert!(q.is_empty());
    }

    #[test]
    fn full_queue_is_unchanged_by_add() {
        let mut q = OrderQueue::new(2);
        q.add_order(order(1)).unwrap();
        q.add_order(order(2)).unwrap();
        assert_eq!(q.add_order(order(3)), Err(OrderError::QueueFull));
        assert_eq!(q.len(), 2);
        assert_eq!(q.peek(), Some(&order(1)));
    }

    #[test]
    fn delete_next_drops_head() {
        let mut q = OrderQueue::new(2);
        q.add_order(order(1)).unwrap();
        q.add_order(order(2)).unwrap();
        q.delete_next_order().unwrap();
        assert_eq!(q.remove_order(), Ok(order(2)));
        assert_eq!(q.delete_next_order(), Err(OrderError::QueueEmpty));
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(OrderQueue::new(0).capacity(), 1);
        assert_eq!(OrderQueue::new(100).capacity(), MAX_POSITIONS);
    }
}
