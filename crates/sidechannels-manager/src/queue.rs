use crate::error::QueueError;

/// Capacity of a queue built with [`GrowableQueue::new`].
pub const DEFAULT_CAPACITY: usize = 4;

/// Smallest number of slots added when a full queue grows.
const MIN_GROWTH: usize = 4;

/// FIFO ring buffer that grows when full.
///
/// Growth doubles the capacity, or adds [`MIN_GROWTH`] slots when doubling
/// would add fewer. Capacity never shrinks.
#[derive(Debug, Clone)]
pub struct GrowableQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> GrowableQueue<T> {
    /// Create an empty queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty queue with room for `capacity` items before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Append an item at the tail.
    pub fn enqueue(&mut self, item: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
    }

    /// Remove and return the item at the head.
    pub fn dequeue(&mut self) -> Result<T, QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        let item = self.slots[self.head].take().ok_or(QueueError::Empty)?;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Ok(item)
    }

    /// Borrow the item at the head without removing it.
    pub fn peek(&self) -> Result<&T, QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        self.slots[self.head].as_ref().ok_or(QueueError::Empty)
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % self.slots.len()].as_ref())
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every queued item. Capacity is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = (old_capacity * 2).max(old_capacity + MIN_GROWTH);

        let mut slots = Vec::with_capacity(new_capacity);
        for i in 0..self.len {
            slots.push(self.slots[(self.head + i) % old_capacity].take());
        }
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.head = 0;
    }
}

impl<T: PartialEq> GrowableQueue<T> {
    /// Linear scan for an equal item.
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|queued| queued == item)
    }
}

impl<T: Clone> GrowableQueue<T> {
    /// Copy the contents out in FIFO order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for GrowableQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
