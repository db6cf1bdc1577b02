/// A small slab of reusable slots.
///
/// A `Slab` stores values of type `T` and hands out stable keys that stay
/// valid until the value is removed. Freed keys are recycled by later
/// insertions, so the storage never grows past the peak number of live
/// entries.
///
/// The subject uses it to keep the wakers of suspended waiters: a waiter
/// remembers its key, refreshes its waker in place when polled again, and
/// removes itself when dropped before resolution.
pub(crate) struct Slab<T> {
    /// Slots, `None` when free.
    entries: Vec<Option<T>>,
    /// Stack of free keys that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates an empty slab. No memory is allocated until the first insert.
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its key.
    ///
    /// A previously freed slot is reused when available.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let key = match self.free.pop() {
            Some(key) => {
                self.entries[key] = Some(item);
                key
            }
            None => {
                self.entries.push(Some(item));
                self.entries.len() - 1
            }
        };

        self.len += 1;
        key
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the slot is free or out of range.
    pub(crate) fn remove(&mut self, key: usize) -> Option<T> {
        let item = self.entries.get_mut(key)?.take()?;

        self.free.push(key);
        self.len -= 1;

        Some(item)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.entries.get_mut(key)?.as_mut()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every value, yielding them in key order.
    ///
    /// The slab is empty afterwards and all keys become free.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.free.clear();
        self.len = 0;

        self.entries.drain(..).flatten()
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}
