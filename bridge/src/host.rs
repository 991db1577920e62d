//! In-process managed host.
//!
//! [`ManagedArray`] plays the role of a garbage-collected runtime array: the
//! caller owns it, and native code only ever sees it through a pin taken by
//! the gateway for the duration of one call. A [`Heap`] groups arrays and
//! keeps pin accounting. It can emulate the two runtime behaviours the
//! gateway has to cope with:
//!
//! - a pin limit, past which pinning fails as it would under memory pressure;
//! - copy-on-pin, where native code receives a scratch copy that is only
//!   written back on [`ReleaseMode::Commit`].

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::gateway::{Pinnable, Primitive, ReleaseMode, Writable};

/// Pin accounting for one heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinStats {
    /// Successful pins.
    pub pins: usize,
    /// Refused pins.
    pub failures: usize,
    /// Releases with [`ReleaseMode::Commit`].
    pub commits: usize,
    /// Releases with [`ReleaseMode::Discard`].
    pub discards: usize,
}

impl PinStats {
    /// Pins not yet released.
    pub fn outstanding(&self) -> usize {
        self.pins - self.commits - self.discards
    }
}

struct HeapInner {
    pin_limit: Option<usize>,
    copy_on_pin: bool,
    live: AtomicUsize,
    stats: Mutex<PinStats>,
}

/// Shared pin bookkeeping for a group of managed arrays.
#[derive(Clone)]
pub struct Heap {
    inner: Arc<HeapInner>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("pin_limit", &self.inner.pin_limit)
            .field("copy_on_pin", &self.inner.copy_on_pin)
            .field("live_pins", &self.live_pins())
            .finish()
    }
}

impl Heap {
    /// Creates a heap that pins arrays in place without a limit.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for a heap with non-default behaviour.
    pub fn builder() -> HeapBuilder {
        HeapBuilder::default()
    }

    /// Number of pins currently held.
    pub fn live_pins(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the pin accounting.
    pub fn stats(&self) -> PinStats {
        *self.inner.stats.lock()
    }

    /// Allocates a zero-filled array of `len` elements.
    pub fn alloc<T: Primitive>(&self, len: usize) -> ManagedArray<T> {
        self.array(vec![T::default(); len])
    }

    /// Moves `data` into a managed array.
    pub fn array<T: Primitive>(&self, data: Vec<T>) -> ManagedArray<T> {
        ManagedArray {
            heap: self.clone(),
            data: UnsafeCell::new(data.into_boxed_slice()),
            scratch: Mutex::new(Vec::new()),
        }
    }

    fn try_pin(&self) -> bool {
        let inner = &self.inner;
        let admitted = match inner.pin_limit {
            Some(limit) => inner
                .live
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < limit).then_some(n + 1)
                })
                .is_ok(),
            None => {
                inner.live.fetch_add(1, Ordering::AcqRel);
                true
            }
        };

        let mut stats = inner.stats.lock();
        if admitted {
            stats.pins += 1;
        } else {
            stats.failures += 1;
        }
        admitted
    }

    fn unpinned(&self, mode: ReleaseMode) {
        self.inner.live.fetch_sub(1, Ordering::AcqRel);
        let mut stats = self.inner.stats.lock();
        match mode {
            ReleaseMode::Commit => stats.commits += 1,
            ReleaseMode::Discard => stats.discards += 1,
        }
    }
}

/// Builder for [`Heap`].
#[derive(Debug, Default)]
pub struct HeapBuilder {
    pin_limit: Option<usize>,
    copy_on_pin: bool,
}

impl HeapBuilder {
    /// Refuses pins once `limit` pins are outstanding.
    pub fn pin_limit(mut self, limit: usize) -> Self {
        self.pin_limit = Some(limit);
        self
    }

    /// Hands out scratch copies instead of pinning in place.
    pub fn copy_on_pin(mut self, copy: bool) -> Self {
        self.copy_on_pin = copy;
        self
    }

    pub fn build(self) -> Heap {
        Heap {
            inner: Arc::new(HeapInner {
                pin_limit: self.pin_limit,
                copy_on_pin: self.copy_on_pin,
                live: AtomicUsize::new(0),
                stats: Mutex::new(PinStats::default()),
            }),
        }
    }
}

/// A caller-owned array living on a [`Heap`].
///
/// Not `Sync`: like a runtime array handed to native code, concurrent access
/// from several threads is the caller's business and is not supported here.
pub struct ManagedArray<T: Primitive> {
    heap: Heap,
    data: UnsafeCell<Box<[T]>>,
    scratch: Mutex<Vec<Box<[T]>>>,
}

impl<T: Primitive> ManagedArray<T> {
    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.contents().len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.contents().to_vec()
    }

    /// Returns the contents.
    pub fn as_slice(&self) -> &[T] {
        self.contents()
    }

    /// Returns the contents for writing.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.get_mut()
    }

    /// Overwrites the elements starting at `offset` with `values`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not fit the array.
    pub fn write(&mut self, offset: usize, values: &[T]) {
        self.data.get_mut()[offset..offset + values.len()].copy_from_slice(values);
    }

    /// Returns the heap this array lives on.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    fn contents(&self) -> &[T] {
        // Shared reads only; writers go through `&mut self` or a pin.
        unsafe { &*self.data.get() }
    }
}

impl<T: Primitive + fmt::Debug> fmt::Debug for ManagedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedArray")
            .field("len", &self.len())
            .finish()
    }
}

unsafe impl<T: Primitive> Pinnable for ManagedArray<T> {
    type Elem = T;

    fn pin(&self) -> Option<NonNull<T>> {
        if !self.heap.try_pin() {
            return None;
        }

        if !self.heap.inner.copy_on_pin {
            let data = unsafe { &mut *self.data.get() };
            return NonNull::new(data.as_mut_ptr());
        }

        let mut copy = self.contents().to_vec().into_boxed_slice();
        let ptr = NonNull::new(copy.as_mut_ptr());
        self.scratch.lock().push(copy);
        ptr
    }

    unsafe fn unpin(&self, ptr: NonNull<T>, mode: ReleaseMode) {
        if self.heap.inner.copy_on_pin {
            let copy = {
                let mut scratch = self.scratch.lock();
                scratch
                    .iter()
                    .position(|c| c.as_ptr() == ptr.as_ptr().cast_const())
                    .map(|i| scratch.swap_remove(i))
            };
            if let (Some(copy), ReleaseMode::Commit) = (copy, mode) {
                let data = unsafe { &mut *self.data.get() };
                data.copy_from_slice(&copy);
            }
        }
        self.heap.unpinned(mode);
    }
}

unsafe impl<T: Primitive> Writable for ManagedArray<T> {}
