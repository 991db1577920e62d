//! Buffer access gateway.
//!
//! Every adapter that touches bulk sample or byte data goes through this
//! module. A managed buffer is pinned, native code receives a raw pointer to
//! it, and the pin is released again before the adapter returns. The release
//! carries a [`ReleaseMode`]: destinations are committed so the written data
//! reaches the managed buffer, sources are discarded since native code never
//! writes to them.
//!
//! [`Pinned`] releases on drop, so every exit path of an adapter releases
//! what it acquired. Two-buffer calls use [`PinnedPair`], which pins the
//! destination first and the source second. When the source cannot be
//! pinned the already pinned destination is released with
//! [`ReleaseMode::Commit`] before the failure is reported.

use std::marker::PhantomData;
use std::ptr::NonNull;

/// What happens to a pinned view when it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseMode {
    /// Written data is flushed back to the managed buffer.
    Commit,
    /// The view is dropped without copying anything back.
    Discard,
}

/// Element types native code may view directly.
///
/// # Safety
///
/// Implementors must be plain old data: every bit pattern is a valid value
/// and the type has no drop glue.
pub unsafe trait Primitive: Copy + Default + Send + 'static {}

unsafe impl Primitive for u8 {}
unsafe impl Primitive for i8 {}
unsafe impl Primitive for i16 {}

/// A caller-owned buffer that can be pinned for direct native access.
///
/// # Safety
///
/// A pointer returned by [`pin`](Pinnable::pin) must stay valid for reads of
/// the whole buffer until the matching [`unpin`](Pinnable::unpin) call.
pub unsafe trait Pinnable {
    /// Element type of the buffer.
    type Elem: Primitive;

    /// Pins the buffer and returns a pointer to its first element, or `None`
    /// when the host cannot pin it.
    fn pin(&self) -> Option<NonNull<Self::Elem>>;

    /// Releases a pin obtained from [`pin`](Pinnable::pin).
    ///
    /// # Safety
    ///
    /// `ptr` must come from a `pin` call on this buffer and must not have been
    /// released already. No pointer derived from it may be used afterwards.
    unsafe fn unpin(&self, ptr: NonNull<Self::Elem>, mode: ReleaseMode);
}

/// A pinnable buffer native code may also write through.
///
/// # Safety
///
/// Pointers returned by `pin` must additionally be valid for writes.
pub unsafe trait Writable: Pinnable {}

/// Which side of a two-buffer call failed to pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFailure {
    Destination,
    Source,
}

/// A pinned view of one buffer, released on drop.
pub struct Pinned<'a, A: Pinnable + ?Sized> {
    array: &'a A,
    ptr: NonNull<A::Elem>,
    mode: ReleaseMode,
}

impl<'a, A: Pinnable + ?Sized> Pinned<'a, A> {
    /// Pins `array`, to be released with `mode`.
    pub fn acquire(array: &'a A, mode: ReleaseMode) -> Option<Self> {
        let ptr = array.pin()?;
        Some(Self { array, ptr, mode })
    }

    /// Pins a source buffer (released with [`ReleaseMode::Discard`]).
    pub fn source(array: &'a A) -> Option<Self> {
        Self::acquire(array, ReleaseMode::Discard)
    }

    /// Returns the release mode this view will be released with.
    pub fn mode(&self) -> ReleaseMode {
        self.mode
    }

    /// Returns a pointer to element `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must be in bounds of the pinned buffer. The gateway does not
    /// check it.
    pub unsafe fn at(&self, offset: i32) -> *const A::Elem {
        unsafe { self.ptr.as_ptr().add(offset as usize) }
    }

    /// Returns a pointer `offset` bytes past the first element, cast to `T`.
    ///
    /// # Safety
    ///
    /// Same contract as [`at`](Self::at), in bytes.
    pub unsafe fn byte_at<T>(&self, offset: i32) -> *const T {
        unsafe { self.ptr.as_ptr().cast::<u8>().add(offset as usize).cast::<T>() }
    }
}

impl<'a, A: Writable + ?Sized> Pinned<'a, A> {
    /// Pins a destination buffer (released with [`ReleaseMode::Commit`]).
    pub fn destination(array: &'a A) -> Option<Self> {
        Self::acquire(array, ReleaseMode::Commit)
    }

    /// Returns a writable pointer to element `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must be in bounds of the pinned buffer.
    pub unsafe fn at_mut(&self, offset: i32) -> *mut A::Elem {
        unsafe { self.ptr.as_ptr().add(offset as usize) }
    }

    /// Returns a writable pointer `offset` bytes past the first element.
    ///
    /// # Safety
    ///
    /// Same contract as [`at_mut`](Self::at_mut), in bytes.
    pub unsafe fn byte_at_mut<T>(&self, offset: i32) -> *mut T {
        unsafe { self.ptr.as_ptr().cast::<u8>().add(offset as usize).cast::<T>() }
    }
}

impl<A: Pinnable + ?Sized> Drop for Pinned<'_, A> {
    fn drop(&mut self) {
        unsafe { self.array.unpin(self.ptr, self.mode) };
    }
}

/// Destination and source pinned for one native call.
///
/// Fields drop in declaration order, so the source is released before the
/// destination.
pub struct PinnedPair<'a, D: Writable + ?Sized, S: Pinnable + ?Sized> {
    pub src: Pinned<'a, S>,
    pub dst: Pinned<'a, D>,
}

impl<'a, D: Writable + ?Sized, S: Pinnable + ?Sized> PinnedPair<'a, D, S> {
    /// Pins `dst` (commit), then `src` (discard).
    pub fn acquire(dst: &'a D, src: &'a S) -> Result<Self, PinFailure> {
        let dst = Pinned::destination(dst).ok_or(PinFailure::Destination)?;
        // dst is dropped, and so committed, if this fails.
        let src = Pinned::source(src).ok_or(PinFailure::Source)?;
        Ok(Self { src, dst })
    }
}

/// A borrowed Rust slice passed where a source buffer is expected.
pub struct SliceSource<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _borrow: PhantomData<&'a [T]>,
}

impl<'a, T: Primitive> SliceSource<'a, T> {
    pub fn new(slice: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(slice).cast(),
            len: slice.len(),
            _borrow: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<'a, T: Primitive> From<&'a [T]> for SliceSource<'a, T> {
    fn from(slice: &'a [T]) -> Self {
        Self::new(slice)
    }
}

unsafe impl<T: Primitive> Pinnable for SliceSource<'_, T> {
    type Elem = T;

    fn pin(&self) -> Option<NonNull<T>> {
        Some(self.ptr)
    }

    unsafe fn unpin(&self, _ptr: NonNull<T>, _mode: ReleaseMode) {}
}

/// A mutably borrowed Rust slice passed where a destination is expected.
pub struct SliceSink<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _borrow: PhantomData<&'a mut [T]>,
}

impl<'a, T: Primitive> SliceSink<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            len: slice.len(),
            ptr: NonNull::from(slice).cast(),
            _borrow: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<'a, T: Primitive> From<&'a mut [T]> for SliceSink<'a, T> {
    fn from(slice: &'a mut [T]) -> Self {
        Self::new(slice)
    }
}

unsafe impl<T: Primitive> Pinnable for SliceSink<'_, T> {
    type Elem = T;

    fn pin(&self) -> Option<NonNull<T>> {
        Some(self.ptr)
    }

    unsafe fn unpin(&self, _ptr: NonNull<T>, _mode: ReleaseMode) {}
}

unsafe impl<T: Primitive> Writable for SliceSink<'_, T> {}
