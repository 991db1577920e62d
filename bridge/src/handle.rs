//! Typed handles for opaque native codec state.
//!
//! Native libraries hand out state as raw pointers. Across the host boundary
//! those pointers travel as a [`RawHandle`], an integer wide enough for a
//! pointer on every supported target. [`Handle<S>`] keeps the integer
//! representation but tags it with the opaque state type `S`, so a Speex bit
//! buffer can never be passed where an Opus decoder is expected.
//!
//! A handle is valid between the call that created it and the call that
//! destroys it. Nothing here tracks that window: using a destroyed handle is a
//! caller contract violation, exactly as it is for the native libraries.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Integer representation of a native state pointer.
pub type RawHandle = i64;

/// Handle to an opaque native state object of type `S`.
///
/// The null handle ([`Handle::NULL`]) is the sentinel returned when the
/// underlying constructor or lookup fails.
pub struct Handle<S> {
    raw: RawHandle,
    _state: PhantomData<fn() -> S>,
}

impl<S> Handle<S> {
    /// The sentinel handle.
    pub const NULL: Self = Self::from_raw(0);

    /// Wraps an integer received from the host.
    pub const fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _state: PhantomData,
        }
    }

    /// Wraps a native state pointer. A null pointer yields [`Handle::NULL`].
    pub fn from_ptr(ptr: *mut S) -> Self {
        Self::from_raw(ptr as isize as RawHandle)
    }

    /// Wraps a pointer to library-owned, immutable state.
    pub fn from_const_ptr(ptr: *const S) -> Self {
        Self::from_ptr(ptr.cast_mut())
    }

    /// Returns the integer handed to the host.
    pub const fn into_raw(self) -> RawHandle {
        self.raw
    }

    /// Returns true for the sentinel handle.
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// Returns the native pointer this handle stands for.
    pub fn as_ptr(&self) -> *mut S {
        self.raw as isize as *mut S
    }
}

impl<S> Clone for Handle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Handle<S> {}

impl<S> PartialEq for Handle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<S> Eq for Handle<S> {}

impl<S> Hash for Handle<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<S> Default for Handle<S> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<S> fmt::Debug for Handle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<S>();
        let name = name.rsplit("::").next().unwrap_or(name);
        write!(f, "Handle<{}>({:#x})", name, self.raw)
    }
}

impl<S> From<Handle<S>> for RawHandle {
    fn from(handle: Handle<S>) -> Self {
        handle.into_raw()
    }
}
