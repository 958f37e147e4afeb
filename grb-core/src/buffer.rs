//! Buffer ownership for matrix storage, replacing the C-style
//! `*_shallow` bookkeeping with a type that tells owned and shared
//! storage apart.
//!
//! A lifetime-parameterized `Owned { buf, size }` vs. `Borrowed { buf,
//! size, lifetime-token }` split was considered first, modeled on a
//! lifetime parameter threaded through the matrix. In practice that
//! lifetime would have to appear on `Matrix` itself, and `Matrix` values
//! are moved across threads, stored in the pending-queue machinery and
//! handed back across the public API by value — a borrowed-with-lifetime
//! design would infect every call site that touches a matrix. `Buffer<T>`
//! realizes the same ownership distinction with `Arc` instead: a shallow
//! copy shares the owner's allocation (refcounted, not literally
//! borrowed), and "must not outlive the owner" becomes "the refcount
//! keeps it alive exactly as long as a shallow copy exists" rather than a
//! compile-time borrow-checked fact. `matrix_transplant` moves the
//! `Owned` case and clones-to-owned the `Shared` case: the source's
//! non-shallow buffers move, and any shallow pieces get copied rather
//! than left dangling.

use std::sync::Arc;

/// A matrix-storage buffer: either exclusively owned or shared (shallow)
/// with another matrix.
#[derive(Clone, Debug)]
pub enum Buffer<T> {
    /// Exclusively owned; mutation is direct.
    Owned(Vec<T>),
    /// Shared with another matrix's allocation; mutation clones first
    /// (copy-on-write via [`Buffer::make_mut`]).
    Shared(Arc<[T]>),
}

impl<T: Clone> Buffer<T> {
    /// An empty owned buffer.
    pub fn new() -> Buffer<T> {
        Buffer::Owned(Vec::new())
    }

    /// Wrap an owned vector.
    pub fn owned(v: Vec<T>) -> Buffer<T> {
        Buffer::Owned(v)
    }

    /// `true` if this buffer is a shallow (shared) copy.
    pub fn is_shallow(&self) -> bool {
        matches!(self, Buffer::Shared(_))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Buffer::Owned(v) => v.len(),
            Buffer::Shared(s) => s.len(),
        }
    }

    /// `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only view.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Buffer::Owned(v) => v.as_slice(),
            Buffer::Shared(s) => s,
        }
    }

    /// A shallow (refcounted) copy, sharing the same allocation. Promotes
    /// an `Owned` buffer to `Shared` in place so both copies observe the
    /// same bytes until one of them calls `make_mut`.
    pub fn share(&mut self) -> Buffer<T> {
        match self {
            Buffer::Shared(s) => Buffer::Shared(Arc::clone(s)),
            Buffer::Owned(v) => {
                let shared: Arc<[T]> = Arc::from(std::mem::take(v).into_boxed_slice());
                *self = Buffer::Shared(Arc::clone(&shared));
                Buffer::Shared(shared)
            }
        }
    }

    /// Mutable view, cloning the underlying data first if this buffer is
    /// shared (copy-on-write).
    pub fn make_mut(&mut self) -> &mut Vec<T> {
        if let Buffer::Shared(s) = self {
            *self = Buffer::Owned(s.to_vec());
        }
        match self {
            Buffer::Owned(v) => v,
            Buffer::Shared(_) => unreachable!(),
        }
    }

    /// Take ownership, cloning if shared, leaving an empty owned buffer
    /// behind (per `matrix_transplant`'s "leaves `src` empty" contract).
    pub fn take_owned(&mut self) -> Vec<T> {
        match std::mem::replace(self, Buffer::Owned(Vec::new())) {
            Buffer::Owned(v) => v,
            Buffer::Shared(s) => s.to_vec(),
        }
    }
}

impl<T: Clone> Default for Buffer<T> {
    fn default() -> Buffer<T> {
        Buffer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_buffer_mutation_copies_on_write() {
        let mut a: Buffer<i64> = Buffer::owned(vec![1, 2, 3]);
        let mut b = a.share();
        assert!(a.is_shallow());
        assert!(b.is_shallow());
        b.make_mut().push(4);
        assert_eq!(a.as_slice(), &[1, 2, 3]);
        assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn take_owned_empties_the_source() {
        let mut a: Buffer<u8> = Buffer::owned(vec![9, 9]);
        let taken = a.take_owned();
        assert_eq!(taken, vec![9, 9]);
        assert!(a.is_empty());
    }
}
