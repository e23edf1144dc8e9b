//! Reference-counted element buffer shared between a tensor and its views.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Element type stored in every buffer.
pub type Element = f32;

/// Size in bytes of one buffer element.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<Element>();

/// A contiguous block of `f32` elements that several tensors may alias.
///
/// Cloning a `SharedBuffer` produces another handle to the same memory;
/// use [`SharedBuffer::deep_copy`] for an independent block. The memory is
/// released when the last handle is dropped, so a view can never outlive
/// the data it reads.
#[derive(Clone)]
pub struct SharedBuffer {
    data: Rc<RefCell<Vec<Element>>>,
}

impl SharedBuffer {
    /// Create a zero-filled buffer of `len` elements.
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    /// Take ownership of an existing vector.
    pub fn from_vec(data: Vec<Element>) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Check if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the buffer in bytes.
    pub fn nbytes(&self) -> usize {
        self.len() * ELEMENT_SIZE
    }

    /// Borrow the elements immutably.
    ///
    /// # Panics
    /// Panics if the buffer is currently mutably borrowed.
    #[inline]
    pub fn read(&self) -> Ref<'_, [Element]> {
        Ref::map(self.data.borrow(), Vec::as_slice)
    }

    /// Borrow the elements mutably.
    ///
    /// # Panics
    /// Panics if the buffer is currently borrowed.
    #[inline]
    pub fn write(&self) -> RefMut<'_, [Element]> {
        RefMut::map(self.data.borrow_mut(), Vec::as_mut_slice)
    }

    /// Raw pointer to the first element, stable for the buffer's lifetime.
    pub fn as_ptr(&self) -> *const Element {
        self.data.borrow().as_ptr()
    }

    /// Whether both handles refer to the same memory.
    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to this buffer.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.data)
    }

    /// Copy the elements into a new, unshared buffer.
    pub fn deep_copy(&self) -> Self {
        Self::from_vec(self.data.borrow().clone())
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .field("handles", &self.handle_count())
            .finish()
    }
}
