//! Strided tensor type.

use std::cell::{Ref, RefMut};

use crate::error::TensorError;
use crate::storage::{ELEMENT_SIZE, Element, SharedBuffer};
use crate::strides::{StridedOffsets, cartesian_to_linear, checked_numel, compute_strides};

/// An n-dimensional `f32` array over a possibly shared buffer.
///
/// A tensor is a handle (`buffer`) plus a layout (`shape`, `strides`) and two
/// flags. `contiguous` is set only when the tensor owns a freshly laid-out
/// buffer; views produced by [`reshape`](Tensor::reshape),
/// [`transpose`](Tensor::transpose) and [`alias`](Tensor::alias) alias the
/// buffer of their source and are never owners.
///
/// `Clone` is a deep copy into a new owning, contiguous buffer.
#[derive(Debug)]
pub struct Tensor {
    buffer: Option<SharedBuffer>,
    shape: Vec<usize>,
    strides: Vec<usize>,
    contiguous: bool,
    owns_data: bool,
}

impl Tensor {
    /// Create a tensor with the given shape and no buffer.
    ///
    /// Call [`allocate`](Tensor::allocate) before reading or writing elements.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidShape` if the element count overflows.
    pub fn new(shape: &[usize]) -> Result<Self, TensorError> {
        checked_numel(shape)?;
        Ok(Self {
            buffer: None,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            contiguous: false,
            owns_data: false,
        })
    }

    /// Create an owning, zero-initialized tensor.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.numel(), 24);
    /// assert!(t.is_contiguous());
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor with every element set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if the number of elements overflows `usize`. Use
    /// [`Tensor::new`] followed by [`Tensor::allocate`] to validate first.
    pub fn full(shape: &[usize], value: Element) -> Self {
        let numel = checked_numel(shape).unwrap_or_else(|err| panic!("{err}"));
        Self::from_buffer(SharedBuffer::from_vec(vec![value; numel]), shape)
    }

    /// Create a rank-0 tensor holding one value.
    pub fn scalar(value: Element) -> Self {
        Self::full(&[], value)
    }

    /// Create tensor from data and shape.
    ///
    /// Data is expected in row-major order.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::Shape` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[0, 1]), Some(2.0));
    /// assert_eq!(t.get(&[1, 0]), Some(4.0));
    /// ```
    pub fn from_vec(data: Vec<Element>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = checked_numel(shape)?;
        if data.len() != expected {
            return Err(TensorError::Shape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_buffer(SharedBuffer::from_vec(data), shape))
    }

    pub(crate) fn from_buffer(buffer: SharedBuffer, shape: &[usize]) -> Self {
        debug_assert_eq!(buffer.len(), shape.iter().product::<usize>());
        Self {
            buffer: Some(buffer),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            contiguous: true,
            owns_data: true,
        }
    }

    fn view(&self, shape: Vec<usize>, strides: Vec<usize>) -> Self {
        Self {
            buffer: self.buffer.clone(),
            shape,
            strides,
            contiguous: false,
            owns_data: false,
        }
    }

    /// Reserve a zero-filled buffer. No-op if already allocated.
    ///
    /// The tensor becomes the owner of a contiguous row-major layout.
    pub fn allocate(&mut self) {
        if self.buffer.is_some() {
            return;
        }
        let numel = self.numel();
        tracing::trace!(numel, bytes = numel * ELEMENT_SIZE, "allocate");
        self.buffer = Some(SharedBuffer::zeros(numel));
        self.strides = compute_strides(&self.shape);
        self.contiguous = true;
        self.owns_data = true;
    }

    /// Drop this tensor's handle to the buffer.
    ///
    /// The memory is freed once no other handle refers to it, so aliases
    /// created earlier, and the owner of a view, stay readable.
    pub fn deallocate(&mut self) {
        self.buffer = None;
        self.owns_data = false;
        self.contiguous = false;
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get strides, in elements.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements. A rank-0 tensor has one.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Logical size in bytes.
    pub fn nbytes(&self) -> usize {
        self.numel() * ELEMENT_SIZE
    }

    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    #[inline]
    pub fn is_owner(&self) -> bool {
        self.owns_data
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    /// Pointer to the first buffer element, or null when unallocated.
    pub fn data_ptr(&self) -> *const Element {
        self.buffer
            .as_ref()
            .map_or(std::ptr::null(), SharedBuffer::as_ptr)
    }

    /// Check if this tensor shares storage with another tensor.
    pub fn shares_storage_with(&self, other: &Tensor) -> bool {
        match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub(crate) fn buffer(&self, op: &'static str) -> Result<&SharedBuffer, TensorError> {
        self.buffer
            .as_ref()
            .ok_or(TensorError::Uninitialized { op })
    }

    /// Borrow the raw buffer in physical order.
    ///
    /// For views this is the whole aliased buffer; use [`to_vec`](Tensor::to_vec)
    /// for the logical element order.
    pub fn data(&self) -> Result<Ref<'_, [Element]>, TensorError> {
        Ok(self.buffer("data")?.read())
    }

    /// Mutably borrow the raw buffer in physical order.
    ///
    /// Writes are visible through every alias of the buffer.
    pub fn data_mut(&self) -> Result<RefMut<'_, [Element]>, TensorError> {
        Ok(self.buffer("data_mut")?.write())
    }

    /// Buffer offsets of every element in logical row-major order.
    pub fn offsets(&self) -> StridedOffsets<'_> {
        StridedOffsets::new(&self.shape, &self.strides)
    }

    fn offset_of(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.dim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.dim(),
                actual: indices.len(),
            });
        }
        for (&idx, &dim_size) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim_size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    dim_size,
                });
            }
        }
        Ok(cartesian_to_linear(indices, &self.strides))
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if unallocated, out of bounds, or the wrong number of
    /// indices is given.
    pub fn get(&self, indices: &[usize]) -> Option<Element> {
        let offset = self.offset_of(indices).ok()?;
        let buffer = self.buffer.as_ref()?;
        buffer.read().get(offset).copied()
    }

    /// Set element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds, the wrong number of
    /// indices is given, or the tensor is unallocated.
    pub fn set(&mut self, indices: &[usize], value: Element) -> Result<(), TensorError> {
        let offset = self.offset_of(indices)?;
        self.buffer("set")?.write()[offset] = value;
        Ok(())
    }

    /// Fill all logical elements with a value.
    pub fn fill(&mut self, value: Element) -> Result<(), TensorError> {
        let buffer = self.buffer("fill")?;
        let mut data = buffer.write();
        for offset in StridedOffsets::new(&self.shape, &self.strides) {
            data[offset] = value;
        }
        Ok(())
    }

    /// Copy the elements out in logical row-major order.
    pub fn to_vec(&self) -> Result<Vec<Element>, TensorError> {
        let data = self.buffer("to_vec")?.read();
        Ok(self.offsets().map(|o| data[o]).collect())
    }

    /// The single value of a one-element tensor.
    pub fn item(&self) -> Result<Element, TensorError> {
        if self.numel() != 1 {
            return Err(TensorError::Shape {
                expected: 1,
                actual: self.numel(),
            });
        }
        // Views never carry an offset, so the first element sits at 0.
        Ok(self.buffer("item")?.read()[0])
    }

    /// A non-owning handle to the same buffer, shape and strides.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::ones(&[2, 2]);
    /// let mut a = t.alias();
    /// a.set(&[0, 0], 5.0).unwrap();
    /// assert_eq!(t.get(&[0, 0]), Some(5.0));
    /// assert!(!a.is_owner());
    /// ```
    pub fn alias(&self) -> Tensor {
        self.view(self.shape.clone(), self.strides.clone())
    }

    /// Reshape the tensor to a new shape (zero-copy view).
    ///
    /// The result aliases the same buffer with row-major strides for
    /// `new_shape`, so it reinterprets the buffer in physical order. Clone a
    /// transposed view first to reshape its logical order.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::Shape` if the total number of elements differs.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let t3x2 = t.reshape(&[3, 2]).unwrap();
    /// assert_eq!(t3x2.shape(), &[3, 2]);
    /// assert!(t.shares_storage_with(&t3x2));
    /// assert!(t.reshape(&[4]).is_err());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Tensor, TensorError> {
        let new_numel = checked_numel(new_shape)?;
        if new_numel != self.numel() {
            return Err(TensorError::Shape {
                expected: self.numel(),
                actual: new_numel,
            });
        }
        Ok(self.view(new_shape.to_vec(), compute_strides(new_shape)))
    }

    /// Swap two dimensions (zero-copy view).
    ///
    /// # Errors
    ///
    /// Returns `TensorError::DimOutOfRange` if either dimension is not below
    /// the rank.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let tt = t.transpose(0, 1).unwrap();
    /// assert_eq!(tt.shape(), &[3, 2]);
    /// assert_eq!(tt.strides(), &[1, 3]);
    /// assert_eq!(tt.get(&[2, 1]), Some(6.0));
    /// ```
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Tensor, TensorError> {
        let ndim = self.dim();
        for dim in [dim0, dim1] {
            if dim >= ndim {
                return Err(TensorError::DimOutOfRange { dim, ndim });
            }
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.swap(dim0, dim1);
        strides.swap(dim0, dim1);
        Ok(self.view(shape, strides))
    }

    /// Return a tensor whose elements are laid out in row-major order.
    ///
    /// Contiguous tensors are aliased; anything else is deep-copied.
    pub fn contiguous(&self) -> Tensor {
        if self.contiguous {
            self.alias()
        } else {
            self.clone()
        }
    }
}

impl Clone for Tensor {
    /// Deep copy into a new owning, contiguous buffer in logical order.
    ///
    /// Cloning an unallocated tensor gives an unallocated tensor of the same
    /// shape.
    fn clone(&self) -> Self {
        match &self.buffer {
            Some(buffer) => {
                let data = buffer.read();
                let values = self.offsets().map(|o| data[o]).collect();
                Self::from_buffer(SharedBuffer::from_vec(values), &self.shape)
            }
            None => Self {
                buffer: None,
                shape: self.shape.clone(),
                strides: compute_strides(&self.shape),
                contiguous: false,
                owns_data: false,
            },
        }
    }
}
