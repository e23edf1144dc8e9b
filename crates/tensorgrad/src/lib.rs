//! tensorgrad - strided tensors with reverse-mode automatic differentiation
//!
//! This crate provides a small `f32` tensor type with explicit buffer
//! ownership and a dynamic computation graph for gradients.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Differentiable API (autograd module)
//!     → Graph, Variable, add / matmul / relu / mse_loss ...
//!
//! Level 2: Operation library (operations module)
//!     → add, sub, mul, matmul, transpose over plain tensors
//!
//! Level 3: Buffers and views (tensor, storage, strides)
//!     → shared buffers, row-major strides, zero-copy reshape/transpose
//! ```
//!
//! # Example
//!
//! ```
//! use tensorgrad::Tensor;
//!
//! // Create a 2x3 tensor (row-major order)
//! let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! assert_eq!(t.get(&[1, 0]), Some(4.0));
//!
//! // Views share the buffer, clones do not
//! let view = t.transpose(0, 1).unwrap();
//! assert!(view.shares_storage_with(&t));
//! assert!(!view.clone().shares_storage_with(&t));
//! ```
//!
//! # Features
//!
//! - `autograd` (default): the [`autograd`] module.

#[cfg(feature = "autograd")]
pub mod autograd;
pub mod error;
pub mod operations;
pub mod random;
pub mod storage;
pub mod strides;
pub mod tensor;

pub use error::TensorError;
pub use storage::{ELEMENT_SIZE, Element};
pub use tensor::Tensor;
