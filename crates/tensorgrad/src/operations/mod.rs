//! Tensor operations.
//!
//! Pure functions over [`Tensor`](crate::Tensor). Results are freshly
//! allocated, fully initialized and contiguous, except [`transpose`] which
//! returns a view.
//!
//! ```text
//! add, sub     scalar / row-bias / exact-shape broadcasting
//! mul          exact shape
//! matmul       rank-2 only, strided reads
//! transpose    zero-copy view
//! ```

mod elementwise;
mod matmul;

pub use elementwise::{
    Broadcast, add, add_inplace, broadcast_kind, map, mean_all, mul, neg, reduce_to_shape, scale,
    sub, sum_all, zip_map,
};
pub use matmul::{matmul, transpose};
