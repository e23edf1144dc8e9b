//! Matrix multiplication and transposition.

use crate::error::TensorError;
use crate::storage::SharedBuffer;
use crate::tensor::Tensor;

/// Matrix product of two rank-2 tensors.
///
/// Operands may be strided views, e.g. the output of
/// [`transpose`](Tensor::transpose).
///
/// # Errors
///
/// `ShapeMismatch` unless both operands are rank 2 with `a.shape[1] ==
/// b.shape[0]`; `Uninitialized` if either has no buffer.
///
/// # Example
///
/// ```
/// use tensorgrad::Tensor;
/// use tensorgrad::operations::matmul;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], &[3, 2]).unwrap();
/// let c = matmul(&a, &b).unwrap();
/// assert_eq!(c.shape(), &[2, 2]);
/// assert_eq!(c.to_vec().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
/// ```
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor, TensorError> {
    if a.dim() != 2 || b.dim() != 2 || a.shape()[1] != b.shape()[0] {
        return Err(TensorError::ShapeMismatch {
            op: "matmul",
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    let a_data = a.buffer("matmul")?.read();
    let b_data = b.buffer("matmul")?.read();

    let (m, k, n) = (a.shape()[0], a.shape()[1], b.shape()[1]);
    let (a_rs, a_cs) = (a.strides()[0], a.strides()[1]);
    let (b_rs, b_cs) = (b.strides()[0], b.strides()[1]);

    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                acc += a_data[i * a_rs + p * a_cs] * b_data[p * b_rs + j * b_cs];
            }
            out[i * n + j] = acc;
        }
    }

    Ok(Tensor::from_buffer(SharedBuffer::from_vec(out), &[m, n]))
}

/// Swap two dimensions of `a`, returning a non-owning view.
///
/// See [`Tensor::transpose`].
pub fn transpose(a: &Tensor, dim0: usize, dim1: usize) -> Result<Tensor, TensorError> {
    a.transpose(dim0, dim1)
}
