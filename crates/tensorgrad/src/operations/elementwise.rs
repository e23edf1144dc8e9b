//! Element-wise tensor operations.
//!
//! Every function reads its inputs through their strides and returns a new
//! owning, contiguous tensor.

use crate::error::TensorError;
use crate::storage::{Element, SharedBuffer};
use crate::tensor::Tensor;

/// How the right operand of `add`/`sub` lines up with the left one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    /// Identical shapes.
    Same,
    /// Right operand has a single element.
    Scalar,
    /// Left is `[m, n]`, right is `[n]`: the right row is added to every row.
    Bias,
}

/// Classify a pair of shapes for `add`/`sub`.
///
/// The checks run in priority order: single-element right operand, then the
/// row-bias case, then an exact match.
pub fn broadcast_kind(
    op: &'static str,
    lhs: &[usize],
    rhs: &[usize],
) -> Result<Broadcast, TensorError> {
    if rhs.iter().product::<usize>() == 1 {
        Ok(Broadcast::Scalar)
    } else if lhs.len() == 2 && rhs.len() == 1 && rhs[0] == lhs[1] {
        Ok(Broadcast::Bias)
    } else if lhs == rhs {
        Ok(Broadcast::Same)
    } else {
        Err(TensorError::ShapeMismatch {
            op,
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        })
    }
}

fn from_values(values: Vec<Element>, shape: &[usize]) -> Tensor {
    Tensor::from_buffer(SharedBuffer::from_vec(values), shape)
}

fn broadcast_binary<F>(op: &'static str, a: &Tensor, b: &Tensor, f: F) -> Result<Tensor, TensorError>
where
    F: Fn(Element, Element) -> Element,
{
    let a_data = a.buffer(op)?.read();
    let b_data = b.buffer(op)?.read();
    let kind = broadcast_kind(op, a.shape(), b.shape())?;

    let values: Vec<Element> = match kind {
        Broadcast::Same => a
            .offsets()
            .zip(b.offsets())
            .map(|(i, j)| f(a_data[i], b_data[j]))
            .collect(),
        Broadcast::Scalar => {
            let s = b_data[0];
            a.offsets().map(|i| f(a_data[i], s)).collect()
        }
        Broadcast::Bias => {
            let n = b.shape()[0];
            let stride = b.strides()[0];
            a.offsets()
                .enumerate()
                .map(|(k, i)| f(a_data[i], b_data[(k % n) * stride]))
                .collect()
        }
    };

    Ok(from_values(values, a.shape()))
}

/// Element-wise sum with scalar and row-bias broadcasting.
///
/// # Errors
///
/// `Uninitialized` if either operand has no buffer, `ShapeMismatch` if the
/// shapes cannot be broadcast.
///
/// # Example
///
/// ```
/// use tensorgrad::Tensor;
/// use tensorgrad::operations::add;
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let bias = Tensor::from_vec(vec![10.0, 20.0], &[2]).unwrap();
/// let c = add(&a, &bias).unwrap();
/// assert_eq!(c.to_vec().unwrap(), vec![11.0, 22.0, 13.0, 24.0]);
/// ```
pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor, TensorError> {
    broadcast_binary("add", a, b, |x, y| x + y)
}

/// Element-wise difference with the same broadcasting as [`add`].
pub fn sub(a: &Tensor, b: &Tensor) -> Result<Tensor, TensorError> {
    broadcast_binary("sub", a, b, |x, y| x - y)
}

/// Combine two tensors of identical shape element by element.
pub fn zip_map<F>(op: &'static str, a: &Tensor, b: &Tensor, f: F) -> Result<Tensor, TensorError>
where
    F: Fn(Element, Element) -> Element,
{
    let a_data = a.buffer(op)?.read();
    let b_data = b.buffer(op)?.read();
    if a.shape() != b.shape() {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    let values = a
        .offsets()
        .zip(b.offsets())
        .map(|(i, j)| f(a_data[i], b_data[j]))
        .collect();
    Ok(from_values(values, a.shape()))
}

/// Element-wise (Hadamard) product. Shapes must match exactly.
pub fn mul(a: &Tensor, b: &Tensor) -> Result<Tensor, TensorError> {
    zip_map("mul", a, b, |x, y| x * y)
}

/// Apply a function to every element.
///
/// # Example
///
/// ```
/// use tensorgrad::Tensor;
/// use tensorgrad::operations::map;
///
/// let t = Tensor::from_vec(vec![-1.0, 2.0], &[2]).unwrap();
/// let r = map(&t, |x| x.max(0.0)).unwrap();
/// assert_eq!(r.to_vec().unwrap(), vec![0.0, 2.0]);
/// ```
pub fn map<F>(t: &Tensor, f: F) -> Result<Tensor, TensorError>
where
    F: Fn(Element) -> Element,
{
    let data = t.buffer("map")?.read();
    let values = t.offsets().map(|i| f(data[i])).collect();
    Ok(from_values(values, t.shape()))
}

/// Multiply every element by `alpha`.
pub fn scale(t: &Tensor, alpha: Element) -> Result<Tensor, TensorError> {
    map(t, |x| x * alpha)
}

pub fn neg(t: &Tensor) -> Result<Tensor, TensorError> {
    map(t, |x| -x)
}

/// Sum of all elements.
pub fn sum_all(t: &Tensor) -> Result<Element, TensorError> {
    let data = t.buffer("sum")?.read();
    Ok(t.offsets().map(|i| data[i]).sum())
}

/// Mean of all elements. Empty tensors have mean zero.
pub fn mean_all(t: &Tensor) -> Result<Element, TensorError> {
    let n = t.numel();
    if n == 0 {
        return Ok(0.0);
    }
    Ok(sum_all(t)? / n as Element)
}

/// Accumulate `src` into `dst` in place: `dst += src`.
///
/// Writes go through `dst`'s strides, so every alias of its buffer sees the
/// update. `src` may alias `dst`.
pub fn add_inplace(dst: &mut Tensor, src: &Tensor) -> Result<(), TensorError> {
    if dst.shape() != src.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "add_inplace",
            lhs: dst.shape().to_vec(),
            rhs: src.shape().to_vec(),
        });
    }
    // Read first so an aliased source is not borrowed while writing.
    let values = src.to_vec()?;
    let mut data = dst.buffer("add_inplace")?.write();
    for (offset, v) in dst.offsets().zip(values) {
        data[offset] += v;
    }
    Ok(())
}

/// Sum a broadcast result back down to `shape`.
///
/// Inverse of the broadcasting done by [`add`]: a `[m, n]` gradient reduces to
/// a single element for a scalar operand or to per-column sums for a `[n]`
/// bias. Equal shapes produce a plain copy.
pub fn reduce_to_shape(grad: &Tensor, shape: &[usize]) -> Result<Tensor, TensorError> {
    if grad.shape() == shape {
        return Ok(grad.clone());
    }
    let data = grad.buffer("reduce_to_shape")?.read();

    if shape.iter().product::<usize>() == 1 {
        let total: Element = grad.offsets().map(|i| data[i]).sum();
        return Ok(from_values(vec![total], shape));
    }

    if grad.dim() == 2 && shape.len() == 1 && shape[0] == grad.shape()[1] {
        let n = shape[0];
        let mut sums = vec![0.0; n];
        for (k, i) in grad.offsets().enumerate() {
            sums[k % n] += data[i];
        }
        return Ok(from_values(sums, shape));
    }

    Err(TensorError::ShapeMismatch {
        op: "reduce_to_shape",
        lhs: grad.shape().to_vec(),
        rhs: shape.to_vec(),
    })
}
