//! Differentiable operations over graph variables.
//!
//! Each function runs the forward computation on the inputs' data, inserts
//! the result into the graph and, when any input requires grad, links it to
//! a new function record. A failed call leaves the graph unchanged.

use super::function::{Function, FunctionKind};
use super::graph::Graph;
use super::variable::VarId;
use crate::error::TensorError;

fn apply(graph: &mut Graph, kind: FunctionKind, inputs: &[VarId]) -> Result<VarId, TensorError> {
    let tensors = inputs
        .iter()
        .map(|&id| graph.data(id))
        .collect::<Result<Vec<_>, _>>()?;
    let (function, output) = Function::forward(kind, &tensors)?;
    Ok(graph.record(function, inputs, output))
}

/// `a + b` with scalar and row-bias broadcasting of `b`.
///
/// # Example
///
/// ```
/// use tensorgrad::Tensor;
/// use tensorgrad::autograd::{Graph, add};
///
/// let mut graph = Graph::new();
/// let x = graph.leaf(Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap(), true);
/// let bias = graph.leaf(Tensor::from_vec(vec![10.0, 20.0], &[2]).unwrap(), true);
/// let y = add(&mut graph, x, bias).unwrap();
/// assert_eq!(graph.data(y).unwrap().to_vec().unwrap(), vec![11.0, 22.0, 13.0, 24.0]);
/// ```
pub fn add(graph: &mut Graph, a: VarId, b: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Add, &[a, b])
}

/// `a - b` with the same broadcasting as [`add`].
pub fn sub(graph: &mut Graph, a: VarId, b: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Sub, &[a, b])
}

/// Element-wise product of equally shaped variables.
pub fn mul(graph: &mut Graph, a: VarId, b: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Mul, &[a, b])
}

/// Matrix product of two rank-2 variables.
pub fn matmul(graph: &mut Graph, a: VarId, b: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::MatMul, &[a, b])
}

pub fn relu(graph: &mut Graph, x: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Relu, &[x])
}

pub fn sigmoid(graph: &mut Graph, x: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Sigmoid, &[x])
}

pub fn tanh(graph: &mut Graph, x: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::Tanh, &[x])
}

/// Mean squared error, a `[1]` variable.
pub fn mse_loss(graph: &mut Graph, predicted: VarId, target: VarId) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::MseLoss, &[predicted, target])
}

/// Binary cross-entropy, a `[1]` variable.
///
/// Predictions are clamped to `[1e-8, 1 - 1e-8]` before taking logarithms.
pub fn binary_cross_entropy_loss(
    graph: &mut Graph,
    predicted: VarId,
    target: VarId,
) -> Result<VarId, TensorError> {
    apply(graph, FunctionKind::BceLoss, &[predicted, target])
}
