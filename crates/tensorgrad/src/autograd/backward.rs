//! Backward pass execution for reverse-mode automatic differentiation.

use std::collections::HashSet;

use super::graph::{FunctionId, Graph};
use super::variable::VarId;
use crate::error::TensorError;
use crate::tensor::Tensor;

/// Variables with a producing function reachable from `root`, ordered so
/// that every variable comes before the inputs of its function.
///
/// Discovery is a depth-first post-order walk with an explicit stack; each
/// function is visited once even when several paths reach it. The post-order
/// is reversed before returning.
pub fn topological_order(graph: &Graph, root: VarId) -> Result<Vec<VarId>, TensorError> {
    let mut order = Vec::new();
    let Some(root_fn) = graph.variable(root)?.grad_fn() else {
        return Ok(order);
    };

    let mut visited: HashSet<FunctionId> = HashSet::from([root_fn]);
    // (variable, index of the next input to explore)
    let mut stack: Vec<(VarId, usize)> = vec![(root, 0)];

    while let Some((var, next)) = stack.last_mut() {
        let inputs: &[VarId] = match graph.variable(*var)?.grad_fn().and_then(|f| graph.function(f)) {
            Some(record) => record.inputs(),
            None => &[],
        };

        if let Some(&child) = inputs.get(*next) {
            *next += 1;
            if let Some(child_fn) = graph.variable(child)?.grad_fn() {
                if visited.insert(child_fn) {
                    stack.push((child, 0));
                }
            }
        } else {
            order.push(*var);
            stack.pop();
        }
    }

    order.reverse();
    Ok(order)
}

impl Graph {
    /// Propagate gradients from `root` to every ancestor that requires them.
    ///
    /// A one-element root is seeded with ones. Any other root must already
    /// hold its seed gradient (see [`Graph::set_grad`]). Gradients of
    /// intermediate variables are reset at the start of every pass, while
    /// leaf gradients accumulate across passes; call [`Graph::zero_grad`]
    /// between passes to start leaves from zero.
    ///
    /// # Errors
    ///
    /// - `NoGradient` if `root` does not require grad
    /// - `MissingGradient` if a non-scalar root has no allocated gradient
    pub fn backward(&mut self, root: VarId) -> Result<(), TensorError> {
        let root_var = self.variable_mut(root)?;
        if !root_var.requires_grad() {
            return Err(TensorError::NoGradient);
        }
        if root_var.numel() == 1 {
            let seed = Tensor::ones(root_var.shape());
            root_var.set_grad(seed)?;
        } else if !root_var.grad().is_some_and(Tensor::is_allocated) {
            return Err(TensorError::MissingGradient {
                shape: root_var.shape().to_vec(),
            });
        }

        let order = topological_order(self, root)?;
        tracing::debug!(root = root.index(), records = order.len(), "backward");

        for &var in order.iter().filter(|&&var| var != root) {
            self.variable_mut(var)?.zero_grad()?;
        }

        for var in order {
            let variable = self.variable(var)?;
            let (Some(fid), Some(grad)) = (variable.grad_fn(), variable.grad()) else {
                continue;
            };
            let Some(record) = self.function(fid) else {
                continue;
            };
            let _span = tracing::trace_span!("backward_fn", name = record.function().name()).entered();

            let grads = record.function().backward(&[grad])?;
            let inputs = record.inputs().to_vec();

            for (input, g) in inputs.into_iter().zip(grads) {
                let input_var = self.variable_mut(input)?;
                if input_var.requires_grad() {
                    input_var.accumulate_grad(g)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{add, matmul, mul};

    #[test]
    fn test_topological_order_leaf_root() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[1]), true);
        assert!(topological_order(&graph, a).unwrap().is_empty());
    }

    #[test]
    fn test_topological_order_chain() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[2]), true);
        let b = graph.leaf(Tensor::ones(&[2]), true);
        let c = mul(&mut graph, a, b).unwrap();
        let d = add(&mut graph, c, a).unwrap();

        assert_eq!(topological_order(&graph, d).unwrap(), vec![d, c]);
    }

    #[test]
    fn test_topological_order_diamond_visits_once() {
        let mut graph = Graph::new();
        let x = graph.leaf(Tensor::ones(&[2]), true);
        let h = mul(&mut graph, x, x).unwrap();
        let l = add(&mut graph, h, h).unwrap();
        let order = topological_order(&graph, l).unwrap();
        assert_eq!(order, vec![l, h]);
    }

    #[test]
    fn test_order_puts_consumers_first() {
        let mut graph = Graph::new();
        let x = graph.leaf(Tensor::ones(&[2, 2]), true);
        let a = matmul(&mut graph, x, x).unwrap();
        let b = add(&mut graph, a, x).unwrap();
        let c = mul(&mut graph, b, a).unwrap();
        let order = topological_order(&graph, c).unwrap();

        let pos = |v: VarId| order.iter().position(|&o| o == v).unwrap();
        assert!(pos(c) < pos(b));
        assert!(pos(b) < pos(a));
        assert!(pos(c) < pos(a));
    }

    #[test]
    fn test_backward_no_gradient() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[1]), false);
        assert_eq!(graph.backward(a).unwrap_err(), TensorError::NoGradient);
    }

    #[test]
    fn test_backward_missing_gradient() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[2]), true);
        let b = mul(&mut graph, a, a).unwrap();
        graph.variable_mut(b).unwrap().clear_grad();

        assert_eq!(
            graph.backward(b).unwrap_err(),
            TensorError::MissingGradient { shape: vec![2] }
        );
    }

    #[test]
    fn test_backward_explicit_seed() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap(), true);
        let b = mul(&mut graph, a, a).unwrap();
        graph
            .set_grad(b, Tensor::from_vec(vec![1.0, 10.0], &[2]).unwrap())
            .unwrap();
        graph.backward(b).unwrap();

        // d(a^2)/da = 2a, scaled by the seed
        assert_eq!(graph.grad(a).unwrap().unwrap().to_vec().unwrap(), vec![2.0, 40.0]);
    }

    #[test]
    fn test_backward_leaf_root_seeds_itself() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::full(&[1], 3.0), true);
        graph.backward(a).unwrap();
        assert_eq!(graph.grad(a).unwrap().unwrap().item().unwrap(), 1.0);
    }

    #[test]
    fn test_backward_skips_non_tracking_inputs() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::full(&[1], 2.0), true);
        let k = graph.leaf(Tensor::full(&[1], 5.0), false);
        let c = mul(&mut graph, a, k).unwrap();
        graph.backward(c).unwrap();

        assert_eq!(graph.grad(a).unwrap().unwrap().item().unwrap(), 5.0);
        assert!(graph.grad(k).unwrap().is_none());
    }
}
