//! Reverse-mode automatic differentiation.
//!
//! Variables and operation records live in an explicit [`Graph`] arena and
//! refer to each other by index. Operations are built on demand as client
//! code calls [`add`], [`matmul`] and friends; [`Graph::backward`] walks the
//! recorded graph from a root and accumulates gradients into every ancestor.
//!
//! # Architecture
//!
//! ```text
//! Graph
//!  ├── Vec<Variable>         data, grad, requires_grad, grad_fn ──┐
//!  │        ▲                                                     │ FunctionId
//!  │        │ VarId (inputs, output)                              ▼
//!  └── Vec<FunctionRecord>   Function (closed enum, retained tensors)
//! ```
//!
//! # Example
//!
//! ```
//! use tensorgrad::Tensor;
//! use tensorgrad::autograd::{Graph, matmul, mse_loss, relu};
//!
//! let mut graph = Graph::new();
//! let x = graph.leaf(Tensor::from_vec(vec![1.0, -2.0, 3.0, 0.5], &[2, 2]).unwrap(), false);
//! let w = graph.leaf(Tensor::ones(&[2, 1]), true);
//! let target = graph.leaf(Tensor::zeros(&[2, 1]), false);
//!
//! let h = matmul(&mut graph, x, w).unwrap();
//! let y = relu(&mut graph, h).unwrap();
//! let loss = mse_loss(&mut graph, y, target).unwrap();
//!
//! graph.backward(loss).unwrap();
//! assert_eq!(graph.grad(w).unwrap().unwrap().shape(), &[2, 1]);
//! ```

mod backward;
mod function;
mod graph;
mod ops;
mod variable;

pub use backward::topological_order;
pub use function::{BCE_EPSILON, Function, FunctionKind};
pub use graph::{FunctionId, FunctionRecord, Graph};
pub use ops::{add, binary_cross_entropy_loss, matmul, mse_loss, mul, relu, sigmoid, sub, tanh};
pub use variable::{VarId, Variable};
