//! Computation graph for reverse-mode automatic differentiation.
//!
//! The graph is an arena: variables and function records live in vectors and
//! refer to each other by index. Records point at their inputs and output by
//! [`VarId`]; variables point at their producing record by [`FunctionId`].

use super::function::Function;
use super::variable::{VarId, Variable};
use crate::error::TensorError;
use crate::tensor::Tensor;

/// Unique identifier for a function record in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(usize);

impl FunctionId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A recorded operation together with the variables it connects.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    function: Function,
    inputs: Vec<VarId>,
    output: VarId,
}

impl FunctionRecord {
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Input variables in forward-call order.
    pub fn inputs(&self) -> &[VarId] {
        &self.inputs
    }

    pub fn output(&self) -> VarId {
        self.output
    }
}

/// Arena owning every variable and function record of a computation.
///
/// # Example
///
/// ```
/// use tensorgrad::Tensor;
/// use tensorgrad::autograd::{Graph, mul};
///
/// let mut graph = Graph::new();
/// let a = graph.leaf(Tensor::from_vec(vec![2.0], &[1]).unwrap(), true);
/// let b = graph.leaf(Tensor::from_vec(vec![3.0], &[1]).unwrap(), true);
/// let c = mul(&mut graph, a, b).unwrap();
///
/// graph.backward(c).unwrap();
/// assert_eq!(graph.grad(a).unwrap().unwrap().item().unwrap(), 3.0);
/// assert_eq!(graph.grad(b).unwrap().unwrap().item().unwrap(), 2.0);
/// ```
#[derive(Debug, Default)]
pub struct Graph {
    variables: Vec<Variable>,
    functions: Vec<FunctionRecord>,
}

impl Graph {
    /// Create a new empty computation graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a variable and return its id.
    pub fn insert(&mut self, variable: Variable) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(variable);
        id
    }

    /// Create a leaf variable from a tensor.
    pub fn leaf(&mut self, data: Tensor, requires_grad: bool) -> VarId {
        self.insert(Variable::new(data, requires_grad))
    }

    /// Insert the output of `function` applied to `inputs`.
    ///
    /// The output tracks gradients iff any input does; otherwise the record
    /// is dropped and the output is a plain leaf.
    pub(crate) fn record(&mut self, function: Function, inputs: &[VarId], output: Tensor) -> VarId {
        let requires_grad = inputs
            .iter()
            .any(|&id| self.variables[id.0].requires_grad());
        if !requires_grad {
            return self.leaf(output, false);
        }

        let fid = FunctionId(self.functions.len());
        let out = VarId(self.variables.len());
        self.functions.push(FunctionRecord {
            function,
            inputs: inputs.to_vec(),
            output: out,
        });
        self.insert(Variable::with_grad_fn(output, fid))
    }

    pub fn variable(&self, id: VarId) -> Result<&Variable, TensorError> {
        self.variables
            .get(id.0)
            .ok_or(TensorError::UnknownVariable { index: id.0 })
    }

    pub fn variable_mut(&mut self, id: VarId) -> Result<&mut Variable, TensorError> {
        self.variables
            .get_mut(id.0)
            .ok_or(TensorError::UnknownVariable { index: id.0 })
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionRecord> {
        self.functions.get(id.0)
    }

    /// Shorthand for `variable(id)?.data()`.
    pub fn data(&self, id: VarId) -> Result<&Tensor, TensorError> {
        Ok(self.variable(id)?.data())
    }

    /// Shorthand for `variable(id)?.grad()`.
    pub fn grad(&self, id: VarId) -> Result<Option<&Tensor>, TensorError> {
        Ok(self.variable(id)?.grad())
    }

    /// Provide the seed gradient for a non-scalar root.
    pub fn set_grad(&mut self, id: VarId, grad: Tensor) -> Result<(), TensorError> {
        self.variable_mut(id)?.set_grad(grad)
    }

    /// Insert a non-tracking leaf aliasing the data of `id`.
    pub fn detach(&mut self, id: VarId) -> Result<VarId, TensorError> {
        let detached = self.variable(id)?.detach();
        Ok(self.insert(detached))
    }

    /// Reset every existing gradient to zeros.
    pub fn zero_grad(&mut self) -> Result<(), TensorError> {
        for variable in &mut self.variables {
            variable.zero_grad()?;
        }
        Ok(())
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Number of function records.
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Drop all variables and records. Previously issued ids become invalid.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.functions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::FunctionKind;

    #[test]
    fn test_leaf_ids_are_sequential() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[2]), true);
        let b = graph.leaf(Tensor::ones(&[2]), false);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.len(), 2);
        assert!(graph.variable(a).unwrap().is_leaf());
    }

    #[test]
    fn test_record_attaches_function_when_tracking() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[2]), true);
        let b = graph.leaf(Tensor::ones(&[2]), false);
        let (f, out) =
            Function::forward(FunctionKind::Add, &[graph.data(a).unwrap(), graph.data(b).unwrap()])
                .unwrap();
        let c = graph.record(f, &[a, b], out);

        let var = graph.variable(c).unwrap();
        assert!(var.requires_grad());
        let fid = var.grad_fn().unwrap();
        let rec = graph.function(fid).unwrap();
        assert_eq!(rec.inputs(), &[a, b]);
        assert_eq!(rec.output(), c);
        assert_eq!(rec.function().name(), "AddFunction");
    }

    #[test]
    fn test_record_skips_function_without_tracking() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[2]), false);
        let (f, out) = Function::forward(FunctionKind::Relu, &[graph.data(a).unwrap()]).unwrap();
        let c = graph.record(f, &[a], out);

        let var = graph.variable(c).unwrap();
        assert!(!var.requires_grad());
        assert!(var.grad_fn().is_none());
        assert!(var.grad().is_none());
        assert_eq!(graph.num_functions(), 0);
    }

    #[test]
    fn test_unknown_variable() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[1]), true);
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(
            graph.variable(a).unwrap_err(),
            TensorError::UnknownVariable { index: 0 }
        );
    }

    #[test]
    fn test_detach_inserts_non_tracking_alias() {
        let mut graph = Graph::new();
        let a = graph.leaf(Tensor::ones(&[3]), true);
        let d = graph.detach(a).unwrap();
        assert!(!graph.variable(d).unwrap().requires_grad());
        assert!(
            graph
                .data(d)
                .unwrap()
                .shares_storage_with(graph.data(a).unwrap())
        );
    }
}
