//! Graph nodes carrying data, gradient and provenance.

use super::graph::FunctionId;
use crate::error::TensorError;
use crate::operations::add_inplace;
use crate::tensor::Tensor;

/// Handle to a [`Variable`] stored in a [`Graph`](super::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A tensor participating in differentiation.
///
/// When `requires_grad` is set, the gradient is allocated up front as zeros
/// with the data's shape. Leaves have no producing function.
#[derive(Debug, Clone)]
pub struct Variable {
    data: Tensor,
    grad: Option<Tensor>,
    requires_grad: bool,
    grad_fn: Option<FunctionId>,
}

impl Variable {
    /// Wrap a tensor as a leaf variable.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    /// use tensorgrad::autograd::Variable;
    ///
    /// let v = Variable::new(Tensor::ones(&[2, 2]), true);
    /// assert_eq!(v.grad().unwrap().to_vec().unwrap(), vec![0.0; 4]);
    ///
    /// let c = Variable::new(Tensor::ones(&[2]), false);
    /// assert!(c.grad().is_none());
    /// ```
    pub fn new(data: Tensor, requires_grad: bool) -> Self {
        let grad = requires_grad.then(|| Tensor::zeros(data.shape()));
        Self {
            data,
            grad,
            requires_grad,
            grad_fn: None,
        }
    }

    pub(crate) fn with_grad_fn(data: Tensor, grad_fn: FunctionId) -> Self {
        Self {
            grad_fn: Some(grad_fn),
            ..Self::new(data, true)
        }
    }

    #[inline]
    pub fn data(&self) -> &Tensor {
        &self.data
    }

    /// Mutable access to the data, e.g. for parameter updates.
    #[inline]
    pub fn data_mut(&mut self) -> &mut Tensor {
        &mut self.data
    }

    #[inline]
    pub fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    #[inline]
    pub fn grad_mut(&mut self) -> Option<&mut Tensor> {
        self.grad.as_mut()
    }

    /// Replace the gradient.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `grad` does not have the data's shape.
    pub fn set_grad(&mut self, grad: Tensor) -> Result<(), TensorError> {
        if grad.shape() != self.data.shape() {
            return Err(TensorError::ShapeMismatch {
                op: "set_grad",
                lhs: self.data.shape().to_vec(),
                rhs: grad.shape().to_vec(),
            });
        }
        self.grad = Some(grad);
        Ok(())
    }

    /// Drop the gradient tensor entirely.
    pub fn clear_grad(&mut self) {
        self.grad = None;
    }

    /// Reset an existing gradient to zeros.
    pub fn zero_grad(&mut self) -> Result<(), TensorError> {
        match self.grad.as_mut() {
            Some(grad) if grad.is_allocated() => grad.fill(0.0),
            Some(grad) => {
                *grad = Tensor::zeros(self.data.shape());
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Add `grad` into the stored gradient, initializing it if absent.
    pub(crate) fn accumulate_grad(&mut self, grad: Tensor) -> Result<(), TensorError> {
        match self.grad.as_mut() {
            Some(acc) if acc.is_allocated() => add_inplace(acc, &grad),
            _ => {
                self.grad = Some(grad);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Start or stop tracking gradients for this variable.
    ///
    /// Enabling allocates a zero gradient if none is held; disabling drops
    /// the gradient. Records already built from this variable keep their
    /// links; only later operations see the new flag.
    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
        if !requires_grad {
            self.grad = None;
        } else if !self.grad.as_ref().is_some_and(Tensor::is_allocated) {
            self.grad = Some(Tensor::zeros(self.data.shape()));
        }
    }

    /// A new leaf aliasing the same data that does not track gradients.
    pub fn detach(&self) -> Variable {
        Variable::new(self.data.alias(), false)
    }

    /// Id of the function that produced this variable, `None` for leaves.
    #[inline]
    pub fn grad_fn(&self) -> Option<FunctionId> {
        self.grad_fn
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.grad_fn.is_none()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn dim(&self) -> usize {
        self.data.dim()
    }

    pub fn numel(&self) -> usize {
        self.data.numel()
    }
}
