//! Differentiable operation records.
//!
//! A [`Function`] is created by a forward pass and keeps deep copies of the
//! tensors its gradient formula needs. Records never hold pointers into
//! caller data, so mutating an input after the forward pass does not change
//! its gradients.

use crate::error::TensorError;
use crate::operations::{add, map, matmul, mean_all, mul, neg, reduce_to_shape, sub, zip_map};
use crate::storage::Element;
use crate::tensor::Tensor;

/// Lower clamp bound for predictions in binary cross-entropy.
pub const BCE_EPSILON: f64 = 1e-8;

/// Tag naming a differentiable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Add,
    Sub,
    Mul,
    MatMul,
    Relu,
    Sigmoid,
    Tanh,
    MseLoss,
    BceLoss,
}

impl FunctionKind {
    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Add => "AddFunction",
            FunctionKind::Sub => "SubFunction",
            FunctionKind::Mul => "MulFunction",
            FunctionKind::MatMul => "MatMulFunction",
            FunctionKind::Relu => "ReLUFunction",
            FunctionKind::Sigmoid => "SigmoidFunction",
            FunctionKind::Tanh => "TanhFunction",
            FunctionKind::MseLoss => "MSELossFunction",
            FunctionKind::BceLoss => "BCELossFunction",
        }
    }

    /// Number of inputs the forward pass takes.
    pub fn arity(self) -> usize {
        match self {
            FunctionKind::Relu | FunctionKind::Sigmoid | FunctionKind::Tanh => 1,
            _ => 2,
        }
    }
}

/// One recorded operation and the state its backward pass needs.
#[derive(Debug, Clone)]
pub enum Function {
    Add {
        lhs_shape: Vec<usize>,
        rhs_shape: Vec<usize>,
    },
    Sub {
        lhs_shape: Vec<usize>,
        rhs_shape: Vec<usize>,
    },
    Mul {
        lhs: Tensor,
        rhs: Tensor,
    },
    MatMul {
        lhs: Tensor,
        rhs: Tensor,
    },
    Relu {
        input: Tensor,
    },
    Sigmoid {
        output: Tensor,
    },
    Tanh {
        output: Tensor,
    },
    MseLoss {
        predicted: Tensor,
        target: Tensor,
    },
    BceLoss {
        predicted: Tensor,
        target: Tensor,
    },
}

fn clamp_probability(p: Element) -> f64 {
    (p as f64).clamp(BCE_EPSILON, 1.0 - BCE_EPSILON)
}

fn loss_tensor(value: Element) -> Tensor {
    Tensor::full(&[1], value)
}

impl Function {
    /// Run the forward computation of `kind` and build its record.
    ///
    /// # Errors
    ///
    /// `Arity` if `inputs` has the wrong length; otherwise whatever the
    /// underlying operation reports.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    /// use tensorgrad::autograd::{Function, FunctionKind};
    ///
    /// let x = Tensor::from_vec(vec![-1.0, 2.0], &[2]).unwrap();
    /// let (record, out) = Function::forward(FunctionKind::Relu, &[&x]).unwrap();
    /// assert_eq!(out.to_vec().unwrap(), vec![0.0, 2.0]);
    ///
    /// let g = Tensor::ones(&[2]);
    /// let grads = record.backward(&[&g]).unwrap();
    /// assert_eq!(grads[0].to_vec().unwrap(), vec![0.0, 1.0]);
    /// ```
    pub fn forward(kind: FunctionKind, inputs: &[&Tensor]) -> Result<(Function, Tensor), TensorError> {
        if inputs.len() != kind.arity() {
            return Err(TensorError::Arity {
                op: kind.name(),
                expected: kind.arity(),
                actual: inputs.len(),
            });
        }

        match kind {
            FunctionKind::Add => {
                let out = add(inputs[0], inputs[1])?;
                Ok((
                    Function::Add {
                        lhs_shape: inputs[0].shape().to_vec(),
                        rhs_shape: inputs[1].shape().to_vec(),
                    },
                    out,
                ))
            }
            FunctionKind::Sub => {
                let out = sub(inputs[0], inputs[1])?;
                Ok((
                    Function::Sub {
                        lhs_shape: inputs[0].shape().to_vec(),
                        rhs_shape: inputs[1].shape().to_vec(),
                    },
                    out,
                ))
            }
            FunctionKind::Mul => {
                let out = mul(inputs[0], inputs[1])?;
                Ok((
                    Function::Mul {
                        lhs: inputs[0].clone(),
                        rhs: inputs[1].clone(),
                    },
                    out,
                ))
            }
            FunctionKind::MatMul => {
                let out = matmul(inputs[0], inputs[1])?;
                Ok((
                    Function::MatMul {
                        lhs: inputs[0].clone(),
                        rhs: inputs[1].clone(),
                    },
                    out,
                ))
            }
            FunctionKind::Relu => {
                let out = map(inputs[0], |x| x.max(0.0))?;
                Ok((
                    Function::Relu {
                        input: inputs[0].clone(),
                    },
                    out,
                ))
            }
            FunctionKind::Sigmoid => {
                let out = map(inputs[0], |x| 1.0 / (1.0 + (-x).exp()))?;
                Ok((Function::Sigmoid { output: out.clone() }, out))
            }
            FunctionKind::Tanh => {
                let out = map(inputs[0], Element::tanh)?;
                Ok((Function::Tanh { output: out.clone() }, out))
            }
            FunctionKind::MseLoss => {
                let (p, t) = (inputs[0], inputs[1]);
                let sq = zip_map(kind.name(), p, t, |p, t| (p - t) * (p - t))?;
                let loss = loss_tensor(mean_all(&sq)?);
                Ok((
                    Function::MseLoss {
                        predicted: p.clone(),
                        target: t.clone(),
                    },
                    loss,
                ))
            }
            FunctionKind::BceLoss => {
                let (p, t) = (inputs[0], inputs[1]);
                let terms = zip_map(kind.name(), p, t, |p, t| {
                    let p = clamp_probability(p);
                    let t = t as f64;
                    (-(t * p.ln() + (1.0 - t) * (1.0 - p).ln())) as Element
                })?;
                let loss = loss_tensor(mean_all(&terms)?);
                Ok((
                    Function::BceLoss {
                        predicted: p.clone(),
                        target: t.clone(),
                    },
                    loss,
                ))
            }
        }
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            Function::Add { .. } => FunctionKind::Add,
            Function::Sub { .. } => FunctionKind::Sub,
            Function::Mul { .. } => FunctionKind::Mul,
            Function::MatMul { .. } => FunctionKind::MatMul,
            Function::Relu { .. } => FunctionKind::Relu,
            Function::Sigmoid { .. } => FunctionKind::Sigmoid,
            Function::Tanh { .. } => FunctionKind::Tanh,
            Function::MseLoss { .. } => FunctionKind::MseLoss,
            Function::BceLoss { .. } => FunctionKind::BceLoss,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Compute the gradient for each input from the output gradient.
    ///
    /// Returns one freshly allocated tensor per input, in input order.
    /// Retained tensors are only read.
    ///
    /// # Errors
    ///
    /// `Arity` unless exactly one output gradient is given.
    pub fn backward(&self, grad_outputs: &[&Tensor]) -> Result<Vec<Tensor>, TensorError> {
        let [g] = grad_outputs else {
            return Err(TensorError::Arity {
                op: self.name(),
                expected: 1,
                actual: grad_outputs.len(),
            });
        };
        let g: &Tensor = g;

        match self {
            Function::Add {
                lhs_shape,
                rhs_shape,
            } => Ok(vec![
                reduce_to_shape(g, lhs_shape)?,
                reduce_to_shape(g, rhs_shape)?,
            ]),
            Function::Sub {
                lhs_shape,
                rhs_shape,
            } => Ok(vec![
                reduce_to_shape(g, lhs_shape)?,
                neg(&reduce_to_shape(g, rhs_shape)?)?,
            ]),
            Function::Mul { lhs, rhs } => Ok(vec![mul(rhs, g)?, mul(lhs, g)?]),
            Function::MatMul { lhs, rhs } => Ok(vec![
                matmul(g, &rhs.transpose(0, 1)?)?,
                matmul(&lhs.transpose(0, 1)?, g)?,
            ]),
            Function::Relu { input } => Ok(vec![zip_map(self.name(), input, g, |x, g| {
                if x > 0.0 { g } else { 0.0 }
            })?]),
            Function::Sigmoid { output } => Ok(vec![zip_map(self.name(), output, g, |y, g| {
                g * y * (1.0 - y)
            })?]),
            Function::Tanh { output } => Ok(vec![zip_map(self.name(), output, g, |y, g| {
                g * (1.0 - y * y)
            })?]),
            Function::MseLoss { predicted, target } => {
                let upstream = g.item()?;
                let n = predicted.numel() as Element;
                let grad_p = zip_map(self.name(), predicted, target, |p, t| {
                    2.0 * (p - t) / n * upstream
                })?;
                let grad_t = neg(&grad_p)?;
                Ok(vec![grad_p, grad_t])
            }
            Function::BceLoss { predicted, target } => {
                let upstream = g.item()? as f64;
                let n = predicted.numel() as f64;
                let grad_p = zip_map(self.name(), predicted, target, |p, t| {
                    let p = clamp_probability(p);
                    let t = t as f64;
                    ((-(t / p) + (1.0 - t) / (1.0 - p)) / n * upstream) as Element
                })?;
                let grad_t = Tensor::zeros(target.shape());
                Ok(vec![grad_p, grad_t])
            }
        }
    }
}
