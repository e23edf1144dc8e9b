//! Random tensor construction.
//!
//! This module provides functions for creating tensors with random values,
//! typically used to initialize parameters before training.

use rand::Rng;
use rand::distr::{Distribution, StandardUniform};
use rand_distr::StandardNormal;

use crate::storage::{Element, SharedBuffer};
use crate::strides::checked_numel;
use crate::tensor::Tensor;

impl Tensor {
    /// Create a tensor whose elements are drawn from `dist`.
    ///
    /// # Panics
    ///
    /// Panics if the number of elements overflows `usize`.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    /// use rand_distr::Uniform;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let dist = Uniform::new(-0.5f32, 0.5).unwrap();
    /// let t = Tensor::sample_with_rng(&[4, 4], dist, &mut rng);
    /// assert!(t.to_vec().unwrap().iter().all(|v| (-0.5..0.5).contains(v)));
    /// ```
    pub fn sample_with_rng<D, R>(shape: &[usize], dist: D, rng: &mut R) -> Self
    where
        D: Distribution<Element>,
        R: Rng + ?Sized,
    {
        let len = checked_numel(shape).unwrap_or_else(|err| panic!("{err}"));
        let data: Vec<Element> = dist.sample_iter(rng).take(len).collect();
        Self::from_buffer(SharedBuffer::from_vec(data), shape)
    }

    /// Create a tensor with uniform random values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    ///
    /// let t = Tensor::random(&[2, 3]);
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert!(t.to_vec().unwrap().iter().all(|&v| (0.0..1.0).contains(&v)));
    /// ```
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with uniform random values using a specific RNG.
    ///
    /// This is useful for reproducible results with a seeded RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorgrad::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1 = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2 = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// assert_eq!(t1.to_vec().unwrap(), t2.to_vec().unwrap());
    /// ```
    pub fn random_with_rng<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self {
        Self::sample_with_rng(shape, StandardUniform, rng)
    }

    /// Create a tensor with standard normal random values.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self {
        Self::sample_with_rng(shape, StandardNormal, rng)
    }
}
