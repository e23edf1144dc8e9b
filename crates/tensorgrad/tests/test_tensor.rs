//! Integration tests for tensors, views and the operation library.

use tensorgrad::operations::{add, matmul, mul, sub, transpose};
use tensorgrad::{Tensor, TensorError};

fn tensor(data: Vec<f32>, shape: &[usize]) -> Tensor {
    Tensor::from_vec(data, shape).unwrap()
}

#[test]
fn test_lifecycle() {
    let mut t = Tensor::new(&[3, 4]).unwrap();
    assert!(!t.is_allocated());
    assert!(matches!(
        add(&t, &Tensor::zeros(&[3, 4])),
        Err(TensorError::Uninitialized { .. })
    ));

    t.allocate();
    assert!(t.is_owner());
    assert!(t.is_contiguous());
    assert_eq!(t.nbytes(), 48);

    t.deallocate();
    assert!(!t.is_allocated());
    assert!(!t.is_contiguous());
}

#[test]
fn test_clone_distinct_buffer() {
    let t = tensor(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let mut c = t.clone();
    assert_eq!(c.shape(), t.shape());
    assert_eq!(c.to_vec().unwrap(), t.to_vec().unwrap());
    assert_ne!(c.data_ptr(), t.data_ptr());

    c.fill(0.0).unwrap();
    assert_eq!(t.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_reshape_aliases_and_validates() {
    let t = tensor((0..12).map(|x| x as f32).collect(), &[3, 4]);
    let r = t.reshape(&[2, 6]).unwrap();
    assert_eq!(r.numel(), t.numel());
    assert_eq!(r.data_ptr(), t.data_ptr());
    assert!(!r.is_owner());

    assert_eq!(
        t.reshape(&[5, 2]).unwrap_err().category(),
        "ShapeError"
    );
}

#[test]
fn test_transpose_view_and_range() {
    let t = tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let tt = transpose(&t, 0, 1).unwrap();
    assert!(!tt.is_contiguous());
    assert_eq!(tt.data_ptr(), t.data_ptr());
    assert_eq!(tt.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

    assert_eq!(
        transpose(&t, 2, 0).unwrap_err(),
        TensorError::DimOutOfRange { dim: 2, ndim: 2 }
    );
}

#[test]
fn test_add_broadcast_examples() {
    let a = tensor(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);

    let scalar = add(&a, &tensor(vec![10.0], &[1])).unwrap();
    assert_eq!(scalar.to_vec().unwrap(), vec![11.0, 12.0, 13.0, 14.0]);

    let bias = add(&a, &tensor(vec![10.0, 20.0], &[2])).unwrap();
    assert_eq!(bias.to_vec().unwrap(), vec![11.0, 22.0, 13.0, 24.0]);
}

#[test]
fn test_sub_exact_shape() {
    let a = tensor(vec![5.0, 7.0], &[2]);
    let b = tensor(vec![1.0, 2.0], &[2]);
    assert_eq!(sub(&a, &b).unwrap().to_vec().unwrap(), vec![4.0, 5.0]);
}

#[test]
fn test_matmul_example() {
    let a = tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let b = tensor(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], &[3, 2]);
    let c = matmul(&a, &b).unwrap();
    assert_eq!(c.shape(), &[2, 2]);
    assert_eq!(c.to_vec().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn test_matmul_mismatch() {
    let a = Tensor::zeros(&[2, 3]);
    let b = Tensor::zeros(&[2, 3]);
    assert!(matches!(
        matmul(&a, &b),
        Err(TensorError::ShapeMismatch { op: "matmul", .. })
    ));
}

#[test]
fn test_ops_on_transposed_views() {
    let a = tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let at = a.transpose(0, 1).unwrap();

    // a^T (a^T)^T == a^T a
    let lhs = matmul(&at, &at.transpose(0, 1).unwrap()).unwrap();
    let rhs = matmul(&at.clone(), &a).unwrap();
    assert_eq!(lhs.to_vec().unwrap(), rhs.to_vec().unwrap());

    let sq = mul(&at, &at).unwrap();
    assert_eq!(sq.to_vec().unwrap(), vec![1.0, 16.0, 4.0, 25.0, 9.0, 36.0]);
}

#[test]
fn test_outputs_are_owning_and_contiguous() {
    let a = tensor(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
    for out in [
        add(&a, &a).unwrap(),
        sub(&a, &a).unwrap(),
        mul(&a, &a).unwrap(),
        matmul(&a, &a).unwrap(),
    ] {
        assert!(out.is_owner());
        assert!(out.is_contiguous());
        assert!(!out.shares_storage_with(&a));
    }
}
