//! Tensor types passed across the backend boundary.

use ndarray::{ArrayD, IxDyn};

use crate::{InferenceError, Result};

/// Element types the idex models exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
    Float32,
    Int64,
}

/// Input tensor for inference.
#[derive(Debug, Clone)]
pub enum InputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

impl InputTensor {
    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        match self {
            InputTensor::Float32(arr) => arr.shape(),
            InputTensor::Int64(arr) => arr.shape(),
        }
    }

    /// Element type of the tensor.
    pub fn dtype(&self) -> TensorType {
        match self {
            InputTensor::Float32(_) => TensorType::Float32,
            InputTensor::Int64(_) => TensorType::Int64,
        }
    }

    /// Build a Float32 tensor from flat data, checking the element count.
    pub fn from_f32(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(InputTensor::Float32)
            .map_err(|e| InferenceError::InputShape {
                shape: shape.to_vec(),
                reason: e.to_string(),
            })
    }
}

/// Output tensor from inference.
#[derive(Debug, Clone)]
pub enum OutputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

impl OutputTensor {
    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        match self {
            OutputTensor::Float32(arr) => arr.shape(),
            OutputTensor::Int64(arr) => arr.shape(),
        }
    }

    /// Element type of the tensor.
    pub fn dtype(&self) -> TensorType {
        match self {
            OutputTensor::Float32(_) => TensorType::Float32,
            OutputTensor::Int64(_) => TensorType::Int64,
        }
    }

    /// Borrow the inner Float32 array, if that is the element type.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            OutputTensor::Float32(arr) => Some(arr),
            _ => None,
        }
    }

    /// Take the inner Float32 array, if that is the element type.
    pub fn into_f32(self) -> Option<ArrayD<f32>> {
        match self {
            OutputTensor::Float32(arr) => Some(arr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_f32_checks_shape() {
        let tensor = InputTensor::from_f32(vec![0.0; 6], &[1, 2, 3]).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 3]);
        assert_eq!(tensor.dtype(), TensorType::Float32);

        let err = InputTensor::from_f32(vec![0.0; 5], &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, InferenceError::InputShape { ref shape, .. } if shape == &[1, 2, 3]));
    }

    #[test]
    fn test_output_accessors() {
        let out = OutputTensor::Float32(ArrayD::zeros(IxDyn(&[1, 4])));
        assert!(out.as_f32().is_some());
        assert_eq!(out.shape(), &[1, 4]);

        let ints = OutputTensor::Int64(ArrayD::zeros(IxDyn(&[2])));
        assert_eq!(ints.dtype(), TensorType::Int64);
        assert!(ints.into_f32().is_none());
    }
}
