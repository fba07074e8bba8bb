// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Minimal dense tensor carried through the data streams.
//!
//! Numeric kernels belong to the components; the tensor only provides what the
//! orchestration layer needs (device placement, batch scatter/gather) plus a
//! handful of row-wise helpers the built-in components share.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StreamError;

/// Compute device a value lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

/// Row-major `f32` tensor tagged with its device.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
    device: Device,
}

impl Tensor {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, StreamError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(StreamError::Shape(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            shape,
            data,
            device: Device::Cpu,
        })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
            device: Device::Cpu,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    /// Size of the leading (batch) dimension; scalars count as a batch of one.
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    fn row_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Split along the batch dimension into at most `chunks` contiguous parts.
    pub fn split_batch(&self, chunks: usize) -> Vec<Tensor> {
        let batch = self.batch_size();
        if self.shape.is_empty() || chunks <= 1 || batch == 0 {
            return vec![self.clone()];
        }
        let row_len = self.row_len();
        chunk_bounds(batch, chunks)
            .into_iter()
            .map(|(start, end)| {
                let mut shape = self.shape.clone();
                shape[0] = end - start;
                Tensor {
                    shape,
                    data: self.data[start * row_len..end * row_len].to_vec(),
                    device: self.device,
                }
            })
            .collect()
    }

    /// Concatenate along the batch dimension; the result lives on `device`.
    pub fn concat_batch(parts: &[Tensor], device: Device) -> Result<Tensor, StreamError> {
        let first = parts
            .first()
            .ok_or_else(|| StreamError::Shape("cannot concatenate zero tensors".to_string()))?;
        let tail = &first.shape[1..];
        let mut data = Vec::new();
        let mut batch = 0;
        for part in parts {
            if part.shape.len() != first.shape.len() || &part.shape[1..] != tail {
                return Err(StreamError::Shape(format!(
                    "cannot concatenate {:?} with {:?}",
                    first.shape, part.shape
                )));
            }
            batch += part.batch_size();
            data.extend_from_slice(&part.data);
        }
        let mut shape = first.shape.clone();
        shape[0] = batch;
        Ok(Tensor {
            shape,
            data,
            device,
        })
    }

    /// `[batch, k] x [k, n] -> [batch, n]`
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor, StreamError> {
        if self.shape.len() != 2 || other.shape.len() != 2 || self.shape[1] != other.shape[0] {
            return Err(StreamError::Shape(format!(
                "cannot multiply {:?} by {:?}",
                self.shape, other.shape
            )));
        }
        let (rows, inner, cols) = (self.shape[0], self.shape[1], other.shape[1]);
        let mut data = vec![0.0; rows * cols];
        for r in 0..rows {
            for k in 0..inner {
                let lhs = self.data[r * inner + k];
                for c in 0..cols {
                    data[r * cols + c] += lhs * other.data[k * cols + c];
                }
            }
        }
        Ok(Tensor {
            shape: vec![rows, cols],
            data,
            device: self.device,
        })
    }

    /// Add a `[n]` bias to every row of a `[batch, n]` tensor.
    pub fn add_row(&self, bias: &Tensor) -> Result<Tensor, StreamError> {
        let cols = self.row_len();
        if self.shape.len() != 2 || bias.numel() != cols {
            return Err(StreamError::Shape(format!(
                "cannot broadcast {:?} over {:?}",
                bias.shape, self.shape
            )));
        }
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| v + bias.data[i % cols])
            .collect();
        Ok(Tensor {
            shape: self.shape.clone(),
            data,
            device: self.device,
        })
    }

    /// Numerically stable log-softmax over the last dimension of a `[batch, n]` tensor.
    pub fn log_softmax_rows(&self) -> Tensor {
        let cols = self.row_len().max(1);
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks(cols) {
            let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let log_sum = row.iter().map(|v| (v - max).exp()).sum::<f32>().ln() + max;
            data.extend(row.iter().map(|v| v - log_sum));
        }
        Tensor {
            shape: self.shape.clone(),
            data,
            device: self.device,
        }
    }

    /// Index of the maximum of every row.
    pub fn argmax_rows(&self) -> Vec<usize> {
        let cols = self.row_len().max(1);
        self.data
            .chunks(cols)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, v)| {
                        if *v > best.1 {
                            (i, *v)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }

    /// Value at `[row, col]` of a 2D tensor.
    pub fn at(&self, row: usize, col: usize) -> Option<f32> {
        let cols = self.row_len();
        if col >= cols {
            return None;
        }
        self.data.get(row * cols + col).copied()
    }
}

/// `[start, end)` bounds of `chunks` near-equal contiguous parts of `len` items.
pub(crate) fn chunk_bounds(len: usize, chunks: usize) -> Vec<(usize, usize)> {
    let chunks = chunks.clamp(1, len.max(1));
    let base = len / chunks;
    let extra = len % chunks;
    let mut bounds = Vec::with_capacity(chunks);
    let mut start = 0;
    for i in 0..chunks {
        let size = base + usize::from(i < extra);
        bounds.push((start, start + size));
        start += size;
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_element_count() {
        assert!(Tensor::new(vec![1.0, 2.0, 3.0], vec![2, 2]).is_err());
    }

    #[test]
    fn test_split_and_concat_restore_batch() {
        let tensor = Tensor::new((0..10).map(|v| v as f32).collect(), vec![5, 2]).unwrap();
        let parts = tensor.split_batch(2);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].shape(), &[3, 2]);
        assert_eq!(parts[1].shape(), &[2, 2]);

        let joined = Tensor::concat_batch(&parts, Device::Cpu).unwrap();
        assert_eq!(joined, tensor);
    }

    #[test]
    fn test_split_never_produces_empty_chunks() {
        let tensor = Tensor::zeros(vec![2, 3]);
        assert_eq!(tensor.split_batch(4).len(), 2);
    }

    #[test]
    fn test_matmul_and_bias() {
        let x = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let w = Tensor::new(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]).unwrap();
        let b = Tensor::new(vec![0.5, -0.5], vec![2]).unwrap();

        let y = x.matmul(&w).unwrap().add_row(&b).unwrap();
        assert_eq!(y.data(), &[1.5, 1.5]);
    }

    #[test]
    fn test_log_softmax_rows_normalize() {
        let x = Tensor::new(vec![1.0, 2.0, 3.0], vec![1, 3]).unwrap();
        let total: f32 = x.log_softmax_rows().data().iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(x.argmax_rows(), vec![2]);
    }

    #[test]
    fn test_device_is_retagged() {
        let mut x = Tensor::zeros(vec![1]);
        x.to_device(Device::Cuda(1));
        assert_eq!(x.device(), Device::Cuda(1));
        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
    }
}
