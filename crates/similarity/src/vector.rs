//! Dense feature vectors and cosine similarity.

use serde::{Deserialize, Serialize};

/// A fixed-length encoding of one movie (or of an aggregated selection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    data: Vec<f32>,
}

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    pub fn dot(&self, other: &FeatureVector) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Euclidean length
    #[inline]
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Cosine similarity with another vector.
    ///
    /// Returns 0.0 when either vector has zero magnitude or the dimensions
    /// differ. The result is clamped to [-1, 1] to absorb rounding.
    #[inline]
    pub fn cosine_similarity(&self, other: &FeatureVector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (self.dot(other) / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    /// Add `other` into `self` element-wise
    pub(crate) fn add_assign(&mut self, other: &FeatureVector) {
        debug_assert_eq!(self.dim(), other.dim());
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += b;
        }
    }

    /// Multiply every element by `scalar`
    pub(crate) fn scale(&mut self, scalar: f32) {
        for x in &mut self.data {
            *x *= scalar;
        }
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_with_itself_is_one() {
        let v = FeatureVector::new(vec![1.0, 0.0, 1.0, 0.0, 0.083]);
        assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = FeatureVector::new(vec![1.0, 0.0, 1.0, 0.25]);
        let b = FeatureVector::new(vec![0.5, 1.0, 1.0, 0.75]);
        assert_eq!(a.cosine_similarity(&b), b.cosine_similarity(&a));
    }

    #[test]
    fn test_cosine_orthogonal_and_zero() {
        let a = FeatureVector::new(vec![1.0, 0.0]);
        let b = FeatureVector::new(vec![0.0, 1.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);

        let zero = FeatureVector::zeros(2);
        assert_eq!(a.cosine_similarity(&zero), 0.0);
        assert_eq!(zero.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let a = FeatureVector::new(vec![1.0, 0.0]);
        let b = FeatureVector::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_norm() {
        let v = FeatureVector::new(vec![3.0, 4.0]);
        assert_eq!(v.norm(), 5.0);
    }
}
