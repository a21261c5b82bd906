//! Categorical distribution over a batch of discrete action probabilities.
//!
//! Log-probabilities and entropy stay on the autodiff graph so they can feed a
//! policy-gradient loss. Sampling happens on the host with `rand`.

use candle_core::{DType, Error, Result, Tensor, D};
use candle_nn::ops;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Draws an index with probability proportional to `weights`.
///
/// The weights need not sum to one, but must be non-negative with a positive
/// total.
pub fn sample_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::new(weights)
        .map_err(|e| Error::Msg(format!("cannot sample from weights {:?}: {}", weights, e)))?;
    Ok(dist.sample(rng))
}

/// A batch of categorical distributions, one per row of a `(batch, n)` tensor.
#[derive(Debug, Clone)]
pub struct Categorical {
    probs: Tensor,
    log_probs: Tensor,
}

impl Categorical {
    /// Builds the distribution from unnormalized logits.
    pub fn from_logits(logits: &Tensor) -> Result<Self> {
        let log_probs = ops::log_softmax(logits, D::Minus1)?;
        let probs = log_probs.exp()?;
        Ok(Self { probs, log_probs })
    }

    pub fn probs(&self) -> &Tensor {
        &self.probs
    }

    /// One sampled category per row.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<usize>> {
        let rows = self.probs.detach().to_dtype(DType::F64)?.to_vec2::<f64>()?;
        rows.iter().map(|row| sample_weighted(row, rng)).collect()
    }

    /// Most likely category per row.
    pub fn mode(&self) -> Result<Vec<usize>> {
        let idx = self.probs.argmax(D::Minus1)?.to_vec1::<u32>()?;
        Ok(idx.into_iter().map(|a| a as usize).collect())
    }

    /// Log-probability of `actions[i]` under row `i`, shape `(batch,)`.
    pub fn log_prob(&self, actions: &[usize]) -> Result<Tensor> {
        let idx: Vec<u32> = actions.iter().map(|&a| a as u32).collect();
        let idx = Tensor::from_vec(idx, (actions.len(), 1), self.probs.device())?;
        self.log_probs.gather(&idx, 1)?.squeeze(1)
    }

    /// Entropy of each row, shape `(batch,)`.
    pub fn entropy(&self) -> Result<Tensor> {
        (&self.probs * &self.log_probs)?.sum(D::Minus1)?.neg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_logits_normalizes_rows() {
        let logits = Tensor::new(&[[0.0f64, 3.0f64.ln()], [1.0, 1.0]], &Device::Cpu).unwrap();
        let dist = Categorical::from_logits(&logits).unwrap();
        let probs = dist.probs().to_vec2::<f64>().unwrap();
        assert!((probs[0][0] - 0.25).abs() < 1e-12);
        assert!((probs[0][1] - 0.75).abs() < 1e-12);
        assert!((probs[1][0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_prob_and_entropy() {
        let logits = Tensor::new(&[[0.0f64, 0.0], [0.0, 2.0f64.ln()]], &Device::Cpu).unwrap();
        let dist = Categorical::from_logits(&logits).unwrap();

        let lp = dist.log_prob(&[1, 1]).unwrap().to_vec1::<f64>().unwrap();
        assert!((lp[0] - 0.5f64.ln()).abs() < 1e-9);
        assert!((lp[1] - (2.0f64 / 3.0).ln()).abs() < 1e-9);

        let ent = dist.entropy().unwrap().to_vec1::<f64>().unwrap();
        assert!((ent[0] - 2.0f64.ln()).abs() < 1e-9);
        assert!(ent[1] < ent[0]);
    }

    #[test]
    fn test_sample_respects_degenerate_rows() {
        // exp(-1000) underflows to exactly zero probability.
        let logits =
            Tensor::new(&[[-1000.0f64, 0.0, -1000.0], [0.0, -1000.0, -1000.0]], &Device::Cpu)
                .unwrap();
        let dist = Categorical::from_logits(&logits).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(dist.sample(&mut rng).unwrap(), vec![1, 0]);
        }
        assert_eq!(dist.mode().unwrap(), vec![1, 0]);
        assert_eq!(dist.probs().dims(), &[2, 3]);
    }

    #[test]
    fn test_sample_weighted_rejects_zero_total() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_weighted(&[0.0, 0.0], &mut rng).is_err());
        assert_eq!(sample_weighted(&[0.0, 5.0], &mut rng).unwrap(), 1);
    }
}
