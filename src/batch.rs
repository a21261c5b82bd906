use candle_core::{Device, Result, Tensor};

/// Struct-of-arrays view over sampled transitions.
#[derive(Debug, Clone)]
pub struct Batch<O, A> {
    pub obs: Vec<O>,
    pub act: Vec<A>,
    pub rew: Vec<f64>,
    pub done: Vec<bool>,
    pub obs_next: Vec<O>,
}

impl<O, A> Batch<O, A> {
    pub fn new(obs: Vec<O>, act: Vec<A>, rew: Vec<f64>, done: Vec<bool>, obs_next: Vec<O>) -> Self {
        Self {
            obs,
            act,
            rew,
            done,
            obs_next,
        }
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }
}

/// A batch laid out as `(batch, features)` tensors; rewards and done flags
/// are `(batch, 1)`.
#[derive(Debug, Clone)]
pub struct BatchTensors {
    pub obs: Tensor,
    pub act: Tensor,
    pub rew: Tensor,
    pub done: Tensor,
    pub obs_next: Tensor,
}

impl Batch<Vec<f64>, Vec<f64>> {
    pub fn to_tensors(&self, device: &Device) -> Result<BatchTensors> {
        let n = self.len();
        let dones: Vec<f64> = self
            .done
            .iter()
            .map(|&d| if d { 1.0 } else { 0.0 })
            .collect();
        Ok(BatchTensors {
            obs: rows_to_tensor(&self.obs, device)?,
            act: rows_to_tensor(&self.act, device)?,
            rew: Tensor::from_vec(self.rew.clone(), (n, 1), device)?,
            done: Tensor::from_vec(dones, (n, 1), device)?,
            obs_next: rows_to_tensor(&self.obs_next, device)?,
        })
    }
}

/// Stacks equal-length rows into a `(rows, width)` tensor.
pub fn rows_to_tensor(rows: &[Vec<f64>], device: &Device) -> Result<Tensor> {
    let width = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Tensor::from_vec(flat, (rows.len(), width), device)
}
