use crate::batch::Batch;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::VecDeque;

/// One environment transition, stored by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O, A> {
    pub obs: O,
    pub act: A,
    pub rew: f64,
    pub obs_next: O,
    pub done: bool,
}

impl<O, A> Transition<O, A> {
    pub fn new(obs: O, act: A, rew: f64, obs_next: O, done: bool) -> Self {
        Self {
            obs,
            act,
            rew,
            obs_next,
            done,
        }
    }
}

/// Fixed-capacity FIFO replay memory. Once full, every insert evicts the
/// oldest transition.
#[derive(Debug)]
pub struct ReplayBuffer<O, A> {
    transitions: VecDeque<Transition<O, A>>,
    capacity: usize,
}

impl<O: Clone, A: Clone> ReplayBuffer<O, A> {
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, transition: Transition<O, A>) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Samples up to `batch_size` distinct transitions, uniformly.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Batch<O, A> {
        let sampled = self.transitions.iter().choose_multiple(rng, batch_size);

        let mut b_obs = Vec::with_capacity(sampled.len());
        let mut b_act = Vec::with_capacity(sampled.len());
        let mut b_rew = Vec::with_capacity(sampled.len());
        let mut b_done = Vec::with_capacity(sampled.len());
        let mut b_obs_next = Vec::with_capacity(sampled.len());

        for t in sampled {
            b_obs.push(t.obs.clone());
            b_act.push(t.act.clone());
            b_rew.push(t.rew);
            b_done.push(t.done);
            b_obs_next.push(t.obs_next.clone());
        }

        Batch::new(b_obs, b_act, b_rew, b_done, b_obs_next)
    }

    /// Transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tr(tag: f64) -> Transition<f64, usize> {
        Transition::new(tag, 0, tag, tag + 1.0, false)
    }

    #[test]
    fn test_fifo_eviction() {
        let mut buffer = ReplayBuffer::new(2);
        buffer.add(tr(1.0)); // A
        buffer.add(tr(2.0)); // B
        buffer.add(tr(3.0)); // C

        let kept: Vec<f64> = buffer.iter().map(|t| t.obs).collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = ReplayBuffer::new(5);
        for i in 0..6 {
            buffer.add(tr(i as f64));
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(buffer.len(), 5);
        assert!(buffer.iter().all(|t| t.obs != 0.0));
        assert!(buffer.iter().any(|t| t.obs == 5.0));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut buffer = ReplayBuffer::new(0);
        buffer.add(tr(1.0));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sample_distinct() {
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..50 {
            buffer.add(tr(i as f64));
        }
        let mut rng = StdRng::seed_from_u64(42);
        let batch = buffer.sample(16, &mut rng);
        assert_eq!(batch.len(), 16);

        let mut seen = batch.obs.clone();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen.dedup();
        assert_eq!(seen.len(), 16);
        for (o, n) in batch.obs.iter().zip(&batch.obs_next) {
            assert_eq!(*n, o + 1.0);
        }
    }

    #[test]
    fn test_sample_more_than_stored() {
        let mut buffer = ReplayBuffer::new(10);
        buffer.add(tr(1.0));
        buffer.add(tr(2.0));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(buffer.sample(8, &mut rng).len(), 2);
    }
}
