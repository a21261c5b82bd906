//! Discounted, bootstrapped returns for truncated rollouts.

/// Computes `G[t] = r[t] + gamma * G[t + 1] * mask[t]` backwards from
/// `G[T] = bootstrap`.
///
/// `mask[t]` is 0.0 where the episode ended at step `t`, which stops the
/// bootstrap (and later rewards) from leaking across the episode boundary.
/// `rewards` and `masks` must have the same length.
pub fn compute_returns(bootstrap: f64, rewards: &[f64], masks: &[f64], gamma: f64) -> Vec<f64> {
    debug_assert_eq!(rewards.len(), masks.len());

    let mut returns = vec![0.0; rewards.len()];
    let mut running = bootstrap;
    for t in (0..rewards.len()).rev() {
        running = rewards[t] + gamma * running * masks[t];
        returns[t] = running;
    }
    returns
}

/// Per-replica [`compute_returns`] over `[time][replica]` grids.
///
/// `bootstrap` holds one value per replica. The result has the same
/// `[time][replica]` layout as `rewards`.
pub fn compute_returns_batched(
    bootstrap: &[f64],
    rewards: &[Vec<f64>],
    masks: &[Vec<f64>],
    gamma: f64,
) -> Vec<Vec<f64>> {
    debug_assert_eq!(rewards.len(), masks.len());

    let mut returns = vec![vec![0.0; bootstrap.len()]; rewards.len()];
    let mut running = bootstrap.to_vec();
    for t in (0..rewards.len()).rev() {
        for (i, g) in running.iter_mut().enumerate() {
            *g = rewards[t][i] + gamma * *g * masks[t][i];
            returns[t][i] = *g;
        }
    }
    returns
}
