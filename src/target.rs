//! Target network updates over `VarMap`s.
//!
//! Online and target networks are built from separate `VarMap`s with the same
//! layer names, so parameters are matched by name:
//!
//! ```text
//! θ_target = τ * θ_online + (1 - τ) * θ_target
//! ```

use candle_core::{Error, Result};
use candle_nn::VarMap;

/// Polyak-averages every target parameter toward its online counterpart.
///
/// `target` and `online` must be distinct maps.
pub fn soft_update(target: &VarMap, online: &VarMap, tau: f64) -> Result<()> {
    let online_vars = online
        .data()
        .lock()
        .map_err(|e| Error::Msg(format!("online parameters poisoned: {}", e)))?;
    let target_vars = target
        .data()
        .lock()
        .map_err(|e| Error::Msg(format!("target parameters poisoned: {}", e)))?;

    for (name, target_var) in target_vars.iter() {
        let online_var = online_vars
            .get(name)
            .ok_or_else(|| Error::Msg(format!("online network has no parameter {}", name)))?;
        let blended = target_var
            .as_tensor()
            .affine(1.0 - tau, 0.0)?
            .add(&online_var.as_tensor().affine(tau, 0.0)?)?
            .detach();
        target_var.set(&blended)?;
    }
    Ok(())
}

/// Copies the online parameters into the target verbatim.
pub fn hard_update(target: &VarMap, online: &VarMap) -> Result<()> {
    soft_update(target, online, 1.0)
}
