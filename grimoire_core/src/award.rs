//! Grant calculation policy.
//!
//! Pure functions turning a raw XP amount into the value actually added to
//! the ledger. Nothing here mutates state; the facade applies the result.
//!
//! The cap is coarse: a source's cap percent is evaluated against the
//! spell's *total* accumulated XP at grant time, not against a per-source
//! running total.

use crate::types::XpSourceDescriptor;
use crate::{Error, Result};

/// Compute the XP a sourced grant actually awards.
///
/// 1. Negative amounts are rejected; zero awards zero.
/// 2. `effective = raw × source multiplier × global multiplier`
/// 3. The post-grant total may not exceed `min(required, required × cap%)`.
///
/// Returns the clamped amount; zero when the spell is already at or past
/// this source's cap.
pub fn compute_grant(
    raw_amount: f64,
    source: &XpSourceDescriptor,
    global_multiplier: f64,
    current: f64,
    required: f64,
) -> Result<f64> {
    if raw_amount < 0.0 || !raw_amount.is_finite() {
        return Err(Error::InvalidAmount(raw_amount));
    }
    if raw_amount == 0.0 {
        return Ok(0.0);
    }

    let effective = raw_amount * source.multiplier.max(0.0) * global_multiplier.max(0.0);

    let cap_abs = required * (source.cap_percent.clamp(0.0, 100.0) / 100.0);
    let cap_target = required.min(cap_abs);
    let headroom = (cap_target - current).max(0.0);

    let granted = effective.clamp(0.0, headroom);
    tracing::debug!(
        "Grant: raw {} -> effective {} -> granted {} (current {}, cap target {})",
        raw_amount,
        effective,
        granted,
        current,
        cap_target
    );
    Ok(granted)
}

/// Compute the XP a raw grant actually awards.
///
/// Raw grants bypass multipliers and source caps entirely, but still may not
/// push the total past `required`.
pub fn compute_raw_grant(raw_amount: f64, current: f64, required: f64) -> Result<f64> {
    if raw_amount < 0.0 || !raw_amount.is_finite() {
        return Err(Error::InvalidAmount(raw_amount));
    }

    let headroom = (required - current).max(0.0);
    Ok(raw_amount.min(headroom))
}
