//! # Header Calculus
//!
//! Gas limit, base fee and blob fee derivation for the next block.

use shared_types::params::{
    BLOB_BASE_FEE_UPDATE_FRACTION, GAS_LIMIT_BOUND_DIVISOR, INITIAL_BASE_FEE, MIN_BLOB_GASPRICE,
    MIN_GAS_LIMIT, TARGET_BLOB_GAS_PER_BLOCK,
};
use shared_types::{ChainConfig, Header, U256};

/// Move `parent_gas_limit` toward `desired` by at most
/// `parent / 1024 - 1`, never below [`MIN_GAS_LIMIT`].
pub fn calc_gas_limit(parent_gas_limit: u64, desired: u64) -> u64 {
    let delta = (parent_gas_limit / GAS_LIMIT_BOUND_DIVISOR).saturating_sub(1);
    let desired = desired.max(MIN_GAS_LIMIT);
    let mut limit = parent_gas_limit;
    if limit < desired {
        limit = parent_gas_limit.saturating_add(delta).min(desired);
    } else if limit > desired {
        limit = parent_gas_limit.saturating_sub(delta).max(desired);
    }
    limit
}

/// Base fee of the child of `parent`.
///
/// The first block with a base fee uses [`INITIAL_BASE_FEE`].
pub fn calc_base_fee(chain: &ChainConfig, parent: &Header) -> U256 {
    let initial = U256::from(INITIAL_BASE_FEE);
    if !chain.is_london(parent.number) {
        return initial;
    }
    let parent_base_fee = parent.base_fee.unwrap_or(initial);
    let target = parent.gas_limit / chain.elasticity_multiplier.max(1);
    if target == 0 || parent.gas_used == target {
        return parent_base_fee;
    }
    let denominator = U256::from(chain.base_fee_change_denominator.max(1));
    let target_u = U256::from(target);

    if parent.gas_used > target {
        let excess = U256::from(parent.gas_used - target);
        let delta = (parent_base_fee.saturating_mul(excess) / target_u / denominator).max(U256::one());
        parent_base_fee.saturating_add(delta)
    } else {
        let shortfall = U256::from(target - parent.gas_used);
        let delta = parent_base_fee.saturating_mul(shortfall) / target_u / denominator;
        parent_base_fee.saturating_sub(delta)
    }
}

/// Excess blob gas of the child of a block with these counters.
pub fn calc_excess_blob_gas(parent_excess: u64, parent_used: u64) -> u64 {
    parent_excess
        .saturating_add(parent_used)
        .saturating_sub(TARGET_BLOB_GAS_PER_BLOCK)
}

/// Integer approximation of `factor * e ** (numerator / denominator)`.
pub fn fake_exponential(factor: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return factor;
    }
    let mut output = U256::zero();
    let mut accum = factor.saturating_mul(denominator);
    let mut i = U256::one();
    while !accum.is_zero() {
        output = output.saturating_add(accum);
        accum = accum.saturating_mul(numerator) / denominator.saturating_mul(i);
        i += U256::one();
    }
    output / denominator
}

/// Blob base fee for a block with `excess_blob_gas`.
pub fn calc_blob_fee(excess_blob_gas: u64) -> U256 {
    fake_exponential(
        U256::from(MIN_BLOB_GASPRICE),
        U256::from(excess_blob_gas),
        U256::from(BLOB_BASE_FEE_UPDATE_FRACTION),
    )
}
