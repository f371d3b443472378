//! Significant-holder selection
//!
//! A holder is analyzed only when it is not a known liquidity pool and holds
//! at least 0.1% of the total supply.

use super::types::Holder;
use crate::logger::{self, LogTag};
use rust_decimal::{Decimal, RoundingStrategy};

/// 0.001 (0.1% of supply)
pub const MIN_SUPPLY_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Fractional digits kept when computing `balance / total_supply`
pub const RATIO_SCALE: u32 = 18;

/// Pool vaults that hold supply on behalf of liquidity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownPool {
    RaydiumAmmV4,
    RaydiumCpmm,
}

impl KnownPool {
    pub const ALL: [KnownPool; 2] = [KnownPool::RaydiumAmmV4, KnownPool::RaydiumCpmm];

    /// Authority address that owns the pool's token vaults
    pub fn address(&self) -> &'static str {
        match self {
            KnownPool::RaydiumAmmV4 => "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1",
            KnownPool::RaydiumCpmm => "GpMZbSM2GgvTKHJirzeGfMFoaZ8UR2X7F4v8vHTvxFbL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            KnownPool::RaydiumAmmV4 => "Raydium AMM v4",
            KnownPool::RaydiumCpmm => "Raydium CPMM",
        }
    }

    pub fn from_address(address: &str) -> Option<KnownPool> {
        KnownPool::ALL.into_iter().find(|pool| pool.address() == address)
    }
}

pub fn is_known_pool(address: &str) -> bool {
    KnownPool::from_address(address).is_some()
}

/// `balance / total_supply`, truncated (never rounded up) to [`RATIO_SCALE`] digits
pub fn supply_ratio(balance: Decimal, total_supply: Decimal) -> Option<Decimal> {
    if total_supply <= Decimal::ZERO {
        return None;
    }
    balance
        .checked_div(total_supply)
        .map(|ratio| ratio.round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::ToZero))
}

pub fn is_significant(holder: &Holder, total_supply: Decimal) -> bool {
    if is_known_pool(&holder.address) {
        return false;
    }
    match supply_ratio(holder.balance, total_supply) {
        Some(ratio) => ratio >= MIN_SUPPLY_RATIO,
        None => false,
    }
}

/// Holders worth classifying, in input order
pub fn filter_significant_holders(holders: &[Holder], total_supply: u64) -> Vec<Holder> {
    let total = Decimal::from(total_supply);
    let significant: Vec<Holder> = holders
        .iter()
        .filter(|holder| is_significant(holder, total))
        .cloned()
        .collect();

    let pools: Vec<&'static str> = holders
        .iter()
        .filter_map(|h| KnownPool::from_address(&h.address))
        .map(|pool| pool.display_name())
        .collect();
    logger::debug(
        LogTag::Filter,
        &format!(
            "{} of {} holders significant (pool accounts excluded: {})",
            significant.len(),
            holders.len(),
            if pools.is_empty() {
                "none".to_string()
            } else {
                pools.join(", ")
            }
        ),
    );

    significant
}
