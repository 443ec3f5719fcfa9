//! Stake allocator.
//!
//! Splits a bankroll across the legs of an opportunity so every
//! outcome pays the same amount. With implied sum S = Σ 1/odds_i, the
//! stake on leg i is (B / odds_i) / S and every leg returns B / S.
//! When S < 1 the common return exceeds the bankroll and the profit is
//! locked in regardless of the result.
//!
//! Pure arithmetic, no I/O. The API layer calls this on demand.

use crate::error::StakeError;
use crate::types::{OpportunityLeg, StakeLeg, StakePlan};

/// Allocate `bankroll` across `legs` so all outcomes return the same
/// payout.
///
/// Stakes always sum to the bankroll exactly (up to floating-point
/// rounding) whether or not the legs form a profitable set; callers
/// wanting guaranteed profit check the opportunity's margin first.
pub fn allocate(legs: &[OpportunityLeg], bankroll: f64) -> Result<StakePlan, StakeError> {
    if legs.is_empty() {
        return Err(StakeError::NoLegs);
    }
    if !bankroll.is_finite() || bankroll <= 0.0 {
        return Err(StakeError::InvalidBankroll(bankroll));
    }
    for leg in legs {
        if !leg.odds.is_finite() || leg.odds <= 1.0 {
            return Err(StakeError::InvalidOdds {
                outcome: leg.outcome.clone(),
                odds: leg.odds,
            });
        }
    }

    let implied_sum: f64 = legs.iter().map(|l| 1.0 / l.odds).sum();
    let guaranteed_return = bankroll / implied_sum;

    let stakes: Vec<StakeLeg> = legs
        .iter()
        .map(|leg| {
            let stake = (bankroll / leg.odds) / implied_sum;
            StakeLeg {
                outcome: leg.outcome.clone(),
                bookmaker_title: leg.bookmaker_title.clone(),
                odds: leg.odds,
                stake,
                payout: stake * leg.odds,
            }
        })
        .collect();

    let profit = guaranteed_return - bankroll;
    Ok(StakePlan {
        stakes,
        total_stake: bankroll,
        guaranteed_return,
        profit,
        roi_pct: profit / bankroll * 100.0,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
