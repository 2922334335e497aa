//! Distribution strategies.
//!
//! Splits an expense amount across the resolved unit set. Both strategies
//! are pure functions over integer minor units and guarantee that the
//! shares sum to the input amount **exactly**, using the largest-remainder
//! method: truncate every share to whole kuruş, then hand the leftover
//! kuruş out one by one in a deterministic order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, UnitRef};

/// How an expense is split across its scoped units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Equal,
    AreaWeighted,
}

impl DistributionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::AreaWeighted => "area_weighted",
        }
    }
}

impl TryFrom<&str> for DistributionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "area_weighted" => Ok(Self::AreaWeighted),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid distribution kind: {other}"
            ))),
        }
    }
}

/// One unit's computed share of an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitShare {
    pub unit_id: Uuid,
    pub amount: MoneyCents,
}

/// Result of a distribution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    /// One share per input unit, in the input (stable scope) order.
    pub shares: Vec<UnitShare>,
    /// Set when an `AreaWeighted` request fell back to `Equal` because no
    /// unit had a usable floor area. A notice, not an error.
    pub degraded_to_equal: bool,
}

impl Distribution {
    /// Sum of all shares, for post-condition checks.
    #[must_use]
    pub fn total(&self) -> MoneyCents {
        MoneyCents::new(self.shares.iter().map(|s| s.amount.cents()).sum())
    }
}

/// Computes the per-unit split of `amount` over `units`.
///
/// `units` must be in the stable order produced by the scope resolver; the
/// remainder kuruş land on the first units of that order (equal split) or on
/// the largest fractional remainders (area-weighted split), so the result
/// is fully deterministic.
pub fn distribute(
    amount: MoneyCents,
    kind: DistributionKind,
    units: &[UnitRef],
) -> ResultEngine<Distribution> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(
            "expense amount must not be negative".to_string(),
        ));
    }
    if units.is_empty() {
        return Err(EngineError::EmptyScope(
            "no units to distribute over".to_string(),
        ));
    }

    match kind {
        DistributionKind::Equal => Ok(Distribution {
            shares: split_equal(amount, units),
            degraded_to_equal: false,
        }),
        DistributionKind::AreaWeighted => split_area_weighted(amount, units),
    }
}

fn split_equal(amount: MoneyCents, units: &[UnitRef]) -> Vec<UnitShare> {
    let n = units.len() as i64;
    let base = amount.cents() / n;
    let remainder = amount.cents() - base * n;

    units
        .iter()
        .enumerate()
        .map(|(index, unit)| UnitShare {
            unit_id: unit.id,
            amount: MoneyCents::new(base + i64::from((index as i64) < remainder)),
        })
        .collect()
}

/// Integer weight for a unit: its floor area in whole square-decimeters.
///
/// Scaling to dm² before the integer pass keeps remainder comparison exact;
/// null or non-positive areas weigh zero but stay in the set.
fn area_weight(unit: &UnitRef) -> i64 {
    match unit.floor_area_m2 {
        Some(area) if area > 0.0 => (area * 100.0).round() as i64,
        _ => 0,
    }
}

fn split_area_weighted(amount: MoneyCents, units: &[UnitRef]) -> ResultEngine<Distribution> {
    let weights: Vec<i64> = units.iter().map(area_weight).collect();
    let total_weight: i128 = weights.iter().map(|w| i128::from(*w)).sum();

    if total_weight == 0 {
        // No usable area data anywhere in the scope: the split degrades to
        // an equal one and the caller is notified, not failed.
        return Ok(Distribution {
            shares: split_equal(amount, units),
            degraded_to_equal: true,
        });
    }

    let mut shares = Vec::with_capacity(units.len());
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(units.len());
    let mut distributed: i64 = 0;

    for (index, (unit, weight)) in units.iter().zip(&weights).enumerate() {
        let numerator = i128::from(amount.cents()) * i128::from(*weight);
        let base = (numerator / total_weight) as i64;
        distributed += base;
        remainders.push((index, numerator % total_weight));
        shares.push(UnitShare {
            unit_id: unit.id,
            amount: MoneyCents::new(base),
        });
    }

    // Largest fractional remainder first; ties broken by stable scope order.
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let leftover = amount.cents() - distributed;
    for (index, _) in remainders.iter().take(leftover as usize) {
        shares[*index].amount += MoneyCents::new(1);
    }

    Ok(Distribution {
        shares,
        degraded_to_equal: false,
    })
}
