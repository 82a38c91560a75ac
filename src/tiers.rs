use crate::error::{Result, SalesError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A flat bonus paid when a weekly total falls inside `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BonusTier {
    pub min: f64,
    pub max: f64,
    pub bonus: f64,
}

impl BonusTier {
    pub const fn new(min: f64, max: f64, bonus: f64) -> Self {
        Self { min, max, bonus }
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

const WEEKLY_TIERS: [BonusTier; 19] = [
    BonusTier::new(500.0, 1000.0, 10.0),
    BonusTier::new(1001.0, 1500.0, 15.0),
    BonusTier::new(1501.0, 2000.0, 20.0),
    BonusTier::new(2001.0, 2500.0, 25.0),
    BonusTier::new(2501.0, 3000.0, 30.0),
    BonusTier::new(3001.0, 3500.0, 35.0),
    BonusTier::new(3501.0, 4000.0, 40.0),
    BonusTier::new(4001.0, 4500.0, 45.0),
    BonusTier::new(4501.0, 5000.0, 50.0),
    BonusTier::new(5001.0, 5500.0, 60.0),
    BonusTier::new(5501.0, 6000.0, 70.0),
    BonusTier::new(6001.0, 6500.0, 80.0),
    BonusTier::new(6501.0, 7000.0, 90.0),
    BonusTier::new(7001.0, 7500.0, 100.0),
    BonusTier::new(7501.0, 8000.0, 110.0),
    BonusTier::new(8001.0, 8500.0, 120.0),
    BonusTier::new(8501.0, 9000.0, 130.0),
    BonusTier::new(9001.0, 9500.0, 140.0),
    BonusTier::new(9501.0, 9_999_999.0, 150.0),
];

pub fn default_weekly_tiers() -> Vec<BonusTier> {
    WEEKLY_TIERS.to_vec()
}

/// First band containing `amount` wins; amounts outside every band earn nothing.
///
/// Bands are inclusive on both ends, so fractional totals between two bands
/// (e.g. `1000.50` with the default table) fall through to zero.
pub fn lookup_bonus(amount: f64, tiers: &[BonusTier]) -> f64 {
    tiers
        .iter()
        .find(|tier| tier.contains(amount))
        .map(|tier| tier.bonus)
        .unwrap_or(0.0)
}

pub fn validate_tier_table(tiers: &[BonusTier]) -> Result<()> {
    if tiers.is_empty() {
        return Err(SalesError::InvalidTierTable(
            "At least one tier is required".to_string(),
        ));
    }

    for (idx, tier) in tiers.iter().enumerate() {
        if !tier.min.is_finite() || !tier.max.is_finite() || !tier.bonus.is_finite() {
            return Err(SalesError::InvalidTierTable(format!(
                "Tier #{} contains a non-finite value",
                idx
            )));
        }
        if tier.min > tier.max {
            return Err(SalesError::InvalidTierTable(format!(
                "Tier #{} has min {} above max {}",
                idx, tier.min, tier.max
            )));
        }
        if tier.bonus < 0.0 {
            return Err(SalesError::InvalidTierTable(format!(
                "Tier #{} has a negative bonus",
                idx
            )));
        }
    }

    for (idx, pair) in tiers.windows(2).enumerate() {
        if pair[1].min <= pair[0].max {
            return Err(SalesError::InvalidTierTable(format!(
                "Tier #{} (starting at {}) overlaps or precedes tier #{} (ending at {})",
                idx + 1,
                pair[1].min,
                idx,
                pair[0].max
            )));
        }
    }

    Ok(())
}

/// Stepped absolute bonus for the manager scheme, evaluated per day:
///
/// - below `floor`: nothing
/// - `floor..step_start`: `floor_bonus`
/// - `step_start..ceiling`: `floor(total / step_start) * step_bonus`
/// - `ceiling` and above: `ceiling_bonus`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ManagerBonusRule {
    pub floor: f64,
    pub floor_bonus: f64,
    pub step_start: f64,
    pub step_bonus: f64,
    pub ceiling: f64,
    pub ceiling_bonus: f64,
}

impl Default for ManagerBonusRule {
    fn default() -> Self {
        Self {
            floor: 3000.0,
            floor_bonus: 15.0,
            step_start: 4000.0,
            step_bonus: 20.0,
            ceiling: 5000.0,
            ceiling_bonus: 30.0,
        }
    }
}

impl ManagerBonusRule {
    pub fn bonus_for(&self, total: f64) -> f64 {
        if total >= self.ceiling {
            self.ceiling_bonus
        } else if total >= self.step_start {
            (total / self.step_start).floor() * self.step_bonus
        } else if total >= self.floor {
            self.floor_bonus
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.floor,
            self.floor_bonus,
            self.step_start,
            self.step_bonus,
            self.ceiling,
            self.ceiling_bonus,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SalesError::InvalidConfig(
                "Manager bonus rule values must be finite and non-negative".to_string(),
            ));
        }
        if self.step_start <= 0.0 || !(self.floor <= self.step_start && self.step_start <= self.ceiling)
        {
            return Err(SalesError::InvalidConfig(format!(
                "Manager thresholds must satisfy 0 < floor ({}) <= step_start ({}) <= ceiling ({})",
                self.floor, self.step_start, self.ceiling
            )));
        }
        Ok(())
    }
}
