//! Weekly bonus calculation with sparse-week fusion.
//!
//! Sales are grouped per (salesperson, year, week). A week with fewer distinct
//! sale days than the configured minimum is a *sparse* week: its total is
//! folded into the same salesperson's lowest-grossing fused week before the
//! tier table is applied, so a short week never forfeits a bonus on its own.
//!
//! Sparse weeks are processed in ascending (salesperson, year, week) order and
//! merge-target ties are broken by the earliest (year, week), which keeps the
//! result identical across runs.

use crate::schema::{CommissionConfig, SalesRecord, VendorSummary};
use crate::tiers::lookup_bonus;
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub salesperson: String,
    pub year: i32,
    pub week: u32,
}

/// Raw per-week totals before fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGroup {
    pub key: WeekKey,
    pub total_sales: f64,
    /// Distinct calendar days with at least one sale.
    pub active_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedWeek {
    pub key: WeekKey,
    pub total_sales: f64,
    pub bonus: f64,
    /// (year, week) of the sparse weeks folded into this one.
    pub absorbed: Vec<(i32, u32)>,
}

impl FusedWeek {
    pub fn period_label(&self) -> String {
        format!("Semana {}", self.key.week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    /// Sorted by salesperson, then year and week.
    pub weeks: Vec<FusedWeek>,
    /// One entry per salesperson, sorted by name.
    pub vendor_summaries: Vec<VendorSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FusedWeekId(usize);

/// Fused weeks addressed by a stable id. Entries are replaced, never aliased.
#[derive(Debug, Default)]
struct FusedWeekArena {
    weeks: Vec<FusedWeek>,
}

impl FusedWeekArena {
    fn insert(&mut self, week: FusedWeek) -> FusedWeekId {
        self.weeks.push(week);
        FusedWeekId(self.weeks.len() - 1)
    }

    fn get(&self, id: FusedWeekId) -> &FusedWeek {
        &self.weeks[id.0]
    }

    fn replace(&mut self, id: FusedWeekId, week: FusedWeek) {
        self.weeks[id.0] = week;
    }

    fn lowest_for(&self, salesperson: &str) -> Option<FusedWeekId> {
        self.weeks
            .iter()
            .enumerate()
            .filter(|(_, w)| w.key.salesperson == salesperson)
            .min_by(|(_, a), (_, b)| {
                a.total_sales
                    .total_cmp(&b.total_sales)
                    .then_with(|| (a.key.year, a.key.week).cmp(&(b.key.year, b.key.week)))
            })
            .map(|(idx, _)| FusedWeekId(idx))
    }

    fn into_sorted(self) -> Vec<FusedWeek> {
        let mut weeks = self.weeks;
        weeks.sort_by(|a, b| a.key.cmp(&b.key));
        weeks
    }
}

/// Groups records by (salesperson, year, week), ordered by that key.
pub fn group_weeks<'a, I>(records: I) -> Vec<WeeklyGroup>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<WeekKey, (f64, BTreeSet<NaiveDate>)> = BTreeMap::new();

    for record in records {
        let key = WeekKey {
            salesperson: record.salesperson_name().to_string(),
            year: record.date().year(),
            week: record.week_number(),
        };
        let (total, days) = groups.entry(key).or_default();
        *total += record.total_usd();
        days.insert(record.date());
    }

    groups
        .into_iter()
        .map(|(key, (total_sales, days))| WeeklyGroup {
            key,
            total_sales,
            active_days: days.len(),
        })
        .collect()
}

pub struct WeekFusion<'a> {
    config: &'a CommissionConfig,
}

impl<'a> WeekFusion<'a> {
    pub fn new(config: &'a CommissionConfig) -> Self {
        Self { config }
    }

    pub fn fuse<'r, I>(&self, records: I) -> FusionOutcome
    where
        I: IntoIterator<Item = &'r SalesRecord>,
    {
        let groups = group_weeks(records);
        let (valid, sparse): (Vec<_>, Vec<_>) = groups
            .into_iter()
            .partition(|g| g.active_days >= self.config.min_active_days);

        debug!(
            "Week fusion: {} valid weeks, {} sparse weeks",
            valid.len(),
            sparse.len()
        );

        let mut arena = FusedWeekArena::default();
        for group in valid {
            arena.insert(self.standalone(group));
        }

        for group in sparse {
            match arena.lowest_for(&group.key.salesperson) {
                Some(id) => {
                    let target = arena.get(id);
                    debug!(
                        "Folding {} week {}/{} ({:.2}) into week {}/{}",
                        group.key.salesperson,
                        group.key.year,
                        group.key.week,
                        group.total_sales,
                        target.key.year,
                        target.key.week
                    );
                    let merged = self.merge(target, &group);
                    arena.replace(id, merged);
                }
                None => {
                    arena.insert(self.standalone(group));
                }
            }
        }

        let weeks = arena.into_sorted();
        let vendor_summaries = summarize_by_vendor(&weeks);

        FusionOutcome {
            weeks,
            vendor_summaries,
        }
    }

    fn standalone(&self, group: WeeklyGroup) -> FusedWeek {
        FusedWeek {
            bonus: lookup_bonus(group.total_sales, &self.config.weekly_tiers),
            total_sales: group.total_sales,
            key: group.key,
            absorbed: Vec::new(),
        }
    }

    fn merge(&self, target: &FusedWeek, sparse: &WeeklyGroup) -> FusedWeek {
        let total_sales = target.total_sales + sparse.total_sales;
        let mut absorbed = target.absorbed.clone();
        absorbed.push((sparse.key.year, sparse.key.week));

        FusedWeek {
            key: target.key.clone(),
            total_sales,
            bonus: lookup_bonus(total_sales, &self.config.weekly_tiers),
            absorbed,
        }
    }
}

fn summarize_by_vendor(weeks: &[FusedWeek]) -> Vec<VendorSummary> {
    let mut by_vendor: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for week in weeks {
        let (sales, bonuses) = by_vendor.entry(week.key.salesperson.as_str()).or_default();
        *sales += week.total_sales;
        *bonuses += week.bonus;
    }

    by_vendor
        .into_iter()
        .map(|(salesperson, (total_sales, total_bonuses))| VendorSummary {
            salesperson: salesperson.to_string(),
            total_sales,
            total_bonuses,
        })
        .collect()
}

/// Runs week fusion with the default tier table and day threshold.
pub fn calculate_weekly_bonuses(records: &[SalesRecord]) -> FusionOutcome {
    let config = CommissionConfig::default();
    WeekFusion::new(&config).fuse(records)
}
