use crate::fusion::WeekFusion;
use crate::schema::{
    matches_exact, within_range, CevFilters, CommissionConfig, CommissionResult,
    CommissionSummary, ManagerFilters, SalesRecord, VwFilters, WeeklyCommissionReport,
    WeeklyCommissionResult, WeeklyFilters,
};
use crate::utils::format_date;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

const MERCADO_LIBRE_MARKERS: [&str; 2] = ["mercado libre", "ml"];
const MOTO_SIETE_MARKER: &str = "moto siete";
const VW_BRAND_MARKERS: [&str; 2] = ["volks", "vw"];

/// Runs the four commission schemes against one configuration.
#[derive(Debug, Clone, Default)]
pub struct CommissionEngine {
    config: CommissionConfig,
}

impl CommissionEngine {
    pub fn new(config: CommissionConfig) -> Self {
        Self { config }
    }

    /// CEV filters preloaded with the configured rate and both exclusions on.
    pub fn cev_filters(&self) -> CevFilters {
        CevFilters {
            start_date: None,
            end_date: None,
            rate: self.config.cev_rate,
            exclude_mercado_libre: true,
            exclude_moto_siete: true,
        }
    }

    pub fn vw_filters(&self) -> VwFilters {
        VwFilters {
            start_date: None,
            end_date: None,
            rate: self.config.vw_rate,
            salespeople: Vec::new(),
        }
    }

    /// General scheme: a flat percentage of each day's total, paid only on
    /// days strictly above the daily threshold.
    pub fn cev(&self, records: &[SalesRecord], filters: &CevFilters) -> CommissionSummary {
        let selected = records.iter().filter(|r| {
            within_range(r.date(), filters.start_date, filters.end_date)
                && !(filters.exclude_mercado_libre && is_mercado_libre(r.client_name()))
                && !(filters.exclude_moto_siete && is_moto_siete(r.salesperson_name()))
        });

        let threshold = self.config.cev_daily_threshold;
        let summary = day_bucketed_summary(selected, Some(filters.rate), |total| {
            if total > threshold {
                total * (filters.rate / 100.0)
            } else {
                0.0
            }
        });

        info!(
            "CEV commissions: {:.2} on {:.2} in sales over {} days",
            summary.total_commissions,
            summary.total_sales,
            summary.results.len()
        );
        summary
    }

    /// Brand scheme: a flat percentage of each day's Volkswagen sales.
    pub fn vw(&self, records: &[SalesRecord], filters: &VwFilters) -> CommissionSummary {
        let selected = records.iter().filter(|r| {
            within_range(r.date(), filters.start_date, filters.end_date)
                && (filters.salespeople.is_empty()
                    || filters
                        .salespeople
                        .iter()
                        .any(|s| s == r.salesperson_name()))
                && is_volkswagen(r.vehicle_brand())
        });

        let summary = day_bucketed_summary(selected, Some(filters.rate), |total| {
            total * (filters.rate / 100.0)
        });

        info!(
            "VW commissions: {:.2} on {:.2} in sales over {} days",
            summary.total_commissions,
            summary.total_sales,
            summary.results.len()
        );
        summary
    }

    /// Per-salesperson weekly tier bonus with sparse-week fusion.
    pub fn weekly(&self, records: &[SalesRecord], filters: &WeeklyFilters) -> WeeklyCommissionReport {
        let selected: Vec<&SalesRecord> = records
            .iter()
            .filter(|r| {
                within_range(r.date(), filters.start_date, filters.end_date)
                    && matches_exact(&filters.salesperson, r.salesperson_name())
                    && (filters.weeks.is_empty() || filters.weeks.contains(&r.week_number()))
            })
            .collect();
        debug!("Weekly scheme selected {} records", selected.len());

        let outcome = WeekFusion::new(&self.config).fuse(selected);

        let period = format!(
            "{} - {}",
            date_or_empty(filters.start_date),
            date_or_empty(filters.end_date)
        );

        let results: Vec<CommissionResult> = outcome
            .vendor_summaries
            .iter()
            .map(|v| CommissionResult {
                payee: v.salesperson.clone(),
                total_sales: v.total_sales,
                commission: v.total_bonuses,
                period: period.clone(),
            })
            .collect();

        let weekly_results = outcome
            .weeks
            .iter()
            .map(|w| WeeklyCommissionResult {
                salesperson: w.key.salesperson.clone(),
                week: w.key.week,
                year: w.key.year,
                total_sales: w.total_sales,
                bonus: w.bonus,
                period: w.period_label(),
            })
            .collect();

        let summary = CommissionSummary {
            total_sales: results.iter().map(|r| r.total_sales).sum(),
            total_commissions: results.iter().map(|r| r.commission).sum(),
            rate: None,
            results,
        };

        info!(
            "Weekly bonuses: {:.2} across {} salespeople",
            summary.total_commissions,
            summary.results.len()
        );

        WeeklyCommissionReport {
            summary,
            weekly_results,
        }
    }

    /// Manager scheme: stepped absolute bonus per day, no exclusions.
    pub fn manager(&self, records: &[SalesRecord], filters: &ManagerFilters) -> CommissionSummary {
        let selected = records
            .iter()
            .filter(|r| within_range(r.date(), filters.start_date, filters.end_date));

        let rule = self.config.manager_rule;
        let summary = day_bucketed_summary(selected, None, |total| rule.bonus_for(total));

        info!(
            "Manager bonuses: {:.2} on {:.2} in sales over {} days",
            summary.total_commissions,
            summary.total_sales,
            summary.results.len()
        );
        summary
    }
}

/// Sums sales per calendar day and prices each day with `commission_for`.
/// Rows are ordered by date and carry the day label as payee and period.
fn day_bucketed_summary<'a, I, F>(records: I, rate: Option<f64>, commission_for: F) -> CommissionSummary
where
    I: Iterator<Item = &'a SalesRecord>,
    F: Fn(f64) -> f64,
{
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *by_day.entry(record.date()).or_insert(0.0) += record.total_usd();
    }

    let results: Vec<CommissionResult> = by_day
        .into_iter()
        .map(|(day, total_sales)| {
            let label = format_date(day);
            CommissionResult {
                payee: label.clone(),
                total_sales,
                commission: commission_for(total_sales),
                period: label,
            }
        })
        .collect();

    CommissionSummary {
        total_sales: results.iter().map(|r| r.total_sales).sum(),
        total_commissions: results.iter().map(|r| r.commission).sum(),
        rate,
        results,
    }
}

fn date_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn is_mercado_libre(client_name: &str) -> bool {
    let client = client_name.to_lowercase();
    MERCADO_LIBRE_MARKERS.iter().any(|m| client.contains(m))
}

fn is_moto_siete(salesperson_name: &str) -> bool {
    salesperson_name.to_lowercase().contains(MOTO_SIETE_MARKER)
}

fn is_volkswagen(brand: &str) -> bool {
    let brand = brand.to_lowercase();
    VW_BRAND_MARKERS.iter().any(|m| brand.contains(m))
}

pub fn calculate_cev_commissions(records: &[SalesRecord], filters: &CevFilters) -> CommissionSummary {
    CommissionEngine::default().cev(records, filters)
}

pub fn calculate_vw_commissions(records: &[SalesRecord], filters: &VwFilters) -> CommissionSummary {
    CommissionEngine::default().vw(records, filters)
}

pub fn calculate_weekly_commissions(
    records: &[SalesRecord],
    filters: &WeeklyFilters,
) -> WeeklyCommissionReport {
    CommissionEngine::default().weekly(records, filters)
}

pub fn calculate_manager_commissions(
    records: &[SalesRecord],
    filters: &ManagerFilters,
) -> CommissionSummary {
    CommissionEngine::default().manager(records, filters)
}
