//! # Sales Commission Engine
//!
//! Turns tab-delimited sales transaction uploads into typed records, rolls
//! them up along calendar and business dimensions, and computes payouts for
//! four commission schemes.
//!
//! ## Core Concepts
//!
//! - **Records**: each upload row becomes a [`SalesRecord`] whose calendar
//!   fields (weekday, week number, month, quarter, semester) are derived from
//!   the issue date
//! - **Analytics**: rolling totals for today / this week / this month, per
//!   dimension totals, and the top entity per dimension
//! - **CEV**: a percentage of each day's total, paid only on days above the
//!   daily threshold
//! - **VW**: a percentage of each day's Volkswagen sales
//! - **Weekly**: tiered bonuses per salesperson and week, where weeks with
//!   too few active days are fused into the weakest full week
//! - **Manager**: a stepped bonus per day
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_commission_engine::*;
//!
//! let records = parse_sales_text(&generate_sample_csv())?;
//!
//! let engine = CommissionEngine::new(CommissionConfig::default());
//! let cev = engine.cev(&records, &engine.cev_filters());
//! let weekly = engine.weekly(&records, &WeeklyFilters::default());
//!
//! println!("{}", export_commission_summary(&cev, ExportScheme::Cev)?);
//! println!("{}", export_weekly_results(&weekly.weekly_results)?);
//! ```

pub mod analytics;
pub mod commissions;
pub mod error;
pub mod export;
pub mod fusion;
pub mod ingestion;
pub mod schema;
pub mod store;
pub mod tiers;
pub mod utils;

pub use analytics::{
    available_weeks, calculate_analytics, calculate_analytics_at, filter_records, top_entity,
    totals_by_dimension, unique_values, Dimension, DimensionTotal, SalesAnalytics, TopEntity,
};
pub use commissions::{
    calculate_cev_commissions, calculate_manager_commissions, calculate_vw_commissions,
    calculate_weekly_commissions, CommissionEngine,
};
pub use error::{Result, SalesError};
pub use export::*;
pub use fusion::{
    calculate_weekly_bonuses, group_weeks, FusedWeek, FusionOutcome, WeekFusion, WeekKey,
    WeeklyGroup,
};
pub use ingestion::*;
pub use schema::*;
pub use store::{InMemoryRecordStore, JsonFileRecordStore, RecordStore};
pub use tiers::*;
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything computed from one upload under default filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub record_count: usize,
    pub analytics: SalesAnalytics,
    pub cev: CommissionSummary,
    pub vw: CommissionSummary,
    pub weekly: WeeklyCommissionReport,
    pub manager: CommissionSummary,
}

pub struct SalesProcessor;

impl SalesProcessor {
    pub fn process(content: &str, config: &CommissionConfig) -> Result<SalesReport> {
        Self::process_at(content, config, today())
    }

    /// Same as [`SalesProcessor::process`] with an explicit date for the rolling totals.
    pub fn process_at(
        content: &str,
        config: &CommissionConfig,
        reference: NaiveDate,
    ) -> Result<SalesReport> {
        config.validate()?;
        let records = parse_sales_text(content)?;
        Ok(Self::report(&records, config, reference))
    }

    /// Parses an upload, persists it, and reports over everything the store now holds.
    pub fn process_into_store(
        content: &str,
        config: &CommissionConfig,
        store: &dyn RecordStore,
    ) -> Result<SalesReport> {
        config.validate()?;
        let parsed = parse_sales_text(content)?;
        store.insert(&parsed)?;

        let records = store.fetch_all()?;
        info!(
            "Stored {} new records, reporting over {}",
            parsed.len(),
            records.len()
        );
        Ok(Self::report(&records, config, today()))
    }

    pub fn report(
        records: &[SalesRecord],
        config: &CommissionConfig,
        reference: NaiveDate,
    ) -> SalesReport {
        debug!("Building sales report over {} records", records.len());
        let engine = CommissionEngine::new(config.clone());

        SalesReport {
            record_count: records.len(),
            analytics: calculate_analytics_at(records, &SalesFilters::default(), reference),
            cev: engine.cev(records, &engine.cev_filters()),
            vw: engine.vw(records, &engine.vw_filters()),
            weekly: engine.weekly(records, &WeeklyFilters::default()),
            manager: engine.manager(records, &ManagerFilters::default()),
        }
    }
}

pub fn process_sales_text(content: &str) -> Result<SalesReport> {
    SalesProcessor::process(content, &CommissionConfig::default())
}
