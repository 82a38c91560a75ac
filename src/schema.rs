use crate::error::{Result, SalesError};
use crate::tiers::{default_weekly_tiers, validate_tier_table, BonusTier, ManagerBonusRule};
use crate::utils::{
    format_date, get_day_of_week, get_month_name, get_quarter, get_semester, get_week_number,
    parse_date,
};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line-item sale as it arrives from an upload or the record store,
/// before any derived calendar attributes are attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SalesRow {
    #[serde(rename = "id_documento", default)]
    pub document_id: String,
    #[serde(rename = "tipo_documento", default)]
    pub document_type: String,
    #[serde(rename = "doc_num", default)]
    pub document_number: String,
    #[serde(rename = "fec_emis")]
    pub issue_date: String,
    #[serde(rename = "co_ven", default)]
    pub salesperson_code: String,
    #[serde(rename = "nombre_vendedor", default)]
    pub salesperson_name: String,
    #[serde(rename = "co_cond", default)]
    pub payment_terms: String,
    #[serde(rename = "co_cli", default)]
    pub client_code: String,
    #[serde(rename = "nombre_cliente", default)]
    pub client_name: String,
    #[serde(rename = "tipo_venta", default)]
    pub sale_type: String,
    #[serde(rename = "tasa", default)]
    pub exchange_rate: f64,
    #[serde(rename = "co_sucu_in", default)]
    pub branch_code: String,
    #[serde(rename = "nombre_sucursal", default)]
    pub branch_name: String,
    #[serde(rename = "co_art", default)]
    pub item_code: String,
    #[serde(rename = "des_art", default)]
    pub item_description: String,
    #[serde(rename = "total_art", default)]
    pub quantity: f64,
    #[serde(rename = "prec_vta", default)]
    pub unit_price: f64,
    #[serde(rename = "reng_neto", default)]
    pub net_amount: f64,
    #[serde(rename = "monto_imp", default)]
    pub tax_amount: f64,
    #[serde(rename = "total_usd", default)]
    pub total_usd: f64,
    #[serde(rename = "marcas_de_vehiculos", default)]
    pub vehicle_brand: String,
}

/// Calendar attributes derived from the issue date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CalendarFields {
    #[serde(rename = "fecha_formatted")]
    pub formatted_date: String,
    #[serde(rename = "dia_semana")]
    pub weekday: String,
    #[serde(rename = "numero_semana")]
    pub week_number: u32,
    #[serde(rename = "mes")]
    pub month: String,
    #[serde(rename = "trimestre")]
    pub quarter: u32,
    #[serde(rename = "semestre")]
    pub semester: u32,
}

impl CalendarFields {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            formatted_date: format_date(date),
            weekday: get_day_of_week(date).to_string(),
            week_number: get_week_number(date),
            month: get_month_name(date).to_string(),
            quarter: get_quarter(date),
            semester: get_semester(date),
        }
    }
}

/// A validated transaction. Built only from a [`SalesRow`], so the calendar
/// fields always come from the issue date and never from outside input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SalesRow")]
pub struct SalesRecord {
    #[serde(flatten)]
    row: SalesRow,
    #[serde(skip)]
    date: NaiveDate,
    #[serde(flatten)]
    calendar: CalendarFields,
}

impl SalesRecord {
    pub fn from_row(row: SalesRow) -> Result<Self> {
        let date = parse_date(&row.issue_date)?;
        Ok(Self {
            row,
            date,
            calendar: CalendarFields::for_date(date),
        })
    }

    pub fn row(&self) -> &SalesRow {
        &self.row
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn calendar(&self) -> &CalendarFields {
        &self.calendar
    }

    pub fn salesperson_name(&self) -> &str {
        &self.row.salesperson_name
    }

    pub fn branch_name(&self) -> &str {
        &self.row.branch_name
    }

    pub fn client_name(&self) -> &str {
        &self.row.client_name
    }

    pub fn vehicle_brand(&self) -> &str {
        &self.row.vehicle_brand
    }

    pub fn document_type(&self) -> &str {
        &self.row.document_type
    }

    pub fn sale_type(&self) -> &str {
        &self.row.sale_type
    }

    pub fn total_usd(&self) -> f64 {
        self.row.total_usd
    }

    pub fn week_number(&self) -> u32 {
        self.calendar.week_number
    }
}

impl TryFrom<SalesRow> for SalesRecord {
    type Error = SalesError;

    fn try_from(row: SalesRow) -> Result<Self> {
        Self::from_row(row)
    }
}

/// Predicates for the analytics view. Unset fields impose no constraint;
/// set fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SalesFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub salesperson: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub sale_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub weeks: Vec<u32>,
}

impl SalesFilters {
    pub fn matches(&self, record: &SalesRecord) -> bool {
        within_range(record.date(), self.start_date, self.end_date)
            && matches_exact(&self.salesperson, record.salesperson_name())
            && matches_exact(&self.branch, record.branch_name())
            && matches_exact(&self.client, record.client_name())
            && matches_exact(&self.document_type, record.document_type())
            && matches_exact(&self.sale_type, record.sale_type())
            && matches_exact(&self.brand, record.vehicle_brand())
            && (self.weeks.is_empty() || self.weeks.contains(&record.week_number()))
    }
}

pub(crate) fn within_range(
    date: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> bool {
    start.map_or(true, |start| date >= start) && end.map_or(true, |end| date <= end)
}

/// An empty filter string counts as unset.
pub(crate) fn matches_exact(filter: &Option<String>, value: &str) -> bool {
    match filter.as_deref() {
        Some(expected) if !expected.is_empty() => expected == value,
        _ => true,
    }
}

/// General (CEV) scheme filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CevFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Commission percentage, e.g. `5.0` for 5 %.
    pub rate: f64,
    #[serde(default)]
    pub exclude_mercado_libre: bool,
    #[serde(default)]
    pub exclude_moto_siete: bool,
}

/// Brand-specific (VW) scheme filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VwFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub rate: f64,
    /// Allow-list of salesperson names; empty admits everyone.
    #[serde(default)]
    pub salespeople: Vec<String>,
}

/// Per-salesperson weekly bonus scheme filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub salesperson: Option<String>,
    /// Allow-list of week numbers; empty admits every week.
    #[serde(default)]
    pub weeks: Vec<u32>,
}

/// Manager scheme filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ManagerFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// One commission row. Day-bucketed schemes store the day label in `payee`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommissionResult {
    #[serde(rename = "vendedor")]
    pub payee: String,
    #[serde(rename = "totalVentas")]
    pub total_sales: f64,
    #[serde(rename = "comision")]
    pub commission: f64,
    #[serde(rename = "periodo")]
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommissionSummary {
    #[serde(rename = "totalVentas")]
    pub total_sales: f64,
    #[serde(rename = "totalComisiones")]
    pub total_commissions: f64,
    /// Configured percentage for rate-based schemes, `None` for tier-based ones.
    #[serde(rename = "porcentaje")]
    pub rate: Option<f64>,
    #[serde(rename = "resultados")]
    pub results: Vec<CommissionResult>,
}

/// A fused week after sparse weeks have been folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyCommissionResult {
    #[serde(rename = "vendedor")]
    pub salesperson: String,
    #[serde(rename = "semana")]
    pub week: u32,
    #[serde(rename = "año")]
    pub year: i32,
    #[serde(rename = "totalVentas")]
    pub total_sales: f64,
    #[serde(rename = "comision")]
    pub bonus: f64,
    #[serde(rename = "periodo")]
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VendorSummary {
    #[serde(rename = "vendedor")]
    pub salesperson: String,
    #[serde(rename = "totalVentas")]
    pub total_sales: f64,
    #[serde(rename = "totalBonificaciones")]
    pub total_bonuses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyCommissionReport {
    pub summary: CommissionSummary,
    pub weekly_results: Vec<WeeklyCommissionResult>,
}

/// Rates, thresholds and tier tables for every commission scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommissionConfig {
    #[schemars(description = "Default CEV commission percentage (5.0 = 5%).")]
    #[serde(default = "default_cev_rate")]
    pub cev_rate: f64,

    #[schemars(
        description = "A day earns CEV commission only when its total is strictly greater than this amount."
    )]
    #[serde(default = "default_cev_daily_threshold")]
    pub cev_daily_threshold: f64,

    #[schemars(description = "Default Volkswagen commission percentage.")]
    #[serde(default = "default_vw_rate")]
    pub vw_rate: f64,

    #[schemars(
        description = "Weeks with fewer distinct sale days than this are folded into another week of the same salesperson."
    )]
    #[serde(default = "default_min_active_days")]
    pub min_active_days: usize,

    #[schemars(description = "Ascending, non-overlapping weekly bonus bands.")]
    #[serde(default = "default_weekly_tiers")]
    pub weekly_tiers: Vec<BonusTier>,

    #[serde(default)]
    pub manager_rule: ManagerBonusRule,
}

fn default_cev_rate() -> f64 {
    5.0
}

fn default_cev_daily_threshold() -> f64 {
    4000.0
}

fn default_vw_rate() -> f64 {
    2.0
}

fn default_min_active_days() -> usize {
    3
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            cev_rate: default_cev_rate(),
            cev_daily_threshold: default_cev_daily_threshold(),
            vw_rate: default_vw_rate(),
            min_active_days: default_min_active_days(),
            weekly_tiers: default_weekly_tiers(),
            manager_rule: ManagerBonusRule::default(),
        }
    }
}

impl CommissionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("cev_rate", self.cev_rate),
            ("vw_rate", self.vw_rate),
        ] {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(SalesError::InvalidConfig(format!(
                    "{} must be between 0 and 100, got {}",
                    name, rate
                )));
            }
        }

        if !self.cev_daily_threshold.is_finite() || self.cev_daily_threshold < 0.0 {
            return Err(SalesError::InvalidConfig(format!(
                "cev_daily_threshold must be a non-negative amount, got {}",
                self.cev_daily_threshold
            )));
        }

        if self.min_active_days == 0 || self.min_active_days > 7 {
            return Err(SalesError::InvalidConfig(format!(
                "min_active_days must be between 1 and 7, got {}",
                self.min_active_days
            )));
        }

        validate_tier_table(&self.weekly_tiers)?;
        self.manager_rule.validate()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CommissionConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
