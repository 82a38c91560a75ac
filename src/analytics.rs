use crate::schema::{SalesFilters, SalesRecord};
use crate::utils::{is_in_month_of, is_in_week_of, is_same_day, today};
use chrono::NaiveDate;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

/// Record fields that can be used as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Day,
    Week,
    Month,
    Salesperson,
    Branch,
    Client,
    Brand,
    DocumentType,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Day,
        Dimension::Week,
        Dimension::Month,
        Dimension::Salesperson,
        Dimension::Branch,
        Dimension::Client,
        Dimension::Brand,
        Dimension::DocumentType,
    ];

    pub fn key<'a>(&self, record: &'a SalesRecord) -> Cow<'a, str> {
        match self {
            Dimension::Day => Cow::Borrowed(record.calendar().formatted_date.as_str()),
            Dimension::Week => Cow::Owned(record.week_number().to_string()),
            Dimension::Month => Cow::Borrowed(record.calendar().month.as_str()),
            Dimension::Salesperson => Cow::Borrowed(record.salesperson_name()),
            Dimension::Branch => Cow::Borrowed(record.branch_name()),
            Dimension::Client => Cow::Borrowed(record.client_name()),
            Dimension::Brand => Cow::Borrowed(record.vehicle_brand()),
            Dimension::DocumentType => Cow::Borrowed(record.document_type()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DimensionTotal {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TopEntity {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    pub total_today: f64,
    pub total_this_week: f64,
    pub total_this_month: f64,
    pub top_salesperson: TopEntity,
    pub top_branch: TopEntity,
    pub top_client: TopEntity,
    pub top_brand: TopEntity,
    pub totals_by_day: Vec<DimensionTotal>,
    pub totals_by_week: Vec<DimensionTotal>,
    pub totals_by_month: Vec<DimensionTotal>,
    pub totals_by_salesperson: Vec<DimensionTotal>,
    pub totals_by_branch: Vec<DimensionTotal>,
    pub totals_by_client: Vec<DimensionTotal>,
    pub totals_by_brand: Vec<DimensionTotal>,
    pub totals_by_document_type: Vec<DimensionTotal>,
}

/// Borrowing view of the records that satisfy every set filter.
pub fn filter_records<'a>(
    records: &'a [SalesRecord],
    filters: &SalesFilters,
) -> Vec<&'a SalesRecord> {
    records.iter().filter(|r| filters.matches(r)).collect()
}

/// Sums `total_usd` per distinct non-empty key, in first-seen key order.
pub fn totals_by_dimension<'a, I>(records: I, dimension: Dimension) -> Vec<DimensionTotal>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut totals: Vec<DimensionTotal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = dimension.key(record);
        if key.is_empty() {
            continue;
        }
        match index.get(key.as_ref()) {
            Some(&slot) => totals[slot].total += record.total_usd(),
            None => {
                index.insert(key.to_string(), totals.len());
                totals.push(DimensionTotal {
                    key: key.into_owned(),
                    total: record.total_usd(),
                });
            }
        }
    }

    totals
}

/// Highest total wins; on ties the earlier entry is kept.
pub fn top_entity(totals: &[DimensionTotal]) -> TopEntity {
    totals.iter().fold(TopEntity::default(), |best, entry| {
        if entry.total > best.total {
            TopEntity {
                name: entry.key.clone(),
                total: entry.total,
            }
        } else {
            best
        }
    })
}

pub fn calculate_analytics(records: &[SalesRecord], filters: &SalesFilters) -> SalesAnalytics {
    calculate_analytics_at(records, filters, today())
}

/// Same as [`calculate_analytics`] with an explicit "today" for the rolling totals.
pub fn calculate_analytics_at(
    records: &[SalesRecord],
    filters: &SalesFilters,
    reference: NaiveDate,
) -> SalesAnalytics {
    let view = filter_records(records, filters);
    debug!(
        "Computing analytics over {} of {} records",
        view.len(),
        records.len()
    );

    let sum_where = |predicate: &dyn Fn(NaiveDate) -> bool| -> f64 {
        view.iter()
            .filter(|r| predicate(r.date()))
            .map(|r| r.total_usd())
            .sum()
    };

    let total_today = sum_where(&|d: NaiveDate| is_same_day(d, reference));
    let total_this_week = sum_where(&|d: NaiveDate| is_in_week_of(d, reference));
    let total_this_month = sum_where(&|d: NaiveDate| is_in_month_of(d, reference));

    let group = |dimension| totals_by_dimension(view.iter().copied(), dimension);

    let totals_by_salesperson = group(Dimension::Salesperson);
    let totals_by_branch = group(Dimension::Branch);
    let totals_by_client = group(Dimension::Client);
    let totals_by_brand = group(Dimension::Brand);

    SalesAnalytics {
        total_today,
        total_this_week,
        total_this_month,
        top_salesperson: top_entity(&totals_by_salesperson),
        top_branch: top_entity(&totals_by_branch),
        top_client: top_entity(&totals_by_client),
        top_brand: top_entity(&totals_by_brand),
        totals_by_day: group(Dimension::Day),
        totals_by_week: group(Dimension::Week),
        totals_by_month: group(Dimension::Month),
        totals_by_salesperson,
        totals_by_branch,
        totals_by_client,
        totals_by_brand,
        totals_by_document_type: group(Dimension::DocumentType),
    }
}

/// Sorted distinct non-empty values of a dimension, e.g. for filter choices.
pub fn unique_values(records: &[SalesRecord], dimension: Dimension) -> Vec<String> {
    records
        .iter()
        .map(|r| dimension.key(r))
        .filter(|key| !key.is_empty())
        .map(Cow::into_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn available_weeks(records: &[SalesRecord]) -> Vec<u32> {
    records
        .iter()
        .map(SalesRecord::week_number)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
