//! Month-bucketed aggregates behind the dashboard charts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sales amount per category for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesByMonth {
    pub month: String,
    #[serde(default)]
    pub sales: BTreeMap<String, f64>,
}

/// Item count per category for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsByMonth {
    pub month: String,
    #[serde(default)]
    pub items: BTreeMap<String, f64>,
}

/// One bar series: a category label and one value per month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<f64>,
}

/// Chart-ready data: x-axis months plus one series per category.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    pub months: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Lay out month buckets as per-category series.
///
/// Categories missing from a month's bucket count as zero. Months keep the
/// order the backend returned them in.
pub fn build_chart<'a, I>(categories: &[String], buckets: I) -> ChartData
where
    I: IntoIterator<Item = (&'a str, &'a BTreeMap<String, f64>)>,
{
    let buckets: Vec<_> = buckets.into_iter().collect();

    let months = buckets.iter().map(|(month, _)| month.to_string()).collect();
    let series = categories
        .iter()
        .map(|category| ChartSeries {
            label: category.clone(),
            data: buckets
                .iter()
                .map(|(_, values)| values.get(category).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    ChartData { months, series }
}

pub fn sales_chart(categories: &[String], sales: &[SalesByMonth]) -> ChartData {
    build_chart(categories, sales.iter().map(|m| (m.month.as_str(), &m.sales)))
}

pub fn items_chart(categories: &[String], items: &[ItemsByMonth]) -> ChartData {
    build_chart(categories, items.iter().map(|m| (m.month.as_str(), &m.items)))
}
