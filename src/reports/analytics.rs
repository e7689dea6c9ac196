use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;

/// Chart bucket width. Anything unrecognised falls back to `Week`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
}

impl Period {
    pub fn from_param(raw: Option<&str>) -> Period {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("day") => Period::Day,
            Some("month") => Period::Month,
            _ => Period::Week,
        }
    }

    /// The `date_trunc` field name.
    pub fn unit(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    pub fn label(&self, bucket: NaiveDate) -> String {
        match self {
            Period::Day | Period::Week => bucket.format("%Y-%m-%d").to_string(),
            Period::Month => bucket.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Parallel label/count sequences for charting, oldest bucket first.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub period: Period,
    pub labels: Vec<String>,
    pub counts: Vec<i64>,
    pub total: i64,
}

impl ChartSeries {
    pub fn from_buckets(period: Period, mut buckets: Vec<(NaiveDate, i64)>) -> ChartSeries {
        buckets.sort_by_key(|(bucket, _)| *bucket);
        let total = buckets.iter().map(|(_, count)| count).sum();
        let (labels, counts) = buckets
            .into_iter()
            .map(|(bucket, count)| (period.label(bucket), count))
            .unzip();
        ChartSeries {
            period,
            labels,
            counts,
            total,
        }
    }
}

/// Counts one intern's tasks per truncated-date bucket.
pub async fn task_series(
    pool: &PgPool,
    intern_id: i32,
    period: Period,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<ChartSeries, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT date_trunc(");
    builder
        .push_bind(period.unit())
        .push(", t.date::timestamp) AS bucket, COUNT(*) AS total FROM tasks t WHERE t.intern_id = ")
        .push_bind(intern_id);
    if let Some(start) = start_date {
        builder.push(" AND t.date >= ").push_bind(start);
    }
    if let Some(end) = end_date {
        builder.push(" AND t.date <= ").push_bind(end);
    }
    builder.push(" GROUP BY bucket ORDER BY bucket");

    let rows: Vec<(NaiveDateTime, i64)> = builder.build_query_as().fetch_all(pool).await?;
    let buckets = rows
        .into_iter()
        .map(|(bucket, count)| (bucket.date(), count))
        .collect();

    Ok(ChartSeries::from_buckets(period, buckets))
}
