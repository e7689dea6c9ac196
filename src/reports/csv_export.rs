//! Streaming CSV export of the HR task report.
//!
//! A producer task walks the database cursor and pushes one encoded line per row into a
//! bounded channel; the receiving end is the HTTP response body. Memory use is bounded by
//! the channel capacity, not by the number of matching tasks.

use actix_web::web::Bytes;
use chrono::NaiveDate;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use sqlx::PgPool;

use super::filters::TaskFilter;
use crate::error::AppError;
use crate::models::TaskReportRow;

pub const CSV_HEADER: [&str; 8] = [
    "Intern",
    "Email",
    "Department",
    "Staff",
    "Date",
    "Status",
    "Task",
    "Remarks",
];

const CHANNEL_CAPACITY: usize = 64;

/// `intern_tasks_<date>.csv`
pub fn export_filename(today: NaiveDate) -> String {
    format!("intern_tasks_{}.csv", today.format("%Y-%m-%d"))
}

/// Encodes one CSV record. Fields are quoted only when they contain a delimiter,
/// quote or newline; embedded quotes are doubled.
pub fn encode_record<I, T>(fields: I) -> Result<Bytes, AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(256));
    writer.write_record(fields)?;
    let buffer = writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(format!("CSV flush failed: {}", e)))?;
    Ok(Bytes::from(buffer))
}

pub fn encode_header() -> Result<Bytes, AppError> {
    encode_record(CSV_HEADER)
}

pub fn encode_row(row: &TaskReportRow) -> Result<Bytes, AppError> {
    let date = row.date.format("%Y-%m-%d").to_string();
    encode_record([
        row.intern_name.as_str(),
        row.intern_email.as_str(),
        row.intern_department.as_str(),
        row.staff_name.as_deref().unwrap_or(""),
        date.as_str(),
        row.status.as_str(),
        row.task_description.as_str(),
        row.remarks.as_str(),
    ])
}

/// Starts the export and returns the body stream: the header line first, then one line per
/// task matching `filter`. A database error ends the stream with that error.
pub fn stream_report(pool: PgPool, filter: TaskFilter) -> mpsc::Receiver<Result<Bytes, AppError>> {
    let (mut tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    actix_web::rt::spawn(async move {
        if tx.send(encode_header()).await.is_err() {
            return;
        }

        let mut builder = filter.report_query();
        let mut rows = builder.build_query_as::<TaskReportRow>().fetch(&pool);
        let mut written: u64 = 0;

        while let Some(row) = rows.next().await {
            let line = row.map_err(AppError::from).and_then(|row| encode_row(&row));
            let failed = line.is_err();
            if let Err(err) = &line {
                log::error!("CSV export aborted after {} rows: {}", written, err);
            }
            if tx.send(line).await.is_err() {
                log::info!("CSV export client went away after {} rows", written);
                return;
            }
            if failed {
                return;
            }
            written += 1;
        }

        log::info!("CSV export finished with {} rows", written);
    });

    rx
}
