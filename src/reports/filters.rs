//! HR report filters.
//!
//! Query parameters arrive as raw strings (an HTML-style form submits blanks for unused
//! fields). They are parsed into a [`TaskFilter`] whose predicates are each optional and
//! combined with `AND`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use validator::ValidationErrors;

use crate::error::validation_error;
use crate::models::TaskStatus;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Report rows: every task joined to its intern and (optional) staff member.
pub const TASK_REPORT_SELECT: &str = "SELECT t.id, t.intern_id, i.name AS intern_name, \
     i.email AS intern_email, i.department AS intern_department, t.staff_id, \
     COALESCE(s.name, NULLIF(t.staff_name, '')) AS staff_name, t.task_description, t.date, \
     t.status, t.remarks, t.created_at \
     FROM tasks t \
     JOIN interns i ON i.id = t.intern_id \
     LEFT JOIN staff s ON s.id = t.staff_id";

pub const TASK_REPORT_ORDER: &str = " ORDER BY t.date DESC, t.created_at DESC, t.id DESC";

/// Raw HR filter parameters.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TaskFilterQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub staff_id: Option<String>,
    pub intern_name: Option<String>,
}

/// Parsed filters. `None` means the predicate is not applied.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TaskFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub staff_id: Option<i32>,
    pub intern_name: Option<String>,
}

impl TaskFilter {
    /// Parses every supplied field, collecting one message per invalid field.
    pub fn parse(query: &TaskFilterQuery) -> Result<TaskFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let start_date = parse_date(&query.start_date, "start_date", &mut errors);
        let end_date = parse_date(&query.end_date, "end_date", &mut errors);

        let status = match non_blank(&query.status) {
            Some(raw) => match raw.parse::<TaskStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add(
                        "status",
                        validation_error(
                            "invalid_choice",
                            "Select a valid choice. That choice is not one of the available choices.",
                        ),
                    );
                    None
                }
            },
            None => None,
        };

        let staff_id = match non_blank(&query.staff_id) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("staff_id", validation_error("invalid", "Enter a whole number."));
                    None
                }
            },
            None => None,
        };

        if errors.is_empty() {
            Ok(TaskFilter {
                start_date,
                end_date,
                status,
                staff_id,
                intern_name: non_blank(&query.intern_name).map(str::to_string),
            })
        } else {
            Err(errors)
        }
    }

    /// Appends ` WHERE ... AND ...` for the populated predicates.
    pub fn push_conditions<'a>(&self, builder: &mut QueryBuilder<'a, Postgres>) {
        let mut first = true;

        if let Some(start) = self.start_date {
            push_joiner(builder, &mut first);
            builder.push("t.date >= ").push_bind(start);
        }
        if let Some(end) = self.end_date {
            push_joiner(builder, &mut first);
            builder.push("t.date <= ").push_bind(end);
        }
        if let Some(status) = self.status {
            push_joiner(builder, &mut first);
            builder.push("t.status = ").push_bind(status);
        }
        if let Some(staff_id) = self.staff_id {
            push_joiner(builder, &mut first);
            builder.push("t.staff_id = ").push_bind(staff_id);
        }
        if let Some(name) = &self.intern_name {
            push_joiner(builder, &mut first);
            builder
                .push("i.name ILIKE ")
                .push_bind(contains_pattern(name));
        }
    }

    /// The full report query for these filters, in report order.
    pub fn report_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(TASK_REPORT_SELECT);
        self.push_conditions(&mut builder);
        builder.push(TASK_REPORT_ORDER);
        builder
    }
}

fn push_joiner(builder: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    builder.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(
    value: &Option<String>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let raw = non_blank(value)?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, validation_error("invalid_date", "Enter a valid date."));
            None
        }
    }
}

/// `%needle%` with LIKE metacharacters in the needle escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
