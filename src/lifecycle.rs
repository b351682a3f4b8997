//! End-of-life classification.
//!
//! An OS counts as active when it has been released and its EOL date, if
//! any, lies more than a grace period after the reference date. The
//! reference date is always passed in so results do not depend on the clock.

use chrono::{Days, NaiveDate};
use tracing::warn;

use crate::construct::Database;
use crate::datatype::{Record, Scalar};
use crate::path::RecordNode;

pub const DEFAULT_GRACE_DAYS: i64 = 180;

pub const RELEASE_DATE_FIELD: &str = "release_date";
pub const EOL_DATE_FIELD: &str = "eol_date";

fn known(record: &Record, field: &str) -> Option<Scalar> {
    record.scalar(field).filter(|s| !s.is_null()).cloned()
}

pub fn is_active(os: &Record, as_of: NaiveDate, grace_days: i64) -> bool {
    if known(os, RELEASE_DATE_FIELD).is_none() {
        return false;
    }
    let Some(eol) = known(os, EOL_DATE_FIELD) else {
        return true;
    };
    let Some(eol) = eol.as_date() else {
        warn!(eol_date = %eol, "unreadable EOL date, treating OS as inactive");
        return false;
    };
    let cutoff = if grace_days >= 0 {
        as_of.checked_add_days(Days::new(grace_days.unsigned_abs()))
    } else {
        as_of.checked_sub_days(Days::new(grace_days.unsigned_abs()))
    };
    match cutoff {
        Some(cutoff) => eol > cutoff,
        // past the end of the calendar nothing can be later
        None => false,
    }
}

pub fn is_active_default(os: &Record, as_of: NaiveDate) -> bool {
    is_active(os, as_of, DEFAULT_GRACE_DAYS)
}

/// Active OS records in database order.
pub fn active_oses(database: &Database, as_of: NaiveDate, grace_days: i64) -> Vec<RecordNode<'_>> {
    database
        .records()
        .filter(|node| is_active(node.record(), as_of, grace_days))
        .collect()
}
