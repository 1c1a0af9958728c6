use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Current calendar date on the exchange's clock (KST, UTC+9).
///
/// No weekend or holiday rollback: on a non-trading date the portal simply
/// returns an empty table and the endpoints return short or empty lists.
pub fn today_kst(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let kst = chrono::FixedOffset::east_opt(KST_OFFSET_SECS).context("invalid KST offset")?;
    Ok(now_utc.with_timezone(&kst).date_naive())
}
