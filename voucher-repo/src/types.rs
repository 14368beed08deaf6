//! Database row types for SQLite and PostgreSQL.

use sqlx::FromRow;

use voucher_types::{RepoError, Voucher, VoucherRecord};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
use chrono::{DateTime, Utc};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Voucher row from SQLite. Timestamps are stored as RFC 3339 text.
#[cfg(feature = "sqlite")]
#[derive(FromRow)]
pub struct DbVoucherSqlite {
    pub voucher: String,
    pub paid: bool,
    pub charge_id: Option<String>,
    pub created_at: String,
    pub paid_at: Option<String>,
}

#[cfg(feature = "sqlite")]
impl DbVoucherSqlite {
    pub fn into_domain(self) -> Result<VoucherRecord, RepoError> {
        let created_at = parse_timestamp(&self.created_at)?;
        let paid_at = self.paid_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(VoucherRecord {
            voucher: Voucher::new(self.voucher)?,
            paid: self.paid,
            charge_id: self.charge_id,
            created_at,
            paid_at,
        })
    }
}

#[cfg(feature = "sqlite")]
fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

/// Voucher row from PostgreSQL.
#[cfg(feature = "postgres")]
#[derive(FromRow)]
pub struct DbVoucherPg {
    pub voucher: String,
    pub paid: bool,
    pub charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[cfg(feature = "postgres")]
impl DbVoucherPg {
    pub fn into_domain(self) -> Result<VoucherRecord, RepoError> {
        Ok(VoucherRecord {
            voucher: Voucher::new(self.voucher)?,
            paid: self.paid,
            charge_id: self.charge_id,
            created_at: self.created_at,
            paid_at: self.paid_at,
        })
    }
}

/// Paid-flag-only row for the redeem critical section.
#[derive(FromRow)]
pub struct DbPaidFlag {
    pub paid: bool,
}
