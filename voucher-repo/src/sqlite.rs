//! SQLite ledger adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use tokio::sync::Mutex;

use voucher_types::{
    ChargeFn, RedemptionOutcome, RepoError, Voucher, VoucherLedger, VoucherRecord,
};

use crate::types::{DbPaidFlag, DbVoucherSqlite};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite ledger implementation.
///
/// Redemptions of one voucher are serialized by an in-process lock held
/// across the gateway call; the final write is a conditional update, so a
/// voucher can only ever be recorded paid once even if another process
/// shares the database file.
pub struct SqliteRepo {
    pool: SqlitePool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SqliteRepo {
    /// Creates a new SQLite ledger with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let repo = Self {
            pool,
            locks: DashMap::new(),
        };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_vouchers.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    fn voucher_lock(&self, voucher: &Voucher) -> Arc<Mutex<()>> {
        self.locks
            .entry(voucher.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the lock entry once nobody else is waiting on it.
    fn release_lock(&self, voucher: &Voucher) {
        self.locks
            .remove_if(voucher.as_str(), |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.len()
    }

    async fn paid_flag(&self, voucher: &Voucher) -> Result<bool, RepoError> {
        let row: Option<DbPaidFlag> =
            sqlx::query_as(r#"SELECT paid FROM vouchers WHERE voucher = ?"#)
                .bind(voucher.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.is_some_and(|r| r.paid))
    }

    /// Body of `redeem`, run while holding the voucher lock.
    async fn redeem_locked(
        &self,
        voucher: &Voucher,
        charge: ChargeFn<'_>,
    ) -> Result<RedemptionOutcome, RepoError> {
        self.issue_voucher(voucher).await?;

        if self.paid_flag(voucher).await? {
            return Ok(RedemptionOutcome::AlreadyPaid);
        }

        let created = match charge().await {
            Ok(created) => created,
            Err(err) => return Ok(RedemptionOutcome::GatewayFailure(err)),
        };

        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"UPDATE vouchers SET paid = 1, charge_id = ?, paid_at = ? WHERE voucher = ? AND paid = 0"#,
        )
        .bind(&created.id)
        .bind(&now)
        .bind(voucher.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(%voucher, charge_id = %created.id, error = %e, "Charged but failed to record payment");
            RepoError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            // Another process sharing the file recorded it between our read and write.
            tracing::error!(%voucher, charge_id = %created.id, "Voucher was paid concurrently; charge left unrecorded");
            return Ok(RedemptionOutcome::AlreadyPaid);
        }

        Ok(RedemptionOutcome::Paid {
            transaction_id: created.id,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl VoucherLedger for SqliteRepo {
    async fn issue_voucher(&self, voucher: &Voucher) -> Result<VoucherRecord, RepoError> {
        let record = VoucherRecord::unpaid(voucher.clone());

        sqlx::query(
            r#"INSERT INTO vouchers (voucher, paid, created_at) VALUES (?, 0, ?) ON CONFLICT (voucher) DO NOTHING"#,
        )
        .bind(voucher.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        self.get_voucher(voucher).await?.ok_or(RepoError::NotFound)
    }

    async fn get_voucher(&self, voucher: &Voucher) -> Result<Option<VoucherRecord>, RepoError> {
        let row: Option<DbVoucherSqlite> = sqlx::query_as(
            r#"SELECT voucher, paid, charge_id, created_at, paid_at FROM vouchers WHERE voucher = ?"#,
        )
        .bind(voucher.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbVoucherSqlite::into_domain).transpose()
    }

    async fn redeem(
        &self,
        voucher: &Voucher,
        charge: ChargeFn<'_>,
    ) -> Result<RedemptionOutcome, RepoError> {
        // Declared first so it drops last, after the guard and our handle.
        let _release = ReleaseOnDrop {
            repo: self,
            voucher,
        };
        let lock = self.voucher_lock(voucher);
        let _guard = lock.lock().await;
        self.redeem_locked(voucher, charge).await
    }
}

/// Removes a voucher's lock entry when `redeem` finishes or is cancelled.
struct ReleaseOnDrop<'a> {
    repo: &'a SqliteRepo,
    voucher: &'a Voucher,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.repo.release_lock(self.voucher);
    }
}
