//! PostgreSQL ledger adapter.

use async_trait::async_trait;
use sqlx::PgPool;

use voucher_types::{
    ChargeFn, RedemptionOutcome, RepoError, Voucher, VoucherLedger, VoucherRecord,
};

use crate::types::{DbPaidFlag, DbVoucherPg};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL ledger with row-level locking.
///
/// `redeem` runs in one transaction that holds the voucher row lock
/// (`SELECT ... FOR UPDATE`) across the gateway call, so concurrent
/// redeemers queue behind the first and then observe its committed result.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_vouchers_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL ledger with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

#[async_trait]
impl VoucherLedger for PostgresRepo {
    async fn issue_voucher(&self, voucher: &Voucher) -> Result<VoucherRecord, RepoError> {
        let row: DbVoucherPg = sqlx::query_as(
            r#"INSERT INTO vouchers (voucher, paid, created_at) VALUES ($1, FALSE, NOW())
               ON CONFLICT (voucher) DO UPDATE SET voucher = EXCLUDED.voucher
               RETURNING voucher, paid, charge_id, created_at, paid_at"#,
        )
        .bind(voucher.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.into_domain()
    }

    async fn get_voucher(&self, voucher: &Voucher) -> Result<Option<VoucherRecord>, RepoError> {
        let row: Option<DbVoucherPg> = sqlx::query_as(
            r#"SELECT voucher, paid, charge_id, created_at, paid_at FROM vouchers WHERE voucher = $1"#,
        )
        .bind(voucher.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbVoucherPg::into_domain).transpose()
    }

    async fn redeem(
        &self,
        voucher: &Voucher,
        charge: ChargeFn<'_>,
    ) -> Result<RedemptionOutcome, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO vouchers (voucher, paid, created_at) VALUES ($1, FALSE, NOW())
               ON CONFLICT (voucher) DO NOTHING"#,
        )
        .bind(voucher.as_str())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let row: DbPaidFlag =
            sqlx::query_as(r#"SELECT paid FROM vouchers WHERE voucher = $1 FOR UPDATE"#)
                .bind(voucher.as_str())
                .fetch_one(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        if row.paid {
            // Dropping the transaction rolls it back and releases the lock.
            return Ok(RedemptionOutcome::AlreadyPaid);
        }

        let created = match charge().await {
            Ok(created) => created,
            Err(err) => {
                db_tx
                    .commit()
                    .await
                    .map_err(|e| RepoError::Transaction(e.to_string()))?;
                return Ok(RedemptionOutcome::GatewayFailure(err));
            }
        };

        let recorded = async {
            sqlx::query(
                r#"UPDATE vouchers SET paid = TRUE, charge_id = $1, paid_at = NOW() WHERE voucher = $2"#,
            )
            .bind(&created.id)
            .bind(voucher.as_str())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

            db_tx
                .commit()
                .await
                .map_err(|e| RepoError::Transaction(e.to_string()))
        }
        .await;

        if let Err(e) = recorded {
            tracing::error!(%voucher, charge_id = %created.id, error = %e, "Charged but failed to record payment");
            return Err(e);
        }

        Ok(RedemptionOutcome::Paid {
            transaction_id: created.id,
        })
    }
}
