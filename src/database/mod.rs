use crate::error::StoreError;
use crate::query::queries;
use crate::schema::Schema;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;

/// Advisory lock key taken while provisioning ("auctions" in ASCII).
const PROVISION_LOCK_KEY: i64 = 0x6175_6374_696f_6e73;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// Opens a connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(
            "{:<12} --> connected, max_connections={}",
            "Database", max_connections
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Runs `f` in a transaction, committing on `Ok` and rolling back on `Err`.
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// Creates the tables and indexes of `schema` if missing. Runs under a
    /// transaction-scoped advisory lock so concurrent provisioners queue up
    /// instead of racing on the system catalog.
    pub async fn initialize_database(&self, schema: &Schema) -> Result<(), StoreError> {
        let mut statements = split_statements(include_str!("../sql/01-create-schema.sql"));
        statements.extend(schema.postgres_index_ddl());
        let count = statements.len();

        self.transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::PROVISION_LOCK)
                    .bind(PROVISION_LOCK_KEY)
                    .execute(&mut **tx)
                    .await?;
                for statement in &statements {
                    sqlx::query(statement).execute(&mut **tx).await?;
                }
                Ok::<_, StoreError>(())
            })
        })
        .await?;

        info!("{:<12} --> {} statements applied", "Provision", count);
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_file_creates_all_collections_idempotently() {
        let statements = split_statements(include_str!("../sql/01-create-schema.sql"));
        assert_eq!(statements.len(), 3);
        for table in ["users", "auctions", "bids"] {
            assert!(statements
                .iter()
                .any(|s| s.contains(&format!("CREATE TABLE IF NOT EXISTS {table} ("))));
        }
    }
}
