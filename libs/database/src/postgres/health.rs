use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};

const HEALTH_QUERY: &str = "SELECT 1";

/// Check PostgreSQL database health with `SELECT 1`.
///
/// Used by the readiness probe.
pub async fn check_health(db: &DatabaseConnection) -> DatabaseResult<()> {
    let query = HEALTH_QUERY;
    debug!(query, "Running PostgreSQL health check");

    let stmt = Statement::from_string(DatabaseBackend::Postgres, query.to_owned());
    db.query_one_raw(stmt).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!(
            "PostgreSQL health check failed with query '{}': {}",
            query, e
        ))
    })?;

    debug!("PostgreSQL health check passed");
    Ok(())
}
