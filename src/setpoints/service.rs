use std::sync::Arc;

use tracing::info;

use crate::db::models::{NewSetpoint, Setpoint};
use crate::db::Store;
use crate::error::ServiceError;

/// Upper bound on rows returned by [`SetpointService::history`].
const HISTORY_LIMIT: i64 = 100;

/// One entry of a setpoint submission batch.
#[derive(Debug, Clone)]
pub struct SetpointCommand {
    pub sensor_id: i64,
    pub name: String,
    pub value: f64,
}

/// Append-only command log. There is no stored "current setpoint"; callers
/// wanting the current value take the head of [`SetpointService::history`].
#[derive(Clone)]
pub struct SetpointService {
    store: Arc<dyn Store>,
}

impl SetpointService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends one row per command, all in a single store transaction. An
    /// empty batch is a valid no-op and never touches the store. Returns
    /// the number of rows written.
    pub async fn submit(
        &self,
        mcu_id: i64,
        user_id: i64,
        commands: Vec<SetpointCommand>,
    ) -> Result<u64, ServiceError> {
        if commands.is_empty() {
            return Ok(0);
        }

        let rows = commands
            .into_iter()
            .map(|c| NewSetpoint {
                mcu_id,
                sensor_id: c.sensor_id,
                user_id,
                name: c.name,
                value: c.value,
            })
            .collect();

        let written = self.store.append_setpoints(rows).await?;
        info!(mcu_id, user_id, rows = written, "setpoints recorded");
        Ok(written)
    }

    /// Newest-first command history for the device, capped at 100 rows.
    pub async fn history(&self, mcu_id: i64) -> Result<Vec<Setpoint>, ServiceError> {
        Ok(self.store.setpoint_history(mcu_id, HISTORY_LIMIT).await?)
    }
}
