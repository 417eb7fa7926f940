//! In-memory `ExecutionLog` for engine unit tests.
//!
//! Mirrors the transactional semantics of the SQLite implementation closely
//! enough for the interceptor and recovery tests: upsert-with-attempts on
//! start, completion only for existing rows, one-shot parameter capture for
//! waiting rows.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use duraflow_types::{Invocation, InvocationStatus, StoreError};
use uuid::Uuid;

use crate::repository::{ExecutionLog, StartInvocation};

#[derive(Default)]
pub(crate) struct MemoryExecutionLog {
    rows: Mutex<HashMap<(Uuid, u32), Invocation>>,
}

impl MemoryExecutionLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl ExecutionLog for MemoryExecutionLog {
    async fn log_start(&self, start: StartInvocation<'_>) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&(start.flow_id, start.step)) {
            Some(row) => {
                row.attempts += 1;
                row.status = start.status;
            }
            None => {
                rows.insert(
                    (start.flow_id, start.step),
                    Invocation {
                        flow_id: start.flow_id,
                        step: start.step,
                        timestamp: Utc::now(),
                        class_name: start.class_name.to_string(),
                        method_name: start.method_name.to_string(),
                        delay_millis: start.delay_millis,
                        status: start.status,
                        attempts: 1,
                        parameters: start.parameters.map(|p| p.to_vec()),
                        return_value: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn log_completion(
        &self,
        flow_id: Uuid,
        step: u32,
        return_value: &[u8],
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&(flow_id, step))
            .ok_or(StoreError::NotFound)?;
        row.status = InvocationStatus::Complete;
        row.return_value = Some(return_value.to_vec());
        Ok(())
    }

    async fn log_resume_parameters(
        &self,
        flow_id: Uuid,
        step: u32,
        parameters: &[u8],
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&(flow_id, step))
            .ok_or(StoreError::NotFound)?;
        if row.parameters.is_none() {
            row.parameters = Some(parameters.to_vec());
        }
        Ok(())
    }

    async fn get_invocation(
        &self,
        flow_id: Uuid,
        step: u32,
    ) -> Result<Option<Invocation>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&(flow_id, step)).cloned())
    }

    async fn get_latest_invocation(
        &self,
        flow_id: Uuid,
    ) -> Result<Option<Invocation>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.flow_id == flow_id)
            .max_by_key(|row| row.step)
            .cloned())
    }

    async fn get_incomplete_flows(&self) -> Result<Vec<Invocation>, StoreError> {
        let mut flows: Vec<Invocation> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.is_flow() && row.status != InvocationStatus::Complete)
            .cloned()
            .collect();
        flows.sort_by_key(|row| row.timestamp);
        Ok(flows)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}
