//! `AuditSink` sobre la tabla `scd_run_outcomes`.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::{debug, error};
use uuid::Uuid;

use scd_core::{AuditSink, RunOutcome, RunStatus, StoreError};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::scd_run_outcomes;

#[derive(Insertable, Debug)]
#[diesel(table_name = scd_run_outcomes)]
pub struct NewOutcomeRow<'a> {
    pub run_id: Uuid,
    pub table_id: &'a str,
    pub staging_table: &'a str,
    pub target_table: &'a str,
    pub status: &'a str,
    pub input_rows: i64,
    pub deduplicated_rows: i64,
    pub target_rows: i64,
    pub input_size: &'a str,
    pub message: &'a str,
    pub recorded_at: DateTime<Utc>,
}

/// Fila leída de `scd_run_outcomes`.
#[derive(Queryable, Debug, Clone)]
pub struct OutcomeRow {
    pub id: i64,
    pub run_id: Uuid,
    pub table_id: String,
    pub staging_table: String,
    pub target_table: String,
    pub status: String,
    pub input_rows: i64,
    pub deduplicated_rows: i64,
    pub target_rows: i64,
    pub input_size: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

impl<'a> From<&'a RunOutcome> for NewOutcomeRow<'a> {
    fn from(o: &'a RunOutcome) -> Self {
        Self { run_id: o.run_id,
               table_id: &o.table_id,
               staging_table: &o.staging_table,
               target_table: &o.target_table,
               status: o.status.as_str(),
               input_rows: to_i64(o.input_rows),
               deduplicated_rows: to_i64(o.deduplicated_rows),
               target_rows: to_i64(o.target_rows),
               input_size: &o.input_size,
               message: &o.message,
               recorded_at: o.recorded_at }
    }
}

impl TryFrom<OutcomeRow> for RunOutcome {
    type Error = PersistenceError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "Success" => RunStatus::Success,
            "Failed" => RunStatus::Failed,
            other => return Err(PersistenceError::Schema(format!("unknown run status '{other}'"))),
        };
        Ok(RunOutcome { run_id: row.run_id,
                        table_id: row.table_id,
                        staging_table: row.staging_table,
                        target_table: row.target_table,
                        status,
                        input_rows: to_u64(row.input_rows),
                        deduplicated_rows: to_u64(row.deduplicated_rows),
                        target_rows: to_u64(row.target_rows),
                        input_size: row.input_size,
                        message: row.message,
                        recorded_at: row.recorded_at })
    }
}

pub struct PgAuditSink<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgAuditSink<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Outcomes de una corrida en orden de inserción.
    pub fn list_for_run(&self, run_id: Uuid) -> Result<Vec<RunOutcome>, StoreError> {
        let rows: Vec<OutcomeRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            scd_run_outcomes::table.filter(scd_run_outcomes::run_id.eq(run_id))
                                   .order(scd_run_outcomes::id.asc())
                                   .load(&mut conn)
                                   .map_err(PersistenceError::from)
        }).map_err(|e| {
              error!("list_for_run:load error run_id={run_id} err={e:?}");
              e
          })?;
        let outcomes = rows.into_iter()
                           .map(RunOutcome::try_from)
                           .collect::<Result<Vec<_>, _>>()?;
        debug!("list_for_run:done run_id={run_id} count={}", outcomes.len());
        Ok(outcomes)
    }
}

impl<P: ConnectionProvider> AuditSink for PgAuditSink<P> {
    /// Todos los outcomes de la corrida en un solo insert.
    fn record(&self, outcomes: &[RunOutcome]) -> Result<(), StoreError> {
        if outcomes.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewOutcomeRow<'_>> = outcomes.iter().map(NewOutcomeRow::from).collect();
        let inserted = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(scd_run_outcomes::table).values(&rows)
                                                        .execute(&mut conn)
                                                        .map_err(PersistenceError::from)
        })?;
        debug!("record:done outcomes={inserted}");
        Ok(())
    }
}
