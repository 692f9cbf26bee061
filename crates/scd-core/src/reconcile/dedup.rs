//! Deduplicación: una fila por llave, la de mayor timestamp de carga.
//!
//! Desempate determinista: con timestamps idénticos gana la fila con mayor
//! secuencia de llegada (la última en arribar).
use chrono::{DateTime, Utc};

use crate::errors::ValidationError;
use crate::model::{Batch, Record};
use crate::relational::top_one_per_key;

fn parse_load_ts(row: usize, record: &Record, load_ts_column: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = record.get(load_ts_column);
    raw.and_then(|v| DateTime::parse_from_rfc3339(v).ok())
       .map(|ts| ts.with_timezone(&Utc))
       .ok_or_else(|| ValidationError::InvalidLoadTimestamp { row,
                                                              value: raw.map(str::to_string) })
}

pub fn deduplicate(batch: &Batch, key_columns: &[String], load_ts_column: &str) -> Result<Vec<Record>, ValidationError> {
    let ranked = batch.rows
                      .iter()
                      .enumerate()
                      .map(|(i, r)| {
                          let ts = parse_load_ts(i, r, load_ts_column)?;
                          Ok((r.key_tuple(key_columns), (ts, r.seq), r))
                      })
                      .collect::<Result<Vec<_>, ValidationError>>()?;
    Ok(top_one_per_key(ranked).into_iter().cloned().collect())
}
