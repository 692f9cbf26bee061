//! Validación previa a cualquier escritura.
use crate::constants::is_system_column;
use crate::errors::ValidationError;
use crate::model::Batch;

/// Verifica llave no vacía, presencia de las columnas llave y de la columna
/// de timestamp de carga, y que ninguna columna use un nombre reservado.
pub fn validate_batch(batch: &Batch, key_columns: &[String], load_ts_column: &str) -> Result<(), ValidationError> {
    if key_columns.is_empty() {
        return Err(ValidationError::EmptyPrimaryKey);
    }
    if let Some(missing) = key_columns.iter().find(|k| !batch.has_column(k)) {
        return Err(ValidationError::MissingKeyColumn(missing.clone()));
    }
    if !batch.has_column(load_ts_column) {
        return Err(ValidationError::MissingLoadTimestampColumn(load_ts_column.to_string()));
    }
    if let Some(reserved) = batch.columns.iter().find(|c| is_system_column(c)) {
        return Err(ValidationError::ReservedColumn(reserved.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(columns: &[&str]) -> Batch {
        Batch::from_rows("t_1.csv", columns.iter().map(|c| c.to_string()).collect(), vec![])
    }

    #[test]
    fn rejects_each_invalid_shape() {
        let keys = vec!["id".to_string()];
        assert_eq!(validate_batch(&batch(&["id", "ts"]), &[], "ts"), Err(ValidationError::EmptyPrimaryKey));
        assert_eq!(validate_batch(&batch(&["x", "ts"]), &keys, "ts"),
                   Err(ValidationError::MissingKeyColumn("id".into())));
        assert_eq!(validate_batch(&batch(&["id"]), &keys, "ts"),
                   Err(ValidationError::MissingLoadTimestampColumn("ts".into())));
        assert_eq!(validate_batch(&batch(&["id", "ts", "is_active"]), &keys, "ts"),
                   Err(ValidationError::ReservedColumn("is_active".into())));
        assert_eq!(validate_batch(&batch(&["id", "ts"]), &keys, "ts"), Ok(()));
    }
}
