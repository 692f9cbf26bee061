//! Esquema Diesel de las tablas de esquema fijo. Las tablas destino SCD2 se
//! crean en tiempo de ejecución y se consultan con SQL dinámico (ver `sql`).

diesel::table! {
    scd_run_outcomes (id) {
        id -> BigInt,
        run_id -> Uuid,
        table_id -> Text,
        staging_table -> Text,
        target_table -> Text,
        status -> Text,
        input_rows -> BigInt,
        deduplicated_rows -> BigInt,
        target_rows -> BigInt,
        input_size -> Text,
        message -> Text,
        recorded_at -> Timestamptz,
    }
}
