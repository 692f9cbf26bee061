//! Corridas completas del motor sobre Postgres (requiere DATABASE_URL).
mod test_support;

use scd_core::{Reconciler, RunStatus, TableConfig, TableRegistry, TableStore};
use scd_persistence::{PgAuditSink, PgTableStore};
use test_support::{customers, provider, unique_table};

#[test]
fn snapshot_history_and_audit_roundtrip() {
    let Some(provider) = provider() else { return };
    let target = unique_table("dim_customer");
    let registry = TableRegistry::new("crm").with_table("customer", TableConfig::new(["id"]).with_target(target.clone()));
    let engine = Reconciler::new(PgTableStore::new(provider.clone()), PgAuditSink::new(provider), registry);

    let day1 = customers("CUSTOMER_20240101.csv", 1, &[("1", Some("Ada")), ("2", Some("Bob"))]);
    let day2 = customers("CUSTOMER_20240102.csv", 2, &[("1", Some("Ada L."))]);

    let r1 = engine.run(&[day1]);
    assert_eq!(r1.succeeded(), 1);
    let r2 = engine.run(&[day2.clone()]);
    assert_eq!(r2.succeeded(), 1);
    assert_eq!(r2.outcomes[0].target_rows, 3);

    let view = engine.store().read_current_and_tombstoned(&target).expect("read");
    let current: Vec<_> = view.iter().filter(|r| r.is_current()).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].get("name"), Some("Ada L."));
    assert!(view.iter().any(|r| r.get("id") == Some("2") && r.is_tombstone()));

    let r3 = engine.run(&[day2]);
    assert_eq!(r3.outcomes[0].status, RunStatus::Success);
    assert_eq!(engine.store().count(&target).expect("count"), 3);

    let audited = engine.audit().list_for_run(r2.run_id).expect("audit");
    assert_eq!(audited.len(), 1);
    assert_eq!(audited[0].target_table, target);
    assert_eq!(audited[0].status, RunStatus::Success);

    engine.store().drop_table(&target).expect("drop");
}
