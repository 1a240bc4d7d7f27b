mod helpers;

use logstore::db::check_database_health;
use logstore::logs::query::{search_logs, QueryLimits, SearchFilter};
use logstore::logs::retention::cleanup_old_logs;
use logstore::logs::types::{now_secs, LogRecord};
use rusqlite::Connection;

/// Entry ids reachable through the FTS index for `term`, sorted.
fn indexed_ids(conn: &Connection, term: &str) -> Vec<String> {
    let mut ids: Vec<String> = search_logs(conn, term, &SearchFilter::default(), QueryLimits::default())
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    ids.sort();
    ids
}

/// Entry ids whose message contains `term`, sorted.
fn stored_ids(conn: &Connection, term: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT id FROM log_entries WHERE message LIKE '%' || ?1 || '%' ORDER BY id")
        .unwrap();
    stmt.query_map([term], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn index_matches_entries_through_inserts_sweeps_and_cleanup() {
    let mut conn = helpers::test_db();
    let now = now_secs();

    for i in 0..10 {
        let age_days = i as f64;
        helpers::log_raw(
            &mut conn,
            LogRecord::new("info", "api", &format!("payment retry {i}")).at(now - age_days * 86_400.0 - 60.0),
        );
    }
    assert_eq!(indexed_ids(&conn, "payment"), stored_ids(&conn, "payment"));
    assert_eq!(indexed_ids(&conn, "payment").len(), 10);

    // Automatic sweep drops everything older than a day
    helpers::log_at(&mut conn, "info", "api", "payment accepted", 0.0);
    assert_eq!(indexed_ids(&conn, "payment"), stored_ids(&conn, "payment"));
    assert_eq!(indexed_ids(&conn, "payment").len(), 2);

    cleanup_old_logs(&mut conn, 1).unwrap();
    assert_eq!(indexed_ids(&conn, "payment"), stored_ids(&conn, "payment"));

    let report = check_database_health(&conn).unwrap();
    assert!(report.fts_in_sync);
    assert!(report.integrity_ok);
}

#[test]
fn data_payload_is_searchable_and_retracted_on_delete() {
    let mut conn = helpers::test_db();
    let record = LogRecord::new("error", "billing", "charge failed")
        .data(serde_json::json!({"gateway": "stripe", "code": "card_declined"}));
    let id = helpers::log_raw(&mut conn, record);

    let hits = search_logs(&conn, "card_declined", &SearchFilter::default(), QueryLimits::default()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id);

    conn.execute("DELETE FROM log_entries WHERE id = ?1", [&id]).unwrap();
    assert_eq!(helpers::fts_matches(&conn, "stripe"), 0);
    assert!(check_database_health(&conn).unwrap().fts_in_sync);
}

#[test]
fn vacuum_after_deletes_keeps_index_aligned() {
    let mut conn = helpers::test_db();
    let now = now_secs();

    let mut ids = Vec::new();
    for i in 0..6 {
        let record = LogRecord::new("info", "api", &format!("shipment {i} dispatched")).at(now - 60.0);
        ids.push(helpers::log_raw(&mut conn, record));
    }
    // Leave holes in the sequence so a renumbering VACUUM would shift rows
    for id in &ids[..3] {
        conn.execute("DELETE FROM log_entries WHERE id = ?1", [id]).unwrap();
    }

    conn.execute_batch("VACUUM").unwrap();

    assert!(check_database_health(&conn).unwrap().fts_in_sync);
    assert_eq!(indexed_ids(&conn, "dispatched"), stored_ids(&conn, "dispatched"));

    let hits = search_logs(&conn, "shipment 4", &SearchFilter::default(), QueryLimits::default()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ids[4]);
    assert_eq!(hits[0].message, "shipment 4 dispatched");
}
