mod helpers;

use logstore::logs::query::{
    format_entry, list_services, query_logs, search_logs, trace_request, LogFilter, QueryLimits,
    SearchFilter,
};
use logstore::logs::types::{now_secs, LogRecord};

#[test]
fn trace_is_ordered_with_deltas() {
    let mut conn = helpers::test_db();
    let t = now_secs() - 100.0;

    // Inserted out of order and across services
    for (offset, service, message) in [
        (5.0, "db", "query done"),
        (0.0, "gateway", "request in"),
        (2.0, "api", "handler start"),
    ] {
        helpers::log_raw(&mut conn, LogRecord::new("info", service, message).at(t + offset).trace("req-1"));
    }
    helpers::log_raw(&mut conn, LogRecord::new("info", "api", "other request").at(t + 1.0).trace("req-2"));

    let steps = trace_request(&conn, "req-1").unwrap();
    let services: Vec<&str> = steps.iter().map(|s| s.entry.service.as_str()).collect();
    assert_eq!(services, vec!["gateway", "api", "db"]);

    let deltas: Vec<f64> = steps.iter().map(|s| (s.delta * 1000.0).round() / 1000.0).collect();
    assert_eq!(deltas, vec![0.0, 2.0, 3.0]);

    assert!(trace_request(&conn, "missing").unwrap().is_empty());
}

#[test]
fn query_combines_filters_newest_first() {
    let mut conn = helpers::test_db();
    let now = now_secs();
    helpers::log_raw(&mut conn, LogRecord::new("error", "api", "a").at(now - 30.0).component("db"));
    helpers::log_raw(&mut conn, LogRecord::new("error", "api", "b").at(now - 20.0).component("db"));
    helpers::log_raw(&mut conn, LogRecord::new("error", "api", "c").at(now - 10.0).component("http"));
    helpers::log_raw(&mut conn, LogRecord::new("info", "api", "d").at(now - 5.0).component("db"));
    helpers::log_raw(&mut conn, LogRecord::new("error", "web", "e").at(now - 1.0).component("db"));

    let filter = LogFilter {
        level: Some("error".into()),
        service: Some("api".into()),
        component: Some("db".into()),
        ..Default::default()
    };
    let found = query_logs(&conn, &filter, QueryLimits::default()).unwrap();
    let messages: Vec<&str> = found.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["b", "a"]);

    let limited = LogFilter {
        limit: Some(2),
        ..Default::default()
    };
    let found = query_logs(&conn, &limited, QueryLimits::default()).unwrap();
    let messages: Vec<&str> = found.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["e", "d"]);
}

#[test]
fn time_window_overrides_explicit_range() {
    let mut conn = helpers::test_db();
    let now = now_secs();
    helpers::log_raw(&mut conn, LogRecord::new("info", "api", "recent").at(now - 10.0));
    helpers::log_raw(&mut conn, LogRecord::new("info", "api", "older").at(now - 1000.0));

    let filter = LogFilter {
        time_window: Some(60),
        start_time: Some(now - 2000.0),
        end_time: Some(now - 500.0),
        ..Default::default()
    };
    let found = query_logs(&conn, &filter, QueryLimits::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "recent");

    let range_only = LogFilter {
        start_time: Some(now - 2000.0),
        end_time: Some(now - 500.0),
        ..Default::default()
    };
    let found = query_logs(&conn, &range_only, QueryLimits::default()).unwrap();
    assert_eq!(found[0].message, "older");
}

#[test]
fn invalid_level_filter_is_rejected() {
    let conn = helpers::test_db();
    let filter = LogFilter {
        level: Some("noisy".into()),
        ..Default::default()
    };
    let err = query_logs(&conn, &filter, QueryLimits::default()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn search_tolerates_fts_syntax_and_narrows() {
    let mut conn = helpers::test_db();
    helpers::log_at(&mut conn, "error", "api", "connection refused by upstream", 1.0);
    helpers::log_at(&mut conn, "info", "worker", "connection pool resized", 1.0);

    let all = search_logs(&conn, "connection", &SearchFilter::default(), QueryLimits::default()).unwrap();
    assert_eq!(all.len(), 2);

    let narrowed = SearchFilter {
        level: Some("error".into()),
        ..Default::default()
    };
    let found = search_logs(&conn, "connection", &narrowed, QueryLimits::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].service, "api");

    for hostile in ["AND OR NOT", "\"unbalanced", "col:value", "(* ^ -)", "NEAR(a b)"] {
        search_logs(&conn, hostile, &SearchFilter::default(), QueryLimits::default())
            .unwrap_or_else(|e| panic!("query {hostile:?} failed: {e}"));
    }

    assert!(search_logs(&conn, "   ", &SearchFilter::default(), QueryLimits::default())
        .unwrap()
        .is_empty());
}

#[test]
fn services_are_distinct_and_sorted() {
    let mut conn = helpers::test_db();
    for service in ["worker", "api", "worker", "billing"] {
        helpers::log_at(&mut conn, "info", service, "hello", 1.0);
    }
    assert_eq!(list_services(&conn).unwrap(), vec!["api", "billing", "worker"]);
}

#[test]
fn formatted_entry_omits_missing_component() {
    let mut conn = helpers::test_db();
    helpers::log_raw(&mut conn, LogRecord::new("fatal", "api", "out of memory").at(0.5));

    let entry = &query_logs(&conn, &LogFilter::default(), QueryLimits::default()).unwrap()[0];
    assert_eq!(format_entry(entry), "1970-01-01T00:00:00.500Z [FATAL] api - out of memory");
}
