//! 采集器集成测试：使用假的执行通道和变量来源

mod common;

use common::{FakeExec, FakeVariables, MYSQL_SLOW_LOG, PERCONA_SLOW_LOG};
use slowlog_collector::FieldValue;
use slowlog_collector::aggregator::{
    MysqlVariables, RemoteExec, SlowLogAggregator, VariableSource,
};
use slowlog_collector::config::MysqlSettings;

const LOG_PATH: &str = "/var/lib/mysql/slow.log";

fn variables() -> FakeVariables {
    FakeVariables::new(&[
        ("slow_query_log_file", LOG_PATH),
        ("long_query_time", "10.000000"),
        ("slow_query_log", "ON"),
        ("max_connections", "151"),
    ])
}

fn exec_for(body: &str) -> FakeExec {
    FakeExec::new()
        .respond("ls -i ", "1311459 /var/lib/mysql/slow.log\n")
        .respond("wc -l ", "  40 /var/lib/mysql/slow.log\n")
        .respond("sed -n ", "use test;\n# Thread_id: 45  Schema: sbtest  Last_errno: 0\nuse mysql;\n")
        .respond("tail -n ", body)
}

#[test]
fn test_rejects_invalid_hostname() {
    let err = SlowLogAggregator::new("db1; rm -rf /", FakeExec::new(), variables())
        .err()
        .unwrap();
    assert!(err.is_invalid_input());

    assert!(SlowLogAggregator::new("-oProxyCommand=x", FakeExec::new(), variables()).is_err());
    assert!(SlowLogAggregator::new("db-01.example.com", FakeExec::new(), variables()).is_ok());
}

#[test]
fn test_variables_are_cached() {
    let vars = variables();
    let mut aggregator = SlowLogAggregator::new("db1", FakeExec::new(), vars.clone()).unwrap();

    assert_eq!(aggregator.log_file_path().unwrap(), LOG_PATH);
    assert_eq!(aggregator.long_query_time().unwrap(), Some(10.0));
    assert_eq!(
        aggregator.show_variable("max_connections").unwrap(),
        Some(FieldValue::Integer(151))
    );
    assert_eq!(aggregator.show_variable("no_such_variable").unwrap(), None);
    assert_eq!(vars.calls(), 1);
}

#[test]
fn test_invalid_variable_name_never_reaches_source() {
    let vars = variables();
    let mut aggregator = SlowLogAggregator::new("db1", FakeExec::new(), vars.clone()).unwrap();

    let err = aggregator.show_variable("x' OR '1'='1").unwrap_err();
    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("x' OR '1'='1"));
    assert_eq!(vars.calls(), 0);
}

#[test]
fn test_missing_log_file_variable() {
    let mut aggregator =
        SlowLogAggregator::new("db1", FakeExec::new(), FakeVariables::new(&[])).unwrap();
    let err = aggregator.log_file_path().unwrap_err();
    assert!(err.is_database_error());
}

#[test]
fn test_log_file_commands_are_quoted() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), variables()).unwrap();

    assert_eq!(aggregator.log_file_inode().unwrap(), Some(1_311_459));
    assert_eq!(aggregator.log_file_lines().unwrap(), Some(40));
    aggregator.log_body(25).unwrap();

    assert_eq!(
        exec.commands(),
        vec![
            "ls -i '/var/lib/mysql/slow.log'".to_string(),
            "wc -l '/var/lib/mysql/slow.log'".to_string(),
            "tail -n 25 '/var/lib/mysql/slow.log'".to_string(),
        ]
    );
}

#[test]
fn test_log_body_zero_lines() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), variables()).unwrap();
    assert!(aggregator.log_body(0).unwrap_err().is_invalid_input());
    assert!(exec.commands().is_empty());
}

#[test]
fn test_last_db() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), variables()).unwrap();

    assert_eq!(aggregator.last_db(0).unwrap(), None);
    assert!(exec.commands().is_empty());

    assert_eq!(aggregator.last_db(12).unwrap(), Some("mysql".to_string()));
    assert_eq!(
        exec.commands(),
        vec!["sed -n '1,12p' '/var/lib/mysql/slow.log' | grep -E '^use |Schema:'".to_string()]
    );
}

#[test]
fn test_last_db_from_schema_line() {
    let exec = FakeExec::new().respond(
        "sed -n ",
        "use test;\n# Thread_id: 45  Schema: sbtest  Last_errno: 0  Killed: 0\n",
    );
    let mut aggregator = SlowLogAggregator::new("db1", exec, variables()).unwrap();
    assert_eq!(aggregator.last_db(100).unwrap(), Some("sbtest".to_string()));
}

#[test]
fn test_fetch_slow_logs() {
    let exec = exec_for(PERCONA_SLOW_LOG);
    let mut aggregator = SlowLogAggregator::new("db1", exec, variables()).unwrap();

    let records = aggregator.fetch_slow_logs(1000).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].schema.as_ref().and_then(FieldValue::as_text),
        Some("sbtest")
    );
    assert_eq!(records[1].host.as_deref(), Some("192.168.10.11"));
}

#[test]
fn test_fetch_empty_log() {
    let exec = FakeExec::new().respond("tail -n ", "");
    let mut aggregator = SlowLogAggregator::new("db1", exec, variables()).unwrap();
    assert!(aggregator.fetch_slow_logs(10).unwrap().is_empty());
}

#[test]
fn test_snapshot() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let vars = variables();
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), vars.clone()).unwrap();

    let snapshot = aggregator.snapshot(30).unwrap();
    assert_eq!(snapshot.hostname, "db1");
    assert_eq!(snapshot.log_file_path, LOG_PATH);
    assert_eq!(snapshot.inode, Some(1_311_459));
    assert_eq!(snapshot.total_lines, Some(40));
    assert_eq!(snapshot.long_query_time, Some(10.0));
    assert_eq!(snapshot.last_db.as_deref(), Some("mysql"));
    assert_eq!(snapshot.records.len(), 3);
    assert_eq!(vars.calls(), 1);

    // 40 行中读取最后 30 行，之前的 10 行用于查找库名
    assert!(exec.commands().iter().any(|c| c.starts_with("sed -n '1,10p' ")));
    assert!(exec.commands().iter().any(|c| c.starts_with("tail -n 30 ")));

    let json_lines = snapshot.to_json_lines().unwrap();
    assert_eq!(json_lines.lines().count(), 3);
    assert!(json_lines.ends_with('\n'));
}

#[test]
fn test_snapshot_window_covers_whole_file() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), variables()).unwrap();

    let snapshot = aggregator.snapshot(1000).unwrap();
    assert_eq!(snapshot.last_db, None);
    assert!(!exec.commands().iter().any(|c| c.starts_with("sed -n ")));
}

#[test]
fn test_transport_failure() {
    let mut aggregator =
        SlowLogAggregator::new("db1", FakeExec::failing(), variables()).unwrap();
    let err = aggregator.fetch_slow_logs(100).unwrap_err();
    assert!(err.is_transport_error());
    assert!(err.is_collaborator_error());
}

#[test]
fn test_database_failure() {
    let exec = FakeExec::new();
    let mut aggregator =
        SlowLogAggregator::new("db1", exec.clone(), FakeVariables::failing()).unwrap();
    let err = aggregator.snapshot(100).unwrap_err();
    assert!(err.is_database_error());
    assert!(exec.commands().is_empty());
}

#[test]
fn test_close_closes_both_channels() {
    let exec = FakeExec::new();
    let vars = variables();
    let aggregator = SlowLogAggregator::new("db1", exec.clone(), vars.clone()).unwrap();

    aggregator.close().unwrap();
    assert!(*exec.closed.borrow());
    assert!(*vars.closed.borrow());
}

#[test]
fn test_boxed_collaborators() {
    let exec = exec_for(MYSQL_SLOW_LOG);
    let vars = variables();
    let boxed_exec: Box<dyn RemoteExec> = Box::new(exec.clone());
    let boxed_vars: Box<dyn VariableSource> = Box::new(vars.clone());
    let mut aggregator = SlowLogAggregator::new("db1", boxed_exec, boxed_vars).unwrap();

    assert_eq!(aggregator.fetch_slow_logs(30).unwrap().len(), 3);
    aggregator.close().unwrap();
    assert!(*exec.closed.borrow());
    assert!(*vars.closed.borrow());
}

#[test]
fn test_unreachable_database_is_typed_error() {
    let settings = MysqlSettings {
        host: Some("127.0.0.1".to_string()),
        port: 1,
        connect_timeout_secs: 1,
        ..MysqlSettings::default()
    };
    let source = MysqlVariables::new("db1", settings).unwrap();
    let exec = FakeExec::new();
    let mut aggregator = SlowLogAggregator::new("db1", exec.clone(), source).unwrap();

    let err = aggregator.snapshot(100).unwrap_err();
    assert!(err.is_database_error());
    assert!(err.is_collaborator_error());
    assert!(exec.commands().is_empty());
    aggregator.close().unwrap();
}
