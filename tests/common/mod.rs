//! 集成测试公共模块

use slowlog_collector::aggregator::{RemoteExec, VariableSource};
use slowlog_collector::error::{Result, SlowlogError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 标准 MySQL 慢查询日志（包含两次重启横幅）
#[allow(dead_code)]
pub const MYSQL_SLOW_LOG: &str = r#"/usr/local/Cellar/mysql/5.6.12/bin/mysqld, Version: 5.6.12 (Source distribution). started with:
Tcp port: 3306  Unix socket: /tmp/mysql.sock
Time                 Id Command    Argument
# Time: 140128 13:39:11
# User@Host: [user] @ localhost []  Id:     8
# Query_time: 2.001227  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 0
SET timestamp=1390883951;
select sleep(2);
/usr/local/Cellar/mysql/5.6.12/bin/mysqld, Version: 5.6.12 (Source distribution). started with:
Tcp port: 3306  Unix socket: /tmp/mysql.sock
Time                 Id Command    Argument
# Time: 140326  0:36:56
# User@Host: root[root] @ localhost []  Id:    51
# Query_time: 10.001140  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 0
SET timestamp=1395761816;
select sleep(10);
# Time: 140326  0:37:11
# User@Host: root[root] @ localhost []  Id:    51
# Query_time: 10.001114  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 0
use mysql;
SET timestamp=1395761831;
select sleep(10);
"#;

/// Percona Server 扩展格式慢查询日志
#[allow(dead_code)]
pub const PERCONA_SLOW_LOG: &str = r#"# Time: 120913 12:58:21
# User@Host: root[root] @ localhost []
# Thread_id: 45  Schema: sbtest  Last_errno: 0  Killed: 0
# Query_time: 34.452360  Lock_time: 0.000134  Rows_sent: 50  Rows_examined: 8800050  Rows_affected: 0  Rows_read: 50
# Bytes_sent: 3499  Tmp_tables: 1  Tmp_disk_tables: 1  Tmp_table_sizes: 2450800000
# InnoDB_trx_id: B08
# QC_Hit: No  Full_scan: Yes  Full_join: No  Tmp_table: Yes  Tmp_table_on_disk: Yes
# Filesort: Yes  Filesort_on_disk: Yes  Merge_passes: 202
#   InnoDB_IO_r_ops: 58994  InnoDB_IO_r_bytes: 966557696  InnoDB_IO_r_wait: 8.327283
#   InnoDB_rec_lock_wait: 0.000000  InnoDB_queue_wait: 0.000000
#   InnoDB_pages_distinct: 60281
SET timestamp=1347508701;
SELECT * FROM sbtest ORDER BY RAND() LIMIT 50;
/usr/sbin/mysqld, Version: 5.5.34-32.0-log (Percona Server (GPL), Release rel32.0, Revision 591). started with:
Tcp port: 3306  Unix socket: /var/lib/mysql/mysql.sock
Time                 Id Command    Argument
# Time: 131226 19:07:02
# User@Host: user[user] @  [192.168.10.11]
# Thread_id: 9510259  Schema: sbtest  Last_errno: 0  Killed: 0
# Query_time: 4.901885  Lock_time: 0.000065  Rows_sent: 8309  Rows_examined: 69763781  Rows_affected: 0  Rows_read: 69763781
# Bytes_sent: 802732
SET timestamp=1388052422;
SELECT
        *
FROM
        sbtest;
"#;

/// 可预设输出、记录收到的命令的假执行通道
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeExec {
    /// 命令前缀 → 输出
    pub responses: Rc<RefCell<Vec<(String, String)>>>,
    pub commands: Rc<RefCell<Vec<String>>>,
    pub closed: Rc<RefCell<bool>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl FakeExec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn respond(self, prefix: &str, output: &str) -> Self {
        self.responses
            .borrow_mut()
            .push((prefix.to_string(), output.to_string()));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl RemoteExec for FakeExec {
    fn exec(&mut self, command: &str) -> Result<String> {
        self.commands.borrow_mut().push(command.to_string());
        if self.fail {
            return Err(SlowlogError::transport_error(command, "connection refused"));
        }
        Ok(self
            .responses
            .borrow()
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }

    fn close(&mut self) -> Result<()> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}

/// 固定返回一组变量的假数据库
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeVariables {
    pub values: HashMap<String, String>,
    pub calls: Rc<RefCell<usize>>,
    pub closed: Rc<RefCell<bool>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl FakeVariables {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

impl VariableSource for FakeVariables {
    fn global_variables(&mut self) -> Result<Vec<(String, String)>> {
        *self.calls.borrow_mut() += 1;
        if self.fail {
            return Err(SlowlogError::database_error("Can't connect to MySQL server"));
        }
        Ok(self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn close(&mut self) -> Result<()> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}
