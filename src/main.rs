use anyhow::{Context, Result, bail};
use slowlog_collector::aggregator::{MysqlVariables, SlowLogAggregator, SshExec};
use slowlog_collector::config::Config;
use std::env;
use std::io::{self, Write};

const USAGE: &str = "用法: slowlog-cli <config.toml> <hostname> [lines]";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(config_path), Some(hostname)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };

    let config = Config::from_file(&config_path)
        .with_context(|| format!("加载配置文件失败: {config_path}"))?;

    #[cfg(feature = "logging")]
    slowlog_collector::logging::init_logging(config.log.to_log_config()?)?;

    let lines = match args.next() {
        Some(n) => n.parse::<usize>().with_context(|| format!("非法的行数: {n}"))?,
        None => config.fetch_lines_limit(),
    };

    let settings = config.connection_settings(&hostname)?;
    let exec = SshExec::new(&hostname, settings.ssh)?;
    let variables = MysqlVariables::new(&hostname, settings.mysql)?;
    let mut aggregator = SlowLogAggregator::new(&hostname, exec, variables)?;

    let result = aggregator.snapshot(lines);
    // 无论采集是否成功都关闭连接
    aggregator.close()?;
    let snapshot = result?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(snapshot.to_json_lines()?.as_bytes())?;
    stdout.flush()?;

    eprintln!(
        "{}: {} 条慢查询 (文件 {}, 共 {} 行, long_query_time = {})",
        snapshot.hostname,
        snapshot.records.len(),
        snapshot.log_file_path,
        snapshot.total_lines.map_or_else(|| "?".to_string(), |n| n.to_string()),
        snapshot.long_query_time.map_or_else(|| "?".to_string(), |t| t.to_string()),
    );
    Ok(())
}
