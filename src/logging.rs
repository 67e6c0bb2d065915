//! # 日志初始化
//!
//! 库内部使用 `tracing` 事件；命令行程序在此安装 stderr 输出层。
//! `-v` 次数决定级别 (WARN/INFO/DEBUG/TRACE)，`-q` 关闭日志。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `tracing-subscriber`

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// 由命令行参数得到日志级别
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// 安装全局 subscriber
pub fn setup_logging(verbosity: u8, quiet: bool) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // 重复初始化时保留已有 subscriber
    let _ = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer)
        .try_init();
}
