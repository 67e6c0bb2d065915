//! # fnetase - Fortnet 命令行工具
//!
//! 基于 `fnet_ase` 库，从结构文件驱动 Fortnet 预测。
//!
//! ## 子命令
//! - `check`   - 校验 netstat 文件并列出子网络
//! - `input`   - 只写出 fortnet_in.hsd 与 fnetdata.hdf5
//! - `predict` - 完整预测：写输入、运行 Fortnet、读取能量与力
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── fnet_ase (计算器、解析器、数据模型)
//!   ├── batch/      (结构文件收集)
//!   ├── logging.rs  (tracing 输出)
//!   └── utils/      (工具函数)
//! ```

mod batch;
mod cli;
mod commands;
mod logging;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
