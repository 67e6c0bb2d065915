//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。命令行程序的存储后端固定为 HDF5 文件。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `utils/` 以及 `fnet_ase` 库
//! - 子模块: check, input, predict

pub mod check;
pub mod input;
pub mod predict;

use crate::cli::Commands;
use fnet_ase::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check(args) => check::execute(args),
        Commands::Input(args) => input::execute(args),
        Commands::Predict(args) => predict::execute(args),
    }
}
