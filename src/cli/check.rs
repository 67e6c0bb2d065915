//! # check 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/check.rs`

use clap::Args;
use std::path::PathBuf;

/// check 子命令参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fortnet netstat file
    #[arg(default_value = "fortnet.hdf5")]
    pub netstat: PathBuf,

    /// Also check that the network supports force predictions
    #[arg(short, long, default_value_t = false)]
    pub forces: bool,
}
