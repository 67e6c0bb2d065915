//! # input 子命令 CLI 定义
//!
//! 从一个或多个结构文件（或目录）写出 Fortnet 输入。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/input.rs`

use clap::Args;
use std::path::PathBuf;

/// input 子命令参数
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Structure files or directories (POSCAR/CONTCAR, .vasp, .xyz, .extxyz)
    #[arg(required = true)]
    pub structures: Vec<PathBuf>,

    /// Fortnet netstat file
    #[arg(short, long, default_value = "fortnet.hdf5")]
    pub netstat: PathBuf,

    /// Request forces via finite differences
    #[arg(short, long, default_value_t = false)]
    pub forces: bool,

    /// Finite difference step in Angstrom
    #[arg(short, long)]
    pub delta: Option<f64>,

    /// Directory the input files are written to
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Glob patterns for files inside directories (comma separated)
    #[arg(short, long, default_value = "*.xyz,*.extxyz,*.vasp,POSCAR*,CONTCAR*")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,
}
