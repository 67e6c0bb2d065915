//! # predict 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/predict.rs`

use clap::Args;
use std::path::PathBuf;

/// predict 子命令参数
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Structure file (POSCAR/CONTCAR, .vasp, .xyz, .extxyz)
    pub structure: PathBuf,

    /// Fortnet netstat file
    #[arg(short, long, default_value = "fortnet.hdf5")]
    pub netstat: PathBuf,

    /// Also predict forces via finite differences
    #[arg(short, long, default_value_t = false)]
    pub forces: bool,

    /// Finite difference step in Angstrom [default: 0.01]
    #[arg(short, long)]
    pub delta: Option<f64>,

    /// Command used to run Fortnet
    #[arg(short, long, env = "FORTNET_COMMAND")]
    pub command: Option<String>,

    /// Prefix of the Fortnet output file (<label>.out)
    #[arg(short, long, default_value = "fortnet")]
    pub label: String,

    /// Working directory for Fortnet
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Export energy and forces to CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
