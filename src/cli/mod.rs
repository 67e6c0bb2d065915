//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `check`: 校验 netstat 文件
//! - `input`: 写出 Fortnet 输入
//! - `predict`: 运行一次完整预测
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: check, input, predict

pub mod check;
pub mod input;
pub mod predict;

use clap::{Parser, Subcommand};

/// fnetase - Fortnet 命令行工具
#[derive(Parser)]
#[command(name = "fnetase")]
#[command(version)]
#[command(about = "Drive the Fortnet neural-network predictor from structure files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a Fortnet netstat file and list its sub-networks
    Check(check::CheckArgs),

    /// Write fortnet_in.hsd and fnetdata.hdf5 without running Fortnet
    Input(input::InputArgs),

    /// Predict energy (and forces) of a structure with Fortnet
    Predict(predict::PredictArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let cli = Cli::parse_from([
            "fnetase",
            "-vv",
            "predict",
            "POSCAR",
            "--netstat",
            "net.hdf5",
            "--forces",
            "--delta",
            "0.02",
            "--command",
            "mpirun fnet",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Predict(args) => {
                assert!(args.forces);
                assert_eq!(args.delta, Some(0.02));
                assert_eq!(args.command.as_deref(), Some("mpirun fnet"));
                assert_eq!(args.label, "fortnet");
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_parse_input_defaults() {
        let cli = Cli::parse_from(["fnetase", "input", "structures/"]);
        match cli.command {
            Commands::Input(args) => {
                assert_eq!(args.netstat.to_str(), Some("fortnet.hdf5"));
                assert!(!args.forces);
                assert!(!args.recursive);
                assert_eq!(args.pattern, "*.xyz,*.extxyz,*.vasp,POSCAR*,CONTCAR*");
            }
            _ => panic!("expected input"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["fnetase", "-q", "-v", "check", "net.hdf5"]).is_err());
    }
}
