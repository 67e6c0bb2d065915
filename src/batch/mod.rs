//! # 批量输入模块
//!
//! 把命令行给出的文件与目录展开为结构文件列表。
//!
//! ## 依赖关系
//! - 被 `commands/input.rs` 使用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

pub mod collector;

pub use collector::FileCollector;
