//! # 数据模型模块
//!
//! 定义原子结构与预测结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `dataset`, `calculator` 和 `commands/` 使用
//! - 子模块: structure, prediction

pub mod prediction;
pub mod structure;

pub use prediction::{PredictionResult, Property};
pub use structure::{Lattice, Structure, SystemChange};
