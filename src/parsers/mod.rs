//! # 解析器模块
//!
//! 提供结构文件解析器以及 Fortnet 输入 (HSD) 的读写。
//!
//! ## 依赖关系
//! - 被 `input` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: hsd, poscar, xyz

pub mod hsd;
pub mod poscar;
pub mod xyz;

use crate::error::{FnetAseError, Result};
use crate::models::Structure;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Structure> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xyz" | "extxyz" => xyz::parse_xyz_file(path),
        "vasp" | "poscar" => poscar::parse_poscar_file(path),
        _ => {
            // 可能是 POSCAR/CONTCAR (无扩展名)
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with("POSCAR") || name.starts_with("CONTCAR") {
                    return poscar::parse_poscar_file(path);
                }
            }
            Err(FnetAseError::UnsupportedFormat(format!(
                "Cannot determine format for: {}",
                path.display()
            )))
        }
    }
}
