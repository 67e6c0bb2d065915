//! # XYZ / extended XYZ 格式解析器
//!
//! ## XYZ 格式说明
//! ```text
//! 3                                   # 原子数
//! Lattice="10 0 0 0 10 0 0 0 10" pbc="T T T"   # 注释行 (extended XYZ 可含晶胞)
//! O  0.000  0.000  0.000
//! H  0.757  0.586  0.000
//! H -0.757  0.586  0.000
//! ```
//!
//! 普通 XYZ 得到分子（非周期）结构；注释行含 `Lattice="..."` 时
//! 得到周期结构，`pbc` 缺省为 `T T T`。只读取文件中的第一帧。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`, `elements`
//! - 使用 `regex` 解析注释行中的键值对

use crate::elements;
use crate::error::{FnetAseError, Result};
use crate::models::{Lattice, Structure};
use regex::Regex;
use std::fs;
use std::path::Path;

fn xyz_error(name: &str, reason: impl Into<String>) -> FnetAseError {
    FnetAseError::ParseError {
        format: "xyz".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 解析 XYZ 文件
pub fn parse_xyz_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| FnetAseError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_xyz_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 XYZ 格式
pub fn parse_xyz_content(content: &str, name: &str) -> Result<Structure> {
    let mut lines = content.lines();

    let natoms: usize = lines
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| xyz_error(name, "First line must contain the number of atoms"))?;
    let comment = lines.next().unwrap_or("");

    // 原子数来自文件头，先确认行数足够再分配
    let available = content.lines().count().saturating_sub(2);
    if natoms > available {
        return Err(xyz_error(
            name,
            format!("Expected {} atoms, found {} lines", natoms, available),
        ));
    }

    let mut numbers = Vec::with_capacity(natoms);
    let mut positions = Vec::with_capacity(natoms);

    for i in 0..natoms {
        let line = lines
            .next()
            .ok_or_else(|| xyz_error(name, format!("Expected {} atoms, found {}", natoms, i)))?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(xyz_error(name, format!("Invalid atom line {}", i + 3)));
        }

        let z = parts[0]
            .parse::<u32>()
            .ok()
            .filter(|&z| elements::symbol(z).is_some())
            .or_else(|| elements::atomic_number(parts[0]))
            .ok_or_else(|| xyz_error(name, format!("Unknown element '{}'", parts[0])))?;

        let coords: Vec<f64> = parts[1..4].iter().filter_map(|s| s.parse().ok()).collect();
        if coords.len() < 3 {
            return Err(xyz_error(name, format!("Invalid coordinates at line {}", i + 3)));
        }

        numbers.push(z);
        positions.push([coords[0], coords[1], coords[2]]);
    }

    let mut structure = Structure::molecule(name, numbers, positions);

    if let Some(lattice) = parse_lattice(comment, name)? {
        structure.lattice = Some(lattice);
        structure.pbc = parse_pbc(comment).unwrap_or([true; 3]);
    }

    Ok(structure)
}

/// 提取 `Lattice="a1 a2 a3 b1 b2 b3 c1 c2 c3"`
fn parse_lattice(comment: &str, name: &str) -> Result<Option<Lattice>> {
    let pattern = Regex::new(r#"(?i)lattice\s*=\s*"([^"]*)""#)
        .map_err(|e| xyz_error(name, e.to_string()))?;

    let Some(caps) = pattern.captures(comment) else {
        return Ok(None);
    };

    let values: Vec<f64> = caps[1]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if values.len() != 9 {
        return Err(xyz_error(name, "Lattice must contain 9 numbers"));
    }

    Ok(Some(Lattice::from_vectors([
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ])))
}

/// 提取 `pbc="T T F"`
fn parse_pbc(comment: &str) -> Option<[bool; 3]> {
    let pattern = Regex::new(r#"(?i)pbc\s*=\s*"([^"]*)""#).ok()?;
    let caps = pattern.captures(comment)?;

    let flags: Vec<bool> = caps[1]
        .split_whitespace()
        .map(|s| matches!(s.to_uppercase().as_str(), "T" | "TRUE" | "1"))
        .collect();
    if flags.len() != 3 {
        return None;
    }
    Some([flags[0], flags[1], flags[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_xyz_is_molecule() {
        let content = "3\nwater\nO 0.0 0.0 0.0\nH 0.757 0.586 0.0\nH -0.757 0.586 0.0\n";
        let structure = parse_xyz_content(content, "water").unwrap();
        assert_eq!(structure.numbers, vec![8, 1, 1]);
        assert!(!structure.is_periodic());
        assert!(structure.lattice.is_none());
        assert_eq!(structure.positions[2], [-0.757, 0.586, 0.0]);
    }

    #[test]
    fn test_parse_extended_xyz_lattice_and_pbc() {
        let content = "1\nLattice=\"3.0 0 0 0 3.0 0 0 0 20.0\" pbc=\"T T F\" Properties=species:S:1:pos:R:3\nC 0 0 0\n";
        let structure = parse_xyz_content(content, "slab").unwrap();
        assert_eq!(structure.pbc, [true, true, false]);
        assert!(structure.is_periodic());
        let lattice = structure.lattice.unwrap();
        assert!((lattice.volume() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_lattice_without_pbc_defaults_to_periodic() {
        let content = "1\nLattice=\"3 0 0 0 3 0 0 0 3\"\n6 0 0 0\n";
        let structure = parse_xyz_content(content, "c").unwrap();
        assert_eq!(structure.pbc, [true; 3]);
        assert_eq!(structure.numbers, vec![6]);
    }

    #[test]
    fn test_missing_atoms_rejected() {
        let content = "2\n\nH 0 0 0\n";
        assert!(parse_xyz_content(content, "h2").is_err());
        assert!(parse_xyz_content("x\n", "bad").is_err());
        assert!(parse_xyz_content("1\n\nQq 0 0 0\n", "bad").is_err());
    }

    #[test]
    fn test_huge_atom_count_is_parse_error() {
        let err = parse_xyz_content("99999999999999999\n\nH 0 0 0\n", "x").unwrap_err();
        assert!(matches!(err, FnetAseError::ParseError { .. }));
        assert!(err.to_string().contains("Expected 99999999999999999 atoms"));
    }
}
