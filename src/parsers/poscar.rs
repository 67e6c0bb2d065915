//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP POSCAR/CONTCAR 文件为周期性 [`Structure`]（笛卡尔坐标, Å）。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! VASP 4 格式没有元素行，此时从注释行读取元素符号。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`, `elements`

use crate::elements;
use crate::error::{FnetAseError, Result};
use crate::models::{Lattice, Structure};
use std::fs;
use std::path::Path;

fn poscar_error(name: &str, reason: impl Into<String>) -> FnetAseError {
    FnetAseError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| FnetAseError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(poscar_error(default_name, "File too short"));
    }

    // Line 0: Comment/name
    let comment = lines[0].trim();
    let name = if comment.is_empty() {
        default_name.to_string()
    } else {
        comment.to_string()
    };

    // Line 1: Scaling factor（负值表示目标体积）
    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| poscar_error(&name, "Invalid scaling factor"))?;

    // Lines 2-4: Lattice vectors
    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(poscar_error(
                &name,
                format!("Invalid lattice vector at line {}", 3 + i),
            ));
        }
        *row = [parts[0], parts[1], parts[2]];
    }

    let factor = if scale < 0.0 {
        let volume = Lattice::from_vectors(matrix).volume().abs();
        (scale.abs() / volume).cbrt()
    } else {
        scale
    };
    for row in matrix.iter_mut() {
        for x in row.iter_mut() {
            *x *= factor;
        }
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: Element symbols (VASP 5+) or atom counts (VASP 4)
    let line5_parts: Vec<&str> = lines[5].split_whitespace().collect();
    let vasp4 = line5_parts
        .first()
        .map(|s| s.parse::<usize>().is_ok())
        .unwrap_or(false);

    let (symbols, counts, atom_line_start): (Vec<&str>, Vec<usize>, usize) = if vasp4 {
        let counts = line5_parts.iter().filter_map(|s| s.parse().ok()).collect();
        (comment.split_whitespace().collect(), counts, 6)
    } else {
        let counts = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (line5_parts, counts, 7)
    };

    if symbols.len() < counts.len() {
        return Err(poscar_error(&name, "Missing element symbols"));
    }

    let species = symbols
        .iter()
        .take(counts.len())
        // VASP 6 允许 "Fe_pv" 之类的 POTCAR 后缀
        .map(|s| {
            let symbol = s
                .split(|c: char| c == '_' || c == '/')
                .next()
                .unwrap_or_default();
            elements::atomic_number(symbol)
                .ok_or_else(|| poscar_error(&name, format!("Unknown element '{}'", s)))
        })
        .collect::<Result<Vec<u32>>>()?;

    // Check for "Selective dynamics" line
    let mut coord_line = atom_line_start;
    if lines.len() > coord_line
        && lines[coord_line]
            .trim()
            .to_lowercase()
            .starts_with('s')
    {
        coord_line += 1;
    }

    // Coordinate type line
    if lines.len() <= coord_line {
        return Err(poscar_error(&name, "Missing coordinate type line"));
    }

    let coord_type = lines[coord_line].trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    // Parse atom positions
    let total = counts
        .iter()
        .try_fold(0usize, |acc, &n| acc.checked_add(n))
        .ok_or_else(|| poscar_error(&name, "Atom count overflows"))?;
    let available = lines.len().saturating_sub(coord_line + 1);
    if total > available {
        return Err(poscar_error(
            &name,
            format!("Expected {} positions, found {} lines", total, available),
        ));
    }

    let mut numbers = Vec::with_capacity(total);
    let mut positions = Vec::with_capacity(total);
    let mut line_idx = coord_line + 1;

    for (&z, &count) in species.iter().zip(counts.iter()) {
        for _ in 0..count {
            let parts: Vec<f64> = lines
                .get(line_idx)
                .map(|l| {
                    l.split_whitespace()
                        .take(3)
                        .filter_map(|s| s.parse().ok())
                        .collect()
                })
                .unwrap_or_default();

            if parts.len() < 3 {
                return Err(poscar_error(
                    &name,
                    format!("Invalid or missing position at line {}", line_idx + 1),
                ));
            }

            let position = if is_cartesian {
                [parts[0] * factor, parts[1] * factor, parts[2] * factor]
            } else {
                lattice.to_cartesian([parts[0], parts[1], parts[2]])
            };
            numbers.push(z);
            positions.push(position);
            line_idx += 1;
        }
    }

    Ok(Structure::periodic(name, numbers, positions, lattice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poscar_vasp5() {
        let content = r#"NaCl
1.0
5.64 0.0 0.0
0.0 5.64 0.0
0.0 0.0 5.64
Na Cl
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#;
        let structure = parse_poscar_content(content, "NaCl").unwrap();
        assert_eq!(structure.name, "NaCl");
        assert_eq!(structure.len(), 8);
        assert!(structure.is_periodic());
        assert_eq!(structure.formula(), "Cl4Na4");
        assert_eq!(structure.positions[1], [2.82, 2.82, 0.0]);
    }

    #[test]
    fn test_parse_poscar_with_scale_and_cartesian() {
        let content = r#"Si
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
2
Cartesian
0.0 0.0 0.0
1.0 1.0 1.0
"#;
        let structure = parse_poscar_content(content, "Si").unwrap();
        let lattice = structure.lattice.as_ref().unwrap();
        assert!((lattice.volume() - 64.0).abs() < 1e-9);
        assert_eq!(structure.positions[1], [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_parse_poscar_vasp4_symbols_from_comment() {
        let content = r#"C H
1.0
10.0 0.0 0.0
0.0 10.0 0.0
0.0 0.0 10.0
1 1
Direct
0.0 0.0 0.0
0.1 0.0 0.0
"#;
        let structure = parse_poscar_content(content, "CH").unwrap();
        assert_eq!(structure.numbers, vec![6, 1]);
        assert!((structure.positions[1][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let structure = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(structure.len(), 2);
        assert_eq!(structure.numbers, vec![26, 26]);
    }

    #[test]
    fn test_parse_poscar_truncated_positions() {
        let content = "Fe\n1.0\n2.87 0 0\n0 2.87 0\n0 0 2.87\nFe\n2\nDirect\n0 0 0\n";
        let err = parse_poscar_content(content, "Fe").unwrap_err();
        assert!(matches!(err, FnetAseError::ParseError { .. }));
    }

    #[test]
    fn test_parse_poscar_huge_counts_rejected() {
        let content = "Fe\n1.0\n2.87 0 0\n0 2.87 0\n0 0 2.87\nFe\n99999999999999999\nDirect\n0 0 0\n";
        let err = parse_poscar_content(content, "Fe").unwrap_err();
        assert!(err.to_string().contains("Expected 99999999999999999 positions"));

        let overflow = format!(
            "FeC\n1.0\n2.87 0 0\n0 2.87 0\n0 0 2.87\nFe C\n{} {}\nDirect\n0 0 0\n",
            usize::MAX,
            usize::MAX
        );
        let err = parse_poscar_content(&overflow, "FeC").unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }
}
