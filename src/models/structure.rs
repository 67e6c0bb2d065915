//! # 原子结构数据模型
//!
//! 调用方提供的原子结构快照：原子序数、笛卡尔坐标 (Å)、
//! 可选的周期性晶胞及各方向的周期性标志。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `dataset`, `calculator` 使用
//! - 使用 `elements`

use crate::elements;
use crate::error::{FnetAseError, Result};
use serde::{Deserialize, Serialize};

/// 比较坐标/晶胞时的容差，与 ASE 的 `compare_atoms` 一致
const COMPARE_TOLERANCE: f64 = 1e-15;

/// 晶格向量表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3, Å)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    fn approx_eq(&self, other: &Lattice) -> bool {
        self.matrix
            .iter()
            .flatten()
            .zip(other.matrix.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= COMPARE_TOLERANCE)
    }
}

/// 两次计算之间结构发生的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemChange {
    Positions,
    Numbers,
    Cell,
    Pbc,
}

impl std::fmt::Display for SystemChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemChange::Positions => write!(f, "positions"),
            SystemChange::Numbers => write!(f, "numbers"),
            SystemChange::Cell => write!(f, "cell"),
            SystemChange::Pbc => write!(f, "pbc"),
        }
    }
}

/// 原子结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 结构名称
    pub name: String,

    /// 原子序数
    pub numbers: Vec<u32>,

    /// 笛卡尔坐标 (Å)
    pub positions: Vec<[f64; 3]>,

    /// 晶胞，分子体系为 None
    pub lattice: Option<Lattice>,

    /// 各方向是否周期
    pub pbc: [bool; 3],
}

impl Structure {
    /// 创建非周期（分子）结构
    pub fn molecule(name: impl Into<String>, numbers: Vec<u32>, positions: Vec<[f64; 3]>) -> Self {
        Structure {
            name: name.into(),
            numbers,
            positions,
            lattice: None,
            pbc: [false; 3],
        }
    }

    /// 创建三维周期结构
    pub fn periodic(
        name: impl Into<String>,
        numbers: Vec<u32>,
        positions: Vec<[f64; 3]>,
        lattice: Lattice,
    ) -> Self {
        Structure {
            name: name.into(),
            numbers,
            positions,
            lattice: Some(lattice),
            pbc: [true; 3],
        }
    }

    /// 由元素符号创建分子结构
    pub fn from_symbols(
        name: impl Into<String>,
        symbols: &[&str],
        positions: Vec<[f64; 3]>,
    ) -> Result<Self> {
        let numbers = symbols
            .iter()
            .map(|s| {
                elements::atomic_number(s)
                    .ok_or_else(|| FnetAseError::InvalidArgument(format!("Unknown element '{}'", s)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Structure::molecule(name, numbers, positions))
    }

    /// 原子数
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// 任一方向周期即视为周期体系
    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }

    /// 排序去重后的物种（原子序数）
    pub fn species(&self) -> Vec<u32> {
        let mut species = self.numbers.clone();
        species.sort_unstable();
        species.dedup();
        species
    }

    /// 元素符号列表
    pub fn symbols(&self) -> Vec<&'static str> {
        self.numbers
            .iter()
            .map(|&z| elements::symbol(z).unwrap_or("X"))
            .collect()
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for symbol in self.symbols() {
            *counts.entry(symbol).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 与另一结构相比发生的变化（顺序: positions, numbers, cell, pbc）
    pub fn changes_from(&self, other: &Structure) -> Vec<SystemChange> {
        let mut changes = Vec::new();

        let same_positions = self.positions.len() == other.positions.len()
            && self
                .positions
                .iter()
                .flatten()
                .zip(other.positions.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= COMPARE_TOLERANCE);
        if !same_positions {
            changes.push(SystemChange::Positions);
        }

        if self.numbers != other.numbers {
            changes.push(SystemChange::Numbers);
        }

        let same_cell = match (&self.lattice, &other.lattice) {
            (None, None) => true,
            (Some(a), Some(b)) => a.approx_eq(b),
            _ => false,
        };
        if !same_cell {
            changes.push(SystemChange::Cell);
        }

        if self.pbc != other.pbc {
            changes.push(SystemChange::Pbc);
        }

        changes
    }
}
