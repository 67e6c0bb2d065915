//! # Fortnet 输出读取 (fnetout.hdf5)
//!
//! 从 Fortnet 的输出文件中读取能量与力，并从原子单位换算为 eV、eV/Å。
//! 假定数据集中只有一个结构、网络只有一个训练目标（全局能量，单位 Hartree）。
//!
//! ## 文件布局
//! ```text
//! /fnetout                               attrs: mode
//! /fnetout/output                        attrs: ndatapoints, tforces
//! /fnetout/output/globalpredictions      float[ndatapoints, ntargets]
//! /fnetout/output/datapoint<i>/forces    float[natoms, 3 * ntargets]
//! ```
//!
//! ## 依赖关系
//! - 被 `calculator` 使用
//! - 使用 `store`, `units`

use crate::error::{FnetAseError, Result};
use crate::store::{Document, Group};
use crate::units::{force_au_to_ev_per_angstrom, hartree_to_ev};

use ndarray::{Array2, Ix2};
use std::path::Path;

/// 输出文件名
pub const FNETOUT: &str = "fnetout.hdf5";

const OUTPUT_GROUP: &str = "fnetout/output";

/// fnetout.hdf5 中与预测相关的内容（原子单位）
#[derive(Debug, Clone)]
pub struct FnetOutput {
    /// 运行模式
    pub mode: Option<String>,

    /// 全局预测表：行为数据点，列为训练目标
    pub predictions: Array2<f64>,

    /// 输出中是否含有力
    pub tforces: bool,

    output: Group,
    path: String,
}

impl FnetOutput {
    /// 从层次化文档映射
    pub fn from_document(path: &Path, document: &Document) -> Result<Self> {
        let path = path.display().to_string();

        let output = document
            .group(OUTPUT_GROUP)
            .ok_or_else(|| malformed(&path, "No output group present."))?;

        let predictions = output
            .datasets
            .get("globalpredictions")
            .ok_or_else(|| malformed(&path, "No global predictions present."))?
            .data
            .to_floats();
        let predictions = match predictions.ndim() {
            1 => {
                let n = predictions.len();
                predictions.into_shape_with_order((n, 1)).ok()
            }
            _ => predictions.into_dimensionality::<Ix2>().ok(),
        }
        .ok_or_else(|| malformed(&path, "Global predictions must be a 2D table."))?;

        let tforces = output
            .attr("tforces")
            .and_then(|a| a.as_bool())
            .unwrap_or(false);

        let mode = document
            .group("fnetout")
            .and_then(|g| g.attr("mode"))
            .and_then(|a| a.as_text())
            .map(|s| s.trim().to_string());

        Ok(FnetOutput {
            mode,
            predictions,
            tforces,
            output: output.clone(),
            path,
        })
    }

    /// 能量 (eV)：第一个数据点的第一个目标
    pub fn energy(&self) -> Result<f64> {
        self.predictions
            .get((0, 0))
            .map(|&e| hartree_to_ev(e))
            .ok_or_else(|| malformed(&self.path, "Prediction table is empty."))
    }

    /// 力 (eV/Å)：第一个数据点、第一个目标
    pub fn forces(&self) -> Result<Vec<[f64; 3]>> {
        if !self.tforces {
            return Err(FnetAseError::ForcesNotInOutput {
                path: self.path.clone(),
            });
        }

        let raw = self
            .output
            .dataset("datapoint1/forces")
            .ok_or_else(|| malformed(&self.path, "Forces flagged but missing for datapoint 1."))?
            .data
            .to_floats();

        let shape = raw.shape().to_vec();
        let (natoms, ncols) = match shape.as_slice() {
            [natoms, ncols] if *ncols >= 3 => (*natoms, *ncols),
            _ => {
                return Err(malformed(
                    &self.path,
                    format!("Unexpected force array shape {:?}.", shape),
                ))
            }
        };

        let values: Vec<f64> = raw.iter().copied().collect();
        let forces = (0..natoms)
            .map(|i| {
                let row = &values[i * ncols..i * ncols + 3];
                [
                    force_au_to_ev_per_angstrom(row[0]),
                    force_au_to_ev_per_angstrom(row[1]),
                    force_au_to_ev_per_angstrom(row[2]),
                ]
            })
            .collect();

        Ok(forces)
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> FnetAseError {
    FnetAseError::MalformedOutput {
        path: path.to_string(),
        reason: reason.into(),
    }
}
