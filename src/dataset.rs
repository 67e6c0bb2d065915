//! # 预测数据集 (fnetdata.hdf5)
//!
//! 把待预测的结构写成 Fortnet 读取的数据集布局，坐标与晶胞转换为 Bohr。
//!
//! ## 文件布局
//! ```text
//! /fnetdata/dataset                      attrs: ndatapoints, ntotatoms, nextfeatures,
//!                                               nglobaltargets, natomictargets
//! /fnetdata/dataset/atomicnumbers        int[nspecies]
//! /fnetdata/dataset/datapoint<i>         attrs: natoms, periodic, weight
//! /fnetdata/dataset/datapoint<i>/localtypes   int[natoms]
//! /fnetdata/dataset/datapoint<i>/coords       float[natoms, 3]
//! /fnetdata/dataset/datapoint<i>/lattice      float[3, 3]   (仅周期体系)
//! ```
//!
//! ## 依赖关系
//! - 被 `calculator` 使用
//! - 使用 `store`, `units`, `models/structure.rs`

use crate::error::{FnetAseError, Result};
use crate::models::Structure;
use crate::store::{Attribute, Data, Document};
use crate::units::angstrom_to_bohr;

const DATASET_GROUP: &str = "fnetdata/dataset";

/// 构造数据集文档
pub fn dataset_document(structures: &[Structure]) -> Result<Document> {
    if structures.is_empty() {
        return Err(FnetAseError::InvalidArgument(
            "Dataset requires at least one structure".to_string(),
        ));
    }
    if let Some(empty) = structures.iter().find(|s| s.is_empty()) {
        return Err(FnetAseError::InvalidArgument(format!(
            "Structure '{}' contains no atoms",
            empty.name
        )));
    }

    let mut species: Vec<u32> = structures.iter().flat_map(|s| s.species()).collect();
    species.sort_unstable();
    species.dedup();

    let total_atoms: usize = structures.iter().map(|s| s.len()).sum();

    let mut doc = Document::new();
    let dataset = doc.ensure_group(DATASET_GROUP);
    dataset
        .set_attr("ndatapoints", Attribute::int(structures.len() as i64))
        .set_attr("ntotatoms", Attribute::int(total_atoms as i64))
        .set_attr("nextfeatures", Attribute::int(0))
        .set_attr("nglobaltargets", Attribute::int(0))
        .set_attr("natomictargets", Attribute::int(0))
        .set_dataset(
            "atomicnumbers",
            Data::ints(species.iter().map(|&z| z as i64).collect()),
        );

    for (i, structure) in structures.iter().enumerate() {
        let datapoint = dataset.ensure_group(&format!("datapoint{}", i + 1));

        let local_types = structure
            .numbers
            .iter()
            .map(|z| {
                // species 由全部结构汇总而来，必然包含 z
                species.binary_search(z).map(|idx| idx as i64 + 1).unwrap_or(0)
            })
            .collect();

        let coords: Vec<f64> = structure
            .positions
            .iter()
            .flatten()
            .map(|&x| angstrom_to_bohr(x))
            .collect();

        datapoint
            .set_attr("natoms", Attribute::int(structure.len() as i64))
            .set_attr("periodic", Attribute::int(structure.is_periodic() as i64))
            .set_attr("weight", Attribute::int(1))
            .set_dataset("localtypes", Data::ints(local_types));
        datapoint.set_dataset(
            "coords",
            Data::floats_2d(structure.len(), 3, coords).ok_or_else(|| {
                FnetAseError::InvalidArgument(format!(
                    "Structure '{}' has {} numbers but {} positions",
                    structure.name,
                    structure.len(),
                    structure.positions.len()
                ))
            })?,
        );

        if structure.is_periodic() {
            let lattice = structure.lattice.as_ref().ok_or_else(|| {
                FnetAseError::InvalidArgument(format!(
                    "Periodic structure '{}' has no lattice",
                    structure.name
                ))
            })?;
            let cell = lattice
                .matrix
                .iter()
                .flatten()
                .map(|&x| angstrom_to_bohr(x))
                .collect();
            if let Some(data) = Data::floats_2d(3, 3, cell) {
                datapoint.set_dataset("lattice", data);
            }
        }
    }

    Ok(doc)
}
