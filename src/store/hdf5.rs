//! # HDF5 后端
//!
//! 通过 `hdf5-metno` 在 HDF5 文件与 [`Document`] 之间转换。
//! 仅映射 schema 用到的类型：整数/浮点数据集，整数/浮点/字符串属性；
//! 其余类型（复合类型、引用等）在读取时被跳过。
//!
//! ## 依赖关系
//! - 实现 `store::Backend`
//! - 需要启用 `hdf5` feature

use super::{Attribute, Backend, Data, Dataset, Document, Group};
use crate::error::{FnetAseError, Result};

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 定长字符串属性读取时的最大长度
const MAX_FIXED_STRING: usize = 256;

/// HDF5 文件后端
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Backend;

fn storage_error(path: &Path, err: hdf5::Error) -> FnetAseError {
    FnetAseError::StorageError {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

impl Backend for Hdf5Backend {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path) -> Result<Document> {
        if !path.is_file() {
            return Err(FnetAseError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("Loading HDF5 document '{}'", path.display());
        let file = hdf5::File::open(path).map_err(|e| storage_error(path, e))?;
        let root = read_group(&file).map_err(|e| storage_error(path, e))?;

        Ok(Document { root })
    }

    fn save(&self, path: &Path, document: &Document) -> Result<()> {
        debug!("Writing HDF5 document '{}'", path.display());
        let file = hdf5::File::create(path).map_err(|e| storage_error(path, e))?;
        write_group(&file, &document.root).map_err(|e| storage_error(path, e))?;
        file.close().map_err(|e| storage_error(path, e))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(FnetAseError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        fs::remove_file(path).map_err(|e| FnetAseError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// 读取
// ─────────────────────────────────────────────────────────────

fn read_group(source: &hdf5::Group) -> hdf5::Result<Group> {
    let mut group = Group {
        attrs: read_attrs(source)?,
        ..Group::default()
    };

    for name in source.member_names()? {
        if let Ok(child) = source.group(&name) {
            group.groups.insert(name, read_group(&child)?);
        } else if let Ok(ds) = source.dataset(&name) {
            if let Some(data) = read_data(&ds)? {
                let mut dataset = Dataset::new(data);
                dataset.attrs = read_attrs(&ds)?;
                group.datasets.insert(name, dataset);
            }
        }
    }

    Ok(group)
}

fn read_attrs(location: &hdf5::Location) -> hdf5::Result<BTreeMap<String, Attribute>> {
    let mut attrs = BTreeMap::new();
    for name in location.attr_names()? {
        let attr = location.attr(&name)?;
        if let Some(value) = read_attribute(&attr)? {
            attrs.insert(name, value);
        }
    }
    Ok(attrs)
}

fn read_attribute(attr: &hdf5::Attribute) -> hdf5::Result<Option<Attribute>> {
    let value = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            Some(Attribute::Int(attr.read_raw::<i64>()?))
        }
        TypeDescriptor::Float(_) => Some(Attribute::Float(attr.read_raw::<f64>()?)),
        TypeDescriptor::FixedAscii(_) => attr
            .read_raw::<FixedAscii<MAX_FIXED_STRING>>()?
            .first()
            .map(|s| Attribute::text(s.as_str())),
        TypeDescriptor::FixedUnicode(_) => attr
            .read_raw::<FixedUnicode<MAX_FIXED_STRING>>()?
            .first()
            .map(|s| Attribute::text(s.as_str())),
        TypeDescriptor::VarLenAscii => attr
            .read_raw::<VarLenAscii>()?
            .first()
            .map(|s| Attribute::text(s.as_str())),
        TypeDescriptor::VarLenUnicode => attr
            .read_raw::<VarLenUnicode>()?
            .first()
            .map(|s| Attribute::text(s.as_str())),
        _ => None,
    };
    Ok(value)
}

fn read_data(ds: &hdf5::Dataset) -> hdf5::Result<Option<Data>> {
    let data = match ds.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            Some(Data::Int(ds.read_dyn::<i64>()?))
        }
        TypeDescriptor::Float(_) => Some(Data::Float(ds.read_dyn::<f64>()?)),
        _ => None,
    };
    Ok(data)
}

// ─────────────────────────────────────────────────────────────
// 写入
// ─────────────────────────────────────────────────────────────

fn write_group(target: &hdf5::Group, group: &Group) -> hdf5::Result<()> {
    write_attrs(target, &group.attrs)?;

    for (name, dataset) in &group.datasets {
        let ds = match &dataset.data {
            Data::Int(values) => target
                .new_dataset_builder()
                .with_data(values.view())
                .create(name.as_str())?,
            Data::Float(values) => target
                .new_dataset_builder()
                .with_data(values.view())
                .create(name.as_str())?,
        };
        write_attrs(&ds, &dataset.attrs)?;
    }

    for (name, child) in &group.groups {
        let created = target.create_group(name)?;
        write_group(&created, child)?;
    }

    Ok(())
}

fn write_attrs(location: &hdf5::Location, attrs: &BTreeMap<String, Attribute>) -> hdf5::Result<()> {
    for (name, value) in attrs {
        match value {
            Attribute::Int(values) => {
                location
                    .new_attr_builder()
                    .with_data(values.as_slice())
                    .create(name.as_str())?;
            }
            Attribute::Float(values) => {
                location
                    .new_attr_builder()
                    .with_data(values.as_slice())
                    .create(name.as_str())?;
            }
            Attribute::Text(text) => {
                let text: VarLenUnicode = text
                    .parse()
                    .map_err(|e: hdf5::types::StringError| hdf5::Error::from(e.to_string()))?;
                location
                    .new_attr::<VarLenUnicode>()
                    .create(name.as_str())?
                    .write_scalar(&text)?;
            }
        }
    }
    Ok(())
}
