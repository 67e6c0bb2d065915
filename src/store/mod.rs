//! # 层次化存储模块
//!
//! Fortnet 的 netstat、数据集与输出文件都是层次化二进制文档
//! （组 / 数据集 / 属性）。本模块提供与具体文件格式无关的内存模型
//! [`Document`]，以及在磁盘（或内存）与 [`Document`] 之间搬运的
//! [`Backend`] 接口。上层的 schema 映射 (`netstat`, `dataset`, `fnetout`)
//! 只面向 [`Document`]，不直接接触 HDF5。
//!
//! ## 依赖关系
//! - 被 `netstat`, `dataset`, `fnetout`, `calculator` 使用
//! - 子模块: document, memory, hdf5（`hdf5` feature）

pub mod document;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod memory;

pub use document::{Attribute, Data, Dataset, Document, Group};
#[cfg(feature = "hdf5")]
pub use self::hdf5::Hdf5Backend;
pub use memory::MemoryBackend;

use crate::error::Result;
use std::path::Path;

/// 层次化文档的读写后端
pub trait Backend {
    /// 路径上是否存在文档
    fn exists(&self, path: &Path) -> bool;

    /// 读取整个文档
    fn load(&self, path: &Path) -> Result<Document>;

    /// 写入文档，覆盖已有文件
    fn save(&self, path: &Path, document: &Document) -> Result<()>;

    /// 删除文档；不存在时返回 `FileNotFound`
    fn remove(&self, path: &Path) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn load(&self, path: &Path) -> Result<Document> {
        (**self).load(path)
    }

    fn save(&self, path: &Path, document: &Document) -> Result<()> {
        (**self).save(path, document)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        (**self).remove(path)
    }
}
