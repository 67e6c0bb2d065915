//! # 内存后端
//!
//! 以路径为键在内存中保存文档，不接触磁盘。
//! 适合测试以及由调用方直接构造 netstat 布局的场景。
//!
//! ## 依赖关系
//! - 实现 `store::Backend`

use super::{Backend, Document};
use crate::error::{FnetAseError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 内存中的文档集合
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RefCell<HashMap<PathBuf, Document>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    /// 放入（或替换）一个文档
    pub fn insert(&self, path: impl Into<PathBuf>, document: Document) {
        self.files.borrow_mut().insert(path.into(), document);
    }

    /// 取出文档副本
    pub fn get(&self, path: &Path) -> Option<Document> {
        self.files.borrow().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn load(&self, path: &Path) -> Result<Document> {
        self.get(path).ok_or_else(|| FnetAseError::FileNotFound {
            path: path.display().to_string(),
        })
    }

    fn save(&self, path: &Path, document: &Document) -> Result<()> {
        self.insert(path, document.clone());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FnetAseError::FileNotFound {
                path: path.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Attribute;

    #[test]
    fn test_save_load_remove() {
        let backend = MemoryBackend::new();
        let path = Path::new("work/fnetout.hdf5");
        assert!(!backend.exists(path));

        let mut doc = Document::new();
        doc.ensure_group("fnetout").set_attr("mode", Attribute::text("predict"));
        backend.save(path, &doc).unwrap();

        assert!(backend.exists(path));
        assert_eq!(backend.load(path).unwrap(), doc);

        backend.remove(path).unwrap();
        assert!(backend.is_empty());
        assert!(matches!(
            backend.remove(path),
            Err(FnetAseError::FileNotFound { .. })
        ));
        assert!(matches!(
            backend.load(path),
            Err(FnetAseError::FileNotFound { .. })
        ));
    }
}
