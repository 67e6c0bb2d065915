//! # 文件收集器
//!
//! 根据输入路径和模式收集结构文件列表。
//!
//! ## 功能
//! - 单文件直接返回（不检查模式）
//! - 目录内按 glob 模式匹配文件名，多个模式以逗号分隔
//! - 可选递归搜索，跟随符号链接
//! - 无法读取的目录项直接报错，不会悄悄漏掉数据点
//! - 结果按路径排序，数据点顺序稳定
//!
//! ## 依赖关系
//! - 被 `commands/input.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use fnet_ase::{FnetAseError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    FnetAseError::InvalidArgument(format!("Invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(FnetAseError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input)
            .max_depth(max_depth)
            .follow_links(true)
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.input.as_path()).display().to_string();
                FnetAseError::FileReadError {
                    path,
                    source: e.into(),
                }
            })?;
            if entry.file_type().is_file() && self.matches_patterns(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();

        Ok(files)
    }

    /// 检查文件名是否匹配任一模式；未设置模式时全部匹配
    fn matches_patterns(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }
}

/// 展开多个输入路径，去掉重复文件
pub fn collect_all(inputs: &[PathBuf], pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let collector = FileCollector::new(input.clone())
            .with_pattern(pattern)?
            .recursive(recursive);
        for file in collector.collect()? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    if files.is_empty() {
        return Err(FnetAseError::NoFilesFound {
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}
