//! # 内存文档模型
//!
//! 组按名字嵌套，路径以 `/` 分隔（如 `netstat/bpnn`）。
//! 数值数据集使用 `ndarray` 的动态维数组保存形状。
//!
//! ## 依赖关系
//! - 被 `store/memory.rs`, `store/hdf5.rs` 及各 schema 模块使用
//! - 使用 `ndarray`

use ndarray::{Array1, ArrayD, IxDyn};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// 属性值（标量按长度为 1 的向量保存）
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(String),
}

impl Attribute {
    pub fn int(value: i64) -> Self {
        Attribute::Int(vec![value])
    }

    pub fn float(value: f64) -> Self {
        Attribute::Float(vec![value])
    }

    pub fn text(value: impl Into<String>) -> Self {
        Attribute::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 标量整数；浮点值仅在为整数时接受
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(v) if v.len() == 1 => Some(v[0]),
            Attribute::Float(v) if v.len() == 1 && v[0].fract() == 0.0 => Some(v[0] as i64),
            _ => None,
        }
    }

    /// 逻辑值以整数 0/1 存储
    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|v| v != 0)
    }
}

/// 数据集内容
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
}

impl Data {
    /// 一维整数数据
    pub fn ints(values: Vec<i64>) -> Self {
        Data::Int(Array1::from(values).into_dyn())
    }

    /// 二维浮点数据（按行展开）
    pub fn floats_2d(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        ArrayD::from_shape_vec(IxDyn(&[rows, cols]), values)
            .ok()
            .map(Data::Float)
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Data::Int(a) => a.shape(),
            Data::Float(a) => a.shape(),
        }
    }

    /// 展开为整数；浮点数据必须全部为整数值
    pub fn to_ints(&self) -> Option<Vec<i64>> {
        match self {
            Data::Int(a) => Some(a.iter().copied().collect()),
            Data::Float(a) => a
                .iter()
                .map(|&x| if x.fract() == 0.0 { Some(x as i64) } else { None })
                .collect(),
        }
    }

    /// 转为浮点数组，保留形状
    pub fn to_floats(&self) -> ArrayD<f64> {
        match self {
            Data::Int(a) => a.mapv(|x| x as f64),
            Data::Float(a) => a.clone(),
        }
    }
}

/// 数据集
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub data: Data,
    pub attrs: BTreeMap<String, Attribute>,
}

impl Dataset {
    pub fn new(data: Data) -> Self {
        Dataset {
            data,
            attrs: BTreeMap::new(),
        }
    }
}

/// 组
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub attrs: BTreeMap<String, Attribute>,
    pub groups: BTreeMap<String, Group>,
    pub datasets: BTreeMap<String, Dataset>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl Group {
    /// 按路径查找子组
    pub fn group(&self, path: &str) -> Option<&Group> {
        split_path(path)
            .into_iter()
            .try_fold(self, |group, name| group.groups.get(name))
    }

    /// 按路径查找数据集
    pub fn dataset(&self, path: &str) -> Option<&Dataset> {
        let parts = split_path(path);
        let (name, parents) = parts.split_last()?;
        let parent = parents
            .iter()
            .try_fold(self, |group, p| group.groups.get(*p))?;
        parent.datasets.get(*name)
    }

    /// 路径上是否存在组或数据集
    pub fn contains(&self, path: &str) -> bool {
        self.group(path).is_some() || self.dataset(path).is_some()
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(name)
    }

    /// 按路径获取子组，不存在则逐级创建
    pub fn ensure_group(&mut self, path: &str) -> &mut Group {
        split_path(path)
            .into_iter()
            .fold(self, |group, name| group.groups.entry(name.to_string()).or_default())
    }

    pub fn set_attr(&mut self, name: &str, value: Attribute) -> &mut Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn set_dataset(&mut self, name: &str, data: Data) -> &mut Self {
        self.datasets.insert(name.to_string(), Dataset::new(data));
        self
    }
}

/// 层次化文档（根组）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub root: Group,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }
}

impl Deref for Document {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.root
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Group {
        &mut self.root
    }
}
