//! # Netstat 文件映射与校验
//!
//! netstat 是 Fortnet 训练得到的网络状态文件。本模块分两层：
//! - schema 映射：[`NetworkState::from_document`] 把层次化文档中的
//!   `netstat/bpnn`、`<element>-subnetwork/topology`、`netstat/mapping`、
//!   `netstat/external` 转成强类型结构；
//! - 校验：[`NetworkState::validate`] 判断该网络能否用于单个全局量
//!   （能量）的预测，以及在请求力时能否做有限差分。
//!
//! ## 文件布局
//! ```text
//! /netstat/bpnn                        attrs: targettype
//! /netstat/bpnn/atomicnumbers          int[nspecies]
//! /netstat/bpnn/<element>-subnetwork/topology   int[nlayers]
//! /netstat/mapping                     (可选) ACSF 结构特征
//! /netstat/external                    (可选) 外部原子特征
//! ```
//!
//! ## 依赖关系
//! - 被 `calculator` 和 `commands/check.rs` 使用
//! - 使用 `store`, `elements`

use crate::elements;
use crate::error::{FnetAseError, Result};
use crate::store::{Backend, Document, Group};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const BPNN_GROUP: &str = "netstat/bpnn";
const MAPPING_GROUP: &str = "netstat/mapping";
const EXTERNAL_GROUP: &str = "netstat/external";

/// 唯一支持的目标类型
pub const GLOBAL_TARGET: &str = "global";

/// 单个物种的子网络
#[derive(Debug, Clone, PartialEq)]
pub struct SubNetwork {
    /// 元素符号
    pub element: &'static str,

    /// 各层神经元数，最后一层为输出宽度
    pub topology: Vec<i64>,
}

impl SubNetwork {
    /// 输出层宽度
    pub fn outputs(&self) -> Option<i64> {
        self.topology.last().copied()
    }
}

/// Behler-Parrinello 网络信息
#[derive(Debug, Clone, PartialEq)]
pub struct BpnnNetwork {
    /// 目标类型（原样保存，比较时去空白、忽略大小写）
    pub target_type: String,

    /// 按原子序数升序排列的子网络
    pub subnetworks: BTreeMap<u32, SubNetwork>,
}

impl BpnnNetwork {
    /// 训练过的原子序数（升序）
    pub fn atomic_numbers(&self) -> Vec<u32> {
        self.subnetworks.keys().copied().collect()
    }

    pub fn is_global(&self) -> bool {
        self.target_type.trim().eq_ignore_ascii_case(GLOBAL_TARGET)
    }
}

/// netstat 文件中与预测相关的部分
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    /// 文件路径（用于错误信息）
    pub path: PathBuf,

    /// 网络信息，缺失时为 None
    pub network: Option<BpnnNetwork>,

    /// 是否包含 ACSF 结构特征映射
    pub has_mapping: bool,

    /// 是否包含外部原子特征
    pub has_external: bool,
}

impl NetworkState {
    /// 通过后端读取 netstat 文件
    pub fn load<B: Backend + ?Sized>(backend: &B, path: &Path) -> Result<Self> {
        if !backend.exists(path) {
            return Err(FnetAseError::NetstatNotFound {
                path: path.display().to_string(),
            });
        }
        let document = backend.load(path)?;
        NetworkState::from_document(path, &document)
    }

    /// 从层次化文档映射为强类型结构
    pub fn from_document(path: &Path, document: &Document) -> Result<Self> {
        let network = match document.group(BPNN_GROUP) {
            Some(bpnn) => Some(read_bpnn(path, bpnn)?),
            None => None,
        };

        Ok(NetworkState {
            path: path.to_path_buf(),
            network,
            has_mapping: document.contains(MAPPING_GROUP),
            has_external: document.contains(EXTERNAL_GROUP),
        })
    }

    /// 检查网络是否满足预测要求
    ///
    /// 依次检查：网络信息存在、目标类型为 global、每个物种子网络只有
    /// 一个输出；请求力时还要求存在 ACSF 映射且没有外部特征。
    pub fn validate(&self, forces: bool) -> Result<()> {
        let path = self.path.display().to_string();

        let network = self
            .network
            .as_ref()
            .ok_or_else(|| FnetAseError::NoNetworkInformation { path: path.clone() })?;

        if !network.is_global() {
            return Err(FnetAseError::UnsupportedTargetType {
                path,
                found: network.target_type.trim().to_string(),
            });
        }

        for subnet in network.subnetworks.values() {
            let outputs = subnet.outputs().unwrap_or(0);
            if outputs != 1 {
                return Err(FnetAseError::UnsupportedTopology {
                    path,
                    element: subnet.element.to_string(),
                    outputs,
                });
            }
        }

        if forces && !self.has_mapping {
            return Err(FnetAseError::ForcesRequireAcsf { path });
        }

        if forces && self.has_external {
            return Err(FnetAseError::ForcesWithExternalFeatures { path });
        }

        debug!(
            "Netstat '{}' accepted (species: {:?}, forces: {})",
            path,
            network.atomic_numbers(),
            forces
        );
        Ok(())
    }
}

/// 读取并校验 netstat 文件，每次生成输入前调用
pub fn check_netstat<B: Backend + ?Sized>(
    backend: &B,
    path: &Path,
    forces: bool,
) -> Result<NetworkState> {
    let state = NetworkState::load(backend, path)?;
    state.validate(forces)?;
    Ok(state)
}

fn malformed(path: &Path, reason: impl Into<String>) -> FnetAseError {
    FnetAseError::MalformedNetstat {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn read_bpnn(path: &Path, bpnn: &Group) -> Result<BpnnNetwork> {
    let target_type = bpnn
        .attr("targettype")
        .and_then(|a| a.as_text())
        .ok_or_else(|| malformed(path, "Missing 'targettype' attribute of the bpnn group."))?
        .to_string();

    let mut network = BpnnNetwork {
        target_type,
        subnetworks: BTreeMap::new(),
    };
    // 目标类型不受支持时不再读取子网络，由 validate 报告类型错误
    if !network.is_global() {
        return Ok(network);
    }

    let mut numbers = bpnn
        .datasets
        .get("atomicnumbers")
        .and_then(|d| d.data.to_ints())
        .ok_or_else(|| malformed(path, "Missing 'atomicnumbers' of the bpnn group."))?;
    numbers.sort_unstable();

    for number in numbers {
        let atomic_number = u32::try_from(number)
            .ok()
            .filter(|&z| z >= 1 && z <= elements::MAX_ATOMIC_NUMBER)
            .ok_or_else(|| malformed(path, format!("Invalid atomic number {}.", number)))?;

        // 上面已限定范围，符号与组名必然存在
        let element = elements::symbol(atomic_number).unwrap_or("X");
        let group_name = elements::subnetwork_name(atomic_number).unwrap_or_default();

        let topology = bpnn
            .group(&group_name)
            .and_then(|g| g.datasets.get("topology"))
            .and_then(|d| d.data.to_ints())
            .ok_or_else(|| {
                malformed(
                    path,
                    format!("Missing topology of sub-network '{}'.", group_name),
                )
            })?;

        network
            .subnetworks
            .insert(atomic_number, SubNetwork { element, topology });
    }

    Ok(network)
}
