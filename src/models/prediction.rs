//! # 预测结果数据模型
//!
//! 可请求的物理量以及一次预测得到的能量/力。
//!
//! ## 依赖关系
//! - 被 `fnetout`, `calculator` 和 `commands/` 使用

use crate::error::FnetAseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 计算器可提供的物理量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Property {
    Energy,
    Forces,
}

impl Property {
    /// 已实现的物理量
    pub const IMPLEMENTED: [Property; 2] = [Property::Energy, Property::Forces];
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::Energy => write!(f, "energy"),
            Property::Forces => write!(f, "forces"),
        }
    }
}

impl FromStr for Property {
    type Err = FnetAseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "energy" => Ok(Property::Energy),
            "forces" => Ok(Property::Forces),
            other => Err(FnetAseError::InvalidArgument(format!(
                "Property '{}' is not implemented by the Fortnet calculator",
                other
            ))),
        }
    }
}

/// 一次预测的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 能量 (eV)
    pub energy: f64,

    /// 每原子的力 (eV/Å)，仅在请求时存在
    pub forces: Option<Vec<[f64; 3]>>,
}

impl PredictionResult {
    /// 结果中是否包含给定物理量
    pub fn provides(&self, property: Property) -> bool {
        match property {
            Property::Energy => true,
            Property::Forces => self.forces.is_some(),
        }
    }

    /// 最大力分量模长 (eV/Å)
    pub fn max_force(&self) -> Option<f64> {
        self.forces.as_ref().map(|forces| {
            forces
                .iter()
                .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
                .fold(0.0, f64::max)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_parse() {
        assert_eq!("Energy".parse::<Property>().unwrap(), Property::Energy);
        assert_eq!("forces".parse::<Property>().unwrap(), Property::Forces);
        assert!("stress".parse::<Property>().is_err());
    }

    #[test]
    fn test_provides_and_max_force() {
        let result = PredictionResult {
            energy: -1.0,
            forces: Some(vec![[3.0, 4.0, 0.0], [0.0, 0.0, 1.0]]),
        };
        assert!(result.provides(Property::Forces));
        assert_eq!(result.max_force(), Some(5.0));

        let energy_only = PredictionResult {
            energy: -1.0,
            forces: None,
        };
        assert!(!energy_only.provides(Property::Forces));
        assert!(energy_only.max_force().is_none());
    }
}
