//! # Fortnet 输入生成
//!
//! 根据预测请求生成 Fortnet 的 HSD 输入：
//!
//! ```text
//! Options {
//!   Mode = "predict"
//!   ReadNetStats = Yes
//!   WriteIterationTrajectory = No
//! }
//! Data {
//!   Dataset = "fnetdata.hdf5"
//!   NetstatFile = "fortnet.hdf5"
//! }
//! Analysis {                      # 仅在请求力时
//!   Forces {
//!     FiniteDifferences {
//!       Delta = 1.8897261254578282e-2   # 可选, Bohr
//!     }
//!   }
//! }
//! ```
//!
//! 本模块只整理数据，不做单位换算，也不写文件。
//!
//! ## 依赖关系
//! - 被 `calculator` 和 `commands/input.rs` 使用
//! - 使用 `parsers/hsd.rs`

use crate::error::{FnetAseError, Result};
use crate::parsers::hsd::{HsdBlock, HsdValue};
use crate::units::angstrom_to_bohr;
use std::path::{Path, PathBuf};

/// 输入文件名
pub const INPUT_FILE: &str = "fortnet_in.hsd";

/// 数据集文件名
pub const FNETDATA: &str = "fnetdata.hdf5";

const PREDICT_MODE: &str = "predict";

/// 一次预测的请求参数
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// netstat 文件路径
    pub netstat: PathBuf,

    /// 有限差分步长（已是 Fortnet 使用的单位）
    pub finite_diff_delta: Option<f64>,

    /// 是否请求力
    pub forces: bool,
}

impl PredictionRequest {
    pub fn new(netstat: impl Into<PathBuf>, forces: bool) -> Self {
        PredictionRequest {
            netstat: netstat.into(),
            finite_diff_delta: None,
            forces,
        }
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.finite_diff_delta = Some(delta);
        self
    }
}

/// 有限差分力分析设置
#[derive(Debug, Clone, PartialEq)]
pub struct ForceAnalysis {
    /// 步长；None 时由 Fortnet 使用默认值
    pub delta: Option<f64>,
}

/// Fortnet 预测输入
#[derive(Debug, Clone, PartialEq)]
pub struct FortnetInput {
    pub mode: String,
    pub read_netstats: bool,
    pub write_iteration_trajectory: bool,
    pub dataset: String,
    pub netstat_file: String,
    pub forces: Option<ForceAnalysis>,
}

impl FortnetInput {
    /// 生成预测输入；显式给出的步长必须为正
    pub fn for_prediction(request: &PredictionRequest) -> Result<Self> {
        if let Some(delta) = request.finite_diff_delta {
            if !(delta > 0.0) {
                return Err(FnetAseError::InvalidFiniteDifferenceDelta(delta));
            }
        }

        let netstat_file = request.netstat.display().to_string();
        if netstat_file.contains('"') && netstat_file.contains('\'') {
            return Err(FnetAseError::InvalidArgument(format!(
                "Netstat path '{}' contains both quote characters and cannot be written to HSD",
                netstat_file
            )));
        }

        let forces = request.forces.then(|| ForceAnalysis {
            delta: request.finite_diff_delta,
        });

        Ok(FortnetInput {
            mode: PREDICT_MODE.to_string(),
            read_netstats: true,
            write_iteration_trajectory: false,
            dataset: FNETDATA.to_string(),
            netstat_file,
            forces,
        })
    }

    /// 转为 HSD 树
    pub fn to_hsd(&self) -> HsdBlock {
        let mut root = HsdBlock::new();

        root.block_mut("Options")
            .set("Mode", HsdValue::Text(self.mode.clone()))
            .set("ReadNetStats", HsdValue::Logical(self.read_netstats))
            .set(
                "WriteIterationTrajectory",
                HsdValue::Logical(self.write_iteration_trajectory),
            );

        root.block_mut("Data")
            .set("Dataset", HsdValue::Text(self.dataset.clone()))
            .set("NetstatFile", HsdValue::Text(self.netstat_file.clone()));

        if let Some(analysis) = &self.forces {
            let finite_diff = root
                .block_mut("Analysis")
                .block_mut("Forces")
                .block_mut("FiniteDifferences");
            if let Some(delta) = analysis.delta {
                finite_diff.set("Delta", HsdValue::Real(delta));
            }
        }

        root
    }

    /// 从 HSD 树读回
    pub fn from_hsd(root: &HsdBlock) -> Result<Self> {
        let text = |path: &str| -> Result<String> {
            root.value(path)
                .and_then(|v| v.as_text())
                .map(str::to_string)
                .ok_or_else(|| missing_key(path))
        };
        let logical = |path: &str, default: bool| -> Result<bool> {
            match root.value(path) {
                None => Ok(default),
                Some(v) => v.as_logical().ok_or_else(|| missing_key(path)),
            }
        };

        let forces = match root.block("Analysis/Forces/FiniteDifferences") {
            Some(block) => Some(ForceAnalysis {
                delta: match block.value("Delta") {
                    None => None,
                    Some(v) => Some(v.as_real().ok_or_else(|| missing_key("Delta"))?),
                },
            }),
            None => None,
        };

        Ok(FortnetInput {
            mode: text("Options/Mode")?,
            read_netstats: logical("Options/ReadNetStats", false)?,
            write_iteration_trajectory: logical("Options/WriteIterationTrajectory", true)?,
            dataset: text("Data/Dataset")?,
            netstat_file: text("Data/NetstatFile")?,
            forces,
        })
    }

    /// 输入文件在工作目录中的位置
    pub fn path_in(directory: &Path) -> PathBuf {
        directory.join(INPUT_FILE)
    }
}

/// 校验以 Å 给出的步长并换算为 Bohr；错误信息保留 Å 值
pub fn delta_to_bohr(delta: f64) -> Result<f64> {
    if !(delta > 0.0) {
        return Err(FnetAseError::InvalidFiniteDifferenceDelta(delta));
    }
    Ok(angstrom_to_bohr(delta))
}

/// 写入输入的 netstat 路径
///
/// Fortnet 在 `directory` 中运行，相对路径在工作目录不是 `.` 时相对当前目录补全。
pub fn netstat_for_directory(netstat: &Path, directory: &Path) -> Result<PathBuf> {
    if netstat.is_absolute() || directory == Path::new(".") {
        return Ok(netstat.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| FnetAseError::FileReadError {
        path: ".".to_string(),
        source: e,
    })?;
    Ok(cwd.join(netstat))
}

fn missing_key(path: &str) -> FnetAseError {
    FnetAseError::ParseError {
        format: "hsd".to_string(),
        path: INPUT_FILE.to_string(),
        reason: format!("Missing or invalid entry '{}'", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{AA_BOHR, BOHR_AA};

    #[test]
    fn test_energy_only_has_no_analysis_block() {
        let input = FortnetInput::for_prediction(&PredictionRequest::new("fortnet.hdf5", false))
            .unwrap();
        let hsd = input.to_hsd();

        assert_eq!(hsd.value("Options/Mode").and_then(|v| v.as_text()), Some("predict"));
        assert_eq!(
            hsd.value("Options/ReadNetStats").and_then(|v| v.as_logical()),
            Some(true)
        );
        assert_eq!(
            hsd.value("Options/WriteIterationTrajectory").and_then(|v| v.as_logical()),
            Some(false)
        );
        assert_eq!(
            hsd.value("Data/Dataset").and_then(|v| v.as_text()),
            Some("fnetdata.hdf5")
        );
        assert_eq!(
            hsd.value("Data/NetstatFile").and_then(|v| v.as_text()),
            Some("fortnet.hdf5")
        );
        assert!(hsd.get("Analysis").is_none());
    }

    #[test]
    fn test_forces_without_delta_emit_empty_block() {
        let input =
            FortnetInput::for_prediction(&PredictionRequest::new("net.hdf5", true)).unwrap();
        let hsd = input.to_hsd();
        let block = hsd.block("Analysis/Forces/FiniteDifferences").unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn test_positive_delta_preserved_in_caller_units() {
        for delta_aa in [1e-4, 0.01, 0.25, 3.0] {
            let request = PredictionRequest::new("net.hdf5", true).with_delta(delta_aa * AA_BOHR);
            let hsd = FortnetInput::for_prediction(&request).unwrap().to_hsd();
            let delta = hsd
                .value("Analysis/Forces/FiniteDifferences/Delta")
                .and_then(|v| v.as_real())
                .unwrap();
            assert!(((delta * BOHR_AA) - delta_aa).abs() <= 1e-12 * delta_aa);
        }
    }

    #[test]
    fn test_non_positive_delta_rejected() {
        for delta in [0.0, -0.01, f64::NAN] {
            for forces in [true, false] {
                let request = PredictionRequest::new("net.hdf5", forces).with_delta(delta);
                let err = FortnetInput::for_prediction(&request).unwrap_err();
                assert!(matches!(err, FnetAseError::InvalidFiniteDifferenceDelta(_)));
                assert!(err.is_configuration());
            }
        }
    }

    #[test]
    fn test_netstat_path_resolution() {
        let net = Path::new("fortnet.hdf5");
        assert_eq!(netstat_for_directory(net, Path::new(".")).unwrap(), net);
        let resolved = netstat_for_directory(net, Path::new("run")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("fortnet.hdf5"));

        let absolute = Path::new("/nets/fortnet.hdf5");
        assert_eq!(netstat_for_directory(absolute, Path::new("run")).unwrap(), absolute);
    }

    #[test]
    fn test_delta_checked_in_angstrom() {
        assert!((delta_to_bohr(0.01).unwrap() - 0.01 * AA_BOHR).abs() < 1e-15);
        for delta in [-0.5, 0.0, f64::NAN] {
            let err = delta_to_bohr(delta).unwrap_err();
            assert!(matches!(err, FnetAseError::InvalidFiniteDifferenceDelta(_)));
        }
        let err = delta_to_bohr(-0.5).unwrap_err();
        assert!(err.to_string().contains("-0.5"));
    }

    #[test]
    fn test_quoted_netstat_path_reads_back() {
        let request = PredictionRequest::new("nets/\"best\" model.hdf5", false);
        let input = FortnetInput::for_prediction(&request).unwrap();
        let text = input.to_hsd().to_string();
        assert!(text.contains("'nets/\"best\" model.hdf5'"));

        let parsed = HsdBlock::parse(&text).unwrap();
        assert_eq!(FortnetInput::from_hsd(&parsed).unwrap(), input);

        let request = PredictionRequest::new("it's \"best\".hdf5", false);
        let err = FortnetInput::for_prediction(&request).unwrap_err();
        assert!(matches!(err, FnetAseError::InvalidArgument(_)));
    }

    #[test]
    fn test_hsd_text_reads_back() {
        let request = PredictionRequest::new("models/fortnet.hdf5", true).with_delta(0.02);
        let input = FortnetInput::for_prediction(&request).unwrap();
        let parsed = HsdBlock::parse(&input.to_hsd().to_string()).unwrap();
        assert_eq!(FortnetInput::from_hsd(&parsed).unwrap(), input);
    }
}
