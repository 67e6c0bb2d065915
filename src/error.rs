//! # 统一错误处理模块
//!
//! 定义 fnet-ase 的所有错误类型，使用 `thiserror` 派生。
//!
//! 配置类错误（netstat 文件不满足要求、差分步长非法、输出缺少力等）
//! 一律在调用 Fortnet 之前或读取结果时立即抛出，不做任何重试。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// fnet-ase 统一错误类型
#[derive(Error, Debug)]
pub enum FnetAseError {
    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Specified Fortnet netstat file at '{path}' is not present.")]
    NetstatNotFound { path: String },

    #[error("Error while reading netstat file '{path}'. No network group/information present.")]
    NoNetworkInformation { path: String },

    #[error(
        "Error while reading netstat file '{path}'. Only networks trained on global properties \
         supported (found target type '{found}')."
    )]
    UnsupportedTargetType { path: String, found: String },

    #[error(
        "Error while reading netstat file '{path}'. Only networks trained on a single global \
         property are supported ({element} sub-network has {outputs} outputs)."
    )]
    UnsupportedTopology {
        path: String,
        element: String,
        outputs: i64,
    },

    #[error(
        "Error while reading netstat file '{path}'. Calculation of forces is only supported in \
         combination with ACSF input features."
    )]
    ForcesRequireAcsf { path: String },

    #[error(
        "Error while reading netstat file '{path}'. Calculation of forces is only supported for \
         purely ACSF based input features."
    )]
    ForcesWithExternalFeatures { path: String },

    #[error("Error while reading netstat file '{path}'. {reason}")]
    MalformedNetstat { path: String, reason: String },

    #[error("Error while processing finite difference delta {0}. Must be positive.")]
    InvalidFiniteDifferenceDelta(f64),

    #[error(
        "Error while reading {path} file. Forces requested by the calculator but not present in \
         output."
    )]
    ForcesNotInOutput { path: String },

    #[error("Error while reading {path} file. {reason}")]
    MalformedOutput { path: String, reason: String },

    #[error("Invalid calculator state: {0}")]
    InvalidState(String),

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Storage backend error for '{path}': {reason}")]
    StorageError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to launch external command '{command}'")]
    CommandLaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External command failed: {command} (exit status {status}), see '{output}'")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数与 CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },
}

impl FnetAseError {
    /// 是否属于配置类错误（无效的 netstat、参数或结果不匹配）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FnetAseError::NetstatNotFound { .. }
                | FnetAseError::NoNetworkInformation { .. }
                | FnetAseError::UnsupportedTargetType { .. }
                | FnetAseError::UnsupportedTopology { .. }
                | FnetAseError::ForcesRequireAcsf { .. }
                | FnetAseError::ForcesWithExternalFeatures { .. }
                | FnetAseError::MalformedNetstat { .. }
                | FnetAseError::InvalidFiniteDifferenceDelta(_)
                | FnetAseError::ForcesNotInOutput { .. }
                | FnetAseError::MalformedOutput { .. }
                | FnetAseError::InvalidState(_)
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, FnetAseError>;
