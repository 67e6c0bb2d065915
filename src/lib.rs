//! # fnet-ase - Fortnet 文件式计算器
//!
//! 以文件为媒介驱动 Fortnet 神经网络预测程序：校验 netstat、
//! 生成 HSD 输入与数据集、调用外部程序、读取能量和力。
//!
//! ## 依赖关系
//! ```text
//! calculator
//!   ├── netstat    (网络状态校验)
//!   ├── input      (HSD 输入生成, parsers/hsd.rs)
//!   ├── dataset    (fnetdata.hdf5 布局)
//!   ├── fnetout    (fnetout.hdf5 读取)
//!   └── store      (层次化文档与后端)
//! units, elements, models, parsers, error
//! ```
//!
//! ## 示例
//! ```no_run
//! use fnet_ase::{CalculatorConfig, Fortnet, MemoryBackend, Property, Structure};
//!
//! # fn main() -> fnet_ase::Result<()> {
//! let backend = MemoryBackend::new();
//! let mut calc = Fortnet::new(&backend, CalculatorConfig::new().restart("fortnet.hdf5"))?;
//! let atoms = Structure::from_symbols("CO", &["C", "O"], vec![[0.0; 3], [0.0, 0.0, 1.13]])?;
//! let result = calc.calculate(&atoms, &[Property::Energy])?;
//! println!("{} eV", result.energy);
//! # Ok(())
//! # }
//! ```

pub mod calculator;
pub mod dataset;
pub mod elements;
pub mod error;
pub mod fnetout;
pub mod input;
pub mod models;
pub mod netstat;
pub mod parsers;
pub mod store;
pub mod units;

pub use calculator::{CalculatorConfig, CalculatorState, Fortnet};
pub use error::{FnetAseError, Result};
pub use models::{Lattice, PredictionResult, Property, Structure, SystemChange};
pub use netstat::{check_netstat, NetworkState};
pub use store::{Backend, Document, MemoryBackend};
#[cfg(feature = "hdf5")]
pub use store::Hdf5Backend;
