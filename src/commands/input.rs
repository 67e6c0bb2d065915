//! # input 命令实现
//!
//! 把一个或多个结构写成 Fortnet 输入（fortnet_in.hsd + fnetdata.hdf5），
//! 不运行 Fortnet。多个结构按路径顺序写成多个数据点。
//!
//! ## 依赖关系
//! - 使用 `cli/input.rs` 定义的参数
//! - 使用 `batch/collector.rs` 收集文件
//! - 使用 `fnet_ase` 的 netstat, input, dataset, parsers
//! - 使用 `utils/output.rs`

use crate::batch::collector;
use crate::cli::input::InputArgs;
use crate::utils::output;

use fnet_ase::dataset::dataset_document;
use fnet_ase::input::{
    delta_to_bohr, netstat_for_directory, FortnetInput, PredictionRequest, FNETDATA,
};
use fnet_ase::parsers::{self, hsd::write_hsd_file};
use fnet_ase::{check_netstat, Backend, FnetAseError, Hdf5Backend, Result, Structure};
use std::fs;
use tabled::{Table, Tabled};

/// 结构表格行
#[derive(Debug, Clone, Tabled)]
struct StructureRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Structure")]
    name: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Periodic")]
    periodic: String,
}

fn structure_rows(structures: &[Structure]) -> Vec<StructureRow> {
    structures
        .iter()
        .enumerate()
        .map(|(i, s)| StructureRow {
            index: i + 1,
            name: s.name.clone(),
            formula: s.formula(),
            atoms: s.len(),
            periodic: s
                .pbc
                .iter()
                .map(|&p| if p { "T" } else { "F" })
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect()
}

/// 执行 input 命令
pub fn execute(args: InputArgs) -> Result<()> {
    output::print_header("Writing Fortnet Input");

    let files = collector::collect_all(&args.structures, &args.pattern, args.recursive)?;
    output::print_info(&format!("Found {} structure files", files.len()));

    let structures = files
        .iter()
        .map(|f| parsers::parse_structure_file(f))
        .collect::<Result<Vec<_>>>()?;

    let delta = args.delta.map(delta_to_bohr).transpose()?;

    let backend = Hdf5Backend;
    check_netstat(&backend, &args.netstat, args.forces)?;

    let netstat = netstat_for_directory(&args.netstat, &args.dir)?;
    let mut request = PredictionRequest::new(netstat, args.forces);
    if let Some(delta) = delta {
        request = request.with_delta(delta);
    }
    let input = FortnetInput::for_prediction(&request)?;
    let dataset = dataset_document(&structures)?;

    fs::create_dir_all(&args.dir).map_err(|e| FnetAseError::FileWriteError {
        path: args.dir.display().to_string(),
        source: e,
    })?;

    let input_path = FortnetInput::path_in(&args.dir);
    write_hsd_file(&input.to_hsd(), &input_path)?;
    output::print_written("input", &input_path.display().to_string());

    let dataset_path = args.dir.join(FNETDATA);
    backend.save(&dataset_path, &dataset)?;
    output::print_written("dataset", &dataset_path.display().to_string());

    println!("\n{}", Table::new(structure_rows(&structures)));

    if args.forces && args.delta.is_none() {
        output::print_warning("No --delta given, Fortnet uses its default finite difference step");
    }

    output::print_done(&format!("{} datapoints written", structures.len()));
    Ok(())
}
