//! # predict 命令实现
//!
//! 对单个结构运行一次完整的 Fortnet 预测并输出能量与力。
//!
//! ## 功能
//! - 解析结构文件
//! - 写输入、运行 Fortnet（显示 spinner）、读取结果
//! - 力表格与最大力
//! - 可选 CSV 导出
//!
//! ## 依赖关系
//! - 使用 `cli/predict.rs` 定义的参数
//! - 使用 `fnet_ase::calculator`, `fnet_ase::parsers`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::predict::PredictArgs;
use crate::utils::{output, progress};

use fnet_ase::parsers;
use fnet_ase::{
    CalculatorConfig, FnetAseError, Fortnet, Hdf5Backend, PredictionResult, Property, Result,
    Structure,
};
use std::path::Path;
use tabled::{Table, Tabled};

/// 力表格行
#[derive(Debug, Clone, Tabled)]
struct ForceRow {
    #[tabled(rename = "Atom")]
    index: usize,
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Fx (eV/Å)")]
    fx: String,
    #[tabled(rename = "Fy (eV/Å)")]
    fy: String,
    #[tabled(rename = "Fz (eV/Å)")]
    fz: String,
}

fn force_rows(atoms: &Structure, forces: &[[f64; 3]]) -> Vec<ForceRow> {
    atoms
        .symbols()
        .into_iter()
        .zip(forces)
        .enumerate()
        .map(|(i, (element, f))| ForceRow {
            index: i + 1,
            element: element.to_string(),
            fx: format!("{:.6}", f[0]),
            fy: format!("{:.6}", f[1]),
            fz: format!("{:.6}", f[2]),
        })
        .collect()
}

/// 执行 predict 命令
pub fn execute(args: PredictArgs) -> Result<()> {
    output::print_header("Fortnet Prediction");

    let atoms = parsers::parse_structure_file(&args.structure)?;
    output::print_info(&format!(
        "Structure '{}': {} ({} atoms)",
        atoms.name,
        atoms.formula(),
        atoms.len()
    ));

    let mut config = CalculatorConfig::new()
        .label(args.label.as_str())
        .restart(&args.netstat)
        .directory(&args.dir);
    if let Some(delta) = args.delta {
        config = config.finite_diff_delta(Some(delta));
    }
    if let Some(command) = args.command {
        config = config.command(command);
    }

    let mut calc = Fortnet::new(Hdf5Backend, config)?;

    let properties: &[Property] = if args.forces {
        &[Property::Energy, Property::Forces]
    } else {
        &[Property::Energy]
    };
    calc.write_input(&atoms, properties)?;
    output::print_success(&format!("Input written to '{}'", calc.directory().display()));

    let spinner = progress::create_spinner(&format!("Running '{}'", calc.command()));
    let run = calc.execute();
    spinner.finish_and_clear();
    run?;
    output::print_success(&format!(
        "Fortnet finished, log in '{}'",
        calc.output_path().display()
    ));

    let result = calc.read_results()?.clone();

    println!();
    output::print_value("Energy (eV)", &format!("{:.8}", result.energy));
    if let Some(forces) = &result.forces {
        if let Some(max_force) = result.max_force() {
            output::print_value("Max force (eV/Å)", &format!("{:.6}", max_force));
        }
        println!("\n{}", Table::new(force_rows(&atoms, forces)));
    }

    if let Some(csv_path) = &args.csv {
        save_results_csv(&atoms, &result, csv_path)?;
        output::print_success(&format!("Results saved to '{}'", csv_path.display()));
    }

    output::print_done("Prediction complete");
    Ok(())
}

/// 保存结果到 CSV：每个原子一行；只有能量时写一行
fn save_results_csv(atoms: &Structure, result: &PredictionResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "structure",
        "energy_eV",
        "atom",
        "element",
        "fx_eV_per_A",
        "fy_eV_per_A",
        "fz_eV_per_A",
    ])?;

    let energy = format!("{:.10}", result.energy);
    match &result.forces {
        Some(forces) => {
            for (i, (element, f)) in atoms.symbols().into_iter().zip(forces).enumerate() {
                wtr.write_record([
                    atoms.name.clone(),
                    energy.clone(),
                    (i + 1).to_string(),
                    element.to_string(),
                    format!("{:.10}", f[0]),
                    format!("{:.10}", f[1]),
                    format!("{:.10}", f[2]),
                ])?;
            }
        }
        None => {
            wtr.write_record([
                atoms.name.as_str(),
                energy.as_str(),
                "",
                "",
                "",
                "",
                "",
            ])?;
        }
    }

    wtr.flush().map_err(|e| FnetAseError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
