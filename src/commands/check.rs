//! # check 命令实现
//!
//! 读取并校验 netstat 文件，列出各物种子网络的拓扑。
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `fnet_ase::netstat`
//! - 使用 `utils/output.rs`

use crate::cli::check::CheckArgs;
use crate::utils::output;

use fnet_ase::netstat::BpnnNetwork;
use fnet_ase::{check_netstat, Hdf5Backend, Result};
use tabled::{Table, Tabled};

/// 子网络表格行
#[derive(Debug, Clone, Tabled)]
struct SubNetworkRow {
    #[tabled(rename = "Z")]
    number: u32,
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Topology")]
    topology: String,
    #[tabled(rename = "Outputs")]
    outputs: i64,
}

fn subnetwork_rows(network: &BpnnNetwork) -> Vec<SubNetworkRow> {
    network
        .subnetworks
        .iter()
        .map(|(&number, subnet)| SubNetworkRow {
            number,
            element: subnet.element.to_string(),
            topology: subnet
                .topology
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" -> "),
            outputs: subnet.outputs().unwrap_or(0),
        })
        .collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    output::print_header("Fortnet Netstat Check");

    let state = check_netstat(&Hdf5Backend, &args.netstat, args.forces)?;
    output::print_success(&format!(
        "'{}' is usable for {} predictions",
        args.netstat.display(),
        if args.forces { "energy and force" } else { "energy" }
    ));

    let Some(network) = &state.network else {
        return Ok(());
    };

    println!();
    output::print_value("Target type", network.target_type.trim());
    output::print_value("ACSF mapping", yes_no(state.has_mapping));
    output::print_value("External features", yes_no(state.has_external));
    println!();

    println!("{}", Table::new(subnetwork_rows(network)));

    if !args.forces && (!state.has_mapping || state.has_external) {
        output::print_warning("This network cannot be used to predict forces");
    }

    Ok(())
}
