//! # Fortnet 计算器
//!
//! 以文件为媒介驱动外部 Fortnet 程序：写输入 → 运行 → 读结果。
//!
//! ## 生命周期
//! ```text
//! Ready { atoms } ──write_input──▶ AwaitingResults { written }
//!        ▲                                  │
//!        └──────────── read_results ────────┘
//! ```
//! 等待结果期间不持有"当前结构"，因此旧结果不会被误当作新结构的结果。
//! `read_results` 成功后删除 fnetout.hdf5；失败时保留文件以便检查，
//! 下一次 `write_input` 会清理残留的输出。
//!
//! ## 依赖关系
//! - 被 `commands/predict.rs` 使用
//! - 使用 `netstat`, `input`, `dataset`, `fnetout`, `store`, `parsers/hsd.rs`

use crate::dataset::dataset_document;
use crate::error::{FnetAseError, Result};
use crate::fnetout::{FnetOutput, FNETOUT};
use crate::input::{
    delta_to_bohr, netstat_for_directory, FortnetInput, PredictionRequest, FNETDATA,
};
use crate::models::{PredictionResult, Property, Structure, SystemChange};
use crate::netstat::check_netstat;
use crate::parsers::hsd::write_hsd_file;
use crate::store::Backend;
use crate::units::angstrom_to_bohr;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// 外部程序命令的环境变量
pub const COMMAND_ENV: &str = "FORTNET_COMMAND";

/// 未指定命令且环境变量缺失时使用的可执行文件
pub const DEFAULT_COMMAND: &str = "fnet";

// ─────────────────────────────────────────────────────────────
// 配置
// ─────────────────────────────────────────────────────────────

/// 计算器配置
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorConfig {
    /// 主输出文件前缀 (`<label>.out`)
    pub label: String,

    /// netstat 文件路径
    pub restart: PathBuf,

    /// 有限差分步长 (Å)；None 时由 Fortnet 决定
    pub finite_diff_delta: Option<f64>,

    /// 外部命令；None 时读取 `FORTNET_COMMAND`
    pub command: Option<String>,

    /// 工作目录
    pub directory: PathBuf,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig {
            label: "fortnet".to_string(),
            restart: PathBuf::from("fortnet.hdf5"),
            finite_diff_delta: Some(0.01),
            command: None,
            directory: PathBuf::from("."),
        }
    }
}

impl CalculatorConfig {
    pub fn new() -> Self {
        CalculatorConfig::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn restart(mut self, restart: impl Into<PathBuf>) -> Self {
        self.restart = restart.into();
        self
    }

    pub fn finite_diff_delta(mut self, delta: Option<f64>) -> Self {
        self.finite_diff_delta = delta;
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }
}

/// 显式命令优先，其次环境变量，最后是 `fnet`
fn resolve_command(explicit: Option<String>, env: Option<String>) -> String {
    explicit
        .or(env)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COMMAND.to_string())
}

/// 单引号包裹，内部的 `'` 写成 `'\''`
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', "'\\''"))
}

// ─────────────────────────────────────────────────────────────
// 状态
// ─────────────────────────────────────────────────────────────

/// 计算器所处阶段
#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorState {
    /// 空闲；`atoms` 为上一次结果对应的结构
    Ready { atoms: Option<Structure> },

    /// 输入已写出，等待读取结果
    AwaitingResults { written: Structure },
}

impl CalculatorState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, CalculatorState::AwaitingResults { .. })
    }
}

// ─────────────────────────────────────────────────────────────
// 计算器
// ─────────────────────────────────────────────────────────────

/// Fortnet 计算器
#[derive(Debug)]
pub struct Fortnet<B: Backend> {
    backend: B,
    label: String,
    netstat: PathBuf,
    /// Å
    delta: Option<f64>,
    command: String,
    directory: PathBuf,
    forces: bool,
    state: CalculatorState,
    results: Option<PredictionResult>,
}

impl<B: Backend> Fortnet<B> {
    /// 创建计算器；netstat 文件必须已存在
    pub fn new(backend: B, config: CalculatorConfig) -> Result<Self> {
        if !backend.exists(&config.restart) {
            return Err(FnetAseError::NetstatNotFound {
                path: config.restart.display().to_string(),
            });
        }

        let command = resolve_command(config.command, std::env::var(COMMAND_ENV).ok());
        debug!(
            "Fortnet calculator '{}' (netstat: {}, command: {})",
            config.label,
            config.restart.display(),
            command
        );

        Ok(Fortnet {
            backend,
            label: config.label,
            netstat: config.restart,
            delta: config.finite_diff_delta,
            command,
            directory: config.directory,
            forces: false,
            state: CalculatorState::Ready { atoms: None },
            results: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn netstat(&self) -> &Path {
        &self.netstat
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 有限差分步长 (Bohr)
    pub fn finite_diff_delta(&self) -> Option<f64> {
        self.delta.map(angstrom_to_bohr)
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn results(&self) -> Option<&PredictionResult> {
        self.results.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 上一次结果对应的结构；等待结果期间为 None
    pub fn current_atoms(&self) -> Option<&Structure> {
        match &self.state {
            CalculatorState::Ready { atoms } => atoms.as_ref(),
            CalculatorState::AwaitingResults { .. } => None,
        }
    }

    /// 主输出文件路径
    pub fn output_path(&self) -> PathBuf {
        self.directory.join(format!("{}.out", self.label))
    }

    /// 写出 fortnet_in.hsd 与 fnetdata.hdf5
    pub fn write_input(&mut self, atoms: &Structure, properties: &[Property]) -> Result<()> {
        let forces = properties.contains(&Property::Forces);
        let delta = self.delta.map(delta_to_bohr).transpose()?;

        check_netstat(&self.backend, &self.netstat, forces)?;

        let mut request = PredictionRequest::new(
            netstat_for_directory(&self.netstat, &self.directory)?,
            forces,
        );
        if let Some(delta) = delta {
            request = request.with_delta(delta);
        }
        let input = FortnetInput::for_prediction(&request)?;
        let dataset = dataset_document(std::slice::from_ref(atoms))?;

        fs::create_dir_all(&self.directory).map_err(|e| FnetAseError::FileWriteError {
            path: self.directory.display().to_string(),
            source: e,
        })?;

        let input_path = FortnetInput::path_in(&self.directory);
        write_hsd_file(&input.to_hsd(), &input_path)?;
        debug!("Wrote {}", input_path.display());

        let dataset_path = self.directory.join(FNETDATA);
        self.backend.save(&dataset_path, &dataset)?;
        debug!("Wrote {}", dataset_path.display());

        self.results = None;

        let output_path = self.directory.join(FNETOUT);
        if self.backend.exists(&output_path) {
            warn!("Removing stale output {}", output_path.display());
            self.backend.remove(&output_path)?;
        }

        self.forces = forces;
        self.state = CalculatorState::AwaitingResults {
            written: atoms.clone(),
        };
        info!(
            "Input written for {} ({} atoms, forces: {})",
            atoms.formula(),
            atoms.len(),
            forces
        );
        Ok(())
    }

    /// 在工作目录中运行 `<command> > <label>.out`，阻塞到进程结束
    pub fn execute(&self) -> Result<()> {
        if !self.state.is_awaiting() {
            return Err(FnetAseError::InvalidState(
                "Fortnet can only run after input has been written".to_string(),
            ));
        }

        let output = shell_quote(&format!("{}.out", self.label));
        let command = format!("{} > {}", self.command, output);
        info!("Running '{}' in {}", command, self.directory.display());

        let status = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&self.directory)
            .status()
            .map_err(|e| FnetAseError::CommandLaunchFailed {
                command: command.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(FnetAseError::CommandFailed {
                command,
                status: status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                output: self.output_path().display().to_string(),
            });
        }
        Ok(())
    }

    /// 读取 fnetout.hdf5，成功后删除该文件
    pub fn read_results(&mut self) -> Result<&PredictionResult> {
        let written = match &self.state {
            CalculatorState::AwaitingResults { written } => written.clone(),
            CalculatorState::Ready { .. } => {
                return Err(FnetAseError::InvalidState(
                    "No pending Fortnet input to read results for".to_string(),
                ))
            }
        };

        let path = self.directory.join(FNETOUT);
        let document = self.backend.load(&path)?;
        let output = FnetOutput::from_document(&path, &document)?;

        let energy = output.energy()?;
        let forces = if self.forces {
            let forces = output.forces()?;
            if forces.len() != written.len() {
                return Err(FnetAseError::MalformedOutput {
                    path: path.display().to_string(),
                    reason: format!(
                        "Found forces for {} atoms, expected {}.",
                        forces.len(),
                        written.len()
                    ),
                });
            }
            Some(forces)
        } else {
            None
        };

        self.backend.remove(&path)?;
        debug!("Consumed {}", path.display());

        info!("Fortnet energy: {:.6} eV", energy);
        self.state = CalculatorState::Ready {
            atoms: Some(written),
        };
        Ok(&*self.results.insert(PredictionResult { energy, forces }))
    }

    /// 完整计算；结构未变且结果已含所需物理量时直接返回缓存
    pub fn calculate(
        &mut self,
        atoms: &Structure,
        properties: &[Property],
    ) -> Result<&PredictionResult> {
        let cached = self
            .results
            .as_ref()
            .is_some_and(|r| properties.iter().all(|&p| r.provides(p)))
            && self.check_state(atoms).is_empty();

        if cached {
            debug!("Reusing cached Fortnet results");
        } else {
            self.write_input(atoms, properties)?;
            self.execute()?;
            self.read_results()?;
        }

        self.results.as_ref().ok_or_else(|| {
            FnetAseError::InvalidState("Fortnet produced no results".to_string())
        })
    }

    /// 能量 (eV)
    pub fn potential_energy(&mut self, atoms: &Structure) -> Result<f64> {
        self.calculate(atoms, &[Property::Energy]).map(|r| r.energy)
    }

    /// 力 (eV/Å)
    pub fn forces(&mut self, atoms: &Structure) -> Result<Vec<[f64; 3]>> {
        let results = self.calculate(atoms, &[Property::Forces])?;
        results.forces.clone().ok_or_else(|| {
            FnetAseError::InvalidState("Forces missing from Fortnet results".to_string())
        })
    }

    /// 相对上一次结果的结构变化；非周期体系忽略晶胞变化
    pub fn check_state(&self, atoms: &Structure) -> Vec<SystemChange> {
        let mut changes = match self.current_atoms() {
            Some(previous) => atoms.changes_from(previous),
            None => vec![
                SystemChange::Positions,
                SystemChange::Numbers,
                SystemChange::Cell,
                SystemChange::Pbc,
            ],
        };
        if !atoms.is_periodic() {
            changes.retain(|c| *c != SystemChange::Cell);
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fnetout::tests::output_document;
    use crate::netstat::tests::netstat_document;
    use crate::parsers::hsd::read_hsd_file;
    use crate::store::MemoryBackend;
    use crate::units::{AA_BOHR, BOHR_AA, HARTREE_EV};
    use tempfile::TempDir;

    const NETSTAT: &str = "/nets/fortnet.hdf5";

    fn carbon(mapping: bool) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.insert(
            NETSTAT,
            netstat_document("global", &[(6, &[10, 5, 1])], mapping, false),
        );
        backend
    }

    fn dimer() -> Structure {
        Structure::molecule("C2", vec![6, 6], vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.25]])
    }

    fn calculator(backend: MemoryBackend, dir: &TempDir) -> Fortnet<MemoryBackend> {
        let config = CalculatorConfig::new()
            .restart(NETSTAT)
            .directory(dir.path())
            .command("false");
        Fortnet::new(backend, config).unwrap()
    }

    #[test]
    fn test_command_resolution_order() {
        assert_eq!(
            resolve_command(Some("mpirun fnet".into()), Some("env-fnet".into())),
            "mpirun fnet"
        );
        assert_eq!(resolve_command(None, Some("env-fnet".into())), "env-fnet");
        assert_eq!(resolve_command(None, None), "fnet");
        assert_eq!(resolve_command(None, Some("  ".into())), "fnet");
    }

    #[test]
    fn test_missing_netstat_fails_at_construction() {
        let err = Fortnet::new(MemoryBackend::new(), CalculatorConfig::new()).unwrap_err();
        assert!(matches!(err, FnetAseError::NetstatNotFound { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_default_delta_stored_in_bohr() {
        let dir = TempDir::new().unwrap();
        let calc = calculator(carbon(true), &dir);
        let delta = calc.finite_diff_delta().unwrap();
        assert!((delta * BOHR_AA - 0.01).abs() < 1e-15);
        assert_eq!(calc.label(), "fortnet");
    }

    #[test]
    fn test_energy_only_cycle() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(false), &dir);
        let atoms = dimer();

        calc.write_input(&atoms, &[Property::Energy]).unwrap();
        assert!(calc.state().is_awaiting());
        assert!(calc.current_atoms().is_none());

        let hsd = read_hsd_file(&dir.path().join("fortnet_in.hsd")).unwrap();
        assert!(hsd.get("Analysis").is_none());
        assert_eq!(
            hsd.value("Data/NetstatFile").and_then(|v| v.as_text()),
            Some(NETSTAT)
        );
        assert!(calc.backend().exists(&dir.path().join("fnetdata.hdf5")));

        let fnetout = dir.path().join("fnetout.hdf5");
        calc.backend().insert(&fnetout, output_document(-11.5, None));

        let result = calc.read_results().unwrap().clone();
        assert_eq!(result.energy, -11.5 * HARTREE_EV);
        assert!(result.forces.is_none());
        assert!(!calc.backend().exists(&fnetout));
        assert_eq!(calc.current_atoms(), Some(&atoms));
        assert!(calc.check_state(&atoms).is_empty());
    }

    #[test]
    fn test_forces_without_mapping_mention_acsf() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(false), &dir);

        let err = calc
            .write_input(&dimer(), &[Property::Energy, Property::Forces])
            .unwrap_err();
        assert!(err.to_string().contains("ACSF"));
        assert!(!calc.state().is_awaiting());
        assert!(!dir.path().join("fortnet_in.hsd").exists());
    }

    #[test]
    fn test_forces_cycle_converts_units() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(true), &dir);

        calc.write_input(&dimer(), &[Property::Forces]).unwrap();
        let hsd = read_hsd_file(&dir.path().join("fortnet_in.hsd")).unwrap();
        let delta = hsd
            .value("Analysis/Forces/FiniteDifferences/Delta")
            .and_then(|v| v.as_real())
            .unwrap();
        assert!((delta - 0.01 * AA_BOHR).abs() < 1e-12);

        let raw = vec![[0.0, 0.0, 0.02], [0.0, 0.0, -0.02]];
        calc.backend()
            .insert(dir.path().join("fnetout.hdf5"), output_document(-11.0, Some(raw)));

        let result = calc.read_results().unwrap();
        let forces = result.forces.as_ref().unwrap();
        assert_eq!(forces[0][2], 0.02 * HARTREE_EV / BOHR_AA);
        assert_eq!(forces[1][2], -0.02 * HARTREE_EV / BOHR_AA);
    }

    #[test]
    fn test_forces_missing_from_output_keeps_artifact() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(true), &dir);
        let fnetout = dir.path().join("fnetout.hdf5");

        calc.write_input(&dimer(), &[Property::Forces]).unwrap();
        calc.backend().insert(&fnetout, output_document(-11.0, None));

        let err = calc.read_results().unwrap_err();
        assert!(matches!(err, FnetAseError::ForcesNotInOutput { .. }));
        assert!(calc.state().is_awaiting());
        assert!(calc.results().is_none());
        assert!(calc.backend().exists(&fnetout));

        // 下一次写输入清理残留输出
        calc.write_input(&dimer(), &[Property::Energy]).unwrap();
        assert!(!calc.backend().exists(&fnetout));
    }

    #[test]
    fn test_read_results_requires_pending_input() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(false), &dir);
        assert!(matches!(
            calc.read_results(),
            Err(FnetAseError::InvalidState(_))
        ));
        assert!(matches!(calc.execute(), Err(FnetAseError::InvalidState(_))));
    }

    #[test]
    fn test_check_state_ignores_cell_for_molecules() {
        let dir = TempDir::new().unwrap();
        let calc = calculator(carbon(false), &dir);
        let changes = calc.check_state(&dimer());
        assert_eq!(
            changes,
            vec![SystemChange::Positions, SystemChange::Numbers, SystemChange::Pbc]
        );
    }

    #[test]
    fn test_calculate_reuses_cached_results() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(false), &dir);
        let atoms = dimer();

        calc.write_input(&atoms, &[Property::Energy]).unwrap();
        calc.backend()
            .insert(dir.path().join("fnetout.hdf5"), output_document(-2.0, None));
        calc.read_results().unwrap();

        // 命令为 `false`，若再次运行会失败
        let energy = calc.potential_energy(&atoms).unwrap();
        assert_eq!(energy, -2.0 * HARTREE_EV);

        let mut moved = atoms.clone();
        moved.positions[1][2] = 1.3;
        assert!(calc.potential_energy(&moved).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_redirects_to_label_output() {
        let dir = TempDir::new().unwrap();
        let config = CalculatorConfig::new()
            .restart(NETSTAT)
            .directory(dir.path())
            .label("run")
            .command("echo predicting");
        let mut calc = Fortnet::new(carbon(false), config).unwrap();

        calc.write_input(&dimer(), &[Property::Energy]).unwrap();
        calc.execute().unwrap();
        let out = fs::read_to_string(dir.path().join("run.out")).unwrap();
        assert_eq!(out.trim(), "predicting");
    }

    #[test]
    fn test_netstat_revalidated_on_every_write() {
        let dir = TempDir::new().unwrap();
        let mut calc = calculator(carbon(true), &dir);
        let forces = [Property::Energy, Property::Forces];

        calc.write_input(&dimer(), &forces).unwrap();

        calc.backend().insert(
            NETSTAT,
            netstat_document("global", &[(6, &[10, 5, 1])], true, true),
        );
        let err = calc.write_input(&dimer(), &forces).unwrap_err();
        assert!(matches!(err, FnetAseError::ForcesWithExternalFeatures { .. }));
        calc.write_input(&dimer(), &[Property::Energy]).unwrap();

        calc.backend().insert(
            NETSTAT,
            netstat_document("atomic", &[(6, &[10, 5, 1])], true, false),
        );
        let err = calc.write_input(&dimer(), &[Property::Energy]).unwrap_err();
        assert!(matches!(err, FnetAseError::UnsupportedTargetType { .. }));
    }

    #[test]
    fn test_no_delta_leaves_fortnet_default() {
        let dir = TempDir::new().unwrap();
        let config = CalculatorConfig::new()
            .restart(NETSTAT)
            .directory(dir.path())
            .finite_diff_delta(None);
        let mut calc = Fortnet::new(carbon(true), config).unwrap();
        assert!(calc.finite_diff_delta().is_none());

        calc.write_input(&dimer(), &[Property::Forces]).unwrap();
        let hsd = read_hsd_file(&dir.path().join("fortnet_in.hsd")).unwrap();
        let block = hsd.block("Analysis/Forces/FiniteDifferences").unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn test_non_positive_delta_rejected_before_writing() {
        for delta in [-0.5, 0.0] {
            let dir = TempDir::new().unwrap();
            let config = CalculatorConfig::new()
                .restart(NETSTAT)
                .directory(dir.path())
                .finite_diff_delta(Some(delta));
            let mut calc = Fortnet::new(carbon(true), config).unwrap();

            for properties in [&[Property::Forces][..], &[Property::Energy][..]] {
                let err = calc.write_input(&dimer(), properties).unwrap_err();
                match err {
                    FnetAseError::InvalidFiniteDifferenceDelta(value) => assert_eq!(value, delta),
                    other => panic!("unexpected error: {other}"),
                }
            }
            assert!(!dir.path().join("fortnet_in.hsd").exists());
            assert!(!calc.backend().exists(&dir.path().join("fnetdata.hdf5")));
            assert_eq!(calc.state(), &CalculatorState::Ready { atoms: None });
        }

        let err = FnetAseError::InvalidFiniteDifferenceDelta(-0.5);
        assert!(err.to_string().contains("-0.5"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("fortnet.out"), "'fortnet.out'");
        assert_eq!(shell_quote("bob's run.out"), "'bob'\\''s run.out'");
    }

    #[cfg(unix)]
    #[test]
    fn test_label_with_spaces_and_quotes() {
        for label in ["my run", "bob's run"] {
            let dir = TempDir::new().unwrap();
            let config = CalculatorConfig::new()
                .restart(NETSTAT)
                .directory(dir.path())
                .label(label)
                .command("echo predicting");
            let mut calc = Fortnet::new(carbon(false), config).unwrap();

            calc.write_input(&dimer(), &[Property::Energy]).unwrap();
            calc.execute().unwrap();
            let out = fs::read_to_string(calc.output_path()).unwrap();
            assert_eq!(out.trim(), "predicting");
            assert!(dir.path().join(format!("{}.out", label)).exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reported() {
        let dir = TempDir::new().unwrap();
        let config = CalculatorConfig::new()
            .restart(NETSTAT)
            .directory(dir.path())
            .command("exit 3");
        let mut calc = Fortnet::new(carbon(false), config).unwrap();

        calc.write_input(&dimer(), &[Property::Energy]).unwrap();
        let err = calc.execute().unwrap_err();
        match err {
            FnetAseError::CommandFailed { status, output, .. } => {
                assert_eq!(status, "3");
                assert!(output.ends_with("fortnet.out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
