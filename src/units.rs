//! # 单位换算
//!
//! Fortnet 内部使用原子单位（长度 Bohr，能量 Hartree），
//! 调用方使用 Å 与 eV。换算常数与 Fortnet 自身
//! (`lib_dftbp/constants.F90`) 保持一致，不要替换为 CODATA 新值。
//!
//! ## 依赖关系
//! - 被 `input`, `dataset`, `fnetout`, `calculator` 使用
//! - 无外部模块依赖

/// 1 Bohr 对应的 Å
pub const BOHR_AA: f64 = 0.529177249;

/// 1 Å 对应的 Bohr
pub const AA_BOHR: f64 = 1.0 / BOHR_AA;

/// 1 Hartree 对应的 eV
pub const HARTREE_EV: f64 = 27.2113845;

/// 1 eV 对应的 Hartree
pub const EV_HARTREE: f64 = 1.0 / HARTREE_EV;

/// Å -> Bohr
pub fn angstrom_to_bohr(length: f64) -> f64 {
    length * AA_BOHR
}

/// Bohr -> Å
pub fn bohr_to_angstrom(length: f64) -> f64 {
    length * BOHR_AA
}

/// Hartree -> eV
pub fn hartree_to_ev(energy: f64) -> f64 {
    energy * HARTREE_EV
}

/// Hartree/Bohr -> eV/Å
pub fn force_au_to_ev_per_angstrom(force: f64) -> f64 {
    force * HARTREE_EV / BOHR_AA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_conversion_is_exact_product() {
        let e = -12.345678;
        assert_eq!(hartree_to_ev(e), e * 27.2113845);
    }

    #[test]
    fn test_force_conversion_is_exact_quotient() {
        let f = 0.0123;
        assert_eq!(force_au_to_ev_per_angstrom(f), f * 27.2113845 / 0.529177249);
    }

    #[test]
    fn test_length_round_trip() {
        let x = 1.2345;
        assert!((bohr_to_angstrom(angstrom_to_bohr(x)) - x).abs() < 1e-14);
        assert!((HARTREE_EV * EV_HARTREE - 1.0).abs() < 1e-15);
    }
}
