//! # 元素周期表
//!
//! 原子序数与元素符号之间的映射。netstat 文件中每个物种的子网络
//! 以小写元素符号命名（如 `c-subnetwork`）。
//!
//! ## 依赖关系
//! - 被 `netstat`, `parsers/`, `models/structure.rs` 使用
//! - 无外部模块依赖

/// 元素符号，下标为原子序数减一
const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 已知的最大原子序数
pub const MAX_ATOMIC_NUMBER: u32 = ELEMENT_SYMBOLS.len() as u32;

/// 原子序数 -> 元素符号（如 6 -> "C"）
pub fn symbol(atomic_number: u32) -> Option<&'static str> {
    if atomic_number == 0 {
        return None;
    }
    ELEMENT_SYMBOLS.get(atomic_number as usize - 1).copied()
}

/// 元素符号 -> 原子序数，大小写不敏感
pub fn atomic_number(symbol: &str) -> Option<u32> {
    let symbol = symbol.trim();
    ELEMENT_SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(symbol))
        .map(|i| i as u32 + 1)
}

/// 子网络组名（如 6 -> "c-subnetwork"）
pub fn subnetwork_name(atomic_number: u32) -> Option<String> {
    symbol(atomic_number).map(|s| format!("{}-subnetwork", s.to_lowercase()))
}
