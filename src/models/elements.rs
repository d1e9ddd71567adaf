//! # 元素符号表
//!
//! 提供原子序数到元素符号的映射 (Z = 1..=118)。
//!
//! XSF 文件的 PRIMCOORD 块允许用原子序数代替元素符号标记原子，
//! XCrySDen 显示时更适合使用符号形式。
//!
//! ## 依赖关系
//! - 被 `transform/` 模块调用进行符号替换
//! - 纯静态数据，无外部依赖

/// 按原子序数排列的元素符号，`ELEMENT_SYMBOLS[z - 1]` 对应 Z = z
pub const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", //
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", //
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", //
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", //
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", //
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", //
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", //
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", //
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", //
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", //
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 查找元素符号，原子序数超出 [1, 118] 时返回 None
pub fn element_symbol(z: u32) -> Option<&'static str> {
    if z == 0 {
        return None;
    }
    ELEMENT_SYMBOLS.get(z as usize - 1).copied()
}
