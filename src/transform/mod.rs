//! # 文档变换模块
//!
//! 对解析后的 Document 原地执行五个变换：力标志复位、网格周期性
//! 重新居中、数值缩放、原子序数替换为元素符号、CONVVEC 块合成。
//! 全部为纯内存操作，不做任何 I/O。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块调用
//! - 使用 `models/document.rs`, `models/grid.rs`, `models/elements.rs`

use crate::models::{elements, Block, DataGrid3D, Document};

/// 缩放结果，供驱动层向用户报告
#[derive(Debug, Clone, Copy)]
pub struct ScaleReport {
    /// 实际应用的缩放因子
    pub factor: f64,

    /// 因子是否为自动计算
    pub auto: bool,

    /// 最大绝对值为 0，自动缩放退化为因子 1
    pub degenerate: bool,

    /// 缩放前的最大绝对值
    pub max_before: f64,

    /// 缩放后的最大绝对值
    pub max_after: f64,
}

/// 力标志无条件复位为 0
///
/// 力分量列本身在解析阶段已被丢弃，这里只需修正计数行。
pub fn reset_force_flag(doc: &mut Document) {
    if let Some(pc) = doc.primcoord_mut() {
        pc.force_flag = 0;
    }
}

/// 网格周期性重新居中
///
/// 每轴循环移位 floor(n/2)，使原先位于网格有效中心的值落到
/// (0,0,0)。返回实际使用的移位量。
pub fn recenter(grid: &mut DataGrid3D) -> [usize; 3] {
    let shift = [grid.dims[0] / 2, grid.dims[1] / 2, grid.dims[2] / 2];
    grid.cyclic_shift(shift);
    grid.edited = true;
    shift
}

/// 数值缩放
///
/// 给定显式因子时直接应用；否则自动取 10.0 / max|v|。最大绝对值
/// 为 0 时自动缩放退化为因子 1。
pub fn rescale(grid: &mut DataGrid3D, explicit: Option<f64>) -> ScaleReport {
    let max_before = grid.max_abs();
    let (factor, auto, degenerate) = match explicit {
        Some(f) => (f, false, false),
        None if max_before > 0.0 => (10.0 / max_before, true, false),
        None => (1.0, true, true),
    };

    grid.scale_values(factor);
    grid.edited = true;

    ScaleReport {
        factor,
        auto,
        degenerate,
        max_before,
        max_after: grid.max_abs(),
    }
}

/// 原子序数替换为元素符号
///
/// 纯数字的物种标记按元素表替换；非数字标记原样保留。超出
/// [1, 118] 的序数保留原标记，对应警告返回给调用方。
pub fn symbolize_species(doc: &mut Document) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(pc) = doc.primcoord_mut() {
        for atom in &mut pc.atoms {
            if let Ok(z) = atom.species.parse::<u32>() {
                match elements::element_symbol(z) {
                    Some(symbol) => atom.species = symbol.to_string(),
                    None => warnings.push(format!(
                        "Atomic number {} outside [1, 118], keeping original token",
                        z
                    )),
                }
            }
        }
    }

    warnings
}

/// CONVVEC 块合成
///
/// PRIMVEC 存在且文件中尚无 CONVVEC 时，在 PRIMVEC 块之后插入
/// 含相同 3x3 向量的 CONVVEC 块（向量行逐字节复制）。返回是否
/// 实际插入。
pub fn insert_convvec(doc: &mut Document) -> bool {
    if has_convvec(doc) {
        return false;
    }
    let Some(index) = doc.primvec_index() else {
        return false;
    };
    let Block::PrimVec { lines, .. } = &doc.blocks[index] else {
        return false;
    };

    let mut convvec = vec!["CONVVEC".to_string()];
    convvec.extend(lines.iter().skip(1).cloned());
    doc.blocks.insert(index + 1, Block::Raw(convvec));
    true
}

fn has_convvec(doc: &Document) -> bool {
    doc.blocks.iter().any(|b| match b {
        Block::Raw(lines) => lines.iter().any(|l| l.trim().starts_with("CONVVEC")),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice, PrimCoord};

    fn grid_4x4x4() -> DataGrid3D {
        DataGrid3D {
            name: Some("rho".to_string()),
            dims: [4, 4, 4],
            origin: [0.0; 3],
            vectors: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            values: (0..64).map(|i| i as f64).collect(),
            read_count: 64,
            raw: Vec::new(),
            edited: false,
        }
    }

    fn doc_with_primvec() -> Document {
        Document::new(vec![
            Block::Raw(vec!["CRYSTAL".to_string()]),
            Block::PrimVec {
                lattice: Lattice::from_vectors([
                    [5.43, 0.0, 0.0],
                    [0.0, 5.43, 0.0],
                    [0.0, 0.0, 5.43],
                ]),
                lines: vec![
                    "PRIMVEC".to_string(),
                    "    5.430000000    0.000000000    0.000000000".to_string(),
                    "    0.000000000    5.430000000    0.000000000".to_string(),
                    "    0.000000000    0.000000000    5.430000000".to_string(),
                ],
            },
        ])
    }

    #[test]
    fn test_recenter_half_extent_shift() {
        let mut grid = grid_4x4x4();
        let shift = recenter(&mut grid);

        assert_eq!(shift, [2, 2, 2]);
        assert!(grid.edited);

        // 原 (2,2,2) 处的值移到 (0,0,0)
        let center_flat = 2 + 4 * (2 + 4 * 2);
        assert!((grid.values[0] - center_flat as f64).abs() < 1e-12);
    }

    #[test]
    fn test_auto_scale_targets_ten() {
        let mut grid = grid_4x4x4();
        let report = rescale(&mut grid, None);

        assert!(report.auto);
        assert!(!report.degenerate);
        assert!((report.factor - 10.0 / 63.0).abs() < 1e-15);
        assert!((report.max_before - 63.0).abs() < 1e-12);
        assert!((report.max_after - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_scale_round_trip() {
        let mut grid = grid_4x4x4();
        let original = grid.values.clone();

        rescale(&mut grid, Some(2.5));
        rescale(&mut grid, Some(1.0 / 2.5));

        for (a, b) in grid.values.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_scale_keeps_values() {
        let mut grid = grid_4x4x4();
        grid.values = vec![0.0; 64];

        let report = rescale(&mut grid, None);
        assert!(report.degenerate);
        assert!((report.factor - 1.0).abs() < 1e-15);
        assert!(grid.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_reset_force_flag() {
        let mut doc = Document::new(vec![Block::PrimCoord(PrimCoord {
            keyword_line: "PRIMCOORD".to_string(),
            declared_count: 1,
            force_flag: 1,
            atoms: vec![Atom::new("14", [0.0, 0.0, 0.0])],
        })]);

        reset_force_flag(&mut doc);
        assert_eq!(doc.primcoord_mut().unwrap().force_flag, 0);
    }

    #[test]
    fn test_symbolize_species() {
        let mut doc = Document::new(vec![Block::PrimCoord(PrimCoord {
            keyword_line: "PRIMCOORD".to_string(),
            declared_count: 4,
            force_flag: 0,
            atoms: vec![
                Atom::new("1", [0.0, 0.0, 0.0]),
                Atom::new("8", [0.5, 0.5, 0.5]),
                Atom::new("Fe", [0.25, 0.25, 0.25]),
                Atom::new("200", [0.75, 0.75, 0.75]),
            ],
        })]);

        let warnings = symbolize_species(&mut doc);
        let pc = doc.primcoord_mut().unwrap();

        assert_eq!(pc.atoms[0].species, "H");
        assert_eq!(pc.atoms[1].species, "O");
        assert_eq!(pc.atoms[2].species, "Fe");
        assert_eq!(pc.atoms[3].species, "200");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_insert_convvec_after_primvec() {
        let mut doc = doc_with_primvec();
        assert!(insert_convvec(&mut doc));

        let Block::Raw(lines) = &doc.blocks[2] else {
            panic!("expected CONVVEC block after PRIMVEC");
        };
        assert_eq!(lines[0], "CONVVEC");
        assert_eq!(lines[1], "    5.430000000    0.000000000    0.000000000");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_no_primvec_no_convvec() {
        let mut doc = Document::new(vec![Block::Raw(vec!["CRYSTAL".to_string()])]);
        assert!(!insert_convvec(&mut doc));
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_existing_convvec_not_duplicated() {
        let mut doc = doc_with_primvec();
        doc.blocks.push(Block::Raw(vec![
            "CONVVEC".to_string(),
            "    5.430000000    0.000000000    0.000000000".to_string(),
        ]));

        assert!(!insert_convvec(&mut doc));
    }
}
