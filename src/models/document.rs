//! # XSF 文档数据模型
//!
//! 定义 XSF 文件的内存表示：已识别的结构块（PRIMVEC、PRIMCOORD、
//! DATAGRID_3D）按出现顺序排列，未识别的文本作为不透明区间逐行保留，
//! 序列化时可以原样重现。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `transform/` 使用
//! - 子结构: grid.rs 定义 DataGrid3D

use crate::models::grid::DataGrid3D;
use serde::{Deserialize, Serialize};

/// 晶格向量表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }
}

/// 原子记录
///
/// `species` 保留文件中的原始标记，可能是元素符号 ("Fe") 或
/// 原子序数 ("26")。力分量列在解析阶段即被丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 物种标记（元素符号或原子序数）
    pub species: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            species: species.into(),
            position,
        }
    }
}

/// PRIMCOORD 块
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimCoord {
    /// 关键字行，原样保留
    pub keyword_line: String,

    /// 声明的原子数（计数行第一列）
    pub declared_count: usize,

    /// 力标志（计数行第二列），输出时强制为 0
    pub force_flag: i32,

    /// 原子列表，可能因提前终止而少于 declared_count
    pub atoms: Vec<Atom>,
}

/// 文档块：已识别的结构块或原样保留的文本区间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Block {
    /// 未识别文本，逐行原样保留
    Raw(Vec<String>),

    /// PRIMVEC 块，lines 含关键字行和 3 个向量行
    PrimVec {
        lattice: Lattice,
        lines: Vec<String>,
    },

    /// PRIMCOORD 块
    PrimCoord(PrimCoord),

    /// DATAGRID_3D 块
    DataGrid(DataGrid3D),
}

/// 整个 XSF 文件的内存表示
///
/// 由解析器构建一次，变换器原地修改，序列化器消费一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Document { blocks }
    }

    /// PRIMVEC 晶格（如存在）
    pub fn lattice(&self) -> Option<&Lattice> {
        self.blocks.iter().find_map(|b| match b {
            Block::PrimVec { lattice, .. } => Some(lattice),
            _ => None,
        })
    }

    /// PRIMVEC 块在 blocks 中的下标
    pub fn primvec_index(&self) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| matches!(b, Block::PrimVec { .. }))
    }

    /// PRIMCOORD 块（如存在）
    pub fn primcoord_mut(&mut self) -> Option<&mut PrimCoord> {
        self.blocks.iter_mut().find_map(|b| match b {
            Block::PrimCoord(pc) => Some(pc),
            _ => None,
        })
    }

    /// 文件中所有 DATAGRID_3D 块的名称（未命名块记为 "(unnamed)"）
    pub fn grid_names(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::DataGrid(g) => {
                    Some(g.name.clone().unwrap_or_else(|| "(unnamed)".to_string()))
                }
                _ => None,
            })
            .collect()
    }

    /// 按名称查找 DATAGRID_3D 块；name 为 None 时返回第一个
    ///
    /// 返回 blocks 中的下标。
    pub fn find_grid(&self, name: Option<&str>) -> Option<usize> {
        self.blocks.iter().position(|b| match b {
            Block::DataGrid(g) => match name {
                Some(n) => g.name.as_deref() == Some(n),
                None => true,
            },
            _ => false,
        })
    }

    /// 按块下标取可变 DATAGRID_3D 引用
    pub fn grid_mut(&mut self, index: usize) -> Option<&mut DataGrid3D> {
        match self.blocks.get_mut(index) {
            Some(Block::DataGrid(g)) => Some(g),
            _ => None,
        }
    }

    /// 按块下标取 DATAGRID_3D 引用
    pub fn grid(&self, index: usize) -> Option<&DataGrid3D> {
        match self.blocks.get(index) {
            Some(Block::DataGrid(g)) => Some(g),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid(name: &str) -> DataGrid3D {
        DataGrid3D {
            name: Some(name.to_string()),
            dims: [2, 2, 2],
            origin: [0.0; 3],
            vectors: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            values: vec![0.0; 8],
            read_count: 8,
            raw: Vec::new(),
            edited: false,
        }
    }

    #[test]
    fn test_find_grid_first() {
        let doc = Document::new(vec![
            Block::Raw(vec!["# comment".to_string()]),
            Block::DataGrid(sample_grid("rho")),
            Block::DataGrid(sample_grid("psi")),
        ]);
        assert_eq!(doc.find_grid(None), Some(1));
    }

    #[test]
    fn test_find_grid_by_name() {
        let doc = Document::new(vec![
            Block::DataGrid(sample_grid("rho")),
            Block::DataGrid(sample_grid("psi")),
        ]);
        assert_eq!(doc.find_grid(Some("psi")), Some(1));
        assert_eq!(doc.find_grid(Some("missing")), None);
    }

    #[test]
    fn test_grid_names() {
        let doc = Document::new(vec![
            Block::DataGrid(sample_grid("rho")),
            Block::DataGrid(sample_grid("psi")),
        ]);
        assert_eq!(doc.grid_names(), vec!["rho", "psi"]);
    }

    #[test]
    fn test_lattice_accessor() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let doc = Document::new(vec![Block::PrimVec {
            lattice,
            lines: vec!["PRIMVEC".to_string()],
        }]);
        assert!(doc.lattice().is_some());
        assert_eq!(doc.primvec_index(), Some(0));
    }
}
