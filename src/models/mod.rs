//! # 数据模型模块
//!
//! 定义 XSF 文档的内存表示和元素符号表。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `transform/` 使用
//! - 子模块: document, grid, elements

pub mod document;
pub mod elements;
pub mod grid;

pub use document::{Atom, Block, Document, Lattice, PrimCoord};
pub use grid::DataGrid3D;
