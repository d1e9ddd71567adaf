//! # 解析器模块
//!
//! 提供 XSF 格式的解析和序列化。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: xsf

pub mod xsf;
