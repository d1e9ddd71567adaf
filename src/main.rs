//! # xsfutil - XSF 数据网格居中工具
//!
//! 处理 XCrySDen XSF 文件：把周期性网格上的三维标量场循环移位到
//! 晶胞中心（消除周期性边界的回绕伪影）、去掉 PRIMCOORD 中的原子
//! 受力列、缩放场强便于显示、把原子序数替换为元素符号，并根据
//! PRIMVEC 合成 CONVVEC 块。
//!
//! ## 用法
//! ```text
//! xsfutil <input.xsf> <output.xsf> [scale_factor|datagrid_name] [datagrid_name|scale_factor]
//! ```
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (管线驱动逻辑)
//!   │     ├── parsers/   (XSF 解析与序列化)
//!   │     ├── transform/ (文档变换)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod transform;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = cli.resolve().and_then(commands::run) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
