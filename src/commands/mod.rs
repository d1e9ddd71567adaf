//! # 命令执行模块
//!
//! 实现处理管线的驱动逻辑：读取输入文件、解析、依次应用变换、
//! 序列化并写出。致命错误发生在写文件之前，不会留下部分输出。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `transform/`, `utils/`

use crate::cli::RunConfig;
use crate::error::{Result, XsfError};
use crate::parsers::xsf;
use crate::transform;
use crate::utils::output;
use std::fs;

/// 执行完整的 解析 -> 变换 -> 序列化 管线
pub fn run(config: RunConfig) -> Result<()> {
    if config.used_defaults {
        output::print_info(&format!(
            "No arguments given, using defaults: '{}' -> '{}', first datagrid, auto-scaling",
            config.input.display(),
            config.output.display()
        ));
    }

    if !config.input.exists() {
        return Err(XsfError::FileNotFound {
            path: config.input.display().to_string(),
        });
    }

    let mut doc = xsf::parse_xsf_file(&config.input)?;

    let grid_index = match doc.find_grid(config.grid_name.as_deref()) {
        Some(index) => index,
        None => {
            return Err(match config.grid_name {
                Some(name) => {
                    let names = doc.grid_names();
                    XsfError::DatagridNotFound {
                        name,
                        available: if names.is_empty() {
                            "(none)".to_string()
                        } else {
                            names.join(", ")
                        },
                    }
                }
                None => XsfError::NoDatagrid,
            });
        }
    };

    if let Some(grid) = doc.grid(grid_index) {
        output::print_info(&format!(
            "Processing datagrid '{}' ({}x{}x{})",
            grid.name.as_deref().unwrap_or("(unnamed)"),
            grid.dims[0],
            grid.dims[1],
            grid.dims[2]
        ));
        if grid.read_count != grid.point_count() {
            output::print_warning(&format!(
                "Data point mismatch: {} read vs {} expected, adjusted",
                grid.read_count,
                grid.point_count()
            ));
        }
    }

    transform::reset_force_flag(&mut doc);

    if let Some(grid) = doc.grid_mut(grid_index) {
        transform::recenter(grid);

        let report = transform::rescale(grid, config.scale);
        output::print_info(&format!(
            "Maximum |value| before scaling: {:.6E}",
            report.max_before
        ));
        if report.degenerate {
            output::print_warning("All grid values are zero, applying scale factor 1");
        } else if report.auto {
            output::print_info(&format!("Auto-scaling factor: {:.6E}", report.factor));
        } else {
            output::print_info(&format!("Applying scaling factor: {:.6E}", report.factor));
        }
        output::print_info(&format!(
            "Maximum |value| after scaling: {:.6}",
            report.max_after
        ));
    }

    for warning in transform::symbolize_species(&mut doc) {
        output::print_warning(&warning);
    }

    transform::insert_convvec(&mut doc);

    let text = xsf::to_xsf_string(&doc);
    fs::write(&config.output, text).map_err(|e| XsfError::FileWriteError {
        path: config.output.display().to_string(),
        source: e,
    })?;

    output::print_done(&format!(
        "Centered data written to '{}'",
        config.output.display()
    ));

    Ok(())
}
