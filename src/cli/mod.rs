//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数，并把原始参数解析为运行配置。
//!
//! ## 参数约定
//! - `xsfutil <input.xsf> <output.xsf> [scale|grid] [grid|scale]`
//! - 两个可选尾参数按类型区分：能解析为浮点数的视为缩放因子，
//!   否则视为数据网格名，与出现顺序无关
//! - 不带任何参数时回退到固定默认文件名并处理第一个数据网格
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `commands/mod.rs`

use crate::error::{Result, XsfError};
use clap::Parser;
use std::path::PathBuf;

/// 默认输入文件名（不带参数运行时使用）
pub const DEFAULT_INPUT: &str = "psir_plrn.xsf";

/// 默认输出文件名（不带参数运行时使用）
pub const DEFAULT_OUTPUT: &str = "psir_plrn_centered.xsf";

/// xsfutil - XSF 数据网格居中工具
#[derive(Parser, Debug)]
#[command(name = "xsfutil")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Recenter and clean XCrySDen XSF volumetric data files", long_about = None)]
pub struct Cli {
    /// Input XSF file (default: psir_plrn.xsf)
    pub input: Option<PathBuf>,

    /// Output XSF file (default: psir_plrn_centered.xsf)
    pub output: Option<PathBuf>,

    /// Scale factor and/or datagrid name, in either order
    #[arg(value_name = "SCALE|GRID", allow_negative_numbers = true)]
    pub selectors: Vec<String>,
}

/// 解析完成的运行配置
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,

    /// 显式缩放因子，None 表示自动缩放
    pub scale: Option<f64>,

    /// 目标数据网格名，None 表示取第一个
    pub grid_name: Option<String>,

    /// 是否使用了默认文件名
    pub used_defaults: bool,
}

impl Cli {
    /// 把原始命令行参数解析为运行配置
    pub fn resolve(self) -> Result<RunConfig> {
        let (input, output, used_defaults) = match (self.input, self.output) {
            (Some(input), Some(output)) => (input, output, false),
            (None, None) => (
                PathBuf::from(DEFAULT_INPUT),
                PathBuf::from(DEFAULT_OUTPUT),
                true,
            ),
            (Some(_), None) | (None, Some(_)) => {
                return Err(XsfError::InvalidArgument(
                    "an output path is required when an input path is given".to_string(),
                ));
            }
        };

        // 尾参数按类型区分：浮点数 -> 缩放因子，其余 -> 网格名
        let mut scale: Option<f64> = None;
        let mut grid_name: Option<String> = None;
        for token in &self.selectors {
            if scale.is_none() {
                if let Ok(factor) = token.parse::<f64>() {
                    scale = Some(factor);
                    continue;
                }
            }
            if grid_name.is_none() {
                grid_name = Some(token.clone());
                continue;
            }
            return Err(XsfError::InvalidArgument(format!(
                "unexpected extra argument '{}'",
                token
            )));
        }

        Ok(RunConfig {
            input,
            output,
            scale,
            grid_name,
            used_defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(input: Option<&str>, output: Option<&str>, selectors: &[&str]) -> Cli {
        Cli {
            input: input.map(PathBuf::from),
            output: output.map(PathBuf::from),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let config = cli(None, None, &[]).resolve().unwrap();
        assert!(config.used_defaults);
        assert_eq!(config.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(config.scale.is_none());
        assert!(config.grid_name.is_none());
    }

    #[test]
    fn test_resolve_scale_then_grid() {
        let config = cli(Some("a.xsf"), Some("b.xsf"), &["2.5", "rho"])
            .resolve()
            .unwrap();
        assert_eq!(config.scale, Some(2.5));
        assert_eq!(config.grid_name.as_deref(), Some("rho"));
    }

    #[test]
    fn test_resolve_grid_then_scale() {
        let config = cli(Some("a.xsf"), Some("b.xsf"), &["rho", "2.5"])
            .resolve()
            .unwrap();
        assert_eq!(config.scale, Some(2.5));
        assert_eq!(config.grid_name.as_deref(), Some("rho"));
    }

    #[test]
    fn test_resolve_grid_only() {
        let config = cli(Some("a.xsf"), Some("b.xsf"), &["charge_density"])
            .resolve()
            .unwrap();
        assert!(config.scale.is_none());
        assert_eq!(config.grid_name.as_deref(), Some("charge_density"));
    }

    #[test]
    fn test_missing_output_is_error() {
        let result = cli(Some("a.xsf"), None, &[]).resolve();
        assert!(matches!(result, Err(XsfError::InvalidArgument(_))));
    }

    #[test]
    fn test_extra_argument_is_error() {
        let result = cli(Some("a.xsf"), Some("b.xsf"), &["2.5", "rho", "extra"]).resolve();
        assert!(matches!(result, Err(XsfError::InvalidArgument(_))));
    }

    #[test]
    fn test_parse_from_argv() {
        let cli = Cli::try_parse_from(["xsfutil", "in.xsf", "out.xsf", "rho", "0.5"]).unwrap();
        let config = cli.resolve().unwrap();
        assert_eq!(config.input, PathBuf::from("in.xsf"));
        assert_eq!(config.scale, Some(0.5));
        assert_eq!(config.grid_name.as_deref(), Some("rho"));
    }
}
