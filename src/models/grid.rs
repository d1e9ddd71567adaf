//! # 三维标量场网格模型
//!
//! 定义 DATAGRID_3D 块的内存表示和网格上的纯数值运算（循环移位、
//! 数值缩放）。展平数据采用列主序（第一维 x 变化最快），与 XSF
//! 文件的磁盘布局一致。
//!
//! ## 依赖关系
//! - 被 `models/document.rs` 聚合
//! - 被 `parsers/` 和 `transform/` 使用

use serde::{Deserialize, Serialize};

/// DATAGRID_3D 块
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataGrid3D {
    /// 块名称，取自 `BEGIN_DATAGRID_3D_<name>` 后缀或块包装内的独立名称行
    pub name: Option<String>,

    /// 网格点数 (nx, ny, nz)
    pub dims: [usize; 3],

    /// 原点向量
    pub origin: [f64; 3],

    /// 三个张成向量
    pub vectors: [[f64; 3]; 3],

    /// 展平的标量值，列主序，长度为 nx*ny*nz（解析时已对齐）
    pub values: Vec<f64>,

    /// 文件中实际读到的数值个数（对齐之前）
    pub read_count: usize,

    /// 整个块的原始行（含起止标记），未被编辑的块原样重现
    pub raw: Vec<String>,

    /// 变换器处理过的块由序列化器重新生成数值区
    pub edited: bool,
}

impl DataGrid3D {
    /// 声明的网格点总数 nx*ny*nz
    pub fn point_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// 所有值的最大绝对值
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// 沿三个轴做周期性循环移位
    ///
    /// 把展平数据按 (nx, ny, nz) 列主序解释，移出一端的值从另一端
    /// 回绕：out[x, y, z] = in[(x - sx) mod nx, (y - sy) mod ny, (z - sz) mod nz]。
    pub fn cyclic_shift(&mut self, shift: [usize; 3]) {
        let [nx, ny, nz] = self.dims;
        if self.values.len() != nx * ny * nz {
            return;
        }

        let sx = shift[0] % nx.max(1);
        let sy = shift[1] % ny.max(1);
        let sz = shift[2] % nz.max(1);
        if sx == 0 && sy == 0 && sz == 0 {
            return;
        }

        let mut shifted = vec![0.0; self.values.len()];
        for z in 0..nz {
            let src_z = (z + nz - sz) % nz;
            for y in 0..ny {
                let src_y = (y + ny - sy) % ny;
                for x in 0..nx {
                    let src_x = (x + nx - sx) % nx;
                    shifted[x + nx * (y + ny * z)] =
                        self.values[src_x + nx * (src_y + ny * src_z)];
                }
            }
        }
        self.values = shifted;
    }

    /// 所有值乘以统一因子
    pub fn scale_values(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }
}
