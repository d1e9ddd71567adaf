//! # XCrySDen XSF 格式解析器
//!
//! 解析 XSF 文件中的 PRIMVEC、PRIMCOORD 和 DATAGRID_3D 块，
//! 其余文本按不透明区间原样保留，序列化时逐字节重现。
//!
//! ## XSF 格式说明
//! ```text
//! # comment
//! CRYSTAL
//! PRIMVEC
//!   a1 a2 a3
//!   b1 b2 b3
//!   c1 c2 c3
//! PRIMCOORD
//!   natoms force_flag
//!   species x y z [fx fy fz]
//!   ...
//! BEGIN_BLOCK_DATAGRID_3D
//! block_comment
//! BEGIN_DATAGRID_3D_<name>
//!   nx ny nz
//!   ox oy oz              # origin
//!   v1x v1y v1z           # spanning vectors
//!   v2x v2y v2z
//!   v3x v3y v3z
//!   val val val ...       # nx*ny*nz 个值，列主序，x 最快
//! END_DATAGRID_3D
//! END_BLOCK_DATAGRID_3D
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/document.rs`, `models/grid.rs`

use crate::error::{Result, XsfError};
use crate::models::{Atom, Block, DataGrid3D, Document, Lattice, PrimCoord};
use std::fs;
use std::path::Path;

fn malformed(block: &str, reason: impl Into<String>) -> XsfError {
    XsfError::MalformedBlock {
        block: block.to_string(),
        reason: reason.into(),
    }
}

/// 解析 XSF 文件
pub fn parse_xsf_file(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path).map_err(|e| XsfError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_xsf_content(&content)
}

/// 从字符串内容解析 XSF 格式
pub fn parse_xsf_content(content: &str) -> Result<Document> {
    use regex::Regex;

    // 匹配数据网格起始行，兼容带 BEGIN_ 前缀和裸关键字两种写法
    let grid_open = Regex::new(r"^(?:BEGIN_)?DATAGRID_3D(?:_(\S+))?$").unwrap();

    let lines: Vec<&str> = content.lines().map(|l| l.trim_end()).collect();
    let mut blocks: Vec<Block> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim();

        if trimmed.starts_with("PRIMVEC") {
            let (lattice, consumed) = parse_primvec(&lines, i)?;
            flush_pending(&mut blocks, &mut pending);
            let advance = consumed.len();
            blocks.push(Block::PrimVec {
                lattice,
                lines: consumed,
            });
            i += advance;
            continue;
        }

        if trimmed.starts_with("PRIMCOORD") {
            let (primcoord, consumed) = parse_primcoord(&lines, i)?;
            flush_pending(&mut blocks, &mut pending);
            blocks.push(Block::PrimCoord(primcoord));
            i += consumed;
            continue;
        }

        if let Some(caps) = grid_open.captures(trimmed) {
            let name = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .or_else(|| wrapper_block_name(&pending));
            let (grid, consumed) = parse_datagrid(&lines, i, name)?;
            flush_pending(&mut blocks, &mut pending);
            blocks.push(Block::DataGrid(grid));
            i += consumed;
            continue;
        }

        pending.push(lines[i].to_string());
        i += 1;
    }

    flush_pending(&mut blocks, &mut pending);
    Ok(Document::new(blocks))
}

fn flush_pending(blocks: &mut Vec<Block>, pending: &mut Vec<String>) {
    if !pending.is_empty() {
        blocks.push(Block::Raw(std::mem::take(pending)));
    }
}

/// BEGIN_BLOCK_DATAGRID_3D 包装内的独立名称行启发式
///
/// 起始行不带名称后缀时，若前一个非空行是单个标识符且再往前一行
/// 是块包装起始标记，则取该标识符作为网格名。名称行本身仍留在
/// 不透明区间中原样输出。
fn wrapper_block_name(pending: &[String]) -> Option<String> {
    let mut nonempty = pending.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).rev();
    let candidate = nonempty.next()?;
    let wrapper = nonempty.next()?;

    if !wrapper.starts_with("BEGIN_BLOCK_DATAGRID_3D") {
        return None;
    }
    if candidate.split_whitespace().count() != 1 || candidate.contains("DATAGRID_3D") {
        return None;
    }
    Some(candidate.to_string())
}

/// 解析 PRIMVEC 块：关键字行后 3 行，每行 3 个浮点数
fn parse_primvec(lines: &[&str], start: usize) -> Result<(Lattice, Vec<String>)> {
    let mut matrix = [[0.0; 3]; 3];
    let mut consumed = vec![lines[start].to_string()];

    for row in 0..3 {
        let line = lines
            .get(start + 1 + row)
            .ok_or_else(|| malformed("PRIMVEC", "expected 3 lattice vector lines"))?;
        let parts: Vec<f64> = line
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(malformed(
                "PRIMVEC",
                format!("invalid lattice vector line: '{}'", line),
            ));
        }
        matrix[row] = [parts[0], parts[1], parts[2]];
        consumed.push(line.to_string());
    }

    Ok((Lattice::from_vectors(matrix), consumed))
}

/// 解析 PRIMCOORD 块：计数行 + 原子行
///
/// 原子行要求至少 4 列（物种 + 3 坐标），列数不足的行提前终止
/// 原子列表，剩余行回到不透明区间扫描。
fn parse_primcoord(lines: &[&str], start: usize) -> Result<(PrimCoord, usize)> {
    let count_line = lines
        .get(start + 1)
        .ok_or_else(|| malformed("PRIMCOORD", "missing atom count line"))?;
    let parts: Vec<&str> = count_line.split_whitespace().collect();

    let declared_count: usize = parts
        .first()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| malformed("PRIMCOORD", format!("invalid atom count line: '{}'", count_line)))?;
    let force_flag: i32 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);

    let mut atoms = Vec::new();
    let mut consumed = 2;

    for offset in 0..declared_count {
        let Some(line) = lines.get(start + 2 + offset) else {
            break;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            break;
        }

        let coords: Vec<f64> = tokens[1..4].iter().filter_map(|s| s.parse().ok()).collect();
        if coords.len() < 3 {
            return Err(malformed(
                "PRIMCOORD",
                format!("invalid atom coordinates: '{}'", line),
            ));
        }
        atoms.push(Atom::new(tokens[0], [coords[0], coords[1], coords[2]]));
        consumed += 1;
    }

    Ok((
        PrimCoord {
            keyword_line: lines[start].to_string(),
            declared_count,
            force_flag,
            atoms,
        },
        consumed,
    ))
}

/// 解析 DATAGRID_3D 块：维度行、原点行、3 个张成向量行、
/// 自由格式数值流，直到 END_DATAGRID_3D
fn parse_datagrid(
    lines: &[&str],
    start: usize,
    name: Option<String>,
) -> Result<(DataGrid3D, usize)> {
    let label = match &name {
        Some(n) => format!("DATAGRID_3D_{}", n),
        None => "DATAGRID_3D".to_string(),
    };
    let mut raw = vec![lines[start].to_string()];

    let dims_line = lines
        .get(start + 1)
        .ok_or_else(|| malformed(&label, "missing grid dimension line"))?;
    let dims_parts: Vec<usize> = dims_line
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if dims_parts.len() < 3 {
        return Err(malformed(
            &label,
            format!("invalid grid dimension line: '{}'", dims_line),
        ));
    }
    let dims = [dims_parts[0], dims_parts[1], dims_parts[2]];
    raw.push(dims_line.to_string());

    let mut origin = [0.0; 3];
    let mut vectors = [[0.0; 3]; 3];
    for row in 0..4 {
        let line = lines
            .get(start + 2 + row)
            .ok_or_else(|| malformed(&label, "missing origin/spanning vector lines"))?;
        let parts: Vec<f64> = line
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(malformed(&label, format!("invalid vector line: '{}'", line)));
        }
        if row == 0 {
            origin = [parts[0], parts[1], parts[2]];
        } else {
            vectors[row - 1] = [parts[0], parts[1], parts[2]];
        }
        raw.push(line.to_string());
    }

    // 数值流读到 END_DATAGRID_3D，数值可以任意换行
    let mut values: Vec<f64> = Vec::new();
    let mut i = start + 6;
    loop {
        let Some(line) = lines.get(i) else {
            return Err(malformed(&label, "missing END_DATAGRID_3D"));
        };
        if line.trim().starts_with("END_DATAGRID_3D") {
            raw.push(line.to_string());
            i += 1;
            break;
        }
        for token in line.split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| malformed(&label, format!("invalid data value: '{}'", token)))?;
            values.push(value);
        }
        raw.push(line.to_string());
        i += 1;
    }

    // 数值个数与声明维度对齐：多余截断，不足补零
    let expected = dims[0] * dims[1] * dims[2];
    let read_count = values.len();
    if read_count > expected {
        values.truncate(expected);
    } else if read_count < expected {
        values.resize(expected, 0.0);
    }

    Ok((
        DataGrid3D {
            name,
            dims,
            origin,
            vectors,
            values,
            read_count,
            raw,
            edited: false,
        },
        i - start,
    ))
}

// ─────────────────────────────────────────────────────────────
// 序列化
// ─────────────────────────────────────────────────────────────

/// 每行输出的网格数值个数
const VALUES_PER_LINE: usize = 6;

/// 网格块头部行数：起始行、维度行、原点行、3 个张成向量行
const GRID_HEADER_LINES: usize = 6;

/// 将 Document 序列化为 XSF 文本
///
/// 未编辑的块逐字节重现；PRIMCOORD 行和被选中网格的数值区
/// 用固定格式重新生成。
pub fn to_xsf_string(doc: &Document) -> String {
    let mut out = String::new();

    for block in &doc.blocks {
        match block {
            Block::Raw(lines) | Block::PrimVec { lines, .. } => {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Block::PrimCoord(pc) => {
                out.push_str(&pc.keyword_line);
                out.push('\n');
                out.push_str(&format!("  {:<4} {:>5}\n", pc.declared_count, pc.force_flag));
                for atom in &pc.atoms {
                    out.push_str(&format!(
                        "  {:<3} {:>14.9} {:>14.9} {:>14.9}\n",
                        atom.species, atom.position[0], atom.position[1], atom.position[2]
                    ));
                }
            }
            Block::DataGrid(grid) => {
                if grid.edited {
                    write_edited_grid(&mut out, grid);
                } else {
                    for line in &grid.raw {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
        }
    }

    out
}

fn write_edited_grid(out: &mut String, grid: &DataGrid3D) {
    let header_len = grid.raw.len().min(GRID_HEADER_LINES);
    for line in &grid.raw[..header_len] {
        out.push_str(line);
        out.push('\n');
    }

    for chunk in grid.values.chunks(VALUES_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(|v| format_scientific(*v)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }

    if let Some(end_line) = grid.raw.last() {
        out.push_str(end_line);
        out.push('\n');
    }
}

/// 固定格式科学计数法：8 位小数，带符号两位指数 (如 1.58730159E+00)
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{:.8E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exponent),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}
