//! # HSD 格式读写
//!
//! Fortnet 的输入文件使用 HSD（Human-friendly Structured Data）格式。
//!
//! ## HSD 格式说明
//! ```text
//! Options {
//!   Mode = "predict"
//!   ReadNetStats = Yes
//! }
//! Analysis {
//!   Forces {
//!     FiniteDifferences {}
//!   }
//! }
//! ```
//!
//! 支持的子集：`键 = 值`、`键 { ... }`、`键 = 方法 { ... }`、`#` 注释。
//! 逻辑值写为 `Yes`/`No`，字符串带双引号，实数使用科学计数法。
//!
//! ## 依赖关系
//! - 被 `input` 使用
//! - 无外部模块依赖

use crate::error::{FnetAseError, Result};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

/// 叶子值
#[derive(Debug, Clone, PartialEq)]
pub enum HsdValue {
    Text(String),
    Logical(bool),
    Integer(i64),
    Real(f64),
}

impl HsdValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HsdValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            HsdValue::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            HsdValue::Real(x) => Some(*x),
            HsdValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// 解析未加引号的值
    fn from_bare(word: &str) -> Self {
        if word.eq_ignore_ascii_case("yes") {
            return HsdValue::Logical(true);
        }
        if word.eq_ignore_ascii_case("no") {
            return HsdValue::Logical(false);
        }
        if let Ok(i) = word.parse::<i64>() {
            return HsdValue::Integer(i);
        }
        // Fortran 风格的 1.0d-2 也接受
        if let Ok(x) = word.replace(|c: char| c == 'd' || c == 'D', "e").parse::<f64>() {
            return HsdValue::Real(x);
        }
        HsdValue::Text(word.to_string())
    }
}

impl fmt::Display for HsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // HSD 没有转义，含双引号的文本改用单引号
            HsdValue::Text(s) if s.contains('"') => write!(f, "'{}'", s),
            HsdValue::Text(s) => write!(f, "\"{}\"", s),
            HsdValue::Logical(true) => write!(f, "Yes"),
            HsdValue::Logical(false) => write!(f, "No"),
            HsdValue::Integer(i) => write!(f, "{}", i),
            HsdValue::Real(x) => write!(f, "{:e}", x),
        }
    }
}

/// 节点：值或子块
#[derive(Debug, Clone, PartialEq)]
pub enum HsdNode {
    Value(HsdValue),
    Block(HsdBlock),
}

/// 有序的键值块
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HsdBlock {
    entries: Vec<(String, HsdNode)>,
}

impl HsdBlock {
    pub fn new() -> Self {
        HsdBlock::default()
    }

    pub fn entries(&self) -> &[(String, HsdNode)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 设置值，已有同名键时覆盖
    pub fn set(&mut self, key: &str, value: HsdValue) -> &mut Self {
        self.insert(key, HsdNode::Value(value));
        self
    }

    /// 获取子块，不存在则创建
    pub fn block_mut(&mut self, key: &str) -> &mut HsdBlock {
        let pos = match self.position(key) {
            Some(pos) if matches!(self.entries[pos].1, HsdNode::Block(_)) => pos,
            _ => {
                self.insert(key, HsdNode::Block(HsdBlock::new()));
                self.position(key).unwrap_or(self.entries.len() - 1)
            }
        };
        match &mut self.entries[pos].1 {
            HsdNode::Block(block) => block,
            HsdNode::Value(_) => unreachable!("entry was just replaced by a block"),
        }
    }

    /// 按 `A/B/C` 路径查找节点，键大小写不敏感
    pub fn get(&self, path: &str) -> Option<&HsdNode> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let first = parts.next()?;
        let mut node = self.find(first)?;
        for part in parts {
            node = match node {
                HsdNode::Block(block) => block.find(part)?,
                HsdNode::Value(_) => return None,
            };
        }
        Some(node)
    }

    pub fn value(&self, path: &str) -> Option<&HsdValue> {
        match self.get(path)? {
            HsdNode::Value(v) => Some(v),
            HsdNode::Block(_) => None,
        }
    }

    pub fn block(&self, path: &str) -> Option<&HsdBlock> {
        match self.get(path)? {
            HsdNode::Block(b) => Some(b),
            HsdNode::Value(_) => None,
        }
    }

    fn find(&self, key: &str) -> Option<&HsdNode> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    fn insert(&mut self, key: &str, node: HsdNode) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = node,
            None => self.entries.push((key.to_string(), node)),
        }
    }

    fn render(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (key, node) in &self.entries {
            match node {
                HsdNode::Value(v) => {
                    let _ = writeln!(out, "{}{} = {}", indent, key, v);
                }
                HsdNode::Block(b) if b.is_empty() => {
                    let _ = writeln!(out, "{}{} {{}}", indent, key);
                }
                HsdNode::Block(b) => {
                    let _ = writeln!(out, "{}{} {{", indent, key);
                    b.render(out, depth + 1);
                    let _ = writeln!(out, "{}}}", indent);
                }
            }
        }
    }

    /// 解析 HSD 文本
    pub fn parse(content: &str) -> Result<Self> {
        let tokens = tokenize(content)?;
        let mut pos = 0;
        let block = parse_block(&tokens, &mut pos, false)?;
        Ok(block)
    }
}

impl fmt::Display for HsdBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, 0);
        f.write_str(&out)
    }
}

/// 写入 HSD 文件
pub fn write_hsd_file(block: &HsdBlock, path: &Path) -> Result<()> {
    fs::write(path, block.to_string()).map_err(|e| FnetAseError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 读取 HSD 文件
pub fn read_hsd_file(path: &Path) -> Result<HsdBlock> {
    let content = fs::read_to_string(path).map_err(|e| FnetAseError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    HsdBlock::parse(&content).map_err(|e| match e {
        FnetAseError::ParseError { format, reason, .. } => FnetAseError::ParseError {
            format,
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

// ─────────────────────────────────────────────────────────────
// 词法与语法分析
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Equals,
    Open,
    Close,
}

fn parse_error(reason: impl Into<String>) -> FnetAseError {
    FnetAseError::ParseError {
        format: "hsd".to_string(),
        path: "<input>".to_string(),
        reason: reason.into(),
    }
}

fn tokenize(content: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ';' => {
                chars.next();
            }
            '#' => {
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
            }
            '{' => {
                chars.next();
                tokens.push(Token::Open);
            }
            '}' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => text.push(c),
                        None => return Err(parse_error("Unterminated string")),
                    }
                }
                tokens.push(Token::Quoted(text));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '=' | '{' | '}' | '#' | '"' | '\'' | ';') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

fn parse_block(tokens: &[Token], pos: &mut usize, nested: bool) -> Result<HsdBlock> {
    let mut block = HsdBlock::new();

    loop {
        let key = match tokens.get(*pos) {
            None if nested => return Err(parse_error("Missing closing '}'")),
            None => return Ok(block),
            Some(Token::Close) if nested => {
                *pos += 1;
                return Ok(block);
            }
            Some(Token::Word(key)) => key.clone(),
            Some(other) => return Err(parse_error(format!("Unexpected token {:?}", other))),
        };
        *pos += 1;

        match tokens.get(*pos) {
            Some(Token::Open) => {
                *pos += 1;
                let child = parse_block(tokens, pos, true)?;
                block.insert(&key, HsdNode::Block(child));
            }
            Some(Token::Equals) => {
                *pos += 1;
                match tokens.get(*pos) {
                    Some(Token::Quoted(text)) => {
                        *pos += 1;
                        block.set(&key, HsdValue::Text(text.clone()));
                    }
                    Some(Token::Word(word)) => {
                        *pos += 1;
                        if tokens.get(*pos) == Some(&Token::Open) {
                            // 方法语法: Key = Method { ... }
                            *pos += 1;
                            let inner = parse_block(tokens, pos, true)?;
                            let mut method = HsdBlock::new();
                            method.insert(word, HsdNode::Block(inner));
                            block.insert(&key, HsdNode::Block(method));
                        } else {
                            block.set(&key, HsdValue::from_bare(word));
                        }
                    }
                    _ => return Err(parse_error(format!("Missing value for '{}'", key))),
                }
            }
            _ => return Err(parse_error(format!("Expected '=' or '{{' after '{}'", key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_and_empty_blocks() {
        let mut root = HsdBlock::new();
        root.block_mut("Options")
            .set("Mode", HsdValue::Text("predict".to_string()))
            .set("ReadNetStats", HsdValue::Logical(true));
        root.block_mut("Analysis")
            .block_mut("Forces")
            .block_mut("FiniteDifferences");

        let text = root.to_string();
        assert_eq!(
            text,
            "Options {\n  Mode = \"predict\"\n  ReadNetStats = Yes\n}\n\
             Analysis {\n  Forces {\n    FiniteDifferences {}\n  }\n}\n"
        );
    }

    #[test]
    fn test_parse_values_and_comments() {
        let text = r#"
# Fortnet input
Options {
  Mode = predict   # bare word
  WriteIterationTrajectory = No
}
Data { Dataset = "fnetdata.hdf5"; NetstatFile = 'fortnet.hdf5' }
Analysis {
  Forces {
    FiniteDifferences { Delta = 1.0d-2 }
  }
}
"#;
        let root = HsdBlock::parse(text).unwrap();
        assert_eq!(root.value("Options/Mode").and_then(|v| v.as_text()), Some("predict"));
        assert_eq!(
            root.value("options/writeiterationtrajectory").and_then(|v| v.as_logical()),
            Some(false)
        );
        assert_eq!(
            root.value("Data/NetstatFile").and_then(|v| v.as_text()),
            Some("fortnet.hdf5")
        );
        assert_eq!(
            root.value("Analysis/Forces/FiniteDifferences/Delta").and_then(|v| v.as_real()),
            Some(0.01)
        );
    }

    #[test]
    fn test_parse_method_syntax() {
        let root = HsdBlock::parse("Driver = Steepest { Steps = 10 }").unwrap();
        assert!(root.block("Driver/Steepest").is_some());
        assert_eq!(
            root.value("Driver/Steepest/Steps"),
            Some(&HsdValue::Integer(10))
        );
    }

    #[test]
    fn test_rendered_real_parses_back_exactly() {
        let delta = 0.01 / 0.529177249;
        let mut root = HsdBlock::new();
        root.set("Delta", HsdValue::Real(delta));
        let parsed = HsdBlock::parse(&root.to_string()).unwrap();
        assert_eq!(parsed.value("Delta").and_then(|v| v.as_real()), Some(delta));
    }

    #[test]
    fn test_text_with_double_quote_uses_single_quotes() {
        let value = HsdValue::Text("a \"b\".hdf5".to_string());
        assert_eq!(value.to_string(), "'a \"b\".hdf5'");
        assert_eq!(HsdValue::Text("it's".to_string()).to_string(), "\"it's\"");

        let mut root = HsdBlock::new();
        root.set("NetstatFile", value.clone());
        let parsed = HsdBlock::parse(&root.to_string()).unwrap();
        assert_eq!(parsed.value("NetstatFile"), Some(&value));
    }

    #[test]
    fn test_parse_errors() {
        assert!(HsdBlock::parse("Options {").is_err());
        assert!(HsdBlock::parse("Mode =").is_err());
        assert!(HsdBlock::parse("Mode = \"predict").is_err());
        assert!(HsdBlock::parse("= 3").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fortnet_in.hsd");
        let mut root = HsdBlock::new();
        root.block_mut("Data")
            .set("Dataset", HsdValue::Text("fnetdata.hdf5".to_string()));
        write_hsd_file(&root, &path).unwrap();
        assert_eq!(read_hsd_file(&path).unwrap(), root);
    }
}
