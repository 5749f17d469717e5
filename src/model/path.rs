//! 路径编解码：点号路径字符串 ⇆ 路径段序列
//!
//! 路径由键段和下标段组成，例如 `a.b[2].c` 解析为
//! `[Key("a"), Key("b"), Index(2), Key("c")]`。分隔符可以自定义（默认 `.`），
//! 下标始终使用方括号。格式错误的路径一律报错，不做静默修正；
//! 连续或首尾的分隔符产生的空片段会被跳过，因此路径中不存在空段。

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::model::error::{DotError, PathErrorKind};
use crate::model::flat::DotOptions;

/// 路径中的一步
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// 对象键
    Key(String),
    /// 数组下标
    Index(usize),
}

impl Segment {
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_string())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// 分隔符不能为空，也不能包含方括号
pub(crate) fn validate_separator(separator: &str) -> Result<(), DotError> {
    if separator.is_empty() || separator.contains(['[', ']']) {
        return Err(DotError::InvalidSeparator(separator.to_string()));
    }
    Ok(())
}

/// 将路径字符串拆分为路径段
///
/// 方括号外的字符累积为键，遇到分隔符或 `[` 时输出；方括号内只允许十进制数字，
/// 遇到 `]` 时输出下标段。空路径得到空序列。
pub fn split_path(path: &str, separator: &str) -> Result<Vec<Segment>, DotError> {
    validate_separator(separator)?;

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut rest = path;

    while let Some(ch) = rest.chars().next() {
        if !in_brackets {
            if let Some(after) = rest.strip_prefix(separator) {
                flush_key(&mut segments, &mut current);
                rest = after;
                continue;
            }
        }
        match (ch, in_brackets) {
            ('[', false) => {
                flush_key(&mut segments, &mut current);
                in_brackets = true;
            }
            ('[', true) => return Err(DotError::malformed(path, PathErrorKind::NestedBracket)),
            (']', false) => {
                return Err(DotError::malformed(path, PathErrorKind::UnexpectedCloseBracket))
            }
            (']', true) => {
                segments.push(Segment::Index(parse_index(path, &current)?));
                current.clear();
                in_brackets = false;
            }
            _ => current.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }

    if in_brackets {
        return Err(DotError::malformed(path, PathErrorKind::UnterminatedBracket));
    }
    flush_key(&mut segments, &mut current);
    Ok(segments)
}

fn flush_key(segments: &mut Vec<Segment>, current: &mut String) {
    if !current.is_empty() {
        segments.push(Segment::Key(std::mem::take(current)));
    }
}

fn parse_index(path: &str, token: &str) -> Result<usize, DotError> {
    let invalid = || DotError::malformed(path, PathErrorKind::InvalidIndex(token.to_string()));
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    token.parse::<usize>().map_err(|_| invalid())
}

/// 将路径段拼接为路径字符串
///
/// 下标渲染为 `[N]` 且前面不加分隔符；键在首段之外都以分隔符开头。
/// 键本身含分隔符或方括号时结果无法被 [`split_path`] 还原。
pub fn join_path(segments: &[Segment], separator: &str) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Index(n) => {
                let _ = write!(out, "[{n}]");
            }
            Segment::Key(k) => {
                if i > 0 {
                    out.push_str(separator);
                }
                out.push_str(k);
            }
        }
    }
    out
}

/// 规范整数键（`0`、`17`，不含前导零和符号）对应的下标
pub fn canonical_index(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    key.parse().ok()
}

/// 渲染为以 `$` 开头的 JSONPath（RFC 9535）
///
/// 简单标识符使用点号形式，其余键使用带引号的方括号形式。
pub fn to_json_path(segments: &[Segment]) -> String {
    let mut out = String::from("$");
    for segment in segments {
        match segment {
            Segment::Index(n) => {
                let _ = write!(out, "[{n}]");
            }
            Segment::Key(k) if is_shorthand_name(k) => {
                out.push('.');
                out.push_str(k);
            }
            Segment::Key(k) => {
                let escaped = k.replace('\\', "\\\\").replace('\'', "\\'");
                let _ = write!(out, "['{escaped}']");
            }
        }
    }
    out
}

fn is_shorthand_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// 在前缀后追加键（根前缀为空时不加分隔符）
pub(crate) fn extend_key(prefix: &str, key: &str, separator: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{separator}{key}")
    }
}

pub(crate) fn extend_index_bracket(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// 按选项追加数组下标：方括号形式或“分隔符 + 整数”形式
pub(crate) fn extend_index(prefix: &str, index: usize, options: &DotOptions) -> String {
    if options.preserve_array_indices {
        extend_index_bracket(prefix, index)
    } else {
        extend_key(prefix, &index.to_string(), &options.separator)
    }
}
