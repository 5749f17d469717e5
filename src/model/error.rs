//! 错误类型：路径解析、遍历保护与扁平映射重建中的所有失败

use thiserror::Error;

/// 路径解析失败的具体原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathErrorKind {
    #[error("方括号未闭合")]
    UnterminatedBracket,
    #[error("多余的右方括号")]
    UnexpectedCloseBracket,
    #[error("方括号不能嵌套")]
    NestedBracket,
    #[error("无效的数组下标: {0:?}")]
    InvalidIndex(String),
}

#[derive(Error, Debug)]
pub enum DotError {
    #[error("路径格式错误 {path:?}: {kind}")]
    MalformedPath { path: String, kind: PathErrorKind },
    #[error("无效分隔符: {0:?}")]
    InvalidSeparator(String),
    #[error("检测到循环引用: {path:?}")]
    CyclicStructure { path: String },
    #[error("嵌套深度超过上限 {limit}: {path:?}")]
    DepthLimitExceeded { path: String, limit: usize },
    #[error("路径冲突: {path:?}")]
    PathConflict { path: String },
    #[error("扁平映射中的值必须是叶子节点: {path:?}")]
    NonLeafValue { path: String },
    #[error("数组下标 {index} 超过上限 {limit}")]
    IndexTooLarge { index: usize, limit: usize },
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl DotError {
    pub(crate) fn malformed(path: &str, kind: PathErrorKind) -> Self {
        DotError::MalformedPath {
            path: path.to_string(),
            kind,
        }
    }

    pub(crate) fn conflict(path: &str) -> Self {
        DotError::PathConflict {
            path: path.to_string(),
        }
    }
}
