//! 树形数据的路径工具库
//!
//! 提供嵌套树与点号路径扁平映射之间的双向转换、结构对比、按路径读写和深拷贝。
//! 所有操作都是同步的纯计算，不修改输入；诊断信息只通过 `tracing` 输出。
//!
//! ```
//! use dot_tree::{diff, get, to_flat, ComparisonOptions, DotOptions, Value};
//! use serde_json::json;
//!
//! let tree = Value::from(json!({"a": {"b": [1, {"c": 2}]}}));
//! let flat = to_flat(&tree, &DotOptions::default()).unwrap();
//! assert_eq!(flat.get("a.b[1].c"), Some(&Value::from(2)));
//! assert_eq!(get(&tree, "a.b[0]", ".").unwrap(), Value::from(1));
//!
//! let changed = Value::from(json!({"a": {"b": [1, {"c": 3}]}}));
//! let d = diff(&tree, &changed, &ComparisonOptions::default()).unwrap();
//! assert!(d.modified.contains_key("a.b[1].c"));
//! ```

pub mod model;

// 重新导出主要类型
pub use model::access::{get, lookup, lookup_segments, set, set_segments};
pub use model::comparison::{diff, is_equal, ComparisonOptions, JsonDiff, Modification, TypeChange};
pub use model::deep_clone::{deep_clone, deep_clone_with_limit};
pub use model::error::{DotError, PathErrorKind};
pub use model::flat::{
    flatten, from_flat, to_flat, unflatten, DotOptions, FlatMap, DEFAULT_MAX_DEPTH,
    DEFAULT_SEPARATOR, MAX_ARRAY_INDEX,
};
pub use model::path::{canonical_index, join_path, split_path, to_json_path, Segment};
pub use model::shadow_tree::{outline, TreeNode};
pub use model::value::{classify, is_leaf, Value, ValueKind};
