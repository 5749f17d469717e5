//! 结构对比：两棵树各自扁平化后逐路径分类为新增/删除/修改/类型变化

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::error::DotError;
use crate::model::flat::{to_flat, DotOptions, FlatMap};
use crate::model::value::{classify, Value, ValueKind};

/// 对比选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonOptions {
    #[serde(flatten)]
    pub dot: DotOptions,
    /// 两侧都是字符串时忽略大小写
    pub ignore_case: bool,
    /// 任一侧为缺失标记时不记录差异
    pub ignore_undefined: bool,
}

/// 同类型值的修改
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub old: Value,
    pub new: Value,
}

/// 运行时类型的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub old: ValueKind,
    pub new: ValueKind,
}

/// 四类差异，键为路径字符串，彼此互不相交
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDiff {
    /// 只存在于目标中
    pub added: FlatMap,
    /// 只存在于源中
    pub removed: FlatMap,
    pub modified: IndexMap<String, Modification>,
    pub type_changes: IndexMap<String, TypeChange>,
}

impl JsonDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.type_changes.is_empty()
    }

    /// 差异条目总数
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len() + self.type_changes.len()
    }

    /// 生成 JSON 报告：`added` / `removed` / `modified{old,new}` / `typeChanges{old,new}`
    pub fn to_json(&self) -> Result<serde_json::Value, DotError> {
        fn leaves(map: &FlatMap) -> Result<serde_json::Value, DotError> {
            let mut out = serde_json::Map::new();
            for (path, value) in map {
                out.insert(path.clone(), value.to_json()?);
            }
            Ok(serde_json::Value::Object(out))
        }

        let mut modified = serde_json::Map::new();
        for (path, change) in &self.modified {
            modified.insert(
                path.clone(),
                serde_json::json!({"old": change.old.to_json()?, "new": change.new.to_json()?}),
            );
        }
        let mut type_changes = serde_json::Map::new();
        for (path, change) in &self.type_changes {
            type_changes.insert(path.clone(), serde_json::to_value(change)?);
        }

        Ok(serde_json::json!({
            "added": leaves(&self.added)?,
            "removed": leaves(&self.removed)?,
            "modified": modified,
            "typeChanges": type_changes,
        }))
    }
}

/// 严格相等：叶子按值比较（数字按 IEEE 语义），容器按身份比较
fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        _ => a.same_ref(b),
    }
}

/// 计算从 `source` 到 `target` 的结构差异
pub fn diff(source: &Value, target: &Value, options: &ComparisonOptions) -> Result<JsonDiff, DotError> {
    let before = to_flat(source, &options.dot)?;
    let after = to_flat(target, &options.dot)?;
    let mut result = JsonDiff::default();

    for (path, new) in &after {
        let Some(old) = before.get(path) else {
            if !(options.ignore_undefined && new.is_undefined()) {
                result.added.insert(path.clone(), new.clone());
            }
            continue;
        };
        if options.ignore_undefined && (old.is_undefined() || new.is_undefined()) {
            continue;
        }
        match (old, new) {
            (Value::String(a), Value::String(b)) if options.ignore_case => {
                if a.to_lowercase() != b.to_lowercase() {
                    result.modified.insert(
                        path.clone(),
                        Modification {
                            old: old.clone(),
                            new: new.clone(),
                        },
                    );
                }
            }
            _ if !strict_equals(old, new) => {
                let (old_kind, new_kind) = (classify(old), classify(new));
                if old_kind != new_kind {
                    result.type_changes.insert(
                        path.clone(),
                        TypeChange {
                            old: old_kind,
                            new: new_kind,
                        },
                    );
                } else {
                    result.modified.insert(
                        path.clone(),
                        Modification {
                            old: old.clone(),
                            new: new.clone(),
                        },
                    );
                }
            }
            _ => {}
        }
    }

    for (path, old) in &before {
        if after.contains_key(path) || (options.ignore_undefined && old.is_undefined()) {
            continue;
        }
        result.removed.insert(path.clone(), old.clone());
    }

    tracing::debug!(
        added = result.added.len(),
        removed = result.removed.len(),
        modified = result.modified.len(),
        type_changes = result.type_changes.len(),
        "结构对比完成"
    );
    Ok(result)
}

/// 两棵树在给定选项下是否没有任何差异
///
/// 完整差异只在 `trace` 级别输出，没有订阅者时不产生任何副作用。
pub fn is_equal(a: &Value, b: &Value, options: &ComparisonOptions) -> Result<bool, DotError> {
    let result = diff(a, b, options)?;
    tracing::trace!(diff = ?result, "相等性检查");
    Ok(result.is_empty())
}
