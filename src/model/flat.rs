//! 扁平化引擎：嵌套树 ⇆ 路径到叶子值的扁平映射
//!
//! `to_flat` 先序深度优先遍历，每个叶子产生一条 `路径 -> 值`；空数组和空对象
//! 不产生任何条目（已知的有损情形）。`from_flat` 是其逆过程，结果与条目的
//! 处理顺序无关，路径之间互相矛盾时报告 [`DotError::PathConflict`]。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::error::DotError;
use crate::model::path::{
    canonical_index, extend_index, extend_key, split_path, validate_separator, Segment,
};
use crate::model::value::Value;
use crate::model::walk::CycleGuard;

pub const DEFAULT_SEPARATOR: &str = ".";
/// 默认最大嵌套层数，超过后返回错误而不是耗尽栈
pub const DEFAULT_MAX_DEPTH: usize = 512;
/// 数组下标上限，防止稀疏下标触发巨量分配
pub const MAX_ARRAY_INDEX: usize = 1_000_000;

/// 路径到叶子值的映射，按遍历顺序保存
pub type FlatMap = IndexMap<String, Value>;

/// 点号路径相关选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DotOptions {
    /// 非下标段之间的分隔符
    pub separator: String,
    /// 数组元素使用 `[N]` 形式（否则为“分隔符 + 整数”）
    pub preserve_array_indices: bool,
    /// 最大嵌套层数
    pub max_depth: usize,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            preserve_array_indices: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DotOptions {
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DotError> {
        validate_separator(&self.separator)
    }

    /// 按选项解析路径；非下标模式下规范整数键视为下标
    pub(crate) fn split(&self, path: &str) -> Result<Vec<Segment>, DotError> {
        let mut segments = split_path(path, &self.separator)?;
        if !self.preserve_array_indices {
            for segment in &mut segments {
                if let Segment::Key(key) = segment {
                    if let Some(index) = canonical_index(key) {
                        *segment = Segment::Index(index);
                    }
                }
            }
        }
        Ok(segments)
    }
}

/// 将树展开为扁平映射
pub fn to_flat(tree: &Value, options: &DotOptions) -> Result<FlatMap, DotError> {
    options.validate()?;

    fn walk(
        out: &mut FlatMap,
        guard: &mut CycleGuard,
        options: &DotOptions,
        node: &Value,
        path: &str,
        depth: usize,
    ) -> Result<(), DotError> {
        let id = guard.enter(node, path, depth)?;
        match node {
            Value::Array(items) => {
                for (idx, child) in items.borrow().iter().enumerate() {
                    let item_path = extend_index(path, idx, options);
                    walk(out, guard, options, child, &item_path, depth + 1)?;
                }
            }
            Value::Object(map) => {
                for (key, child) in map.borrow().iter() {
                    let field_path = extend_key(path, key, &options.separator);
                    walk(out, guard, options, child, &field_path, depth + 1)?;
                }
            }
            leaf => {
                out.insert(path.to_string(), leaf.clone());
            }
        }
        guard.leave(id);
        Ok(())
    }

    let mut out = FlatMap::new();
    let mut guard = CycleGuard::new(options.max_depth);
    walk(&mut out, &mut guard, options, tree, "", 0)?;
    tracing::debug!(entries = out.len(), "扁平化完成");
    Ok(out)
}

/// 重建过程中的占位树：`Vacant` 表示尚未写入（数组空洞或刚创建的位置）
enum Slot {
    Vacant,
    Leaf(Value),
    Array(Vec<Slot>),
    Object(IndexMap<String, Slot>),
}

impl Slot {
    /// 确保当前位置是与路径段匹配的容器，返回子位置
    fn descend(&mut self, segment: &Segment, path: &str) -> Result<&mut Slot, DotError> {
        if matches!(self, Slot::Vacant) {
            *self = match segment {
                Segment::Index(_) => Slot::Array(Vec::new()),
                Segment::Key(_) => Slot::Object(IndexMap::new()),
            };
        }
        match (self, segment) {
            (Slot::Array(items), Segment::Index(index)) => {
                let index = *index;
                if index > MAX_ARRAY_INDEX {
                    return Err(DotError::IndexTooLarge {
                        index,
                        limit: MAX_ARRAY_INDEX,
                    });
                }
                if items.len() <= index {
                    items.resize_with(index + 1, || Slot::Vacant);
                }
                Ok(&mut items[index])
            }
            (Slot::Object(entries), Segment::Key(key)) => {
                Ok(entries.entry(key.clone()).or_insert(Slot::Vacant))
            }
            _ => Err(DotError::conflict(path)),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Slot::Vacant => Value::Undefined,
            Slot::Leaf(value) => value,
            Slot::Array(items) => Value::array(items.into_iter().map(Slot::into_value)),
            Slot::Object(entries) => {
                Value::object(entries.into_iter().map(|(k, slot)| (k, slot.into_value())))
            }
        }
    }
}

/// 由扁平映射重建嵌套树
///
/// 下一段为下标时创建数组，否则创建对象；已存在的容器不会被覆盖。
/// 空映射得到空对象，空路径 `""` 上的条目成为根叶子。
pub fn from_flat(flat: &FlatMap, options: &DotOptions) -> Result<Value, DotError> {
    options.validate()?;

    let mut root = Slot::Vacant;
    for (path, value) in flat {
        if !value.is_leaf() {
            return Err(DotError::NonLeafValue { path: path.clone() });
        }
        let segments = options.split(path)?;
        if segments.len() > options.max_depth {
            return Err(DotError::DepthLimitExceeded {
                path: path.clone(),
                limit: options.max_depth,
            });
        }

        let mut slot = &mut root;
        for segment in &segments {
            slot = slot.descend(segment, path)?;
        }
        if !matches!(slot, Slot::Vacant) {
            return Err(DotError::conflict(path));
        }
        *slot = Slot::Leaf(value.clone());
    }

    let tree = match root {
        Slot::Vacant => Value::empty_object(),
        filled => filled.into_value(),
    };
    tracing::debug!(entries = flat.len(), "扁平映射重建完成");
    Ok(tree)
}

/// `to_flat` 的便捷形式，仅指定分隔符
pub fn flatten(tree: &Value, separator: &str) -> Result<FlatMap, DotError> {
    to_flat(tree, &DotOptions::with_separator(separator))
}

/// `from_flat` 的便捷形式，仅指定分隔符
pub fn unflatten(flat: &FlatMap, separator: &str) -> Result<Value, DotError> {
    from_flat(flat, &DotOptions::with_separator(separator))
}
