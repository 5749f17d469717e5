//! 树值模型：封闭标签枚举 + 引用计数容器
//!
//! 容器（数组/对象）以 `Rc<RefCell<..>>` 持有，`Value::clone()` 只复制句柄，
//! 因而子树可以在多棵树之间共享，也可以构成循环。需要独立副本时使用
//! [`deep_clone`](crate::deep_clone)。循环结构在调用方断开前不会被释放。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::error::DotError;
use crate::model::flat::DEFAULT_MAX_DEPTH;
use crate::model::path::{canonical_index, extend_index_bracket, extend_key, Segment};
use crate::model::walk::CycleGuard;

/// JS 安全整数上限，超出后数字按浮点输出
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// 树节点
///
/// 结构相等（`==`）只对无环树有定义；对象比较与键顺序无关。
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    /// 缺失标记，区别于 `Null`
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
}

/// 运行时类型标签（所有组件都基于它分支）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Array,
    Object,
    Boolean,
    Number,
    String,
    Undefined,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 判定值的运行时类型
pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Undefined => ValueKind::Undefined,
        Value::Null => ValueKind::Null,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Number(_) => ValueKind::Number,
        Value::String(_) => ValueKind::String,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
    }
}

/// 是否为叶子（缺失标记、布尔、数字、字符串、null）
pub fn is_leaf(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn empty_array() -> Self {
        Value::array([])
    }

    pub fn empty_object() -> Self {
        Value::Object(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// 解析 JSON 文本（保留对象键的文档顺序）
    pub fn from_json_str(text: &str) -> Result<Self, DotError> {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        Ok(Value::from(parsed))
    }

    pub fn kind(&self) -> ValueKind {
        classify(self)
    }

    pub fn is_leaf(&self) -> bool {
        is_leaf(self)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// 子元素数量（对象字段数 / 数组长度），叶子为 0
    pub fn child_count(&self) -> usize {
        match self {
            Value::Array(items) => items.borrow().len(),
            Value::Object(map) => map.borrow().len(),
            _ => 0,
        }
    }

    /// 容器的身份标识（`Rc` 地址）；叶子没有身份
    pub fn container_id(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(Rc::as_ptr(items) as *const () as usize),
            Value::Object(map) => Some(Rc::as_ptr(map) as *const () as usize),
            _ => None,
        }
    }

    /// 两个值是否引用同一个容器
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self.container_id(), other.container_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// 浅拷贝：新建一层容器，子节点句柄与原容器共享
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(Rc::new(RefCell::new(items.borrow().clone()))),
            Value::Object(map) => Value::Object(Rc::new(RefCell::new(map.borrow().clone()))),
            leaf => leaf.clone(),
        }
    }

    /// 沿一个路径段取子节点（共享句柄）
    ///
    /// 规范整数形式的键也可以访问数组元素，与数组的对象语义一致。
    pub fn child(&self, segment: &Segment) -> Option<Value> {
        match (self, segment) {
            (Value::Array(items), Segment::Index(index)) => items.borrow().get(*index).cloned(),
            (Value::Array(items), Segment::Key(key)) => {
                let index = canonical_index(key)?;
                items.borrow().get(index).cloned()
            }
            (Value::Object(map), Segment::Key(key)) => map.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// 转换为 `serde_json::Value`
    ///
    /// 对象中的缺失标记被省略，数组中和根上的缺失标记输出为 `null`；
    /// 非有限数字输出为 `null`。循环结构返回错误。
    pub fn to_json(&self) -> Result<serde_json::Value, DotError> {
        fn convert(
            node: &Value,
            guard: &mut CycleGuard,
            path: &str,
            depth: usize,
        ) -> Result<serde_json::Value, DotError> {
            let id = guard.enter(node, path, depth)?;
            let out = match node {
                Value::Undefined | Value::Null => serde_json::Value::Null,
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Number(n) => number_to_json(*n),
                Value::String(s) => serde_json::Value::String(s.clone()),
                Value::Array(items) => {
                    let items = items.borrow();
                    let mut out = Vec::with_capacity(items.len());
                    for (idx, child) in items.iter().enumerate() {
                        let child_path = extend_index_bracket(path, idx);
                        out.push(convert(child, guard, &child_path, depth + 1)?);
                    }
                    serde_json::Value::Array(out)
                }
                Value::Object(map) => {
                    let mut out = serde_json::Map::new();
                    for (key, child) in map.borrow().iter() {
                        if child.is_undefined() {
                            continue;
                        }
                        let child_path = extend_key(path, key, ".");
                        out.insert(key.clone(), convert(child, guard, &child_path, depth + 1)?);
                    }
                    serde_json::Value::Object(out)
                }
            };
            guard.leave(id);
            Ok(out)
        }

        let mut guard = CycleGuard::new(DEFAULT_MAX_DEPTH);
        convert(self, &mut guard, "", 0)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

/// 带祖先记录的调试输出，重新进入祖先容器时打印 `<cycle>`
struct Guarded<'a> {
    value: &'a Value,
    ancestors: &'a RefCell<Vec<usize>>,
}

impl Guarded<'_> {
    fn child<'b>(&'b self, value: &'b Value) -> Guarded<'b> {
        Guarded {
            value,
            ancestors: self.ancestors,
        }
    }
}

impl fmt::Debug for Guarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = self.value.container_id() else {
            return match self.value {
                Value::Undefined => f.write_str("undefined"),
                Value::Null => f.write_str("null"),
                Value::Bool(b) => write!(f, "{b}"),
                Value::Number(n) => write!(f, "{n}"),
                Value::String(s) => write!(f, "{s:?}"),
                Value::Array(_) | Value::Object(_) => Ok(()),
            };
        };
        if self.ancestors.borrow().contains(&id) {
            return f.write_str("<cycle>");
        }
        self.ancestors.borrow_mut().push(id);
        let res = match self.value {
            Value::Array(items) => f
                .debug_list()
                .entries(items.borrow().iter().map(|v| self.child(v)))
                .finish(),
            Value::Object(map) => f
                .debug_map()
                .entries(map.borrow().iter().map(|(k, v)| (k, self.child(v))))
                .finish(),
            _ => Ok(()),
        };
        self.ancestors.borrow_mut().pop();
        res
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ancestors = RefCell::new(Vec::new());
        Guarded {
            value: self,
            ancestors: &ancestors,
        }
        .fmt(f)
    }
}
