//! 路径读写：不做完整扁平化，直接沿路径段导航

use crate::model::error::DotError;
use crate::model::flat::MAX_ARRAY_INDEX;
use crate::model::path::{canonical_index, join_path, split_path, Segment};
use crate::model::value::{Array, Value};

/// 按路径查找；`None` 表示路径不存在，`Some(Value::Undefined)` 表示路径上存的就是缺失标记
pub fn lookup(tree: &Value, path: &str, separator: &str) -> Result<Option<Value>, DotError> {
    let segments = split_path(path, separator)?;
    Ok(lookup_segments(tree, &segments))
}

pub fn lookup_segments(tree: &Value, segments: &[Segment]) -> Option<Value> {
    let mut current = tree.clone();
    for segment in segments {
        current = current.child(segment)?;
    }
    Some(current)
}

/// 按路径取值，路径不存在时返回 `Value::Undefined`
///
/// 与存有缺失标记的路径无法区分，需要区分时使用 [`lookup`]。
pub fn get(tree: &Value, path: &str, separator: &str) -> Result<Value, DotError> {
    Ok(lookup(tree, path, separator)?.unwrap_or_default())
}

/// 返回在 `path` 处写入 `value` 后的新树，不修改输入
///
/// 只复制路径经过的容器（脊），其余子树与输入共享。缺失或类型不符的中间位置
/// 会被替换为与下一段匹配的新容器（下标对应数组，键对应对象）；超出长度的
/// 下标用缺失标记补齐。空路径直接以 `value` 作为新根。
pub fn set(tree: &Value, path: &str, value: Value, separator: &str) -> Result<Value, DotError> {
    let segments = split_path(path, separator)?;
    set_segments(tree, &segments, value)
}

pub fn set_segments(tree: &Value, segments: &[Segment], value: Value) -> Result<Value, DotError> {
    let Some((last, spine)) = segments.split_last() else {
        return Ok(value);
    };

    let root = copy_or_create(tree, &segments[0]);
    let mut current = root.clone();
    for (segment, next) in spine.iter().zip(&segments[1..]) {
        let child = match current.child(segment) {
            Some(existing) => copy_or_create(&existing, next),
            None => empty_for(next),
        };
        put(&current, segment, child.clone(), segments)?;
        current = child;
    }
    put(&current, last, value, segments)?;
    Ok(root)
}

/// 容器能否承接该路径段
fn accepts(container: &Value, segment: &Segment) -> bool {
    match (container, segment) {
        (Value::Array(_), Segment::Index(_)) | (Value::Object(_), Segment::Key(_)) => true,
        (Value::Array(_), Segment::Key(key)) => canonical_index(key).is_some(),
        _ => false,
    }
}

fn empty_for(segment: &Segment) -> Value {
    match segment {
        Segment::Index(_) => Value::empty_array(),
        Segment::Key(_) => Value::empty_object(),
    }
}

fn copy_or_create(node: &Value, next: &Segment) -> Value {
    if accepts(node, next) {
        node.shallow_copy()
    } else {
        empty_for(next)
    }
}

fn put(container: &Value, segment: &Segment, value: Value, segments: &[Segment]) -> Result<(), DotError> {
    match (container, segment) {
        (Value::Array(items), Segment::Index(index)) => put_index(items, *index, value),
        (Value::Array(items), Segment::Key(key)) => match canonical_index(key) {
            Some(index) => put_index(items, index, value),
            None => Err(DotError::conflict(&join_path(segments, "."))),
        },
        (Value::Object(map), Segment::Key(key)) => {
            map.borrow_mut().insert(key.clone(), value);
            Ok(())
        }
        _ => Err(DotError::conflict(&join_path(segments, "."))),
    }
}

fn put_index(items: &Array, index: usize, value: Value) -> Result<(), DotError> {
    if index > MAX_ARRAY_INDEX {
        return Err(DotError::IndexTooLarge {
            index,
            limit: MAX_ARRAY_INDEX,
        });
    }
    let mut items = items.borrow_mut();
    if items.len() <= index {
        items.resize(index + 1, Value::Undefined);
    }
    items[index] = value;
    Ok(())
}
