//! 深拷贝：按容器身份记录已拷贝节点，保留共享与循环拓扑

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::model::error::DotError;
use crate::model::flat::DEFAULT_MAX_DEPTH;
use crate::model::path::{join_path, Segment};
use crate::model::value::Value;

/// 生成与输入结构相同、但不共享任何容器的副本
///
/// 输入中被多处引用的容器在副本中同样只有一份；循环输入得到相同拓扑的循环副本。
pub fn deep_clone(value: &Value) -> Result<Value, DotError> {
    deep_clone_with_limit(value, DEFAULT_MAX_DEPTH)
}

pub fn deep_clone_with_limit(value: &Value, max_depth: usize) -> Result<Value, DotError> {
    let mut cloner = Cloner {
        seen: HashMap::new(),
        trail: Vec::new(),
        max_depth,
    };
    cloner.clone_node(value)
}

struct Cloner {
    /// 原容器身份 -> 已分配的副本（单次调用内有效）
    seen: HashMap<usize, Value>,
    trail: Vec<Segment>,
    max_depth: usize,
}

impl Cloner {
    fn clone_node(&mut self, value: &Value) -> Result<Value, DotError> {
        let Some(id) = value.container_id() else {
            return Ok(value.clone());
        };
        if let Some(copy) = self.seen.get(&id) {
            return Ok(copy.clone());
        }
        if self.trail.len() >= self.max_depth {
            return Err(DotError::DepthLimitExceeded {
                path: join_path(&self.trail, "."),
                limit: self.max_depth,
            });
        }

        match value {
            Value::Array(items) => {
                let items = items.borrow();
                let copy = Rc::new(RefCell::new(Vec::with_capacity(items.len())));
                // 先登记再递归，循环引用才能回到这份副本
                self.seen.insert(id, Value::Array(copy.clone()));
                for (idx, child) in items.iter().enumerate() {
                    self.trail.push(Segment::Index(idx));
                    let child_copy = self.clone_node(child)?;
                    self.trail.pop();
                    copy.borrow_mut().push(child_copy);
                }
                Ok(Value::Array(copy))
            }
            Value::Object(map) => {
                let map = map.borrow();
                let copy = Rc::new(RefCell::new(IndexMap::with_capacity(map.len())));
                self.seen.insert(id, Value::Object(copy.clone()));
                for (key, child) in map.iter() {
                    self.trail.push(Segment::Key(key.clone()));
                    let child_copy = self.clone_node(child)?;
                    self.trail.pop();
                    copy.borrow_mut().insert(key.clone(), child_copy);
                }
                Ok(Value::Object(copy))
            }
            leaf => Ok(leaf.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 收集树中所有容器的身份（树必须无环）
    fn container_ids(value: &Value, out: &mut Vec<usize>) {
        if let Some(id) = value.container_id() {
            out.push(id);
        }
        match value {
            Value::Array(items) => items.borrow().iter().for_each(|v| container_ids(v, out)),
            Value::Object(map) => map.borrow().values().for_each(|v| container_ids(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_clone_primitives() {
        for leaf in [Value::from(1), Value::from("hello"), Value::from(true), Value::Null, Value::Undefined] {
            assert_eq!(deep_clone(&leaf).unwrap(), leaf);
        }
    }

    #[test]
    fn test_clone_shares_no_containers() {
        let original = Value::from(json!({"a": 1, "b": [2, 3], "c": {"d": [4, {"e": 5}]}}));
        let copy = deep_clone(&original).unwrap();
        assert_eq!(copy, original);

        let mut before = Vec::new();
        let mut after = Vec::new();
        container_ids(&original, &mut before);
        container_ids(&copy, &mut after);
        assert_eq!(before.len(), after.len());
        assert!(after.iter().all(|id| !before.contains(id)), "副本不应共享任何容器");
    }

    #[test]
    fn test_clone_is_idempotent() {
        let original = Value::from(json!([1, [2, [3]], {"x": null}]));
        let once = deep_clone(&original).unwrap();
        let twice = deep_clone(&once).unwrap();
        assert_eq!(twice, once);
        assert!(!twice.same_ref(&once));
        assert!(!twice.same_ref(&original));
    }

    #[test]
    fn test_clone_preserves_shared_substructure() {
        let shared = Value::from(json!({"k": "v"}));
        let original = Value::array([shared.clone(), shared.clone()]);
        let copy = deep_clone(&original).unwrap();

        let first = copy.child(&Segment::Index(0)).unwrap();
        let second = copy.child(&Segment::Index(1)).unwrap();
        assert!(first.same_ref(&second), "共享的子树在副本中仍然共享");
        assert!(!first.same_ref(&shared));
    }

    #[test]
    fn test_clone_self_referential_object() {
        let original = Value::object([("a", Value::from(1))]);
        if let Value::Object(map) = &original {
            map.borrow_mut().insert("self".into(), original.clone());
        }

        let copy = deep_clone(&original).unwrap();
        assert!(!copy.same_ref(&original));
        let inner = copy.child(&Segment::key("self")).unwrap();
        assert!(inner.same_ref(&copy), "循环应指向副本自身");
        assert_eq!(copy.child(&Segment::key("a")), Some(Value::from(1)));

        for v in [&original, &copy] {
            if let Value::Object(map) = v {
                map.borrow_mut().shift_remove("self");
            }
        }
    }

    #[test]
    fn test_clone_depth_limit() {
        let mut node = Value::Null;
        for _ in 0..6 {
            node = Value::object([("n", node)]);
        }
        let err = deep_clone_with_limit(&node, 3).unwrap_err();
        assert!(matches!(err, DotError::DepthLimitExceeded { ref path, limit: 3 } if path == "n.n.n"));
    }
}
