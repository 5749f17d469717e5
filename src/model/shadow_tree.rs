//! 影子树（Shadow Tree）：按先序列出所有节点（含容器与空容器）的路径与概要，不复制大值

use crate::model::error::DotError;
use crate::model::flat::DotOptions;
use crate::model::path::{extend_index, extend_key, to_json_path, Segment};
use crate::model::value::{Value, ValueKind};
use crate::model::walk::CycleGuard;

/// 字符串预览的最大字符数
const PREVIEW_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// 节点在父级中的键名或 `[索引]`，根节点为 `$`
    pub name: String,
    /// 点号路径（与扁平映射的键一致），根节点为空串
    pub path: String,
    /// RFC 9535 JSONPath
    pub json_path: String,
    pub kind: ValueKind,
    /// 子元素数量（对象字段数 / 数组长度）
    pub children: usize,
    /// 轻量预览（字符串截断、数字/布尔/空的简短描述）
    pub preview: String,
    pub depth: usize,
}

fn preview_of(v: &Value) -> String {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if s.chars().count() > PREVIEW_CHARS {
                let truncated: String = s.chars().take(PREVIEW_CHARS).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Object(m) => format!("{{..}} ({} keys)", m.borrow().len()),
        Value::Array(a) => format!("[..] ({} items)", a.borrow().len()),
    }
}

/// 从根构建全树节点索引
///
/// 与 [`to_flat`](crate::to_flat) 不同，容器本身也各占一项，空数组/空对象不会丢失。
pub fn outline(root: &Value, options: &DotOptions) -> Result<Vec<TreeNode>, DotError> {
    options.validate()?;

    struct Walker<'a> {
        out: Vec<TreeNode>,
        guard: CycleGuard,
        trail: Vec<Segment>,
        options: &'a DotOptions,
    }

    impl Walker<'_> {
        fn walk(&mut self, v: &Value, path: &str, name: &str) -> Result<(), DotError> {
            let depth = self.trail.len();
            let id = self.guard.enter(v, path, depth)?;
            self.out.push(TreeNode {
                name: name.to_string(),
                path: path.to_string(),
                json_path: to_json_path(&self.trail),
                kind: v.kind(),
                children: v.child_count(),
                preview: preview_of(v),
                depth,
            });
            match v {
                Value::Object(map) => {
                    for (k, child) in map.borrow().iter() {
                        let field_path = extend_key(path, k, &self.options.separator);
                        self.trail.push(Segment::key(k.as_str()));
                        self.walk(child, &field_path, k)?;
                        self.trail.pop();
                    }
                }
                Value::Array(arr) => {
                    for (idx, child) in arr.borrow().iter().enumerate() {
                        let item_path = extend_index(path, idx, self.options);
                        self.trail.push(Segment::Index(idx));
                        self.walk(child, &item_path, &format!("[{}]", idx))?;
                        self.trail.pop();
                    }
                }
                _ => {}
            }
            self.guard.leave(id);
            Ok(())
        }
    }

    let mut walker = Walker {
        out: Vec::with_capacity(1024),
        guard: CycleGuard::new(options.max_depth),
        trail: Vec::new(),
        options,
    };
    walker.walk(root, "", "$")?;
    tracing::debug!(nodes = walker.out.len(), "影子树构建完成");
    Ok(walker.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(v: serde_json::Value) -> Vec<TreeNode> {
        outline(&Value::from(v), &DotOptions::default()).unwrap()
    }

    #[test]
    fn test_simple_object_shadow_tree() {
        let tree = build(json!({
            "name": "测试",
            "age": 30
        }));

        // 应该有3个节点：根、name、age
        assert_eq!(tree.len(), 3);

        assert_eq!(tree[0].name, "$");
        assert_eq!(tree[0].path, "");
        assert_eq!(tree[0].json_path, "$");
        assert_eq!(tree[0].kind, ValueKind::Object);
        assert_eq!(tree[0].children, 2);

        let paths: Vec<&str> = tree.iter().skip(1).map(|n| n.path.as_str()).collect();
        assert_eq!(paths, ["name", "age"]);
    }

    #[test]
    fn test_nested_paths_and_depth() {
        let tree = build(json!({
            "user": {
                "profile": {
                    "name": "张三"
                }
            }
        }));

        assert_eq!(tree.len(), 4);
        let paths: Vec<&str> = tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, ["", "user", "user.profile", "user.profile.name"]);
        let depths: Vec<usize> = tree.iter().map(|n| n.depth).collect();
        assert_eq!(depths, [0, 1, 2, 3]);
        assert_eq!(tree[3].json_path, "$.user.profile.name");
    }

    #[test]
    fn test_array_shadow_tree() {
        let tree = build(json!({
            "items": [
                "第一项",
                {"id": 1},
                [1, 2, 3]
            ]
        }));

        let paths: Vec<&str> = tree.iter().map(|n| n.path.as_str()).collect();
        for expected in [
            "items", "items[0]", "items[1]", "items[1].id", "items[2]", "items[2][0]",
            "items[2][1]", "items[2][2]",
        ] {
            assert!(paths.contains(&expected), "缺少路径 {expected}");
        }
        let second = tree.iter().find(|n| n.path == "items[1]").unwrap();
        assert_eq!(second.name, "[1]");
        assert_eq!(second.json_path, "$.items[1]");
    }

    #[test]
    fn test_empty_containers_are_listed() {
        let tree = build(json!({"a": {}, "b": []}));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[1].kind, ValueKind::Object);
        assert_eq!(tree[1].children, 0);
        assert_eq!(tree[2].kind, ValueKind::Array);
    }

    #[test]
    fn test_special_characters_in_keys() {
        let tree = build(json!({
            "normal_key": "value1",
            "key with spaces": "value2",
            "key.with.dots": "value4"
        }));
        let json_paths: Vec<&str> = tree.iter().map(|n| n.json_path.as_str()).collect();
        assert!(json_paths.contains(&"$.normal_key"));
        assert!(json_paths.contains(&"$['key with spaces']"));
        assert!(json_paths.contains(&"$['key.with.dots']"));
    }

    #[test]
    fn test_node_preview_generation() {
        let mut root = Value::from(json!({
            "short_string": "短文本",
            "long_string": "这是一个非常长的字符串，应该被截断以便在预览中显示，不应该显示完整内容",
            "number": 42,
            "boolean": true,
            "null_value": null,
            "object": {"nested": "value"},
            "array": [1, 2, 3, 4, 5]
        }));
        root = crate::set(&root, "missing", Value::Undefined, ".").unwrap();

        for node in outline(&root, &DotOptions::default()).unwrap() {
            match node.name.as_str() {
                "short_string" => assert_eq!(node.preview, "\"短文本\""),
                "long_string" => assert!(node.preview.contains("...")),
                "number" => assert_eq!(node.preview, "42"),
                "boolean" => assert_eq!(node.preview, "true"),
                "null_value" => assert_eq!(node.preview, "null"),
                "missing" => assert_eq!(node.preview, "undefined"),
                "object" => assert_eq!(node.preview, "{..} (1 keys)"),
                "array" => assert_eq!(node.preview, "[..] (5 items)"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_plain_index_paths() {
        let opts = DotOptions {
            preserve_array_indices: false,
            ..DotOptions::default()
        };
        let tree = outline(&Value::from(json!({"a": [true]})), &opts).unwrap();
        assert_eq!(tree[2].path, "a.0");
        assert_eq!(tree[2].json_path, "$.a[0]");
    }

    #[test]
    fn test_cycle_is_reported() {
        let root = Value::empty_object();
        if let Value::Object(map) = &root {
            map.borrow_mut().insert("loop".into(), root.clone());
        }
        let err = outline(&root, &DotOptions::default()).unwrap_err();
        assert!(matches!(err, DotError::CyclicStructure { .. }));
        if let Value::Object(map) = &root {
            map.borrow_mut().clear();
        }
    }
}
