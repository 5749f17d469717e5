//! 性能基准测试模块
//!
//! 用于测试大树扁平化、重建、对比与路径读写的耗时

use std::time::Instant;

use serde_json::json;

use crate::model::access::{get, set};
use crate::model::comparison::{diff, ComparisonOptions};
use crate::model::error::DotError;
use crate::model::flat::{from_flat, to_flat, DotOptions, FlatMap};
use crate::model::value::Value;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成大型测试树
pub fn generate_large_tree(depth: usize, width: usize) -> Value {
    fn create_nested_object(current_depth: usize, max_depth: usize, width: usize) -> serde_json::Value {
        if current_depth >= max_depth {
            return json!("叶子节点值");
        }

        let mut obj = serde_json::Map::new();

        // 添加各种类型的字段
        for i in 0..width {
            let key = format!("field_{}", i);
            let value = match i % 5 {
                0 => json!(format!("字符串值_{}", i)),
                1 => json!(i as i64),
                2 => json!(i % 2 == 0),
                3 => json!([1, 2, 3, i]),
                _ => create_nested_object(current_depth + 1, max_depth, width / 2),
            };
            obj.insert(key, value);
        }

        serde_json::Value::Object(obj)
    }

    let items: Vec<serde_json::Value> = (0..width * 10)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("项目_{}", i),
                "value": i * 2,
                "active": i % 3 == 0
            })
        })
        .collect();

    Value::from(json!({
        "metadata": {
            "depth": depth,
            "width": width,
            "description": "性能测试用大型树"
        },
        "data": create_nested_object(0, depth, width),
        "items": items
    }))
}

fn timed<T>(
    operation: &str,
    run: impl FnOnce() -> Result<T, DotError>,
    describe: impl FnOnce(&T) -> String,
) -> (PerformanceResult, Option<T>) {
    let start = Instant::now();
    let outcome = run();
    let duration = start.elapsed().as_millis();
    match outcome {
        Ok(value) => {
            let details = describe(&value);
            (PerformanceResult::new(operation, duration, true, &details), Some(value))
        }
        Err(e) => (
            PerformanceResult::new(operation, duration, false, &format!("失败: {}", e)),
            None,
        ),
    }
}

/// 测试扁平化性能
pub fn benchmark_flatten(tree: &Value, options: &DotOptions) -> PerformanceResult {
    timed("扁平化", || to_flat(tree, options), |flat| format!("生成了 {} 条路径", flat.len())).0
}

/// 测试重建性能
pub fn benchmark_unflatten(flat: &FlatMap, options: &DotOptions) -> PerformanceResult {
    timed(
        "重建",
        || from_flat(flat, options),
        |tree| format!("根节点含 {} 个子元素", tree.child_count()),
    )
    .0
}

/// 测试结构对比性能
pub fn benchmark_diff(source: &Value, target: &Value, options: &ComparisonOptions) -> PerformanceResult {
    timed(
        "结构对比",
        || diff(source, target, options),
        |d| format!("发现 {} 处差异", d.len()),
    )
    .0
}

/// 测试路径读取性能
pub fn benchmark_access(tree: &Value, paths: &[&str]) -> Vec<PerformanceResult> {
    paths
        .iter()
        .map(|path| {
            timed(
                &format!("路径读取: {}", path),
                || get(tree, path, "."),
                |v| format!("类型 {}", v.kind()),
            )
            .0
        })
        .collect()
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // 测试不同规模的数据
    let test_cases = [
        (3, 10), // 小型：深度3，宽度10
        (4, 20), // 中型：深度4，宽度20
        (5, 30), // 大型：深度5，宽度30
    ];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let start = Instant::now();
        let tree = generate_large_tree(depth, width);
        results.push(PerformanceResult::new(
            &format!("数据生成({}x{})", depth, width),
            start.elapsed().as_millis(),
            true,
            &format!("生成了深度{}宽度{}的树", depth, width),
        ));

        let options = DotOptions::default();
        let (flatten_result, flat) = timed(
            &format!("扁平化({}x{})", depth, width),
            || to_flat(&tree, &options),
            |flat| format!("生成了 {} 条路径", flat.len()),
        );
        results.push(flatten_result);
        if let Some(flat) = flat {
            results.push(benchmark_unflatten(&flat, &options));
        }

        // 修改一处后对比
        match set(&tree, "items[0].name", Value::from("已修改"), ".") {
            Ok(changed) => results.push(benchmark_diff(&tree, &changed, &ComparisonOptions::default())),
            Err(e) => results.push(PerformanceResult::new("路径写入", 0, false, &format!("失败: {}", e))),
        }

        let test_paths = ["", "metadata", "data.field_0", "items[0].name"];
        results.extend(benchmark_access(&tree, &test_paths));
    }

    for r in &results {
        tracing::info!(
            success = r.success,
            "{}: {}ms，{}",
            r.operation,
            r.duration_ms,
            r.details
        );
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::Segment;

    #[test]
    fn test_generate_large_tree() {
        let tree = generate_large_tree(2, 3);
        assert_eq!(tree.kind(), crate::ValueKind::Object);

        for key in ["metadata", "data", "items"] {
            assert!(tree.child(&Segment::key(key)).is_some(), "缺少 {key}");
        }
        assert_eq!(tree.child(&Segment::key("items")).unwrap().child_count(), 30);
    }

    #[test]
    fn test_performance_benchmarks() {
        let _ = tracing_subscriber::fmt::SubscriberBuilder::default()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init();

        let tree = generate_large_tree(2, 5);
        let options = DotOptions::default();

        let flatten_result = benchmark_flatten(&tree, &options);
        assert!(flatten_result.success);
        assert!(flatten_result.duration_ms < 1000); // 应该在1秒内完成

        let flat = to_flat(&tree, &options).unwrap();
        let unflatten_result = benchmark_unflatten(&flat, &options);
        assert!(unflatten_result.success);

        let diff_result = benchmark_diff(&tree, &tree, &ComparisonOptions::default());
        assert!(diff_result.success);
        assert_eq!(diff_result.details, "发现 0 处差异");

        let access = benchmark_access(&tree, &["metadata.width", "items[3].id", "bad[path"]);
        assert_eq!(access.len(), 3);
        assert!(access[0].success && access[1].success);
        assert!(!access[2].success, "格式错误的路径应记录为失败");
    }

    #[test]
    fn test_suite_runs_every_case() {
        let results = run_performance_suite();
        // 每个规模：生成、扁平化、重建、对比、4 次读取
        assert_eq!(results.len(), 3 * 8);
        assert!(results.iter().all(|r| r.success));
    }
}
