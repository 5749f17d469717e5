//! 遍历保护：按容器标识记录祖先链以发现循环，并限制嵌套深度

use std::collections::HashSet;

use crate::model::error::DotError;
use crate::model::value::Value;

/// 递归遍历时的循环与深度守卫
///
/// 只记录当前路径上的祖先容器：同一容器被多处共享（DAG）是合法的，
/// 只有重新进入自己的祖先才算循环。
#[derive(Debug)]
pub(crate) struct CycleGuard {
    ancestors: HashSet<usize>,
    max_depth: usize,
}

impl CycleGuard {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            ancestors: HashSet::new(),
            max_depth,
        }
    }

    /// 进入节点；叶子节点返回 `None`，容器返回其标识，离开时交还给 [`CycleGuard::leave`]
    pub(crate) fn enter(
        &mut self,
        node: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Option<usize>, DotError> {
        let Some(id) = node.container_id() else {
            return Ok(None);
        };
        if depth >= self.max_depth {
            return Err(DotError::DepthLimitExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }
        if !self.ancestors.insert(id) {
            return Err(DotError::CyclicStructure {
                path: path.to_string(),
            });
        }
        Ok(Some(id))
    }

    pub(crate) fn leave(&mut self, id: Option<usize>) {
        if let Some(id) = id {
            self.ancestors.remove(&id);
        }
    }
}
