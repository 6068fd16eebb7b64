// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::mtype::ModuleType;
use thiserror::Error;

/// 爬虫错误类型
///
/// 调度器、缓冲池、组件注册器以及各处理组件共用的错误分类
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlerError {
    /// 非法参数（构造参数或准入检查失败）
    #[error("illegal parameter: {0}")]
    IllegalParameter(String),

    /// 非法的生命周期状态转换
    #[error("illegal status: {0}")]
    IllegalStatus(String),

    /// 注册器中未找到对应组件
    #[error("not found: {0}")]
    NotFound(String),

    /// 缓冲池已关闭
    #[error("buffer pool closed")]
    PoolClosed,

    /// 处理组件产生的错误，带有来源组件类型
    #[error("{module_type} error: {message}")]
    Unit {
        module_type: ModuleType,
        message: String,
    },
}

impl CrawlerError {
    /// 将任意错误包装为带组件类型标记的错误
    pub fn unit(module_type: ModuleType, err: impl std::fmt::Display) -> Self {
        CrawlerError::Unit {
            module_type,
            message: err.to_string(),
        }
    }

    /// 将错误标记为某个处理阶段产生的错误
    ///
    /// 已经是 `Unit` 的错误保持原样
    pub fn tag(self, module_type: ModuleType) -> Self {
        match self {
            CrawlerError::Unit { .. } => self,
            other => CrawlerError::unit(module_type, other),
        }
    }

    /// 错误来源的组件类型
    pub fn module_type(&self) -> Option<ModuleType> {
        match self {
            CrawlerError::Unit { module_type, .. } => Some(*module_type),
            _ => None,
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("处理过程中发生panic: {0}")]
    Panicked(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_wraps_plain_errors() {
        let err = CrawlerError::IllegalParameter("nil request".to_string()).tag(ModuleType::Downloader);
        assert_eq!(err.module_type(), Some(ModuleType::Downloader));
        assert_eq!(
            err.to_string(),
            "downloader error: illegal parameter: nil request"
        );
    }

    #[test]
    fn test_tag_keeps_unit_errors() {
        let err = CrawlerError::unit(ModuleType::Analyzer, "bad html");
        let tagged = err.clone().tag(ModuleType::Pipeline);
        assert_eq!(tagged, err);
    }
}
