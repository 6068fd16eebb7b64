// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::traits::{check_type, Analyzer, Downloader, Pipeline, Unit};
use crate::utils::errors::CrawlerError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求相关参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestArgs {
    /// 可以接受的主域名列表，为空时不限制域名
    pub accepted_domains: Vec<String>,
    /// 需要爬取的最大深度，超过该深度的请求会被忽略
    pub max_depth: u32,
}

impl RequestArgs {
    pub fn new(accepted_domains: Vec<String>, max_depth: u32) -> Self {
        Self {
            accepted_domains,
            max_depth,
        }
    }

    pub fn check(&self) -> Result<(), CrawlerError> {
        if let Some(domain) = self.accepted_domains.iter().find(|d| d.trim().is_empty()) {
            return Err(CrawlerError::IllegalParameter(format!(
                "empty accepted domain {:?}",
                domain
            )));
        }
        Ok(())
    }

    /// 判断两组参数是否相同（域名列表按顺序比较）
    pub fn same(&self, other: &RequestArgs) -> bool {
        self == other
    }
}

/// 数据相关参数，四个缓冲池的容量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataArgs {
    /// 请求缓冲器的容量
    pub req_buffer_cap: u32,
    /// 请求缓冲器的最大数量
    pub req_max_buffer_number: u32,
    /// 响应缓冲器的容量
    pub resp_buffer_cap: u32,
    /// 响应缓冲器的最大数量
    pub resp_max_buffer_number: u32,
    /// 条目缓冲器的容量
    pub item_buffer_cap: u32,
    /// 条目缓冲器的最大数量
    pub item_max_buffer_number: u32,
    /// 错误缓冲器的容量
    pub error_buffer_cap: u32,
    /// 错误缓冲器的最大数量
    pub error_max_buffer_number: u32,
}

impl DataArgs {
    /// 检查全部容量参数均大于0
    pub fn check(&self) -> Result<(), CrawlerError> {
        let fields = [
            ("request buffer capacity", self.req_buffer_cap),
            ("max request buffer number", self.req_max_buffer_number),
            ("response buffer capacity", self.resp_buffer_cap),
            ("max response buffer number", self.resp_max_buffer_number),
            ("item buffer capacity", self.item_buffer_cap),
            ("max item buffer number", self.item_max_buffer_number),
            ("error buffer capacity", self.error_buffer_cap),
            ("max error buffer number", self.error_max_buffer_number),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(CrawlerError::IllegalParameter(format!("zero {}", name)));
            }
        }
        Ok(())
    }
}

impl Default for DataArgs {
    fn default() -> Self {
        Self {
            req_buffer_cap: 50,
            req_max_buffer_number: 1000,
            resp_buffer_cap: 50,
            resp_max_buffer_number: 10,
            item_buffer_cap: 50,
            item_max_buffer_number: 100,
            error_buffer_cap: 50,
            error_max_buffer_number: 1,
        }
    }
}

/// 组件相关参数
#[derive(Clone, Default)]
pub struct ModuleArgs {
    pub downloaders: Vec<Arc<dyn Downloader>>,
    pub analyzers: Vec<Arc<dyn Analyzer>>,
    pub pipelines: Vec<Arc<dyn Pipeline>>,
}

/// 组件参数摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleArgsSummary {
    pub downloader_list_size: usize,
    pub analyzer_list_size: usize,
    pub pipeline_list_size: usize,
}

impl ModuleArgs {
    /// 检查每类组件至少有一个，且组件ID合法并与组件类型一致
    pub fn check(&self) -> Result<(), CrawlerError> {
        if self.downloaders.is_empty() {
            return Err(CrawlerError::IllegalParameter(
                "empty downloader list".to_string(),
            ));
        }
        if self.analyzers.is_empty() {
            return Err(CrawlerError::IllegalParameter(
                "empty analyzer list".to_string(),
            ));
        }
        if self.pipelines.is_empty() {
            return Err(CrawlerError::IllegalParameter(
                "empty pipeline list".to_string(),
            ));
        }
        for unit in self.units() {
            let module_type = unit.module_type();
            unit.id().split()?;
            if !check_type(module_type, &unit) {
                return Err(CrawlerError::IllegalParameter(format!(
                    "incorrect module type {} for MID {}",
                    module_type,
                    unit.id()
                )));
            }
        }
        Ok(())
    }

    /// 全部组件，按下载器、分析器、条目处理管道的顺序
    pub fn units(&self) -> Vec<Unit> {
        let downloaders = self.downloaders.iter().cloned().map(Unit::Downloader);
        let analyzers = self.analyzers.iter().cloned().map(Unit::Analyzer);
        let pipelines = self.pipelines.iter().cloned().map(Unit::Pipeline);
        downloaders.chain(analyzers).chain(pipelines).collect()
    }

    pub fn summary(&self) -> ModuleArgsSummary {
        ModuleArgsSummary {
            downloader_list_size: self.downloaders.len(),
            analyzer_list_size: self.analyzers.len(),
            pipeline_list_size: self.pipelines.len(),
        }
    }
}
