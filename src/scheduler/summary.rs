// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::base::ModuleSummary;
use crate::queue::BufferPoolSummary;
use crate::scheduler::args::{DataArgs, ModuleArgsSummary, RequestArgs};
use serde::{Deserialize, Serialize};

/// 调度器摘要
///
/// 调度器在某一时刻的参数、状态、组件计数、缓冲池统计和已处理URL数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedSummary {
    pub request_args: RequestArgs,
    pub data_args: DataArgs,
    pub module_args: ModuleArgsSummary,
    pub status: String,
    pub downloaders: Vec<ModuleSummary>,
    pub analyzers: Vec<ModuleSummary>,
    pub pipelines: Vec<ModuleSummary>,
    pub req_buffer_pool: BufferPoolSummary,
    pub resp_buffer_pool: BufferPoolSummary,
    pub item_buffer_pool: BufferPoolSummary,
    pub error_buffer_pool: BufferPoolSummary,
    pub url_number: u64,
}

impl SchedSummary {
    /// 以缩进格式的JSON输出摘要
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 判断两份摘要是否相同
    pub fn same(&self, other: &SchedSummary) -> bool {
        self == other
    }
}
