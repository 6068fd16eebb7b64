// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 调度模块
///
/// 包含调度器本身、状态机、参数、准入检查以及运行期共享数据
pub mod admission;
pub mod args;
pub mod context;
#[allow(clippy::module_inception)]
pub mod scheduler;
pub mod status;
pub mod summary;

pub use admission::{Admission, Rejection};
pub use args::{DataArgs, ModuleArgs, ModuleArgsSummary, RequestArgs};
pub use context::CrawlContext;
pub use scheduler::Scheduler;
pub use status::{check_status, Status, StatusMachine};
pub use summary::SchedSummary;
