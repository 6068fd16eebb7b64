// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供下载、分析、条目处理三个阶段的工作器、解析结果路由以及工作器管理
pub mod fetch_worker;
pub mod manager;
pub mod parse_worker;
pub mod persist_worker;
pub mod router;
pub mod worker;

pub use manager::WorkerManager;
pub use worker::Worker;
