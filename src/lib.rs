// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含在各处理阶段之间流动的请求、响应和条目
pub mod domain;

/// 处理组件模块
///
/// 定义下载器、分析器和条目处理管道，以及组件ID、评分和注册器
pub mod modules;

/// 队列模块
///
/// 实现各处理阶段之间的有界缓冲池
pub mod queue;

/// 调度模块
///
/// 实现调度器、状态机、准入检查和运行摘要
pub mod scheduler;

/// 工具模块
///
/// 提供错误类型、URL处理、日志和指标等辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现各处理阶段的工作器和工作器管理
pub mod workers;
