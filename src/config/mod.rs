// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置，包括爬取范围、缓冲池、工作器和HTTP客户端等配置
pub mod settings;

pub use settings::{Settings, WorkerSettings};
