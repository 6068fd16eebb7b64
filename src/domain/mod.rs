// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 包含在爬取流水线中流动的核心数据结构，
/// 不依赖调度器和处理组件的具体实现。
pub mod models;
