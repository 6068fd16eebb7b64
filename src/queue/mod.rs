// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供各处理阶段之间的有界缓冲池
/// 负责背压控制以及停止时的关闭和排空
pub mod buffer_pool;

pub use buffer_pool::{BufferPool, BufferPoolSummary, TryPutError};
