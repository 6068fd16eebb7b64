// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义在各处理阶段之间流动的数据：
/// - 请求（Request）：待抓取的URL及其深度
/// - 响应（Response）：抓取结果
/// - 条目（Item）：解析得到的键值记录
/// - 数据（Data）：解析组件的产出，请求或条目
pub mod data;

pub use data::{Data, Item, Request, Response};
