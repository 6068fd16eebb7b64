// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::traits::Module;
use serde::{Deserialize, Serialize};

/// 组件计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// 调用次数
    pub called: u64,
    /// 接受次数（参数检查通过）
    pub accepted: u64,
    /// 成功完成次数
    pub completed: u64,
    /// 正在处理的调用数
    pub handling: u64,
}

/// 评分计算函数
///
/// 评分只作为组件之间的相对负载信号，分值越低表示越空闲
pub type CalculateScore = fn(&Counts) -> u64;

/// 简易评分计算
///
/// score = called + 2·accepted + 4·completed + 16·handling
pub fn calculate_score_simple(counts: &Counts) -> u64 {
    counts
        .called
        .wrapping_add(counts.accepted.wrapping_shl(1))
        .wrapping_add(counts.completed.wrapping_shl(2))
        .wrapping_add(counts.handling.wrapping_shl(4))
}

/// 重新计算并保存组件评分
///
/// 仅当新评分与旧评分不同时才写入，返回评分是否发生变化
pub fn set_score<M: Module + ?Sized>(module: &M) -> bool {
    let calculator = module.score_calculator();
    let new_score = calculator(&module.counts());
    if new_score == module.score() {
        return false;
    }
    module.set_score(new_score);
    true
}
