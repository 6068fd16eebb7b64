// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::mid::Mid;
use crate::modules::score::{CalculateScore, Counts};
use crate::utils::errors::CrawlerError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// 组件摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: Mid,
    pub called: u64,
    pub accepted: u64,
    pub completed: u64,
    pub handling: u64,
    /// 组件特有的附加信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// 组件内部基础结构
///
/// 保存组件ID、评分以及调用计数，具体组件通过组合它来实现 [`Module`](crate::modules::traits::Module)。
/// 所有计数均为原子变量，可在多个任务中同时更新。
#[derive(Debug)]
pub struct ModuleBase {
    mid: Mid,
    addr: Option<SocketAddr>,
    score: AtomicU64,
    calculator: CalculateScore,
    called: AtomicU64,
    accepted: AtomicU64,
    completed: AtomicU64,
    handling: AtomicU64,
}

impl ModuleBase {
    /// 创建组件基础结构
    ///
    /// # 参数
    ///
    /// * `mid` - 组件ID，必须是合法的组件ID
    /// * `calculator` - 评分计算函数
    ///
    /// # 返回值
    ///
    /// * `Err(CrawlerError::IllegalParameter)` - 组件ID不合法
    pub fn new(mid: Mid, calculator: CalculateScore) -> Result<Self, CrawlerError> {
        let parts = mid.split()?;
        Ok(Self {
            mid,
            addr: parts.addr,
            score: AtomicU64::new(0),
            calculator,
            called: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            handling: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> &Mid {
        &self.mid
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    pub fn score(&self) -> u64 {
        self.score.load(Ordering::Acquire)
    }

    pub fn set_score(&self, score: u64) {
        self.score.store(score, Ordering::Release);
    }

    pub fn score_calculator(&self) -> CalculateScore {
        self.calculator
    }

    pub fn incr_called(&self) {
        self.called.fetch_add(1, Ordering::AcqRel);
    }

    pub fn incr_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::AcqRel);
    }

    pub fn incr_completed(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    /// 标记一次正在进行的处理，返回的守卫被丢弃时计数自动减一
    pub fn handling(&self) -> HandlingGuard<'_> {
        self.handling.fetch_add(1, Ordering::AcqRel);
        HandlingGuard {
            counter: &self.handling,
        }
    }

    pub fn handling_number(&self) -> u64 {
        self.handling.load(Ordering::Acquire)
    }

    pub fn counts(&self) -> Counts {
        Counts {
            called: self.called.load(Ordering::Acquire),
            accepted: self.accepted.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            handling: self.handling.load(Ordering::Acquire),
        }
    }

    pub fn summary(&self) -> ModuleSummary {
        let counts = self.counts();
        ModuleSummary {
            id: self.mid.clone(),
            called: counts.called,
            accepted: counts.accepted,
            completed: counts.completed,
            handling: counts.handling,
            extra: None,
        }
    }

    /// 清空所有计数
    pub fn clear(&self) {
        self.called.store(0, Ordering::Release);
        self.accepted.store(0, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        self.handling.store(0, Ordering::Release);
    }
}

/// 正在处理计数的守卫
#[derive(Debug)]
pub struct HandlingGuard<'a> {
    counter: &'a AtomicU64,
}

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        // clear() may have reset the counter while this guard was alive
        let _ = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}
