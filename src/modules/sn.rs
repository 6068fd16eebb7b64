// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;

#[derive(Debug)]
struct SnState {
    next: u64,
    cycle_count: u64,
}

/// 序列号生成器
///
/// 从 `start` 开始递增，达到 `max` 后回到 `start` 并增加循环计数。
/// 多个任务并发获取时保证不会取到重复的序列号（同一循环内）。
#[derive(Debug)]
pub struct SnGenerator {
    start: u64,
    max: u64,
    state: Mutex<SnState>,
}

impl SnGenerator {
    /// 创建序列号生成器，`max` 为0时表示 `u64::MAX`
    pub fn new(start: u64, max: u64) -> Self {
        let max = if max == 0 { u64::MAX } else { max };
        Self {
            start,
            max,
            state: Mutex::new(SnState {
                next: start,
                cycle_count: 0,
            }),
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// 下一个将被返回的序列号
    pub fn next(&self) -> u64 {
        self.state.lock().next
    }

    pub fn cycle_count(&self) -> u64 {
        self.state.lock().cycle_count
    }

    /// 获取当前序列号并前进一位
    pub fn get(&self) -> u64 {
        let mut state = self.state.lock();
        let id = state.next;
        if id >= self.max {
            state.next = self.start;
            state.cycle_count += 1;
        } else {
            state.next += 1;
        }
        id
    }
}

impl Default for SnGenerator {
    fn default() -> Self {
        Self::new(1, 0)
    }
}
