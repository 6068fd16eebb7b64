// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::CrawlerError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// 未初始化
    Uninitialized,
    /// 正在初始化
    Initializing,
    /// 已初始化
    Initialized,
    /// 正在启动
    Starting,
    /// 已启动
    Started,
    /// 正在停止
    Stopping,
    /// 已停止
    Stopped,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Uninitialized,
        Status::Initializing,
        Status::Initialized,
        Status::Starting,
        Status::Started,
        Status::Stopping,
        Status::Stopped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Uninitialized => "uninitialized",
            Status::Initializing => "initializing",
            Status::Initialized => "initialized",
            Status::Starting => "starting",
            Status::Started => "started",
            Status::Stopping => "stopping",
            Status::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 检查状态转换是否合法
///
/// 合法的转换只有：
/// uninitialized→initializing、initializing→initialized、initialized→starting、
/// initialized→initializing、starting→started、started→stopping、
/// stopping→stopped、stopped→initializing、stopped→starting
pub fn check_status(current: Status, wanted: Status) -> Result<(), CrawlerError> {
    use Status::*;
    let legal = matches!(
        (current, wanted),
        (Uninitialized, Initializing)
            | (Initializing, Initialized)
            | (Initialized, Starting)
            | (Initialized, Initializing)
            | (Starting, Started)
            | (Started, Stopping)
            | (Stopping, Stopped)
            | (Stopped, Initializing)
            | (Stopped, Starting)
    );
    if legal {
        Ok(())
    } else {
        Err(CrawlerError::IllegalStatus(format!(
            "cannot change status from {} to {}",
            current, wanted
        )))
    }
}

/// 状态机
///
/// 检查与推进在同一把锁内完成，并发的调用者中只会有一个成功
#[derive(Debug)]
pub struct StatusMachine {
    current: Mutex<Status>,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Status::Uninitialized),
        }
    }

    pub fn current(&self) -> Status {
        *self.current.lock()
    }

    /// 检查并推进状态，返回转换前的状态
    pub fn transition(&self, wanted: Status) -> Result<Status, CrawlerError> {
        let mut current = self.current.lock();
        check_status(*current, wanted)?;
        let previous = *current;
        *current = wanted;
        Ok(previous)
    }

    /// 不经检查直接设置状态，用于失败后回滚
    pub fn set(&self, status: Status) {
        *self.current.lock() = status;
    }
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}
