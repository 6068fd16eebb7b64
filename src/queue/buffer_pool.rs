// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::CrawlerError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tokio::sync::Notify;

/// 非阻塞放入失败的原因，失败时归还数据
#[derive(Debug, PartialEq, Eq)]
pub enum TryPutError<T> {
    /// 所有缓冲器都已满且数量已达上限
    Full(T),
    /// 缓冲池已关闭
    Closed(T),
}

impl<T> TryPutError<T> {
    /// 取回未能放入的数据
    pub fn into_inner(self) -> T {
        match self {
            TryPutError::Full(datum) | TryPutError::Closed(datum) => datum,
        }
    }
}

/// 缓冲池统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPoolSummary {
    /// 单个缓冲器容量
    pub buffer_cap: u32,
    /// 缓冲器数量上限
    pub max_buffer_number: u32,
    /// 当前缓冲器数量
    pub buffer_number: u32,
    /// 当前数据总数
    pub total: u64,
}

struct PoolInner<T> {
    buffers: Vec<VecDeque<T>>,
    put_cursor: usize,
    get_cursor: usize,
}

/// 缓冲池
///
/// 由多个有界FIFO缓冲器组成的队列。当所有缓冲器都已满时，
/// 在数量上限内自动新建缓冲器；达到上限后放入操作会阻塞，
/// 从而向生产者施加背压。缓冲器内部保持FIFO，缓冲器之间轮流取数。
///
/// 关闭后不能再放入数据，但关闭前已放入的数据仍可取出，
/// 取空后获取操作返回 `PoolClosed`。
pub struct BufferPool<T> {
    buffer_cap: u32,
    max_buffer_number: u32,
    inner: Mutex<PoolInner<T>>,
    buffer_number: AtomicU32,
    total: AtomicU64,
    closed: AtomicBool,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> BufferPool<T> {
    /// 创建新的缓冲池
    ///
    /// # 参数
    ///
    /// * `buffer_cap` - 单个缓冲器容量
    /// * `max_buffer_number` - 缓冲器数量上限
    ///
    /// # 返回值
    ///
    /// * `Ok(BufferPool)` - 含有一个空缓冲器的缓冲池
    /// * `Err(CrawlerError)` - 任一参数为零
    pub fn new(buffer_cap: u32, max_buffer_number: u32) -> Result<Self, CrawlerError> {
        if buffer_cap == 0 {
            return Err(CrawlerError::IllegalParameter(
                "zero buffer capacity".to_string(),
            ));
        }
        if max_buffer_number == 0 {
            return Err(CrawlerError::IllegalParameter(
                "zero max buffer number".to_string(),
            ));
        }

        Ok(Self {
            buffer_cap,
            max_buffer_number,
            inner: Mutex::new(PoolInner {
                buffers: vec![VecDeque::with_capacity(buffer_cap as usize)],
                put_cursor: 0,
                get_cursor: 0,
            }),
            buffer_number: AtomicU32::new(1),
            total: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        })
    }

    pub fn buffer_cap(&self) -> u32 {
        self.buffer_cap
    }

    pub fn max_buffer_number(&self) -> u32 {
        self.max_buffer_number
    }

    /// 当前已分配的缓冲器数量，不超过上限
    pub fn buffer_number(&self) -> u32 {
        self.buffer_number.load(Ordering::SeqCst)
    }

    /// 当前缓冲池中的数据总数
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 放入数据，缓冲池已满时等待空位
    pub async fn put(&self, datum: T) -> Result<(), CrawlerError> {
        let mut datum = datum;
        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            // 先登记等待再检查，避免错过唤醒
            notified.as_mut().enable();

            match self.try_put(datum) {
                Ok(()) => return Ok(()),
                Err(TryPutError::Closed(_)) => return Err(CrawlerError::PoolClosed),
                Err(TryPutError::Full(back)) => datum = back,
            }

            notified.await;
        }
    }

    /// 非阻塞放入数据
    pub fn try_put(&self, datum: T) -> Result<(), TryPutError<T>> {
        {
            let mut inner = self.inner.lock();
            if self.closed.load(Ordering::SeqCst) {
                return Err(TryPutError::Closed(datum));
            }

            let cap = self.buffer_cap as usize;
            let count = inner.buffers.len();
            let start = inner.put_cursor % count;
            let slot = (0..count)
                .map(|offset| (start + offset) % count)
                .find(|&index| inner.buffers[index].len() < cap);

            let index = match slot {
                Some(index) => index,
                None if count < self.max_buffer_number as usize => {
                    inner.buffers.push(VecDeque::with_capacity(cap));
                    self.buffer_number
                        .store(inner.buffers.len() as u32, Ordering::SeqCst);
                    count
                }
                None => return Err(TryPutError::Full(datum)),
            };

            inner.buffers[index].push_back(datum);
            inner.put_cursor = index;
            self.total.fetch_add(1, Ordering::SeqCst);
        }

        self.not_empty.notify_waiters();
        Ok(())
    }

    /// 取出数据，缓冲池为空时等待
    ///
    /// 缓冲池关闭且取空后返回 `PoolClosed`
    pub async fn get(&self) -> Result<T, CrawlerError> {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(datum) = self.try_get() {
                return Ok(datum);
            }
            if self.closed() {
                // 关闭与最后一次放入之间可能还有数据
                return self.try_get().ok_or(CrawlerError::PoolClosed);
            }

            notified.await;
        }
    }

    /// 非阻塞取出数据
    pub fn try_get(&self) -> Option<T> {
        let datum = {
            let mut inner = self.inner.lock();
            let count = inner.buffers.len();
            let start = inner.get_cursor % count;
            let index = (0..count)
                .map(|offset| (start + offset) % count)
                .find(|&index| !inner.buffers[index].is_empty())?;

            let datum = inner.buffers[index].pop_front()?;
            self.total.fetch_sub(1, Ordering::SeqCst);

            if inner.buffers[index].is_empty() && inner.buffers.len() > 1 {
                // 多余的空缓冲器直接回收
                inner.buffers.remove(index);
                let remaining = inner.buffers.len();
                self.buffer_number.store(remaining as u32, Ordering::SeqCst);
                inner.get_cursor = index % remaining;
                inner.put_cursor %= remaining;
            } else {
                inner.get_cursor = (index + 1) % inner.buffers.len();
            }
            datum
        };

        self.not_full.notify_waiters();
        Some(datum)
    }

    /// 关闭缓冲池
    ///
    /// 唤醒所有等待中的放入和取出操作。重复关闭返回false
    pub fn close(&self) -> bool {
        {
            let _inner = self.inner.lock();
            if self.closed.swap(true, Ordering::SeqCst) {
                return false;
            }
        }
        self.not_full.notify_waiters();
        self.not_empty.notify_waiters();
        true
    }

    pub fn summary(&self) -> BufferPoolSummary {
        BufferPoolSummary {
            buffer_cap: self.buffer_cap,
            max_buffer_number: self.max_buffer_number,
            buffer_number: self.buffer_number(),
            total: self.total(),
        }
    }
}
