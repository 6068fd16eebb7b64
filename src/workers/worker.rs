// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::BufferPool;
use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;

/// Worker trait定义
///
/// 所有阶段工作器都必须实现此trait
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器，直到被取消或输入缓冲池关闭
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}

/// 等待取消信号，发送端被丢弃也视为取消
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stopped| *stopped).await;
}

/// 从输入缓冲池取出下一个数据
///
/// 取消信号优先于取数；缓冲池关闭或已取消时返回 `None`
pub(crate) async fn next_datum<T>(
    pool: &BufferPool<T>,
    cancel: &mut watch::Receiver<bool>,
) -> Option<T> {
    let stopped = *cancel.borrow_and_update();
    if stopped {
        return None;
    }
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        datum = pool.get() => datum.ok(),
    }
}

/// 处理一个数据单元
///
/// 处理组件中的panic转为错误返回，工作器可以继续处理后续数据
pub(crate) async fn catch_panic<F>(handling: F) -> Result<(), WorkerError>
where
    F: Future<Output = ()>,
{
    AssertUnwindSafe(handling)
        .catch_unwind()
        .await
        .map_err(|panic| WorkerError::Panicked(panic_message(panic.as_ref())))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
