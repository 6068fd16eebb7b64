// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WorkerSettings;
use crate::domain::models::Data;
use crate::scheduler::context::CrawlContext;
use crate::workers::fetch_worker::FetchWorker;
use crate::workers::parse_worker::ParseWorker;
use crate::workers::persist_worker::PersistWorker;
use crate::workers::router::RouterWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 为每个处理阶段启动固定数量的工作器以及一个路由任务，并在停止时等待它们全部退出
pub struct WorkerManager {
    context: Arc<CrawlContext>,
    cancel: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(context: Arc<CrawlContext>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            context,
            cancel,
            handles: Vec::new(),
        }
    }

    /// 启动工作器
    ///
    /// # 参数
    ///
    /// * `settings` - 各阶段的工作器数量，至少为1
    /// * `router_capacity` - 解析结果通道的容量
    pub fn start_workers(&mut self, settings: WorkerSettings, router_capacity: usize) {
        let (router_tx, router_rx) = mpsc::channel::<Data>(router_capacity.max(1));

        for id in 0..settings.fetch.max(1) {
            self.spawn(FetchWorker::new(id, self.context.clone(), self.cancel.clone()));
        }
        for id in 0..settings.parse.max(1) {
            self.spawn(ParseWorker::new(
                id,
                self.context.clone(),
                self.cancel.clone(),
                router_tx.clone(),
            ));
        }
        for id in 0..settings.persist.max(1) {
            self.spawn(PersistWorker::new(id, self.context.clone(), self.cancel.clone()));
        }
        self.spawn(RouterWorker::new(
            self.context.clone(),
            self.cancel.clone(),
            router_rx,
        ));

        info!("Started {} workers", self.handles.len());
    }

    /// 在独立任务中运行工作器
    pub fn spawn<W: Worker + 'static>(&mut self, worker: W) {
        let handle = tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("Worker {} exited with error: {}", worker.name(), e);
            }
        });
        self.handles.push(handle);
    }

    pub fn worker_number(&self) -> usize {
        self.handles.len()
    }

    /// 等待全部工作器退出
    ///
    /// 调用前应已发出取消信号并关闭缓冲池
    pub async fn shutdown(&mut self) {
        info!("Shutting down {} workers...", self.handles.len());
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
        info!("Workers shut down successfully");
    }
}
