// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Data;
use crate::scheduler::context::CrawlContext;
use crate::utils::errors::WorkerError;
use crate::workers::worker::{cancelled, Worker};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

/// 解析结果路由任务
///
/// 请求经准入检查后回到请求缓冲池，条目进入条目缓冲池
pub struct RouterWorker {
    context: Arc<CrawlContext>,
    cancel: watch::Receiver<bool>,
    receiver: Mutex<mpsc::Receiver<Data>>,
}

impl RouterWorker {
    pub fn new(
        context: Arc<CrawlContext>,
        cancel: watch::Receiver<bool>,
        receiver: mpsc::Receiver<Data>,
    ) -> Self {
        Self {
            context,
            cancel,
            receiver: Mutex::new(receiver),
        }
    }

    async fn route(&self, data: Data, cancel: &watch::Receiver<bool>) {
        match data {
            Data::Request(request) => {
                self.context.send_req(request, false, cancel);
            }
            Data::Item(item) => {
                self.context.send_item(item).await;
            }
        }
    }
}

#[async_trait]
impl Worker for RouterWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        let mut receiver = self
            .receiver
            .try_lock()
            .map_err(|_| WorkerError::InternalError("router is already running".to_string()))?;
        let mut cancel = self.cancel.clone();
        debug!("Router started");
        loop {
            let data = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => break,
                data = receiver.recv() => match data {
                    Some(data) => data,
                    None => break,
                },
            };
            self.route(data, &cancel).await;
            self.context.finish();
        }
        debug!("Router stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "router"
    }
}
