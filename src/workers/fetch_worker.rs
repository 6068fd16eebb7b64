// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Request;
use crate::modules::mtype::ModuleType;
use crate::scheduler::context::CrawlContext;
use crate::utils::errors::{CrawlerError, WorkerError};
use crate::workers::worker::{catch_panic, next_datum, Worker};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, trace};

/// 抓取阶段工作器
///
/// 从请求缓冲池取出请求，交给当前最空闲的下载器，并把响应放入响应缓冲池
pub struct FetchWorker {
    name: String,
    context: Arc<CrawlContext>,
    cancel: watch::Receiver<bool>,
}

impl FetchWorker {
    pub fn new(id: usize, context: Arc<CrawlContext>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            name: format!("fetch-{}", id),
            context,
            cancel,
        }
    }

    async fn handle(&self, request: Request) {
        counter!("crawler_stage_calls_total", "stage" => "fetch").increment(1);
        let unit = match self.context.registry.get(ModuleType::Downloader) {
            Ok(unit) => unit,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        let Some(downloader) = unit.as_downloader() else {
            self.report(CrawlerError::NotFound(format!(
                "module {} is not a downloader",
                unit.id()
            )));
            return;
        };

        trace!("{} fetching {} via {}", self.name, request.url, unit.id());
        let result = downloader.fetch(request).await;
        unit.refresh_score();
        match result {
            Ok(response) => {
                if !self.context.send_resp(response).await {
                    debug!("{} dropped a response, the response pool is closed", self.name);
                }
            }
            Err(e) => self.report(e),
        }
    }

    fn report(&self, err: CrawlerError) {
        counter!("crawler_stage_errors_total", "stage" => "fetch").increment(1);
        self.context.send_error(err.tag(ModuleType::Downloader));
    }
}

#[async_trait]
impl Worker for FetchWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        debug!("Worker {} started", self.name);
        let mut cancel = self.cancel.clone();
        while let Some(request) = next_datum(&self.context.req_pool, &mut cancel).await {
            if let Err(e) = catch_panic(self.handle(request)).await {
                error!("Worker {} recovered from {}", self.name, e);
                self.report(CrawlerError::unit(ModuleType::Downloader, e));
            }
            self.context.finish();
        }
        debug!("Worker {} stopped", self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
