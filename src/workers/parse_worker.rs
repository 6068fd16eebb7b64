// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Data, Response};
use crate::modules::mtype::ModuleType;
use crate::scheduler::context::CrawlContext;
use crate::utils::errors::{CrawlerError, WorkerError};
use crate::workers::worker::{catch_panic, next_datum, Worker};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, trace};

/// 解析阶段工作器
///
/// 从响应缓冲池取出响应，交给当前最空闲的分析器，解析结果交给路由任务
pub struct ParseWorker {
    name: String,
    context: Arc<CrawlContext>,
    cancel: watch::Receiver<bool>,
    router: mpsc::Sender<Data>,
}

impl ParseWorker {
    pub fn new(
        id: usize,
        context: Arc<CrawlContext>,
        cancel: watch::Receiver<bool>,
        router: mpsc::Sender<Data>,
    ) -> Self {
        Self {
            name: format!("parse-{}", id),
            context,
            cancel,
            router,
        }
    }

    async fn handle(&self, response: Response) {
        counter!("crawler_stage_calls_total", "stage" => "parse").increment(1);
        let unit = match self.context.registry.get(ModuleType::Analyzer) {
            Ok(unit) => unit,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        let Some(analyzer) = unit.as_analyzer() else {
            self.report(CrawlerError::NotFound(format!(
                "module {} is not an analyzer",
                unit.id()
            )));
            return;
        };

        trace!("{} parsing {} via {}", self.name, response.url, unit.id());
        let (data_list, errors) = analyzer.parse(response).await;
        unit.refresh_score();
        for err in errors {
            self.report(err);
        }
        for data in data_list {
            self.context.begin();
            if self.router.send(data).await.is_err() {
                // router is gone, the scheduler is stopping
                self.context.finish();
            }
        }
    }

    fn report(&self, err: CrawlerError) {
        counter!("crawler_stage_errors_total", "stage" => "parse").increment(1);
        self.context.send_error(err.tag(ModuleType::Analyzer));
    }
}

#[async_trait]
impl Worker for ParseWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        debug!("Worker {} started", self.name);
        let mut cancel = self.cancel.clone();
        while let Some(response) = next_datum(&self.context.resp_pool, &mut cancel).await {
            if let Err(e) = catch_panic(self.handle(response)).await {
                error!("Worker {} recovered from {}", self.name, e);
                self.report(CrawlerError::unit(ModuleType::Analyzer, e));
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
