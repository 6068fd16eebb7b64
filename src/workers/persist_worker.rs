// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Item;
use crate::modules::mtype::ModuleType;
use crate::scheduler::context::CrawlContext;
use crate::utils::errors::{CrawlerError, WorkerError};
use crate::workers::worker::{catch_panic, next_datum, Worker};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

/// 持久化阶段工作器
///
/// 从条目缓冲池取出条目，交给当前最空闲的条目处理管道。该阶段只产生错误
pub struct PersistWorker {
    name: String,
    context: Arc<CrawlContext>,
    cancel: watch::Receiver<bool>,
}

impl PersistWorker {
    pub fn new(id: usize, context: Arc<CrawlContext>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            name: format!("persist-{}", id),
            context,
            cancel,
        }
    }

    async fn handle(&self, item: Item) {
        counter!("crawler_stage_calls_total", "stage" => "persist").increment(1);
        let unit = match self.context.registry.get(ModuleType::Pipeline) {
            Ok(unit) => unit,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        let Some(pipeline) = unit.as_pipeline() else {
            self.report(CrawlerError::NotFound(format!(
                "module {} is not a pipeline",
                unit.id()
            )));
            return;
        };

        let errors = pipeline.persist(item).await;
        unit.refresh_score();
        for err in errors {
            self.report(err);
        }
    }

    fn report(&self, err: CrawlerError) {
        counter!("crawler_stage_errors_total", "stage" => "persist").increment(1);
        self.context.send_error(err.tag(ModuleType::Pipeline));
    }
}

#[async_trait]
impl Worker for PersistWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        debug!("Worker {} started", self.name);
        let mut cancel = self.cancel.clone();
        while let Some(item) = next_datum(&self.context.item_pool, &mut cancel).await {
            if let Err(e) = catch_panic(self.handle(item)).await {
                error!("Worker {} recovered from {}", self.name, e);
                self.report(CrawlerError::unit(ModuleType::Pipeline, e));
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
