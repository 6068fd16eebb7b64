// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Item;
use crate::modules::base::{ModuleBase, ModuleSummary};
use crate::modules::mid::Mid;
use crate::modules::mtype::ModuleType;
use crate::modules::score::CalculateScore;
use crate::modules::traits::{Module, Pipeline};
use crate::utils::errors::CrawlerError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 条目处理函数
///
/// 返回 `Some(item)` 时以新条目替换原条目交给下一个处理函数
pub type ProcessItem = Arc<dyn Fn(&Item) -> anyhow::Result<Option<Item>> + Send + Sync>;

/// 本地条目处理管道
///
/// 按顺序调用处理函数组成的处理链
pub struct LocalPipeline {
    base: ModuleBase,
    processors: Vec<ProcessItem>,
    fail_fast: AtomicBool,
}

impl LocalPipeline {
    pub fn new(
        mid: Mid,
        processors: Vec<ProcessItem>,
        calculator: CalculateScore,
    ) -> Result<Self, CrawlerError> {
        let base = ModuleBase::new(mid, calculator)?;
        if base.id().module_type()? != ModuleType::Pipeline {
            return Err(CrawlerError::IllegalParameter(format!(
                "MID {} is not a pipeline MID",
                base.id()
            )));
        }
        if processors.is_empty() {
            return Err(CrawlerError::IllegalParameter(
                "empty item processor list".to_string(),
            ));
        }
        Ok(Self {
            base,
            processors,
            fail_fast: AtomicBool::new(false),
        })
    }

    pub fn processor_number(&self) -> usize {
        self.processors.len()
    }
}

impl Module for LocalPipeline {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn summary(&self) -> ModuleSummary {
        let mut summary = self.base.summary();
        summary.extra = Some(json!({
            "fail_fast": self.fail_fast(),
            "processor_number": self.processors.len(),
        }));
        summary
    }
}

#[async_trait]
impl Pipeline for LocalPipeline {
    async fn persist(&self, item: Item) -> Vec<CrawlerError> {
        let _handling = self.base.handling();
        self.base.incr_called();
        self.base.incr_accepted();

        let fail_fast = self.fail_fast();
        let mut errors = Vec::new();
        let mut current = item;
        for (i, processor) in self.processors.iter().enumerate() {
            match processor(&current) {
                Ok(Some(next)) => current = next,
                Ok(None) => {}
                Err(e) => {
                    errors.push(CrawlerError::unit(
                        ModuleType::Pipeline,
                        format!("processor {}: {:#}", i, e),
                    ));
                    if fail_fast {
                        break;
                    }
                }
            }
        }

        if errors.is_empty() {
            self.base.incr_completed();
        }
        errors
    }

    fn fail_fast(&self) -> bool {
        self.fail_fast.load(Ordering::Acquire)
    }

    fn set_fail_fast(&self, fail_fast: bool) {
        self.fail_fast.store(fail_fast, Ordering::Release);
    }
}
