// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webcrawler::domain::models::{Data, Item, Request, Response};
use webcrawler::modules::parsers::{html_link_parser, html_title_parser};
use webcrawler::modules::{
    calculate_score_simple, Analyzer, Downloader, LocalAnalyzer, LocalPipeline, Mid, Module,
    ModuleBase, ModuleType, Pipeline, ProcessItem,
};
use webcrawler::scheduler::{DataArgs, ModuleArgs, RequestArgs, Scheduler};
use webcrawler::utils::errors::CrawlerError;

/// 按URL返回固定页面的下载器，并记录抓取过的URL
pub struct StubDownloader {
    base: ModuleBase,
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
    delay: Duration,
}

impl StubDownloader {
    pub fn new(mid: &str, pages: &[(&str, &str)]) -> Self {
        Self {
            base: ModuleBase::new(Mid::from(mid), calculate_score_simple).unwrap(),
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            fetched: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetched().iter().filter(|u| u.as_str() == url).count()
    }
}

impl Module for StubDownloader {
    fn base(&self) -> &ModuleBase {
        &self.base
    }
}

#[async_trait]
impl Downloader for StubDownloader {
    async fn fetch(&self, request: Request) -> Result<Response, CrawlerError> {
        let _handling = self.base.handling();
        self.base.incr_called();
        self.base.incr_accepted();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.fetched.lock().unwrap().push(request.url.clone());
        match self.pages.get(&request.url) {
            Some(body) => {
                self.base.incr_completed();
                Ok(Response::new(request.url, body.clone(), request.depth))
            }
            None => Err(CrawlerError::unit(
                ModuleType::Downloader,
                format!("no page for {}", request.url),
            )),
        }
    }
}

/// 每次解析都会panic的分析器
pub struct PanickingAnalyzer {
    base: ModuleBase,
}

impl PanickingAnalyzer {
    pub fn new(mid: &str) -> Self {
        Self {
            base: ModuleBase::new(Mid::from(mid), calculate_score_simple).unwrap(),
        }
    }
}

impl Module for PanickingAnalyzer {
    fn base(&self) -> &ModuleBase {
        &self.base
    }
}

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    async fn parse(&self, response: Response) -> (Vec<Data>, Vec<CrawlerError>) {
        let _handling = self.base.handling();
        self.base.incr_called();
        panic!("cannot parse {}", response.url);
    }
}

/// 记录收到的全部条目
#[derive(Clone, Default)]
pub struct ItemSink {
    items: Arc<Mutex<Vec<Item>>>,
}

impl ItemSink {
    pub fn processor(&self) -> ProcessItem {
        let items = self.items.clone();
        Arc::new(move |item: &Item| -> anyhow::Result<Option<Item>> {
            items.lock().unwrap().push(item.clone());
            Ok(None)
        })
    }

    pub fn items(&self) -> Vec<Item> {
        self.items.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .items()
            .iter()
            .filter_map(|item| item.get("title").and_then(|t| t.as_str()).map(String::from))
            .collect();
        titles.sort();
        titles
    }
}

pub fn html_analyzer(mid: &str) -> Arc<dyn Analyzer> {
    Arc::new(
        LocalAnalyzer::new(
            Mid::from(mid),
            vec![html_link_parser(), html_title_parser()],
            calculate_score_simple,
        )
        .unwrap(),
    )
}

pub fn sink_pipeline(mid: &str, sink: &ItemSink) -> Arc<dyn Pipeline> {
    Arc::new(LocalPipeline::new(Mid::from(mid), vec![sink.processor()], calculate_score_simple).unwrap())
}

pub fn module_args(downloader: Arc<StubDownloader>, sink: &ItemSink) -> ModuleArgs {
    let downloader: Arc<dyn Downloader> = downloader;
    ModuleArgs {
        downloaders: vec![downloader],
        analyzers: vec![html_analyzer("A1")],
        pipelines: vec![sink_pipeline("P1", sink)],
    }
}

pub fn request_args() -> RequestArgs {
    RequestArgs::new(vec!["example.com".to_string()], 1)
}

pub fn data_args() -> DataArgs {
    DataArgs {
        req_buffer_cap: 10,
        req_max_buffer_number: 10,
        resp_buffer_cap: 10,
        resp_max_buffer_number: 10,
        item_buffer_cap: 10,
        item_max_buffer_number: 10,
        error_buffer_cap: 10,
        error_max_buffer_number: 10,
    }
}

/// 等待调度器连续多次报告空闲
pub async fn wait_idle(scheduler: &Scheduler) {
    tokio::time::timeout(Duration::from_secs(10), async {
        let mut count = 0;
        while count < 3 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if scheduler.idle() {
                count += 1;
            } else {
                count = 0;
            }
        }
    })
    .await
    .expect("scheduler did not become idle");
}
