// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use webcrawler::config::settings::Settings;
use webcrawler::domain::models::{Item, Request};
use webcrawler::modules::parsers::{html_link_parser, html_title_parser};
use webcrawler::modules::{
    calculate_score_simple, Analyzer, Downloader, HttpDownloader, LocalAnalyzer, LocalPipeline,
    Mid, ModuleType, Pipeline, ProcessItem, SnGenerator,
};
use webcrawler::scheduler::{ModuleArgs, Scheduler};
use webcrawler::utils::{metrics, telemetry};

/// 按配置构建全部处理组件
fn build_modules(settings: &Settings) -> anyhow::Result<ModuleArgs> {
    let sn = SnGenerator::default();
    let client = HttpDownloader::build_client(settings.http.timeout(), &settings.http.user_agent)?;

    let mut downloaders: Vec<Arc<dyn Downloader>> = Vec::new();
    for _ in 0..settings.modules.downloaders.max(1) {
        let mid = Mid::new(ModuleType::Downloader, sn.get(), None);
        downloaders.push(Arc::new(HttpDownloader::new(
            mid,
            calculate_score_simple,
            client.clone(),
        )?));
    }

    let mut analyzers: Vec<Arc<dyn Analyzer>> = Vec::new();
    for _ in 0..settings.modules.analyzers.max(1) {
        let mid = Mid::new(ModuleType::Analyzer, sn.get(), None);
        analyzers.push(Arc::new(LocalAnalyzer::new(
            mid,
            vec![html_link_parser(), html_title_parser()],
            calculate_score_simple,
        )?));
    }

    let log_item: ProcessItem = Arc::new(|item: &Item| -> anyhow::Result<Option<Item>> {
        let title = item.get("title").and_then(Value::as_str).unwrap_or_default();
        let url = item.get("url").and_then(Value::as_str).unwrap_or_default();
        info!("Item: {} ({})", title, url);
        Ok(None)
    });
    let mut pipelines: Vec<Arc<dyn Pipeline>> = Vec::new();
    for _ in 0..settings.modules.pipelines.max(1) {
        let mid = Mid::new(ModuleType::Pipeline, sn.get(), None);
        let pipeline = LocalPipeline::new(mid, vec![log_item.clone()], calculate_score_simple)?;
        pipeline.set_fail_fast(settings.modules.pipeline_fail_fast);
        pipelines.push(Arc::new(pipeline));
    }

    Ok(ModuleArgs {
        downloaders,
        analyzers,
        pipelines,
    })
}

/// 主函数
///
/// 加载配置、启动调度器，连续空闲达到设定次数后停止并输出摘要
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    metrics::describe_metrics();
    info!("Starting webcrawler...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Build modules and the scheduler
    let module_args = build_modules(&settings)?;
    let scheduler = Scheduler::new().with_workers(settings.workers);
    scheduler
        .init(settings.crawl.request_args(), settings.buffers, module_args)
        .await?;
    scheduler
        .start(Request::new(settings.crawl.seed_url.clone(), 0))
        .await?;

    // 4. Stream errors
    let mut errors = scheduler.error_chan();
    let error_logger = tokio::spawn(async move {
        while let Some(err) = errors.recv().await {
            error!("An error occurs when crawling: {}", err);
        }
    });

    // 5. Wait until idle
    let mut interval = tokio::time::interval(settings.monitor.check_interval());
    let mut idle_count = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping the scheduler");
                break;
            }
        }
        if scheduler.idle() {
            idle_count += 1;
            info!("Increase idle count, and value is {}", idle_count);
            if idle_count >= settings.monitor.max_idle_count {
                info!(
                    "The idle count is equal or greater than {}",
                    settings.monitor.max_idle_count
                );
                break;
            }
        } else {
            idle_count = 0;
        }
    }

    // 6. Stop and report
    scheduler.stop().await?;
    let _ = error_logger.await;
    info!("Final summary:\n{}", scheduler.summary().to_json()?);
    Ok(())
}
