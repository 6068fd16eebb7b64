// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    data_args, html_analyzer, module_args, request_args, sink_pipeline, wait_idle, ItemSink,
    PanickingAnalyzer, StubDownloader,
};
use std::sync::Arc;
use std::time::Duration;
use webcrawler::domain::models::Request;
use webcrawler::modules::{Analyzer, Downloader, ModuleType};
use webcrawler::scheduler::{DataArgs, ModuleArgs, RequestArgs, Scheduler, Status};
use webcrawler::utils::errors::CrawlerError;
use webcrawler::utils::telemetry::try_init_test_telemetry;

const HOME: &str = r#"<html><head><title>Home</title></head><body>
<a href="http://other.com/x">other</a>
<a href="http://example.com/y">y</a>
<a href="/y#top">y again</a>
</body></html>"#;

const PAGE_Y: &str = r#"<html><head><title>Y</title></head><body>
<a href="http://example.com/z">too deep</a>
</body></html>"#;

fn site() -> Arc<StubDownloader> {
    Arc::new(StubDownloader::new(
        "D1",
        &[("http://example.com/", HOME), ("http://example.com/y", PAGE_Y)],
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_follows_accepted_links_once() {
    try_init_test_telemetry();
    let downloader = site();
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();

    scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();

    assert_eq!(downloader.fetch_count("http://example.com/"), 1);
    assert_eq!(downloader.fetch_count("http://example.com/y"), 1);
    assert!(downloader.fetched().iter().all(|url| !url.contains("other.com")));
    assert!(downloader.fetched().iter().all(|url| !url.ends_with("/z")));
    assert_eq!(sink.titles(), vec!["Home".to_string(), "Y".to_string()]);

    let summary = scheduler.summary();
    assert_eq!(summary.status, "stopped");
    assert_eq!(summary.url_number, 2);
    assert_eq!(summary.downloaders.len(), 1);
    assert_eq!(summary.downloaders[0].called, 2);
    assert_eq!(summary.downloaders[0].handling, 0);
    assert_eq!(summary.pipelines[0].completed, 2);
}

#[tokio::test]
async fn test_init_validates_arguments_without_state_change() {
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();

    let zero = DataArgs {
        item_max_buffer_number: 0,
        ..data_args()
    };
    let err = scheduler
        .init(request_args(), zero, module_args(site(), &sink))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalParameter(_)));
    assert_eq!(scheduler.status(), Status::Uninitialized);

    let blank = RequestArgs::new(vec![" ".to_string()], 1);
    let err = scheduler
        .init(blank, data_args(), module_args(site(), &sink))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalParameter(_)));

    // a downloader carrying an analyzer MID
    let misnamed: Arc<dyn Downloader> = Arc::new(StubDownloader::new("A9", &[]));
    let args = ModuleArgs {
        downloaders: vec![misnamed],
        analyzers: vec![html_analyzer("A1")],
        pipelines: vec![sink_pipeline("P1", &sink)],
    };
    let err = scheduler
        .init(request_args(), data_args(), args)
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalParameter(_)));

    let args = ModuleArgs {
        pipelines: Vec::new(),
        ..module_args(site(), &sink)
    };
    let err = scheduler
        .init(request_args(), data_args(), args)
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalParameter(_)));
    assert_eq!(scheduler.status(), Status::Uninitialized);

    scheduler
        .init(request_args(), data_args(), module_args(site(), &sink))
        .await
        .unwrap();
    assert_eq!(scheduler.status(), Status::Initialized);
    // re-init while not started
    scheduler
        .init(request_args(), data_args(), module_args(site(), &sink))
        .await
        .unwrap();
    assert_eq!(scheduler.status(), Status::Initialized);
    assert_eq!(scheduler.registry().len(), 3);
}

#[tokio::test]
async fn test_start_rejects_bad_seed() {
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();
    scheduler
        .init(request_args(), data_args(), module_args(site(), &sink))
        .await
        .unwrap();

    for seed in ["not a url", "ftp://example.com/", "mailto:someone@example.com"] {
        let err = scheduler.start(Request::new(seed, 0)).await.unwrap_err();
        assert!(
            matches!(err, CrawlerError::IllegalParameter(_)),
            "seed {:?} gave {:?}",
            seed,
            err
        );
        assert_eq!(scheduler.status(), Status::Initialized);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lifecycle_and_restart() {
    let downloader = site();
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();

    scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    assert_eq!(scheduler.status(), Status::Started);

    let err = scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalStatus(_)));
    let err = scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalStatus(_)));

    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();
    assert_eq!(scheduler.status(), Status::Stopped);

    let err = scheduler.stop().await.unwrap_err();
    assert!(matches!(err, CrawlerError::IllegalStatus(_)));
    assert_eq!(scheduler.status(), Status::Stopped);

    // a stopped scheduler starts again with fresh pools and dedup set
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    assert_eq!(scheduler.status(), Status::Started);
    assert!(scheduler.summary().url_number >= 1);
    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();
    assert_eq!(downloader.fetch_count("http://example.com/"), 2);
    assert_eq!(downloader.fetch_count("http://example.com/y"), 2);
    assert_eq!(scheduler.summary().url_number, 2);

    // re-init after stop works as well
    scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();

    // the dedup set starts empty on every run
    assert_eq!(downloader.fetch_count("http://example.com/"), 3);
    assert_eq!(downloader.fetch_count("http://example.com/y"), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idle_tracks_in_flight_work() {
    let downloader = Arc::new(
        StubDownloader::new("D1", &[("http://example.com/", HOME)])
            .with_delay(Duration::from_millis(200)),
    );
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();
    assert!(scheduler.idle());

    scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap();
    assert!(scheduler.idle());

    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    assert!(!scheduler.idle());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!scheduler.idle());

    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_error_chan_streams_unit_errors_until_stop() {
    // http://example.com/y has no page, so the downloader fails on it
    let downloader = Arc::new(StubDownloader::new("D1", &[("http://example.com/", HOME)]));
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();

    scheduler
        .init(request_args(), data_args(), module_args(downloader.clone(), &sink))
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    let mut errors = scheduler.error_chan();
    // only the first call gets the run's channel
    assert!(scheduler.error_chan().recv().await.is_none());

    let err = tokio::time::timeout(Duration::from_secs(5), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(err.module_type(), Some(ModuleType::Downloader));
    assert!(err.to_string().contains("http://example.com/y"));

    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while errors.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
    assert!(scheduler.error_chan().recv().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_summary_reports_arguments_and_pools() {
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();
    scheduler
        .init(request_args(), data_args(), module_args(site(), &sink))
        .await
        .unwrap();

    let before = scheduler.summary();
    assert_eq!(before.status, "initialized");
    assert_eq!(before.request_args, request_args());
    assert_eq!(before.data_args, data_args());
    assert_eq!(before.module_args.downloader_list_size, 1);
    assert_eq!(before.module_args.analyzer_list_size, 1);
    assert_eq!(before.module_args.pipeline_list_size, 1);
    assert_eq!(before.req_buffer_pool.buffer_cap, 10);
    assert_eq!(before.req_buffer_pool.total, 0);
    assert_eq!(before.url_number, 0);
    assert!(before.same(&scheduler.summary()));

    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let after = scheduler.summary();
    assert_eq!(after.status, "started");
    assert_eq!(after.url_number, 2);
    assert!(!after.same(&before));

    let json: serde_json::Value = serde_json::from_str(&after.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "started");
    assert_eq!(json["downloaders"][0]["id"], "D1");
    assert_eq!(json["request_args"]["accepted_domains"][0], "example.com");

    scheduler.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_at_max_depth_stays_healthy() {
    let downloader = site();
    let sink = ItemSink::default();
    let scheduler = Scheduler::new();

    scheduler
        .init(
            RequestArgs::new(vec!["example.com".to_string()], u32::MAX),
            data_args(),
            module_args(downloader.clone(), &sink),
        )
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", u32::MAX))
        .await
        .unwrap();
    let mut errors = scheduler.error_chan();
    wait_idle(&scheduler).await;
    scheduler.stop().await.unwrap();

    // links on the deepest page are reported, not followed
    assert_eq!(downloader.fetched(), vec!["http://example.com/".to_string()]);
    assert_eq!(sink.titles(), vec!["Home".to_string()]);
    let err = tokio::time::timeout(Duration::from_secs(5), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(err.module_type(), Some(ModuleType::Analyzer));

    let summary = scheduler.summary();
    assert_eq!(summary.analyzers[0].called, 1);
    assert_eq!(summary.analyzers[0].handling, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_unit_does_not_stall_the_crawl() {
    let downloader = site();
    let sink = ItemSink::default();
    let analyzer: Arc<dyn Analyzer> = Arc::new(PanickingAnalyzer::new("A1"));
    let args = ModuleArgs {
        analyzers: vec![analyzer],
        ..module_args(downloader.clone(), &sink)
    };
    let scheduler = Scheduler::new();
    scheduler
        .init(request_args(), data_args(), args)
        .await
        .unwrap();
    scheduler
        .start(Request::new("http://example.com/", 0))
        .await
        .unwrap();
    let mut errors = scheduler.error_chan();

    wait_idle(&scheduler).await;
    let err = tokio::time::timeout(Duration::from_secs(5), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(err.module_type(), Some(ModuleType::Analyzer));
    assert!(err.to_string().contains("cannot parse http://example.com/"));
    assert_eq!(scheduler.summary().analyzers[0].handling, 0);

    scheduler.stop().await.unwrap();
    assert!(sink.items().is_empty());
}
