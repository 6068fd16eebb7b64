// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::StubDownloader;
use std::sync::Arc;
use webcrawler::domain::models::Request;
use webcrawler::modules::{Downloader, Mid, Module, ModuleType, Registry, Unit};
use webcrawler::utils::errors::CrawlerError;

fn unit(downloader: &Arc<StubDownloader>) -> Unit {
    let downloader: Arc<dyn Downloader> = downloader.clone();
    Unit::Downloader(downloader)
}

#[tokio::test]
async fn test_get_prefers_least_loaded_downloader() {
    let pages = [("http://example.com/", "<html></html>")];
    let busy = Arc::new(StubDownloader::new("D1", &pages));
    let idle = Arc::new(StubDownloader::new("D2", &pages));

    let registry = Registry::new();
    assert!(registry.register(unit(&busy)).unwrap());
    assert!(registry.register(unit(&idle)).unwrap());
    // equal scores fall back to the smallest MID
    assert_eq!(registry.get(ModuleType::Downloader).unwrap().id().as_str(), "D1");

    busy.fetch(Request::new("http://example.com/", 0)).await.unwrap();
    let picked = registry.get(ModuleType::Downloader).unwrap();
    assert_eq!(picked.id().as_str(), "D2");
    assert!(busy.score() > 0);
    assert_eq!(idle.score(), 0);
}

#[test]
fn test_register_rejects_duplicates_and_unknown_types() {
    let registry = Registry::new();
    let first = Arc::new(StubDownloader::new("D1|127.0.0.1:8080", &[]));
    let second = Arc::new(StubDownloader::new("D1|127.0.0.1:8080", &[]));
    assert!(registry.register(unit(&first)).unwrap());
    assert!(!registry.register(unit(&second)).unwrap());
    assert_eq!(registry.len(), 1);

    let err = registry.get(ModuleType::Pipeline).unwrap_err();
    assert!(matches!(err, CrawlerError::NotFound(_)));

    assert!(registry.unregister(&Mid::from("D1|127.0.0.1:8080")).unwrap());
    assert!(registry.is_empty());
}
