// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::scheduler::args::{DataArgs, RequestArgs};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含爬取范围、缓冲池容量、各阶段工作器数量、组件数量、空闲监控和HTTP客户端等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 爬取范围配置
    pub crawl: CrawlSettings,
    /// 缓冲池容量配置
    pub buffers: DataArgs,
    /// 工作器数量配置
    pub workers: WorkerSettings,
    /// 组件数量配置
    pub modules: ModuleSettings,
    /// 空闲监控配置
    pub monitor: MonitorSettings,
    /// HTTP客户端配置
    pub http: HttpSettings,
}

/// 爬取范围配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 首个请求的URL
    pub seed_url: String,
    /// 可接受的主域名
    pub accepted_domains: Vec<String>,
    /// 最大爬取深度
    pub max_depth: u32,
}

impl CrawlSettings {
    pub fn request_args(&self) -> RequestArgs {
        RequestArgs::new(self.accepted_domains.clone(), self.max_depth)
    }
}

/// 工作器数量配置设置
///
/// 每个处理阶段启动固定数量的工作器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkerSettings {
    /// 抓取阶段工作器数量
    pub fetch: usize,
    /// 解析阶段工作器数量
    pub parse: usize,
    /// 持久化阶段工作器数量
    pub persist: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            fetch: 4,
            parse: 2,
            persist: 2,
        }
    }
}

/// 组件数量配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSettings {
    /// 下载器数量
    pub downloaders: usize,
    /// 分析器数量
    pub analyzers: usize,
    /// 条目处理管道数量
    pub pipelines: usize,
    /// 条目处理管道是否快速失败
    pub pipeline_fail_fast: bool,
}

/// 空闲监控配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// 空闲检查间隔（毫秒）
    pub check_interval_ms: u64,
    /// 连续空闲多少次后自动停止
    pub max_idle_count: u32,
}

impl MonitorSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

/// HTTP客户端配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `WEBCRAWLER__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("WEBCRAWLER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crawl.accepted_domains")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let data = DataArgs::default();
        let workers = WorkerSettings::default();
        Config::builder()
            // Crawl scope
            .set_default("crawl.seed_url", "https://www.rust-lang.org/")?
            .set_default("crawl.accepted_domains", vec!["rust-lang.org".to_string()])?
            .set_default("crawl.max_depth", 1)?
            // Buffer pools
            .set_default("buffers.req_buffer_cap", data.req_buffer_cap as i64)?
            .set_default("buffers.req_max_buffer_number", data.req_max_buffer_number as i64)?
            .set_default("buffers.resp_buffer_cap", data.resp_buffer_cap as i64)?
            .set_default("buffers.resp_max_buffer_number", data.resp_max_buffer_number as i64)?
            .set_default("buffers.item_buffer_cap", data.item_buffer_cap as i64)?
            .set_default("buffers.item_max_buffer_number", data.item_max_buffer_number as i64)?
            .set_default("buffers.error_buffer_cap", data.error_buffer_cap as i64)?
            .set_default("buffers.error_max_buffer_number", data.error_max_buffer_number as i64)?
            // Stage workers
            .set_default("workers.fetch", workers.fetch as i64)?
            .set_default("workers.parse", workers.parse as i64)?
            .set_default("workers.persist", workers.persist as i64)?
            // Module instances
            .set_default("modules.downloaders", 3)?
            .set_default("modules.analyzers", 2)?
            .set_default("modules.pipelines", 1)?
            .set_default("modules.pipeline_fail_fast", false)?
            // Idle monitor
            .set_default("monitor.check_interval_ms", 1000)?
            .set_default("monitor.max_idle_count", 5)?
            // HTTP client
            .set_default("http.timeout_secs", 30)?
            .set_default(
                "http.user_agent",
                "Mozilla/5.0 (compatible; webcrawler/0.1)",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.buffers, DataArgs::default());
        assert!(settings.buffers.check().is_ok());
        assert_eq!(settings.workers, WorkerSettings::default());
        assert_eq!(settings.crawl.request_args().max_depth, 1);
        assert_eq!(settings.crawl.accepted_domains, vec!["rust-lang.org"]);
        assert_eq!(settings.monitor.check_interval(), Duration::from_secs(1));
        assert_eq!(settings.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("crawl.max_depth", 3)
            .unwrap()
            .set_override("workers.fetch", 8)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.crawl.max_depth, 3);
        assert_eq!(settings.workers.fetch, 8);
    }
}
