// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Request, Response};
use crate::modules::base::ModuleBase;
use crate::modules::mid::Mid;
use crate::modules::mtype::ModuleType;
use crate::modules::score::CalculateScore;
use crate::modules::traits::{Downloader, Module};
use crate::utils::errors::CrawlerError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

/// HTTP下载器
///
/// 基于reqwest实现的下载组件，多个下载器实例可以共享同一个客户端
pub struct HttpDownloader {
    base: ModuleBase,
    client: reqwest::Client,
}

impl HttpDownloader {
    /// 创建HTTP下载器
    ///
    /// # 参数
    ///
    /// * `mid` - 组件ID，类型字母必须为下载器
    /// * `calculator` - 评分计算函数
    /// * `client` - HTTP客户端
    pub fn new(
        mid: Mid,
        calculator: CalculateScore,
        client: reqwest::Client,
    ) -> Result<Self, CrawlerError> {
        let base = ModuleBase::new(mid, calculator)?;
        if base.id().module_type()? != ModuleType::Downloader {
            return Err(CrawlerError::IllegalParameter(format!(
                "MID {} is not a downloader MID",
                base.id()
            )));
        }
        Ok(Self { base, client })
    }

    /// 按超时时间和User-Agent构建HTTP客户端
    pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, CrawlerError> {
        reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| CrawlerError::unit(ModuleType::Downloader, e))
    }
}

impl Module for HttpDownloader {
    fn base(&self) -> &ModuleBase {
        &self.base
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, request: Request) -> Result<Response, CrawlerError> {
        let _handling = self.base.handling();
        self.base.incr_called();

        let url = request.parsed_url().map_err(|e| {
            CrawlerError::IllegalParameter(format!("invalid request URL {:?}: {}", request.url, e))
        })?;
        self.base.incr_accepted();

        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        trace!("{} fetching {}", self.base.id(), url);
        let to_unit_err = |e: reqwest::Error| CrawlerError::unit(ModuleType::Downloader, e);
        let http_resp = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(to_unit_err)?;

        let final_url = http_resp.url().to_string();
        let status_code = http_resp.status().as_u16();
        let mut resp_headers = HashMap::new();
        for (k, v) in http_resp.headers() {
            if let Ok(v) = v.to_str() {
                resp_headers.insert(k.as_str().to_ascii_lowercase(), v.to_string());
            }
        }
        let body = http_resp.bytes().await.map_err(to_unit_err)?;

        self.base.incr_completed();
        Ok(Response {
            url: final_url,
            status_code,
            headers: resp_headers,
            body,
            depth: request.depth,
        })
    }
}
