// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// 爬取请求
///
/// 目标URL及其所处的爬取深度。URL以字符串保存，
/// 由调度器在准入检查时解析，解析失败的请求不会被处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// 目标URL
    pub url: String,
    /// 爬取深度，种子请求为0
    pub depth: u32,
    /// 请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Request {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// 解析请求URL
    pub fn parsed_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)
    }

    /// 请求URL是否可以解析
    pub fn valid(&self) -> bool {
        self.parsed_url().is_ok()
    }
}

/// 抓取响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// 响应对应的最终URL
    pub url: String,
    /// HTTP状态码
    pub status_code: u16,
    /// 响应头（名称统一为小写）
    pub headers: HashMap<String, String>,
    /// 响应内容
    pub body: Bytes,
    /// 产生该响应的请求深度
    pub depth: u32,
}

impl Response {
    pub fn new(url: impl Into<String>, body: impl Into<Bytes>, depth: u32) -> Self {
        Self {
            url: url.into(),
            status_code: 200,
            headers: HashMap::new(),
            body: body.into(),
            depth,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// 内容类型，缺省为空字符串
    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .map(String::as_str)
            .unwrap_or("")
    }

    /// 以UTF-8解码的响应内容，非法字节被替换
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn valid(&self) -> bool {
        Url::parse(&self.url).is_ok()
    }
}

/// 条目，解析组件产出的通用键值记录
pub type Item = serde_json::Map<String, serde_json::Value>;

/// 解析组件可以产出的数据
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// 需要继续爬取的请求
    Request(Request),
    /// 需要持久化的条目
    Item(Item),
}

impl From<Request> for Data {
    fn from(request: Request) -> Self {
        Data::Request(request)
    }
}

impl From<Item> for Data {
    fn from(item: Item) -> Self {
        Data::Item(item)
    }
}
