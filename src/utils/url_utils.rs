// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::CrawlerError;
use std::net::IpAddr;
use url::{ParseError, Url};

/// 主域名计算函数
///
/// 调度器通过该函数判断请求是否属于可接受的域名，可以替换为更精确的实现
pub type PrimaryDomainFn = fn(&str) -> Result<String, CrawlerError>;

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 计算主机名的简化主域名
///
/// 取最后两个以点分隔的标签；IP地址和单标签主机名原样返回。
/// 多级公共后缀（如 `.co.uk`）不会被正确识别。
///
/// # 参数
///
/// * `host` - 主机名，可以带端口
///
/// # 返回值
///
/// * `Ok(String)` - 主域名
/// * `Err(CrawlerError)` - 主机名为空或无法识别
pub fn primary_domain(host: &str) -> Result<String, CrawlerError> {
    let host = strip_port(host.trim()).trim_end_matches('.');
    if host.is_empty() {
        return Err(CrawlerError::IllegalParameter("empty host".to_string()));
    }
    if host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return Err(CrawlerError::IllegalParameter(format!(
            "unrecognized host: {}",
            host
        )));
    }
    if labels.len() == 1 {
        return Ok(host.to_ascii_lowercase());
    }

    let name = labels[labels.len() - 2];
    let tld = labels[labels.len() - 1];
    // 纯数字的标签通常是写错的IP地址
    if name.chars().all(|c| c.is_ascii_digit()) || tld.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrawlerError::IllegalParameter(format!(
            "unrecognized host: {}",
            host
        )));
    }

    Ok(format!("{}.{}", name, tld).to_ascii_lowercase())
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [::1]:8080
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
