// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Request;
use crate::utils::url_utils::PrimaryDomainFn;
use dashmap::DashSet;
use std::collections::HashSet;
use thiserror::Error;

/// 请求被拒绝的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme {scheme:?} (url: {url})")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("unrecognized host of {url}: {reason}")]
    UnrecognizedHost { url: String, reason: String },

    #[error("domain {domain:?} is not accepted (url: {url})")]
    DomainNotAccepted { url: String, domain: String },

    #[error("depth {depth} exceeds max depth {max_depth} (url: {url})")]
    TooDeep {
        url: String,
        depth: u32,
        max_depth: u32,
    },

    #[error("repeated URL {url}")]
    Repeated { url: String },
}

/// 请求准入检查
///
/// 依次检查URL合法性、协议、主域名、深度，最后以原子的测试并插入完成去重。
/// 已记录的URL在一次运行中不会被移除。
pub struct Admission {
    accepted_domains: HashSet<String>,
    max_depth: u32,
    primary_domain: PrimaryDomainFn,
    urls: DashSet<String>,
}

impl Admission {
    pub fn new(accepted_domains: &[String], max_depth: u32, primary_domain: PrimaryDomainFn) -> Self {
        Self {
            accepted_domains: accepted_domains
                .iter()
                .map(|domain| domain.trim().to_ascii_lowercase())
                .collect(),
            max_depth,
            primary_domain,
            urls: DashSet::new(),
        }
    }

    /// 检查请求能否进入请求缓冲池
    ///
    /// # 参数
    ///
    /// * `request` - 候选请求
    /// * `is_seed` - 是否为首个请求，首个请求不做域名检查
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 规范化后的URL，已记录到去重集合
    /// * `Err(Rejection)` - 拒绝原因
    pub fn admit(&self, request: &Request, is_seed: bool) -> Result<String, Rejection> {
        let url = request.parsed_url().map_err(|e| Rejection::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Rejection::UnsupportedScheme {
                url: url.to_string(),
                scheme: scheme.to_string(),
            });
        }

        if !is_seed && !self.accepted_domains.is_empty() {
            let host = url.host_str().unwrap_or("");
            let domain = (self.primary_domain)(host).map_err(|e| Rejection::UnrecognizedHost {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if !self.accepted_domains.contains(&domain) {
                return Err(Rejection::DomainNotAccepted {
                    url: url.to_string(),
                    domain,
                });
            }
        }

        if request.depth > self.max_depth {
            return Err(Rejection::TooDeep {
                url: url.to_string(),
                depth: request.depth,
                max_depth: self.max_depth,
            });
        }

        let canonical = url.to_string();
        if !self.urls.insert(canonical.clone()) {
            return Err(Rejection::Repeated { url: canonical });
        }
        Ok(canonical)
    }

    /// 已记录的URL数量
    pub fn url_number(&self) -> u64 {
        self.urls.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::url_utils::primary_domain;
    use std::sync::Arc;

    fn admission(domains: &[&str], max_depth: u32) -> Admission {
        let domains: Vec<String> = domains.iter().map(|d| d.to_string()).collect();
        Admission::new(&domains, max_depth, primary_domain)
    }

    #[test]
    fn test_admit_and_dedup() {
        let admission = admission(&["bing.com"], 1);
        let req = Request::new("http://cn.bing.com/images/search?q=rust", 0);
        assert!(admission.admit(&req, false).is_ok());
        assert!(matches!(
            admission.admit(&req, false),
            Err(Rejection::Repeated { .. })
        ));
        assert_eq!(admission.url_number(), 1);
    }

    #[test]
    fn test_rejections() {
        let admission = admission(&["example.com"], 1);
        let cases = [
            (Request::new("not a url", 0), "invalid"),
            (Request::new("tcp://example.com/", 0), "scheme"),
            (Request::new("ftp://example.com/", 0), "scheme"),
            (Request::new("http://other.com/x", 1), "domain"),
            (Request::new("http://example.com/deep", 2), "depth"),
        ];
        for (req, kind) in cases {
            let rejection = admission.admit(&req, false).unwrap_err();
            let matched = match kind {
                "invalid" => matches!(rejection, Rejection::InvalidUrl { .. }),
                "scheme" => matches!(rejection, Rejection::UnsupportedScheme { .. }),
                "domain" => matches!(rejection, Rejection::DomainNotAccepted { .. }),
                _ => matches!(rejection, Rejection::TooDeep { .. }),
            };
            assert!(matched, "{} -> {}", req.url, rejection);
        }
        // rejected requests are never recorded
        assert_eq!(admission.url_number(), 0);
    }

    #[test]
    fn test_seed_bypasses_domain_check_only() {
        let admission = admission(&["example.com"], 0);
        assert!(admission
            .admit(&Request::new("http://other.com/", 0), true)
            .is_ok());
        assert!(matches!(
            admission.admit(&Request::new("tcp://other.com/", 0), true),
            Err(Rejection::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            admission.admit(&Request::new("http://other.com/", 0), true),
            Err(Rejection::Repeated { .. })
        ));
    }

    #[test]
    fn test_empty_domain_list_accepts_any_host() {
        let admission = admission(&[], 3);
        for url in ["http://a.com/", "https://b.org/", "http://127.0.0.1:8080/"] {
            assert!(admission.admit(&Request::new(url, 3), false).is_ok());
        }
    }

    #[test]
    fn test_concurrent_admission_is_at_most_once() {
        let admission = Arc::new(admission(&[], 1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let admission = admission.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| {
                            let req = Request::new(format!("http://example.com/{}", i), 1);
                            admission.admit(&req, false).is_ok()
                        })
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(admission.url_number(), 100);
    }
}
