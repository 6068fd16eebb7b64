// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Data, Item, Request, Response};
use crate::modules::analyzer::ParseResponse;
use crate::utils::url_utils::resolve_url;
use anyhow::anyhow;
use scraper::{Html, Selector};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

fn is_html(resp: &Response) -> bool {
    let content_type = resp.content_type();
    content_type.is_empty() || content_type.starts_with("text/html")
}

/// 提取页面中全部链接的解析函数
///
/// 非200响应报告错误；非HTML内容不产生数据。链接按出现顺序输出，同一页面内去重
pub fn html_link_parser() -> ParseResponse {
    Arc::new(|resp: &Response, depth: u32| -> (Vec<Data>, Vec<anyhow::Error>) {
        let mut data_list = Vec::new();
        let mut errors = Vec::new();
        if resp.status_code != 200 {
            errors.push(anyhow!(
                "unsupported status code {} (url: {})",
                resp.status_code,
                resp.url
            ));
            return (data_list, errors);
        }
        if !is_html(resp) {
            return (data_list, errors);
        }
        let Some(next_depth) = depth.checked_add(1) else {
            errors.push(anyhow!(
                "depth {} is at its limit, links are not followed (url: {})",
                depth,
                resp.url
            ));
            return (data_list, errors);
        };

        let selector = match Selector::parse("a[href]") {
            Ok(selector) => selector,
            Err(e) => {
                errors.push(anyhow!("Invalid selector: {:?}", e));
                return (data_list, errors);
            }
        };
        let base = match Url::parse(&resp.url) {
            Ok(base) => base,
            Err(e) => {
                errors.push(anyhow!("invalid response URL {:?}: {}", resp.url, e));
                return (data_list, errors);
            }
        };
        let document = Html::parse_document(&resp.text());
        let mut seen = HashSet::new();
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            // Ignore fragment identifiers, mailto and javascript links
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("javascript:")
            {
                continue;
            }
            match resolve_url(&base, href) {
                Ok(mut url) => {
                    url.set_fragment(None);
                    let url = url.to_string();
                    if seen.insert(url.clone()) {
                        data_list.push(Data::Request(Request::new(url, next_depth)));
                    }
                }
                Err(e) => errors.push(anyhow!("unresolvable link {:?}: {}", href, e)),
            }
        }
        (data_list, errors)
    })
}

/// 提取页面标题的解析函数，生成 `{title, url}` 条目
pub fn html_title_parser() -> ParseResponse {
    Arc::new(|resp: &Response, _depth: u32| -> (Vec<Data>, Vec<anyhow::Error>) {
        let mut data_list = Vec::new();
        let mut errors = Vec::new();
        if resp.status_code != 200 || !is_html(resp) {
            return (data_list, errors);
        }

        let selector = match Selector::parse("title") {
            Ok(selector) => selector,
            Err(e) => {
                errors.push(anyhow!("Invalid selector: {:?}", e));
                return (data_list, errors);
            }
        };
        let document = Html::parse_document(&resp.text());
        if let Some(element) = document.select(&selector).next() {
            let title = element.text().collect::<String>().trim().to_string();
            let mut item = Item::new();
            item.insert("title".to_string(), json!(title));
            item.insert("url".to_string(), json!(resp.url));
            data_list.push(Data::Item(item));
        }
        (data_list, errors)
    })
}
