// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Data, Response};
use crate::modules::base::{ModuleBase, ModuleSummary};
use crate::modules::mid::Mid;
use crate::modules::mtype::ModuleType;
use crate::modules::score::CalculateScore;
use crate::modules::traits::{Analyzer, Module};
use crate::utils::errors::CrawlerError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// 响应解析函数
///
/// 第二个参数为响应深度。返回解析得到的数据以及解析中遇到的错误
pub type ParseResponse = Arc<dyn Fn(&Response, u32) -> (Vec<Data>, Vec<anyhow::Error>) + Send + Sync>;

/// 本地分析器
///
/// 依次调用全部解析函数，每个解析函数都会看到完整的响应内容
pub struct LocalAnalyzer {
    base: ModuleBase,
    parsers: Vec<ParseResponse>,
}

impl LocalAnalyzer {
    pub fn new(
        mid: Mid,
        parsers: Vec<ParseResponse>,
        calculator: CalculateScore,
    ) -> Result<Self, CrawlerError> {
        let base = ModuleBase::new(mid, calculator)?;
        if base.id().module_type()? != ModuleType::Analyzer {
            return Err(CrawlerError::IllegalParameter(format!(
                "MID {} is not an analyzer MID",
                base.id()
            )));
        }
        if parsers.is_empty() {
            return Err(CrawlerError::IllegalParameter(
                "empty response parser list".to_string(),
            ));
        }
        Ok(Self { base, parsers })
    }

    pub fn parser_number(&self) -> usize {
        self.parsers.len()
    }
}

impl Module for LocalAnalyzer {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn summary(&self) -> ModuleSummary {
        let mut summary = self.base.summary();
        summary.extra = Some(json!({ "parser_number": self.parsers.len() }));
        summary
    }
}

#[async_trait]
impl Analyzer for LocalAnalyzer {
    async fn parse(&self, response: Response) -> (Vec<Data>, Vec<CrawlerError>) {
        let _handling = self.base.handling();
        self.base.incr_called();

        if !response.valid() {
            let err = CrawlerError::IllegalParameter(format!(
                "invalid response URL {:?}",
                response.url
            ));
            return (Vec::new(), vec![err]);
        }
        self.base.incr_accepted();

        let depth = response.depth;
        let next_depth = depth.checked_add(1);
        let mut data_list = Vec::new();
        let mut errors = Vec::new();
        for parser in &self.parsers {
            let (parsed, parse_errors) = parser(&response, depth);
            for data in parsed {
                match (data, next_depth) {
                    (Data::Request(mut request), Some(next_depth)) => {
                        request.depth = next_depth;
                        data_list.push(Data::Request(request));
                    }
                    (Data::Request(request), None) => {
                        errors.push(CrawlerError::IllegalParameter(format!(
                            "request {} is beyond the maximum depth {}",
                            request.url, depth
                        )));
                    }
                    (item, _) => data_list.push(item),
                }
            }
            errors.extend(
                parse_errors
                    .into_iter()
                    .map(|e| CrawlerError::unit(ModuleType::Analyzer, format!("{:#}", e))),
            );
        }

        if errors.is_empty() {
            self.base.incr_completed();
        }
        (data_list, errors)
    }
}
