// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Data, Item, Request, Response};
use crate::modules::base::{ModuleBase, ModuleSummary};
use crate::modules::mid::Mid;
use crate::modules::mtype::ModuleType;
use crate::modules::score::{self, CalculateScore, Counts};
use crate::utils::errors::CrawlerError;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// 组件公共接口
///
/// 所有处理组件都通过内部的 [`ModuleBase`] 提供ID、评分和计数，
/// 实现者通常只需要提供 `base()`，需要附加摘要信息时覆盖 `summary()`。
pub trait Module: Send + Sync {
    fn base(&self) -> &ModuleBase;

    fn id(&self) -> &Mid {
        self.base().id()
    }

    fn addr(&self) -> Option<SocketAddr> {
        self.base().addr()
    }

    fn score(&self) -> u64 {
        self.base().score()
    }

    fn set_score(&self, score: u64) {
        self.base().set_score(score)
    }

    fn score_calculator(&self) -> CalculateScore {
        self.base().score_calculator()
    }

    fn counts(&self) -> Counts {
        self.base().counts()
    }

    fn summary(&self) -> ModuleSummary {
        self.base().summary()
    }
}

/// 下载器（抓取阶段组件）
#[async_trait]
pub trait Downloader: Module {
    /// 抓取请求对应的页面
    async fn fetch(&self, request: Request) -> Result<Response, CrawlerError>;
}

/// 分析器（解析阶段组件）
#[async_trait]
pub trait Analyzer: Module {
    /// 解析响应，返回新的请求或条目，以及解析过程中的全部错误
    async fn parse(&self, response: Response) -> (Vec<Data>, Vec<CrawlerError>);
}

/// 条目处理管道（持久化阶段组件）
#[async_trait]
pub trait Pipeline: Module {
    /// 处理条目，返回处理过程中的全部错误
    async fn persist(&self, item: Item) -> Vec<CrawlerError>;

    /// 是否在第一个错误处停止处理链
    fn fail_fast(&self) -> bool;

    fn set_fail_fast(&self, fail_fast: bool);
}

/// 处理组件
///
/// 三类组件的封闭集合，调度器和注册器只通过它来操作组件
#[derive(Clone)]
pub enum Unit {
    Downloader(Arc<dyn Downloader>),
    Analyzer(Arc<dyn Analyzer>),
    Pipeline(Arc<dyn Pipeline>),
}

macro_rules! with_module {
    ($unit:expr, $m:ident => $body:expr) => {
        match $unit {
            Unit::Downloader($m) => $body,
            Unit::Analyzer($m) => $body,
            Unit::Pipeline($m) => $body,
        }
    };
}

impl Unit {
    /// 组件声明的类型
    pub fn module_type(&self) -> ModuleType {
        match self {
            Unit::Downloader(_) => ModuleType::Downloader,
            Unit::Analyzer(_) => ModuleType::Analyzer,
            Unit::Pipeline(_) => ModuleType::Pipeline,
        }
    }

    pub fn id(&self) -> &Mid {
        with_module!(self, m => m.id())
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        with_module!(self, m => m.addr())
    }

    pub fn score(&self) -> u64 {
        with_module!(self, m => m.score())
    }

    pub fn set_score(&self, score: u64) {
        with_module!(self, m => m.set_score(score))
    }

    pub fn score_calculator(&self) -> CalculateScore {
        with_module!(self, m => m.score_calculator())
    }

    pub fn counts(&self) -> Counts {
        with_module!(self, m => m.counts())
    }

    pub fn summary(&self) -> ModuleSummary {
        with_module!(self, m => m.summary())
    }

    /// 按当前计数重新计算评分，返回评分是否变化
    pub fn refresh_score(&self) -> bool {
        with_module!(self, m => score::set_score(&**m))
    }

    pub fn as_downloader(&self) -> Option<&Arc<dyn Downloader>> {
        match self {
            Unit::Downloader(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_analyzer(&self) -> Option<&Arc<dyn Analyzer>> {
        match self {
            Unit::Analyzer(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_pipeline(&self) -> Option<&Arc<dyn Pipeline>> {
        match self {
            Unit::Pipeline(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Unit")
            .field("type", &self.module_type())
            .field("id", self.id())
            .field("score", &self.score())
            .finish()
    }
}

impl From<Arc<dyn Downloader>> for Unit {
    fn from(d: Arc<dyn Downloader>) -> Self {
        Unit::Downloader(d)
    }
}

impl From<Arc<dyn Analyzer>> for Unit {
    fn from(a: Arc<dyn Analyzer>) -> Self {
        Unit::Analyzer(a)
    }
}

impl From<Arc<dyn Pipeline>> for Unit {
    fn from(p: Arc<dyn Pipeline>) -> Self {
        Unit::Pipeline(p)
    }
}

/// 检查组件ID中的类型字母是否与组件声明的类型一致
pub fn check_type(module_type: ModuleType, unit: &Unit) -> bool {
    unit.module_type() == module_type
        && unit
            .id()
            .module_type()
            .map(|declared| declared == module_type)
            .unwrap_or(false)
}
