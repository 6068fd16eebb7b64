// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 处理组件模块
///
/// 定义下载器、分析器和条目处理管道三类组件的公共接口，
/// 以及组件ID编解码、序列号生成、评分计算和组件注册器。
pub mod analyzer;
pub mod base;
pub mod downloader;
pub mod mid;
pub mod mtype;
pub mod parsers;
pub mod pipeline;
pub mod registry;
pub mod score;
pub mod sn;
pub mod traits;

pub use analyzer::{LocalAnalyzer, ParseResponse};
pub use base::{HandlingGuard, ModuleBase, ModuleSummary};
pub use downloader::HttpDownloader;
pub use mid::{module_type_of, split_mid, Mid, MidParts};
pub use mtype::ModuleType;
pub use pipeline::{LocalPipeline, ProcessItem};
pub use registry::Registry;
pub use score::{calculate_score_simple, set_score, CalculateScore, Counts};
pub use sn::SnGenerator;
pub use traits::{check_type, Analyzer, Downloader, Module, Pipeline, Unit};
