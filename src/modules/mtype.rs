// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 组件类型
///
/// 每个处理组件只具备一种能力，对应流水线中的一个阶段：
/// 下载器负责抓取，分析器负责解析，条目处理管道负责持久化。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// 下载器（抓取阶段）
    Downloader,
    /// 分析器（解析阶段）
    Analyzer,
    /// 条目处理管道（持久化阶段）
    Pipeline,
}

impl ModuleType {
    /// 全部组件类型
    pub const ALL: [ModuleType; 3] = [
        ModuleType::Downloader,
        ModuleType::Analyzer,
        ModuleType::Pipeline,
    ];

    /// 组件ID中使用的类型字母
    pub fn letter(self) -> char {
        match self {
            ModuleType::Downloader => 'D',
            ModuleType::Analyzer => 'A',
            ModuleType::Pipeline => 'P',
        }
    }

    /// 由类型字母得到组件类型
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'D' => Some(ModuleType::Downloader),
            'A' => Some(ModuleType::Analyzer),
            'P' => Some(ModuleType::Pipeline),
            _ => None,
        }
    }

    /// 字母是否为合法的类型字母
    pub fn legal_letter(letter: char) -> bool {
        Self::from_letter(letter).is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleType::Downloader => "downloader",
            ModuleType::Analyzer => "analyzer",
            ModuleType::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloader" => Ok(ModuleType::Downloader),
            "analyzer" => Ok(ModuleType::Analyzer),
            "pipeline" => Ok(ModuleType::Pipeline),
            _ => Err(()),
        }
    }
}
