// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::mtype::ModuleType;
use crate::utils::errors::CrawlerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// 组件ID
///
/// 格式为 `<类型字母><序列号>`，可选地跟随 `|<IP>:<端口>`，例如 `D1`、`A7|127.0.0.1:8080`。
/// 通过 `From<&str>` 构造时不做校验，使用 [`Mid::split`] 或 `FromStr` 校验。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mid(String);

/// 组件ID的组成部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidParts {
    pub module_type: ModuleType,
    pub sn: u64,
    pub addr: Option<SocketAddr>,
}

impl Mid {
    /// 生成组件ID
    ///
    /// # 参数
    ///
    /// * `module_type` - 组件类型
    /// * `sn` - 序列号
    /// * `addr` - 组件的网络地址，本地组件为 `None`
    pub fn new(module_type: ModuleType, sn: u64, addr: Option<SocketAddr>) -> Self {
        match addr {
            Some(addr) => Mid(format!("{}{}|{}", module_type.letter(), sn, addr)),
            None => Mid(format!("{}{}", module_type.letter(), sn)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 拆分并校验组件ID
    pub fn split(&self) -> Result<MidParts, CrawlerError> {
        split_mid(&self.0)
    }

    /// 组件ID中记录的组件类型
    pub fn module_type(&self) -> Result<ModuleType, CrawlerError> {
        self.split().map(|parts| parts.module_type)
    }

    pub fn legal(&self) -> bool {
        self.split().is_ok()
    }
}

impl From<MidParts> for Mid {
    fn from(parts: MidParts) -> Self {
        Mid::new(parts.module_type, parts.sn, parts.addr)
    }
}

impl From<&str> for Mid {
    fn from(s: &str) -> Self {
        Mid(s.to_string())
    }
}

impl From<String> for Mid {
    fn from(s: String) -> Self {
        Mid(s)
    }
}

impl FromStr for Mid {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_mid(s)?;
        Ok(Mid(s.to_string()))
    }
}

impl fmt::Display for Mid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn illegal(msg: String) -> CrawlerError {
    CrawlerError::IllegalParameter(msg)
}

/// 拆分组件ID字符串
///
/// 字符串过短、类型字母未知、序列号非数字、IP无法解析或端口非数字时返回 `IllegalParameter`
pub fn split_mid(mid: &str) -> Result<MidParts, CrawlerError> {
    let mut chars = mid.chars();
    let letter = chars
        .next()
        .ok_or_else(|| illegal("insufficient MID".to_string()))?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Err(illegal(format!("insufficient MID: {:?}", mid)));
    }

    let module_type = ModuleType::from_letter(letter)
        .ok_or_else(|| illegal(format!("illegal module type letter: {}", letter)))?;

    let (sn_str, addr_str) = match rest.rsplit_once('|') {
        Some((sn, addr)) => (sn, Some(addr)),
        None => (rest, None),
    };
    let sn = parse_digits::<u64>(sn_str)
        .ok_or_else(|| illegal(format!("illegal module SN: {:?}", sn_str)))?;

    let addr = match addr_str {
        Some(addr) => Some(parse_addr(addr)?),
        None => None,
    };

    Ok(MidParts {
        module_type,
        sn,
        addr,
    })
}

/// 组件ID字符串中记录的组件类型
pub fn module_type_of(mid: &str) -> Result<ModuleType, CrawlerError> {
    split_mid(mid).map(|parts| parts.module_type)
}

fn parse_addr(addr: &str) -> Result<SocketAddr, CrawlerError> {
    let (ip_str, port_str) = addr
        .rsplit_once(':')
        .filter(|(ip, _)| !ip.is_empty())
        .ok_or_else(|| illegal(format!("illegal module address: {:?}", addr)))?;

    let ip = ip_str
        .strip_prefix('[')
        .and_then(|ip| ip.strip_suffix(']'))
        .unwrap_or(ip_str)
        .parse::<IpAddr>()
        .map_err(|_| illegal(format!("illegal module ip: {:?}", ip_str)))?;
    let port = parse_digits::<u16>(port_str)
        .ok_or_else(|| illegal(format!("illegal module port: {:?}", port_str)))?;

    Ok(SocketAddr::new(ip, port))
}

fn parse_digits<N: FromStr>(s: &str) -> Option<N> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
