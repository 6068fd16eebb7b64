// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::modules::mid::Mid;
use crate::modules::mtype::ModuleType;
use crate::modules::traits::{check_type, Unit};
use crate::utils::errors::CrawlerError;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 组件注册器
///
/// 按组件类型分组保存已注册的组件，并根据评分选出最空闲的组件。
/// 同一类型内以组件ID排序，评分相同时选择ID最小的组件，保证选择结果确定。
#[derive(Debug, Default)]
pub struct Registry {
    modules: RwLock<HashMap<ModuleType, BTreeMap<Mid, Unit>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新注册成功
    /// * `Ok(false)` - 相同ID的组件已存在，未做改动
    /// * `Err(CrawlerError::IllegalParameter)` - 组件ID不合法或与组件类型不符
    pub fn register(&self, unit: Unit) -> Result<bool, CrawlerError> {
        let mid = unit.id().clone();
        let parts = mid.split()?;
        let module_type = unit.module_type();
        if !check_type(parts.module_type, &unit) {
            return Err(CrawlerError::IllegalParameter(format!(
                "incorrect module type {} for MID {}",
                module_type, mid
            )));
        }

        let mut modules = self.modules.write();
        let group = modules.entry(module_type).or_default();
        if group.contains_key(&mid) {
            return Ok(false);
        }
        debug!("Registered {} module {}", module_type, mid);
        group.insert(mid, unit);
        Ok(true)
    }

    /// 注销组件，返回是否确实删除了组件
    pub fn unregister(&self, mid: &Mid) -> Result<bool, CrawlerError> {
        let parts = mid.split()?;
        let mut modules = self.modules.write();
        let removed = modules
            .get_mut(&parts.module_type)
            .map(|group| group.remove(mid).is_some())
            .unwrap_or(false);
        if removed {
            debug!("Unregistered module {}", mid);
        }
        Ok(removed)
    }

    /// 获取指定类型中评分最低的组件
    ///
    /// 选择前会按各组件当前计数刷新评分
    pub fn get(&self, module_type: ModuleType) -> Result<Unit, CrawlerError> {
        let modules = self.modules.read();
        let selected = modules.get(&module_type).and_then(|group| {
            group
                .values()
                .map(|unit| {
                    unit.refresh_score();
                    (unit.score(), unit)
                })
                .min_by_key(|(score, _)| *score)
                .map(|(_, unit)| unit.clone())
        });
        selected.ok_or_else(|| {
            CrawlerError::NotFound(format!("no {} module is registered", module_type))
        })
    }

    /// 指定类型的全部组件快照，按组件ID排序
    pub fn get_all_by_type(&self, module_type: ModuleType) -> Vec<Unit> {
        self.modules
            .read()
            .get(&module_type)
            .map(|group| group.values().cloned().collect())
            .unwrap_or_default()
    }

    /// 全部组件快照，按类型和组件ID排序
    pub fn get_all(&self) -> Vec<Unit> {
        let modules = self.modules.read();
        ModuleType::ALL
            .iter()
            .filter_map(|module_type| modules.get(module_type))
            .flat_map(|group| group.values().cloned())
            .collect()
    }

    /// 已注册组件的总数
    pub fn len(&self) -> usize {
        self.modules.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.modules.write().clear();
    }
}
