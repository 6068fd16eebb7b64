// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WorkerSettings;
use crate::domain::models::Request;
use crate::modules::mtype::ModuleType;
use crate::modules::registry::Registry;
use crate::modules::traits::Unit;
use crate::queue::BufferPoolSummary;
use crate::scheduler::args::{DataArgs, ModuleArgs, ModuleArgsSummary, RequestArgs};
use crate::scheduler::context::CrawlContext;
use crate::scheduler::status::{check_status, Status, StatusMachine};
use crate::scheduler::summary::SchedSummary;
use crate::utils::errors::CrawlerError;
use crate::utils::url_utils::{primary_domain, PrimaryDomainFn};
use crate::workers::manager::WorkerManager;
use metrics::counter;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// 一次启动的运行句柄
struct Run {
    cancel: watch::Sender<bool>,
    manager: WorkerManager,
}

/// 一次初始化绑定的参数和运行数据
struct Bound {
    request_args: RequestArgs,
    data_args: DataArgs,
    module_args: ModuleArgsSummary,
    context: Arc<CrawlContext>,
}

/// 调度器
///
/// 串联下载、分析、条目处理三个阶段，负责初始化、启动、停止以及运行状态的查询。
/// 初始化、启动和停止之间互斥；空闲判断、摘要和错误通道的读取不受其影响。
pub struct Scheduler {
    control: tokio::sync::Mutex<Option<Run>>,
    status: StatusMachine,
    registry: Arc<Registry>,
    bound: RwLock<Option<Arc<Bound>>>,
    error_rx: Mutex<Option<mpsc::Receiver<CrawlerError>>>,
    primary_domain: PrimaryDomainFn,
    workers: WorkerSettings,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            control: tokio::sync::Mutex::new(None),
            status: StatusMachine::new(),
            registry: Arc::new(Registry::new()),
            bound: RwLock::new(None),
            error_rx: Mutex::new(None),
            primary_domain,
            workers: WorkerSettings::default(),
        }
    }

    /// 设置各阶段的工作器数量，每个阶段至少一个
    pub fn with_workers(mut self, workers: WorkerSettings) -> Self {
        self.workers = WorkerSettings {
            fetch: workers.fetch.max(1),
            parse: workers.parse.max(1),
            persist: workers.persist.max(1),
        };
        self
    }

    /// 替换主域名计算函数
    pub fn with_primary_domain(mut self, primary_domain: PrimaryDomainFn) -> Self {
        self.primary_domain = primary_domain;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn status(&self) -> Status {
        self.status.current()
    }

    fn bound(&self) -> Option<Arc<Bound>> {
        self.bound.read().clone()
    }

    /// 初始化调度器
    ///
    /// 参数检查失败时不改变任何状态。未启动时可以重复初始化
    pub async fn init(
        &self,
        request_args: RequestArgs,
        data_args: DataArgs,
        module_args: ModuleArgs,
    ) -> Result<(), CrawlerError> {
        let _control = self.control.lock().await;
        info!("Initializing the scheduler...");
        check_status(self.status.current(), Status::Initializing)?;

        request_args.check()?;
        data_args.check()?;
        module_args.check()?;
        debug!("Request arguments: {:?}", request_args);
        debug!("Data arguments: {:?}", data_args);
        debug!("Module arguments: {:?}", module_args.summary());

        let previous = self.status.transition(Status::Initializing)?;
        if let Err(e) = self.bind(request_args, data_args, &module_args) {
            self.status.set(previous);
            return Err(e);
        }
        self.status.transition(Status::Initialized)?;
        info!("Scheduler has been initialized");
        Ok(())
    }

    fn bind(
        &self,
        request_args: RequestArgs,
        data_args: DataArgs,
        module_args: &ModuleArgs,
    ) -> Result<(), CrawlerError> {
        let context = Arc::new(CrawlContext::new(
            self.registry.clone(),
            &request_args,
            &data_args,
            self.primary_domain,
        )?);

        self.registry.clear();
        for unit in module_args.units() {
            let id = unit.id().clone();
            if !self.registry.register(unit)? {
                warn!("Module {} is already registered, ignore it", id);
            }
        }
        debug!("Registered {} modules", self.registry.len());

        *self.error_rx.lock() = None;
        *self.bound.write() = Some(Arc::new(Bound {
            request_args,
            data_args,
            module_args: module_args.summary(),
            context,
        }));
        Ok(())
    }

    /// 按已绑定的参数重建运行数据
    fn renew(&self, bound: &Bound) -> Result<Arc<Bound>, CrawlerError> {
        let context = Arc::new(CrawlContext::new(
            self.registry.clone(),
            &bound.request_args,
            &bound.data_args,
            self.primary_domain,
        )?);
        let renewed = Arc::new(Bound {
            request_args: bound.request_args.clone(),
            data_args: bound.data_args,
            module_args: bound.module_args,
            context,
        });
        *self.bound.write() = Some(renewed.clone());
        debug!("Rebuilt buffer pools for restarting");
        Ok(renewed)
    }

    /// 启动调度器
    ///
    /// 首个请求跳过域名检查，但仍需满足URL、深度和去重检查。
    /// 已停止的调度器可以直接再次启动，此时缓冲池和去重集合都会重建
    pub async fn start(&self, seed: Request) -> Result<(), CrawlerError> {
        let mut control = self.control.lock().await;
        info!("Starting the scheduler...");
        check_status(self.status.current(), Status::Starting)?;

        let url = seed.parsed_url().map_err(|e| {
            CrawlerError::IllegalParameter(format!("invalid seed URL {:?}: {}", seed.url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CrawlerError::IllegalParameter(format!(
                "unsupported scheme {:?} of seed URL",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(CrawlerError::IllegalParameter(format!(
                "no host in seed URL {:?}",
                seed.url
            )));
        }
        let bound = self.bound().ok_or_else(|| {
            CrawlerError::IllegalStatus("the scheduler has not been initialized".to_string())
        })?;

        let previous = self.status.transition(Status::Starting)?;
        // 停止时缓冲池已关闭，重新启动需要新的缓冲池和去重集合
        let bound = if previous == Status::Stopped {
            match self.renew(&bound) {
                Ok(bound) => bound,
                Err(e) => {
                    self.status.set(previous);
                    return Err(e);
                }
            }
        } else {
            bound
        };
        let context = bound.context.clone();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let error_capacity =
            bound.data_args.error_buffer_cap as usize * bound.data_args.error_max_buffer_number as usize;
        let (error_tx, error_rx) = mpsc::channel(error_capacity.max(1));
        tokio::spawn(forward_errors(context.clone(), error_tx));
        *self.error_rx.lock() = Some(error_rx);

        let mut manager = WorkerManager::new(context.clone(), cancel_rx.clone());
        manager.start_workers(self.workers, bound.data_args.resp_buffer_cap as usize);

        if !context.send_req(seed, true, &cancel_rx) {
            warn!("The seed request {} is not admitted", url);
        }

        *control = Some(Run {
            cancel: cancel_tx,
            manager,
        });
        self.status.transition(Status::Started)?;
        info!("Scheduler has been started with {}", url);
        Ok(())
    }

    /// 停止调度器
    ///
    /// 发出取消信号、关闭全部缓冲池并等待工作器退出。连续两次停止时第二次返回错误
    pub async fn stop(&self) -> Result<(), CrawlerError> {
        let mut control = self.control.lock().await;
        info!("Stopping the scheduler...");
        self.status.transition(Status::Stopping)?;

        if let Some(mut run) = control.take() {
            let _ = run.cancel.send(true);
            if let Some(bound) = self.bound() {
                bound.context.close_pools();
            }
            run.manager.shutdown().await;
        }
        // 未被取走的错误通道随停止一起丢弃
        self.error_rx.lock().take();

        self.status.transition(Status::Stopped)?;
        info!("Scheduler has been stopped");
        Ok(())
    }

    /// 判断调度器是否空闲
    ///
    /// 全部缓冲池为空、没有正在传递的数据且每个组件都没有正在处理的调用
    pub fn idle(&self) -> bool {
        let Some(bound) = self.bound() else {
            return true;
        };
        bound.context.drained()
            && self
                .registry
                .get_all()
                .iter()
                .all(|unit| unit.counts().handling == 0)
    }

    /// 获取错误通道
    ///
    /// 每次启动后的第一次调用取得该次运行的错误通道，停止后通道关闭。
    /// 其余情况返回一个已关闭的通道
    pub fn error_chan(&self) -> mpsc::Receiver<CrawlerError> {
        match self.error_rx.lock().take() {
            Some(receiver) => receiver,
            None => {
                let (_, receiver) = mpsc::channel(1);
                receiver
            }
        }
    }

    /// 获取调度器摘要
    pub fn summary(&self) -> SchedSummary {
        let summaries = |module_type: ModuleType| {
            self.registry
                .get_all_by_type(module_type)
                .iter()
                .map(Unit::summary)
                .collect::<Vec<_>>()
        };
        let downloaders = summaries(ModuleType::Downloader);
        let analyzers = summaries(ModuleType::Analyzer);
        let pipelines = summaries(ModuleType::Pipeline);
        let status = self.status.current().to_string();

        match self.bound() {
            Some(bound) => SchedSummary {
                request_args: bound.request_args.clone(),
                data_args: bound.data_args,
                module_args: bound.module_args,
                status,
                downloaders,
                analyzers,
                pipelines,
                req_buffer_pool: bound.context.req_pool.summary(),
                resp_buffer_pool: bound.context.resp_pool.summary(),
                item_buffer_pool: bound.context.item_pool.summary(),
                error_buffer_pool: bound.context.error_pool.summary(),
                url_number: bound.context.admission.url_number(),
            },
            None => SchedSummary {
                request_args: RequestArgs::default(),
                data_args: DataArgs::default(),
                module_args: ModuleArgsSummary::default(),
                status,
                downloaders,
                analyzers,
                pipelines,
                req_buffer_pool: BufferPoolSummary::default(),
                resp_buffer_pool: BufferPoolSummary::default(),
                item_buffer_pool: BufferPoolSummary::default(),
                error_buffer_pool: BufferPoolSummary::default(),
                url_number: 0,
            },
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// 将错误缓冲池中的错误转发到错误通道
///
/// 通道已满或接收端已丢弃时直接丢弃错误。缓冲池关闭并取空后退出，通道随之关闭
async fn forward_errors(context: Arc<CrawlContext>, sender: mpsc::Sender<CrawlerError>) {
    while let Ok(err) = context.error_pool.get().await {
        if sender.try_send(err).is_err() {
            counter!("crawler_errors_dropped_total").increment(1);
        }
    }
    debug!("Error forwarding stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_scheduler_is_uninitialized() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.status(), Status::Uninitialized);
        assert!(scheduler.idle());
        assert!(scheduler.error_chan().recv().await.is_none());

        let summary = scheduler.summary();
        assert_eq!(summary.status, "uninitialized");
        assert_eq!(summary.url_number, 0);
        assert!(summary.downloaders.is_empty());
    }

    #[tokio::test]
    async fn test_init_rejects_empty_modules_without_state_change() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .init(
                RequestArgs::default(),
                DataArgs::default(),
                ModuleArgs::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlerError::IllegalParameter(_)));
        assert_eq!(scheduler.status(), Status::Uninitialized);
    }

    #[tokio::test]
    async fn test_start_and_stop_require_init() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .start(Request::new("http://example.com/", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlerError::IllegalStatus(_)));
        let err = scheduler.stop().await.unwrap_err();
        assert!(matches!(err, CrawlerError::IllegalStatus(_)));
        assert_eq!(scheduler.status(), Status::Uninitialized);
    }

    #[test]
    fn test_with_workers_keeps_at_least_one() {
        let scheduler = Scheduler::new().with_workers(WorkerSettings {
            fetch: 0,
            parse: 3,
            persist: 0,
        });
        assert_eq!(
            scheduler.workers,
            WorkerSettings {
                fetch: 1,
                parse: 3,
                persist: 1,
            }
        );
    }
}
