// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Item, Request, Response};
use crate::modules::registry::Registry;
use crate::queue::{BufferPool, TryPutError};
use crate::scheduler::admission::Admission;
use crate::scheduler::args::{DataArgs, RequestArgs};
use crate::utils::errors::CrawlerError;
use crate::utils::url_utils::PrimaryDomainFn;
use crate::workers::worker::cancelled;
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// 一次初始化所绑定的运行数据
///
/// 持有四个缓冲池、准入检查和组件注册器，由各阶段工作器共享。
/// `pending` 记录已产生但尚未处理完的数据单元，放入缓冲池前加一，
/// 工作器处理完成后减一，因此数据在阶段之间移动时不会出现计数为零的间隙。
pub struct CrawlContext {
    pub registry: Arc<Registry>,
    pub req_pool: BufferPool<Request>,
    pub resp_pool: BufferPool<Response>,
    pub item_pool: BufferPool<Item>,
    pub error_pool: BufferPool<CrawlerError>,
    pub admission: Admission,
    pending: AtomicU64,
}

impl CrawlContext {
    pub fn new(
        registry: Arc<Registry>,
        request_args: &RequestArgs,
        data_args: &DataArgs,
        primary_domain: PrimaryDomainFn,
    ) -> Result<Self, CrawlerError> {
        Ok(Self {
            registry,
            req_pool: BufferPool::new(data_args.req_buffer_cap, data_args.req_max_buffer_number)?,
            resp_pool: BufferPool::new(
                data_args.resp_buffer_cap,
                data_args.resp_max_buffer_number,
            )?,
            item_pool: BufferPool::new(
                data_args.item_buffer_cap,
                data_args.item_max_buffer_number,
            )?,
            error_pool: BufferPool::new(
                data_args.error_buffer_cap,
                data_args.error_max_buffer_number,
            )?,
            admission: Admission::new(
                &request_args.accepted_domains,
                request_args.max_depth,
                primary_domain,
            ),
            pending: AtomicU64::new(0),
        })
    }

    /// 登记一个新产生的数据单元
    pub fn begin(&self) {
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        gauge!("crawler_pending_units").set(pending as f64);
    }

    /// 一个数据单元处理完毕
    pub fn finish(&self) {
        if let Ok(previous) = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            gauge!("crawler_pending_units").set((previous - 1) as f64);
        }
    }

    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// 对请求做准入检查，通过后放入请求缓冲池
    ///
    /// 请求缓冲池已满时另起任务等待空位，避免解析阶段因请求回流而阻塞。
    /// 等待中的任务数量不受缓冲池容量限制，但每个URL最多只有一个，停止时全部退出。
    /// 返回请求是否被接受。
    pub fn send_req(
        self: &Arc<Self>,
        request: Request,
        is_seed: bool,
        cancel: &watch::Receiver<bool>,
    ) -> bool {
        if self.req_pool.closed() {
            return false;
        }
        if let Err(rejection) = self.admission.admit(&request, is_seed) {
            debug!("Ignore the request: {}", rejection);
            counter!("crawler_requests_rejected_total").increment(1);
            return false;
        }
        counter!("crawler_requests_admitted_total").increment(1);
        trace!("Admitted request {} (depth: {})", request.url, request.depth);

        self.begin();
        match self.req_pool.try_put(request) {
            Ok(()) => true,
            Err(TryPutError::Closed(_)) => {
                self.finish();
                false
            }
            Err(TryPutError::Full(request)) => {
                let context = Arc::clone(self);
                let mut cancel = cancel.clone();
                tokio::spawn(async move {
                    let put = tokio::select! {
                        biased;
                        _ = cancelled(&mut cancel) => Err(CrawlerError::PoolClosed),
                        result = context.req_pool.put(request) => result,
                    };
                    if put.is_err() {
                        context.finish();
                    }
                });
                true
            }
        }
    }

    /// 将响应放入响应缓冲池，缓冲池已满时等待
    pub async fn send_resp(&self, response: Response) -> bool {
        self.begin();
        match self.resp_pool.put(response).await {
            Ok(()) => true,
            Err(_) => {
                self.finish();
                false
            }
        }
    }

    /// 将条目放入条目缓冲池，缓冲池已满时等待
    pub async fn send_item(&self, item: Item) -> bool {
        self.begin();
        match self.item_pool.put(item).await {
            Ok(()) => true,
            Err(_) => {
                self.finish();
                false
            }
        }
    }

    /// 尽力将错误放入错误缓冲池
    ///
    /// 错误缓冲池已满或已关闭时直接丢弃，不会阻塞调用者
    pub fn send_error(&self, err: CrawlerError) -> bool {
        warn!("{}", err);
        match self.error_pool.try_put(err) {
            Ok(()) => true,
            Err(e) => {
                counter!("crawler_errors_dropped_total").increment(1);
                trace!("Dropped error: {}", e.into_inner());
                false
            }
        }
    }

    /// 关闭全部缓冲池
    pub fn close_pools(&self) {
        self.req_pool.close();
        self.resp_pool.close();
        self.item_pool.close();
        self.error_pool.close();
    }

    /// 缓冲池是否全部为空且没有未处理完的数据单元
    pub fn drained(&self) -> bool {
        self.req_pool.total() == 0
            && self.resp_pool.total() == 0
            && self.item_pool.total() == 0
            && self.error_pool.total() == 0
            && self.pending() == 0
    }
}
