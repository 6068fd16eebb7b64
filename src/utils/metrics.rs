// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge, Unit};

/// 注册爬虫指标的描述
///
/// 指标通过 `metrics` 门面输出，未安装记录器时不产生任何效果
pub fn describe_metrics() {
    describe_counter!(
        "crawler_requests_admitted_total",
        Unit::Count,
        "Requests that passed admission and entered the request pool"
    );
    describe_counter!(
        "crawler_requests_rejected_total",
        Unit::Count,
        "Requests rejected by the domain, depth or duplicate checks"
    );
    describe_counter!(
        "crawler_stage_calls_total",
        Unit::Count,
        "Data units taken by stage workers"
    );
    describe_counter!(
        "crawler_stage_errors_total",
        Unit::Count,
        "Errors reported by stage workers"
    );
    describe_counter!(
        "crawler_errors_dropped_total",
        Unit::Count,
        "Errors dropped because the error pool or channel was unavailable"
    );
    describe_gauge!(
        "crawler_pending_units",
        Unit::Count,
        "Data units produced but not yet fully handled"
    );
}
