// handlers/protected/weekly_reports/mod.rs - The caller's own weekly reports
//
// A manager files one report per ISO week. The metric blocks a caller may
// read or write follow their role: HR metrics for hiring and mixed managers,
// ops metrics for ops and mixed managers.

pub mod collection;
pub mod week;

pub use collection::get as weekly_reports_get;
pub use collection::post as weekly_reports_post;
pub use week::get as weekly_report_get;
pub use week::put as weekly_report_put;

use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::database::models::{HrMetrics, OpsMetrics, WeeklyReport};
use crate::error::ApiError;
use crate::services::report_service::{MetricKind, ReportBundle};
use crate::week::IsoWeek;

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub week: Option<String>,
    pub role: Option<String>,
}

/// Full view: base report plus the metric blocks the caller may see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub week_iso: IsoWeek,
    pub report_exists: bool,
    pub base_report: Option<WeeklyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_data: Option<Option<HrMetrics>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_data: Option<Option<OpsMetrics>>,
}

/// Metric-specific view for `?role=hr|ops`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricView {
    pub week_iso: IsoWeek,
    pub role: MetricKind,
    pub data: Option<serde_json::Value>,
    pub report_exists: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WeeklyReportResponse {
    Full(ReportView),
    Metric(MetricView),
}

fn full_view(week: IsoWeek, role: Role, bundle: Option<ReportBundle>) -> ReportView {
    let (base_report, hr, ops) = match bundle {
        Some(b) => (Some(b.report), b.hr_metrics, b.ops_metrics),
        None => (None, None, None),
    };

    ReportView {
        week_iso: week,
        report_exists: base_report.is_some(),
        base_report,
        hr_data: role.has_hr_metrics().then_some(hr),
        ops_data: role.has_ops_metrics().then_some(ops),
    }
}

fn metric_view(week: IsoWeek, role: Role, kind: &str, bundle: Option<ReportBundle>) -> Result<MetricView, ApiError> {
    let kind = match MetricKind::parse(kind) {
        Some(k @ (MetricKind::Hr | MetricKind::Ops)) => k,
        _ => return Err(ApiError::field("role", "Must be hr or ops")),
    };
    if !kind.allowed_for(role) {
        return Err(ApiError::forbidden(format!("No access to {} metrics", kind.as_str())));
    }

    let report_exists = bundle.is_some();
    let data = match (kind, bundle) {
        (MetricKind::Hr, Some(b)) => b.hr_metrics.map(serde_json::to_value).transpose(),
        (_, Some(b)) => b.ops_metrics.map(serde_json::to_value).transpose(),
        (_, None) => Ok(None),
    }
    .map_err(|e| ApiError::internal_server_error(format!("Failed to serialize metrics: {e}")))?;

    Ok(MetricView {
        week_iso: week,
        role: kind,
        data,
        report_exists,
    })
}

fn view(week: IsoWeek, role: Role, kind: Option<&str>, bundle: Option<ReportBundle>) -> Result<WeeklyReportResponse, ApiError> {
    match kind.filter(|k| !k.is_empty()) {
        Some(kind) => Ok(WeeklyReportResponse::Metric(metric_view(week, role, kind, bundle)?)),
        None => Ok(WeeklyReportResponse::Full(full_view(week, role, bundle))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week() -> IsoWeek {
        IsoWeek::parse("2025-W03").unwrap()
    }

    #[test]
    fn full_view_hides_blocks_outside_the_role() {
        let value = serde_json::to_value(full_view(week(), Role::OpsManager, None)).unwrap();
        assert_eq!(value["weekIso"], "2025-W03");
        assert_eq!(value["reportExists"], false);
        assert!(value.get("hrData").is_none());
        assert!(value["opsData"].is_null());
        assert!(value.as_object().unwrap().contains_key("opsData"));
    }

    #[test]
    fn metric_view_checks_access() {
        assert!(matches!(
            metric_view(week(), Role::HiringManager, "ops", None),
            Err(ApiError::Forbidden(_))
        ));
        assert!(metric_view(week(), Role::MixedManager, "mixed", None).is_err());

        let view = metric_view(week(), Role::MixedManager, "hr", None).unwrap();
        assert!(!view.report_exists);
        assert!(view.data.is_none());
    }
}
