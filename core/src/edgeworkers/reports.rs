//! Execution reports for EdgeWorkers.
//!
//! Report `1` is the overall summary and has its own response shape; every
//! other report breaks the data down per event handler.

use serde::Deserialize;

use crate::client::{validate, EdgeworkersClient};
use crate::enums::wire_enum;
use crate::error::{Error, Operation};
use crate::http::{HttpMethod, HttpRequest, Query};
use crate::session::Session;
use crate::validation::{report_date, required_id, required_str, Validate, ValidationErrors};

/// Id of the overall summary report.
pub const SUMMARY_REPORT_ID: u64 = 1;

wire_enum! {
    /// Execution outcome a report can be filtered by.
    pub enum ReportStatus {
        Success => "success",
        GenericError => "genericError",
        UnknownEdgeWorkerId => "unknownEdgeWorkerId",
        UnimplementedEventHandler => "unimplementedEventHandler",
        RuntimeError => "runtimeError",
        ExecutionError => "executionError",
        TimeoutError => "timeoutError",
        ResourceLimitHit => "resourceLimitHit",
        CpuTimeoutError => "cpuTimeoutError",
        WallTimeoutError => "wallTimeoutError",
        InitCpuTimeoutError => "initCpuTimeoutError",
        InitWallTimeoutError => "initWallTimeoutError",
    }
}

wire_enum! {
    pub enum EventHandler {
        OnClientRequest => "onClientRequest",
        OnOriginRequest => "onOriginRequest",
        OnOriginResponse => "onOriginResponse",
        OnClientResponse => "onClientResponse",
        ResponseProvider => "responseProvider",
    }
}

pub trait Reports {
    fn list_reports(&self) -> Result<ListReportsResponse, Error>;

    /// Totals and duration statistics over a time window.
    fn get_summary_report(&self, params: GetSummaryReportRequest) -> Result<GetSummaryReportResponse, Error>;

    fn get_report(&self, params: GetReportRequest) -> Result<GetReportResponse, Error>;
}

/// Filters shared by every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// `YYYY-MM-DDThh:mm:ss[.fff]Z`
    pub start: String,
    /// Defaults to now on the server when empty.
    pub end: String,
    /// EdgeWorker id, as a string.
    pub edge_worker: String,
    pub status: Option<ReportStatus>,
    pub event_handler: Option<EventHandler>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetSummaryReportRequest {
    pub filter: ReportFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetReportRequest {
    pub report_id: u64,
    pub filter: ReportFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListReportsResponse {
    pub reports: Vec<ReportSummary>,
}

/// A report available through `get_report`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: u64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSummaryReportResponse {
    pub report_id: u64,
    pub name: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub data: SummaryData,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryData {
    pub memory: Option<DurationStats>,
    pub successes: Option<Total>,
    pub init_duration: Option<DurationStats>,
    pub exec_duration: Option<DurationStats>,
    pub errors: Option<Total>,
    pub invocations: Option<Total>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Total {
    pub total: u64,
}

/// Average, minimum and maximum of a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DurationStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportResponse {
    pub report_id: u64,
    pub name: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub data: Vec<ReportData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub edge_worker_id: u64,
    pub data: EventHandlerData,
}

/// Per-handler time series; handlers with no data are empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventHandlerData {
    pub on_client_request: Vec<HandlerExecution>,
    pub on_origin_request: Vec<HandlerExecution>,
    pub on_origin_response: Vec<HandlerExecution>,
    pub on_client_response: Vec<HandlerExecution>,
    pub response_provider: Vec<HandlerExecution>,
    pub init: Vec<InitExecution>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerExecution {
    pub start_date_time: String,
    pub edge_worker_version: String,
    pub exec_duration: DurationStats,
    pub invocations: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitExecution {
    pub start_date_time: String,
    pub edge_worker_version: String,
    pub init_duration: DurationStats,
    pub invocations: u64,
}

impl ReportFilter {
    fn check(&self, errors: &mut ValidationErrors) {
        errors
            .check("start", required_str(&self.start).and_then(|()| report_date(&self.start)))
            .check("end", report_date(&self.end))
            .check("edge_worker", required_str(&self.edge_worker));
    }

    fn query(&self) -> Query {
        let mut query = Query::new();
        query.add("edgeWorker", self.edge_worker.as_str());
        query.add("start", self.start.as_str());
        query.add_non_empty("end", &self.end);
        if let Some(status) = self.status {
            query.add("status", status.as_str());
        }
        if let Some(handler) = self.event_handler {
            query.add("eventHandler", handler.as_str());
        }
        query
    }
}

impl Validate for GetSummaryReportRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.filter.check(&mut errors);
        errors.into_result()
    }
}

impl Validate for GetReportRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("report_id", required_id(self.report_id));
        self.filter.check(&mut errors);
        errors.into_result()
    }
}

fn report_path(report_id: u64, filter: &ReportFilter) -> String {
    filter
        .query()
        .append_to(format!("/edgeworkers/v1/reports/{report_id}"))
}

impl<S: Session> Reports for EdgeworkersClient<S> {
    fn list_reports(&self) -> Result<ListReportsResponse, Error> {
        let request = HttpRequest::new(HttpMethod::Get, "/edgeworkers/v1/reports");
        self.execute_json(Operation::ListReports, request, 200)
    }

    fn get_summary_report(&self, params: GetSummaryReportRequest) -> Result<GetSummaryReportResponse, Error> {
        let operation = Operation::GetSummaryReport;
        validate(operation, &params)?;
        let path = report_path(SUMMARY_REPORT_ID, &params.filter);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }

    fn get_report(&self, params: GetReportRequest) -> Result<GetReportResponse, Error> {
        let operation = Operation::GetReport;
        validate(operation, &params)?;
        let path = report_path(params.report_id, &params.filter);
        self.execute_json(operation, HttpRequest::new(HttpMethod::Get, path), 200)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedSession;

    fn filter() -> ReportFilter {
        ReportFilter {
            start: "2021-12-04T00:00:00Z".to_string(),
            end: "2022-01-01T15:00:00Z".to_string(),
            edge_worker: "37017".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn get_report_builds_sorted_query() {
        let session = ScriptedSession::json(
            200,
            json!({
                "reportId": 2,
                "name": "Initialization and execution times by EdgeWorker ID and event handler",
                "description": "This report lists execution and initialization times.",
                "start": "2021-12-04T00:00:00Z",
                "end": "2022-01-01T15:00:00Z",
                "data": [{
                    "edgeWorkerId": 37017,
                    "data": {
                        "onClientRequest": [],
                        "responseProvider": [{
                            "startDateTime": "2021-12-04T00:00:00Z",
                            "edgeWorkerVersion": "10.18",
                            "execDuration": {"avg": 1.5, "min": 0.8, "max": 3.2},
                            "invocations": 12
                        }],
                        "init": [{
                            "startDateTime": "2021-12-04T00:00:00Z",
                            "edgeWorkerVersion": "10.18",
                            "initDuration": {"avg": 7.0, "min": 4.0, "max": 11.0},
                            "invocations": 3
                        }]
                    }
                }]
            }),
        );
        let client = EdgeworkersClient::new(&session);
        let report = client
            .get_report(GetReportRequest {
                report_id: 2,
                filter: filter(),
            })
            .unwrap();
        assert_eq!(
            session.last_request().path,
            "/edgeworkers/v1/reports/2?edgeWorker=37017&end=2022-01-01T15%3A00%3A00Z&start=2021-12-04T00%3A00%3A00Z"
        );
        let data = &report.data[0].data;
        assert_eq!(data.response_provider[0].invocations, 12);
        assert_eq!(data.init[0].init_duration.max, 11.0);
        assert!(data.on_origin_response.is_empty());
    }

    #[test]
    fn optional_filters_are_added_when_set() {
        let session = ScriptedSession::json(
            200,
            json!({"reportId": 1, "name": "Overall summary", "description": "", "start": "", "end": "", "data": {}}),
        );
        let client = EdgeworkersClient::new(&session);
        client
            .get_summary_report(GetSummaryReportRequest {
                filter: ReportFilter {
                    end: String::new(),
                    status: Some(ReportStatus::CpuTimeoutError),
                    event_handler: Some(EventHandler::OnClientRequest),
                    ..filter()
                },
            })
            .unwrap();
        assert_eq!(
            session.last_request().path,
            "/edgeworkers/v1/reports/1?edgeWorker=37017&eventHandler=onClientRequest&start=2021-12-04T00%3A00%3A00Z&status=cpuTimeoutError"
        );
    }

    #[test]
    fn summary_report_decodes_statistics() {
        let session = ScriptedSession::json(
            200,
            json!({
                "reportId": 1,
                "name": "Overall summary",
                "description": "This report contains an overview of other reports.",
                "start": "2022-01-10T03:00:00Z",
                "end": "2022-01-14T13:22:31Z",
                "data": {
                    "memory": {"avg": 1.0, "min": 0.5, "max": 2.5},
                    "successes": {"total": 3},
                    "initDuration": {"avg": 0.0, "min": 0.0, "max": 0.0},
                    "execDuration": {"avg": 0.184, "min": 0.168, "max": 0.202},
                    "errors": {"total": 0},
                    "invocations": {"total": 3}
                }
            }),
        );
        let client = EdgeworkersClient::new(&session);
        let report = client
            .get_summary_report(GetSummaryReportRequest { filter: filter() })
            .unwrap();
        assert_eq!(report.data.successes, Some(Total { total: 3 }));
        assert_eq!(report.data.exec_duration.unwrap().max, 0.202);
    }

    #[test]
    fn invalid_dates_and_missing_fields() {
        let request = GetReportRequest {
            report_id: 0,
            filter: ReportFilter {
                start: "12/04/2021".to_string(),
                end: "2022-01-01".to_string(),
                ..Default::default()
            },
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains("report_id"));
        assert!(errors.contains("edge_worker"));
        assert!(errors.get("start").unwrap().starts_with("value '12/04/2021' is invalid"));
        assert!(errors.contains("end"));
    }

    #[test]
    fn report_enums_list_legal_values() {
        let err = "oops".parse::<EventHandler>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "value 'oops' is invalid. Must be one of: 'onClientRequest', 'onOriginRequest', 'onOriginResponse', 'onClientResponse', 'responseProvider'"
        );
        assert_eq!(ReportStatus::ALL.len(), 12);
    }

    #[test]
    fn list_reports() {
        let session = ScriptedSession::json(
            200,
            json!({"reports": [
                {"reportId": 1, "name": "Overall summary", "description": "overview", "unavailable": false},
                {"reportId": 5, "name": "Memory usage", "description": "memory", "unavailable": true}
            ]}),
        );
        let client = EdgeworkersClient::new(&session);
        let result = client.list_reports().unwrap();
        assert!(result.reports[1].unavailable);
    }
}
