//! HTTP request handlers for the payroll engine API.
//!
//! Handlers are a thin transport over [`PayrollService`](crate::service::PayrollService):
//! they parse the request, call one service operation and map the outcome to
//! a JSON response. Every request is logged with a correlation id.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    AdjustmentTypePatch, Employee, EmployeeAdjustmentPatch, NewAdjustmentType,
    NewEmployeeAdjustment,
};

use super::request::{
    AssignmentQuery, AttendanceRequest, ComputeRequest, GenerateRequest, ResolveRequest,
};
use super::response::{ApiError, ApiErrorResponse, ResolveResponse};
use super::state::AppState;

/// Header naming the user performing an approval.
pub const ACTOR_HEADER: &str = "x-actor";

const DEFAULT_ACTOR: &str = "system";

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/adjustments/types",
            get(list_types_handler).post(create_type_handler),
        )
        .route("/adjustments/types/:id", patch(update_type_handler))
        .route("/employees", post(register_employee_handler))
        .route(
            "/employees/:employee_id/adjustments",
            get(list_assignments_handler).post(assign_handler),
        )
        .route(
            "/employees/:employee_id/adjustments/:assignment_id",
            patch(update_assignment_handler),
        )
        .route("/attendance", post(record_attendance_handler))
        .route("/payroll/resolve", post(resolve_handler))
        .route("/payroll/compute", post(compute_handler))
        .route("/payroll/generate", post(generate_handler))
        .route("/payroll/pending", get(list_pending_handler))
        .route("/payroll/approved", get(list_approved_handler))
        .route("/payroll/employees/:employee_id", get(employee_history_handler))
        .route("/payroll/approve-all", post(approve_all_handler))
        .route("/payroll/:id", get(get_pay_record_handler))
        .route("/payroll/:id/approve", put(approve_handler))
        .route("/payroll/:id/hold", put(hold_handler))
        .route("/payroll/:id/unhold", put(unhold_handler))
        .route("/payroll/:id/toggle-hold", put(toggle_hold_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, operation: &str, error: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        operation,
        code = error.code(),
        error = %error,
        "Request failed"
    );
    let api_error: ApiErrorResponse = error.into();
    json_response(api_error.status, api_error.error)
}

fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &str,
    status: StatusCode,
    result: Result<T, EngineError>,
) -> Response {
    match result {
        Ok(body) => {
            info!(correlation_id = %correlation_id, operation, "Request completed");
            json_response(status, body)
        }
        Err(err) => error_response(correlation_id, operation, err),
    }
}

/// Unwraps a JSON body or converts the rejection into a 400 response.
fn parse_json<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    let response = ApiErrorResponse::bad_request(error);
    Err(json_response(response.status, response.error))
}

/// Unwraps path parameters or converts the rejection into a 400 response.
fn parse_path<T>(correlation_id: Uuid, path: Result<Path<T>, PathRejection>) -> Result<T, Response> {
    match path {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Invalid path parameter"
            );
            let response = ApiErrorResponse::bad_request(ApiError::new(
                "VALIDATION_ERROR",
                rejection.body_text(),
            ));
            Err(json_response(response.status, response.error))
        }
    }
}

fn parse_query<T>(correlation_id: Uuid, query: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Invalid query string"
            );
            let response = ApiErrorResponse::bad_request(ApiError::new(
                "VALIDATION_ERROR",
                rejection.body_text(),
            ));
            Err(json_response(response.status, response.error))
        }
    }
}

fn actor(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

async fn list_types_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.service().list_adjustment_types())
}

async fn create_type_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewAdjustmentType>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Creating adjustment type");
    let input = match parse_json(correlation_id, payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "create_adjustment_type",
        StatusCode::CREATED,
        state.service().create_adjustment_type(input),
    )
}

async fn update_type_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AdjustmentTypePatch>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, adjustment_type_id = %id, "Updating adjustment type");
    let patch = match parse_json(correlation_id, payload) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "update_adjustment_type",
        StatusCode::OK,
        state.service().update_adjustment_type(id, patch),
    )
}

async fn register_employee_handler(
    State(state): State<AppState>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let employee = match parse_json(correlation_id, payload) {
        Ok(employee) => employee,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, employee_id = %employee.id, "Registering employee");
    respond(
        correlation_id,
        "register_employee",
        StatusCode::CREATED,
        state.workforce().add_employee(employee),
    )
}

async fn list_assignments_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    query: Result<Query<AssignmentQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match parse_query(correlation_id, query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let assignments = match query.on_date {
        Some(on_date) => state.service().list_assignments(&employee_id, on_date),
        None => state.service().list_employee_adjustments(&employee_id),
    };
    json_response(StatusCode::OK, assignments)
}

async fn assign_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<NewEmployeeAdjustment>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Assigning adjustment");
    let input = match parse_json(correlation_id, payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "assign_adjustment",
        StatusCode::CREATED,
        state.service().assign_adjustment(&employee_id, input),
    )
}

async fn update_assignment_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, Uuid)>, PathRejection>,
    payload: Result<Json<EmployeeAdjustmentPatch>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let (employee_id, assignment_id) = match parse_path(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        assignment_id = %assignment_id,
        "Updating employee adjustment"
    );
    let patch = match parse_json(correlation_id, payload) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "update_employee_adjustment",
        StatusCode::OK,
        state
            .service()
            .update_employee_adjustment(&employee_id, assignment_id, patch),
    )
}

async fn record_attendance_handler(
    State(state): State<AppState>,
    payload: Result<Json<AttendanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "record_attendance",
        StatusCode::CREATED,
        state
            .workforce()
            .record_attendance(&request.employee_id, request.clock_in, request.clock_out),
    )
}

async fn resolve_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        "Resolving adjustments"
    );
    let result = state
        .service()
        .resolve_adjustments(
            &request.employee_id,
            request.period_start,
            request.period_end,
            &request.overtime_hours_by_rule,
        )
        .map(|adjustments| ResolveResponse {
            employee_id: request.employee_id.clone(),
            period_start: request.period_start,
            period_end: request.period_end,
            adjustments,
        });
    respond(correlation_id, "resolve_adjustments", StatusCode::OK, result)
}

async fn compute_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        "Computing payroll"
    );
    let result = request.worked_hours().and_then(|worked| {
        state.service().compute_payroll(
            &request.employee_id,
            request.period_start,
            request.period_end,
            worked,
            request.pay_rate,
        )
    });
    respond(correlation_id, "compute_payroll", StatusCode::OK, result)
}

async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        range_start = %request.range_start,
        range_end = %request.range_end,
        "Generating payrolls"
    );

    let service = state.service().clone();
    let joined = tokio::task::spawn_blocking(move || {
        service.generate_payrolls(request.range_start, request.range_end)
    })
    .await;

    match joined {
        Ok(result) => respond(correlation_id, "generate_payrolls", StatusCode::OK, result),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Generation task failed");
            let response = ApiErrorResponse::internal("Payroll generation failed");
            json_response(response.status, response.error)
        }
    }
}

async fn list_pending_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.service().list_pending())
}

async fn list_approved_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.service().list_approved())
}

async fn employee_history_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Response {
    json_response(StatusCode::OK, state.service().employee_history(&employee_id))
}

async fn get_pay_record_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(
        correlation_id,
        "get_pay_record",
        StatusCode::OK,
        state.service().get_pay_record(id),
    )
}

async fn approve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let approved_by = actor(&headers);
    info!(correlation_id = %correlation_id, record_id = %id, approved_by = %approved_by, "Approving pay record");
    respond(
        correlation_id,
        "approve",
        StatusCode::OK,
        state.service().approve(id, &approved_by),
    )
}

async fn hold_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, record_id = %id, "Holding pay record");
    respond(correlation_id, "hold", StatusCode::OK, state.service().hold(id))
}

async fn unhold_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, record_id = %id, "Releasing pay record");
    respond(correlation_id, "unhold", StatusCode::OK, state.service().unhold(id))
}

async fn toggle_hold_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let id = match parse_path(correlation_id, path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, record_id = %id, "Toggling hold on pay record");
    respond(
        correlation_id,
        "toggle_hold",
        StatusCode::OK,
        state.service().toggle_hold(id),
    )
}

async fn approve_all_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let correlation_id = Uuid::new_v4();
    let approved_by = actor(&headers);
    info!(correlation_id = %correlation_id, approved_by = %approved_by, "Approving all pending pay records");
    json_response(StatusCode::OK, state.service().approve_all(&approved_by))
}
