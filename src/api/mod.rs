//! HTTP API module for the payroll engine.
//!
//! This module exposes the adjustment catalog, payroll computation and the
//! pay record lifecycle as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{ACTOR_HEADER, create_router};
pub use request::{
    AssignmentQuery, AttendanceRequest, ComputeRequest, GenerateRequest, ResolveRequest,
};
pub use response::{ApiError, ApiErrorResponse, ResolveResponse};
pub use state::AppState;
