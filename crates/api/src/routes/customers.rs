//! Customer routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use tracing::info;

use brokerage_db::repositories::{CreateCustomerInput, CustomerFilter};
use brokerage_shared::types::PageRequest;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", delete(delete_customer))
}

/// GET `/customers` - List customers, newest first.
async fn list_customers(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
    Query(filter): Query<CustomerFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = state.customers.list(&filter, page).await?;
    Ok(Json(page))
}

/// POST `/customers` - Create a customer.
async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.customers.create(input).await?;
    info!(customer_id = customer.id, broker_id = customer.broker_id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// DELETE `/customers/{id}` - Delete a customer.
async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.customers.delete(id).await?;
    info!(customer_id = id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}
