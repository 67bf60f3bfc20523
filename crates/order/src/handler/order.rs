use crate::{
    abstract_trait::order::service::{DynOrderCommandService, DynOrderQueryService},
    domain::{
        requests::order::CreateOrderRequest,
        response::order::{OrderCreatedResponse, OrderResponse},
    },
};
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use shared::{
    errors::{ErrorResponse, HttpError},
    middleware::ValidatedJson,
};
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    post,
    path = "/create",
    tag = "Order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed with the available items", body = OrderCreatedResponse),
        (status = 400, description = "Invalid draft or no items available", body = ErrorResponse),
        (status = 404, description = "Unknown SKU", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_order(
    Extension(service): Extension<DynOrderCommandService>,
    ValidatedJson(body): ValidatedJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.create_order(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse::from(&response)),
    ))
}

#[utoipa::path(
    put,
    path = "/cancel/{id}",
    tag = "Order",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled (or already cancelled)", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn cancel_order(
    Extension(service): Extension<DynOrderCommandService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.cancel_order(id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "Order",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_order(
    Extension(service): Extension<DynOrderQueryService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_id(id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn order_routes(
    command: DynOrderCommandService,
    query: DynOrderQueryService,
) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/create", post(create_order))
        .route("/cancel/{id}", put(cancel_order))
        .route("/orders/{id}", get(get_order))
        .layer(Extension(command))
        .layer(Extension(query))
}
