use crate::{
    abstract_trait::product::service::DynProductQueryService,
    domain::response::product::ProductResponse,
};
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use shared::{
    domain::{ProductAvailabilityRequest, ProductAvailabilityResponse},
    errors::{ErrorResponse, HttpError},
    middleware::describe,
};
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/products/availability",
    tag = "Product",
    request_body = Vec<ProductAvailabilityRequest>,
    responses(
        (status = 200, description = "One answer per requested item, in request order", body = ProductAvailabilityResponse),
        (status = 400, description = "Invalid request item", body = ErrorResponse),
        (status = 404, description = "Unknown SKU", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn check_availability(
    Extension(service): Extension<DynProductQueryService>,
    Json(body): Json<Vec<ProductAvailabilityRequest>>,
) -> Result<impl IntoResponse, HttpError> {
    for (index, item) in body.iter().enumerate() {
        item.validate()
            .map_err(|e| HttpError::BadRequest(format!("[{index}].{}", describe(&e))))?;
    }

    let product_availability_list = service.check_availability(&body).await?;

    Ok((
        StatusCode::OK,
        Json(ProductAvailabilityResponse {
            product_availability_list,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/products/{sku}",
    tag = "Product",
    params(("sku" = String, Path, description = "SKU code")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_product(
    Extension(service): Extension<DynProductQueryService>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_sku(&sku).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn product_routes(service: DynProductQueryService) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/products/availability", post(check_availability))
        .route("/api/products/{sku}", get(get_product))
        .layer(Extension(service))
}
