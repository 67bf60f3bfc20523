use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductAvailabilityRequest {
    #[validate(length(min = 1))]
    pub sku_code: String,

    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductAvailability {
    pub sku_code: String,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductAvailabilityResponse {
    pub product_availability_list: Vec<ProductAvailability>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_uses_wire_field_names() {
        let response = ProductAvailabilityResponse {
            product_availability_list: vec![
                ProductAvailability {
                    sku_code: "IPHONE_15".into(),
                    available: true,
                },
                ProductAvailability {
                    sku_code: "AIRPODS".into(),
                    available: false,
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "productAvailabilityList": [
                    { "skuCode": "IPHONE_15", "available": true },
                    { "skuCode": "AIRPODS", "available": false }
                ]
            })
        );
    }

    #[test]
    fn request_rejects_non_positive_quantity() {
        let req: ProductAvailabilityRequest =
            serde_json::from_value(json!({ "skuCode": "AIRPODS", "quantity": 0 })).unwrap();
        assert!(req.validate().is_err());
    }
}
