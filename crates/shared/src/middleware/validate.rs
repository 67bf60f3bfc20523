use crate::errors::HttpError;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::warn;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// `Json<T>` that also runs the `validator` rules of `T`.
///
/// Both malformed bodies and rule violations are rejected as [`HttpError::BadRequest`], so
/// clients see the same `{status, message}` body as for every other 400.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!("⚠️ Rejected request body: {}", rejection.body_text());
                HttpError::BadRequest(rejection.body_text())
            })?;

        value.validate().map_err(|errors| {
            let message = describe(&errors);
            warn!("⚠️ Request failed validation: {message}");
            HttpError::BadRequest(message)
        })?;

        Ok(Self(value))
    }
}

/// Flattens nested validation errors into `path: message` pairs, e.g. `items[1].quantity: ...`.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut violations = Vec::new();
    walk(String::new(), errors, &mut violations);
    violations.sort();

    if violations.is_empty() {
        "Validation failed".to_string()
    } else {
        violations.join("; ")
    }
}

fn walk(path: String, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let here = if path.is_empty() {
            field.to_string()
        } else {
            format!("{path}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(failures) => {
                out.extend(failures.iter().map(|failure| {
                    let reason = failure
                        .message
                        .as_deref()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("failed '{}' rule", failure.code));
                    format!("{here}: {reason}")
                }));
            }
            ValidationErrorsKind::Struct(inner) => walk(here, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    walk(format!("{here}[{index}]"), inner, out);
                }
            }
        }
    }
}
