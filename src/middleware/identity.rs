//! Identidad del llamante
//!
//! La autenticación vive fuera de este servicio: el gateway que la resuelve
//! reenvía el cliente en `X-Customer-Id` y el personal en `X-Staff-Id`.
//! Estos extractores solo validan que la cabecera exista y sea un UUID.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::validation::parse_uuid;

pub const CUSTOMER_HEADER: &str = "x-customer-id";
pub const STAFF_HEADER: &str = "x-staff-id";

/// Cliente autenticado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerId(pub Uuid);

/// Miembro del personal autenticado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffId(pub Uuid);

fn header_uuid(parts: &Parts, header: &str) -> Result<Uuid, AppError> {
    let value = parts
        .headers
        .get(header)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", header)))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("{} header is not valid text", header)))?;

    parse_uuid(header, value).map_err(|_| AppError::Unauthorized(format!("{} header is not a valid id", header)))
}

#[async_trait]
impl<S> FromRequestParts<S> for CustomerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_uuid(parts, CUSTOMER_HEADER).map(CustomerId)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_uuid(parts, STAFF_HEADER).map(StaffId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract_customer(request: Request<()>) -> Result<CustomerId, AppError> {
        let (mut parts, _) = request.into_parts();
        CustomerId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_customer_header_is_required() {
        let err = extract_customer(Request::new(())).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let bad = Request::builder()
            .header(CUSTOMER_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(matches!(extract_customer(bad).await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_customer_header_is_parsed() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header(CUSTOMER_HEADER, id.to_string())
            .body(())
            .unwrap();
        assert_eq!(extract_customer(request).await.unwrap(), CustomerId(id));
    }
}
