use serde::Deserialize;
use uuid::Uuid;

// Request de pago del cliente
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub booking_id: Uuid,
}
