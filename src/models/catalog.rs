//! Entidades de catálogo referenciadas por el núcleo de reservas
//!
//! El CRUD de marcas, modelos, ubicaciones y personal vive fuera de este
//! servicio; aquí solo se leen por identificador.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Modelo de catálogo: agrupa coches intercambiables
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CarModel {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
}

/// Miembro del personal asignable a una reserva
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct StaffMember {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub manager_id: Option<Uuid>,
}
