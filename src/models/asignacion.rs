//! Assignment (asignación) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Month enum. Wire values are the capitalized Spanish month names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "month", rename_all = "lowercase")]
pub enum Month {
    Enero,
    Febrero,
    Marzo,
    Abril,
    Mayo,
    Junio,
    Julio,
    Agosto,
    Septiembre,
    Octubre,
    Noviembre,
    Diciembre,
}

/// Fixed item categories. Each assignment carries three logical item
/// collections, one per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    TesorosBiblia,
    SeamosMaestros,
    VidaCristiana,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 3] = [
        ItemCategory::TesorosBiblia,
        ItemCategory::SeamosMaestros,
        ItemCategory::VidaCristiana,
    ];
}

/// Assignment entity
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asignacion {
    pub id: Uuid,
    pub name: String,
    pub semana: String,
    pub month: Month,
    pub parent_id: Option<Uuid>,
    pub presidente_id: Option<Uuid>,
    pub presidente_reunion_id: Option<Uuid>,
    pub lector_reunion_id: Option<Uuid>,
    #[serde(rename = "oracionFinalVMId")]
    pub oracion_final_vm_id: Option<Uuid>,
    pub oracion_final_publica_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment item entity: one timed, nameable, optionally-assigned
/// sub-task, exclusively owned by its assignment.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsignacionItem {
    pub id: Uuid,
    pub asignacion_id: Uuid,
    pub category: ItemCategory,
    pub name: String,
    pub minutos: i32,
    pub encargado_id: Option<Uuid>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
