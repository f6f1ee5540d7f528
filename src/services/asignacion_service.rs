//! Assignment (asignación) service.
//!
//! CRUD over assignments and their three categorized item collections. The
//! update path replaces the item collections atomically: delete-all plus
//! re-insert inside one transaction, so no reader or failure can observe a
//! partially-replaced item set. Deletes are guarded by a child count; the
//! parent/child link never cascades.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::asignacion::{Asignacion, AsignacionItem, ItemCategory, Month};
use crate::models::user::UserRef;

const ASIGNACION_COLUMNS: &str = "id, name, semana, month, parent_id, presidente_id, \
     presidente_reunion_id, lector_reunion_id, oracion_final_vm_id, oracion_final_publica_id, \
     created_at, updated_at";

/// One item in a create/update payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub name: String,
    pub minutos: i32,
    pub encargado_id: Option<Uuid>,
}

/// Full replacement payload for create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AsignacionPayload {
    pub name: String,
    pub semana: String,
    /// Optional in the struct so a missing month surfaces as a 400
    /// validation error instead of a deserialization rejection.
    pub month: Option<Month>,
    pub parent_id: Option<Uuid>,
    pub presidente_id: Option<Uuid>,
    pub presidente_reunion_id: Option<Uuid>,
    pub lector_reunion_id: Option<Uuid>,
    #[serde(rename = "oracionFinalVMId")]
    pub oracion_final_vm_id: Option<Uuid>,
    pub oracion_final_publica_id: Option<Uuid>,
    pub tesoros_de_la_biblia: Option<Vec<ItemPayload>>,
    pub seamos_mejores_maestros: Option<Vec<ItemPayload>>,
    pub nuestra_vida_cristiana: Option<Vec<ItemPayload>>,
}

impl AsignacionPayload {
    /// Supplied category arrays paired with their category tag.
    fn categories(&self) -> [(ItemCategory, Option<&Vec<ItemPayload>>); 3] {
        [
            (ItemCategory::TesorosBiblia, self.tesoros_de_la_biblia.as_ref()),
            (
                ItemCategory::SeamosMaestros,
                self.seamos_mejores_maestros.as_ref(),
            ),
            (
                ItemCategory::VidaCristiana,
                self.nuestra_vida_cristiana.as_ref(),
            ),
        ]
    }
}

/// Item as rendered in assignment responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub id: Uuid,
    pub name: String,
    pub minutos: i32,
    pub encargado_id: Option<Uuid>,
    pub encargado: Option<UserRef>,
    pub created_at: DateTime<Utc>,
}

/// Parent assignment summary.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParentRef {
    pub id: Uuid,
    pub name: String,
    pub semana: String,
}

/// Child assignment summary.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChildRef {
    pub id: Uuid,
    pub name: String,
    pub semana: String,
    pub created_at: DateTime<Utc>,
}

/// Collection sizes, serialized as `_count` like the list clients expect.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AsignacionCounts {
    pub tesoros_de_la_biblia: usize,
    pub seamos_mejores_maestros: usize,
    pub nuestra_vida_cristiana: usize,
    pub children: i64,
}

/// Assignment with all associations eagerly loaded.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AsignacionDetail {
    pub id: Uuid,
    pub name: String,
    pub semana: String,
    pub month: Month,
    pub parent_id: Option<Uuid>,
    pub parent: Option<ParentRef>,
    pub children: Vec<ChildRef>,
    pub presidente: Option<UserRef>,
    pub presidente_reunion: Option<UserRef>,
    pub lector_reunion: Option<UserRef>,
    #[serde(rename = "oracionFinalVM")]
    pub oracion_final_vm: Option<UserRef>,
    pub oracion_final_publica: Option<UserRef>,
    pub tesoros_de_la_biblia: Vec<ItemDetail>,
    pub seamos_mejores_maestros: Vec<ItemDetail>,
    pub nuestra_vida_cristiana: Vec<ItemDetail>,
    #[serde(rename = "_count")]
    pub count: AsignacionCounts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate a create/update payload. Runs before any mutating store call.
pub fn validate_payload(payload: &AsignacionPayload) -> Result<()> {
    if payload.name.trim().is_empty() || payload.semana.trim().is_empty() || payload.month.is_none()
    {
        return Err(AppError::Validation(
            "Name, semana and month are required".to_string(),
        ));
    }

    for (category, items) in payload.categories() {
        let Some(items) = items else { continue };

        if items.is_empty() {
            return Err(AppError::Validation(format!(
                "At least one {} item is required",
                category_label(category)
            )));
        }

        for item in items {
            if item.name.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "Item name is required in {}",
                    category_label(category)
                )));
            }
            if item.minutos < 1 {
                return Err(AppError::Validation(format!(
                    "minutos must be a positive integer in {}",
                    category_label(category)
                )));
            }
        }
    }

    Ok(())
}

fn category_label(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::TesorosBiblia => "tesoros de la biblia",
        ItemCategory::SeamosMaestros => "seamos mejores maestros",
        ItemCategory::VidaCristiana => "nuestra vida cristiana",
    }
}

/// Service for managing assignments.
pub struct AsignacionService {
    db: PgPool,
}

impl AsignacionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Paginated list, newest first, with optional case-insensitive search
    /// over name and semana. Returns the page and the total match count.
    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<(Vec<AsignacionDetail>, i64)> {
        // Widen before multiplying; page is caller-controlled and u32
        // arithmetic would overflow on large values.
        let offset = (i64::from(page.max(1)) - 1) * i64::from(limit);
        let pattern = search.map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, Asignacion>(&format!(
            "SELECT {ASIGNACION_COLUMNS} FROM asignaciones
             WHERE ($1::text IS NULL OR name ILIKE $1 OR semana ILIKE $1)
             ORDER BY created_at DESC
             OFFSET $2 LIMIT $3"
        ))
        .bind(&pattern)
        .bind(offset)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asignaciones
             WHERE ($1::text IS NULL OR name ILIKE $1 OR semana ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let details = self.build_details(rows, false).await?;
        Ok((details, total))
    }

    /// Full detail for one assignment, or `NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<AsignacionDetail> {
        let row = sqlx::query_as::<_, Asignacion>(&format!(
            "SELECT {ASIGNACION_COLUMNS} FROM asignaciones WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

        let mut details = self.build_details(vec![row], true).await?;
        Ok(details.remove(0))
    }

    /// Create an assignment together with its item collections in one
    /// transaction.
    pub async fn create(&self, payload: AsignacionPayload) -> Result<AsignacionDetail> {
        validate_payload(&payload)?;

        let mut tx = self.db.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO asignaciones
                 (name, semana, month, parent_id, presidente_id, presidente_reunion_id,
                  lector_reunion_id, oracion_final_vm_id, oracion_final_publica_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(payload.name.trim())
        .bind(payload.semana.trim())
        .bind(payload.month)
        .bind(payload.parent_id)
        .bind(payload.presidente_id)
        .bind(payload.presidente_reunion_id)
        .bind(payload.lector_reunion_id)
        .bind(payload.oracion_final_vm_id)
        .bind(payload.oracion_final_publica_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_reference_error)?;

        for (category, items) in payload.categories() {
            if let Some(items) = items {
                insert_items(&mut tx, id, category, items).await?;
            }
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Replace an assignment's scalar/role fields and its entire item
    /// collections in one atomic unit. Items are replaced, never merged.
    pub async fn update(&self, id: Uuid, payload: AsignacionPayload) -> Result<AsignacionDetail> {
        validate_payload(&payload)?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM asignaciones WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Assignment not found".to_string()));
        }

        let mut tx = self.db.begin().await?;

        // Drop every existing item in all three categories, then recreate
        // from the payload. Both steps commit or roll back together.
        sqlx::query("DELETE FROM asignacion_items WHERE asignacion_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE asignaciones SET
                 name = $2, semana = $3, month = $4, parent_id = $5,
                 presidente_id = $6, presidente_reunion_id = $7, lector_reunion_id = $8,
                 oracion_final_vm_id = $9, oracion_final_publica_id = $10,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(payload.semana.trim())
        .bind(payload.month)
        .bind(payload.parent_id)
        .bind(payload.presidente_id)
        .bind(payload.presidente_reunion_id)
        .bind(payload.lector_reunion_id)
        .bind(payload.oracion_final_vm_id)
        .bind(payload.oracion_final_publica_id)
        .execute(&mut *tx)
        .await
        .map_err(map_reference_error)?;

        for (category, items) in payload.categories() {
            if let Some(items) = items {
                insert_items(&mut tx, id, category, items).await?;
            }
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Delete an assignment. Refused with a structured dependency count when
    /// child assignments exist; item rows go with the parent via FK cascade.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM asignaciones WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Assignment not found".to_string()));
        }

        let children: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM asignaciones WHERE parent_id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        if children > 0 {
            return Err(AppError::DependentChildren(children));
        }

        sqlx::query("DELETE FROM asignaciones WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Assemble response details for a batch of assignment rows: items per
    /// category (in stored order), user references, child counts and, when
    /// `with_relations` is set, the parent summary plus child list.
    async fn build_details(
        &self,
        rows: Vec<Asignacion>,
        with_relations: bool,
    ) -> Result<Vec<AsignacionDetail>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = rows.iter().map(|a| a.id).collect();

        let items = sqlx::query_as::<_, AsignacionItem>(
            "SELECT id, asignacion_id, category, name, minutos, encargado_id, position, created_at
             FROM asignacion_items
             WHERE asignacion_id = ANY($1)
             ORDER BY asignacion_id, category, position, created_at",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let child_counts: Vec<(Option<Uuid>, i64)> = sqlx::query_as(
            "SELECT parent_id, COUNT(*) FROM asignaciones
             WHERE parent_id = ANY($1) GROUP BY parent_id",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;
        let child_counts: HashMap<Uuid, i64> = child_counts
            .into_iter()
            .filter_map(|(pid, n)| pid.map(|p| (p, n)))
            .collect();

        // One batch lookup for every referenced user: role slots + item
        // assignees.
        let mut user_ids: Vec<Uuid> = Vec::new();
        for a in &rows {
            user_ids.extend(
                [
                    a.presidente_id,
                    a.presidente_reunion_id,
                    a.lector_reunion_id,
                    a.oracion_final_vm_id,
                    a.oracion_final_publica_id,
                ]
                .into_iter()
                .flatten(),
            );
        }
        user_ids.extend(items.iter().filter_map(|i| i.encargado_id));
        user_ids.sort_unstable();
        user_ids.dedup();

        let users: HashMap<Uuid, UserRef> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, UserRef>(
                "SELECT id, full_name, email FROM users WHERE id = ANY($1)",
            )
            .bind(&user_ids)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
        };

        let mut items_by_owner: HashMap<(Uuid, ItemCategory), Vec<ItemDetail>> = HashMap::new();
        for item in items {
            let detail = ItemDetail {
                id: item.id,
                name: item.name,
                minutos: item.minutos,
                encargado_id: item.encargado_id,
                encargado: item.encargado_id.and_then(|uid| users.get(&uid).cloned()),
                created_at: item.created_at,
            };
            items_by_owner
                .entry((item.asignacion_id, item.category))
                .or_default()
                .push(detail);
        }

        let mut details = Vec::with_capacity(rows.len());
        for a in rows {
            let (parent, children) = if with_relations {
                let parent = match a.parent_id {
                    Some(pid) => {
                        sqlx::query_as::<_, ParentRef>(
                            "SELECT id, name, semana FROM asignaciones WHERE id = $1",
                        )
                        .bind(pid)
                        .fetch_optional(&self.db)
                        .await?
                    }
                    None => None,
                };
                let children = sqlx::query_as::<_, ChildRef>(
                    "SELECT id, name, semana, created_at FROM asignaciones
                     WHERE parent_id = $1 ORDER BY created_at DESC",
                )
                .bind(a.id)
                .fetch_all(&self.db)
                .await?;
                (parent, children)
            } else {
                (None, vec![])
            };

            let lookup = |uid: Option<Uuid>| uid.and_then(|u| users.get(&u).cloned());
            let take = |category: ItemCategory, map: &mut HashMap<_, Vec<ItemDetail>>| {
                map.remove(&(a.id, category)).unwrap_or_default()
            };

            let tesoros = take(ItemCategory::TesorosBiblia, &mut items_by_owner);
            let maestros = take(ItemCategory::SeamosMaestros, &mut items_by_owner);
            let vida = take(ItemCategory::VidaCristiana, &mut items_by_owner);

            details.push(AsignacionDetail {
                id: a.id,
                name: a.name,
                semana: a.semana,
                month: a.month,
                parent_id: a.parent_id,
                parent,
                count: AsignacionCounts {
                    tesoros_de_la_biblia: tesoros.len(),
                    seamos_mejores_maestros: maestros.len(),
                    nuestra_vida_cristiana: vida.len(),
                    children: child_counts.get(&a.id).copied().unwrap_or(0),
                },
                children,
                presidente: lookup(a.presidente_id),
                presidente_reunion: lookup(a.presidente_reunion_id),
                lector_reunion: lookup(a.lector_reunion_id),
                oracion_final_vm: lookup(a.oracion_final_vm_id),
                oracion_final_publica: lookup(a.oracion_final_publica_id),
                tesoros_de_la_biblia: tesoros,
                seamos_mejores_maestros: maestros,
                nuestra_vida_cristiana: vida,
                created_at: a.created_at,
                updated_at: a.updated_at,
            });
        }

        Ok(details)
    }
}

/// Insert one category's item rows, preserving payload order.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    asignacion_id: Uuid,
    category: ItemCategory,
    items: &[ItemPayload],
) -> Result<()> {
    let conn: &mut PgConnection = &mut *tx;
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO asignacion_items
                 (asignacion_id, category, name, minutos, encargado_id, position)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(asignacion_id)
        .bind(category)
        .bind(item.name.trim())
        .bind(item.minutos)
        .bind(item.encargado_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(map_reference_error)?;
    }
    Ok(())
}

/// Foreign-key violations on user/parent references are caller mistakes,
/// not server faults.
fn map_reference_error(e: sqlx::Error) -> AppError {
    if e.to_string().contains("foreign key") {
        AppError::Validation("Referenced user or parent assignment does not exist".to_string())
    } else {
        AppError::Database(e)
    }
}
