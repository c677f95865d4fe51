use axum::{extract::{Path, Query, State}, Json, Extension};
use axum::http::StatusCode;
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::menu::{MenuRequest, MenuQuery};
use crate::middleware::auth::AuthContext;
use crate::models::menu::{Menu, MenuType};

const MENU_COLUMNS: &str = "id, name, description, price, menu_type, is_available, created_at";

fn validate_menu(req: &MenuRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Menu name is required"));
    }
    if req.price < 0 {
        return Err(AppError::validation("Price cannot be negative"));
    }
    Ok(())
}

pub async fn create_menu(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<MenuRequest>,
) -> Result<(StatusCode, Json<Menu>), AppError> {
    validate_menu(&req)?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        "INSERT INTO menus (name, description, price, menu_type, is_available)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MENU_COLUMNS}"
    ))
    .bind(req.name.trim())
    .bind(req.description.as_deref())
    .bind(req.price)
    .bind(req.menu_type)
    .bind(req.is_available)
    .fetch_one(&db_pool)
    .await?;

    tracing::info!(menu_id = menu.id, staff = %auth.username, "Menu created");

    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<MenuRequest>,
) -> Result<Json<Menu>, AppError> {
    validate_menu(&req)?;

    // Existing order lines keep the price they were sold at
    let menu = sqlx::query_as::<_, Menu>(&format!(
        "UPDATE menus
        SET name = $2, description = $3, price = $4, menu_type = $5, is_available = $6
        WHERE id = $1
        RETURNING {MENU_COLUMNS}"
    ))
    .bind(id)
    .bind(req.name.trim())
    .bind(req.description.as_deref())
    .bind(req.price)
    .bind(req.menu_type)
    .bind(req.is_available)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Menu not found"))?;

    tracing::info!(menu_id = id, staff = %auth.username, "Menu updated");

    Ok(Json(menu))
}

pub async fn delete_menu(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query(r#"DELETE FROM menus WHERE id = $1"#)
        .bind(id)
        .execute(&db_pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.code().as_deref() == Some("23503") {
                    return AppError::conflict("Menu is used by existing orders");
                }
            }
            AppError::db(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Menu not found"));
    }

    tracing::info!(menu_id = id, staff = %auth.username, "Menu deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_menus(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<MenuQuery>,
) -> Result<Json<Vec<Menu>>, AppError> {
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let menu_type = params
        .menu_type
        .as_deref()
        .and_then(|t| t.trim().parse::<MenuType>().ok());

    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS}
        FROM menus
        WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
        AND ($2::menu_type IS NULL OR menu_type = $2)
        AND ($3::BOOLEAN IS NULL OR is_available = $3)
        ORDER BY name ASC"
    ))
    .bind(search)
    .bind(menu_type)
    .bind(params.available)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(menus))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, price: i64) -> MenuRequest {
        MenuRequest {
            name: name.to_string(),
            description: None,
            price,
            menu_type: MenuType::Food,
            is_available: true,
        }
    }

    #[test]
    fn menu_needs_a_name_and_a_non_negative_price() {
        assert!(validate_menu(&request("Nasi Goreng", 15_000)).is_ok());
        assert!(validate_menu(&request("Air Putih", 0)).is_ok());
        assert!(matches!(validate_menu(&request("   ", 1_000)), Err(AppError::ValidationError(_))));
        assert!(matches!(validate_menu(&request("Kopi", -1)), Err(AppError::ValidationError(_))));
    }
}
