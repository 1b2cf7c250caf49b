use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::aggregates::cascade_delete_bootcamp;
use super::listing::{run_listing, run_scoped, ListPage};
use super::{parse_id, str_field};
use crate::database::models::bootcamp::DEFAULT_PHOTO;
use crate::database::models::{merge_writable, slugify, Account, Bootcamp, Role, ValidationErrors};
use crate::database::Collection;
use crate::error::{ApiError, ApiResult};
use crate::filter::filter_match::EARTH_RADIUS_MILES;
use crate::filter::{FieldPath, FilterExpr, Populate};
use crate::middleware::{authorize, ensure_owner};
use crate::state::AppState;

/// Bootcamp lists carry their courses
pub fn courses_populate() -> Populate {
    Populate {
        collection: Collection::Courses,
        local_field: "id",
        foreign_field: "bootcamp",
        as_field: "courses",
        single: false,
        select: None,
    }
}

pub async fn list(state: &AppState, params: &[(String, String)]) -> ApiResult<ListPage> {
    run_listing(state, Collection::Bootcamps, params, &[courses_populate()]).await
}

pub async fn get(state: &AppState, raw_id: &str) -> ApiResult<Bootcamp> {
    let id = parse_id(raw_id, "Bootcamp")?;
    state
        .bootcamps()
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("Bootcamp", raw_id))
}

pub async fn create(state: &AppState, caller: &Account, payload: &Value) -> ApiResult<Bootcamp> {
    authorize(caller, &[Role::Publisher, Role::Admin])?;

    let bootcamps = state.bootcamps();
    if !caller.is_admin() {
        let owned = FilterExpr::eq("user", caller.id.to_string())?;
        if bootcamps.count(&owned).await? > 0 {
            return Err(ApiError::conflict(format!(
                "The user with ID {} has already published a bootcamp",
                caller.id
            )));
        }
    }

    let address = str_field(payload, "address").map(str::trim).unwrap_or_default();
    let base = json!({
        "id": Uuid::new_v4(),
        "createdAt": Utc::now(),
        "user": caller.id,
        "photo": DEFAULT_PHOTO,
    });
    let mut bootcamp: Bootcamp = match merge_writable(base, payload) {
        Ok(_) if address.is_empty() => return Err(ValidationErrors::single("address", "Please add an address").into()),
        Ok(b) => b,
        Err(mut errors) => {
            if address.is_empty() {
                errors.add("address", "Please add an address");
            }
            return Err(errors.into());
        }
    };
    bootcamp.slug = slugify(&bootcamp.name);

    let point = state
        .geocoder
        .geocode(address)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Could not geocode address {}", address)))?;
    bootcamp.location = Some(point.into_location());

    bootcamps.insert(&bootcamp).await?;
    info!(bootcamp_id = %bootcamp.id, owner = %caller.id, "created bootcamp");
    Ok(bootcamp)
}

pub async fn update(state: &AppState, caller: &Account, raw_id: &str, payload: &Value) -> ApiResult<Bootcamp> {
    let existing = get(state, raw_id).await?;
    ensure_owner(caller, existing.user, "update this bootcamp")?;

    let updated: Bootcamp = merge_writable(serde_json::to_value(&existing)?, payload)?;
    if !state.bootcamps().update(&updated).await? {
        return Err(ApiError::resource_not_found("Bootcamp", raw_id));
    }
    Ok(updated)
}

pub async fn delete(state: &AppState, caller: &Account, raw_id: &str) -> ApiResult<()> {
    let existing = get(state, raw_id).await?;
    ensure_owner(caller, existing.user, "delete this bootcamp")?;

    cascade_delete_bootcamp(state, existing.id).await?;
    state.bootcamps().delete(existing.id).await?;
    info!(bootcamp_id = %existing.id, "deleted bootcamp");
    Ok(())
}

/// Bootcamps within `distance` miles of the centre of a zipcode
pub async fn within_radius(state: &AppState, zipcode: &str, distance: &str) -> ApiResult<ListPage> {
    let miles: f64 = distance
        .trim()
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid distance {}", distance)))?;

    let point = state
        .geocoder
        .geocode(zipcode)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Could not geocode zipcode {}", zipcode)))?;

    let near = FilterExpr::Near {
        field: FieldPath::single("location"),
        lng: point.lng,
        lat: point.lat,
        radians: miles / EARTH_RADIUS_MILES,
    };
    run_scoped(state, Collection::Bootcamps, near, &[]).await
}

/// Used by the photo upload after the bytes are stored
pub(crate) async fn set_photo(state: &AppState, bootcamp: &Bootcamp, photo: String) -> ApiResult<Bootcamp> {
    let mut updated = bootcamp.clone();
    updated.photo = photo;
    if !state.bootcamps().update(&updated).await? {
        return Err(ApiError::resource_not_found("Bootcamp", bootcamp.id));
    }
    Ok(updated)
}
