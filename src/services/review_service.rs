use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::aggregates::{by_bootcamp, recompute_average_rating};
use super::course_service::bootcamp_populate;
use super::listing::{populate_one, run_listing, run_scoped, ListPage};
use super::{bootcamp_service, parse_id};
use crate::database::models::{merge_writable, Account, Review, Role};
use crate::database::Collection;
use crate::error::{ApiError, ApiResult};
use crate::filter::FilterExpr;
use crate::middleware::{authorize, ensure_owner};
use crate::state::AppState;

pub async fn list(state: &AppState, params: &[(String, String)]) -> ApiResult<ListPage> {
    run_listing(state, Collection::Reviews, params, &[bootcamp_populate()]).await
}

pub async fn list_for_bootcamp(state: &AppState, raw_bootcamp_id: &str) -> ApiResult<ListPage> {
    let bootcamp_id = parse_id(raw_bootcamp_id, "Bootcamp")?;
    run_scoped(state, Collection::Reviews, by_bootcamp(bootcamp_id), &[]).await
}

async fn load(state: &AppState, raw_id: &str) -> ApiResult<Review> {
    let id = parse_id(raw_id, "Review")?;
    state
        .reviews()
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("Review", raw_id))
}

pub async fn get(state: &AppState, raw_id: &str) -> ApiResult<Value> {
    let review = load(state, raw_id).await?;
    populate_one(state, Collection::Reviews, serde_json::to_value(&review)?, &[bootcamp_populate()]).await
}

pub async fn create(state: &AppState, caller: &Account, raw_bootcamp_id: &str, payload: &Value) -> ApiResult<Review> {
    authorize(caller, &[Role::User, Role::Admin])?;
    let bootcamp = bootcamp_service::get(state, raw_bootcamp_id).await?;

    let reviews = state.reviews();
    let mine = by_bootcamp(bootcamp.id).and(FilterExpr::eq("user", caller.id.to_string())?);
    if reviews.count(&mine).await? > 0 {
        return Err(ApiError::conflict("You have already reviewed this bootcamp"));
    }

    let base = json!({
        "id": Uuid::new_v4(),
        "createdAt": Utc::now(),
        "bootcamp": bootcamp.id,
        "user": caller.id,
    });
    let review: Review = merge_writable(base, payload)?;
    reviews.insert(&review).await?;
    recompute_average_rating(state, bootcamp.id).await?;
    Ok(review)
}

pub async fn update(state: &AppState, caller: &Account, raw_id: &str, payload: &Value) -> ApiResult<Review> {
    let existing = load(state, raw_id).await?;
    ensure_owner(caller, existing.user, "update this review")?;

    let updated: Review = merge_writable(serde_json::to_value(&existing)?, payload)?;
    if !state.reviews().update(&updated).await? {
        return Err(ApiError::resource_not_found("Review", raw_id));
    }
    recompute_average_rating(state, updated.bootcamp).await?;
    Ok(updated)
}

pub async fn delete(state: &AppState, caller: &Account, raw_id: &str) -> ApiResult<()> {
    let existing = load(state, raw_id).await?;
    ensure_owner(caller, existing.user, "delete this review")?;

    state.reviews().delete(existing.id).await?;
    recompute_average_rating(state, existing.bootcamp).await?;
    Ok(())
}
