use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::aggregates::{by_bootcamp, recompute_average_cost};
use super::listing::{populate_one, run_listing, run_scoped, ListPage};
use super::{bootcamp_service, parse_id};
use crate::database::models::{merge_writable, Account, Course, Entity, Role};
use crate::database::Collection;
use crate::error::{ApiError, ApiResult};
use crate::filter::{FieldPath, Populate, Projection};
use crate::middleware::{authorize, ensure_owner};
use crate::state::AppState;

/// Replaces the `bootcamp` id with the bootcamp's name and description
pub fn bootcamp_populate() -> Populate {
    Populate {
        collection: Collection::Bootcamps,
        local_field: "bootcamp",
        foreign_field: "id",
        as_field: "bootcamp",
        single: true,
        select: Some(Projection {
            fields: vec![FieldPath::single("name"), FieldPath::single("description")],
        }),
    }
}

pub async fn list(state: &AppState, params: &[(String, String)]) -> ApiResult<ListPage> {
    run_listing(state, Collection::Courses, params, &[bootcamp_populate()]).await
}

pub async fn list_for_bootcamp(state: &AppState, raw_bootcamp_id: &str) -> ApiResult<ListPage> {
    let bootcamp_id = parse_id(raw_bootcamp_id, "Bootcamp")?;
    run_scoped(state, Collection::Courses, by_bootcamp(bootcamp_id), &[]).await
}

async fn load(state: &AppState, raw_id: &str) -> ApiResult<Course> {
    let id = parse_id(raw_id, "Course")?;
    state
        .courses()
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found("Course", raw_id))
}

pub async fn get(state: &AppState, raw_id: &str) -> ApiResult<Value> {
    let course = load(state, raw_id).await?;
    populate_one(state, Collection::Courses, serde_json::to_value(&course)?, &[bootcamp_populate()]).await
}

pub async fn create(state: &AppState, caller: &Account, raw_bootcamp_id: &str, payload: &Value) -> ApiResult<Course> {
    authorize(caller, &[Role::Publisher, Role::Admin])?;
    let bootcamp = bootcamp_service::get(state, raw_bootcamp_id).await?;
    ensure_owner(caller, bootcamp.user, &format!("add a course to bootcamp {}", bootcamp.id))?;

    let base = json!({
        "id": Uuid::new_v4(),
        "createdAt": Utc::now(),
        "bootcamp": bootcamp.id,
        "user": caller.id,
    });
    let course: Course = merge_writable(base, payload)?;
    state.courses().insert(&course).await?;
    recompute_average_cost(state, bootcamp.id).await?;
    info!(course_id = %course.id(), bootcamp_id = %bootcamp.id, "created course");
    Ok(course)
}

pub async fn update(state: &AppState, caller: &Account, raw_id: &str, payload: &Value) -> ApiResult<Course> {
    let existing = load(state, raw_id).await?;
    ensure_owner(caller, existing.user, &format!("update course {}", existing.id))?;

    let updated: Course = merge_writable(serde_json::to_value(&existing)?, payload)?;
    if !state.courses().update(&updated).await? {
        return Err(ApiError::resource_not_found("Course", raw_id));
    }
    recompute_average_cost(state, updated.bootcamp).await?;
    Ok(updated)
}

pub async fn delete(state: &AppState, caller: &Account, raw_id: &str) -> ApiResult<()> {
    let existing = load(state, raw_id).await?;
    ensure_owner(caller, existing.user, &format!("delete course {}", existing.id))?;

    state.courses().delete(existing.id).await?;
    recompute_average_cost(state, existing.bootcamp).await?;
    Ok(())
}
