//! Derived fields on bootcamps and the cascade that removes their children.
//! Each function recomputes from the current child set, so callers invoke
//! them after every child create/update/delete.

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::filter::{FieldPath, FilterExpr, FindOptions};
use crate::state::AppState;

/// Children of one bootcamp
pub fn by_bootcamp(bootcamp_id: Uuid) -> FilterExpr {
    FilterExpr::Eq(FieldPath::single("bootcamp"), Value::String(bootcamp_id.to_string()))
}

/// Arithmetic mean of course tuition
pub fn average_cost(tuitions: &[f64]) -> Option<f64> {
    if tuitions.is_empty() {
        return None;
    }
    Some(tuitions.iter().sum::<f64>() / tuitions.len() as f64)
}

/// Mean rating with one decimal
pub fn average_rating(ratings: &[u8]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub async fn recompute_average_cost(state: &AppState, bootcamp_id: Uuid) -> ApiResult<()> {
    let courses = state
        .courses()
        .select_any(&by_bootcamp(bootcamp_id), &FindOptions::default())
        .await?;
    let tuitions: Vec<f64> = courses.iter().map(|c| c.tuition).collect();

    let bootcamps = state.bootcamps();
    if let Some(mut bootcamp) = bootcamps.select_id(bootcamp_id).await? {
        bootcamp.average_cost = average_cost(&tuitions);
        bootcamps.update(&bootcamp).await?;
    }
    Ok(())
}

pub async fn recompute_average_rating(state: &AppState, bootcamp_id: Uuid) -> ApiResult<()> {
    let reviews = state
        .reviews()
        .select_any(&by_bootcamp(bootcamp_id), &FindOptions::default())
        .await?;
    let ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();

    let bootcamps = state.bootcamps();
    if let Some(mut bootcamp) = bootcamps.select_id(bootcamp_id).await? {
        bootcamp.average_rating = average_rating(&ratings);
        bootcamps.update(&bootcamp).await?;
    }
    Ok(())
}

/// Removes the courses and reviews that belong to a bootcamp
pub async fn cascade_delete_bootcamp(state: &AppState, bootcamp_id: Uuid) -> ApiResult<()> {
    let filter = by_bootcamp(bootcamp_id);
    let (course_repo, review_repo) = (state.courses(), state.reviews());
    let (courses, reviews) = futures::try_join!(
        course_repo.delete_any(&filter),
        review_repo.delete_any(&filter),
    )?;
    info!(%bootcamp_id, courses, reviews, "removed bootcamp children");
    Ok(())
}
