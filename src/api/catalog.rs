//! Catalog API endpoints backed by the mock data client.

use axum::extract::{Path, Query, State};
use serde::Serialize;
use serde_json::Value;

use super::{success, ApiResult};
use crate::catalog::SkillFilter;
use crate::client::{MockDataClient, Resource};
use crate::errors::AppError;
use crate::models::{Category, Like, Skill, Subcategory, User, UsersData};
use crate::AppState;

/// GET /api/catalog/:resource - Fetch one collection, normalized to a plain array.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Value> {
    let resource = Resource::from_name(&name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown resource: {}", name)))?;

    success(fetch_collection(&state.client, resource).await?)
}

/// GET /api/skills - Skills narrowed by category, subcategory, city and text.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(filter): Query<SkillFilter>,
) -> ApiResult<Vec<Skill>> {
    let skills: Vec<Skill> = state.client.fetch_resource(Resource::Skills).await?;
    success(filter.apply(skills))
}

/// GET /api/users-data - Users, cities and skills fetched together.
pub async fn get_users_data(State(state): State<AppState>) -> ApiResult<UsersData> {
    success(state.client.fetch_all_users_data().await?)
}

/// Decode `resource` into its typed records so malformed upstream data is
/// rejected here rather than in the browser.
async fn fetch_collection(client: &MockDataClient, resource: Resource) -> Result<Value, AppError> {
    match resource {
        Resource::Categories => to_value(client.fetch_resource::<Vec<Category>>(resource).await?),
        Resource::Subcategories => {
            to_value(client.fetch_resource::<Vec<Subcategory>>(resource).await?)
        }
        Resource::Cities => to_value(client.fetch_cities().await?),
        Resource::Likes => to_value(client.fetch_resource::<Vec<Like>>(resource).await?),
        Resource::Skills => to_value(client.fetch_resource::<Vec<Skill>>(resource).await?),
        Resource::Users => to_value(client.fetch_resource::<Vec<User>>(resource).await?),
    }
}

fn to_value<T: Serialize>(records: T) -> Result<Value, AppError> {
    serde_json::to_value(records)
        .map_err(|e| AppError::Internal(format!("Failed to encode catalog data: {}", e)))
}
