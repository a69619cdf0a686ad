use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::{category_labels, get_all_categories, get_category},
            questions::get_questions_for_category,
        },
        Question,
    },
    server::{app::AppState, error::ApiError, extractors::ApiPath},
};

use super::ApiResponse;

#[derive(Serialize)]
struct CategoriesList {
    categories: BTreeMap<i64, String>,
    success: bool,
}

#[derive(Serialize)]
struct CategoryQuestions {
    success: bool,
    current_category: i64,
    total_questions: usize,
    questions: Vec<Question>,
}

async fn list_categories(State(pool): State<SqlitePool>) -> ApiResponse<CategoriesList> {
    let categories = get_all_categories(&pool)
        .await
        .map_err(ApiError::not_found)?;
    Ok(Json(CategoriesList {
        categories: category_labels(categories),
        success: true,
    }))
}

async fn category_questions(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<CategoryQuestions> {
    get_category(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?
        .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;
    let questions = get_questions_for_category(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?;
    Ok(Json(CategoryQuestions {
        success: true,
        current_category: id,
        total_questions: questions.len(),
        questions,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}/questions", get(category_questions))
        .with_state(state)
}
