use std::collections::HashSet;

use axum::{extract::State, routing::post, Json, Router};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize, Serializer};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::get_category,
            questions::{get_all_questions, get_questions_for_category},
        },
        Question,
    },
    server::{app::AppState, error::ApiError, extractors::ApiJson},
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

/// Category id the web client sends for "all categories".
pub const ANY_CATEGORY: i64 = 0;

#[derive(Deserialize)]
struct QuizRequest {
    #[serde(default)]
    previous_questions: Option<Vec<i64>>,
    quiz_category: QuizCategory,
}

// the web client sends `{type, id}`, older clients send the bare id
#[derive(Deserialize)]
#[serde(untagged)]
enum QuizCategory {
    Object { id: CategoryId },
    Bare(CategoryId),
}

#[derive(Deserialize)]
struct CategoryId(#[serde(deserialize_with = "deserialize_number_from_string")] i64);

impl QuizCategory {
    fn id(&self) -> i64 {
        match self {
            QuizCategory::Object { id } | QuizCategory::Bare(id) => id.0,
        }
    }
}

/// Serialized as the question record, or as `false` once every question was played.
#[derive(Debug, PartialEq)]
enum NextQuestion {
    Question(Question),
    Exhausted,
}

impl Serialize for NextQuestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NextQuestion::Question(question) => question.serialize(serializer),
            NextQuestion::Exhausted => serializer.serialize_bool(false),
        }
    }
}

#[derive(Serialize)]
struct QuizStep {
    success: bool,
    question: NextQuestion,
}

/// Uniformly picks a question whose id is not in `previous`.
fn pick_next<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    previous: &[i64],
    rng: &mut R,
) -> Option<&'a Question> {
    let previous: HashSet<i64> = previous.iter().copied().collect();
    let unseen: Vec<&Question> = questions
        .iter()
        .filter(|q| !previous.contains(&q.id))
        .collect();
    unseen.choose(rng).copied()
}

async fn next_question(
    State(pool): State<SqlitePool>,
    ApiJson(request): ApiJson<QuizRequest>,
) -> ApiResponse<QuizStep> {
    let category = request.quiz_category.id();
    let questions = if category == ANY_CATEGORY {
        get_all_questions(&pool)
            .await
            .map_err(ApiError::unprocessable)?
    } else {
        get_category(&pool, category)
            .await
            .map_err(ApiError::unprocessable)?
            .ok_or_else(|| ApiError::NotFound(format!("category {category}")))?;
        get_questions_for_category(&pool, category)
            .await
            .map_err(ApiError::unprocessable)?
    };

    let previous = request.previous_questions.unwrap_or_default();
    let next = pick_next(&questions, &previous, &mut rand::thread_rng()).cloned();
    let question = match next {
        Some(question) => {
            let label = if category == ANY_CATEGORY {
                "all".to_owned()
            } else {
                category.to_string()
            };
            QUIZ_QUESTIONS_SERVED
                .with_label_values(&[label.as_str()])
                .inc();
            NextQuestion::Question(question)
        }
        None => {
            tracing::debug!(category, played = previous.len(), "Quiz exhausted");
            NextQuestion::Exhausted
        }
    };

    Ok(Json(QuizStep {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
