use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::{category_labels, get_all_categories},
            questions::{self, get_all_questions, search_questions},
        },
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        error::ApiError,
        extractors::{ApiJson, ApiPath, ApiQuery},
        pagination::paginate,
    },
};

use super::ApiResponse;

const ALL_CATEGORIES: &str = "ALL";

// an unparseable page is read as the first one
#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Body of `POST /questions`. Any body carrying a `searchTerm` key is a search,
/// anything else is treated as a new question.
#[derive(Debug, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
enum QuestionsRequest {
    Search { search_term: String },
    Create(QuestionDraft),
}

impl TryFrom<Map<String, Value>> for QuestionsRequest {
    type Error = String;

    fn try_from(mut body: Map<String, Value>) -> Result<Self, Self::Error> {
        match body.remove("searchTerm") {
            Some(Value::String(search_term)) => Ok(QuestionsRequest::Search { search_term }),
            Some(other) => Err(format!("`searchTerm` must be a string, got {other}")),
            None => serde_json::from_value(Value::Object(body))
                .map(QuestionsRequest::Create)
                .map_err(|e| e.to_string()),
        }
    }
}

// web forms post numbers as strings
#[derive(Debug, Deserialize)]
struct QuestionDraft {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

impl TryFrom<QuestionDraft> for NewQuestion {
    type Error = ApiError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        let missing = |field: &str| ApiError::BadRequest(format!("`{field}` is required"));
        Ok(NewQuestion {
            question: draft.question.ok_or_else(|| missing("question"))?,
            answer: draft.answer.ok_or_else(|| missing("answer"))?,
            category: draft.category.ok_or_else(|| missing("category"))?,
            difficulty: draft.difficulty.ok_or_else(|| missing("difficulty"))?,
        })
    }
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    categories: BTreeMap<i64, String>,
    questions: Vec<Question>,
    total_questions: usize,
    #[serde(rename = "currentCategroy")]
    current_category: &'static str,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    #[serde(rename = "currentCategroy")]
    current_category: &'static str,
}

#[derive(Serialize)]
struct CreatedQuestion {
    success: bool,
    id: i64,
    question: String,
    answer: String,
    difficulty: i64,
    category: i64,
}

#[derive(Serialize)]
struct DeletedQuestion {
    success: bool,
    id: i64,
}

#[derive(Serialize)]
#[serde(untagged)]
enum QuestionsResponse {
    Search(SearchResults),
    Created(CreatedQuestion),
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<QuestionsPage> {
    let page = query.page();
    if page == 0 {
        return Err(ApiError::BadRequest("pages start at 1".to_owned()));
    }
    let categories = get_all_categories(&pool)
        .await
        .map_err(ApiError::unprocessable)?;
    let questions = get_all_questions(&pool)
        .await
        .map_err(ApiError::unprocessable)?;
    let page_questions = paginate(&questions, page)
        .ok_or_else(|| ApiError::NotFound(format!("page {page} is out of range")))?
        .to_vec();

    Ok(Json(QuestionsPage {
        success: true,
        categories: category_labels(categories),
        questions: page_questions,
        total_questions: questions.len(),
        current_category: ALL_CATEGORIES,
    }))
}

async fn search_or_create(
    State(pool): State<SqlitePool>,
    ApiJson(request): ApiJson<QuestionsRequest>,
) -> ApiResponse<QuestionsResponse> {
    let response = match request {
        QuestionsRequest::Search { search_term } => {
            QuestionsResponse::Search(search(&pool, &search_term).await?)
        }
        QuestionsRequest::Create(draft) => {
            QuestionsResponse::Created(create(&pool, draft.try_into()?).await?)
        }
    };
    Ok(Json(response))
}

async fn search(pool: &SqlitePool, term: &str) -> Result<SearchResults, ApiError> {
    let matches = search_questions(pool, term)
        .await
        .map_err(ApiError::bad_request)?;
    tracing::debug!(term, found = matches.len(), "Searched questions");
    Ok(SearchResults {
        success: true,
        questions: paginate(&matches, 1).unwrap_or_default().to_vec(),
        total_questions: matches.len(),
        current_category: ALL_CATEGORIES,
    })
}

async fn create(pool: &SqlitePool, new_question: NewQuestion) -> Result<CreatedQuestion, ApiError> {
    let id = questions::create_question(pool, new_question.clone())
        .await
        .map_err(ApiError::unprocessable)?;
    tracing::info!(id, category = new_question.category, "Created question");
    Ok(CreatedQuestion {
        success: true,
        id,
        question: new_question.question,
        answer: new_question.answer,
        difficulty: new_question.difficulty,
        category: new_question.category,
    })
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<DeletedQuestion> {
    let deleted = questions::delete_question(&pool, id)
        .await
        .map_err(ApiError::unprocessable)?
        .ok_or_else(|| ApiError::NotFound(format!("question {id}")))?;
    tracing::info!(id = deleted.id, "Deleted question");
    Ok(Json(DeletedQuestion {
        success: true,
        id: deleted.id,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(search_or_create))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: Value) -> QuestionsRequest {
        serde_json::from_value(value).unwrap()
    }

    fn page_of(page: Option<&str>) -> usize {
        PageQuery {
            page: page.map(str::to_owned),
        }
        .page()
    }

    #[test]
    fn search_term_selects_search() {
        let request = decode(serde_json::json!({"searchTerm": "title", "question": "ignored"}));
        assert!(matches!(
            request,
            QuestionsRequest::Search { search_term } if search_term == "title"
        ));
    }

    #[test]
    fn numeric_strings_are_accepted_for_new_questions() {
        let QuestionsRequest::Create(draft) = decode(serde_json::json!({
            "question": "Q",
            "answer": "A",
            "category": "3",
            "difficulty": 2
        })) else {
            panic!("expected a draft");
        };
        let new_question = NewQuestion::try_from(draft).unwrap();
        assert_eq!(new_question.category, 3);
        assert_eq!(new_question.difficulty, 2);
    }

    #[test]
    fn null_or_missing_fields_are_rejected() {
        for body in [
            serde_json::json!({"question": null, "answer": "A", "category": 1, "difficulty": 1}),
            serde_json::json!({"question": "Q", "category": 1, "difficulty": 1}),
            serde_json::json!({}),
        ] {
            let QuestionsRequest::Create(draft) = decode(body) else {
                panic!("expected a draft");
            };
            let err = NewQuestion::try_from(draft).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
    }

    #[test]
    fn non_string_search_term_is_not_a_new_question() {
        for term in [Value::Null, serde_json::json!(42), serde_json::json!(["a"])] {
            let body = serde_json::json!({
                "searchTerm": term,
                "question": "Q",
                "answer": "A",
                "category": 1,
                "difficulty": 1
            });
            assert!(serde_json::from_value::<QuestionsRequest>(body).is_err());
        }
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page_of(None), 1);
        assert_eq!(page_of(Some("two")), 1);
        assert_eq!(page_of(Some("-3")), 1);
        assert_eq!(page_of(Some("2")), 2);
        assert_eq!(page_of(Some("0")), 0);
    }
}
