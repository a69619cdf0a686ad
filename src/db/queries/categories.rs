use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

/// Maps category ids to their labels, the shape the web client expects.
pub fn category_labels(categories: Vec<Category>) -> BTreeMap<i64, String> {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, "type"
FROM categories
ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, "type" FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Inserts categories keeping their ids, overwriting labels of ids that already exist.
pub async fn import_categories(pool: &SqlitePool, categories: Vec<Category>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for category in categories {
        sqlx::query(
            r#"
INSERT INTO categories (id, "type") VALUES (?1, ?2)
ON CONFLICT (id) DO UPDATE SET "type" = excluded."type"
            "#,
        )
        .bind(category.id)
        .bind(category.kind)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn category(id: i64, kind: &str) -> Category {
        Category {
            id,
            kind: kind.to_owned(),
        }
    }

    #[tokio::test]
    async fn import_overwrites_existing_labels() {
        let pool = test_pool().await;
        import_categories(&pool, vec![category(2, "Art"), category(1, "Sience")])
            .await
            .unwrap();
        import_categories(&pool, vec![category(1, "Science")])
            .await
            .unwrap();

        let categories = get_all_categories(&pool).await.unwrap();
        assert_eq!(categories, vec![category(1, "Science"), category(2, "Art")]);
        assert_eq!(get_category(&pool, 3).await.unwrap(), None);
    }

    #[test]
    fn labels_are_keyed_by_id() {
        let labels = category_labels(vec![category(4, "History"), category(1, "Science")]);
        assert_eq!(labels.get(&1).map(String::as_str), Some("Science"));
        assert_eq!(labels.get(&4).map(String::as_str), Some("History"));
        assert_eq!(
            serde_json::to_value(&labels).unwrap(),
            serde_json::json!({"1": "Science", "4": "History"})
        );
    }
}
