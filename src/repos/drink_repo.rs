/*
 * Responsibility
 * - drinks テーブル向けの CRUD (DrinkStore trait)
 * - PostgreSQL 実装 (sqlx)。in-memory 実装は repos::memory
 * - DB エラーは RepoError に分類して返す
 */
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions, types::Json};

use crate::repos::error::RepoError;

/// A stored drink. `recipe` is always a JSON array of ingredient objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Value,
}

#[async_trait]
pub trait DrinkStore: Send + Sync {
    // For logs only.
    fn backend_name(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<Drink>, RepoError>;

    async fn create(&self, title: &str, recipe: &Value) -> Result<Drink, RepoError>;

    // `None` fields are left untouched. Returns `None` when `id` does not exist.
    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&Value>,
    ) -> Result<Option<Drink>, RepoError>;

    // Returns whether a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: Json<Value>,
}

impl From<DrinkRow> for Drink {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row.recipe.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgDrinkStore {
    db: PgPool,
}

impl PgDrinkStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepoError> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<Drink>, RepoError> {
        let rows = sqlx::query_as::<_, DrinkRow>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Drink::from).collect())
    }

    async fn create(&self, title: &str, recipe: &Value) -> Result<Drink, RepoError> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING id, title, recipe
            "#,
        )
        .bind(title)
        .bind(Json(recipe))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&Value>,
    ) -> Result<Option<Drink>, RepoError> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET
                title = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(recipe.map(Json))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Drink::from))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM drinks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
