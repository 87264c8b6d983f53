//! In-memory `DrinkStore` (DATABASE_URL=memory://, tests).
//!
//! Mirrors the table's constraints: ids are assigned ascending and never
//! reused, titles are unique.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::repos::{
    drink_repo::{Drink, DrinkStore},
    error::RepoError,
};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Drink>,
}

impl Table {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDrinkStore {
    table: RwLock<Table>,
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Drink>, RepoError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn create(&self, title: &str, recipe: &Value) -> Result<Drink, RepoError> {
        let mut table = self.table.write().await;
        if table.title_taken(title, None) {
            return Err(RepoError::Conflict);
        }

        table.last_id += 1;
        let drink = Drink {
            id: table.last_id,
            title: title.to_string(),
            recipe: recipe.clone(),
        };
        table.rows.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&Value>,
    ) -> Result<Option<Drink>, RepoError> {
        let mut table = self.table.write().await;
        // A missing row wins over a title clash, as in Postgres.
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = title
            && table.title_taken(title, Some(id))
        {
            return Err(RepoError::Conflict);
        }

        let Some(drink) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            drink.title = title.to_string();
        }
        if let Some(recipe) = recipe {
            drink.recipe = recipe.clone();
        }
        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_list_update_delete() {
        let store = MemoryDrinkStore::new();
        let water = store.create("water", &json!([{"name": "water", "color": "blue", "parts": 1}])).await.unwrap();
        let latte = store.create("latte", &json!([])).await.unwrap();
        assert_eq!((water.id, latte.id), (1, 2));

        let updated = store
            .update(latte.id, None, Some(&json!([{"name": "milk", "color": "grey", "parts": 3}])))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "latte");
        assert_eq!(updated.recipe[0]["parts"], 3);

        assert!(store.delete(water.id).await.unwrap());
        assert!(!store.delete(water.id).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let store = MemoryDrinkStore::new();
        let first = store.create("a", &json!([])).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.create("b", &json!([])).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn duplicate_titles_conflict() {
        let store = MemoryDrinkStore::new();
        store.create("mocha", &json!([])).await.unwrap();
        let other = store.create("flat white", &json!([])).await.unwrap();

        assert!(matches!(
            store.create("mocha", &json!([])).await,
            Err(RepoError::Conflict)
        ));
        assert!(matches!(
            store.update(other.id, Some("mocha"), None).await,
            Err(RepoError::Conflict)
        ));
        // Renaming to its own title is not a conflict.
        assert!(store.update(other.id, Some("flat white"), None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_none() {
        let store = MemoryDrinkStore::new();
        assert!(store.update(42, Some("ghost"), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_missing_row_with_taken_title_is_none() {
        let store = MemoryDrinkStore::new();
        store.create("mocha", &json!([])).await.unwrap();

        assert!(store.update(999, Some("mocha"), None).await.unwrap().is_none());
    }
}
