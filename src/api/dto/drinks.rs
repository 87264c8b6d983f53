/*
 * Responsibility
 * - Drinks の request/response DTO
 * - validate(): title / recipe の形式チェックと recipe の正規化
 * - short / long 表現の組み立て
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repos::drink_repo::Drink;

pub const TITLE_MAX_CHARS: usize = 80;

// Fields kept by the short representation.
const SHORT_RECIPE_FIELDS: [&str; 2] = ["color", "parts"];

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Value>,
}

/// A create request that passed validation. `recipe` is always an array.
#[derive(Debug, PartialEq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Value,
}

impl CreateDrinkRequest {
    pub fn validate(self) -> Result<NewDrink, &'static str> {
        let title = self.title.ok_or("title is required")?;
        validate_title(&title)?;

        let recipe = match self.recipe {
            Some(recipe) => normalize_recipe(recipe)?,
            None => Value::Array(Vec::new()),
        };

        Ok(NewDrink { title, recipe })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Value>,
}

/// Fields to change; `None` leaves the stored value alone.
#[derive(Debug, PartialEq)]
pub struct DrinkChanges {
    pub title: Option<String>,
    pub recipe: Option<Value>,
}

impl UpdateDrinkRequest {
    pub fn validate(self) -> Result<DrinkChanges, &'static str> {
        if self.title.is_none() && self.recipe.is_none() {
            return Err("title or recipe is required");
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        let recipe = self.recipe.map(normalize_recipe).transpose()?;

        Ok(DrinkChanges {
            title: self.title,
            recipe,
        })
    }
}

fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title cannot be empty");
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err("title must be <= 80 chars");
    }
    Ok(())
}

// A lone ingredient object is accepted and wrapped into a one-element array.
fn normalize_recipe(recipe: Value) -> Result<Value, &'static str> {
    let entries = match recipe {
        Value::Array(entries) => entries,
        Value::Object(entry) => vec![Value::Object(entry)],
        _ => return Err("recipe must be an array or an object"),
    };
    if !entries.iter().all(Value::is_object) {
        return Err("recipe entries must be objects");
    }
    Ok(Value::Array(entries))
}

#[derive(Debug, Serialize)]
pub struct DrinkResponse {
    pub id: i64,
    pub title: String,
    pub recipe: Value,
}

impl DrinkResponse {
    /// Full recipe.
    pub fn long(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }

    /// Recipe entries reduced to what the public menu shows.
    pub fn short(drink: Drink) -> Self {
        let recipe = match drink.recipe {
            Value::Array(entries) => Value::Array(entries.iter().map(short_entry).collect()),
            other => other,
        };
        Self {
            id: drink.id,
            title: drink.title,
            recipe,
        }
    }
}

fn short_entry(entry: &Value) -> Value {
    let mut short = Map::new();
    for field in SHORT_RECIPE_FIELDS {
        if let Some(value) = entry.get(field) {
            short.insert(field.to_string(), value.clone());
        }
    }
    Value::Object(short)
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<DrinkResponse>,
}

impl DrinksResponse {
    pub fn new(drinks: Vec<DrinkResponse>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}
