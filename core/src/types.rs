//! Domain DTOs for the to-do API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently so
//! the client does not depend on axum. `category` travels as a plain string;
//! `Category` and `CategoryFilter` are the client's typed view of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = Uuid;

/// A single to-do item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub text: String,
    pub category: String,
    pub completed: bool,
}

/// Request payload for creating a new item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub completed: bool,
}

/// Request payload for updating an existing item. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateItem {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// Confirmation body returned by a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deleted {
    pub message: String,
}

/// The fixed set of categories an item can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Work,
    Personal,
    Urgent,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Work, Category::Personal, Category::Urgent];

    pub fn label(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category {:?}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// View restriction on the list. `All` is a filter value only and can never
/// be assigned to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category == category.label(),
        }
    }

    /// The category new items are created in, if this filter names one.
    pub fn category(self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(category) => f.write_str(category.label()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str) -> Item {
        Item {
            id: Uuid::nil(),
            text: "x".to_string(),
            category: category.to_string(),
            completed: false,
        }
    }

    #[test]
    fn filter_parses_all_and_categories() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "urgent".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Urgent)
        );
        assert!("Errands".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn all_is_not_an_assignable_category() {
        assert!("All".parse::<Category>().is_err());
        assert_eq!(CategoryFilter::All.category(), None);
    }

    #[test]
    fn filter_matches_by_label() {
        assert!(CategoryFilter::All.matches(&item("Work")));
        assert!(CategoryFilter::Only(Category::Work).matches(&item("Work")));
        assert!(!CategoryFilter::Only(Category::Work).matches(&item("Personal")));
    }

    #[test]
    fn update_item_skips_absent_fields() {
        let json = serde_json::to_value(UpdateItem::completed(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "completed": true }));
    }
}
