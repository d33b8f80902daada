/// Catalog persistence
///
/// Stores own items and tags; items and tags are linked many-to-many through
/// `items_tags`. Each submodule holds the queries for one table and assembles
/// the nested response shapes from a handful of small selects.

pub mod items;
pub mod stores;
pub mod tags;

use serde::Serialize;

/// `{id, name}` of the owning store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRef {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub items: Vec<ItemRef>,
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub store: StoreRef,
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub store: StoreRef,
    pub items: Vec<ItemRef>,
}

impl From<(i64, String)> for StoreRef {
    fn from((id, name): (i64, String)) -> Self {
        Self { id, name }
    }
}

impl From<(i64, String)> for TagRef {
    fn from((id, name): (i64, String)) -> Self {
        Self { id, name }
    }
}

impl From<(i64, String, f64)> for ItemRef {
    fn from((id, name, price): (i64, String, f64)) -> Self {
        Self { id, name, price }
    }
}
