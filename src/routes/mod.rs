mod auth;
mod health_check;
mod items;
mod stores;
mod tags;
mod users;

pub use auth::{login, logout, refresh, register};
pub use health_check::health_check;
pub use items::{create_item, delete_item, get_item, list_items, update_item};
pub use stores::{create_store, create_store_tag, delete_store, get_store, list_store_tags, list_stores};
pub use tags::{delete_tag, get_tag, link_tag, unlink_tag};
pub use users::{delete_user, get_user};
