/// Request validators
///
/// Each function takes the raw, possibly missing fields of a request body and
/// returns either a typed value ready for the database layer or every problem
/// found, so clients get the full list in one response.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationErrors;

const MAX_USERNAME_LENGTH: usize = 80;
const MAX_PASSWORD_BYTES: usize = 72; // bcrypt ignores everything past 72 bytes
const MAX_NAME_LENGTH: usize = 80;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.@-]+$").unwrap();
}

/// Username and password that passed validation
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    pub store_id: i64,
}

/// Fields of a PUT /item body; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub store_id: Option<i64>,
}

impl ItemChanges {
    /// Turn an update into a creation; every field becomes mandatory.
    pub fn into_new_item(self) -> Result<NewItem, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_none() {
            errors.push("name", "is required");
        }
        if self.price.is_none() {
            errors.push("price", "is required");
        }
        if self.store_id.is_none() {
            errors.push("store_id", "is required");
        }

        match (self.name, self.price, self.store_id) {
            (Some(name), Some(price), Some(store_id)) => Ok(NewItem {
                name,
                price,
                store_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Registration applies the full username policy
pub fn validate_registration(
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let username = match username.map(str::trim) {
        None | Some("") => {
            errors.push("username", "is required");
            None
        }
        Some(u) if u.chars().count() > MAX_USERNAME_LENGTH => {
            errors.push(
                "username",
                format!("is too long (maximum {} characters)", MAX_USERNAME_LENGTH),
            );
            None
        }
        Some(u) if !USERNAME_REGEX.is_match(u) => {
            errors.push(
                "username",
                "may only contain letters, digits and the characters _ . @ -",
            );
            None
        }
        Some(u) => Some(u.to_string()),
    };

    let password = check_password(&mut errors, password);

    match (username, password) {
        (Some(username), Some(password)) if errors.is_empty() => {
            Ok(Credentials { username, password })
        }
        _ => Err(errors),
    }
}

/// Login only checks presence. Anything else is answered by the credential check itself.
pub fn validate_login(
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let username = match username.map(str::trim) {
        None | Some("") => {
            errors.push("username", "is required");
            None
        }
        Some(u) => Some(u.to_string()),
    };
    let password = match password {
        None | Some("") => {
            errors.push("password", "is required");
            None
        }
        Some(p) => Some(p.to_string()),
    };

    match (username, password) {
        (Some(username), Some(password)) => Ok(Credentials { username, password }),
        _ => Err(errors),
    }
}

pub fn validate_store_name(name: Option<&str>) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = check_name(&mut errors, "name", name);
    match name {
        Some(name) => Ok(name),
        None => Err(errors),
    }
}

pub fn validate_tag_name(name: Option<&str>) -> Result<String, ValidationErrors> {
    validate_store_name(name)
}

pub fn validate_new_item(
    name: Option<&str>,
    price: Option<f64>,
    store_id: Option<i64>,
) -> Result<NewItem, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = check_name(&mut errors, "name", name);
    let price = match price {
        None => {
            errors.push("price", "is required");
            None
        }
        Some(p) => check_price(&mut errors, p),
    };
    let store_id = match store_id {
        None => {
            errors.push("store_id", "is required");
            None
        }
        Some(id) => check_id(&mut errors, "store_id", id),
    };

    match (name, price, store_id) {
        (Some(name), Some(price), Some(store_id)) => Ok(NewItem {
            name,
            price,
            store_id,
        }),
        _ => Err(errors),
    }
}

pub fn validate_item_changes(
    name: Option<&str>,
    price: Option<f64>,
    store_id: Option<i64>,
) -> Result<ItemChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let changes = ItemChanges {
        name: name.and_then(|n| check_name(&mut errors, "name", Some(n))),
        price: price.and_then(|p| check_price(&mut errors, p)),
        store_id: store_id.and_then(|id| check_id(&mut errors, "store_id", id)),
    };

    errors.into_result(changes)
}

fn check_name(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<String> {
    let trimmed = match value.map(str::trim) {
        None | Some("") => {
            errors.push(field, "is required");
            return None;
        }
        Some(v) => v,
    };

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.push(
            field,
            format!("is too long (maximum {} characters)", MAX_NAME_LENGTH),
        );
        return None;
    }

    if trimmed.chars().any(|c| c.is_control()) {
        errors.push(field, "contains control characters");
        return None;
    }

    Some(trimmed.to_string())
}

fn check_password(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    match value {
        None | Some("") => {
            errors.push("password", "is required");
            None
        }
        Some(p) if p.len() > MAX_PASSWORD_BYTES => {
            errors.push(
                "password",
                format!("is too long (maximum {} bytes)", MAX_PASSWORD_BYTES),
            );
            None
        }
        Some(p) => Some(p.to_string()),
    }
}

fn check_price(errors: &mut ValidationErrors, price: f64) -> Option<f64> {
    if !price.is_finite() || price < 0.0 {
        errors.push("price", "must be a non-negative number");
        return None;
    }
    Some(price)
}

fn check_id(errors: &mut ValidationErrors, field: &str, id: i64) -> Option<i64> {
    if id <= 0 {
        errors.push(field, "must be a positive integer");
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        let creds = validate_registration(Some(" alice "), Some("pw123")).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "pw123");
    }

    #[test]
    fn test_registration_reports_every_missing_field() {
        let errors = validate_registration(None, None).unwrap_err();
        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "password"]);
    }

    #[test]
    fn test_registration_rejects_bad_usernames() {
        assert!(validate_registration(Some("al ice"), Some("pw")).is_err());
        assert!(validate_registration(Some("bob'; DROP TABLE users"), Some("pw")).is_err());
        assert!(validate_registration(Some("a".repeat(81).as_str()), Some("pw")).is_err());
        assert!(validate_registration(Some("bob.smith@shop"), Some("pw")).is_ok());
    }

    #[test]
    fn test_password_length_limit() {
        let long_password = "a".repeat(73);
        assert!(validate_registration(Some("alice"), Some(long_password.as_str())).is_err());
        assert!(validate_registration(Some("alice"), Some("a".repeat(72).as_str())).is_ok());
    }

    #[test]
    fn test_login_only_checks_presence() {
        assert!(validate_login(Some("anything goes"), Some("x")).is_ok());
        assert_eq!(validate_login(Some(""), None).unwrap_err().errors().len(), 2);
    }

    #[test]
    fn test_store_name() {
        assert_eq!(validate_store_name(Some("  Corner Shop ")).unwrap(), "Corner Shop");
        assert!(validate_store_name(Some("   ")).is_err());
        assert!(validate_store_name(Some("bad\u{0}name")).is_err());
        assert!(validate_store_name(Some("s".repeat(81).as_str())).is_err());
    }

    #[test]
    fn test_new_item() {
        let item = validate_new_item(Some("Chair"), Some(15.99), Some(1)).unwrap();
        assert_eq!(
            item,
            NewItem {
                name: "Chair".to_string(),
                price: 15.99,
                store_id: 1
            }
        );

        let errors = validate_new_item(Some(""), Some(-1.0), Some(0)).unwrap_err();
        assert_eq!(errors.errors().len(), 3);

        assert!(validate_new_item(Some("Chair"), Some(f64::NAN), Some(1)).is_err());
    }

    #[test]
    fn test_item_changes_accept_partial_bodies() {
        let changes = validate_item_changes(None, Some(9.5), None).unwrap();
        assert_eq!(changes.price, Some(9.5));
        assert!(changes.name.is_none());

        assert!(validate_item_changes(Some(""), None, None).is_err());
    }

    #[test]
    fn test_item_changes_into_new_item() {
        let partial = ItemChanges {
            price: Some(3.0),
            ..Default::default()
        };
        let errors = partial.into_new_item().unwrap_err();
        assert_eq!(errors.errors().len(), 2);

        let complete = ItemChanges {
            name: Some("Lamp".to_string()),
            price: Some(3.0),
            store_id: Some(2),
        };
        assert_eq!(complete.into_new_item().unwrap().store_id, 2);
    }
}
