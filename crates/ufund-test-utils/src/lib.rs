//! Testing utilities for the uFund workspace
//!
//! Shared fixtures and an in-memory backend.

#![allow(missing_docs)]

mod fake;

pub use fake::FakeBackend;

use ufund_model::{ChatPersonality, Need, Role, User, UserId, ADMIN_USER_NAME};

pub fn need(id: i32, cost: i32, quantity: i32) -> Need {
    Need::new(format!("Need {id}"), cost, "goods")
        .with_id(id)
        .with_quantity(quantity)
}

pub fn named_need(id: i32, name: &str, cost: i32) -> Need {
    Need::new(name, cost, "goods").with_id(id)
}

pub fn user(id: i32, name: &str) -> User {
    let mut user = User::new(name, "pw").with_security(vec!["blue".into(), "rex".into()]);
    user.id = UserId(id);
    user.role = Some(Role::for_user_name(name));
    user
}

pub fn admin() -> User {
    user(1, ADMIN_USER_NAME)
}

pub fn personality(id: i32, name: &str) -> ChatPersonality {
    ChatPersonality {
        id,
        name: name.to_string(),
        description: format!("{name} helps out"),
    }
}
