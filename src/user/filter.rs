use sqlx::{Postgres, QueryBuilder};

use super::models::{User, UserFilterAttrs, UserUpdateAttrs};
use super::repository::RepositoryError;

/// Columns that can appear in a filter or an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Email,
    Username,
    HashedPassword,
}

impl UserField {
    /// Column name; fixed identifiers only, never user input
    pub fn column(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::Username => "username",
            UserField::HashedPassword => "hashed_password",
        }
    }

    fn read(self, user: &User) -> &str {
        match self {
            UserField::Id => &user.id,
            UserField::Email => &user.email,
            UserField::Username => &user.username,
            UserField::HashedPassword => &user.hashed_password,
        }
    }

    fn write(self, user: &mut User, value: String) {
        match self {
            UserField::Id => user.id = value,
            UserField::Email => user.email = value,
            UserField::Username => user.username = value,
            UserField::HashedPassword => user.hashed_password = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub field: UserField,
    pub value: String,
}

fn present(pairs: [(UserField, &Option<String>); 3]) -> Vec<FieldValue> {
    pairs
        .into_iter()
        .filter_map(|(field, value)| {
            value.as_ref().map(|value| FieldValue {
                field,
                value: value.clone(),
            })
        })
        .collect()
}

/// Non-empty conjunction of `field = value` conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<FieldValue>,
}

impl Predicate {
    pub fn conditions(&self) -> &[FieldValue] {
        &self.conditions
    }

    pub fn matches(&self, user: &User) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.field.read(user) == condition.value)
    }

    /// Appends ` WHERE a = $1 AND b = $2 ...` to `builder`
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE ");
        let mut separated = builder.separated(" AND ");
        for condition in &self.conditions {
            separated.push(condition.field.column());
            separated.push_unseparated(" = ");
            separated.push_bind_unseparated(condition.value.clone());
        }
    }
}

/// Non-empty list of `field = value` assignments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignments {
    values: Vec<FieldValue>,
}

impl Assignments {
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn apply(&self, user: &mut User) {
        for assignment in &self.values {
            assignment.field.write(user, assignment.value.clone());
        }
    }

    /// Appends ` SET a = $1, b = $2 ...` to `builder`
    pub fn push_set(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" SET ");
        let mut separated = builder.separated(", ");
        for assignment in &self.values {
            separated.push(assignment.field.column());
            separated.push_unseparated(" = ");
            separated.push_bind_unseparated(assignment.value.clone());
        }
    }
}

impl UserFilterAttrs {
    /// Present fields in the order id, email, username
    pub fn predicate(&self) -> Result<Predicate, RepositoryError> {
        let conditions = present([
            (UserField::Id, &self.id),
            (UserField::Email, &self.email),
            (UserField::Username, &self.username),
        ]);
        if conditions.is_empty() {
            return Err(RepositoryError::EmptyFilter);
        }
        Ok(Predicate { conditions })
    }
}

impl UserUpdateAttrs {
    pub fn assignments(&self) -> Result<Assignments, RepositoryError> {
        let values = present([
            (UserField::Username, &self.username),
            (UserField::Email, &self.email),
            (UserField::HashedPassword, &self.hashed_password),
        ]);
        if values.is_empty() {
            return Err(RepositoryError::NoUpdateAttrs);
        }
        Ok(Assignments { values })
    }
}
