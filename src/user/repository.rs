use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{User, UserAttrs, UserFilterAttrs, UserUpdateAttrs};
use crate::context::{ContextError, RequestContext};

const USER_COLUMNS: &str = "id, username, email, hashed_password";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no filter attributes provided")]
    EmptyFilter,

    #[error("no update attributes provided")]
    NoUpdateAttrs,

    #[error("user not found")]
    NotFound,

    #[error("email already in use")]
    EmailTaken,

    #[error("username already in use")]
    UsernameTaken,

    #[error("user id already in use")]
    IdTaken,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Trait for user persistence, driven by attribute filters
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, ctx: &RequestContext, attrs: UserAttrs) -> Result<User, RepositoryError>;

    /// First user matching every present filter field
    async fn find_one(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<User, RepositoryError>;

    /// All matching users; an empty result is [`RepositoryError::NotFound`]
    async fn find(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<Vec<User>, RepositoryError>;

    /// Applies `update` to every matching user and returns the first updated row
    async fn update(
        &self,
        ctx: &RequestContext,
        update: &UserUpdateAttrs,
        filter: &UserFilterAttrs,
    ) -> Result<User, RepositoryError>;

    async fn delete(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<(), RepositoryError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Uniqueness of id, email and username is checked under the same write lock
/// as the mutation, mirroring the database constraints.
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

/// First uniqueness clash between `candidate` and any user in `others`
fn find_clash<'a>(candidate: &User, others: impl Iterator<Item = &'a User>) -> Option<RepositoryError> {
    for other in others {
        if other.id == candidate.id {
            return Some(RepositoryError::IdTaken);
        }
        if other.email == candidate.email {
            return Some(RepositoryError::EmailTaken);
        }
        if other.username == candidate.username {
            return Some(RepositoryError::UsernameTaken);
        }
    }
    None
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, ctx, attrs), fields(user_id = %attrs.id))]
    async fn create(&self, ctx: &RequestContext, attrs: UserAttrs) -> Result<User, RepositoryError> {
        let user = User::from(attrs);

        let mut users = ctx.run(self.users.write()).await?;
        if let Some(err) = find_clash(&user, users.iter()) {
            warn!(error = %err, "User creation rejected in memory");
            return Err(err);
        }
        users.push(user.clone());

        debug!("User created in memory");
        Ok(user)
    }

    #[instrument(skip(self, ctx))]
    async fn find_one(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<User, RepositoryError> {
        let predicate = filter.predicate()?;

        let users = ctx.run(self.users.read()).await?;
        users
            .iter()
            .find(|user| predicate.matches(user))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, ctx))]
    async fn find(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<Vec<User>, RepositoryError> {
        let predicate = filter.predicate()?;

        let users = ctx.run(self.users.read()).await?;
        let found: Vec<User> = users
            .iter()
            .filter(|user| predicate.matches(user))
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        debug!(count = found.len(), "Users found in memory");
        Ok(found)
    }

    #[instrument(skip(self, ctx, update))]
    async fn update(
        &self,
        ctx: &RequestContext,
        update: &UserUpdateAttrs,
        filter: &UserFilterAttrs,
    ) -> Result<User, RepositoryError> {
        let predicate = filter.predicate()?;
        let assignments = update.assignments()?;

        let mut users = ctx.run(self.users.write()).await?;
        let matched: Vec<usize> = users
            .iter()
            .enumerate()
            .filter(|(_, user)| predicate.matches(user))
            .map(|(index, _)| index)
            .collect();
        if matched.is_empty() {
            return Err(RepositoryError::NotFound);
        }

        // Stage the change on a copy so a clash leaves the table untouched
        let mut staged = users.clone();
        for &index in &matched {
            assignments.apply(&mut staged[index]);
        }
        for &index in &matched {
            let others = staged
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, user)| user);
            if let Some(err) = find_clash(&staged[index], others) {
                warn!(error = %err, "User update rejected in memory");
                return Err(err);
            }
        }

        let first = staged[matched[0]].clone();
        *users = staged;

        debug!(user_id = %first.id, updated = matched.len(), "Users updated in memory");
        Ok(first)
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<(), RepositoryError> {
        let predicate = filter.predicate()?;

        let mut users = ctx.run(self.users.write()).await?;
        let before = users.len();
        users.retain(|user| !predicate.matches(user));

        let removed = before - users.len();
        if removed == 0 {
            warn!("User not found for deletion in memory");
            return Err(RepositoryError::NotFound);
        }

        debug!(removed, "Users deleted from memory");
        Ok(())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique-constraint violations to their domain error
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => return RepositoryError::EmailTaken,
                Some("users_username_key") => return RepositoryError::UsernameTaken,
                Some("users_pkey") => return RepositoryError::IdTaken,
                _ => {}
            }
        }
    }
    warn!(error = %err, "User write failed in database");
    RepositoryError::Database(err)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, ctx, attrs), fields(user_id = %attrs.id))]
    async fn create(&self, ctx: &RequestContext, attrs: UserAttrs) -> Result<User, RepositoryError> {
        let query = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, hashed_password",
        )
        .bind(attrs.id)
        .bind(attrs.username)
        .bind(attrs.email)
        .bind(attrs.hashed_password);

        let user = ctx
            .run(query.fetch_one(&self.pool))
            .await?
            .map_err(map_write_error)?;

        debug!("User created in database");
        Ok(user)
    }

    #[instrument(skip(self, ctx))]
    async fn find_one(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<User, RepositoryError> {
        let predicate = filter.predicate()?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        predicate.push_where(&mut builder);
        builder.push(" LIMIT 1");

        let query = builder.build_query_as::<User>();
        ctx.run(query.fetch_optional(&self.pool))
            .await??
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, ctx))]
    async fn find(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<Vec<User>, RepositoryError> {
        let predicate = filter.predicate()?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        predicate.push_where(&mut builder);

        let query = builder.build_query_as::<User>();
        let users = ctx.run(query.fetch_all(&self.pool)).await??;
        if users.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(users)
    }

    #[instrument(skip(self, ctx, update))]
    async fn update(
        &self,
        ctx: &RequestContext,
        update: &UserUpdateAttrs,
        filter: &UserFilterAttrs,
    ) -> Result<User, RepositoryError> {
        let predicate = filter.predicate()?;
        let assignments = update.assignments()?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users");
        assignments.push_set(&mut builder);
        predicate.push_where(&mut builder);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let query = builder.build_query_as::<User>();
        let updated = ctx
            .run(query.fetch_all(&self.pool))
            .await?
            .map_err(map_write_error)?;

        let first = updated.into_iter().next().ok_or(RepositoryError::NotFound)?;
        debug!(user_id = %first.id, "User updated in database");
        Ok(first)
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, filter: &UserFilterAttrs) -> Result<(), RepositoryError> {
        let predicate = filter.predicate()?;

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM users");
        predicate.push_where(&mut builder);

        let result = ctx.run(builder.build().execute(&self.pool)).await??;
        if result.rows_affected() == 0 {
            warn!("User not found for deletion in database");
            return Err(RepositoryError::NotFound);
        }

        debug!(removed = result.rows_affected(), "Users deleted from database");
        Ok(())
    }
}
