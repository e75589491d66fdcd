// Public API - what other modules can use
pub use errors::UserError;
pub use filter::{Assignments, FieldValue, Predicate, UserField};
pub use handlers::{delete_me, get_me, login, logout, register, update_me};
pub use login::{LoginResponse, LoginService};
pub use models::{User, UserAttrs, UserFilterAttrs, UserUpdateAttrs};
pub use password::{Argon2Hasher, HashError, PasswordHasher};
pub use register::RegisterService;
pub use repository::{InMemoryUserRepository, PostgresUserRepository, RepositoryError, UserRepository};
pub use service::{DeleteResponse, ProfileUpdate, UserService};
pub use types::{LoginRequest, RegisterRequest, UpdateRequest, UserEnvelope, UserResponse};

// Internal modules
mod errors;
mod filter;
mod handlers;
mod login;
pub mod models;
mod password;
mod register;
pub mod repository;
mod service;
mod types;
pub mod validate;
