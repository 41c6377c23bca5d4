//! User registration and lookup service

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    auth_config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            repository,
            auth_config,
        }
    }

    /// Register a student (keyed by matricula) or an administrator
    /// (keyed by name, gated on the shared secret).
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        match request.role {
            Role::Student => {
                let matricula = request.matricula.as_deref().ok_or_else(|| {
                    AppError::Validation("Students must provide a matricula".to_string())
                })?;

                if self.repository.users.matricula_exists(matricula).await? {
                    return Err(AppError::Conflict(
                        "A student with this matricula is already registered".to_string(),
                    ));
                }
            }
            Role::Admin => {
                let key = request.admin_key.as_deref().unwrap_or_default();
                if key != self.auth_config.admin_secret_key {
                    return Err(AppError::Authorization(
                        "Invalid administrator key".to_string(),
                    ));
                }

                if self.repository.users.admin_name_exists(&request.name).await? {
                    return Err(AppError::Conflict(
                        "An administrator with this name already exists".to_string(),
                    ));
                }
            }
        }

        let user = User {
            id: Uuid::new_v4(),
            name: request.name,
            role: request.role,
            // Admins carry no matricula even if one was sent
            matricula: match request.role {
                Role::Student => request.matricula,
                Role::Admin => None,
            },
            password: request.password,
        };

        self.repository.users.create(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(user)
    }

    /// Look a user up by matricula or name. The stored password is not
    /// checked; identity lookup is all the original flow does.
    pub async fn login(&self, identifier: &str) -> AppResult<User> {
        self.repository
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("No user matches this identifier".to_string()))
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }
}
