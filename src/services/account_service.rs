use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use opentelemetry::{global, metrics::Counter};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
    logout_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("fugue-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            logout_total: meter
                .u64_counter("auth_logout_total")
                .with_description("Total number of logouts")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    auth_service: AuthService,
    metrics: Metrics,
}

impl AccountService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository, auth_service: AuthService) -> Self {
        Self { pool, user_repo, auth_service, metrics: Metrics::new() }
    }

    /// Creates an account from a validated registration.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the username or email is taken.
    #[tracing::instrument(skip(self, new_user), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let mut conn = self.pool.acquire().await?;

        if self.user_repo.username_exists(&mut conn, &new_user.username).await? {
            return Err(AppError::Conflict("This username is already taken. Please choose a different one.".into()));
        }
        if self.user_repo.email_exists(&mut conn, &new_user.email).await? {
            return Err(AppError::Conflict(
                "This email is already registered. Please use a different one or log in.".into(),
            ));
        }

        let password_hash = self.auth_service.hash_password(&new_user.password).await?;
        let user = self.user_repo.create(&mut conn, &new_user.username, &new_user.email, &password_hash).await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(user)
    }

    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let Some(user) = self.user_repo.find_by_email(&mut conn, email.trim()).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(AppError::InvalidCredentials);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.auth_service.verify_password(password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::warn!("Login failed: account inactive");
            return Err(AppError::InvalidCredentials);
        }

        self.user_repo.record_login(&mut conn, user.id).await?;
        let session = self.auth_service.create_session(user.id)?;

        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[]);

        Ok(session)
    }

    /// Access tokens are stateless; logging out only records the event and the client discards its token.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub fn logout(&self, user_id: Uuid) {
        tracing::info!("User logged out");
        self.metrics.logout_total.add(1, &[]);
    }
}
