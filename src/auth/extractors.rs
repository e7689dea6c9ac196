//! Role extractors.
//!
//! Handlers declare the role they need by taking one of these as an argument.
//! Each resolves the session's `Claims` (placed by `AuthMiddleware`) into the
//! current auth user and, where needed, its profile. A caller without the role
//! is redirected, never handed a raw denial.

use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::auth::{login_location, Claims, SIGNUP_PATH, STAFF_DASHBOARD_PATH};
use crate::error::AppError;
use crate::models::intern::INTERN_COLUMNS;
use crate::models::user::AUTH_USER_COLUMNS;
use crate::models::{AuthUser, Intern};

/// An auth user with a linked intern profile.
#[derive(Debug, Clone)]
pub struct CurrentIntern {
    pub user: AuthUser,
    pub intern: Intern,
}

/// An auth user with `is_staff`.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub user: AuthUser,
}

/// An auth user with `is_superuser`.
#[derive(Debug, Clone)]
pub struct SuperUser {
    pub user: AuthUser,
}

impl FromRequest for CurrentIntern {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = Session::from(req);
        Box::pin(async move {
            let user = session.load_user().await?;
            let intern = sqlx::query_as::<_, Intern>(&format!(
                "SELECT {} FROM interns WHERE user_id = $1",
                INTERN_COLUMNS
            ))
            .bind(user.id)
            .fetch_optional(session.pool()?)
            .await
            .map_err(AppError::from)?;

            match intern {
                Some(intern) => Ok(CurrentIntern { user, intern }),
                None => Err(AppError::redirect(
                    SIGNUP_PATH,
                    "Please complete intern signup to use the intern dashboard.",
                )
                .into()),
            }
        })
    }
}

impl FromRequest for StaffUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = Session::from(req);
        Box::pin(async move {
            let user = session.load_user().await?;
            if user.is_staff || user.is_superuser {
                Ok(StaffUser { user })
            } else {
                log::warn!("User {} refused staff access to {}", user.id, session.path);
                Err(AppError::redirect(
                    login_location(&session.path),
                    "Staff access is required for this page.",
                )
                .into())
            }
        })
    }
}

impl FromRequest for SuperUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = Session::from(req);
        Box::pin(async move {
            let user = session.load_user().await?;
            if user.is_superuser {
                Ok(SuperUser { user })
            } else {
                log::warn!("User {} refused superuser access to {}", user.id, session.path);
                Err(AppError::redirect(
                    STAFF_DASHBOARD_PATH,
                    "Only superusers can manage user accounts.",
                )
                .into())
            }
        })
    }
}

/// What an extractor needs from the request, detached from its lifetime.
struct Session {
    user_id: Option<i32>,
    pool: Option<web::Data<PgPool>>,
    path: String,
}

impl From<&HttpRequest> for Session {
    fn from(req: &HttpRequest) -> Self {
        Session {
            user_id: req.extensions().get::<Claims>().map(|claims| claims.sub),
            pool: req.app_data::<web::Data<PgPool>>().cloned(),
            path: requested_target(req),
        }
    }
}

impl Session {
    fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .as_ref()
            .map(|data| data.get_ref())
            .ok_or_else(|| AppError::InternalServerError("Database pool not configured".into()))
    }

    async fn load_user(&self) -> Result<AuthUser, AppError> {
        let user_id = self.user_id.ok_or_else(|| login_redirect(&self.path))?;
        let user = sqlx::query_as::<_, AuthUser>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND is_active",
            AUTH_USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;

        // A deleted or deactivated account is treated as logged out.
        user.ok_or_else(|| login_redirect(&self.path))
    }
}

fn login_redirect(target: &str) -> AppError {
    AppError::redirect(login_location(target), "Please log in to continue.")
}

/// Path plus query string, so a redirect back keeps the caller's filters.
fn requested_target(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}
