//! Identity port. The app only ever needs a user id and a display name out of
//! the provider, so the trait stays that small.

use tracing::info;

use crate::db::{self, SharedConnection};
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::store::lock;

pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, display_name: &str) -> AppResult<User>;

    fn sign_out(&self, user: &User);
}

/// Local profiles kept in the same database as the lists.
pub struct LocalIdentity {
    conn: SharedConnection,
}

impl LocalIdentity {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl IdentityProvider for LocalIdentity {
    fn sign_in(&self, display_name: &str) -> AppResult<User> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Display name is required."));
        }
        let user =
            db::find_or_create_user(&*lock(&self.conn)?, name).map_err(AppError::from_storage)?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    fn sign_out(&self, user: &User) {
        info!(user_id = %user.id, "signed out");
    }
}
