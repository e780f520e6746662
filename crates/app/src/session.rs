//! Session Manager
//!
//! Keeps the in-memory [`Session`] and its copy in the local store in step, so
//! a restart finds the same user and till.

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;
use till::{
    catalog::User,
    session::{Session, SessionError, TillSession},
};
use tracing::info;
use zeroize::Zeroizing;

use crate::{
    backend::{ListQuery, Order},
    services::{ServiceError, UsersService},
    storage::{LocalStore, StoreError, keys},
};

/// Errors raised while changing the session.
#[derive(Debug, Error)]
pub enum SessionManagerError {
    /// The session refused the change.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No user matched the username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The user list could not be loaded.
    #[error("failed to load users: {0}")]
    Service(#[from] ServiceError),

    /// The session could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session backed by the local store.
#[derive(Debug)]
pub struct SessionManager {
    store: LocalStore,
    session: Session,
}

impl SessionManager {
    /// Load the persisted user and till.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the stored values cannot be read.
    pub fn restore(store: LocalStore) -> Result<Self, StoreError> {
        let user = store.get::<User>(keys::CURRENT_USER)?;
        let till = store.get::<TillSession>(keys::CURRENT_SESSION)?;

        let session = Session::restore(user, till);

        Ok(Self { store, session })
    }

    /// Current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in by matching `username` and `password` against the backend's
    /// user list. The stored credential is never written to the local store.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionManagerError`] if a till is still open, the user
    /// list cannot be loaded, or no user matches.
    pub async fn login(
        &mut self,
        users: &dyn UsersService,
        username: &str,
        password: &Zeroizing<String>,
    ) -> Result<&User, SessionManagerError> {
        if self.session.till().is_some() {
            return Err(SessionError::TillStillOpen.into());
        }

        let mut user = users
            .list_users(ListQuery::all(Order::asc("username")))
            .await?
            .into_iter()
            .find(|user| {
                user.username == username && user.password.as_deref() == Some(password.as_str())
            })
            .ok_or(SessionManagerError::InvalidCredentials)?;

        user.password = None;

        self.store.set(keys::CURRENT_USER, &user)?;
        self.store.remove(keys::CURRENT_SESSION)?;

        info!(user = %user.id, role = ?user.role, "logged in");

        self.session.login(user);

        self.session
            .user()
            .ok_or(SessionManagerError::Session(SessionError::NotLoggedIn))
    }

    /// Log out, forgetting the persisted user and till.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionManagerError`] if a cashier still has a till open or
    /// the store cannot be written.
    pub fn logout(&mut self) -> Result<Option<User>, SessionManagerError> {
        let user = self.session.logout()?;

        self.store.remove(keys::CURRENT_USER)?;
        self.store.remove(keys::CURRENT_SESSION)?;

        if let Some(user) = &user {
            info!(user = %user.id, "logged out");
        }

        Ok(user)
    }

    /// Open a till for the logged-in user with `initial_amount` in the
    /// drawer.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionManagerError`] if the session refuses or the till
    /// cannot be persisted.
    pub fn open_till(
        &mut self,
        initial_amount: Decimal,
    ) -> Result<&TillSession, SessionManagerError> {
        let till = self.session.open_till(initial_amount, Timestamp::now())?;

        self.store.set(keys::CURRENT_SESSION, till)?;

        info!(till = %till.id, %initial_amount, "till opened");

        Ok(till)
    }

    /// Close the open till.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionManagerError`] if no till is open or the store
    /// cannot be written.
    pub fn close_till(&mut self) -> Result<TillSession, SessionManagerError> {
        let till = self.session.close_till()?;

        self.store.remove(keys::CURRENT_SESSION)?;

        info!(till = %till.id, "till closed");

        Ok(till)
    }
}
