//! Session and Till Guard
//!
//! Tracks who is logged in and whether they have a till open. Sale building
//! and checkout require both; a cashier cannot log out while their till is
//! still open.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{Role, User, UserId},
    ids::TypedId,
};

/// Till Session ID
pub type TillSessionId = TypedId<TillSession>;

/// Errors raised by session and till operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Nobody is logged in.
    #[error("no user is logged in")]
    NotLoggedIn,

    /// The operation requires an open till.
    #[error("no till is open")]
    NoOpenTill,

    /// Only one till may be open at a time.
    #[error("a till is already open since {0}")]
    TillAlreadyOpen(Timestamp),

    /// A cashier must close their till before logging out.
    #[error("the till must be closed before logging out")]
    TillStillOpen,

    /// Opening amounts must be non-negative.
    #[error("invalid initial amount: {0}")]
    InvalidAmount(Decimal),
}

/// An open till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TillSession {
    /// Till session ID
    pub id: TillSessionId,

    /// Cashier who opened the till.
    pub cashier_id: UserId,

    /// When the till was opened.
    pub start_time: Timestamp,

    /// Float counted into the drawer on opening.
    pub initial_amount: Decimal,
}

/// Logged-in user and their till.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<User>,
    till: Option<TillSession>,
}

impl Session {
    /// Rebuild a session from persisted state. A till without a user, or one
    /// that belongs to another user, is dropped.
    pub fn restore(user: Option<User>, till: Option<TillSession>) -> Self {
        let till = till.filter(|till| {
            user.as_ref()
                .is_some_and(|user| user.id == till.cashier_id)
        });

        Session { user, till }
    }

    /// Logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Open till, if any.
    pub fn till(&self) -> Option<&TillSession> {
        self.till.as_ref()
    }

    /// Log `user` in, replacing any previous user and till.
    pub fn login(&mut self, user: User) {
        self.user = Some(user);
        self.till = None;
    }

    /// Log the current user out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TillStillOpen`] if a cashier still has a till
    /// open.
    pub fn logout(&mut self) -> Result<Option<User>, SessionError> {
        let cashier_with_till = self
            .user
            .as_ref()
            .is_some_and(|user| user.role == Role::Cashier)
            && self.till.is_some();

        if cashier_with_till {
            return Err(SessionError::TillStillOpen);
        }

        self.till = None;

        Ok(self.user.take())
    }

    /// Open a till for the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if nobody is logged in, a till is already
    /// open, or the amount is negative.
    pub fn open_till(
        &mut self,
        initial_amount: Decimal,
        now: Timestamp,
    ) -> Result<&TillSession, SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotLoggedIn)?;

        if let Some(till) = &self.till {
            return Err(SessionError::TillAlreadyOpen(till.start_time));
        }

        if initial_amount < Decimal::ZERO {
            return Err(SessionError::InvalidAmount(initial_amount));
        }

        let till = self.till.insert(TillSession {
            id: TillSessionId::generate(),
            cashier_id: user.id.clone(),
            start_time: now,
            initial_amount,
        });

        Ok(till)
    }

    /// Close the open till, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoOpenTill`] if no till is open.
    pub fn close_till(&mut self) -> Result<TillSession, SessionError> {
        self.till.take().ok_or(SessionError::NoOpenTill)
    }

    /// The user and till a sale will be recorded against.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] unless a user is logged in with an open
    /// till.
    pub fn require_till(&self) -> Result<(&User, &TillSession), SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let till = self.till.as_ref().ok_or(SessionError::NoOpenTill)?;

        Ok((user, till))
    }
}
