//! Local account screen: register, sign in, view and edit a profile.
//!
//! Users live in a single sqlite table; the logged-in flag and a snapshot of
//! the profile live in a separate key-value session store so a restart can
//! skip the login screen. Passwords are stored and compared in plaintext.

pub mod auth;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod session;
pub mod shell;
pub mod state;

pub use controller::{Controller, Mode};
pub use error::{Alert, AlertKind, AppError};
pub use state::AppState;
