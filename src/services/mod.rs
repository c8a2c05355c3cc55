pub mod lockout;
pub use lockout::{AccountState, AccountUpdate, LockoutPolicy, LoginOutcome};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AccountStatus, AuthError, AuthService, CredentialInfo, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
