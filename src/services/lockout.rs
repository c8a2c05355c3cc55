//! Failed-login counting and account lockout.
//!
//! Pure state transitions; the auth service persists the resulting
//! [`AccountUpdate`]. There is no time-based unlock: once locked, an account
//! stays locked until an administrator clears the flag.

use chrono::{DateTime, Utc};

use crate::config::LockoutConfig;

/// Lock-relevant slice of an account record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub is_active: bool,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    /// Wrong password; the account is still usable.
    InvalidPassword { attempts_remaining: u32 },
    /// Wrong password, and this attempt crossed the threshold.
    LockedOut,
    /// Rejected before verification because the account is locked.
    Locked,
    /// Rejected before verification because the account is disabled.
    Inactive,
}

impl LoginOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::InvalidPassword { .. } => "invalid_password",
            Self::LockedOut => "locked_out",
            Self::Locked => "locked",
            Self::Inactive => "inactive",
        }
    }
}

/// Fields to write back after a verified attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub failed_login_attempts: u32,
    pub is_locked: bool,
    /// Only set on success.
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: LoginOutcome,
    pub update: AccountUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from(&LockoutConfig::default())
    }
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(config: &LockoutConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts.max(1),
        }
    }
}

impl LockoutPolicy {
    /// Checks run before the password is looked at. Inactive wins over locked.
    pub const fn admit(&self, state: &AccountState) -> Result<(), LoginOutcome> {
        if !state.is_active {
            return Err(LoginOutcome::Inactive);
        }
        if state.is_locked {
            return Err(LoginOutcome::Locked);
        }
        Ok(())
    }

    /// Applies a verification result to an admitted account.
    #[must_use]
    pub fn record(&self, state: &AccountState, password_ok: bool, now: DateTime<Utc>) -> Transition {
        if password_ok {
            return Transition {
                outcome: LoginOutcome::Authenticated,
                update: AccountUpdate {
                    failed_login_attempts: 0,
                    is_locked: false,
                    last_login_at: Some(now),
                },
            };
        }

        let attempts = state.failed_login_attempts.saturating_add(1);
        let is_locked = attempts >= self.max_failed_attempts;
        let outcome = if is_locked {
            LoginOutcome::LockedOut
        } else {
            LoginOutcome::InvalidPassword {
                attempts_remaining: self.max_failed_attempts - attempts,
            }
        };

        Transition {
            outcome,
            update: AccountUpdate {
                failed_login_attempts: attempts,
                is_locked,
                last_login_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRESH: AccountState = AccountState {
        is_active: true,
        is_locked: false,
        failed_login_attempts: 0,
    };

    fn apply(state: &mut AccountState, transition: &Transition) {
        state.failed_login_attempts = transition.update.failed_login_attempts;
        state.is_locked = transition.update.is_locked;
    }

    #[test]
    fn five_failures_lock_the_account() {
        let policy = LockoutPolicy::default();
        let mut state = FRESH;
        let now = Utc::now();

        for expected_remaining in (1..5).rev() {
            assert!(policy.admit(&state).is_ok());
            let transition = policy.record(&state, false, now);
            assert_eq!(
                transition.outcome,
                LoginOutcome::InvalidPassword {
                    attempts_remaining: expected_remaining
                }
            );
            apply(&mut state, &transition);
            assert!(!state.is_locked);
        }

        let transition = policy.record(&state, false, now);
        assert_eq!(transition.outcome, LoginOutcome::LockedOut);
        apply(&mut state, &transition);
        assert_eq!(state.failed_login_attempts, 5);
        assert!(state.is_locked);

        // Correct password no longer matters.
        assert_eq!(policy.admit(&state), Err(LoginOutcome::Locked));
    }

    #[test]
    fn success_resets_counter_and_stamps_login() {
        let policy = LockoutPolicy::default();
        let state = AccountState {
            failed_login_attempts: 4,
            ..FRESH
        };
        let now = Utc::now();

        let transition = policy.record(&state, true, now);
        assert_eq!(transition.outcome, LoginOutcome::Authenticated);
        assert_eq!(transition.update.failed_login_attempts, 0);
        assert!(!transition.update.is_locked);
        assert_eq!(transition.update.last_login_at, Some(now));
    }

    #[test]
    fn failure_does_not_stamp_login() {
        let transition = LockoutPolicy::default().record(&FRESH, false, Utc::now());
        assert_eq!(transition.update.last_login_at, None);
    }

    #[test]
    fn inactive_is_rejected_even_when_locked() {
        let policy = LockoutPolicy::default();
        let state = AccountState {
            is_active: false,
            is_locked: true,
            failed_login_attempts: 5,
        };
        assert_eq!(policy.admit(&state), Err(LoginOutcome::Inactive));
    }

    #[test]
    fn configurable_threshold() {
        let policy = LockoutPolicy::from(&LockoutConfig {
            max_failed_attempts: 2,
        });
        let state = AccountState {
            failed_login_attempts: 1,
            ..FRESH
        };
        assert_eq!(
            policy.record(&state, false, Utc::now()).outcome,
            LoginOutcome::LockedOut
        );
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let policy = LockoutPolicy::from(&LockoutConfig {
            max_failed_attempts: 0,
        });
        assert_eq!(policy.max_failed_attempts, 1);
    }

    #[test]
    fn counter_saturates() {
        let state = AccountState {
            failed_login_attempts: u32::MAX,
            ..FRESH
        };
        let transition = LockoutPolicy::default().record(&state, false, Utc::now());
        assert_eq!(transition.update.failed_login_attempts, u32::MAX);
        assert!(transition.update.is_locked);
    }
}
