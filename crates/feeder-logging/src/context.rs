//! User context injection
//!
//! Thread-local storage for the acting user, so every span opened inside a
//! scope can be tagged with the user id without threading it through calls.

use std::cell::RefCell;

use feeder_core::UserId;
use uuid::Uuid;

/// User context data stored in thread-local storage
#[derive(Debug, Clone)]
pub struct UserContextData {
    /// Short form of the user id
    pub user_id: String,
    /// Unique id for this session
    pub instance_id: Uuid,
}

thread_local! {
    static USER_CONTEXT: RefCell<Option<UserContextData>> = const { RefCell::new(None) };
}

/// RAII guard for user context
///
/// Sets the user context for the current thread on creation and restores the
/// previous context (if any) on drop.
///
/// ```ignore
/// use feeder_core::UserId;
/// use feeder_logging::UserContextGuard;
///
/// let user = UserId::new("okandas");
/// let _guard = UserContextGuard::new(&user);
/// tracing::info!("Reading feed");
/// ```
pub struct UserContextGuard {
    previous: Option<UserContextData>,
}

impl UserContextGuard {
    /// Create a new user context guard with a fresh instance id
    pub fn new(user: &UserId) -> Self {
        Self::with_instance_id(user, Uuid::new_v4())
    }

    /// Create a guard with a specific instance id
    pub fn with_instance_id(user: &UserId, instance_id: Uuid) -> Self {
        let previous = USER_CONTEXT.with(|ctx| ctx.borrow().clone());

        let new_ctx = UserContextData {
            user_id: user.short_id(),
            instance_id,
        };
        USER_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(new_ctx));

        Self { previous }
    }

    /// Get the current user context (if any)
    pub fn current() -> Option<UserContextData> {
        USER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current user id (if set)
    pub fn current_user_id() -> Option<String> {
        Self::current().map(|ctx| ctx.user_id)
    }
}

impl Drop for UserContextGuard {
    fn drop(&mut self) {
        USER_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}
