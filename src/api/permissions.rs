//! Privilege checks shared by the resource handlers. Reads are open to
//! everyone (including anonymous callers) and never consult this module.

use super::ApiError;
use super::auth::AuthUser;
use crate::domain::Role;

pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator privileges required"))
    }
}

/// The resource's author may edit it, as may anyone at moderator level or
/// above.
pub fn require_author_or_moderator(user: &AuthUser, author_id: i32) -> Result<(), ApiError> {
    if user.id == author_id || user.effective_role().is_at_least(Role::Moderator) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only the author or a moderator can modify this resource",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: Role, is_superuser: bool) -> AuthUser {
        AuthUser {
            id: 1,
            username: "someone".to_string(),
            role,
            is_superuser,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&user_with(Role::Admin, false)).is_ok());
        assert!(require_admin(&user_with(Role::User, true)).is_ok());
        assert!(require_admin(&user_with(Role::Moderator, false)).is_err());
        assert!(require_admin(&user_with(Role::User, false)).is_err());
    }

    #[test]
    fn test_author_may_edit_own_resource() {
        let author = user_with(Role::User, false);
        assert!(require_author_or_moderator(&author, author.id).is_ok());
    }

    #[test]
    fn test_other_plain_user_denied() {
        let user = user_with(Role::User, false);
        assert!(require_author_or_moderator(&user, user.id + 1).is_err());
    }

    #[test]
    fn test_staff_may_edit_any_resource() {
        let moderator = user_with(Role::Moderator, false);
        let admin = user_with(Role::Admin, false);
        let superuser = user_with(Role::User, true);

        assert!(require_author_or_moderator(&moderator, 99).is_ok());
        assert!(require_author_or_moderator(&admin, 99).is_ok());
        assert!(require_author_or_moderator(&superuser, 99).is_ok());
    }
}
