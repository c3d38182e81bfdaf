#![forbid(unsafe_code)]

use crate::error::CallableError;
use hub_core::identity::CallerIdentity;
use std::collections::BTreeSet;

pub(crate) const DEFAULT_PUBLISHER_ROLES: &[&str] = &["admin", "editor"];

/// Per-invocation context handed to every callable.
#[derive(Clone, Debug)]
pub(crate) struct CallContext {
    pub(crate) caller: Option<CallerIdentity>,
    pub(crate) now_ms: i64,
}

impl CallContext {
    pub(crate) fn require_caller(&self) -> Result<&CallerIdentity, CallableError> {
        self.caller.as_ref().ok_or_else(|| {
            CallableError::Unauthenticated(
                "The function must be called while authenticated".to_string(),
            )
        })
    }
}

/// Decides whether an authenticated identity may publish news.
pub(crate) trait Authorizer: Send {
    fn may_publish(&self, caller: &CallerIdentity) -> bool;
}

#[derive(Clone, Debug)]
pub(crate) struct RoleAuthorizer {
    roles: BTreeSet<String>,
}

impl RoleAuthorizer {
    pub(crate) fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = roles
            .into_iter()
            .map(|role| role.as_ref().trim().to_ascii_lowercase())
            .filter(|role| !role.is_empty())
            .collect();
        Self { roles }
    }
}

impl Default for RoleAuthorizer {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISHER_ROLES)
    }
}

impl Authorizer for RoleAuthorizer {
    fn may_publish(&self, caller: &CallerIdentity) -> bool {
        caller.role().is_some_and(|role| self.roles.contains(role))
    }
}

pub(crate) fn require_publisher<'a>(
    authorizer: &dyn Authorizer,
    ctx: &'a CallContext,
) -> Result<&'a CallerIdentity, CallableError> {
    let caller = ctx.require_caller()?;
    if !authorizer.may_publish(caller) {
        return Err(CallableError::PermissionDenied(
            "Caller is not allowed to publish news".to_string(),
        ));
    }
    Ok(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(caller: Option<CallerIdentity>) -> CallContext {
        CallContext { caller, now_ms: 0 }
    }

    #[test]
    fn publishers_need_a_listed_role() {
        let authorizer = RoleAuthorizer::default();
        let editor = CallerIdentity::try_new("u1", Some("Editor".to_string())).unwrap();
        let student = CallerIdentity::try_new("u2", Some("student".to_string())).unwrap();
        let no_role = CallerIdentity::try_new("u3", None).unwrap();

        assert!(require_publisher(&authorizer, &ctx(Some(editor))).is_ok());
        assert_eq!(
            require_publisher(&authorizer, &ctx(Some(student))).unwrap_err().code(),
            "PERMISSION_DENIED"
        );
        assert_eq!(
            require_publisher(&authorizer, &ctx(Some(no_role))).unwrap_err().code(),
            "PERMISSION_DENIED"
        );
        assert_eq!(
            require_publisher(&authorizer, &ctx(None)).unwrap_err().code(),
            "UNAUTHENTICATED"
        );
    }

    #[test]
    fn configured_roles_replace_defaults() {
        let authorizer = RoleAuthorizer::new([" Staff "]);
        let staff = CallerIdentity::try_new("u1", Some("staff".to_string())).unwrap();
        let admin = CallerIdentity::try_new("u2", Some("admin".to_string())).unwrap();
        assert!(authorizer.may_publish(&staff));
        assert!(!authorizer.may_publish(&admin));
    }
}
