use crate::handlers::auth::Claims;
use crate::handlers::errors::ApiError;
use crate::models::all_models::Role;
use actix_web::{HttpMessage, HttpRequest};
use log::warn;

/// A named set of roles; holding any one of them satisfies the policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub name: &'static str,
    pub allowed_roles: &'static [Role],
}

pub const ADMIN_USERS: Policy = Policy {
    name: "AdminUsers",
    allowed_roles: &[Role::Admin],
};

pub const ALL_USERS: Policy = Policy {
    name: "AllUsers",
    allowed_roles: &[Role::Admin, Role::User],
};

impl Policy {
    pub fn admits(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.allowed_roles.contains(role))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Pure decision for a request. No claims means nothing was authenticated.
pub fn authorize(claims: Option<&Claims>, policy: &Policy) -> Decision {
    match claims {
        Some(claims) if policy.admits(&claims.roles) => Decision::Allow,
        _ => Decision::Deny,
    }
}

//Ensure Policy Helper Function
// Unauthenticated requests get 401, authenticated ones lacking a role get 403.
pub fn require_policy(req: &HttpRequest, policy: &Policy) -> Result<Claims, ApiError> {
    let Some(claims) = req.extensions().get::<Claims>().cloned() else {
        return Err(ApiError::Unauthorized);
    };

    match authorize(Some(&claims), policy) {
        Decision::Allow => Ok(claims),
        Decision::Deny => {
            warn!(
                "Policy {} denied '{}' with roles {:?}",
                policy.name, claims.username, claims.roles
            );
            Err(ApiError::Forbidden)
        }
    }
}
