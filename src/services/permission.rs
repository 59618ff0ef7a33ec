//! Role-based authorization checks, centralized so every handler and
//! service answers "may this actor do that" the same way.

use crate::models::{AlertModel, UserModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Ambassador,
    Admin,
}

impl Role {
    /// Unknown role strings degrade to the least-privileged role.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Self::Admin,
            "ambassador" => Self::Ambassador,
            _ => Self::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ambassador => "ambassador",
            Self::Admin => "admin",
        }
    }

    pub fn is_valid(raw: &str) -> bool {
        matches!(raw, "user" | "ambassador" | "admin")
    }
}

pub fn role_of(user: &UserModel) -> Role {
    Role::parse(&user.role)
}

fn is_elevated(user: &UserModel) -> bool {
    matches!(role_of(user), Role::Ambassador | Role::Admin)
}

/// The reporter may edit their own alert; ambassadors and admins may edit
/// anyone's.
pub fn can_edit_alert(actor: &UserModel, alert: &AlertModel) -> bool {
    alert.reported_by == Some(actor.id) || is_elevated(actor)
}

pub fn can_delete_alert(actor: &UserModel, alert: &AlertModel) -> bool {
    can_edit_alert(actor, alert)
}

/// Archival is a moderation action; owning the alert is not enough.
pub fn can_archive_alert(actor: &UserModel) -> bool {
    is_elevated(actor)
}

/// Any authenticated account may vote.
pub fn can_vote(_actor: &UserModel) -> bool {
    true
}

/// Admins moderate anyone; ambassadors only normal users. Ambassadors may
/// never suspend admins or other ambassadors.
pub fn can_moderate_user(actor: &UserModel, target: &UserModel) -> bool {
    match role_of(actor) {
        Role::Admin => true,
        Role::Ambassador => role_of(target) == Role::User,
        Role::User => false,
    }
}

/// User listing is open to the same roles that can moderate.
pub fn can_list_users(actor: &UserModel) -> bool {
    is_elevated(actor)
}

pub fn can_assign_roles(actor: &UserModel) -> bool {
    role_of(actor) == Role::Admin
}
