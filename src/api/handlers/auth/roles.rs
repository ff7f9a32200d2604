//! Roles, account statuses and the fixed capability table.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Alumni,
    Student,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::SuperAdmin, Self::Admin, Self::Alumni, Self::Student];

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "super_admin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "alumni" => Some(Self::Alumni),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Alumni => "alumni",
            Self::Student => "student",
        }
    }

    /// Capabilities granted to this role.
    #[must_use]
    pub const fn permissions(self) -> Permissions {
        match self {
            Self::SuperAdmin => Permissions {
                can_manage_institutions: true,
                can_create_users: true,
                can_manage_all_users: true,
                can_view_analytics: true,
                can_manage_system_settings: true,
                can_delete_users: true,
                can_manage_roles: true,
            },
            Self::Admin => Permissions {
                can_create_users: true,
                can_view_analytics: true,
                ..Permissions::NONE
            },
            Self::Alumni | Self::Student => Permissions::NONE,
        }
    }

    /// Human label used in access-denied messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super admin",
            Self::Admin => "Admin",
            Self::Alumni => "Alumni",
            Self::Student => "Student",
        }
    }

    /// Frontend route the client is sent to after login.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::SuperAdmin => "/super-admin/dashboard",
            Self::Admin => "/admin/dashboard",
            Self::Alumni => "/alumni/dashboard",
            Self::Student => "/student/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard for a stored role string, `/dashboard` when the role is unknown.
#[must_use]
pub fn dashboard_for(role: &str) -> &'static str {
    Role::parse(role).map_or("/dashboard", Role::dashboard_path)
}

/// Resolve a stored role string; unknown roles get no privileged access.
#[must_use]
pub fn permissions_for(role: &str) -> Permissions {
    Role::parse(role).map_or(Permissions::NONE, Role::permissions)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Inactive,
    Pending,
}

impl Status {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    pub can_manage_institutions: bool,
    pub can_create_users: bool,
    pub can_manage_all_users: bool,
    pub can_view_analytics: bool,
    pub can_manage_system_settings: bool,
    pub can_delete_users: bool,
    pub can_manage_roles: bool,
}

impl Permissions {
    pub const NONE: Self = Self {
        can_manage_institutions: false,
        can_create_users: false,
        can_manage_all_users: false,
        can_view_analytics: false,
        can_manage_system_settings: false,
        can_delete_users: false,
        can_manage_roles: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_has_every_capability() {
        let permissions = Role::SuperAdmin.permissions();
        assert!(permissions.can_manage_institutions);
        assert!(permissions.can_create_users);
        assert!(permissions.can_manage_all_users);
        assert!(permissions.can_view_analytics);
        assert!(permissions.can_manage_system_settings);
        assert!(permissions.can_delete_users);
        assert!(permissions.can_manage_roles);
    }

    #[test]
    fn admin_can_only_create_users_and_view_analytics() {
        assert_eq!(
            Role::Admin.permissions(),
            Permissions {
                can_create_users: true,
                can_view_analytics: true,
                ..Permissions::NONE
            }
        );
    }

    #[test]
    fn only_super_admin_manages_roles_or_deletes_users() {
        for role in Role::ALL {
            let permissions = role.permissions();
            let expected = role == Role::SuperAdmin;
            assert_eq!(permissions.can_manage_roles, expected, "{role}");
            assert_eq!(permissions.can_delete_users, expected, "{role}");
        }
    }

    #[test]
    fn alumni_and_students_have_nothing() {
        assert_eq!(Role::Alumni.permissions(), Permissions::NONE);
        assert_eq!(Role::Student.permissions(), Permissions::NONE);
    }

    #[test]
    fn unknown_role_resolves_to_empty_table() {
        assert_eq!(permissions_for("janitor"), Permissions::NONE);
        assert_eq!(permissions_for(""), Permissions::NONE);
        assert_eq!(permissions_for("admin"), Role::Admin.permissions());
    }

    #[test]
    fn role_strings_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("SUPER_ADMIN"), None);
    }

    #[test]
    fn dashboard_paths_follow_role() {
        assert_eq!(Role::SuperAdmin.dashboard_path(), "/super-admin/dashboard");
        assert_eq!(Role::Student.dashboard_path(), "/student/dashboard");
        assert_eq!(dashboard_for("admin"), "/admin/dashboard");
        assert_eq!(dashboard_for("ghost"), "/dashboard");
    }

    #[test]
    fn permissions_serialize_with_capability_names() -> anyhow::Result<()> {
        let value = serde_json::to_value(Role::Admin.permissions())?;
        assert_eq!(value["can_create_users"], serde_json::json!(true));
        assert_eq!(value["can_manage_roles"], serde_json::json!(false));
        assert_eq!(value.as_object().map(serde_json::Map::len), Some(7));
        Ok(())
    }
}
