/// Role-based permission gate
///
/// Maps an organizational role and a capability to allow/deny. The table is
/// built once at startup and never mutated afterwards, so lookups are pure
/// and safe to call from any number of concurrent requests.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;

/// Organizational roles recognised by the center ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    CenterManager,
    Counselor,
    Faculty,
    Accountant,
    HrManager,
    InventoryManager,
    Staff,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::CenterManager,
        Role::Counselor,
        Role::Faculty,
        Role::Accountant,
        Role::HrManager,
        Role::InventoryManager,
        Role::Staff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::CenterManager => "CENTER_MANAGER",
            Role::Counselor => "COUNSELOR",
            Role::Faculty => "FACULTY",
            Role::Accountant => "ACCOUNTANT",
            Role::HrManager => "HR_MANAGER",
            Role::InventoryManager => "INVENTORY_MANAGER",
            Role::Staff => "STAFF",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown role: {}", s))
    }
}

/// Capabilities that can be granted to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewStudents,
    CreateStudents,
    EditStudents,
    DeleteStudents,
    ViewInquiries,
    ManageInquiries,
    ViewFinance,
    ManageFinance,
    ViewHr,
    ManageHr,
    ViewInventory,
    ManageInventory,
    ManageProcurement,
    ManageWorkflows,
    ManageUsers,
    ViewReports,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::ViewStudents,
        Action::CreateStudents,
        Action::EditStudents,
        Action::DeleteStudents,
        Action::ViewInquiries,
        Action::ManageInquiries,
        Action::ViewFinance,
        Action::ManageFinance,
        Action::ViewHr,
        Action::ManageHr,
        Action::ViewInventory,
        Action::ManageInventory,
        Action::ManageProcurement,
        Action::ManageWorkflows,
        Action::ManageUsers,
        Action::ViewReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewStudents => "view_students",
            Action::CreateStudents => "create_students",
            Action::EditStudents => "edit_students",
            Action::DeleteStudents => "delete_students",
            Action::ViewInquiries => "view_inquiries",
            Action::ManageInquiries => "manage_inquiries",
            Action::ViewFinance => "view_finance",
            Action::ManageFinance => "manage_finance",
            Action::ViewHr => "view_hr",
            Action::ManageHr => "manage_hr",
            Action::ViewInventory => "view_inventory",
            Action::ManageInventory => "manage_inventory",
            Action::ManageProcurement => "manage_procurement",
            Action::ManageWorkflows => "manage_workflows",
            Action::ManageUsers => "manage_users",
            Action::ViewReports => "view_reports",
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown action: {}", s))
    }
}

/// Immutable role -> capability table
///
/// Roles missing from the table are granted nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable {
    grants: HashMap<Role, BTreeSet<Action>>,
}

impl PermissionTable {
    /// Build the standard table shipped with the service
    pub fn standard() -> Self {
        let grants = Role::ALL
            .into_iter()
            .map(|role| (role, standard_grants(role).iter().copied().collect()))
            .collect();
        Self { grants }
    }

    /// Load a table from a JSON file of the form `{ "ROLE": ["action", ...] }`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read permissions file '{}': {}", path.display(), e))?;
        let table: PermissionTable = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid permissions file '{}': {}", path.display(), e))?;
        Ok(table)
    }

    /// Whether `role` may perform `action`
    pub fn allows(&self, role: Role, action: Action) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// String-keyed variant; anything that is not a known action is denied
    pub fn allows_named(&self, role: Role, action: &str) -> bool {
        match action.parse::<Action>() {
            Ok(action) => self.allows(role, action),
            Err(_) => {
                tracing::debug!("🚫 Unknown action '{}' requested by {}", action, role.as_str());
                false
            }
        }
    }

    /// Actions granted to `role`, in a stable order
    pub fn grants(&self, role: Role) -> impl Iterator<Item = Action> + '_ {
        self.grants.get(&role).into_iter().flatten().copied()
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_grants(role: Role) -> &'static [Action] {
    use Action::*;

    match role {
        Role::SuperAdmin | Role::Admin => &Action::ALL,
        Role::CenterManager => &[
            ViewStudents,
            CreateStudents,
            EditStudents,
            ViewInquiries,
            ManageInquiries,
            ViewFinance,
            ViewHr,
            ViewInventory,
            ManageInventory,
            ManageWorkflows,
            ViewReports,
        ],
        Role::Counselor => &[
            ViewStudents,
            CreateStudents,
            EditStudents,
            ViewInquiries,
            ManageInquiries,
        ],
        Role::Faculty => &[ViewStudents],
        Role::Accountant => &[ViewStudents, ViewFinance, ManageFinance, ViewReports],
        Role::HrManager => &[ViewHr, ManageHr, ViewReports],
        Role::InventoryManager => &[ViewInventory, ManageInventory, ManageProcurement],
        Role::Staff => &[ViewStudents, ViewInquiries],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_total_and_deterministic() {
        let table = PermissionTable::standard();
        for role in Role::ALL {
            for action in Action::ALL {
                assert_eq!(table.allows(role, action), table.allows(role, action));
                assert_eq!(table.allows(role, action), table.allows_named(role, action.as_str()));
            }
        }
    }

    #[test]
    fn unknown_action_is_denied_for_every_role() {
        let table = PermissionTable::standard();
        for role in Role::ALL {
            assert!(!table.allows_named(role, "launch_rockets"));
            assert!(!table.allows_named(role, ""));
            assert!(!table.allows_named(role, "VIEW_STUDENTS"));
        }
    }

    #[test]
    fn standard_grants_match_organization() {
        let table = PermissionTable::standard();
        assert!(table.allows(Role::Counselor, Action::CreateStudents));
        assert!(table.allows(Role::SuperAdmin, Action::ManageFinance));
        assert!(!table.allows(Role::Faculty, Action::CreateStudents));
        assert!(!table.allows(Role::Staff, Action::CreateStudents));
        assert!(!table.allows(Role::Accountant, Action::ManageHr));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("counselor".parse::<Role>().unwrap(), Role::Counselor);
        assert_eq!("HR_MANAGER".parse::<Role>().unwrap(), Role::HrManager);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn table_loads_from_json_and_omitted_roles_get_nothing() {
        let path = std::env::temp_dir().join(format!("centerdesk-perms-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "STAFF": ["view_students", "create_students"] }"#).unwrap();

        let table = PermissionTable::from_json_file(&path).unwrap();
        assert!(table.allows(Role::Staff, Action::CreateStudents));
        assert!(!table.allows(Role::Admin, Action::ViewStudents));
        assert_eq!(
            table.grants(Role::Staff).collect::<Vec<_>>(),
            vec![Action::ViewStudents, Action::CreateStudents]
        );

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_action_in_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("centerdesk-perms-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "STAFF": ["fly"] }"#).unwrap();
        assert!(PermissionTable::from_json_file(&path).is_err());
        std::fs::remove_file(path).ok();
    }
}
