//! Permission string parsing and access checks.
//!
//! The backend hands out a compact rights string such as
//! `"[101]100,[108]110"`: one `[moduleId]XYZ` tuple per module the user has
//! any rights on, where `X`, `Y` and `Z` are the add, edit and delete bits.
//! The string is parsed once into [`AccessRights`]; checks afterwards are
//! map lookups.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static TUPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]([0-9]{3})").expect("static regex"));

/// Module identifier as it appears between the brackets.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        ModuleId(s.trim().to_string())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module ids of the console screens.
pub mod modules {
    pub const MIQAAT: &str = "101";
    pub const TEAM: &str = "102";
    pub const VENUE: &str = "103";
    pub const LOCATION: &str = "104";
    pub const ROLE: &str = "105";
    pub const MEMBER: &str = "106";
    pub const JAMAAT: &str = "107";
    pub const DUTY: &str = "108";
    pub const INCHARGE: &str = "109";
    pub const REPORTS: &str = "110";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Delete => "delete",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub has_access: bool,
}

impl Permission {
    pub const NONE: Permission = Permission { can_add: false, can_edit: false, can_delete: false, has_access: false };
    pub const ALL: Permission = Permission { can_add: true, can_edit: true, can_delete: true, has_access: true };

    fn from_bits(bits: &[u8]) -> Self {
        Permission {
            can_add: bits[0] == b'1',
            can_edit: bits[1] == b'1',
            can_delete: bits[2] == b'1',
            has_access: true,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.has_access,
            Action::Add => self.can_add,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }
}

/// Typed form of the rights string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessRights {
    admin: bool,
    modules: BTreeMap<ModuleId, Permission>,
}

impl AccessRights {
    /// Never fails: text that is not a `[id]ddd` tuple is skipped.
    pub fn parse(raw: &str) -> Self {
        let mut modules = BTreeMap::new();
        for cap in TUPLE.captures_iter(raw) {
            let id = ModuleId::from(&cap[1]);
            modules.entry(id).or_insert_with(|| Permission::from_bits(cap[2].as_bytes()));
        }
        log::debug!("parsed rights for {} module(s)", modules.len());
        AccessRights { admin: false, modules }
    }

    pub fn admin() -> Self {
        AccessRights { admin: true, modules: BTreeMap::new() }
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn permission(&self, module: &str) -> Permission {
        if self.admin {
            return Permission::ALL;
        }
        self.modules.get(&ModuleId::from(module)).copied().unwrap_or(Permission::NONE)
    }

    pub fn allows(&self, module: &str, action: Action) -> bool {
        self.permission(module).allows(action)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&ModuleId, &Permission)> {
        self.modules.iter()
    }
}

/// Truthiness of the stored `is_admin` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminFlag(pub bool);

impl AdminFlag {
    pub fn from_text(raw: &str) -> Self {
        let raw = raw.trim();
        AdminFlag(raw == "1" || raw.eq_ignore_ascii_case("true"))
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => AdminFlag(*b),
            Value::Number(n) => AdminFlag(n.as_i64() == Some(1)),
            Value::String(s) => AdminFlag::from_text(s),
            _ => AdminFlag(false),
        }
    }
}

/// One-shot check straight from the raw rights string.
pub fn check_access(rights: &str, module: &str, is_admin: bool) -> Permission {
    AccessRights::parse(rights).with_admin(is_admin).permission(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bits_map_positionally() {
        let p = check_access("[108]110", "108", false);
        assert_eq!(p, Permission { can_add: true, can_edit: true, can_delete: false, has_access: true });

        let p = check_access("[101]001,[108]010", "108", false);
        assert_eq!(p, Permission { can_add: false, can_edit: true, can_delete: false, has_access: true });
    }

    #[test]
    fn all_zero_bits_still_grant_access() {
        let p = check_access("[110]000", "110", false);
        assert!(p.has_access);
        assert!(!p.can_add && !p.can_edit && !p.can_delete);
    }

    #[test]
    fn missing_module_denies_everything() {
        assert_eq!(check_access("[101]111", "108", false), Permission::NONE);
        assert_eq!(check_access("", "108", false), Permission::NONE);
        assert_eq!(check_access("[108]11", "108", false), Permission::NONE);
        assert_eq!(check_access("[108]1a1", "108", false), Permission::NONE);
    }

    #[test]
    fn module_ids_match_exactly() {
        assert_eq!(check_access("[1080]111", "108", false), Permission::NONE);
        assert_eq!(check_access("[10]111", "108", false), Permission::NONE);
    }

    #[test]
    fn tuples_are_found_anywhere_in_the_string() {
        let p = check_access("junk[108]101 trailing", "108", false);
        assert!(p.can_add && !p.can_edit && p.can_delete);
    }

    #[test]
    fn first_occurrence_wins() {
        let p = check_access("[108]100,[108]011", "108", false);
        assert!(p.can_add && !p.can_edit);
    }

    #[test]
    fn admin_overrides_any_rights_string() {
        for rights in ["", "garbage", "[108]000", "[[[", "[108]"] {
            assert_eq!(check_access(rights, "108", true), Permission::ALL);
        }
    }

    #[test]
    fn admin_flag_truthy_variants() {
        for v in [json!("true"), json!(true), json!(1), json!("1"), json!(" TRUE ")] {
            assert!(AdminFlag::from_value(&v).0, "{v} should be truthy");
        }
        for v in [json!("false"), json!(false), json!(0), json!("0"), json!(null), json!("yes")] {
            assert!(!AdminFlag::from_value(&v).0, "{v} should be falsy");
        }
    }

    #[test]
    fn allows_maps_actions_to_bits() {
        let rights = AccessRights::parse("[108]110");
        assert!(rights.allows("108", Action::View));
        assert!(rights.allows("108", Action::Add));
        assert!(rights.allows("108", Action::Edit));
        assert!(!rights.allows("108", Action::Delete));
        assert!(!rights.allows("109", Action::View));
    }
}
