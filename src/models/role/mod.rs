// Role module
// On-call role catalogue with display/stacking priority

use std::collections::HashMap;

/// An on-call role (e.g. primary, secondary, vacation) with its stacking
/// priority. Lower display order sorts and stacks first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub display_order: i32,
}

impl Role {
    pub fn new(name: impl Into<String>, display_order: i32) -> Self {
        Self {
            name: name.into(),
            display_order,
        }
    }
}

/// Ordered role catalogue plus the derived name -> display order map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    order: HashMap<String, i32>,
}

impl RoleCatalog {
    pub fn new(roles: Vec<Role>) -> Self {
        let order = roles
            .iter()
            .map(|r| (r.name.clone(), r.display_order))
            .collect();
        Self { roles, order }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.order.contains_key(name)
    }

    /// Display order for a role name. Unknown roles sort after every
    /// catalogued role so stray data never disturbs known stacking.
    pub fn display_order(&self, name: &str) -> i32 {
        match self.order.get(name) {
            Some(order) => *order,
            None => self.max_order() + 1,
        }
    }

    fn max_order(&self) -> i32 {
        self.roles.iter().map(|r| r.display_order).max().unwrap_or(0)
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::new(vec![
            Role::new("primary", 1),
            Role::new("secondary", 2),
            Role::new("vacation", 3),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = RoleCatalog::default();
        assert_eq!(catalog.names(), vec!["primary", "secondary", "vacation"]);
        assert_eq!(catalog.display_order("primary"), 1);
        assert_eq!(catalog.display_order("vacation"), 3);
    }

    #[test]
    fn test_unknown_role_sorts_last() {
        let catalog = RoleCatalog::default();
        assert!(catalog.display_order("shadow") > catalog.display_order("vacation"));
        assert!(!catalog.contains("shadow"));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = RoleCatalog::new(vec![Role::new("manager", 5), Role::new("oncall", 1)]);
        assert!(catalog.display_order("oncall") < catalog.display_order("manager"));
        assert_eq!(catalog.display_order("unknown"), 6);
    }
}
