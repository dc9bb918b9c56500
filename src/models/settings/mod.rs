// Settings module
// Layered configuration: compiled defaults < persisted settings < caller
// overrides, merged once at construction into an immutable config.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::role::{Role, RoleCatalog};

/// Calendar view modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Month,
    Week,
    /// Date-agnostic recurring-week grid used for schedule authoring.
    Template,
}

impl ViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Month => "month",
            ViewType::Week => "week",
            ViewType::Template => "template",
        }
    }
}

impl Default for ViewType {
    fn default() -> Self {
        ViewType::Month
    }
}

/// The subset of settings written to the local settings store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_view: Option<ViewType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_roles: Option<Vec<String>>,
}

impl PersistedSettings {
    pub fn is_empty(&self) -> bool {
        self.current_view.is_none() && self.visible_roles.is_none()
    }
}

/// Caller-supplied construction options; every field optional.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub view: Option<ViewType>,
    pub reference_date: Option<NaiveDate>,
    pub visible_roles: Option<Vec<String>>,
    pub roles: Option<Vec<Role>>,
    pub read_only: Option<bool>,
    pub persist_settings: Option<bool>,
    /// IANA zone name; absent means system local.
    pub timezone: Option<String>,
    pub events_url: Option<String>,
    pub team: Option<String>,
    pub user: Option<String>,
    pub first_day_of_week: Option<u32>,
    pub template_row_count: Option<usize>,
}

/// Fully resolved, immutable calendar configuration.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub view: ViewType,
    pub reference_date: Option<NaiveDate>,
    pub visible_roles: Vec<String>,
    pub roles: RoleCatalog,
    pub read_only: bool,
    pub persist_settings: bool,
    pub timezone: Option<String>,
    pub events_url: Option<String>,
    pub team: Option<String>,
    pub user: Option<String>,
    pub first_day_of_week: u32,
    pub template_row_count: usize,
    pub event_height: f32,
    pub modal_width: f32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        let roles = RoleCatalog::default();
        let visible_roles = roles.names();
        Self {
            view: ViewType::Month,
            reference_date: None,
            visible_roles,
            roles,
            read_only: false,
            persist_settings: true,
            timezone: None,
            events_url: None,
            team: None,
            user: None,
            first_day_of_week: 0,
            template_row_count: 2,
            event_height: 22.0,
            modal_width: 400.0,
        }
    }
}

impl CalendarConfig {
    /// Merge the three configuration layers. Explicit overrides win over
    /// persisted settings, which win over compiled defaults.
    pub fn resolve(persisted: Option<&PersistedSettings>, overrides: ConfigOverrides) -> Self {
        let mut config = Self::default();

        if let Some(persisted) = persisted {
            if let Some(view) = persisted.current_view {
                config.view = view;
            }
            if let Some(roles) = &persisted.visible_roles {
                config.visible_roles = roles.clone();
            }
        }

        if let Some(roles) = overrides.roles {
            config.roles = RoleCatalog::new(roles);
            // visible roles follow the catalogue unless set explicitly below
            if overrides.visible_roles.is_none() {
                config.visible_roles = config.roles.names();
            }
        }
        if let Some(view) = overrides.view {
            config.view = view;
        }
        if let Some(visible) = overrides.visible_roles {
            config.visible_roles = visible;
        }
        if let Some(read_only) = overrides.read_only {
            config.read_only = read_only;
        }
        if let Some(persist) = overrides.persist_settings {
            config.persist_settings = persist;
        }
        if let Some(first_day) = overrides.first_day_of_week {
            config.first_day_of_week = first_day % 7;
        }
        if let Some(rows) = overrides.template_row_count {
            config.template_row_count = rows.max(1);
        }
        config.reference_date = overrides.reference_date;
        config.timezone = overrides.timezone;
        config.events_url = overrides.events_url;
        config.team = overrides.team;
        config.user = overrides.user;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalendarConfig::default();
        assert_eq!(config.view, ViewType::Month);
        assert!(!config.read_only);
        assert!(config.persist_settings);
        assert_eq!(
            config.visible_roles,
            vec!["primary", "secondary", "vacation"]
        );
    }

    #[test]
    fn test_persisted_layer_overrides_defaults() {
        let persisted = PersistedSettings {
            current_view: Some(ViewType::Week),
            visible_roles: Some(vec!["primary".to_string()]),
        };
        let config = CalendarConfig::resolve(Some(&persisted), ConfigOverrides::default());
        assert_eq!(config.view, ViewType::Week);
        assert_eq!(config.visible_roles, vec!["primary"]);
    }

    #[test]
    fn test_explicit_overrides_win_over_persisted() {
        let persisted = PersistedSettings {
            current_view: Some(ViewType::Week),
            visible_roles: None,
        };
        let overrides = ConfigOverrides {
            view: Some(ViewType::Template),
            read_only: Some(true),
            ..Default::default()
        };
        let config = CalendarConfig::resolve(Some(&persisted), overrides);
        assert_eq!(config.view, ViewType::Template);
        assert!(config.read_only);
    }

    #[test]
    fn test_role_override_refreshes_visible_roles() {
        use crate::models::role::Role;
        let overrides = ConfigOverrides {
            roles: Some(vec![Role::new("oncall", 1), Role::new("shadow", 2)]),
            ..Default::default()
        };
        let config = CalendarConfig::resolve(None, overrides);
        assert_eq!(config.visible_roles, vec!["oncall", "shadow"]);
    }

    #[test]
    fn test_view_type_serde_names() {
        assert_eq!(serde_json::to_string(&ViewType::Month).unwrap(), "\"month\"");
        let parsed: ViewType = serde_json::from_str("\"template\"").unwrap();
        assert_eq!(parsed, ViewType::Template);
    }
}
