//! Fixed vocabularies with distinct configuration and wire spellings
//!
//! Each term has a snake_case configuration token and a wire form
//! `{"adt_type": "<lowercase name>"}`. Unknown tokens are rejected in both
//! directions.

use anaml_core::resource::{Attributes, Value};
use serde::{Deserialize, Serialize};

use crate::codec::string_list;
use crate::error::MapError;

macro_rules! define_vocabulary {
    ($(#[$meta:meta])* $name:ident, $label:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(tag = "adt_type", rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Configuration token
            pub fn token(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            pub fn from_token(token: &str) -> Result<Self, MapError> {
                match token {
                    $($token => Ok($name::$variant),)+
                    _ => Err(MapError::UnknownToken {
                        vocabulary: $label,
                        token: token.to_string(),
                        expected: Self::tokens(),
                    }),
                }
            }

            pub fn tokens() -> Vec<&'static str> {
                vec![$($token),+]
            }
        }
    };
}

define_vocabulary!(
    /// Permission granted to a user or group
    Role, "role", {
        AdminAttributes => "admin_attributes",
        AdminBranchPerms => "admin_branch_perms",
        AdminGroups => "admin_groups",
        AdminProjects => "admin_projects",
        AdminSchedules => "admin_schedules",
        AdminSystem => "admin_system",
        AdminUsers => "admin_users",
        AdminWebhooks => "admin_webhooks",
        Author => "author",
        EditProjects => "edit_projects",
        RunCaching => "run_caching",
        RunEventStore => "run_event_store",
        RunFeaturegen => "run_featuregen",
        RunMonitoring => "run_monitoring",
        SuperUser => "super_user",
        ViewReports => "view_reports",
    }
);

define_vocabulary!(
    /// Object kind an attribute restriction applies to
    AttributeTarget, "attribute target", {
        Cluster => "cluster",
        Destination => "destination",
        Entity => "entity",
        EntityMapping => "entity_mapping",
        Feature => "feature",
        FeatureSet => "feature_set",
        FeatureStore => "feature_store",
        Source => "source",
        Table => "table",
    }
);

define_vocabulary!(
    /// Aggregation function of an event feature; the token is the wire tag
    Aggregate, "aggregation", {
        Sum => "sum",
        Count => "count",
        CountDistinct => "countdistinct",
        Avg => "avg",
        Std => "std",
        Min => "min",
        Max => "max",
        MinBy => "minby",
        MaxBy => "maxby",
        First => "first",
        Last => "last",
        PercentageChange => "percentagechange",
        AbsoluteChange => "absolutechange",
        StandardScore => "standardscore",
        BasketSum => "basketsum",
        BasketCount => "basketcount",
        BasketMax => "basketmax",
        BasketMin => "basketmin",
        BasketFirst => "basketfirst",
        BasketLast => "basketlast",
        CollectList => "collectlist",
        CollectSet => "collectset",
        CollectLastSet => "collectlastset",
    }
);

/// Decode a set of role tokens
pub fn roles(attrs: &Attributes, field: &str) -> Result<Vec<Role>, MapError> {
    string_list(attrs, field)?
        .iter()
        .map(|token| Role::from_token(token))
        .collect()
}

pub fn roles_to_set(roles: &[Role]) -> Value {
    Value::Set(roles.iter().map(|r| Value::string(r.token())).collect())
}

pub fn attribute_targets(attrs: &Attributes, field: &str) -> Result<Vec<AttributeTarget>, MapError> {
    string_list(attrs, field)?
        .iter()
        .map(|token| AttributeTarget::from_token(token))
        .collect()
}

pub fn attribute_targets_to_set(targets: &[AttributeTarget]) -> Value {
    Value::Set(targets.iter().map(|t| Value::string(t.token())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_role_round_trips() {
        for role in Role::ALL {
            assert_eq!(Role::from_token(role.token()).unwrap(), *role);
            let wire = serde_json::to_value(role).unwrap();
            let back: Role = serde_json::from_value(wire).unwrap();
            assert_eq!(back, *role);
        }
        assert_eq!(Role::ALL.len(), 16);
    }

    #[test]
    fn wire_spelling_drops_underscores() {
        assert_eq!(
            serde_json::to_value(Role::RunEventStore).unwrap(),
            json!({"adt_type": "runeventstore"})
        );
        assert_eq!(
            serde_json::to_value(Role::AdminBranchPerms).unwrap(),
            json!({"adt_type": "adminbranchperms"})
        );
        for role in Role::ALL {
            let wire = serde_json::to_value(role).unwrap();
            assert_eq!(wire["adt_type"], role.token().replace('_', ""));
        }
    }

    #[test]
    fn unknown_configuration_token_fails() {
        match Role::from_token("root") {
            Err(MapError::UnknownToken { vocabulary, token, expected }) => {
                assert_eq!(vocabulary, "role");
                assert_eq!(token, "root");
                assert_eq!(expected.len(), 16);
            }
            other => panic!("Expected UnknownToken, got {:?}", other),
        }
    }

    #[test]
    fn unknown_wire_role_fails() {
        let err = serde_json::from_value::<Role>(json!({"adt_type": "runevent_store"})).unwrap_err();
        assert!(matches!(
            MapError::from_wire(err),
            MapError::UnknownVariantTag { .. }
        ));
    }

    #[test]
    fn attribute_targets_use_snake_tokens() {
        assert_eq!(
            AttributeTarget::from_token("feature_set").unwrap(),
            AttributeTarget::FeatureSet
        );
        assert_eq!(
            serde_json::to_value(AttributeTarget::FeatureSet).unwrap(),
            json!({"adt_type": "featureset"})
        );
    }
}
