//! Users, groups, governance restrictions and webhooks

use serde::{Deserialize, Serialize};

use super::common::Subscribed;
use crate::vocab::{AttributeTarget, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub source: MemberSource,
}

/// How a user came to be a member of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum MemberSource {
    /// Added through Anaml itself
    Anaml,
    /// Synchronised from an external identity provider
    External,
}

/// Governs the values allowed for an attribute key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: RestrictionKind,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub applies_to: Vec<AttributeTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum RestrictionKind {
    Enum {
        #[serde(default)]
        choices: Vec<EnumChoice>,
    },
    Freetext {},
    Boolean {},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumChoice {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<ChoiceDisplay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDisplay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// Label text allowed on objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// HTTP callback; each event kind is subscribed when its marker is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_requests: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_request_comments: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_store_runs: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_runs: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caching_runs: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materialisation_runs: Option<Subscribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_store_runs: Option<Subscribed>,
}
