//! Governance resources: users, user groups, attribute and label
//! restrictions, and webhooks

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{description, description_value};
use crate::codec::{
    Block, block_list, get_bool, get_str, identifier_list, identifiers_to_set, required_str,
    single_block,
};
use crate::error::MapError;
use crate::mapper::{ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block};
use crate::vocab::{AttributeTarget, Role, attribute_targets, attribute_targets_to_set, roles, roles_to_set};
use crate::wire::access::{
    AttributeRestriction, ChoiceDisplay, EnumChoice, GroupMember, LabelRestriction, MemberSource,
    RestrictionKind, User, UserGroup, Webhook,
};
use crate::wire::common::Subscribed;

fn role_set_schema() -> AttributeSchema {
    let tokens: Vec<&str> = Role::ALL.iter().map(|r| r.token()).collect();
    AttributeSchema::new("roles", AttributeType::Set(Box::new(AttributeType::one_of(&tokens))))
}

// =============================================================================
// Attribute Restriction
// =============================================================================

const RESTRICTION_BLOCKS: &[&str] = &["enum", "freetext", "boolean"];

pub struct AttributeRestrictionMapper;

impl ResourceMapper for AttributeRestrictionMapper {
    type Wire = AttributeRestriction;

    const TYPE_NAME: &'static str = "anaml_attribute_restriction";
    const COLLECTION: &'static str = "attribute-restriction";

    fn schema(&self) -> ResourceSchema {
        let choice = ResourceSchema::new("choice")
            .attribute(AttributeSchema::new("value", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("emoji", types::not_whitespace()))
            .attribute(AttributeSchema::new("colour", types::not_whitespace()));
        let enum_block = ResourceSchema::new("enum").attribute(AttributeSchema::new(
            "choice",
            AttributeType::block_list(choice),
        ));
        let targets: Vec<&str> = AttributeTarget::ALL.iter().map(|t| t.token()).collect();

        ResourceSchema::new(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("key", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(
                AttributeSchema::new("enum", AttributeType::single_block(enum_block))
                    .exactly_one_of(RESTRICTION_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("freetext", AttributeType::single_block(ResourceSchema::new("freetext")))
                    .exactly_one_of(RESTRICTION_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("boolean", AttributeType::single_block(ResourceSchema::new("boolean")))
                    .exactly_one_of(RESTRICTION_BLOCKS),
            )
            .attribute(AttributeSchema::new("mandatory", AttributeType::Bool))
            .attribute(AttributeSchema::new("default_value", types::not_whitespace()))
            .attribute(
                AttributeSchema::new(
                    "applies_to",
                    AttributeType::Set(Box::new(AttributeType::one_of(&targets))),
                )
                .required(),
            )
            .with_description("Governs the values an attribute key may take")
    }

    fn compose(&self, attrs: &Attributes) -> Result<AttributeRestriction, MapError> {
        Ok(AttributeRestriction {
            id: None,
            key: required_str(attrs, "key")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "attribute_restriction")?,
            mandatory: get_bool(attrs, "mandatory")?.unwrap_or(false),
            default_value: get_str(attrs, "default_value")?,
            applies_to: attribute_targets(attrs, "applies_to")?,
        })
    }

    fn flatten(&self, restriction: &AttributeRestriction) -> Result<Attributes, MapError> {
        let mut attrs = Block::new()
            .string("key", &restriction.key)
            .set("description", description_value(&restriction.description))
            .set("mandatory", Value::Bool(restriction.mandatory))
            .opt_string("default_value", restriction.default_value.as_ref())
            .set("applies_to", attribute_targets_to_set(&restriction.applies_to))
            .build();
        flatten_variant(&restriction.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for RestrictionKind {
    const BLOCKS: &'static [&'static str] = RESTRICTION_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "enum" => {
                let choices = block_list(body, "choice")?
                    .into_iter()
                    .map(|choice| {
                        let emoji = get_str(choice, "emoji")?;
                        let colour = get_str(choice, "colour")?;
                        let display = (emoji.is_some() || colour.is_some())
                            .then_some(ChoiceDisplay { emoji, colour });
                        Ok(EnumChoice {
                            value: required_str(choice, "value")?,
                            display,
                        })
                    })
                    .collect::<Result<Vec<_>, MapError>>()?;
                Ok(RestrictionKind::Enum { choices })
            }
            "freetext" => Ok(RestrictionKind::Freetext {}),
            "boolean" => Ok(RestrictionKind::Boolean {}),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            RestrictionKind::Enum { choices } => {
                let choices = choices
                    .iter()
                    .map(|choice| {
                        let display = choice.display.clone().unwrap_or_default();
                        Value::Map(
                            Block::new()
                                .string("value", &choice.value)
                                .opt_string("emoji", display.emoji.as_ref())
                                .opt_string("colour", display.colour.as_ref())
                                .build(),
                        )
                    })
                    .collect();
                ("enum", Block::new().set("choice", Value::List(choices)).build())
            }
            RestrictionKind::Freetext {} => ("freetext", Attributes::new()),
            RestrictionKind::Boolean {} => ("boolean", Attributes::new()),
        }
    }
}

// =============================================================================
// Label Restriction
// =============================================================================

pub struct LabelRestrictionMapper;

impl ResourceMapper for LabelRestrictionMapper {
    type Wire = LabelRestriction;

    const TYPE_NAME: &'static str = "anaml_label_restriction";
    const COLLECTION: &'static str = "label-restriction";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("text", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("emoji", types::not_whitespace()))
            .attribute(AttributeSchema::new("colour", types::not_whitespace()))
    }

    fn compose(&self, attrs: &Attributes) -> Result<LabelRestriction, MapError> {
        Ok(LabelRestriction {
            id: None,
            text: required_str(attrs, "text")?,
            emoji: get_str(attrs, "emoji")?,
            colour: get_str(attrs, "colour")?,
        })
    }

    fn flatten(&self, label: &LabelRestriction) -> Result<Attributes, MapError> {
        Ok(Block::new()
            .string("text", &label.text)
            .opt_string("emoji", label.emoji.as_ref())
            .opt_string("colour", label.colour.as_ref())
            .build())
    }
}

// =============================================================================
// User and User Group
// =============================================================================

pub struct UserMapper;

impl ResourceMapper for UserMapper {
    type Wire = User;

    const TYPE_NAME: &'static str = "anaml_user";
    const COLLECTION: &'static str = "user";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("name", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("email", types::not_whitespace()))
            .attribute(AttributeSchema::new("given_name", types::not_whitespace()))
            .attribute(AttributeSchema::new("surname", types::not_whitespace()))
            .attribute(role_set_schema())
    }

    fn compose(&self, attrs: &Attributes) -> Result<User, MapError> {
        Ok(User {
            id: None,
            name: required_str(attrs, "name")?,
            email: get_str(attrs, "email")?,
            given_name: get_str(attrs, "given_name")?,
            surname: get_str(attrs, "surname")?,
            roles: roles(attrs, "roles")?,
        })
    }

    fn flatten(&self, user: &User) -> Result<Attributes, MapError> {
        Ok(Block::new()
            .string("name", &user.name)
            .opt_string("email", user.email.as_ref())
            .opt_string("given_name", user.given_name.as_ref())
            .opt_string("surname", user.surname.as_ref())
            .set("roles", roles_to_set(&user.roles))
            .build())
    }
}

pub struct UserGroupMapper;

impl ResourceMapper for UserGroupMapper {
    type Wire = UserGroup;

    const TYPE_NAME: &'static str = "anaml_user_group";
    const COLLECTION: &'static str = "user-group";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("name", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(role_set_schema())
            .attribute(
                AttributeSchema::new("members", types::identifier_set())
                    .with_description("Users added to the group directly in Anaml"),
            )
            .attribute(AttributeSchema::new("external_group_id", types::not_whitespace()))
    }

    fn compose(&self, attrs: &Attributes) -> Result<UserGroup, MapError> {
        let members = identifier_list(attrs, "members")?
            .into_iter()
            .map(|user_id| GroupMember {
                user_id: Some(user_id),
                source: MemberSource::Anaml,
            })
            .collect();
        Ok(UserGroup {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            roles: roles(attrs, "roles")?,
            members,
            external_group_id: get_str(attrs, "external_group_id")?,
        })
    }

    fn flatten(&self, group: &UserGroup) -> Result<Attributes, MapError> {
        let members: Vec<i64> = group
            .members
            .iter()
            .filter(|member| member.source == MemberSource::Anaml)
            .filter_map(|member| member.user_id)
            .collect();
        Ok(Block::new()
            .string("name", &group.name)
            .set("description", description_value(&group.description))
            .set("roles", roles_to_set(&group.roles))
            .set("members", identifiers_to_set(&members))
            .opt_string("external_group_id", group.external_group_id.as_ref())
            .build())
    }
}

// =============================================================================
// Webhook
// =============================================================================

const WEBHOOK_EVENTS: &[&str] = &[
    "merge_requests",
    "merge_request_comments",
    "commits",
    "feature_store_runs",
    "monitoring_runs",
    "caching_runs",
    "materialisation_runs",
    "event_store_runs",
];

pub struct WebhookMapper;

impl ResourceMapper for WebhookMapper {
    type Wire = Webhook;

    const TYPE_NAME: &'static str = "anaml_webhook";
    const COLLECTION: &'static str = "webhook";

    fn schema(&self) -> ResourceSchema {
        WEBHOOK_EVENTS.iter().fold(
            ResourceSchema::new(Self::TYPE_NAME)
                .attribute(AttributeSchema::new("name", types::not_whitespace()).required())
                .attribute(AttributeSchema::new("description", AttributeType::String))
                .attribute(AttributeSchema::new("url", types::not_whitespace()).required()),
            |schema, event| {
                schema.attribute(
                    AttributeSchema::new(*event, AttributeType::single_block(ResourceSchema::new(*event)))
                        .with_description("Subscribe to this event when present"),
                )
            },
        )
    }

    fn compose(&self, attrs: &Attributes) -> Result<Webhook, MapError> {
        let subscribed = |event: &str| -> Result<Option<Subscribed>, MapError> {
            Ok(single_block(attrs, event)?.map(|_| Subscribed {}))
        };
        Ok(Webhook {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            url: required_str(attrs, "url")?,
            merge_requests: subscribed("merge_requests")?,
            merge_request_comments: subscribed("merge_request_comments")?,
            commits: subscribed("commits")?,
            feature_store_runs: subscribed("feature_store_runs")?,
            monitoring_runs: subscribed("monitoring_runs")?,
            caching_runs: subscribed("caching_runs")?,
            materialisation_runs: subscribed("materialisation_runs")?,
            event_store_runs: subscribed("event_store_runs")?,
        })
    }

    fn flatten(&self, webhook: &Webhook) -> Result<Attributes, MapError> {
        let subscriptions = [
            webhook.merge_requests,
            webhook.merge_request_comments,
            webhook.commits,
            webhook.feature_store_runs,
            webhook.monitoring_runs,
            webhook.caching_runs,
            webhook.materialisation_runs,
            webhook.event_store_runs,
        ];
        let block = Block::new()
            .string("name", &webhook.name)
            .set("description", description_value(&webhook.description))
            .string("url", &webhook.url);
        let block = WEBHOOK_EVENTS
            .iter()
            .zip(subscriptions)
            .fold(block, |block, (event, subscribed)| match subscribed {
                Some(_) => block.set(event, Value::block(Attributes::new())),
                None => block.set(event, Value::empty_block()),
            });
        Ok(block.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DynamicMapper;
    use serde_json::json;

    #[test]
    fn user_roles_round_trip() {
        let json = json!({
            "id": 2,
            "name": "jane",
            "email": "jane@example.com",
            "roles": [{"adt_type": "runeventstore"}, {"adt_type": "superuser"}]
        });
        let attrs = UserMapper.flatten_json(json.clone()).unwrap();
        assert_eq!(
            attrs["roles"],
            Value::Set(vec![
                Value::string("super_user"),
                Value::string("run_event_store")
            ])
        );
        assert_eq!(attrs["given_name"], Value::Null);

        let mut composed = UserMapper.compose_json(&attrs).unwrap();
        composed["id"] = json!(2);
        assert_eq!(composed, json);
        assert!(composed.get("password").is_none());
    }

    #[test]
    fn unknown_role_token_fails_compose() {
        let attrs = Block::new()
            .string("name", "bob")
            .set("roles", Value::Set(vec![Value::string("root")]))
            .build();
        assert!(matches!(
            UserMapper.compose(&attrs),
            Err(MapError::UnknownToken { vocabulary: "role", .. })
        ));
    }

    #[test]
    fn unknown_wire_role_fails_flatten() {
        let err = UserMapper
            .flatten_json(json!({"name": "bob", "roles": [{"adt_type": "owner"}]}))
            .unwrap_err();
        assert!(matches!(err, MapError::UnknownVariantTag { .. }));
    }

    #[test]
    fn group_keeps_only_anaml_members() {
        let attrs = UserGroupMapper
            .flatten_json(json!({
                "id": 6,
                "name": "analysts",
                "description": "",
                "roles": [{"adt_type": "viewreports"}],
                "members": [
                    {"userId": 1, "source": {"adt_type": "anaml"}},
                    {"userId": 2, "source": {"adt_type": "external"}}
                ],
                "externalGroupId": "okta-analysts"
            }))
            .unwrap();
        assert_eq!(attrs["members"], Value::Set(vec![Value::string("1")]));
        assert_eq!(attrs["description"], Value::Null);

        let group = UserGroupMapper.compose(&attrs).unwrap();
        assert_eq!(
            group.members,
            vec![GroupMember {
                user_id: Some(1),
                source: MemberSource::Anaml
            }]
        );
        assert_eq!(group.roles, vec![Role::ViewReports]);
    }

    #[test]
    fn enum_restriction_round_trips() {
        let json = json!({
            "id": 3,
            "key": "tier",
            "description": "Service tier",
            "adt_type": "enum",
            "choices": [
                {"value": "gold", "display": {"emoji": "🥇", "colour": "#ffd700"}},
                {"value": "silver"}
            ],
            "mandatory": true,
            "defaultValue": "silver",
            "appliesTo": [{"adt_type": "feature"}, {"adt_type": "featureset"}]
        });
        let attrs = AttributeRestrictionMapper.flatten_json(json.clone()).unwrap();
        assert_eq!(attrs["freetext"], Value::empty_block());
        assert_eq!(
            attrs["applies_to"],
            Value::Set(vec![Value::string("feature_set"), Value::string("feature")])
        );

        let mut composed = AttributeRestrictionMapper.compose_json(&attrs).unwrap();
        composed["id"] = json!(3);
        assert_eq!(composed, json);
    }

    #[test]
    fn boolean_restriction_is_an_empty_block() {
        let attrs = Block::new()
            .string("key", "pii")
            .set("boolean", Value::block(Attributes::new()))
            .set("applies_to", Value::Set(vec![Value::string("source")]))
            .build();
        let json = AttributeRestrictionMapper.compose_json(&attrs).unwrap();
        assert_eq!(json["adt_type"], "boolean");
        assert!(json.get("choices").is_none());
        assert!(AttributeRestrictionMapper.schema().validate(&attrs).is_ok());
    }

    #[test]
    fn label_restriction_round_trips() {
        let label = LabelRestriction {
            id: None,
            text: "deprecated".to_string(),
            emoji: Some("⚠️".to_string()),
            colour: None,
        };
        let attrs = LabelRestrictionMapper.flatten(&label).unwrap();
        assert_eq!(LabelRestrictionMapper.compose(&attrs).unwrap(), label);
    }

    #[test]
    fn webhook_subscriptions_follow_blocks() {
        let attrs = Block::new()
            .string("name", "notify")
            .string("url", "https://hooks.example.com/anaml")
            .set("commits", Value::block(Attributes::new()))
            .set("merge_requests", Value::empty_block())
            .build();
        let json = WebhookMapper.compose_json(&attrs).unwrap();
        assert_eq!(json["commits"], json!({}));
        assert!(json.get("mergeRequests").is_none());

        let flattened = WebhookMapper.flatten_json(json).unwrap();
        assert_eq!(flattened["commits"], Value::block(Attributes::new()));
        assert_eq!(flattened["event_store_runs"], Value::empty_block());
    }
}
