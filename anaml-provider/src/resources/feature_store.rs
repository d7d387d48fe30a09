//! anaml_feature_store resource
//!
//! Schedules, retry policies, destination targets and version targets are
//! all tagged records configured as optional blocks.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{description, metadata, named_schema, with_labels};
use crate::codec::{
    Block, block_list, get_bool, get_identifier, get_int, get_str, identifier_list,
    identifier_value, identifiers_to_list, key_values, labels, required_identifier, required_str,
    single_block, string_map, string_map_value,
};
use crate::error::MapError;
use crate::mapper::{
    ResourceMapper, Variant, compose_variant, flatten_optional_variant, flatten_variant,
    require_variant, undeclared_block,
};
use crate::wire::feature_store::{
    CronSchedule, DailySchedule, DestinationReference, DestinationTarget, FeatureStore,
    KafkaFormat, RetryPolicy, Schedule, ScheduledRun, StoreKind, VersionTarget,
};

const SCHEDULE_BLOCKS: &[&str] = &["daily_schedule", "cron_schedule"];
const RETRY_BLOCKS: &[&str] = &["never_retry_policy", "fixed_retry_policy"];
const TARGET_BLOCKS: &[&str] = &["folder", "table", "topic"];
const KAFKA_FORMATS: &[&str] = &["json", "avro"];

pub struct FeatureStoreMapper;

impl ResourceMapper for FeatureStoreMapper {
    type Wire = FeatureStore;

    const TYPE_NAME: &'static str = "anaml_feature_store";
    const COLLECTION: &'static str = "feature-store";

    fn schema(&self) -> ResourceSchema {
        let daily = with_retry_policy(
            ResourceSchema::new("daily_schedule")
                .attribute(AttributeSchema::new("start_time_of_day", types::not_whitespace())),
        );
        let cron = with_retry_policy(
            ResourceSchema::new("cron_schedule")
                .attribute(AttributeSchema::new("cron_string", types::not_whitespace()).required()),
        );

        let folder = ResourceSchema::new("folder")
            .attribute(AttributeSchema::new("path", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("partitioning_enabled", AttributeType::Bool));
        let table = ResourceSchema::new("table")
            .attribute(AttributeSchema::new("name", types::not_whitespace()).required());
        let topic = ResourceSchema::new("topic")
            .attribute(AttributeSchema::new("topic", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("format", AttributeType::one_of(KAFKA_FORMATS)));
        let destination = ResourceSchema::new("destination")
            .attribute(AttributeSchema::new("destination", types::identifier()).required())
            .attribute(AttributeSchema::new("mode", AttributeType::one_of(&["append", "overwrite"])))
            .attribute(
                AttributeSchema::new("folder", AttributeType::single_block(folder))
                    .exactly_one_of(TARGET_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("table", AttributeType::single_block(table))
                    .exactly_one_of(TARGET_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("topic", AttributeType::single_block(topic))
                    .exactly_one_of(TARGET_BLOCKS),
            );

        let version_target = ResourceSchema::new("version_target")
            .attribute(
                AttributeSchema::new("commit", types::not_whitespace())
                    .exactly_one_of(&["commit", "branch"]),
            )
            .attribute(
                AttributeSchema::new("branch", types::not_whitespace())
                    .exactly_one_of(&["commit", "branch"]),
            );

        let schema = named_schema(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("feature_set", types::identifier()).required())
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool).required())
            .attribute(AttributeSchema::new("cluster", types::identifier()).required())
            .attribute(AttributeSchema::new(
                "cluster_property_sets",
                types::identifier_list(),
            ))
            .attribute(AttributeSchema::new(
                "additional_spark_properties",
                types::string_map(),
            ))
            .attribute(
                AttributeSchema::new("run_date_offset", AttributeType::Int)
                    .with_description("Days before the scheduled run date to compute features for"),
            )
            .attribute(AttributeSchema::new("principal", types::identifier()))
            .attribute(AttributeSchema::new("population", types::identifier()))
            .attribute(AttributeSchema::new("start_date", types::not_whitespace()))
            .attribute(AttributeSchema::new("end_date", types::not_whitespace()))
            .attribute(AttributeSchema::new("include_metadata", AttributeType::Bool))
            .attribute(
                AttributeSchema::new("daily_schedule", AttributeType::single_block(daily))
                    .conflicts_with(&["cron_schedule"]),
            )
            .attribute(
                AttributeSchema::new("cron_schedule", AttributeType::single_block(cron))
                    .conflicts_with(&["daily_schedule"]),
            )
            .attribute(AttributeSchema::new(
                "destination",
                AttributeType::block_list(destination),
            ))
            .attribute(AttributeSchema::new(
                "version_target",
                AttributeType::single_block(version_target),
            ));
        with_labels(schema).with_description("A scheduled job writing a feature set to destinations")
    }

    fn compose(&self, attrs: &Attributes) -> Result<FeatureStore, MapError> {
        let destinations = block_list(attrs, "destination")?
            .into_iter()
            .map(compose_destination)
            .collect::<Result<Vec<_>, _>>()?;
        let version_target = match single_block(attrs, "version_target")? {
            Some(target) => compose_version_target(target)?,
            None => None,
        };
        Ok(FeatureStore {
            id: None,
            kind: StoreKind::Batch,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
            feature_set: required_identifier(attrs, "feature_set")?,
            enabled: get_bool(attrs, "enabled")?.unwrap_or(false),
            schedule: compose_variant(attrs)?.map_or(Schedule::Never, Schedule::Scheduled),
            destinations,
            cluster: required_identifier(attrs, "cluster")?,
            cluster_property_sets: identifier_list(attrs, "cluster_property_sets")?,
            additional_spark_properties: string_map(attrs, "additional_spark_properties")?,
            run_date_offset: get_int(attrs, "run_date_offset")?,
            principal: get_identifier(attrs, "principal")?,
            population: get_identifier(attrs, "population")?,
            start_date: get_str(attrs, "start_date")?,
            end_date: get_str(attrs, "end_date")?,
            include_metadata: get_bool(attrs, "include_metadata")?.unwrap_or(false),
            version_target,
        })
    }

    fn flatten(&self, store: &FeatureStore) -> Result<Attributes, MapError> {
        let destinations = store
            .destinations
            .iter()
            .map(|reference| {
                let mut body = Block::new()
                    .set("destination", identifier_value(Some(reference.destination_id)))
                    .opt_string("mode", reference.save_mode.as_ref())
                    .build();
                flatten_variant(&reference.target, &mut body);
                Value::Map(body)
            })
            .collect();
        let version_target = match &store.version_target {
            Some(VersionTarget::Commit { commit_id }) => Value::block(
                Block::new()
                    .string("commit", commit_id)
                    .set("branch", Value::Null)
                    .build(),
            ),
            Some(VersionTarget::Branch { branch_name }) => Value::block(
                Block::new()
                    .set("commit", Value::Null)
                    .string("branch", branch_name)
                    .build(),
            ),
            None => Value::empty_block(),
        };

        let mut attrs = metadata(&store.name, &store.description, &store.labels, &store.attributes)
            .set("feature_set", identifier_value(Some(store.feature_set)))
            .set("enabled", Value::Bool(store.enabled))
            .set("cluster", identifier_value(Some(store.cluster)))
            .set(
                "cluster_property_sets",
                identifiers_to_list(&store.cluster_property_sets),
            )
            .set(
                "additional_spark_properties",
                string_map_value(&store.additional_spark_properties),
            )
            .set("run_date_offset", Value::opt_int(store.run_date_offset))
            .set("principal", identifier_value(store.principal))
            .set("population", identifier_value(store.population))
            .opt_string("start_date", store.start_date.as_ref())
            .opt_string("end_date", store.end_date.as_ref())
            .set("include_metadata", Value::Bool(store.include_metadata))
            .set("destination", Value::List(destinations))
            .set("version_target", version_target)
            .build();
        let schedule = match &store.schedule {
            Schedule::Never => None,
            Schedule::Scheduled(run) => Some(run),
        };
        flatten_optional_variant(schedule, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for ScheduledRun {
    const BLOCKS: &'static [&'static str] = SCHEDULE_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "daily_schedule" => Ok(ScheduledRun::Daily(DailySchedule {
                start_time_of_day: get_str(body, "start_time_of_day")?,
                retry_policy: compose_variant(body)?,
            })),
            "cron_schedule" => Ok(ScheduledRun::Cron(CronSchedule {
                cron_string: required_str(body, "cron_string")?,
                retry_policy: compose_variant(body)?,
            })),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            ScheduledRun::Daily(daily) => {
                let mut body = Block::new()
                    .opt_string("start_time_of_day", daily.start_time_of_day.as_ref())
                    .build();
                flatten_optional_variant(daily.retry_policy.as_ref(), &mut body);
                ("daily_schedule", body)
            }
            ScheduledRun::Cron(cron) => {
                let mut body = Block::new().string("cron_string", &cron.cron_string).build();
                flatten_optional_variant(cron.retry_policy.as_ref(), &mut body);
                ("cron_schedule", body)
            }
        }
    }
}

/// An absent retry policy block leaves the backend default in place
impl Variant for RetryPolicy {
    const BLOCKS: &'static [&'static str] = RETRY_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "never_retry_policy" => Ok(RetryPolicy::Never),
            "fixed_retry_policy" => Ok(RetryPolicy::Fixed {
                backoff: required_str(body, "backoff")?,
                max_attempts: get_int(body, "max_attempts")?
                    .ok_or_else(|| MapError::MissingAttribute("max_attempts".to_string()))?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            RetryPolicy::Never => ("never_retry_policy", Attributes::new()),
            RetryPolicy::Fixed {
                backoff,
                max_attempts,
            } => (
                "fixed_retry_policy",
                Block::new()
                    .string("backoff", backoff)
                    .set("max_attempts", Value::Int(*max_attempts))
                    .build(),
            ),
        }
    }
}

fn with_retry_policy(schedule: ResourceSchema) -> ResourceSchema {
    let fixed = ResourceSchema::new("fixed_retry_policy")
        .attribute(AttributeSchema::new("backoff", types::not_whitespace()).required())
        .attribute(AttributeSchema::new("max_attempts", types::positive_int()).required());
    schedule
        .attribute(
            AttributeSchema::new(
                "never_retry_policy",
                AttributeType::single_block(ResourceSchema::new("never_retry_policy")),
            )
            .conflicts_with(&["fixed_retry_policy"])
            .with_description("Do not retry failed runs"),
        )
        .attribute(
            AttributeSchema::new("fixed_retry_policy", AttributeType::single_block(fixed))
                .conflicts_with(&["never_retry_policy"]),
        )
}

impl Variant for DestinationTarget {
    const BLOCKS: &'static [&'static str] = TARGET_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "folder" => Ok(DestinationTarget::Folder {
                folder: required_str(body, "path")?,
                partitioning_enabled: get_bool(body, "partitioning_enabled")?,
            }),
            "table" => Ok(DestinationTarget::Table {
                table_name: required_str(body, "name")?,
            }),
            "topic" => {
                let format = match get_str(body, "format")?.as_deref() {
                    None => None,
                    Some("json") => Some(KafkaFormat::Json),
                    Some("avro") => Some(KafkaFormat::Avro),
                    Some(other) => {
                        return Err(MapError::UnknownToken {
                            vocabulary: "kafka format",
                            token: other.to_string(),
                            expected: KAFKA_FORMATS.to_vec(),
                        });
                    }
                };
                Ok(DestinationTarget::Topic {
                    topic: required_str(body, "topic")?,
                    format,
                })
            }
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            DestinationTarget::Folder {
                folder,
                partitioning_enabled,
            } => (
                "folder",
                Block::new()
                    .string("path", folder)
                    .set("partitioning_enabled", Value::opt_bool(*partitioning_enabled))
                    .build(),
            ),
            DestinationTarget::Table { table_name } => {
                ("table", Block::new().string("name", table_name).build())
            }
            DestinationTarget::Topic { topic, format } => {
                let format = format.map(|f| match f {
                    KafkaFormat::Json => "json",
                    KafkaFormat::Avro => "avro",
                });
                (
                    "topic",
                    Block::new()
                        .string("topic", topic)
                        .set("format", Value::opt_string(format))
                        .build(),
                )
            }
        }
    }
}

fn compose_destination(body: &Attributes) -> Result<DestinationReference, MapError> {
    Ok(DestinationReference {
        destination_id: required_identifier(body, "destination")?,
        target: require_variant(body, "destination")?,
        save_mode: get_str(body, "mode")?,
    })
}

fn compose_version_target(body: &Attributes) -> Result<Option<VersionTarget>, MapError> {
    if let Some(commit_id) = get_str(body, "commit")? {
        return Ok(Some(VersionTarget::Commit { commit_id }));
    }
    Ok(get_str(body, "branch")?.map(|branch_name| VersionTarget::Branch { branch_name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DynamicMapper;
    use serde_json::json;

    fn base_config() -> Block {
        Block::new()
            .string("name", "daily_customer")
            .string("feature_set", "3")
            .set("enabled", Value::Bool(true))
            .string("cluster", "1")
    }

    #[test]
    fn absent_schedule_is_never() {
        let json = FeatureStoreMapper.compose_json(&base_config().build()).unwrap();
        assert_eq!(json["adt_type"], "batch");
        assert_eq!(json["schedule"], json!({"adt_type": "never"}));
        assert_eq!(json["featureSet"], 3);
        assert!(json.get("additionalSparkProperties").is_none());
    }

    #[test]
    fn cron_schedule_with_retry_policy() {
        let retry = Block::new()
            .string("backoff", "PT5M")
            .set("max_attempts", Value::Int(3))
            .build();
        let cron = Block::new()
            .string("cron_string", "0 3 * * *")
            .set("fixed_retry_policy", Value::block(retry))
            .build();
        let attrs = base_config().set("cron_schedule", Value::block(cron)).build();
        let json = FeatureStoreMapper.compose_json(&attrs).unwrap();
        assert_eq!(
            json["schedule"],
            json!({
                "adt_type": "cron",
                "cronString": "0 3 * * *",
                "retryPolicy": {"adt_type": "fixed", "backoff": "PT5M", "maxAttempts": 3}
            })
        );
    }

    #[test]
    fn never_schedule_clears_schedule_blocks() {
        let store = FeatureStoreMapper.compose(&base_config().build()).unwrap();
        let attrs = FeatureStoreMapper.flatten(&store).unwrap();
        assert_eq!(attrs["daily_schedule"], Value::empty_block());
        assert_eq!(attrs["cron_schedule"], Value::empty_block());
        assert_eq!(FeatureStoreMapper.compose(&attrs).unwrap(), store);
    }

    #[test]
    fn destinations_round_trip() {
        let json = json!({
            "id": 8,
            "adt_type": "batch",
            "name": "daily_customer",
            "description": "Nightly export",
            "labels": ["prod"],
            "attributes": [{"key": "team", "value": "growth"}],
            "featureSet": 3,
            "enabled": true,
            "schedule": {"adt_type": "daily", "startTimeOfDay": "02:00:00"},
            "destinations": [
                {"destinationId": 4, "adt_type": "folder", "folder": "/out", "folderPartitioningEnabled": true},
                {"destinationId": 5, "adt_type": "table", "tableName": "features", "saveMode": "overwrite"},
                {"destinationId": 6, "adt_type": "topic", "topic": "customer", "format": {"adt_type": "json"}}
            ],
            "cluster": 1,
            "clusterPropertySets": [2],
            "runDateOffset": 1,
            "principal": 7,
            "includeMetadata": false,
            "versionTarget": {"adt_type": "branch", "branchName": "main"}
        });
        let attrs = FeatureStoreMapper.flatten_json(json.clone()).unwrap();
        let mut composed = FeatureStoreMapper.compose_json(&attrs).unwrap();
        composed["id"] = json!(8);
        assert_eq!(composed, json);
    }

    #[test]
    fn streaming_store_is_an_unknown_variant() {
        let err = FeatureStoreMapper
            .flatten_json(json!({
                "adt_type": "streaming",
                "name": "s",
                "featureSet": 1,
                "enabled": true,
                "schedule": {"adt_type": "never"},
                "cluster": 1
            }))
            .unwrap_err();
        assert!(matches!(err, MapError::UnknownVariantTag { .. }));
    }

    #[test]
    fn destination_requires_a_target() {
        let destination = Block::new().string("destination", "4").build();
        let attrs = base_config()
            .set("destination", Value::List(vec![Value::Map(destination)]))
            .build();
        assert!(matches!(
            FeatureStoreMapper.compose(&attrs),
            Err(MapError::NoVariantSelected { .. })
        ));
    }

    fn store_with_schedule(schedule: serde_json::Value) -> serde_json::Value {
        json!({
            "adt_type": "batch",
            "name": "daily_customer",
            "description": "",
            "labels": [],
            "attributes": [],
            "featureSet": 3,
            "enabled": true,
            "schedule": schedule,
            "destinations": [],
            "cluster": 1,
            "clusterPropertySets": [],
            "includeMetadata": false
        })
    }

    #[test]
    fn every_schedule_and_retry_policy_round_trips() {
        let retry_policies = [
            None,
            Some(json!({"adt_type": "never"})),
            Some(json!({"adt_type": "fixed", "backoff": "PT10M", "maxAttempts": 2})),
        ];
        let mut schedules = vec![json!({"adt_type": "never"})];
        for policy in &retry_policies {
            let mut daily = json!({"adt_type": "daily", "startTimeOfDay": "01:00:00"});
            let mut cron = json!({"adt_type": "cron", "cronString": "0 * * * *"});
            if let Some(policy) = policy {
                daily["retryPolicy"] = policy.clone();
                cron["retryPolicy"] = policy.clone();
            }
            schedules.push(daily);
            schedules.push(cron);
        }

        for schedule in schedules {
            let json = store_with_schedule(schedule);
            let config = FeatureStoreMapper.flatten_json(json.clone()).unwrap();
            assert_eq!(FeatureStoreMapper.compose_json(&config).unwrap(), json);
            let store = FeatureStoreMapper.compose(&config).unwrap();
            assert_eq!(FeatureStoreMapper.flatten(&store).unwrap(), config);
        }
    }

    #[test]
    fn never_retry_policy_is_its_own_block() {
        let daily = Block::new()
            .set("never_retry_policy", Value::block(Attributes::new()))
            .build();
        let attrs = base_config().set("daily_schedule", Value::block(daily)).build();
        let json = FeatureStoreMapper.compose_json(&attrs).unwrap();
        assert_eq!(
            json["schedule"],
            json!({"adt_type": "daily", "retryPolicy": {"adt_type": "never"}})
        );
        assert!(FeatureStoreMapper.schema().validate(&attrs).is_ok());

        let flattened = FeatureStoreMapper.flatten_json(json).unwrap();
        let daily = single_block(&flattened, "daily_schedule").unwrap().unwrap();
        assert_eq!(daily["never_retry_policy"], Value::block(Attributes::new()));
        assert_eq!(daily["fixed_retry_policy"], Value::empty_block());
    }

    #[test]
    fn every_destination_target_round_trips() {
        let targets = [
            json!({"destinationId": 4, "adt_type": "folder", "folder": "/out"}),
            json!({"destinationId": 4, "adt_type": "folder", "folder": "/out", "folderPartitioningEnabled": false}),
            json!({"destinationId": 5, "adt_type": "table", "tableName": "features"}),
            json!({"destinationId": 6, "adt_type": "topic", "topic": "customer"}),
            json!({"destinationId": 6, "adt_type": "topic", "topic": "customer", "format": {"adt_type": "avro"}, "saveMode": "append"}),
        ];
        for target in targets {
            let mut json = store_with_schedule(json!({"adt_type": "never"}));
            json["destinations"] = json!([target]);
            let config = FeatureStoreMapper.flatten_json(json.clone()).unwrap();
            assert_eq!(FeatureStoreMapper.compose_json(&config).unwrap(), json);
            let store = FeatureStoreMapper.compose(&config).unwrap();
            assert_eq!(FeatureStoreMapper.flatten(&store).unwrap(), config);
        }
    }

    #[test]
    fn every_version_target_round_trips() {
        for target in [
            json!({"adt_type": "commit", "commitId": "a1b2c3"}),
            json!({"adt_type": "branch", "branchName": "main"}),
        ] {
            let mut json = store_with_schedule(json!({"adt_type": "never"}));
            json["versionTarget"] = target;
            let config = FeatureStoreMapper.flatten_json(json.clone()).unwrap();
            assert_eq!(FeatureStoreMapper.compose_json(&config).unwrap(), json);
        }
    }
}
