//! Feature store records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::KeyValue;

/// Scheduled job materialising a feature set into destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "adt_type")]
    pub kind: StoreKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
    pub feature_set: i64,
    pub enabled: bool,
    pub schedule: Schedule,
    #[serde(default)]
    pub destinations: Vec<DestinationReference>,
    pub cluster: i64,
    #[serde(default)]
    pub cluster_property_sets: Vec<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_spark_properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_date_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<i64>,
    #[serde(
        rename = "entityPopulation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub population: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_target: Option<VersionTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Batch,
}

/// When a feature store runs; `Never` leaves it to manual runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScheduleRecord", into = "ScheduleRecord")]
pub enum Schedule {
    Never,
    Scheduled(ScheduledRun),
}

/// A schedule that actually triggers runs
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledRun {
    Daily(DailySchedule),
    Cron(CronSchedule),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronSchedule {
    pub cron_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

/// Tagged wire form of `Schedule`
#[derive(Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
enum ScheduleRecord {
    Never,
    Daily(DailySchedule),
    Cron(CronSchedule),
}

impl From<ScheduleRecord> for Schedule {
    fn from(record: ScheduleRecord) -> Self {
        match record {
            ScheduleRecord::Never => Schedule::Never,
            ScheduleRecord::Daily(daily) => Schedule::Scheduled(ScheduledRun::Daily(daily)),
            ScheduleRecord::Cron(cron) => Schedule::Scheduled(ScheduledRun::Cron(cron)),
        }
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::Never => ScheduleRecord::Never,
            Schedule::Scheduled(ScheduledRun::Daily(daily)) => ScheduleRecord::Daily(daily),
            Schedule::Scheduled(ScheduledRun::Cron(cron)) => ScheduleRecord::Cron(cron),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum RetryPolicy {
    Never,
    Fixed {
        backoff: String,
        #[serde(rename = "maxAttempts")]
        max_attempts: i64,
    },
}

/// Where inside a destination a feature store writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationReference {
    #[serde(rename = "destinationId")]
    pub destination_id: i64,
    #[serde(flatten)]
    pub target: DestinationTarget,
    #[serde(rename = "saveMode", default, skip_serializing_if = "Option::is_none")]
    pub save_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum DestinationTarget {
    Folder {
        folder: String,
        #[serde(
            rename = "folderPartitioningEnabled",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        partitioning_enabled: Option<bool>,
    },
    Table {
        #[serde(rename = "tableName")]
        table_name: String,
    },
    Topic {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<KafkaFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum KafkaFormat {
    Json,
    Avro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum VersionTarget {
    Commit {
        #[serde(rename = "commitId")]
        commit_id: String,
    },
    Branch {
        #[serde(rename = "branchName")]
        branch_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn destination_reference_flattens_target() {
        let reference = DestinationReference {
            destination_id: 4,
            target: DestinationTarget::Topic {
                topic: "features".to_string(),
                format: Some(KafkaFormat::Avro),
            },
            save_mode: None,
        };
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({
                "destinationId": 4,
                "adt_type": "topic",
                "topic": "features",
                "format": {"adt_type": "avro"}
            })
        );
    }

    #[test]
    fn unsupported_store_kind_is_an_unknown_variant() {
        let err = serde_json::from_value::<StoreKind>(json!("streaming")).unwrap_err();
        assert!(err.to_string().contains("unknown variant `streaming`"));
    }

    #[test]
    fn cron_schedule_keeps_tag_and_fields() {
        let schedule = Schedule::Scheduled(ScheduledRun::Cron(CronSchedule {
            cron_string: "0 3 * * *".to_string(),
            retry_policy: Some(RetryPolicy::Never),
        }));
        let json = json!({
            "adt_type": "cron",
            "cronString": "0 3 * * *",
            "retryPolicy": {"adt_type": "never"}
        });
        assert_eq!(serde_json::to_value(&schedule).unwrap(), json);
        assert_eq!(serde_json::from_value::<Schedule>(json).unwrap(), schedule);
    }

    #[test]
    fn unknown_schedule_tag_is_an_unknown_variant() {
        let err = serde_json::from_value::<Schedule>(json!({"adt_type": "hourly"})).unwrap_err();
        assert!(err.to_string().contains("unknown variant `hourly`"));
    }

    #[test]
    fn never_schedule_has_only_a_tag() {
        assert_eq!(
            serde_json::to_value(Schedule::Never).unwrap(),
            json!({"adt_type": "never"})
        );
    }
}
