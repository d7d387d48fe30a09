//! anaml_feature and anaml_feature_set resources

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{description, metadata, named_schema, with_labels};
use crate::codec::{
    Block, get_int, get_str, identifier_list, identifier_value, identifiers_to_list,
    identifiers_to_set, key_values, labels, required_identifier, required_str,
};
use crate::error::MapError;
use crate::mapper::{ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block};
use crate::wire::common::SqlExpression;
use crate::vocab::Aggregate;
use crate::wire::feature::{EventWindow, Feature, FeatureKind, FeatureSet};

const FEATURE_BLOCKS: &[&str] = &["event", "row"];

const WINDOW_FIELDS: &[&str] = &["days", "hours", "months", "rows"];

pub struct FeatureMapper;

impl ResourceMapper for FeatureMapper {
    type Wire = Feature;

    const TYPE_NAME: &'static str = "anaml_feature";
    const COLLECTION: &'static str = "feature";

    fn schema(&self) -> ResourceSchema {
        let window = |name: &str| {
            let others: Vec<&str> = WINDOW_FIELDS.iter().copied().filter(|f| *f != name).collect();
            AttributeSchema::new(name, types::positive_int()).conflicts_with(&others)
        };
        let event = ResourceSchema::new("event")
            .attribute(AttributeSchema::new("table", types::identifier()).required())
            .attribute(
                AttributeSchema::new("aggregation", AttributeType::one_of(&Aggregate::tokens())).required(),
            )
            .attribute(window("days"))
            .attribute(window("hours"))
            .attribute(window("months"))
            .attribute(window("rows"))
            .attribute(AttributeSchema::new("entity_restrictions", types::identifier_set()));
        let row = ResourceSchema::new("row")
            .attribute(AttributeSchema::new("over", types::identifier_list()).required())
            .attribute(AttributeSchema::new("entity", types::identifier()).required());

        let schema = named_schema(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("select", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("filter", types::not_whitespace()))
            .attribute(AttributeSchema::new("post_aggregation", types::not_whitespace()))
            .attribute(
                AttributeSchema::new("event", AttributeType::single_block(event))
                    .exactly_one_of(FEATURE_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("row", AttributeType::single_block(row))
                    .exactly_one_of(FEATURE_BLOCKS),
            );
        with_labels(schema).with_description("An aggregation over an event table, or a row expression")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Feature, MapError> {
        let sql = |field: &str| -> Result<Option<SqlExpression>, MapError> {
            Ok(get_str(attrs, field)?.map(|sql| SqlExpression { sql }))
        };
        Ok(Feature {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "feature")?,
            select: SqlExpression {
                sql: required_str(attrs, "select")?,
            },
            filter: sql("filter")?,
            post_aggregate_expr: sql("post_aggregation")?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, feature: &Feature) -> Result<Attributes, MapError> {
        let mut attrs = metadata(
            &feature.name,
            &feature.description,
            &feature.labels,
            &feature.attributes,
        )
        .string("select", &feature.select.sql)
        .opt_string("filter", feature.filter.as_ref().map(|f| &f.sql))
        .opt_string(
            "post_aggregation",
            feature.post_aggregate_expr.as_ref().map(|p| &p.sql),
        )
        .build();
        flatten_variant(&feature.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for FeatureKind {
    const BLOCKS: &'static [&'static str] = FEATURE_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "event" => {
                let aggregate = Aggregate::from_token(&required_str(body, "aggregation")?)?;
                let restrictions = identifier_list(body, "entity_restrictions")?;
                Ok(FeatureKind::Event {
                    table: required_identifier(body, "table")?,
                    window: compose_window(body)?,
                    aggregate,
                    entity_restrictions: (!restrictions.is_empty()).then_some(restrictions),
                })
            }
            "row" => Ok(FeatureKind::Row {
                over: identifier_list(body, "over")?,
                entity_id: required_identifier(body, "entity")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            FeatureKind::Event {
                table,
                window,
                aggregate,
                entity_restrictions,
            } => {
                let mut block = Block::new()
                    .set("table", identifier_value(Some(*table)))
                    .string("aggregation", aggregate.token())
                    .set(
                        "entity_restrictions",
                        identifiers_to_set(entity_restrictions.as_deref().unwrap_or_default()),
                    );
                for field in WINDOW_FIELDS {
                    block = block.set(field, Value::Null);
                }
                let block = match window {
                    EventWindow::OpenWindow => block,
                    EventWindow::DailyWindow { days } => block.set("days", Value::Int(*days)),
                    EventWindow::HourWindow { hours } => block.set("hours", Value::Int(*hours)),
                    EventWindow::MonthWindow { months } => block.set("months", Value::Int(*months)),
                    EventWindow::RowWindow { rows } => block.set("rows", Value::Int(*rows)),
                };
                ("event", block.build())
            }
            FeatureKind::Row { over, entity_id } => (
                "row",
                Block::new()
                    .set("over", identifiers_to_list(over))
                    .set("entity", identifier_value(Some(*entity_id)))
                    .build(),
            ),
        }
    }
}

/// The first window length set selects the window; none set is an open window
fn compose_window(body: &Attributes) -> Result<EventWindow, MapError> {
    if let Some(days) = get_int(body, "days")? {
        return Ok(EventWindow::DailyWindow { days });
    }
    if let Some(hours) = get_int(body, "hours")? {
        return Ok(EventWindow::HourWindow { hours });
    }
    if let Some(months) = get_int(body, "months")? {
        return Ok(EventWindow::MonthWindow { months });
    }
    if let Some(rows) = get_int(body, "rows")? {
        return Ok(EventWindow::RowWindow { rows });
    }
    Ok(EventWindow::OpenWindow)
}

pub struct FeatureSetMapper;

impl ResourceMapper for FeatureSetMapper {
    type Wire = FeatureSet;

    const TYPE_NAME: &'static str = "anaml_feature_set";
    const COLLECTION: &'static str = "feature-set";

    fn schema(&self) -> ResourceSchema {
        with_labels(
            named_schema(Self::TYPE_NAME)
                .attribute(AttributeSchema::new("entity", types::identifier()).required())
                .attribute(AttributeSchema::new("features", types::identifier_set()).required()),
        )
        .with_description("Features generated together for one entity")
    }

    fn compose(&self, attrs: &Attributes) -> Result<FeatureSet, MapError> {
        Ok(FeatureSet {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            entity: required_identifier(attrs, "entity")?,
            features: identifier_list(attrs, "features")?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, set: &FeatureSet) -> Result<Attributes, MapError> {
        Ok(metadata(&set.name, &set.description, &set.labels, &set.attributes)
            .set("entity", identifier_value(Some(set.entity)))
            .set("features", identifiers_to_set(&set.features))
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::single_block;
    use crate::mapper::DynamicMapper;
    use serde_json::json;

    fn event_feature(window: Option<(&str, i64)>) -> Attributes {
        let mut event = Block::new()
            .string("table", "10")
            .string("aggregation", "sum");
        if let Some((field, length)) = window {
            event = event.set(field, Value::Int(length));
        }
        Block::new()
            .string("name", "spend_7d")
            .string("select", "amount")
            .set("event", Value::block(event.build()))
            .build()
    }

    #[test]
    fn event_feature_composes_with_window() {
        let json = FeatureMapper
            .compose_json(&event_feature(Some(("days", 7))))
            .unwrap();
        assert_eq!(json["adt_type"], "event");
        assert_eq!(json["table"], 10);
        assert_eq!(json["window"], json!({"adt_type": "dailywindow", "days": 7}));
        assert_eq!(json["aggregate"], json!({"adt_type": "sum"}));
        assert_eq!(json["select"], json!({"sql": "amount"}));
        assert_eq!(json["filter"], serde_json::Value::Null);
        assert!(json.get("postAggregateExpr").is_none());
        assert!(json.get("entityRestrictions").is_none());
    }

    #[test]
    fn no_window_is_open() {
        let feature = FeatureMapper.compose(&event_feature(None)).unwrap();
        match feature.kind {
            FeatureKind::Event { window, .. } => assert_eq!(window, EventWindow::OpenWindow),
            other => panic!("Expected event feature, got {:?}", other),
        }
    }

    #[test]
    fn window_round_trips_through_state() {
        let feature = FeatureMapper
            .compose(&event_feature(Some(("hours", 12))))
            .unwrap();
        let attrs = FeatureMapper.flatten(&feature).unwrap();
        let event = single_block(&attrs, "event").unwrap().unwrap();
        assert_eq!(event["hours"], Value::Int(12));
        assert_eq!(event["days"], Value::Null);
        assert_eq!(attrs["row"], Value::empty_block());
        assert_eq!(FeatureMapper.compose(&attrs).unwrap(), feature);
    }

    #[test]
    fn unknown_aggregation_is_rejected() {
        let mut attrs = event_feature(None);
        let event = Block::new()
            .string("table", "10")
            .string("aggregation", "median")
            .build();
        attrs.insert("event".to_string(), Value::block(event));
        assert!(matches!(
            FeatureMapper.compose(&attrs),
            Err(MapError::UnknownToken { vocabulary: "aggregation", .. })
        ));
    }

    #[test]
    fn unknown_window_tag_fails_flatten() {
        let err = FeatureMapper
            .flatten_json(json!({
                "name": "f",
                "adt_type": "event",
                "table": 1,
                "window": {"adt_type": "weekwindow", "weeks": 2},
                "aggregate": {"adt_type": "sum"},
                "select": {"sql": "x"}
            }))
            .unwrap_err();
        assert!(matches!(err, MapError::UnknownVariantTag { .. }));
    }

    #[test]
    fn unknown_aggregate_tag_fails_flatten() {
        let err = FeatureMapper
            .flatten_json(json!({
                "name": "f",
                "adt_type": "event",
                "table": 1,
                "window": {"adt_type": "openwindow"},
                "aggregate": {"adt_type": "median"},
                "select": {"sql": "x"}
            }))
            .unwrap_err();
        match err {
            MapError::UnknownVariantTag { tag } => assert_eq!(tag, "median"),
            other => panic!("Expected UnknownVariantTag, got {:?}", other),
        }
    }

    #[test]
    fn every_aggregation_round_trips() {
        for aggregate in Aggregate::ALL {
            let mut attrs = event_feature(None);
            let event = Block::new()
                .string("table", "10")
                .string("aggregation", aggregate.token())
                .build();
            attrs.insert("event".to_string(), Value::block(event));

            let json = FeatureMapper.compose_json(&attrs).unwrap();
            assert_eq!(json["aggregate"]["adt_type"], aggregate.token());
            let flattened = FeatureMapper.flatten_json(json).unwrap();
            let event = single_block(&flattened, "event").unwrap().unwrap();
            assert_eq!(event["aggregation"], Value::string(aggregate.token()));
        }
    }

    #[test]
    fn row_feature_round_trips() {
        let json = json!({
            "id": 40,
            "name": "ratio",
            "description": "",
            "adt_type": "row",
            "over": [3, 1],
            "entityId": 2,
            "select": {"sql": "a / b"},
            "filter": null,
            "labels": [],
            "attributes": []
        });
        let attrs = FeatureMapper.flatten_json(json.clone()).unwrap();
        let mut composed = FeatureMapper.compose_json(&attrs).unwrap();
        composed["id"] = json!(40);
        assert_eq!(composed, json);
    }

    #[test]
    fn feature_set_references_features_by_id() {
        let attrs = Block::new()
            .string("name", "customer_features")
            .string("entity", "1")
            .set(
                "features",
                Value::Set(vec![Value::string("11"), Value::string("12")]),
            )
            .build();
        let set = FeatureSetMapper.compose(&attrs).unwrap();
        assert_eq!(set.entity, 1);
        assert_eq!(set.features, vec![11, 12]);
        assert_eq!(FeatureSetMapper.flatten(&set).unwrap()["features"], attrs["features"]);
    }
}
