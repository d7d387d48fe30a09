//! Connector blocks shared by `anaml_source` and `anaml_destination`
//!
//! Each connector kind has a block body codec and a schema fragment. File
//! formats, login credentials and Kafka properties are nested records with
//! their own variants.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::codec::{Block, block_list, get_bool, get_str, required_str, single_block};
use crate::error::MapError;
use crate::mapper::{Variant, compose_variant, flatten_optional_variant, require_variant, undeclared_block};
use crate::wire::common::{Credentials, CsvOptions, FileFormat, SecretValue, SensitiveAttribute};
use crate::wire::connector::{
    BigQuery, BigQueryDestination, Bigtable, FileStore, Hive, Jdbc, Kafka, ObjectStore, S3aStore,
    Snowflake, StagingArea,
};

/// CSV options configured flat inside a connector block
const CSV_OPTIONS: &[&str] = &[
    "field_separator",
    "quote_all",
    "include_header",
    "empty_value",
    "compression",
    "date_format",
    "timestamp_format",
    "ignore_leading_whitespace",
    "ignore_trailing_whitespace",
    "line_separator",
];

const FILE_FORMATS: &[&str] = &["csv", "orc", "parquet"];

// =============================================================================
// File Format
// =============================================================================

pub fn compose_file_format(body: &Attributes) -> Result<FileFormat, MapError> {
    let token = required_str(body, "file_format")?;
    match token.as_str() {
        "csv" => Ok(FileFormat::Csv(CsvOptions {
            sep: get_str(body, "field_separator")?,
            quote_all: get_bool(body, "quote_all")?,
            include_header: get_bool(body, "include_header")?,
            empty_value: get_str(body, "empty_value")?,
            compression: get_str(body, "compression")?,
            date_format: get_str(body, "date_format")?,
            timestamp_format: get_str(body, "timestamp_format")?,
            ignore_leading_white_space: get_bool(body, "ignore_leading_whitespace")?,
            ignore_trailing_white_space: get_bool(body, "ignore_trailing_whitespace")?,
            line_sep: get_str(body, "line_separator")?,
        })),
        "orc" | "parquet" => {
            let ignored: Vec<&str> = CSV_OPTIONS
                .iter()
                .copied()
                .filter(|option| body.get(*option).is_some_and(|v| !v.is_unset()))
                .collect();
            if !ignored.is_empty() {
                log::warn!(
                    "Ignoring CSV options for {} file format: {}",
                    token,
                    ignored.join(", ")
                );
            }
            Ok(if token == "orc" {
                FileFormat::Orc
            } else {
                FileFormat::Parquet
            })
        }
        _ => Err(MapError::UnknownToken {
            vocabulary: "file format",
            token,
            expected: FILE_FORMATS.to_vec(),
        }),
    }
}

pub fn flatten_file_format(format: &FileFormat, block: Block) -> Block {
    let csv = match format {
        FileFormat::Csv(options) => options.clone(),
        FileFormat::Orc | FileFormat::Parquet => CsvOptions::default(),
    };
    block
        .string("file_format", format.token())
        .opt_string("field_separator", csv.sep.as_ref())
        .set("quote_all", Value::opt_bool(csv.quote_all))
        .set("include_header", Value::opt_bool(csv.include_header))
        .opt_string("empty_value", csv.empty_value.as_ref())
        .opt_string("compression", csv.compression.as_ref())
        .opt_string("date_format", csv.date_format.as_ref())
        .opt_string("timestamp_format", csv.timestamp_format.as_ref())
        .set(
            "ignore_leading_whitespace",
            Value::opt_bool(csv.ignore_leading_white_space),
        )
        .set(
            "ignore_trailing_whitespace",
            Value::opt_bool(csv.ignore_trailing_white_space),
        )
        .opt_string("line_separator", csv.line_sep.as_ref())
}

fn with_file_format(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(AttributeSchema::new("file_format", AttributeType::one_of(FILE_FORMATS)).required())
        .attribute(AttributeSchema::new("field_separator", AttributeType::String))
        .attribute(AttributeSchema::new("quote_all", AttributeType::Bool))
        .attribute(AttributeSchema::new("include_header", AttributeType::Bool))
        .attribute(AttributeSchema::new("empty_value", AttributeType::String))
        .attribute(AttributeSchema::new("compression", AttributeType::String))
        .attribute(AttributeSchema::new("date_format", AttributeType::String))
        .attribute(AttributeSchema::new("timestamp_format", AttributeType::String))
        .attribute(AttributeSchema::new("ignore_leading_whitespace", AttributeType::Bool))
        .attribute(AttributeSchema::new("ignore_trailing_whitespace", AttributeType::Bool))
        .attribute(AttributeSchema::new("line_separator", AttributeType::String))
}

// =============================================================================
// Credentials and Secrets
// =============================================================================

const SECRET_BLOCKS: &[&str] = &["basic", "file", "gcp_secret_manager"];

impl Variant for Credentials {
    const BLOCKS: &'static [&'static str] = SECRET_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "basic" => Ok(Credentials::Basic {
                username: required_str(body, "username")?,
                password: required_str(body, "password")?,
            }),
            "file" => Ok(Credentials::File {
                username: required_str(body, "username")?,
                filepath: required_str(body, "filepath")?,
            }),
            "gcp_secret_manager" => Ok(Credentials::Gcpsm {
                username: required_str(body, "username")?,
                password_secret_project: required_str(body, "secret_project")?,
                password_secret_id: required_str(body, "secret_id")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            Credentials::Basic { username, password } => (
                "basic",
                Block::new()
                    .string("username", username)
                    .string("password", password)
                    .build(),
            ),
            Credentials::File { username, filepath } => (
                "file",
                Block::new()
                    .string("username", username)
                    .string("filepath", filepath)
                    .build(),
            ),
            Credentials::Gcpsm {
                username,
                password_secret_project,
                password_secret_id,
            } => (
                "gcp_secret_manager",
                Block::new()
                    .string("username", username)
                    .string("secret_project", password_secret_project)
                    .string("secret_id", password_secret_id)
                    .build(),
            ),
        }
    }
}

impl Variant for SecretValue {
    const BLOCKS: &'static [&'static str] = SECRET_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "basic" => Ok(SecretValue::Basic {
                secret: required_str(body, "secret")?,
            }),
            "file" => Ok(SecretValue::File {
                filepath: required_str(body, "filepath")?,
            }),
            "gcp_secret_manager" => Ok(SecretValue::Gcpsm {
                secret_project: required_str(body, "secret_project")?,
                secret_id: required_str(body, "secret_id")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            SecretValue::Basic { secret } => ("basic", Block::new().string("secret", secret).build()),
            SecretValue::File { filepath } => {
                ("file", Block::new().string("filepath", filepath).build())
            }
            SecretValue::Gcpsm {
                secret_project,
                secret_id,
            } => (
                "gcp_secret_manager",
                Block::new()
                    .string("secret_project", secret_project)
                    .string("secret_id", secret_id)
                    .build(),
            ),
        }
    }
}

/// Compose the optional `credentials_provider` block of a connector
pub fn compose_credentials(body: &Attributes) -> Result<Option<Credentials>, MapError> {
    match single_block(body, "credentials_provider")? {
        Some(provider) => compose_variant(provider),
        None => Ok(None),
    }
}

pub fn flatten_credentials(credentials: Option<&Credentials>, block: Block) -> Block {
    match credentials {
        Some(credentials) => {
            let mut provider = Attributes::new();
            flatten_optional_variant(Some(credentials), &mut provider);
            block.set("credentials_provider", Value::block(provider))
        }
        None => block.set("credentials_provider", Value::empty_block()),
    }
}

fn secret_blocks(schema: ResourceSchema, fields: [&[&str]; 3], sensitive: &str) -> ResourceSchema {
    let mut schema = schema;
    for (block, fields) in SECRET_BLOCKS.iter().zip(fields) {
        let mut body = ResourceSchema::new(*block);
        for field in fields {
            let attr = AttributeSchema::new(*field, types::not_whitespace()).required();
            body = body.attribute(if *field == sensitive { attr.sensitive() } else { attr });
        }
        schema = schema.attribute(
            AttributeSchema::new(*block, AttributeType::single_block(body)).exactly_one_of(SECRET_BLOCKS),
        );
    }
    schema
}

fn credentials_schema() -> ResourceSchema {
    secret_blocks(
        ResourceSchema::new("credentials_provider"),
        [
            &["username", "password"],
            &["username", "filepath"],
            &["username", "secret_project", "secret_id"],
        ],
        "password",
    )
}

pub fn with_credentials(schema: ResourceSchema) -> ResourceSchema {
    schema.attribute(AttributeSchema::new(
        "credentials_provider",
        AttributeType::single_block(credentials_schema()),
    ))
}

fn kafka_property_schema() -> ResourceSchema {
    secret_blocks(
        ResourceSchema::new("property")
            .attribute(AttributeSchema::new("key", types::not_whitespace()).required()),
        [&["secret"], &["filepath"], &["secret_project", "secret_id"]],
        "secret",
    )
}

fn compose_kafka_properties(body: &Attributes) -> Result<Vec<SensitiveAttribute>, MapError> {
    block_list(body, "property")?
        .into_iter()
        .map(|property| {
            Ok(SensitiveAttribute {
                key: required_str(property, "key")?,
                value_config: require_variant(property, "property")?,
            })
        })
        .collect()
}

fn flatten_kafka_properties(properties: &[SensitiveAttribute]) -> Value {
    Value::List(
        properties
            .iter()
            .map(|property| {
                let mut body = Block::new().string("key", &property.key).build();
                flatten_optional_variant(Some(&property.value_config), &mut body);
                Value::Map(body)
            })
            .collect(),
    )
}

// =============================================================================
// Connectors
// =============================================================================

fn blank_required(schema: ResourceSchema, fields: &[&str]) -> ResourceSchema {
    fields.iter().fold(schema, |schema, field| {
        schema.attribute(AttributeSchema::new(*field, types::not_whitespace()).required())
    })
}

fn blank_optional(schema: ResourceSchema, fields: &[&str]) -> ResourceSchema {
    fields.iter().fold(schema, |schema, field| {
        schema.attribute(AttributeSchema::new(*field, types::not_whitespace()))
    })
}

pub fn compose_object_store(body: &Attributes) -> Result<ObjectStore, MapError> {
    Ok(ObjectStore {
        bucket: required_str(body, "bucket")?,
        path: required_str(body, "path")?,
        file_format: compose_file_format(body)?,
    })
}

pub fn flatten_object_store(store: &ObjectStore) -> Attributes {
    let block = Block::new()
        .string("bucket", &store.bucket)
        .string("path", &store.path);
    flatten_file_format(&store.file_format, block).build()
}

pub fn object_store_schema(name: &str) -> ResourceSchema {
    with_file_format(blank_required(ResourceSchema::new(name), &["bucket", "path"]))
}

pub fn compose_s3a_store(body: &Attributes) -> Result<S3aStore, MapError> {
    Ok(S3aStore {
        bucket: required_str(body, "bucket")?,
        path: required_str(body, "path")?,
        endpoint: get_str(body, "endpoint")?,
        access_key: get_str(body, "access_key")?,
        secret_key: get_str(body, "secret_key")?,
        file_format: compose_file_format(body)?,
    })
}

pub fn flatten_s3a_store(store: &S3aStore) -> Attributes {
    let block = Block::new()
        .string("bucket", &store.bucket)
        .string("path", &store.path)
        .opt_string("endpoint", store.endpoint.as_ref())
        .opt_string("access_key", store.access_key.as_ref())
        .opt_string("secret_key", store.secret_key.as_ref());
    flatten_file_format(&store.file_format, block).build()
}

pub fn s3a_store_schema(name: &str) -> ResourceSchema {
    let schema = blank_optional(
        blank_required(ResourceSchema::new(name), &["bucket", "path"]),
        &["endpoint", "access_key"],
    )
    .attribute(AttributeSchema::new("secret_key", types::not_whitespace()).sensitive());
    with_file_format(schema)
}

pub fn compose_file_store(body: &Attributes) -> Result<FileStore, MapError> {
    Ok(FileStore {
        path: required_str(body, "path")?,
        file_format: compose_file_format(body)?,
    })
}

pub fn flatten_file_store(store: &FileStore) -> Attributes {
    flatten_file_format(&store.file_format, Block::new().string("path", &store.path)).build()
}

pub fn file_store_schema(name: &str) -> ResourceSchema {
    with_file_format(blank_required(ResourceSchema::new(name), &["path"]))
}

pub fn compose_jdbc(body: &Attributes) -> Result<Jdbc, MapError> {
    Ok(Jdbc {
        url: required_str(body, "url")?,
        schema: required_str(body, "schema")?,
        credentials_provider: compose_credentials(body)?,
    })
}

pub fn flatten_jdbc(jdbc: &Jdbc) -> Attributes {
    let block = Block::new()
        .string("url", &jdbc.url)
        .string("schema", &jdbc.schema);
    flatten_credentials(jdbc.credentials_provider.as_ref(), block).build()
}

pub fn jdbc_schema(name: &str) -> ResourceSchema {
    with_credentials(blank_required(ResourceSchema::new(name), &["url", "schema"]))
}

pub fn compose_hive(body: &Attributes) -> Result<Hive, MapError> {
    Ok(Hive {
        database: required_str(body, "database")?,
    })
}

pub fn flatten_hive(hive: &Hive) -> Attributes {
    Block::new().string("database", &hive.database).build()
}

pub fn hive_schema(name: &str) -> ResourceSchema {
    blank_required(ResourceSchema::new(name), &["database"])
}

pub fn compose_big_query(body: &Attributes) -> Result<BigQuery, MapError> {
    Ok(BigQuery {
        path: required_str(body, "path")?,
    })
}

pub fn flatten_big_query(big_query: &BigQuery) -> Attributes {
    Block::new().string("path", &big_query.path).build()
}

pub fn big_query_schema(name: &str) -> ResourceSchema {
    blank_required(ResourceSchema::new(name), &["path"])
}

pub fn compose_big_query_destination(body: &Attributes) -> Result<BigQueryDestination, MapError> {
    let staging_area = match single_block(body, "gcs_staging_area")? {
        Some(area) => Some(StagingArea::Gcs {
            bucket: required_str(area, "bucket")?,
            path: get_str(area, "path")?,
        }),
        None => None,
    };
    Ok(BigQueryDestination {
        path: required_str(body, "path")?,
        staging_area,
    })
}

pub fn flatten_big_query_destination(big_query: &BigQueryDestination) -> Attributes {
    let staging = match &big_query.staging_area {
        Some(StagingArea::Gcs { bucket, path }) => Value::block(
            Block::new()
                .string("bucket", bucket)
                .opt_string("path", path.as_ref())
                .build(),
        ),
        None => Value::empty_block(),
    };
    Block::new()
        .string("path", &big_query.path)
        .set("gcs_staging_area", staging)
        .build()
}

pub fn big_query_destination_schema(name: &str) -> ResourceSchema {
    let staging = blank_optional(
        blank_required(ResourceSchema::new("gcs_staging_area"), &["bucket"]),
        &["path"],
    );
    big_query_schema(name).attribute(AttributeSchema::new(
        "gcs_staging_area",
        AttributeType::single_block(staging),
    ))
}

pub fn compose_kafka(body: &Attributes) -> Result<Kafka, MapError> {
    Ok(Kafka {
        bootstrap_servers: required_str(body, "bootstrap_servers")?,
        schema_registry_url: required_str(body, "schema_registry_url")?,
        kafka_properties_providers: compose_kafka_properties(body)?,
    })
}

pub fn flatten_kafka(kafka: &Kafka) -> Attributes {
    Block::new()
        .string("bootstrap_servers", &kafka.bootstrap_servers)
        .string("schema_registry_url", &kafka.schema_registry_url)
        .set(
            "property",
            flatten_kafka_properties(&kafka.kafka_properties_providers),
        )
        .build()
}

pub fn kafka_schema(name: &str) -> ResourceSchema {
    blank_required(
        ResourceSchema::new(name),
        &["bootstrap_servers", "schema_registry_url"],
    )
    .attribute(AttributeSchema::new(
        "property",
        AttributeType::block_list(kafka_property_schema()),
    ))
}

pub fn compose_snowflake(body: &Attributes) -> Result<Snowflake, MapError> {
    Ok(Snowflake {
        url: required_str(body, "url")?,
        warehouse: required_str(body, "warehouse")?,
        database: required_str(body, "database")?,
        schema: required_str(body, "schema")?,
        credentials_provider: compose_credentials(body)?,
    })
}

pub fn flatten_snowflake(snowflake: &Snowflake) -> Attributes {
    let block = Block::new()
        .string("url", &snowflake.url)
        .string("warehouse", &snowflake.warehouse)
        .string("database", &snowflake.database)
        .string("schema", &snowflake.schema);
    flatten_credentials(snowflake.credentials_provider.as_ref(), block).build()
}

pub fn snowflake_schema(name: &str) -> ResourceSchema {
    with_credentials(blank_required(
        ResourceSchema::new(name),
        &["url", "warehouse", "database", "schema"],
    ))
}

pub fn compose_bigtable(body: &Attributes) -> Result<Bigtable, MapError> {
    Ok(Bigtable {
        project: required_str(body, "project")?,
        instance: required_str(body, "instance")?,
    })
}

pub fn flatten_bigtable(bigtable: &Bigtable) -> Attributes {
    Block::new()
        .string("project", &bigtable.project)
        .string("instance", &bigtable.instance)
        .build()
}

pub fn bigtable_schema(name: &str) -> ResourceSchema {
    blank_required(ResourceSchema::new(name), &["project", "instance"])
}
