//! Resource schemas for the Capella provider.
//!
//! Attribute traits mirror the remote API's contract: remote-assigned IDs
//! and audit trails are computed, scoping IDs force replacement when
//! changed, and enum-valued fields are constrained to what the API accepts.

use auriga_core::provider::ResourceType;
use auriga_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema_fn:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema_fn()
            }
        }
    };
}

define_resource_type!(ProjectType, "project", project_schema);
define_resource_type!(ClusterType, "cluster", cluster_schema);
define_resource_type!(ClusterOnOffType, "cluster_onoff", cluster_onoff_schema);
define_resource_type!(AppServiceType, "app_service", app_service_schema);
define_resource_type!(
    AppEndpointActivationType,
    "app_endpoint_activation",
    app_endpoint_activation_schema
);
define_resource_type!(FreeTierClusterType, "free_tier_cluster", free_tier_cluster_schema);
define_resource_type!(AuditLogExportType, "audit_log_export", audit_log_export_schema);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(ProjectType),
        Box::new(ClusterType),
        Box::new(ClusterOnOffType),
        Box::new(AppServiceType),
        Box::new(AppEndpointActivationType),
        Box::new(FreeTierClusterType),
        Box::new(AuditLogExportType),
    ]
}

/// Get the declared schema by resource type name
pub fn schema_for(resource_type: &str) -> Option<ResourceSchema> {
    match resource_type {
        "project" => Some(project_schema()),
        "cluster" => Some(cluster_schema()),
        "cluster_onoff" => Some(cluster_onoff_schema()),
        "app_service" => Some(app_service_schema()),
        "app_endpoint_activation" => Some(app_endpoint_activation_schema()),
        "free_tier_cluster" => Some(free_tier_cluster_schema()),
        "audit_log_export" => Some(audit_log_export_schema()),
        _ => None,
    }
}

fn audit_attribute() -> AttributeSchema {
    AttributeSchema::new(
        "audit",
        AttributeType::Object(vec![
            AttributeSchema::new("created_at", AttributeType::String),
            AttributeSchema::new("created_by", AttributeType::String),
            AttributeSchema::new("modified_at", AttributeType::String),
            AttributeSchema::new("modified_by", AttributeType::String),
            AttributeSchema::new("version", AttributeType::Int),
        ]),
    )
    .computed()
}

fn cloud_provider_attribute() -> AttributeSchema {
    AttributeSchema::new(
        "cloud_provider",
        AttributeType::Object(vec![
            AttributeSchema::new(
                "type",
                AttributeType::Enum(vec![
                    "aws".to_string(),
                    "gcp".to_string(),
                    "azure".to_string(),
                ]),
            )
            .required(),
            AttributeSchema::new("region", AttributeType::String).required(),
            AttributeSchema::new("cidr", types::cidr()).required(),
        ]),
    )
    .required()
    .requires_replace()
}

pub fn project_schema() -> ResourceSchema {
    ResourceSchema::new("project")
        .with_description("A Capella project grouping clusters and their access")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .use_state_for_unknown(),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(audit_attribute())
}

pub fn cluster_schema() -> ResourceSchema {
    ResourceSchema::new("cluster")
        .with_description("A Capella operational cluster")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .use_state_for_unknown(),
        )
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(cloud_provider_attribute())
        .attribute(
            AttributeSchema::new(
                "availability",
                AttributeType::Object(vec![
                    AttributeSchema::new(
                        "type",
                        AttributeType::Enum(vec!["single".to_string(), "multi".to_string()]),
                    )
                    .required(),
                ]),
            )
            .required()
            .requires_replace(),
        )
        .attribute(
            AttributeSchema::new(
                "support",
                AttributeType::Object(vec![
                    AttributeSchema::new(
                        "plan",
                        AttributeType::Enum(vec![
                            "basic".to_string(),
                            "developer pro".to_string(),
                            "enterprise".to_string(),
                        ]),
                    )
                    .required(),
                    AttributeSchema::new("timezone", AttributeType::String),
                ]),
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new(
                "service_groups",
                AttributeType::List(Box::new(AttributeType::Object(vec![
                    AttributeSchema::new(
                        "compute",
                        AttributeType::Object(vec![
                            AttributeSchema::new("cpu", types::positive_int()).required(),
                            AttributeSchema::new("ram", types::positive_int()).required(),
                        ]),
                    )
                    .required(),
                    AttributeSchema::new(
                        "disk",
                        AttributeType::Object(vec![
                            AttributeSchema::new("type", AttributeType::String).required(),
                            AttributeSchema::new("storage", types::positive_int()),
                            AttributeSchema::new("iops", types::positive_int()),
                            AttributeSchema::new("autoexpansion", AttributeType::Bool),
                        ]),
                    )
                    .required(),
                    AttributeSchema::new("num_of_nodes", types::positive_int()).required(),
                ]))),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("current_state", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("couchbase_server_version", AttributeType::String).computed(),
        )
        .attribute(AttributeSchema::new("app_service_id", AttributeType::String).computed())
        .attribute(audit_attribute())
}

pub fn cluster_onoff_schema() -> ResourceSchema {
    ResourceSchema::new("cluster_onoff")
        .with_description("On-demand activation toggle for a cluster")
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("cluster_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new(
                "state",
                AttributeType::Enum(vec!["on".to_string(), "off".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new(
            "turn_on_linked_app_service",
            AttributeType::Bool,
        ))
}

pub fn app_service_schema() -> ResourceSchema {
    ResourceSchema::new("app_service")
        .with_description("An App Service (sync gateway) attached to a cluster")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .use_state_for_unknown(),
        )
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("cluster_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new("nodes", types::positive_int()))
        .attribute(
            AttributeSchema::new(
                "compute",
                AttributeType::Object(vec![
                    AttributeSchema::new("cpu", types::positive_int()).required(),
                    AttributeSchema::new("ram", types::positive_int()).required(),
                ]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("version", AttributeType::String))
        .attribute(AttributeSchema::new("current_state", AttributeType::String).computed())
        .attribute(audit_attribute())
}

pub fn app_endpoint_activation_schema() -> ResourceSchema {
    ResourceSchema::new("app_endpoint_activation")
        .with_description("Activation status of an App Endpoint")
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("cluster_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("app_service_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("app_endpoint_name", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(AttributeSchema::new("online", AttributeType::Bool).required())
}

pub fn free_tier_cluster_schema() -> ResourceSchema {
    ResourceSchema::new("free_tier_cluster")
        .with_description("A free-tier Capella cluster")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .use_state_for_unknown(),
        )
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(cloud_provider_attribute())
        .attribute(AttributeSchema::new("current_state", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("couchbase_server_version", AttributeType::String).computed(),
        )
        .attribute(audit_attribute())
}

pub fn audit_log_export_schema() -> ResourceSchema {
    ResourceSchema::new("audit_log_export")
        .with_description("An audit-log export job for a cluster")
        .attribute(
            AttributeSchema::new("export_id", AttributeType::String)
                .computed()
                .use_state_for_unknown(),
        )
        .attribute(
            AttributeSchema::new("project_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("cluster_id", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("start", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(
            AttributeSchema::new("end", AttributeType::String)
                .required()
                .requires_replace(),
        )
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("audit_log_download_url", AttributeType::String).computed(),
        )
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("expiration", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use auriga_core::resource::Value;

    use super::*;

    fn string_value(s: &str) -> Value {
        Value::String(s.to_string())
    }

    fn sample_cluster_attributes() -> HashMap<String, Value> {
        let mut cloud_provider = HashMap::new();
        cloud_provider.insert("type".to_string(), string_value("aws"));
        cloud_provider.insert("region".to_string(), string_value("us-east-1"));
        cloud_provider.insert("cidr".to_string(), string_value("10.0.8.0/23"));

        let mut availability = HashMap::new();
        availability.insert("type".to_string(), string_value("multi"));

        let mut support = HashMap::new();
        support.insert("plan".to_string(), string_value("enterprise"));

        let mut compute = HashMap::new();
        compute.insert("cpu".to_string(), Value::Int(4));
        compute.insert("ram".to_string(), Value::Int(16));
        let mut disk = HashMap::new();
        disk.insert("type".to_string(), string_value("gp3"));
        disk.insert("storage".to_string(), Value::Int(50));
        let mut group = HashMap::new();
        group.insert("compute".to_string(), Value::Map(compute));
        group.insert("disk".to_string(), Value::Map(disk));
        group.insert("num_of_nodes".to_string(), Value::Int(3));

        let mut attrs = HashMap::new();
        attrs.insert("project_id".to_string(), string_value("proj-1"));
        attrs.insert("name".to_string(), string_value("production"));
        attrs.insert("cloud_provider".to_string(), Value::Map(cloud_provider));
        attrs.insert("availability".to_string(), Value::Map(availability));
        attrs.insert("support".to_string(), Value::Map(support));
        attrs.insert(
            "service_groups".to_string(),
            Value::List(vec![Value::Map(group)]),
        );
        attrs
    }

    #[test]
    fn cluster_schema_accepts_full_configuration() {
        assert!(cluster_schema().validate(&sample_cluster_attributes()).is_ok());
    }

    #[test]
    fn cluster_schema_rejects_missing_name_and_bad_enum() {
        let mut attrs = sample_cluster_attributes();
        attrs.remove("name");
        attrs.insert(
            "availability".to_string(),
            Value::Map(HashMap::from([(
                "type".to_string(),
                string_value("triple"),
            )])),
        );
        let errors = cluster_schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn computed_attributes_are_not_required() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), string_value("analytics"));
        assert!(project_schema().validate(&attrs).is_ok());
    }

    #[test]
    fn onoff_schema_constrains_state_values() {
        let mut attrs = HashMap::new();
        attrs.insert("project_id".to_string(), string_value("proj-1"));
        attrs.insert("cluster_id".to_string(), string_value("cl-1"));
        attrs.insert("state".to_string(), string_value("standby"));
        assert!(cluster_onoff_schema().validate(&attrs).is_err());

        attrs.insert("state".to_string(), string_value("off"));
        assert!(cluster_onoff_schema().validate(&attrs).is_ok());
    }

    #[test]
    fn every_resource_type_declares_a_schema() {
        for resource_type in resource_types() {
            let schema = schema_for(resource_type.name()).unwrap();
            assert_eq!(schema.resource_type, resource_type.name());
            assert!(!schema.attributes.is_empty());
        }
        assert!(schema_for("bucket").is_none());
    }
}
