//! Kafka Access Control List payloads.
//!
//! The enum values travel upper-case on the wire but are accepted in any
//! case from flags and files (`Topic`, `topic` and `TOPIC` are the same).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resource name Kafka uses for cluster-level ACLs.
pub const CLUSTER_RESOURCE_NAME: &str = "kafka-cluster";

/// Host wildcard applied when an ACL does not name one.
pub const ANY_HOST: &str = "*";

/// Errors raised while validating an [`Acl`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclValidationError {
    /// An enum value did not match any known variant.
    #[error("unknown {kind} '{value}', expected one of: {expected}")]
    UnknownValue {
        /// Which enum failed to parse.
        kind: &'static str,
        /// Offending input.
        value: String,
        /// Comma separated list of accepted values.
        expected: String,
    },
    /// The principal was missing.
    #[error("principal is required")]
    MissingPrincipal,
    /// The resource name was missing for a non-cluster resource.
    #[error("resource name is required for resource type {0}")]
    MissingResourceName(AclResourceType),
    /// The operation cannot be granted on the resource type.
    #[error("operation {operation} is not valid for resource type {resource_type}")]
    OperationNotAllowed {
        /// Resource type of the ACL.
        resource_type: AclResourceType,
        /// Operation that was requested.
        operation: AclOperation,
    },
}

macro_rules! acl_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Upper-case wire representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AclValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| AclValidationError::UnknownValue {
                        kind: $kind,
                        value: value.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|variant| variant.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = AclValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

acl_enum! {
    /// Kafka resource an ACL applies to.
    AclResourceType, "resource type" {
        /// A topic.
        Topic => "TOPIC",
        /// The cluster itself.
        Cluster => "CLUSTER",
        /// A consumer group.
        Group => "GROUP",
        /// A transactional producer id.
        TransactionalId => "TRANSACTIONALID",
    }
}

acl_enum! {
    /// Whether the ACL grants or denies the operation.
    AclPermissionType, "permission type" {
        /// Grant the operation.
        Allow => "ALLOW",
        /// Deny the operation.
        Deny => "DENY",
    }
}

acl_enum! {
    /// Operation governed by the ACL.
    AclOperation, "operation" {
        /// Every operation.
        All => "ALL",
        /// Read.
        Read => "READ",
        /// Write.
        Write => "WRITE",
        /// Create.
        Create => "CREATE",
        /// Delete.
        Delete => "DELETE",
        /// Alter.
        Alter => "ALTER",
        /// Describe.
        Describe => "DESCRIBE",
        /// Inter-broker cluster actions.
        ClusterAction => "CLUSTERACTION",
        /// Describe configs.
        DescribeConfigs => "DESCRIBECONFIGS",
        /// Alter configs.
        AlterConfigs => "ALTERCONFIGS",
        /// Idempotent produce.
        IdempotentWrite => "IDEMPOTENTWRITE",
    }
}

impl AclResourceType {
    /// Operations Kafka accepts for this resource type.
    #[must_use]
    pub const fn allowed_operations(self) -> &'static [AclOperation] {
        use AclOperation as Op;
        match self {
            Self::Topic => &[
                Op::All,
                Op::Read,
                Op::Write,
                Op::Create,
                Op::Delete,
                Op::Alter,
                Op::Describe,
                Op::DescribeConfigs,
                Op::AlterConfigs,
            ],
            Self::Group => &[Op::All, Op::Read, Op::Describe, Op::Delete],
            Self::Cluster => &[
                Op::All,
                Op::Create,
                Op::Alter,
                Op::Describe,
                Op::ClusterAction,
                Op::DescribeConfigs,
                Op::AlterConfigs,
                Op::IdempotentWrite,
            ],
            Self::TransactionalId => &[Op::All, Op::Describe, Op::Write],
        }
    }
}

/// A single Kafka ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    /// Resource type the entry applies to.
    pub resource_type: AclResourceType,
    /// Resource name; optional for cluster resources.
    #[serde(default)]
    pub resource_name: String,
    /// Principal, e.g. `User:alice`.
    pub principal: String,
    /// Allow or deny.
    pub permission_type: AclPermissionType,
    /// Client host the entry applies to; `*` for any.
    #[serde(default)]
    pub host: String,
    /// Operation being governed.
    pub operation: AclOperation,
}

impl Acl {
    /// Fill defaults and check the entry is acceptable to Kafka.
    ///
    /// An empty host becomes `*` and a cluster resource without a name
    /// becomes `kafka-cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error when the principal or a required resource name is
    /// missing, or the operation is not valid for the resource type.
    pub fn validate(&mut self) -> Result<(), AclValidationError> {
        self.principal = self.principal.trim().to_string();
        if self.principal.is_empty() {
            return Err(AclValidationError::MissingPrincipal);
        }

        self.resource_name = self.resource_name.trim().to_string();
        if self.resource_name.is_empty() {
            if self.resource_type == AclResourceType::Cluster {
                self.resource_name = CLUSTER_RESOURCE_NAME.to_string();
            } else {
                return Err(AclValidationError::MissingResourceName(self.resource_type));
            }
        }

        self.host = self.host.trim().to_string();
        if self.host.is_empty() {
            self.host = ANY_HOST.to_string();
        }

        if !self
            .resource_type
            .allowed_operations()
            .contains(&self.operation)
        {
            return Err(AclValidationError::OperationNotAllowed {
                resource_type: self.resource_type,
                operation: self.operation,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn topic_acl() -> Acl {
        Acl {
            resource_type: AclResourceType::Topic,
            resource_name: "transactions".into(),
            principal: "User:alice".into(),
            permission_type: AclPermissionType::Allow,
            host: String::new(),
            operation: AclOperation::Read,
        }
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Topic".parse(), Ok(AclResourceType::Topic));
        assert_eq!("transactionalid".parse(), Ok(AclResourceType::TransactionalId));
        assert_eq!("allow".parse(), Ok(AclPermissionType::Allow));
        assert_eq!(" DescribeConfigs ".parse(), Ok(AclOperation::DescribeConfigs));
    }

    #[test]
    fn unknown_enum_value_lists_expected_values() {
        let err = "maybe"
            .parse::<AclPermissionType>()
            .expect_err("unknown permission");
        assert_eq!(
            err.to_string(),
            "unknown permission type 'maybe', expected one of: ALLOW, DENY"
        );
    }

    #[test]
    fn acl_serializes_with_upper_case_enums() {
        let acl = topic_acl();
        let value = serde_json::to_value(&acl).expect("serialize");
        assert_eq!(
            value,
            json!({
                "resourceType": "TOPIC",
                "resourceName": "transactions",
                "principal": "User:alice",
                "permissionType": "ALLOW",
                "host": "",
                "operation": "READ"
            })
        );
    }

    #[test]
    fn acl_deserializes_mixed_case_from_yaml() {
        let yaml = "resourceType: Topic\nresourceName: orders\nprincipal: User:bob\npermissionType: Deny\nhost: \"*\"\noperation: write\n";
        let acl: Acl = serde_yaml::from_str(yaml).expect("yaml acl");
        assert_eq!(acl.resource_type, AclResourceType::Topic);
        assert_eq!(acl.permission_type, AclPermissionType::Deny);
        assert_eq!(acl.operation, AclOperation::Write);
    }

    #[test]
    fn validate_fills_host_wildcard() {
        let mut acl = topic_acl();
        acl.validate().expect("valid acl");
        assert_eq!(acl.host, ANY_HOST);
    }

    #[test]
    fn validate_defaults_cluster_resource_name() {
        let mut acl = Acl {
            resource_type: AclResourceType::Cluster,
            resource_name: String::new(),
            operation: AclOperation::IdempotentWrite,
            ..topic_acl()
        };
        acl.validate().expect("valid cluster acl");
        assert_eq!(acl.resource_name, CLUSTER_RESOURCE_NAME);
    }

    #[test]
    fn validate_requires_principal_and_resource_name() {
        let mut acl = Acl {
            principal: "  ".into(),
            ..topic_acl()
        };
        assert_eq!(acl.validate(), Err(AclValidationError::MissingPrincipal));

        let mut acl = Acl {
            resource_name: String::new(),
            ..topic_acl()
        };
        assert_eq!(
            acl.validate(),
            Err(AclValidationError::MissingResourceName(
                AclResourceType::Topic
            ))
        );
    }

    #[test]
    fn validate_rejects_operation_for_resource_type() {
        let mut acl = Acl {
            resource_type: AclResourceType::Group,
            operation: AclOperation::Write,
            ..topic_acl()
        };
        let err = acl.validate().expect_err("write on group");
        assert_eq!(
            err.to_string(),
            "operation WRITE is not valid for resource type GROUP"
        );
    }
}
