use lenses_api_models::{Acl, AclOperation, AclPermissionType, AclResourceType};
use serde::Deserialize;

use crate::cli::AclArgs;
use crate::client::{AppContext, CliError, CliResult, classify};
use crate::commands::files::load_file;
use crate::output::{echo, print_json};

pub(crate) async fn handle_acls(ctx: &AppContext) -> CliResult<()> {
    let acls = ctx.client.get_acls().await.map_err(classify)?;
    print_json(&ctx.output, &acls)
}

pub(crate) async fn handle_acl_set(ctx: &AppContext, args: AclArgs) -> CliResult<()> {
    let acl = build_acl(args)?;
    ctx.client
        .create_or_update_acl(acl)
        .await
        .map_err(classify)?;
    echo(&ctx.output, "ACL created");
    Ok(())
}

pub(crate) async fn handle_acl_delete(ctx: &AppContext, args: AclArgs) -> CliResult<()> {
    let acl = build_acl(args)?;
    ctx.client.delete_acl(acl).await.map_err(classify)?;
    echo(&ctx.output, "ACL deleted");
    Ok(())
}

/// ACL fields as they may appear in a file; any of them can be left to
/// the command line flags.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AclFile {
    resource_type: Option<AclResourceType>,
    resource_name: Option<String>,
    principal: Option<String>,
    permission_type: Option<AclPermissionType>,
    host: Option<String>,
    operation: Option<AclOperation>,
}

/// Start from the file, when given, and let explicit flags win.
fn build_acl(args: AclArgs) -> CliResult<Acl> {
    let file = match args.source.as_deref() {
        Some(path) => load_file::<AclFile>(path)?,
        None => AclFile::default(),
    };
    let missing = |flag: &str| CliError::validation(format!("required flag --{flag} not set"));

    Ok(Acl {
        resource_type: args
            .resource_type
            .or(file.resource_type)
            .ok_or_else(|| missing("resourceType"))?,
        resource_name: args
            .resource_name
            .or(file.resource_name)
            .unwrap_or_default(),
        principal: args.principal.or(file.principal).unwrap_or_default(),
        permission_type: args
            .permission_type
            .or(file.permission_type)
            .ok_or_else(|| missing("permissionType"))?,
        host: args.acl_host.or(file.host).unwrap_or_default(),
        operation: args
            .operation
            .or(file.operation)
            .ok_or_else(|| missing("operation"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::context_for;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn topic_args() -> AclArgs {
        AclArgs {
            resource_type: Some(AclResourceType::Topic),
            resource_name: Some("transactions".into()),
            principal: Some("User:alice".into()),
            permission_type: Some(AclPermissionType::Allow),
            operation: Some(AclOperation::Read),
            ..AclArgs::default()
        }
    }

    #[tokio::test]
    async fn acls_lists_entries() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/acl")
                .header("X-Kafka-Lenses-Token", "test-token");
            then.status(200).json_body(json!([{
                "resourceType": "TOPIC",
                "resourceName": "transactions",
                "principal": "User:alice",
                "permissionType": "ALLOW",
                "host": "*",
                "operation": "READ"
            }]));
        });

        let ctx = context_for(&server).await;
        handle_acls(&ctx).await.expect("acls");
        mock.assert();
    }

    #[tokio::test]
    async fn acl_set_sends_normalised_entry() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/api/acl").json_body(json!({
                "resourceType": "TOPIC",
                "resourceName": "transactions",
                "principal": "User:alice",
                "permissionType": "ALLOW",
                "host": "*",
                "operation": "READ"
            }));
            then.status(201);
        });

        let ctx = context_for(&server).await;
        handle_acl_set(&ctx, topic_args()).await.expect("acl set");
        mock.assert();
    }

    #[tokio::test]
    async fn acl_delete_reads_file_and_applies_flag_overrides() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("acl.yml");
        fs::write(
            &path,
            "resourceType: Cluster\nprincipal: User:bob\npermissionType: deny\nhost: 10.0.0.1\noperation: describe\n",
        )
        .expect("write acl");

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/acl").json_body(json!({
                "resourceType": "CLUSTER",
                "resourceName": "kafka-cluster",
                "principal": "User:bob",
                "permissionType": "DENY",
                "host": "10.0.0.1",
                "operation": "ALTER"
            }));
            then.status(200);
        });

        let ctx = context_for(&server).await;
        let args = AclArgs {
            source: Some(path),
            operation: Some(AclOperation::Alter),
            ..AclArgs::default()
        };
        handle_acl_delete(&ctx, args).await.expect("acl delete");
        mock.assert();
    }

    #[tokio::test]
    async fn invalid_acl_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/api/acl");
            then.status(201);
        });

        let ctx = context_for(&server).await;
        let args = AclArgs {
            resource_type: Some(AclResourceType::Group),
            operation: Some(AclOperation::Write),
            ..topic_args()
        };
        let err = handle_acl_set(&ctx, args).await.expect_err("write on group");
        assert!(matches!(err, CliError::Validation(message) if message.contains("not valid for resource type GROUP")));
        mock.assert_calls(0);
    }

    #[test]
    fn partial_file_is_completed_by_flags() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("acl.yml");
        fs::write(
            &path,
            "resourceType: TOPIC\nresourceName: transactions\nprincipal: User:alice\npermissionType: ALLOW\n",
        )
        .expect("write acl");

        let acl = build_acl(AclArgs {
            source: Some(path),
            operation: Some(AclOperation::Read),
            ..AclArgs::default()
        })
        .expect("merged acl");
        assert_eq!(acl.resource_type, AclResourceType::Topic);
        assert_eq!(acl.resource_name, "transactions");
        assert_eq!(acl.principal, "User:alice");
        assert_eq!(acl.permission_type, AclPermissionType::Allow);
        assert_eq!(acl.operation, AclOperation::Read);
    }

    #[test]
    fn partial_file_without_flags_names_the_gap() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("acl.json");
        fs::write(&path, r#"{"resourceType": "topic", "principal": "User:alice"}"#)
            .expect("write acl");

        let err = build_acl(AclArgs {
            source: Some(path),
            ..AclArgs::default()
        })
        .expect_err("no permission type");
        assert!(matches!(err, CliError::Validation(message) if message == "required flag --permissionType not set"));
    }

    #[test]
    fn missing_enum_flags_are_reported() {
        let err = build_acl(AclArgs {
            resource_type: None,
            ..topic_args()
        })
        .expect_err("no resource type");
        assert!(matches!(err, CliError::Validation(message) if message == "required flag --resourceType not set"));
    }
}
