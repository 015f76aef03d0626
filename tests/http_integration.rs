//! Integration tests for resource lifecycles using wiremock
//!
//! These tests drive resources end to end against mocked Artifactory
//! endpoints: request shapes, response packing, and how missing objects and
//! error statuses are handled.

use artifactory_provider::artifactory::auth::API_KEY_HEADER;
use artifactory_provider::resource::lifecycle;
use artifactory_provider::resources::replication::password_digest;
use artifactory_provider::{ArtifactoryClient, Credentials, ProviderError, ResourceData, ResourceRegistry};
use serde_json::{json, Map, Value};
use std::time::Duration;
use wiremock::matchers::{basic_auth, bearer_token, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ArtifactoryClient {
    ArtifactoryClient::with_credentials(
        &server.uri(),
        Credentials::AccessToken("test-token".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn arguments(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn state(id: &str, value: Value) -> ResourceData {
    let mut data = ResourceData::from_value(value).unwrap();
    data.set_id(id);
    data
}

/// Bodies of every request the server received with the given method
async fn bodies(server: &MockServer, verb: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

mod transport_tests {
    use super::*;

    /// Each credential kind sends its own header
    #[tokio::test]
    async fn test_credentials_are_attached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/system/ping"))
            .and(header(API_KEY_HEADER, "api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/system/ping"))
            .and(basic_auth("admin", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/system/ping"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let timeout = Duration::from_secs(5);
        let api_key = ArtifactoryClient::with_credentials(
            &server.uri(),
            Credentials::ApiKey("api-key".to_string()),
            timeout,
        )
        .unwrap();
        let basic = ArtifactoryClient::with_credentials(
            &server.uri(),
            Credentials::Basic {
                username: "admin".to_string(),
                password: "password".to_string(),
            },
            timeout,
        )
        .unwrap();
        let anonymous =
            ArtifactoryClient::with_credentials(&server.uri(), Credentials::Anonymous, timeout)
                .unwrap();

        assert!(api_key.ping().await.is_ok());
        assert!(basic.ping().await.is_ok());
        assert!(client(&server).ping().await.is_ok());
        assert_eq!(anonymous.ping().await.unwrap_err().status(), Some(404));
    }

    /// Existence checks map 400/404 to absent and keeps other failures as errors
    #[tokio::test]
    async fn test_existence_check() {
        let server = MockServer::start().await;

        for (p, status) in [("/present", 200), ("/missing", 404), ("/bad", 400), ("/broken", 500)] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }

        let client = client(&server);
        assert!(client.probe("present").await.unwrap());
        assert!(!client.probe("missing").await.unwrap());
        assert!(!client.probe("bad").await.unwrap());
        assert_eq!(client.probe("broken").await.unwrap_err().status(), Some(500));

        // never retried
        assert_eq!(bodies(&server, "GET").await.len(), 4);
    }

    /// API failures keep status and body
    #[tokio::test]
    async fn test_api_error_details() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/artifactory/api/repositories/generic-local"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"status": 400, "message": "Repository key already exists"}]
            })))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_local_generic_repository").unwrap();
        let err = lifecycle::apply(resource, &client(&server), None, arguments(json!({"key": "generic-local"})))
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, body, method, .. } => {
                assert_eq!(status, 400);
                assert_eq!(method, "PUT");
                assert!(body.contains("already exists"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}

mod repository_tests {
    use super::*;

    /// Create sends PUT with the API body, then reads back into state
    #[tokio::test]
    async fn test_create_rpm_repository() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/artifactory/api/repositories/rpm-local"))
            .and(bearer_token("test-token"))
            .and(body_partial_json(json!({
                "key": "rpm-local",
                "rclass": "local",
                "packageType": "rpm",
                "yumRootDepth": 3,
                "yumGroupFileNames": "comps.xml"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/repositories/rpm-local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "rpm-local",
                "rclass": "local",
                "packageType": "rpm",
                "repoLayoutRef": "simple-default",
                "yumRootDepth": 3,
                "calculateYumMetadata": true,
                "yumGroupFileNames": "comps.xml",
                "propertySets": ["artifactory"]
            })))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_local_rpm_repository").unwrap();
        let applied = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({
                "key": "rpm-local",
                "yum_root_depth": 3,
                "calculate_yum_metadata": true,
                "yum_group_file_names": "comps.xml"
            })),
        )
        .await
        .unwrap();

        assert_eq!(applied.id(), "rpm-local");
        assert_eq!(applied.get_int("yum_root_depth"), 3);
        assert_eq!(applied.get_string("package_type"), "rpm");
        assert_eq!(applied.get_string_list("property_sets"), vec!["artifactory"]);
    }

    /// Changing a plain argument updates in place with POST
    #[tokio::test]
    async fn test_update_uses_post() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/artifactory/api/repositories/npm-remote"))
            .and(body_partial_json(json!({
                "url": "https://registry.npmjs.org",
                "mismatchingMimeTypesOverrideList": "application/json,text/html"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/repositories/npm-remote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "npm-remote",
                "rclass": "remote",
                "packageType": "npm",
                "url": "https://registry.npmjs.org",
                "mismatchingMimeTypesOverrideList": "text/html,application/json"
            })))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_remote_npm_repository").unwrap();
        let prior = state("npm-remote", json!({"key": "npm-remote", "url": "https://old.example"}));

        let applied = lifecycle::apply(
            resource,
            &client(&server),
            Some(&prior),
            arguments(json!({
                "key": "npm-remote",
                "url": "https://registry.npmjs.org",
                "mismatching_mime_types_override_list": "text/html application/json"
            })),
        )
        .await
        .unwrap();

        assert_eq!(
            applied.get_string("mismatching_mime_types_override_list"),
            "application/json,text/html"
        );
        assert!(bodies(&server, "PUT").await.is_empty());
    }

    /// A repository deleted outside of the provider drops out of state
    #[tokio::test]
    async fn test_read_404_clears_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/repositories/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_virtual_maven_repository").unwrap();
        let refreshed = lifecycle::refresh(resource, &client(&server), &state("gone", json!({"key": "gone"})))
            .await
            .unwrap();

        assert!(refreshed.is_none());
    }

    /// Deleting an already deleted repository succeeds
    #[tokio::test]
    async fn test_delete_tolerates_404() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/artifactory/api/repositories/docker-local"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_local_docker_v2_repository").unwrap();
        lifecycle::destroy(resource, &client(&server), &ResourceData::with_id("docker-local"))
            .await
            .unwrap();
    }
}

mod replication_tests {
    use super::*;

    async fn serve_replication(server: &MockServer, key: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/artifactory/api/replications/{}", key)))
            .respond_with(response)
            .mount(server)
            .await;
    }

    /// A one element list is a push replication
    #[tokio::test]
    async fn test_single_read_push() {
        let server = MockServer::start().await;
        serve_replication(
            &server,
            "libs-local",
            ResponseTemplate::new(200).set_body_json(json!([{
                "repoKey": "libs-local",
                "cronExp": "0 0 * * * ?",
                "url": "https://target.example/artifactory/libs-local",
                "username": "replicator",
                "password": "JE2fNsEThvb1buiH7h7S2RDsGWSdp2EcuG9Pky5AFyRMwE4UzG",
                "socketTimeoutMillis": 15000,
                "enabled": true,
                "syncDeletes": true,
                "proxyRef": "corp-proxy"
            }])),
        )
        .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_single_replication_config").unwrap();
        let prior = state("libs-local", json!({"repo_key": "libs-local", "password": "clear"}));
        let refreshed = lifecycle::refresh(resource, &client(&server), &prior)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(refreshed.get_string("url"), "https://target.example/artifactory/libs-local");
        assert_eq!(refreshed.get_string("proxy"), "corp-proxy");
        assert_eq!(refreshed.get_int("socket_timeout_millis"), 15000);
        assert!(refreshed.get_bool("sync_deletes"));
        assert_eq!(refreshed.get_string("password"), "clear");
    }

    /// An object is a pull replication
    #[tokio::test]
    async fn test_single_read_pull() {
        let server = MockServer::start().await;
        serve_replication(
            &server,
            "npm-remote",
            ResponseTemplate::new(200).set_body_json(json!({
                "repoKey": "npm-remote",
                "cronExp": "0 0 12 * * ?",
                "enableEventReplication": true,
                "enabled": true,
                "pathPrefix": "react"
            })),
        )
        .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_single_replication_config").unwrap();
        let refreshed = lifecycle::import(resource, &client(&server), "npm-remote")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(refreshed.get_string("repo_key"), "npm-remote");
        assert_eq!(refreshed.get_string("cron_exp"), "0 0 12 * * ?");
        assert_eq!(refreshed.get_string("path_prefix"), "react");
        assert!(refreshed.get_bool("enable_event_replication"));
    }

    /// More than one target cannot be represented by the single resource
    #[tokio::test]
    async fn test_single_read_rejects_multiple_targets() {
        let server = MockServer::start().await;
        serve_replication(
            &server,
            "libs-local",
            ResponseTemplate::new(200).set_body_json(json!([
                {"repoKey": "libs-local", "url": "https://a.example"},
                {"repoKey": "libs-local", "url": "https://b.example"}
            ])),
        )
        .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_single_replication_config").unwrap();
        let err = lifecycle::import(resource, &client(&server), "libs-local")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "resource_single_replication_config does not support multiple replication config on a repo. Use resource_artifactory_replication_config instead"
        );
    }

    /// Replication endpoints answer 400 when nothing is configured
    #[tokio::test]
    async fn test_missing_replication_is_absent() {
        let server = MockServer::start().await;
        serve_replication(&server, "none-400", ResponseTemplate::new(400)).await;
        serve_replication(&server, "none-404", ResponseTemplate::new(404)).await;
        serve_replication(&server, "none-empty", ResponseTemplate::new(200).set_body_json(json!([]))).await;

        let registry = ResourceRegistry::new();
        let client = client(&server);
        for type_name in [
            "artifactory_single_replication_config",
            "artifactory_push_replication",
            "artifactory_pull_replication",
        ] {
            let resource = registry.require(type_name).unwrap();
            for key in ["none-400", "none-404"] {
                assert!(lifecycle::import(resource, &client, key).await.unwrap().is_none());
            }
        }

        let single = registry.require("artifactory_single_replication_config").unwrap();
        assert!(lifecycle::import(single, &client, "none-empty").await.unwrap().is_none());
    }

    /// Push replication is created through the multiple endpoint
    #[tokio::test]
    async fn test_push_replication_create() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/artifactory/api/replications/multiple/libs-local"))
            .and(body_partial_json(json!({
                "cronExp": "0 0 * * * ?",
                "replications": [
                    {"repoKey": "libs-local", "url": "https://a.example/artifactory/libs", "password": "pa"},
                    {"repoKey": "libs-local", "url": "https://b.example/artifactory/libs"}
                ]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        serve_replication(
            &server,
            "libs-local",
            ResponseTemplate::new(200).set_body_json(json!([
                {"repoKey": "libs-local", "cronExp": "0 0 * * * ?", "url": "https://a.example/artifactory/libs", "password": "scrambled-a"},
                {"repoKey": "libs-local", "cronExp": "0 0 * * * ?", "url": "https://b.example/artifactory/libs", "password": "scrambled-b"}
            ])),
        )
        .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_push_replication").unwrap();
        let applied = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({
                "repo_key": "libs-local",
                "cron_exp": "0 0 * * * ?",
                "replications": [
                    {"url": "https://a.example/artifactory/libs", "password": "pa"},
                    {"url": "https://b.example/artifactory/libs"}
                ]
            })),
        )
        .await
        .unwrap();

        let targets = applied.get_blocks("replications");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].get_string("password"), password_digest("scrambled-a"));
        assert_eq!(targets[1].get_string("url"), "https://b.example/artifactory/libs");
    }

    /// Pull replication refuses a push shaped answer
    #[tokio::test]
    async fn test_pull_rejects_push_shape() {
        let server = MockServer::start().await;
        serve_replication(
            &server,
            "libs-local",
            ResponseTemplate::new(200).set_body_json(json!([{"repoKey": "libs-local"}])),
        )
        .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_pull_replication").unwrap();
        let err = lifecycle::import(resource, &client(&server), "libs-local")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    /// Invalid cron expressions fail before any request
    #[tokio::test]
    async fn test_cron_validated_before_request() {
        let server = MockServer::start().await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_pull_replication").unwrap();
        let err = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({"repo_key": "npm-remote", "cron_exp": "every day"})),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}

mod backup_tests {
    use super::*;

    const CONFIG_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<config xmlns="http://artifactory.jfrog.org/xsd/3.1.0">
    <backups>
        <backup>
            <key>backup-a</key>
            <enabled>true</enabled>
            <cronExp>0 0 1 * * ?</cronExp>
            <retentionPeriodHours>168</retentionPeriodHours>
            <createArchive>false</createArchive>
            <excludedRepositories>
                <repositoryRef>jcenter</repositoryRef>
            </excludedRepositories>
            <sendMailOnError>true</sendMailOnError>
            <excludeNewRepositories>false</excludeNewRepositories>
        </backup>
        <backup>
            <key>backup-b</key>
            <enabled>false</enabled>
            <cronExp>0 0 2 * * ?</cronExp>
            <retentionPeriodHours>24</retentionPeriodHours>
            <createArchive>true</createArchive>
            <excludedRepositories/>
            <sendMailOnError>false</sendMailOnError>
            <excludeNewRepositories>true</excludeNewRepositories>
        </backup>
        <backup>
            <key>backup-c</key>
            <enabled>true</enabled>
            <cronExp>0 0 3 * * ?</cronExp>
            <retentionPeriodHours>0</retentionPeriodHours>
            <createArchive>false</createArchive>
            <excludedRepositories/>
            <sendMailOnError>true</sendMailOnError>
            <excludeNewRepositories>false</excludeNewRepositories>
        </backup>
    </backups>
</config>"#;

    async fn serve_configuration(server: &MockServer, xml: &str) {
        Mock::given(method("GET"))
            .and(path("/artifactory/api/system/configuration"))
            .and(header("accept", "application/xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml))
            .mount(server)
            .await;
    }

    async fn accept_patches(server: &MockServer) {
        Mock::given(method("PATCH"))
            .and(path("/artifactory/api/system/configuration"))
            .and(header("content-type", "application/yaml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    /// Create patches the backup in and reads it back from the XML
    #[tokio::test]
    async fn test_create_backup() {
        let server = MockServer::start().await;
        serve_configuration(&server, CONFIG_XML).await;
        accept_patches(&server).await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_backup").unwrap();
        let applied = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({
                "key": "backup-a",
                "cron_exp": "0 0 1 * * ?",
                "excluded_repositories": ["jcenter"]
            })),
        )
        .await
        .unwrap();

        assert_eq!(applied.get_string_list("excluded_repositories"), vec!["jcenter"]);
        assert_eq!(applied.get_int("retention_period_hours"), 168);

        let patches = bodies(&server, "PATCH").await;
        assert_eq!(patches.len(), 1);
        let patch: serde_yaml::Value = serde_yaml::from_str(&patches[0]).unwrap();
        assert_eq!(patch["backups"]["backup-a"]["cronExp"].as_str(), Some("0 0 1 * * ?"));
        assert_eq!(patch["backups"]["backup-a"]["sendMailOnError"].as_bool(), Some(true));
    }

    /// Delete clears all backups, then restores the siblings unchanged
    #[tokio::test]
    async fn test_delete_restores_siblings() {
        let server = MockServer::start().await;
        serve_configuration(&server, CONFIG_XML).await;
        accept_patches(&server).await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_backup").unwrap();
        lifecycle::destroy(resource, &client(&server), &ResourceData::with_id("backup-b"))
            .await
            .unwrap();

        let patches = bodies(&server, "PATCH").await;
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].trim(), "backups: ~");

        let restore: serde_yaml::Value = serde_yaml::from_str(&patches[1]).unwrap();
        let restored = restore["backups"].as_mapping().unwrap();
        assert_eq!(restored.len(), 2);
        assert!(restore["backups"].get("backup-b").is_none());
        assert_eq!(restore["backups"]["backup-a"]["excludedRepositories"][0].as_str(), Some("jcenter"));
        assert_eq!(restore["backups"]["backup-c"]["retentionPeriodHours"].as_i64(), Some(0));
        assert_eq!(restore["backups"]["backup-c"]["cronExp"].as_str(), Some("0 0 3 * * ?"));
    }

    /// Deleting the only backup sends just the clear patch
    #[tokio::test]
    async fn test_delete_last_backup() {
        let server = MockServer::start().await;
        serve_configuration(
            &server,
            "<config><backups><backup><key>only</key><cronExp>0 0 1 * * ?</cronExp></backup></backups></config>",
        )
        .await;
        accept_patches(&server).await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_backup").unwrap();
        lifecycle::destroy(resource, &client(&server), &ResourceData::with_id("only"))
            .await
            .unwrap();

        assert_eq!(bodies(&server, "PATCH").await.len(), 1);
    }

    /// A backup missing from the configuration is absent
    #[tokio::test]
    async fn test_read_missing_backup() {
        let server = MockServer::start().await;
        serve_configuration(&server, CONFIG_XML).await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_backup").unwrap();
        let refreshed = lifecycle::refresh(
            resource,
            &client(&server),
            &state("backup-z", json!({"key": "backup-z"})),
        )
        .await
        .unwrap();

        assert!(refreshed.is_none());
    }
}

mod webhook_tests {
    use super::*;

    /// Criteria matching nothing is rejected without contacting the server
    #[tokio::test]
    async fn test_empty_repository_criteria_makes_no_request() {
        let server = MockServer::start().await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_artifact_webhook").unwrap();
        let err = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({
                "key": "hook",
                "description": "test description",
                "event_types": ["deployed", "deleted", "moved", "copied", "cached"],
                "criteria": {"any_local": false, "any_remote": false, "repo_keys": []},
                "url": "http://tempurl.org"
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "repo_keys cannot be empty when both any_local and any_remote are false"
        );
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    /// Create posts the subscription and reads it back by key
    #[tokio::test]
    async fn test_create_build_webhook() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/event/api/v1/subscriptions"))
            .and(body_partial_json(json!({
                "key": "build-hook",
                "enabled": true,
                "event_filter": {
                    "domain": "build",
                    "event_types": ["uploaded"],
                    "criteria": {"anyBuild": false, "selectedBuilds": ["app"]}
                },
                "handlers": [{"handler_type": "webhook", "url": "https://hooks.example/build", "secret": "s3cr3t"}]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/event/api/v1/subscriptions/build-hook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "build-hook",
                "description": "",
                "enabled": true,
                "event_filter": {
                    "domain": "build",
                    "event_types": ["uploaded"],
                    "criteria": {"anyBuild": false, "selectedBuilds": ["app"], "includePatterns": [], "excludePatterns": []}
                },
                "handlers": [{
                    "handler_type": "webhook",
                    "url": "https://hooks.example/build",
                    "custom_http_headers": [{"name": "X-Team", "value": "ci"}]
                }]
            })))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_build_webhook").unwrap();
        let applied = lifecycle::apply(
            resource,
            &client(&server),
            None,
            arguments(json!({
                "key": "build-hook",
                "event_types": ["uploaded"],
                "criteria": {"any_build": false, "selected_builds": ["app"]},
                "url": "https://hooks.example/build",
                "secret": "s3cr3t",
                "custom_http_headers": {"X-Team": "ci"}
            })),
        )
        .await
        .unwrap();

        assert_eq!(applied.id(), "build-hook");
        assert_eq!(applied.get_string("secret"), "s3cr3t");
        assert_eq!(applied.get_string_map("custom_http_headers").get("X-Team").map(String::as_str), Some("ci"));
        let criteria = applied.get_block("criteria").unwrap();
        assert_eq!(criteria.get_string_list("selected_builds"), vec!["app"]);
    }
}

mod dispatch_tests {
    use super::*;
    use artifactory_provider::resource::{execute, Operation};

    /// Operations are dispatched by resource type name
    #[tokio::test]
    async fn test_execute_read() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/repositories/helm-virtual"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "helm-virtual",
                "rclass": "virtual",
                "packageType": "helm",
                "repositories": ["helm-local", "helm-remote"],
                "defaultDeploymentRepo": "helm-local"
            })))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let client = client(&server);
        let mut data = ResourceData::with_id("helm-virtual");
        execute(&registry, &client, Operation::Read, "artifactory_virtual_helm_repository", &mut data)
            .await
            .unwrap();

        assert_eq!(data.get_string_list("repositories"), vec!["helm-local", "helm-remote"]);
        assert_eq!(data.get_string("default_deployment_repo"), "helm-local");

        let err = execute(&registry, &client, Operation::Delete, "artifactory_nope", &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }
}

mod reapply_tests {
    use super::*;

    async fn apply_twice(
        server: &MockServer,
        type_name: &str,
        config: Value,
    ) -> (ResourceData, ResourceData) {
        let registry = ResourceRegistry::new();
        let resource = registry.require(type_name).unwrap();
        let client = client(server);

        let first = lifecycle::apply(resource, &client, None, arguments(config.clone()))
            .await
            .unwrap();
        let second = lifecycle::apply(resource, &client, Some(&first), arguments(config))
            .await
            .unwrap();
        (first, second)
    }

    /// Normalized MIME lists and sets settle after the first apply
    #[tokio::test]
    async fn test_npm_remote_settles() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/artifactory/api/repositories/npm-remote"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/artifactory/api/repositories/npm-remote"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/repositories/npm-remote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "npm-remote",
                "rclass": "remote",
                "packageType": "npm",
                "url": "https://registry.npmjs.org",
                "repoLayoutRef": "npm-default",
                "storeArtifactsLocally": true,
                "socketTimeoutMillis": 15000,
                "retrievalCachePeriodSecs": 7200,
                "missedRetrievalCachePeriodSecs": 1800,
                "assumedOfflinePeriodSecs": 300,
                "blockMismatchingMimeTypes": true,
                "listRemoteFolderItems": true,
                "propertySets": ["artifactory", "npm"],
                "mismatchingMimeTypesOverrideList": "text/plain,application/json"
            })))
            .mount(&server)
            .await;

        let (first, second) = apply_twice(
            &server,
            "artifactory_remote_npm_repository",
            json!({
                "key": "npm-remote",
                "url": "https://registry.npmjs.org",
                "password": "hunter2",
                "property_sets": ["npm", "artifactory"],
                "mismatching_mime_types_override_list": "text/plain,application/json"
            }),
        )
        .await;

        assert_eq!(second, first);
        assert_eq!(bodies(&server, "PUT").await.len(), 1);
        assert!(bodies(&server, "POST").await.is_empty());
    }

    /// Unordered event types and a partly filled criteria block settle
    #[tokio::test]
    async fn test_webhook_settles() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/event/api/v1/subscriptions"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/event/api/v1/subscriptions/artifact-hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/event/api/v1/subscriptions/artifact-hook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "artifact-hook",
                "enabled": true,
                "event_filter": {
                    "domain": "artifact",
                    "event_types": ["deployed", "moved"],
                    "criteria": {"anyLocal": true, "anyRemote": false, "repoKeys": [], "includePatterns": [], "excludePatterns": []}
                },
                "handlers": [{"handler_type": "webhook", "url": "https://hooks.example/artifact"}]
            })))
            .mount(&server)
            .await;

        let (_, second) = apply_twice(
            &server,
            "artifactory_artifact_webhook",
            json!({
                "key": "artifact-hook",
                "event_types": ["moved", "deployed"],
                "criteria": {"any_local": true, "any_remote": false},
                "url": "https://hooks.example/artifact",
                "secret": "s3cr3t"
            }),
        )
        .await;

        assert_eq!(second.get_string("secret"), "s3cr3t");
        assert!(bodies(&server, "PUT").await.is_empty());
    }

    /// Target passwords stored as digests do not trigger updates
    #[tokio::test]
    async fn test_push_replication_settles() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/artifactory/api/replications/multiple/libs-local"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/artifactory/api/replications/multiple/libs-local"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artifactory/api/replications/libs-local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"repoKey": "libs-local", "cronExp": "0 0 * * * ?", "url": "https://a.example/artifactory/libs", "password": "scrambled-a"},
                {"repoKey": "libs-local", "cronExp": "0 0 * * * ?", "url": "https://b.example/artifactory/libs", "password": "scrambled-b"}
            ])))
            .mount(&server)
            .await;

        apply_twice(
            &server,
            "artifactory_push_replication",
            json!({
                "repo_key": "libs-local",
                "cron_exp": "0 0 * * * ?",
                "replications": [
                    {"url": "https://a.example/artifactory/libs", "password": "pa"},
                    {"url": "https://b.example/artifactory/libs", "password": "pb"}
                ]
            }),
        )
        .await;

        assert_eq!(bodies(&server, "PUT").await.len(), 1);
        assert!(bodies(&server, "POST").await.is_empty());
    }

    /// Import of a missing object stops at the existence check
    #[tokio::test]
    async fn test_import_missing_makes_one_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/event/api/v1/subscriptions/nope"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new();
        let resource = registry.require("artifactory_build_webhook").unwrap();
        assert!(lifecycle::import(resource, &client(&server), "nope").await.unwrap().is_none());
    }
}
