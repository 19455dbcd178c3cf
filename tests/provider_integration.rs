//! Integration tests for provider configuration against a fake identity service
//!
//! Each test starts a wiremock server that plays the identity v3 API and points `auth_url`
//! at it. Call counts are asserted through `expect`, checked when the server drops.

use hwcloud_provider::{Error, Provider, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REGION: &str = "cn-north-1";

fn token_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        region: REGION.into(),
        token: "user-token".into(),
        domain_id: "d1".into(),
        auth_url: format!("{}/v3", server.uri()),
        max_retries: 1,
        ..ProviderConfig::default()
    }
}

fn aksk_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        region: REGION.into(),
        access_key: "AKTEST".into(),
        secret_key: "SKTEST".into(),
        domain_id: "d1".into(),
        auth_url: format!("{}/v3", server.uri()),
        max_retries: 1,
        ..ProviderConfig::default()
    }
}

fn issued(token: &str, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(201)
        .insert_header("X-Subject-Token", token)
        .set_body_json(body)
}

fn projects(list: &[(&str, &str)]) -> ResponseTemplate {
    let projects: Vec<_> = list
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name, "domain_id": "d1", "enabled": true }))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({ "projects": projects, "links": {} }))
}

/// Mount project- and domain-scoped token issuance for the token credential
async fn mount_token_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .and(body_partial_json(json!({
            "auth": { "scope": { "project": { "name": REGION } } }
        })))
        .respond_with(issued(
            "project-token",
            json!({ "token": { "project": { "id": "p-home", "domain": { "id": "d1" } } } }),
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .and(body_partial_json(json!({
            "auth": { "scope": { "domain": { "id": "d1" } } }
        })))
        .respond_with(issued("domain-token", json!({ "token": { "domain": { "id": "d1" } } })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount the project lookup an AK/SK provider does for its own region
async fn mount_home_project(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .and(query_param("name", REGION))
        .and(query_param("domain_id", "d1"))
        .and(header_exists("authorization"))
        .and(header_exists("x-sdk-date"))
        .respond_with(projects(&[("p-home", REGION)]))
        .expect(1)
        .mount(server)
        .await;
}

mod configure_tests {
    use super::*;

    #[tokio::test]
    async fn test_token_configure_seeds_home_region() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .respond_with(projects(&[]))
            .expect(0)
            .mount(&server)
            .await;

        let provider = Provider::configure(token_config(&server)).await.unwrap();

        assert_eq!(provider.project_client().project_id(), Some("p-home"));
        assert_eq!(provider.project_client().domain_id(), Some("d1"));
        let domain_client = provider.domain_client().expect("domain client should exist");
        assert!(domain_client.is_domain_scoped());
        assert_eq!(provider.region_projects().get(REGION).as_deref(), Some("p-home"));

        let ecs = provider.compute_v1_client(REGION).await.unwrap();
        assert_eq!(ecs.project_id(), "p-home");
        assert_eq!(
            ecs.resource_base,
            "https://ecs.cn-north-1.myhuaweicloud.com/v1/p-home/"
        );
    }

    #[tokio::test]
    async fn test_password_configure_sends_user_and_domain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": { "user": { "name": "alice", "password": "secret" } }
                    }
                }
            })))
            .respond_with(issued(
                "password-token",
                json!({ "token": { "project": { "id": "p-home" }, "user": { "domain": { "id": "d1" } } } }),
            ))
            .expect(2)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            token: String::new(),
            user_name: "alice".into(),
            password: "secret".into(),
            ..token_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        assert_eq!(provider.project_client().project_id(), Some("p-home"));
        assert_eq!(provider.project_client().domain_id(), Some("d1"));
        assert!(provider.domain_client().is_some());
    }

    #[tokio::test]
    async fn test_aksk_configure_looks_up_project_by_region_name() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();

        assert_eq!(provider.project_client().project_id(), Some("p-home"));
        assert_eq!(provider.domain_client().and_then(|c| c.domain_id()), Some("d1"));
        assert!(provider.credentials().is_key_pair());
    }

    #[tokio::test]
    async fn test_aksk_domain_client_discovers_domain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/auth/domains"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "domains": [{ "id": "d-found" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            domain_id: String::new(),
            tenant_id: "p-fixed".into(),
            ..aksk_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        assert_eq!(provider.project_client().project_id(), Some("p-fixed"));
        assert_eq!(provider.domain_client().and_then(|c| c.domain_id()), Some("d-found"));
    }

    #[tokio::test]
    async fn test_agency_assumes_role_with_own_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": { "identity": { "methods": ["token"] }, "scope": { "domain": { "id": "d1" } } }
            })))
            .respond_with(issued("own-token", json!({ "token": { "domain": { "id": "d1" } } })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(header("x-auth-token", "own-token"))
            .and(body_partial_json(json!({
                "auth": {
                    "identity": {
                        "methods": ["assume_role"],
                        "assume_role": { "agency_name": "ops", "domain_name": "target" }
                    },
                    "scope": { "project": { "name": REGION } }
                }
            })))
            .respond_with(issued(
                "agency-project-token",
                json!({ "token": { "project": { "id": "p-delegated", "domain": { "id": "d-target" } } } }),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(header("x-auth-token", "own-token"))
            .and(body_partial_json(json!({
                "auth": {
                    "identity": { "methods": ["assume_role"] },
                    "scope": { "domain": { "name": "target" } }
                }
            })))
            .respond_with(issued(
                "agency-domain-token",
                json!({ "token": { "domain": { "id": "d-target" } } }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            agency_name: "ops".into(),
            agency_domain_name: "target".into(),
            ..token_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        assert_eq!(provider.project_client().project_id(), Some("p-delegated"));
        assert_eq!(provider.project_client().domain_id(), Some("d-target"));
        assert_eq!(provider.domain_client().and_then(|c| c.domain_id()), Some("d-target"));
    }
}

mod failure_tests {
    use super::*;

    async fn mount_no_calls(server: &MockServer) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_negative_max_retries_makes_no_requests() {
        let server = MockServer::start().await;
        mount_no_calls(&server).await;

        let config = ProviderConfig {
            max_retries: -1,
            ..token_config(&server)
        };
        let err = Provider::configure(config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidMaxRetries(-1)));
    }

    #[tokio::test]
    async fn test_missing_credentials_make_no_requests() {
        let server = MockServer::start().await;
        mount_no_calls(&server).await;

        let config = ProviderConfig {
            token: String::new(),
            ..token_config(&server)
        };
        let err = Provider::configure(config).await.unwrap_err();
        assert!(matches!(err, Error::NoAuthMethod));
    }

    #[tokio::test]
    async fn test_unreadable_ca_cert_makes_no_requests() {
        let server = MockServer::start().await;
        mount_no_calls(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig {
            ca_cert: dir.path().join("missing-ca.pem").to_string_lossy().into_owned(),
            ..token_config(&server)
        };
        let err = Provider::configure(config).await.unwrap_err();
        assert!(matches!(err, Error::CredentialRead { what: "CA certificate", .. }));
    }

    #[tokio::test]
    async fn test_project_auth_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": 401, "message": "The request you have made requires authentication." }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = Provider::configure(token_config(&server)).await.unwrap_err();
        match err {
            Error::Authentication(message) => assert!(message.contains("401")),
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_domain_auth_failure_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": { "scope": { "project": { "name": REGION } } }
            })))
            .respond_with(issued(
                "project-token",
                json!({ "token": { "project": { "id": "p-home" } } }),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": { "scope": { "domain": { "id": "d1" } } }
            })))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::configure(token_config(&server)).await.unwrap();
        assert!(provider.domain_client().is_none());

        let err = provider.iam_v3_client(REGION).await.unwrap_err();
        assert!(matches!(err, Error::DomainClientUnavailable(ref s) if s == "iam"));

        let vpc = provider.networking_v1_client(REGION).await.unwrap();
        assert_eq!(vpc.project_id(), "p-home");
    }

    #[tokio::test]
    async fn test_unknown_service_is_rejected() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        let provider = Provider::configure(token_config(&server)).await.unwrap();
        let err = provider.new_service_client("no-such-service", REGION).await.unwrap_err();
        assert!(matches!(err, Error::UnknownService(_)));
    }
}

mod region_tests {
    use super::*;

    #[tokio::test]
    async fn test_region_override_requires_aksk() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .respond_with(projects(&[("p-ap", "ap-southeast-1")]))
            .expect(0)
            .mount(&server)
            .await;

        let provider = Provider::configure(token_config(&server)).await.unwrap();
        let err = provider.compute_v1_client("ap-southeast-1").await.unwrap_err();
        match err {
            Error::RegionMismatch {
                requested,
                configured,
            } => {
                assert_eq!(requested, "ap-southeast-1");
                assert_eq!(configured, REGION);
            }
            other => panic!("expected region mismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aksk_region_lookup_is_cached() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("name", "ap-southeast-1"))
            .and(header("x-project-id", "p-home"))
            .respond_with(projects(&[("p-ap", "ap-southeast-1")]))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();

        for _ in 0..3 {
            let ecs = provider.compute_v1_client("ap-southeast-1").await.unwrap();
            assert_eq!(ecs.region(), "ap-southeast-1");
            assert_eq!(
                ecs.resource_base,
                "https://ecs.ap-southeast-1.myhuaweicloud.com/v1/p-ap/"
            );
        }

        // the base client keeps its own project
        assert_eq!(provider.project_client().project_id(), Some("p-home"));
        assert_eq!(provider.region_projects().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_query() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("name", "eu-west-0"))
            .respond_with(
                projects(&[("p-eu", "eu-west-0")]).set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();

        let results = futures::future::join_all(
            (0..8).map(|_| provider.new_service_client("vpc", "eu-west-0")),
        )
        .await;

        for result in results {
            assert_eq!(result.unwrap().project_id(), "p-eu");
        }
    }

    #[tokio::test]
    async fn test_unknown_region_is_not_cached() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("name", "nowhere-1"))
            .respond_with(projects(&[]))
            .expect(2)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();

        for _ in 0..2 {
            let err = provider.compute_v1_client("nowhere-1").await.unwrap_err();
            assert_eq!(err.to_string(), "wrong name or no access to the region: nowhere-1");
        }
        assert!(provider.region_projects().get("nowhere-1").is_none());
    }

    #[tokio::test]
    async fn test_project_listing_follows_pages_and_seeds_other_regions() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("name", "eu-west-0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [{ "id": "p-east", "name": "cn-east-3" }],
                "links": { "next": format!("{}/v3/projects?marker=p-east", server.uri()) }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("marker", "p-east"))
            .respond_with(projects(&[("p-eu", "eu-west-0")]))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();
        let vpc = provider.networking_v1_client("eu-west-0").await.unwrap();

        assert_eq!(vpc.project_id(), "p-eu");
        assert_eq!(provider.region_projects().get("cn-east-3").as_deref(), Some("p-east"));
    }

    #[tokio::test]
    async fn test_cyclic_project_pages_stop() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        let page = |next: &str| {
            ResponseTemplate::new(200).set_body_json(json!({
                "projects": [],
                "links": { "next": format!("{}/v3/projects?marker={}", server.uri(), next) }
            }))
        };
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("name", "loop-1"))
            .respond_with(page("a"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("marker", "a"))
            .respond_with(page("b"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .and(query_param("marker", "b"))
            .respond_with(page("a"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();
        let err = provider.compute_v1_client("loop-1").await.unwrap_err();
        assert!(matches!(err, Error::RegionNotFound(ref r) if r == "loop-1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_regions_from_spawned_tasks_query_once_each() {
        let server = MockServer::start().await;
        mount_home_project(&server).await;
        for (id, region) in [("p-ap", "ap-southeast-1"), ("p-eu", "eu-west-0")] {
            Mock::given(method("GET"))
                .and(path("/v3/projects"))
                .and(query_param("name", region))
                .respond_with(
                    projects(&[(id, region)]).set_delay(std::time::Duration::from_millis(150)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let provider = Provider::configure(aksk_config(&server)).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let provider = provider.clone();
                let region = if i % 2 == 0 { "ap-southeast-1" } else { "eu-west-0" };
                tokio::spawn(async move {
                    let client = provider.new_service_client("ecs", region).await?;
                    Ok::<_, Error>((region, client.project_id().to_string()))
                })
            })
            .collect();

        for task in tasks {
            let (region, project_id) = task.await.unwrap().unwrap();
            let expected = if region == "ap-southeast-1" { "p-ap" } else { "p-eu" };
            assert_eq!(project_id, expected);
        }
        assert_eq!(provider.region_projects().len(), 3);
    }
}

mod transport_tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_503_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        mount_token_auth(&server).await;

        let provider = Provider::configure(token_config(&server)).await.unwrap();
        assert_eq!(provider.project_client().project_id(), Some("p-home"));
    }

    #[tokio::test]
    async fn test_503_surfaces_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = Provider::configure(token_config(&server)).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_redirected_request_is_signed_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/p-fixed/servers"))
            .respond_with(
                ResponseTemplate::new(307).insert_header("Location", "/v1/p-fixed/servers-moved"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/p-fixed/servers-moved"))
            .and(header_exists("authorization"))
            .and(header("x-project-id", "p-fixed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "servers": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            tenant_id: "p-fixed".into(),
            ..aksk_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        let body = provider
            .project_client()
            .get(&format!("{}/v1/p-fixed/servers", server.uri()))
            .await
            .unwrap();
        assert_eq!(body["servers"], json!([]));

        let requests = server.received_requests().await.unwrap();
        let signatures: Vec<String> = requests
            .iter()
            .filter_map(|r| r.headers.get("authorization"))
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(signatures.len(), 2);
        assert!(signatures.iter().all(|s| s.starts_with("SDK-HMAC-SHA256 Access=AKTEST")));
        assert_ne!(signatures[0], signatures[1]);
    }

    #[tokio::test]
    async fn test_see_other_turns_post_into_bodiless_get() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/p-fixed/jobs"))
            .respond_with(ResponseTemplate::new(303).insert_header("Location", "/v1/p-fixed/jobs/42"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/p-fixed/jobs/42"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "done" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/p-fixed/jobs/42"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            tenant_id: "p-fixed".into(),
            ..aksk_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        let body = provider
            .project_client()
            .post(
                &format!("{}/v1/p-fixed/jobs", server.uri()),
                Some(&json!({ "secret": "do-not-replay" })),
            )
            .await
            .unwrap();
        assert_eq!(body["status"], "done");

        let requests = server.received_requests().await.unwrap();
        let followed = requests
            .iter()
            .find(|r| r.url.path() == "/v1/p-fixed/jobs/42")
            .unwrap();
        assert!(followed.body.is_empty());
    }

    #[tokio::test]
    async fn test_found_after_token_post_drops_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/v3/auth/moved"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/auth/moved"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = Provider::configure(token_config(&server)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let requests = server.received_requests().await.unwrap();
        let moved = requests
            .iter()
            .find(|r| r.url.path() == "/v3/auth/moved")
            .unwrap();
        assert!(moved.body.is_empty());
    }

    #[tokio::test]
    async fn test_temporary_redirect_keeps_method_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/p-fixed/volumes"))
            .respond_with(
                ResponseTemplate::new(307).insert_header("Location", "/v1/p-fixed/volumes-new"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/p-fixed/volumes-new"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({ "volume": { "size": 40 } })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "job_id": "j1" })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            tenant_id: "p-fixed".into(),
            ..aksk_config(&server)
        };
        let provider = Provider::configure(config).await.unwrap();

        let body = provider
            .project_client()
            .post(
                &format!("{}/v1/p-fixed/volumes", server.uri()),
                Some(&json!({ "volume": { "size": 40 } })),
            )
            .await
            .unwrap();
        assert_eq!(body["job_id"], "j1");
    }
}
