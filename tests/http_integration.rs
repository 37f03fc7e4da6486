//! Integration tests for the Pinecone controller client using wiremock
//!
//! These tests verify request shapes and status handling of
//! [`PineconeClient`] against a mocked controller.

use pinecone_provider::pinecone::{
    ConfigureIndexRequest, ControlPlane, CreateIndexRequest, Error, MetadataConfig, Metric,
    PineconeClient, PodClass, PodSize, PodType,
};
use pinecone_provider::resource::Reconciler;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_api_key";

fn client(server: &MockServer) -> PineconeClient {
    PineconeClient::new("test", API_KEY)
        .unwrap()
        .with_endpoint(&server.uri())
        .unwrap()
}

fn description(name: &str, ready: bool) -> serde_json::Value {
    json!({
        "database": {
            "name": name,
            "metric": "dotproduct",
            "dimension": 1536,
            "replicas": 1,
            "shards": 1,
            "pods": 1,
            "pod_type": "p1.x1",
            "metadata_config": {"indexed": ["potato"]}
        },
        "status": {
            "waiting": null,
            "crashed": null,
            "host": format!("{}-abc.svc.test.pinecone.io", name),
            "port": 433,
            "state": if ready { "Ready" } else { "Initializing" },
            "ready": ready
        }
    })
}

mod client_tests {
    use super::*;

    /// Test list sends the API key and parses the name array
    #[tokio::test]
    async fn test_list_indexes_sends_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases"))
            .and(header("Api-Key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["alpha", "beta"])))
            .expect(1)
            .mount(&server)
            .await;

        let names = client(&server).list_indexes().await.expect("list should succeed");
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    /// Test create posts the full request body
    #[tokio::test]
    async fn test_create_posts_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/databases"))
            .and(header("Api-Key", API_KEY))
            .and(body_json(json!({
                "name": "test",
                "dimension": 1536,
                "metric": "dotproduct",
                "pods": 1,
                "replicas": 1,
                "pod_type": "p1.x1",
                "metadata_config": {"indexed": ["potato"]}
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let req = CreateIndexRequest {
            name: "test".into(),
            dimension: 1536,
            metric: Metric::Dotproduct,
            pods: 1,
            replicas: 1,
            pod_type: PodType::default(),
            metadata_config: Some(MetadataConfig::new(["potato"])),
        };
        client(&server).create_index(&req).await.expect("create should succeed");
    }

    /// Test describe decodes the database and status sections
    #[tokio::test]
    async fn test_describe_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description("test", true)))
            .mount(&server)
            .await;

        let desc = client(&server)
            .describe_index("test")
            .await
            .unwrap()
            .expect("index should exist");

        assert_eq!(desc.database.metric, Metric::Dotproduct);
        assert_eq!(desc.database.metadata_config, Some(MetadataConfig::new(["potato"])));
        assert!(desc.status.ready);
        assert!(desc.status.waiting.is_empty());
    }

    /// Test 404 on describe means absent, not an error
    #[tokio::test]
    async fn test_describe_not_found_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let desc = client(&server).describe_index("ghost").await.unwrap();
        assert!(desc.is_none());
    }

    /// Test server errors on describe surface the status code
    #[tokio::test]
    async fn test_describe_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = client(&server).describe_index("test").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    /// Test delete uses DELETE on the index path
    #[tokio::test]
    async fn test_delete_index() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/databases/test"))
            .and(header("Api-Key", API_KEY))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete_index("test").await.expect("delete should succeed");
    }

    /// Test configure patches only replicas and pod type
    #[tokio::test]
    async fn test_configure_patches_mutable_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/databases/test"))
            .and(body_json(json!({"replicas": 2, "pod_type": "p1.x2"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let req = ConfigureIndexRequest {
            replicas: 2,
            pod_type: PodType::new(PodClass::P1, PodSize::X2),
        };
        client(&server).configure_index("test", &req).await.expect("configure should succeed");
    }

    /// Test client errors are reported with their status code
    #[tokio::test]
    async fn test_create_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/databases"))
            .respond_with(ResponseTemplate::new(409).set_body_string("index already exists"))
            .mount(&server)
            .await;

        let req = CreateIndexRequest {
            name: "test".into(),
            dimension: 8,
            metric: Metric::Cosine,
            pods: 1,
            replicas: 1,
            pod_type: PodType::default(),
            metadata_config: None,
        };
        let err = client(&server).create_index(&req).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 409, .. }));
    }

    /// Test invalid credentials are reported, not retried
    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).list_indexes().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    /// Test missing credentials never reach the network
    #[tokio::test]
    async fn test_missing_credentials_send_nothing() {
        let server = MockServer::start().await;

        let no_environment = PineconeClient::new("", API_KEY)
            .unwrap()
            .with_endpoint(&server.uri())
            .unwrap();
        let err = no_environment.list_indexes().await.unwrap_err();
        assert!(matches!(err, Error::MissingEnvironment));

        let no_key = PineconeClient::new("test", "")
            .unwrap()
            .with_endpoint(&server.uri())
            .unwrap();
        let err = no_key.describe_index("test").await.unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));

        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }
}

mod reconcile_tests {
    use super::*;

    /// Test create keeps polling describe until the index reports ready
    #[tokio::test]
    async fn test_create_waits_for_ready() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/databases"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description("test", false)))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description("test", true)))
            .mount(&server)
            .await;

        let req = CreateIndexRequest {
            name: "test".into(),
            dimension: 1536,
            metric: Metric::Dotproduct,
            pods: 1,
            replicas: 1,
            pod_type: PodType::default(),
            metadata_config: Some(MetadataConfig::new(["potato"])),
        };

        let reconciler = Reconciler::new(Duration::from_millis(10));
        let desc = reconciler.create(&client(&server), &req).await.expect("create should converge");
        assert!(desc.status.ready);

        let describes = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "GET")
            .count();
        assert_eq!(describes, 3);
    }

    /// Test delete polls until describe returns 404
    #[tokio::test]
    async fn test_delete_waits_for_absent() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(description("test", false)))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let reconciler = Reconciler::new(Duration::from_millis(10));
        reconciler.delete(&client(&server), "test").await.expect("delete should converge");
    }

    /// Test a describe failure mid-wait aborts the operation
    #[tokio::test]
    async fn test_describe_failure_aborts_wait() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let req = ConfigureIndexRequest {
            replicas: 2,
            pod_type: PodType::default(),
        };
        let reconciler = Reconciler::new(Duration::from_millis(10));
        let err = reconciler.configure(&client(&server), "test", &req).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    /// Test the timeout also bounds a describe the controller never answers
    #[tokio::test]
    async fn test_timeout_bounds_hung_describe() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(description("test", true))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let reconciler = Reconciler::new(Duration::from_millis(10))
            .with_timeout(Some(Duration::from_millis(100)));

        let started = Instant::now();
        let err = reconciler
            .wait_until_ready(&client(&server), "test")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { ref name, .. } if name == "test"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// Test cancellation interrupts a describe the controller never answers
    #[tokio::test]
    async fn test_cancellation_interrupts_hung_describe() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/databases/test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(description("test", true))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let reconciler = Reconciler::new(Duration::from_millis(10)).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let started = Instant::now();
        let err = reconciler
            .wait_until_ready(&client(&server), "test")
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, Error::Cancelled(ref name) if name == "test"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
