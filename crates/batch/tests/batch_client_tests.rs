use chickmate_batch::ledger::MortalityInput;
use chickmate_batch::{
    BatchClient, BatchError, EntryKind, EntryLedger, EntryPayload, ItemCategory, RecordedEntry,
    Unit, CLIENT_INFO,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup_client(server_uri: &str) -> BatchClient {
    BatchClient::new(server_uri, reqwest::Client::new())
}

#[tokio::test]
async fn test_list_batches_fetches_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/batches"))
        .and(header("X-Client-Info", CLIENT_INFO))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["B-1", "B-2"])))
        .mount(&server)
        .await;

    for (id, name, population) in [("B-1", "Broilers", 1000), ("B-2", "Layers", 450)] {
        Mock::given(method("GET"))
            .and(path(format!("/batch/{}", id)))
            .and(header_exists("X-Client-Info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": name,
                "startDate": "2024-03-01",
                "currentChicken": population
            })))
            .mount(&server)
            .await;
    }

    let batches = setup_client(&server.uri()).list_batches().await.unwrap();

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].id, "B-1");
    assert_eq!(batches[0].population, 1000);
    assert_eq!(batches[1].name, "Layers");
}

#[tokio::test]
async fn test_empty_batch_list_encoded_as_null() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let batches = setup_client(&server.uri()).list_batches().await.unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_get_batch_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/batch/B-404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Batch not found\n"))
        .mount(&server)
        .await;

    match setup_client(&server.uri()).get_batch("B-404").await {
        Err(BatchError::NotFound(message)) => assert_eq!(message, "Batch not found"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uniqueBatchIDs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .mount(&server)
        .await;

    match setup_client(&server.uri()).unique_batch_ids().await {
        Err(BatchError::ApiError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Server error");
        }
        other => panic!("Expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_id_list_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uniqueBatchIDs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uniqueBatchesFromCmBatches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["B-1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mortalityIDs/B-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["M-1", "M-2"])))
        .mount(&server)
        .await;

    let client = setup_client(&server.uri());
    assert_eq!(client.unique_batch_ids().await.unwrap(), vec!["1", "2", "3"]);
    assert_eq!(
        client.unique_batches_from_cm_batches().await.unwrap(),
        vec!["B-1"]
    );
    assert_eq!(client.mortality_ids("B-1").await.unwrap(), vec!["M-1", "M-2"]);
}

#[tokio::test]
async fn test_feed_medicine_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedmedicineitems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "name": "Finisher Feed", "category": "feed", "defaultUnit": "kg" },
            { "id": "m2", "name": "Electrolytes", "category": "medicine" }
        ])))
        .mount(&server)
        .await;

    let items = setup_client(&server.uri())
        .feed_medicine_items()
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "11");
    assert_eq!(items[0].default_unit, Some(Unit::Kg));
    assert_eq!(items[1].category, ItemCategory::Medicine);
    assert_eq!(items[1].default_unit, None);

    let mut ledger = EntryLedger::new();
    ledger.replace_items(items);
    assert_eq!(ledger.feed_medicine_items().count(), 2);
    assert_eq!(ledger.general_items().count(), 0);
}

#[tokio::test]
async fn test_record_mortality_uses_server_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mortality"))
        .and(header("X-Client-Info", CLIENT_INFO))
        .and(body_partial_json(json!({
            "batchId": "B-1",
            "count": 3,
            "cause": "heat stress"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "mortalityId": "M-501",
            "batchId": "B-1",
            "count": 3,
            "cause": "heat stress"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = setup_client(&server.uri());
    let mut ledger = EntryLedger::new();
    ledger
        .record_mortality_local(MortalityInput {
            batch_id: "B-1".to_string(),
            count: 1,
            cause: None,
        })
        .unwrap();

    let entry = ledger
        .record_mortality(
            &client,
            MortalityInput {
                batch_id: "B-1".to_string(),
                count: 3,
                cause: Some(" heat stress ".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.backend_mortality_id.as_deref(), Some("M-501"));
    assert_eq!(ledger.len(EntryKind::Mortality), 2);
    assert_eq!(ledger.mortality()[0], entry);
    assert!(ledger.mortality()[0].is_confirmed());
    assert!(!ledger.mortality()[1].is_confirmed());
}

#[tokio::test]
async fn test_record_mortality_failure_leaves_state_unchanged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mortality"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .expect(1)
        .mount(&server)
        .await;

    let client = setup_client(&server.uri());
    let mut ledger = EntryLedger::new();
    ledger
        .record_mortality_local(MortalityInput {
            batch_id: "B-1".to_string(),
            count: 2,
            cause: None,
        })
        .unwrap();
    let before = ledger.clone();

    let result = ledger
        .record_mortality(
            &client,
            MortalityInput {
                batch_id: "B-1".to_string(),
                count: 5,
                cause: None,
            },
        )
        .await;

    assert!(matches!(result, Err(BatchError::ApiError { status: 500, .. })));
    assert_eq!(ledger, before);
}

#[tokio::test]
async fn test_record_mortality_network_failure() {
    let client = setup_client("http://127.0.0.1:9");
    let mut ledger = EntryLedger::new();

    let err = ledger
        .record_mortality(
            &client,
            MortalityInput {
                batch_id: "B-1".to_string(),
                count: 1,
                cause: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::NetworkError(_)));
    assert_eq!(
        err.user_message(),
        "Failed to connect to the server. Please try again."
    );
    assert!(ledger.is_empty(EntryKind::Mortality));
}

#[tokio::test]
async fn test_record_mortality_invalid_count_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mortality"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut ledger = EntryLedger::new();
    let err = ledger
        .record_mortality(
            &setup_client(&server.uri()),
            MortalityInput {
                batch_id: "B-1".to_string(),
                count: 0,
                cause: None,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Enter a count");
    assert!(ledger.is_empty(EntryKind::Mortality));
}

#[tokio::test]
async fn test_record_dispatches_mortality_to_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mortality"))
        .and(body_partial_json(json!({ "batchId": "B-2", "count": 2 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "mortalityID": 88,
            "batchId": "B-2",
            "count": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ledger = EntryLedger::new();
    let recorded = ledger
        .record(
            &setup_client(&server.uri()),
            EntryPayload::Mortality(MortalityInput {
                batch_id: "B-2".to_string(),
                count: 2,
                cause: None,
            }),
        )
        .await
        .unwrap();

    let entry = match recorded {
        RecordedEntry::Mortality(entry) => entry,
        other => panic!("Expected a mortality entry, got {:?}", other),
    };
    assert!(entry.is_confirmed());
    assert_eq!(entry.backend_mortality_id.as_deref(), Some("88"));
    // a zero count in the echo does not replace the validated count
    assert_eq!(entry.count, 2);
    assert_eq!(ledger.mortality(), &[entry]);
}
