use serde::Deserialize;
use sfbatch::rest::{ErrorKind, SObjectClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{login, ACCESS_TOKEN, DATA_PATH};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Account {
    id: String,
    name: String,
}

#[tokio::test]
async fn test_insert_query_and_clean_up() {
    let server = MockServer::start().await;
    let session = login(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{DATA_PATH}/sobjects/Account")))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "001xx000003DGb2AAG", "success": true, "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DATA_PATH}/query")))
        .and(query_param("q", "SELECT Id, Name FROM Account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalSize": 1,
            "done": true,
            "records": [{
                "attributes": {"type": "Account"},
                "Id": "001xx000003DGb2AAG",
                "Name": "Acme"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DATA_PATH}/composite/sobjects")))
        .and(query_param("ids", "001xx000003DGb2AAG"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "001xx000003DGb2AAG", "success": true, "errors": []}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SObjectClient::new(session).unwrap();

    let id = client
        .insert("Account", &serde_json::json!({"Name": "Acme"}))
        .await
        .unwrap();

    let accounts: Vec<Account> = client
        .query_all("SELECT Id, Name FROM Account")
        .await
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, id);
    assert_eq!(accounts[0].name, "Acme");

    let deleted = client.delete_many(&[id]).await.unwrap();
    assert!(deleted.iter().all(|r| r.success));
}

#[tokio::test]
async fn test_insert_failure_carries_payload() {
    let server = MockServer::start().await;
    let session = login(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{DATA_PATH}/sobjects/Contact")))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"[{"message":"Required fields are missing: [LastName]","errorCode":"REQUIRED_FIELD_MISSING"}]"#,
        ))
        .mount(&server)
        .await;

    let client = SObjectClient::new(session).unwrap();
    let err = client
        .insert("Contact", &serde_json::json!({"FirstName": "Ada"}))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Insert { .. }));
    let message = err.to_string();
    assert!(message.starts_with("Insert of Contact failed."));
    assert!(message.contains("\"FirstName\": \"Ada\""));
    assert!(message.contains("REQUIRED_FIELD_MISSING"));
}
