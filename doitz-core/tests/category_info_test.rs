use doitz_core::{ClientError, CorrelationError, ErrorKind};
use stub_transport::{client, inventory};

mod stub_transport;

#[tokio::test]
async fn test_read_named_categories() {
    let mut client = client(inventory().reverse_batches());

    let info = client
        .category_info()
        .read(&["C__CATG__MODEL", "C__CATS__ROOM"])
        .await
        .unwrap();

    assert_eq!(info.len(), 2);
    assert!(info["C__CATG__MODEL"].get("serial").is_some());
    assert!(info["C__CATG__MODEL"].get("floor").is_none());
    assert!(info["C__CATS__ROOM"].get("floor").is_some());
}

#[tokio::test]
async fn test_read_fails_on_unknown_category() {
    let mut client = client(inventory());

    let error = client
        .category_info()
        .read(&["C__CATG__MODEL", "C__CATG__NOPE"])
        .await
        .unwrap_err();

    match error {
        ClientError::Api(error) => assert_eq!(error.kind, ErrorKind::InvalidParams),
        other => panic!("Expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_read_all_skips_refused_categories() {
    let cmdb = inventory().with_undescribable_category("C__CATG__CUSTOM_FIELDS_RACK");
    let mut client = client(cmdb);

    let info = client.category_info().read_all().await.unwrap();

    let names: Vec<&str> = info.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["C__CATG__IP", "C__CATG__MODEL", "C__CATS__ROOM"]);
}

#[tokio::test]
async fn test_read_all_fails_when_batch_is_rejected() {
    let mut client = client(inventory());
    client
        .transport()
        .cmdb()
        .reject_batches(-32700, "Parse error");

    let error = client.category_info().read_all().await.unwrap_err();

    match error {
        ClientError::Api(error) => assert_eq!(error.kind, ErrorKind::ParseError),
        other => panic!("Expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_read_fails_when_a_category_is_not_answered() {
    let mut client = client(inventory());
    client.transport().cmdb().drop_reply(2);

    let error = client
        .category_info()
        .read(&["C__CATG__MODEL", "C__CATG__IP"])
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ClientError::Correlation(CorrelationError::MissingResponse(2))
    ));
}
