use cmdb_stub::EntryStatus;
use doitz_core::{
    ClientError, CorrelationError, DoitzClient, EntrySelector, ErrorKind, SavedEntry,
};
use serde_json::{Map, Value, json};
use stub_transport::{StubTransport, client, client_with_config, inventory, user_config};

mod stub_transport;

fn count(client: &DoitzClient<StubTransport>, status: EntryStatus) -> usize {
    client
        .transport()
        .cmdb()
        .entries(10, "C__CATG__IP", status)
        .len()
}

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

#[tokio::test]
async fn test_save_returns_entries_in_request_order() {
    let mut client = client(inventory().reverse_batches());

    let saved = client
        .category()
        .save(
            &[10, 11],
            "C__CATG__MODEL",
            vec![attrs(json!({ "serial": "SN-1" }))],
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        saved,
        vec![
            SavedEntry {
                object_id: 10,
                category: "C__CATG__MODEL".to_string(),
                entry_id: 1,
            },
            SavedEntry {
                object_id: 11,
                category: "C__CATG__MODEL".to_string(),
                entry_id: 2,
            },
        ]
    );

    let stored = client
        .transport()
        .cmdb()
        .entries(11, "C__CATG__MODEL", EntryStatus::Normal);
    assert_eq!(stored, vec![json!({ "id": 2, "serial": "SN-1" })]);
}

#[tokio::test]
async fn test_save_remaps_user_field_names() {
    let config = user_config(
        r#"[{
            "name": "C__CATG__MODEL",
            "cli_name": "model",
            "params": {
                "serial": { "param": "sn" },
                "firmware": { "param": "fw" }
            }
        }]"#,
    );
    let mut client = client_with_config(inventory(), config);

    client
        .category()
        .save(
            &[10],
            "C__CATG__MODEL",
            vec![attrs(json!({ "sn": "SN-9", "fw": "", "colour": "red" }))],
            None,
        )
        .await
        .unwrap();

    let stored = client
        .transport()
        .cmdb()
        .entries(10, "C__CATG__MODEL", EntryStatus::Normal);
    assert_eq!(stored, vec![json!({ "id": 1, "serial": "SN-9" })]);
}

#[tokio::test]
async fn test_update_targets_existing_entry() {
    let mut client = client(inventory());

    let created = client
        .category()
        .create(&[10], "C__CATG__MODEL", vec![attrs(json!({ "serial": "SN-1" }))])
        .await
        .unwrap();
    let entry_id = created[0].entry_id;

    let updated = client
        .category()
        .update(
            &[10],
            "C__CATG__MODEL",
            vec![attrs(json!({ "firmware": "2.1" }))],
            Some(entry_id),
        )
        .await
        .unwrap();

    assert_eq!(updated[0].entry_id, entry_id);

    let stored = client
        .transport()
        .cmdb()
        .entries(10, "C__CATG__MODEL", EntryStatus::Normal);
    assert_eq!(
        stored,
        vec![json!({ "id": entry_id, "serial": "SN-1", "firmware": "2.1" })]
    );
}

#[tokio::test]
async fn test_read_covers_every_object_and_category() {
    let mut client = client(inventory());

    client
        .category()
        .save(&[10], "C__CATG__MODEL", vec![attrs(json!({ "serial": "A" }))], None)
        .await
        .unwrap();
    client
        .category()
        .save(&[11], "C__CATG__IP", vec![attrs(json!({ "hostname": "db01" }))], None)
        .await
        .unwrap();

    let batch = client
        .category()
        .read(&[10, 11], &["C__CATG__MODEL", "C__CATG__IP"])
        .await
        .unwrap();

    assert_eq!(batch.len(), 4);

    let rows: Vec<&Value> = batch
        .results()
        .filter_map(Value::as_array)
        .flatten()
        .collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|row| row["serial"] == "A" && row["objID"] == "10"));
    assert!(rows.iter().any(|row| row["hostname"] == "db01" && row["objID"] == "11"));
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let mut client = client(inventory());

    let saved = client
        .category()
        .save(
            &[10],
            "C__CATG__IP",
            vec![
                attrs(json!({ "hostname": "web01" })),
                attrs(json!({ "hostname": "web02" })),
            ],
            None,
        )
        .await
        .unwrap();
    assert_eq!(saved.len(), 2);

    client
        .category()
        .archive(&[10], &["C__CATG__IP"], EntrySelector::All)
        .await
        .unwrap();
    assert_eq!(count(&client, EntryStatus::Normal), 0);
    assert_eq!(count(&client, EntryStatus::Archived), 2);

    client
        .category()
        .recycle(&[10], &["C__CATG__IP"], EntrySelector::All)
        .await
        .unwrap();
    assert_eq!(count(&client, EntryStatus::Normal), 2);

    client
        .category()
        .delete(&[10], &["C__CATG__IP"], vec![saved[0].entry_id].into())
        .await
        .unwrap();
    assert_eq!(count(&client, EntryStatus::Normal), 1);
    assert_eq!(count(&client, EntryStatus::Deleted), 1);

    client
        .category()
        .purge(&[10], &["C__CATG__IP"], vec![saved[0].entry_id].into())
        .await
        .unwrap();
    assert_eq!(count(&client, EntryStatus::Deleted), 0);

    client
        .category()
        .quickpurge(&[10], &["C__CATG__IP"], "all".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(count(&client, EntryStatus::Normal), 0);
}

#[tokio::test]
async fn test_first_failure_fails_the_operation() {
    let mut client = client(inventory());

    // Object 20 is a room and has no model category.
    let error = client
        .category()
        .save(&[10, 20], "C__CATG__MODEL", vec![attrs(json!({ "serial": "A" }))], None)
        .await
        .unwrap_err();

    match error {
        ClientError::Api(error) => {
            assert_eq!(error.kind, ErrorKind::SystemError);
            assert_eq!(error.code, -32099);
        }
        other => panic!("Expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_injected_fault_is_classified() {
    let mut client = client(inventory());
    client
        .transport()
        .cmdb()
        .fail_request(2, -32603, "Internal error");

    let error = client
        .category()
        .delete(&[10, 11], &["C__CATG__IP"], EntrySelector::All)
        .await
        .unwrap_err();

    match error {
        ClientError::Api(error) => {
            assert_eq!(error.kind, ErrorKind::InternalError);
            assert!(error.kind.is_transient());
        }
        other => panic!("Expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_archive_all_sends_one_call_per_object_and_category() {
    let mut client = client(inventory());

    client
        .category()
        .archive(&[10, 11], &["C__CATG__MODEL", "C__CATG__IP"], EntrySelector::All)
        .await
        .unwrap();

    let cmdb = client.transport().cmdb();
    let batch = cmdb.received().last().unwrap().as_array().unwrap().clone();

    assert_eq!(batch.len(), 4);
    for call in &batch {
        assert_eq!(call["method"], "cmdb.category.archive");
        assert!(call["params"].get("data").is_none());
        assert!(call["params"].get("entry").is_none());
    }
}

#[tokio::test]
async fn test_save_fails_when_a_reply_is_missing() {
    let mut client = client(inventory().with_object(12, &["C__CATG__MODEL"]));
    client.transport().cmdb().drop_reply(3);

    let error = client
        .category()
        .save(
            &[10, 11, 12],
            "C__CATG__MODEL",
            vec![attrs(json!({ "serial": "SN-1" }))],
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ClientError::Correlation(CorrelationError::MissingResponse(3))
    ));
}
