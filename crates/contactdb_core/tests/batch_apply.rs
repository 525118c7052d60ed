use contactdb_core::db::open_db_in_memory;
use contactdb_core::{
    ContactService, ExceptionDecision, NewChildRecord, NewRawContact, Operation, OperationOutcome,
    RecordKind, Subtype,
};

#[test]
fn batch_applies_operations_in_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();
    let other = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let first = svc
        .insert_child(
            raw,
            &RecordKind::Phone,
            NewChildRecord::with_value("111").subtype(Subtype::Home).primary(),
        )
        .unwrap();

    let outcomes = svc
        .apply(vec![
            Operation::InsertChild {
                raw_contact_id: raw,
                kind: RecordKind::Phone,
                payload: NewChildRecord::with_value("222").subtype(Subtype::Mobile),
            },
            Operation::DeleteChild { data_id: first },
            Operation::SyncAggregationException {
                raw_contact_id: raw,
                target_raw_contact_id: other,
                decision: ExceptionDecision::KeepOut,
            },
        ])
        .unwrap();

    let inserted = match outcomes[0] {
        OperationOutcome::Inserted(id) => id,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(outcomes[1], OperationOutcome::Affected(1));
    assert_eq!(outcomes[2], OperationOutcome::Done);

    // The survivor inherits the primary flag through the delete fix-up.
    assert!(svc.get_child(inserted).unwrap().unwrap().is_primary);
    assert!(svc.get_child(first).unwrap().is_none());
}

#[test]
fn failed_operation_rolls_back_the_whole_batch() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let result = svc.apply(vec![
        Operation::InsertChild {
            raw_contact_id: raw,
            kind: RecordKind::Phone,
            payload: NewChildRecord::with_value("555-1234").subtype(Subtype::Mobile),
        },
        Operation::SetPrimary { data_id: 9999 },
    ]);
    assert!(result.is_err());

    // The insert from the failed batch must not be visible.
    assert!(svc.lookup_phone("555-1234").unwrap().is_empty());
}

#[test]
fn operations_deserialize_from_wire_json() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    let raw = svc.create_raw_contact(&NewRawContact::default()).unwrap();

    let json = format!(
        r#"[{{
            "op": "insert_child",
            "raw_contact_id": {raw},
            "kind": "phone",
            "payload": {{
                "subtype": "mobile",
                "label": null,
                "primary": true,
                "slots": ["555-1234", null, null, null, null, null, null, null,
                          null, null, null, null, null, null, null]
            }}
        }}]"#
    );
    let operations: Vec<Operation> = serde_json::from_str(&json).unwrap();
    let outcomes = svc.apply(operations).unwrap();

    assert!(matches!(outcomes[0], OperationOutcome::Inserted(_)));
    assert_eq!(svc.lookup_phone("555-1234").unwrap().len(), 1);
}

#[test]
fn empty_batch_is_a_successful_noop() {
    let mut conn = open_db_in_memory().unwrap();
    let mut svc = ContactService::with_defaults(&mut conn);
    assert!(svc.apply(Vec::new()).unwrap().is_empty());
}
