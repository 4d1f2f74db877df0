use effort_hash::{group_id, method_selector, serialize, tx_id, tx_id_string, Id};
use effort_types::{
    transaction::{AppCall, Header, Transaction},
    Address,
};

fn test_header(note: Vec<u8>) -> Header {
    Header {
        sender: Address::ZERO,
        fee: 2000,
        first_valid: 10,
        last_valid: 1010,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: [7; 32],
        note,
        group: None,
    }
}

fn test_call(note: Vec<u8>) -> Transaction {
    Transaction::app_call(
        test_header(note),
        AppCall {
            app_id: 5,
            args: vec![vec![1, 2, 3, 4]],
            ..Default::default()
        },
    )
}

#[test]
fn serialize_omits_empty_fields_in_sorted_order() {
    // apaa, apid, fee, fv, gen, gh, lv, note, snd, type
    let bytes = serialize(&test_call(vec![1]));
    assert_eq!(bytes[0], 0x8a);
    assert_eq!(&bytes[1..6], &[0xa4, b'a', b'p', b'a', b'a']);

    let mut tx = test_call(vec![1]);
    tx.header.fee = 0;
    tx.header.note.clear();
    assert_eq!(serialize(&tx)[0], 0x88);
}

#[test]
fn type_tag_is_last_field_for_app_calls() {
    let bytes = serialize(&test_call(vec![]));
    let tail = &bytes[bytes.len() - 10..];
    assert_eq!(tail, &[0xa4, b't', b'y', b'p', b'e', 0xa4, b'a', b'p', b'p', b'l']);
}

#[test]
fn distinct_notes_give_distinct_ids() {
    let a = test_call(vec![0]);
    let b = test_call(vec![1]);
    assert_ne!(tx_id(&a), tx_id(&b));
    assert_eq!(tx_id(&a), a.id());
    assert_eq!(tx_id_string(&a).len(), 52);
}

#[test]
fn group_assignment() {
    let mut txs = vec![test_call(vec![0]), test_call(vec![1])];
    let ids: Vec<_> = txs.iter().map(tx_id).collect();
    let group = group_id::assign(&mut txs);
    assert_eq!(group, group_id::from_tx_ids(&ids));
    assert!(txs.iter().all(|tx| tx.header.group == Some(group)));
    // Reassigning recomputes from ungrouped ids.
    assert_eq!(group_id::assign(&mut txs), group);
    // Order matters.
    let reversed: Vec<_> = ids.iter().rev().copied().collect();
    assert_ne!(group_id::from_tx_ids(&reversed), group);
}

#[test]
fn abi_method_selector() {
    let selector = method_selector("add(uint64,uint64)uint128");
    assert_eq!(hex::encode(selector), "8aa3b61f");
    assert_ne!(method_selector("mine(address)void"), selector);
}
