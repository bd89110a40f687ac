//! End-to-end scenarios against the sample schema fixture, mirroring the
//! documented Logon/Heartbeat/IOI/TradeCaptureReport/unknown-tag/pop-on-miss
//! cases.

use std::str::FromStr;

use fix_orchestra::{Message, Repository};

const SAMPLE: &str = include_str!("fixtures/sample_repository.xml");

fn repo() -> Repository {
    Repository::from_str(SAMPLE).expect("sample repository should load")
}

#[test]
fn e1_logon() {
    let repo = repo();
    let wire = b"8=FIX.4.4\x019=75\x0135=A\x0149=ICE\x0134=1\x0152=20200323-22:55:02.500417\x0156=110\x0157=4\x0198=0\x01108=30\x01141=Y\x0110=253\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    assert_eq!(msg.msg_type(), "A");
    assert_eq!(msg.get_field_by_id(35).unwrap().value_name(&repo), "Logon");
    assert!(msg.is_admin());
    let json = msg.to_json(&repo);
    assert!(json.get("NoRoutingIDs").is_none());
}

#[test]
fn e2_heartbeat() {
    let repo = repo();
    let wire = b"8=FIX.4.4\x019=58\x0135=0\x0149=ICE\x0134=65\x0110=239\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    assert_eq!(msg.msg_type(), "0");
    assert!(msg.is_admin());
}

#[test]
fn e3_ioi_single_group() {
    let repo = repo();
    let wire = b"35=6\x0123=ID1\x01215=1\x01216=1\x01217=XY\x0110=000\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    assert!(!msg.is_admin());
    let json = msg.to_json(&repo);
    let groups = json["NoRoutingIDs"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["RoutingType"], "1");
    assert_eq!(groups[0]["RoutingID"], "XY");
}

#[test]
fn e4_trade_capture_report_nested_groups() {
    let repo = repo();
    let wire = b"35=AE\x011003=T1\x01552=2\x0154=1\x01453=2\x01448=SXYZ\x01447=D\x01452=7\x01448=SXYZ\x01447=D\x01452=30\x01578=TFU\x0154=2\x01453=0\x0110=000\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    let json = msg.to_json(&repo);
    let sides = json["NoSides"].as_array().unwrap();
    assert_eq!(sides.len(), 2);
    assert_eq!(sides[0]["Side"], "Buy");
    let parties = sides[0]["NoPartyIDs"].as_array().unwrap();
    assert_eq!(parties.len(), 2);
    assert_eq!(parties[1]["PartyRole"], "30");
    assert_eq!(sides[1]["Side"], "Sell");
}

#[test]
fn e5_unknown_tag_tolerance() {
    let repo = repo();
    let wire = b"8=FIX.4.4\x019=75\x0135=A\x019999=foo\x0149=ICE\x0134=1\x0152=20200323-22:55:02.500417\x0156=110\x0157=4\x0198=0\x01108=30\x01141=Y\x0110=253\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    let json = msg.to_json(&repo);
    assert_eq!(json["9999"], "foo");
}

#[test]
fn e6_pop_on_miss() {
    let repo = repo();
    // 23 (IOIID) arrives right after the single group element, with no
    // sentinel marking the end of the group.
    let wire = b"35=6\x01215=1\x01216=1\x01217=XY\x0123=ID1\x0110=000\x01";
    let msg = Message::parse(wire, &repo).unwrap();
    let json = msg.to_json(&repo);
    assert_eq!(json["IOIID"], "ID1");
    assert_eq!(json["NoRoutingIDs"].as_array().unwrap().len(), 1);
}
