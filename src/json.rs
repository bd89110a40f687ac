//! Renders a parsed message tree into a `serde_json::Value`, substituting
//! enumeration labels for raw values. A real `serde_json::Map` cannot hold
//! literal duplicate keys (unlike the hand-built string the reference tool
//! produces), so colliding scalar fields are promoted into an array; a
//! GroupList instead overwrites (or extends) whatever sits under its own
//! name, since that is conventionally the num-in-group field that counts it.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::repository::Repository;
use crate::tree::{Element, GroupNode, MessageNode};

pub fn message_to_json(root: &Rc<RefCell<MessageNode<'_>>>, repo: &Repository) -> Value {
    let mut map = Map::new();
    for element in &root.borrow().children {
        insert_element(&mut map, element, repo);
    }
    Value::Object(map)
}

fn group_to_json(group: &Rc<RefCell<GroupNode<'_>>>, repo: &Repository) -> Value {
    let mut map = Map::new();
    for element in &group.borrow().children {
        insert_element(&mut map, element, repo);
    }
    Value::Object(map)
}

fn insert_element(map: &mut Map<String, Value>, element: &Element<'_>, repo: &Repository) {
    match element {
        Element::Field(field) => {
            let key = field.tag_name();
            let value = Value::String(field.value_name(repo));
            insert_with_collision_policy(map, key, value);
        }
        Element::GroupList(group_list) => {
            let gl = group_list.borrow();
            let key = gl.spec.name().to_string();
            let groups: Vec<Value> = gl.groups.iter().map(|g| group_to_json(g, repo)).collect();
            // A GroupList's name conventionally matches its own num-in-group
            // field's name (e.g. tag 453 "NoPartyIDs" opens the "NoPartyIDs"
            // group), so this key usually already holds the count scalar
            // clause 2 appended as that field's sibling. The array of
            // elements supersedes that count rather than colliding with it;
            // only a genuine re-opening of the same GroupList at this level
            // (the same tag popped out of and back into) should accumulate.
            match map.get_mut(&key) {
                Some(Value::Array(existing)) => existing.extend(groups),
                _ => {
                    map.insert(key, Value::Array(groups));
                }
            }
        }
    }
}

/// On a key collision, wraps the existing value into a one-element array (if
/// it is not one already) and appends the new value.
fn insert_with_collision_policy(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, value);
        }
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let promoted = Value::Array(vec![existing.clone(), value]);
            map.insert(key, promoted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Message;
    use std::str::FromStr;

    const SAMPLE: &str = include_str!("../tests/fixtures/sample_repository.xml");

    #[test]
    fn duplicate_scalar_keys_promote_to_array() {
        let repo = Repository::from_str(SAMPLE).unwrap();
        // ClOrdID (11) repeated twice at the top level of NewOrderSingle.
        let wire = b"35=D\x0111=first\x0154=1\x0111=second\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        assert_eq!(json["ClOrdID"], serde_json::json!(["first", "second"]));
        assert_eq!(json["Side"], "Buy");
    }

    /// Tag 215's field name ("NoRoutingIDs") matches the GroupSpec it opens,
    /// so the rendered array must replace the count scalar under that key
    /// rather than array-promoting it into `[count, [elements...]]`.
    #[test]
    fn group_rendering_replaces_its_own_count_field_rather_than_colliding() {
        let repo = Repository::from_str(SAMPLE).unwrap();
        let wire = b"35=6\x01215=1\x01216=1\x01217=XY\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        let group = json["NoRoutingIDs"].as_array().expect("group list, not the raw count");
        assert_eq!(group.len(), 1);
        assert_eq!(group[0]["RoutingID"], "XY");
    }
}
