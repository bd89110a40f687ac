//! The structural parser: turns a flat token stream into a `Message` tree by
//! walking a single `context` pointer according to the decision procedure
//! (unknown tag / num-in-group open / group-begin / context-miss pop /
//! normal append, evaluated in that order for every token).

use std::cell::RefCell;
use std::rc::Rc;

use crate::repository::Repository;
use crate::spec::Tag;
use crate::tokenizer::Tokenizer;
use crate::tree::{Context, Element, Field, GroupListNode, GroupListParent, GroupNode, MessageNode};

pub struct Message<'r> {
    root: Rc<RefCell<MessageNode<'r>>>,
}

impl<'r> Message<'r> {
    /// Builds the message tree from a raw tag-value buffer. Returns `None`
    /// only when no field with tag 35 (MsgType) was ever seen.
    pub fn parse(bytes: &[u8], repo: &'r Repository) -> Option<Message<'r>> {
        let mut tokens = Tokenizer::new(bytes);
        let mut pre_header = Vec::new();
        let msg_type = loop {
            let token = tokens.next()?;
            if token.tag == 35 {
                break token.value.to_string();
            }
            pre_header.push(Field::new(token.tag, token.value, repo));
        };

        let root = Rc::new(RefCell::new(MessageNode {
            msg_type: msg_type.clone(),
            spec: repo.message_spec_bytype(&msg_type),
            children: pre_header.into_iter().map(Element::Field).collect(),
        }));
        root.borrow_mut().children.push(Element::Field(Field::new(35, &msg_type, repo)));

        let mut context = Context::Message(root.clone());
        for token in tokens {
            let field = Field::new(token.tag, token.value, repo);
            context = advance(context, field, repo);
        }

        Some(Message { root })
    }

    pub fn msg_type(&self) -> String {
        self.root.borrow().msg_type.clone()
    }

    /// True iff the resolved MessageSpec's category is `"Session"`; false
    /// when the MsgType is unknown to the repository.
    pub fn is_admin(&self) -> bool {
        self.root.borrow().spec.map(|s| s.category() == "Session").unwrap_or(false)
    }

    /// First top-level occurrence of `tag`; does not recurse into group
    /// lists.
    pub fn get_field_by_id(&self, tag: Tag) -> Option<Field<'r>> {
        self.root.borrow().children.iter().find_map(|el| match el {
            Element::Field(f) if f.tag == tag => Some(f.clone()),
            _ => None,
        })
    }

    pub fn to_json(&self, repo: &Repository) -> serde_json::Value {
        crate::json::message_to_json(&self.root, repo)
    }
}

fn open_group<'r>(group_list: Rc<RefCell<GroupListNode<'r>>>) -> Rc<RefCell<GroupNode<'r>>> {
    let spec = group_list.borrow().spec;
    let new_group = Rc::new(RefCell::new(GroupNode { spec, parent: Rc::downgrade(&group_list), children: Vec::new() }));
    group_list.borrow_mut().groups.push(new_group.clone());
    new_group
}

fn group_list_parent<'r>(context: &Context<'r>) -> GroupListParent<'r> {
    match context {
        Context::Message(m) => GroupListParent::Message(Rc::downgrade(m)),
        Context::Group(g) => GroupListParent::Group(Rc::downgrade(g)),
        Context::GroupList(_) => unreachable!("a GroupList is never opened directly under another GroupList"),
    }
}

/// Applies the five-clause decision procedure for a single field, returning
/// the context to use for the next token. Clause 4 restarts the procedure
/// against the popped context via the outer `loop`, not recursion.
fn advance<'r>(mut context: Context<'r>, field: Field<'r>, repo: &'r Repository) -> Context<'r> {
    let mut field = field;
    loop {
        // Clause 1: unknown tag.
        let Some(field_spec) = field.spec else {
            return context.add_field(field);
        };

        // Clause 2: num-in-group opens a new list.
        if field_spec.is_num_in_group(repo) {
            while !context.in_spec(field.tag, repo) {
                context = context.parent().expect("message root accepts every field");
            }
            let tag = field.tag;
            // `add_field` may promote a bare GroupList context into the Group
            // that actually received the field (see tree.rs); any nested list
            // this num-in-group opens must attach under that effective
            // context, never directly under a GroupList.
            context = context.add_field(field);
            if let Some(group_spec) = repo.group_spec_bynum_field(tag) {
                let new_list = Rc::new(RefCell::new(GroupListNode {
                    spec: group_spec,
                    parent: group_list_parent(&context),
                    groups: Vec::new(),
                }));
                context.add_group_list(new_list.clone());
                return Context::GroupList(new_list);
            }
            return context;
        }

        // Clause 3: group-begin field.
        if let Some(begin_id) = context.group_begin_field_id(repo) {
            if field.tag == begin_id {
                return match &context {
                    Context::GroupList(gl) => {
                        let new_group = open_group(gl.clone());
                        new_group.borrow_mut().children.push(Element::Field(field));
                        Context::Group(new_group)
                    }
                    Context::Group(g) => {
                        let parent_list = g.borrow().parent.upgrade().expect("group outlives its group list");
                        let new_group = open_group(parent_list);
                        new_group.borrow_mut().children.push(Element::Field(field));
                        Context::Group(new_group)
                    }
                    Context::Message(_) => unreachable!("Message has no group_begin_field_id"),
                };
            }
        }
        // Refinement: a GroupList never takes a bare field as a direct child,
        // even when that field is in-spec but out of order. Open a Group for
        // it anyway so the "GroupList children are all Groups" invariant
        // always holds.
        if let Context::GroupList(gl) = &context {
            if gl.borrow().spec.in_spec(field.tag, repo) {
                let new_group = open_group(gl.clone());
                new_group.borrow_mut().children.push(Element::Field(field));
                return Context::Group(new_group);
            }
        }

        // Clause 4: context miss, pop and restart from clause 1.
        if !context.in_spec(field.tag, repo) {
            context = context.parent().expect("message root accepts every field");
            continue;
        }

        // Clause 5: normal append.
        return context.add_field(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SAMPLE: &str = include_str!("../tests/fixtures/sample_repository.xml");

    fn repo() -> Repository {
        Repository::from_str(SAMPLE).unwrap()
    }

    fn field<'r>(msg: &Message<'r>, tag: Tag) -> Option<Field<'r>> {
        msg.get_field_by_id(tag)
    }

    #[test]
    fn parse_returns_none_without_msg_type() {
        let repo = repo();
        let wire = b"8=FIX.4.4\x0134=1\x01";
        assert!(Message::parse(wire, &repo).is_none());
    }

    #[test]
    fn logon_is_admin_with_no_groups() {
        let repo = repo();
        let wire = b"8=FIX.4.4\x0135=A\x0198=0\x01108=30\x01141=Y\x0110=253\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        assert_eq!(msg.msg_type(), "A");
        assert!(msg.is_admin());
        assert!(matches!(field(&msg, 98).unwrap().value.as_str(), "0"));
        let json = msg.to_json(&repo);
        assert!(json["NoRoutingIDs"].is_null());
    }

    #[test]
    fn unknown_msg_type_is_not_admin_but_still_parses() {
        let repo = repo();
        let wire = b"35=ZZ\x0111=abc\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        assert!(!msg.is_admin());
        assert_eq!(field(&msg, 11).unwrap().value, "abc");
    }

    #[test]
    fn ioi_builds_single_group() {
        let repo = repo();
        let wire = b"35=6\x0123=ID1\x01215=1\x01216=1\x01217=XY\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        let group = json["NoRoutingIDs"].as_array().expect("group list");
        assert_eq!(group.len(), 1);
        assert_eq!(group[0]["RoutingID"], "XY");
    }

    #[test]
    fn trade_capture_report_builds_nested_groups() {
        let repo = repo();
        let wire = b"35=AE\x011003=T1\x01552=2\x0154=1\x01453=2\x01448=SXYZ\x01447=D\x01452=7\x01448=SXYZ\x01447=D\x01452=30\x01578=TFU\x0154=2\x01453=1\x01448=BUYR\x01447=D\x01452=1\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        let sides = json["NoSides"].as_array().expect("NoSides group list");
        assert_eq!(sides.len(), 2);
        let first_side_parties = sides[0]["NoPartyIDs"].as_array().expect("nested group");
        assert_eq!(first_side_parties.len(), 2);
        assert_eq!(first_side_parties[0]["PartyID"], "SXYZ");
        assert_eq!(sides[0]["ExtraGroupField"], "TFU");
        let second_side_parties = sides[1]["NoPartyIDs"].as_array().expect("nested group");
        assert_eq!(second_side_parties.len(), 1);
    }

    #[test]
    fn unknown_tag_is_kept_among_siblings() {
        let repo = repo();
        let wire = b"35=A\x019999=foo\x0198=0\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        assert_eq!(json["9999"], "foo");
        assert_eq!(json["EncryptMethod"], "0");
    }

    #[test]
    fn field_after_group_pops_back_to_sibling() {
        let repo = repo();
        let wire = b"35=6\x01215=1\x01216=1\x01217=XY\x0123=ID1\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        assert_eq!(json["IOIID"], "ID1");
        assert_eq!(json["NoRoutingIDs"].as_array().unwrap().len(), 1);
    }

    /// A nested group's num-in-group tag (453) arrives before the outer
    /// group's own begin field (54), so the outer NoSides element is still a
    /// bare GroupList context when 453 is seen. Must not panic.
    #[test]
    fn nested_group_opening_before_outer_begin_field_does_not_panic() {
        let repo = repo();
        let wire = b"35=AE\x01552=2\x01453=1\x01448=X\x01447=D\x01452=1\x0110=000\x01";
        let msg = Message::parse(wire, &repo).unwrap();
        let json = msg.to_json(&repo);
        let sides = json["NoSides"].as_array().expect("NoSides group list");
        assert_eq!(sides.len(), 1);
        let parties = sides[0]["NoPartyIDs"].as_array().expect("nested group");
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0]["PartyID"], "X");
        assert_eq!(json["CheckSum"], "000");
    }
}
