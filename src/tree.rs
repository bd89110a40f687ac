//! The parsed message tree: `Message`, `GroupList`, `Group`, and `Field`.
//!
//! Parents own children through `Rc<RefCell<_>>`; children observe their
//! parent through a non-owning `Weak` back-reference, so the `context`
//! pointer the structural parser walks can move up and down the tree without
//! creating reference cycles (see DESIGN.md's "up-pointer" note).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::repository::Repository;
use crate::spec::{FieldSpec, GroupSpec, MessageSpec, Tag};

#[derive(Clone)]
pub struct Field<'r> {
    pub tag: Tag,
    pub value: String,
    pub spec: Option<&'r FieldSpec>,
}

impl<'r> Field<'r> {
    pub fn new(tag: Tag, value: &str, repo: &'r Repository) -> Self {
        Field { tag, value: value.to_string(), spec: repo.field_spec_byid(tag) }
    }

    /// The schema's symbolic name for this field, or the decimal tag when the
    /// tag is unknown to the repository.
    pub fn tag_name(&self) -> String {
        match self.spec {
            Some(spec) => spec.name().to_string(),
            None => self.tag.to_string(),
        }
    }

    /// The enumeration label for this field's value, or the raw value when
    /// there is no matching codeset entry (or no codeset at all).
    pub fn value_name(&self, repo: &Repository) -> String {
        match self.spec {
            Some(spec) => match spec.enumeration(repo).and_then(|cs| cs.label_for(&self.value)) {
                Some(label) => label.to_string(),
                None => self.value.clone(),
            },
            None => self.value.clone(),
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("tag", &self.tag).field("value", &self.value).finish()
    }
}

/// A child of Message/Group: either a scalar Field or a nested GroupList.
#[derive(Clone)]
pub enum Element<'r> {
    Field(Field<'r>),
    GroupList(Rc<RefCell<GroupListNode<'r>>>),
}

pub struct MessageNode<'r> {
    pub msg_type: String,
    pub spec: Option<&'r MessageSpec>,
    pub children: Vec<Element<'r>>,
}

/// A GroupList's parent is either the Message root or a Group element (never
/// another GroupList directly — see SPEC_FULL.md §4.4 walk-through).
#[derive(Clone)]
pub enum GroupListParent<'r> {
    Message(Weak<RefCell<MessageNode<'r>>>),
    Group(Weak<RefCell<GroupNode<'r>>>),
}

pub struct GroupListNode<'r> {
    pub spec: &'r GroupSpec,
    pub parent: GroupListParent<'r>,
    pub groups: Vec<Rc<RefCell<GroupNode<'r>>>>,
}

pub struct GroupNode<'r> {
    pub spec: &'r GroupSpec,
    pub parent: Weak<RefCell<GroupListNode<'r>>>,
    pub children: Vec<Element<'r>>,
}

/// The parser's single walking pointer. Cheap to clone (an `Rc` bump).
#[derive(Clone)]
pub enum Context<'r> {
    Message(Rc<RefCell<MessageNode<'r>>>),
    GroupList(Rc<RefCell<GroupListNode<'r>>>),
    Group(Rc<RefCell<GroupNode<'r>>>),
}

impl<'r> Context<'r> {
    pub fn in_spec(&self, tag: Tag, repo: &Repository) -> bool {
        match self {
            Context::Message(_) => true,
            Context::GroupList(gl) => gl.borrow().spec.in_spec(tag, repo),
            Context::Group(g) => g.borrow().spec.in_spec(tag, repo),
        }
    }

    /// For Group/GroupList, the spec's declared first field id; absent for
    /// Message (the sentinel that never equals a real tag).
    pub fn group_begin_field_id(&self, repo: &Repository) -> Option<Tag> {
        match self {
            Context::Message(_) => None,
            Context::GroupList(gl) => Some(gl.borrow().spec.first_field_id(repo)),
            Context::Group(g) => Some(g.borrow().spec.first_field_id(repo)),
        }
    }

    /// Appends `field` to this context and returns the context any following
    /// node should actually attach to. For Message/Group this is always
    /// `self`; for a GroupList (only reached by malformed/out-of-order input
    /// where a field lands directly on a GroupList instead of one of its
    /// Group children) a holding Group is opened rather than dropping the
    /// field, and that Group is returned so callers never try to attach a
    /// sibling directly under the GroupList — see DESIGN.md.
    pub fn add_field(&self, field: Field<'r>) -> Context<'r> {
        match self {
            Context::Message(m) => {
                m.borrow_mut().children.push(Element::Field(field));
                self.clone()
            }
            Context::GroupList(gl) => {
                let existing = gl.borrow().groups.last().cloned();
                let target = match existing {
                    Some(last) => last,
                    None => {
                        let spec = gl.borrow().spec;
                        let new_group =
                            Rc::new(RefCell::new(GroupNode { spec, parent: Rc::downgrade(gl), children: Vec::new() }));
                        gl.borrow_mut().groups.push(new_group.clone());
                        new_group
                    }
                };
                target.borrow_mut().children.push(Element::Field(field));
                Context::Group(target)
            }
            Context::Group(g) => {
                g.borrow_mut().children.push(Element::Field(field));
                self.clone()
            }
        }
    }

    pub fn add_group_list(&self, group_list: Rc<RefCell<GroupListNode<'r>>>) {
        match self {
            Context::Message(m) => m.borrow_mut().children.push(Element::GroupList(group_list)),
            Context::Group(g) => g.borrow_mut().children.push(Element::GroupList(group_list)),
            Context::GroupList(_) => unreachable!("a GroupList is never opened directly under another GroupList"),
        }
    }

    pub fn parent(&self) -> Option<Context<'r>> {
        match self {
            Context::Message(_) => None,
            Context::Group(g) => g.borrow().parent.upgrade().map(Context::GroupList),
            Context::GroupList(gl) => match &gl.borrow().parent {
                GroupListParent::Message(w) => w.upgrade().map(Context::Message),
                GroupListParent::Group(w) => w.upgrade().map(Context::Group),
            },
        }
    }
}
