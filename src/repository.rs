//! The Schema Repository: an eagerly-populated, read-only index over a FIX
//! Orchestra XML document.
//!
//! Mirrors the shape of the teacher codebase's `DataDictionary` loader (same
//! roxmltree-based, helper-function style), but indexes the FIX Orchestra
//! document shape (`messages` / `fields` / `groups` / `components` /
//! `codeSets`, with `fieldRef` / `groupRef` / `componentRef` structure
//! entries) rather than a classic QuickFIX data dictionary.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use roxmltree::{Document, Node};

use crate::error::RepositoryError;
use crate::spec::{CodeSetSpec, ComponentSpec, FieldSpec, GroupSpec, MessageSpec, StructRef, Tag};

type RResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Default)]
pub struct Repository {
    messages: IndexMap<String, MessageSpec>,
    fields: IndexMap<Tag, FieldSpec>,
    groups: IndexMap<Tag, GroupSpec>,
    components: IndexMap<Tag, ComponentSpec>,
    codesets: IndexMap<Tag, CodeSetSpec>,
    group_by_num_field: HashMap<Tag, Tag>,
}

impl Repository {
    pub fn load<P: AsRef<Path>>(schema_file: P) -> RResult<Self> {
        let xml = fs::read_to_string(schema_file.as_ref())?;
        Repository::from_str(&xml)
    }

    pub fn message_spec_bytype(&self, msg_type: &str) -> Option<&MessageSpec> {
        self.messages.get(msg_type)
    }

    pub fn field_spec_byid(&self, tag: Tag) -> Option<&FieldSpec> {
        self.fields.get(&tag)
    }

    pub fn group_spec_byid(&self, id: Tag) -> Option<&GroupSpec> {
        self.groups.get(&id)
    }

    pub fn group_spec_bynum_field(&self, num_field_tag: Tag) -> Option<&GroupSpec> {
        self.group_by_num_field.get(&num_field_tag).and_then(|id| self.groups.get(id))
    }

    pub fn codeset_spec_byid(&self, id: Tag) -> Option<&CodeSetSpec> {
        self.codesets.get(&id)
    }

    pub fn component_spec_byid(&self, id: Tag) -> Option<&ComponentSpec> {
        self.components.get(&id)
    }
}

impl FromStr for Repository {
    type Err = RepositoryError;

    fn from_str(s: &str) -> RResult<Self> {
        let doc = Document::parse(s)?;
        let mut repo = Repository::default();

        let fields_node = lookup_node("fields", &doc)?;
        for node in children_named(fields_node, "field") {
            let id = get_id_attr(&node)?;
            let name = get_name_attr(&node)?.to_string();
            let raw_type = get_attribute("type", &node)?.to_string();
            if repo.fields.contains_key(&id) {
                return Err(RepositoryError::DuplicateId { kind: "field", id: id.to_string() });
            }
            repo.fields.insert(id, FieldSpec { id, name, raw_type });
        }

        if let Ok(codesets_node) = lookup_node("codeSets", &doc) {
            for node in children_named(codesets_node, "codeSet") {
                let id = get_id_attr(&node)?;
                let name = get_name_attr(&node)?.to_string();
                let underlying_type = get_attribute("type", &node)?.to_string();
                let mut codes = Vec::new();
                for code_node in children_named(node, "code") {
                    let value = get_attribute("value", &code_node)?.to_string();
                    let cname = get_name_attr(&code_node)?.to_string();
                    codes.push((value, cname));
                }
                if repo.codesets.contains_key(&id) {
                    return Err(RepositoryError::DuplicateId { kind: "codeSet", id: id.to_string() });
                }
                repo.codesets.insert(id, CodeSetSpec { id, name, underlying_type, codes });
            }
        }

        if let Ok(components_node) = lookup_node("components", &doc) {
            for node in children_named(components_node, "component") {
                let id = get_id_attr(&node)?;
                let name = get_name_attr(&node)?.to_string();
                let structure = parse_structure_refs(node)?;
                let (field_refs, group_refs, bad_component_ref) = split_refs(&structure);
                if bad_component_ref {
                    return Err(RepositoryError::UnknownXmlTag(
                        "componentRef nested inside a component is not supported".to_string(),
                    ));
                }
                if repo.components.contains_key(&id) {
                    return Err(RepositoryError::DuplicateId { kind: "component", id: id.to_string() });
                }
                repo.components.insert(id, ComponentSpec { id, name, structure, field_refs, group_refs });
            }
        }

        let groups_node = lookup_node("groups", &doc)?;
        for node in children_named(groups_node, "group") {
            let id = get_id_attr(&node)?;
            let name = get_name_attr(&node)?.to_string();
            let num_in_group = node
                .children()
                .find(|n| n.is_element() && n.has_tag_name("numInGroup"))
                .ok_or_else(|| RepositoryError::NodeNotFound(format!("numInGroup in group {}", name)))?;
            let num_field_id = get_id_attr(&num_in_group)?;
            let structure = parse_structure_refs(node)?;
            let (field_refs, group_refs, _) = split_refs(&structure);
            let component_refs = structure
                .iter()
                .filter_map(|r| match r {
                    StructRef::Component(cid) => Some(*cid),
                    _ => None,
                })
                .collect();
            if repo.groups.contains_key(&id) {
                return Err(RepositoryError::DuplicateId { kind: "group", id: id.to_string() });
            }
            if repo.group_by_num_field.contains_key(&num_field_id) {
                return Err(RepositoryError::DuplicateId {
                    kind: "group numInGroup",
                    id: num_field_id.to_string(),
                });
            }
            repo.group_by_num_field.insert(num_field_id, id);
            repo.groups.insert(
                id,
                GroupSpec { id, name, num_field_id, structure, field_refs, group_refs, component_refs },
            );
        }

        let messages_node = lookup_node("messages", &doc)?;
        for node in children_named(messages_node, "message") {
            let name = get_name_attr(&node)?.to_string();
            let msg_type = get_attribute("msgType", &node)?.to_string();
            let category = get_attribute("category", &node)?.to_string();
            let structure_node = node
                .children()
                .find(|n| n.is_element() && n.has_tag_name("structure"))
                .ok_or_else(|| RepositoryError::NodeNotFound(format!("structure in message {}", name)))?;
            let structure = parse_structure_refs(structure_node)?;
            if repo.messages.contains_key(&msg_type) {
                return Err(RepositoryError::DuplicateId { kind: "message", id: msg_type });
            }
            repo.messages.insert(msg_type.clone(), MessageSpec { msg_type, name, category, structure });
        }

        Ok(repo)
    }
}

fn split_refs(structure: &[StructRef]) -> (Vec<Tag>, Vec<Tag>, bool) {
    let mut fields = Vec::new();
    let mut groups = Vec::new();
    let mut saw_component = false;
    for r in structure {
        match r {
            StructRef::Field(t) => fields.push(*t),
            StructRef::Group(t) => groups.push(*t),
            StructRef::Component(_) => saw_component = true,
        }
    }
    (fields, groups, saw_component)
}

fn parse_structure_refs(node: Node) -> RResult<Vec<StructRef>> {
    let mut refs = Vec::new();
    for child in node.children().filter(|n| n.is_element()) {
        let tag_name = child.tag_name().name();
        let r = match tag_name {
            "fieldRef" => StructRef::Field(get_id_attr(&child)?),
            "groupRef" => StructRef::Group(get_id_attr(&child)?),
            "componentRef" => StructRef::Component(get_id_attr(&child)?),
            // the group's own counting field, already read by the caller before
            // calling this function; not part of the structure list itself.
            "numInGroup" => continue,
            other => return Err(RepositoryError::UnknownXmlTag(other.to_string())),
        };
        refs.push(r);
    }
    Ok(refs)
}

fn children_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    let name = name.to_string();
    node.children().filter(move |n| n.is_element() && n.has_tag_name(name.as_str()))
}

fn lookup_node<'a, 'input>(name: &str, document: &'a Document<'input>) -> RResult<Node<'a, 'input>> {
    document
        .root_element()
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == name)
        .ok_or_else(|| RepositoryError::NodeNotFound(name.to_string()))
}

fn get_attribute<'a>(attr: &str, node: &Node<'a, '_>) -> RResult<&'a str> {
    match node.attribute(attr) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RepositoryError::AttributeNotFound(format!("{} on <{}>", attr, node.tag_name().name()))),
    }
}

fn get_name_attr<'a>(node: &Node<'a, '_>) -> RResult<&'a str> {
    get_attribute("name", node)
}

fn get_id_attr(node: &Node) -> RResult<Tag> {
    let raw = get_attribute("id", node)?;
    raw.parse::<Tag>().map_err(|source| RepositoryError::IdNotParsed { source, field: raw.to_string() })
}
