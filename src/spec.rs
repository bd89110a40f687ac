//! Spec objects: the typed view over a parsed FIX Orchestra repository.
//!
//! Each spec kind exposes the structural queries the parser needs —
//! `in_spec`, the num-in-group predicate, and the "what field starts this
//! group" lookup — without leaking the XML shape the Repository loaded them
//! from.

use crate::repository::Repository;

pub type Tag = u32;

/// A single entry in a message/group/component's declared structure, kept in
/// document order so "the first field id" can be derived without a second
/// pass over the XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructRef {
    Field(Tag),
    Group(Tag),
    Component(Tag),
}

#[derive(Debug, Clone, getset::Getters, getset::CopyGetters)]
pub struct FieldSpec {
    #[getset(get_copy = "pub")]
    pub(crate) id: Tag,
    #[getset(get = "pub")]
    pub(crate) name: String,
    #[getset(get = "pub")]
    pub(crate) raw_type: String,
}

impl FieldSpec {
    /// The field's logical type, resolved through its codeset when `raw_type`
    /// names one (Orchestra convention: `type="FooCodeSet"`). A field's
    /// codeset, when it has one, is registered under the field's own id.
    pub fn resolved_type<'r>(&'r self, repo: &'r Repository) -> &'r str {
        if self.raw_type.ends_with("CodeSet") {
            if let Some(cs) = repo.codeset_spec_byid(self.id) {
                return cs.underlying_type();
            }
        }
        &self.raw_type
    }

    pub fn is_num_in_group(&self, repo: &Repository) -> bool {
        self.resolved_type(repo) == "NumInGroup"
    }

    pub fn enumeration<'r>(&self, repo: &'r Repository) -> Option<&'r CodeSetSpec> {
        repo.codeset_spec_byid(self.id)
    }

    pub fn associated_group<'r>(&self, repo: &'r Repository) -> Option<&'r GroupSpec> {
        if self.is_num_in_group(repo) {
            repo.group_spec_bynum_field(self.id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeSetSpec {
    pub(crate) id: Tag,
    pub(crate) name: String,
    pub(crate) underlying_type: String,
    pub(crate) codes: Vec<(String, String)>,
}

impl CodeSetSpec {
    pub fn id(&self) -> Tag {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn underlying_type(&self) -> &str {
        &self.underlying_type
    }

    /// The symbolic name for a raw wire value, if this codeset declares one.
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.codes.iter().find(|(v, _)| v == value).map(|(_, name)| name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub(crate) id: Tag,
    pub(crate) name: String,
    pub(crate) structure: Vec<StructRef>,
    pub(crate) field_refs: Vec<Tag>,
    pub(crate) group_refs: Vec<Tag>,
}

impl ComponentSpec {
    pub fn id(&self) -> Tag {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn in_spec(&self, tag: Tag, repo: &Repository) -> bool {
        if self.field_refs.contains(&tag) {
            return true;
        }
        self.group_refs
            .iter()
            .filter_map(|id| repo.group_spec_byid(*id))
            .any(|g| g.in_spec(tag, repo))
    }

    pub fn first_field_id(&self, repo: &Repository) -> Option<Tag> {
        first_field_id_of(&self.structure, repo)
    }
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub(crate) id: Tag,
    pub(crate) name: String,
    pub(crate) num_field_id: Tag,
    pub(crate) structure: Vec<StructRef>,
    pub(crate) field_refs: Vec<Tag>,
    pub(crate) group_refs: Vec<Tag>,
    pub(crate) component_refs: Vec<Tag>,
}

impl GroupSpec {
    pub fn id(&self) -> Tag {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_field_id(&self) -> Tag {
        self.num_field_id
    }

    /// The group-begin field id: the first field this group's structure
    /// declares, resolved transitively through leading components/nested
    /// groups the way the teacher's data-dictionary loader derives a group's
    /// delimiter field while walking its children.
    pub fn first_field_id(&self, repo: &Repository) -> Tag {
        first_field_id_of(&self.structure, repo).unwrap_or(self.num_field_id)
    }

    pub fn in_spec(&self, tag: Tag, repo: &Repository) -> bool {
        if tag == self.num_field_id {
            return true;
        }
        if self.field_refs.contains(&tag) {
            return true;
        }
        if self
            .component_refs
            .iter()
            .filter_map(|id| repo.component_spec_byid(*id))
            .any(|c| c.in_spec(tag, repo))
        {
            return true;
        }
        self.group_refs.iter().filter_map(|id| repo.group_spec_byid(*id)).any(|g| g.in_spec(tag, repo))
    }
}

#[derive(Debug, Clone)]
pub struct MessageSpec {
    pub(crate) msg_type: String,
    pub(crate) name: String,
    pub(crate) category: String,
    #[allow(dead_code)]
    pub(crate) structure: Vec<StructRef>,
}

impl MessageSpec {
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The top level is permissive: any field is considered in spec.
    pub fn in_spec(&self, _tag: Tag, _repo: &Repository) -> bool {
        true
    }
}

fn first_field_id_of(structure: &[StructRef], repo: &Repository) -> Option<Tag> {
    for r in structure {
        match r {
            StructRef::Field(tag) => return Some(*tag),
            StructRef::Component(id) => {
                if let Some(spec) = repo.component_spec_byid(*id) {
                    if let Some(tag) = spec.first_field_id(repo) {
                        return Some(tag);
                    }
                }
            }
            StructRef::Group(id) => {
                if let Some(spec) = repo.group_spec_byid(*id) {
                    return Some(spec.num_field_id());
                }
            }
        }
    }
    None
}
