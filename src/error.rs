use std::num::ParseIntError;

/// Errors raised while loading a FIX Orchestra repository from XML.
///
/// These are the only conditions the core treats as fatal (see PURPOSE & SCOPE):
/// a schema that cannot be parsed or indexed leaves the parser with nothing to
/// drive against, so loading simply fails rather than producing a partial
/// Repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("could not read repository file")]
    FileNotRead(#[from] std::io::Error),
    #[error("could not parse repository xml")]
    DocumentNotParsed(#[from] roxmltree::Error),
    #[error("node {0} not found")]
    NodeNotFound(String),
    #[error("attribute {0} not found")]
    AttributeNotFound(String),
    #[error("could not parse {field} as an integer: {source}")]
    IdNotParsed {
        source: ParseIntError,
        field: String,
    },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("unknown xml tag {0}")]
    UnknownXmlTag(String),
}
