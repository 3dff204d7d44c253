//! serde model of the C front-end's JSON AST dump.
//!
//! The schema is deliberately permissive: every field is optional or
//! defaulted and unknown fields are ignored. Data the importer cannot do
//! without is enforced with an error at the point of use, so a schema
//! violation surfaces with the node that triggered it.

use anyhow::{Context, Result};
use serde::Deserialize;

/// The root of an AST dump.
#[derive(Debug, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub inner: Vec<Node>,
}

/// One node of the front-end AST.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<TypeInfo>,
    pub inner: Vec<Node>,
    #[serde(rename = "storageClass")]
    pub storage_class: Option<String>,
    pub inline: bool,
    pub variadic: bool,
    #[serde(rename = "isBitfield")]
    pub is_bitfield: bool,
    #[serde(rename = "tagUsed")]
    pub tag_used: Option<String>,
    #[serde(rename = "ownedTagDecl")]
    pub owned_tag_decl: Option<OwnedTag>,
    /// Literal text of an `IntegerLiteral`.
    pub value: Option<String>,
    /// Operator spelling of a `UnaryOperator`/`BinaryOperator`.
    pub opcode: Option<String>,
    #[serde(rename = "referencedDecl")]
    pub referenced_decl: Option<Box<Node>>,
}

/// The type slot of a node. The desugared form, when present, has typedefs
/// resolved away.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeInfo {
    #[serde(rename = "qualType")]
    pub qual_type: String,
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
}

/// Reference from a typedef to the tag declaration it owns.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedTag {
    pub id: String,
}

impl Node {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    /// The type string to hand to the grammar: the desugared form when it
    /// exists, unless that form is an anonymous-aggregate sentinel, in
    /// which case the sugared spelling is the usable one.
    pub fn type_string(&self) -> Result<&str> {
        let ty = self.ty.as_ref().context("node has no type")?;
        Ok(match &ty.desugared_qual_type {
            Some(desugared) if !is_anonymous(desugared) => desugared,
            _ => &ty.qual_type,
        })
    }
}

/// Whether a type string is the front-end's placeholder for an aggregate
/// with neither tag nor typedef name.
pub fn is_anonymous(qual_type: &str) -> bool {
    ["unnamed struct at", "unnamed union", "unnamed at", "anonymous at"]
        .iter()
        .any(|sentinel| qual_type.contains(sentinel))
}
