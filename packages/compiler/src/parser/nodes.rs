//! Template AST
//!
//! Nodes produced by the template parser. Every node carries the position
//! of the token it was built from.

use crate::host::{CallArgs, Expr, KeyValueArray, Params};
use crate::parse_util::SourcePosition;
use bitflags::bitflags;
use lazy_static::lazy_static;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

const SELF_CLOSING_TAGS: &[&str] = &[
    "meta", "img", "link", "input", "source", "area", "base", "col", "br", "hr",
];

lazy_static! {
    static ref DOCTYPES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("5", r#"<!DOCTYPE html>"#);
        m.insert("default", r#"<!DOCTYPE html>"#);
        m.insert("html", r#"<!DOCTYPE html>"#);
        m.insert("xml", r#"<?xml version="1.0" encoding="utf-8" ?>"#);
        m.insert(
            "transitional",
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#,
        );
        m.insert(
            "strict",
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#,
        );
        m.insert(
            "frameset",
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#,
        );
        m.insert(
            "1.1",
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#,
        );
        m.insert(
            "basic",
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#,
        );
        m.insert(
            "mobile",
            r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#,
        );
        m
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    Doctype(Doctype),
    Comment(Comment),
    Text(Text),
    Tag(Tag),
    If(If),
    For(For),
    Assignment(Assignment),
    Code(Code),
    Func(Func),
    /// An indented block with no owning construct.
    Block(Block),
    /// A slot usage site; the definition lives on the owning comp.
    Slot(SlotUse),
    SlotPass(SlotPass),
    Wrap(Wrap),
    CompCall(CompCall),
    Switch(Switch),
    Export(Export),
}

impl Node {
    pub fn position(&self) -> &SourcePosition {
        match self {
            Node::Doctype(n) => &n.position,
            Node::Comment(n) => &n.position,
            Node::Text(n) => &n.position,
            Node::Tag(n) => &n.position,
            Node::If(n) => &n.position,
            Node::For(n) => &n.position,
            Node::Assignment(n) => &n.position,
            Node::Code(n) => &n.position,
            Node::Func(n) => &n.position,
            Node::Block(n) => &n.position,
            Node::Slot(n) => &n.position,
            Node::SlotPass(n) => &n.position,
            Node::Wrap(n) => &n.position,
            Node::CompCall(n) => &n.position,
            Node::Switch(n) => &n.position,
            Node::Export(n) => &n.position,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    pub children: Vec<Node>,
    pub position: SourcePosition,
}

impl Block {
    pub fn new(position: SourcePosition) -> Self {
        Block {
            children: Vec::new(),
            position,
        }
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn push_front(&mut self, node: Node) {
        self.children.insert(0, node);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// A block can be written inline when all of its children are text.
    pub fn can_inline(&self) -> bool {
        self.children.iter().all(Node::is_text)
    }
}

/// Top container of a compile unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Root {
    pub block: Block,
    pub comps: Vec<Comp>,
    pub inits: Vec<Code>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctype {
    pub value: String,
    pub position: SourcePosition,
}

impl Doctype {
    /// The declaration for `value`; unknown ids become `<!DOCTYPE id>`.
    pub fn declaration(&self) -> String {
        match DOCTYPES.get(self.value.as_str()) {
            Some(defined) => defined.to_string(),
            None => format!("<!DOCTYPE {}>", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub value: String,
    pub block: Option<Block>,
    pub silent: bool,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TextSegment {
    Literal(String),
    /// Interpolated host expression source.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub segments: Vec<TextSegment>,
    /// Verbatim script/style content.
    pub raw: bool,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub raw: bool,
    pub flag: bool,
    pub condition: Option<String>,
    pub elements: Option<KeyValueArray>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub block: Option<Block>,
    pub position: SourcePosition,
}

impl Tag {
    pub fn new(name: impl Into<String>, position: SourcePosition) -> Self {
        Tag {
            name: name.into(),
            attributes: Vec::new(),
            block: None,
            position,
        }
    }

    pub fn is_self_closing(&self) -> bool {
        SELF_CLOSING_TAGS.contains(&self.name.as_str())
    }

    pub fn is_raw_text(&self) -> bool {
        self.name == "style" || self.name == "script"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub expression: String,
    pub block: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct If {
    pub positives: Vec<Condition>,
    pub negative: Option<Block>,
    /// Set when the branches only carried tag attributes.
    pub skips: bool,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct For {
    pub expression: String,
    pub block: Option<Block>,
    pub else_block: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub x: String,
    pub op: String,
    pub expression: String,
    pub position: SourcePosition,
}

bitflags! {
    /// Whitespace trimming around an emitted code block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Trim: u8 {
        const LEFT = 0b01;
        const RIGHT = 0b10;
    }
}

fn serialize_trim<S: Serializer>(trim: &Trim, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(trim.bits())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Code {
    pub expressions: Vec<String>,
    #[serde(serialize_with = "serialize_trim")]
    pub trim: Trim,
    pub position: SourcePosition,
}

impl Code {
    /// A lone `-` as the first or last line marks whitespace trimming.
    pub fn new(mut expressions: Vec<String>, position: SourcePosition) -> Self {
        let mut trim = Trim::empty();
        if expressions.first().map_or(false, |e| e.trim() == "-") {
            expressions.remove(0);
            trim |= Trim::LEFT;
        }
        if expressions.last().map_or(false, |e| e.trim() == "-") {
            expressions.pop();
            trim |= Trim::RIGHT;
        }
        Code {
            expressions,
            trim,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Func {
    pub name: String,
    pub params: Params,
    pub exported: bool,
    pub block: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comp {
    pub name: String,
    /// Identifier-safe name used in the emitted code.
    pub id: String,
    pub params: Params,
    pub block: Option<Block>,
    pub comps: Vec<Comp>,
    pub slots: Vec<Slot>,
    pub exported: bool,
    pub is_override: bool,
    pub position: SourcePosition,
}

impl Comp {
    /// `=name` declares an override of an earlier comp.
    pub fn new(name: &str, params: Params, exported: bool, position: SourcePosition) -> Self {
        let (name, is_override) = match name.strip_prefix('=') {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        Comp {
            name: name.to_string(),
            id: safe_id(name),
            params,
            block: None,
            comps: Vec::new(),
            slots: Vec::new(),
            exported,
            is_override,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub name: String,
    pub id: String,
    pub scope: Params,
    pub block: Option<Block>,
    pub wrap: Option<Wrap>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotUse {
    pub name: String,
    pub id: String,
    pub scope: Params,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wrap {
    pub block: Block,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPass {
    /// Identifier, parenthesized expression or string.
    pub name: Expr,
    pub params: Params,
    pub block: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompCall {
    pub name: String,
    pub args: CallArgs,
    pub slot_passes: Vec<SlotPass>,
    pub init_code: Option<Code>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub expression: String,
    pub content: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultCase {
    pub content: Option<Block>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub expression: String,
    pub cases: Vec<Case>,
    pub default: Option<DefaultCase>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Export {
    pub name: String,
    pub value: Option<String>,
    pub position: SourcePosition,
}

/// `-` is not valid in host identifiers.
pub fn safe_id(name: &str) -> String {
    name.replace('-', "__")
}
