//! Code Generation Visitor
//!
//! Walks a parsed template and writes gad mixed-mode text: markup is
//! written as-is, everything dynamic goes in `{% ... %}` code blocks.
//!
//! Slot protocol. For a slot `NAME` (id `ID`) declared by a comp:
//!
//! - `$slot$ID$` is the default closure. It takes the default closure of
//!   the slot as a leading `default_slot` argument, then the slot scope.
//! - `$slot$ID` is the binding used at the usage site: the caller's
//!   `$slots["NAME"]` when given, else the default closure. With `@wrap`
//!   it is the wrap closure applied to that value.
//! - A usage site calls `$slot$ID($slot$ID$, scope...)`.
//!
//! A comp call builds a `$$slots$N` map of pass closures and hands it to
//! the callee as its `$slots` keyword argument.

use super::emitter::EmitterContext;
use crate::attrs::{attrs_call, resolve_attributes};
use crate::error::{CompilerError, Result};
use crate::host::{quote, serialize, serialize_call_args, serialize_params, Arg, Expr, NamedArg, Params};
use crate::parser::*;
use std::collections::BTreeMap;
use tracing::trace;

/// Text written for a compile unit, with the export tables the output
/// wrapper turns into the trailing return map.
#[derive(Debug, Default)]
pub struct CompiledBody {
    pub source: String,
    pub exports: BTreeMap<String, String>,
    pub exported_comps: BTreeMap<String, String>,
}

pub struct CodegenVisitor {
    ctx: EmitterContext,
    temp_index: usize,
    exports: BTreeMap<String, String>,
    exported_comps: BTreeMap<String, String>,
}

impl CodegenVisitor {
    pub fn new(pretty_print: bool) -> Self {
        CodegenVisitor {
            ctx: EmitterContext::new(pretty_print),
            temp_index: 0,
            exports: BTreeMap::new(),
            exported_comps: BTreeMap::new(),
        }
    }

    pub fn finish(self) -> CompiledBody {
        CompiledBody {
            source: self.ctx.into_source(),
            exports: self.exports,
            exported_comps: self.exported_comps,
        }
    }

    /// Root init code first, then the comps by name, then the main block.
    pub fn visit_root(&mut self, root: &Root) -> Result<()> {
        let expressions: Vec<String> = root
            .inits
            .iter()
            .flat_map(|init| init.expressions.iter().cloned())
            .collect();
        if !expressions.is_empty() {
            self.visit_code(&Code {
                expressions,
                trim: Trim::LEFT | Trim::RIGHT,
                position: root.block.position.clone(),
            });
        }

        for comp in ordered_comps(&root.comps)? {
            self.visit_comp(comp)?;
        }

        self.visit_block(&root.block)
    }

    fn visit_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Doctype(doctype) => self.ctx.print(&doctype.declaration()),
            Node::Comment(comment) => self.visit_comment(comment)?,
            Node::Text(text) => self.visit_text(text),
            Node::Tag(tag) => self.visit_tag(tag)?,
            Node::If(node) => self.visit_if(node)?,
            Node::For(node) => self.visit_for(node)?,
            Node::Assignment(assignment) => self.visit_assignment(assignment),
            Node::Code(code) => self.visit_code(code),
            Node::Func(func) => self.visit_func(func)?,
            Node::Block(block) => self.visit_block(block)?,
            Node::Slot(slot) => self.visit_slot_use(slot),
            Node::CompCall(call) => self.visit_comp_call(call)?,
            Node::Switch(switch) => self.visit_switch(switch)?,
            Node::Export(export) => self.visit_export(export),
            // only meaningful under a comp call or a slot
            Node::SlotPass(_) | Node::Wrap(_) => {}
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &Block) -> Result<()> {
        let nodes: Vec<&Node> = block.children.iter().collect();
        self.visit_nodes(&nodes)
    }

    fn visit_nodes(&mut self, nodes: &[&Node]) -> Result<()> {
        let can_inline = nodes.iter().all(|n| n.is_text());
        for node in nodes {
            if !can_inline && node.is_text() {
                self.ctx.indent(0, true);
            }
            self.visit_node(node)?;
        }
        Ok(())
    }

    fn visit_optional_block(&mut self, block: &Option<Block>) -> Result<()> {
        match block {
            Some(block) => self.visit_block(block),
            None => Ok(()),
        }
    }

    fn visit_comment(&mut self, comment: &Comment) -> Result<()> {
        if comment.silent {
            return Ok(());
        }

        // comment text is never read as mixed-mode markup
        self.ctx.indent(0, false);
        match &comment.block {
            None => self.write_unescaped(&format!("<!-- {} -->", comment.value)),
            Some(block) => {
                self.write_unescaped(&format!("<!-- {}", comment.value));
                self.visit_block(block)?;
                self.ctx.print(" -->");
            }
        }
        Ok(())
    }

    fn write_unescaped(&mut self, text: &str) {
        self.ctx
            .print(&format!("{{% unescaped({}) %}}", quote(text)));
    }

    fn visit_if(&mut self, node: &If) -> Result<()> {
        for (i, condition) in node.positives.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            self.ctx
                .print(&format!("{{% {} {} %}}", keyword, condition.expression));
            self.visit_optional_block(&condition.block)?;
        }
        if let Some(negative) = &node.negative {
            self.ctx.print("{% else %}");
            self.visit_block(negative)?;
        }
        self.ctx.print("{% end %}");
        Ok(())
    }

    fn visit_for(&mut self, node: &For) -> Result<()> {
        let block = match &node.block {
            Some(block) => block,
            None => return Ok(()),
        };

        self.ctx
            .print(&format!("{{% {} %}}", node.expression.trim()));
        self.visit_block(block)?;
        if let Some(else_block) = &node.else_block {
            self.ctx.print("{% else %}");
            self.visit_block(else_block)?;
        }
        self.ctx.print("{% end %}");
        Ok(())
    }

    fn visit_assignment(&mut self, assignment: &Assignment) {
        let expression = assignment.expression.trim();
        if assignment.x.is_empty() && assignment.op.is_empty() {
            self.ctx.print(&format!("{{%= {} %}}", expression));
        } else {
            self.ctx.print(&format!(
                "{{% {} {}= {}; %}}",
                assignment.x, assignment.op, expression
            ));
        }
    }

    fn visit_code(&mut self, code: &Code) {
        let open = if code.trim.contains(Trim::LEFT) { "{%-" } else { "{%" };
        let close = if code.trim.contains(Trim::RIGHT) { "-%}" } else { "%}" };

        match code.expressions.as_slice() {
            [] => {}
            [single] => {
                self.ctx
                    .print(&format!("{} {}; {}", open, single.trim(), close));
            }
            lines => {
                self.ctx
                    .print(&format!("{}\n{}\n{}", open, lines.join("\n"), close));
            }
        }
    }

    /// One `giom$write` call for the whole line: literals as quoted
    /// strings, interpolations verbatim.
    fn visit_text(&mut self, text: &Text) {
        let args: Vec<String> = text
            .segments
            .iter()
            .map(|segment| match segment {
                TextSegment::Literal(value) => quote(value),
                TextSegment::Expression(expression) => expression.clone(),
            })
            .collect();

        if args.is_empty() {
            return;
        }
        self.ctx
            .print(&format!("{{% giom$write({}) %}}", args.join(", ")));
    }

    fn visit_tag(&mut self, tag: &Tag) -> Result<()> {
        let resolved = resolve_attributes(tag)?;

        self.ctx.indent(0, true);
        self.ctx.print(&format!("<{}", tag.name));
        if let Some(call) = attrs_call(&resolved) {
            self.ctx.print(&format!("{{%= {} %}}", call));
        }

        if tag.is_self_closing() {
            self.ctx.print(" />");
            return Ok(());
        }

        self.ctx.print(">");
        if let Some(block) = &tag.block {
            let inline = block.can_inline();
            if !inline {
                self.ctx.inc_indent();
            }
            self.visit_block(block)?;
            if !inline {
                self.ctx.dec_indent();
                self.ctx.indent(0, true);
            }
        }
        self.ctx.print(&format!("</{}>", tag.name));
        Ok(())
    }

    fn visit_func(&mut self, func: &Func) -> Result<()> {
        self.ctx.print(&format!(
            "{{% const {} = func({}) %}}",
            func.name,
            serialize_params(&func.params)
        ));
        self.visit_optional_block(&func.block)?;
        self.ctx.print("{% end %}");

        if func.exported {
            self.exports.insert(func.name.clone(), func.name.clone());
        }
        Ok(())
    }

    /// A comp body is emitted as: leading code line, hoisted funcs, nested
    /// comps, slot definitions, then the remaining content.
    fn visit_comp(&mut self, comp: &Comp) -> Result<()> {
        trace!(name = %comp.name, slots = comp.slots.len(), "emit comp");

        let mut params = comp.params.clone();
        params.push_named("$slots", Expr::Dict(Vec::new()));
        self.ctx.print(&format!(
            "{{% const {} = func({}) %}}",
            comp.id,
            serialize_params(&params)
        ));

        let children: &[Node] = match &comp.block {
            Some(block) => &block.children,
            None => &[],
        };
        let body = match children.first() {
            Some(Node::Code(code)) => {
                self.visit_code(code);
                &children[1..]
            }
            _ => children,
        };

        let (funcs, rest): (Vec<&Node>, Vec<&Node>) =
            body.iter().partition(|n| matches!(n, Node::Func(_)));
        self.visit_nodes(&funcs)?;

        for child in ordered_comps(&comp.comps)? {
            self.visit_comp(child)?;
        }
        for slot in &comp.slots {
            self.visit_slot_def(slot)?;
        }

        self.visit_nodes(&rest)?;
        self.ctx.print("{% end %}");

        if comp.exported {
            self.exported_comps.insert(comp.name.clone(), comp.id.clone());
        }
        Ok(())
    }

    fn visit_slot_def(&mut self, slot: &Slot) -> Result<()> {
        let local = format!("$slot${}", slot.id);
        let user_slot = format!("$slots[{}]", quote(&slot.name));

        let mut params = Params {
            positional: vec!["default_slot".to_string()],
            ..Params::default()
        };
        params.positional.extend(slot.scope.positional.iter().cloned());
        params.variadic = slot.scope.variadic.clone();
        for named in &slot.scope.named {
            params.push_named(named.name.as_str(), Expr::Nil);
        }
        params.named_variadic = slot.scope.named_variadic.clone();

        self.ctx.print(&format!(
            "{{% const {}$ = func({}) %}}",
            local,
            serialize_params(&params)
        ));
        self.visit_optional_block(&slot.block)?;
        self.ctx.print("{% end %}");

        match &slot.wrap {
            Some(wrap) => {
                self.ctx
                    .print(&format!("{{% const {}$wrap = func(slot$) %}}", local));
                self.ctx.print("{% return func(*args, **kwargs) %}");
                self.ctx
                    .print(&format!("{{% const (user_slot = {}) %}}", user_slot));
                // `args` starts with the default closure passed by the usage site
                self.ctx
                    .print("{% const slot = (*a, **kw) => slot$(*args, *a, **kwargs, **kw) %}");
                self.visit_block(&wrap.block)?;
                self.ctx.print("{% end %}");
                self.ctx.print("{% end %}");
                self.ctx.print(&format!(
                    "{{% var {0} = {0}$wrap({1} ?? {0}$) %}}",
                    local, user_slot
                ));
            }
            None => {
                self.ctx
                    .print(&format!("{{% var {0} = {1} ?? {0}$ %}}", local, user_slot));
            }
        }
        Ok(())
    }

    fn visit_slot_use(&mut self, slot: &SlotUse) {
        let local = format!("$slot${}", slot.id);
        let mut args = slot.scope.caller();
        args.positional.insert(
            0,
            Arg {
                value: Expr::ident(format!("{}$", local)),
                spread: false,
            },
        );
        self.ctx
            .print(&format!("{{% {}({}) %}}", local, serialize_call_args(&args)));
    }

    fn visit_comp_call(&mut self, call: &CompCall) -> Result<()> {
        let name = safe_id(&call.name);
        let mut args = call.args.clone();

        self.ctx.print("{% do %}");

        if !call.slot_passes.is_empty() {
            let mut closures = Vec::with_capacity(call.slot_passes.len());
            for pass in &call.slot_passes {
                let local = format!("$$slot${}", self.temp_var());
                self.ctx.print(&format!(
                    "{{% const {} = func({}) %}}",
                    local,
                    serialize_params(&pass_params(&pass.params))
                ));
                self.visit_optional_block(&pass.block)?;
                self.ctx.print("{% end %}");
                closures.push(local);
            }

            let map = format!("$$slots${}", self.temp_var());
            let mut code = format!("{{% var {} = {{}}; ", map);
            for (pass, local) in call.slot_passes.iter().zip(&closures) {
                code.push_str(&format!("{}[{}] = {}; ", map, slot_key(&pass.name), local));
            }
            code.push_str("%}");
            self.ctx.print(&code);

            args.named.push(NamedArg {
                name: Some(Expr::ident("$slots")),
                value: Some(Expr::Ident(map)),
                spread: false,
            });
        }

        if let Some(init) = &call.init_code {
            self.visit_code(init);
        }

        self.ctx
            .print(&format!("{{% {}({}) %}}", name, serialize_call_args(&args)));
        self.ctx.print("{% end %}");
        Ok(())
    }

    /// First matching case wins; duplicate cases are shadowed.
    fn visit_switch(&mut self, switch: &Switch) -> Result<()> {
        if switch.cases.is_empty() {
            if let Some(default) = &switch.default {
                self.visit_optional_block(&default.content)?;
            }
            return Ok(());
        }

        for (i, case) in switch.cases.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            self.ctx.print(&format!(
                "{{% {} {} == {} %}}",
                keyword, switch.expression, case.expression
            ));
            self.visit_optional_block(&case.content)?;
        }
        if let Some(default) = &switch.default {
            self.ctx.print("{% else %}");
            self.visit_optional_block(&default.content)?;
        }
        self.ctx.print("{% end %}");
        Ok(())
    }

    fn visit_export(&mut self, export: &Export) {
        let value = export.value.clone().unwrap_or_else(|| export.name.clone());
        self.exports.insert(export.name.clone(), value);
    }

    fn temp_var(&mut self) -> usize {
        self.temp_index += 1;
        self.temp_index
    }
}

/// Comps of one scope in name order. A repeated name must be an override,
/// which replaces the earlier comp.
fn ordered_comps(comps: &[Comp]) -> Result<Vec<&Comp>> {
    let mut by_name: BTreeMap<&str, &Comp> = BTreeMap::new();
    for comp in comps {
        if !comp.is_override && by_name.contains_key(comp.name.as_str()) {
            return Err(CompilerError::compile(
                format!("comp duplicate {:?}", comp.name),
                comp.position.clone(),
            ));
        }
        by_name.insert(comp.name.as_str(), comp);
    }
    Ok(by_name.into_values().collect())
}

/// Pass closures receive the slot's default closure first. The implicit
/// `main` pass forwards everything and needs no extra parameter.
fn pass_params(params: &Params) -> Params {
    if *params == Params::proxy() {
        return params.clone();
    }
    let mut with_default = params.clone();
    with_default.positional.insert(0, "default_slot".to_string());
    with_default
}

fn slot_key(name: &Expr) -> String {
    match name {
        Expr::Ident(name) => quote(name),
        Expr::Paren(inner) => serialize(inner),
        other => serialize(other),
    }
}
