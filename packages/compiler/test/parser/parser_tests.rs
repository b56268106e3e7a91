/**
 * Parser Tests
 *
 * Tree shape produced for each construct, and the errors raised for
 * malformed templates.
 */

#[allow(dead_code)]
#[path = "../util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use super::util::{compile_error, first_tag, parse_root};
    use giom_compiler::parser::*;

    fn children(source: &str) -> Vec<Node> {
        parse_root(source).block.children
    }

    #[test]
    fn should_parse_inline_text_into_tag_block() {
        let tag = first_tag("p Hello #{name}!");
        let block = tag.block.unwrap();
        match &block.children[0] {
            Node::Text(text) => assert_eq!(
                text.segments,
                vec![
                    TextSegment::Literal("Hello ".to_string()),
                    TextSegment::Expression("name".to_string()),
                    TextSegment::Literal("!".to_string()),
                ]
            ),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn should_keep_inline_text_before_block_children() {
        let tag = first_tag("p first\n  span second");
        let block = tag.block.unwrap();
        assert!(matches!(block.children[0], Node::Text(_)));
        assert!(matches!(block.children[1], Node::Tag(_)));
    }

    #[test]
    fn should_collect_attribute_lines_of_a_tag_block() {
        let tag = first_tag("div\n  [title=\"t\"]\n  .extra\n  p");
        let names: Vec<&str> = tag.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["", "class"]);
        assert!(tag.attributes[0].elements.is_some());
        assert_eq!(tag.block.unwrap().children.len(), 1);
    }

    #[test]
    fn should_guard_attributes_of_conditional_branches() {
        let tag = first_tag("div\n  @if a\n    .x\n  @else if b\n    .y ? c\n  @else\n    .z");
        let conditions: Vec<Option<&str>> = tag
            .attributes
            .iter()
            .map(|a| a.condition.as_deref())
            .collect();
        assert_eq!(
            conditions,
            vec![
                Some("(a)"),
                Some("!(a) && (b) && c"),
                Some("!(a) && !(b)"),
            ]
        );
        assert!(tag.block.map_or(true, |b| b.is_empty()));
    }

    #[test]
    fn should_keep_conditionals_with_content() {
        let tag = first_tag("div\n  @if a\n    p yes");
        let block = tag.block.unwrap();
        match &block.children[0] {
            Node::If(node) => {
                assert_eq!(node.positives.len(), 1);
                assert_eq!(node.positives[0].expression, "a");
                assert!(node.negative.is_none());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn should_reject_children_next_to_conditional_attributes() {
        let err = compile_error("div\n  @if a\n    .x\n    p");
        assert!(err.contains("Conditional for tag attributes does not accepts children on Positive Block."));
    }

    #[test]
    fn should_reject_conditional_attributes_on_tag_line() {
        let err = compile_error("div.x ? a");
        assert!(err.contains("Conditional attributes must be placed in a block within a tag."));
    }

    #[test]
    fn should_reject_attribute_lines_outside_tags() {
        let err = compile_error("@if a\n  .x");
        assert!(err.contains("Conditional attributes must be placed immediately within a parent tag."));
    }

    #[test]
    fn should_parse_for_with_else() {
        match &children("@for $x in xs\n  p #{$x}\n@else\n  p none")[0] {
            Node::For(node) => {
                assert_eq!(node.expression, "for $x in xs");
                assert!(node.block.is_some());
                assert!(node.else_block.is_some());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn should_register_comps_on_root() {
        let root = parse_root("@comp b\n  p b\n@comp a(x)\n  p a\np body");
        let names: Vec<&str> = root.comps.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(root.comps[1].params.positional, vec!["x".to_string()]);
        assert_eq!(root.block.children.len(), 1);
    }

    #[test]
    fn should_nest_comps_declared_in_comps() {
        let root = parse_root("@comp outer\n  @comp inner\n    p\n  +inner");
        assert_eq!(root.comps.len(), 1);
        assert_eq!(root.comps[0].comps.len(), 1);
        assert_eq!(root.comps[0].comps[0].name, "inner");
    }

    #[test]
    fn should_register_slots_in_declaration_order() {
        let root = parse_root("@comp card\n  @slot head\n  div\n    @slot body(item)\n      p default\n  @slot foot");
        let comp = &root.comps[0];
        let names: Vec<&str> = comp.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["head", "body", "foot"]);
        assert_eq!(comp.slots[1].scope.positional, vec!["item".to_string()]);
        assert!(comp.slots[1].block.is_some());
    }

    #[test]
    fn should_extract_wrap_from_slot_body() {
        let root = parse_root("@comp card\n  @slot body\n    @wrap\n      div\n        ~ slot()\n    p default");
        let slot = &root.comps[0].slots[0];
        assert!(slot.wrap.is_some());
        assert_eq!(slot.block.as_ref().unwrap().children.len(), 1);
    }

    #[test]
    fn should_reject_slots_outside_comps() {
        let err = compile_error("div\n  @slot body");
        assert!(err.contains("Slot `body` must be declared within a comp."));
    }

    #[test]
    fn should_split_comp_call_content_into_passes() {
        match &children("+card(\"T\")\n  @slot #head\n    h1 Title\n  p main content")[0] {
            Node::CompCall(call) => {
                assert_eq!(call.name, "card");
                assert_eq!(call.slot_passes.len(), 2);
                assert_eq!(call.slot_passes[1].params, giom_compiler::host::Params::proxy());
                assert!(call.init_code.is_none());
            }
            other => panic!("expected comp call, got {:?}", other),
        }
    }

    #[test]
    fn should_take_init_code_of_comp_call() {
        match &children("+card() ~\n  ~ var n = 1\n  p #{n}")[0] {
            Node::CompCall(call) => {
                assert_eq!(
                    call.init_code.as_ref().map(|c| c.expressions.clone()),
                    Some(vec!["var n = 1".to_string()])
                );
                assert_eq!(call.slot_passes.len(), 1);
            }
            other => panic!("expected comp call, got {:?}", other),
        }
    }

    #[test]
    fn should_parse_switch_cases() {
        match &children("@switch x\n  @case 1\n    p one\n\n  @case 2\n    p two\n  @default\n    p other")[0] {
            Node::Switch(node) => {
                assert_eq!(node.expression, "x");
                let cases: Vec<&str> = node.cases.iter().map(|c| c.expression.as_str()).collect();
                assert_eq!(cases, vec!["1", "2"]);
                assert!(node.default.is_some());
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn should_reject_switch_without_cases() {
        for source in ["@switch x", "@switch x\np after", "div\n  @switch x\n  p"] {
            let err = compile_error(source);
            assert!(
                err.contains("Switch `x` requires at least one case or default."),
                "{}",
                err
            );
        }
    }

    #[test]
    fn should_hoist_root_init_code() {
        let root = parse_root("p a\n~~~\nconst x = 1\n~~~\np b");
        assert_eq!(root.inits.len(), 1);
        assert_eq!(root.inits[0].expressions, vec!["const x = 1".to_string()]);
        assert_eq!(root.block.children.len(), 2);
    }

    #[test]
    fn should_turn_imports_into_code() {
        match &children("@import \"lib/widgets\"")[0] {
            Node::Code(code) => assert_eq!(
                code.expressions,
                vec!["const widgets = import(\"lib/widgets.giom\")".to_string()]
            ),
            other => panic!("expected code, got {:?}", other),
        }
        match &children("@import \"lib/widgets\" as w")[0] {
            Node::Code(code) => assert!(code.expressions[0].starts_with("const w = ")),
            other => panic!("expected code, got {:?}", other),
        }
    }

    #[test]
    fn should_parse_exports() {
        let nodes = children("@export title = \"Home\"\n@export count");
        match (&nodes[0], &nodes[1]) {
            (Node::Export(a), Node::Export(b)) => {
                assert_eq!(a.name, "title");
                assert_eq!(a.value.as_deref(), Some("\"Home\""));
                assert_eq!(b.value, None);
            }
            other => panic!("expected exports, got {:?}", other),
        }
    }

    #[test]
    fn should_report_unexpected_tokens() {
        let err = compile_error("@else\n  p");
        assert!(err.contains("Unexpected token"), "{}", err);
    }

    #[test]
    fn should_report_bad_comp_parameters() {
        let err = compile_error("@comp card(1 +)\n  p");
        assert!(err.contains("Parsing parameters failed"), "{}", err);
    }
}
