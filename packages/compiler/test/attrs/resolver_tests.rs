/**
 * Attribute Resolver Tests
 *
 * Key ordering of resolved attribute arrays, and the rendered attributes
 * once evaluated and passed through the `attrs` helper.
 */

#[allow(dead_code)]
#[path = "../util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use super::util::{compile_error, first_tag};
    use giom_compiler::attrs::{attrs_call, eval_attributes, resolve_attributes};
    use giom_compiler::host::{Scope, Value};
    use giom_compiler::runtime::render_attrs;

    fn call(source: &str) -> String {
        let tag = first_tag(source);
        attrs_call(&resolve_attributes(&tag).unwrap()).unwrap_or_default()
    }

    fn render(source: &str, scope: &Scope) -> String {
        let tag = first_tag(source);
        let resolved = resolve_attributes(&tag).unwrap();
        render_attrs(&eval_attributes(&resolved, scope).unwrap())
    }

    #[test]
    fn should_sort_keys() {
        assert_eq!(
            call("a[title=\"t\"][href=\"/\"]#top"),
            "attrs(;href=\"/\", id=\"top\", title=\"t\")"
        );
    }

    #[test]
    fn should_be_stable_across_compiles() {
        let source = "div.b[data-x=1].a[class=c]#i";
        assert_eq!(call(source), call(source));
    }

    #[test]
    fn should_keep_flag_attributes() {
        assert_eq!(call("input[readonly][type=\"text\"]"), "attrs(;readonly, type=\"text\")");
    }

    #[test]
    fn should_flatten_classes_in_declaration_order() {
        assert_eq!(
            render("p.test1.test2[class=\"test3\"][class=\"test4\"]", &Scope::new()),
            " class=\"test1 test2 test3 test4\""
        );
    }

    #[test]
    fn should_omit_falsy_classes() {
        let scope = Scope::new().with("on", false);
        assert_eq!(
            render("p.a[class=(on ? \"b\")][class=\"c\"]", &scope),
            " class=\"a c\""
        );
    }

    #[test]
    fn should_apply_branch_guards() {
        let source = "div\n  @if on\n    .yes\n  @else\n    .no";
        assert_eq!(render(source, &Scope::new().with("on", true)), " class=\"yes\"");
        assert_eq!(render(source, &Scope::new().with("on", false)), " class=\"no\"");
    }

    #[test]
    fn should_combine_guards_with_own_condition() {
        let source = "div\n  @if a\n    .x ? b";
        let both = Scope::new().with("a", true).with("b", true);
        let one = Scope::new().with("a", true).with("b", false);
        assert_eq!(render(source, &both), " class=\"x\"");
        assert_eq!(render(source, &one), "");
    }

    #[test]
    fn should_guard_every_element_of_a_bracket_list() {
        let source = "div\n  [title=\"t\", hidden] ? show";
        assert_eq!(
            render(source, &Scope::new().with("show", true)),
            " hidden title=\"t\""
        );
        assert_eq!(render(source, &Scope::new().with("show", false)), "");
    }

    #[test]
    fn should_use_else_value_of_condition() {
        let source = "div\n  [title=\"a\"] ? flag : \"b\"";
        assert_eq!(
            render(source, &Scope::new().with("flag", false)),
            " title=\"b\""
        );
    }

    #[test]
    fn should_join_styles() {
        let source = "p[style=\"color:red\"][style=\"margin:0\"]";
        assert_eq!(
            render(source, &Scope::new()),
            " style=\"color:red; margin:0\""
        );
    }

    #[test]
    fn should_keep_last_id() {
        assert_eq!(render("p#first[id=\"second\"]", &Scope::new()), " id=\"second\"");
    }

    #[test]
    fn should_escape_values() {
        let scope = Scope::new().with("v", "a<b");
        assert_eq!(render("p[title=v]", &scope), " title=\"a&lt;b\"");
    }

    #[test]
    fn should_name_tag_and_attribute_in_condition_errors() {
        let err = compile_error("div\n  .x ? (a");
        assert!(
            err.contains("parse tag 'div': attribute 'class': condition '(a'"),
            "{}",
            err
        );

        let err = compile_error("div\n  [value=\"x\"] ? a +");
        assert!(
            err.contains("parse tag 'div': attribute 'value': condition 'a +'"),
            "{}",
            err
        );

        let err = compile_error("div\n  [title=\"t\", hidden] ? (b");
        assert!(
            err.contains("parse tag 'div': attribute 'title, hidden': condition '(b'"),
            "{}",
            err
        );
    }
}
