/**
 * Compiler Output Tests
 *
 * Generated gad mixed-mode text for markup, control flow, code lines,
 * funcs, comps and the output wrapper.
 */

#[allow(dead_code)]
#[path = "../util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use super::util::{body, compile, compile_error, compile_with};
    use giom_compiler::CompileOptions;

    #[test]
    fn should_wrap_empty_template() {
        assert_eq!(compile(""), "# gad: mixed\n{% return {} %}");
    }

    #[test]
    fn should_compile_tag_with_text() {
        assert_eq!(body("p Hello"), "<p>{% giom$write(\"Hello\") %}</p>");
    }

    #[test]
    fn should_compile_nested_tags_with_attributes() {
        assert_eq!(
            body("div#main.box\n  span Hi"),
            "<div{%= attrs(;class=\"box\", id=\"main\") %}><span>{% giom$write(\"Hi\") %}</span></div>"
        );
    }

    #[test]
    fn should_self_close_void_tags() {
        assert_eq!(
            body("img[src=\"a.png\"]\nbr\n  p ignored"),
            "<img{%= attrs(;src=\"a.png\") %} /><br />"
        );
    }

    #[test]
    fn should_merge_text_segments_into_one_write() {
        assert_eq!(
            body("p Hello #{name}!"),
            "<p>{% giom$write(\"Hello \", name, \"!\") %}</p>"
        );
    }

    #[test]
    fn should_compile_piped_text() {
        assert_eq!(body("| plain \"quoted\""), "{% giom$write(\"plain \\\"quoted\\\"\") %}");
    }

    #[test]
    fn should_keep_script_content_raw() {
        assert_eq!(
            body("script\n  var a = \"#{x}\";"),
            "<script>{% giom$write(\"var a = \\\"#{x}\\\";\") %}</script>"
        );
    }

    #[test]
    fn should_compile_doctypes() {
        assert_eq!(body("!!! 5"), "<!DOCTYPE html>");
        assert_eq!(body("@doctype custom"), "<!DOCTYPE custom>");
    }

    #[test]
    fn should_compile_comments() {
        assert_eq!(body("// note"), "{% unescaped(\"<!-- note -->\") %}");
        assert_eq!(body("//- hidden"), "");
        assert_eq!(
            body("// block\n  p x"),
            "{% unescaped(\"<!-- block\") %}<p>{% giom$write(\"x\") %}</p> -->"
        );
    }

    #[test]
    fn should_keep_code_markers_in_comments_as_text() {
        assert_eq!(
            body("// hi {% x %} \"q\""),
            "{% unescaped(\"<!-- hi {% x %} \\\"q\\\" -->\") %}"
        );
        let out = body("// a %} b\n  p x");
        assert!(out.starts_with("{% unescaped(\"<!-- a %} b\") %}<p>"), "{}", out);
    }

    #[test]
    fn should_compile_if_chains() {
        assert_eq!(
            body("@if a\n  p x\n@else if b\n  p y\n@else\n  p z"),
            "{% if a %}<p>{% giom$write(\"x\") %}</p>\
             {% else if b %}<p>{% giom$write(\"y\") %}</p>\
             {% else %}<p>{% giom$write(\"z\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_compile_for_with_else() {
        assert_eq!(
            body("@for $x in xs\n  p #{$x}\n@else\n  p none"),
            "{% for $x in xs %}<p>{% giom$write($x) %}</p>\
             {% else %}<p>{% giom$write(\"none\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_skip_for_without_body() {
        assert_eq!(body("@for $x in xs"), "");
    }

    #[test]
    fn should_compile_assignments() {
        assert_eq!(body("$x := 1"), "{% $x := 1; %}");
        assert_eq!(body("$count += 1"), "{% $count += 1; %}");
        assert_eq!(body("= name"), "{%= name %}");
    }

    #[test]
    fn should_compile_code_lines() {
        assert_eq!(body("~ x = 1"), "{% x = 1; %}");
        assert_eq!(body("~~\na()\nb()\n~~"), "{%\na()\nb()\n%}");
    }

    #[test]
    fn should_hoist_root_init_code() {
        assert_eq!(
            body("p a\n~~~\nconst x = 1\n~~~"),
            "{%- const x = 1; -%}<p>{% giom$write(\"a\") %}</p>"
        );
    }

    #[test]
    fn should_compile_switch_as_if_chain() {
        assert_eq!(
            body("@switch x\n  @case 1\n    p one\n  @case 2\n    p two\n  @default\n    p other"),
            "{% if x == 1 %}<p>{% giom$write(\"one\") %}</p>\
             {% else if x == 2 %}<p>{% giom$write(\"two\") %}</p>\
             {% else %}<p>{% giom$write(\"other\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_emit_only_default_of_switch_without_cases() {
        assert_eq!(
            body("@switch x\n  @default\n    p d"),
            "<p>{% giom$write(\"d\") %}</p>"
        );
    }

    #[test]
    fn should_compile_funcs() {
        assert_eq!(
            body("@func greet(name)\n  p Hi #{name}"),
            "{% const greet = func(name) %}<p>{% giom$write(\"Hi \", name) %}</p>{% end %}"
        );
    }

    #[test]
    fn should_export_funcs_and_values() {
        assert_eq!(
            compile("@export func f\n  p\n@export title = \"Home\""),
            "# gad: mixed\n{% const f = func() %}<p></p>{% end %}\n{% return {f: f, title: \"Home\"} %}"
        );
    }

    #[test]
    fn should_compile_comps_before_body() {
        assert_eq!(
            body("+card(\"T\")\n@comp card(title)\n  h1 #{title}"),
            "{% const card = func(title; $slots={}) %}<h1>{% giom$write(title) %}</h1>{% end %}\
             {% do %}{% card(\"T\") %}{% end %}"
        );
    }

    #[test]
    fn should_sort_comps_by_name() {
        assert_eq!(
            body("@comp b\n  p b\n@comp a\n  p a"),
            "{% const a = func(;$slots={}) %}<p>{% giom$write(\"a\") %}</p>{% end %}\
             {% const b = func(;$slots={}) %}<p>{% giom$write(\"b\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_reject_duplicate_comps() {
        let err = compile_error("@comp a\n  p\n@comp a\n  p");
        assert!(err.contains("comp duplicate \"a\""), "{}", err);
    }

    #[test]
    fn should_replace_overridden_comps() {
        assert_eq!(
            body("@comp a\n  p one\n@comp =a\n  p two"),
            "{% const a = func(;$slots={}) %}<p>{% giom$write(\"two\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_export_comps_by_id() {
        assert_eq!(
            compile("@export comp my-card\n  p\n+my-card"),
            "# gad: mixed\n{% const my__card = func(;$slots={}) %}<p></p>{% end %}\
             {% do %}{% my__card() %}{% end %}\n{% return {\"my-card\": my__card} %}"
        );
    }

    #[test]
    fn should_export_main_comp() {
        assert_eq!(
            compile("@main(x)\n  p #{x}"),
            "# gad: mixed\n{% const main = func(x; $slots={}) %}<p>{% giom$write(x) %}</p>{% end %}\n{% return {main: main} %}"
        );
    }

    #[test]
    fn should_hoist_funcs_in_comps() {
        assert_eq!(
            body("@comp c\n  ~ var a = 1\n  p x\n  @func f\n    p f"),
            "{% const c = func(;$slots={}) %}{% var a = 1; %}\
             {% const f = func() %}<p>{% giom$write(\"f\") %}</p>{% end %}\
             <p>{% giom$write(\"x\") %}</p>{% end %}"
        );
    }

    #[test]
    fn should_emit_nested_comps_inside_parent() {
        assert_eq!(
            body("@comp outer\n  @comp inner\n    p i\n  +inner"),
            "{% const outer = func(;$slots={}) %}\
             {% const inner = func(;$slots={}) %}<p>{% giom$write(\"i\") %}</p>{% end %}\
             {% do %}{% inner() %}{% end %}{% end %}"
        );
    }

    #[test]
    fn should_write_wrapper_lines() {
        let options = CompileOptions {
            global_names: vec!["site".to_string(), "user".to_string()],
            pre_code: Some("const x = 1".to_string()),
            ..CompileOptions::default()
        };
        assert_eq!(
            compile_with("p", &options),
            "global(site, user)\nconst x = 1\n# gad: mixed\n<p></p>\n{% return {} %}"
        );
    }

    #[test]
    fn should_pretty_print_nested_tags() {
        let options = CompileOptions {
            pretty_print: true,
            ..CompileOptions::default()
        };
        assert_eq!(
            compile_with("div\n  p a\n  p b", &options),
            "# gad: mixed\n<div>\n\t<p>{% giom$write(\"a\") %}</p>\n\t<p>{% giom$write(\"b\") %}</p>\n</div>\n{% return {} %}"
        );
    }

    #[test]
    fn should_report_positions_with_filename() {
        let options = CompileOptions::default().with_filename("views/page.giom");
        let err = giom_compiler::compile_to_string("div\n  p\n @else", &options).unwrap_err();
        assert!(
            err.to_string().starts_with("giom Error in <views/page.giom:3:"),
            "{}",
            err
        );
    }
}
