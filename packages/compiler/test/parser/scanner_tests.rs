/**
 * Scanner Tests
 *
 * Token streams produced by the line scanner, including the indent stack,
 * raw blocks and line continuation.
 */

#[cfg(test)]
mod tests {
    use giom_compiler::parser::{Scanner, Token, TokenKind, TokenKind::*};

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source)
            .tokenize()
            .unwrap_or_else(|err| panic!("scan failed: {}", err))
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn should_scan_nested_tags() {
        assert_eq!(
            kinds("html\n  body\n    p text\n  footer"),
            vec![Tag, Indent, Tag, Indent, Tag, Text, Outdent, Tag, Outdent, Eof]
        );
    }

    #[test]
    fn should_close_open_indents_at_eof() {
        assert_eq!(
            kinds("a\n\tb\n\t\tc"),
            vec![Tag, Indent, Tag, Indent, Tag, Outdent, Outdent, Eof]
        );
    }

    #[test]
    fn should_reject_mismatching_indentation() {
        let err = Scanner::new("a\n    b\n  c").tokenize().unwrap_err();
        assert!(err
            .to_string()
            .contains("Mismatching indentation. Please use a coherent indent schema."));
    }

    #[test]
    fn should_scan_tag_attributes() {
        let tokens = scan("a#top.link[href=\"/\"] Home");
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[1].kind, Id);
        assert_eq!(tokens[1].value, "top");
        assert_eq!(tokens[2].kind, ClassName);
        assert_eq!(tokens[2].value, "link");
        assert_eq!(tokens[3].kind, Attribute);
        assert!(tokens[3].elements.is_some());
        assert_eq!(tokens[4].kind, Text);
        assert_eq!(tokens[4].value, "Home");
    }

    #[test]
    fn should_scan_conditional_attributes() {
        let tokens = scan("p\n  .active ? selected");
        assert_eq!(tokens[2].kind, ClassName);
        assert_eq!(tokens[2].get("Condition"), "selected");
    }

    #[test]
    fn should_scan_piped_text() {
        let tokens = scan("| plain text");
        assert_eq!(tokens[0].kind, Text);
        assert_eq!(tokens[0].get("Mode"), "piped");
        assert_eq!(tokens[0].value, "plain text");
    }

    #[test]
    fn should_scan_control_flow_headers() {
        let tokens = scan("@if a > 1\n  p\n@else if b\n  p\n@else\n  p");
        let heads: Vec<_> = tokens
            .iter()
            .filter(|t| matches!(t.kind, If | ElseIf | Else))
            .map(|t| (t.kind, t.value.as_str()))
            .collect();
        assert_eq!(heads, vec![(If, "a > 1"), (ElseIf, "b"), (Else, "")]);
    }

    #[test]
    fn should_keep_for_keyword_in_value() {
        let tokens = scan("@for $i, $x in xs\n  p");
        assert_eq!(tokens[0].kind, For);
        assert_eq!(tokens[0].value, "for $i, $x in xs");
    }

    #[test]
    fn should_scan_comp_headers() {
        let tokens = scan("@export comp card(title; kind=\"info\")\n  p");
        assert_eq!(tokens[0].kind, Comp);
        assert_eq!(tokens[0].value, "card");
        assert_eq!(tokens[0].get("Args"), "title; kind=\"info\"");
        assert!(tokens[0].flag("Exported"));
    }

    #[test]
    fn should_scan_main_comp_as_exported() {
        let tokens = scan("@main(x)\n  p");
        assert_eq!(tokens[0].kind, Comp);
        assert_eq!(tokens[0].value, "main");
        assert!(tokens[0].flag("Exported"));
    }

    #[test]
    fn should_scan_comp_calls() {
        let tokens = scan("+card(\"T\") ~\n  ~ x := 1");
        assert_eq!(tokens[0].kind, CompCall);
        assert_eq!(tokens[0].get("Args"), "\"T\"");
        assert!(tokens[0].flag("WithCode"));
        assert_eq!(tokens[2].kind, Code);
        assert_eq!(tokens[2].values, vec!["x := 1".to_string()]);
    }

    #[test]
    fn should_scan_slots_and_passes() {
        let tokens = scan("@slot body(item)\n@slot #body(item)");
        assert_eq!(tokens[0].kind, Slot);
        assert_eq!(tokens[0].get("Args"), "item");
        assert_eq!(tokens[1].kind, SlotPass);
        assert_eq!(tokens[1].get("Header"), "body(item)");
    }

    #[test]
    fn should_capture_multiline_code() {
        let tokens = scan("~~\nvar a = 1\nvar b = 2\n~~\np");
        assert_eq!(tokens[0].kind, Code);
        assert_eq!(
            tokens[0].values,
            vec!["var a = 1".to_string(), "var b = 2".to_string()]
        );
        assert_eq!(tokens[1].kind, Tag);
    }

    #[test]
    fn should_join_continued_lines() {
        let tokens = scan("p first \\\n    second");
        assert_eq!(tokens[1].kind, Text);
        assert_eq!(tokens[1].value, "first second");
    }

    #[test]
    fn should_stop_at_return_marker() {
        assert_eq!(kinds("p\n@return\np ignored"), vec![Tag, Eof]);
    }

    #[test]
    fn should_capture_raw_blocks() {
        let mut scanner = Scanner::new("script\n  if (a) {\n    b()\n  }\np");
        assert_eq!(scanner.next().unwrap().kind, Tag);
        assert_eq!(scanner.next().unwrap().kind, Indent);
        scanner.enter_raw();
        let raw = scanner.next().unwrap();
        assert_eq!(raw.kind, Text);
        assert_eq!(raw.get("Mode"), "raw");
        assert_eq!(raw.value, "if (a) {\n\tb()\n}");
        assert_eq!(scanner.next().unwrap().kind, Outdent);
        assert_eq!(scanner.next().unwrap().kind, Tag);
    }

    #[test]
    fn should_report_token_positions() {
        let tokens = scan("div\n  span");
        assert_eq!(tokens[2].position.line, 2);
        assert_eq!(tokens[2].position.column, 3);
        assert_eq!(tokens[2].position.length, 4);
    }
}
