/**
 * Host Lexer Tests
 *
 * Token streams of host expressions as embedded in templates.
 */

#[cfg(test)]
mod tests {
    use giom_compiler::host::lexer::{Lexer, Token, TokenType};

    fn lex(text: &str) -> Vec<Token> {
        Lexer::new().tokenize(text)
    }

    fn expect_token(token: &Token, index: usize, end: usize) {
        assert_eq!(token.index, index, "Token index mismatch");
        assert_eq!(token.end, end, "Token end mismatch");
    }

    #[test]
    fn should_tokenize_a_simple_identifier() {
        let tokens = lex("j");
        assert_eq!(tokens.len(), 1);
        expect_token(&tokens[0], 0, 1);
        assert!(tokens[0].is_identifier());
    }

    #[test]
    fn should_tokenize_dollar_prefixed_names() {
        let tokens = lex("$ $a $$slots");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(Token::is_identifier));
        assert_eq!(tokens[2].str_value, "$$slots");
        expect_token(&tokens[2], 5, 12);
    }

    #[test]
    fn should_tokenize_keywords() {
        let tokens = lex("nil true false none");
        assert!(tokens[0].is_keyword("nil"));
        assert!(tokens[1].is_keyword("true"));
        assert!(tokens[2].is_keyword("false"));
        assert!(tokens[3].is_identifier());
    }

    #[test]
    fn should_tokenize_numbers() {
        let tokens = lex("1 2.5 1_000");
        assert!(tokens.iter().all(Token::is_number));
        assert_eq!(tokens[0].num_value, 1.0);
        assert_eq!(tokens[1].num_value, 2.5);
        assert_eq!(tokens[2].num_value, 1000.0);
    }

    #[test]
    fn should_tokenize_strings_with_escapes() {
        let tokens = lex(r#""a\"b" 'c\n'"#);
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_string());
        assert_eq!(tokens[0].str_value, "a\"b");
        assert_eq!(tokens[1].str_value, "c\n");
    }

    #[test]
    fn should_tokenize_compound_operators() {
        let tokens = lex(":= => == != <= >= && || ?? ** ...");
        let ops: Vec<&str> = tokens.iter().map(|t| t.str_value.as_str()).collect();
        assert_eq!(
            ops,
            vec![":=", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "**", "..."]
        );
        assert!(tokens.iter().all(|t| t.token_type == TokenType::Operator));
    }

    #[test]
    fn should_tokenize_call_with_named_arguments() {
        let tokens = lex("f(a; k=1)");
        assert!(tokens[0].is_identifier());
        assert!(tokens[1].is_character('('));
        assert!(tokens[3].is_character(';'));
        assert!(tokens[5].is_operator("="));
        assert!(tokens[7].is_character(')'));
    }

    #[test]
    fn should_stop_at_unterminated_string() {
        let tokens = lex("a 'open");
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].is_error());
        assert_eq!(tokens[1].str_value, "unterminated quote at column 2");
    }

    #[test]
    fn should_report_unexpected_characters() {
        let tokens = lex("a ^ b");
        assert!(tokens[1].is_error());
        assert_eq!(tokens.len(), 2);
    }
}
