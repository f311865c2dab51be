#[cfg(test)]
mod scanner_tests {
    use rox::error::RoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_one_and_two_char_operators() {
        assert_token_sequence(
            "= == ! != < <= > >=",
            &[
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        // A keyword prefix does not make an identifier a keyword.
        assert_token_sequence(
            "or orchid class classes var _x",
            &[
                (TokenType::OR, "or"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classes"),
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_number_literals() {
        // A trailing dot is not part of the number.
        assert_token_sequence(
            "1 23.45 6.",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::NUMBER(23.45), "23.45"),
                (TokenType::NUMBER(6.0), "6"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_slash_alone_is_division() {
        assert_token_sequence(
            "8/2",
            &[
                (TokenType::NUMBER(8.0), "8"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(2.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_token_sequence(
            "var x // trailing comment\n// whole line\ny // comment at eof",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::IDENTIFIER, "y"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_string_payload_and_multiline_lines() {
        let source = "\"one\ntwo\"\nx";
        let tokens: Vec<_> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 3);

        let TokenType::STRING(ref contents) = tokens[0].token_type else {
            panic!("expected a string token, got {:?}", tokens[0]);
        };

        assert_eq!(contents, "one\ntwo");
        assert_eq!(tokens[0].lexeme, "\"one\ntwo\"");

        // The string token carries the line it ends on; the newline inside
        // it still counts.
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_line_counting_skips_blank_lines() {
        let tokens: Vec<_> = Scanner::new(b"a\nb\n\nc").filter_map(Result::ok).collect();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();

        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn test_unterminated_string_still_yields_eof() {
        let results: Vec<_> = Scanner::new(b"\"abc").collect();

        assert_eq!(results.len(), 2);

        let error = results[0]
            .as_ref()
            .expect_err("an unterminated string should not scan");

        assert_eq!(error.to_string(), "[line 1] Error: Unterminated string.");
        assert!(matches!(
            results[1],
            Ok(Token {
                token_type: TokenType::EOF,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_input_emits_exactly_one_eof() {
        let mut scanner = Scanner::new(b"");

        assert!(matches!(
            scanner.next(),
            Some(Ok(Token {
                token_type: TokenType::EOF,
                ..
            }))
        ));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_display_forms() {
        let tokens: Vec<_> = Scanner::new(b"3 \"hi\" (").filter_map(Result::ok).collect();
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            vec![
                "NUMBER 3 3.0",
                "STRING \"hi\" hi",
                "LEFT_PAREN ( null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        // Helper function
        fn assert_token_matches(
            result: &Result<Token<'_>, RoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }
}
