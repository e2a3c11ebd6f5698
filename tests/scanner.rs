use rox::scanner::Scanner;
use rox::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn single_character_symbols() {
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
fn one_or_two_character_operators() {
    assert_token_sequence(
        "! != = == > >= < <=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "var foo = classless;",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "foo"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "classless"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );

    assert_token_sequence(
        "class fun for while _under_score2",
        &[
            (TokenType::CLASS, "class"),
            (TokenType::FUN, "fun"),
            (TokenType::FOR, "for"),
            (TokenType::WHILE, "while"),
            (TokenType::IDENTIFIER, "_under_score2"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn number_literals() {
    let scanner = Scanner::new("12 3.5 7.");
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 5);

    match tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 12.0),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }

    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 3.5),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }

    // A trailing dot is not part of the number.
    match tokens[2].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 7.0),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }
    assert_eq!(tokens[3].token_type, TokenType::DOT);
}

#[test]
fn string_literal_payload_excludes_quotes() {
    let scanner = Scanner::new("\"hello world\"");
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 2);
    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected STRING, got {:?}", other),
    }
    assert_eq!(tokens[0].lexeme, "\"hello world\"");
}

#[test]
fn multiline_string_advances_line_counter() {
    let scanner = Scanner::new("\"line one\nline two\"\nvar");
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].token_type, TokenType::VAR);
    assert_eq!(tokens[1].line, 3);
}

#[test]
fn comments_and_whitespace_are_skipped() {
    assert_token_sequence(
        "a // the rest of this line vanishes\nb",
        &[
            (TokenType::IDENTIFIER, "a"),
            (TokenType::IDENTIFIER, "b"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn unexpected_characters_are_reported_but_scanning_continues() {
    let scanner = Scanner::new(",.$(#");
    let results: Vec<_> = scanner.collect();

    // COMMA, DOT, error, LEFT_PAREN, error, EOF
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for error in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(error.to_string().contains("Unexpected character"));
    }

    let tokens: Vec<&Token> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(tokens[0].token_type, TokenType::COMMA);
    assert_eq!(tokens[1].token_type, TokenType::DOT);
    assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
    assert_eq!(tokens[3].token_type, TokenType::EOF);
}

#[test]
fn unterminated_string_reports_opening_line() {
    let scanner = Scanner::new("var x\n\"runs off");
    let results: Vec<_> = scanner.collect();

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], "[line 2] Error: Unterminated string.");

    // The EOF token is still emitted after the error.
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .any(|t| t.token_type == TokenType::EOF));
}
