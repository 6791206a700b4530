use super::*;

#[test]
fn test_keywords_and_ids() {
    let mut lexer = Lexer::new("SELECT Name FROM movies").unwrap();
    assert!(lexer.match_keyword("select"));
    lexer.eat_keyword("select").unwrap();
    assert!(lexer.match_id());
    assert_eq!(lexer.eat_id().unwrap(), "name"); // ids lower-cased
    lexer.eat_keyword("from").unwrap();
    assert_eq!(lexer.eat_id().unwrap(), "movies");
}

#[test]
fn test_constants_and_delims() {
    let mut lexer = Lexer::new("a = 3, b = 'the title', c = -42").unwrap();
    assert_eq!(lexer.eat_id().unwrap(), "a");
    lexer.eat_delim('=').unwrap();
    assert!(lexer.match_int_constant());
    assert_eq!(lexer.eat_int_constant().unwrap(), 3);
    lexer.eat_delim(',').unwrap();
    assert_eq!(lexer.eat_id().unwrap(), "b");
    lexer.eat_delim('=').unwrap();
    assert!(lexer.match_string_constant());
    assert_eq!(lexer.eat_string_constant().unwrap(), "the title");
    lexer.eat_delim(',').unwrap();
    assert_eq!(lexer.eat_id().unwrap(), "c");
    lexer.eat_delim('=').unwrap();
    assert_eq!(lexer.eat_int_constant().unwrap(), -42);
}

#[test]
fn test_underscore_identifiers() {
    let mut lexer = Lexer::new("movie_title_2").unwrap();
    assert_eq!(lexer.eat_id().unwrap(), "movie_title_2");
}

#[test]
fn test_keyword_is_not_an_id() {
    let mut lexer = Lexer::new("select").unwrap();
    assert!(!lexer.match_id());
    match lexer.eat_id() {
        Err(crate::Error::BadSyntax(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_wrong_token_rejected() {
    let mut lexer = Lexer::new("= 5").unwrap();
    match lexer.eat_int_constant() {
        Err(crate::Error::BadSyntax(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    // the delimiter was consumed by the failed eat; what remains is 5
    assert!(lexer.match_int_constant());
}

#[test]
fn test_unterminated_string() {
    match Lexer::new("select 'oops") {
        Err(crate::Error::BadSyntax(_, _)) => (),
        res => panic!("unexpected {:?}", res.map(|_| ())),
    }
}
