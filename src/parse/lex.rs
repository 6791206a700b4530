use lazy_static::lazy_static;

use std::collections::{HashSet, VecDeque};

use crate::{err_at, Result};

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        for word in [
            "select", "from", "where", "and", "insert", "into", "values",
            "delete", "update", "set", "create", "table", "int", "varchar",
            "view", "as", "index", "on",
        ]
        .iter()
        {
            set.insert(*word);
        }
        set
    };
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Delim(char),
    IntConst(i32),
    StrConst(String),
    Keyword(String),
    Id(String),
}

/// Lexical analyzer for the SQL dialect.
///
/// Identifiers and keywords are case insensitive and lower-cased;
/// identifiers are letters, digits and underscores starting with a
/// letter or underscore; string constants are single quoted with no
/// escapes; integer constants are optionally signed. Anything else is
/// a single character delimiter.
pub struct Lexer {
    tokens: VecDeque<Token>,
}

impl Lexer {
    pub fn new(text: &str) -> Result<Lexer> {
        let tokens = tokenize(text)?;
        Ok(Lexer { tokens })
    }

    pub fn match_delim(&self, d: char) -> bool {
        matches!(self.tokens.front(), Some(Token::Delim(c)) if *c == d)
    }

    pub fn match_int_constant(&self) -> bool {
        matches!(self.tokens.front(), Some(Token::IntConst(_)))
    }

    pub fn match_string_constant(&self) -> bool {
        matches!(self.tokens.front(), Some(Token::StrConst(_)))
    }

    pub fn match_keyword(&self, word: &str) -> bool {
        matches!(self.tokens.front(), Some(Token::Keyword(w)) if w == word)
    }

    pub fn match_id(&self) -> bool {
        matches!(self.tokens.front(), Some(Token::Id(_)))
    }

    pub fn eat_delim(&mut self, d: char) -> Result<()> {
        if self.match_delim(d) {
            self.tokens.pop_front();
            Ok(())
        } else {
            err_at!(BadSyntax, msg: "expected '{}' at {:?}", d, self.tokens.front())
        }
    }

    pub fn eat_int_constant(&mut self) -> Result<i32> {
        match self.tokens.pop_front() {
            Some(Token::IntConst(val)) => Ok(val),
            tok => err_at!(BadSyntax, msg: "expected integer at {:?}", tok),
        }
    }

    pub fn eat_string_constant(&mut self) -> Result<String> {
        match self.tokens.pop_front() {
            Some(Token::StrConst(val)) => Ok(val),
            tok => err_at!(BadSyntax, msg: "expected string at {:?}", tok),
        }
    }

    pub fn eat_keyword(&mut self, word: &str) -> Result<()> {
        if self.match_keyword(word) {
            self.tokens.pop_front();
            Ok(())
        } else {
            err_at!(
                BadSyntax, msg: "expected {} at {:?}", word, self.tokens.front()
            )
        }
    }

    pub fn eat_id(&mut self) -> Result<String> {
        match self.tokens.pop_front() {
            Some(Token::Id(name)) => Ok(name),
            tok => err_at!(BadSyntax, msg: "expected identifier at {:?}", tok),
        }
    }
}

fn tokenize(text: &str) -> Result<VecDeque<Token>> {
    let mut tokens = VecDeque::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '\'' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && chars[j] != '\'' {
                j += 1;
            }
            if j == chars.len() {
                return err_at!(BadSyntax, msg: "unterminated string constant");
            }
            let s: String = chars[start..j].iter().collect();
            tokens.push_back(Token::StrConst(s));
            i = j + 1;
        } else if c.is_ascii_digit()
            || (c == '-' && matches!(chars.get(i + 1), Some(d) if d.is_ascii_digit()))
        {
            let start = i;
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            let s: String = chars[start..j].iter().collect();
            let val = err_at!(BadSyntax, s.parse::<i32>(), "integer {}", s)?;
            tokens.push_back(Token::IntConst(val));
            i = j;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            let mut j = i;
            while j < chars.len()
                && (chars[j].is_alphanumeric() || chars[j] == '_')
            {
                j += 1;
            }
            let word: String = chars[start..j].iter().collect::<String>().to_lowercase();
            if KEYWORDS.contains(word.as_str()) {
                tokens.push_back(Token::Keyword(word));
            } else {
                tokens.push_back(Token::Id(word));
            }
            i = j;
        } else {
            tokens.push_back(Token::Delim(c));
            i += 1;
        }
    }

    Ok(tokens)
}

#[cfg(test)]
#[path = "lex_test.rs"]
mod lex_test;
