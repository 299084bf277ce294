use std::ops::Bound;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{map, value},
};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, Result};
use crate::query::ast::{BooleanQuery, Occur, Operator, Query};

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Plus,
    Minus,
    And,
    Or,
    Not,
    Word(String),
}

#[derive(Debug, Clone)]
struct Spanned {
    lexeme: Lexeme,
    position: usize,
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ':' | '"')
}

// Any Unicode whitespace separates terms, U+3000 and NBSP included.
fn skip_whitespace(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace()).parse(input)
}

fn lexeme(input: &str) -> IResult<&str, Lexeme> {
    alt((
        value(Lexeme::LParen, char('(')),
        value(Lexeme::RParen, char(')')),
        value(Lexeme::LBracket, char('[')),
        value(Lexeme::RBracket, char(']')),
        value(Lexeme::LBrace, char('{')),
        value(Lexeme::RBrace, char('}')),
        value(Lexeme::Colon, char(':')),
        value(Lexeme::Plus, char('+')),
        value(Lexeme::Minus, char('-')),
        map(take_while1(is_word_char), |word: &str| match word {
            "AND" | "&&" => Lexeme::And,
            "OR" | "||" => Lexeme::Or,
            "NOT" => Lexeme::Not,
            _ => Lexeme::Word(word.to_string()),
        }),
    ))
    .parse(input)
}

fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let (after, _) = skip_whitespace(rest)
            .map_err(|_| Error::query_parse(input.len() - rest.len(), "unreadable input"))?;
        if after.is_empty() {
            return Ok(tokens);
        }
        let position = input.len() - after.len();
        match lexeme(after) {
            Ok((next, lexeme)) => {
                tokens.push(Spanned { lexeme, position });
                rest = next;
            }
            Err(_) => {
                let found = after.chars().next().unwrap_or(' ');
                let context = if found == '"' {
                    "phrase queries are not supported".to_string()
                } else {
                    format!("unexpected character {:?}", found)
                };
                return Err(Error::query_parse(position, context));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Conjunction {
    None,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// Classic query syntax parser:
/// - `rust programming`       -> either term, default operator OR
/// - `title:rust`             -> field term
/// - `+rust -java`, `NOT java` -> required / prohibited clauses
/// - `a AND (b OR c)`         -> grouping
/// - `year:[2010 TO *]`       -> numeric range, `{}` for exclusive ends
/// - `*:*`                    -> match all
///
/// Every term is run through the analyzer of its field. A term the analyzer
/// reduces to nothing (a stop word) is dropped.
pub struct QueryParser<'a> {
    analyzer: &'a dyn Analyzer,
    default_fields: Vec<String>,
    default_operator: Operator,
}

impl<'a> QueryParser<'a> {
    pub fn new(analyzer: &'a dyn Analyzer, default_fields: &[String]) -> Self {
        QueryParser {
            analyzer,
            default_fields: default_fields.to_vec(),
            default_operator: Operator::Or,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.default_operator = operator;
        self
    }

    pub fn parse(&self, input: &str) -> Result<Query> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(Error::query_parse(0, "empty query"));
        }

        let mut state = ParseState {
            parser: self,
            tokens,
            pos: 0,
            end: input.len(),
        };
        let query = state.parse_query(&self.default_fields)?;
        if let Some(token) = state.peek() {
            return Err(Error::query_parse(token.position, "unbalanced ')'"));
        }

        // Everything was analyzed away: nothing can match.
        Ok(query.unwrap_or_else(|| BooleanQuery::new().into()))
    }
}

struct ParseState<'p, 'a> {
    parser: &'p QueryParser<'a>,
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl ParseState<'_, '_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_lexeme(&self) -> Option<&Lexeme> {
        self.peek().map(|t| &t.lexeme)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or(self.end)
    }

    /// Clauses up to the end of input or a closing parenthesis.
    fn parse_query(&mut self, fields: &[String]) -> Result<Option<Query>> {
        let mut clauses: Vec<(Occur, Query)> = Vec::new();
        let mut first = true;

        loop {
            match self.peek_lexeme() {
                None | Some(Lexeme::RParen) => break,
                _ => {}
            }

            let conjunction = match self.peek_lexeme() {
                Some(Lexeme::And) | Some(Lexeme::Or) if first => {
                    return Err(Error::query_parse(self.position(), "query cannot start with an operator"));
                }
                Some(Lexeme::And) => {
                    self.next();
                    Conjunction::And
                }
                Some(Lexeme::Or) => {
                    self.next();
                    Conjunction::Or
                }
                _ => Conjunction::None,
            };

            let modifier = match self.peek_lexeme() {
                Some(Lexeme::Plus) => {
                    self.next();
                    Modifier::Required
                }
                Some(Lexeme::Minus) | Some(Lexeme::Not) => {
                    self.next();
                    Modifier::Prohibited
                }
                _ => Modifier::None,
            };

            let clause = self.parse_clause(fields)?;
            self.add_clause(&mut clauses, conjunction, modifier, clause);
            first = false;
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        if clauses.len() == 1 && clauses[0].0 != Occur::MustNot {
            return Ok(clauses.pop().map(|(_, query)| query));
        }

        let mut boolean = BooleanQuery::new();
        for (occur, query) in clauses {
            boolean.add(occur, query);
        }
        Ok(Some(boolean.into()))
    }

    fn add_clause(
        &self,
        clauses: &mut Vec<(Occur, Query)>,
        conjunction: Conjunction,
        modifier: Modifier,
        clause: Option<Query>,
    ) {
        let default_and = self.parser.default_operator == Operator::And;

        // `a AND b` makes `a` required; `a OR b` under AND-default makes it optional
        if let Some(last) = clauses.last_mut() {
            if conjunction == Conjunction::And && last.0 == Occur::Should {
                last.0 = Occur::Must;
            }
            if conjunction == Conjunction::Or && default_and && last.0 == Occur::Must {
                last.0 = Occur::Should;
            }
        }

        let Some(query) = clause else { return };
        let occur = match modifier {
            Modifier::Prohibited => Occur::MustNot,
            Modifier::Required => Occur::Must,
            Modifier::None => match conjunction {
                Conjunction::And => Occur::Must,
                Conjunction::Or => Occur::Should,
                Conjunction::None if default_and => Occur::Must,
                Conjunction::None => Occur::Should,
            },
        };
        clauses.push((occur, query));
    }

    fn parse_clause(&mut self, fields: &[String]) -> Result<Option<Query>> {
        let position = self.position();
        let Some(token) = self.next() else {
            return Err(Error::query_parse(position, "expected a term"));
        };

        match token.lexeme {
            Lexeme::Word(word) if self.peek_lexeme() == Some(&Lexeme::Colon) => {
                self.next();
                self.parse_field_clause(word, token.position)
            }
            Lexeme::Word(word) => self.term_clause(fields, &word, token.position),
            Lexeme::LParen => {
                let query = self.parse_query(fields)?;
                match self.next() {
                    Some(Spanned { lexeme: Lexeme::RParen, .. }) => Ok(query),
                    _ => Err(Error::query_parse(self.end, "missing ')'")),
                }
            }
            other => Err(Error::query_parse(token.position, format!("unexpected {:?}", other))),
        }
    }

    fn parse_field_clause(&mut self, field: String, field_position: usize) -> Result<Option<Query>> {
        let position = self.position();
        match self.next().map(|t| t.lexeme) {
            Some(Lexeme::Word(word)) if field == "*" && word == "*" => Ok(Some(Query::MatchAll)),
            Some(Lexeme::Word(word)) => self.term_clause(&[field], &word, position),
            Some(Lexeme::LBracket) => self.parse_range(field, true).map(Some),
            Some(Lexeme::LBrace) => self.parse_range(field, false).map(Some),
            Some(Lexeme::LParen) => {
                let query = self.parse_query(&[field])?;
                match self.next() {
                    Some(Spanned { lexeme: Lexeme::RParen, .. }) => Ok(query),
                    _ => Err(Error::query_parse(self.end, "missing ')'")),
                }
            }
            _ if field.is_empty() => Err(Error::query_parse(field_position, "empty field name")),
            _ => Err(Error::query_parse(position, format!("expected a term after '{}:'", field))),
        }
    }

    // [a TO b] / {a TO b}, ends may differ: [a TO b}
    fn parse_range(&mut self, field: String, lower_inclusive: bool) -> Result<Query> {
        let lower = self.parse_bound(lower_inclusive)?;

        let position = self.position();
        match self.next().map(|t| t.lexeme) {
            Some(Lexeme::Word(word)) if word == "TO" => {}
            _ => return Err(Error::query_parse(position, "expected 'TO' in range")),
        }

        let upper_value = self.parse_bound_value()?;
        let position = self.position();
        let upper_inclusive = match self.next().map(|t| t.lexeme) {
            Some(Lexeme::RBracket) => true,
            Some(Lexeme::RBrace) => false,
            _ => return Err(Error::query_parse(position, "expected ']' or '}'")),
        };
        let upper = match upper_value {
            Some(v) if upper_inclusive => Bound::Included(v),
            Some(v) => Bound::Excluded(v),
            None => Bound::Unbounded,
        };

        Ok(Query::range(&field, lower, upper))
    }

    fn parse_bound(&mut self, inclusive: bool) -> Result<Bound<i64>> {
        Ok(match self.parse_bound_value()? {
            Some(v) if inclusive => Bound::Included(v),
            Some(v) => Bound::Excluded(v),
            None => Bound::Unbounded,
        })
    }

    /// `*` is an open end.
    fn parse_bound_value(&mut self) -> Result<Option<i64>> {
        let position = self.position();
        let negative = if self.peek_lexeme() == Some(&Lexeme::Minus) {
            self.next();
            true
        } else {
            false
        };

        match self.next().map(|t| t.lexeme) {
            Some(Lexeme::Word(word)) if word == "*" && !negative => Ok(None),
            Some(Lexeme::Word(word)) => {
                let text = if negative { format!("-{}", word) } else { word };
                text.parse::<i64>()
                    .map(Some)
                    .map_err(|_| Error::query_parse(position, format!("invalid number {:?}", text)))
            }
            _ => Err(Error::query_parse(position, "expected a number or '*'")),
        }
    }

    fn term_clause(&self, fields: &[String], text: &str, position: usize) -> Result<Option<Query>> {
        if fields.is_empty() {
            return Err(Error::query_parse(position, format!("no field for term {:?}", text)));
        }

        let mut per_field = Vec::new();
        for field in fields {
            let tokens = self
                .parser
                .analyzer
                .terms(field, text)
                .map_err(|e| Error::query_parse(position, e.context))?;

            let query = match tokens.len() {
                0 => continue,
                1 => Query::term(field, &tokens[0]),
                _ => {
                    let mut alternatives = BooleanQuery::new();
                    for token in &tokens {
                        alternatives.add(Occur::Should, Query::term(field, token));
                    }
                    alternatives.into()
                }
            };
            per_field.push(query);
        }

        Ok(match per_field.len() {
            0 => None,
            1 => per_field.pop(),
            _ => {
                let mut any_field = BooleanQuery::new();
                for query in per_field {
                    any_field.add(Occur::Should, query);
                }
                Some(any_field.into())
            }
        })
    }
}
