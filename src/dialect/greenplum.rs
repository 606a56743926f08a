// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use log::{debug, trace};

use crate::ast::{
    FormatOption, FormatProperty, LocationProperty, SegmentScope, Statement, TableProperty,
};
use crate::dialect::{Dialect, PostgreSqlDialect};
use crate::keywords::Keyword;
use crate::parser::{ParseSession, Parser, ParserError};
use crate::tokenizer::{Token, TokenWithLocation};

/// Greenplum: PostgreSQL plus distribution policies and external tables.
///
/// Identifiers follow PostgreSQL rules.
#[derive(Debug, Default)]
pub struct GreenplumDialect {}

impl Dialect for GreenplumDialect {
    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        PostgreSqlDialect {}.is_delimited_identifier_start(ch)
    }

    fn is_identifier_start(&self, ch: char) -> bool {
        PostgreSqlDialect {}.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        PostgreSqlDialect {}.is_identifier_part(ch)
    }

    fn parse_statement(&self, parser: &mut Parser) -> Option<Result<Statement, ParserError>> {
        if parser.parse_keyword(Keyword::CREATE) {
            return Some(parse_create(parser));
        }
        None
    }

    fn parse_table_property(
        &self,
        parser: &mut Parser,
    ) -> Option<Result<TableProperty, ParserError>> {
        KEYWORD_TABLE.iter().find_map(|entry| {
            let parse_clause = post_schema_clause(entry.kind)?;
            parser
                .parse_keywords(entry.keywords)
                .then(|| parse_clause(parser))
        })
    }
}

type ClauseParser = fn(&mut Parser) -> Result<TableProperty, ParserError>;

/// The parser for a clause that follows the column schema, called after
/// its keywords
fn post_schema_clause(kind: GreenplumKeyword) -> Option<ClauseParser> {
    let parse: ClauseParser = match kind {
        GreenplumKeyword::DistributedBy => parse_distributed_by,
        GreenplumKeyword::DistributedRandomly => parse_distributed_randomly,
        GreenplumKeyword::Location => parse_location,
        GreenplumKeyword::Format => parse_format,
        GreenplumKeyword::Encoding => parse_encoding,
        GreenplumKeyword::OnAll
        | GreenplumKeyword::OnMaster
        | GreenplumKeyword::OnSegments
        | GreenplumKeyword::External
        | GreenplumKeyword::Readable
        | GreenplumKeyword::Writable => return None,
    };
    Some(parse)
}

/// A keyword, or keyword phrase, of the Greenplum table clauses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GreenplumKeyword {
    DistributedBy,
    DistributedRandomly,
    OnAll,
    OnMaster,
    OnSegments,
    External,
    Readable,
    Writable,
    Location,
    Format,
    Encoding,
}

#[derive(Debug)]
pub struct KeywordEntry {
    /// Canonical spelling, words separated by a single space
    pub phrase: &'static str,
    /// The tokens the phrase is made of
    pub keywords: &'static [Keyword],
    pub kind: GreenplumKeyword,
}

/// Every keyword the Greenplum clauses are built from. Multi-word phrases
/// come before any single word they start with.
pub const KEYWORD_TABLE: &[KeywordEntry] = &[
    KeywordEntry {
        phrase: "DISTRIBUTED BY",
        keywords: &[Keyword::DISTRIBUTED, Keyword::BY],
        kind: GreenplumKeyword::DistributedBy,
    },
    KeywordEntry {
        phrase: "DISTRIBUTED RANDOMLY",
        keywords: &[Keyword::DISTRIBUTED, Keyword::RANDOMLY],
        kind: GreenplumKeyword::DistributedRandomly,
    },
    KeywordEntry {
        phrase: "ON ALL",
        keywords: &[Keyword::ON, Keyword::ALL],
        kind: GreenplumKeyword::OnAll,
    },
    KeywordEntry {
        phrase: "ON MASTER",
        keywords: &[Keyword::ON, Keyword::MASTER],
        kind: GreenplumKeyword::OnMaster,
    },
    KeywordEntry {
        phrase: "ON SEGMENTS",
        keywords: &[Keyword::ON, Keyword::SEGMENTS],
        kind: GreenplumKeyword::OnSegments,
    },
    KeywordEntry {
        phrase: "EXTERNAL",
        keywords: &[Keyword::EXTERNAL],
        kind: GreenplumKeyword::External,
    },
    KeywordEntry {
        phrase: "READABLE",
        keywords: &[Keyword::READABLE],
        kind: GreenplumKeyword::Readable,
    },
    KeywordEntry {
        phrase: "WRITABLE",
        keywords: &[Keyword::WRITABLE],
        kind: GreenplumKeyword::Writable,
    },
    KeywordEntry {
        phrase: "LOCATION",
        keywords: &[Keyword::LOCATION],
        kind: GreenplumKeyword::Location,
    },
    KeywordEntry {
        phrase: "FORMAT",
        keywords: &[Keyword::FORMAT],
        kind: GreenplumKeyword::Format,
    },
    KeywordEntry {
        phrase: "ENCODING",
        keywords: &[Keyword::ENCODING],
        kind: GreenplumKeyword::Encoding,
    },
];

/// Classify a candidate lexeme such as `"distributed   by"`.
///
/// Matching ignores case and the amount of whitespace between words.
/// Returns `None` when the lexeme is not a Greenplum keyword, in which
/// case it is an ordinary word.
pub fn lookup_keyword(lexeme: &str) -> Option<GreenplumKeyword> {
    KEYWORD_TABLE
        .iter()
        .find(|entry| {
            let mut words = lexeme.split_whitespace();
            entry
                .phrase
                .split(' ')
                .all(|expected| words.next().is_some_and(|w| w.eq_ignore_ascii_case(expected)))
                && words.next().is_none()
        })
        .map(|entry| entry.kind)
}

/// Consume the first phrase of `kinds` found at the current position.
/// Nothing is consumed when there is no match.
fn parse_greenplum_keyword(
    parser: &mut Parser,
    kinds: &[GreenplumKeyword],
) -> Option<GreenplumKeyword> {
    KEYWORD_TABLE
        .iter()
        .filter(|entry| kinds.contains(&entry.kind))
        .find(|entry| parser.parse_keywords(entry.keywords))
        .map(|entry| entry.kind)
}

/// `CREATE [ READABLE | WRITABLE ] [ EXTERNAL ] ...`, after `CREATE`
fn parse_create(parser: &mut Parser) -> Result<Statement, ParserError> {
    scan_external_prefix(parser);

    let result = parser.parse_create();
    // the prefix belongs to this statement only, whatever the outcome
    let session = parser.take_session();
    let mut statement = result?;

    if session.is_external {
        let properties = statement.table_properties_mut();
        properties.push(TableProperty::External);
        if session.external_readable {
            properties.push(TableProperty::Readable);
        }
        if session.external_writable {
            properties.push(TableProperty::Writable);
        }
    }
    debug!("Parsed CREATE TABLE with {:?}", session);
    Ok(statement)
}

/// Record `[ READABLE | WRITABLE ] EXTERNAL` in the parser session.
///
/// `READABLE` and `WRITABLE` are only meaningful in front of `EXTERNAL`;
/// without it the parser is put back where it started.
fn scan_external_prefix(parser: &mut Parser) {
    let checkpoint = parser.checkpoint();
    match parse_greenplum_keyword(
        parser,
        &[GreenplumKeyword::Readable, GreenplumKeyword::Writable],
    ) {
        Some(GreenplumKeyword::Readable) => parser.session_mut().external_readable = true,
        Some(GreenplumKeyword::Writable) => parser.session_mut().external_writable = true,
        _ => {}
    }

    if parse_greenplum_keyword(parser, &[GreenplumKeyword::External]).is_some() {
        parser.session_mut().is_external = true;
    } else if parser.session() != &ParseSession::default() {
        trace!("READABLE/WRITABLE without EXTERNAL, backtracking");
        parser.restore(checkpoint);
        *parser.session_mut() = ParseSession::default();
    }
}

fn missing_token<T>(
    clause: &str,
    expected: &str,
    found: TokenWithLocation,
) -> Result<T, ParserError> {
    Err(ParserError::MissingToken {
        clause: clause.to_string(),
        expected: expected.to_string(),
        found: format!("{}{}", found, found.location),
    })
}

fn expect_clause_token(
    parser: &mut Parser,
    clause: &str,
    expected: &Token,
) -> Result<(), ParserError> {
    if parser.consume_token(expected) {
        Ok(())
    } else {
        missing_token(clause, &format!("'{expected}'"), parser.peek_token())
    }
}

/// Parse a parenthesized, comma-separated, non-empty list with `item`
fn parse_clause_list<T, F>(
    parser: &mut Parser,
    clause: &str,
    expected: &str,
    mut item: F,
) -> Result<Vec<T>, ParserError>
where
    F: FnMut(Token) -> Option<T>,
{
    expect_clause_token(parser, clause, &Token::LParen)?;
    if parser.consume_token(&Token::RParen) {
        return Err(ParserError::EmptyList {
            clause: clause.to_string(),
        });
    }
    let mut values = vec![];
    loop {
        let next_token = parser.next_token();
        match item(next_token.token.clone()) {
            Some(value) => values.push(value),
            None => return missing_token(clause, expected, next_token),
        }
        if !parser.consume_token(&Token::Comma) {
            break;
        }
    }
    expect_clause_token(parser, clause, &Token::RParen)?;
    Ok(values)
}

/// `DISTRIBUTED BY (<column> [, ...])`, after `DISTRIBUTED BY`
pub fn parse_distributed_by(parser: &mut Parser) -> Result<TableProperty, ParserError> {
    let columns = parse_clause_list(parser, "DISTRIBUTED BY", "a column name", |token| {
        match token {
            Token::Word(w) => Some(w.to_ident()),
            _ => None,
        }
    })?;
    Ok(TableProperty::DistributedBy(columns))
}

/// `DISTRIBUTED RANDOMLY` carries nothing after its keywords
fn parse_distributed_randomly(_parser: &mut Parser) -> Result<TableProperty, ParserError> {
    Ok(TableProperty::DistributedRandomly)
}

/// `LOCATION ('<uri>' [, ...]) [ON ALL | MASTER | SEGMENTS]`, after `LOCATION`
pub fn parse_location(parser: &mut Parser) -> Result<TableProperty, ParserError> {
    let uris = parse_clause_list(parser, "LOCATION", "a URI string", |token| match token {
        Token::SingleQuotedString(uri) => Some(uri),
        _ => None,
    })?;
    let on_segment = match parse_greenplum_keyword(
        parser,
        &[
            GreenplumKeyword::OnAll,
            GreenplumKeyword::OnMaster,
            GreenplumKeyword::OnSegments,
        ],
    ) {
        Some(GreenplumKeyword::OnAll) => Some(SegmentScope::All),
        Some(GreenplumKeyword::OnMaster) => Some(SegmentScope::Master),
        Some(GreenplumKeyword::OnSegments) => Some(SegmentScope::Segments),
        _ => None,
    };
    Ok(TableProperty::Location(LocationProperty { uris, on_segment }))
}

/// A string literal, or `MissingValue` for `key` in `clause`
fn parse_clause_string(
    parser: &mut Parser,
    clause: &str,
    key: &str,
    allow_empty: bool,
) -> Result<String, ParserError> {
    match parser.next_token().token {
        Token::SingleQuotedString(s) if allow_empty || !s.is_empty() => Ok(s),
        _ => Err(ParserError::MissingValue {
            clause: clause.to_string(),
            key: key.to_string(),
        }),
    }
}

/// `FORMAT '<name>' [( <option> [[,] ...] )]`, after `FORMAT`
pub fn parse_format(parser: &mut Parser) -> Result<TableProperty, ParserError> {
    let name = parse_clause_string(parser, "FORMAT", "FORMAT", false)?;
    let options = if parser.consume_token(&Token::LParen) {
        Some(parse_format_options(parser)?).filter(|options| !options.is_empty())
    } else {
        None
    };
    Ok(TableProperty::Format(FormatProperty { name, options }))
}

fn parse_format_options(parser: &mut Parser) -> Result<Vec<FormatOption>, ParserError> {
    const CLAUSE: &str = "FORMAT";
    let mut options: Vec<FormatOption> = vec![];
    let mut after_comma = false;
    loop {
        let next_token = parser.next_token();
        let key = match next_token.token {
            Token::RParen if !after_comma => break,
            Token::Comma if !after_comma && !options.is_empty() => {
                after_comma = true;
                continue;
            }
            Token::Word(ref w) => w.clone(),
            _ => return missing_token(CLAUSE, "a format option", next_token),
        };
        after_comma = false;

        let option = match key.keyword {
            Keyword::FORMATTER
            | Keyword::DELIMITER
            | Keyword::NULL
            | Keyword::QUOTE
            | Keyword::ESCAPE
            | Keyword::NEWLINE => {
                let key = key.value.to_uppercase();
                if !parser.parse_keyword(Keyword::AS) {
                    let _ = parser.consume_token(&Token::Eq);
                }
                let value = parse_clause_string(parser, CLAUSE, &key, true)?;
                FormatOption::string(key, value)
            }
            Keyword::HEADER => FormatOption::flag("HEADER"),
            Keyword::FILL if parser.parse_keywords(&[Keyword::MISSING, Keyword::FIELDS]) => {
                FormatOption::flag("FILL MISSING FIELDS")
            }
            _ => {
                let key = key.to_string();
                expect_clause_token(parser, CLAUSE, &Token::Eq)?;
                let value = parse_clause_string(parser, CLAUSE, &key, true)?;
                FormatOption::string(key, value)
            }
        };

        // a repeated key keeps its first position and its last value
        match options
            .iter_mut()
            .find(|existing| existing.key.eq_ignore_ascii_case(&option.key))
        {
            Some(existing) => existing.value = option.value,
            None => options.push(option),
        }
    }
    Ok(options)
}

/// `ENCODING '<name>'`, after `ENCODING`
pub fn parse_encoding(parser: &mut Parser) -> Result<TableProperty, ParserError> {
    let encoding = parse_clause_string(parser, "ENCODING", "ENCODING", false)?;
    Ok(TableProperty::Encoding(encoding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FormatOptionValue;
    use crate::test_utils::greenplum;

    #[test]
    fn test_lookup_keyword() {
        assert_eq!(
            lookup_keyword("DISTRIBUTED BY"),
            Some(GreenplumKeyword::DistributedBy)
        );
        assert_eq!(
            lookup_keyword("distributed \t randomly"),
            Some(GreenplumKeyword::DistributedRandomly)
        );
        assert_eq!(lookup_keyword("On Segments"), Some(GreenplumKeyword::OnSegments));
        assert_eq!(lookup_keyword("external"), Some(GreenplumKeyword::External));
        assert_eq!(lookup_keyword("WRITABLE"), Some(GreenplumKeyword::Writable));

        assert_eq!(lookup_keyword("DISTRIBUTED"), None);
        assert_eq!(lookup_keyword("DISTRIBUTED BY HASH"), None);
        assert_eq!(lookup_keyword("ON"), None);
        assert_eq!(lookup_keyword("TABLE"), None);
        assert_eq!(lookup_keyword(""), None);
    }

    #[test]
    fn test_keyword_table_matches_tokens() {
        for entry in KEYWORD_TABLE {
            let words: Vec<&str> = entry.phrase.split(' ').collect();
            assert_eq!(words.len(), entry.keywords.len(), "{}", entry.phrase);
            for (word, keyword) in words.iter().zip(entry.keywords) {
                assert_eq!(format!("{keyword:?}"), *word);
            }
            assert_eq!(lookup_keyword(entry.phrase), Some(entry.kind));
        }
    }

    #[test]
    fn test_parse_greenplum_keyword_does_not_consume_on_mismatch() {
        greenplum().run_parser_method("ON COMMIT", |parser| {
            assert_eq!(
                parse_greenplum_keyword(parser, &[GreenplumKeyword::OnAll]),
                None
            );
            assert!(parser.parse_keyword(Keyword::ON));
        });
    }

    #[test]
    fn test_post_schema_clauses() {
        let post_schema: Vec<GreenplumKeyword> = KEYWORD_TABLE
            .iter()
            .map(|entry| entry.kind)
            .filter(|kind| post_schema_clause(*kind).is_some())
            .collect();
        assert_eq!(
            post_schema,
            vec![
                GreenplumKeyword::DistributedBy,
                GreenplumKeyword::DistributedRandomly,
                GreenplumKeyword::Location,
                GreenplumKeyword::Format,
                GreenplumKeyword::Encoding,
            ]
        );

        let dialect = GreenplumDialect {};
        greenplum().run_parser_method("EXTERNAL", |parser| {
            assert_eq!(dialect.parse_table_property(parser), None);
            assert!(parser.parse_keyword(Keyword::EXTERNAL));
        });
        greenplum().run_parser_method("DISTRIBUTED RANDOMLY", |parser| {
            assert_eq!(
                dialect.parse_table_property(parser),
                Some(Ok(TableProperty::DistributedRandomly))
            );
        });
    }

    #[test]
    fn test_parse_distributed_by() {
        greenplum().run_parser_method("(a, \"B\")", |parser| {
            assert_eq!(
                parse_distributed_by(parser).unwrap().to_string(),
                "DISTRIBUTED BY (a, \"B\")"
            );
        });
        greenplum().run_parser_method("a)", |parser| {
            assert_eq!(
                parse_distributed_by(parser),
                Err(ParserError::MissingToken {
                    clause: "DISTRIBUTED BY".to_string(),
                    expected: "'('".to_string(),
                    found: "a at Line: 1, Column 1".to_string(),
                })
            );
        });
        greenplum().run_parser_method("(a", |parser| {
            assert!(matches!(
                parse_distributed_by(parser),
                Err(ParserError::MissingToken { expected, .. }) if expected == "')'"
            ));
        });
    }

    #[test]
    fn test_parse_location() {
        greenplum().run_parser_method("('a', 'b') ON MASTER", |parser| {
            assert_eq!(
                parse_location(parser).unwrap(),
                TableProperty::Location(LocationProperty::new(["a", "b"]).on(SegmentScope::Master))
            );
        });
        // ON without a scope is left for the caller
        greenplum().run_parser_method("('a') ON COMMIT", |parser| {
            assert_eq!(
                parse_location(parser).unwrap(),
                TableProperty::Location(LocationProperty::new(["a"]))
            );
            assert!(parser.parse_keyword(Keyword::ON));
        });
        greenplum().run_parser_method("(a)", |parser| {
            assert!(matches!(
                parse_location(parser),
                Err(ParserError::MissingToken { clause, .. }) if clause == "LOCATION"
            ));
        });
    }

    #[test]
    fn test_parse_format_options() {
        greenplum().run_parser_method(
            "'TEXT' (delimiter AS '|' NULL '' , escape = 'OFF' HEADER fill missing fields)",
            |parser| {
                let TableProperty::Format(format) = parse_format(parser).unwrap() else {
                    panic!("expected FORMAT");
                };
                assert_eq!(format.name, "TEXT");
                assert_eq!(
                    format.options,
                    Some(vec![
                        FormatOption::string("DELIMITER", "|"),
                        FormatOption::string("NULL", ""),
                        FormatOption::string("ESCAPE", "OFF"),
                        FormatOption::flag("HEADER"),
                        FormatOption::flag("FILL MISSING FIELDS"),
                    ])
                );
            },
        );
    }

    #[test]
    fn test_parse_format_generic_option_and_repeat() {
        greenplum().run_parser_method(
            "'CUSTOM' (formatter = 'a', my_opt = 'x', FORMATTER 'b')",
            |parser| {
                let TableProperty::Format(format) = parse_format(parser).unwrap() else {
                    panic!("expected FORMAT");
                };
                assert_eq!(
                    format.option("formatter"),
                    Some(&FormatOptionValue::String("b".to_string()))
                );
                assert_eq!(
                    format.to_string(),
                    "FORMAT 'CUSTOM' (FORMATTER='b', my_opt='x')"
                );
            },
        );
    }

    #[test]
    fn test_parse_format_errors() {
        let missing_value = |sql: &str, key: &str| {
            greenplum().run_parser_method(sql, |parser| {
                assert_eq!(
                    parse_format(parser),
                    Err(ParserError::MissingValue {
                        clause: "FORMAT".to_string(),
                        key: key.to_string(),
                    })
                );
            });
        };
        missing_value("CSV", "FORMAT");
        missing_value("''", "FORMAT");
        missing_value("'CSV' (DELIMITER)", "DELIMITER");
        missing_value("'CSV' (QUOTE AS 1)", "QUOTE");
        missing_value("'CSV' (foo = bar)", "foo");

        greenplum().run_parser_method("'CSV' (foo 'x')", |parser| {
            assert!(matches!(
                parse_format(parser),
                Err(ParserError::MissingToken { expected, .. }) if expected == "'='"
            ));
        });
        greenplum().run_parser_method("'CSV' (HEADER,)", |parser| {
            assert!(matches!(
                parse_format(parser),
                Err(ParserError::MissingToken { clause, .. }) if clause == "FORMAT"
            ));
        });
        greenplum().run_parser_method("'CSV' (HEADER", |parser| {
            assert!(parse_format(parser).is_err());
        });
    }

    #[test]
    fn test_empty_format_options_are_none() {
        greenplum().run_parser_method("'CSV' ()", |parser| {
            assert_eq!(
                parse_format(parser).unwrap(),
                TableProperty::Format(FormatProperty::new("CSV"))
            );
        });
    }

    #[test]
    fn test_parse_encoding() {
        greenplum().run_parser_method("'UTF8'", |parser| {
            assert_eq!(
                parse_encoding(parser).unwrap(),
                TableProperty::Encoding("UTF8".to_string())
            );
        });
        greenplum().run_parser_method("UTF8", |parser| {
            assert_eq!(
                parse_encoding(parser),
                Err(ParserError::MissingValue {
                    clause: "ENCODING".to_string(),
                    key: "ENCODING".to_string(),
                })
            );
        });
    }

    #[test]
    fn test_scan_external_prefix_backtracks() {
        greenplum().run_parser_method("READABLE TABLE t", |parser| {
            scan_external_prefix(parser);
            assert_eq!(parser.session(), &ParseSession::default());
            assert!(parser.parse_keyword(Keyword::READABLE));
        });
        greenplum().run_parser_method("WRITABLE EXTERNAL TABLE t", |parser| {
            scan_external_prefix(parser);
            assert_eq!(
                parser.session(),
                &ParseSession {
                    is_external: true,
                    external_readable: false,
                    external_writable: true,
                }
            );
            assert!(parser.parse_keyword(Keyword::TABLE));
        });
    }
}
