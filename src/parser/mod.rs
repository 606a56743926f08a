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

//! SQL Parser

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::fmt;

use log::debug;

use IsOptional::*;

use crate::ast::*;
use crate::dialect::*;
use crate::keywords::Keyword;
use crate::tokenizer::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    TokenizerError(String),
    ParserError(String),
    RecursionLimitExceeded,
    /// An expected delimiter or keyword of a clause is absent, e.g. the
    /// `(` after `LOCATION`
    MissingToken {
        clause: String,
        expected: String,
        found: String,
    },
    /// A clause list that needs at least one element is empty, e.g. `LOCATION ()`
    EmptyList { clause: String },
    /// A clause or option needs a string literal that is absent
    MissingValue { clause: String, key: String },
}

// Use `Parser::expected` instead, if possible
macro_rules! parser_err {
    ($MSG:expr) => {
        Err(ParserError::ParserError($MSG.to_string()))
    };
}

#[cfg(feature = "std")]
/// Implemenation [`RecursionCounter`] if std is available
mod recursion {
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::rc::Rc;

    use super::ParserError;

    /// Tracks remaining recursion depth. This value is decremented on
    /// each call to `try_decrease()`, when it reaches 0 an error will
    /// be returned.
    ///
    /// Note: Uses an Rc and AtomicUsize in order to satisfy the Rust
    /// borrow checker so the automatic DepthGuard decrement a
    /// reference to the counter. The actual value is not modified
    /// concurrently
    pub(crate) struct RecursionCounter {
        remaining_depth: Rc<AtomicUsize>,
    }

    impl RecursionCounter {
        /// Creates a [`RecursionCounter`] with the specified maximum
        /// depth
        pub fn new(remaining_depth: usize) -> Self {
            Self {
                remaining_depth: Rc::new(remaining_depth.into()),
            }
        }

        /// Decreases the remaining depth by 1.
        ///
        /// Returns `Err` if the remaining depth falls to 0.
        ///
        /// Returns a [`DepthGuard`] which will adds 1 to the
        /// remaining depth upon drop;
        pub fn try_decrease(&self) -> Result<DepthGuard, ParserError> {
            let old_value = self.remaining_depth.fetch_sub(1, Ordering::SeqCst);
            // ran out of space
            if old_value == 0 {
                self.remaining_depth.fetch_add(1, Ordering::SeqCst);
                Err(ParserError::RecursionLimitExceeded)
            } else {
                Ok(DepthGuard::new(Rc::clone(&self.remaining_depth)))
            }
        }
    }

    /// Guard that increass the remaining depth by 1 on drop
    pub struct DepthGuard {
        remaining_depth: Rc<AtomicUsize>,
    }

    impl DepthGuard {
        fn new(remaining_depth: Rc<AtomicUsize>) -> Self {
            Self { remaining_depth }
        }
    }
    impl Drop for DepthGuard {
        fn drop(&mut self) {
            self.remaining_depth.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(not(feature = "std"))]
mod recursion {
    /// Implemenation [`RecursionCounter`] if std is NOT available (and does not
    /// guard against stack overflow).
    ///
    /// Has the same API as the std RecursionCounter implementation
    /// but does not actually limit stack depth.
    pub(crate) struct RecursionCounter {}

    impl RecursionCounter {
        pub fn new(_remaining_depth: usize) -> Self {
            Self {}
        }
        pub fn try_decrease(&self) -> Result<DepthGuard, super::ParserError> {
            Ok(DepthGuard {})
        }
    }

    pub struct DepthGuard {}
}

use recursion::RecursionCounter;

#[derive(PartialEq, Eq)]
pub enum IsOptional {
    Optional,
    Mandatory,
}

impl From<TokenizerError> for ParserError {
    fn from(e: TokenizerError) -> Self {
        ParserError::TokenizerError(e.to_string())
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sql parser error: ")?;
        match self {
            ParserError::TokenizerError(s) => f.write_str(s),
            ParserError::ParserError(s) => f.write_str(s),
            ParserError::RecursionLimitExceeded => f.write_str("recursion limit exceeded"),
            ParserError::MissingToken {
                clause,
                expected,
                found,
            } => write!(f, "Expected {expected} in {clause}, found: {found}"),
            ParserError::EmptyList { clause } => {
                write!(f, "Expected at least one element in {clause} list")
            }
            ParserError::MissingValue { clause, key } => {
                write!(f, "Expected a string literal for {key} in {clause}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParserError {}

// By default, allow expressions up to this deep before erroring
const DEFAULT_REMAINING_DEPTH: usize = 50;

/// Options that control how the [`Parser`] parses SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Accept a trailing comma at the end of a column list, e.g.
    /// `CREATE TABLE t (a INT, b INT,)`
    pub trailing_commas: bool,
    /// Controls how literal values are unescaped. See
    /// [`Tokenizer::with_unescape`] for more details.
    pub unescape: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            trailing_commas: false,
            unescape: true,
        }
    }
}

impl ParserOptions {
    /// Create a new [`ParserOptions`]
    pub fn new() -> Self {
        Default::default()
    }

    /// Set if trailing commas are allowed.
    ///
    /// If this option is `false` (the default), the following SQL will
    /// not parse. If the option is `true`, the SQL will parse.
    ///
    /// ```sql
    ///  CREATE TABLE t (
    ///    id INT,
    ///  )
    /// ```
    pub fn with_trailing_commas(mut self, trailing_commas: bool) -> Self {
        self.trailing_commas = trailing_commas;
        self
    }

    /// Set if literal values are unescaped. Defaults to true. See
    /// [`Tokenizer::with_unescape`] for more details.
    pub fn with_unescape(mut self, unescape: bool) -> Self {
        self.unescape = unescape;
        self
    }
}

/// State that lives for exactly one statement parse: the
/// `[READABLE | WRITABLE] EXTERNAL` prefix of `CREATE`.
///
/// It is reset whenever [`Parser::parse_statement`] starts and is taken
/// by whoever consumes it (see [`Parser::take_session`]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSession {
    pub is_external: bool,
    pub external_readable: bool,
    pub external_writable: bool,
}

/// A position in the token stream together with the comments buffered up
/// to that position. Restoring a checkpoint restores both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    index: usize,
    comments: Vec<BufferedComment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BufferedComment {
    /// Index of the whitespace token the comment came from
    index: usize,
    text: String,
}

pub struct Parser<'a> {
    tokens: Vec<TokenWithLocation>,
    /// The index of the first unprocessed token in `self.tokens`
    index: usize,
    /// The current dialect to use
    dialect: &'a dyn Dialect,
    /// Additional options that allow you to mix & match behavior
    /// otherwise constrained to certain dialects (e.g. trailing
    /// commas) and/or format of parse (e.g. unescaping)
    options: ParserOptions,
    /// ensure the stack does not overflow by limiting recusion depth
    recursion_counter: RecursionCounter,
    /// external table prefix of the statement being parsed
    session: ParseSession,
    /// comments skipped by `next_token` since the last `take_comments`
    comments: Vec<BufferedComment>,
}

impl<'a> Parser<'a> {
    /// Create a parser for a [`Dialect`]
    ///
    /// See also [`Parser::parse_sql`]
    ///
    /// Example:
    /// ```
    /// # use sqlparser_greenplum::{parser::{Parser, ParserError}, dialect::GreenplumDialect};
    /// # fn main() -> Result<(), ParserError> {
    /// let dialect = GreenplumDialect{};
    /// let statements = Parser::new(&dialect)
    ///   .try_with_sql("CREATE TABLE foo (id INT) DISTRIBUTED BY (id)")?
    ///   .parse_statements()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            tokens: vec![],
            index: 0,
            dialect,
            options: ParserOptions::default(),
            recursion_counter: RecursionCounter::new(DEFAULT_REMAINING_DEPTH),
            session: ParseSession::default(),
            comments: vec![],
        }
    }

    /// Specify the maximum recursion limit while parsing.
    ///
    /// [`Parser`] prevents stack overflows by returning
    /// [`ParserError::RecursionLimitExceeded`] if the parser exceeds
    /// this depth while processing the query.
    ///
    /// Example:
    /// ```
    /// # use sqlparser_greenplum::{parser::{Parser, ParserError}, dialect::GenericDialect};
    /// # fn main() -> Result<(), ParserError> {
    /// let dialect = GenericDialect{};
    /// let result = Parser::new(&dialect)
    ///   .with_recursion_limit(0)
    ///   .try_with_sql("CREATE TABLE foo (id INT)")?
    ///   .parse_statements();
    ///   assert_eq!(result, Err(ParserError::RecursionLimitExceeded));
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_counter = RecursionCounter::new(recursion_limit);
        self
    }

    /// Specify additional parser options
    ///
    /// [`Parser`] supports additional options ([`ParserOptions`])
    /// that allow you to mix & match behavior otherwise constrained
    /// to certain dialects (e.g. trailing commas).
    ///
    /// Example:
    /// ```
    /// # use sqlparser_greenplum::{parser::{Parser, ParserError, ParserOptions}, dialect::GreenplumDialect};
    /// # fn main() -> Result<(), ParserError> {
    /// let dialect = GreenplumDialect{};
    /// let options = ParserOptions::new()
    ///    .with_trailing_commas(true)
    ///    .with_unescape(false);
    /// let result = Parser::new(&dialect)
    ///   .with_options(options)
    ///   .try_with_sql("CREATE TABLE foo (a INT, b INT,)")?
    ///   .parse_statements();
    ///   assert!(matches!(result, Ok(_)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Reset this parser to parse the specified token stream
    pub fn with_tokens_with_locations(mut self, tokens: Vec<TokenWithLocation>) -> Self {
        self.tokens = tokens;
        self.index = 0;
        self.comments.clear();
        self
    }

    /// Reset this parser state to parse the specified tokens
    pub fn with_tokens(self, tokens: Vec<Token>) -> Self {
        // Put in dummy locations
        let tokens_with_locations: Vec<TokenWithLocation> = tokens
            .into_iter()
            .map(|token| TokenWithLocation {
                token,
                location: Location { line: 0, column: 0 },
            })
            .collect();
        self.with_tokens_with_locations(tokens_with_locations)
    }

    /// Tokenize the sql string and sets this [`Parser`]'s state to
    /// parse the resulting tokens
    ///
    /// Returns an error if there was an error tokenizing the SQL string.
    ///
    /// See example on [`Parser::new()`] for an example
    pub fn try_with_sql(self, sql: &str) -> Result<Self, ParserError> {
        debug!("Parsing sql '{}'...", sql);
        let tokens = Tokenizer::new(self.dialect, sql)
            .with_unescape(self.options.unescape)
            .tokenize_with_location()?;
        Ok(self.with_tokens_with_locations(tokens))
    }

    /// Parse potentially multiple statements
    ///
    /// Example
    /// ```
    /// # use sqlparser_greenplum::{parser::{Parser, ParserError}, dialect::GreenplumDialect};
    /// # fn main() -> Result<(), ParserError> {
    /// let dialect = GreenplumDialect{};
    /// let statements = Parser::new(&dialect)
    ///   // Parse a SQL string with 2 separate statements
    ///   .try_with_sql("CREATE TABLE foo (a INT); CREATE TABLE bar (b INT);")?
    ///   .parse_statements()?;
    /// assert_eq!(statements.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParserError> {
        let mut stmts = Vec::new();
        let mut expecting_statement_delimiter = false;
        loop {
            // ignore empty statements (between successive statement delimiters)
            while self.consume_token(&Token::SemiColon) {
                expecting_statement_delimiter = false;
            }

            if self.peek_token() == Token::EOF {
                break;
            }
            if expecting_statement_delimiter {
                return self.expected("end of statement", self.peek_token());
            }

            let statement = self.parse_statement()?;
            stmts.push(statement);
            expecting_statement_delimiter = true;
        }
        Ok(stmts)
    }

    /// Convenience method to parse a string with one or more SQL
    /// statements into produce an Abstract Syntax Tree (AST).
    ///
    /// Example
    /// ```
    /// # use sqlparser_greenplum::{parser::{Parser, ParserError}, dialect::GreenplumDialect};
    /// # fn main() -> Result<(), ParserError> {
    /// let dialect = GreenplumDialect{};
    /// let statements = Parser::parse_sql(
    ///   &dialect, "CREATE TABLE foo (id INT) DISTRIBUTED RANDOMLY"
    /// )?;
    /// assert_eq!(statements.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_sql(dialect: &dyn Dialect, sql: &str) -> Result<Vec<Statement>, ParserError> {
        Parser::new(dialect).try_with_sql(sql)?.parse_statements()
    }

    /// Parse a single top-level statement (such as CREATE TABLE),
    /// stopping before the statement separator, if any.
    pub fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let _guard = self.recursion_counter.try_decrease()?;

        // nothing may survive from the previous statement
        self.session = ParseSession::default();
        self.comments.clear();

        // allow the dialect to override statement parsing
        if let Some(statement) = self.dialect.parse_statement(self) {
            return statement;
        }

        let next_token = self.next_token();
        match &next_token.token {
            Token::Word(w) => match w.keyword {
                Keyword::CREATE => self.parse_create(),
                _ => self.expected("an SQL statement", next_token),
            },
            _ => self.expected("an SQL statement", next_token),
        }
    }

    /// The external table prefix recorded for the current statement
    pub fn session(&self) -> &ParseSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ParseSession {
        &mut self.session
    }

    /// Take the session state, leaving a cleared one behind
    pub fn take_session(&mut self) -> ParseSession {
        core::mem::take(&mut self.session)
    }

    /// Remember the current position so that a speculative parse can be undone
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.index,
            comments: self.comments.clone(),
        }
    }

    /// Go back to `checkpoint`, including the comment buffer
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.index;
        self.comments = checkpoint.comments;
    }

    /// Drain the comments skipped since the last call
    pub fn take_comments(&mut self) -> Vec<String> {
        self.comments.drain(..).map(|c| c.text).collect()
    }

    /// Parse a SQL CREATE statement, after the `CREATE` keyword
    pub fn parse_create(&mut self) -> Result<Statement, ParserError> {
        let temporary = self
            .parse_one_of_keywords(&[Keyword::TEMP, Keyword::TEMPORARY])
            .is_some();
        if self.parse_keyword(Keyword::TABLE) {
            self.parse_create_table(temporary)
        } else {
            self.expected("TABLE after CREATE", self.peek_token())
        }
    }

    pub fn parse_create_table(&mut self, temporary: bool) -> Result<Statement, ParserError> {
        let if_not_exists = self.parse_keywords(&[Keyword::IF, Keyword::NOT, Keyword::EXISTS]);
        let name = self.parse_object_name()?;
        let comments = self.take_comments();

        let (columns, constraints) = self.parse_columns()?;

        // dialect clauses after the schema, in source order
        let mut properties = vec![];
        while let Some(property) = self.dialect.parse_table_property(self) {
            properties.push(property?);
        }

        Ok(Statement::CreateTable(CreateTable {
            temporary,
            if_not_exists,
            name,
            columns,
            constraints,
            properties,
            comments,
        }))
    }

    pub fn parse_columns(&mut self) -> Result<(Vec<ColumnDef>, Vec<TableConstraint>), ParserError> {
        let mut columns = vec![];
        let mut constraints = vec![];
        self.expect_token(&Token::LParen)?;
        if self.consume_token(&Token::RParen) {
            return Ok((columns, constraints));
        }

        loop {
            if let Some(constraint) = self.parse_optional_table_constraint()? {
                constraints.push(constraint);
            } else if let Token::Word(_) = self.peek_token().token {
                columns.push(self.parse_column_def()?);
            } else {
                return self.expected("column name or constraint definition", self.peek_token());
            }
            let comma = self.consume_token(&Token::Comma);
            if self.peek_token() == Token::RParen
                && (!comma || self.options.trailing_commas || dialect_of!(self is GenericDialect))
            {
                self.next_token();
                break;
            } else if !comma {
                return self.expected("',' or ')' after column definition", self.peek_token());
            }
        }

        Ok((columns, constraints))
    }

    pub fn parse_column_def(&mut self) -> Result<ColumnDef, ParserError> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut options = vec![];
        loop {
            if self.parse_keyword(Keyword::CONSTRAINT) {
                let name = Some(self.parse_identifier()?);
                if let Some(option) = self.parse_optional_column_option()? {
                    options.push(ColumnOptionDef { name, option });
                } else {
                    return self.expected(
                        "constraint details after CONSTRAINT <name>",
                        self.peek_token(),
                    );
                }
            } else if let Some(option) = self.parse_optional_column_option()? {
                options.push(ColumnOptionDef { name: None, option });
            } else {
                break;
            };
        }
        Ok(ColumnDef {
            name,
            data_type,
            options,
        })
    }

    pub fn parse_optional_column_option(&mut self) -> Result<Option<ColumnOption>, ParserError> {
        if self.parse_keywords(&[Keyword::NOT, Keyword::NULL]) {
            Ok(Some(ColumnOption::NotNull))
        } else if self.parse_keyword(Keyword::NULL) {
            Ok(Some(ColumnOption::Null))
        } else if self.parse_keyword(Keyword::DEFAULT) {
            Ok(Some(ColumnOption::Default(self.parse_value()?)))
        } else if self.parse_keywords(&[Keyword::PRIMARY, Keyword::KEY]) {
            Ok(Some(ColumnOption::Unique { is_primary: true }))
        } else if self.parse_keyword(Keyword::UNIQUE) {
            Ok(Some(ColumnOption::Unique { is_primary: false }))
        } else if self.parse_keyword(Keyword::REFERENCES) {
            let foreign_table = self.parse_object_name()?;
            // PostgreSQL allows omitting the column list and
            // uses the primary key column of the foreign table by default
            let referred_columns = self.parse_parenthesized_column_list(Optional)?;
            let (on_delete, on_update) = self.parse_referential_actions()?;
            Ok(Some(ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                on_delete,
                on_update,
            }))
        } else {
            Ok(None)
        }
    }

    fn parse_referential_actions(
        &mut self,
    ) -> Result<(Option<ReferentialAction>, Option<ReferentialAction>), ParserError> {
        let mut on_delete = None;
        let mut on_update = None;
        loop {
            if on_delete.is_none() && self.parse_keywords(&[Keyword::ON, Keyword::DELETE]) {
                on_delete = Some(self.parse_referential_action()?);
            } else if on_update.is_none() && self.parse_keywords(&[Keyword::ON, Keyword::UPDATE])
            {
                on_update = Some(self.parse_referential_action()?);
            } else {
                break;
            }
        }
        Ok((on_delete, on_update))
    }

    pub fn parse_referential_action(&mut self) -> Result<ReferentialAction, ParserError> {
        if self.parse_keyword(Keyword::RESTRICT) {
            Ok(ReferentialAction::Restrict)
        } else if self.parse_keyword(Keyword::CASCADE) {
            Ok(ReferentialAction::Cascade)
        } else if self.parse_keywords(&[Keyword::SET, Keyword::NULL]) {
            Ok(ReferentialAction::SetNull)
        } else if self.parse_keywords(&[Keyword::NO, Keyword::ACTION]) {
            Ok(ReferentialAction::NoAction)
        } else if self.parse_keywords(&[Keyword::SET, Keyword::DEFAULT]) {
            Ok(ReferentialAction::SetDefault)
        } else {
            self.expected(
                "one of RESTRICT, CASCADE, SET NULL, NO ACTION or SET DEFAULT",
                self.peek_token(),
            )
        }
    }

    pub fn parse_optional_table_constraint(
        &mut self,
    ) -> Result<Option<TableConstraint>, ParserError> {
        let name = if self.parse_keyword(Keyword::CONSTRAINT) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let next_token = self.next_token();
        match next_token.token {
            Token::Word(w) if w.keyword == Keyword::PRIMARY || w.keyword == Keyword::UNIQUE => {
                let is_primary = w.keyword == Keyword::PRIMARY;
                if is_primary {
                    self.expect_keyword(Keyword::KEY)?;
                }
                let columns = self.parse_parenthesized_column_list(Mandatory)?;
                Ok(Some(TableConstraint::Unique {
                    name,
                    columns,
                    is_primary,
                }))
            }
            Token::Word(w) if w.keyword == Keyword::FOREIGN => {
                self.expect_keyword(Keyword::KEY)?;
                let columns = self.parse_parenthesized_column_list(Mandatory)?;
                self.expect_keyword(Keyword::REFERENCES)?;
                let foreign_table = self.parse_object_name()?;
                let referred_columns = self.parse_parenthesized_column_list(Mandatory)?;
                let (on_delete, on_update) = self.parse_referential_actions()?;
                Ok(Some(TableConstraint::ForeignKey {
                    name,
                    columns,
                    foreign_table,
                    referred_columns,
                    on_delete,
                    on_update,
                }))
            }
            _ => {
                if name.is_some() {
                    self.expected("PRIMARY, UNIQUE or FOREIGN", next_token)
                } else {
                    self.prev_token();
                    Ok(None)
                }
            }
        }
    }

    /// Parse a parenthesized comma-separated list of unqualified, possibly quoted identifiers
    pub fn parse_parenthesized_column_list(
        &mut self,
        optional: IsOptional,
    ) -> Result<Vec<Ident>, ParserError> {
        if self.consume_token(&Token::LParen) {
            let cols = self.parse_comma_separated(Parser::parse_identifier)?;
            self.expect_token(&Token::RParen)?;
            Ok(cols)
        } else if optional == Optional {
            Ok(vec![])
        } else {
            self.expected("a list of columns in parentheses", self.peek_token())
        }
    }

    /// Parse a SQL datatype (in the context of a CREATE TABLE statement for example)
    pub fn parse_data_type(&mut self) -> Result<DataType, ParserError> {
        let next_token = self.next_token();
        match next_token.token {
            Token::Word(w) => match w.keyword {
                Keyword::BOOLEAN => Ok(DataType::Boolean),
                Keyword::BOOL => Ok(DataType::Bool),
                Keyword::SMALLINT => Ok(DataType::SmallInt),
                Keyword::INT => Ok(DataType::Int),
                Keyword::INTEGER => Ok(DataType::Integer),
                Keyword::BIGINT => Ok(DataType::BigInt),
                Keyword::TEXT => Ok(DataType::Text),
                Keyword::DATE => Ok(DataType::Date),
                Keyword::TIMESTAMP => Ok(DataType::Timestamp),
                Keyword::VARCHAR => Ok(DataType::Varchar(self.parse_optional_precision()?)),
                Keyword::CHAR => Ok(DataType::Char(self.parse_optional_precision()?)),
                Keyword::CHARACTER => {
                    if self.parse_keyword(Keyword::VARYING) {
                        Ok(DataType::CharacterVarying(
                            self.parse_optional_precision()?,
                        ))
                    } else {
                        Ok(DataType::Character(self.parse_optional_precision()?))
                    }
                }
                Keyword::NUMERIC => Ok(DataType::Numeric(
                    self.parse_exact_number_optional_precision_scale()?,
                )),
                Keyword::DECIMAL => Ok(DataType::Decimal(
                    self.parse_exact_number_optional_precision_scale()?,
                )),
                _ => {
                    self.prev_token();
                    let type_name = self.parse_object_name()?;
                    let modifiers = self.parse_optional_type_modifiers()?;
                    Ok(DataType::Custom(type_name, modifiers))
                }
            },
            _ => self.expected("a data type name", next_token),
        }
    }

    pub fn parse_optional_precision(&mut self) -> Result<Option<u64>, ParserError> {
        if self.consume_token(&Token::LParen) {
            let n = self.parse_literal_uint()?;
            self.expect_token(&Token::RParen)?;
            Ok(Some(n))
        } else {
            Ok(None)
        }
    }

    pub fn parse_exact_number_optional_precision_scale(
        &mut self,
    ) -> Result<ExactNumberInfo, ParserError> {
        if self.consume_token(&Token::LParen) {
            let precision = self.parse_literal_uint()?;
            let scale = if self.consume_token(&Token::Comma) {
                Some(self.parse_literal_uint()?)
            } else {
                None
            };

            self.expect_token(&Token::RParen)?;

            match scale {
                None => Ok(ExactNumberInfo::Precision(precision)),
                Some(scale) => Ok(ExactNumberInfo::PrecisionAndScale(precision, scale)),
            }
        } else {
            Ok(ExactNumberInfo::None)
        }
    }

    pub fn parse_optional_type_modifiers(&mut self) -> Result<Vec<String>, ParserError> {
        let mut modifiers = vec![];
        if self.consume_token(&Token::LParen) {
            loop {
                let next_token = self.next_token();
                match next_token.token {
                    Token::Word(w) => modifiers.push(w.to_string()),
                    Token::Number(n) => modifiers.push(n),
                    Token::SingleQuotedString(s) => modifiers.push(s),
                    Token::Comma => {
                        continue;
                    }
                    Token::RParen => {
                        break;
                    }
                    _ => self.expected("type modifiers", next_token)?,
                }
            }
        }
        Ok(modifiers)
    }

    /// Parse a literal value (numbers, strings, TRUE/FALSE, NULL)
    pub fn parse_value(&mut self) -> Result<Value, ParserError> {
        let next_token = self.next_token();
        match &next_token.token {
            Token::Word(w) => match w.keyword {
                Keyword::TRUE => Ok(Value::Boolean(true)),
                Keyword::FALSE => Ok(Value::Boolean(false)),
                Keyword::NULL => Ok(Value::Null),
                _ => self.expected("a concrete value", next_token),
            },
            Token::Number(n) => self.parse_number_value(n.clone()),
            Token::Minus => match self.next_token().token {
                Token::Number(n) => self.parse_number_value(format!("-{n}")),
                _ => self.expected("a number after '-'", self.peek_token()),
            },
            Token::SingleQuotedString(s) => Ok(Value::SingleQuotedString(s.clone())),
            _ => self.expected("a value", next_token),
        }
    }

    #[cfg(not(feature = "bigdecimal"))]
    fn parse_number_value(&self, n: String) -> Result<Value, ParserError> {
        Ok(Value::Number(n))
    }

    #[cfg(feature = "bigdecimal")]
    fn parse_number_value(&self, n: String) -> Result<Value, ParserError> {
        n.parse()
            .map(Value::Number)
            .map_err(|e| ParserError::ParserError(format!("Could not parse '{n}' as number: {e}")))
    }

    /// Parse an unsigned literal integer/long
    pub fn parse_literal_uint(&mut self) -> Result<u64, ParserError> {
        let next_token = self.next_token();
        match next_token.token {
            Token::Number(s) => s.parse::<u64>().map_err(|e| {
                ParserError::ParserError(format!("Could not parse '{s}' as u64: {e}"))
            }),
            _ => self.expected("literal int", next_token),
        }
    }

    /// Parse a literal string
    pub fn parse_literal_string(&mut self) -> Result<String, ParserError> {
        let next_token = self.next_token();
        match next_token.token {
            Token::SingleQuotedString(s) => Ok(s),
            _ => self.expected("literal string", next_token),
        }
    }

    /// Parse a possibly qualified, possibly quoted identifier, e.g.
    /// `foo` or `myschema."table"
    pub fn parse_object_name(&mut self) -> Result<ObjectName, ParserError> {
        let mut idents = vec![];
        loop {
            idents.push(self.parse_identifier()?);
            if !self.consume_token(&Token::Period) {
                break;
            }
        }
        Ok(ObjectName(idents))
    }

    /// Parse a simple one-word identifier (possibly quoted, possibly a keyword)
    pub fn parse_identifier(&mut self) -> Result<Ident, ParserError> {
        let next_token = self.next_token();
        match next_token.token {
            Token::Word(w) => Ok(w.to_ident()),
            _ => self.expected("identifier", next_token),
        }
    }

    /// Return the first non-whitespace token that has not yet been processed
    /// (or None if reached end-of-file)
    pub fn peek_token(&self) -> TokenWithLocation {
        self.peek_nth_token(0)
    }

    /// Return nth non-whitespace token that has not yet been processed
    pub fn peek_nth_token(&self, mut n: usize) -> TokenWithLocation {
        let mut index = self.index;
        loop {
            index += 1;
            match self.tokens.get(index - 1) {
                Some(TokenWithLocation {
                    token: Token::Whitespace(_),
                    location: _,
                }) => continue,
                non_whitespace => {
                    if n == 0 {
                        return non_whitespace.cloned().unwrap_or(TokenWithLocation {
                            token: Token::EOF,
                            location: Location { line: 0, column: 0 },
                        });
                    }
                    n -= 1;
                }
            }
        }
    }

    /// Return true if the next non-whitespace token is `expected`
    pub fn peek_token_is(&self, expected: &Token) -> bool {
        &self.peek_token().token == expected
    }

    /// Return the first non-whitespace token that has not yet been processed
    /// (or None if reached end-of-file) and mark it as processed. OK to call
    /// repeatedly after reaching EOF.
    ///
    /// Comments skipped on the way are buffered, see [`Parser::take_comments`].
    pub fn next_token(&mut self) -> TokenWithLocation {
        loop {
            self.index += 1;
            match self.tokens.get(self.index - 1) {
                Some(TokenWithLocation {
                    token: Token::Whitespace(ws),
                    location: _,
                }) => {
                    if let Some(text) = ws.comment_text() {
                        self.comments.push(BufferedComment {
                            index: self.index - 1,
                            text: text.to_string(),
                        });
                    }
                    continue;
                }
                token => {
                    return token
                        .cloned()
                        .unwrap_or_else(|| TokenWithLocation::wrap(Token::EOF))
                }
            }
        }
    }

    /// Push back the last one non-whitespace token. Must be called after
    /// `next_token()`, otherwise might panic. OK to call after
    /// `next_token()` indicates an EOF.
    pub fn prev_token(&mut self) {
        loop {
            assert!(self.index > 0);
            self.index -= 1;
            let is_whitespace = matches!(
                self.tokens.get(self.index),
                Some(TokenWithLocation {
                    token: Token::Whitespace(_),
                    location: _,
                })
            );
            if is_whitespace {
                self.forget_comments_from(self.index);
                continue;
            }
            return;
        }
    }

    /// Drop buffered comments that were read at or after token `index`
    fn forget_comments_from(&mut self, index: usize) {
        while matches!(self.comments.last(), Some(c) if c.index >= index) {
            self.comments.pop();
        }
    }

    /// Report unexpected token
    pub fn expected<T>(&self, expected: &str, found: TokenWithLocation) -> Result<T, ParserError> {
        parser_err!(format!(
            "Expected {}, found: {}{}",
            expected, found, found.location
        ))
    }

    /// Look for an expected keyword and consume it if it exists
    #[must_use]
    pub fn parse_keyword(&mut self, expected: Keyword) -> bool {
        match self.peek_token().token {
            Token::Word(w) if expected == w.keyword => {
                self.next_token();
                true
            }
            _ => false,
        }
    }

    /// Look for an expected sequence of keywords and consume them if they exist
    #[must_use]
    pub fn parse_keywords(&mut self, keywords: &[Keyword]) -> bool {
        let checkpoint = self.checkpoint();
        for &keyword in keywords {
            if !self.parse_keyword(keyword) {
                // reset index and return immediately
                self.restore(checkpoint);
                return false;
            }
        }
        true
    }

    /// Look for one of the given keywords and return the one that matches.
    #[must_use]
    pub fn parse_one_of_keywords(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        match self.peek_token().token {
            Token::Word(w) => keywords
                .iter()
                .find(|keyword| **keyword == w.keyword)
                .map(|keyword| {
                    self.next_token();
                    *keyword
                }),
            _ => None,
        }
    }

    /// Bail out if the current token is not an expected keyword, or consume it if it is
    pub fn expect_keyword(&mut self, expected: Keyword) -> Result<(), ParserError> {
        if self.parse_keyword(expected) {
            Ok(())
        } else {
            self.expected(format!("{:?}", &expected).as_str(), self.peek_token())
        }
    }

    /// Consume the next token if it matches the expected token, otherwise return false
    #[must_use]
    pub fn consume_token(&mut self, expected: &Token) -> bool {
        if self.peek_token() == *expected {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Bail out if the current token is not an expected token, or consume it if it is
    pub fn expect_token(&mut self, expected: &Token) -> Result<(), ParserError> {
        if self.consume_token(expected) {
            Ok(())
        } else {
            self.expected(&expected.to_string(), self.peek_token())
        }
    }

    /// Parse a comma-separated list of 1+ items accepted by `F`
    pub fn parse_comma_separated<T, F>(&mut self, mut f: F) -> Result<Vec<T>, ParserError>
    where
        F: FnMut(&mut Parser<'a>) -> Result<T, ParserError>,
    {
        let mut values = vec![];
        loop {
            values.push(f(self)?);
            if !self.consume_token(&Token::Comma) {
                break;
            } else if self.options.trailing_commas && self.peek_token_is(&Token::RParen) {
                break;
            }
        }
        Ok(values)
    }
}

impl Word {
    pub fn to_ident(&self) -> Ident {
        Ident {
            value: self.value.clone(),
            quote_style: self.quote_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{all_dialects, TestedDialects};

    #[test]
    fn test_prev_index() {
        let sql = "CREATE TABLE version";
        all_dialects().run_parser_method(sql, |parser| {
            assert_eq!(parser.peek_token(), Token::make_keyword("CREATE"));
            assert_eq!(parser.next_token(), Token::make_keyword("CREATE"));
            parser.prev_token();
            assert_eq!(parser.next_token(), Token::make_keyword("CREATE"));
            assert_eq!(parser.next_token(), Token::make_keyword("TABLE"));
            assert_eq!(parser.next_token(), Token::make_word("version", None));
            parser.prev_token();
            assert_eq!(parser.peek_token(), Token::make_word("version", None));
            assert_eq!(parser.next_token(), Token::make_word("version", None));
            assert_eq!(parser.peek_token(), Token::EOF);
            parser.prev_token();
            assert_eq!(parser.next_token(), Token::make_word("version", None));
            assert_eq!(parser.next_token(), Token::EOF);
            assert_eq!(parser.next_token(), Token::EOF);
            parser.prev_token();
        });
    }

    #[test]
    fn test_parse_data_type() {
        macro_rules! test_parse_data_type {
            ($dialect:expr, $input:expr, $expected_type:expr $(,)?) => {{
                $dialect.run_parser_method(&*$input, |parser| {
                    let data_type = parser.parse_data_type().unwrap();
                    assert_eq!($expected_type, data_type);
                    assert_eq!($input.to_string(), data_type.to_string());
                });
            }};
        }

        let dialect = all_dialects();

        test_parse_data_type!(dialect, "INT", DataType::Int);
        test_parse_data_type!(dialect, "BIGINT", DataType::BigInt);
        test_parse_data_type!(dialect, "TEXT", DataType::Text);
        test_parse_data_type!(dialect, "VARCHAR(20)", DataType::Varchar(Some(20)));
        test_parse_data_type!(
            dialect,
            "CHARACTER VARYING(8)",
            DataType::CharacterVarying(Some(8))
        );
        test_parse_data_type!(
            dialect,
            "NUMERIC(10,2)",
            DataType::Numeric(ExactNumberInfo::PrecisionAndScale(10, 2))
        );
        test_parse_data_type!(
            dialect,
            "DECIMAL(12)",
            DataType::Decimal(ExactNumberInfo::Precision(12))
        );
        test_parse_data_type!(
            dialect,
            "jsonb",
            DataType::Custom(ObjectName(vec![Ident::new("jsonb")]), vec![])
        );
        test_parse_data_type!(
            dialect,
            "geometry(Point, 4326)",
            DataType::Custom(
                ObjectName(vec![Ident::new("geometry")]),
                vec!["Point".to_string(), "4326".to_string()]
            )
        );
    }

    #[test]
    fn test_parse_table_constraints() {
        macro_rules! test_parse_table_constraint {
            ($dialect:expr, $input:expr, $expected:expr $(,)?) => {{
                $dialect.run_parser_method(&*$input, |parser| {
                    let constraint = parser.parse_optional_table_constraint().unwrap().unwrap();
                    assert_eq!(constraint, $expected);
                    assert_eq!(constraint.to_string(), $input.to_string());
                });
            }};
        }

        let dialect = all_dialects();

        test_parse_table_constraint!(
            dialect,
            "PRIMARY KEY (id)",
            TableConstraint::Unique {
                name: None,
                columns: vec![Ident::new("id")],
                is_primary: true,
            }
        );
        test_parse_table_constraint!(
            dialect,
            "CONSTRAINT uq UNIQUE (a, b)",
            TableConstraint::Unique {
                name: Some(Ident::new("uq")),
                columns: vec![Ident::new("a"), Ident::new("b")],
                is_primary: false,
            }
        );
        test_parse_table_constraint!(
            dialect,
            "FOREIGN KEY (c) REFERENCES t(id) ON DELETE CASCADE",
            TableConstraint::ForeignKey {
                name: None,
                columns: vec![Ident::new("c")],
                foreign_table: ObjectName(vec![Ident::new("t")]),
                referred_columns: vec![Ident::new("id")],
                on_delete: Some(ReferentialAction::Cascade),
                on_update: None,
            }
        );
    }

    #[test]
    fn test_no_table_constraint_leaves_position() {
        all_dialects().run_parser_method("id INT", |parser| {
            assert_eq!(parser.parse_optional_table_constraint(), Ok(None));
            assert_eq!(parser.peek_token(), Token::make_word("id", None));
        });
    }

    #[test]
    fn test_parse_value() {
        all_dialects().run_parser_method("-12 'x' TRUE NULL", |parser| {
            assert_eq!(parser.parse_value().unwrap().to_string(), "-12");
            assert_eq!(
                parser.parse_value().unwrap(),
                Value::SingleQuotedString("x".to_string())
            );
            assert_eq!(parser.parse_value().unwrap(), Value::Boolean(true));
            assert_eq!(parser.parse_value().unwrap(), Value::Null);
        });
    }

    #[test]
    fn test_checkpoint_restores_position_and_comments() {
        all_dialects().run_parser_method("/* a */ x /* b */ y", |parser| {
            assert_eq!(parser.next_token(), Token::make_word("x", None));
            let checkpoint = parser.checkpoint();
            assert_eq!(parser.next_token(), Token::make_word("y", None));
            parser.restore(checkpoint);
            assert_eq!(parser.take_comments(), vec!["a".to_string()]);
            assert_eq!(parser.next_token(), Token::make_word("y", None));
            assert_eq!(parser.take_comments(), vec!["b".to_string()]);
        });
    }

    #[test]
    fn test_failed_keyword_sequence_keeps_comments_consistent() {
        all_dialects().run_parser_method("ON /* c */ x", |parser| {
            assert!(!parser.parse_keywords(&[Keyword::ON, Keyword::ALL]));
            assert!(parser.take_comments().is_empty());
            assert!(parser.parse_keyword(Keyword::ON));
            assert_eq!(parser.next_token(), Token::make_word("x", None));
            assert_eq!(parser.take_comments(), vec!["c".to_string()]);
        });
    }

    #[test]
    fn test_prev_token_does_not_duplicate_comments() {
        all_dialects().run_parser_method("a -- one\nb", |parser| {
            parser.next_token();
            assert_eq!(parser.next_token(), Token::make_word("b", None));
            parser.prev_token();
            assert_eq!(parser.next_token(), Token::make_word("b", None));
            assert_eq!(parser.take_comments(), vec!["one".to_string()]);
        });
    }

    #[test]
    fn test_take_session_clears_state() {
        all_dialects().run_parser_method("", |parser| {
            parser.session_mut().is_external = true;
            parser.session_mut().external_writable = true;
            let session = parser.take_session();
            assert!(session.is_external && session.external_writable);
            assert_eq!(parser.session(), &ParseSession::default());
        });
    }

    #[test]
    fn test_parse_statement_rejects_other_statements() {
        let res = all_dialects().parse_sql_statements("SELECT 1");
        assert_eq!(
            ParserError::ParserError(
                "Expected an SQL statement, found: SELECT at Line: 1, Column 1".to_string()
            ),
            res.unwrap_err()
        );
    }

    #[test]
    fn test_trailing_comma_in_columns() {
        let strict = TestedDialects {
            dialects: vec![Box::new(GreenplumDialect {}), Box::new(PostgreSqlDialect {})],
            options: None,
        };
        assert!(strict
            .parse_sql_statements("CREATE TABLE t (a INT,)")
            .is_err());

        let relaxed = TestedDialects {
            dialects: vec![Box::new(GreenplumDialect {}), Box::new(PostgreSqlDialect {})],
            options: Some(ParserOptions::new().with_trailing_commas(true)),
        };
        relaxed.one_statement_parses_to("CREATE TABLE t (a INT,)", "CREATE TABLE t (a INT)");
    }

    #[test]
    fn test_parser_error_display() {
        let cases = [
            (
                ParserError::MissingToken {
                    clause: "LOCATION".to_string(),
                    expected: "'('".to_string(),
                    found: "EOF".to_string(),
                },
                "sql parser error: Expected '(' in LOCATION, found: EOF",
            ),
            (
                ParserError::EmptyList {
                    clause: "DISTRIBUTED BY".to_string(),
                },
                "sql parser error: Expected at least one element in DISTRIBUTED BY list",
            ),
            (
                ParserError::MissingValue {
                    clause: "FORMAT".to_string(),
                    key: "DELIMITER".to_string(),
                },
                "sql parser error: Expected a string literal for DELIMITER in FORMAT",
            ),
            (
                ParserError::RecursionLimitExceeded,
                "sql parser error: recursion limit exceeded",
            ),
        ];
        for (error, message) in cases {
            assert_eq!(error.to_string(), message);
        }
    }
}
