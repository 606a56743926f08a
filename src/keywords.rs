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

//! This module defines
//! 1) a list of constants for every keyword
//! 2) an `ALL_KEYWORDS` array with every keyword in it
//!    This is not a list of *reserved* keywords: some of these keywords may be
//!    parsed as identifiers if the parser decides so. This means that new
//!    keywords can be added here without affecting the parse result.
//!
//!    As a matter of fact, most of these keywords are not used at all
//!    and could be removed.
//! 3) a `Keyword` enum with every keyword in it
//!
//! Multi-word dialect keywords (`DISTRIBUTED BY`, `ON SEGMENTS`, ...) are
//! sequences of these single keywords, see
//! [`GreenplumKeyword`](crate::dialect::GreenplumKeyword).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines a string constant for a single keyword: `kw_def!(SELECT);`
/// expands to `pub const SELECT = "SELECT";`
macro_rules! kw_def {
    ($ident:ident = $string_keyword:expr) => {
        pub const $ident: &'static str = $string_keyword;
    };
    ($ident:ident) => {
        kw_def!($ident = stringify!($ident));
    };
}

/// Expands to a list of `kw_def!()` invocations for each keyword
/// and defines an ALL_KEYWORDS array of the defined constants.
macro_rules! define_keywords {
    ($(
        $ident:ident $(= $string_keyword:expr)?
    ),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[allow(non_camel_case_types)]
        pub enum Keyword {
            NoKeyword,
            $($ident),*
        }

        pub const ALL_KEYWORDS_INDEX: &[Keyword] = &[
            $(Keyword::$ident),*
        ];

        $(kw_def!($ident $(= $string_keyword)?);)*
        pub const ALL_KEYWORDS: &[&str] = &[
            $($ident),*
        ];
    };
}

// NOTE: this list is binary searched by the tokenizer and must be kept sorted
define_keywords!(
    ACTION,
    ALL,
    AS,
    BIGINT,
    BOOL,
    BOOLEAN,
    BY,
    CASCADE,
    CHAR,
    CHARACTER,
    CONSTRAINT,
    CREATE,
    DATE,
    DECIMAL,
    DEFAULT,
    DELETE,
    DELIMITER,
    DISTRIBUTED,
    ENCODING,
    ESCAPE,
    EXISTS,
    EXTERNAL,
    FALSE,
    FIELDS,
    FILL,
    FOREIGN,
    FORMAT,
    FORMATTER,
    HEADER,
    IF,
    INT,
    INTEGER,
    KEY,
    LOCATION,
    MASTER,
    MISSING,
    NEWLINE,
    NO,
    NOT,
    NULL,
    NUMERIC,
    ON,
    PRIMARY,
    QUOTE,
    RANDOMLY,
    READABLE,
    REFERENCES,
    RESTRICT,
    SEGMENTS,
    SET,
    SMALLINT,
    TABLE,
    TEMP,
    TEMPORARY,
    TEXT,
    TIMESTAMP,
    TRUE,
    UNIQUE,
    UPDATE,
    VARCHAR,
    VARYING,
    WRITABLE
);
