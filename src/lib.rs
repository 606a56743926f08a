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

//! SQL Parser for `CREATE TABLE` statements with Greenplum extensions.
//!
//! The Greenplum dialect understands distribution clauses
//! (`DISTRIBUTED BY (..)`, `DISTRIBUTED RANDOMLY`) and external tables
//! (`CREATE [READABLE | WRITABLE] EXTERNAL TABLE ... LOCATION (..)
//! FORMAT '..' ENCODING '..'`). Every recognised clause becomes a
//! [`TableProperty`](crate::ast::TableProperty) and is regenerated by the
//! statement's `Display` implementation.
//!
//! Example:
//!
//! ```
//! use sqlparser_greenplum::dialect::GreenplumDialect;
//! use sqlparser_greenplum::parser::Parser;
//!
//! let dialect = GreenplumDialect {};
//!
//! let sql = "CREATE READABLE EXTERNAL TABLE ext (id INT) \
//!            LOCATION ('gpfdist://etl:8081/*.csv') FORMAT 'CSV' (HEADER)";
//!
//! let ast = Parser::parse_sql(&dialect, sql).unwrap();
//!
//! assert_eq!(ast[0].to_string(), sql);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::upper_case_acronyms)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[macro_use]
#[cfg(test)]
extern crate pretty_assertions;

pub mod ast;
#[macro_use]
pub mod dialect;
pub mod keywords;
pub mod parser;
pub mod tokenizer;

#[doc(hidden)]
// This is required to make utilities accessible by both the crate-internal
// unit-tests and by the integration tests <https://stackoverflow.com/a/44541071/1026>
// External users are not supposed to rely on this module.
pub mod test_utils;
