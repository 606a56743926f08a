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

//! SQL Abstract Syntax Tree (AST) types
#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::parser::ParserError;

pub use self::data_type::{DataType, ExactNumberInfo};
pub use self::ddl::{
    ColumnDef, ColumnOption, ColumnOptionDef, CreateTable, ReferentialAction, TableConstraint,
};
pub use self::greenplum::{
    FormatOption, FormatOptionValue, FormatProperty, LocationProperty, PropertyPlacement,
    SegmentScope, TableProperty,
};
pub use self::value::{escape_quoted_string, escape_single_quote_string, Value};

mod data_type;
mod ddl;
mod greenplum;
mod value;

pub struct DisplaySeparated<'a, T>
where
    T: fmt::Display,
{
    slice: &'a [T],
    sep: &'static str,
}

impl<'a, T> fmt::Display for DisplaySeparated<'a, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut delim = "";
        for t in self.slice {
            write!(f, "{delim}")?;
            delim = self.sep;
            write!(f, "{t}")?;
        }
        Ok(())
    }
}

pub fn display_separated<'a, T>(slice: &'a [T], sep: &'static str) -> DisplaySeparated<'a, T>
where
    T: fmt::Display,
{
    DisplaySeparated { slice, sep }
}

pub fn display_comma_separated<T>(slice: &[T]) -> DisplaySeparated<'_, T>
where
    T: fmt::Display,
{
    DisplaySeparated { slice, sep: ", " }
}

/// An identifier, decomposed into its value or character data and the quote style.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ident {
    /// The value of the identifier without quotes.
    pub value: String,
    /// The starting quote if any. Valid quote characters are the single quote,
    /// double quote, backtick, and opening square bracket.
    pub quote_style: Option<char>,
}

impl Ident {
    /// Create a new identifier with the given value and no quotes.
    pub fn new<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Ident {
            value: value.into(),
            quote_style: None,
        }
    }

    /// Create a new quoted identifier with the given quote and value. This function
    /// panics if the given quote is not a valid quote character.
    pub fn with_quote<S>(quote: char, value: S) -> Self
    where
        S: Into<String>,
    {
        assert!(quote == '\'' || quote == '"' || quote == '`' || quote == '[');
        Ident {
            value: value.into(),
            quote_style: Some(quote),
        }
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Ident {
            value: value.to_string(),
            quote_style: None,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.quote_style {
            Some(q) if q == '"' || q == '\'' || q == '`' => {
                let escaped = value::escape_quoted_string(&self.value, q);
                write!(f, "{q}{escaped}{q}")
            }
            Some('[') => write!(f, "[{}]", self.value),
            None => f.write_str(&self.value),
            _ => panic!("unexpected quote style"),
        }
    }
}

/// A name of a table, view, custom type, etc., possibly multi-part, i.e. db.schema.obj
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectName(pub Vec<Ident>);

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", display_separated(&self.0, "."))
    }
}

/// A top-level statement (SELECT, INSERT, CREATE, etc.)
///
/// Only table creation is understood; every other statement is rejected
/// by the parser.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Statement {
    /// ```sql
    /// CREATE [ READABLE | WRITABLE ] [ EXTERNAL ] [ TEMPORARY ] TABLE
    /// ```
    CreateTable(CreateTable),
}

impl Statement {
    /// The ordered table properties of the statement.
    pub fn table_properties(&self) -> &[TableProperty] {
        match self {
            Statement::CreateTable(create_table) => &create_table.properties,
        }
    }

    /// Mutable access to the property collection, for tooling that attaches
    /// properties to a statement without parsing SQL text.
    pub fn table_properties_mut(&mut self) -> &mut Vec<TableProperty> {
        match self {
            Statement::CreateTable(create_table) => &mut create_table.properties,
        }
    }

    /// See [`CreateTable::validate`].
    pub fn validate(&self) -> Result<(), ParserError> {
        match self {
            Statement::CreateTable(create_table) => create_table.validate(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::CreateTable(create_table) => write!(f, "{create_table}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_display() {
        assert_eq!(Ident::new("id").to_string(), "id");
        assert_eq!(Ident::with_quote('"', "my col").to_string(), r#""my col""#);
        assert_eq!(Ident::with_quote('"', r#"a"b"#).to_string(), r#""a""b""#);
        assert_eq!(Ident::with_quote('[', "x").to_string(), "[x]");
    }

    #[test]
    fn test_object_name_display() {
        let name = ObjectName(vec![Ident::new("ext"), Ident::new("orders")]);
        assert_eq!(name.to_string(), "ext.orders");
    }

    #[test]
    fn test_display_separated() {
        let idents = vec![Ident::new("a"), Ident::new("b"), Ident::new("c")];
        assert_eq!(display_comma_separated(&idents).to_string(), "a, b, c");
        assert_eq!(display_separated(&idents, " ").to_string(), "a b c");
        let empty: Vec<Ident> = vec![];
        assert_eq!(display_comma_separated(&empty).to_string(), "");
    }
}
