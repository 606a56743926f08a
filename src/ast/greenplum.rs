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

//! Greenplum table properties: distribution policy and external table
//! clauses of `CREATE TABLE`.
//!
//! <https://docs.vmware.com/en/VMware-Greenplum/7/greenplum-database/ref_guide-sql_commands-CREATE_EXTERNAL_TABLE.html>

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ast::value::escape_single_quote_string;
use crate::ast::{display_comma_separated, Ident};
use crate::parser::ParserError;

/// Where a [`TableProperty`] is rendered inside `CREATE TABLE`.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyPlacement {
    /// Between `CREATE` and `TABLE`, e.g. `CREATE EXTERNAL TABLE`
    PostCreate,
    /// After the column schema, in insertion order
    PostSchema,
}

/// A vendor clause attached to `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TableProperty {
    /// `DISTRIBUTED BY (<column> [, ...])`
    DistributedBy(Vec<Ident>),
    /// `DISTRIBUTED RANDOMLY`
    DistributedRandomly,
    /// `EXTERNAL`
    External,
    /// `READABLE`, only valid in front of `EXTERNAL`
    Readable,
    /// `WRITABLE`, only valid in front of `EXTERNAL`
    Writable,
    /// `LOCATION ('<uri>' [, ...]) [ON ALL | MASTER | SEGMENTS]`
    Location(LocationProperty),
    /// `FORMAT '<name>' [(<option> [, ...])]`
    Format(FormatProperty),
    /// `ENCODING '<name>'`
    Encoding(String),
}

impl TableProperty {
    pub fn placement(&self) -> PropertyPlacement {
        match self {
            TableProperty::External | TableProperty::Readable | TableProperty::Writable => {
                PropertyPlacement::PostCreate
            }
            TableProperty::DistributedBy(_)
            | TableProperty::DistributedRandomly
            | TableProperty::Location(_)
            | TableProperty::Format(_)
            | TableProperty::Encoding(_) => PropertyPlacement::PostSchema,
        }
    }

    /// `READABLE` or `WRITABLE`
    pub fn is_access_mode(&self) -> bool {
        matches!(self, TableProperty::Readable | TableProperty::Writable)
    }

    /// Check the property renders to text the Greenplum dialect accepts.
    ///
    /// Parsed properties always pass; hand-built ones are held to the
    /// same rules and fail with the error the parser would report.
    pub fn validate(&self) -> Result<(), ParserError> {
        match self {
            TableProperty::DistributedBy(columns) if columns.is_empty() => {
                Err(ParserError::EmptyList {
                    clause: "DISTRIBUTED BY".to_string(),
                })
            }
            TableProperty::Location(location) => location.validate(),
            TableProperty::Format(format) => format.validate(),
            TableProperty::Encoding(encoding) if encoding.is_empty() => {
                Err(ParserError::MissingValue {
                    clause: "ENCODING".to_string(),
                    key: "ENCODING".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TableProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableProperty::DistributedBy(columns) => {
                write!(f, "DISTRIBUTED BY ({})", display_comma_separated(columns))
            }
            TableProperty::DistributedRandomly => write!(f, "DISTRIBUTED RANDOMLY"),
            TableProperty::External => write!(f, "EXTERNAL"),
            TableProperty::Readable => write!(f, "READABLE"),
            TableProperty::Writable => write!(f, "WRITABLE"),
            TableProperty::Location(location) => write!(f, "{location}"),
            TableProperty::Format(format) => write!(f, "{format}"),
            TableProperty::Encoding(encoding) => {
                write!(f, "ENCODING '{}'", escape_single_quote_string(encoding))
            }
        }
    }
}

/// Which segments read the external data: `ON ALL | MASTER | SEGMENTS`
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentScope {
    All,
    Master,
    Segments,
}

impl fmt::Display for SegmentScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SegmentScope::All => "ALL",
            SegmentScope::Master => "MASTER",
            SegmentScope::Segments => "SEGMENTS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationProperty {
    /// At least one URI, e.g. `gpfdist://etl1:8081/*.csv`
    pub uris: Vec<String>,
    pub on_segment: Option<SegmentScope>,
}

impl LocationProperty {
    pub fn new<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LocationProperty {
            uris: uris.into_iter().map(Into::into).collect(),
            on_segment: None,
        }
    }

    pub fn on(mut self, scope: SegmentScope) -> Self {
        self.on_segment = Some(scope);
        self
    }

    pub fn validate(&self) -> Result<(), ParserError> {
        if self.uris.is_empty() {
            return Err(ParserError::EmptyList {
                clause: "LOCATION".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for LocationProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LOCATION (")?;
        let mut delim = "";
        for uri in &self.uris {
            write!(f, "{delim}'{}'", escape_single_quote_string(uri))?;
            delim = ", ";
        }
        write!(f, ")")?;
        if let Some(scope) = &self.on_segment {
            write!(f, " ON {scope}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatProperty {
    /// `'TEXT'`, `'CSV'`, `'CUSTOM'`, ...
    pub name: String,
    /// `None` when no option list was given or the list was empty
    pub options: Option<Vec<FormatOption>>,
}

impl FormatProperty {
    pub fn new<S: Into<String>>(name: S) -> Self {
        FormatProperty {
            name: name.into(),
            options: None,
        }
    }

    /// Sets `key`, replacing an earlier value for the same key.
    pub fn with_option<K: Into<String>>(mut self, key: K, value: FormatOptionValue) -> Self {
        let key = key.into();
        let options = self.options.get_or_insert_with(Vec::new);
        match options
            .iter_mut()
            .find(|option| option.key.eq_ignore_ascii_case(&key))
        {
            Some(existing) => existing.value = value,
            None => options.push(FormatOption { key, value }),
        }
        self
    }

    /// The name must be non-empty and every option needs a key.
    pub fn validate(&self) -> Result<(), ParserError> {
        if self.name.is_empty() {
            return Err(ParserError::MissingValue {
                clause: "FORMAT".to_string(),
                key: "FORMAT".to_string(),
            });
        }
        if self.options.iter().flatten().any(|option| option.key.is_empty()) {
            return Err(ParserError::ParserError(
                "Expected a key for every FORMAT option".to_string(),
            ));
        }
        Ok(())
    }

    /// Case-insensitive lookup of an option value.
    pub fn option(&self, key: &str) -> Option<&FormatOptionValue> {
        self.options
            .iter()
            .flatten()
            .find(|option| option.key.eq_ignore_ascii_case(key))
            .map(|option| &option.value)
    }
}

impl fmt::Display for FormatProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FORMAT '{}'", escape_single_quote_string(&self.name))?;
        if let Some(options) = &self.options {
            write!(f, " ({})", display_comma_separated(options))?;
        }
        Ok(())
    }
}

/// One entry of a `FORMAT` option list
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatOption {
    pub key: String,
    pub value: FormatOptionValue,
}

impl FormatOption {
    pub fn flag<K: Into<String>>(key: K) -> Self {
        FormatOption {
            key: key.into(),
            value: FormatOptionValue::Flag,
        }
    }

    pub fn string<K: Into<String>, V: ToString>(key: K, value: V) -> Self {
        FormatOption {
            key: key.into(),
            value: FormatOptionValue::String(value.to_string()),
        }
    }
}

impl fmt::Display for FormatOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            FormatOptionValue::Flag => write!(f, "{}", self.key),
            FormatOptionValue::String(value) => {
                write!(f, "{}='{}'", self.key, escape_single_quote_string(value))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormatOptionValue {
    /// A boolean option that is switched on by its presence, e.g. `HEADER`
    Flag,
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_of_each_property() {
        use PropertyPlacement::*;
        let cases = [
            (TableProperty::External, PostCreate),
            (TableProperty::Readable, PostCreate),
            (TableProperty::Writable, PostCreate),
            (TableProperty::DistributedBy(vec![Ident::new("id")]), PostSchema),
            (TableProperty::DistributedRandomly, PostSchema),
            (
                TableProperty::Location(LocationProperty::new(["file://h/f.csv"])),
                PostSchema,
            ),
            (TableProperty::Format(FormatProperty::new("CSV")), PostSchema),
            (TableProperty::Encoding("UTF8".to_string()), PostSchema),
        ];
        for (property, placement) in cases {
            assert_eq!(property.placement(), placement, "{property}");
        }
    }

    #[test]
    fn display_location() {
        let location = LocationProperty::new(["a", "b"]);
        assert_eq!(location.to_string(), "LOCATION ('a', 'b')");
        assert_eq!(
            location.on(SegmentScope::Segments).to_string(),
            "LOCATION ('a', 'b') ON SEGMENTS"
        );
    }

    #[test]
    fn display_format() {
        assert_eq!(FormatProperty::new("CSV").to_string(), "FORMAT 'CSV'");

        let format = FormatProperty::new("TEXT")
            .with_option("DELIMITER", FormatOptionValue::String("|".to_string()))
            .with_option("HEADER", FormatOptionValue::Flag)
            .with_option("NULL", FormatOptionValue::String("".to_string()));
        assert_eq!(
            format.to_string(),
            "FORMAT 'TEXT' (DELIMITER='|', HEADER, NULL='')"
        );
    }

    #[test]
    fn format_option_replaces_same_key() {
        let format = FormatProperty::new("CSV")
            .with_option("quote", FormatOptionValue::String("'".to_string()))
            .with_option("QUOTE", FormatOptionValue::String("\"".to_string()));
        assert_eq!(format.options.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            format.option("Quote"),
            Some(&FormatOptionValue::String("\"".to_string()))
        );
        assert_eq!(format.option("delimiter"), None);
    }

    #[test]
    fn validate_rejects_empty_clauses() {
        assert_eq!(
            TableProperty::Location(LocationProperty::new(Vec::<String>::new())).validate(),
            Err(ParserError::EmptyList {
                clause: "LOCATION".to_string()
            })
        );
        assert_eq!(
            TableProperty::DistributedBy(vec![]).validate(),
            Err(ParserError::EmptyList {
                clause: "DISTRIBUTED BY".to_string()
            })
        );
        assert_eq!(
            TableProperty::Format(FormatProperty::new("")).validate(),
            Err(ParserError::MissingValue {
                clause: "FORMAT".to_string(),
                key: "FORMAT".to_string(),
            })
        );
        assert!(TableProperty::Format(FormatProperty::new("CSV").with_option(
            "",
            FormatOptionValue::Flag
        ))
        .validate()
        .is_err());
        assert!(TableProperty::Encoding(String::new()).validate().is_err());

        assert_eq!(
            TableProperty::Format(
                FormatProperty::new("TEXT")
                    .with_option("NULL", FormatOptionValue::String(String::new()))
            )
            .validate(),
            Ok(())
        );
        assert_eq!(TableProperty::DistributedRandomly.validate(), Ok(()));
    }

    #[test]
    fn display_escapes_quotes() {
        assert_eq!(
            TableProperty::Format(
                FormatProperty::new("TEXT")
                    .with_option("ESCAPE", FormatOptionValue::String("'".to_string()))
            )
            .to_string(),
            "FORMAT 'TEXT' (ESCAPE='''')"
        );
        assert_eq!(
            TableProperty::Encoding("LATIN1".to_string()).to_string(),
            "ENCODING 'LATIN1'"
        );
    }
}
