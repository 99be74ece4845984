//! `key: value` parameter file parser
//!
//! Each experiment directory carries a `${EXPID}.parameters` file describing
//! the run that produced it. The format is line oriented: everything before
//! the first `:` is the key, everything after it is the value. Values have
//! every space removed, since the compute hosts pad some entries with
//! whitespace. A key appearing on several lines (most prominently `output`)
//! collects its values into a list in file order.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ParserError, ParserResult};

/// A parameter value, either a single entry or a list collected from
/// repeated keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// The value as a single string, if it is not a list
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Many(_) => None,
        }
    }

    /// All values as a slice, regardless of arity
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(value) => std::slice::from_ref(value),
            ParamValue::Many(values) => values,
        }
    }

    /// Number of collected values
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another value, turning a single entry into a list
    pub fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(first) => {
                *self = ParamValue::Many(vec![std::mem::take(first), value]);
            }
            ParamValue::Many(values) => values.push(value),
        }
    }
}

/// Parsed contents of a parameter file, keyed in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(IndexMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter by key
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over keys and values in file order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Record a key/value pair, collecting repeated keys into a list
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match self.0.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
            Entry::Vacant(entry) => {
                entry.insert(ParamValue::Single(value.into()));
            }
        }
    }
}

/// Parse a single line of a parameter file.
///
/// Blank lines yield `Ok(None)`. A non-blank line must contain a `:`; the
/// key is everything before the first one, the value everything after it
/// with all spaces removed. `origin` names the input in error messages.
pub fn parse_line(line: &str, origin: &str) -> ParserResult<Option<(String, String)>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    match line.split_once(':') {
        Some((key, value)) => Ok(Some((key.to_string(), value.replace(' ', "")))),
        None => Err(ParserError::BadLine {
            line: line.to_string(),
            origin: origin.to_string(),
        }),
    }
}

/// Parse parameters from any buffered reader
pub fn parse_reader<R: BufRead>(reader: R) -> ParserResult<Parameters> {
    parse_lines(reader.lines(), "<input>")
}

/// Parse parameters from a string
pub fn parse_str(input: &str) -> ParserResult<Parameters> {
    parse_reader(Cursor::new(input))
}

/// Parse a parameter file from disk
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParserResult<Parameters> {
    let path = path.as_ref();
    tracing::debug!("Loading parameters from {:?}", path);
    let file = File::open(path)?;
    parse_lines(BufReader::new(file).lines(), &path.display().to_string())
}

fn parse_lines<I>(lines: I, origin: &str) -> ParserResult<Parameters>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let mut params = Parameters::new();
    for line in lines {
        let line = line?;
        tracing::debug!("{}", line.trim());
        if let Some((key, value)) = parse_line(&line, origin)? {
            params.push(key, value);
        }
    }
    Ok(params)
}
