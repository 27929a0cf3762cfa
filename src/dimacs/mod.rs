// Copyright (c) 2015-2022 Frank Fischer <frank-fischer@shadow-soft.de>
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see  <http://www.gnu.org/licenses/>
//

//! Reading and writing assignment problems in DIMACS format.
//!
//! Both instance and solution files are sequences of lines starting with a
//! one letter descriptor. Empty lines and lines starting with `c` are
//! ignored. All other lines are parsed into [`Record`]s, the modules for
//! the concrete file types check that the records appear in a valid order.

pub mod asn;

use std::error;
use std::fmt;
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::marker::PhantomData;
use std::str::FromStr;

/// Error when reading a file in DIMACS format.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// A line that cannot be parsed.
    Syntax { line: usize, msg: String },
    /// A well-formed line that does not fit the rest of the file.
    Invalid { line: usize, msg: String },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Error::Io(err) => write!(fmt, "I/O error: {}", err),
            Error::Syntax { line, msg } => write!(fmt, "line {}: syntax error: {}", line, msg),
            Error::Invalid { line, msg } => write!(fmt, "line {}: {}", line, msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A parsed line of an assignment or solution file.
///
/// Node numbers are converted to 0-based indices.
#[derive(Clone, Debug, PartialEq)]
enum Record<T> {
    /// `p asn <nodes> <arcs>`
    Problem { nodes: usize, arcs: usize },
    /// `n <node>`, a source node
    Source(usize),
    /// `a <source> <sink> <cost>`
    Arc(usize, usize, T),
    /// `s <value>`, the value of a solution
    Value(T),
    /// `f <source> <sink> 1`, an assigned pair
    Flow(usize, usize),
}

impl<T> Record<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn parse(fields: &[&str]) -> std::result::Result<Self, String> {
        match fields {
            ["p", "asn", nodes, arcs] => Ok(Record::Problem {
                nodes: number(nodes)?,
                arcs: number(arcs)?,
            }),
            ["p", "asn", ..] => Err("problem line must be 'p asn <nodes> <arcs>'".to_string()),
            ["p", kind, ..] => Err(format!("unsupported problem type '{}'", kind)),
            ["n", u] => Ok(Record::Source(node(u)?)),
            ["a", u, v, c] => Ok(Record::Arc(node(u)?, node(v)?, number(c)?)),
            ["s", value] => Ok(Record::Value(number(value)?)),
            ["f", u, v, "1"] => Ok(Record::Flow(node(u)?, node(v)?)),
            ["f", _, _, flow] => Err(format!("flow of an assigned pair must be 1, got '{}'", flow)),
            [d, ..] if ["n", "a", "s", "f"].contains(d) => Err(format!("wrong number of fields in '{}' line", d)),
            [d, ..] => Err(format!("unknown line descriptor '{}'", d)),
            [] => Err("empty line".to_string()),
        }
    }
}

fn number<T>(s: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    s.parse().map_err(|e| format!("invalid number '{}': {}", s, e))
}

fn node(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(u) if u > 0 => Ok(u - 1),
        _ => Err(format!("invalid node number '{}'", s)),
    }
}

/// Iterator over the records of a file together with their line numbers.
struct Records<R, T> {
    lines: Lines<BufReader<R>>,
    line: usize,
    phantom: PhantomData<T>,
}

impl<R: Read, T> Records<R, T> {
    fn new(reader: R) -> Self {
        Records {
            lines: BufReader::new(reader).lines(),
            line: 0,
            phantom: PhantomData,
        }
    }

    /// The number of the last line that has been read.
    fn line(&self) -> usize {
        self.line
    }
}

impl<R, T> Iterator for Records<R, T>
where
    R: Read,
    T: FromStr,
    T::Err: fmt::Display,
{
    type Item = Result<(usize, Record<T>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;

            let fields = text.split_whitespace().collect::<Vec<_>>();
            match fields.first() {
                None => continue,
                Some(d) if d.starts_with('c') => continue,
                Some(_) => {
                    let line = self.line;
                    return Some(
                        Record::parse(&fields)
                            .map(|record| (line, record))
                            .map_err(|msg| Error::Syntax { line, msg }),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Record, Records};
    use std::io::Cursor;

    fn records(text: &str) -> Vec<Result<(usize, Record<i32>), usize>> {
        Records::new(Cursor::new(text.to_string()))
            .map(|r| {
                r.map_err(|err| match err {
                    Error::Syntax { line, .. } => line,
                    err => panic!("unexpected error: {}", err),
                })
            })
            .collect()
    }

    #[test]
    fn test_skip_comments() {
        let mut recs = Records::<_, i32>::new(Cursor::new("c comment\n\n   \n  p asn 4 2\ncomment\n"));
        assert_eq!(recs.next().unwrap().unwrap(), (4, Record::Problem { nodes: 4, arcs: 2 }));
        assert!(recs.next().is_none());
        assert_eq!(recs.line(), 5);
    }

    #[test]
    fn test_records() {
        assert_eq!(
            records("n 1\na 1 3 -7\ns 12\nf 2 4 1\n"),
            vec![
                Ok((1, Record::Source(0))),
                Ok((2, Record::Arc(0, 2, -7))),
                Ok((3, Record::Value(12))),
                Ok((4, Record::Flow(1, 3))),
            ]
        );
    }

    #[test]
    fn test_syntax_errors() {
        // unknown descriptor, missing field, node 0, bad cost, flow other than 1
        for text in &["x 1\n", "p asn 4\n", "p min 4 2\n", "n 0\n", "a 1 2 x\n", "f 1 2 0\n", "a 1 2 3 4\n"] {
            assert_eq!(records(&format!("c\n{}", text)), vec![Err(2)], "{:?}", text);
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::Syntax {
            line: 3,
            msg: "unknown line descriptor 'x'".to_string(),
        };
        assert_eq!(format!("{}", err), "line 3: syntax error: unknown line descriptor 'x'");
    }
}
