//! Statement listings. `disassemble` renders a program's statements as text, `parse_listing` reads such a listing
//! back into statements.

use crate::prelude::*;
use crate::bytecode::{Program, Statement};
#[cfg(feature="compiler")]
use crate::bytecode::OpCode;

/// Renders one line per statement: index, mnemonic, the three raw operands and a readable form. Function entry
/// points are preceded by a `.func name = $index` line.
pub fn disassemble(program: &Program) -> String {
    let mut entries = Map::new();
    for (index, function) in program.functions.iter().enumerate().skip(1) {
        if function.first_statement > 0 {
            entries.insert(function.first_statement as usize, (program.string(function.name), index));
        }
    }
    let mut result = String::new();
    for (index, statement) in program.statements.iter().enumerate() {
        if let Some((name, function)) = entries.get(&index) {
            result.push_str(&format!(".func {name} = ${function}\n"));
        }
        result.push_str(&format_statement(index, statement));
        result.push('\n');
    }
    result
}

/// Renders a single listing line.
pub fn format_statement(index: usize, statement: &Statement) -> String {
    format!("{index:>5}: {:<13} {:>6} {:>6} {:>6}  ; {}", statement.op.mnemonic(), statement.a, statement.b, statement.c, statement.describe())
}

/// Represents the various possible listing error-kinds.
#[cfg(feature="compiler")]
#[derive(Clone, Debug, PartialEq)]
pub enum ListingErrorKind {
    /// The line is not a statement or function annotation.
    SyntaxError,
    UnknownMnemonic(String),
    /// The statement index does not continue the listing.
    OutOfOrder(usize),
}

/// An error reported while parsing a listing.
#[cfg(feature="compiler")]
#[derive(Clone, Debug)]
pub struct ListingError {
    kind: ListingErrorKind,
    line: usize,
}

#[cfg(feature="compiler")]
impl ListingError {
    /// The kind of the error.
    pub fn kind(self: &Self) -> &ListingErrorKind {
        &self.kind
    }
    /// 1-based line number of the offending line.
    pub fn line(self: &Self) -> usize {
        self.line
    }
}

#[cfg(feature="compiler")]
impl Display for ListingError {
    fn fmt(self: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ListingErrorKind::SyntaxError => write!(f, "Syntax error in line {}", self.line),
            ListingErrorKind::UnknownMnemonic(mnemonic) => write!(f, "Unknown mnemonic '{mnemonic}' in line {}", self.line),
            ListingErrorKind::OutOfOrder(index) => write!(f, "Statement {index} out of order in line {}", self.line),
        }
    }
}

#[cfg(feature="compiler")]
mod parser {
    use nom::IResult;
    use nom::bytes::complete::take_while1;
    use nom::character::complete::{self, char, digit1, space0, space1};
    use nom::combinator::{all_consuming, map_res, opt, rest};
    use nom::sequence::{delimited, pair, preceded, terminated, tuple};

    /// Fields of a statement line: index, mnemonic and raw operands.
    pub(super) type Line<'a> = (usize, &'a str, i16, i16, i16);

    fn mnemonic(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
    }

    fn index(input: &str) -> IResult<&str, usize> {
        delimited(space0, map_res(digit1, str::parse::<usize>), char(':'))(input)
    }

    pub(super) fn statement_line(input: &str) -> IResult<&str, Line<'_>> {
        all_consuming(terminated(
            tuple((
                index,
                preceded(space0, mnemonic),
                preceded(space1, complete::i16),
                preceded(space1, complete::i16),
                preceded(space1, complete::i16),
            )),
            pair(space0, opt(preceded(char(';'), rest))),
        ))(input)
    }
}

/// Parses a listing produced by `disassemble` back into statements. Empty lines and function annotations are skipped,
/// the readable form after `;` is ignored.
#[cfg(feature="compiler")]
pub fn parse_listing(text: &str) -> Result<Vec<Statement>, ListingError> {
    let mut statements = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(".func") {
            continue;
        }
        let error = |kind| ListingError { kind, line: number + 1 };
        let (_, (index, mnemonic, a, b, c)) = parser::statement_line(line).map_err(|_| error(ListingErrorKind::SyntaxError))?;
        if index != statements.len() {
            return Err(error(ListingErrorKind::OutOfOrder(index)));
        }
        let op = OpCode::from_mnemonic(mnemonic).ok_or_else(|| error(ListingErrorKind::UnknownMnemonic(mnemonic.to_string())))?;
        statements.push(Statement::new(op, a, b, c));
    }
    Ok(statements)
}
