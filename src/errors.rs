use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AssemblyError {
    #[error("Syntax Error: {0}")]
    PestError(#[from] pest::error::Error<crate::parser::Rule>),

    #[error("Structural Error on line {line}: {reason}")]
    StructuralError { line: usize, reason: String },

    #[error("Semantic Error on line {line}: {reason}")]
    SemanticError { line: usize, reason: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum ObjectError {
    #[error("missing magic header, expected `COFF`")]
    MissingMagic,

    #[error("unexpected line outside of any region: `{0}`")]
    StrayLine(String),

    #[error("bad machine word `{0}`")]
    BadWord(String),

    #[error("bad export entry `{0}`")]
    BadExport(String),

    #[error("bad relocation entry `{0}`")]
    BadRelocation(String),

    #[error("missing EOF terminator")]
    MissingEof,
}

#[derive(Error, Debug, PartialEq)]
pub enum LinkError {
    #[error("Undefined exported symbol {0}")]
    UndefinedExport(String),

    #[error("Duplicate export {0}")]
    DuplicateExport(String),

    #[error("Unresolved extern: {0}")]
    UnresolvedExtern(String),

    #[error("Relocation for {symbol} in {module} is out of range")]
    RelocationOutOfRange { module: String, symbol: String },

    #[error("Malformed object file {file}: {source}")]
    MalformedObject {
        file: String,
        #[source]
        source: ObjectError,
    },
}
