//! Symbol list parsing.
//!
//! A batch runs over a set of symbols; configuration and CLI both supply
//! them as a comma-separated list.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty symbol list")]
    Empty,

    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("invalid symbol {0:?}: only letters, digits, '.' and '-' are allowed")]
    InvalidSymbol(String),
}

/// Split, trim and upper-case a comma-separated symbol list, preserving
/// input order. Duplicates are rejected rather than merged.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut symbols: Vec<String> = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(UniverseError::InvalidSymbol(trimmed.to_string()));
        }
        let symbol = trimmed.to_uppercase();
        if symbols.contains(&symbol) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}
