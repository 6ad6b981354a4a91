use std::collections::HashMap;

use clap::ValueEnum;

/// How a source key (company name or ticker) is tied to a requested symbol.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    Prefix,
    /// Bidirectional containment. Permissive: short tickers can hit unrelated
    /// names and tickers never hit a spelled-out company name.
    #[default]
    Substring,
    Alias,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolMatcher {
    strategy: MatchStrategy,
    aliases: HashMap<String, Vec<String>>,
}

pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}

impl SymbolMatcher {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            aliases: HashMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: HashMap<String, Vec<String>>) -> Self {
        self.aliases = aliases
            .into_iter()
            .map(|(symbol, names)| {
                let names = names.iter().map(|name| normalize_key(name)).collect();
                (normalize_key(&symbol), names)
            })
            .collect();
        self
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn matches(&self, symbol: &str, source_key: &str) -> bool {
        let symbol = normalize_key(symbol);
        let key = normalize_key(source_key);
        if symbol.is_empty() || key.is_empty() {
            return false;
        }

        match self.strategy {
            MatchStrategy::Exact => key == symbol,
            MatchStrategy::Prefix => key.starts_with(&symbol),
            MatchStrategy::Substring => key.contains(&symbol) || symbol.contains(&key),
            MatchStrategy::Alias => {
                key == symbol
                    || self
                        .aliases
                        .get(&symbol)
                        .is_some_and(|names| names.iter().any(|name| *name == key))
            }
        }
    }

    /// Every requested symbol the key refers to, in request order.
    pub fn matching_symbols<'a>(&self, symbols: &'a [String], source_key: &str) -> Vec<&'a str> {
        symbols
            .iter()
            .filter(|symbol| self.matches(symbol, source_key))
            .map(String::as_str)
            .collect()
    }
}
