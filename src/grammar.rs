//! The grammar expansion engine.
//!
//! A [GrammarConfig] holds an axiom and a set of production rules. [expand] rewrites
//! the axiom a fixed number of times, replacing every symbol with its production body
//! (or leaving it alone when it has no rule), and yields a [SymbolStream] for the
//! turtle interpreter.

use crate::error::ConfigError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An immutable description of a road grammar and its turtle parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// The initial symbol string.
    axiom: String,
    /// The candidate productions for each symbol.
    rules: BTreeMap<char, Vec<Production>>,
    /// The number of rewriting passes.
    iterations: i32,
    /// The turn angle in degrees.
    turn_angle: f64,
    /// The distance covered by a draw or move symbol.
    step_length: f64,
    /// The seed for choosing among weighted productions.
    seed: Option<u64>,
    /// The style class of segments drawn before any style symbol.
    default_style: String,
    /// Symbols which switch the style class of subsequent segments.
    style_symbols: BTreeMap<char, String>,
    /// Maximum depth of the turtle's push/pop stack.
    max_stack_depth: usize,
}

/// One candidate replacement for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// The relative likelihood of this production being chosen.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// The string that replaces the symbol.
    pub replacement: String,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            axiom: "F".into(),
            rules: BTreeMap::new(),
            iterations: 1,
            turn_angle: 90.0,
            step_length: 10.0,
            seed: None,
            default_style: "local".into(),
            style_symbols: BTreeMap::new(),
            max_stack_depth: 1024,
        }
    }
}

impl GrammarConfig {
    /// Creates a configuration with the given axiom and default parameters.
    pub fn new(axiom: impl Into<String>) -> Self {
        Self {
            axiom: axiom.into(),
            ..Default::default()
        }
    }

    /// Adds a production with weight 1.
    pub fn with_rule(self, symbol: char, replacement: impl Into<String>) -> Self {
        self.with_weighted_rule(symbol, 1.0, replacement)
    }

    /// Adds a weighted production. A symbol with several productions picks one
    /// at random for each occurrence, in proportion to their weights.
    pub fn with_weighted_rule(
        mut self,
        symbol: char,
        weight: f64,
        replacement: impl Into<String>,
    ) -> Self {
        self.rules.entry(symbol).or_default().push(Production {
            weight,
            replacement: replacement.into(),
        });
        self
    }

    /// Adds the productions written in `text`. See [parse_rules].
    pub fn with_rules(mut self, text: &str) -> Result<Self, ConfigError> {
        for (symbol, productions) in parse_rules(text)? {
            self.rules.entry(symbol).or_default().extend(productions);
        }
        Ok(self)
    }

    pub fn with_iterations(mut self, iterations: i32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the turn angle, in degrees.
    pub fn with_turn_angle(mut self, degrees: f64) -> Self {
        self.turn_angle = degrees;
        self
    }

    pub fn with_step_length(mut self, step_length: f64) -> Self {
        self.step_length = step_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_default_style(mut self, style_class: impl Into<String>) -> Self {
        self.default_style = style_class.into();
        self
    }

    /// Makes `symbol` switch the style class of segments drawn after it.
    pub fn with_style_symbol(mut self, symbol: char, style_class: impl Into<String>) -> Self {
        self.style_symbols.insert(symbol, style_class.into());
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    pub fn rules(&self) -> &BTreeMap<char, Vec<Production>> {
        &self.rules
    }

    pub fn iterations(&self) -> i32 {
        self.iterations
    }

    /// The turn angle, in degrees.
    pub fn turn_angle(&self) -> f64 {
        self.turn_angle
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    pub fn style_symbols(&self) -> &BTreeMap<char, String> {
        &self.style_symbols
    }

    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Checks the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_grammar()?;
        self.validate_turtle()
    }

    /// Checks the parts of the configuration used by the expansion engine.
    pub fn validate_grammar(&self) -> Result<(), ConfigError> {
        if self.axiom.is_empty() {
            return Err(ConfigError::EmptyAxiom);
        }
        if self.rules.is_empty() {
            return Err(ConfigError::NoRules);
        }
        if self.iterations < 0 {
            return Err(ConfigError::NegativeIterations(self.iterations));
        }
        for (&symbol, productions) in &self.rules {
            if productions.is_empty() {
                return Err(ConfigError::EmptyProductions { symbol });
            }
            if let Some(p) = productions
                .iter()
                .find(|p| !p.weight.is_finite() || p.weight < 0.0)
            {
                return Err(ConfigError::InvalidWeight {
                    symbol,
                    weight: p.weight,
                });
            }
            if productions.iter().all(|p| p.weight == 0.0) {
                return Err(ConfigError::InvalidWeight {
                    symbol,
                    weight: 0.0,
                });
            }
        }
        Ok(())
    }

    /// Checks the parts of the configuration used by the turtle interpreter.
    pub fn validate_turtle(&self) -> Result<(), ConfigError> {
        if !self.step_length.is_finite() || self.step_length <= 0.0 {
            return Err(ConfigError::InvalidStepLength(self.step_length));
        }
        if !self.turn_angle.is_finite() {
            return Err(ConfigError::InvalidTurnAngle(self.turn_angle));
        }
        Ok(())
    }
}

/// Parses production rules, one per line.
///
/// Each line has the form `X -> body` or `X -> (weight) body`, where `X` is a
/// single symbol. Whitespace inside the body is ignored, an empty body erases the
/// symbol, and everything after a `#` is a comment.
pub fn parse_rules(text: &str) -> Result<BTreeMap<char, Vec<Production>>, ConfigError> {
    let mut rules: BTreeMap<char, Vec<Production>> = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let malformed = |reason: &str| ConfigError::MalformedRule {
            line: line_no,
            reason: reason.into(),
        };

        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (lhs, rhs) = line.split_once("->").ok_or_else(|| malformed("missing '->'"))?;

        let mut lhs = lhs.trim().chars();
        let symbol = match (lhs.next(), lhs.next()) {
            (Some(symbol), None) => symbol,
            _ => return Err(malformed("left-hand side must be a single symbol")),
        };

        let rhs = rhs.trim();
        let (weight, body) = match rhs.strip_prefix('(') {
            Some(rest) => {
                let (weight, body) = rest
                    .split_once(')')
                    .ok_or_else(|| malformed("unclosed weight"))?;
                let weight = weight
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| malformed("weight is not a number"))?;
                (weight, body)
            }
            None => (1.0, rhs),
        };

        rules.entry(symbol).or_default().push(Production {
            weight,
            replacement: body.chars().filter(|c| !c.is_whitespace()).collect(),
        });
    }
    Ok(rules)
}

/// The output of the expansion engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolStream(String);

impl SymbolStream {
    pub fn new(symbols: impl Into<String>) -> Self {
        Self(symbols.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number of symbols in the stream.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the symbols in order.
    pub fn symbols(&self) -> std::str::Chars<'_> {
        self.0.chars()
    }
}

impl From<&str> for SymbolStream {
    fn from(symbols: &str) -> Self {
        Self::new(symbols)
    }
}

impl fmt::Display for SymbolStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The productions available for one symbol.
#[derive(Clone, Debug)]
enum RuleChoice {
    /// Exactly one production, applied unconditionally.
    Single(String),
    /// Several productions, sampled by weight.
    Weighted {
        bodies: Vec<String>,
        index: WeightedIndex<f64>,
    },
}

/// A validated grammar, ready for expansion.
#[derive(Clone, Debug)]
pub struct Grammar {
    axiom: String,
    rules: HashMap<char, RuleChoice>,
    iterations: u32,
    seed: Option<u64>,
}

impl Grammar {
    /// Validates the configuration and compiles its rules.
    pub fn new(config: &GrammarConfig) -> Result<Self, ConfigError> {
        config.validate_grammar()?;

        let mut rules = HashMap::with_capacity(config.rules.len());
        for (&symbol, productions) in &config.rules {
            let choice = match productions.as_slice() {
                [single] => RuleChoice::Single(single.replacement.clone()),
                _ => {
                    let weights = productions.iter().map(|p| p.weight);
                    let index = WeightedIndex::new(weights).map_err(|_| {
                        ConfigError::InvalidWeight {
                            symbol,
                            weight: productions.iter().map(|p| p.weight).sum(),
                        }
                    })?;
                    RuleChoice::Weighted {
                        bodies: productions.iter().map(|p| p.replacement.clone()).collect(),
                        index,
                    }
                }
            };
            rules.insert(symbol, choice);
        }

        Ok(Self {
            axiom: config.axiom.clone(),
            rules,
            iterations: config.iterations as u32,
            seed: config.seed,
        })
    }

    /// Rewrites the axiom once per iteration.
    ///
    /// With a seed, the result depends only on the grammar; without one,
    /// weighted choices are drawn from system entropy.
    pub fn expand(&self) -> SymbolStream {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut current = self.axiom.clone();
        for iteration in 0..self.iterations {
            let mut next = String::with_capacity(current.len() * 2);
            for symbol in current.chars() {
                match self.rules.get(&symbol) {
                    Some(RuleChoice::Single(body)) => next.push_str(body),
                    Some(RuleChoice::Weighted { bodies, index }) => {
                        next.push_str(&bodies[index.sample(&mut rng)])
                    }
                    None => next.push(symbol),
                }
            }
            log::debug!(
                "grammar iteration {}: {} -> {} bytes",
                iteration + 1,
                current.len(),
                next.len()
            );
            current = next;
        }

        SymbolStream(current)
    }
}

/// Expands the configuration's axiom under its production rules.
pub fn expand(config: &GrammarConfig) -> Result<SymbolStream, ConfigError> {
    Ok(Grammar::new(config)?.expand())
}
