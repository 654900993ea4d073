use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Separator between the two currency codes of a pair key (`USD_GBP`).
pub const PAIR_DELIMITER: char = '_';

/// Identifier assigned by the cycle registry, in enumeration order.
pub type CycleId = usize;

/// An opaque, case-normalized currency code.
///
/// Codes are trimmed and upper-cased on construction so `usd` and `USD`
/// name the same node. The pair delimiter and whitespace are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(String);

impl Currency {
    /// # Errors
    /// Returns `Error::InvalidPairKey` if the code is empty or contains the
    /// pair delimiter or whitespace.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let code = raw.trim();
        if code.is_empty()
            || code
                .chars()
                .any(|c| c == PAIR_DELIMITER || c.is_whitespace())
        {
            return Err(Error::InvalidPairKey(raw.to_string()));
        }
        Ok(Currency(code.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Currency {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::parse(s)
    }
}

/// Identity of a directed edge: the ordered `(from, to)` pair.
///
/// The rate is not part of the key. `B_A` is a separate edge from `A_B`
/// and is never derived from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub from: Currency,
    pub to: Currency,
}

impl EdgeKey {
    /// # Errors
    /// Returns `Error::InvalidPairKey` for a self-loop (`from == to`).
    pub fn new(from: Currency, to: Currency) -> Result<Self, Error> {
        if from == to {
            return Err(Error::InvalidPairKey(format!(
                "{from}{PAIR_DELIMITER}{to}"
            )));
        }
        Ok(EdgeKey { from, to })
    }

    /// Parses a `<FROM>_<TO>` pair key.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey` unless the key holds exactly two
    /// distinct, non-empty currency codes.
    pub fn parse(key: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidPairKey(key.to_string());

        let mut parts = key.split(PAIR_DELIMITER);
        let (Some(from), Some(to), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let from = Currency::parse(from).map_err(|_| invalid())?;
        let to = Currency::parse(to).map_err(|_| invalid())?;
        EdgeKey::new(from, to).map_err(|_| invalid())
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.from, PAIR_DELIMITER, self.to)
    }
}

impl FromStr for EdgeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKey::parse(s)
    }
}

/// Ordered sequence of edges where each edge starts where the previous one ended.
pub type Path = Vec<EdgeKey>;

/// Returns true if consecutive edges of `path` share their junction currency.
pub fn is_connected(path: &[EdgeKey]) -> bool {
    path.windows(2).all(|pair| pair[0].to == pair[1].from)
}

/// Result of a shortest-hop conversion query.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPath {
    /// Edges in travel order. Empty when source and target coincide.
    pub path: Path,
    /// Product of the current rates along `path`; `1.0` for an empty path.
    pub multiplier: f64,
}

impl ConversionPath {
    pub fn hops(&self) -> usize {
        self.path.len()
    }

    /// Pair keys in travel order, e.g. `["GBP_SGD", "SGD_JPY"]`.
    pub fn edge_keys(&self) -> Vec<String> {
        self.path.iter().map(ToString::to_string).collect()
    }
}

/// A registered cycle through the home currency together with its cached multiplier.
///
/// Fields:
/// - `id`: Stable identifier assigned in enumeration order.
/// - `path`: Edges forming the cycle; `path[0].from == path[last].to == home`.
/// - `multiplier`: Product of the current rate of every edge in `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub id: CycleId,
    pub path: Path,
    pub multiplier: f64,
}

impl CycleRecord {
    /// The currency the cycle starts from and returns to.
    pub fn home(&self) -> Option<&Currency> {
        self.path.first().map(|edge| &edge.from)
    }

    /// Returns true if one unit of home currency comes back as more than one unit.
    pub fn is_profitable(&self) -> bool {
        self.multiplier > 1.0
    }

    pub fn contains_edge(&self, edge: &EdgeKey) -> bool {
        self.path.contains(edge)
    }

    /// Pair keys in travel order.
    pub fn edge_keys(&self) -> Vec<String> {
        self.path.iter().map(ToString::to_string).collect()
    }
}
