//! Index and write options that appear as keywords in generated statements.
//!
//! Each option renders as its SurrealQL keyword and parses case-insensitively,
//! so the same values work in TOML configuration, environment variables and
//! CLI flags.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vector index algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Algorithm {
    /// Hierarchical navigable small world graph. Queries take a search breadth (`ef`).
    #[default]
    Hnsw,
    /// Metric tree.
    Mtree,
}

impl Algorithm {
    /// Returns the SurrealQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hnsw => "HNSW",
            Self::Mtree => "MTREE",
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HNSW" => Ok(Self::Hnsw),
            "MTREE" => Ok(Self::Mtree),
            _ => Err(unknown_keyword("index algorithm", s, "HNSW, MTREE")),
        }
    }
}

/// Distance metric used by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Distance {
    /// Cosine distance. Scores are cosine similarities.
    #[default]
    Cosine,
    /// Euclidean (L2) distance.
    Euclidean,
    /// Manhattan (L1) distance.
    Manhattan,
}

impl Distance {
    /// Returns the SurrealQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::Euclidean => "EUCLIDEAN",
            Self::Manhattan => "MANHATTAN",
        }
    }
}

impl FromStr for Distance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COSINE" => Ok(Self::Cosine),
            "EUCLIDEAN" => Ok(Self::Euclidean),
            "MANHATTAN" => Ok(Self::Manhattan),
            _ => Err(unknown_keyword(
                "distance metric",
                s,
                "COSINE, EUCLIDEAN, MANHATTAN",
            )),
        }
    }
}

/// Element type of stored vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum VectorType {
    /// 64-bit float.
    F64,
    /// 32-bit float.
    #[default]
    F32,
    /// 64-bit integer.
    I64,
    /// 32-bit integer.
    I32,
    /// 16-bit integer.
    I16,
}

impl VectorType {
    /// Returns the SurrealQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::F64 => "F64",
            Self::F32 => "F32",
            Self::I64 => "I64",
            Self::I32 => "I32",
            Self::I16 => "I16",
        }
    }
}

impl FromStr for VectorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "F64" => Ok(Self::F64),
            "F32" => Ok(Self::F32),
            "I64" => Ok(Self::I64),
            "I32" => Ok(Self::I32),
            "I16" => Ok(Self::I16),
            _ => Err(unknown_keyword("vector type", s, "F64, F32, I64, I32, I16")),
        }
    }
}

/// How an `UPSERT` applies the document body to an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum UpsertMode {
    /// Replace the record content.
    #[default]
    Content,
    /// Merge fields into the existing record.
    Merge,
    /// Replace the record, failing on a mismatched id.
    Replace,
}

impl UpsertMode {
    /// Returns the SurrealQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "CONTENT",
            Self::Merge => "MERGE",
            Self::Replace => "REPLACE",
        }
    }
}

impl FromStr for UpsertMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONTENT" => Ok(Self::Content),
            "MERGE" => Ok(Self::Merge),
            "REPLACE" => Ok(Self::Replace),
            _ => Err(unknown_keyword("upsert mode", s, "CONTENT, MERGE, REPLACE")),
        }
    }
}

fn unknown_keyword(what: &str, value: &str, expected: &str) -> Error {
    Error::InvalidInput(format!("unknown {what} '{value}' (expected one of {expected})"))
}

macro_rules! keyword_conversions {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl TryFrom<String> for $ty {
                type Error = Error;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for &'static str {
                fn from(value: $ty) -> Self {
                    value.as_str()
                }
            }
        )+
    };
}

keyword_conversions!(Algorithm, Distance, VectorType, UpsertMode);

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        assert_eq!(Algorithm::default(), Algorithm::Hnsw);
        assert_eq!(Distance::default(), Distance::Cosine);
        assert_eq!(VectorType::default(), VectorType::F32);
        assert_eq!(UpsertMode::default(), UpsertMode::Content);
    }

    #[test_case("hnsw", Algorithm::Hnsw; "lowercase")]
    #[test_case("MTREE", Algorithm::Mtree; "uppercase")]
    #[test_case("MTree", Algorithm::Mtree; "mixed case")]
    fn test_algorithm_parse(input: &str, expected: Algorithm) {
        assert_eq!(input.parse::<Algorithm>().ok(), Some(expected));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("IVF".parse::<Algorithm>().is_err());
        assert!("dot".parse::<Distance>().is_err());
        assert!("F16".parse::<VectorType>().is_err());
        assert!("insert".parse::<UpsertMode>().is_err());
    }

    #[test]
    fn test_display_keywords() {
        assert_eq!(Distance::Euclidean.to_string(), "EUCLIDEAN");
        assert_eq!(VectorType::I16.to_string(), "I16");
        assert_eq!(UpsertMode::Merge.to_string(), "MERGE");
    }

    #[test]
    fn test_serde_roundtrip_through_keyword() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            distance: Distance,
            mode: UpsertMode,
        }

        let holder: Holder =
            toml::from_str("distance = \"manhattan\"\nmode = \"MERGE\"").expect("parse toml");
        assert_eq!(holder.distance, Distance::Manhattan);
        assert_eq!(holder.mode, UpsertMode::Merge);

        let rendered = toml::to_string(&holder).expect("serialize toml");
        assert!(rendered.contains("distance = \"MANHATTAN\""));
    }
}
