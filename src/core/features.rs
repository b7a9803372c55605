//! URL Feature Extraction
//!
//! Maps a URL string to the fixed-order numeric vector the classifiers are
//! trained on. The layout is declared once in [`FEATURE_SCHEMA`]; training
//! columns, the persisted preprocessor and the model artifact all carry the
//! schema names, so any drift between trainer and service is detected on load.
//!
//! Several slots repeat an earlier measurement (see the `dup of` notes). The
//! persisted models were fit against this exact layout, so the duplicates stay
//! until the next retraining collapses them.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use super::url_parts::UrlParts;

/// Number of slots in every feature vector
pub const FEATURE_COUNT: usize = 33;

/// What a single slot measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Characters in the netloc
    DomainLength,
    /// Characters in the path
    PathLength,
    /// Characters in the last `/`-segment of the path
    FileLength,
    /// Non-overlapping occurrences of a literal in the whole URL
    Count(&'static str),
    /// ASCII digits in the whole URL
    Digits,
    /// ASCII letters in the whole URL
    Letters,
    /// 1 when the netloc minus dots is a non-empty run of digits
    IpLiteral,
    /// Characters in the whole URL
    UrlLength,
    /// Distinct query keys with a non-empty value
    QueryKeys,
    /// Segments of the path split on `/`
    PathSegments,
    /// `/` count minus one (negative when the URL has no `/`)
    SlashesMinusOne,
}

/// A named slot of the feature vector
#[derive(Debug, Clone, Copy)]
pub struct FeatureDef {
    pub name: &'static str,
    pub measure: Measure,
}

const fn slot(name: &'static str, measure: Measure) -> FeatureDef {
    FeatureDef { name, measure }
}

/// Ordered feature layout shared by training and inference.
pub static FEATURE_SCHEMA: [FeatureDef; FEATURE_COUNT] = [
    slot("hostname_length", Measure::DomainLength),
    slot("path_length", Measure::PathLength),
    slot("fd_length", Measure::FileLength),
    slot("count_of_dash", Measure::Count("-")),
    slot("count_of_at", Measure::Count("@")),
    slot("count_of_question", Measure::Count("?")),
    slot("count_of_percent", Measure::Count("%")),
    slot("count_of_dot", Measure::Count(".")),
    slot("count_of_equal", Measure::Count("=")),
    slot("count_of_http", Measure::Count("http")),
    slot("count_of_https", Measure::Count("https")),
    slot("count_of_www", Measure::Count("www")),
    slot("count_of_digits", Measure::Digits),
    slot("count_of_letters", Measure::Letters),
    slot("count_of_dir", Measure::Count("/")),
    slot("use_of_ip", Measure::IpLiteral),
    slot("qty_hyphen_url", Measure::Count("-")), // dup of count_of_dash
    slot("length_url", Measure::UrlLength),
    slot("qty_tilde_url", Measure::Count("~")),
    slot("qty_dot_url", Measure::Count(".")), // dup of count_of_dot
    slot("qty_percent_url", Measure::Count("%")), // dup of count_of_percent
    slot("length_domain", Measure::DomainLength), // dup of hostname_length
    slot("params_length", Measure::QueryKeys),
    slot("qty_and_params", Measure::Count("&")),
    slot("qty_hyphens_params", Measure::Count("-")), // dup of count_of_dash
    slot("directory_length", Measure::PathSegments),
    slot("qty_equal_params", Measure::Count("=")), // dup of count_of_equal
    slot("qty_equal_url", Measure::Count("=")), // dup of count_of_equal
    slot("qty_slash_url", Measure::Count("/")), // dup of count_of_dir
    slot("qty_slash_directory", Measure::SlashesMinusOne),
    slot("file_length", Measure::FileLength), // dup of fd_length
    slot("qty_and_url", Measure::Count("&")), // dup of qty_and_params
    slot("qty_dot_params", Measure::Count(".")), // dup of count_of_dot
];

/// Schema column names in vector order
pub fn feature_names() -> Vec<&'static str> {
    FEATURE_SCHEMA.iter().map(|f| f.name).collect()
}

/// Position of a named slot
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|f| f.name == name)
}

impl Measure {
    fn eval(&self, url: &str, parts: &UrlParts) -> i64 {
        let n = match self {
            Measure::DomainLength => parts.netloc.chars().count(),
            Measure::PathLength => parts.path.chars().count(),
            Measure::FileLength => parts.file_name().chars().count(),
            Measure::Count(pattern) => url.matches(*pattern).count(),
            Measure::Digits => url.chars().filter(|c| c.is_ascii_digit()).count(),
            Measure::Letters => url.chars().filter(|c| c.is_ascii_alphabetic()).count(),
            Measure::IpLiteral => is_ip_literal(&parts.netloc) as usize,
            Measure::UrlLength => url.chars().count(),
            Measure::QueryKeys => distinct_query_keys(&parts.query),
            Measure::PathSegments => parts.path.split('/').count(),
            Measure::SlashesMinusOne => return url.matches('/').count() as i64 - 1,
        };
        n as i64
    }
}

fn is_ip_literal(domain: &str) -> bool {
    let mut digits = domain.chars().filter(|c| *c != '.').peekable();
    digits.peek().is_some() && digits.all(|c| c.is_ascii_digit())
}

fn distinct_query_keys(query: &str) -> usize {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, _)| key.into_owned())
        .collect::<HashSet<_>>()
        .len()
}

/// Fixed-length feature vector for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector([i64; FEATURE_COUNT]);

impl FeatureVector {
    /// Raw values in schema order
    pub fn values(&self) -> &[i64; FEATURE_COUNT] {
        &self.0
    }

    /// Value of a named slot
    pub fn get(&self, name: &str) -> Option<i64> {
        feature_index(name).map(|i| self.0[i])
    }

    /// Model input row
    pub fn to_row(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }

    /// (name, value) pairs in schema order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        FEATURE_SCHEMA.iter().zip(self.0.iter()).map(|(f, &v)| (f.name, v))
    }
}

impl TryFrom<Vec<i64>> for FeatureVector {
    type Error = usize;

    /// Fails with the offending length when it does not match the schema.
    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        let len = values.len();
        <[i64; FEATURE_COUNT]>::try_from(values)
            .map(FeatureVector)
            .map_err(|_| len)
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", values.join(", "))
    }
}

/// Compute the feature vector of a URL. Pure and total.
pub fn extract(url: &str) -> FeatureVector {
    let parts = UrlParts::split(url);
    let mut values = [0i64; FEATURE_COUNT];
    for (value, def) in values.iter_mut().zip(FEATURE_SCHEMA.iter()) {
        *value = def.measure.eval(url, &parts);
    }
    FeatureVector(values)
}
