//! Error types for folio content and configuration.

use thiserror::Error;

/// Errors raised while loading configuration or validating content records.
///
/// None of these are fatal to a page: components that hit one render a short notice in place of
/// their normal output and the rest of the page keeps rendering.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown book state {0:?}")]
    UnknownState(String),

    #[error("invalid link {link:?}: {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
