//! Price source trait and adapter error types.
//!
//! A [`PriceSource`] turns an ordered list of [`AssetId`]s into a
//! [`PriceBook`] plus the [`FetchMeta`] of the call that produced it. Assets a
//! source cannot translate, or that the upstream omits, are skipped; a call
//! only fails when the upstream is unreachable, answers with a non-2xx status,
//! returns an unparseable body, or yields no usable price at all.
//!
//! # Example
//!
//! ```rust,ignore
//! use coinsnap_core::{AssetId, CoinGeckoAdapter, PriceSource};
//!
//! async fn spot(adapter: &CoinGeckoAdapter) -> Result<(), coinsnap_core::SourceError> {
//!     let assets = vec![AssetId::parse("bitcoin")?];
//!     let prices = adapter.get_prices(&assets).await?;
//!     for quote in prices.quotes.iter() {
//!         println!("{}: ${}", quote.asset, quote.price_usd);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{AssetId, FetchMeta, PriceBook, ValidationError};

/// Prices returned by one source call.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePrices {
    pub quotes: PriceBook,
    pub meta: FetchMeta,
}

pub type PricesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SourcePrices, SourceError>> + Send + 'a>>;

/// Capability shared by every upstream integration.
pub trait PriceSource: Send + Sync {
    /// Stable lowercase name recorded in the `source` column.
    fn name(&self) -> &'static str;

    fn get_prices<'a>(&'a self, assets: &'a [AssetId]) -> PricesFuture<'a>;
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure: DNS, connect, timeout, body read.
    Unavailable,
    /// Upstream answered with a non-2xx status.
    UpstreamStatus,
    /// Body could not be decoded.
    Parse,
    /// Upstream answered but no requested asset had a usable price.
    Empty,
    InvalidRequest,
}

impl SourceErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "source.unavailable",
            Self::UpstreamStatus => "source.upstream_status",
            Self::Parse => "source.parse",
            Self::Empty => "source.empty",
            Self::InvalidRequest => "source.invalid_request",
        }
    }
}

/// Structured source error absorbed by the failover loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    http_status: Option<u16>,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn upstream_status(source: &str, status: u16) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamStatus,
            message: format!("{source} upstream returned status {status}"),
            http_status: Some(status),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn empty(source: &str) -> Self {
        Self {
            kind: SourceErrorKind::Empty,
            message: format!("{source} returned no prices"),
            http_status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            http_status: None,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub const fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}
