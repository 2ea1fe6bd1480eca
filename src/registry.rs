//! # Scheme Registry
//!
//! Ordered list of [`InputScheme`]s consulted first-match-wins.
//!
//! ## Process-wide vs. local
//!
//! [`register_input_scheme`] appends to a process-wide registry that backs
//! [`Input::from_url`] and [`Input::from_attrs`]. Register every scheme at
//! start-up, before the first lookup: registration order decides precedence
//! and is not meant to change while lookups run.
//!
//! A local [`Registry`] behaves identically and is what tests and embedders
//! with their own scheme set should use.
//!
//! ```rust
//! use inputfs::{FetchError, Registry};
//!
//! let registry = Registry::new();
//! assert!(matches!(
//!     registry.input_from_url("github:owner/repo"),
//!     Err(FetchError::NoMatchingScheme { .. })
//! ));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::{Attrs, FetchError, Input, InputScheme};

static REGISTRY: RwLock<Registry> = parking_lot::const_rwlock(Registry::new());

/// Append `scheme` to the process-wide registry.
///
/// Schemes registered earlier take precedence over later ones. Duplicates
/// are not detected.
pub fn register_input_scheme(scheme: Arc<dyn InputScheme>) {
    REGISTRY.write().register(scheme);
}

/// Copy of the process-wide registry.
///
/// Lookups run against the copy so a scheme may itself resolve inputs
/// without re-entering the lock.
pub(crate) fn snapshot() -> Registry {
    REGISTRY.read().clone()
}

/// An ordered set of input schemes.
#[derive(Clone, Default)]
pub struct Registry {
    schemes: Vec<Arc<dyn InputScheme>>,
}

impl Registry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            schemes: Vec::new(),
        }
    }

    /// Append `scheme`; it is consulted after every scheme already present.
    pub fn register(&mut self, scheme: Arc<dyn InputScheme>) {
        debug!(
            scheme = scheme.scheme_name(),
            position = self.schemes.len(),
            "registered input scheme"
        );
        self.schemes.push(scheme);
    }

    /// Registered schemes in precedence order.
    pub fn schemes(&self) -> &[Arc<dyn InputScheme>] {
        &self.schemes
    }

    /// Parse `url` and recognize it.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse
    /// - see [`input_from_parsed_url`](Self::input_from_parsed_url)
    pub fn input_from_url(&self, url: &str) -> Result<Input, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        self.input_from_parsed_url(&parsed)
    }

    /// Recognize `url` with the first scheme that accepts it.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NoMatchingScheme`] if every scheme declines
    /// - the first error a scheme raises; later schemes are not consulted
    /// - [`FetchError::MissingAttribute`] / [`FetchError::InvalidAttribute`]
    ///   if the recognized input has malformed shared attributes
    pub fn input_from_parsed_url(&self, url: &Url) -> Result<Input, FetchError> {
        for scheme in &self.schemes {
            if let Some(input) = scheme.input_from_url(url)? {
                trace!(url = %url, scheme = scheme.scheme_name(), "url recognized");
                return fixup(scheme, input);
            }
        }
        debug!(url = %url, "no input scheme recognized url");
        Err(FetchError::NoMatchingScheme {
            input: url.to_string(),
        })
    }

    /// Recognize `attrs` with the first scheme that accepts them.
    ///
    /// Errors as for [`input_from_parsed_url`](Self::input_from_parsed_url).
    pub fn input_from_attrs(&self, attrs: Attrs) -> Result<Input, FetchError> {
        for scheme in &self.schemes {
            if let Some(input) = scheme.input_from_attrs(&attrs)? {
                trace!(%attrs, scheme = scheme.scheme_name(), "attributes recognized");
                return fixup(scheme, input);
            }
        }
        debug!(%attrs, "no input scheme recognized attributes");
        Err(FetchError::NoMatchingScheme {
            input: attrs.to_json_string(),
        })
    }
}

fn fixup(scheme: &Arc<dyn InputScheme>, input: Input) -> Result<Input, FetchError> {
    let input = input.bind(scheme);
    input.validate()?;
    Ok(input)
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.schemes.iter().map(|s| s.scheme_name()))
            .finish()
    }
}
