//! # Input Schemes
//!
//! The plugin contract every fetcher implements.
//!
//! A scheme recognizes URLs and/or attribute bags and, for inputs it
//! recognized, knows how to produce an accessor over their content. Schemes
//! are registered once at start-up (see [`register_input_scheme`]) and
//! consulted in registration order.
//!
//! Only [`scheme_name`](InputScheme::scheme_name),
//! [`input_from_url`](InputScheme::input_from_url),
//! [`input_from_attrs`](InputScheme::input_from_attrs) and
//! [`get_accessor`](InputScheme::get_accessor) are required; everything else
//! has a conservative default.
//!
//! [`register_input_scheme`]: crate::register_input_scheme

use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::{CanonPath, FetchError, Input, InputAccessor, Store};

/// A kind of fetcher.
///
/// Recognizer methods return unbound inputs built with [`Input::new`]; the
/// registry binds the scheme that recognized them.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use url::Url;
/// use inputfs::{
///     Attrs, CanonPath, FetchError, Input, InputAccessor, InputScheme, MemoryInputAccessor,
///     Registry, Store,
/// };
///
/// struct Generated;
///
/// impl InputScheme for Generated {
///     fn scheme_name(&self) -> &str {
///         "generated"
///     }
///
///     fn input_from_url(&self, url: &Url) -> Result<Option<Input>, FetchError> {
///         if url.scheme() != "generated" {
///             return Ok(None);
///         }
///         let mut attrs = Attrs::new();
///         attrs.insert("type", "generated");
///         Ok(Some(Input::new(attrs)))
///     }
///
///     fn input_from_attrs(&self, attrs: &Attrs) -> Result<Option<Input>, FetchError> {
///         Ok((attrs.maybe_get_str("type")? == Some("generated")).then(|| Input::new(attrs.clone())))
///     }
///
///     fn get_accessor(
///         &self,
///         _store: &dyn Store,
///         input: &Input,
///     ) -> Result<(Arc<dyn InputAccessor>, Input), FetchError> {
///         let accessor = MemoryInputAccessor::new();
///         accessor.add_file(CanonPath::new("/flake.nix"), "{}");
///         Ok((Arc::new(accessor), input.clone()))
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.register(Arc::new(Generated));
/// let input = registry.input_from_url("generated:x").unwrap();
/// assert_eq!(input.get_type().unwrap(), "generated");
/// ```
pub trait InputScheme: Send + Sync {
    /// Short name used in diagnostics.
    fn scheme_name(&self) -> &str;

    /// Recognize a parsed URL. `Ok(None)` means "not mine".
    fn input_from_url(&self, url: &Url) -> Result<Option<Input>, FetchError>;

    /// Recognize an attribute bag. `Ok(None)` means "not mine".
    fn input_from_attrs(&self, attrs: &crate::Attrs) -> Result<Option<Input>, FetchError>;

    /// Render `input` back to a URL.
    fn to_url(&self, input: &Input) -> Result<Url, FetchError> {
        Err(FetchError::UnsupportedOperation {
            operation: "convert to a URL",
            input: input.to_attrs_string(),
        })
    }

    /// Return a copy of `input` with the given branch/tag and revision.
    ///
    /// The default only supports the no-op case.
    fn apply_overrides(
        &self,
        input: &Input,
        git_ref: Option<&str>,
        rev: Option<&str>,
    ) -> Result<Input, FetchError> {
        if git_ref.is_some() {
            return Err(FetchError::UnsupportedOperation {
                operation: "set the branch or tag name of",
                input: input.to_attrs_string(),
            });
        }
        if rev.is_some() {
            return Err(FetchError::UnsupportedOperation {
                operation: "change the revision of",
                input: input.to_attrs_string(),
            });
        }
        Ok(input.clone())
    }

    /// Check out a working copy of `input` into `dest_dir`.
    fn clone_to(&self, input: &Input, _dest_dir: &Path) -> Result<(), FetchError> {
        Err(FetchError::UnsupportedOperation {
            operation: "clone",
            input: input.to_attrs_string(),
        })
    }

    /// Write `contents` to `path` in the source `input` was fetched from,
    /// committing with `commit_msg` if the scheme is versioned.
    fn put_file(
        &self,
        input: &Input,
        _path: &CanonPath,
        _contents: &[u8],
        _commit_msg: Option<&str>,
    ) -> Result<(), FetchError> {
        Err(FetchError::UnsupportedOperation {
            operation: "write a file into",
            input: input.to_attrs_string(),
        })
    }

    /// Produce an accessor over the content of `input`, plus the input as
    /// actually fetched (typically locked).
    fn get_accessor(
        &self,
        store: &dyn Store,
        input: &Input,
    ) -> Result<(Arc<dyn InputAccessor>, Input), FetchError>;

    /// Whether `input` is fetched directly rather than through an indirection
    /// such as a registry.
    fn is_direct(&self, _input: &Input) -> bool {
        true
    }

    /// Whether `input` pins its content (revision or content hash).
    fn is_locked(&self, _input: &Input) -> bool {
        false
    }

    /// The relative path of a relative path-like input, if it is one.
    fn is_relative(&self, _input: &Input) -> Option<String> {
        None
    }

    /// Stable content identity of a locked input.
    ///
    /// Defaults to the SRI `narHash` attribute when present.
    fn get_fingerprint(&self, _store: &dyn Store, input: &Input) -> Option<String> {
        input.get_nar_hash().ok().flatten().map(|h| h.to_sri())
    }

    /// Verify that `fetched` honors every lock `specified` carried.
    fn check_locks(&self, specified: &Input, fetched: &Input) -> Result<(), FetchError> {
        check_locks(specified, fetched)
    }
}

/// The standard lock check.
///
/// Each of `narHash`, `rev`, `revCount` and `lastModified` present in
/// `specified` must be present with the same value in `fetched`.
///
/// # Errors
///
/// - [`FetchError::LockMismatch`] naming the first attribute that differs
/// - [`FetchError::InvalidAttribute`] if either input holds a malformed value
pub fn check_locks(specified: &Input, fetched: &Input) -> Result<(), FetchError> {
    let sri = |h: crate::NarHash| h.to_sri();

    compare(
        specified,
        "narHash",
        specified.get_nar_hash()?.map(sri),
        fetched.get_nar_hash()?.map(sri),
    )?;
    compare(
        specified,
        "rev",
        specified.get_rev()?.map(str::to_string),
        fetched.get_rev()?.map(str::to_string),
    )?;
    compare(
        specified,
        "revCount",
        specified.get_rev_count()?.map(|n| n.to_string()),
        fetched.get_rev_count()?.map(|n| n.to_string()),
    )?;
    compare(
        specified,
        "lastModified",
        specified.get_last_modified()?.map(|n| n.to_string()),
        fetched.get_last_modified()?.map(|n| n.to_string()),
    )
}

fn compare(
    specified: &Input,
    attribute: &'static str,
    expected: Option<String>,
    got: Option<String>,
) -> Result<(), FetchError> {
    match expected {
        Some(expected) if got.as_ref() != Some(&expected) => Err(FetchError::LockMismatch {
            input: specified.to_string(),
            attribute,
            expected,
            got: got.unwrap_or_else(|| "<none>".to_string()),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attrs;

    fn input(pairs: &[(&str, crate::Attr)]) -> Input {
        Input::new(pairs.iter().cloned().collect())
    }

    struct Bare;

    impl InputScheme for Bare {
        fn scheme_name(&self) -> &str {
            "bare"
        }

        fn input_from_url(&self, _url: &Url) -> Result<Option<Input>, FetchError> {
            Ok(None)
        }

        fn input_from_attrs(&self, _attrs: &Attrs) -> Result<Option<Input>, FetchError> {
            Ok(None)
        }

        fn get_accessor(
            &self,
            _store: &dyn Store,
            input: &Input,
        ) -> Result<(Arc<dyn InputAccessor>, Input), FetchError> {
            Err(FetchError::NotImplemented {
                operation: "get_accessor",
                path: input.to_string(),
            })
        }
    }

    #[test]
    fn defaults_are_conservative() {
        let i = input(&[("type", "bare".into())]);
        assert!(Bare.is_direct(&i));
        assert!(!Bare.is_locked(&i));
        assert_eq!(Bare.is_relative(&i), None);
        assert!(matches!(
            Bare.to_url(&i),
            Err(FetchError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn clone_and_put_file_are_unsupported_by_default() {
        let i = input(&[("type", "bare".into())]);
        assert!(matches!(
            Bare.clone_to(&i, Path::new("/tmp/checkout")),
            Err(FetchError::UnsupportedOperation { operation: "clone", .. })
        ));
        let err = Bare
            .put_file(&i, &CanonPath::new("/flake.lock"), b"{}", Some("update lock"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"cannot write a file into input '{"type":"bare"}'"#
        );
    }

    #[test]
    fn default_overrides_only_allow_noop() {
        let i = input(&[("type", "bare".into())]);
        assert_eq!(Bare.apply_overrides(&i, None, None).unwrap(), i);
        assert!(Bare.apply_overrides(&i, Some("main"), None).is_err());
        assert!(Bare.apply_overrides(&i, None, Some("abc")).is_err());
    }

    #[test]
    fn check_locks_passes_when_nothing_specified() {
        let specified = input(&[("type", "bare".into())]);
        let fetched = input(&[("type", "bare".into()), ("rev", "abc".into())]);
        assert!(check_locks(&specified, &fetched).is_ok());
    }

    #[test]
    fn check_locks_detects_each_attribute() {
        let cases: [(&str, crate::Attr, crate::Attr); 3] = [
            ("rev", "abc".into(), "def".into()),
            ("revCount", 1u64.into(), 2u64.into()),
            ("lastModified", 10u64.into(), 11u64.into()),
        ];
        for (name, expected, got) in cases {
            let specified = input(&[(name, expected.clone())]);
            let fetched = input(&[(name, got)]);
            assert!(matches!(
                check_locks(&specified, &fetched),
                Err(FetchError::LockMismatch { attribute, .. }) if attribute == name
            ));
            assert!(check_locks(&specified, &input(&[(name, expected)])).is_ok());
        }
    }

    #[test]
    fn check_locks_reports_missing_value() {
        let hash = crate::NarHash::compute(b"x").to_sri();
        let specified = input(&[("narHash", hash.as_str().into())]);
        let err = check_locks(&specified, &input(&[])).unwrap_err();
        assert!(matches!(
            err,
            FetchError::LockMismatch { attribute: "narHash", ref got, .. } if got == "<none>"
        ));
    }
}
