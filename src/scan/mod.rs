//! Location scanners
//!
//! Producers enumerate a root into the bounded work queue for the copy
//! phase; collectors enumerate into maps for verification. Both backends
//! apply the same relative-name rules, so records meet identically shaped
//! keys no matter where they came from.

pub mod fs;
pub mod object;

/// Names that never enter the pipeline: the root itself (which resolves to
/// an empty relative name, or a bare `/` once the directory suffix is
/// appended) and anything `.`/`..`-shaped.
pub(crate) fn skip_name(name: &str) -> bool {
    name.is_empty()
        || name == "/"
        || name == "."
        || name == ".."
        || name.starts_with("./")
        || name.starts_with("../")
}
