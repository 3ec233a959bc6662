//! Access to the children of a host compound.
//!
//! Depending on the host build, the public accessor to a compound's tags may not be
//! usable, in which case its internal mapping is read directly. The working path is
//! resolved on first use and then reused for the lifetime of the [`CompoundAccess`].

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, warn};

use crate::host::{HostCompound, HostTag};

use super::ConvertError;


/// The path used to reach the children of host compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    /// The public tags accessor works.
    Primary,
    /// The public accessor failed, the internal mapping is read instead.
    Secondary,
}

/// One way of listing the children of a host compound.
pub trait CompoundPath: Send + Sync {

    /// Short description of this path for logs.
    fn describe(&self) -> &str;

    /// List the immediate children of the compound, in no particular order.
    fn children<'a>(&self, compound: &'a HostCompound) -> Result<Vec<&'a dyn HostTag>, AccessPathError>;

}

/// Primary path, through the public [`HostCompound::tags`] accessor.
#[derive(Debug, Default)]
pub struct TagsAccessor;

impl CompoundPath for TagsAccessor {

    fn describe(&self) -> &str {
        "HostCompound::tags"
    }

    fn children<'a>(&self, compound: &'a HostCompound) -> Result<Vec<&'a dyn HostTag>, AccessPathError> {
        Ok(compound.tags().collect())
    }

}

/// Secondary path, reading the compound's internal mapping.
#[derive(Debug, Default)]
pub struct MapField;

impl CompoundPath for MapField {

    fn describe(&self) -> &str {
        "HostCompound::map"
    }

    fn children<'a>(&self, compound: &'a HostCompound) -> Result<Vec<&'a dyn HostTag>, AccessPathError> {
        Ok(compound.map().values().map(|tag| &**tag).collect())
    }

}


/// Strategy resolving which [`CompoundPath`] works, the resolution is done once and
/// kept afterward. Concurrent first uses may both try the paths, the first resolved
/// path is kept.
pub struct CompoundAccess {
    primary: Box<dyn CompoundPath>,
    secondary: Box<dyn CompoundPath>,
    resolved: OnceCell<AccessPath>,
}

impl CompoundAccess {

    pub fn new(primary: Box<dyn CompoundPath>, secondary: Box<dyn CompoundPath>) -> Self {
        Self {
            primary,
            secondary,
            resolved: OnceCell::new(),
        }
    }

    /// The process-wide access strategy, using the default paths.
    pub fn global() -> &'static CompoundAccess {
        static GLOBAL: Lazy<CompoundAccess> = Lazy::new(CompoundAccess::default);
        &GLOBAL
    }

    /// Return the resolved path, none if no compound has been successfully accessed yet.
    #[inline]
    pub fn resolved(&self) -> Option<AccessPath> {
        self.resolved.get().copied()
    }

    /// List the immediate children of the given host compound. The order of returned
    /// children is unspecified.
    pub fn children_of<'a>(&self, compound: &'a HostCompound) -> Result<Vec<&'a dyn HostTag>, ConvertError> {

        match self.resolved() {
            Some(AccessPath::Primary) => return self.primary.children(compound)
                .map_err(ConvertError::AccessUnavailable),
            Some(AccessPath::Secondary) => return self.secondary.children(compound)
                .map_err(ConvertError::AccessUnavailable),
            None => {}
        }

        let primary_err = match self.primary.children(compound) {
            Ok(children) => {
                self.resolve(AccessPath::Primary);
                return Ok(children);
            }
            Err(e) => e,
        };

        warn!("couldn't use {} ({primary_err}), reading {} directly from now on",
            self.primary.describe(), self.secondary.describe());

        match self.secondary.children(compound) {
            Ok(children) => {
                self.resolve(AccessPath::Secondary);
                Ok(children)
            }
            Err(e) => Err(ConvertError::AccessUnavailable(e)),
        }

    }

    fn resolve(&self, path: AccessPath) {
        // Another thread may have resolved it first, it found the same path.
        if self.resolved.set(path).is_ok() {
            debug!("compound access resolved to {path:?}");
        }
    }

}

impl Default for CompoundAccess {
    fn default() -> Self {
        Self::new(Box::new(TagsAccessor), Box::new(MapField))
    }
}


/// Error returned when a single compound path cannot be used.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessPathError {
    #[error("accessor not found")]
    NotFound,
    #[error("accessor not callable: {0}")]
    NotCallable(String),
}


#[cfg(test)]
mod tests {

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// A path that always fails and counts how many times it was called.
    struct FailingPath {
        calls: Arc<AtomicUsize>,
        error: AccessPathError,
    }

    impl CompoundPath for FailingPath {

        fn describe(&self) -> &str {
            "failing"
        }

        fn children<'a>(&self, _compound: &'a HostCompound) -> Result<Vec<&'a dyn HostTag>, AccessPathError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(self.error.clone())
        }

    }

    fn failing(error: AccessPathError) -> (Box<FailingPath>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(FailingPath { calls: Arc::clone(&calls), error }), calls)
    }

    fn sample() -> HostCompound {
        let mut comp = HostCompound::new("root");
        comp.set_int("a", 1);
        comp.set_int("b", 2);
        comp
    }

    fn names(children: &[&dyn HostTag]) -> Vec<String> {
        let mut names = children.iter().map(|tag| tag.name().to_string()).collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn primary_works() {

        let access = CompoundAccess::default();
        assert_eq!(access.resolved(), None);

        let comp = sample();
        let children = access.children_of(&comp).unwrap();
        assert_eq!(names(&children), ["a", "b"]);
        assert_eq!(access.resolved(), Some(AccessPath::Primary));

    }

    #[test]
    fn fallback_is_memoized() {

        let (primary, calls) = failing(AccessPathError::NotFound);
        let access = CompoundAccess::new(primary, Box::new(MapField));

        let comp = sample();
        let children = access.children_of(&comp).unwrap();
        assert_eq!(names(&children), ["a", "b"]);
        assert_eq!(access.resolved(), Some(AccessPath::Secondary));
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        for _ in 0..5 {
            let children = access.children_of(&comp).unwrap();
            assert_eq!(names(&children), ["a", "b"]);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);

    }

    #[test]
    fn both_paths_fail() {

        let (primary, primary_calls) = failing(AccessPathError::NotFound);
        let (secondary, secondary_calls) = failing(AccessPathError::NotCallable("private".to_string()));
        let access = CompoundAccess::new(primary, secondary);

        let comp = sample();
        let err = access.children_of(&comp).unwrap_err();
        assert!(matches!(err, ConvertError::AccessUnavailable(AccessPathError::NotCallable(_))));
        assert_eq!(access.resolved(), None);
        assert_eq!(primary_calls.load(Ordering::Relaxed), 1);
        assert_eq!(secondary_calls.load(Ordering::Relaxed), 1);

    }

    #[test]
    fn concurrent_first_use_agrees() {

        let (primary, _calls) = failing(AccessPathError::NotFound);
        let access = CompoundAccess::new(primary, Box::new(MapField));
        let comp = sample();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let children = access.children_of(&comp).unwrap();
                    assert_eq!(children.len(), 2);
                });
            }
        });

        assert_eq!(access.resolved(), Some(AccessPath::Secondary));

    }

    #[test]
    fn empty_compound() {
        let access = CompoundAccess::default();
        let comp = HostCompound::new("empty");
        assert!(access.children_of(&comp).unwrap().is_empty());
    }

}
