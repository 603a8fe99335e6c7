//! Ordered, application-defined level scales.
//!
//! Both styles (how much detail a unit renders) and statuses (what a caller may
//! see or do) are drawn from closed lists whose order is fixed at startup:
//!
//! ```text
//! styles:   TEXT < LINK < BUTTON < CELL < ROW < PAGE
//! statuses: PUBLIC < HUMAN < USER < EDITOR < STAFF < ADMINISTRATOR
//! ```
//!
//! A [`Scale`] owns one such list. Its levels ([`Style`], [`Status`]) are plain
//! ranks, so comparing them is comparing positions in the list. The first
//! status is always the minimum and is what an unauthenticated caller gets.
//!
//! # Example
//!
//! ```rust
//! use tessera_render::Levels;
//!
//! let levels = Levels::new(
//!     ["PUBLIC", "USER", "STAFF"],
//!     ["TEXT", "LINK", "PAGE"],
//! ).unwrap();
//!
//! let user = levels.status("USER").unwrap();
//! let staff = levels.status("STAFF").unwrap();
//! assert!(user < staff);
//! assert_eq!(levels.statuses().name(user), "USER");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{ConfigError, RenderError};

/// A position in an ordered [`Scale`].
pub trait Level: Copy + Ord + fmt::Debug {
    /// Scale name used in error messages (`"style"` or `"status"`).
    const KIND: &'static str;

    /// Builds the level at the given rank.
    fn from_rank(rank: usize) -> Self;

    /// Position of this level in its scale (0 is the lowest).
    fn rank(self) -> usize;
}

/// A rendering style: how much detail or markup a unit produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Style(usize);

/// A caller privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(usize);

impl Status {
    /// The lowest status of every scale, assigned to unauthenticated callers.
    pub const LOWEST: Status = Status(0);
}

impl Level for Style {
    const KIND: &'static str = "style";

    fn from_rank(rank: usize) -> Self {
        Style(rank)
    }

    fn rank(self) -> usize {
        self.0
    }
}

impl Level for Status {
    const KIND: &'static str = "status";

    fn from_rank(rank: usize) -> Self {
        Status(rank)
    }

    fn rank(self) -> usize {
        self.0
    }
}

/// An ordered closed list of level names.
#[derive(Clone)]
pub struct Scale<L> {
    names: Vec<String>,
    ranks: HashMap<String, usize>,
    _level: PhantomData<fn() -> L>,
}

impl<L: Level> Scale<L> {
    /// Builds a scale from names listed lowest first.
    ///
    /// Fails on an empty list or a repeated name.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigError::EmptyScale(L::KIND));
        }

        let mut ranks = HashMap::with_capacity(names.len());
        for (rank, name) in names.iter().enumerate() {
            if ranks.insert(name.clone(), rank).is_some() {
                return Err(ConfigError::DuplicateLevel {
                    kind: L::KIND,
                    name: name.clone(),
                });
            }
        }

        Ok(Self {
            names,
            ranks,
            _level: PhantomData,
        })
    }

    /// Looks up a level by name.
    pub fn get(&self, name: &str) -> Option<L> {
        self.ranks.get(name).copied().map(L::from_rank)
    }

    /// Looks up a level by name, failing with [`RenderError::UnknownLevel`].
    pub fn require(&self, name: &str) -> Result<L, RenderError> {
        self.get(name).ok_or_else(|| RenderError::UnknownLevel {
            kind: L::KIND,
            name: name.to_string(),
        })
    }

    /// Looks up a level by rank.
    pub fn at(&self, rank: usize) -> Option<L> {
        (rank < self.names.len()).then(|| L::from_rank(rank))
    }

    /// Returns the configured name of a level.
    ///
    /// Levels from a different (longer) scale render as `"?"`.
    pub fn name(&self, level: L) -> &str {
        self.names.get(level.rank()).map(String::as_str).unwrap_or("?")
    }

    /// The lowest level.
    pub fn min(&self) -> L {
        L::from_rank(0)
    }

    /// The highest level.
    pub fn max(&self) -> L {
        L::from_rank(self.names.len() - 1)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: a scale has at least one level.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates levels lowest first.
    pub fn iter(&self) -> impl Iterator<Item = (L, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(rank, name)| (L::from_rank(rank), name.as_str()))
    }

    /// Resolves a list of names into levels.
    pub fn require_all<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<L>, RenderError> {
        names.into_iter().map(|name| self.require(name)).collect()
    }
}

impl<L: Level> fmt::Debug for Scale<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scale")
            .field("kind", &L::KIND)
            .field("names", &self.names)
            .finish()
    }
}

/// The two scales a site is configured with.
#[derive(Debug, Clone)]
pub struct Levels {
    statuses: Scale<Status>,
    styles: Scale<Style>,
}

impl Levels {
    /// Builds both scales from names listed lowest first.
    pub fn new<S1, S2>(
        statuses: impl IntoIterator<Item = S1>,
        styles: impl IntoIterator<Item = S2>,
    ) -> Result<Self, ConfigError>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Ok(Self {
            statuses: Scale::new(statuses)?,
            styles: Scale::new(styles)?,
        })
    }

    /// The status scale.
    pub fn statuses(&self) -> &Scale<Status> {
        &self.statuses
    }

    /// The style scale.
    pub fn styles(&self) -> &Scale<Style> {
        &self.styles
    }

    /// Looks up a status by name.
    pub fn status(&self, name: &str) -> Result<Status, RenderError> {
        self.statuses.require(name)
    }

    /// Looks up a style by name.
    pub fn style(&self, name: &str) -> Result<Style, RenderError> {
        self.styles.require(name)
    }

    /// Statuses a caller may switch to, lowest first, up to `maximum`.
    pub fn status_choices(&self, maximum: Status) -> Vec<(Status, &str)> {
        self.statuses
            .iter()
            .take_while(|(status, _)| *status <= maximum)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Levels {
        Levels::new(
            ["PUBLIC", "USER", "STAFF", "ADMINISTRATOR"],
            ["TEXT", "LINK", "BUTTON", "CELL", "PAGE"],
        )
        .unwrap()
    }

    #[test]
    fn ranks_follow_list_order() {
        let levels = levels();
        let text = levels.style("TEXT").unwrap();
        let cell = levels.style("CELL").unwrap();
        assert!(text < cell);
        assert_eq!(cell.rank(), 3);
        assert_eq!(levels.styles().name(cell), "CELL");
    }

    #[test]
    fn lowest_status_is_first_listed() {
        let levels = levels();
        assert_eq!(levels.statuses().min(), Status::LOWEST);
        assert_eq!(levels.statuses().name(Status::LOWEST), "PUBLIC");
        assert_eq!(levels.statuses().name(levels.statuses().max()), "ADMINISTRATOR");
    }

    #[test]
    fn empty_scale_is_rejected() {
        let err = Scale::<Style>::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyScale("style")));
    }

    #[test]
    fn duplicate_level_is_rejected() {
        let err = Scale::<Status>::new(["PUBLIC", "USER", "PUBLIC"]).unwrap_err();
        match err {
            ConfigError::DuplicateLevel { kind, name } => {
                assert_eq!(kind, "status");
                assert_eq!(name, "PUBLIC");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_name_fails() {
        let levels = levels();
        let err = levels.status("ROOT").unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownLevel {
                kind: "status",
                name: "ROOT".into()
            }
        );
    }

    #[test]
    fn status_choices_stop_at_maximum() {
        let levels = levels();
        let staff = levels.status("STAFF").unwrap();
        let names: Vec<&str> = levels
            .status_choices(staff)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(names, vec!["PUBLIC", "USER", "STAFF"]);
    }

    #[test]
    fn at_checks_bounds() {
        let levels = levels();
        assert_eq!(levels.styles().at(4), levels.style("PAGE").ok());
        assert_eq!(levels.styles().at(5), None);
    }
}
