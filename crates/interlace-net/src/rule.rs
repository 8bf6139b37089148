use std::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::agent::Kind;
use crate::error::RuleError;
use crate::interaction::Interaction;

/// What a rule did with the pair it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    /// The rule rewrote the net. The interacting agents are consumed.
    Rewrote,
    /// The rule has no case for the partner's kind and left the net alone.
    Declined,
}

/// The rewrite procedure of one agent kind.
///
/// A rule is invoked with an [`Interaction`] in which `me()` is an agent of the kind the
/// rule is registered for and `partner()` is the agent on the other end of the principal
/// wire. It inspects the partner's kind and either rewrites the neighbourhood or returns
/// [`Fired::Declined`]. A declining rule must not write anything.
///
/// Any `Fn(&mut Interaction) -> Result<Fired, RuleError>` is a rule:
///
/// ```rust
/// use interlace_net::{Fired, Interaction, Kind, RuleBook, RuleError};
///
/// const PING: Kind = Kind::new("ping");
///
/// let rules = RuleBook::new().with(PING, |cx: &mut Interaction<'_>| -> Result<Fired, RuleError> {
///     if cx.partner_kind()? != PING {
///         return Ok(Fired::Declined);
///     }
///     Ok(Fired::Rewrote)
/// });
/// assert!(rules.get(PING).is_some());
/// ```
pub trait Rule: Send + Sync {
    fn interact(&self, cx: &mut Interaction<'_>) -> Result<Fired, RuleError>;
}

impl<F> Rule for F
where
    F: Fn(&mut Interaction<'_>) -> Result<Fired, RuleError> + Send + Sync,
{
    fn interact(&self, cx: &mut Interaction<'_>) -> Result<Fired, RuleError> {
        self(cx)
    }
}

/// Registry mapping each agent kind to its rule.
#[derive(Clone, Default)]
pub struct RuleBook {
    rules: FxHashMap<Kind, Arc<dyn Rule>>,
}

impl RuleBook {
    /// An empty book. Every interaction declines until rules are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding the built-in tensor/par vocabulary.
    pub fn with_builtins() -> Self {
        let mut book = Self::new();
        crate::builtin::register(&mut book);
        book
    }

    /// Registers (or replaces) the rule for `kind`.
    pub fn insert(&mut self, kind: Kind, rule: impl Rule + 'static) -> &mut Self {
        if self.rules.insert(kind, Arc::new(rule)).is_some() {
            log::debug!("Replaced rule for kind {kind}");
        }
        self
    }

    /// Builder form of [`insert`](RuleBook::insert).
    pub fn with(mut self, kind: Kind, rule: impl Rule + 'static) -> Self {
        self.insert(kind, rule);
        self
    }

    pub fn get(&self, kind: Kind) -> Option<&Arc<dyn Rule>> {
        self.rules.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = self.rules.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for RuleBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBook").field("kinds", &self.kinds()).finish()
    }
}
