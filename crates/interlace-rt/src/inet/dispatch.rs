use interlace_net::{Fired, Net, Pair, RuleBook};

use crate::config::ScanMode;
use crate::error::RuntimeError;

/// What happened to a pair handed to the [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The pair was rewritten and the rescan queued `queued` new pairs.
    Rewrote { queued: usize },
    /// The rule had no case for the partner (or no rule exists for the kind). The net
    /// is unchanged.
    Declined,
    /// The pair stopped being an active pair before it could be claimed.
    Stale,
}

/// Runs one interaction: claim, rule, commit, rescan.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    net: &'a Net,
    rules: &'a RuleBook,
    scan: ScanMode,
}

impl<'a> Dispatcher<'a> {
    pub fn new(net: &'a Net, rules: &'a RuleBook, scan: ScanMode) -> Self {
        Self { net, rules, scan }
    }

    pub fn dispatch(&self, pair: Pair) -> Result<Dispatched, RuntimeError> {
        let Some(mut cx) = self.net.claim(pair)? else {
            log::warn!("Skipping stale pair {pair}");
            return Ok(Dispatched::Stale);
        };

        let kind = cx.kind(cx.me())?;
        let Some(rule) = self.rules.get(kind) else {
            log::trace!("No rule for kind `{kind}`, {pair} left as is");
            cx.release();
            return Ok(Dispatched::Declined);
        };

        match rule.interact(&mut cx) {
            Ok(Fired::Rewrote) => {
                let touched = cx.commit();
                let queued = match self.scan {
                    ScanMode::Full => self.net.scan(),
                    ScanMode::Touched => self.net.scan_agents(touched),
                };
                log::trace!("Rewrote {pair} ({kind}), {queued} new pairs");
                Ok(Dispatched::Rewrote { queued })
            }
            Ok(Fired::Declined) => {
                log::trace!("Rule for `{kind}` declined {pair}");
                cx.release();
                Ok(Dispatched::Declined)
            }
            Err(source) => {
                cx.release();
                Err(RuntimeError::RuleFailure { pair, kind, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlace_net::{builtin, Interaction, Kind, Port, RuleError};

    const ATOM: Kind = Kind::new("atom");
    const BROKEN: Kind = Kind::new("broken");

    fn broken(_: &mut Interaction<'_>) -> Result<Fired, RuleError> {
        Err(RuleError::failed("out of cheese"))
    }

    fn cut(net: &Net, left: Kind, right: Kind) -> Pair {
        let a = net.add_agent(left, builtin::ARITY);
        let b = net.add_agent(right, builtin::ARITY);
        net.connect(Port::principal(a), Port::principal(b)).unwrap();
        net.connect(Port::aux(a, 2), Port::aux(b, 2)).unwrap();
        net.connect(Port::aux(a, 3), Port::aux(b, 3)).unwrap();
        Pair::new(a, b)
    }

    #[test]
    fn rewrite_then_stale() {
        let net = Net::new();
        let rules = RuleBook::with_builtins();
        let pair = cut(&net, builtin::TENSOR, builtin::PAR);
        let dispatcher = Dispatcher::new(&net, &rules, ScanMode::Touched);
        assert_eq!(dispatcher.dispatch(pair), Ok(Dispatched::Rewrote { queued: 0 }));
        assert_eq!(dispatcher.dispatch(pair), Ok(Dispatched::Stale));
    }

    #[test]
    fn missing_rule_declines() {
        let net = Net::new();
        let rules = RuleBook::with_builtins();
        let pair = cut(&net, ATOM, builtin::PAR);
        let before = net.agents();
        let dispatcher = Dispatcher::new(&net, &rules, ScanMode::Full);
        assert_eq!(dispatcher.dispatch(pair), Ok(Dispatched::Declined));
        assert_eq!(net.agents(), before);
    }

    #[test]
    fn rule_errors_name_the_kind() {
        let net = Net::new();
        let rules = RuleBook::new().with(BROKEN, broken);
        let pair = cut(&net, BROKEN, ATOM);
        let err = Dispatcher::new(&net, &rules, ScanMode::Full).dispatch(pair).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::RuleFailure {
                pair,
                kind: BROKEN,
                source: RuleError::failed("out of cheese"),
            }
        );
    }
}
