//! The four-node square: two annihilating pairs whose auxiliary ports close a cycle.
//!
//! ```text
//!   X1 ==== Y1
//!   |        |
//!   X2 ==== Y2
//! ```
//!
//! `=` is a principal wire, `|` an auxiliary one. Both pairs annihilate by fusing their
//! auxiliary slots, so exactly one aux-to-aux wire survives.

use interlace_net::{AgentId, Fired, Interaction, Kind, Net, Port, RuleBook, RuleError};
use interlace_rt::RunConfig;

use super::reduce;
use crate::error::CliError;

pub const X: Kind = Kind::new("x");
pub const Y: Kind = Kind::new("y");

fn annihilate(cx: &mut Interaction<'_>) -> Result<Fired, RuleError> {
    let (me, partner) = (cx.me(), cx.partner());
    let dual = if cx.kind(me)? == X { Y } else { X };
    if cx.partner_kind()? != dual {
        return Ok(Fired::Declined);
    }
    cx.fuse(Port::aux(me, 2), Port::aux(partner, 2))?;
    Ok(Fired::Rewrote)
}

pub fn rules() -> RuleBook {
    RuleBook::new().with(X, annihilate).with(Y, annihilate)
}

/// Builds the square. Returns the net and `[x1, y1, x2, y2]`.
pub fn build() -> Result<(Net, [AgentId; 4]), CliError> {
    let net = Net::new();
    let x1 = net.add_agent(X, 2);
    let y1 = net.add_agent(Y, 2);
    let x2 = net.add_agent(X, 2);
    let y2 = net.add_agent(Y, 2);
    net.connect(Port::principal(x1), Port::principal(y1))?;
    net.connect(Port::principal(x2), Port::principal(y2))?;
    net.connect(Port::aux(x1, 2), Port::aux(x2, 2))?;
    net.connect(Port::aux(y1, 2), Port::aux(y2, 2))?;
    Ok((net, [x1, y1, x2, y2]))
}

/// The auxiliary wires left after reduction.
pub fn survivors(net: &Net) -> Vec<(Port, Port)> {
    net.wires()
        .into_iter()
        .filter(|(a, b)| !a.is_principal() && !b.is_principal())
        .collect()
}

pub fn handle_square(config: RunConfig) -> Result<(), CliError> {
    let (net, _) = build()?;
    let report = reduce(net, rules(), config)?;
    for (a, b) in survivors(&report.net) {
        println!("{a} <-> {b}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_worker_leaves_the_second_pair_joined() {
        let (net, [_, _, x2, y2]) = build().unwrap();
        let report = reduce(net, rules(), RunConfig::default().with_workers(1)).unwrap();
        assert_eq!(survivors(&report.net), vec![(Port::aux(x2, 2), Port::aux(y2, 2))]);
    }
}
