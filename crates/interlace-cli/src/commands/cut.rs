//! Cut elimination for `(A ⊗ B) cut (A' ⅋ B')` with the built-in vocabulary.

use interlace_net::{builtin, AgentId, Kind, Net, Port, RuleBook};
use interlace_rt::RunConfig;

use super::reduce;
use crate::error::CliError;

/// A named free end. Its principal stays open; slot 2 plugs into a connective.
pub const NAME: Kind = Kind::new("name");

pub struct Cut {
    pub net: Net,
    /// `[a, b, a', b']`
    pub names: [AgentId; 4],
}

pub fn build() -> Result<Cut, CliError> {
    let net = Net::new();
    let tensor = net.add_agent(builtin::TENSOR, builtin::ARITY);
    let par = net.add_agent(builtin::PAR, builtin::ARITY);
    let names = [(); 4].map(|_| net.add_agent(NAME, 2));
    net.connect(Port::principal(tensor), Port::principal(par))?;
    net.connect(Port::aux(tensor, 2), Port::aux(names[0], 2))?;
    net.connect(Port::aux(tensor, 3), Port::aux(names[1], 2))?;
    net.connect(Port::aux(par, 2), Port::aux(names[2], 2))?;
    net.connect(Port::aux(par, 3), Port::aux(names[3], 2))?;
    Ok(Cut { net, names })
}

/// Pairs of names joined by a live wire, by their labels.
pub fn links(net: &Net, names: &[AgentId; 4]) -> Vec<(&'static str, &'static str)> {
    const LABELS: [&str; 4] = ["A", "B", "A'", "B'"];
    let label = |id: AgentId| names.iter().position(|&n| n == id).map(|i| LABELS[i]);
    net.live_wires()
        .into_iter()
        .filter_map(|(a, b)| Some((label(a.agent)?, label(b.agent)?)))
        .collect()
}

pub fn handle_cut(config: RunConfig) -> Result<(), CliError> {
    let Cut { net, names } = build()?;
    let report = reduce(net, RuleBook::with_builtins(), config)?;
    for (a, b) in links(&report.net, &names) {
        println!("{a} <-> {b}");
    }
    Ok(())
}
