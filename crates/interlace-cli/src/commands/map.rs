//! Mapping a transform over a cons list.
//!
//! A list is a chain of `cons` agents ending in a `nil`. A cons carries its value in the
//! agent's data and its tail on slot 2, wired to the next cell's principal port. A `map`
//! agent sits on the list's head with its output on slot 2. Each map/cons interaction
//! emits one transformed cell on the output and pushes a fresh map onto the tail; the
//! map/nil interaction closes the output with a new nil. The result hangs off slot 2 of a
//! `result` agent, whose own principal stays free so it never interacts.

use clap::ValueEnum;
use interlace_net::{
    Agent, AgentId, Fired, Interaction, Kind, Net, Port, Rule, RuleBook, RuleError, Slot,
};
use interlace_rt::RunConfig;

use super::reduce;
use crate::error::CliError;

pub const CONS: Kind = Kind::new("cons");
pub const NIL: Kind = Kind::new("nil");
pub const MAP: Kind = Kind::new("map");
pub const RESULT: Kind = Kind::new("result");

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// x * 2
    Double,
    /// x + 1
    Increment,
    /// x * x
    Square,
    /// -x
    Negate,
}

impl Transform {
    pub fn apply(self, value: i64) -> i64 {
        match self {
            Transform::Double => value.wrapping_mul(2),
            Transform::Increment => value.wrapping_add(1),
            Transform::Square => value.wrapping_mul(value),
            Transform::Negate => value.wrapping_neg(),
        }
    }
}

/// The map rule, registered for all three list kinds so that it fires whichever side of
/// the pair has the lower id.
#[derive(Debug, Clone, Copy)]
pub struct MapRule {
    pub transform: Transform,
}

impl Rule for MapRule {
    fn interact(&self, cx: &mut Interaction<'_>) -> Result<Fired, RuleError> {
        let (map, cell) = if cx.kind(cx.me())? == MAP {
            (cx.me(), cx.partner())
        } else if cx.partner_kind()? == MAP {
            (cx.partner(), cx.me())
        } else {
            return Ok(Fired::Declined);
        };
        let output = cx.aux(map, 2)?;

        match cx.kind(cell)? {
            k if k == CONS => {
                let tail = cx
                    .aux(cell, 2)?
                    .ok_or_else(|| RuleError::failed(format!("cons cell {cell} has no tail")))?;
                let value = self.transform.apply(cx.data(cell)?);
                let mapped = cx.spawn_agent(CONS, 2, value);
                let rest = cx.spawn_agent(MAP, 2, 0);
                if let Some(output) = output {
                    cx.connect(Port::principal(mapped), output)?;
                }
                cx.connect(Port::aux(mapped, 2), Port::aux(rest, 2))?;
                cx.connect(Port::principal(rest), tail)?;
            }
            k if k == NIL => {
                let end = cx.spawn_agent(NIL, 1, 0);
                if let Some(output) = output {
                    cx.connect(Port::principal(end), output)?;
                }
            }
            _ => return Ok(Fired::Declined),
        }
        Ok(Fired::Rewrote)
    }
}

pub fn rules(transform: Transform) -> RuleBook {
    let rule = MapRule { transform };
    RuleBook::new().with(MAP, rule).with(CONS, rule).with(NIL, rule)
}

/// Builds `result <- map <- [values..]`. Returns the net and the result agent.
pub fn build(values: impl IntoIterator<Item = i64>) -> Result<(Net, AgentId), CliError> {
    let net = Net::new();
    let cells: Vec<AgentId> =
        values.into_iter().map(|v| net.insert(Agent::new(CONS, 2).with_data(v))).collect();
    let nil = net.add_agent(NIL, 1);
    for (i, &cell) in cells.iter().enumerate() {
        let next = cells.get(i + 1).copied().unwrap_or(nil);
        net.connect(Port::aux(cell, 2), Port::principal(next))?;
    }
    let head = cells.first().copied().unwrap_or(nil);
    let map = net.add_agent(MAP, 2);
    let result = net.add_agent(RESULT, 2);
    net.connect(Port::principal(map), Port::principal(head))?;
    net.connect(Port::aux(map, 2), Port::aux(result, 2))?;
    Ok((net, result))
}

/// Reads back the list hanging off slot 2 of `result`.
pub fn read_list(net: &Net, result: AgentId) -> Result<Vec<i64>, CliError> {
    let mut values = Vec::new();
    let mut next = net.port(Port::aux(result, 2))?;
    // Every cell is visited at most once in a well-formed list.
    for _ in 0..=net.len() {
        let port = next.ok_or_else(|| CliError::ReadBack("list ends in an open wire".into()))?;
        if !port.is_principal() {
            return Err(CliError::ReadBack(format!("expected a cell's principal, found {port}")));
        }
        let agent = net.agent(port.agent)?;
        match agent.kind() {
            k if k == NIL => return Ok(values),
            k if k == CONS => {
                values.push(agent.data());
                next = agent.port(Slot::aux(2));
            }
            other => {
                let message = format!("unexpected {other} agent {} in list", agent.id());
                return Err(CliError::ReadBack(message));
            }
        }
    }
    Err(CliError::ReadBack("list does not terminate".into()))
}

pub fn handle_map(length: u32, transform: Transform, config: RunConfig) -> Result<(), CliError> {
    let (net, result) = build(1..=i64::from(length))?;
    let report = reduce(net, rules(transform), config)?;
    let values = read_list(&report.net, result)?;
    let rendered: Vec<String> = values.iter().map(i64::to_string).collect();
    println!("[{}]", rendered.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlace_rt::ScanMode;

    fn active(net: &Net, kind: Kind) -> usize {
        net.agents().iter().filter(|a| a.is_active() && a.kind() == kind).count()
    }

    #[test]
    fn traversal_preserves_length() {
        for n in [0, 1, 2, 7, 40] {
            let (net, result) = build(1..=n).unwrap();
            let config = RunConfig::default().with_max_steps(10_000);
            let report = reduce(net, rules(Transform::Double), config).unwrap();

            let values = read_list(&report.net, result).unwrap();
            assert_eq!(values, (1..=n).map(|v| v * 2).collect::<Vec<_>>());
            assert_eq!(report.rewrites, n as u64 + 1);
            assert_eq!(active(&report.net, CONS), n as usize);
            assert_eq!(active(&report.net, NIL), 1);
            assert_eq!(active(&report.net, MAP), 0);
        }
    }

    #[test]
    fn touched_scan_reaches_the_end_of_the_list() {
        let (net, result) = build([3, -4, 5]).unwrap();
        let config = RunConfig::default().with_workers(2).with_scan(ScanMode::Touched);
        let report = reduce(net, rules(Transform::Square), config).unwrap();
        assert_eq!(read_list(&report.net, result).unwrap(), vec![9, 16, 25]);
    }

    #[test]
    fn small_budget_is_reported() {
        let (net, _) = build(1..=10).unwrap();
        let config = RunConfig::default().with_max_steps(3);
        let err = reduce(net, rules(Transform::Negate), config).unwrap_err();
        assert!(matches!(err, CliError::Incomplete { reason: interlace_rt::StopReason::StepLimit }));
    }

    #[test]
    fn transforms() {
        assert_eq!(Transform::Double.apply(21), 42);
        assert_eq!(Transform::Increment.apply(-1), 0);
        assert_eq!(Transform::Square.apply(-3), 9);
        assert_eq!(Transform::Negate.apply(5), -5);
    }
}
