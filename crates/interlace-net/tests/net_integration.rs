// Integration tests for wiring, scanning and claimed rewrites on a single net.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use interlace_net::{
    AgentId, Fired, Interaction, Kind, Net, NetError, Pair, Pop, Port, RuleBook, RuleError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const X: Kind = Kind::new("x");
const Y: Kind = Kind::new("y");
const OTHER: Kind = Kind::new("other");

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Annihilation: `x` meeting `y` fuses their second slots and both disappear.
fn annihilate(cx: &mut Interaction<'_>) -> Result<Fired, RuleError> {
    let me = cx.me();
    let partner = cx.partner();
    if cx.partner_kind()? != Y {
        return Ok(Fired::Declined);
    }
    cx.fuse(Port::aux(me, 2), Port::aux(partner, 2))?;
    Ok(Fired::Rewrote)
}

/// Pops everything currently queued.
fn drain(net: &Net) -> BTreeSet<Pair> {
    let mut pairs = BTreeSet::new();
    while let Pop::Pair(pair) = net.pending().pop(Duration::ZERO) {
        net.pending().complete();
        pairs.insert(pair);
    }
    pairs
}

#[test]
fn test_connect_is_bidirectional() {
    init_logger();
    let net = Net::new();
    let a = net.add_agent(X, 3);
    let b = net.add_agent(Y, 2);

    net.connect(Port::aux(a, 3), Port::aux(b, 2)).unwrap();

    assert_eq!(net.port(Port::aux(a, 3)).unwrap(), Some(Port::aux(b, 2)));
    assert_eq!(net.port(Port::aux(b, 2)).unwrap(), Some(Port::aux(a, 3)));
    assert!(net.is_active(a).unwrap());
    assert!(net.is_active(b).unwrap());
    assert_eq!(net.wires(), vec![(Port::aux(a, 3), Port::aux(b, 2))]);
}

#[test]
fn test_null_connect_leaves_net_unchanged() {
    init_logger();
    let net = Net::new();
    let a = net.add_agent(X, 2);
    let b = net.add_agent(Y, 2);
    net.connect(Port::aux(a, 2), Port::aux(b, 2)).unwrap();
    let before = net.agents();

    assert_eq!(
        net.connect(Port::NULL, Port::principal(a)),
        Err(NetError::NullPort(Port::NULL))
    );
    let missing = Port::principal(AgentId(17));
    assert_eq!(net.connect(Port::principal(b), missing), Err(NetError::NullPort(missing)));
    assert!(matches!(
        net.connect(Port::principal(a), Port::aux(b, 5)),
        Err(NetError::SlotOutOfRange { arity: 2, .. })
    ));

    assert_eq!(net.agents(), before);
    assert_eq!(net.wires(), vec![(Port::aux(a, 2), Port::aux(b, 2))]);
}

#[test]
fn test_pairs_are_queued_once() {
    init_logger();
    let net = Net::new();
    let a = net.add_agent(X, 2);
    let b = net.add_agent(Y, 2);
    net.connect(Port::principal(a), Port::principal(b)).unwrap();

    assert_eq!(net.scan(), 1);
    for _ in 0..3 {
        assert_eq!(net.scan(), 0);
    }
    assert_eq!(net.scan_agents([a, b]), 0);
    assert_eq!(drain(&net), BTreeSet::from([Pair::new(a, b)]));

    // Popping does not forget the pair; only an explicit re-arm does.
    assert_eq!(net.scan(), 0);
    net.rearm(Pair::new(a, b));
    assert_eq!(net.scan(), 1);
}

#[test]
fn test_scan_finds_exactly_the_active_pairs() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(0x1d7e_41ac);

    for _ in 0..50 {
        let net = Net::new();
        let count = rng.random_range(2..24);
        let ids: Vec<AgentId> =
            (0..count).map(|_| net.add_agent(X, rng.random_range(1..=3))).collect();

        for _ in 0..rng.random_range(0..count * 2) {
            let a = ids[rng.random_range(0..ids.len())];
            let b = ids[rng.random_range(0..ids.len())];
            let pa = Port::new(a, interlace_net::Slot(rng.random_range(1..=3)));
            let pb = Port::new(b, interlace_net::Slot(rng.random_range(1..=3)));
            // Out-of-range slots and self-loops are rejected without touching the net.
            let _ = net.connect(pa, pb);
        }

        let agents = net.agents();
        let mut expected = BTreeSet::new();
        for agent in &agents {
            let Some(target) = agent.principal() else { continue };
            if !target.is_principal() || target.agent == agent.id() {
                continue;
            }
            let other = &agents[target.agent.index()];
            if agent.is_active()
                && other.is_active()
                && other.principal() == Some(Port::principal(agent.id()))
            {
                expected.insert(Pair::new(agent.id(), other.id()));
            }
        }

        assert_eq!(net.scan(), expected.len());
        assert_eq!(drain(&net), expected);
    }
}

#[test]
fn test_annihilation_through_claim() {
    init_logger();
    let net = Net::new();
    let x = net.add_agent(X, 2);
    let y = net.add_agent(Y, 2);
    let left = net.add_agent(OTHER, 1);
    let right = net.add_agent(OTHER, 1);
    net.connect(Port::principal(x), Port::principal(y)).unwrap();
    net.connect(Port::aux(x, 2), Port::principal(left)).unwrap();
    net.connect(Port::aux(y, 2), Port::principal(right)).unwrap();

    let rules = RuleBook::new().with(X, annihilate);
    let pair = Pair::new(x, y);
    let mut cx = net.claim(pair).unwrap().expect("x ~ y is active");
    let rule = rules.get(cx.kind(cx.me()).unwrap()).unwrap();
    assert_eq!(rule.interact(&mut cx).unwrap(), Fired::Rewrote);
    let touched = cx.commit();

    assert_eq!(touched, vec![left, right]);
    assert!(!net.is_active(x).unwrap());
    assert!(!net.is_active(y).unwrap());
    assert_eq!(net.live_wires(), vec![(Port::principal(left), Port::principal(right))]);
    assert_eq!(net.scan_agents(touched), 1);
}

#[test]
fn test_unrecognized_partner_is_a_no_op() {
    init_logger();
    let net = Net::new();
    let x = net.add_agent(X, 2);
    let o = net.add_agent(OTHER, 2);
    net.connect(Port::principal(x), Port::principal(o)).unwrap();
    net.connect(Port::aux(x, 2), Port::aux(o, 2)).unwrap();
    let before = net.agents();

    let mut cx = net.claim(Pair::new(x, o)).unwrap().unwrap();
    assert_eq!(annihilate(&mut cx).unwrap(), Fired::Declined);
    cx.release();

    assert_eq!(net.agents(), before);
}

#[test]
fn test_overlapping_claims_from_many_threads() {
    init_logger();
    // A ring of x ~ y pairs where each y's second slot is wired to the next x's, so
    // every neighbourhood overlaps two others.
    let net = Net::new();
    let pairs: Vec<(AgentId, AgentId)> =
        (0..16).map(|_| (net.add_agent(X, 2), net.add_agent(Y, 2))).collect();
    for (i, &(x, y)) in pairs.iter().enumerate() {
        net.connect(Port::principal(x), Port::principal(y)).unwrap();
        let next = pairs[(i + 1) % pairs.len()].0;
        net.connect(Port::aux(y, 2), Port::aux(next, 2)).unwrap();
    }

    thread::scope(|s| {
        for &(x, y) in &pairs {
            let net = &net;
            s.spawn(move || {
                let mut cx = net.claim(Pair::new(x, y)).unwrap().expect("pair is active");
                assert_eq!(annihilate(&mut cx).unwrap(), Fired::Rewrote);
                cx.commit();
            });
        }
    });

    for &(x, y) in &pairs {
        assert!(!net.is_active(x).unwrap());
        assert!(!net.is_active(y).unwrap());
    }
    assert!(net.live_wires().is_empty());
}
