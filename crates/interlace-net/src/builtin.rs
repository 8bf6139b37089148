//! The built-in multiplicative vocabulary.
//!
//! `tensor` and `par` are binary agents (arity 3). When they meet principal to principal
//! the cut is eliminated by fusing their left auxiliaries together and their right
//! auxiliaries together, after which both agents are gone.

use crate::agent::Kind;
use crate::error::RuleError;
use crate::interaction::Interaction;
use crate::port::Port;
use crate::rule::{Fired, RuleBook};

pub const TENSOR: Kind = Kind::new("tensor");
pub const PAR: Kind = Kind::new("par");

/// Arity of both built-in kinds: the principal plus two auxiliaries.
pub const ARITY: u8 = 3;

/// Adds the tensor/par rule to `book` under both kinds, so that it fires whichever of
/// the two agents has the lower id.
pub fn register(book: &mut RuleBook) {
    book.insert(TENSOR, tensor_par);
    book.insert(PAR, tensor_par);
}

fn tensor_par(cx: &mut Interaction<'_>) -> Result<Fired, RuleError> {
    let me = cx.me();
    let partner = cx.partner();
    let dual = match cx.kind(me)? {
        k if k == TENSOR => PAR,
        k if k == PAR => TENSOR,
        other => return Err(RuleError::failed(format!("tensor/par rule run for kind {other}"))),
    };
    if cx.partner_kind()? != dual {
        log::trace!("{} has no case for {}", cx.kind(me)?, cx.partner_kind()?);
        return Ok(Fired::Declined);
    }
    cx.fuse(Port::aux(me, 2), Port::aux(partner, 2))?;
    cx.fuse(Port::aux(me, 3), Port::aux(partner, 3))?;
    Ok(Fired::Rewrote)
}
