//! The grounding map: a bijection between ground atoms and the
//! propositional symbols of the automaton alphabet.
//!
//! The canonical encoding is `name_arg1_..._argn`. Because `_` separates
//! positions, a `-` inside a constant is written as the two-character
//! sequence `hh` (`block-1` becomes `blockhh1`). Decoding is a lookup, not
//! string inversion, so an `hh` that was present in an original name can
//! never be confused with an inserted one.
use crate::{Atom, GroundAtom};
use linked_hash_map::LinkedHashMap;
use std::collections::HashMap;
use telos_utils::{Error, Id, TelosResult};

#[derive(Default)]
pub struct GroundingMap {
    by_symbol: LinkedHashMap<Id, GroundAtom>,
    by_atom: HashMap<GroundAtom, Id>,
}

impl GroundingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a ground atom as its propositional symbol without touching
    /// the map. Fails if the predicate or an argument contains `_`.
    pub fn encode(pred: Id, args: &[Id]) -> TelosResult<Id> {
        let mut out = String::from(Self::encode_part(pred)?);
        for &arg in args {
            out.push('_');
            out.push_str(&Self::encode_part(arg)?);
        }
        Ok(Id::new(out))
    }

    fn encode_part(part: Id) -> TelosResult<String> {
        let s = part.as_str();
        if s.contains('_') {
            return Err(Error::invalid_symbol(format!(
                "`{s}' contains `_', which the symbol encoding reserves"
            )));
        }
        Ok(s.replace('-', "hh"))
    }

    /// Encode `pred(args)` and record the association. Returns the symbol.
    /// Registering the same atom twice is a no-op; two distinct atoms
    /// mapping to one symbol is rejected.
    pub fn intern<I>(&mut self, pred: Id, args: I) -> TelosResult<Id>
    where
        I: IntoIterator<Item = Id>,
    {
        let atom = GroundAtom::new(pred, args);
        let symbol = Self::encode(atom.pred, &atom.args)?;
        if let Some(present) = self.by_symbol.get(&symbol) {
            if *present != atom {
                return Err(Error::invalid_symbol(format!(
                    "symbol collision: `{symbol}' stands for both \
                     `{present}' and `{atom}'"
                )));
            }
            return Ok(symbol);
        }
        self.by_symbol.insert(symbol, atom.clone());
        self.by_atom.insert(atom, symbol);
        Ok(symbol)
    }

    /// Look up the ground atom a symbol stands for.
    pub fn decode(&self, symbol: Id) -> TelosResult<&GroundAtom> {
        self.by_symbol
            .get(&symbol)
            .ok_or_else(|| Error::unknown_symbol(symbol))
    }

    /// Decode a symbol into an [Atom] with the given polarity.
    pub fn decode_atom(&self, symbol: Id, negated: bool) -> TelosResult<Atom> {
        Ok(self.decode(symbol)?.to_atom(negated))
    }

    /// The symbol for a previously interned atom, if any.
    pub fn symbol_of(&self, atom: &GroundAtom) -> Option<Id> {
        self.by_atom.get(atom).copied()
    }

    pub fn contains(&self, symbol: Id) -> bool {
        self.by_symbol.contains_key(&symbol)
    }

    /// Iterate associations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &GroundAtom)> {
        self.by_symbol.iter().map(|(&sym, atom)| (sym, atom))
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
