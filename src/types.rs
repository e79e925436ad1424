//! # Common Types for SAT Solving
//!
//! Variables, literals and truth values exchanged with the engine, and the
//! codec between literals and their external signed integer form.
//!
//! The external form follows the IPASIR/DIMACS convention: a literal is a
//! nonzero integer whose magnitude minus one is the 0-based variable index and
//! whose sign is the polarity. Zero is never a literal.

use core::ffi::c_int;
use std::{fmt, ops};

use thiserror::Error;

/// Type representing boolean variables in a SAT problem. Variables indexing
/// starts from 0 and the maximum index is [`Var::MAX_IDX`], the highest index
/// that still has an external (IPASIR) representation. The memory
/// representation of variables is `u32`.
#[derive(Hash, Eq, PartialEq, PartialOrd, Clone, Copy, Ord, Debug)]
#[repr(transparent)]
pub struct Var {
    idx: u32,
}

impl Var {
    /// The maximum index that can be represented.
    #[allow(clippy::cast_sign_loss)]
    pub const MAX_IDX: u32 = c_int::MAX as u32 - 1;

    /// Creates a new variables with a given index.
    /// Indices start from 0.
    ///
    /// # Panics
    ///
    /// If `idx > Var::MAX_IDX`.
    #[must_use]
    pub fn new(idx: u32) -> Var {
        assert!(idx <= Var::MAX_IDX, "variable index too high");
        Var { idx }
    }

    /// Creates a new variables with a given index.
    ///
    /// # Errors
    ///
    /// [`TypeError::IdxTooHigh`] if `idx > Var::MAX_IDX`.
    pub fn new_with_error(idx: u32) -> Result<Var, TypeError> {
        if idx > Var::MAX_IDX {
            return Err(TypeError::IdxTooHigh(idx, Var::MAX_IDX));
        }
        Ok(Var { idx })
    }

    /// Creates a literal that is not negated.
    ///
    /// # Examples
    ///
    /// ```
    /// use satbridge::types::{Var,Lit};
    ///
    /// let var = Var::new(5);
    /// let lit = Lit::positive(5);
    ///
    /// assert_eq!(lit, var.pos_lit());
    /// ```
    #[inline]
    #[must_use]
    pub fn pos_lit(self) -> Lit {
        Lit::represent_unchecked(self.idx, false)
    }

    /// Creates a negated literal.
    ///
    /// # Examples
    ///
    /// ```
    /// use satbridge::types::{Var,Lit};
    ///
    /// let var = Var::new(5);
    /// let lit = Lit::negative(5);
    ///
    /// assert_eq!(lit, var.neg_lit());
    /// ```
    #[inline]
    #[must_use]
    pub fn neg_lit(self) -> Lit {
        Lit::represent_unchecked(self.idx, true)
    }

    /// Creates a literal of this variable with the given polarity.
    #[inline]
    #[must_use]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::represent_unchecked(self.idx, !polarity)
    }

    /// Returns the index of the variable as a `usize` for indexing.
    #[inline]
    #[must_use]
    pub fn idx(&self) -> usize {
        self.idx as usize
    }

    /// Returns the 32 bit index of the variable.
    #[inline]
    #[must_use]
    pub fn idx32(&self) -> u32 {
        self.idx
    }

    /// Converts the variable to an integer as accepted by the IPASIR API and
    /// similar. The IPASIR variable will have idx+1.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_ipasir(self) -> c_int {
        // `MAX_IDX` keeps `idx + 1` within `c_int`
        (self.idx + 1) as c_int
    }
}

/// Variables can be printed with the [`Display`](std::fmt::Display) trait
impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.idx)
    }
}

/// More easily creates variables. Mainly used in tests.
///
/// # Examples
///
/// ```
/// use satbridge::{var, types::Var};
///
/// assert_eq!(var![42], Var::new(42));
/// ```
#[macro_export]
macro_rules! var {
    ($v:expr) => {
        $crate::types::Var::new($v)
    };
}

/// Type representing literals, possibly negated boolean variables.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Lit {
    /// Literal representation is `idx << 1` with the last bit representing
    /// whether the literal is negated or not.
    lidx: u32,
}

impl Lit {
    #[inline]
    fn represent_unchecked(idx: u32, negated: bool) -> Lit {
        Lit {
            lidx: (idx << 1) + u32::from(negated),
        }
    }

    /// Creates a new (negated or not) literal with a given index.
    ///
    /// # Panics
    ///
    /// If `idx > Var::MAX_IDX`.
    #[must_use]
    pub fn new(idx: u32, negated: bool) -> Lit {
        assert!(idx <= Var::MAX_IDX, "variable index too high");
        Lit::represent_unchecked(idx, negated)
    }

    /// Creates a new (negated or not) literal with a given index.
    ///
    /// # Errors
    ///
    /// [`TypeError::IdxTooHigh`] if `idx > Var::MAX_IDX`.
    pub fn new_with_error(idx: u32, negated: bool) -> Result<Lit, TypeError> {
        if idx > Var::MAX_IDX {
            return Err(TypeError::IdxTooHigh(idx, Var::MAX_IDX));
        }
        Ok(Lit::represent_unchecked(idx, negated))
    }

    /// Creates a new positive literal with a given index.
    ///
    /// # Panics
    ///
    /// If `idx > Var::MAX_IDX`.
    #[inline]
    #[must_use]
    pub fn positive(idx: u32) -> Lit {
        Lit::new(idx, false)
    }

    /// Creates a new negated literal with a given index.
    ///
    /// # Panics
    ///
    /// If `idx > Var::MAX_IDX`.
    #[inline]
    #[must_use]
    pub fn negative(idx: u32) -> Lit {
        Lit::new(idx, true)
    }

    /// Create a literal from an IPASIR integer value.
    ///
    /// # Errors
    ///
    /// [`TypeError::IpasirZero`] if the value is zero,
    /// [`TypeError::IdxTooHigh`] for `c_int::MIN`, whose variable has no
    /// positive counterpart.
    ///
    /// # Examples
    ///
    /// ```
    /// use satbridge::types::Lit;
    ///
    /// assert_eq!(Lit::from_ipasir(3).unwrap(), Lit::positive(2));
    /// assert_eq!(Lit::from_ipasir(-1).unwrap(), Lit::negative(0));
    /// assert!(Lit::from_ipasir(0).is_err());
    /// ```
    pub fn from_ipasir(val: c_int) -> Result<Lit, TypeError> {
        if val == 0 {
            return Err(TypeError::IpasirZero);
        }
        let negated = val < 0;
        let idx = val.unsigned_abs();
        Lit::new_with_error(idx - 1, negated)
    }

    /// Gets the variable index of the literal
    #[inline]
    #[must_use]
    pub fn vidx(&self) -> usize {
        (self.lidx >> 1) as usize
    }

    /// Gets the 32bit variable index of the literal
    #[inline]
    #[must_use]
    pub fn vidx32(&self) -> u32 {
        self.lidx >> 1
    }

    /// Gets the variables that the literal corresponds to.
    #[inline]
    #[must_use]
    pub fn var(&self) -> Var {
        Var {
            idx: self.vidx32(),
        }
    }

    /// True if the literal is positive.
    #[inline]
    #[must_use]
    pub fn is_pos(&self) -> bool {
        (self.lidx & 1u32) == 0
    }

    /// True if the literal is negated.
    #[inline]
    #[must_use]
    pub fn is_neg(&self) -> bool {
        (self.lidx & 1u32) == 1
    }

    /// Converts the literal to an integer as accepted by the IPASIR API and
    /// similar. The IPASIR literal will have idx+1 and be negative if the
    /// literal is negated.
    #[must_use]
    pub fn to_ipasir(self) -> c_int {
        let idx = self.var().to_ipasir();
        if self.is_neg() {
            -idx
        } else {
            idx
        }
    }
}

/// Trait implementation allowing for negating literals with the `!` operator.
impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit {
            lidx: self.lidx ^ 1u32,
        }
    }
}

/// Literals can be printed with the [`Display`](std::fmt::Display) trait
impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_neg() {
            write!(f, "~x{}", self.vidx())
        } else {
            write!(f, "x{}", self.vidx())
        }
    }
}

/// More easily creates literals. Mainly used in tests.
///
/// # Examples
///
/// ```
/// use satbridge::{lit, types::Lit};
///
/// assert_eq!(lit![42], Lit::positive(42));
/// assert_eq!(!lit![42], Lit::negative(42));
/// ```
#[macro_export]
macro_rules! lit {
    ($l:expr) => {
        $crate::types::Lit::positive($l)
    };
}

/// More easily creates literals with IPASIR indexing (starts from 1) and
/// negation (negative value is negation). Mainly used in tests.
///
/// # Examples
///
/// ```
/// use satbridge::{lit, ipasir_lit, types::Lit};
///
/// assert_eq!(ipasir_lit![42], lit![41]);
/// assert_eq!(ipasir_lit![-42], !lit![41]);
/// ```
#[macro_export]
macro_rules! ipasir_lit {
    ($l:expr) => {
        $crate::types::Lit::from_ipasir($l).unwrap()
    };
}

/// Ternary value assigned to a literal or variable. `DontCare` doubles as
/// "unknown": no model is available or the engine left the variable open.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TernaryVal {
    /// Positive assignment.
    True,
    /// Negative assignment.
    False,
    /// No assignment known.
    DontCare,
}

impl TernaryVal {
    /// Converts a [`TernaryVal`] to a bool with a default value for "don't cares"
    #[must_use]
    pub fn to_bool_with_def(self, def: bool) -> bool {
        match self {
            TernaryVal::True => true,
            TernaryVal::False => false,
            TernaryVal::DontCare => def,
        }
    }

    /// Converts to `Some(bool)` for assigned values and `None` otherwise
    #[must_use]
    pub fn to_option(self) -> Option<bool> {
        match self {
            TernaryVal::True => Some(true),
            TernaryVal::False => Some(false),
            TernaryVal::DontCare => None,
        }
    }
}

impl ops::Not for TernaryVal {
    type Output = TernaryVal;

    fn not(self) -> TernaryVal {
        match self {
            TernaryVal::True => TernaryVal::False,
            TernaryVal::False => TernaryVal::True,
            TernaryVal::DontCare => TernaryVal::DontCare,
        }
    }
}

/// Ternary values can be printed with the [`Display`](std::fmt::Display) trait
impl fmt::Display for TernaryVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TernaryVal::True => write!(f, "1"),
            TernaryVal::False => write!(f, "0"),
            TernaryVal::DontCare => write!(f, "_"),
        }
    }
}

impl fmt::Debug for TernaryVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for TernaryVal {
    fn from(value: bool) -> Self {
        if value {
            return TernaryVal::True;
        }
        TernaryVal::False
    }
}

/// Type representing an assignment of variables.
#[derive(Clone, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Assignment {
    assignment: Vec<TernaryVal>,
}

impl Assignment {
    /// Get the value that the solution assigns to a variable.
    /// If the variable is not included in the solution, will return `TernaryVal::DontCare`.
    #[must_use]
    pub fn var_value(&self, var: Var) -> TernaryVal {
        self.assignment
            .get(var.idx())
            .copied()
            .unwrap_or(TernaryVal::DontCare)
    }

    /// Same as [`Assignment::var_value`], but for literals.
    #[must_use]
    pub fn lit_value(&self, lit: Lit) -> TernaryVal {
        if lit.is_neg() {
            !self.var_value(lit.var())
        } else {
            self.var_value(lit.var())
        }
    }

    /// Checks whether a clause is satisfied by the assignment
    #[must_use]
    pub fn satisfies(&self, clause: &[Lit]) -> bool {
        clause
            .iter()
            .any(|&l| self.lit_value(l) == TernaryVal::True)
    }

    /// Number of variables covered by the assignment
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    /// Whether the assignment covers no variables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Iterates over the assigned literals in IPASIR form, skipping unassigned variables
    pub fn ipasir_lits(&self) -> impl Iterator<Item = c_int> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(idx, tv)| {
                let var = Var::new_with_error(u32::try_from(idx).ok()?).ok()?;
                match tv {
                    TernaryVal::True => Some(var.to_ipasir()),
                    TernaryVal::False => Some(-var.to_ipasir()),
                    TernaryVal::DontCare => None,
                }
            })
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.assignment
            .iter()
            .try_for_each(|tv| write!(f, "{tv}"))
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Vec<TernaryVal>> for Assignment {
    fn from(assignment: Vec<TernaryVal>) -> Self {
        Self { assignment }
    }
}

/// Errors related to types
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    /// The requested index is too high.
    /// Contains the requested and the maximum index.
    #[error("index {0} is too high (maximum {1})")]
    IdxTooHigh(u32, u32),
    /// IPASIR index is zero
    #[error("zero is an invalid IPASIR literal")]
    IpasirZero,
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::{Assignment, Lit, TernaryVal, TypeError, Var};

    #[test]
    fn var_pos_lit() {
        let var = Var::new(5);
        assert_eq!(var.pos_lit(), Lit::positive(5));
        assert_eq!(var.lit(true), Lit::positive(5));
    }

    #[test]
    fn var_neg_lit() {
        let var = Var::new(5);
        assert_eq!(var.neg_lit(), Lit::negative(5));
        assert_eq!(var.lit(false), Lit::negative(5));
    }

    #[test]
    fn lit_negation() {
        let lit1 = Lit::positive(0);
        let lit2 = !lit1;
        assert!(lit2.is_neg());
        assert_eq!(lit1.var(), lit2.var());
        assert_eq!(!lit2, lit1);
    }

    #[test]
    fn ipasir_lit_idx_plus_one() {
        let lit = Lit::positive(5);
        assert_eq!(lit.to_ipasir(), 6);
        assert_eq!((!lit).to_ipasir(), -6);
    }

    #[test]
    fn ipasir_var_zero_keeps_polarity() {
        assert_eq!(Lit::from_ipasir(1).unwrap(), Lit::positive(0));
        assert_eq!(Lit::from_ipasir(-1).unwrap(), Lit::negative(0));
    }

    #[test]
    fn ipasir_zero_rejected() {
        assert_eq!(Lit::from_ipasir(0), Err(TypeError::IpasirZero));
    }

    #[test]
    fn ipasir_min_rejected() {
        assert!(matches!(
            Lit::from_ipasir(i32::MIN),
            Err(TypeError::IdxTooHigh(_, _))
        ));
    }

    #[test]
    fn ipasir_roundtrip_extremes() {
        for val in [1, -1, 2, -2, 4711, -4711, i32::MAX, -i32::MAX] {
            assert_eq!(Lit::from_ipasir(val).unwrap().to_ipasir(), val);
        }
    }

    #[test]
    fn var_idx_too_high() {
        assert!(Var::new_with_error(Var::MAX_IDX).is_ok());
        assert_eq!(
            Var::new_with_error(Var::MAX_IDX + 1),
            Err(TypeError::IdxTooHigh(Var::MAX_IDX + 1, Var::MAX_IDX))
        );
    }

    #[test]
    fn ternary_val_option() {
        assert_eq!(TernaryVal::True.to_option(), Some(true));
        assert_eq!(TernaryVal::False.to_option(), Some(false));
        assert_eq!(TernaryVal::DontCare.to_option(), None);
        assert!(TernaryVal::DontCare.to_bool_with_def(true));
    }

    #[test]
    fn sol_lit_val() {
        let sol = Assignment::from(vec![
            TernaryVal::True,
            TernaryVal::False,
            TernaryVal::DontCare,
        ]);
        assert_eq!(sol.lit_value(Lit::negative(0)), TernaryVal::False);
        assert_eq!(sol.lit_value(Lit::negative(1)), TernaryVal::True);
        assert_eq!(sol.lit_value(Lit::positive(2)), TernaryVal::DontCare);
        assert_eq!(sol.var_value(Var::new(7)), TernaryVal::DontCare);
        assert!(sol.satisfies(&[Lit::positive(1), Lit::negative(1)]));
        assert!(!sol.satisfies(&[Lit::positive(1), Lit::positive(2)]));
        assert_eq!(sol.ipasir_lits().collect::<Vec<_>>(), vec![1, -2]);
    }

    #[test]
    fn lit_mem_size() {
        assert_eq!(size_of::<Var>(), size_of::<u32>());
        assert_eq!(size_of::<Lit>(), size_of::<u32>());
        assert_eq!(size_of::<TernaryVal>(), 1);
    }
}
