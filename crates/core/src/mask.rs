//! Output masks: `C⟨M⟩ = ...` restricts which entries of `C` are computed.

use crate::matrix::Matrix;
use crate::scalar::{Scalar, ScalarCast};

/// A mask matrix plus the two modifiers from §3: `structural` (presence
/// alone grants access, ignoring the stored value) and `complement`
/// (invert the allow/deny decision).
pub struct Mask<'a, T: Scalar + ScalarCast<bool>> {
    matrix: Option<&'a Matrix<T>>,
    structural: bool,
    complement: bool,
}

impl<'a, T: Scalar + ScalarCast<bool>> Mask<'a, T> {
    /// No mask: every output entry is allowed.
    pub fn none() -> Self {
        Mask {
            matrix: None,
            structural: false,
            complement: false,
        }
    }

    pub fn new(matrix: &'a Matrix<T>, structural: bool, complement: bool) -> Self {
        Mask {
            matrix: Some(matrix),
            structural,
            complement,
        }
    }

    pub fn is_present(&self) -> bool {
        self.matrix.is_some()
    }

    pub fn complement(&self) -> bool {
        self.complement
    }

    pub fn structural(&self) -> bool {
        self.structural
    }

    /// Whether computing/writing `C(row, vector)` is permitted.
    ///
    /// Requires `matrix` to be pending-free (the driver calls `wait()` on
    /// the mask before use, per §4.5).
    pub fn allows(&self, row: usize, vector: usize) -> bool {
        let Some(m) = self.matrix else {
            return true;
        };
        let found = match m.find_vector(vector) {
            Some(k) => {
                let (ai, ax) = m.vector(k);
                match ai.binary_search(&(row as i64)) {
                    Ok(slot) => {
                        if self.structural {
                            true
                        } else {
                            ScalarCast::<bool>::cast(ax[slot])
                        }
                    }
                    Err(_) => false,
                }
            }
            None => false,
        };
        found != self.complement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Orientation;

    #[test]
    fn no_mask_allows_everything() {
        let mask: Mask<bool> = Mask::none();
        assert!(mask.allows(0, 0));
        assert!(mask.allows(99, 99));
    }

    #[test]
    fn structural_mask_ignores_value() {
        let m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, false)],
            |a, _b| a,
        );
        let mask = Mask::new(&m, true, false);
        assert!(mask.allows(0, 0));
        assert!(!mask.allows(1, 0));
    }

    #[test]
    fn valued_mask_respects_false_entries() {
        let m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, false), (1, 0, true)],
            |a, _b| a,
        );
        let mask = Mask::new(&m, false, false);
        assert!(!mask.allows(0, 0));
        assert!(mask.allows(1, 0));
    }

    #[test]
    fn complement_inverts_decision() {
        let m = Matrix::from_triples(
            2,
            2,
            Orientation::ColMajor,
            false,
            vec![(0, 0, true)],
            |a, _b| a,
        );
        let mask = Mask::new(&m, true, true);
        assert!(!mask.allows(0, 0));
        assert!(mask.allows(1, 0));
    }
}
