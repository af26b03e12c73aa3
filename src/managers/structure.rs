use crate::types::{Matrix3, Vector3D};

/// A snapshot of an atomic structure: positions, atomic types, unit cell and
/// periodic boundary conditions.
///
/// A structure is replaced wholesale on every update of a manager stack,
/// never mutated field by field; everything derived from it is invalidated
/// by the replacement.
#[derive(Clone, Debug)]
pub struct AtomicStructure {
    /// cell matrix, rows are the cell vectors
    pub cell: Matrix3,
    /// periodicity of the cell along each cell vector
    pub pbc: [bool; 3],
    /// atomic positions, assumed to lie inside the cell
    pub positions: Vec<Vector3D>,
    /// atomic type (chemical species) of each atom
    pub types: Vec<i32>,
}

impl AtomicStructure {
    /// Create an empty structure with the given cell and periodicity
    pub fn new(cell: Matrix3, pbc: [bool; 3]) -> AtomicStructure {
        AtomicStructure {
            cell: cell,
            pbc: pbc,
            positions: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Add an atom with the given atomic type and position to this structure
    pub fn add_atom(&mut self, atomic_type: i32, position: Vector3D) {
        self.types.push(atomic_type);
        self.positions.push(position);
    }

    /// Number of atoms in the structure
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Is this structure empty?
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
