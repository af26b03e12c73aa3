use crate::types::{Matrix3, Vector3D};
use crate::Error;

use super::{AtomicStructure, ClusterIndices, PropertyStore, StructureManager};

/// The root of every adaptor stack: owns the [`AtomicStructure`] and
/// presents it as an order-1 collection of atoms with identity cluster
/// indices (atom `i` is cluster `i`).
pub struct Centers {
    structure: Option<AtomicStructure>,
    atom_indices: ClusterIndices,
    properties: PropertyStore,
}

impl Centers {
    /// Create a root manager with no structure loaded. All geometry
    /// queries fail until the first call to `update`.
    pub fn new() -> Centers {
        Centers {
            structure: None,
            atom_indices: ClusterIndices::new(1),
            properties: PropertyStore::new(),
        }
    }

    /// Create a root manager from an initial structure
    pub fn with_structure(structure: AtomicStructure) -> Centers {
        let mut centers = Centers::new();
        // infallible for the root manager
        let _ = centers.update_structure(structure);
        return centers;
    }

    fn structure(&self) -> Result<&AtomicStructure, Error> {
        self.structure.as_ref().ok_or_else(|| Error::StructureNotLoaded(
            "no atomic structure defined, call update first".into()
        ))
    }
}

impl Default for Centers {
    fn default() -> Centers {
        Centers::new()
    }
}

impl StructureManager for Centers {
    fn size(&self) -> usize {
        self.structure.as_ref().map_or(0, |s| s.len())
    }

    fn size_with_ghosts(&self) -> usize {
        self.size()
    }

    fn max_order(&self) -> usize {
        1
    }

    fn nb_clusters(&self, order: usize) -> Result<usize, Error> {
        if order == 1 {
            return Ok(self.size());
        }
        return Err(Error::UnsupportedOrder(format!(
            "only atoms (order 1) are available from this manager, requested order {}", order
        )));
    }

    fn cutoff(&self) -> Option<f64> {
        None
    }

    fn strict_cutoff(&self) -> Option<f64> {
        None
    }

    fn position(&self, atom_index: usize) -> Result<Vector3D, Error> {
        Ok(self.structure()?.positions[atom_index])
    }

    fn atom_type(&self, atom_index: usize) -> Result<i32, Error> {
        Ok(self.structure()?.types[atom_index])
    }

    fn cell(&self) -> Result<Matrix3, Error> {
        Ok(self.structure()?.cell)
    }

    fn periodicity(&self) -> Result<[bool; 3], Error> {
        Ok(self.structure()?.pbc)
    }

    fn cluster_size(&self, order: usize, _cluster_index: usize) -> usize {
        panic!("no clusters of order {} in this manager", order + 1);
    }

    fn cluster_offset(&self, order: usize, _cluster_index: usize) -> usize {
        panic!("no clusters of order {} in this manager", order + 1);
    }

    fn neighbour_atom(&self, order: usize, _position: usize) -> usize {
        panic!("no clusters of order {} in this manager", order);
    }

    fn layer(&self, order: usize) -> usize {
        assert!(order == 1, "only atoms (order 1) are available from this manager");
        return 0;
    }

    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize {
        assert!(order == 1, "only atoms (order 1) are available from this manager");
        self.atom_indices.get(cluster_index, layer)
    }

    fn atom_cluster_index(&self, atom_index: usize) -> usize {
        atom_index
    }

    fn cluster_anchor(&self, _order: usize, _cluster_index: usize) -> Option<(usize, usize)> {
        None
    }

    fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    fn property_owner(&self, name: &str) -> Option<&PropertyStore> {
        if self.properties.has(name) {
            return Some(&self.properties);
        }
        return None;
    }

    fn is_fresh(&self) -> bool {
        self.structure.is_some()
    }

    fn update_structure(&mut self, structure: AtomicStructure) -> Result<(), Error> {
        self.atom_indices.fill_sequence(structure.len());
        self.structure = Some(structure);
        return Ok(());
    }

    fn refresh(&mut self) -> Result<(), Error> {
        // the identity indices are filled in update_structure, there is
        // nothing else to derive
        self.structure()?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn not_loaded() {
        let centers = Centers::new();
        assert_eq!(centers.size(), 0);

        let error = centers.position(0).unwrap_err();
        assert!(matches!(error, Error::StructureNotLoaded(_)));
        assert_eq!(error.to_string(), "no atomic structure defined, call update first");
    }

    #[test]
    fn iteration() {
        let mut structure = AtomicStructure::new(Matrix3::one() * 5.0, [true; 3]);
        structure.add_atom(8, Vector3D::new(1.0, 1.0, 1.0));
        structure.add_atom(1, Vector3D::new(2.0, 1.0, 1.0));
        structure.add_atom(1, Vector3D::new(1.0, 2.0, 1.0));

        let mut centers = Centers::new();
        centers.update(structure).unwrap();

        assert_eq!(centers.size(), 3);
        assert_eq!(centers.nb_clusters(1).unwrap(), 3);
        assert_eq!(centers.layer(1), 0);

        let mut count = 0;
        for atom in centers.atoms() {
            assert_eq!(atom.order(), 1);
            assert_eq!(atom.atom_index(), count);
            assert_eq!(atom.cluster_index(0), count);
            assert_eq!(atom.size(), 0);
            count += 1;
        }
        assert_eq!(count, 3);

        let atom = centers.atoms().nth(1).unwrap();
        assert_eq!(atom.atom_type().unwrap(), 1);
        assert_ulps_eq!(atom.position().unwrap(), Vector3D::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn unsupported_order() {
        let centers = Centers::with_structure(AtomicStructure::new(Matrix3::one(), [false; 3]));
        let error = centers.nb_clusters(2).unwrap_err();
        assert!(matches!(error, Error::UnsupportedOrder(_)));
    }
}
