use log::warn;

use crate::types::{Matrix3, Vector3D};
use crate::Error;

use super::{AdjacencyArrays, AtomicStructure, ClusterIndices, ClusterRef};
use super::{Property, PropertyStore, StructureManager};

/// Two atoms closer than this are reported as overlapping
const COINCIDENT_ATOMS_THRESHOLD: f64 = 1e-10;

/// Adaptor reducing a pair list to a strict one: only the pairs with an
/// interatomic distance up to the cutoff (boundary included) are kept.
///
/// The distances and unit direction vectors computed during the reduction
/// are cached as the `"distance"` and `"direction vector"` properties of
/// this node, addressed by the pair indices assigned here.
pub struct Strict<M> {
    inner: M,
    cutoff: f64,
    pairs: AdjacencyArrays,
    pair_tags: ClusterIndices,
    properties: PropertyStore,
    fresh: bool,
}

impl<M: StructureManager> Strict<M> {
    /// Wrap `inner`, keeping only the pairs within `cutoff`.
    ///
    /// The cutoff can not exceed the one the pair list below was built
    /// with: the pairs beyond it are already gone and a looser cutoff can
    /// not be satisfied.
    pub fn new(inner: M, cutoff: f64) -> Result<Strict<M>, Error> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected a positive cutoff for the strict reduction, got {}", cutoff
            )));
        }

        if inner.max_order() < 2 {
            return Err(Error::InvalidParameter(
                "can not build a strict pair list: the underlying manager does not provide pairs".into()
            ));
        }

        if let Some(available) = inner.strict_cutoff().or(inner.cutoff()) {
            if cutoff > available {
                return Err(Error::CutoffTooLoose(format!(
                    "can not reduce to a cutoff of {}: the pair list below only \
                     contains pairs up to {}", cutoff, available
                )));
            }
        }

        let pair_layers = inner.layer(2) + 2;
        Ok(Strict {
            inner: inner,
            cutoff: cutoff,
            pairs: AdjacencyArrays::new(),
            pair_tags: ClusterIndices::new(pair_layers),
            properties: PropertyStore::new(),
            fresh: false,
        })
    }

    /// Get the cached distance for a pair of this manager
    pub fn distance(&self, pair: &ClusterRef<'_, Self>) -> Result<f64, Error> {
        let distances = self.properties.get::<f64>("distance")?;
        return Ok(*distances.value(pair)?);
    }

    /// Get the cached unit vector pointing from the center to the
    /// neighbour of a pair of this manager
    pub fn direction_vector(&self, pair: &ClusterRef<'_, Self>) -> Result<Vector3D, Error> {
        let directions = self.properties.get::<Vector3D>("direction vector")?;
        return Ok(*directions.value(pair)?);
    }

    #[time_graph::instrument(name = "Strict::rebuild")]
    fn rebuild(&mut self) -> Result<(), Error> {
        let n_atoms = self.inner.nb_clusters(1)?;
        let inherited_layers = self.pair_tags.layers() - 1;
        let cutoff2 = self.cutoff * self.cutoff;

        self.pairs.clear();
        self.pair_tags.clear();

        let mut distances = Vec::new();
        let mut directions = Vec::new();
        let mut kept = Vec::new();
        let mut inherited = Vec::new();
        for center in 0..n_atoms {
            let center_position = self.inner.position(center)?;
            let offset = self.inner.cluster_offset(1, center);
            let size = self.inner.cluster_size(1, center);

            kept.clear();
            for position in offset..offset + size {
                let neighbour = self.inner.neighbour_atom(2, position);
                let vector = self.inner.position(neighbour)? - center_position;
                let distance2 = vector.norm2();
                if distance2 > cutoff2 {
                    continue;
                }

                let distance = f64::sqrt(distance2);
                if distance < COINCIDENT_ATOMS_THRESHOLD {
                    warn!(
                        "atoms {} and {} are on top of each other (distance {:e})",
                        center, neighbour, distance
                    );
                    directions.push(Vector3D::zero());
                } else {
                    directions.push(vector / distance);
                }
                distances.push(distance);

                inherited.clear();
                for layer in 0..inherited_layers {
                    inherited.push(self.inner.cluster_index(2, position, layer));
                }
                self.pair_tags.push_extended(&inherited, self.pair_tags.len());

                kept.push(neighbour);
            }
            self.pairs.push_cluster(center, &kept);
        }

        if !self.properties.has("distance") {
            let layer = self.inner.layer(2) + 1;
            self.properties.attach("distance", Property::<f64>::new(2, layer))?;
            self.properties.attach("direction vector", Property::<Vector3D>::new(2, layer))?;
        }

        let property = self.properties.get_mut::<f64>("distance")?;
        property.clear();
        for value in distances {
            property.push(value);
        }

        let property = self.properties.get_mut::<Vector3D>("direction vector")?;
        property.clear();
        for value in directions {
            property.push(value);
        }

        return Ok(());
    }
}

impl<M: StructureManager> StructureManager for Strict<M> {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn size_with_ghosts(&self) -> usize {
        self.inner.size_with_ghosts()
    }

    fn max_order(&self) -> usize {
        2
    }

    fn nb_clusters(&self, order: usize) -> Result<usize, Error> {
        match order {
            1 => self.inner.nb_clusters(1),
            2 => Ok(self.pairs.len()),
            _ => Err(Error::UnsupportedOrder(format!(
                "only atoms and pairs are available from this manager, requested order {}", order
            ))),
        }
    }

    fn cutoff(&self) -> Option<f64> {
        Some(self.cutoff)
    }

    fn strict_cutoff(&self) -> Option<f64> {
        Some(self.cutoff)
    }

    fn position(&self, atom_index: usize) -> Result<Vector3D, Error> {
        self.inner.position(atom_index)
    }

    fn atom_type(&self, atom_index: usize) -> Result<i32, Error> {
        self.inner.atom_type(atom_index)
    }

    fn cell(&self) -> Result<Matrix3, Error> {
        self.inner.cell()
    }

    fn periodicity(&self) -> Result<[bool; 3], Error> {
        self.inner.periodicity()
    }

    fn cluster_size(&self, order: usize, cluster_index: usize) -> usize {
        assert!(order == 1, "no clusters of order {} in this manager", order + 1);
        self.pairs.nb_neigh[cluster_index]
    }

    fn cluster_offset(&self, order: usize, cluster_index: usize) -> usize {
        assert!(order == 1, "no clusters of order {} in this manager", order + 1);
        self.pairs.offsets[cluster_index]
    }

    fn neighbour_atom(&self, order: usize, position: usize) -> usize {
        assert!(order == 2, "no clusters of order {} in this manager", order);
        self.pairs.atom_indices[position]
    }

    fn layer(&self, order: usize) -> usize {
        match order {
            1 => self.inner.layer(1),
            2 => self.inner.layer(2) + 1,
            _ => panic!("only atoms and pairs are available from this manager"),
        }
    }

    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize {
        match order {
            1 => self.inner.cluster_index(1, cluster_index, layer),
            2 => self.pair_tags.get(cluster_index, layer),
            _ => panic!("only atoms and pairs are available from this manager"),
        }
    }

    fn atom_cluster_index(&self, atom_index: usize) -> usize {
        self.inner.atom_cluster_index(atom_index)
    }

    fn cluster_anchor(&self, order: usize, cluster_index: usize) -> Option<(usize, usize)> {
        if order == 2 {
            let parent = self.pairs.parents[cluster_index];
            return Some((parent, self.pairs.position_in_parent(cluster_index)));
        }
        return None;
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
        return self.inner.property_owner(name);
    }

    fn is_fresh(&self) -> bool {
        self.fresh && self.inner.is_fresh()
    }

    fn update_structure(&mut self, structure: AtomicStructure) -> Result<(), Error> {
        self.fresh = false;
        self.inner.update_structure(structure)
    }

    fn refresh(&mut self) -> Result<(), Error> {
        if !self.inner.is_fresh() {
            self.inner.refresh()?;
            self.fresh = false;
        }

        if !self.fresh {
            self.rebuild()?;
            self.fresh = true;
        }

        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_relative_eq, assert_ulps_eq};

    use super::super::{Centers, HalfList, NeighbourList};
    use super::*;

    fn strict_over_full(structure: AtomicStructure, skin: f64, cutoff: f64) -> Strict<NeighbourList<Centers>> {
        let full = NeighbourList::new(Centers::new(), skin, false).unwrap();
        let mut manager = Strict::new(full, cutoff).unwrap();
        manager.update(structure).unwrap();
        return manager;
    }

    fn cubic_crystal(a: f64) -> AtomicStructure {
        let mut structure = AtomicStructure::new(Matrix3::one() * a, [true; 3]);
        structure.add_atom(29, Vector3D::new(0.0, 0.0, 0.0));
        return structure;
    }

    #[test]
    fn invalid_cutoff() {
        for cutoff in [-1.0, 0.0, f64::NAN] {
            let full = NeighbourList::new(Centers::new(), 1.0, false).unwrap();
            let error = Strict::new(full, cutoff).err().unwrap();
            assert!(matches!(error, Error::InvalidParameter(_)));
        }
    }

    #[test]
    fn cutoff_too_loose() {
        let full = NeighbourList::new(Centers::new(), 1.0, false).unwrap();
        let error = Strict::new(full, 1.5).err().unwrap();
        assert!(matches!(error, Error::CutoffTooLoose(_)));

        // stacking a looser strict adaptor on a tighter one fails too
        let full = NeighbourList::new(Centers::new(), 2.0, false).unwrap();
        let strict = Strict::new(full, 1.0).unwrap();
        let error = Strict::new(strict, 1.5).err().unwrap();
        assert!(matches!(error, Error::CutoffTooLoose(_)));
    }

    #[test]
    fn square_grid_neighbour_counts() {
        // 9 atoms on a 3x3 square grid with unit spacing; with a cutoff of
        // exactly the spacing, corners have 2 neighbours, edge midpoints 3,
        // and the center 4
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        for i in 0..3 {
            for j in 0..3 {
                structure.add_atom(1, Vector3D::new(i as f64, j as f64, 0.0));
            }
        }

        let manager = strict_over_full(structure, 1.0, 1.0);

        let expected = [2, 3, 2, 3, 4, 3, 2, 3, 2];
        for atom in manager.atoms() {
            assert_eq!(atom.size(), expected[atom.index()]);
        }
        assert_eq!(manager.nb_clusters(2).unwrap(), 24);
    }

    #[test]
    fn boundary_pair_is_kept() {
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));

        let manager = strict_over_full(structure, 1.0, 1.0);
        assert_eq!(manager.nb_clusters(2).unwrap(), 2);
    }

    #[test]
    fn periodic_shells() {
        // single atom in a cubic cell of side 2: 6 images at distance 2 and
        // 12 more at 2*sqrt(2)
        let manager = strict_over_full(cubic_crystal(2.0), 2.9, 2.05);
        assert_eq!(manager.nb_clusters(2).unwrap(), 6);

        let manager = strict_over_full(cubic_crystal(2.0), 2.9, 2.9);
        assert_eq!(manager.nb_clusters(2).unwrap(), 18);
    }

    #[test]
    fn growing_cutoffs_grow_the_list() {
        let mut previous = 0;
        for cutoff in [1.9, 2.05, 2.9, 3.5] {
            let manager = strict_over_full(cubic_crystal(2.0), 3.5, cutoff);
            let count = manager.nb_clusters(2).unwrap();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn distances_and_directions() {
        let manager = strict_over_full(cubic_crystal(2.0), 2.9, 2.9);

        for atom in manager.atoms() {
            let center = atom.position().unwrap();
            for pair in atom.clusters() {
                let vector = pair.position().unwrap() - center;
                let distance = manager.distance(&pair).unwrap();
                let direction = manager.direction_vector(&pair).unwrap();

                assert_relative_eq!(distance, vector.norm(), max_relative = 1e-12);
                assert_ulps_eq!(direction.norm(), 1.0);
                assert_relative_eq!(direction * distance, vector, max_relative = 1e-12);
                assert!(distance <= 2.9);
            }
        }
    }

    #[test]
    fn strict_over_half_list() {
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.0, 1.0, 0.0));

        let full = NeighbourList::new(Centers::new(), 1.2, false).unwrap();
        let half = HalfList::new(full).unwrap();
        let mut manager = Strict::new(half, 1.2).unwrap();
        manager.update(structure).unwrap();

        // the pair 1-2 (distance sqrt(2)) is dropped, the kept pairs still
        // go from lower to higher atom index
        let mut pairs = Vec::new();
        for atom in manager.atoms() {
            for pair in atom.clusters() {
                pairs.push((atom.atom_index(), pair.atom_index()));
                assert_ulps_eq!(manager.distance(&pair).unwrap(), 1.0);
            }
        }
        assert_eq!(pairs, [(0, 1), (0, 2)]);

        assert_eq!(manager.layer(2), 2);
    }

    #[test]
    fn skewed_cell_matches_cubic() {
        // shearing a cubic cell by a full lattice vector does not change
        // the structure, so strict neighbour counts are identical
        let cubic = strict_over_full(cubic_crystal(2.0), 2.9, 2.9);

        let mut cell = Matrix3::one() * 2.0;
        cell[1][0] = 2.0 * 10.0;
        let mut skewed = AtomicStructure::new(cell, [true; 3]);
        skewed.add_atom(29, Vector3D::new(0.0, 0.0, 0.0));
        let skewed = strict_over_full(skewed, 2.9, 2.9);

        assert_eq!(
            cubic.nb_clusters(2).unwrap(),
            skewed.nb_clusters(2).unwrap(),
        );
    }
}
