use crate::types::{Matrix3, Vector3D};
use crate::Error;

use super::{AdjacencyArrays, AtomicStructure, ClusterIndices, MAX_CLUSTER_ORDER};
use super::{PropertyStore, StructureManager};

/// Adaptor raising the maximum cluster order by one: pairs become triplets,
/// triplets become quadruplets, and so on.
///
/// A cluster of order `k` is extended through its anchor: the pair list
/// entry of its first atom that produced its last member. Appending every
/// atom stored *after* that entry in the first atom's pair list yields each
/// new cluster exactly once (on a half list, each unordered tuple once; on
/// a full list, once per ordering of the first atom). All lower orders pass
/// through unchanged.
pub struct MaxOrder<M> {
    inner: M,
    clusters: AdjacencyArrays,
    /// anchor (first atom, pair list position) of each new cluster, for
    /// further extension by another adaptor on top
    anchors: Vec<(usize, usize)>,
    tags: ClusterIndices,
    properties: PropertyStore,
    fresh: bool,
}

impl<M: StructureManager> MaxOrder<M> {
    /// Wrap `inner`, which must provide pairs, raising its maximum order
    /// by one.
    ///
    /// # Panics
    ///
    /// If the new order would exceed [`MAX_CLUSTER_ORDER`].
    pub fn new(inner: M) -> Result<MaxOrder<M>, Error> {
        if inner.max_order() < 2 {
            return Err(Error::InvalidParameter(
                "can not raise the cluster order: the underlying manager does not provide pairs".into()
            ));
        }

        assert!(
            inner.max_order() < MAX_CLUSTER_ORDER,
            "can not raise the cluster order above {}", MAX_CLUSTER_ORDER
        );

        Ok(MaxOrder {
            inner: inner,
            clusters: AdjacencyArrays::new(),
            anchors: Vec::new(),
            tags: ClusterIndices::new(1),
            properties: PropertyStore::new(),
            fresh: false,
        })
    }

    #[time_graph::instrument(name = "MaxOrder::rebuild")]
    fn rebuild(&mut self) -> Result<(), Error> {
        let order_below = self.inner.max_order();
        let n_clusters = self.inner.nb_clusters(order_below)?;

        self.clusters.clear();
        self.anchors.clear();

        let mut extensions = Vec::new();
        for cluster in 0..n_clusters {
            let (anchor_atom, anchor_position) = self.inner.cluster_anchor(order_below, cluster)
                .ok_or_else(|| Error::Internal(format!(
                    "no extension anchor for cluster {} of order {}", cluster, order_below
                )))?;

            let offset = self.inner.cluster_offset(1, anchor_atom);
            let size = self.inner.cluster_size(1, anchor_atom);

            extensions.clear();
            for position in (anchor_position + 1)..size {
                extensions.push(self.inner.neighbour_atom(2, offset + position));
                self.anchors.push((anchor_atom, position));
            }
            self.clusters.push_cluster(cluster, &extensions);
        }

        self.tags.fill_sequence(self.clusters.len());
        return Ok(());
    }
}

impl<M: StructureManager> StructureManager for MaxOrder<M> {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn size_with_ghosts(&self) -> usize {
        self.inner.size_with_ghosts()
    }

    fn max_order(&self) -> usize {
        self.inner.max_order() + 1
    }

    fn nb_clusters(&self, order: usize) -> Result<usize, Error> {
        if order == self.max_order() {
            return Ok(self.clusters.len());
        }
        if order < self.max_order() {
            return self.inner.nb_clusters(order);
        }
        return Err(Error::UnsupportedOrder(format!(
            "clusters up to order {} are available from this manager, requested order {}",
            self.max_order(), order
        )));
    }

    fn cutoff(&self) -> Option<f64> {
        self.inner.cutoff()
    }

    fn strict_cutoff(&self) -> Option<f64> {
        self.inner.strict_cutoff()
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
        if order + 1 == self.max_order() {
            return self.clusters.nb_neigh[cluster_index];
        }
        return self.inner.cluster_size(order, cluster_index);
    }

    fn cluster_offset(&self, order: usize, cluster_index: usize) -> usize {
        if order + 1 == self.max_order() {
            return self.clusters.offsets[cluster_index];
        }
        return self.inner.cluster_offset(order, cluster_index);
    }

    fn neighbour_atom(&self, order: usize, position: usize) -> usize {
        if order == self.max_order() {
            return self.clusters.atom_indices[position];
        }
        return self.inner.neighbour_atom(order, position);
    }

    fn layer(&self, order: usize) -> usize {
        if order == self.max_order() {
            return 0;
        }
        return self.inner.layer(order);
    }

    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize {
        if order == self.max_order() {
            return self.tags.get(cluster_index, layer);
        }
        return self.inner.cluster_index(order, cluster_index, layer);
    }

    fn atom_cluster_index(&self, atom_index: usize) -> usize {
        self.inner.atom_cluster_index(atom_index)
    }

    fn cluster_anchor(&self, order: usize, cluster_index: usize) -> Option<(usize, usize)> {
        if order == self.max_order() {
            return Some(self.anchors[cluster_index]);
        }
        return self.inner.cluster_anchor(order, cluster_index);
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
    use super::super::{Centers, HalfList, NeighbourList};
    use super::*;

    fn triangle() -> AtomicStructure {
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.0, 1.0, 0.0));
        return structure;
    }

    fn half_list(cutoff: f64) -> HalfList<NeighbourList<Centers>> {
        let full = NeighbourList::new(Centers::new(), cutoff, false).unwrap();
        return HalfList::new(full).unwrap();
    }

    #[test]
    fn rejects_atoms_only_manager() {
        let error = MaxOrder::new(Centers::new()).err().unwrap();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn triplets_from_half_list() {
        let mut manager = MaxOrder::new(half_list(1.2)).unwrap();
        manager.update(triangle()).unwrap();

        assert_eq!(manager.max_order(), 3);
        assert_eq!(manager.nb_clusters(3).unwrap(), 1);
        // pairs pass through unchanged
        assert_eq!(manager.nb_clusters(2).unwrap(), 3);
        assert_eq!(manager.layer(3), 0);

        let mut triplets = Vec::new();
        for atom in manager.atoms() {
            for pair in atom.clusters() {
                for triplet in pair.clusters() {
                    assert_eq!(triplet.order(), 3);
                    triplets.push(triplet.atom_indices().to_vec());
                }
            }
        }
        assert_eq!(triplets, [[0, 1, 2]]);
    }

    #[test]
    fn quadruplets() {
        // 4 atoms, all mutually within the cutoff: every unordered triple
        // and quadruple shows up exactly once
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.9, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.0, 0.9, 0.0));
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.9));

        let triplets = MaxOrder::new(half_list(1.5)).unwrap();
        let mut manager = MaxOrder::new(triplets).unwrap();
        manager.update(structure).unwrap();

        assert_eq!(manager.max_order(), 4);
        assert_eq!(manager.nb_clusters(3).unwrap(), 4);
        assert_eq!(manager.nb_clusters(4).unwrap(), 1);

        let mut quadruplets = Vec::new();
        for atom in manager.atoms() {
            for pair in atom.clusters() {
                for triplet in pair.clusters() {
                    for quadruplet in triplet.clusters() {
                        assert_eq!(quadruplet.size(), 0);
                        quadruplets.push(quadruplet.atom_indices().to_vec());
                    }
                }
            }
        }
        assert_eq!(quadruplets, [[0, 1, 2, 3]]);
    }

    #[test]
    fn cluster_counts_match_iteration() {
        let mut manager = MaxOrder::new(half_list(1.5)).unwrap();
        manager.update(triangle()).unwrap();

        let mut seen = 0;
        for atom in manager.atoms() {
            for pair in atom.clusters() {
                seen += pair.clusters().count();
                assert_eq!(pair.size(), pair.clusters().count());
            }
        }
        assert_eq!(seen, manager.nb_clusters(3).unwrap());
    }
}
