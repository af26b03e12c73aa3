use crate::types::{Matrix3, Vector3D};
use crate::Error;

use super::{AdjacencyArrays, AtomicStructure, ClusterIndices, PropertyStore, StructureManager};

/// Adaptor reducing a full pair list to a minimal (half) one: of the two
/// directed copies of each pair, only the one going from the lower to the
/// higher atom index is kept.
///
/// Atoms pass through unchanged. The surviving pairs get new dense indices
/// at a new layer; the indices of the manager below stay addressable, so
/// properties attached at lower nodes remain reachable through the kept
/// direction.
pub struct HalfList<M> {
    inner: M,
    pairs: AdjacencyArrays,
    pair_tags: ClusterIndices,
    properties: PropertyStore,
    fresh: bool,
}

impl<M: StructureManager> HalfList<M> {
    /// Wrap `inner`, which must provide pairs
    pub fn new(inner: M) -> Result<HalfList<M>, Error> {
        if inner.max_order() < 2 {
            return Err(Error::InvalidParameter(
                "can not build a half pair list: the underlying manager does not provide pairs".into()
            ));
        }

        let pair_layers = inner.layer(2) + 2;
        Ok(HalfList {
            inner: inner,
            pairs: AdjacencyArrays::new(),
            pair_tags: ClusterIndices::new(pair_layers),
            properties: PropertyStore::new(),
            fresh: false,
        })
    }

    #[time_graph::instrument(name = "HalfList::rebuild")]
    fn rebuild(&mut self) -> Result<(), Error> {
        let n_atoms = self.inner.nb_clusters(1)?;
        let inherited_layers = self.pair_tags.layers() - 1;

        self.pairs.clear();
        self.pair_tags.clear();

        let mut kept = Vec::new();
        let mut inherited = Vec::new();
        for center in 0..n_atoms {
            let offset = self.inner.cluster_offset(1, center);
            let size = self.inner.cluster_size(1, center);

            kept.clear();
            for position in offset..offset + size {
                let neighbour = self.inner.neighbour_atom(2, position);
                if center < neighbour {
                    kept.push(neighbour);

                    inherited.clear();
                    for layer in 0..inherited_layers {
                        inherited.push(self.inner.cluster_index(2, position, layer));
                    }
                    self.pair_tags.push_extended(&inherited, self.pairs.len() + kept.len() - 1);
                }
            }
            self.pairs.push_cluster(center, &kept);
        }

        return Ok(());
    }
}

impl<M: StructureManager> StructureManager for HalfList<M> {
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
