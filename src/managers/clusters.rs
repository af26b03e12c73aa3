use crate::types::Vector3D;
use crate::Error;

use super::StructureManager;

/// Maximum cluster order supported by the iteration machinery. Raising a
/// stack above this order panics when building the adaptor.
pub const MAX_CLUSTER_ORDER: usize = 8;

/// Per-order, layer-indexed cluster index records.
///
/// Each cluster of a given order has one record with `layers` slots: slot
/// `l` holds the dense cluster index assigned by the node that contributed
/// layer `l` for this order. Records are appended in construction order
/// during a node's rebuild and cleared wholesale before each rebuild, never
/// partially overwritten.
#[derive(Debug, Clone)]
pub struct ClusterIndices {
    layers: usize,
    data: Vec<usize>,
}

impl ClusterIndices {
    /// Create an empty container with the given number of layer slots per
    /// record
    pub fn new(layers: usize) -> ClusterIndices {
        assert!(layers > 0, "cluster index records need at least one layer");
        ClusterIndices {
            layers: layers,
            data: Vec::new(),
        }
    }

    /// Number of layer slots in each record
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Number of clusters recorded so far
    pub fn len(&self) -> usize {
        self.data.len() / self.layers
    }

    /// Is this container empty?
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove all records, keeping the layer count
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Reset the layer count and remove all records
    pub fn reset(&mut self, layers: usize) {
        assert!(layers > 0, "cluster index records need at least one layer");
        self.layers = layers;
        self.data.clear();
    }

    /// Append the record for the next cluster
    pub fn push(&mut self, record: &[usize]) {
        assert_eq!(record.len(), self.layers, "cluster index record has the wrong number of layers");
        self.data.extend_from_slice(record);
    }

    /// Append a record made of an inherited lower-node record plus the
    /// index newly assigned at this node
    pub fn push_extended(&mut self, inherited: &[usize], new_index: usize) {
        assert_eq!(inherited.len() + 1, self.layers, "cluster index record has the wrong number of layers");
        self.data.extend_from_slice(inherited);
        self.data.push(new_index);
    }

    /// Fill this container with `count` identity records (cluster `i` has
    /// index `i` at every layer)
    pub fn fill_sequence(&mut self, count: usize) {
        self.data.clear();
        self.data.reserve(count * self.layers);
        for i in 0..count {
            for _ in 0..self.layers {
                self.data.push(i);
            }
        }
    }

    /// Get the index of the given cluster at the given layer
    pub fn get(&self, cluster: usize, layer: usize) -> usize {
        assert!(layer < self.layers, "no cluster index assigned at layer {}", layer);
        self.data[cluster * self.layers + layer]
    }

    /// Get the full record of the given cluster
    pub fn record(&self, cluster: usize) -> &[usize] {
        let start = cluster * self.layers;
        &self.data[start..start + self.layers]
    }
}

/// A non-owning reference to one cluster (atom, pair, triplet, ...) of a
/// manager, produced by iteration.
///
/// A cluster of order `k` is identified by the ordered tuple of the atom
/// indices composing it and by its dense, node-local cluster index. Cluster
/// references are ephemeral: they borrow the manager and are only valid for
/// the scope of one iteration step.
pub struct ClusterRef<'a, M: StructureManager + ?Sized> {
    manager: &'a M,
    atoms: [usize; MAX_CLUSTER_ORDER],
    order: usize,
    index: usize,
}

impl<M: StructureManager + ?Sized> Clone for ClusterRef<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: StructureManager + ?Sized> Copy for ClusterRef<'_, M> {}

impl<'a, M: StructureManager + ?Sized> ClusterRef<'a, M> {
    pub(crate) fn new(manager: &'a M, atoms: [usize; MAX_CLUSTER_ORDER], order: usize, index: usize) -> ClusterRef<'a, M> {
        debug_assert!(order >= 1 && order <= MAX_CLUSTER_ORDER);
        ClusterRef {
            manager: manager,
            atoms: atoms,
            order: order,
            index: index,
        }
    }

    /// Order of this cluster: 1 for atoms, 2 for pairs, ...
    pub fn order(&self) -> usize {
        self.order
    }

    /// Flat cluster index of this cluster at the manager it was produced
    /// by, in construction/iteration order
    pub fn index(&self) -> usize {
        self.index
    }

    /// The ordered atom indices composing this cluster
    pub fn atom_indices(&self) -> &[usize] {
        &self.atoms[..self.order]
    }

    /// Atom index of the last atom of this cluster (the atom itself for
    /// order 1, the neighbour for order 2, ...)
    pub fn atom_index(&self) -> usize {
        self.atoms[self.order - 1]
    }

    /// Position of the last atom of this cluster
    pub fn position(&self) -> Result<Vector3D, Error> {
        self.manager.position(self.atom_index())
    }

    /// Atomic type of the last atom of this cluster
    pub fn atom_type(&self) -> Result<i32, Error> {
        self.manager.atom_type(self.atom_index())
    }

    /// Cluster index of this cluster as assigned at the given layer
    pub fn cluster_index(&self, layer: usize) -> usize {
        self.manager.cluster_index(self.order, self.index, layer)
    }

    /// Highest layer at which this cluster has an assigned index
    pub fn max_layer(&self) -> usize {
        self.manager.layer(self.order)
    }

    /// Order-1 cluster index addressing per-atom properties of the last
    /// atom of this cluster, also resolving ghost atoms
    pub fn neighbour_atom_cluster_index(&self) -> usize {
        self.manager.atom_cluster_index(self.atom_index())
    }

    /// Number of clusters of the next order below this cluster (e.g.
    /// number of neighbours of an atom); zero at the manager's top order
    pub fn size(&self) -> usize {
        if self.order == self.manager.max_order() {
            return 0;
        }
        return self.manager.cluster_size(self.order, self.index);
    }

    /// Iterate over the clusters of the next order below this cluster
    pub fn clusters(&self) -> Clusters<'a, M> {
        let (start, stop) = if self.order == self.manager.max_order() {
            (0, 0)
        } else {
            let offset = self.manager.cluster_offset(self.order, self.index);
            (offset, offset + self.manager.cluster_size(self.order, self.index))
        };

        Clusters {
            manager: self.manager,
            parent_atoms: self.atoms,
            parent_order: self.order,
            position: start,
            stop: stop,
        }
    }
}

impl<'a, M: StructureManager + ?Sized> IntoIterator for &ClusterRef<'a, M> {
    type Item = ClusterRef<'a, M>;
    type IntoIter = Clusters<'a, M>;

    fn into_iter(self) -> Clusters<'a, M> {
        self.clusters()
    }
}

/// Iterator over the order-1 clusters (atoms) of a manager, yielding
/// [`ClusterRef`]s in storage order
pub struct Atoms<'a, M: StructureManager + ?Sized> {
    manager: &'a M,
    current: usize,
    stop: usize,
}

impl<'a, M: StructureManager + ?Sized> Atoms<'a, M> {
    pub(crate) fn new(manager: &'a M, count: usize) -> Atoms<'a, M> {
        Atoms {
            manager: manager,
            current: 0,
            stop: count,
        }
    }
}

impl<'a, M: StructureManager + ?Sized> Iterator for Atoms<'a, M> {
    type Item = ClusterRef<'a, M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.stop {
            return None;
        }

        let index = self.current;
        self.current += 1;

        let mut atoms = [0; MAX_CLUSTER_ORDER];
        atoms[0] = index;
        return Some(ClusterRef::new(self.manager, atoms, 1, index));
    }
}

/// Iterator over the next-order clusters below a parent cluster, yielding
/// [`ClusterRef`]s whose atom tuple is the parent's tuple with one atom
/// appended. Iteration order matches construction order, which keeps
/// property push-back aligned with cluster indices.
pub struct Clusters<'a, M: StructureManager + ?Sized> {
    manager: &'a M,
    parent_atoms: [usize; MAX_CLUSTER_ORDER],
    parent_order: usize,
    position: usize,
    stop: usize,
}

impl<'a, M: StructureManager + ?Sized> Iterator for Clusters<'a, M> {
    type Item = ClusterRef<'a, M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.stop {
            return None;
        }

        let position = self.position;
        self.position += 1;

        let order = self.parent_order + 1;
        let mut atoms = self.parent_atoms;
        atoms[order - 1] = self.manager.neighbour_atom(order, position);
        return Some(ClusterRef::new(self.manager, atoms, order, position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_indices_records() {
        let mut indices = ClusterIndices::new(2);
        indices.push(&[0, 0]);
        indices.push_extended(&[1], 4);

        assert_eq!(indices.len(), 2);
        assert_eq!(indices.get(0, 0), 0);
        assert_eq!(indices.get(1, 0), 1);
        assert_eq!(indices.get(1, 1), 4);
        assert_eq!(indices.record(1), [1, 4]);
    }

    #[test]
    fn cluster_indices_fill_sequence() {
        let mut indices = ClusterIndices::new(1);
        indices.fill_sequence(3);

        assert_eq!(indices.len(), 3);
        for i in 0..3 {
            assert_eq!(indices.get(i, 0), i);
        }
    }

    #[test]
    #[should_panic(expected = "no cluster index assigned at layer 1")]
    fn cluster_indices_missing_layer() {
        let mut indices = ClusterIndices::new(1);
        indices.fill_sequence(2);
        let _ = indices.get(0, 1);
    }
}
