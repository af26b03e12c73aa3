//! Structure managers: an atomic structure wrapped in a stack of adaptors,
//! each exposing the same iteration interface over atoms, pairs, triplets,
//! and so on.
//!
//! The root of every stack is a [`Centers`] manager owning the raw
//! [`AtomicStructure`]. Adaptors wrap the manager below them by value and
//! derive their own neighbour data from it: [`NeighbourList`] builds a full
//! periodic pair list with ghost atoms, [`HalfList`] keeps each unordered
//! pair once, [`Strict`] filters by cutoff and caches distances, and
//! [`MaxOrder`] lifts pairs to triplets (and higher).

use crate::types::{Matrix3, Vector3D};
use crate::Error;

mod lattice;
pub use self::lattice::Lattice;

mod structure;
pub use self::structure::AtomicStructure;

mod clusters;
pub use self::clusters::{Atoms, ClusterIndices, ClusterRef, Clusters, MAX_CLUSTER_ORDER};

mod property;
pub use self::property::{Property, PropertyStore};

mod centers;
pub use self::centers::Centers;

mod neighbour_list;
pub use self::neighbour_list::NeighbourList;

mod half_list;
pub use self::half_list::HalfList;

mod strict;
pub use self::strict::Strict;

mod max_order;
pub use self::max_order::MaxOrder;

mod stack;
pub use self::stack::{build_stack, AdaptorParameters};

/// A node in an adaptor stack.
///
/// The trait is the narrow contract every adaptor presents to the one above
/// it: sizes and cluster counts, per-atom geometry, the offset/neighbour
/// arrays describing adjacency between successive orders, and the
/// layer-indexed cluster index records used to address [`Property`] storage.
///
/// Orders are 1-based: order 1 is atoms, order 2 pairs, order 3 triplets.
/// All indexed accessors (`cluster_size`, `neighbour_atom`, `cluster_index`,
/// ...) expect in-range arguments and panic otherwise; they are only
/// reachable through iteration of a freshly built manager. Out-of-contract
/// *requests* (unknown order in `nb_clusters`, geometry before any update)
/// are reported as errors.
pub trait StructureManager {
    /// Number of central (real) atoms
    fn size(&self) -> usize;

    /// Number of atoms including the ghost atoms generated for periodic
    /// images
    fn size_with_ghosts(&self) -> usize;

    /// Highest cluster order this manager produces
    fn max_order(&self) -> usize;

    /// Number of clusters of the given order, i.e. atoms (order 1), pairs
    /// (order 2), triplets (order 3), ...
    fn nb_clusters(&self, order: usize) -> Result<usize, Error>;

    /// Cutoff radius used to build the pair list below this node, if any
    fn cutoff(&self) -> Option<f64>;

    /// Cutoff radius already strictly enforced on the pair list, if any.
    /// This is what a [`Strict`] adaptor stacked on top is checked against.
    fn strict_cutoff(&self) -> Option<f64>;

    /// Position of the given atom; also resolves ghost atoms
    fn position(&self, atom_index: usize) -> Result<Vector3D, Error>;

    /// Atomic type of the given atom; also resolves ghost atoms
    fn atom_type(&self, atom_index: usize) -> Result<i32, Error>;

    /// Unit cell matrix, rows are the cell vectors
    fn cell(&self) -> Result<Matrix3, Error>;

    /// Periodic boundary flags, one per cell vector
    fn periodicity(&self) -> Result<[bool; 3], Error>;

    /// Number of order `order + 1` clusters below the given cluster of
    /// `order` (e.g. number of neighbours of an atom for `order == 1`)
    fn cluster_size(&self, order: usize, cluster_index: usize) -> usize;

    /// Start of the given cluster's children in the flattened neighbour
    /// array of order `order + 1`
    fn cluster_offset(&self, order: usize, cluster_index: usize) -> usize;

    /// Atom index stored at `position` in the flattened neighbour array of
    /// the given (child) order
    fn neighbour_atom(&self, order: usize, position: usize) -> usize;

    /// Layer of the given order at this node: the number of cluster-index
    /// assignments contributed for that order by the stack up to and
    /// including this node, minus one
    fn layer(&self, order: usize) -> usize;

    /// Cluster index of the `cluster_index`-th cluster of `order`, as
    /// assigned at the given layer
    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize;

    /// Order-1 cluster index to use for per-atom property lookups of the
    /// given atom, resolving ghost atoms to an addressable entry
    fn atom_cluster_index(&self, atom_index: usize) -> usize;

    /// For clusters built by extending an atom's pair list: the atom's
    /// order-1 cluster index and the position in its pair list that produced
    /// this cluster's last member. `None` when the cluster was not built
    /// that way (e.g. order-1 clusters).
    fn cluster_anchor(&self, order: usize, cluster_index: usize) -> Option<(usize, usize)>;

    /// Properties attached to this node
    fn properties(&self) -> &PropertyStore;

    /// Mutable access to the properties attached to this node
    fn properties_mut(&mut self) -> &mut PropertyStore;

    /// The store holding a property of the given name: this node's own
    /// store if the name is registered here, otherwise the closest node
    /// below that registered it
    fn property_owner(&self, name: &str) -> Option<&PropertyStore>;

    /// Does this node's derived data match the current structure below it?
    fn is_fresh(&self) -> bool;

    /// Replace the structure at the root of the stack and mark every node's
    /// derived data as stale. Recomputation happens in [`refresh`], not
    /// here.
    ///
    /// [`refresh`]: StructureManager::refresh
    fn update_structure(&mut self, structure: AtomicStructure) -> Result<(), Error>;

    /// Rebuild this node's derived data (and anything stale below it) from
    /// the current structure. Does nothing if already fresh.
    fn refresh(&mut self) -> Result<(), Error>;

    /// Replace the structure and rebuild the whole stack
    fn update(&mut self, structure: AtomicStructure) -> Result<(), Error>
        where Self: Sized
    {
        self.update_structure(structure)?;
        return self.refresh();
    }

    /// Iterate over the central atoms of this manager
    fn atoms(&self) -> Atoms<'_, Self>
        where Self: Sized
    {
        return Atoms::new(self, self.size());
    }

    /// Iterate over all order-1 clusters of this manager, including ghost
    /// atoms when the neighbour list below was built with
    /// `consider_ghost_neighbours`
    fn atoms_with_ghosts(&self) -> Atoms<'_, Self>
        where Self: Sized
    {
        let count = self.nb_clusters(1).unwrap_or(0);
        return Atoms::new(self, count);
    }
}

impl<M: StructureManager + ?Sized> StructureManager for Box<M> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn size_with_ghosts(&self) -> usize {
        (**self).size_with_ghosts()
    }

    fn max_order(&self) -> usize {
        (**self).max_order()
    }

    fn nb_clusters(&self, order: usize) -> Result<usize, Error> {
        (**self).nb_clusters(order)
    }

    fn cutoff(&self) -> Option<f64> {
        (**self).cutoff()
    }

    fn strict_cutoff(&self) -> Option<f64> {
        (**self).strict_cutoff()
    }

    fn position(&self, atom_index: usize) -> Result<Vector3D, Error> {
        (**self).position(atom_index)
    }

    fn atom_type(&self, atom_index: usize) -> Result<i32, Error> {
        (**self).atom_type(atom_index)
    }

    fn cell(&self) -> Result<Matrix3, Error> {
        (**self).cell()
    }

    fn periodicity(&self) -> Result<[bool; 3], Error> {
        (**self).periodicity()
    }

    fn cluster_size(&self, order: usize, cluster_index: usize) -> usize {
        (**self).cluster_size(order, cluster_index)
    }

    fn cluster_offset(&self, order: usize, cluster_index: usize) -> usize {
        (**self).cluster_offset(order, cluster_index)
    }

    fn neighbour_atom(&self, order: usize, position: usize) -> usize {
        (**self).neighbour_atom(order, position)
    }

    fn layer(&self, order: usize) -> usize {
        (**self).layer(order)
    }

    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize {
        (**self).cluster_index(order, cluster_index, layer)
    }

    fn atom_cluster_index(&self, atom_index: usize) -> usize {
        (**self).atom_cluster_index(atom_index)
    }

    fn cluster_anchor(&self, order: usize, cluster_index: usize) -> Option<(usize, usize)> {
        (**self).cluster_anchor(order, cluster_index)
    }

    fn properties(&self) -> &PropertyStore {
        (**self).properties()
    }

    fn properties_mut(&mut self) -> &mut PropertyStore {
        (**self).properties_mut()
    }

    fn property_owner(&self, name: &str) -> Option<&PropertyStore> {
        (**self).property_owner(name)
    }

    fn is_fresh(&self) -> bool {
        (**self).is_fresh()
    }

    fn update_structure(&mut self, structure: AtomicStructure) -> Result<(), Error> {
        (**self).update_structure(structure)
    }

    fn refresh(&mut self) -> Result<(), Error> {
        (**self).refresh()
    }
}

/// Parallel `nb_neigh`/`offsets`/`atom_indices` arrays describing the
/// adjacency between one order and the next, in iteration order.
///
/// Invariant: `offsets[i]` is the sum of `nb_neigh[0..i]`, and
/// `atom_indices[offsets[i]..offsets[i] + nb_neigh[i]]` are exactly the
/// neighbours of parent cluster `i`. `parents[p]` is the parent cluster of
/// the `p`-th entry in `atom_indices`.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdjacencyArrays {
    pub nb_neigh: Vec<usize>,
    pub offsets: Vec<usize>,
    pub atom_indices: Vec<usize>,
    pub parents: Vec<usize>,
}

impl AdjacencyArrays {
    pub fn new() -> AdjacencyArrays {
        AdjacencyArrays::default()
    }

    pub fn clear(&mut self) {
        self.nb_neigh.clear();
        self.offsets.clear();
        self.atom_indices.clear();
        self.parents.clear();
    }

    /// Record the neighbours of the next parent cluster
    pub fn push_cluster(&mut self, parent: usize, neighbours: &[usize]) {
        self.offsets.push(self.atom_indices.len());
        self.nb_neigh.push(neighbours.len());
        for &neighbour in neighbours {
            self.atom_indices.push(neighbour);
            self.parents.push(parent);
        }
    }

    /// Total number of child clusters
    pub fn len(&self) -> usize {
        self.atom_indices.len()
    }

    /// Position of child cluster `p` inside its parent's neighbour list
    pub fn position_in_parent(&self, p: usize) -> usize {
        p - self.offsets[self.parents[p]]
    }
}
