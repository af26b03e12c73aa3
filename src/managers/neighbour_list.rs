use log::warn;
use ndarray::Array3;

use crate::types::{Matrix3, Vector3D};
use crate::Error;

use super::{AdjacencyArrays, ClusterIndices, PropertyStore, StructureManager};

/// Above this number of mesh boxes the cutoff/cell combination is a
/// documented performance cliff; the build still proceeds.
const MESH_SIZE_WARN_THRESHOLD: usize = 100_000;

/// Adaptor building a full periodic neighbour list on top of any order-1
/// manager, raising the maximum order from 1 to 2.
///
/// The list is built with a linked-cell algorithm: a cartesian mesh with
/// boxes of size `cutoff` is anchored at the cell origin and extended by one
/// cutoff (plus a small epsilon) of halo in every direction, so that only
/// the 27 boxes around an atom's own box need to be searched. Periodicity,
/// including triclinic skew, is handled by generating ghost copies of the
/// atoms for every cell repetition whose image can fall inside the mesh.
/// The resulting list is full (both directions of each pair) and not
/// strict: it contains every pair within the cutoff and some beyond it,
/// to be reduced by the [`Strict`](super::Strict) adaptor downstream.
pub struct NeighbourList<M> {
    inner: M,
    cutoff: f64,
    consider_ghost_neighbours: bool,
    ghost_positions: Vec<Vector3D>,
    ghost_types: Vec<i32>,
    ghost_origins: Vec<usize>,
    pairs: AdjacencyArrays,
    atom_tags: ClusterIndices,
    pair_tags: ClusterIndices,
    properties: PropertyStore,
    fresh: bool,
}

impl<M: StructureManager> NeighbourList<M> {
    /// Wrap `inner` and build neighbour lists with the given cutoff on the
    /// next refresh. With `consider_ghost_neighbours`, ghost atoms get
    /// neighbour lists of their own and count as order-1 clusters.
    pub fn new(inner: M, cutoff: f64, consider_ghost_neighbours: bool) -> Result<NeighbourList<M>, Error> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "expected a positive cutoff for the neighbour list, got {}", cutoff
            )));
        }

        let atom_layers = inner.layer(1) + 1;
        Ok(NeighbourList {
            inner: inner,
            cutoff: cutoff,
            consider_ghost_neighbours: consider_ghost_neighbours,
            ghost_positions: Vec::new(),
            ghost_types: Vec::new(),
            ghost_origins: Vec::new(),
            pairs: AdjacencyArrays::new(),
            atom_tags: ClusterIndices::new(atom_layers),
            pair_tags: ClusterIndices::new(1),
            properties: PropertyStore::new(),
            fresh: false,
        })
    }

    /// Ghost atoms generated by the last rebuild, as
    /// (position, type, originating real atom) parallel slices
    pub fn ghosts(&self) -> (&[Vector3D], &[i32], &[usize]) {
        (&self.ghost_positions, &self.ghost_types, &self.ghost_origins)
    }

    #[time_graph::instrument(name = "NeighbourList::rebuild")]
    fn rebuild(&mut self) -> Result<(), Error> {
        let cell = self.inner.cell()?;
        let pbc = self.inner.periodicity()?;
        let n_real = self.inner.size();
        let cutoff = self.cutoff;

        // Mesh bounds, relative to the cell origin: the mesh covers the
        // cell extents plus one cutoff of halo; the epsilon on the lower
        // side avoids binning ambiguity for atoms exactly at the origin.
        let mut mesh_min = Vector3D::zero();
        let mut mesh_max = Vector3D::zero();
        let mut nboxes = [0_usize; 3];
        for i in 0..3 {
            let mut min_coord = f64::min(0.0, cell[0][i]);
            let mut max_coord = f64::max(0.0, cell[0][i]);
            for vector in 1..3 {
                min_coord = f64::min(min_coord, cell[vector][i]);
                max_coord = f64::max(max_coord, cell[vector][i]);
            }

            let epsilon = 0.25 * cutoff;
            mesh_min[i] = min_coord - cutoff - epsilon;
            let lmesh = mesh_min[i].abs() + max_coord + 2.0 * cutoff;
            let n = f64::ceil(lmesh / cutoff) as usize;
            mesh_max[i] = n as f64 * cutoff - mesh_min[i].abs();
            nboxes[i] = n;
        }

        if nboxes[0] * nboxes[1] * nboxes[2] > MESH_SIZE_WARN_THRESHOLD {
            warn!(
                "the neighbour list mesh contains {} boxes ({}x{}x{}), this \
                 cutoff/cell combination will be slow",
                nboxes[0] * nboxes[1] * nboxes[2], nboxes[0], nboxes[1], nboxes[2]
            );
        }

        // Number of cell repetitions whose images can reach into the mesh,
        // in units of cell vectors. Solved from the mesh corners through
        // the cell inverse to account for triclinic skew.
        let mut m_min = [0_i32; 3];
        let mut m_max = [0_i32; 3];
        if pbc.iter().any(|&periodic| periodic) {
            if cell.determinant() == 0.0 {
                return Err(Error::InvalidParameter(
                    "invalid unit cell: periodic boundaries with a singular cell matrix".into()
                ));
            }
            let inverse = cell.inverse();

            let mut fractional_min = Vector3D::zero();
            let mut fractional_max = Vector3D::zero();
            for (corner, position) in mesh_corners(mesh_min, mesh_max).iter().enumerate() {
                let fractional = position * inverse;
                for i in 0..3 {
                    if corner == 0 {
                        fractional_min[i] = fractional[i];
                        fractional_max[i] = fractional[i];
                    } else {
                        fractional_min[i] = f64::min(fractional_min[i], fractional[i]);
                        fractional_max[i] = f64::max(fractional_max[i], fractional[i]);
                    }
                }
            }

            for i in 0..3 {
                if pbc[i] {
                    m_min[i] = fractional_min[i].floor() as i32;
                    m_max[i] = fractional_max[i].ceil() as i32;
                }
            }
        }

        // generate ghost atoms: every non-zero repetition of every real
        // atom that falls inside the mesh
        self.ghost_positions.clear();
        self.ghost_types.clear();
        self.ghost_origins.clear();
        for atom in 0..n_real {
            let position = self.inner.position(atom)?;
            let atom_type = self.inner.atom_type(atom)?;

            for image in periodic_images(m_min, m_max) {
                if image == [0, 0, 0] {
                    continue;
                }

                let mut ghost = position;
                for i in 0..3 {
                    ghost += f64::from(image[i]) * Vector3D::from(cell[i]);
                }

                if position_in_bounds(mesh_min, mesh_max, ghost) {
                    self.ghost_positions.push(ghost);
                    self.ghost_types.push(atom_type);
                    self.ghost_origins.push(atom);
                }
            }
        }
        let n_ghosts = self.ghost_positions.len();

        // sort real and ghost atoms into mesh boxes
        let box_index = |position: Vector3D| -> [usize; 3] {
            let mut index = [0_usize; 3];
            for i in 0..3 {
                let value = f64::floor((position[i] - mesh_min[i]) / cutoff) as isize;
                index[i] = value.clamp(0, nboxes[i] as isize - 1) as usize;
            }
            return index;
        };

        let mut boxes = Array3::<Vec<usize>>::from_elem((nboxes[0], nboxes[1], nboxes[2]), Vec::new());
        for atom in 0..n_real {
            let index = box_index(self.inner.position(atom)?);
            boxes[index].push(atom);
        }
        for ghost in 0..n_ghosts {
            let index = box_index(self.ghost_positions[ghost]);
            boxes[index].push(n_real + ghost);
        }

        // scan the 27-box stencil around every center and collect
        // everything except the center itself
        let n_centers = if self.consider_ghost_neighbours {
            n_real + n_ghosts
        } else {
            n_real
        };

        let mut pairs = AdjacencyArrays::new();
        let mut found = Vec::new();
        for center in 0..n_centers {
            let position = if center < n_real {
                self.inner.position(center)?
            } else {
                self.ghost_positions[center - n_real]
            };
            let index = box_index(position);

            found.clear();
            for dx in -1..=1_isize {
                for dy in -1..=1_isize {
                    for dz in -1..=1_isize {
                        let shifted = [
                            index[0] as isize + dx,
                            index[1] as isize + dy,
                            index[2] as isize + dz,
                        ];
                        if shifted.iter().zip(&nboxes).any(|(&s, &n)| s < 0 || s >= n as isize) {
                            continue;
                        }

                        let in_box = &boxes[[shifted[0] as usize, shifted[1] as usize, shifted[2] as usize]];
                        for &atom in in_box {
                            if atom != center {
                                found.push(atom);
                            }
                        }
                    }
                }
            }
            // the stencil visits boxes in an arbitrary spatial order; sort
            // so that each list comes out in increasing atom index
            found.sort_unstable();
            pairs.push_cluster(center, &found);
        }

        // register the cluster index assignments for this node: identity
        // for atoms (real atoms keep the indices of the manager below,
        // ghosts extend the same sequence), sequential fill for pairs
        self.atom_tags.clear();
        let mut record = Vec::new();
        for atom in 0..n_real {
            record.clear();
            for layer in 0..self.atom_tags.layers() {
                record.push(self.inner.cluster_index(1, atom, layer));
            }
            self.atom_tags.push(&record);
        }
        for ghost in 0..n_ghosts {
            record.clear();
            record.resize(self.atom_tags.layers(), n_real + ghost);
            self.atom_tags.push(&record);
        }

        self.pair_tags.fill_sequence(pairs.len());
        self.pairs = pairs;

        return Ok(());
    }
}

/// The eight corners of the axis-aligned box spanned by `min` and `max`
fn mesh_corners(min: Vector3D, max: Vector3D) -> [Vector3D; 8] {
    let mut corners = [Vector3D::zero(); 8];
    for (c, corner) in corners.iter_mut().enumerate() {
        for i in 0..3 {
            corner[i] = if c & (1 << i) == 0 { min[i] } else { max[i] };
        }
    }
    return corners;
}

/// All integer repetition vectors in the given per-axis ranges, inclusive
fn periodic_images(m_min: [i32; 3], m_max: [i32; 3]) -> Vec<[i32; 3]> {
    let mut images = Vec::new();
    for x in m_min[0]..=m_max[0] {
        for y in m_min[1]..=m_max[1] {
            for z in m_min[2]..=m_max[2] {
                images.push([x, y, z]);
            }
        }
    }
    return images;
}

/// Is the position strictly inside the box spanned by `min` and `max`?
fn position_in_bounds(min: Vector3D, max: Vector3D, position: Vector3D) -> bool {
    for i in 0..3 {
        if position[i] <= min[i] || position[i] >= max[i] {
            return false;
        }
    }
    return true;
}

impl<M: StructureManager> StructureManager for NeighbourList<M> {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn size_with_ghosts(&self) -> usize {
        self.inner.size() + self.ghost_positions.len()
    }

    fn max_order(&self) -> usize {
        2
    }

    fn nb_clusters(&self, order: usize) -> Result<usize, Error> {
        match order {
            1 => {
                if self.consider_ghost_neighbours {
                    Ok(self.size_with_ghosts())
                } else {
                    Ok(self.size())
                }
            }
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
        // the linked-cell list is full, not strict: it contains pairs
        // beyond the cutoff
        None
    }

    fn position(&self, atom_index: usize) -> Result<Vector3D, Error> {
        let n_real = self.inner.size();
        if atom_index < n_real {
            return self.inner.position(atom_index);
        }
        return Ok(self.ghost_positions[atom_index - n_real]);
    }

    fn atom_type(&self, atom_index: usize) -> Result<i32, Error> {
        let n_real = self.inner.size();
        if atom_index < n_real {
            return self.inner.atom_type(atom_index);
        }
        return Ok(self.ghost_types[atom_index - n_real]);
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
            2 => 0,
            _ => panic!("only atoms and pairs are available from this manager"),
        }
    }

    fn cluster_index(&self, order: usize, cluster_index: usize, layer: usize) -> usize {
        match order {
            1 => self.atom_tags.get(cluster_index, layer),
            2 => self.pair_tags.get(cluster_index, layer),
            _ => panic!("only atoms and pairs are available from this manager"),
        }
    }

    fn atom_cluster_index(&self, atom_index: usize) -> usize {
        let n_real = self.inner.size();
        if atom_index < n_real {
            return self.inner.atom_cluster_index(atom_index);
        }

        if self.consider_ghost_neighbours {
            // ghosts are order-1 clusters of their own
            return atom_index;
        }
        // resolve the ghost to its real origin, whose per-atom properties
        // it shares
        return self.ghost_origins[atom_index - n_real];
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

    fn update_structure(&mut self, structure: super::AtomicStructure) -> Result<(), Error> {
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
