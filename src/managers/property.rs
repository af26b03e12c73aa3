use std::any::Any;

use indexmap::IndexMap;

use crate::Error;

use super::{ClusterRef, StructureManager};

/// A dense, typed per-cluster value container.
///
/// A property is created against one order and one layer; it is filled by
/// push-back in cluster construction order, so that the `i`-th pushed value
/// belongs to the cluster whose index at that layer is `i`. It is then read
/// back through a [`ClusterRef`] of the same order, using the cluster's
/// layer-specific index.
#[derive(Debug, Clone)]
pub struct Property<T> {
    order: usize,
    layer: usize,
    values: Vec<T>,
}

impl<T> Property<T> {
    /// Create an empty property for clusters of the given order, addressed
    /// by the indices assigned at the given layer
    pub fn new(order: usize, layer: usize) -> Property<T> {
        Property {
            order: order,
            layer: layer,
            values: Vec::new(),
        }
    }

    /// Order of the clusters this property stores values for
    pub fn order(&self) -> usize {
        self.order
    }

    /// Layer whose cluster indices address this property
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Number of values stored
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is this property empty?
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove all values, e.g. before re-filling on a manager rebuild
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Append the value for the next cluster, in construction order
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Access a value by raw cluster index at this property's layer
    pub fn get(&self, index: usize) -> &T {
        &self.values[index]
    }

    /// Access the value stored for the given cluster
    ///
    /// This fails if the cluster has a different order than this property,
    /// or if the cluster comes from below the layer this property was
    /// created at.
    pub fn value<M>(&self, cluster: &ClusterRef<'_, M>) -> Result<&T, Error>
        where M: StructureManager + ?Sized
    {
        if cluster.order() != self.order {
            return Err(Error::PropertyTypeMismatch(format!(
                "incompatible property order: accessed with a cluster of order {}, \
                 this property is of order {}", cluster.order(), self.order
            )));
        }

        if self.layer > cluster.max_layer() {
            return Err(Error::PropertyTypeMismatch(format!(
                "wrong layer in stack: this property lives at layer {}, but the \
                 cluster only carries indices up to layer {}", self.layer, cluster.max_layer()
            )));
        }

        return Ok(&self.values[cluster.cluster_index(self.layer)]);
    }

    /// Access the value for an atom referenced as the last member of a
    /// higher-order cluster, for properties of order 1
    pub fn value_for_atom<M>(&self, cluster: &ClusterRef<'_, M>) -> Result<&T, Error>
        where M: StructureManager + ?Sized
    {
        if self.order != 1 {
            return Err(Error::PropertyTypeMismatch(format!(
                "per-atom access is only possible on properties of order 1, \
                 this property is of order {}", self.order
            )));
        }

        return Ok(&self.values[cluster.neighbour_atom_cluster_index()]);
    }
}

impl<T> std::ops::Index<usize> for Property<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

/// Named properties attached to one manager node.
///
/// Property names are scoped to the node they are attached to; attaching
/// twice under the same name is an error, not a silent overwrite.
#[derive(Default)]
pub struct PropertyStore {
    properties: IndexMap<String, Box<dyn Any>>,
}

impl PropertyStore {
    /// Create an empty property store
    pub fn new() -> PropertyStore {
        PropertyStore::default()
    }

    /// Attach a property under the given name
    pub fn attach<T: 'static>(&mut self, name: &str, property: Property<T>) -> Result<(), Error> {
        if self.properties.contains_key(name) {
            return Err(Error::DuplicateProperty(format!(
                "a property of name '{}' has already been registered", name
            )));
        }

        self.properties.insert(name.into(), Box::new(property));
        return Ok(());
    }

    /// Check whether a property with the given name is attached
    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Get the property attached under the given name, with values of type
    /// `T`
    pub fn get<T: 'static>(&self, name: &str) -> Result<&Property<T>, Error> {
        let property = self.properties.get(name).ok_or_else(|| Error::InvalidParameter(format!(
            "no property of name '{}' has been registered", name
        )))?;

        return property.downcast_ref().ok_or_else(|| Error::PropertyTypeMismatch(format!(
            "incompatible types: the property '{}' does not hold values of type '{}'",
            name, std::any::type_name::<T>()
        )));
    }

    /// Get mutable access to the property attached under the given name
    pub fn get_mut<T: 'static>(&mut self, name: &str) -> Result<&mut Property<T>, Error> {
        let property = self.properties.get_mut(name).ok_or_else(|| Error::InvalidParameter(format!(
            "no property of name '{}' has been registered", name
        )))?;

        return property.downcast_mut().ok_or_else(|| Error::PropertyTypeMismatch(format!(
            "incompatible types: the property '{}' does not hold values of type '{}'",
            name, std::any::type_name::<T>()
        )));
    }
}
