use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

use super::{AtomicStructure, Centers, HalfList, MaxOrder, NeighbourList, Strict};
use super::StructureManager;

/// Parameters for a [`NeighbourList`] adaptor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NeighbourListParameters {
    /// Side length of the linked-cell mesh boxes, and the radius the
    /// resulting full list is guaranteed to cover
    pub cutoff: f64,
    /// Should ghost atoms be centers with neighbour lists of their own?
    #[serde(default)]
    pub consider_ghost_neighbours: bool,
}

/// Parameters for a [`Strict`] adaptor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StrictParameters {
    /// Only pairs up to this distance (inclusive) are kept
    pub cutoff: f64,
}

/// One adaptor in a stack description, tagged by name with its arguments
/// nested under `initialization_arguments`:
///
/// ```json
/// {"name": "NeighbourList", "initialization_arguments": {"cutoff": 3.5}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "name", content = "initialization_arguments")]
pub enum AdaptorParameters {
    /// Full periodic pair list, see [`NeighbourList`]
    NeighbourList(NeighbourListParameters),
    /// Keep each unordered pair once, see [`HalfList`]
    HalfList,
    /// Keep only pairs within a cutoff, see [`Strict`]
    Strict(StrictParameters),
    /// Raise the maximum cluster order by one, see [`MaxOrder`]
    MaxOrder,
}

/// Build a full adaptor stack over the given structure: a [`Centers`] root
/// wrapped by the listed adaptors in order, refreshed and ready to iterate.
pub fn build_stack(
    structure: AtomicStructure,
    adaptors: &[AdaptorParameters],
) -> Result<Box<dyn StructureManager>, Error> {
    let mut manager: Box<dyn StructureManager> = Box::new(Centers::new());
    for parameters in adaptors {
        manager = match parameters {
            AdaptorParameters::NeighbourList(parameters) => {
                Box::new(NeighbourList::new(
                    manager, parameters.cutoff, parameters.consider_ghost_neighbours,
                )?)
            }
            AdaptorParameters::HalfList => Box::new(HalfList::new(manager)?),
            AdaptorParameters::Strict(parameters) => {
                Box::new(Strict::new(manager, parameters.cutoff)?)
            }
            AdaptorParameters::MaxOrder => Box::new(MaxOrder::new(manager)?),
        };
    }

    manager.update(structure)?;
    return Ok(manager);
}

#[cfg(test)]
mod tests {
    use crate::types::{Matrix3, Vector3D};
    use super::super::Property;
    use super::*;

    fn triangle() -> AtomicStructure {
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(8, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.0, 1.0, 0.0));
        return structure;
    }

    fn full_stack_parameters() -> Vec<AdaptorParameters> {
        serde_json::from_str(r#"[
            {"name": "NeighbourList", "initialization_arguments": {"cutoff": 1.2}},
            {"name": "HalfList"},
            {"name": "Strict", "initialization_arguments": {"cutoff": 1.2}},
            {"name": "MaxOrder"}
        ]"#).unwrap()
    }

    #[test]
    fn full_stack() {
        let manager = build_stack(triangle(), &full_stack_parameters()).unwrap();

        assert_eq!(manager.max_order(), 3);
        assert_eq!(manager.nb_clusters(1).unwrap(), 3);
        assert_eq!(manager.nb_clusters(2).unwrap(), 2);
        assert_eq!(manager.nb_clusters(3).unwrap(), 1);

        // one cluster index layer per assigning node
        assert_eq!(manager.layer(1), 0);
        assert_eq!(manager.layer(2), 2);
        assert_eq!(manager.layer(3), 0);
    }

    #[test]
    fn iteration_through_the_box() {
        let mut manager = build_stack(triangle(), &full_stack_parameters()).unwrap();

        let mut masses = Property::<f64>::new(1, 0);
        masses.push(15.999);
        masses.push(1.008);
        masses.push(1.008);
        manager.properties_mut().attach("mass", masses).unwrap();

        let masses = manager.properties().get::<f64>("mass").unwrap();

        // the distances cached while building the strict list are reachable
        // from the top of the stack
        let distances = manager.property_owner("distance").unwrap()
            .get::<f64>("distance").unwrap();

        for atom in manager.atoms() {
            for pair in atom.clusters() {
                // per-atom values are reachable from higher order clusters
                assert_eq!(*masses.value_for_atom(&pair).unwrap(), 1.008);
                assert_eq!(*distances.value(&pair).unwrap(), 1.0);
                for triplet in pair.clusters() {
                    assert_eq!(triplet.atom_indices(), [0, 1, 2]);
                }
            }
        }
    }

    #[test]
    fn json_errors() {
        let result = serde_json::from_str::<Vec<AdaptorParameters>>(r#"[
            {"name": "FancyFilter"}
        ]"#).map_err(Error::from);
        assert!(matches!(result, Err(Error::Json(_))));

        let result = serde_json::from_str::<Vec<AdaptorParameters>>(r#"[
            {"name": "Strict", "initialization_arguments": {"cutoff": 1.0, "skin": 0.5}}
        ]"#).map_err(Error::from);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn bad_parameters_propagate() {
        let parameters: Vec<AdaptorParameters> = serde_json::from_str(r#"[
            {"name": "NeighbourList", "initialization_arguments": {"cutoff": -3.0}}
        ]"#).unwrap();
        let error = build_stack(triangle(), &parameters).err().unwrap();
        assert!(matches!(error, Error::InvalidParameter(_)));

        // a strict adaptor can not be looser than the list below it
        let parameters: Vec<AdaptorParameters> = serde_json::from_str(r#"[
            {"name": "NeighbourList", "initialization_arguments": {"cutoff": 1.0}},
            {"name": "Strict", "initialization_arguments": {"cutoff": 2.0}}
        ]"#).unwrap();
        let error = build_stack(triangle(), &parameters).err().unwrap();
        assert!(matches!(error, Error::CutoffTooLoose(_)));
    }

    #[test]
    fn serialization_round_trip() {
        let parameters = full_stack_parameters();
        let json = serde_json::to_string(&parameters).unwrap();
        let recovered: Vec<AdaptorParameters> = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.len(), parameters.len());
        assert!(matches!(recovered[1], AdaptorParameters::HalfList));
    }

    #[test]
    fn structure_replacement() {
        let parameters: Vec<AdaptorParameters> = serde_json::from_str(r#"[
            {"name": "NeighbourList", "initialization_arguments": {"cutoff": 1.2}},
            {"name": "Strict", "initialization_arguments": {"cutoff": 1.2}}
        ]"#).unwrap();
        let mut manager = build_stack(triangle(), &parameters).unwrap();
        assert_eq!(manager.nb_clusters(2).unwrap(), 4);

        // replacing the structure invalidates the whole stack until the
        // next refresh
        let mut structure = AtomicStructure::new(Matrix3::one() * 10.0, [false; 3]);
        structure.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
        structure.add_atom(1, Vector3D::new(0.5, 0.0, 0.0));
        manager.update_structure(structure).unwrap();
        assert!(!manager.is_fresh());

        manager.refresh().unwrap();
        assert!(manager.is_fresh());
        assert_eq!(manager.size(), 2);
        assert_eq!(manager.nb_clusters(2).unwrap(), 2);
    }
}
