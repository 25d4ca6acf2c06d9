//! The routing method trait and its serializable descriptor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use arvak_ir::UnitId;

use crate::aas::{AASLabellingMethod, AASRouteRoutingMethod};
use crate::architecture::Architecture;
use crate::box_decomposition::BoxDecompositionRoutingMethod;
use crate::error::{RoutingError, RoutingResult};
use crate::frontier::MappingFrontier;
use crate::lexi_route::{LexiLabellingMethod, LexiRouteRoutingMethod};
use crate::multi_gate_reorder::MultiGateReorderRoutingMethod;

/// Extra unit aliasing introduced by a routing method, merged into the unit
/// maps by the manager.
pub type Relabelling = BTreeMap<UnitId, UnitId>;

/// A strategy for making progress at the routing boundary.
///
/// The manager asks each method in rank order whether it applies
/// ([`check_method`](Self::check_method)) and, if so, lets it mutate the
/// circuit through the frontier ([`routing_method`](Self::routing_method)).
/// Methods are immutable values shared between routing sessions.
pub trait RoutingMethod: fmt::Debug + Send + Sync {
    /// Name of this method, as used in its descriptor.
    fn name(&self) -> &str;

    /// Check, without side effects, whether this method can act on the
    /// current boundary.
    fn check_method(&self, frontier: &MappingFrontier<'_>, architecture: &Architecture) -> bool;

    /// Act on the boundary.
    ///
    /// Returns whether the circuit changed, plus any relabelling of units
    /// the manager must fold into the unit maps.
    fn routing_method(
        &self,
        frontier: &mut MappingFrontier<'_>,
        architecture: &Architecture,
    ) -> RoutingResult<(bool, Relabelling)>;

    /// Serializable description of this method and its parameters.
    fn descriptor(&self) -> RoutingMethodDescriptor;
}

/// Shared handle to a routing method.
pub type RoutingMethodPtr = Arc<dyn RoutingMethod>;

/// CNOT synthesis strategy for phase polynomial boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CNotSynthType {
    /// SWAP the control next to the target, CX, SWAP back.
    #[serde(rename = "SWAP")]
    Swap,
    /// CX chain along the path, without moving qubits.
    HamPath,
    /// Recursive CX ladder along the path.
    #[default]
    Rec,
}

/// Serializable description of a routing method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum RoutingMethodDescriptor {
    /// See [`LexiLabellingMethod`].
    LexiLabellingMethod,
    /// See [`LexiRouteRoutingMethod`].
    LexiRouteRoutingMethod {
        /// Lookahead depth.
        depth: usize,
    },
    /// See [`AASRouteRoutingMethod`].
    #[serde(rename = "AASRouteRoutingMethod")]
    AasRouteRoutingMethod {
        /// Cancellation window of the synthesised circuit.
        aaslookahead: usize,
        /// Synthesis strategy.
        cnotsynthtype: CNotSynthType,
    },
    /// See [`AASLabellingMethod`].
    #[serde(rename = "AASLabellingMethod")]
    AasLabellingMethod,
    /// See [`MultiGateReorderRoutingMethod`].
    MultiGateReorderRoutingMethod {
        /// Number of cuts searched.
        depth: usize,
        /// Maximum number of gates considered.
        size: usize,
    },
    /// See [`BoxDecompositionRoutingMethod`].
    BoxDecompositionRoutingMethod,
    /// A method wrapping a circuit function. Cannot be rebuilt.
    RoutingMethod,
}

impl RoutingMethodDescriptor {
    /// Rebuild the method described.
    pub fn build(&self) -> RoutingResult<RoutingMethodPtr> {
        Ok(match *self {
            Self::LexiLabellingMethod => Arc::new(LexiLabellingMethod),
            Self::LexiRouteRoutingMethod { depth } => Arc::new(LexiRouteRoutingMethod::new(depth)),
            Self::AasRouteRoutingMethod {
                aaslookahead,
                cnotsynthtype,
            } => Arc::new(AASRouteRoutingMethod::new(aaslookahead, cnotsynthtype)?),
            Self::AasLabellingMethod => Arc::new(AASLabellingMethod),
            Self::MultiGateReorderRoutingMethod { depth, size } => {
                Arc::new(MultiGateReorderRoutingMethod::new(depth, size))
            }
            Self::BoxDecompositionRoutingMethod => Arc::new(BoxDecompositionRoutingMethod),
            Self::RoutingMethod => {
                return Err(RoutingError::InvalidConfig(
                    "a circuit-function routing method cannot be deserialized".into(),
                ));
            }
        })
    }
}

/// The usual ranking: label unplaced qubits, then route with LexiRoute.
pub fn default_routing_methods() -> Vec<RoutingMethodPtr> {
    vec![
        Arc::new(LexiLabellingMethod),
        Arc::new(LexiRouteRoutingMethod::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_names() {
        let json = serde_json::to_value(RoutingMethodDescriptor::LexiRouteRoutingMethod {
            depth: 100,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "LexiRouteRoutingMethod", "depth": 100})
        );

        let json = serde_json::to_value(RoutingMethodDescriptor::AasRouteRoutingMethod {
            aaslookahead: 1,
            cnotsynthtype: CNotSynthType::Swap,
        })
        .unwrap();
        assert_eq!(json["name"], "AASRouteRoutingMethod");
        assert_eq!(json["cnotsynthtype"], "SWAP");
    }

    #[test]
    fn test_descriptor_rebuild() {
        for method in default_routing_methods() {
            let rebuilt = method.descriptor().build().unwrap();
            assert_eq!(rebuilt.descriptor(), method.descriptor());
        }
        assert!(RoutingMethodDescriptor::RoutingMethod.build().is_err());
        let bad = RoutingMethodDescriptor::AasRouteRoutingMethod {
            aaslookahead: 0,
            cnotsynthtype: CNotSynthType::Rec,
        };
        assert!(matches!(bad.build(), Err(RoutingError::InvalidConfig(_))));
    }

    #[test]
    fn test_descriptor_from_json() {
        let desc: RoutingMethodDescriptor = serde_json::from_str(
            r#"{"name": "MultiGateReorderRoutingMethod", "depth": 10, "size": 10}"#,
        )
        .unwrap();
        assert_eq!(
            desc,
            RoutingMethodDescriptor::MultiGateReorderRoutingMethod { depth: 10, size: 10 }
        );
        let synth: CNotSynthType = serde_json::from_str("\"HamPath\"").unwrap();
        assert_eq!(synth, CNotSynthType::HamPath);
    }
}
