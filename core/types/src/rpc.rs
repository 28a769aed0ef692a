use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::node::WireNode;
use crate::sample::WireSample;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinMeshResponse {
    pub name_unique: bool,
    pub my_name: String,
    pub nodes: Vec<WireNode>,
}

impl JoinMeshResponse {
    pub fn rejected(my_name: impl Into<String>) -> Self {
        Self {
            name_unique: false,
            my_name: my_name.into(),
            nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeDiscoveryRequest {
    pub new_node: WireNode,
    pub i_am_node: WireNode,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushSamplesRequest {
    pub samples: Vec<WireSample>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct Ack {}
