mod fnv;
mod node;
mod rpc;
mod sample;

pub use fnv::fnv1a;
pub use node::{node_id, now_unix, Node, NodeState, WireNode};
pub use rpc::{Ack, JoinMeshResponse, NodeDiscoveryRequest, PushSamplesRequest};
pub use sample::{sample_id, Sample, SampleKey, WireSample, NAN_VALUE};
