//! MAC-layer vocabulary shared by every scheduler phase.
//!
//! Addresses, QoS classes and the frame descriptors the scheduler
//! reasons about. Frames are described by size and addressing only.

pub mod address;
pub mod frame;
pub mod qos;

pub use address::{Aid, MacAddress};
pub use frame::{
    qos_null_ampdu_size, ControlFrame, ControlKind, FrameId, FrameKind, Psdu, QueuedFrame,
    TriggerFrame, TriggerKind,
};
pub use qos::{AccessCategory, Tid};
