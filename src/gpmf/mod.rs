//! Format-agnostic GPMF layer: FourCC identifiers, KLV framing, tree
//! projection, and typed payload access. GPS semantics live in
//! `crate::content_types`.

pub mod fourcc;
pub mod gpmf;
pub mod klv;
pub mod tree;
pub mod value;

pub use fourcc::FourCC;
pub use gpmf::{detect_format, device_info, parse, DeviceInfo};
pub use klv::{ceil4, read_klv, KlvItem, KlvReader};
pub use tree::{project_tree, Node, Tree};
pub use value::DataKind;
