pub use crate::{
    decode::{Binder, Deferred, Depth},
    encode::Flow,
    errors::{Error, ErrorKind},
    kat::Kat,
    parser::Node,
    registry::Registry,
    rep::KatRep,
    spec::{Embed, Spec, SpecBuilder},
    supplier::{Options, Supplier},
    tag::Tag,
    vecmap::VecMap,
};
pub use bytes::Bytes;
pub use kat_derive::KatRep;
