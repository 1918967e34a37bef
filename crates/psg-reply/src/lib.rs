//! Decoding of PSG service replies and construction of request payloads.
//!
//! A reply is a sequence of named segments (`<RAD>` ... `</RAD>`). The
//! configuration echo is decoded back into a [`psg_cfg::RootConfig`], spectra
//! into [`SpectralTable`]s, the service log into [`Diagnostic`]s, the layer
//! product into a [`LayerProduct`] and the GCM binary into a [`GcmGrid`].
//! Segments with other names are kept verbatim in
//! [`Reply::unparsed`].

pub mod error;
pub mod grid;
pub mod layers;
pub mod log;
pub mod reply;
pub mod request;
pub mod segment;
pub mod table;

pub use error::ReplyError;
pub use grid::{GcmGrid, GcmHeader, Variable};
pub use layers::{LayerProduct, LayerTable};
pub use log::{App, Diagnostic, Severity};
pub use reply::{echo_options, Reply, GCM_KEY};
pub use request::{call, OutputType, PreparedRequest, Request, Transport};
pub use segment::{split, RawSegment, Segment, Segments};
pub use table::{Column, SpectralTable};
