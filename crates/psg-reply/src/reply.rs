//! Decoded service reply.

use indexmap::IndexMap;
use psg_cfg::{ParseOptions, RootConfig, Syntax, TextFormat, UnknownKeyPolicy};
use tracing::{debug, warn};

use crate::error::ReplyError;
use crate::grid::{GcmGrid, GcmHeader};
use crate::layers::LayerProduct;
use crate::log::{self, Diagnostic, Severity};
use crate::segment::{self, RawSegment, Segment};
use crate::table::SpectralTable;

pub const CFG: &str = "CFG";
pub const RAD: &str = "RAD";
pub const TRN: &str = "TRN";
pub const NOI: &str = "NOI";
pub const LOG: &str = "LOG";
pub const LYR: &str = "LYR";
pub const BINARY: &str = "BINARY";

/// Key whose blob reference describes the `BINARY` grid layout.
pub const GCM_KEY: &str = "ATMOSPHERE-GCM-PARAMETERS";

/// Options used for the configuration echo: the service writes it in the
/// tagged syntax and may add keys the schema does not model.
pub fn echo_options() -> ParseOptions {
    ParseOptions::new()
        .with_format(TextFormat::new().with_syntax(Syntax::Tagged))
        .with_unknown_keys(UnknownKeyPolicy::Collect)
}

#[derive(Debug, Clone, Default)]
pub struct Reply {
    /// Configuration echo (`CFG`).
    pub config: Option<RootConfig>,
    /// Echo keys the schema does not model.
    pub unknown_keys: Vec<String>,
    /// `RAD`, `TRN` and `NOI` tables, keyed by segment name.
    pub tables: IndexMap<String, SpectralTable>,
    pub grid: Option<GcmGrid>,
    /// Layer-by-layer atmosphere (`LYR`).
    pub layers: Option<LayerProduct>,
    pub diagnostics: Vec<Diagnostic>,
    /// Segments no parser handles, kept verbatim in reply order.
    pub unparsed: Vec<RawSegment>,
}

impl Reply {
    /// Decodes against the standard schema.
    pub fn decode(bytes: &[u8]) -> Result<Self, ReplyError> {
        Self::decode_with(bytes, RootConfig::psg()?, &echo_options())
    }

    /// Decodes with `schema` receiving the configuration echo.
    pub fn decode_with(
        bytes: &[u8],
        schema: RootConfig,
        options: &ParseOptions,
    ) -> Result<Self, ReplyError> {
        let segments = segment::split(bytes)?;
        let mut reply = Reply::default();

        // The echo goes first: it carries the grid layout.
        if let Some(cfg) = segments.iter().find(|s| s.name == CFG) {
            let mut config = schema;
            reply.unknown_keys = config.read_text(cfg.body, options)?;
            reply.config = Some(config);
        }

        for seg in &segments {
            match seg.name {
                CFG => {}
                RAD | TRN | NOI => {
                    let table = SpectralTable::parse(seg.name, seg.body)?;
                    debug!(segment = seg.name, rows = table.len(), "parsed table");
                    reply.tables.insert(seg.name.to_string(), table);
                }
                LOG => reply.diagnostics.extend(log::parse(seg.body)?),
                LYR => reply.layers = Some(LayerProduct::parse(seg.body)?),
                BINARY => match reply.gcm_header()? {
                    Some(header) => reply.grid = Some(GcmGrid::from_bytes(header, seg.body)?),
                    None => {
                        warn!(offset = seg.offset, "binary segment without {GCM_KEY}");
                        reply.keep(seg);
                    }
                },
                _ => {
                    warn!(segment = seg.name, offset = seg.offset, "unrecognized segment");
                    reply.keep(seg);
                }
            }
        }
        Ok(reply)
    }

    fn keep(&mut self, seg: &Segment<'_>) {
        self.unparsed.push(RawSegment::from(*seg));
    }

    fn gcm_header(&self) -> Result<Option<GcmHeader>, ReplyError> {
        let Some(config) = &self.config else {
            return Ok(None);
        };
        config
            .blob_refs()
            .into_iter()
            .find(|(key, _)| key == GCM_KEY)
            .map(|(_, blob)| GcmHeader::parse(&blob.id))
            .transpose()
    }

    pub fn table(&self, name: &str) -> Option<&SpectralTable> {
        self.tables.get(name)
    }

    pub fn rad(&self) -> Option<&SpectralTable> {
        self.table(RAD)
    }

    pub fn trn(&self) -> Option<&SpectralTable> {
        self.table(TRN)
    }

    pub fn noi(&self) -> Option<&SpectralTable> {
        self.table(NOI)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Fails with every error diagnostic the service reported.
    pub fn check(&self) -> Result<(), ReplyError> {
        let errors: Vec<Diagnostic> = self.errors().cloned().collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReplyError::Service { errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psg_cfg::Value;

    #[test]
    fn echo_is_decoded_with_unknown_keys_collected() {
        let reply =
            Reply::decode(b"<CFG>\n<OBJECT>Planet\n<OBJECT-SOMETHING>1\n</CFG>\n").unwrap();
        let cfg = reply.config.unwrap();
        assert_eq!(cfg.get("target.object"), Some(&Value::Token("Planet".into())));
        assert_eq!(reply.unknown_keys, vec!["OBJECT-SOMETHING"]);
    }

    #[test]
    fn binary_without_layout_is_kept_raw() {
        let reply = Reply::decode(b"<BINARY>\x00\x00\x80\x3f</BINARY>").unwrap();
        assert!(reply.grid.is_none());
        assert_eq!(reply.unparsed[0].name, BINARY);
        assert_eq!(reply.unparsed[0].body, vec![0x00, 0x00, 0x80, 0x3f]);
    }

    #[test]
    fn layer_segment_is_parsed() {
        let reply = Reply::decode(
            b"<LYR>\n# Molecules considered: H2O\n# Alt[km] H2O\n# 0.0 1.0e-02\n# 10.0 1.0e-03\n</LYR>\n",
        )
        .unwrap();
        let layers = reply.layers.unwrap();
        assert_eq!(layers.molecules, vec!["H2O"]);
        assert_eq!(layers.profile.column("H2O").unwrap().values, vec![1.0e-2, 1.0e-3]);
        assert!(reply.unparsed.is_empty());
    }

    #[test]
    fn check_reports_errors_only() {
        let reply = Reply::decode(
            b"<LOG>\nWARNING: PUMAS: clipped\nERROR: GlobES: bad grid\n</LOG>",
        )
        .unwrap();
        assert_eq!(reply.warnings().count(), 1);
        let err = reply.check().unwrap_err();
        assert_eq!(err.to_string(), "ERROR: GlobES: bad grid");
        assert!(Reply::default().check().is_ok());
    }
}
