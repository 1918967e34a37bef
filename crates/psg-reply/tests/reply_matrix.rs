use std::cell::RefCell;

use indexmap::IndexMap;
use psg_cfg::{BlobRef, RootConfig, Settings, Syntax, Value};
use psg_reply::{
    call, split, App, OutputType, PreparedRequest, Reply, ReplyError, Request, Severity, Transport,
};

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn full_reply() -> Vec<u8> {
    let mut out = b"<CFG>\n<OBJECT>Planet\n<OBJECT-NAME>Mars\n<ATMOSPHERE-GCM-PARAMETERS>2,1,1,-180,0,180,1,Tsurf,Temperature\n</CFG>\n".to_vec();
    out.extend_from_slice(
        b"<RAD>\n# Spectral unit: [um]\n# Radiance unit: [W/m2/um]\n# Wave/freq Total Planet\n1.0 2.0 2.0\n2.0 4.0 4.0\n</RAD>\n",
    );
    out.extend_from_slice(b"<BINARY>");
    out.extend_from_slice(&f32_bytes(&[210.0, 215.0, 180.0, 185.0]));
    out.extend_from_slice(b"</BINARY>\n");
    out.extend_from_slice(
        b"<LYR>\n# Molecules considered: CO2\n# Alt[km] Pressure[bar] Temperature[K] CO2\n# 0.000 6.000e-03 210.00 9.5e-01\n# 10.000 2.500e-03 195.00 9.5e-01\n</LYR>\n",
    );
    out.extend_from_slice(b"<SRF>\n# surface\n1 2 3\n</SRF>\n");
    out.extend_from_slice(b"<LOG>\nWARNING: Generator: resolution coarsened\n</LOG>\n");
    out
}

// -----------------------------------------------------------------------------
// Segment dispatch
// -----------------------------------------------------------------------------

#[test]
fn reply_segments_are_dispatched_matrix() {
    let reply = Reply::decode(&full_reply()).unwrap();

    let cfg = reply.config.as_ref().unwrap();
    assert_eq!(cfg.get("target.name"), Some(&Value::Str("Mars".into())));
    assert_eq!(
        cfg.get("atmosphere.gcm"),
        Some(&Value::Blob(BlobRef::new(
            "2,1,1,-180,0,180,1,Tsurf,Temperature"
        )))
    );

    let rad = reply.rad().unwrap();
    assert_eq!(rad.len(), 2);
    assert_eq!(rad.column("Planet").unwrap().values, vec![2.0, 4.0]);
    assert!(reply.trn().is_none());

    let grid = reply.grid.as_ref().unwrap();
    assert_eq!(grid.header().lons(), vec![-180.0, 0.0]);
    assert_eq!(grid.variable("Tsurf").unwrap().values, &[210.0f32, 215.0][..]);
    assert_eq!(grid.variable("Temperature").unwrap().values, &[180.0f32, 185.0][..]);

    let layers = reply.layers.as_ref().unwrap();
    assert_eq!(layers.molecules, vec!["CO2"]);
    assert_eq!(layers.profile.names(), vec!["Alt", "Pressure", "Temperature", "CO2"]);
    assert_eq!(layers.profile.column("Temperature").unwrap().values, vec![210.0, 195.0]);

    assert_eq!(reply.diagnostics.len(), 1);
    assert_eq!(reply.diagnostics[0].severity, Severity::Warning);
    assert_eq!(reply.diagnostics[0].app, App::Generator);
    assert!(reply.check().is_ok());
}

#[test]
fn unrecognized_segment_is_preserved_matrix() {
    let reply = Reply::decode(&full_reply()).unwrap();
    assert_eq!(reply.unparsed.len(), 1);
    assert_eq!(reply.unparsed[0].name, "SRF");
    assert_eq!(reply.unparsed[0].body, b"# surface\n1 2 3");
}

#[test]
fn truncated_reply_is_rejected_matrix() {
    let mut bytes = full_reply();
    let cut = bytes.len() - "</LOG>\n".len();
    bytes.truncate(cut);
    assert!(matches!(
        Reply::decode(&bytes),
        Err(ReplyError::TruncatedResponse { ref segment, .. }) if segment == "LOG"
    ));
    assert!(matches!(
        Reply::decode(b"</RAD>"),
        Err(ReplyError::TruncatedResponse { .. })
    ));
}

#[test]
fn grid_size_must_match_header_matrix() {
    let mut bytes =
        b"<CFG>\n<ATMOSPHERE-GCM-PARAMETERS>2,1,1,0,0,1,1,Temperature\n</CFG>\n<BINARY>".to_vec();
    bytes.extend_from_slice(&f32_bytes(&[1.0]));
    bytes.extend_from_slice(b"</BINARY>");
    assert!(matches!(
        Reply::decode(&bytes),
        Err(ReplyError::Grid { .. })
    ));
}

#[test]
fn grid_data_ending_in_line_feed_is_kept_matrix() {
    let last = f32::from_le_bytes([0, 0, 0, 0x0a]);
    let mut bytes =
        b"<CFG>\n<ATMOSPHERE-GCM-PARAMETERS>2,1,1,0,0,1,1,Temperature\n</CFG>\n<BINARY>".to_vec();
    bytes.extend_from_slice(&f32_bytes(&[250.0, last]));
    bytes.extend_from_slice(b"</BINARY>\r\n");
    let reply = Reply::decode(&bytes).unwrap();
    let grid = reply.grid.unwrap();
    assert_eq!(grid.data()[1].to_bits(), last.to_bits());
}

#[test]
fn oversized_grid_header_is_a_grid_error_matrix() {
    let bytes = b"<CFG>\n<ATMOSPHERE-GCM-PARAMETERS>4294967296,4294967296,4294967296,0,0,1,1,Temperature\n</CFG>\n<BINARY>\x00\x00\x00\x00</BINARY>";
    assert!(matches!(
        Reply::decode(bytes),
        Err(ReplyError::Grid { .. })
    ));
}

#[test]
fn oversized_echo_counts_are_config_errors_matrix() {
    for echo in [
        &b"<CFG>\n<ATMOSPHERE-LAYERS>18446744073709551615\n</CFG>"[..],
        &b"<CFG>\n<ATMOSPHERE-NGAS>18446744073709551615\n<ATMOSPHERE-GAS>H2O\n</CFG>"[..],
    ] {
        assert!(matches!(Reply::decode(echo), Err(ReplyError::Config(_))));
    }
}

#[test]
fn bad_table_and_bad_echo_fail_matrix() {
    assert!(matches!(
        Reply::decode(b"<NOI>\n# Wave/freq Noise\n1 2 3\n</NOI>"),
        Err(ReplyError::Table { ref segment, line: 2, .. }) if segment == "NOI"
    ));
    assert!(matches!(
        Reply::decode(b"<CFG>\n<OBJECT-DIAMETER>wide\n</CFG>"),
        Err(ReplyError::Config(_))
    ));
}

#[test]
fn service_errors_surface_through_check_matrix() {
    let reply =
        Reply::decode(b"<LOG>\nERROR: GlobES: no GCM\nERROR: PUMAS: bad layer\n</LOG>").unwrap();
    match reply.check() {
        Err(ReplyError::Service { errors }) => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[1].app, App::Pumas);
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[test]
fn segment_offsets_point_at_start_markers_matrix() {
    let bytes = full_reply();
    let segments = split(&bytes).unwrap();
    let names: Vec<&str> = segments.iter().map(|s| s.name).collect();
    assert_eq!(names, ["CFG", "RAD", "BINARY", "LYR", "SRF", "LOG"]);
    for s in &segments {
        assert_eq!(&bytes[s.offset..s.offset + s.name.len() + 2], format!("<{}>", s.name).as_bytes());
    }
}

// -----------------------------------------------------------------------------
// Requests
// -----------------------------------------------------------------------------

fn gcm_config() -> RootConfig {
    let mut cfg = RootConfig::psg().unwrap();
    cfg.set("target.object", "Planet").unwrap();
    cfg.set("atmosphere.gcm", "1,1,1,0,0,1,1,Tsurf").unwrap();
    cfg
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[test]
fn payload_binary_sections_decode_matrix() {
    let settings = Settings {
        syntax: Syntax::Tagged,
        ..Settings::default()
    };
    let tsurf = f32::from_le_bytes([0x0a, 0x0d, 0x0a, 0x0a]);
    let mut blobs = IndexMap::new();
    blobs.insert("1,1,1,0,0,1,1,Tsurf".to_string(), f32_bytes(&[tsurf]));
    let payload = Request::new(gcm_config())
        .payload(&settings.text_format(), &blobs)
        .unwrap();

    let at = find(&payload, b"<BINARY>").unwrap();
    let (text, binary) = payload.split_at(at);
    let segments = split(binary).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].body, f32_bytes(&[tsurf]).as_slice());

    let mut echoed = b"<CFG>\n".to_vec();
    echoed.extend_from_slice(text);
    echoed.extend_from_slice(b"</CFG>\n");
    echoed.extend_from_slice(binary);
    let reply = Reply::decode(&echoed).unwrap();
    let cfg = reply.config.as_ref().unwrap();
    assert_eq!(cfg.get("target.object"), Some(&Value::Token("Planet".into())));
    assert_eq!(
        cfg.get("atmosphere.gcm"),
        Some(&Value::Blob(BlobRef::new("1,1,1,0,0,1,1,Tsurf")))
    );
    let grid = reply.grid.unwrap();
    assert_eq!(grid.variable("Tsurf").unwrap().values[0].to_bits(), tsurf.to_bits());
}

#[test]
fn payload_appends_binary_sections_matrix() {
    let request = Request::new(gcm_config()).with_output_type(OutputType::Rad);
    let mut blobs = IndexMap::new();
    blobs.insert("1,1,1,0,0,1,1,Tsurf".to_string(), f32_bytes(&[288.0]));

    let payload = request.payload(&Settings::default().text_format(), &blobs).unwrap();
    let mut expected =
        b"OBJECT=Planet\nATMOSPHERE-GCM-PARAMETERS=1,1,1,0,0,1,1,Tsurf\n<BINARY>".to_vec();
    expected.extend_from_slice(&f32_bytes(&[288.0]));
    expected.extend_from_slice(b"</BINARY>");
    assert_eq!(payload, expected);

    let err = request
        .payload(&Settings::default().text_format(), &IndexMap::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ReplyError::MissingBlob { ref key, .. } if key == "ATMOSPHERE-GCM-PARAMETERS"
    ));
}

struct Canned {
    reply: Vec<u8>,
    seen: RefCell<Vec<PreparedRequest>>,
}

impl Transport for Canned {
    type Error = std::io::Error;

    fn send(&self, request: &PreparedRequest) -> Result<Vec<u8>, Self::Error> {
        self.seen.borrow_mut().push(request.clone());
        Ok(self.reply.clone())
    }
}

struct Offline;

impl Transport for Offline {
    type Error = std::io::Error;

    fn send(&self, _request: &PreparedRequest) -> Result<Vec<u8>, Self::Error> {
        Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "offline"))
    }
}

#[test]
fn call_sends_form_and_decodes_reply_matrix() {
    let settings = Settings {
        api_key: Some("secret".into()),
        syntax: Syntax::Tagged,
        ..Settings::default()
    };
    let transport = Canned {
        reply: full_reply(),
        seen: RefCell::new(Vec::new()),
    };
    let request = Request::new(gcm_config())
        .with_output_type(OutputType::All)
        .with_app("globes");
    let mut blobs = IndexMap::new();
    blobs.insert("1,1,1,0,0,1,1,Tsurf".to_string(), f32_bytes(&[288.0]));

    let reply = call(&transport, &request, &settings, &blobs).unwrap();
    assert!(reply.rad().is_some());

    let seen = transport.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, settings.url);
    assert!(seen[0].file.starts_with(b"<OBJECT>Planet\n"));
    assert_eq!(
        seen[0].form(),
        vec![("type", "all"), ("app", "globes"), ("key", "secret")]
    );

    let err = call(&Offline, &request, &settings, &blobs).unwrap_err();
    assert!(matches!(err, ReplyError::Transport(_)));
    assert!(err.to_string().contains("offline"));
}

// -----------------------------------------------------------------------------
// Framing properties
// -----------------------------------------------------------------------------

proptest::proptest! {
    #[test]
    fn framed_bodies_are_recovered_matrix(
        bodies in proptest::collection::vec("[a-z0-9 .#\n]{0,40}", 1..5)
    ) {
        let mut bytes = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            bytes.extend_from_slice(format!("<SEG{i}>\n{body}\n</SEG{i}>\n").as_bytes());
        }
        let segments = split(&bytes).unwrap();
        proptest::prop_assert_eq!(segments.len(), bodies.len());
        for (seg, body) in segments.iter().zip(&bodies) {
            proptest::prop_assert_eq!(seg.body, body.as_bytes());
        }
    }

    #[test]
    fn binary_bodies_are_taken_verbatim_matrix(
        data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
        line_feeds in 0usize..3,
    ) {
        let mut body = data;
        body.extend(std::iter::repeat(b'\n').take(line_feeds));
        proptest::prop_assume!(find(&body, b"</BINARY>").is_none());

        let mut bytes = b"<BINARY>".to_vec();
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(b"</BINARY>\n");
        let segments = split(&bytes).unwrap();
        proptest::prop_assert_eq!(segments.len(), 1);
        proptest::prop_assert_eq!(segments[0].body, body.as_slice());
    }

    #[test]
    fn grids_keep_every_bit_matrix(
        words in proptest::collection::vec(proptest::prelude::any::<u32>(), 1..16)
    ) {
        let values: Vec<f32> = words.iter().copied().map(f32::from_bits).collect();
        let mut bytes = format!(
            "<CFG>\n<ATMOSPHERE-GCM-PARAMETERS>{},1,1,0,0,1,1,Temperature\n</CFG>\n<BINARY>",
            values.len()
        )
        .into_bytes();
        let data = f32_bytes(&values);
        proptest::prop_assume!(find(&data, b"</BINARY>").is_none());
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(b"</BINARY>");

        let reply = Reply::decode(&bytes).unwrap();
        let grid = reply.grid.unwrap();
        let bits: Vec<u32> = grid.data().iter().map(|v| v.to_bits()).collect();
        proptest::prop_assert_eq!(bits, words);
    }
}
