//! Standard Planetary Spectrum Generator schema.
//!
//! Each builder takes the [`Catalog`] that pins units, formats and token
//! vocabularies; a missing entry fails the build with
//! [`CfgError::MissingCatalogEntry`].

use psg_units::Unit;

use crate::catalog::Catalog;
use crate::error::CfgError;
use crate::field::{
    BlobRefField, BoolField, CodedQuantityField, DateField, Element, Field, FloatField,
    FloatOrTableField, IntField, ListField, ProfileField, RecordColumn, RecordsField, StrField,
    TableField,
};
use crate::format::NumberFormat;
use crate::model::Model;
use crate::root::RootConfig;

fn coded(catalog: &Catalog, unit_key: &str, table: &str) -> Result<CodedQuantityField, CfgError> {
    Ok(CodedQuantityField::new(unit_key, catalog.unit_codes(table)?.to_vec()))
}

/// `OBJECT`: the target body and its host star.
pub fn target(catalog: &Catalog) -> Result<Model, CfgError> {
    let star = Model::builder("star", "STAR")
        .field(Field::new("distance", "DISTANCE", catalog.quantity_field("OBJECT-STAR-DISTANCE")?))
        .field(Field::new("velocity", "VELOCITY", catalog.quantity_field("OBJECT-STAR-VELOCITY")?))
        .field(Field::new("type", "TYPE", catalog.enum_field("OBJECT-STAR-TYPE")?))
        .field(Field::new(
            "temperature",
            "TEMPERATURE",
            catalog.quantity_field("OBJECT-STAR-TEMPERATURE")?,
        ))
        .field(Field::new("radius", "RADIUS", catalog.quantity_field("OBJECT-STAR-RADIUS")?))
        .field(Field::new("metallicity", "METALLICITY", FloatField::new()))
        .build()?;
    let solar = Model::builder("solar", "SOLAR")
        .field(Field::new("longitude", "LONGITUDE", catalog.quantity_field("OBJECT-SOLAR-LONGITUDE")?))
        .field(Field::new("latitude", "LATITUDE", catalog.quantity_field("OBJECT-SOLAR-LATITUDE")?))
        .build()?;
    let obs = Model::builder("obs", "OBS")
        .field(Field::new("longitude", "LONGITUDE", catalog.quantity_field("OBJECT-OBS-LONGITUDE")?))
        .field(Field::new("latitude", "LATITUDE", catalog.quantity_field("OBJECT-OBS-LATITUDE")?))
        .field(Field::new("velocity", "VELOCITY", catalog.quantity_field("OBJECT-OBS-VELOCITY")?))
        .build()?;

    Model::builder("target", "OBJECT")
        .model(star)
        .model(solar)
        .model(obs)
        .field(Field::new("object", "", catalog.enum_field("OBJECT")?))
        .field(Field::new("name", "NAME", StrField::new().max_len(50)))
        .field(Field::new("date", "DATE", DateField::new()))
        .field(Field::new("diameter", "DIAMETER", catalog.quantity_field("OBJECT-DIAMETER")?))
        .field(Field::new(
            "gravity",
            "GRAVITY",
            coded(catalog, "GRAVITY-UNIT", "OBJECT-GRAVITY-UNIT")?,
        ))
        .field(Field::new("season", "SEASON", catalog.quantity_field("OBJECT-SEASON")?))
        .field(Field::new("inclination", "INCLINATION", catalog.quantity_field("OBJECT-INCLINATION")?))
        .field(Field::new(
            "position_angle",
            "POSITION-ANGLE",
            catalog.quantity_field("OBJECT-POSITION-ANGLE")?,
        ))
        .field(Field::new("period", "PERIOD", catalog.quantity_field("OBJECT-PERIOD")?))
        .field(Field::new("orbit", "ORBIT", StrField::new().max_len(100)))
        .build()
}

/// `GEOMETRY`: observer placement relative to the target.
pub fn geometry(catalog: &Catalog) -> Result<Model, CfgError> {
    let stellar = Model::builder("stellar", "STELLAR")
        .field(Field::new("type", "TYPE", catalog.enum_field("GEOMETRY-STELLAR-TYPE")?))
        .field(Field::new(
            "temperature",
            "TEMPERATURE",
            catalog.quantity_field("GEOMETRY-STELLAR-TEMPERATURE")?,
        ))
        .field(Field::new("magnitude", "MAGNITUDE", FloatField::new()))
        .build()?;

    Model::builder("geometry", "GEOMETRY")
        .model(stellar)
        .field(Field::new("geometry", "", catalog.enum_field("GEOMETRY")?))
        .field(Field::new("ref", "REF", StrField::new().max_len(50)))
        .field(Field::new(
            "offset",
            "OFFSET",
            coded(catalog, "OFFSET-UNIT", "GEOMETRY-OFFSET-UNIT")?
                .with_value_keys(["OFFSET-NS", "OFFSET-EW"]),
        ))
        .field(Field::new(
            "obs_altitude",
            "OBS-ALTITUDE",
            coded(catalog, "ALTITUDE-UNIT", "GEOMETRY-ALTITUDE-UNIT")?,
        ))
        .field(Field::new("azimuth", "AZIMUTH", catalog.quantity_field("GEOMETRY-AZIMUTH")?))
        .field(Field::new(
            "user_parameter",
            "USER-PARAMETER",
            catalog.multi_quantity_field("GEOMETRY-USER-PARAMETER")?,
        ))
        .field(Field::new("disk_angles", "DISK-ANGLES", IntField::new()))
        .build()
}

/// `ATMOSPHERE`: bulk properties, constituents and the vertical profile.
pub fn atmosphere(catalog: &Catalog) -> Result<Model, CfgError> {
    let abundance = catalog.unit_codes("ATMOSPHERE-UNIT")?.to_vec();
    let aerosol_abundance = catalog.unit_codes("ATMOSPHERE-AUNIT")?.to_vec();
    let aerosol_size = catalog.unit_codes("ATMOSPHERE-ASUNI")?.to_vec();

    Model::builder("atmosphere", "ATMOSPHERE")
        .field(Field::new("structure", "STRUCTURE", catalog.enum_field("ATMOSPHERE-STRUCTURE")?))
        .field(Field::new("pressure", "PRESSURE", coded(catalog, "PUNIT", "ATMOSPHERE-PUNIT")?))
        .field(Field::new(
            "temperature",
            "TEMPERATURE",
            catalog.quantity_field("ATMOSPHERE-TEMPERATURE")?,
        ))
        .field(Field::new("weight", "WEIGHT", FloatField::new()))
        .field(Field::new("description", "DESCRIPTION", StrField::new().max_len(200)))
        .field(Field::new("continuum", "CONTINUUM", ListField::new(Element::Text)))
        .field(Field::new(
            "gases",
            "NGAS",
            RecordsField::new(vec![
                RecordColumn::text("GAS"),
                RecordColumn::text("TYPE"),
                RecordColumn::coded("ABUN", "UNIT", abundance),
            ]),
        ))
        .field(Field::new(
            "aerosols",
            "NAERO",
            RecordsField::new(vec![
                RecordColumn::text("AEROS"),
                RecordColumn::text("ATYPE"),
                RecordColumn::coded("AABUN", "AUNIT", aerosol_abundance),
                RecordColumn::coded("ASIZE", "ASUNI", aerosol_size),
            ]),
        ))
        .field(Field::new("profile", "LAYERS", ProfileField::new()))
        .field(Field::new("gcm", "GCM-PARAMETERS", BlobRefField::new()))
        .build()
}

/// `SURFACE`: temperature and reflectance of the lower boundary.
pub fn surface(catalog: &Catalog) -> Result<Model, CfgError> {
    let wave = catalog.canonical("SURFACE-ALBEDO-WAVE")?;
    Model::builder("surface", "SURFACE")
        .field(Field::new("temperature", "TEMPERATURE", catalog.quantity_field("SURFACE-TEMPERATURE")?))
        .field(Field::new(
            "albedo",
            "ALBEDO",
            FloatOrTableField::new(
                FloatField::new().with_format(NumberFormat::Fixed(4)),
                TableField::new(wave.unit.clone(), Unit::dimensionless()),
            ),
        ))
        .field(Field::new(
            "emissivity",
            "EMISSIVITY",
            FloatField::new().with_format(NumberFormat::Fixed(4)),
        ))
        .field(Field::new("model", "MODEL", StrField::new().max_len(50)))
        .build()
}

/// `GENERATOR`: spectral window, instrument and noise model.
pub fn generator(catalog: &Catalog) -> Result<Model, CfgError> {
    let gas = Model::builder("gas", "GAS")
        .field(Field::new("model", "MODEL", BoolField::new()))
        .build()?;
    let cont = Model::builder("cont", "CONT")
        .field(Field::new("model", "MODEL", BoolField::new()))
        .field(Field::new("stellar", "STELLAR", BoolField::new()))
        .build()?;
    let trans = Model::builder("trans", "TRANS")
        .field(Field::new("trans", "", StrField::new().max_len(20)))
        .field(Field::new("show", "SHOW", BoolField::new()))
        .field(Field::new("apply", "APPLY", BoolField::new()))
        .build()?;

    Model::builder("generator", "GENERATOR")
        .model(gas)
        .model(cont)
        .model(trans)
        .field(Field::new(
            "range",
            "RANGE",
            coded(catalog, "RANGEUNIT", "GENERATOR-RANGEUNIT")?.with_value_keys(["RANGE1", "RANGE2"]),
        ))
        .field(Field::new(
            "resolution",
            "RESOLUTION",
            coded(catalog, "RESOLUTIONUNIT", "GENERATOR-RESOLUTIONUNIT")?,
        ))
        .field(Field::new("resolution_kernel", "RESOLUTIONKERNEL", BoolField::new()))
        .field(Field::new("telescope", "TELESCOPE", catalog.enum_field("GENERATOR-TELESCOPE")?))
        .field(Field::new("diameter", "DIAMTELE", catalog.quantity_field("GENERATOR-DIAMTELE")?))
        .field(Field::new("beam", "BEAM", coded(catalog, "BEAM-UNIT", "GENERATOR-BEAM-UNIT")?))
        .field(Field::new("telescope1", "TELESCOPE1", IntField::new()))
        .field(Field::new("telescope2", "TELESCOPE2", FloatField::new()))
        .field(Field::new("telescope3", "TELESCOPE3", StrField::new()))
        .field(Field::new("noise", "NOISE", catalog.enum_field("GENERATOR-NOISE")?))
        .field(Field::new("noise_time", "NOISETIME", catalog.quantity_field("GENERATOR-NOISETIME")?))
        .field(Field::new("noise_frames", "NOISEFRAMES", IntField::new()))
        .field(Field::new("noise_pixels", "NOISEPIXELS", IntField::new()))
        .field(Field::new("noise1", "NOISE1", FloatField::new()))
        .field(Field::new("noise2", "NOISE2", FloatField::new()))
        .field(Field::new(
            "noise_temperature",
            "NOISEOTEMP",
            catalog.quantity_field("GENERATOR-NOISEOTEMP")?,
        ))
        .field(Field::new("noise_efficiency", "NOISEOEFF", FloatField::new()))
        .field(Field::new("noise_emissivity", "NOISEOEMIS", FloatField::new()))
        .field(Field::new("rad_units", "RADUNITS", catalog.unit_code_field("GENERATOR-RADUNITS")?))
        .field(Field::new("log_rad", "LOGRAD", BoolField::new()))
        .field(Field::new("gcm_binning", "GCM-BINNING", IntField::new()))
        .field(Field::new("instrument", "INSTRUMENT", StrField::new()))
        .build()
}

/// The five top-level models in wire order.
pub fn root(catalog: &Catalog) -> Result<RootConfig, CfgError> {
    RootConfig::new(vec![
        target(catalog)?,
        geometry(catalog)?,
        atmosphere(catalog)?,
        surface(catalog)?,
        generator(catalog)?,
    ])
}
