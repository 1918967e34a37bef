//! Declarative mapping between typed simulation models and the PSG
//! configuration text format.
//!
//! A [`RootConfig`] is an ordered set of [`Model`]s. A model is an ordered
//! bag of [`Field`]s and nested models, and every model contributes its name
//! as a key prefix, so `OBJECT` > `STAR` > `DISTANCE` is written as
//! `OBJECT-STAR-DISTANCE=1.000000`. How each field is validated and mapped
//! to and from text is decided by its [`FieldKind`].
//!
//! ```no_run
//! use psg_cfg::RootConfig;
//!
//! let mut cfg = RootConfig::psg()?;
//! cfg.set("target.object", "Exoplanet")?;
//! cfg.set("target.name", "Proxima Cen b")?;
//! let text = cfg.to_text()?;
//! assert_eq!(text, b"OBJECT=Exoplanet\nOBJECT-NAME=Proxima Cen b");
//! # Ok::<(), psg_cfg::CfgError>(())
//! ```

pub mod catalog;
pub mod error;
pub mod field;
pub mod format;
pub mod key;
pub mod model;
pub mod psg;
pub mod root;
pub mod settings;
pub mod value;

pub use catalog::{Canonical, Catalog, UnitCode};
pub use error::CfgError;
pub use field::{
    BlobRefField, BoolField, CodedQuantityField, ColumnKind, DateField, Element, Entries, EnumField,
    Field, FieldCtx, FieldKind, FloatField, FloatOrTableField, IntField, Lines, ListField,
    MultiQuantityField, NullPolicy, ProfileField, QuantityField, RecordColumn, RecordsField,
    StrField, TableField, UnitCodeField, UnknownTokenPolicy,
};
pub use format::{NumberFormat, Syntax, TextFormat, ABSENT_TOKEN, DATE_FORMAT, LIST_DELIMITER};
pub use key::KeyPattern;
pub use model::{Model, ModelBuilder, Slot};
pub use root::{parse_entries, ParseOptions, RootConfig, UnknownKeyPolicy};
pub use settings::{Settings, SettingsError};
pub use value::{Aerosol, BlobRef, Molecule, Profile, Species, Table, Value};

pub use psg_units::{Quantity, Unit, UnitError};
