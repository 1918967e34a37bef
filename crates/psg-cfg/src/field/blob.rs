//! Reference to a binary payload carried beside the configuration text.

use super::{check_text, raw, Entries, FieldCtx, FieldKind, Lines};
use crate::error::CfgError;
use crate::value::{BlobRef, Value};

/// Emits only the identifying key; the payload bytes are attached to the
/// request separately (see [`RootConfig::blob_refs`](crate::RootConfig::blob_refs)).
#[derive(Debug, Clone, Default)]
pub struct BlobRefField;

impl BlobRefField {
    pub fn new() -> Self {
        Self
    }
}

impl FieldKind for BlobRefField {
    fn kind(&self) -> &'static str {
        "blob reference"
    }

    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(match value {
            Value::Str(id) => Value::Blob(BlobRef::new(id)),
            other => other,
        })
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let blob = value
            .as_blob()
            .ok_or_else(|| ctx.type_error("a blob reference", value))?;
        if blob.id.trim().is_empty() {
            return Err(CfgError::invalid(&ctx.key(), &blob.id, "empty blob identifier"));
        }
        check_text(&ctx.key(), &blob.id, false)
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let blob = value
            .as_blob()
            .ok_or_else(|| ctx.type_error("a blob reference", value))?;
        Ok(vec![(ctx.key(), blob.id.clone())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        Ok(raw(ctx, entries).map(|id| Value::Blob(BlobRef::new(id))))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_identifier_is_written() {
        let ctx = FieldCtx::new("ATMOSPHERE", "GCM-PARAMETERS");
        let v = BlobRefField
            .normalize(&ctx, Value::from("2,1,1,0,0,180,180,Temperature"))
            .unwrap();
        BlobRefField.validate(&ctx, &v).unwrap();
        assert_eq!(
            BlobRefField.encode(&ctx, &v).unwrap(),
            vec![(
                "ATMOSPHERE-GCM-PARAMETERS".to_string(),
                "2,1,1,0,0,180,180,Temperature".to_string()
            )]
        );
        assert!(BlobRefField
            .validate(&ctx, &Value::Blob(BlobRef::new(" ")))
            .is_err());
    }
}
