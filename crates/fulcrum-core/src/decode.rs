//! Entity-tag keyed decode dispatch.
//!
//! A page's `data` payload is opaque until it reaches the decoder registered
//! for the endpoint's entity tag, which turns it into ordered [`Record`]s.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::SyncError;
use crate::models::{
    Application, ArchiveReason, Candidate, Feedback, Interview, Posting, Record, Referral, Resume,
    Stage, User,
};

/// Turns one page payload into records, preserving server order.
pub type DecodeFn = fn(serde_json::Value) -> Result<Vec<Record>, SyncError>;

/// Decode a JSON array of `T`. A `null` payload is an empty page.
pub fn decode_list<T>(payload: serde_json::Value) -> Result<Vec<Record>, SyncError>
where
    T: DeserializeOwned + Into<Record>,
{
    if payload.is_null() {
        return Ok(Vec::new());
    }
    let items: Vec<T> = serde_json::from_value(payload).map_err(|e| {
        SyncError::DecodeError(format!(
            "payload is not a list of {}: {e}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("records")
        ))
    })?;
    Ok(items.into_iter().map(Into::into).collect())
}

/// Mapping from entity tag to decoder.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoders for every entity tag used by the standard endpoints.
    pub fn standard() -> Self {
        Self::new()
            .register("users", decode_list::<User>)
            .register("candidates", decode_list::<Candidate>)
            .register("postings", decode_list::<Posting>)
            .register("archive_reasons", decode_list::<ArchiveReason>)
            .register("stages", decode_list::<Stage>)
            .register("interviews", decode_list::<Interview>)
            .register("referrals", decode_list::<Referral>)
            .register("feedback", decode_list::<Feedback>)
            .register("resumes", decode_list::<Resume>)
            .register("applications", decode_list::<Application>)
    }

    pub fn register(mut self, entity: &'static str, decode: DecodeFn) -> Self {
        self.decoders.insert(entity, decode);
        self
    }

    /// Look up the decoder for `entity`.
    ///
    /// Tags are fixed when endpoints are registered, so a miss is a
    /// configuration error rather than a bad response.
    pub fn resolve(&self, entity: &str) -> Result<DecodeFn, SyncError> {
        self.decoders.get(entity).copied().ok_or_else(|| {
            SyncError::ConfigError(format!("no decoder registered for entity type '{entity}'"))
        })
    }
}
