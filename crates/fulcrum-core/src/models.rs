//! Record shapes for the entity types Fulcrum knows how to decode.
//!
//! Every shape decodes leniently: fields the remote omits or sends as `null`
//! fall back to their defaults, and fields not listed here are dropped. Timestamps are epoch
//! milliseconds as sent by the API.

use serde::{Deserialize, Deserializer, Serialize};

/// Read `null` as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A team member invited to take part in recruiting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub access_role: String,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageChange {
    #[serde(deserialize_with = "null_as_default")]
    pub to_stage_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to_stage_index: i64,
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Archived {
    pub archived_at: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Candidate {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub emails: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub origin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_changes: Vec<StageChange>,
    pub created_at: Option<i64>,
    pub archived_at: Option<i64>,
    pub last_advanced_at: Option<i64>,
    pub archived: Option<Archived>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostingCategories {
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub commitment: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
}

/// An open or closed job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Posting {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: PostingCategories,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "reqCode")]
    #[serde(deserialize_with = "null_as_default")]
    pub req_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchiveReason {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

/// A pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stage {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interviewer {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interview {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub interviewers: Vec<Interviewer>,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: String,
    pub date: Option<i64>,
    pub duration: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub feedback_template: String,
    #[serde(deserialize_with = "null_as_default")]
    pub feedback_forms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,
    pub canceled_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Referral {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instructions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub referrer: String,
}

/// One answer on a feedback form. `value` varies by field type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormField {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    pub value: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Feedback {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instructions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: Vec<FormField>,
    #[serde(deserialize_with = "null_as_default")]
    pub base_template_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub interview: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    pub created_at: Option<i64>,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResumeFile {
    #[serde(deserialize_with = "null_as_default")]
    pub download_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ext: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub uploaded_at: Option<i64>,
}

/// Parsed sections are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedResume {
    pub positions: Option<serde_json::Value>,
    pub schools: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resume {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub created_at: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub file: ResumeFile,
    #[serde(deserialize_with = "null_as_default")]
    pub parsed_data: ParsedResume,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Application {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub created_at: Option<i64>,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub posting: String,
    #[serde(deserialize_with = "null_as_default")]
    pub posting_owner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub posting_hiring_manager: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub archived: Option<Archived>,
}

/// A decoded entity ready for the output sink.
///
/// Serializes as the bare inner shape, so the sink writes exactly one JSON
/// object per entity with no wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    User(User),
    Candidate(Candidate),
    Posting(Posting),
    ArchiveReason(ArchiveReason),
    Stage(Stage),
    Interview(Interview),
    Referral(Referral),
    Feedback(Feedback),
    Resume(Resume),
    Application(Application),
}

macro_rules! impl_into_record {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(value: $ty) -> Self {
                    Record::$ty(value)
                }
            }
        )*
    };
}

impl_into_record!(
    User,
    Candidate,
    Posting,
    ArchiveReason,
    Stage,
    Interview,
    Referral,
    Feedback,
    Resume,
    Application,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_decodes_with_missing_fields() {
        let raw = serde_json::json!({
            "id": "c-1",
            "name": "Ada Lovelace",
            "emails": ["ada@example.com"],
            "stageChanges": [{"toStageId": "s-2", "toStageIndex": 1, "updatedAt": 1700000000000_i64}],
            "unknownField": true
        });
        let candidate: Candidate = serde_json::from_value(raw).unwrap();
        assert_eq!(candidate.id, "c-1");
        assert_eq!(candidate.emails, vec!["ada@example.com"]);
        assert_eq!(candidate.stage_changes[0].to_stage_index, 1);
        assert!(candidate.archived.is_none());
        assert!(candidate.tags.is_empty());
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let raw = serde_json::json!({
            "id": "c-2",
            "name": "Grace Hopper",
            "location": null,
            "origin": null,
            "tags": null,
            "stageChanges": [{"toStageId": null, "toStageIndex": null, "updatedAt": null}],
            "archived": null
        });
        let candidate: Candidate = serde_json::from_value(raw).unwrap();
        assert_eq!(candidate.name, "Grace Hopper");
        assert_eq!(candidate.location, "");
        assert_eq!(candidate.origin, "");
        assert!(candidate.tags.is_empty());
        assert_eq!(candidate.stage_changes[0].to_stage_index, 0);
        assert_eq!(candidate.stage_changes[0].to_stage_id, "");
        assert!(candidate.archived.is_none());

        let posting: Posting = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "categories": null,
            "reqCode": null
        }))
        .unwrap();
        assert_eq!(posting.categories, PostingCategories::default());
        assert_eq!(posting.req_code, "");
    }

    #[test]
    fn test_record_serializes_without_wrapper() {
        let record = Record::from(Stage {
            id: "s-1".into(),
            text: "Phone screen".into(),
        });
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":"s-1","text":"Phone screen"}"#);
    }

    #[test]
    fn test_feedback_field_value_passes_through() {
        let raw = serde_json::json!({
            "id": "f-1",
            "type": "interview",
            "fields": [{"type": "score-system", "text": "Rating", "value": 4, "required": true}]
        });
        let feedback: Feedback = serde_json::from_value(raw).unwrap();
        assert_eq!(feedback.kind, "interview");
        assert_eq!(feedback.fields[0].value, serde_json::json!(4));
        assert!(feedback.fields[0].required);
    }
}
