// src/models/notes.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "note_entity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteEntity {
    Order,
    Driver,
    Vehicle,
    Trailer,
    Contractor,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    #[schema(example = "Zmiana rampy rozładunkowej")]
    pub title: Option<String>,
    pub content: String,
    pub entity_type: Option<NoteEntity>,
    pub entity_id: Option<Uuid>,
    pub is_pinned: bool,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteComment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    #[schema(example = "👍")]
    pub emoji: String,
    pub count: i64,
    /// Czy bieżący użytkownik dodał tę reakcję
    pub reacted_by_me: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub comments: Vec<NoteComment>,
    pub reactions: Vec<ReactionCount>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    #[validate(length(max = 200, message = "too_long"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000, message = "required"))]
    pub content: String,
    pub entity_type: Option<NoteEntity>,
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    #[validate(length(min = 1, max = 5000, message = "required"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionInput {
    #[validate(length(min = 1, max = 16, message = "invalid_field"))]
    #[schema(example = "👍")]
    pub emoji: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionToggle {
    pub emoji: String,
    /// true = reakcja dodana, false = usunięta
    pub active: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NoteListQuery {
    pub entity_type: Option<NoteEntity>,
    pub entity_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
