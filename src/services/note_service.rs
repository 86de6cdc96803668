// src/services/note_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::NoteRepository,
    models::{
        auth::{User, UserRole},
        notes::{Note, NoteComment, NoteDetail, NoteInput, NoteListQuery, ReactionToggle},
    },
};

/// Autor ou administrador.
pub fn can_modify(user: &User, author_id: Uuid) -> bool {
    user.id == author_id || user.role == UserRole::Admin
}

fn check_entity_link(input: &NoteInput) -> Result<(), AppError> {
    if input.entity_type.is_some() != input.entity_id.is_some() {
        return Err(AppError::InvalidInput("invalid_field"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct NoteService {
    note_repo: NoteRepository,
    pool: PgPool,
}

impl NoteService {
    pub fn new(note_repo: NoteRepository, pool: PgPool) -> Self {
        Self { note_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &NoteListQuery) -> Result<Paginated<Note>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.note_repo.list(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Note, AppError> {
        self.note_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("note"))
    }

    pub async fn detail(&self, tenant_id: Uuid, user: &User, id: Uuid) -> Result<NoteDetail, AppError> {
        let note = self.find(tenant_id, id).await?;
        let comments = self.note_repo.list_comments(&self.pool, tenant_id, id).await?;
        let reactions = self.note_repo.reaction_counts(&self.pool, id, user.id).await?;
        Ok(NoteDetail { note, comments, reactions })
    }

    pub async fn create(&self, tenant_id: Uuid, user: &User, input: &NoteInput) -> Result<NoteDetail, AppError> {
        check_entity_link(input)?;
        let id = self.note_repo.create(&self.pool, tenant_id, user.id, input).await?;
        self.detail(tenant_id, user, id).await
    }

    pub async fn update(&self, tenant_id: Uuid, user: &User, id: Uuid, input: &NoteInput) -> Result<NoteDetail, AppError> {
        check_entity_link(input)?;
        let note = self.find(tenant_id, id).await?;
        if !can_modify(user, note.author_id) {
            return Err(AppError::Forbidden);
        }
        self.note_repo.update(&self.pool, tenant_id, id, input).await?;
        self.detail(tenant_id, user, id).await
    }

    pub async fn delete(&self, tenant_id: Uuid, user: &User, id: Uuid) -> Result<(), AppError> {
        let note = self.find(tenant_id, id).await?;
        if !can_modify(user, note.author_id) {
            return Err(AppError::Forbidden);
        }
        self.note_repo.delete(&self.pool, tenant_id, id).await?;
        Ok(())
    }

    // --- Comentários ---

    pub async fn add_comment(&self, tenant_id: Uuid, user: &User, note_id: Uuid, content: &str) -> Result<NoteComment, AppError> {
        self.find(tenant_id, note_id).await?;
        self.note_repo
            .add_comment(&self.pool, tenant_id, note_id, user.id, content.trim())
            .await
    }

    pub async fn delete_comment(&self, tenant_id: Uuid, user: &User, note_id: Uuid, comment_id: Uuid) -> Result<(), AppError> {
        let comment = self
            .note_repo
            .find_comment(&self.pool, tenant_id, note_id, comment_id)
            .await?
            .ok_or(AppError::ResourceNotFound("comment"))?;
        if !can_modify(user, comment.author_id) {
            return Err(AppError::Forbidden);
        }
        self.note_repo.delete_comment(&self.pool, tenant_id, comment_id).await?;
        Ok(())
    }

    // --- Reações ---

    /// Mesmo usuário + mesmo emoji alterna a reação.
    pub async fn toggle_reaction(&self, tenant_id: Uuid, user: &User, note_id: Uuid, emoji: &str) -> Result<ReactionToggle, AppError> {
        self.find(tenant_id, note_id).await?;
        let emoji = emoji.trim();

        let mut tx = self.pool.begin().await?;
        let removed = self.note_repo.remove_reaction(&mut *tx, note_id, user.id, emoji).await?;
        if !removed {
            self.note_repo.add_reaction(&mut *tx, note_id, user.id, emoji).await?;
        }
        tx.commit().await?;

        Ok(ReactionToggle { emoji: emoji.to_string(), active: !removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::notes::NoteEntity;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            email: "a@b.pl".into(),
            password_hash: String::new(),
            first_name: "Anna".into(),
            last_name: "Wiśniewska".into(),
            role,
            driver_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn author_and_admin_may_modify() {
        let author = user(UserRole::Manager);
        let other = user(UserRole::Accountant);
        let admin = user(UserRole::Admin);

        assert!(can_modify(&author, author.id));
        assert!(can_modify(&admin, author.id));
        assert!(!can_modify(&other, author.id));
    }

    #[test]
    fn entity_link_needs_type_and_id() {
        let mut input = NoteInput {
            title: None,
            content: "Rampa 4".into(),
            entity_type: Some(NoteEntity::Order),
            entity_id: None,
            is_pinned: false,
        };
        assert!(check_entity_link(&input).is_err());
        input.entity_id = Some(Uuid::new_v4());
        assert!(check_entity_link(&input).is_ok());
        input.entity_type = None;
        input.entity_id = None;
        assert!(check_entity_link(&input).is_ok());
    }
}
