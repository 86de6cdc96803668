// src/db/note_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::Counted,
    models::notes::{Note, NoteComment, NoteInput, NoteListQuery, ReactionCount},
};

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.tenant_id, n.author_id,
           u.first_name || ' ' || u.last_name AS author_name,
           n.title, n.content, n.entity_type, n.entity_id, n.is_pinned,
           (SELECT COUNT(*) FROM note_comments c WHERE c.note_id = n.id) AS comment_count,
           n.created_at, n.updated_at
"#;

#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Fixadas primeiro, depois as mais recentes
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &NoteListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Note>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "{NOTE_SELECT}, COUNT(*) OVER() AS total_count \
             FROM notes n LEFT JOIN users u ON u.id = n.author_id WHERE "
        ));
        Self::push_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY n.is_pinned DESC, n.created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Note>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notes n WHERE ");
            Self::push_filters(&mut count, tenant_id, filter);
            count
        })
        .await
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &NoteListQuery) {
        qb.push("n.tenant_id = ").push_bind(tenant_id);
        if let Some(entity_type) = filter.entity_type {
            qb.push(" AND n.entity_type = ").push_bind(entity_type);
        }
        if let Some(entity_id) = filter.entity_id {
            qb.push(" AND n.entity_id = ").push_bind(entity_id);
        }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Note>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let note = sqlx::query_as::<_, Note>(&format!(
            "{NOTE_SELECT} FROM notes n LEFT JOIN users u ON u.id = n.author_id \
             WHERE n.tenant_id = $1 AND n.id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(note)
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, author_id: Uuid, input: &NoteInput) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notes (tenant_id, author_id, title, content, entity_type, entity_id, is_pinned)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.entity_type)
        .bind(input.entity_id)
        .bind(input.is_pinned)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn update<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, input: &NoteInput) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE notes SET
                title = $3, content = $4, entity_type = $5, entity_id = $6, is_pinned = $7,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.entity_type)
        .bind(input.entity_id)
        .bind(input.is_pinned)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM notes WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  KOMENTARZE
    // =========================================================================

    pub async fn list_comments<'e, E>(&self, executor: E, tenant_id: Uuid, note_id: Uuid) -> Result<Vec<NoteComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comments = sqlx::query_as::<_, NoteComment>(
            r#"
            SELECT c.id, c.note_id, c.author_id, u.first_name || ' ' || u.last_name AS author_name,
                   c.content, c.created_at
            FROM note_comments c
            LEFT JOIN users u ON u.id = c.author_id
            WHERE c.tenant_id = $1 AND c.note_id = $2
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .fetch_all(executor)
        .await?;
        Ok(comments)
    }

    pub async fn find_comment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        note_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<NoteComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comment = sqlx::query_as::<_, NoteComment>(
            r#"
            SELECT c.id, c.note_id, c.author_id, u.first_name || ' ' || u.last_name AS author_name,
                   c.content, c.created_at
            FROM note_comments c
            LEFT JOIN users u ON u.id = c.author_id
            WHERE c.tenant_id = $1 AND c.note_id = $2 AND c.id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .bind(comment_id)
        .fetch_optional(executor)
        .await?;
        Ok(comment)
    }

    pub async fn add_comment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        note_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<NoteComment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comment = sqlx::query_as::<_, NoteComment>(
            r#"
            WITH c AS (
                INSERT INTO note_comments (tenant_id, note_id, author_id, content)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT c.id, c.note_id, c.author_id, u.first_name || ' ' || u.last_name AS author_name,
                   c.content, c.created_at
            FROM c LEFT JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(executor)
        .await?;
        Ok(comment)
    }

    pub async fn delete_comment<'e, E>(&self, executor: E, tenant_id: Uuid, comment_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM note_comments WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(comment_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  REAKCJE
    // =========================================================================

    pub async fn remove_reaction<'e, E>(&self, executor: E, note_id: Uuid, user_id: Uuid, emoji: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM note_reactions WHERE note_id = $1 AND user_id = $2 AND emoji = $3")
            .bind(note_id)
            .bind(user_id)
            .bind(emoji)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_reaction<'e, E>(&self, executor: E, note_id: Uuid, user_id: Uuid, emoji: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO note_reactions (note_id, user_id, emoji) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(user_id)
        .bind(emoji)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn reaction_counts<'e, E>(&self, executor: E, note_id: Uuid, user_id: Uuid) -> Result<Vec<ReactionCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = sqlx::query_as::<_, ReactionCount>(
            r#"
            SELECT emoji, COUNT(*) AS count, BOOL_OR(user_id = $2) AS reacted_by_me
            FROM note_reactions
            WHERE note_id = $1
            GROUP BY emoji
            ORDER BY count DESC, MIN(created_at)
            "#,
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(counts)
    }
}
