// src/db/document_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::Counted,
    models::documents::{Document, DocumentListQuery, DocumentType},
};

const DOCUMENT_COLUMNS: &str = r#"
    id, tenant_id, document_type, title, file_name, mime_type, size_bytes, storage_path,
    order_id, driver_id, vehicle_id, trailer_id, expiry_date, uploaded_by, created_at
"#;

/// Metadados de um arquivo já gravado em disco.
pub struct NewDocument<'a> {
    pub id: Uuid,
    pub document_type: DocumentType,
    pub title: &'a str,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: i64,
    pub storage_path: &'a str,
    pub order_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub expiry_date: Option<NaiveDate>,
    pub uploaded_by: Uuid,
}

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &DocumentListQuery,
        page: PageRequest,
        today: NaiveDate,
    ) -> Result<(Vec<Document>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DOCUMENT_COLUMNS}, COUNT(*) OVER() AS total_count FROM documents WHERE "
        ));
        Self::push_filters(&mut qb, tenant_id, filter, today);

        if filter.expiring_within_days.is_some() {
            qb.push(" ORDER BY expiry_date, created_at DESC");
        } else {
            qb.push(" ORDER BY created_at DESC");
        }
        qb.push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Document>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents WHERE ");
            Self::push_filters(&mut count, tenant_id, filter, today);
            count
        })
        .await
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        tenant_id: Uuid,
        filter: &DocumentListQuery,
        today: NaiveDate,
    ) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(document_type) = filter.document_type {
            qb.push(" AND document_type = ").push_bind(document_type);
        }
        if let Some(order_id) = filter.order_id {
            qb.push(" AND order_id = ").push_bind(order_id);
        }
        if let Some(driver_id) = filter.driver_id {
            qb.push(" AND driver_id = ").push_bind(driver_id);
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            qb.push(" AND vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(trailer_id) = filter.trailer_id {
            qb.push(" AND trailer_id = ").push_bind(trailer_id);
        }
        if let Some(days) = filter.expiring_within_days {
            let limit = today + chrono::Duration::days(days.max(0));
            qb.push(" AND expiry_date IS NOT NULL AND expiry_date <= ").push_bind(limit);
        }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(document)
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, doc: NewDocument<'_>) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (
                id, tenant_id, document_type, title, file_name, mime_type, size_bytes, storage_path,
                order_id, driver_id, vehicle_id, trailer_id, expiry_date, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(doc.id)
        .bind(tenant_id)
        .bind(doc.document_type)
        .bind(doc.title)
        .bind(doc.file_name)
        .bind(doc.mime_type)
        .bind(doc.size_bytes)
        .bind(doc.storage_path)
        .bind(doc.order_id)
        .bind(doc.driver_id)
        .bind(doc.vehicle_id)
        .bind(doc.trailer_id)
        .bind(doc.expiry_date)
        .bind(doc.uploaded_by)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(&format!(
            "DELETE FROM documents WHERE tenant_id = $1 AND id = $2 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(document)
    }
}
