// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, validation::normalize_nip},
    db::{user_repo::NewUser, SettingsRepository, TenantRepository, UserRepository},
    models::auth::{AuthResponse, Claims, RegisterPayload, User, UserRole},
};

/// Hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

pub fn encode_token(secret: &str, user: &User, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user.id,
        tid: user.tenant_id,
        role: user.role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    settings_repo: SettingsRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        settings_repo: SettingsRepository,
        jwt_secret: String,
        token_ttl_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, tenant_repo, settings_repo, jwt_secret, token_ttl_hours, pool }
    }

    /// Cria empresa + perfil + administrador numa única transação.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, AppError> {
        let hashed_password = hash_password(&payload.password).await?;
        let nip = payload.nip.as_deref().map(normalize_nip).filter(|n| !n.is_empty());

        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, payload.company_name.trim())
            .await?;

        self.settings_repo
            .create_initial(&mut *tx, tenant.id, payload.company_name.trim(), nip.as_deref(), &payload.email)
            .await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    tenant_id: tenant.id,
                    email: payload.email.trim(),
                    password_hash: &hashed_password,
                    first_name: payload.first_name.trim(),
                    last_name: payload.last_name.trim(),
                    role: UserRole::Admin,
                    driver_id: None,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🏢 Nova empresa registrada: {} ({})", tenant.name, tenant.id);

        let token = encode_token(&self.jwt_secret, &user, self.token_ttl_hours)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        let token = encode_token(&self.jwt_secret, &user, self.token_ttl_hours)?;
        Ok(AuthResponse { token, user })
    }

    /// Login do aplicativo: só motoristas vinculados a um cadastro de motorista.
    pub async fn mobile_login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let response = self.login(email, password).await?;
        if response.user.role != UserRole::Driver || response.user.driver_id.is_none() {
            return Err(AppError::Forbidden);
        }
        Ok(response)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.tenant_id != claims.tid {
            return Err(AppError::InvalidToken);
        }
        if !user.is_active {
            return Err(AppError::UserInactive);
        }
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        // O usuário do token não traz o hash atualizado; relê do banco
        let stored = self
            .user_repo
            .find_by_id(user.id)
            .await?
            .ok_or(AppError::ResourceNotFound("user"))?;

        if !verify_password(current_password, &stored.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let hashed = hash_password(new_password).await?;
        self.user_repo.update_password(user.id, &hashed).await?;
        tracing::info!("🔑 Senha alterada para o usuário {}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "jan@firma.pl".into(),
            password_hash: String::new(),
            first_name: "Jan".into(),
            last_name: "Kowalski".into(),
            role,
            driver_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carries_user_tenant_and_role() {
        let user = user(UserRole::Manager);
        let token = encode_token("sekret", &user, 24).unwrap();
        let claims = decode_token("sekret", &token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tid, user.tenant_id);
        assert_eq!(claims.role, UserRole::Manager);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = encode_token("sekret", &user(UserRole::Admin), 24).unwrap();
        assert!(matches!(decode_token("inny", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token("sekret", &user(UserRole::Admin), -2).unwrap();
        assert!(matches!(decode_token("sekret", &token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hashed = hash_password("tajne-haslo").await.unwrap();
        assert!(verify_password("tajne-haslo", &hashed).await.unwrap());
        assert!(!verify_password("zle-haslo", &hashed).await.unwrap());
    }
}
