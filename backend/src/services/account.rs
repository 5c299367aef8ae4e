//! Account service: signup, signin, signout, token refresh, profile, delete
//!
//! Each user has at most one live refresh token, stored on the user record.
//! Signin overwrites it and signout clears it, so only the most recently
//! issued refresh token can be exchanged for access tokens. Access tokens are
//! never checked against the store and remain valid until they expire.

use crate::auth::{Identity, PasswordService, TokenIssuer};
use crate::error::ApiError;
use crate::repositories::{NewUser, UserRecord, UserStore};
use storefront_shared::validation::{require, require_exact};
use storefront_shared::{
    AccessTokenResponse, AuthResponse, MessageResponse, SigninRequest, SignupRequest,
    TokenRequest, UserProfile,
};
use tracing::{debug, info, warn};

/// Account orchestration over a [`UserStore`] and a [`TokenIssuer`]
pub struct AccountService;

impl AccountService {
    /// Register a new user and sign them in
    pub async fn signup(
        store: &dyn UserStore,
        tokens: &TokenIssuer,
        req: SignupRequest,
    ) -> Result<AuthResponse, ApiError> {
        let name = require("name", req.name.as_deref()).map_err(ApiError::BadRequest)?;
        let email = require("email", req.email.as_deref()).map_err(ApiError::BadRequest)?;
        let password =
            require_exact("password", req.password.as_deref()).map_err(ApiError::BadRequest)?;

        if store.find_by_email(email).await?.is_some() {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let password_hash = PasswordService::hash_async(password.to_string()).await?;

        let identity = Identity {
            name: name.to_string(),
            email: email.to_string(),
        };
        let access_token = tokens.issue_access(&identity)?;
        let refresh_token = tokens.issue_refresh(&identity)?;

        // A concurrent signup for the same email surfaces here as a conflict
        let user = store
            .insert(NewUser {
                name: identity.name,
                email: identity.email,
                password_hash,
                refresh_token: Some(refresh_token.clone()),
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "User signed up");

        Ok(AuthResponse {
            user: user.to_profile(),
            access_token,
            refresh_token,
        })
    }

    /// Verify credentials and start a new session, replacing any previous one
    pub async fn signin(
        store: &dyn UserStore,
        tokens: &TokenIssuer,
        req: SigninRequest,
    ) -> Result<AuthResponse, ApiError> {
        let (email, password) = match (
            require("email", req.email.as_deref()),
            require_exact("password", req.password.as_deref()),
        ) {
            (Ok(email), Ok(password)) => (email, password),
            _ => {
                return Err(ApiError::BadRequest(
                    "User credentials not provided".to_string(),
                ))
            }
        };

        let user = find_user(store, email).await?;

        let valid =
            PasswordService::verify_async(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            warn!(email = %email, "Sign-in with invalid credentials");
            return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
        }

        let identity = identity_of(&user);
        let access_token = tokens.issue_access(&identity)?;
        let refresh_token = tokens.issue_refresh(&identity)?;

        let user = store
            .set_refresh_token(email, Some(&refresh_token))
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, email = %user.email, "User signed in");

        Ok(AuthResponse {
            user: user.to_profile(),
            access_token,
            refresh_token,
        })
    }

    /// Clear the stored refresh token
    ///
    /// Access tokens already handed out keep working until they expire.
    pub async fn signout(
        store: &dyn UserStore,
        identity: &Identity,
    ) -> Result<MessageResponse, ApiError> {
        let user = store
            .set_refresh_token(&identity.email, None)
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, email = %user.email, "User signed out");

        Ok(MessageResponse::new("Successfully signed out"))
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// The refresh token is not rotated. Any token other than the one on
    /// record, including one that was valid before a later signin, is refused.
    pub async fn refresh(
        store: &dyn UserStore,
        tokens: &TokenIssuer,
        req: TokenRequest,
    ) -> Result<AccessTokenResponse, ApiError> {
        let (email, refresh_token) = match (
            require("email", req.email.as_deref()),
            require_exact("refreshToken", req.refresh_token.as_deref()),
        ) {
            (Ok(email), Ok(token)) => (email, token),
            _ => {
                return Err(ApiError::BadRequest(
                    "Insufficient credentials provided".to_string(),
                ))
            }
        };

        let user = find_user(store, email).await?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            debug!(email = %email, signed_in = user.is_signed_in(), "Refresh token mismatch");
            return Err(ApiError::Forbidden("Invalid refresh token".to_string()));
        }

        if let Err(e) = tokens.verify_refresh(refresh_token) {
            debug!(email = %email, error = %e, "Stored refresh token no longer valid");
            return Err(ApiError::Forbidden(format!("Invalid refresh token: {}", e)));
        }

        Ok(AccessTokenResponse {
            access_token: tokens.issue_access(&identity_of(&user))?,
        })
    }

    pub async fn get_profile(
        store: &dyn UserStore,
        identity: &Identity,
    ) -> Result<UserProfile, ApiError> {
        let user = find_user(store, &identity.email).await?;
        Ok(user.to_profile())
    }

    /// Delete the caller's account, returning what was removed
    pub async fn delete_account(
        store: &dyn UserStore,
        identity: &Identity,
    ) -> Result<UserProfile, ApiError> {
        let user = store
            .delete_by_email(&identity.email)
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user.id, email = %user.email, "User deleted");

        Ok(user.to_profile())
    }

    pub async fn list_users(store: &dyn UserStore) -> Result<Vec<UserProfile>, ApiError> {
        let users = store.list().await?;
        Ok(users.iter().map(UserRecord::to_profile).collect())
    }

    pub async fn delete_all_users(store: &dyn UserStore) -> Result<u64, ApiError> {
        let removed = store.delete_all().await?;
        warn!(removed, "Deleted all users");
        Ok(removed)
    }
}

async fn find_user(store: &dyn UserStore, email: &str) -> Result<UserRecord, ApiError> {
    store.find_by_email(email).await?.ok_or_else(user_not_found)
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

fn identity_of(user: &UserRecord) -> Identity {
    Identity {
        name: user.name.clone(),
        email: user.email.clone(),
    }
}
