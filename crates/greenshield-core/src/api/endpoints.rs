//! Typed backend endpoints built on [`Gateway::execute`].

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::gateway::{ApiResponse, Auth, Gateway};
use crate::api::models::{
    EmailRequest, HistoryPage, LoginRequest, OtpRequest, Prediction, ResetPasswordRequest,
    ScanReceipt, SignupRequest, UserProfile,
};
use crate::capture::{IMAGE_CONTENT_TYPE, IMAGE_FIELD, IMAGE_FILE_NAME, UploadRequest};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const CONFIRM_EMAIL_PATH: &str = "/api/auth/confirm-email";
pub const RESEND_VERIFICATION_PATH: &str = "/api/auth/resend-verification";
pub const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";
pub const PROFILE_PATH: &str = "/api/profile";
pub const HISTORY_PATH: &str = "/api/predictions/history";
pub const CREATE_SCAN_PATH: &str = "/api/predictions/create-scan";

impl Gateway {
    /// Exchanges credentials for a bearer token.
    ///
    /// The token is returned, not stored; hand it to
    /// [`SessionManager::sign_in`](crate::session::SessionManager::sign_in).
    ///
    /// # Errors
    /// Any gateway failure, or `ServerFormat` when no token is present.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let body = LoginRequest {
            email: normalize_email(email),
            password: password.to_string(),
        };
        let response = self.post_public(LOGIN_PATH, &body).await?;

        extract_token(&response.body)
            .ok_or_else(|| ApiError::unexpected_shape(response.status, "login response has no token"))
    }

    /// Creates an account.
    ///
    /// Returns the token when the backend issues one immediately; `None`
    /// means the account still needs email confirmation.
    ///
    /// # Errors
    /// Any gateway failure.
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<Option<String>> {
        let response = self
            .execute(
                self.request(Method::POST, SIGNUP_PATH).json(request),
                Auth::Public,
            )
            .await?;
        Ok(extract_token(&response.body))
    }

    /// Confirms a new account with the emailed one-time code.
    ///
    /// Returns the token when confirmation also signs the user in.
    ///
    /// # Errors
    /// Any gateway failure (a wrong code is a `RequestFailed`).
    pub async fn confirm_email(&self, email: &str, otp: &str) -> ApiResult<Option<String>> {
        let body = OtpRequest {
            email: normalize_email(email),
            otp: otp.trim().to_string(),
        };
        let response = self.post_public(CONFIRM_EMAIL_PATH, &body).await?;
        Ok(extract_token(&response.body))
    }

    /// Asks the backend to email a fresh verification code.
    ///
    /// # Errors
    /// Any gateway failure.
    pub async fn resend_verification(&self, email: &str) -> ApiResult<()> {
        let body = EmailRequest {
            email: normalize_email(email),
        };
        self.post_public(RESEND_VERIFICATION_PATH, &body).await?;
        Ok(())
    }

    /// Starts a password reset; the backend emails a code.
    ///
    /// # Errors
    /// Any gateway failure.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let body = EmailRequest {
            email: normalize_email(email),
        };
        self.post_public(FORGOT_PASSWORD_PATH, &body).await?;
        Ok(())
    }

    /// Sets a new password using the emailed code.
    ///
    /// # Errors
    /// Any gateway failure.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let body = ResetPasswordRequest {
            email: normalize_email(email),
            otp: otp.trim().to_string(),
            new_password: new_password.to_string(),
        };
        self.post_public(RESET_PASSWORD_PATH, &body).await?;
        Ok(())
    }

    async fn post_public<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<ApiResponse> {
        self.execute(self.request(Method::POST, path).json(body), Auth::Public)
            .await
    }

    /// Fetches the signed-in user's profile.
    ///
    /// # Errors
    /// Any gateway failure, or `ServerFormat` when `data.user` is missing.
    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let response = self
            .execute(self.request(Method::GET, PROFILE_PATH), Auth::Session)
            .await?;
        let user = response
            .data()
            .get("user")
            .cloned()
            .unwrap_or(Value::Null);
        decode(&response, user, "profile")
    }

    /// Fetches the most recent `limit` predictions.
    ///
    /// # Errors
    /// Any gateway failure, or `ServerFormat` for a malformed page.
    pub async fn history(&self, limit: u32) -> ApiResult<Vec<Prediction>> {
        let request = self
            .request(Method::GET, HISTORY_PATH)
            .query(&[("limit", limit)]);
        let response = self.execute(request, Auth::Session).await?;
        let data = response.data().clone();
        if data.is_null() {
            return Ok(Vec::new());
        }
        let page: HistoryPage = decode(&response, data, "history page")?;
        Ok(page.predictions)
    }

    /// Uploads one captured image as a single-field multipart request.
    ///
    /// Uses the token captured in `request`, not the current session token.
    ///
    /// # Errors
    /// Any gateway failure.
    pub async fn create_scan(
        &self,
        request: &UploadRequest,
        image: Vec<u8>,
    ) -> ApiResult<ScanReceipt> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(IMAGE_CONTENT_TYPE));
        let part = Part::bytes(image)
            .file_name(IMAGE_FILE_NAME)
            .headers(headers);
        let form = Form::new().part(IMAGE_FIELD, part);

        info!(uri = %request.uri(), "uploading scan");
        let response = self
            .execute(
                self.request(Method::POST, CREATE_SCAN_PATH).multipart(form),
                Auth::Token(request.token().map(ToString::to_string)),
            )
            .await?;

        let data = response.data().clone();
        let candidate = data.get("prediction").cloned().unwrap_or_else(|| data.clone());
        let prediction = serde_json::from_value::<Prediction>(candidate)
            .ok()
            .filter(|p| p.disease.is_some() || p.id.is_some());

        Ok(ScanReceipt {
            message: response.message().map(ToString::to_string),
            prediction,
            data,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Token from `data.token`, `token`, or their `accessToken` variants.
fn extract_token(body: &Value) -> Option<String> {
    let data = body.get("data");
    [
        data.and_then(|d| d.get("token")),
        body.get("token"),
        data.and_then(|d| d.get("accessToken")),
        body.get("accessToken"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|token| !token.is_empty())
    .map(ToString::to_string)
}

fn decode<T: DeserializeOwned>(response: &ApiResponse, value: Value, what: &str) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::unexpected_shape(response.status, format!("malformed {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::api::error::ApiErrorKind;
    use crate::session::SessionManager;
    use crate::store::{MemoryTokenStore, TokenStore};

    async fn gateway(server: &MockServer, token: Option<&str>) -> Gateway {
        let store: Arc<dyn TokenStore> = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        });
        let session = Arc::new(SessionManager::new(store));
        session.load().await;
        Gateway::new(server.uri(), None, session).unwrap()
    }

    #[tokio::test]
    async fn test_login_returns_token_from_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({"email": "amal@example.com", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"token": "tok-1"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        let token = gw.login(" Amal@Example.com", "pw").await.unwrap();
        assert_eq!(token, "tok-1");
    }

    #[tokio::test]
    async fn test_login_without_token_is_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        let err = gw.login("a@b.test", "pw").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::ServerFormat);
    }

    #[tokio::test]
    async fn test_signup_may_require_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGNUP_PATH))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"success": true, "message": "Check your email"})),
            )
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        let request = SignupRequest {
            email: "a@b.test".into(),
            ..SignupRequest::default()
        };
        assert_eq!(gw.signup(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_history_requests_limit_and_parses_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HISTORY_PATH))
            .and(query_param("limit", "25"))
            .and(header("authorization", "bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "predictions": [
                        {"id": "p1", "disease": {"nameEn": "Healthy"}},
                        {"id": "p2", "disease": {"nameEn": "Rust", "severityLevel": "LOW"}}
                    ],
                    "pagination": {"page": 1}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server, Some("abc123")).await;
        let predictions = gw.history(25).await.unwrap();

        assert_eq!(predictions.len(), 2);
        assert!(predictions[0].is_healthy());
        assert_eq!(predictions[1].disease_name(), Some("Rust"));
    }

    #[tokio::test]
    async fn test_history_401_expires_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HISTORY_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let gw = gateway(&server, Some("abc123")).await;
        let err = gw.history(10).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::SessionExpired);
        assert_eq!(gw.session().token(), None);
    }

    #[tokio::test]
    async fn test_profile_reads_data_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"user": {"firstName": "Amal", "email": "a@b.test"}}
            })))
            .mount(&server)
            .await;

        let gw = gateway(&server, Some("abc123")).await;
        let profile = gw.profile().await.unwrap();
        assert_eq!(profile.display_name(), "Amal");
    }

    #[tokio::test]
    async fn test_create_scan_sends_single_image_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_SCAN_PATH))
            .and(header("authorization", "bearer snap-token"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body).to_string();
                let ok = body.contains("name=\"image\"")
                    && body.contains("filename=\"scan.jpg\"")
                    && body.to_ascii_lowercase().contains("content-type: image/jpeg")
                    && body.contains("JPEGDATA");
                if ok {
                    ResponseTemplate::new(201).set_body_json(json!({
                        "success": true,
                        "message": "Scan created",
                        "data": {"prediction": {"id": "p9", "confidence": 0.91,
                                 "disease": {"nameEn": "Leaf Spot"}}}
                    }))
                } else {
                    ResponseTemplate::new(400).set_body_json(json!({"message": "bad multipart"}))
                }
            })
            .expect(1)
            .mount(&server)
            .await;

        // Session token differs from the snapshot: the snapshot must win.
        let gw = gateway(&server, Some("current-token")).await;
        let request = UploadRequest::new("file:///tmp/leaf.jpg", Some("snap-token".into()));

        let receipt = gw
            .create_scan(&request, b"JPEGDATA".to_vec())
            .await
            .unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Scan created"));
        assert_eq!(
            receipt.prediction.unwrap().disease_name(),
            Some("Leaf Spot")
        );
    }

    #[tokio::test]
    async fn test_history_survives_null_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HISTORY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"predictions": [
                    {"id": 1, "confidence": "0.5",
                     "disease": {"nameEn": "Rust", "treatments": null}},
                    {"id": 2, "confidence": null,
                     "disease": {"nameEn": "Blight",
                                 "treatments": [{"titleEn": "Prune", "isChemical": null}]}}
                ]}
            })))
            .mount(&server)
            .await;

        let gw = gateway(&server, Some("abc123")).await;
        let predictions = gw.history(10).await.unwrap();

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].confidence, Some(0.5));
        assert_eq!(predictions[1].confidence, None);
    }

    #[tokio::test]
    async fn test_confirm_email_posts_code_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CONFIRM_EMAIL_PATH))
            .and(body_json(json!({"email": "amal@example.com", "otp": "123456"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": {"token": "tok-9"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        let token = gw.confirm_email("Amal@Example.com ", " 123456").await.unwrap();
        assert_eq!(token.as_deref(), Some("tok-9"));
    }

    #[tokio::test]
    async fn test_wrong_code_is_request_failure_not_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CONFIRM_EMAIL_PATH))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"success": false, "message": "Invalid code"})),
            )
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        let err = gw.confirm_email("a@b.test", "000000").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::RequestFailed);
        assert_eq!(err.message, "Invalid code");
    }

    #[tokio::test]
    async fn test_resend_and_forgot_password_send_email_only() {
        let server = MockServer::start().await;
        for endpoint in [RESEND_VERIFICATION_PATH, FORGOT_PASSWORD_PATH] {
            Mock::given(method("POST"))
                .and(path(endpoint))
                .and(body_json(json!({"email": "a@b.test"})))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"success": true, "message": "Code sent"})),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let gw = gateway(&server, None).await;
        gw.resend_verification("A@B.test").await.unwrap();
        gw.forgot_password("a@b.test").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_sends_new_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RESET_PASSWORD_PATH))
            .and(body_json(json!({
                "email": "a@b.test",
                "otp": "4242",
                "newPassword": "freshpass1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server, None).await;
        gw.reset_password("a@b.test", "4242", "freshpass1").await.unwrap();
    }

    #[test]
    fn test_extract_token_variants() {
        assert_eq!(
            extract_token(&json!({"token": "a"})).as_deref(),
            Some("a")
        );
        assert_eq!(
            extract_token(&json!({"data": {"accessToken": "b"}})).as_deref(),
            Some("b")
        );
        assert_eq!(extract_token(&json!({"data": {"token": ""}})), None);
    }
}
