//! Wire models for the GreenShield backend.
//!
//! Response models are lenient: every display field is optional and missing
//! values render as [`UNKNOWN`] through the helpers in [`crate::history`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Canonical label for any missing display field.
pub const UNKNOWN: &str = "Unknown";

/// One entry of the prediction history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub disease: Option<Disease>,
}

impl Prediction {
    /// Image URL from `url`, falling back to `image.url`.
    pub fn image_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.image.as_ref().and_then(|img| img.url.as_deref()))
            .filter(|url| !url.is_empty())
    }

    /// Upload timestamp from `uploadedAt`, `createdAt`, then `image.uploadedAt`.
    pub fn timestamp(&self) -> Option<&str> {
        self.uploaded_at
            .as_deref()
            .or(self.created_at.as_deref())
            .or_else(|| {
                self.image
                    .as_ref()
                    .and_then(|img| img.uploaded_at.as_deref())
            })
    }

    pub fn disease_name(&self) -> Option<&str> {
        self.disease
            .as_ref()
            .and_then(|d| d.name_en.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// True when the diagnosed disease is "healthy" (case-insensitive).
    pub fn is_healthy(&self) -> bool {
        self.disease_name()
            .is_some_and(|name| name.trim().eq_ignore_ascii_case("healthy"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub severity_level: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub treatments: Vec<Treatment>,
}

impl Disease {
    pub fn severity(&self) -> Severity {
        self.severity_level
            .as_deref()
            .map_or(Severity::Unknown, Severity::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub is_chemical: bool,
}

/// Disease severity, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Severity::Low,
            "MEDIUM" => Severity::Medium,
            "HIGH" => Severity::High,
            _ => Severity::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => UNKNOWN,
        }
    }
}

/// `data` of the history endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HistoryPage {
    #[serde(default, deserialize_with = "de_null_default")]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub pagination: Option<Value>,
}

/// Signed-in user profile. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Outcome of a successful scan upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReceipt {
    pub message: Option<String>,
    /// Prediction from `data.prediction` or `data`, when it parses as one
    pub prediction: Option<Prediction>,
    pub data: Value,
}

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body carrying only an email (verification resend, password reset request).
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

/// One-time code sent to the user's email.
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

/// Payload for `POST /api/auth/reset-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Account role accepted by signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Farmer,
}

/// Payload for `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub username: String,
    pub phone_number: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_address: Option<String>,
}

impl SignupRequest {
    /// Client-side checks run before the POST.
    ///
    /// # Errors
    /// Returns the first failed rule as a user-facing message.
    pub fn validate(&self, confirm_password: &str) -> Result<(), String> {
        if !self.email.contains('@') {
            return Err("Please enter a valid email address".to_string());
        }
        if self.password.chars().count() <= 8 {
            return Err("Password must be longer than 8 characters".to_string());
        }
        if !self.password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }
        if self.password != confirm_password {
            return Err("Passwords do not match".to_string());
        }
        if self.role == Role::Farmer && self.farm_name.as_deref().is_none_or(str::is_empty) {
            return Err("Farm name is required for farmers".to_string());
        }
        Ok(())
    }

    /// Lower-cases the email and drops farm fields for non-farmers.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        if self.role != Role::Farmer {
            self.farm_name = None;
            self.farm_address = None;
        }
        self
    }
}

/// Accepts ids sent either as strings or numbers.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Treats an explicit `null` like a missing field.
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts numbers and numeric strings; anything else is `None`.
fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}
