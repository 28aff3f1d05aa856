use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOTPRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(equal = 5, message = "OTP must be 5 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Reset token is required"))]
    pub reset_token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOTPResponse {
    pub success: bool,
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_request_uses_camel_case_fields() {
        let body = r#"{"email":"a@x.com","resetToken":"abc123","newPassword":"NewPass!1"}"#;
        let req: ResetPasswordRequest = serde_json::from_str(body).unwrap();

        assert_eq!(req.reset_token, "abc123");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn otp_must_be_five_characters() {
        let req = VerifyOTPRequest {
            email: "a@x.com".to_string(),
            otp: "123456".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn verify_response_exposes_reset_token() {
        let body = serde_json::to_value(VerifyOTPResponse {
            success: true,
            message: "OTP verified successfully".to_string(),
            reset_token: "tok".to_string(),
        })
        .unwrap();
        assert_eq!(body["resetToken"], "tok");
    }
}
