use axum::{extract::State, Json};
use validator::Validate;

use crate::dtos::auth_dtos::{
    ForgotPasswordRequest, ForgotPasswordResponse, ResetPasswordRequest, ResetPasswordResponse,
    VerifyOTPRequest, VerifyOTPResponse,
};
use crate::errors::Result;
use crate::state::AppState;

// 1. Forgot Password - Request OTP
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>> {
    req.validate()?;

    state.password_reset.request_reset(&req.email).await?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "OTP has been sent to your email address".to_string(),
    }))
}

// 2. Verify OTP
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOTPRequest>,
) -> Result<Json<VerifyOTPResponse>> {
    req.validate()?;

    let reset_token = state.password_reset.verify_otp(&req.email, &req.otp).await?;

    Ok(Json(VerifyOTPResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
        reset_token,
    }))
}

// 3. Reset Password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>> {
    req.validate()?;

    state
        .password_reset
        .reset_password(&req.email, &req.reset_token, &req.new_password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password has been reset successfully".to_string(),
    }))
}
