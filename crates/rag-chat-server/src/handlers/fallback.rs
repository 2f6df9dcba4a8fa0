use crate::utils::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
