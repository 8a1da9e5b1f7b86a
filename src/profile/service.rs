use reqwest::multipart::{Form, Part};

use crate::{
    auth::UserIdentity,
    http::{ApiClient, ApiResponse, HttpError},
};

use super::model::{ImageUpload, ProfileData, ProfileImage, ProfileUpdate};

/// Thin wrapper over the backend's `/profile` endpoints.
#[derive(Clone)]
pub struct ProfileService {
    api: ApiClient,
}

impl ProfileService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_profile(&self) -> Result<UserIdentity, HttpError> {
        let response: ApiResponse<ProfileData> = self.api.get("/profile").await?;
        unwrap_data(response).map(|data| data.profile)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserIdentity, HttpError> {
        let response: ApiResponse<ProfileData> = self.api.put("/profile", update).await?;
        unwrap_data(response).map(|data| data.profile)
    }

    pub async fn upload_profile_image(
        &self,
        image: ProfileImage,
    ) -> Result<ImageUpload, HttpError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("image", part);

        let response: ApiResponse<ImageUpload> = self
            .api
            .post_multipart("/profile/upload-image", form)
            .await?;
        unwrap_data(response)
    }

    pub async fn delete_profile_image(&self) -> Result<UserIdentity, HttpError> {
        let response: ApiResponse<ProfileData> = self.api.delete("/profile/delete-image").await?;
        unwrap_data(response).map(|data| data.profile)
    }
}

fn unwrap_data<T>(response: ApiResponse<T>) -> Result<T, HttpError> {
    response.data.ok_or_else(|| HttpError::MalformedResponse {
        status: None,
        message: response
            .message
            .unwrap_or_else(|| "Response carried no data".to_string()),
    })
}
