//! File upload operations for the Admin API.
//!
//! Uploading a banner is a three-step protocol:
//! 1. `stagedUploadsCreate` returns a signed target URL and form parameters.
//! 2. The file is POSTed to that target as multipart form data.
//! 3. `fileCreate` registers the uploaded resource as a store file.

use reqwest::multipart::{Form, Part};
use tracing::instrument;

use super::{
    AdminClient, AdminShopifyError, GraphQLError,
    queries::{FileCreate, StagedUploadsCreate, file_create, format_user_errors},
};
use crate::error::truncate_error_body;
use crate::models::BannerFile;
use crate::shopify::types::{StagedUploadTarget, UploadedFile};

impl AdminClient {
    /// Upload a banner image and register it as a store file.
    ///
    /// Runs the three upload steps in order and stops at the first failure.
    ///
    /// # Arguments
    ///
    /// * `banner` - The image to upload
    /// * `alt_text` - Alt text stored on the created file
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails: GraphQL/user errors from either
    /// mutation, a missing staged target, or a non-2xx upload response.
    #[instrument(skip(self, banner), fields(filename = %banner.filename, size = banner.size()))]
    pub async fn upload_banner(
        &self,
        banner: &BannerFile,
        alt_text: &str,
    ) -> Result<UploadedFile, AdminShopifyError> {
        let target = self
            .create_staged_upload(&banner.filename, &banner.mime_type, banner.size())
            .await?;
        tracing::debug!(url = %target.url, "Staged upload target created");

        self.upload_to_staged_target(&target, banner).await?;
        tracing::debug!(resource_url = %target.resource_url, "Banner bytes uploaded");

        let file = self.create_file(&target.resource_url, alt_text).await?;
        tracing::info!(file_id = %file.id, status = %file.status, "Banner file created");

        Ok(file)
    }

    /// Create a staged upload target for an image.
    ///
    /// # Arguments
    ///
    /// * `filename` - The filename to upload
    /// * `mime_type` - The MIME type (e.g., "image/jpeg")
    /// * `file_size` - The file size in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, returns user errors, or
    /// returns no target.
    #[instrument(skip(self))]
    pub async fn create_staged_upload(
        &self,
        filename: &str,
        mime_type: &str,
        file_size: usize,
    ) -> Result<StagedUploadTarget, AdminShopifyError> {
        use super::queries::staged_uploads_create::{
            StagedUploadHttpMethodType, StagedUploadInput,
            StagedUploadTargetGenerateUploadResource, Variables,
        };

        let variables = Variables {
            input: vec![StagedUploadInput {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                resource: StagedUploadTargetGenerateUploadResource::IMAGE,
                file_size: Some(file_size.to_string()),
                http_method: Some(StagedUploadHttpMethodType::POST),
            }],
        };

        let response = self.execute::<StagedUploadsCreate>(variables).await?;

        let Some(payload) = response.staged_uploads_create else {
            return Err(AdminShopifyError::GraphQL(vec![GraphQLError::message(
                "Staged upload creation failed",
            )]));
        };

        if !payload.user_errors.is_empty() {
            return Err(AdminShopifyError::UserError(format_user_errors(
                payload
                    .user_errors
                    .iter()
                    .map(|e| (e.field.as_deref(), e.message.as_str())),
            )));
        }

        let target = payload
            .staged_targets
            .and_then(|targets| targets.into_iter().next())
            .ok_or(AdminShopifyError::MissingStagedTarget)?;

        let (Some(url), Some(resource_url)) = (target.url, target.resource_url) else {
            return Err(AdminShopifyError::MissingStagedTarget);
        };

        Ok(StagedUploadTarget {
            url,
            resource_url,
            parameters: target
                .parameters
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
        })
    }

    /// POST the file to a staged upload target.
    ///
    /// The target's parameters are sent first, in the order Shopify returned
    /// them, followed by the `file` part.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::StagedUpload` for a non-2xx response and
    /// `AdminShopifyError::Http` if the request could not be sent.
    #[instrument(skip(self, target, banner), fields(url = %target.url))]
    pub async fn upload_to_staged_target(
        &self,
        target: &StagedUploadTarget,
        banner: &BannerFile,
    ) -> Result<(), AdminShopifyError> {
        let form = target
            .parameters
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });

        let file_part = Part::bytes(banner.bytes.to_vec())
            .file_name(banner.filename.clone())
            .mime_str(&banner.mime_type)?;
        let form = form.part("file", file_part);

        let response = self.http().post(&target.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminShopifyError::StagedUpload {
                status: status.as_u16(),
                body: truncate_error_body(body),
            });
        }

        Ok(())
    }

    /// Register an uploaded resource as an image file.
    ///
    /// # Arguments
    ///
    /// * `resource_url` - The URL returned from the staged upload
    /// * `alt_text` - Alt text for the image
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self))]
    pub async fn create_file(
        &self,
        resource_url: &str,
        alt_text: &str,
    ) -> Result<UploadedFile, AdminShopifyError> {
        use super::queries::file_create::{FileContentType, FileCreateInput, Variables};

        let variables = Variables {
            files: vec![FileCreateInput {
                alt: Some(alt_text.to_string()),
                content_type: Some(FileContentType::IMAGE),
                filename: None,
                original_source: resource_url.to_string(),
            }],
        };

        let response = self.execute::<FileCreate>(variables).await?;

        if let Some(payload) = response.file_create {
            if !payload.user_errors.is_empty() {
                return Err(AdminShopifyError::UserError(format_user_errors(
                    payload
                        .user_errors
                        .iter()
                        .map(|e| (e.field.as_deref(), e.message.as_str())),
                )));
            }

            if let Some(file) = payload.files.and_then(|files| files.into_iter().next()) {
                return Ok(UploadedFile {
                    id: file.id,
                    resource_url: resource_url.to_string(),
                    alt: file.alt.unwrap_or_else(|| alt_text.to_string()),
                    status: file_status_name(&file.file_status),
                });
            }
        }

        Err(AdminShopifyError::GraphQL(vec![GraphQLError::message(
            "File creation failed",
        )]))
    }
}

fn file_status_name(status: &file_create::FileStatus) -> String {
    use file_create::FileStatus;

    match status {
        FileStatus::FAILED => "FAILED".to_string(),
        FileStatus::PROCESSING => "PROCESSING".to_string(),
        FileStatus::READY => "READY".to_string(),
        FileStatus::UPLOADED => "UPLOADED".to_string(),
        FileStatus::Other(other) => other.clone(),
    }
}
