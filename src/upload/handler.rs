pub(super) mod api {
    use axum::{extract::State, response::IntoResponse};
    use serde::Deserialize;

    use crate::extract::Json;
    use crate::upload;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UploadParams {
        upload_pic: Option<String>,
    }

    pub async fn upload(
        State(media): State<upload::Service>,
        Json(params): Json<UploadParams>,
    ) -> crate::Result<impl IntoResponse> {
        let url = upload::resolve_image(&media, params.upload_pic)
            .await?
            .ok_or(upload::Error::Missing)?;

        Ok(Json(url))
    }
}
