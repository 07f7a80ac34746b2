pub(super) mod api {
    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use serde::Deserialize;

    use crate::extract::{Json, Path};
    use crate::{auth, group, message};

    pub async fn find_all(
        Extension(auth_user): Extension<auth::User>,
        State(message_service): State<message::Service>,
        Path(group_id): Path<group::Id>,
    ) -> crate::Result<impl IntoResponse> {
        let messages = message_service
            .find_by_group_id(&group_id, auth_user.id())
            .await?;
        Ok(Json(messages))
    }

    #[derive(Deserialize)]
    pub struct CreateParams {
        text: Option<String>,
        image: Option<String>,
    }

    pub async fn create(
        Extension(auth_user): Extension<auth::User>,
        State(message_service): State<message::Service>,
        Path(group_id): Path<group::Id>,
        Json(params): Json<CreateParams>,
    ) -> crate::Result<impl IntoResponse> {
        let msg = message_service
            .create(&group_id, auth_user.id(), params.text, params.image)
            .await?;

        Ok((StatusCode::CREATED, Json(msg)))
    }
}
