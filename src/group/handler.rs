pub(super) mod api {
    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use serde::Deserialize;

    use crate::extract::{Json, Path};
    use crate::{auth, group, user};

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateParams {
        #[serde(default)]
        name: String,
        #[serde(default)]
        members: Vec<user::Id>,
        group_pic: Option<String>,
    }

    pub async fn create(
        Extension(auth_user): Extension<auth::User>,
        State(group_service): State<group::Service>,
        Json(params): Json<CreateParams>,
    ) -> crate::Result<impl IntoResponse> {
        let group = group_service
            .create(auth_user.id(), &params.name, &params.members, params.group_pic)
            .await?;

        Ok((StatusCode::CREATED, Json(group)))
    }

    pub async fn find_all(
        Extension(auth_user): Extension<auth::User>,
        State(group_service): State<group::Service>,
    ) -> crate::Result<impl IntoResponse> {
        let groups = group_service.find_all(auth_user.id()).await?;
        Ok(Json(groups))
    }

    #[derive(Deserialize)]
    pub struct AddMembersParams {
        #[serde(default)]
        members: Vec<user::Id>,
    }

    pub async fn add_members(
        Extension(auth_user): Extension<auth::User>,
        State(group_service): State<group::Service>,
        Path(id): Path<group::Id>,
        Json(params): Json<AddMembersParams>,
    ) -> crate::Result<impl IntoResponse> {
        let group = group_service
            .add_members(&id, auth_user.id(), &params.members)
            .await?;
        Ok(Json(group))
    }

    pub async fn leave(
        Extension(auth_user): Extension<auth::User>,
        State(group_service): State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<impl IntoResponse> {
        group_service.leave(&id, auth_user.id()).await?;
        Ok(StatusCode::OK)
    }

    pub async fn delete(
        Extension(auth_user): Extension<auth::User>,
        State(group_service): State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<impl IntoResponse> {
        group_service.delete(&id, auth_user.id()).await?;
        Ok(StatusCode::OK)
    }
}
