use crate::api::schemas::pages::Page;
use axum::Json;

pub async fn index() -> Json<Page> {
    Json(Page { title: "Home", message: "Welcome. Register or log in to get started." })
}

pub async fn about() -> Json<Page> {
    Json(Page {
        title: "About",
        message: "A small account service built to run on a managed app platform with a managed database.",
    })
}
