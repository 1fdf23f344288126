use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The response for any page or resource that does not exist.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        let page = error_view(
            "Not Found",
            "404",
            "Something's missing.",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        );

        (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
    }
}

pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
