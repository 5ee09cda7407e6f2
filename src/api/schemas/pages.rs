use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Page {
    pub title: &'static str,
    pub message: &'static str,
}
