//! Pipewright Client
//!
//! [`HttpBackend`] speaks the editor server's JSON API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list local scripts | `GET /api/scripts` |
//! | list remote catalog | `GET /api/github/scripts` |
//! | fetch remote content | `GET /api/github/script-content?path=<path>` |
//! | create pipeline | `POST /api/pipelines` |
//! | update pipeline | `PUT /api/pipelines/<id>` |
//! | load pipeline | `GET /api/pipelines/<id>` |
//! | start run | `POST /api/pipelines/<id>/run` |
//! | push pipeline | `POST /api/github/push-pipeline` |
//!
//! Error responses carry `{"message": ...}`; when they don't, the message is
//! `HTTP <status>`.

mod backend;
mod error;

pub use backend::HttpBackend;
pub use error::ClientError;
