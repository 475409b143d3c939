pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::database::ExamStore;
use crate::services::{
    answer_service::AnswerService, attempt_service::AttemptService, gatekeeper::Gatekeeper,
    mock_service::MockService, section_service::SectionService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExamStore>,
    pub jwt_secret: Arc<str>,
    pub gatekeeper: Gatekeeper,
    pub attempt_service: AttemptService,
    pub answer_service: AnswerService,
    pub section_service: SectionService,
    pub mock_service: MockService,
}

impl AppState {
    pub fn new(store: Arc<dyn ExamStore>, jwt_secret: impl Into<String>) -> Self {
        let secret: String = jwt_secret.into();
        Self {
            gatekeeper: Gatekeeper::new(store.clone()),
            attempt_service: AttemptService::new(store.clone()),
            answer_service: AnswerService::new(store.clone()),
            section_service: SectionService::new(store.clone()),
            mock_service: MockService::new(store.clone()),
            jwt_secret: Arc::from(secret),
            store,
        }
    }
}
