pub mod answer_service;
pub mod attempt_service;
pub mod gatekeeper;
pub mod mock_service;
pub mod section_service;
