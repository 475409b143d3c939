pub mod mock_dto;
pub mod section_dto;
