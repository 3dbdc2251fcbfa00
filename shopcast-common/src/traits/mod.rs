pub mod api;
pub mod collaborator_traits;
pub mod repository_traits;
