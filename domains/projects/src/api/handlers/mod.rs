pub mod lifecycle;
pub mod organizations;
pub mod projects;
