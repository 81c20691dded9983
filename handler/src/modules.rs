pub mod admin;
pub mod settings;
pub mod smiley;
