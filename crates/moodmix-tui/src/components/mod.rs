pub mod generating;
pub mod player;
pub mod remix_panel;
pub mod upload;
